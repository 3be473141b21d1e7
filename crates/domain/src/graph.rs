//! Breadth-first helpers over an implicit graph.
//!
//! Edges are supplied as a `neighbors` function so the same traversal serves
//! partition adjacency and room membership. Both helpers use an explicit
//! queue, so deep layouts cannot overflow the stack.

use std::collections::{BTreeSet, VecDeque};

/// Every node reachable from `start`, `start` included.
pub fn reachable<T, F, I>(start: T, mut neighbors: F) -> BTreeSet<T>
where
    T: Ord + Copy,
    F: FnMut(T) -> I,
    I: IntoIterator<Item = T>,
{
    let mut visited = BTreeSet::from([start]);
    let mut queue = VecDeque::from([start]);
    while let Some(node) = queue.pop_front() {
        for next in neighbors(node) {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    visited
}

/// Split `nodes` into maximal connected components.
///
/// Edges leading outside `nodes` are ignored. Each node lands in exactly one
/// component and no component is empty.
pub fn connected_components<T, F, I>(nodes: &BTreeSet<T>, mut neighbors: F) -> Vec<BTreeSet<T>>
where
    T: Ord + Copy,
    F: FnMut(T) -> I,
    I: IntoIterator<Item = T>,
{
    let mut visited = BTreeSet::new();
    let mut components = Vec::new();

    for &seed in nodes {
        if !visited.insert(seed) {
            continue;
        }
        let mut component = BTreeSet::from([seed]);
        let mut queue = VecDeque::from([seed]);
        while let Some(node) = queue.pop_front() {
            for next in neighbors(node) {
                if nodes.contains(&next) && visited.insert(next) {
                    component.insert(next);
                    queue.push_back(next);
                }
            }
        }
        components.push(component);
    }

    components
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(node: u32) -> Vec<u32> {
        match node {
            0 => vec![1],
            9 => vec![8],
            n => vec![n - 1, n + 1],
        }
    }

    #[test]
    fn should_reach_whole_chain_from_one_end() {
        let all = reachable(0, chain);
        assert_eq!(all, (0..=9).collect());
    }

    #[test]
    fn should_include_start_when_isolated() {
        let all = reachable(7, |_| Vec::new());
        assert_eq!(all, BTreeSet::from([7]));
    }

    #[test]
    fn should_split_chain_when_middle_missing() {
        let nodes: BTreeSet<u32> = [0, 1, 2, 4, 5].into();
        let components = connected_components(&nodes, chain);
        assert_eq!(components.len(), 2);
        assert!(components.contains(&BTreeSet::from([0, 1, 2])));
        assert!(components.contains(&BTreeSet::from([4, 5])));
    }

    #[test]
    fn should_partition_input_exactly() {
        let nodes: BTreeSet<u32> = [0, 2, 3, 6, 8, 9].into();
        let components = connected_components(&nodes, chain);

        let total: usize = components.iter().map(BTreeSet::len).sum();
        let union: BTreeSet<u32> = components.iter().flatten().copied().collect();
        assert_eq!(total, nodes.len());
        assert_eq!(union, nodes);
        assert!(components.iter().all(|c| !c.is_empty()));
    }

    #[test]
    fn should_return_nothing_for_empty_input() {
        let components = connected_components(&BTreeSet::<u32>::new(), chain);
        assert!(components.is_empty());
    }

    #[test]
    fn should_handle_long_chains_without_recursion() {
        let nodes: BTreeSet<u32> = (0..100_000).collect();
        let components = connected_components(&nodes, |n| {
            let mut next = vec![n + 1];
            if n > 0 {
                next.push(n - 1);
            }
            next
        });
        assert_eq!(components.len(), 1);
    }
}
