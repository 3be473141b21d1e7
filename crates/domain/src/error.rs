//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`RoomJoinError`] via `#[from]` or an explicit `From` impl.

use std::error::Error as StdError;

/// Boxed source error carried across port boundaries.
pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Top-level error for roomjoin operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomJoinError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("partition control error")]
    Control(#[from] ControlError),

    /// A room factory failed to produce a room.
    #[error("room factory failed")]
    Factory(#[source] BoxError),

    /// The room registry rejected a mutation.
    #[error("room registry error")]
    Registry(#[source] BoxError),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    /// A room references member rooms without partitions, or the reverse.
    #[error("composite rooms need both member rooms and partitions")]
    PartialComposite,

    #[error("position ({column}, {row}) is assigned more than once")]
    DuplicatePosition { column: i32, row: i32 },

    #[error("room {0} is assigned to more than one position")]
    DuplicateRoom(String),

    #[error("unknown room {0}")]
    UnknownRoom(String),

    #[error("unknown partition control {0}")]
    UnknownControl(String),
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failures reported by a hardware partition control.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ControlError {
    #[error("control {0} is offline")]
    Offline(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_validation_error_via_from() {
        let err: RoomJoinError = ValidationError::EmptyName.into();
        assert!(matches!(
            err,
            RoomJoinError::Validation(ValidationError::EmptyName)
        ));
    }

    #[test]
    fn should_display_not_found_error() {
        let err = NotFoundError {
            entity: "Partition",
            id: "42".to_string(),
        };
        assert_eq!(err.to_string(), "Partition 42 not found");
    }

    #[test]
    fn should_display_duplicate_position() {
        let err = ValidationError::DuplicatePosition { column: 1, row: 2 };
        assert_eq!(
            err.to_string(),
            "position (1, 2) is assigned more than once"
        );
    }

    #[test]
    fn should_keep_factory_source() {
        let err = RoomJoinError::Factory("boom".into());
        let source = StdError::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("boom"));
    }
}
