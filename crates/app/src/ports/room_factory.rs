//! Room factory port — how composite rooms are instantiated.

use roomjoin_domain::error::RoomJoinError;
use roomjoin_domain::room::Room;

/// Produces a new, empty room for a combination.
///
/// The engine assigns the id, the member rooms and the partitions; the
/// factory decides everything else (name, resources, …). Any
/// `Fn() -> Result<Room, RoomJoinError>` is a factory.
pub trait RoomFactory {
    /// # Errors
    ///
    /// Returns any error preventing the room from being built. The engine
    /// leaves the affected group uncombined.
    fn create_room(&self) -> Result<Room, RoomJoinError>;
}

impl<F> RoomFactory for F
where
    F: Fn() -> Result<Room, RoomJoinError>,
{
    fn create_room(&self) -> Result<Room, RoomJoinError> {
        self()
    }
}

/// Factory producing rooms named `name`.
pub fn named(
    name: impl Into<String>,
) -> impl Fn() -> Result<Room, RoomJoinError> + Send + Sync + 'static {
    let name = name.into();
    move || Room::builder().name(name.clone()).build()
}
