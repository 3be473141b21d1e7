//! Errors raised by the virtual adapter.

use roomjoin_domain::error::{ControlError, NotFoundError, RoomJoinError};
use roomjoin_domain::id::{ControlId, RoomId};

#[derive(Debug, thiserror::Error)]
pub enum VirtualError {
    #[error("room {0} is already registered")]
    DuplicateRoom(RoomId),

    #[error("room {0} is not registered")]
    UnknownRoom(RoomId),

    #[error("partition control {0} is offline")]
    Offline(ControlId),
}

impl From<VirtualError> for RoomJoinError {
    fn from(err: VirtualError) -> Self {
        match err {
            VirtualError::DuplicateRoom(_) => RoomJoinError::Registry(Box::new(err)),
            VirtualError::UnknownRoom(id) => NotFoundError {
                entity: "Room",
                id: id.to_string(),
            }
            .into(),
            VirtualError::Offline(id) => ControlError::Offline(id.to_string()).into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_map_unknown_room_to_not_found() {
        let err: RoomJoinError = VirtualError::UnknownRoom(RoomId::new()).into();
        assert!(matches!(err, RoomJoinError::NotFound(_)));
    }

    #[test]
    fn should_map_duplicate_room_to_registry_error() {
        let err: RoomJoinError = VirtualError::DuplicateRoom(RoomId::new()).into();
        assert!(matches!(err, RoomJoinError::Registry(_)));
    }

    #[test]
    fn should_map_offline_to_control_error() {
        let err: RoomJoinError = VirtualError::Offline(ControlId::new()).into();
        assert!(matches!(
            err,
            RoomJoinError::Control(ControlError::Offline(_))
        ));
    }
}
