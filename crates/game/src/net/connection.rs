use std::sync::atomic::{AtomicU8, Ordering};

use crate::sim::Team;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeerRole {
    Host,
    Join,
}

impl PeerRole {
    pub fn team(self) -> Team {
        match self {
            PeerRole::Host => Team::Host,
            PeerRole::Join => Team::Joiner,
        }
    }
}

/// `Listening` is host-only; `Discovering` is joiner-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    Disconnected = 0,
    Discovering = 1,
    Listening = 2,
    Connected = 3,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }

    fn from_u8(value: u8) -> Self {
        match value {
            1 => ConnectionState::Discovering,
            2 => ConnectionState::Listening,
            3 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// State published by the network thread and read from the simulation side.
#[derive(Debug)]
pub struct SharedState(AtomicU8);

impl SharedState {
    pub fn new(state: ConnectionState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn load(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_map_to_teams() {
        assert_eq!(PeerRole::Host.team(), Team::Host);
        assert_eq!(PeerRole::Join.team(), Team::Joiner);
    }

    #[test]
    fn shared_state_roundtrip() {
        let shared = SharedState::new(ConnectionState::Disconnected);
        for state in [
            ConnectionState::Discovering,
            ConnectionState::Listening,
            ConnectionState::Connected,
            ConnectionState::Disconnected,
        ] {
            shared.store(state);
            assert_eq!(shared.load(), state);
        }
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Listening.is_connected());
    }
}
