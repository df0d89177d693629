mod connection;
mod discovery;
mod protocol;
mod queue;
mod service;
mod stats;
mod transport;

pub use connection::{ConnectionState, PeerRole, SharedState};
pub use discovery::{Beacon, DiscoveryListener};
pub use protocol::{
    COMMAND_WIRE_SIZE, Command, CommandKind, DEFAULT_DISCOVERY_PORT, DEFAULT_GAME_PORT,
    DISCOVERY_TOKEN, PacketError, quantize,
};
pub use queue::{Consumer, Producer, queue};
pub use service::NetworkService;
pub use stats::NetworkStats;
pub use transport::{Transport, TransportEvent};
