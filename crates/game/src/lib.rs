pub mod config;
pub mod error;
pub mod net;
pub mod session;
pub mod sim;
pub mod view;

pub use config::{FrontlineBand, MatchConfig, NetConfig};
pub use error::GameError;
pub use net::{
    COMMAND_WIRE_SIZE, Command, CommandKind, ConnectionState, NetworkService, NetworkStats,
    PacketError, PeerRole,
};
pub use session::{Game, MatchPhase};
pub use sim::{
    Entity, EntityId, EntityKind, FixedTimestep, GameEvent, MatchOutcome, Simulation, SoundCue,
    Team, UnitKind,
};
pub use view::{EntityView, ViewTransform, health_color};
