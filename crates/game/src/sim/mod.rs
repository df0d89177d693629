mod collision;
mod economy;
mod engine;
mod entity;
mod events;
mod targeting;
mod timestep;

pub use collision::resolve_collisions;
pub use economy::{DamageBank, Economy};
pub use engine::{MatchOutcome, Simulation};
pub use entity::{
    CAVALRY_FORMATION, Entity, EntityId, EntityKind, Formation, IdAllocator, Team, UnitKind,
    UnitStats,
};
pub use events::{GameEvent, SoundCue};
pub use targeting::find_target;
pub use timestep::FixedTimestep;
