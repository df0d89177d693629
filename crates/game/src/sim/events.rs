use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{EntityId, EntityKind, Team, UnitKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    March,
    ArtilleryAttack,
    BaseDestroyed,
    Victory,
    Defeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    UnitSpawned {
        id: EntityId,
        team: Team,
        kind: UnitKind,
        remote: bool,
    },
    DamageDealt {
        attacker: EntityId,
        attacker_kind: EntityKind,
        target: EntityId,
        amount: f32,
    },
    UnitDestroyed {
        id: EntityId,
        team: Team,
        kind: EntityKind,
        position: Vec2,
    },
    CurrencyEarned {
        team: Team,
        amount: u32,
    },
    MatchEnded {
        loser: Team,
    },
}

impl GameEvent {
    /// Audio hook for the event as heard by `local_team`.
    pub fn sound_cue(&self, local_team: Team) -> Option<SoundCue> {
        match self {
            Self::UnitSpawned { .. } => Some(SoundCue::March),
            Self::DamageDealt {
                attacker_kind: EntityKind::Artillery,
                ..
            } => Some(SoundCue::ArtilleryAttack),
            Self::DamageDealt { .. } => None,
            Self::UnitDestroyed {
                kind: EntityKind::Base,
                ..
            } => Some(SoundCue::BaseDestroyed),
            Self::UnitDestroyed { .. } => None,
            Self::CurrencyEarned { .. } => None,
            Self::MatchEnded { loser } if *loser == local_team => Some(SoundCue::Defeat),
            Self::MatchEnded { .. } => Some(SoundCue::Victory),
        }
    }
}
