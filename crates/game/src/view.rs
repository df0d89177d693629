use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::sim::{Entity, EntityId, EntityKind, Team};

/// Read-only copy of what a renderer needs from an entity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: EntityId,
    pub team: Team,
    pub kind: EntityKind,
    pub position: Vec2,
    pub health_ratio: f32,
    pub is_shooting: bool,
    pub riders: u32,
}

impl From<&Entity> for EntityView {
    fn from(entity: &Entity) -> Self {
        Self {
            id: entity.id,
            team: entity.team,
            kind: entity.kind,
            position: entity.position(),
            health_ratio: entity.health_ratio(),
            is_shooting: entity.is_shooting,
            riders: entity.riders_alive(),
        }
    }
}

impl EntityView {
    pub fn health_color(&self) -> [u8; 4] {
        health_color(self.health_ratio)
    }
}

/// RGBA health bar colour: green at full health, yellow at half, red when empty.
pub fn health_color(ratio: f32) -> [u8; 4] {
    let ratio = ratio.clamp(0.0, 1.0);
    let (r, g) = if ratio >= 0.5 {
        ((1.0 - ratio) * 2.0, 1.0)
    } else {
        (1.0, ratio * 2.0)
    };
    [(r * 255.0).round() as u8, (g * 255.0).round() as u8, 0, 255]
}

/// Maps world coordinates to what one peer sees. The joining peer views the
/// map rotated half a turn so its own side is at the bottom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    world_size: Vec2,
    mirrored: bool,
}

impl ViewTransform {
    pub fn for_team(team: Team, world_size: Vec2) -> Self {
        Self {
            world_size,
            mirrored: team == Team::Joiner,
        }
    }

    pub fn is_mirrored(&self) -> bool {
        self.mirrored
    }

    pub fn world_to_view(&self, point: Vec2) -> Vec2 {
        if self.mirrored {
            self.world_size - point
        } else {
            point
        }
    }

    /// The mirror is its own inverse.
    pub fn view_to_world(&self, point: Vec2) -> Vec2 {
        self.world_to_view(point)
    }
}
