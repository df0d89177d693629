use std::f32::consts::TAU;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::GameError;

const TEAM_SHIFT: u32 = 24;
const SEQUENCE_MASK: u32 = (1 << TEAM_SHIFT) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Team {
    Host = 0,
    Joiner = 1,
}

impl Team {
    pub const ALL: [Team; 2] = [Team::Host, Team::Joiner];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn opponent(self) -> Team {
        match self {
            Team::Host => Team::Joiner,
            Team::Joiner => Team::Host,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Team::Host => "host",
            Team::Joiner => "joining player",
        }
    }
}

impl TryFrom<u8> for Team {
    type Error = GameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Team::Host),
            1 => Ok(Team::Joiner),
            other => Err(GameError::InvalidTeam(other)),
        }
    }
}

/// `(team << 24) | sequence`. Sequence 0 is reserved for the team's base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl EntityId {
    pub fn new(team: Team, sequence: u32) -> Self {
        Self(((team as u32) << TEAM_SHIFT) | (sequence & SEQUENCE_MASK))
    }

    pub fn base(team: Team) -> Self {
        Self::new(team, 0)
    }

    pub fn raw(self) -> u32 {
        self.0
    }

    pub fn team_bits(self) -> u32 {
        self.0 >> TEAM_SHIFT
    }

    pub fn sequence(self) -> u32 {
        self.0 & SEQUENCE_MASK
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.team_bits(), self.sequence())
    }
}

/// Per-peer id counter for locally spawned units.
#[derive(Debug, Clone)]
pub struct IdAllocator {
    team: Team,
    next: u32,
}

impl IdAllocator {
    pub fn new(team: Team) -> Self {
        Self { team, next: 1 }
    }

    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId::new(self.team, self.next);
        self.next = (self.next + 1) & SEQUENCE_MASK;
        if self.next == 0 {
            self.next = 1;
        }
        id
    }

    pub fn reset(&mut self) {
        self.next = 1;
    }
}

/// Kinds a player can spawn. These are the ones that travel on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum UnitKind {
    Infantry = 0,
    Cavalry = 1,
    Artillery = 2,
}

impl UnitKind {
    pub const ALL: [UnitKind; 3] = [UnitKind::Infantry, UnitKind::Cavalry, UnitKind::Artillery];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Infantry,
    Cavalry,
    Artillery,
    Base,
}

impl From<UnitKind> for EntityKind {
    fn from(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Infantry => EntityKind::Infantry,
            UnitKind::Cavalry => EntityKind::Cavalry,
            UnitKind::Artillery => EntityKind::Artillery,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitStats {
    pub max_health: f32,
    pub attack_range: f32,
    pub damage: f32,
    pub attack_cooldown: f32,
    pub speed: f32,
    pub collider_radius: f32,
}

/// Riders are laid out on concentric rings around the unit's position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Formation {
    pub soldiers: u32,
    pub spacing: f32,
}

pub const CAVALRY_FORMATION: Formation = Formation {
    soldiers: 7,
    spacing: 20.0,
};

impl Formation {
    pub fn offsets(&self, count: u32) -> Vec<Vec2> {
        let mut offsets = Vec::with_capacity(count as usize);
        let mut ring = 0u32;

        while (offsets.len() as u32) < count {
            let radius = ring as f32 * self.spacing;
            let slots = if ring == 0 {
                1
            } else {
                ((TAU * radius) / self.spacing).floor().max(1.0) as u32
            };

            for slot in 0..slots {
                if offsets.len() as u32 >= count {
                    break;
                }
                let angle = TAU * slot as f32 / slots as f32;
                offsets.push(Vec2::new(angle.cos(), angle.sin()) * radius);
            }

            ring += 1;
        }

        offsets
    }

    /// Outer ring plus half a slot, so riders on the rim are fully covered.
    pub fn collider_radius(&self) -> f32 {
        let outer = self
            .offsets(self.soldiers)
            .iter()
            .map(|offset| offset.length())
            .fold(0.0, f32::max);
        outer + self.spacing * 0.5
    }
}

impl EntityKind {
    pub fn stats(self) -> UnitStats {
        match self {
            EntityKind::Infantry => UnitStats {
                max_health: 100.0,
                attack_range: 40.0,
                damage: 10.0,
                attack_cooldown: 2.0,
                speed: 20.0,
                collider_radius: 40.0,
            },
            EntityKind::Cavalry => UnitStats {
                max_health: 100.0,
                attack_range: 30.0,
                damage: 8.0,
                attack_cooldown: 1.0,
                speed: 40.0,
                collider_radius: CAVALRY_FORMATION.collider_radius(),
            },
            EntityKind::Artillery => UnitStats {
                max_health: 200.0,
                attack_range: 100.0,
                damage: 20.0,
                attack_cooldown: 2.0,
                speed: 10.0,
                collider_radius: 60.0,
            },
            EntityKind::Base => UnitStats {
                max_health: 1000.0,
                attack_range: 0.0,
                damage: 0.0,
                attack_cooldown: f32::INFINITY,
                speed: 0.0,
                collider_radius: 300.0,
            },
        }
    }

    pub fn is_base(self) -> bool {
        matches!(self, EntityKind::Base)
    }

    pub fn unit_kind(self) -> Option<UnitKind> {
        match self {
            EntityKind::Infantry => Some(UnitKind::Infantry),
            EntityKind::Cavalry => Some(UnitKind::Cavalry),
            EntityKind::Artillery => Some(UnitKind::Artillery),
            EntityKind::Base => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub team: Team,
    pub kind: EntityKind,
    position: Vec2,
    desired_position: Option<Vec2>,
    health: f32,
    pub attack_cooldown_timer: f32,
    pub is_shooting: bool,
    pub attack_move: bool,
    stats: UnitStats,
}

impl Entity {
    pub fn unit(
        id: EntityId,
        team: Team,
        kind: UnitKind,
        position: Vec2,
        desired_position: Option<Vec2>,
    ) -> Self {
        let kind = EntityKind::from(kind);
        let stats = kind.stats();
        Self {
            id,
            team,
            kind,
            position,
            desired_position,
            health: stats.max_health,
            attack_cooldown_timer: stats.attack_cooldown,
            is_shooting: false,
            attack_move: kind == EntityKind::Cavalry,
            stats,
        }
    }

    pub fn base(team: Team, position: Vec2) -> Self {
        let stats = EntityKind::Base.stats();
        Self {
            id: EntityId::base(team),
            team,
            kind: EntityKind::Base,
            position,
            desired_position: None,
            health: stats.max_health,
            attack_cooldown_timer: 0.0,
            is_shooting: false,
            attack_move: false,
            stats,
        }
    }

    /// Builds a unit from a raw team index, as read from external input.
    pub fn try_unit(
        id: EntityId,
        team: u8,
        kind: UnitKind,
        position: Vec2,
        desired_position: Option<Vec2>,
    ) -> Result<Self, GameError> {
        let team = Team::try_from(team)?;
        Ok(Self::unit(id, team, kind, position, desired_position))
    }

    pub fn stats(&self) -> &UnitStats {
        &self.stats
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Bases are anchored; writes to their position are ignored.
    pub fn set_position(&mut self, position: Vec2) {
        if !self.kind.is_base() {
            self.position = position;
        }
    }

    pub fn desired_position(&self) -> Option<Vec2> {
        self.desired_position
    }

    pub fn set_desired_position(&mut self, desired: Option<Vec2>) {
        if !self.kind.is_base() {
            self.desired_position = desired;
        }
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.stats.max_health
    }

    pub fn set_health(&mut self, health: f32) {
        self.health = health.clamp(0.0, self.stats.max_health);
    }

    pub fn health_ratio(&self) -> f32 {
        self.health / self.stats.max_health
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    pub fn collider_radius(&self) -> f32 {
        self.stats.collider_radius
    }

    pub fn can_attack(&self) -> bool {
        !self.kind.is_base() && self.attack_cooldown_timer >= self.stats.attack_cooldown
    }

    /// Center distance minus both collider radii; negative when overlapping.
    pub fn surface_distance(&self, other: &Entity) -> f32 {
        self.position.distance(other.position) - (self.collider_radius() + other.collider_radius())
    }

    /// Straight-line step toward the desired position. No arrival handling, so
    /// a unit may jitter around its target by less than one step.
    pub fn compute_movement(&self, dt: f32) -> Vec2 {
        if self.kind.is_base() {
            return Vec2::ZERO;
        }
        match self.desired_position {
            Some(target) => (target - self.position).normalize_or_zero() * self.stats.speed * dt,
            None => Vec2::ZERO,
        }
    }

    /// Cavalry keeps advancing while fighting until attack-move is cleared.
    pub fn movement_locked(&self) -> bool {
        match self.kind {
            EntityKind::Base => true,
            EntityKind::Cavalry => self.is_shooting && !self.attack_move,
            _ => self.is_shooting,
        }
    }

    pub fn riders_alive(&self) -> u32 {
        if self.kind != EntityKind::Cavalry {
            return 0;
        }
        (self.health_ratio() * CAVALRY_FORMATION.soldiers as f32).ceil() as u32
    }
}
