use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::net::{DEFAULT_DISCOVERY_PORT, DEFAULT_GAME_PORT, DISCOVERY_TOKEN, PeerRole};
use crate::sim::{Team, UnitKind};

/// Y-coordinate limits of the contested middle of the map. Different-team
/// overlaps only push apart when one side is inside its band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrontlineBand {
    pub team1_max_y: f32,
    pub team0_min_y: f32,
}

impl FrontlineBand {
    pub fn contains(&self, team: Team, position: Vec2) -> bool {
        match team {
            Team::Host => position.y >= self.team0_min_y,
            Team::Joiner => position.y <= self.team1_max_y,
        }
    }
}

impl Default for FrontlineBand {
    fn default() -> Self {
        Self {
            team1_max_y: 250.0,
            team0_min_y: 550.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    pub world_size: Vec2,
    pub start_positions: [Vec2; 2],
    pub base_positions: [Vec2; 2],
    pub frontline: FrontlineBand,
    pub damage_per_currency: f32,
    pub max_conversions_per_tick: u32,
    pub starting_currency: u32,
    pub infantry_cost: u32,
    pub cavalry_cost: u32,
    pub artillery_cost: u32,
}

impl MatchConfig {
    pub fn start_position(&self, team: Team) -> Vec2 {
        self.start_positions[team.index()]
    }

    pub fn base_position(&self, team: Team) -> Vec2 {
        self.base_positions[team.index()]
    }

    pub fn cost_of(&self, kind: UnitKind) -> u32 {
        match kind {
            UnitKind::Infantry => self.infantry_cost,
            UnitKind::Cavalry => self.cavalry_cost,
            UnitKind::Artillery => self.artillery_cost,
        }
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            world_size: Vec2::new(800.0, 800.0),
            start_positions: [Vec2::new(400.0, 700.0), Vec2::new(400.0, 100.0)],
            base_positions: [Vec2::new(400.0, 975.0), Vec2::new(400.0, -175.0)],
            frontline: FrontlineBand::default(),
            damage_per_currency: 20.0,
            max_conversions_per_tick: 2,
            starting_currency: 10,
            infantry_cost: 2,
            cavalry_cost: 4,
            artillery_cost: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NetConfig {
    pub role: PeerRole,
    pub game_port: u16,
    pub discovery_port: u16,
    /// Where the host sends its beacon. Broadcast on a LAN, loopback in tests.
    pub beacon_target: IpAddr,
    pub token: String,
    pub beacon_interval: Duration,
    pub discovery_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_inbound_per_poll: usize,
    pub idle_sleep: Duration,
    pub retry_delay: Duration,
}

impl NetConfig {
    pub fn host() -> Self {
        Self::default()
    }

    pub fn join() -> Self {
        Self {
            role: PeerRole::Join,
            ..Self::default()
        }
    }
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            role: PeerRole::Host,
            game_port: DEFAULT_GAME_PORT,
            discovery_port: DEFAULT_DISCOVERY_PORT,
            beacon_target: IpAddr::V4(Ipv4Addr::BROADCAST),
            token: DISCOVERY_TOKEN.to_string(),
            beacon_interval: Duration::from_secs(1),
            discovery_timeout: Duration::from_secs(1),
            connect_timeout: Duration::from_secs(2),
            max_inbound_per_poll: 5,
            idle_sleep: Duration::from_micros(500),
            retry_delay: Duration::from_millis(250),
        }
    }
}
