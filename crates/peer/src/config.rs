use std::net::IpAddr;

use frontline::net::PeerRole;
use frontline::{MatchConfig, NetConfig};

#[derive(Debug, Clone)]
pub struct PeerConfig {
    pub role: PeerRole,
    pub game_port: u16,
    pub discovery_port: u16,
    pub beacon_target: IpAddr,
    pub tick_rate: u32,
}

impl PeerConfig {
    pub fn net_config(&self) -> NetConfig {
        NetConfig {
            role: self.role,
            game_port: self.game_port,
            discovery_port: self.discovery_port,
            beacon_target: self.beacon_target,
            ..NetConfig::default()
        }
    }

    pub fn match_config(&self) -> MatchConfig {
        MatchConfig::default()
    }
}

impl Default for PeerConfig {
    fn default() -> Self {
        let net = NetConfig::default();
        Self {
            role: net.role,
            game_port: net.game_port,
            discovery_port: net.discovery_port,
            beacon_target: net.beacon_target,
            tick_rate: 60,
        }
    }
}
