use std::io;

use glam::Vec2;

use crate::config::{MatchConfig, NetConfig};
use crate::error::GameError;
use crate::net::{ConnectionState, NetworkService, NetworkStats};
use crate::sim::{EntityId, GameEvent, Simulation, Team, UnitKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchPhase {
    Lobby,
    Playing,
    Ended,
}

/// One peer's match: the simulation plus the network session feeding it.
pub struct Game {
    net_config: NetConfig,
    sim: Simulation,
    network: Option<NetworkService>,
    /// Connection count of the network session when this match started.
    session: u64,
    phase: MatchPhase,
}

impl Game {
    pub fn new(match_config: MatchConfig, net_config: NetConfig) -> Self {
        let team = net_config.role.team();
        Self {
            net_config,
            sim: Simulation::new(match_config, team),
            network: None,
            session: 0,
            phase: MatchPhase::Lobby,
        }
    }

    pub fn sim(&self) -> &Simulation {
        &self.sim
    }

    pub fn phase(&self) -> MatchPhase {
        self.phase
    }

    pub fn local_team(&self) -> Team {
        self.sim.local_team()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.network
            .as_ref()
            .map_or(ConnectionState::Disconnected, NetworkService::state)
    }

    pub fn is_connected(&self) -> bool {
        self.connection_state().is_connected()
    }

    pub fn network_stats(&self) -> NetworkStats {
        self.network
            .as_ref()
            .map(NetworkService::stats)
            .unwrap_or_default()
    }

    pub fn is_networking(&self) -> bool {
        self.network.is_some()
    }

    pub fn start_networking(&mut self) -> io::Result<()> {
        if self.network.is_none() {
            self.network = Some(NetworkService::start(self.net_config.clone())?);
        }
        Ok(())
    }

    /// Stops and joins the network thread, then releases it. The only place a
    /// network session is torn down.
    pub fn reset_networking(&mut self) {
        if let Some(mut network) = self.network.take() {
            network.stop();
            log::debug!("network session closed");
        }
    }

    /// Advances one tick and returns the events it produced.
    ///
    /// Losing the peer mid-match, or finding a different one behind the same
    /// connection, sends this side back to the lobby with a fresh match.
    pub fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.peer_lost() {
            log::warn!("peer lost, returning to lobby");
            if let Err(e) = self.restart() {
                log::warn!("failed to restart networking: {}", e);
            }
        }

        if self.phase == MatchPhase::Lobby {
            if let Some(network) = self.network.as_ref() {
                let session = network.sessions();
                if network.is_connected() {
                    self.session = session;
                    self.phase = MatchPhase::Playing;
                    log::info!("peer ready, match started as {}", self.local_team().label());
                }
            }
        }

        if self.phase == MatchPhase::Playing {
            let incoming = self
                .network
                .as_ref()
                .map(NetworkService::drain_incoming)
                .unwrap_or_default();
            self.sim.tick(dt, incoming);
            self.forward_outgoing();

            if let Some(result) = self.sim.result_text() {
                self.phase = MatchPhase::Ended;
                log::info!("{}", result);
            }
        }

        self.sim.drain_events()
    }

    pub fn request_spawn(&mut self, kind: UnitKind, target: Vec2) -> Result<EntityId, GameError> {
        self.ensure_playing()?;
        let id = self.sim.spawn_local(kind, target)?;
        self.forward_outgoing();
        Ok(id)
    }

    /// Spawns a unit marching on the enemy base.
    pub fn spawn_toward_enemy(&mut self, kind: UnitKind) -> Result<EntityId, GameError> {
        let target = self.enemy_base_position();
        self.request_spawn(kind, target)
    }

    pub fn enemy_base_position(&self) -> Vec2 {
        self.sim
            .config()
            .base_position(self.local_team().opponent())
    }

    pub fn reposition(&mut self, id: EntityId, target: Vec2) -> Result<bool, GameError> {
        self.ensure_playing()?;
        let moved = self.sim.reposition(id, target);
        self.forward_outgoing();
        Ok(moved)
    }

    pub fn select_at(&mut self, point: Vec2) -> Option<EntityId> {
        self.sim.select_at(point)
    }

    pub fn cycle_selection(&mut self) -> Option<EntityId> {
        self.sim.cycle_selection()
    }

    pub fn order_selected(&mut self, target: Vec2) -> Result<bool, GameError> {
        match self.sim.selected() {
            Some(id) => self.reposition(id, target),
            None => Ok(false),
        }
    }

    /// Fresh match back in the lobby with a new network session. The old
    /// network thread is joined before anything else is reset.
    pub fn restart(&mut self) -> io::Result<()> {
        self.reset_networking();
        self.sim.restart();
        self.session = 0;
        self.phase = MatchPhase::Lobby;
        self.start_networking()
    }

    fn peer_lost(&self) -> bool {
        if self.phase == MatchPhase::Lobby {
            return false;
        }
        match self.network.as_ref() {
            Some(network) => !network.is_connected() || network.sessions() != self.session,
            None => true,
        }
    }

    fn ensure_playing(&self) -> Result<(), GameError> {
        match self.phase {
            MatchPhase::Lobby => Err(GameError::NotStarted),
            MatchPhase::Ended => Err(GameError::MatchOver),
            MatchPhase::Playing if !self.is_connected() => Err(GameError::NotConnected),
            MatchPhase::Playing => Ok(()),
        }
    }

    fn forward_outgoing(&mut self) {
        let commands = self.sim.drain_outgoing();
        let Some(network) = self.network.as_ref() else {
            return;
        };
        for command in commands {
            network.send(command);
        }
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.reset_networking();
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, TcpListener};
    use std::thread;
    use std::time::{Duration, Instant};

    use super::*;
    use crate::net::PeerRole;

    fn wait_until<F: FnMut() -> bool>(timeout_ms: u64, mut condition: F) -> bool {
        let start = Instant::now();
        while start.elapsed() < Duration::from_millis(timeout_ms) {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        false
    }

    #[test]
    fn lobby_refuses_orders() {
        let mut game = Game::new(MatchConfig::default(), NetConfig::join());
        assert_eq!(game.local_team(), Team::Joiner);
        assert_eq!(game.phase(), MatchPhase::Lobby);
        assert_eq!(game.connection_state(), ConnectionState::Disconnected);

        assert!(matches!(
            game.spawn_toward_enemy(UnitKind::Infantry),
            Err(GameError::NotStarted)
        ));
        assert!(game.update(0.1).is_empty());
        assert_eq!(game.phase(), MatchPhase::Lobby);
        assert_eq!(game.sim().tick_count(), 0);
    }

    #[test]
    fn enemy_base_depends_on_role() {
        let host = Game::new(MatchConfig::default(), NetConfig::host());
        let joiner = Game::new(MatchConfig::default(), NetConfig::join());
        assert_eq!(host.enemy_base_position(), Vec2::new(400.0, -175.0));
        assert_eq!(joiner.enemy_base_position(), Vec2::new(400.0, 975.0));
    }

    #[test]
    fn reset_without_session_is_harmless() {
        let mut game = Game::new(MatchConfig::default(), NetConfig::host());
        game.reset_networking();
        game.reset_networking();
        assert!(!game.is_networking());
    }

    #[test]
    fn reset_releases_game_port() {
        let net_config = NetConfig {
            role: PeerRole::Host,
            game_port: 44110,
            discovery_port: 44111,
            beacon_target: IpAddr::V4(Ipv4Addr::LOCALHOST),
            ..NetConfig::default()
        };
        let mut game = Game::new(MatchConfig::default(), net_config);
        game.start_networking().unwrap();
        assert!(wait_until(2000, || {
            game.connection_state() == ConnectionState::Listening
        }));

        game.reset_networking();
        assert!(!game.is_networking());
        assert_eq!(game.connection_state(), ConnectionState::Disconnected);
        TcpListener::bind(("0.0.0.0", 44110)).unwrap();
    }
}
