use std::net::{IpAddr, Ipv4Addr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use frontline::{
    EntityId, EntityKind, Game, MatchConfig, MatchPhase, NetConfig, PeerRole, Simulation, Team,
    UnitKind,
};
use glam::Vec2;

static PORT_COUNTER: AtomicU16 = AtomicU16::new(43000);

fn next_ports() -> (u16, u16) {
    let base = PORT_COUNTER.fetch_add(2, Ordering::SeqCst);
    (base, base + 1)
}

fn peers() -> (Simulation, Simulation) {
    (
        Simulation::new(MatchConfig::default(), Team::Host),
        Simulation::new(MatchConfig::default(), Team::Joiner),
    )
}

/// Runs both peers for `ticks` steps, delivering each side's commands to the
/// other at the start of its next tick.
fn run_linked(host: &mut Simulation, joiner: &mut Simulation, ticks: usize, dt: f32) {
    for _ in 0..ticks {
        let to_joiner = host.drain_outgoing();
        let to_host = joiner.drain_outgoing();
        host.tick(dt, to_host);
        joiner.tick(dt, to_joiner);
    }
}

#[test]
fn infantry_marches_in_a_straight_line() {
    let (mut host, mut joiner) = peers();
    let config = MatchConfig::default();
    let start = config.start_position(Team::Host);
    let target = Vec2::new(400.0, 150.0);

    let id = host.spawn_local(UnitKind::Infantry, target).unwrap();

    let dt = 1.0 / 60.0;
    let ticks = 90;
    run_linked(&mut host, &mut joiner, ticks, dt);

    let speed = EntityKind::Infantry.stats().speed;
    let expected = start + (target - start).normalize() * speed * dt * ticks as f32;
    let unit = host.entity(id).unwrap();
    assert!(unit.position().distance(expected) <= speed * dt + 1e-3);

    let mirrored = joiner.entity(id).unwrap();
    assert_eq!(mirrored.team, Team::Host);
    assert_eq!(mirrored.kind, EntityKind::Infantry);
    assert!(mirrored.position().distance(unit.position()) < 1e-3);
}

#[test]
fn joiner_mirrors_spawn_at_sender_start() {
    let (mut host, mut joiner) = peers();
    let id = host.spawn_local(UnitKind::Artillery, Vec2::new(400.0, 150.0)).unwrap();

    joiner.tick(0.0, host.drain_outgoing());

    let mirrored = joiner.entity(id).unwrap();
    assert_eq!(mirrored.id, EntityId::new(Team::Host, 1));
    assert_eq!(mirrored.team, Team::Host);
    assert_eq!(mirrored.position(), Vec2::new(400.0, 700.0));
    assert_eq!(mirrored.desired_position(), Some(Vec2::new(400.0, 150.0)));
}

#[test]
fn infantry_push_ends_match_then_restart_resets() {
    let (mut host, mut joiner) = peers();
    let enemy_base = MatchConfig::default().base_position(Team::Joiner);

    // Five riflemen stacked on the same spot move as one and never collide.
    for _ in 0..5 {
        host.spawn_local(UnitKind::Infantry, enemy_base).unwrap();
    }
    assert_eq!(host.currency(), 0);

    let mut ticks = 0;
    while !host.is_over() && ticks < 5000 {
        run_linked(&mut host, &mut joiner, 1, 0.1);
        ticks += 1;
    }

    assert!(host.is_over(), "base never fell");
    assert_eq!(
        host.result_text().as_deref(),
        Some("Victory: the joining player's base has fallen")
    );
    assert!(joiner.is_over());
    assert_eq!(
        joiner.result_text().as_deref(),
        Some("Defeat: the joining player's base has fallen")
    );
    assert!(host.currency() > 0);

    host.restart();

    let entities = host.entities();
    assert_eq!(entities.len(), 2);
    for team in Team::ALL {
        let bases: Vec<_> = entities
            .iter()
            .filter(|e| e.team == team && e.kind.is_base())
            .collect();
        assert_eq!(bases.len(), 1);
        assert_eq!(bases[0].health(), bases[0].max_health());
    }
    assert_eq!(host.currency(), MatchConfig::default().starting_currency);
    assert!(!host.is_over());
}

fn loopback(role: PeerRole, game_port: u16, discovery_port: u16) -> NetConfig {
    NetConfig {
        role,
        game_port,
        discovery_port,
        beacon_target: IpAddr::V4(Ipv4Addr::LOCALHOST),
        beacon_interval: Duration::from_millis(50),
        discovery_timeout: Duration::from_millis(100),
        connect_timeout: Duration::from_millis(500),
        retry_delay: Duration::from_millis(20),
        ..NetConfig::default()
    }
}

fn pump_until<F>(host: &mut Game, joiner: &mut Game, timeout_ms: u64, mut done: F) -> bool
where
    F: FnMut(&Game, &Game) -> bool,
{
    let start = Instant::now();
    while start.elapsed() < Duration::from_millis(timeout_ms) {
        host.update(1.0 / 60.0);
        joiner.update(1.0 / 60.0);
        if done(host, joiner) {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

#[test]
fn games_over_loopback_then_restart() {
    let (game_port, discovery_port) = next_ports();
    let mut host = Game::new(
        MatchConfig::default(),
        loopback(PeerRole::Host, game_port, discovery_port),
    );
    let mut joiner = Game::new(
        MatchConfig::default(),
        loopback(PeerRole::Join, game_port, discovery_port),
    );
    host.start_networking().unwrap();
    joiner.start_networking().unwrap();

    assert!(pump_until(&mut host, &mut joiner, 5000, |h, j| {
        h.phase() == MatchPhase::Playing && j.phase() == MatchPhase::Playing
    }));

    let id = host.spawn_toward_enemy(UnitKind::Cavalry).unwrap();
    assert!(pump_until(&mut host, &mut joiner, 2000, |_, j| j.sim().entity(id).is_some()));

    let mirrored = joiner.sim().entity(id).unwrap();
    assert_eq!(mirrored.team, Team::Host);
    assert_eq!(mirrored.kind, EntityKind::Cavalry);

    host.restart().unwrap();
    assert_eq!(host.phase(), MatchPhase::Lobby);
    assert!(host.is_networking());
    assert_eq!(host.sim().entities().len(), 2);
    assert_eq!(host.sim().currency(), 10);

    // The joiner notices the old session closing, drops its match and finds the
    // new listener, which could only bind once the old thread had let go of
    // the game port.
    assert!(pump_until(&mut host, &mut joiner, 5000, |h, j| {
        h.phase() == MatchPhase::Playing
            && j.phase() == MatchPhase::Playing
            && h.is_connected()
            && j.is_connected()
    }));
    assert_eq!(joiner.sim().entities().len(), 2);
    assert!(joiner.sim().entity(id).is_none());
    assert_eq!(joiner.sim().currency(), 10);

    let reused = host.spawn_toward_enemy(UnitKind::Infantry).unwrap();
    assert_eq!(reused, id);
    assert!(pump_until(&mut host, &mut joiner, 2000, |_, j| {
        j.sim().entity(reused).is_some()
    }));
    assert_eq!(joiner.sim().entity(reused).unwrap().kind, EntityKind::Infantry);
    assert_eq!(joiner.sim().entities().len(), 3);
}

#[test]
fn lost_joiner_sends_host_back_to_lobby() {
    let (game_port, discovery_port) = next_ports();
    let mut host = Game::new(
        MatchConfig::default(),
        loopback(PeerRole::Host, game_port, discovery_port),
    );
    let mut joiner = Game::new(
        MatchConfig::default(),
        loopback(PeerRole::Join, game_port, discovery_port),
    );
    host.start_networking().unwrap();
    joiner.start_networking().unwrap();

    assert!(pump_until(&mut host, &mut joiner, 5000, |h, j| {
        h.phase() == MatchPhase::Playing && j.phase() == MatchPhase::Playing
    }));
    host.spawn_toward_enemy(UnitKind::Infantry).unwrap();
    assert_eq!(host.sim().entities().len(), 3);

    drop(joiner);

    let start = Instant::now();
    while host.phase() != MatchPhase::Lobby && start.elapsed() < Duration::from_secs(2) {
        host.update(1.0 / 60.0);
        thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(host.phase(), MatchPhase::Lobby);
    assert!(host.is_networking());
    assert_eq!(host.sim().entities().len(), 2);
    assert_eq!(host.sim().currency(), 10);
}
