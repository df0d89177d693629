use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::config::NetConfig;

use super::connection::{ConnectionState, PeerRole, SharedState};
use super::discovery::{Beacon, DiscoveryListener};
use super::protocol::Command;
use super::queue::{Consumer, Producer, queue};
use super::stats::NetworkStats;
use super::transport::{Transport, TransportEvent};

/// Owns the background network thread. Commands pushed with [`send`] go out
/// on the wire; decoded commands from the peer are collected by
/// [`drain_incoming`].
///
/// [`send`]: NetworkService::send
/// [`drain_incoming`]: NetworkService::drain_incoming
pub struct NetworkService {
    role: PeerRole,
    outgoing: Producer<Command>,
    incoming: Consumer<Command>,
    state: Arc<SharedState>,
    sessions: Arc<AtomicU64>,
    stats: Arc<Mutex<NetworkStats>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl NetworkService {
    pub fn start(config: NetConfig) -> io::Result<Self> {
        let (outgoing_tx, outgoing_rx) = queue();
        let (incoming_tx, incoming_rx) = queue();
        let state = Arc::new(SharedState::new(ConnectionState::Disconnected));
        let sessions = Arc::new(AtomicU64::new(0));
        let stats = Arc::new(Mutex::new(NetworkStats::default()));
        let running = Arc::new(AtomicBool::new(true));
        let role = config.role;

        let worker = Worker {
            config,
            transport: None,
            beacon: None,
            discovery: None,
            outgoing: outgoing_rx,
            incoming: incoming_tx,
            state: Arc::clone(&state),
            sessions: Arc::clone(&sessions),
            stats: Arc::clone(&stats),
            running: Arc::clone(&running),
        };

        let handle = thread::Builder::new()
            .name("frontline-net".into())
            .spawn(move || worker.run())?;

        Ok(Self {
            role,
            outgoing: outgoing_tx,
            incoming: incoming_rx,
            state,
            sessions,
            stats,
            running,
            handle: Some(handle),
        })
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    /// Fire-and-forget. Dropped by the network thread if no peer is connected.
    pub fn send(&self, command: Command) {
        if !self.outgoing.push(command) {
            log::debug!("network thread gone, dropping {:?}", command.kind);
        }
    }

    pub fn drain_incoming(&self) -> Vec<Command> {
        self.incoming.drain()
    }

    pub fn state(&self) -> ConnectionState {
        self.state.load()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Peer connections made since start. A change means the peer on the other
    /// end is not the one seen before.
    pub fn sessions(&self) -> u64 {
        self.sessions.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> NetworkStats {
        self.stats.lock().map(|stats| *stats).unwrap_or_default()
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    /// Clears the running flag, then joins. Safe to call more than once.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);

        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("network thread panicked");
            }
        }
        self.state.store(ConnectionState::Disconnected);
    }
}

impl Drop for NetworkService {
    fn drop(&mut self) {
        self.stop();
    }
}

struct Worker {
    config: NetConfig,
    transport: Option<Transport>,
    beacon: Option<Beacon>,
    discovery: Option<DiscoveryListener>,
    outgoing: Consumer<Command>,
    incoming: Producer<Command>,
    state: Arc<SharedState>,
    sessions: Arc<AtomicU64>,
    stats: Arc<Mutex<NetworkStats>>,
    running: Arc<AtomicBool>,
}

impl Worker {
    fn run(mut self) {
        log::debug!("network thread started as {:?}", self.config.role);

        while self.running.load(Ordering::SeqCst) {
            if self.transport.is_none() {
                match self.config.role {
                    PeerRole::Host => self.open_listener(),
                    PeerRole::Join => self.discover_and_connect(),
                }
            }

            if self.config.role == PeerRole::Host {
                self.announce();
            }

            self.flush_outgoing();
            self.poll_inbound();
            self.publish_stats();

            thread::sleep(self.config.idle_sleep);
        }

        if let Some(mut transport) = self.transport.take() {
            transport.close();
        }
        self.state.store(ConnectionState::Disconnected);
        log::debug!("network thread stopped");
    }

    fn open_listener(&mut self) {
        match Transport::listen(self.config.game_port) {
            Ok(transport) => {
                log::info!("listening on port {}", self.config.game_port);
                self.transport = Some(transport);
                self.state.store(ConnectionState::Listening);
            }
            Err(e) => {
                log::warn!("failed to listen on port {}: {}", self.config.game_port, e);
                thread::sleep(self.config.retry_delay);
            }
        }
    }

    fn announce(&mut self) {
        let connected = self.transport.as_ref().is_some_and(Transport::is_connected);
        if connected {
            return;
        }

        if self.beacon.is_none() {
            let target = SocketAddr::new(self.config.beacon_target, self.config.discovery_port);
            match Beacon::new(target, &self.config.token, self.config.beacon_interval) {
                Ok(beacon) => self.beacon = Some(beacon),
                Err(e) => {
                    log::warn!("failed to open discovery beacon: {}", e);
                    return;
                }
            }
        }

        if let Some(beacon) = self.beacon.as_mut() {
            match beacon.tick() {
                Ok(true) => log::trace!("beacon sent to {}", beacon.target()),
                Ok(false) => {}
                Err(e) => log::debug!("beacon send failed: {}", e),
            }
        }
    }

    fn discover_and_connect(&mut self) {
        self.state.store(ConnectionState::Discovering);

        if self.discovery.is_none() {
            match DiscoveryListener::bind(self.config.discovery_port, &self.config.token) {
                Ok(listener) => self.discovery = Some(listener),
                Err(e) => {
                    log::warn!(
                        "failed to bind discovery port {}: {}",
                        self.config.discovery_port,
                        e
                    );
                    thread::sleep(self.config.retry_delay);
                    return;
                }
            }
        }

        let Some(listener) = self.discovery.as_mut() else {
            return;
        };

        let host = match listener.listen(self.config.discovery_timeout) {
            Ok(Some(ip)) => SocketAddr::new(ip, self.config.game_port),
            Ok(None) => {
                log::debug!("no host found, retrying discovery");
                return;
            }
            Err(e) => {
                log::warn!("discovery failed: {}", e);
                thread::sleep(self.config.retry_delay);
                return;
            }
        };

        log::info!("discovered host at {}", host);
        match Transport::connect(host, self.config.connect_timeout) {
            Ok(transport) => {
                self.transport = Some(transport);
                // Later beacons from this host are stale once connected.
                self.discovery = None;
            }
            Err(e) => {
                log::warn!("failed to connect to {}: {}", host, e);
                thread::sleep(self.config.retry_delay);
            }
        }
    }

    fn flush_outgoing(&mut self) {
        let commands = self.outgoing.drain();
        if commands.is_empty() {
            return;
        }

        let Some(transport) = self.transport.as_mut().filter(|t| t.is_connected()) else {
            log::trace!("no peer connected, dropping {} commands", commands.len());
            return;
        };

        for command in commands {
            if let Err(e) = transport.send(&command.encode()) {
                log::debug!("failed to send {:?}: {}", command.kind, e);
            }
        }
    }

    fn poll_inbound(&mut self) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };

        let mut lost_peer = false;
        for event in transport.poll(self.config.max_inbound_per_poll) {
            match event {
                TransportEvent::Connected(addr) => {
                    log::info!("peer connected: {}", addr);
                    self.sessions.fetch_add(1, Ordering::AcqRel);
                    self.state.store(ConnectionState::Connected);
                }
                TransportEvent::Received(payload) => match Command::decode(&payload) {
                    Ok(command) => {
                        self.incoming.push(command);
                    }
                    Err(e) => {
                        log::trace!("dropping malformed payload: {}", e);
                        transport.stats_mut().record_malformed();
                    }
                },
                TransportEvent::Disconnected => {
                    log::info!("peer disconnected ({})", transport.stats());
                    lost_peer = true;
                }
            }
        }

        if !lost_peer {
            return;
        }

        match self.config.role {
            PeerRole::Host => self.state.store(ConnectionState::Listening),
            PeerRole::Join => {
                self.transport = None;
                self.state.store(ConnectionState::Disconnected);
            }
        }
    }

    fn publish_stats(&self) {
        let Some(transport) = self.transport.as_ref() else {
            return;
        };
        if let Ok(mut shared) = self.stats.lock() {
            *shared = *transport.stats();
        }
    }
}
