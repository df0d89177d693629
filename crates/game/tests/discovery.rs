use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use frontline::net::{Beacon, DISCOVERY_TOKEN, DiscoveryListener};

static PORT_COUNTER: AtomicU16 = AtomicU16::new(42100);

fn next_port() -> u16 {
    PORT_COUNTER.fetch_add(1, Ordering::SeqCst)
}

fn loopback(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
}

#[test]
fn joiner_finds_host_address() {
    let port = next_port();
    let mut listener = DiscoveryListener::bind(port, DISCOVERY_TOKEN).unwrap();
    let mut beacon = Beacon::new(loopback(port), DISCOVERY_TOKEN, Duration::from_secs(1)).unwrap();

    beacon.send_now().unwrap();

    let found = listener.listen(Duration::from_secs(1)).unwrap();
    assert_eq!(found, Some(IpAddr::V4(Ipv4Addr::LOCALHOST)));
}

#[test]
fn foreign_token_is_ignored() {
    let port = next_port();
    let mut listener = DiscoveryListener::bind(port, DISCOVERY_TOKEN).unwrap();
    let mut beacon = Beacon::new(loopback(port), "SOMEONE_ELSE", Duration::from_secs(1)).unwrap();

    beacon.send_now().unwrap();

    let found = listener.listen(Duration::from_millis(200)).unwrap();
    assert_eq!(found, None);
}
