//! Performance benchmarks for the relay hot paths

use server::directory::SessionDirectory;
use server::routing::{BroadcastStrategy, Router};
use shared::{decode, decode_roster, encode, encode_roster, Message, MessageKind, WireFormat};
use std::net::SocketAddr;
use std::time::Instant;

fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

fn populated_directory(sessions: u16) -> SessionDirectory {
    let mut directory = SessionDirectory::new();
    for i in 0..sessions {
        let id = format!("u{}", i);
        directory.upsert_on_join(&id, &format!("User {}", i), addr(10_000 + i));
        let room = if i % 2 == 0 { "game" } else { "learn" };
        directory.set_room(&id, room);
    }
    directory
}

/// Benchmarks delimited encode/decode of a typical chat line
#[test]
fn benchmark_delimited_codec() {
    let message = Message::new(
        MessageKind::Multicast,
        "a1b2c3",
        "Alice",
        "anyone up for a game tonight?",
        "game",
    );

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let bytes = encode(&message);
        let decoded = decode(&bytes).unwrap();
        assert_eq!(decoded.kind, MessageKind::Multicast);
    }

    let duration = start.elapsed();
    println!(
        "Delimited codec: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    // Should complete in under 2 seconds
    assert!(duration.as_millis() < 2000);
}

/// Benchmarks the binary wire format on the same message
#[test]
fn benchmark_binary_codec() {
    let message = Message::new(MessageKind::Broadcast, "a1b2c3", "Alice", "hi", "");
    let wire = WireFormat::Binary;

    let iterations = 100_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let bytes = wire.encode(&message).unwrap();
        let _ = wire.decode(&bytes).unwrap();
    }

    let duration = start.elapsed();
    println!(
        "Binary codec: {} iterations in {:?} ({:.2} ns/iter)",
        iterations,
        duration,
        duration.as_nanos() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 2000);
}

/// Benchmarks escaping of bodies full of reserved bytes
#[test]
fn benchmark_escaped_payloads() {
    let body = "\u{1}\u{2}\u{3}\u{10}".repeat(256);
    let message = Message::new(MessageKind::Broadcast, "u1", "Alice", body.as_str(), "");

    let iterations = 10_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let decoded = decode(&encode(&message)).unwrap();
        assert_eq!(decoded.body.len(), body.len());
    }

    let duration = start.elapsed();
    println!(
        "Escaped payloads: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 3000);
}

/// Benchmarks roster encoding for a busy server
#[test]
fn benchmark_roster_codec() {
    let directory = populated_directory(200);
    let entries = directory.roster();

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        let body = encode_roster(&entries);
        let decoded = decode_roster(&body).unwrap();
        assert_eq!(decoded.len(), 200);
    }

    let duration = start.elapsed();
    println!(
        "Roster codec (200 entries): {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 3000);
}

/// Benchmarks directory queries used on every broadcast and multicast
#[test]
fn benchmark_directory_queries() {
    let directory = populated_directory(200);

    let iterations = 1_000;
    let start = Instant::now();

    for _ in 0..iterations {
        assert_eq!(directory.snapshot_alive().len(), 200);
        assert_eq!(directory.members_of_room("game").len(), 100);
        assert!(directory.address_of("u199").is_ok());
    }

    let duration = start.elapsed();
    println!(
        "Directory queries (200 sessions): {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );

    assert!(duration.as_millis() < 3000);
}

/// Stress test: route a burst of broadcasts through a full directory
#[test]
fn stress_test_routing_burst() {
    let mut directory = populated_directory(200);
    let router = Router::new(BroadcastStrategy::Directory);

    let iterations = 1_000;
    let start = Instant::now();
    let mut datagrams = 0usize;

    for i in 0..iterations {
        let sender = format!("u{}", i % 200);
        let message = Message::new(MessageKind::Broadcast, sender.as_str(), "User", "hi", "");
        let delivery = router
            .route(&mut directory, message, addr(10_000 + (i % 200) as u16))
            .unwrap();
        datagrams += delivery.destinations.len();
    }

    let duration = start.elapsed();
    println!(
        "Routing burst: {} messages -> {} datagrams in {:?}",
        iterations, datagrams, duration
    );

    assert_eq!(datagrams, iterations * 200);
    assert!(duration.as_millis() < 5000);
}
