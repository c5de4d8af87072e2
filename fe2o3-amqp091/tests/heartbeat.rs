//! Heartbeat surveillance against a silent or chatty peer

mod common;

use std::time::Duration;

use fe2o3_amqp091::frames::Frame;
use fe2o3_amqp091::types::methods::connection;
use fe2o3_amqp091::{ConnectionParameters, Error};

use common::{decode_frames, frame_bytes, open_connection, MockTransport};

fn open_with_heartbeat(interval: u16) -> fe2o3_amqp091::Connection<MockTransport> {
    open_connection(
        ConnectionParameters::default(),
        connection::Tune {
            channel_max: 0,
            frame_max: 0,
            heartbeat: interval,
        },
    )
}

#[test]
fn test_no_timer_without_heartbeat() {
    let conn = open_connection(ConnectionParameters::default(), connection::Tune::default());
    assert!(conn.transport().timers.is_empty());
}

#[test]
fn test_timer_scheduled_at_half_interval() {
    let conn = open_with_heartbeat(60);
    assert_eq!(conn.transport().timers, vec![Duration::from_secs(30)]);
}

#[test]
fn test_tick_emits_heartbeat_frame_and_reschedules() {
    let mut conn = open_with_heartbeat(60);
    conn.on_timer_tick().unwrap();

    // exactly the 8-byte heartbeat envelope
    assert_eq!(
        &conn.transport().outbound[..],
        &[8, 0, 0, 0, 0, 0, 0, 0xCE]
    );
    assert_eq!(conn.transport().timers.len(), 2);
}

#[test]
fn test_stale_connection_detected_exactly_once() {
    let mut conn = open_with_heartbeat(60);

    // the handshake counted as traffic, so the first silent tick resets to
    // a clean slate; 2 * 60s of silence then elapses over the next four
    let mut failures = 0;
    let mut sends = 0;
    for _ in 0..5 {
        match conn.on_timer_tick() {
            Ok(()) => sends += 1,
            Err(Error::HeartbeatTimeout) => failures += 1,
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }
    assert_eq!(sends, 4);
    assert_eq!(failures, 1);
    assert!(!conn.is_open());
    assert_eq!(conn.transport().disconnects, 1);

    // further ticks on the dead connection are ignored
    conn.on_timer_tick().unwrap();
    assert_eq!(conn.transport().disconnects, 1);
}

#[test]
fn test_inbound_bytes_reset_the_idle_counter() {
    let mut conn = open_with_heartbeat(60);

    for _ in 0..3 {
        conn.on_timer_tick().unwrap();
    }
    // peer heartbeats arrive: counter resets, connection stays up
    conn.on_bytes(&frame_bytes(Frame::Heartbeat)).unwrap();
    for _ in 0..3 {
        conn.on_timer_tick().unwrap();
    }
    assert!(conn.is_open());
}

#[test]
fn test_inbound_heartbeats_are_not_delivered_to_user_code() {
    use fe2o3_amqp091::callbacks::{callback, Key};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let mut conn = open_with_heartbeat(60);
    let delivered = Arc::new(AtomicUsize::new(0));
    let observed = delivered.clone();
    conn.add_callback(
        0,
        Key::Receive,
        callback(move |_conn, _dispatch| {
            observed.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }),
        false,
    );
    conn.on_bytes(&frame_bytes(Frame::Heartbeat)).unwrap();
    assert_eq!(delivered.load(Ordering::SeqCst), 0);
    assert!(conn.is_open());
}

#[test]
fn test_outbound_heartbeats_decode_as_heartbeat_frames() {
    let mut conn = open_with_heartbeat(10);
    conn.on_timer_tick().unwrap();
    conn.on_timer_tick().unwrap();
    let frames = decode_frames(&conn.transport().outbound);
    assert_eq!(frames, vec![Frame::Heartbeat, Frame::Heartbeat]);
}
