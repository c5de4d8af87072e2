//! Handshake and negotiation behavior against a mock broker

mod common;

use fe2o3_amqp091::frames::Frame;
use fe2o3_amqp091::types::methods::connection;
use fe2o3_amqp091::types::Method;
use fe2o3_amqp091::{Connection, ConnectionParameters, Error, PlainCredentials};

use common::{decode_frames, open_connection, server_method, MockTransport};

#[test]
fn test_nothing_precedes_the_protocol_header() {
    let mut conn = Connection::open(ConnectionParameters::default(), MockTransport::default());
    assert!(conn.transport().outbound.is_empty());
    assert_eq!(
        conn.transport().connected_to,
        Some((String::from("localhost"), 5672))
    );

    conn.on_transport_connected();
    assert_eq!(&conn.transport().outbound[..], b"AMQP\x00\x00\x09\x01");

    // user operations on channels are rejected until the handshake is done
    let result = conn.send_method(
        1,
        Method::ConnectionCloseOk(connection::CloseOk),
        None,
    );
    assert!(matches!(result, Err(Error::IllegalState(_))));
}

#[test]
fn test_happy_path_negotiation() {
    // client proposes (0, 131072, 0); server proposes (0, 0, 60)
    let mut conn = Connection::open(ConnectionParameters::default(), MockTransport::default());
    conn.on_transport_connected();

    conn.on_bytes(&server_method(Method::ConnectionStart(
        connection::Start::default(),
    )))
    .unwrap();
    conn.on_bytes(&server_method(Method::ConnectionTune(connection::Tune {
        channel_max: 0,
        frame_max: 0,
        heartbeat: 60,
    })))
    .unwrap();

    let negotiated = conn.negotiated();
    assert_eq!(negotiated.channel_max, 0);
    assert_eq!(negotiated.frame_max, 131072);
    assert_eq!(negotiated.heartbeat, 60);

    let frames = decode_frames(&conn.transport().outbound);
    assert_eq!(frames.len(), 4);
    assert!(matches!(frames[0], Frame::ProtocolHeader(_)));
    match &frames[1] {
        Frame::Method {
            channel: 0,
            method: Method::ConnectionStartOk(start_ok),
        } => {
            assert_eq!(start_ok.mechanism, "PLAIN");
            assert_eq!(&start_ok.response[..], b"\0guest\0guest");
        }
        other => panic!("expected StartOk, got {:?}", other),
    }
    match &frames[2] {
        Frame::Method {
            channel: 0,
            method: Method::ConnectionTuneOk(tune_ok),
        } => {
            assert_eq!(tune_ok.frame_max, 131072);
            assert_eq!(tune_ok.heartbeat, 60);
        }
        other => panic!("expected TuneOk, got {:?}", other),
    }
    match &frames[3] {
        Frame::Method {
            channel: 0,
            method: Method::ConnectionOpen(open),
        } => {
            assert_eq!(open.virtual_host, "/");
            assert!(open.insist);
        }
        other => panic!("expected Open, got {:?}", other),
    }

    assert!(!conn.is_open());
    conn.on_bytes(&server_method(Method::ConnectionOpenOk(
        connection::OpenOk::default(),
    )))
    .unwrap();
    assert!(conn.is_open());
}

#[test]
fn test_on_open_callbacks_fire_once_open() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let opened = Arc::new(AtomicUsize::new(0));
    let observed = opened.clone();

    let mut conn = Connection::open(ConnectionParameters::default(), MockTransport::default());
    conn.add_on_open_callback(fe2o3_amqp091::callbacks::callback(move |conn, _dispatch| {
        assert!(conn.is_open());
        observed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    conn.on_transport_connected();
    conn.on_bytes(&server_method(Method::ConnectionStart(
        connection::Start::default(),
    )))
    .unwrap();
    conn.on_bytes(&server_method(Method::ConnectionTune(
        connection::Tune::default(),
    )))
    .unwrap();
    assert_eq!(opened.load(Ordering::SeqCst), 0);
    conn.on_bytes(&server_method(Method::ConnectionOpenOk(
        connection::OpenOk::default(),
    )))
    .unwrap();
    assert_eq!(opened.load(Ordering::SeqCst), 1);
}

#[test]
fn test_server_version_reject() {
    let mut conn = Connection::open(ConnectionParameters::default(), MockTransport::default());
    conn.on_transport_connected();

    // the server answers the header with its own 0-8 header
    let result = conn.on_bytes(b"AMQP\x00\x00\x08\x00");
    assert!(matches!(
        result,
        Err(Error::ProtocolVersionMismatch {
            local: (0, 9),
            remote: (0, 8),
        })
    ));

    // no StartOk went out, only our original header
    assert_eq!(&conn.transport().outbound[..], b"AMQP\x00\x00\x09\x01");
    assert_eq!(conn.transport().disconnects, 1);
    assert!(!conn.is_open());
}

#[test]
fn test_start_with_wrong_version_pair() {
    let mut conn = Connection::open(ConnectionParameters::default(), MockTransport::default());
    conn.on_transport_connected();

    let start = connection::Start {
        version_major: 8,
        version_minor: 0,
        ..Default::default()
    };
    let result = conn.on_bytes(&server_method(Method::ConnectionStart(start)));
    assert!(matches!(
        result,
        Err(Error::ProtocolVersionMismatch { .. })
    ));
    assert_eq!(conn.transport().disconnects, 1);
}

#[test]
fn test_login_error_when_mechanism_unsupported() {
    let mut conn = Connection::open(ConnectionParameters::default(), MockTransport::default());
    conn.on_transport_connected();

    let start = connection::Start {
        mechanisms: bytes::Bytes::from_static(b"EXTERNAL"),
        ..Default::default()
    };
    let result = conn.on_bytes(&server_method(Method::ConnectionStart(start)));
    assert!(matches!(result, Err(Error::LoginError(_))));
    // teardown happened without a StartOk
    assert_eq!(&conn.transport().outbound[..], b"AMQP\x00\x00\x09\x01");
}

#[test]
fn test_credentials_are_erased_after_start_ok() {
    let mut conn = Connection::<MockTransport>::builder()
        .credentials(PlainCredentials::new("user", "secret"))
        .open(MockTransport::default());
    conn.on_transport_connected();
    conn.on_bytes(&server_method(Method::ConnectionStart(
        connection::Start::default(),
    )))
    .unwrap();
    assert!(conn.transport().credentials_erased);
}

#[test]
fn test_undersized_frame_max_is_clamped() {
    let parameters = ConnectionParameters {
        frame_max: 512,
        ..Default::default()
    };
    let conn = open_connection(parameters, connection::Tune::default());
    assert_eq!(conn.negotiated().frame_max, 4096);
}

#[test]
fn test_zero_means_no_preference_for_every_tunable() {
    let parameters = ConnectionParameters {
        channel_max: 0,
        frame_max: 131072,
        heartbeat: 30,
        ..Default::default()
    };
    let conn = open_connection(
        parameters,
        connection::Tune {
            channel_max: 256,
            frame_max: 65536,
            heartbeat: 0,
        },
    );
    let negotiated = conn.negotiated();
    assert_eq!(negotiated.channel_max, 256);
    assert_eq!(negotiated.frame_max, 65536);
    assert_eq!(negotiated.heartbeat, 30);
}
