//! Content fragmentation and reassembly

mod common;

use std::sync::Arc;
use std::sync::Mutex;

use bytes::Bytes;
use fe2o3_amqp091::callbacks::{callback, Key};
use fe2o3_amqp091::frames::Frame;
use fe2o3_amqp091::types::methods::{basic, channel, connection};
use fe2o3_amqp091::types::{BasicProperties, ContentHeader, Method};
use fe2o3_amqp091::{ConnectionParameters, Dispatch};

use common::{channel_method, decode_frames, frame_bytes, open_connection, MockTransport};

fn open_with_frame_max(frame_max: u32) -> fe2o3_amqp091::Connection<MockTransport> {
    let parameters = ConnectionParameters {
        frame_max,
        ..Default::default()
    };
    open_connection(parameters, connection::Tune::default())
}

fn open_channel_on(
    conn: &mut fe2o3_amqp091::Connection<MockTransport>,
) -> u16 {
    let number = conn.open_channel(callback(|_c, _d| Ok(()))).unwrap();
    conn.on_bytes(&channel_method(
        number,
        Method::ChannelOpenOk(channel::OpenOk::default()),
    ))
    .unwrap();
    conn.transport_mut().outbound.clear();
    number
}

#[test]
fn test_publish_fragments_body_at_frame_max() {
    let mut conn = open_with_frame_max(4096);
    let number = open_channel_on(&mut conn);

    let body = Bytes::from(vec![0xABu8; 10_000]);
    conn.send_method(
        number,
        Method::BasicPublish(basic::Publish {
            routing_key: "work".into(),
            ..Default::default()
        }),
        Some((BasicProperties::default(), body.clone())),
    )
    .unwrap();

    let frames = decode_frames(&conn.transport().outbound);
    assert_eq!(frames.len(), 5);
    assert!(matches!(
        frames[0],
        Frame::Method {
            method: Method::BasicPublish(_),
            ..
        }
    ));
    match &frames[1] {
        Frame::ContentHeader { header, .. } => assert_eq!(header.body_size, 10_000),
        other => panic!("expected content header, got {:?}", other),
    }

    let mut sizes = Vec::new();
    let mut reassembled = Vec::new();
    for frame in &frames[2..] {
        match frame {
            Frame::ContentBody { payload, .. } => {
                sizes.push(payload.len());
                reassembled.extend_from_slice(payload);
            }
            other => panic!("expected content body, got {:?}", other),
        }
    }
    assert_eq!(sizes, vec![4088, 4088, 1824]);
    assert_eq!(reassembled, body.to_vec());
}

#[test]
fn test_body_without_properties_still_gets_a_header() {
    let mut conn = open_with_frame_max(131072);
    let number = open_channel_on(&mut conn);

    conn.send_method(
        number,
        Method::BasicPublish(basic::Publish::default()),
        Some((BasicProperties::default(), Bytes::from_static(b"hi"))),
    )
    .unwrap();
    let frames = decode_frames(&conn.transport().outbound);
    assert_eq!(frames.len(), 3);
}

#[test]
fn test_empty_body_emits_no_body_frames() {
    let mut conn = open_with_frame_max(131072);
    let number = open_channel_on(&mut conn);

    conn.send_method(
        number,
        Method::BasicPublish(basic::Publish::default()),
        Some((BasicProperties::default(), Bytes::new())),
    )
    .unwrap();
    let frames = decode_frames(&conn.transport().outbound);
    assert_eq!(frames.len(), 2);
    match &frames[1] {
        Frame::ContentHeader { header, .. } => assert_eq!(header.body_size, 0),
        other => panic!("expected content header, got {:?}", other),
    }
}

#[test]
fn test_inbound_content_is_delivered_as_a_unit() {
    let mut conn = open_with_frame_max(131072);
    let number = open_channel_on(&mut conn);

    let deliveries = Arc::new(Mutex::new(Vec::new()));
    let sink = deliveries.clone();
    conn.add_callback(
        number,
        Key::Receive,
        callback(move |_conn, dispatch| {
            if let Dispatch::Content { header, body, .. } = dispatch {
                sink.lock().unwrap().push((header.body_size, body.clone()));
            }
            Ok(())
        }),
        false,
    );

    let properties = BasicProperties {
        delivery_mode: Some(2),
        ..Default::default()
    };
    conn.on_bytes(&frame_bytes(Frame::ContentHeader {
        channel: number,
        header: ContentHeader::new(10, properties),
    }))
    .unwrap();
    assert!(deliveries.lock().unwrap().is_empty());

    conn.on_bytes(&frame_bytes(Frame::ContentBody {
        channel: number,
        payload: Bytes::from_static(b"hello"),
    }))
    .unwrap();
    assert!(deliveries.lock().unwrap().is_empty());

    conn.on_bytes(&frame_bytes(Frame::ContentBody {
        channel: number,
        payload: Bytes::from_static(b"world"),
    }))
    .unwrap();

    let got = deliveries.lock().unwrap();
    assert_eq!(got.len(), 1);
    assert_eq!(got[0].0, 10);
    assert_eq!(&got[0].1[..], b"helloworld");
}

#[test]
fn test_second_header_before_body_completes_is_a_channel_offense() {
    let mut conn = open_with_frame_max(131072);
    let number = open_channel_on(&mut conn);

    let header = Frame::ContentHeader {
        channel: number,
        header: ContentHeader::new(10, BasicProperties::default()),
    };
    conn.on_bytes(&frame_bytes(header.clone())).unwrap();
    conn.on_bytes(&frame_bytes(header)).unwrap();

    // the channel gets a 505 close; the connection survives
    let frames = decode_frames(&conn.transport().outbound);
    match &frames[..] {
        [Frame::Method {
            channel: 1,
            method: Method::ChannelClose(close),
        }] => assert_eq!(close.reply_code, 505),
        other => panic!("expected a channel close, got {:?}", other),
    }
    assert!(conn.is_open());
}

#[test]
fn test_body_without_header_is_a_channel_offense() {
    let mut conn = open_with_frame_max(131072);
    let number = open_channel_on(&mut conn);

    conn.on_bytes(&frame_bytes(Frame::ContentBody {
        channel: number,
        payload: Bytes::from_static(b"stray"),
    }))
    .unwrap();

    let frames = decode_frames(&conn.transport().outbound);
    assert!(matches!(
        frames[..],
        [Frame::Method {
            channel: 1,
            method: Method::ChannelClose(_),
        }]
    ));
    assert!(conn.is_open());
}
