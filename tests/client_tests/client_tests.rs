//! Client Tests
//!
//! Tests for the command façade and low-level API over a scripted transport.

use std::time::Duration;

use resplite::{
    Arg, Client, ClientConfig, Endpoint, Numeric, ReplyKind, RespError, ScriptedTransport,
    ServerTime, Transport, Ttl,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn test_config() -> ClientConfig {
    ClientConfig::builder().reply_timeout_ms(50).build()
}

fn client_with(replies: &[&[u8]]) -> Client<ScriptedTransport> {
    let transport = ScriptedTransport::with_replies(replies.iter().copied());
    Client::with_transport(transport, test_config()).unwrap()
}

fn written(client: &Client<ScriptedTransport>, idx: usize) -> &[u8] {
    &client.transport().written()[idx]
}

// =============================================================================
// Connection Tests
// =============================================================================

#[test]
fn test_connects_lazily() {
    let mut client = client_with(&[b"+PONG\r\n"]);
    assert!(!client.is_connected());
    assert!(client.transport().opened().is_empty());

    client.ping().unwrap();

    assert!(client.is_connected());
    assert_eq!(client.transport().opened(), &[Endpoint::new("127.0.0.1", 6379)]);
    assert_eq!(written(&client, 0), b"*1\r\n$4\r\nPING\r\n");
}

#[test]
fn test_refused_connection_is_reported() {
    let mut client = client_with(&[]);
    client.transport_mut().refuse_connections(true);

    assert!(matches!(client.ping(), Err(RespError::Connect { .. })));
    assert!(!client.is_connected());
    assert!(client.transport().written().is_empty());
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = ClientConfig::builder().buffer_capacity(4).build();
    let result = Client::with_transport(ScriptedTransport::new(), config);
    assert!(matches!(result, Err(RespError::Config(_))));
}

#[test]
fn test_connect_to_other_endpoint() {
    let mut client = client_with(&[b"+PONG\r\n"]);
    client.connect().unwrap();
    client.connect_to(Endpoint::new("10.0.0.2", 6380)).unwrap();
    client.ping().unwrap();

    assert_eq!(client.endpoint(), &Endpoint::new("10.0.0.2", 6380));
    assert_eq!(client.transport().opened().len(), 2);
}

// =============================================================================
// String Command Tests
// =============================================================================

#[test]
fn test_set_then_get() {
    let mut client = client_with(&[b"+OK\r\n", b"$3\r\nbar\r\n"]);
    let mut value = [0u8; 16];

    client.set("foo", "bar").unwrap();
    let len = client.get("foo", &mut value).unwrap();

    assert_eq!(len, Some(3));
    assert_eq!(&value[..3], b"bar");
    assert_eq!(written(&client, 0), b"*3\r\n$3\r\nSET\r\n$3\r\nfoo\r\n$3\r\nbar\r\n");
    assert_eq!(written(&client, 1), b"*2\r\n$3\r\nGET\r\n$3\r\nfoo\r\n");
}

#[test]
fn test_get_missing_key() {
    let mut client = client_with(&[b"$-1\r\n"]);
    let mut value = [0u8; 16];
    assert_eq!(client.get("nope", &mut value).unwrap(), None);
}

#[test]
fn test_get_into_small_buffer_keeps_session() {
    let mut client = client_with(&[b"$5\r\nhello\r\n", b"+PONG\r\n"]);
    let mut value = [0u8; 2];

    assert!(matches!(
        client.get("greeting", &mut value),
        Err(RespError::DestinationTooSmall { needed: 5, capacity: 2 })
    ));
    assert!(client.is_connected());

    client.ping().unwrap();
    assert_eq!(client.transport().opened().len(), 1);
}

#[test]
fn test_oversized_command_is_never_sent() {
    let config = ClientConfig::builder()
        .buffer_capacity(32)
        .reply_timeout_ms(50)
        .build();
    let mut client = Client::with_transport(ScriptedTransport::new(), config).unwrap();

    let err = client.set("key", [b'x'; 64]).unwrap_err();
    assert!(matches!(err, RespError::CommandTooLarge { capacity: 32, .. }));
    assert!(client.transport().written().is_empty());
}

#[test]
fn test_append_returns_length() {
    let mut client = client_with(&[b":11\r\n"]);
    assert_eq!(client.append("greeting", " world").unwrap(), 11);
}

#[test]
fn test_counters() {
    let mut client = client_with(&[b":1\r\n", b":0\r\n", b":-10\r\n", b":-5\r\n"]);

    assert_eq!(client.incr("n").unwrap(), Numeric::Exact(1));
    assert_eq!(client.decr("n").unwrap(), Numeric::Exact(0));
    assert_eq!(client.decr_by("n", 10).unwrap(), Numeric::Exact(-10));
    assert_eq!(client.incr_by("n", 5).unwrap(), Numeric::Exact(-5));

    assert_eq!(written(&client, 2), b"*3\r\n$6\r\nDECRBY\r\n$1\r\nn\r\n$2\r\n10\r\n");
}

#[test]
fn test_counter_wider_than_i64() {
    let mut client = client_with(&[b":99999999999999999999\r\n"]);

    match client.incr("big").unwrap() {
        Numeric::Raw(text) => assert_eq!(text.as_str(), "99999999999999999999"),
        other => panic!("expected Raw, got {other:?}"),
    }
    assert!(client.is_connected());
}

#[test]
fn test_incr_by_float() {
    let mut client = client_with(&[b"$4\r\n3.75\r\n"]);
    let mut value = [0u8; 32];

    let len = client.incr_by_float("f", 1.25, &mut value).unwrap();

    assert_eq!(&value[..len], b"3.75");
    assert_eq!(
        written(&client, 0),
        b"*3\r\n$11\r\nINCRBYFLOAT\r\n$1\r\nf\r\n$4\r\n1.25\r\n"
    );
}

// =============================================================================
// Keyspace Command Tests
// =============================================================================

#[test]
fn test_flags() {
    let mut client = client_with(&[b":1\r\n", b":0\r\n", b":1\r\n", b":0\r\n"]);

    assert!(client.exists("a").unwrap());
    assert!(!client.del("missing").unwrap());
    assert!(client.expire("a", 60).unwrap());
    assert!(!client.persist("a").unwrap());
}

#[test]
fn test_ttl_states() {
    let mut client = client_with(&[b":-2\r\n", b":-1\r\n", b":30\r\n"]);

    assert_eq!(client.ttl("gone").unwrap(), Ttl::Missing);
    assert_eq!(client.ttl("forever").unwrap(), Ttl::NoExpiry);
    assert_eq!(
        client.ttl("soon").unwrap(),
        Ttl::ExpiresIn(Duration::from_secs(30))
    );
}

#[test]
fn test_time() {
    let mut client = client_with(&[b"*2\r\n$10\r\n1700000000\r\n$6\r\n123456\r\n"]);

    let time = client.time().unwrap();

    assert_eq!(
        time,
        ServerTime {
            seconds: 1_700_000_000,
            micros: 123_456
        }
    );
    assert_eq!(
        time.as_duration(),
        Duration::from_secs(1_700_000_000) + Duration::from_micros(123_456)
    );
}

#[test]
fn test_time_with_wrong_shape() {
    let mut client = client_with(&[b"*1\r\n$1\r\n1\r\n", b"+PONG\r\n"]);

    assert!(matches!(client.time(), Err(RespError::Protocol(_))));
    // The odd reply was drained, not left for the next command
    client.ping().unwrap();
}

// =============================================================================
// List and Hash Command Tests
// =============================================================================

#[test]
fn test_rpush_variadic() {
    let mut client = client_with(&[b":2\r\n"]);

    let len = client
        .rpush("list", &[Arg::from("a"), Arg::from(2i64)])
        .unwrap();

    assert_eq!(len, 2);
    assert_eq!(
        written(&client, 0),
        b"*4\r\n$5\r\nRPUSH\r\n$4\r\nlist\r\n$1\r\na\r\n$1\r\n2\r\n"
    );
}

#[test]
fn test_push_requires_values() {
    let mut client = client_with(&[]);

    assert!(matches!(
        client.lpush("list", &[]),
        Err(RespError::InvalidArgument(_))
    ));
    assert!(client.transport().written().is_empty());
}

#[test]
fn test_list_reads() {
    let mut client = client_with(&[
        b"$1\r\na\r\n",
        b"$-1\r\n",
        b":3\r\n",
        b"+OK\r\n",
        b"+OK\r\n",
        b"$1\r\nz\r\n",
    ]);
    let mut value = [0u8; 8];

    assert_eq!(client.lindex("list", 0, &mut value).unwrap(), Some(1));
    assert_eq!(&value[..1], b"a");
    assert_eq!(client.lindex("list", 99, &mut value).unwrap(), None);
    assert_eq!(client.llen("list").unwrap(), 3);
    client.lset("list", -1, "z").unwrap();
    client.ltrim("list", 0, -1).unwrap();
    assert_eq!(client.lpop("list", &mut value).unwrap(), Some(1));
    assert_eq!(&value[..1], b"z");

    assert_eq!(
        written(&client, 1),
        b"*3\r\n$6\r\nLINDEX\r\n$4\r\nlist\r\n$2\r\n99\r\n"
    );
    assert_eq!(
        written(&client, 3),
        b"*4\r\n$4\r\nLSET\r\n$4\r\nlist\r\n$2\r\n-1\r\n$1\r\nz\r\n"
    );
}

#[test]
fn test_hash_commands() {
    let mut client = client_with(&[b":1\r\n", b"$3\r\nval\r\n", b":1\r\n", b":1\r\n"]);
    let mut value = [0u8; 8];

    assert!(client.hset("h", "f", "val").unwrap());
    assert_eq!(client.hget("h", "f", &mut value).unwrap(), Some(3));
    assert_eq!(&value[..3], b"val");
    assert!(client.hexists("h", "f").unwrap());
    assert!(client.hdel("h", "f").unwrap());

    assert_eq!(
        written(&client, 1),
        b"*3\r\n$4\r\nHGET\r\n$1\r\nh\r\n$1\r\nf\r\n"
    );
}

// =============================================================================
// Reply Error Tests
// =============================================================================

#[test]
fn test_server_error_keeps_session() {
    let mut client = client_with(&[b"-ERR value is not an integer\r\n", b"+PONG\r\n"]);

    match client.incr("text") {
        Err(RespError::Server(message)) => assert_eq!(message, "ERR value is not an integer"),
        other => panic!("expected Server error, got {other:?}"),
    }
    assert!(client.is_connected());
    client.ping().unwrap();
}

#[test]
fn test_unexpected_reply_kind() {
    let mut client = client_with(&[b":1\r\n", b"+PONG\r\n"]);
    let mut value = [0u8; 8];

    assert!(matches!(
        client.get("k", &mut value),
        Err(RespError::UnexpectedReply {
            expected: ReplyKind::Bulk,
            actual: ReplyKind::Integer,
        })
    ));
    client.ping().unwrap();
    assert!(client.transport().unread().is_empty());
}

#[test]
fn test_timeout_drops_session_then_reconnects() {
    let mut client = client_with(&[]);

    assert!(matches!(client.ping(), Err(RespError::Timeout(_))));
    assert!(!client.is_connected());
    assert_eq!(client.transport().closes(), 1);

    client.transport_mut().push_reply("+PONG\r\n");
    client.ping().unwrap();
    assert_eq!(client.transport().opened().len(), 2);
}

#[test]
fn test_out_of_range_integer_keeps_session() {
    let mut client = client_with(&[b":99999999999999999999\r\n", b"+PONG\r\n"]);

    assert!(matches!(client.llen("list"), Err(RespError::OutOfRange(_))));
    assert!(client.is_connected());
    assert_eq!(client.transport().closes(), 0);

    client.ping().unwrap();
    assert_eq!(client.transport().opened().len(), 1);
}

#[test]
fn test_malformed_reply_drops_session() {
    let mut client = client_with(&[b":12x\r\n"]);

    assert!(matches!(client.llen("list"), Err(RespError::Protocol(_))));
    assert!(!client.is_connected());
}

#[test]
fn test_stale_bytes_are_discarded() {
    let mut client = client_with(&[b"+PONG\r\n"]);
    client.connect().unwrap();
    client.transport_mut().push_unsolicited(":99\r\n");

    client.ping().unwrap();
    assert!(client.transport().unread().is_empty());
}

// =============================================================================
// Low-level API Tests
// =============================================================================

#[test]
fn test_low_level_command() {
    let mut client = client_with(&[b"$2\r\nhi\r\n"]);
    let mut value = [0u8; 8];

    client.start_command(2).unwrap();
    client.add_arg("GET").unwrap();
    client.add_arg("greeting").unwrap();
    client.send().unwrap();

    assert_eq!(client.reply_kind().unwrap(), ReplyKind::Bulk);
    assert_eq!(client.reply_kind().unwrap(), ReplyKind::Bulk);
    assert_eq!(client.read_bulk(&mut value).unwrap(), Some(2));
    assert_eq!(&value[..2], b"hi");
}

#[test]
fn test_frame_is_sent_only_once() {
    let mut client = client_with(&[b"+PONG\r\n", b"+PONG\r\n"]);
    client.ping().unwrap();

    assert!(matches!(
        client.send(),
        Err(RespError::IncompleteCommand { declared: 1, appended: 0 })
    ));
    assert_eq!(client.transport().written().len(), 1);
    assert!(client.transport().unread().is_empty());
}

#[test]
fn test_each_low_level_send_gets_a_fresh_reply() {
    let mut client = client_with(&[b":1\r\n", b":2\r\n"]);

    for expected in 1..=2 {
        client.start_command(2).unwrap();
        client.add_arg("INCR").unwrap();
        client.add_arg("n").unwrap();
        client.send().unwrap();
        assert_eq!(client.reply_kind().unwrap(), ReplyKind::Integer);
        assert_eq!(client.read_integer().unwrap(), expected);
    }
    assert_eq!(client.reply_kind().unwrap(), ReplyKind::None);
}

#[test]
fn test_low_level_incomplete_command_not_sent() {
    let mut client = client_with(&[]);

    client.start_command(3).unwrap();
    client.add_arg("SET").unwrap();
    client.add_integer_arg(1).unwrap();

    assert!(matches!(
        client.send(),
        Err(RespError::IncompleteCommand { declared: 3, appended: 2 })
    ));
    assert!(client.transport().written().is_empty());
}

#[test]
fn test_low_level_status_and_error() {
    let mut client = client_with(&[b"+OK\r\n", b"-ERR syntax\r\n"]);
    let mut line = [0u8; 32];

    client.start_command(1).unwrap();
    client.add_arg("PING").unwrap();
    client.send().unwrap();
    let len = client.read_status(&mut line).unwrap();
    assert_eq!(&line[..len], b"OK");

    client.start_command(2).unwrap();
    client.add_arg("ECHO").unwrap();
    client.add_float_arg(0.5).unwrap();
    client.send().unwrap();
    assert_eq!(client.reply_kind().unwrap(), ReplyKind::Error);
    let len = client.read_error(&mut line).unwrap();
    assert_eq!(&line[..len], b"ERR syntax");
}

#[test]
fn test_execute_named() {
    let mut client = client_with(&[b":15\r\n"]);

    let kind = client
        .execute_named("incrby", &[Arg::from("n"), Arg::from(5i64)])
        .unwrap();

    assert_eq!(kind, ReplyKind::Integer);
    assert_eq!(client.read_integer().unwrap(), 15);
}

#[test]
fn test_execute_named_checks_shapes() {
    let mut client = client_with(&[]);

    assert!(client.execute_named("FLUSHALL", &[]).is_err());
    assert!(matches!(
        client.execute_named("INCRBY", &[Arg::from("n"), Arg::from("five")]),
        Err(RespError::InvalidArgument(_))
    ));
    assert!(client.transport().written().is_empty());
}

// =============================================================================
// Pub/sub Tests
// =============================================================================

const SUBSCRIBED: &[u8] = b"*3\r\n$9\r\nsubscribe\r\n$4\r\nnews\r\n:1\r\n";

#[test]
fn test_subscribe_and_receive() {
    let mut client = client_with(&[SUBSCRIBED]);

    assert_eq!(client.subscribe("news").unwrap(), 1);
    assert_eq!(
        written(&client, 0),
        b"*2\r\n$9\r\nSUBSCRIBE\r\n$4\r\nnews\r\n"
    );

    client
        .transport_mut()
        .push_unsolicited("*3\r\n$7\r\nmessage\r\n$4\r\nnews\r\n$5\r\nhello\r\n");

    let mut channel = [0u8; 16];
    let mut payload = [0u8; 16];
    let message = client.next_message(&mut channel, &mut payload).unwrap();

    assert_eq!(&channel[..message.channel_len], b"news");
    assert_eq!(&payload[..message.payload_len], b"hello");
}

#[test]
fn test_next_message_skips_confirmations() {
    let mut client = client_with(&[SUBSCRIBED, b"*3\r\n$9\r\nsubscribe\r\n$6\r\nsports\r\n:2\r\n"]);
    client.subscribe("news").unwrap();
    assert_eq!(client.subscribe("sports").unwrap(), 2);

    client
        .transport_mut()
        .push_unsolicited("*3\r\n$9\r\nsubscribe\r\n$5\r\nextra\r\n:3\r\n");
    client
        .transport_mut()
        .push_unsolicited("*3\r\n$7\r\nmessage\r\n$6\r\nsports\r\n$4\r\ngoal\r\n");

    let mut channel = [0u8; 16];
    let mut payload = [0u8; 16];
    let message = client.next_message(&mut channel, &mut payload).unwrap();

    assert_eq!(&channel[..message.channel_len], b"sports");
    assert_eq!(&payload[..message.payload_len], b"goal");
}

#[test]
fn test_oversized_message_keeps_stream_aligned() {
    let mut client = client_with(&[SUBSCRIBED]);
    client.subscribe("news").unwrap();

    client
        .transport_mut()
        .push_unsolicited("*3\r\n$7\r\nmessage\r\n$4\r\nnews\r\n$12\r\nhello, world\r\n");
    client
        .transport_mut()
        .push_unsolicited("*3\r\n$7\r\nmessage\r\n$4\r\nnews\r\n$2\r\nok\r\n");

    let mut channel = [0u8; 16];
    let mut payload = [0u8; 4];
    assert!(matches!(
        client.next_message(&mut channel, &mut payload),
        Err(RespError::DestinationTooSmall { needed: 12, capacity: 4 })
    ));

    let message = client.next_message(&mut channel, &mut payload).unwrap();
    assert_eq!(&payload[..message.payload_len], b"ok");
}

#[test]
fn test_subscribed_client_rejects_other_commands() {
    let mut client = client_with(&[SUBSCRIBED]);
    client.subscribe("news").unwrap();

    assert!(matches!(
        client.publish("news", "hi"),
        Err(RespError::InvalidArgument(_))
    ));
    assert_eq!(client.transport().written().len(), 1);

    // Disconnecting leaves subscriber mode
    client.disconnect();
    client.transport_mut().push_reply(":0\r\n");
    assert_eq!(client.publish("news", "hi").unwrap(), 0);
}

#[test]
fn test_next_message_requires_subscription() {
    let mut client = client_with(&[]);
    let mut channel = [0u8; 8];
    let mut payload = [0u8; 8];

    assert!(matches!(
        client.next_message(&mut channel, &mut payload),
        Err(RespError::InvalidArgument(_))
    ));
}

#[test]
fn test_quiet_channel_keeps_subscription() {
    let mut client = client_with(&[SUBSCRIBED]);
    client.subscribe("news").unwrap();

    let mut channel = [0u8; 8];
    let mut payload = [0u8; 8];
    assert!(matches!(
        client.next_message(&mut channel, &mut payload),
        Err(RespError::Timeout(_))
    ));
    assert!(client.is_connected());
    assert_eq!(client.transport().closes(), 0);

    client
        .transport_mut()
        .push_unsolicited("*3\r\n$7\r\nmessage\r\n$4\r\nnews\r\n$2\r\nhi\r\n");
    let message = client.next_message(&mut channel, &mut payload).unwrap();
    assert_eq!(&channel[..message.channel_len], b"news");
    assert_eq!(&payload[..message.payload_len], b"hi");
}

#[test]
fn test_timeout_inside_push_drops_session() {
    let mut client = client_with(&[SUBSCRIBED]);
    client.subscribe("news").unwrap();
    client
        .transport_mut()
        .push_unsolicited("*3\r\n$7\r\nmessage\r\n$4\r\nne");

    let mut channel = [0u8; 8];
    let mut payload = [0u8; 8];
    assert!(matches!(
        client.next_message(&mut channel, &mut payload),
        Err(RespError::Timeout(_))
    ));
    assert!(!client.is_connected());
    assert!(matches!(
        client.next_message(&mut channel, &mut payload),
        Err(RespError::InvalidArgument(_))
    ));
}

#[test]
fn test_subscribe_skips_messages_before_confirmation() {
    let mut client = client_with(&[SUBSCRIBED]);
    client.subscribe("news").unwrap();

    let mut reply = b"*3\r\n$7\r\nmessage\r\n$4\r\nnews\r\n$5\r\nearly\r\n".to_vec();
    reply.extend_from_slice(b"*3\r\n$9\r\nsubscribe\r\n$6\r\nsports\r\n:2\r\n");
    client.transport_mut().push_reply(reply);

    assert_eq!(client.subscribe("sports").unwrap(), 2);
    assert!(client.transport().unread().is_empty());
    assert!(client.is_connected());
}

#[test]
fn test_publish() {
    let mut client = client_with(&[b":2\r\n"]);
    assert_eq!(client.publish("news", "hello").unwrap(), 2);
    assert!(client.transport().is_open());
}
