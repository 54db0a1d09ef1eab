//! End-to-end tests over a line-delimited broker stream.
//!
//! Each test plays the broker process: it writes server events as JSON lines
//! into the client's input, hangs up, lets the bridge run to completion, and
//! then checks the page model and the command lines the client wrote back.

use courier_bridge::{Bridge, StreamBroker};
use courier_core::{Dispatcher, HeadlessUi, Opacity, Session, SEND_FAILED_NOTICE};
use courier_protocol::{PresenceStatus, UserId};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::io::{duplex, AsyncReadExt, AsyncWriteExt, DuplexStream};

const ME: UserId = UserId(1);
const PEER: UserId = UserId(7);
const TYPING_DELAY: Duration = Duration::from_millis(20);

/// Client state after a scripted broker session.
struct Outcome {
    ui: HeadlessUi,
    commands: Vec<Value>,
}

/// Feed `script` to a client viewing the conversation with [`PEER`].
async fn run_script(script: &[Value]) -> Outcome {
    let (client_in, mut broker_out) = duplex(64 * 1024);
    let (client_out, mut broker_in) = duplex(64 * 1024);

    let mut bridge = Bridge::new(StreamBroker::new(client_in, client_out));
    let mut session = Session::new(TYPING_DELAY);
    let mut dispatcher = Dispatcher::new(HeadlessUi::new());

    bridge.open().await.unwrap();
    session.open_conversation(PEER);
    dispatcher.ui_mut().open_conversation(PEER);

    let mut lines = String::new();
    for event in script {
        lines.push_str(&event.to_string());
        lines.push('\n');
    }
    broker_out.write_all(lines.as_bytes()).await.unwrap();
    drop(broker_out);

    bridge.run(&mut dispatcher, &mut session).await.unwrap();
    assert!(bridge.close());
    drop(bridge);

    Outcome {
        ui: dispatcher.into_ui(),
        commands: read_commands(&mut broker_in).await,
    }
}

async fn read_commands(stream: &mut DuplexStream) -> Vec<Value> {
    let mut raw = String::new();
    stream.read_to_string(&mut raw).await.unwrap();
    raw.lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

fn command_types(commands: &[Value]) -> Vec<&str> {
    commands
        .iter()
        .map(|c| c["type"].as_str().unwrap())
        .collect()
}

fn roster(online: Value) -> Value {
    json!({
        "type": "users",
        "members": [
            {"id": 7, "username": "grace"},
            {"id": 9, "username": "alan"},
        ],
        "data": online,
    })
}

#[tokio::test]
async fn presence_roster_is_annotated_in_order() {
    let outcome = run_script(&[roster(json!([9]))]).await;

    let rows = outcome.ui.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].member.id, PEER);
    assert_eq!(rows[0].member.status, PresenceStatus::Offline);
    assert_eq!(rows[1].member.status, PresenceStatus::Online);
    assert_eq!(rows[1].member.profile["username"], "alan");
}

#[tokio::test]
async fn stale_wire_status_is_recomputed() {
    let outcome = run_script(&[json!({
        "type": "status_update",
        "members": [
            {"id": 7, "status": null},
            {"id": 9, "status": "away"},
        ],
        "data": [7],
    })])
    .await;

    let rows = outcome.ui.rows();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].member.status, PresenceStatus::Online);
    assert_eq!(rows[1].member.status, PresenceStatus::Offline);
}

#[tokio::test]
async fn null_online_list_means_everyone_offline() {
    let outcome = run_script(&[roster(Value::Null)]).await;

    assert!(outcome
        .ui
        .rows()
        .iter()
        .all(|r| r.member.status == PresenceStatus::Offline));
}

#[tokio::test]
async fn ping_is_answered_with_one_pong() {
    let outcome = run_script(&[json!({"type": "ping"})]).await;

    assert_eq!(command_types(&outcome.commands), vec!["connect", "pong", "close"]);
}

#[tokio::test]
async fn active_peer_message_is_shown_and_acknowledged() {
    let outcome = run_script(&[json!({
        "type": "new_message",
        "message": {"sender_id": 7, "receiver_id": 1, "content": "hello", "id": 42},
    })])
    .await;

    let shown = outcome.ui.conversation();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].message.content, "hello");
    assert!(!shown[0].outgoing);
    assert!(shown[0].incoming);

    assert_eq!(
        &outcome.commands[1..3],
        &[
            json!({"type": "send", "payload": {"type": "read", "message": {"receiver_id": 7}}}),
            json!({"type": "read", "payload": {"type": "read", "message": {"receiver_id": 7}}}),
        ]
    );
}

#[tokio::test]
async fn message_for_another_conversation_is_not_shown() {
    let outcome = run_script(&[json!({
        "type": "new_message",
        "message": {"sender_id": 9, "receiver_id": 1, "content": "psst"},
    })])
    .await;

    assert!(outcome.ui.conversation().is_empty());
    assert_eq!(command_types(&outcome.commands), vec!["connect", "close"]);
}

#[tokio::test]
async fn typing_burst_paints_last_state_only() {
    let outcome = run_script(&[
        json!({"type": "typing", "message": {"sender_id": 7, "receiver_id": 1}, "is_typing": true}),
        json!({"type": "typing", "message": {"sender_id": 7, "receiver_id": 1}, "is_typing": false}),
    ])
    .await;

    assert_eq!(outcome.ui.indicator(PEER), Some(Opacity::Hidden));
}

#[tokio::test]
async fn typing_start_is_painted_after_quiet_period() {
    let outcome = run_script(&[json!({
        "type": "typing",
        "message": {"sender_id": 7, "receiver_id": 1},
        "is_typing": true,
    })])
    .await;

    assert_eq!(outcome.ui.indicator(PEER), Some(Opacity::Visible));
}

#[tokio::test]
async fn read_receipt_hides_only_that_peer() {
    let outcome = run_script(&[
        roster(json!([7, 9])),
        json!({"type": "read", "message": {"receiver_id": 9}}),
        json!({"type": "read", "message": {"receiver_id": 404}}),
    ])
    .await;

    assert!(outcome.ui.row(PEER).unwrap().unread_visible);
    assert!(!outcome.ui.row(UserId(9)).unwrap().unread_visible);
}

#[tokio::test]
async fn unknown_and_malformed_lines_do_not_stop_the_session() {
    let outcome = run_script(&[
        json!({"type": "presence_v2", "whatever": true}),
        json!({"type": "read"}),
        json!({"type": "error"}),
    ])
    .await;

    assert_eq!(outcome.ui.notices(), [SEND_FAILED_NOTICE.to_string()]);
    assert_eq!(command_types(&outcome.commands), vec!["connect", "close"]);
}

#[tokio::test]
async fn self_sent_message_echo_is_not_acknowledged() {
    let outcome = run_script(&[json!({
        "type": "new_message",
        "message": {"sender_id": ME.get(), "receiver_id": 7, "content": "mine"},
    })])
    .await;

    assert_eq!(outcome.ui.conversation().len(), 1);
    assert_eq!(command_types(&outcome.commands), vec!["connect", "close"]);
}
