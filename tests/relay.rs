//! End-to-end tests over real WebSocket connections.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use chat_relay::{serve, ChatServer, HistoryBuffer};

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_server() -> SocketAddr {
    start_server_with_buffer(256).await
}

async fn start_server_with_buffer(outbound_buffer: usize) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (cmd_tx, cmd_rx) = mpsc::channel(256);
    tokio::spawn(ChatServer::new(cmd_rx, HistoryBuffer::unbounded()).run());
    tokio::spawn(serve(listener, cmd_tx, outbound_buffer));
    addr
}

async fn connect(addr: SocketAddr) -> Ws {
    let (ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    ws
}

async fn send(ws: &mut Ws, frame: Value) {
    ws.send(Message::Text(frame.to_string().into())).await.unwrap();
}

async fn send_raw(ws: &mut Ws, text: &str) {
    ws.send(Message::Text(text.to_string().into())).await.unwrap();
}

/// Next text frame, parsed
async fn recv(ws: &mut Ws) -> Value {
    loop {
        let msg = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

/// Register and return the issued id
async fn register(ws: &mut Ws, name: &str) -> String {
    send(ws, json!({"type": "newUser", "data": name})).await;
    let reply = recv(ws).await;
    assert_eq!(reply["type"], "userId");
    assert_eq!(reply["data"]["username"], name);
    reply["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_join_chat_and_leave() {
    let addr = start_server().await;

    let mut alice = connect(addr).await;
    register(&mut alice, "alice").await;

    let mut bob = connect(addr).await;
    assert_eq!(recv(&mut bob).await, json!({"type": "userCame", "data": "alice"}));
    let bob_id = register(&mut bob, "bob").await;
    assert_eq!(recv(&mut alice).await, json!({"type": "userCame", "data": "bob"}));

    send(&mut alice, json!({"type": "message", "data": "hi"})).await;
    for ws in [&mut alice, &mut bob] {
        let frame = recv(ws).await;
        assert_eq!(frame["type"], "message");
        assert_eq!(frame["data"]["username"], "alice");
        assert_eq!(frame["data"]["message"], "hi");
    }

    // bob never saw his own userCame: the next frame is his echoed message
    send(&mut bob, json!({"type": "message", "data": "hey", "userId": bob_id})).await;
    assert_eq!(recv(&mut bob).await["data"]["message"], "hey");
    assert_eq!(recv(&mut alice).await["data"]["username"], "bob");

    alice.close(None).await.unwrap();
    assert_eq!(recv(&mut bob).await, json!({"type": "userGone", "data": "alice"}));

    // the name is free again
    let mut alice_again = connect(addr).await;
    assert_eq!(recv(&mut alice_again).await, json!({"type": "userCame", "data": "bob"}));
    for _ in 0..2 {
        assert_eq!(recv(&mut alice_again).await["type"], "message");
    }
    register(&mut alice_again, "alice").await;
}

#[tokio::test]
async fn test_rejections_keep_session_alive() {
    let addr = start_server().await;

    let mut alice = connect(addr).await;
    register(&mut alice, "alice").await;

    let mut other = connect(addr).await;
    assert_eq!(recv(&mut other).await["type"], "userCame");

    send_raw(&mut other, "{not json").await;
    assert_eq!(recv(&mut other).await, json!({"type": "error", "data": "Invalid JSON"}));

    send(&mut other, json!({"type": "newUser", "data": "alice"})).await;
    assert_eq!(
        recv(&mut other).await,
        json!({"type": "usernameError", "data": "A user with this name already exists"})
    );

    send(&mut other, json!({"type": "newUser", "data": "   "})).await;
    assert_eq!(recv(&mut other).await["type"], "usernameError");

    // unknown types are ignored without a reply
    send(&mut other, json!({"type": "typing"})).await;

    register(&mut other, "carol").await;
    assert_eq!(recv(&mut alice).await, json!({"type": "userCame", "data": "carol"}));

    send(&mut other, json!({"type": "message", "data": " \n "})).await;
    assert_eq!(
        recv(&mut other).await,
        json!({"type": "error", "data": "Message must not be empty"})
    );

    send(&mut other, json!({"type": "message", "data": "finally"})).await;
    assert_eq!(recv(&mut other).await["data"]["message"], "finally");
    assert_eq!(recv(&mut alice).await["data"]["message"], "finally");
}

#[tokio::test]
async fn test_history_replayed_to_newcomer() {
    let addr = start_server().await;

    let mut alice = connect(addr).await;
    register(&mut alice, "alice").await;
    for body in ["one", "two", "three"] {
        send(&mut alice, json!({"type": "message", "data": body})).await;
        assert_eq!(recv(&mut alice).await["data"]["message"], body);
    }

    let mut late = connect(addr).await;
    assert_eq!(recv(&mut late).await, json!({"type": "userCame", "data": "alice"}));
    for body in ["one", "two", "three"] {
        let frame = recv(&mut late).await;
        assert_eq!(frame["type"], "message");
        assert_eq!(frame["data"]["username"], "alice");
        assert_eq!(frame["data"]["message"], body);
    }
}

#[tokio::test]
async fn test_full_history_replayed_past_small_buffer() {
    let addr = start_server_with_buffer(2).await;

    let mut alice = connect(addr).await;
    register(&mut alice, "alice").await;
    for i in 0..20 {
        let body = format!("msg {}", i);
        send(&mut alice, json!({"type": "message", "data": body})).await;
        assert_eq!(recv(&mut alice).await["data"]["message"], body);
    }

    let mut late = connect(addr).await;
    assert_eq!(recv(&mut late).await, json!({"type": "userCame", "data": "alice"}));
    for i in 0..20 {
        assert_eq!(recv(&mut late).await["data"]["message"], format!("msg {}", i));
    }

    // live traffic follows the replay
    send(&mut alice, json!({"type": "message", "data": "live"})).await;
    assert_eq!(recv(&mut late).await["data"]["message"], "live");
}

#[tokio::test]
async fn test_unregistered_disconnect_is_silent() {
    let addr = start_server().await;

    let mut alice = connect(addr).await;
    register(&mut alice, "alice").await;

    let mut lurker = connect(addr).await;
    assert_eq!(recv(&mut lurker).await["type"], "userCame");
    lurker.close(None).await.unwrap();
    drop(lurker);

    // the next thing alice sees is her own message, not a userGone
    send(&mut alice, json!({"type": "message", "data": "anyone?"})).await;
    assert_eq!(recv(&mut alice).await["type"], "message");
}
