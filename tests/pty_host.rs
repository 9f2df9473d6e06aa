// ABOUTME: Integration tests for the PTY host over a real socket
// Spawns short-lived programs in a PTY and talks to them the way the client does

use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use termlink::config::ServerConfig;
use termlink::server;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn start_host(config: ServerConfig) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server::serve(listener, config));
    addr
}

async fn connect(addr: SocketAddr, query: &str) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/ws{query}")).await.unwrap();
    ws
}

/// Collect binary output until `needle` shows up or the socket ends.
async fn read_until(ws: &mut Client, needle: &str) -> String {
    let mut output = Vec::new();
    let result = tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(Ok(msg)) = ws.next().await {
            match msg {
                Message::Binary(bytes) => output.extend_from_slice(&bytes),
                Message::Text(text) => output.extend_from_slice(text.as_bytes()),
                Message::Close(_) => break,
                _ => {}
            }
            if String::from_utf8_lossy(&output).contains(needle) {
                break;
            }
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for {needle:?}");
    String::from_utf8_lossy(&output).into_owned()
}

fn config_for(command: &str, args: &[&str]) -> ServerConfig {
    ServerConfig {
        command: command.to_string(),
        args: args.iter().map(|a| (*a).to_string()).collect(),
        ..ServerConfig::default()
    }
}

#[tokio::test]
async fn test_input_reaches_the_child() {
    let addr = start_host(config_for("cat", &[])).await;
    let mut ws = connect(addr, "").await;

    ws.send(Message::Text(r#"{"type":"resize","cols":100,"rows":30}"#.to_string()))
        .await
        .unwrap();
    ws.send(Message::Binary(b"ping\n".to_vec())).await.unwrap();

    let output = read_until(&mut ws, "ping").await;
    assert!(output.contains("ping"));

    let _ = ws.close(None).await;
}

#[tokio::test]
async fn test_resize_is_applied_to_the_pty() {
    let addr = start_host(config_for("/bin/sh", &[])).await;
    let mut ws = connect(addr, "").await;

    ws.send(Message::Text(r#"{"type":"resize","cols":101,"rows":31}"#.to_string()))
        .await
        .unwrap();
    // Malformed control messages are ignored and do not end the session.
    ws.send(Message::Text("not json".to_string())).await.unwrap();
    ws.send(Message::Text(r#"{"type":"resize","cols":0,"rows":0}"#.to_string()))
        .await
        .unwrap();
    ws.send(Message::Binary(b"stty size; exit\n".to_vec()))
        .await
        .unwrap();

    let output = read_until(&mut ws, "31 101").await;
    assert!(output.contains("31 101"));
}

#[tokio::test]
async fn test_query_keys_are_forwarded_to_the_child() {
    let mut config = config_for("/bin/sh", &["-c", "echo \"arg:$0\""]);
    config.forward_query = vec!["size".to_string()];
    let addr = start_host(config).await;
    let mut ws = connect(addr, "?size=9&other=1").await;

    let output = read_until(&mut ws, "arg:--size=9").await;
    assert!(output.contains("arg:--size=9"));
    assert!(!output.contains("other"));
}

#[tokio::test]
async fn test_spawn_failure_is_reported_inline() {
    let addr = start_host(config_for("/nonexistent/termlink-test-program", &[])).await;
    let mut ws = connect(addr, "").await;

    let first = tokio::time::timeout(Duration::from_secs(10), ws.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    match first {
        Message::Text(text) => {
            assert!(text.starts_with("\r\n[termlink] failed to start process"));
            assert!(text.ends_with("\r\n"));
        }
        other => panic!("expected a text notice, got {other:?}"),
    }
}

#[tokio::test]
async fn test_health_route() {
    let addr = start_host(ServerConfig::default()).await;
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.ends_with("OK"));
}
