//! End-to-end tests for the command channel: real sockets, scripted host.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use ermot_core::domain::notification::{HostNotification, PointerEcho};
use ermot_core::{ControllerEvent, VolumeLimits};
use ermot_host::application::dispatch::CommandDispatcher;
use ermot_host::application::host_actions::HostActionGateway;
use ermot_host::application::notify::{ControllerBroadcast, HostNotifier};
use ermot_host::infrastructure::automation::mock::MockAutomation;
use ermot_host::infrastructure::automation::power::ShellCommandRunner;
use ermot_host::infrastructure::network::broadcast::ControllerBroadcaster;
use ermot_host::infrastructure::network::ws_server::{
    bind_command_channel, run_command_channel, ChannelContext, OriginPolicy,
};
use ermot_host::infrastructure::volume::scripted::ScriptedVolume;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Default)]
struct Window {
    seen: Mutex<Vec<HostNotification>>,
}

impl Window {
    fn seen(&self) -> Vec<HostNotification> {
        self.seen.lock().unwrap().clone()
    }
}

impl HostNotifier for Window {
    fn notify(&self, notification: HostNotification) {
        self.seen.lock().unwrap().push(notification);
    }
}

struct Harness {
    url: String,
    volume: Arc<ScriptedVolume>,
    window: Arc<Window>,
    broadcaster: ControllerBroadcaster,
    running: Arc<AtomicBool>,
}

impl Drop for Harness {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
    }
}

async fn start_host() -> Harness {
    let volume = Arc::new(ScriptedVolume::new(40));
    let window = Arc::new(Window::default());
    let gateway = Arc::new(HostActionGateway::new(
        Arc::new(MockAutomation::at(100, 100)),
        Arc::new(ShellCommandRunner::new()),
    ));
    let dispatcher = Arc::new(CommandDispatcher::new(
        gateway,
        volume.clone(),
        window.clone(),
        VolumeLimits::default(),
    ));
    let broadcaster = ControllerBroadcaster::new();
    let ctx = Arc::new(ChannelContext::new(
        dispatcher,
        window.clone(),
        broadcaster.clone(),
        OriginPolicy::Any,
    ));

    let listener = bind_command_channel("127.0.0.1", 0).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let running = Arc::new(AtomicBool::new(true));
    tokio::spawn(run_command_channel(listener, ctx, Arc::clone(&running)));

    Harness {
        url: format!("ws://{addr}"),
        volume,
        window,
        broadcaster,
        running,
    }
}

async fn connect(url: &str) -> Client {
    let (client, _) = connect_async(url).await.unwrap();
    client
}

async fn next_json(client: &mut Client) -> Value {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(2), client.next())
            .await
            .expect("timed out waiting for a frame")
            .unwrap()
            .unwrap();
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

async fn send_json(client: &mut Client, value: Value) {
    client.send(Message::Text(value.to_string())).await.unwrap();
}

#[tokio::test]
async fn test_new_controller_first_receives_current_volume() {
    // Arrange
    let host = start_host().await;

    // Act
    let mut client = connect(&host.url).await;

    // Assert
    assert_eq!(
        next_json(&mut client).await,
        json!({"event": "volumeActuel", "payload": {"data": 40}})
    );
}

#[tokio::test]
async fn test_mouse_move_replies_with_new_position_and_echoes_to_window() {
    // Arrange
    let host = start_host().await;
    let mut client = connect(&host.url).await;
    next_json(&mut client).await;

    // Act
    send_json(
        &mut client,
        json!({"event": "mouse-move", "payload": {"x": 10, "y": -5}}),
    )
    .await;
    let reply = next_json(&mut client).await;

    // Assert
    assert_eq!(
        reply,
        json!({
            "event": "mouse-result",
            "payload": {"success": true, "position": {"x": 110, "y": 95}}
        })
    );
    assert!(host.window.seen().iter().any(|n| matches!(
        n,
        HostNotification::Mouse(PointerEcho::MouseMove { x: 110, y: 95 })
    )));
}

#[tokio::test]
async fn test_set_volume_writes_level_without_reply() {
    // Arrange
    let host = start_host().await;
    let mut client = connect(&host.url).await;
    next_json(&mut client).await;

    // Act: set-volume has no reply, so follow it with a command that does
    send_json(
        &mut client,
        json!({"event": "set-volume", "payload": {"data": "75"}}),
    )
    .await;
    send_json(
        &mut client,
        json!({"event": "mouse-move", "payload": {"x": 0, "y": 0}}),
    )
    .await;
    let reply = next_json(&mut client).await;

    // Assert
    assert_eq!(reply["event"], "mouse-result");
    assert_eq!(host.volume.writes(), vec![75]);
    assert!(host
        .window
        .seen()
        .iter()
        .any(|n| matches!(n, HostNotification::Volume { data: 75 })));
}

#[tokio::test]
async fn test_malformed_frames_do_not_close_the_session() {
    // Arrange
    let host = start_host().await;
    let mut client = connect(&host.url).await;
    next_json(&mut client).await;

    // Act
    client
        .send(Message::Text("not json".to_string()))
        .await
        .unwrap();
    send_json(&mut client, json!({"event": "no-such-command", "payload": {}})).await;
    send_json(
        &mut client,
        json!({"event": "mouse-move", "payload": {"x": 1}}),
    )
    .await;
    send_json(
        &mut client,
        json!({"event": "keyboard-get-clipboard"}),
    )
    .await;

    // Assert: only the last, valid command is answered
    let reply = next_json(&mut client).await;
    assert_eq!(
        reply,
        json!({"event": "keyboard-clipboard-result", "payload": {"text": ""}})
    );
}

#[tokio::test]
async fn test_broadcast_reaches_every_connected_controller() {
    // Arrange
    let host = start_host().await;
    let mut first = connect(&host.url).await;
    let mut second = connect(&host.url).await;
    next_json(&mut first).await;
    next_json(&mut second).await;

    // Act
    host.broadcaster
        .broadcast(ControllerEvent::Volume { data: 12 });

    // Assert
    let expected = json!({"event": "volumeActuel", "payload": {"data": 12}});
    assert_eq!(next_json(&mut first).await, expected);
    assert_eq!(next_json(&mut second).await, expected);
}
