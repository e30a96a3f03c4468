//! The WebSocket broadcast hub (§4.6): a connection registry and topic index
//! owned by a single serializer task, reachable only through channels. No
//! connection ever touches another connection's state directly.
//!
//! This crate owns the registry, topic matching, and keepalive/eviction
//! policy. It does not speak WebSocket itself — the binary wires an actual
//! socket's reader and writer tasks to the [`ConnectionHandle`] and outbound
//! [`ServerMessage`] receiver this crate hands back from [`Hub::register`].

mod message;
mod topic;

use {
    model::Address,
    std::{
        collections::{HashMap, HashSet},
        sync::atomic::{AtomicU64, Ordering},
        time::Duration,
    },
    tokio::sync::mpsc,
    topic::Topic,
};

pub use message::{ClientMessage, ServerMessage};

/// How many unread outbound messages a connection may queue before it is
/// considered a slow consumer and evicted (§4.6 "non-blocking send").
pub const OUTBOUND_BUFFER: usize = 32;

/// How often the serializer pings every connection (§4.6 "keepalive").
pub const PING_INTERVAL: Duration = Duration::from_secs(30);

/// A connection that hasn't ponged within this long of its last successful
/// pong is dropped (§4.6 "keepalive").
pub const PONG_TIMEOUT: Duration = Duration::from_secs(60);

/// How many commands the serializer's inbox buffers before backpressuring
/// callers.
const COMMAND_BUFFER: usize = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

enum Command {
    Register {
        id: ConnectionId,
        auth: Option<Address>,
        outbound: mpsc::Sender<ServerMessage>,
    },
    Inbound {
        id: ConnectionId,
        message: ClientMessage,
    },
    Pong {
        id: ConnectionId,
    },
    ExpireAuth {
        id: ConnectionId,
    },
    Disconnect {
        id: ConnectionId,
    },
    Publish {
        topic: String,
        data: serde_json::Value,
    },
}

struct Connection {
    outbound: mpsc::Sender<ServerMessage>,
    auth: Option<Address>,
    subscriptions: HashSet<String>,
    last_pong: tokio::time::Instant,
}

/// A handle a connection's reader task uses to feed inbound frames and
/// lifecycle events to the serializer. Cheap to clone.
#[derive(Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    commands: mpsc::Sender<Command>,
}

impl ConnectionHandle {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Feeds one client frame to the serializer. Best-effort: if the
    /// serializer has already shut down, this silently drops the command.
    pub async fn inbound(&self, message: ClientMessage) {
        let _ = self
            .commands
            .send(Command::Inbound { id: self.id, message })
            .await;
    }

    /// Notifies the serializer this connection's auth token has expired, so
    /// it can send a refresh notice and terminate the connection.
    pub async fn expire_auth(&self) {
        let _ = self.commands.send(Command::ExpireAuth { id: self.id }).await;
    }

    pub async fn disconnect(&self) {
        let _ = self.commands.send(Command::Disconnect { id: self.id }).await;
    }
}

/// Handle to the running hub. Cheap to clone; every clone shares the same
/// serializer task.
#[derive(Clone)]
pub struct Hub {
    commands: mpsc::Sender<Command>,
    next_id: std::sync::Arc<AtomicU64>,
}

impl Hub {
    /// Spawns the serializer task and returns a handle to it.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        tokio::spawn(run(rx));
        Self {
            commands: tx,
            next_id: std::sync::Arc::new(AtomicU64::new(1)),
        }
    }

    /// Registers a new connection (authenticated as `auth`, if any) and
    /// returns its id, a handle for sending inbound commands, and the
    /// receiver a writer task drains to push frames out over the socket.
    pub async fn register(&self, auth: Option<Address>) -> (ConnectionHandle, mpsc::Receiver<ServerMessage>) {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_BUFFER);
        let _ = self
            .commands
            .send(Command::Register {
                id,
                auth,
                outbound: outbound_tx,
            })
            .await;
        (
            ConnectionHandle {
                id,
                commands: self.commands.clone(),
            },
            outbound_rx,
        )
    }

    /// Fans `data` out to every connection currently subscribed to `topic`.
    pub async fn publish(&self, topic: impl Into<String>, data: serde_json::Value) {
        let _ = self
            .commands
            .send(Command::Publish {
                topic: topic.into(),
                data,
            })
            .await;
    }
}

async fn run(mut commands: mpsc::Receiver<Command>) {
    let mut connections: HashMap<ConnectionId, Connection> = HashMap::new();
    let mut topics: HashMap<String, HashSet<ConnectionId>> = HashMap::new();
    let mut ping_ticker = tokio::time::interval(PING_INTERVAL);
    ping_ticker.tick().await; // first tick fires immediately; discard it

    loop {
        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(command) => handle_command(command, &mut connections, &mut topics),
                    None => break,
                }
            }
            _ = ping_ticker.tick() => check_liveness(&mut connections, &mut topics),
        }
    }
}

fn handle_command(
    command: Command,
    connections: &mut HashMap<ConnectionId, Connection>,
    topics: &mut HashMap<String, HashSet<ConnectionId>>,
) {
    match command {
        Command::Register { id, auth, outbound } => {
            connections.insert(
                id,
                Connection {
                    outbound,
                    auth,
                    subscriptions: HashSet::new(),
                    last_pong: tokio::time::Instant::now(),
                },
            );
        }
        Command::Inbound { id, message } => handle_inbound(id, message, connections, topics),
        Command::Pong { id } => {
            if let Some(conn) = connections.get_mut(&id) {
                conn.last_pong = tokio::time::Instant::now();
            }
        }
        Command::ExpireAuth { id } => {
            send(connections, id, ServerMessage::refresh_required());
            remove_connection(connections, topics, id);
        }
        Command::Disconnect { id } => remove_connection(connections, topics, id),
        Command::Publish { topic, data } => publish(connections, topics, &topic, data),
    }
}

fn handle_inbound(
    id: ConnectionId,
    message: ClientMessage,
    connections: &mut HashMap<ConnectionId, Connection>,
    topics: &mut HashMap<String, HashSet<ConnectionId>>,
) {
    match message.op.as_str() {
        "subscribe" => {
            let Some(raw_topic) = message.topic else {
                send(connections, id, ServerMessage::error("BAD_REQUEST", "subscribe requires a topic"));
                return;
            };
            subscribe(id, raw_topic, connections, topics);
        }
        "unsubscribe" => {
            let Some(raw_topic) = message.topic else {
                send(connections, id, ServerMessage::error("BAD_REQUEST", "unsubscribe requires a topic"));
                return;
            };
            unsubscribe(id, raw_topic, connections, topics);
        }
        "ping" => {
            if let Some(conn) = connections.get_mut(&id) {
                conn.last_pong = tokio::time::Instant::now();
            }
            send(connections, id, ServerMessage::pong());
        }
        other => {
            send(connections, id, ServerMessage::error("BAD_REQUEST", format!("unknown op '{other}'")));
        }
    }
}

fn subscribe(
    id: ConnectionId,
    raw_topic: String,
    connections: &mut HashMap<ConnectionId, Connection>,
    topics: &mut HashMap<String, HashSet<ConnectionId>>,
) {
    let Some(topic) = Topic::parse(&raw_topic) else {
        send(connections, id, ServerMessage::error("UNKNOWN_TOPIC", raw_topic));
        return;
    };
    if topic.requires_auth() {
        let Topic::User(address) = &topic else {
            unreachable!("requires_auth is only true for Topic::User");
        };
        let authed = connections.get(&id).and_then(|conn| conn.auth);
        if authed != Some(*address) {
            send(connections, id, ServerMessage::error("FORBIDDEN", "topic address does not match authenticated user"));
            return;
        }
    }
    if let Some(conn) = connections.get_mut(&id) {
        conn.subscriptions.insert(raw_topic.clone());
    }
    topics.entry(raw_topic.clone()).or_default().insert(id);
    send(connections, id, ServerMessage::subscribed(raw_topic));
}

fn unsubscribe(
    id: ConnectionId,
    raw_topic: String,
    connections: &mut HashMap<ConnectionId, Connection>,
    topics: &mut HashMap<String, HashSet<ConnectionId>>,
) {
    if let Some(conn) = connections.get_mut(&id) {
        conn.subscriptions.remove(&raw_topic);
    }
    if let Some(subscribers) = topics.get_mut(&raw_topic) {
        subscribers.remove(&id);
        if subscribers.is_empty() {
            topics.remove(&raw_topic);
        }
    }
    send(connections, id, ServerMessage::unsubscribed(raw_topic));
}

fn publish(
    connections: &mut HashMap<ConnectionId, Connection>,
    topics: &mut HashMap<String, HashSet<ConnectionId>>,
    topic: &str,
    data: serde_json::Value,
) {
    let Some(subscribers) = topics.get(topic) else {
        return;
    };
    let mut slow = Vec::new();
    for &id in subscribers {
        let Some(conn) = connections.get(&id) else { continue };
        if conn
            .outbound
            .try_send(ServerMessage::data(topic.to_string(), data.clone()))
            .is_err()
        {
            slow.push(id);
        }
    }
    for id in slow {
        tracing::warn!(connection = id.0, topic, "evicting slow consumer");
        let _ = connections
            .get(&id)
            .map(|conn| conn.outbound.try_send(ServerMessage::error("SLOW_CONSUMER", "outbound buffer full")));
        remove_connection(connections, topics, id);
    }
}

fn check_liveness(
    connections: &mut HashMap<ConnectionId, Connection>,
    topics: &mut HashMap<String, HashSet<ConnectionId>>,
) {
    let now = tokio::time::Instant::now();
    let mut stale = Vec::new();
    for (&id, conn) in connections.iter() {
        if now.duration_since(conn.last_pong) > PONG_TIMEOUT {
            stale.push(id);
        } else {
            let _ = conn.outbound.try_send(ServerMessage::ping());
        }
    }
    for id in stale {
        tracing::debug!(connection = id.0, "keepalive timeout");
        remove_connection(connections, topics, id);
    }
}

fn remove_connection(
    connections: &mut HashMap<ConnectionId, Connection>,
    topics: &mut HashMap<String, HashSet<ConnectionId>>,
    id: ConnectionId,
) {
    let Some(conn) = connections.remove(&id) else {
        return;
    };
    for raw_topic in conn.subscriptions {
        if let Some(subscribers) = topics.get_mut(&raw_topic) {
            subscribers.remove(&id);
            if subscribers.is_empty() {
                topics.remove(&raw_topic);
            }
        }
    }
}

fn send(connections: &HashMap<ConnectionId, Connection>, id: ConnectionId, message: ServerMessage) {
    if let Some(conn) = connections.get(&id) {
        let _ = conn.outbound.try_send(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(op: &str, topic: Option<&str>) -> ClientMessage {
        ClientMessage {
            op: op.to_string(),
            topic: topic.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn subscribe_and_publish_reaches_the_subscriber() {
        let hub = Hub::spawn();
        let (handle, mut outbound) = hub.register(None).await;
        handle.inbound(client("subscribe", Some("price.ETH"))).await;
        assert_eq!(outbound.recv().await.unwrap().event, "subscribed");

        hub.publish("price.ETH", serde_json::json!({"price": "1800.00"})).await;
        let message = outbound.recv().await.unwrap();
        assert_eq!(message.event, "data");
        assert_eq!(message.topic.as_deref(), Some("price.ETH"));
    }

    #[tokio::test]
    async fn publish_to_a_topic_with_no_subscribers_is_a_no_op() {
        let hub = Hub::spawn();
        let (_handle, mut outbound) = hub.register(None).await;
        hub.publish("price.ETH", serde_json::json!({})).await;
        assert!(
            tokio::time::timeout(Duration::from_millis(50), outbound.recv())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn unauthenticated_connection_cannot_subscribe_to_a_user_topic() {
        let hub = Hub::spawn();
        let (handle, mut outbound) = hub.register(None).await;
        handle
            .inbound(client(
                "subscribe",
                Some("user.0x0000000000000000000000000000000000dead"),
            ))
            .await;
        let message = outbound.recv().await.unwrap();
        assert_eq!(message.event, "error");
        assert_eq!(message.code, Some("FORBIDDEN"));
    }

    #[tokio::test]
    async fn connection_can_subscribe_to_its_own_user_topic() {
        let hub = Hub::spawn();
        let address: Address = "0x0000000000000000000000000000000000dead".parse().unwrap();
        let (handle, mut outbound) = hub.register(Some(address)).await;
        handle
            .inbound(client(
                "subscribe",
                Some("user.0x0000000000000000000000000000000000dead"),
            ))
            .await;
        assert_eq!(outbound.recv().await.unwrap().event, "subscribed");
    }

    #[tokio::test]
    async fn ping_command_is_answered_with_pong() {
        let hub = Hub::spawn();
        let (handle, mut outbound) = hub.register(None).await;
        handle.inbound(client("ping", None)).await;
        assert_eq!(outbound.recv().await.unwrap().event, "pong");
    }

    #[tokio::test]
    async fn unknown_op_yields_a_bad_request_error() {
        let hub = Hub::spawn();
        let (handle, mut outbound) = hub.register(None).await;
        handle.inbound(client("levitate", None)).await;
        let message = outbound.recv().await.unwrap();
        assert_eq!(message.event, "error");
        assert_eq!(message.code, Some("BAD_REQUEST"));
    }

    #[tokio::test(start_paused = true)]
    async fn slow_consumer_is_evicted_once_its_buffer_fills() {
        let hub = Hub::spawn();
        let (handle, outbound) = hub.register(None).await;
        handle.inbound(client("subscribe", Some("price.ETH"))).await;
        tokio::time::advance(Duration::from_millis(1)).await;
        let _ = outbound; // never drained; deliberately left to fill up

        for _ in 0..(OUTBOUND_BUFFER + 2) {
            hub.publish("price.ETH", serde_json::json!({})).await;
        }
        tokio::time::advance(Duration::from_millis(1)).await;

        // A second subscriber registered after the eviction should be the
        // only one left receiving broadcasts.
        let (handle2, mut outbound2) = hub.register(None).await;
        handle2.inbound(client("subscribe", Some("price.ETH"))).await;
        assert_eq!(outbound2.recv().await.unwrap().event, "subscribed");
        hub.publish("price.ETH", serde_json::json!({"ok": true})).await;
        assert_eq!(outbound2.recv().await.unwrap().event, "data");
    }

    #[tokio::test(start_paused = true)]
    async fn keepalive_timeout_drops_a_silent_connection() {
        let hub = Hub::spawn();
        let (_handle, mut outbound) = hub.register(None).await;

        tokio::time::advance(PING_INTERVAL + Duration::from_secs(1)).await;
        assert_eq!(outbound.recv().await.unwrap().event, "ping");

        tokio::time::advance(PONG_TIMEOUT + Duration::from_secs(1)).await;
        // The connection is now stale and should have been dropped rather
        // than pinged again.
        assert!(outbound.recv().await.is_none());
    }

    #[tokio::test]
    async fn expire_auth_sends_a_refresh_notice_then_closes() {
        let hub = Hub::spawn();
        let (handle, mut outbound) = hub.register(None).await;
        handle.expire_auth().await;
        assert_eq!(outbound.recv().await.unwrap().event, "refresh_required");
        assert!(outbound.recv().await.is_none());
    }
}
