use pickaxe_protocol_core::{ConnectionWriter, Protocol};
use pickaxe_types::GameProfile;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify, RwLock};
use uuid::Uuid;

/// Volatile keep-alive bookkeeping for a connected player, per §3's Player
/// record.
pub struct KeepAlive {
    last_id: AtomicI32,
    last_sent: Mutex<Instant>,
    pending: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl KeepAlive {
    fn new() -> Self {
        Self {
            last_id: AtomicI32::new(0),
            last_sent: Mutex::new(Instant::now()),
            pending: AtomicBool::new(false),
            latency: Mutex::new(None),
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    pub async fn seconds_since_send(&self) -> u64 {
        self.last_sent.lock().await.elapsed().as_secs()
    }

    /// Stamp a freshly sent keep-alive id, marking a response as pending.
    pub async fn stamp_sent(&self, id: i32) {
        self.last_id.store(id, Ordering::SeqCst);
        *self.last_sent.lock().await = Instant::now();
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Acknowledge a client's keep-alive reply; records latency on match.
    pub async fn acknowledge(&self, id: i64) -> bool {
        if self.last_id.load(Ordering::SeqCst) as i64 != id {
            return false;
        }
        self.pending.store(false, Ordering::SeqCst);
        let sent_at = *self.last_sent.lock().await;
        *self.latency.lock().await = Some(sent_at.elapsed());
        true
    }
}

/// A connected player: the write half of its connection plus the volatile
/// fields the keep-alive ticker and the connection's own read loop share.
pub struct Player {
    pub profile: GameProfile,
    pub protocol: Protocol,
    pub writer: Arc<Mutex<ConnectionWriter>>,
    pub keep_alive: KeepAlive,
    /// Signaled to ask the connection's read loop to close (e.g. a
    /// keep-alive timeout detected by the ticker).
    pub close: Notify,
}

impl Player {
    pub fn new(profile: GameProfile, protocol: Protocol, writer: Arc<Mutex<ConnectionWriter>>) -> Self {
        Self {
            profile,
            protocol,
            writer,
            keep_alive: KeepAlive::new(),
            close: Notify::new(),
        }
    }

    /// Notify the read loop to close, after a short grace delay so the
    /// client has time to read a just-sent Disconnect packet off the wire
    /// before the socket goes away. Non-blocking: runs on its own task.
    pub fn spawn_close_after_grace_delay(self: Arc<Self>) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            self.close.notify_one();
        })
    }
}

/// The server's concurrent, UUID-keyed player registry. At most one live
/// Player per unique-id (§3 invariant).
#[derive(Default)]
pub struct PlayerRegistry {
    players: RwLock<HashMap<Uuid, Arc<Player>>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self {
            players: RwLock::new(HashMap::new()),
        }
    }

    pub async fn insert(&self, player: Arc<Player>) -> bool {
        let mut players = self.players.write().await;
        if players.contains_key(&player.profile.uuid) {
            return false;
        }
        players.insert(player.profile.uuid, player);
        true
    }

    pub async fn remove(&self, uuid: &Uuid) {
        self.players.write().await.remove(uuid);
    }

    pub async fn get(&self, uuid: &Uuid) -> Option<Arc<Player>> {
        self.players.read().await.get(uuid).cloned()
    }

    pub async fn contains(&self, uuid: &Uuid) -> bool {
        self.players.read().await.contains_key(uuid)
    }

    pub async fn len(&self) -> usize {
        self.players.read().await.len()
    }

    pub async fn all(&self) -> Vec<Arc<Player>> {
        self.players.read().await.values().cloned().collect()
    }
}
