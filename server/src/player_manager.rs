//! Connection registry for the game server.
//!
//! This module tracks every connected session and which of the two
//! disjoint groups it belongs to:
//! - *pending*: connected but no valid name supplied yet; not part of
//!   the game, receives no broadcasts.
//! - *active*: joined under a unique name; participates in turns.
//!
//! Group order matters: the active list is the turn order, with the most
//! recent joiner at the head, and the scheduler cycles through it from
//! head to tail. Sessions are addressed by a stable id so callers never
//! hold references into the collections across mutations.

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::task::JoinHandle;

/// One connected session and its write side.
///
/// The read side lives in a dedicated reader task; the handle to that
/// task is kept here so it can be torn down when the session is removed
/// for reasons other than the peer hanging up.
#[derive(Debug)]
pub struct Player {
    /// Stable identifier assigned on accept.
    pub id: u32,
    /// Peer address, for logging.
    pub addr: SocketAddr,
    /// Display name; empty until the session is promoted to active.
    pub name: String,
    /// Write half of the connection, owned by the dispatcher.
    pub writer: OwnedWriteHalf,
    /// Attached once the reader task is spawned; the task needs the
    /// session id, which only exists after registration.
    reader_task: Option<JoinHandle<()>>,
}

/// Manages all connected sessions and the pending/active split.
///
/// All mutation happens from the dispatcher task, so the registry needs
/// no internal synchronization. A session is in exactly one group at a
/// time and moves from pending to active at most once.
pub struct PlayerManager {
    /// Every session, keyed by id, regardless of group.
    players: HashMap<u32, Player>,
    /// Pending session ids, most recent first.
    pending: Vec<u32>,
    /// Active session ids, most recent joiner first. Turn order.
    active: Vec<u32>,
    /// Next id to hand out.
    next_id: u32,
}

impl PlayerManager {
    pub fn new() -> Self {
        Self {
            players: HashMap::new(),
            pending: Vec::new(),
            active: Vec::new(),
            next_id: 1,
        }
    }

    /// Registers a freshly accepted connection as a pending session.
    ///
    /// Returns the id assigned to it. The session stays pending until a
    /// valid unique name arrives.
    pub fn add(&mut self, addr: SocketAddr, writer: OwnedWriteHalf) -> u32 {
        let id = self.next_id;
        self.next_id += 1;

        info!("Adding client {} from {}", id, addr);
        self.players.insert(
            id,
            Player {
                id,
                addr,
                name: String::new(),
                writer,
                reader_task: None,
            },
        );
        self.pending.insert(0, id);
        id
    }

    /// Records the session's reader task so removal can tear it down.
    pub fn attach_reader(&mut self, id: u32, reader_task: JoinHandle<()>) {
        if let Some(player) = self.players.get_mut(&id) {
            player.reader_task = Some(reader_task);
        }
    }

    /// True if any active player already holds `name` (case-sensitive
    /// exact match).
    pub fn name_taken(&self, name: &str) -> bool {
        self.active
            .iter()
            .filter_map(|id| self.players.get(id))
            .any(|p| p.name == name)
    }

    /// Moves a pending session into the active group under `name`.
    ///
    /// Fails (returning false, with no state change) if the session is
    /// not pending or the name is already held by an active player. On
    /// success the session becomes the new head of the turn order.
    pub fn promote(&mut self, id: u32, name: &str) -> bool {
        if self.name_taken(name) {
            return false;
        }
        let Some(pos) = self.pending.iter().position(|&p| p == id) else {
            return false;
        };
        let Some(player) = self.players.get_mut(&id) else {
            return false;
        };

        player.name = name.to_string();
        self.pending.remove(pos);
        self.active.insert(0, id);
        true
    }

    /// Detaches a session from whichever group holds it and releases its
    /// connection.
    ///
    /// Dropping the returned `Player` closes the write half; the reader
    /// task is aborted here so a server-initiated removal does not leave
    /// it parked on a dead socket. Callers that need the departed name
    /// take it from the returned value.
    pub fn remove(&mut self, id: u32) -> Option<Player> {
        let player = self.players.remove(&id)?;
        self.pending.retain(|&p| p != id);
        self.active.retain(|&p| p != id);
        if let Some(task) = &player.reader_task {
            task.abort();
        }
        info!("Removing client {} {}", id, player.addr);
        Some(player)
    }

    pub fn is_pending(&self, id: u32) -> bool {
        self.pending.contains(&id)
    }

    pub fn is_active(&self, id: u32) -> bool {
        self.active.contains(&id)
    }

    /// Display name of an active player.
    pub fn name(&self, id: u32) -> Option<&str> {
        self.players.get(&id).map(|p| p.name.as_str())
    }

    /// Mutable access to a session's write half.
    pub fn writer_mut(&mut self, id: u32) -> Option<&mut OwnedWriteHalf> {
        self.players.get_mut(&id).map(|p| &mut p.writer)
    }

    /// Snapshot of the active group in turn order.
    ///
    /// Broadcast and turn logic iterate this copy and re-resolve each id
    /// against the live registry, so a removal mid-iteration never
    /// invalidates anything.
    pub fn active_ids(&self) -> Vec<u32> {
        self.active.clone()
    }

    pub fn active_is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl Default for PlayerManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::{TcpListener, TcpStream};

    /// Builds a real write half backed by a loopback connection, so
    /// registry tests exercise the actual types.
    async fn test_writer() -> (SocketAddr, OwnedWriteHalf) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _client = TcpStream::connect(addr).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();
        let (_read, write) = stream.into_split();
        (peer, write)
    }

    async fn manager_with(n: usize) -> (PlayerManager, Vec<u32>) {
        let mut manager = PlayerManager::new();
        let mut ids = Vec::new();
        for _ in 0..n {
            let (addr, writer) = test_writer().await;
            let id = manager.add(addr, writer);
            manager.attach_reader(id, tokio::spawn(async {}));
            ids.push(id);
        }
        (manager, ids)
    }

    #[tokio::test]
    async fn test_add_starts_pending() {
        let (manager, ids) = manager_with(1).await;
        assert!(manager.is_pending(ids[0]));
        assert!(!manager.is_active(ids[0]));
        assert_eq!(manager.len(), 1);
    }

    #[tokio::test]
    async fn test_promote_moves_to_active_head() {
        let (mut manager, ids) = manager_with(2).await;
        assert!(manager.promote(ids[0], "alice"));
        assert!(manager.promote(ids[1], "bob"));

        assert!(manager.is_active(ids[0]));
        assert!(manager.is_active(ids[1]));
        assert!(!manager.is_pending(ids[0]));
        // Most recent joiner is the head of the turn order.
        assert_eq!(manager.active_ids(), vec![ids[1], ids[0]]);
        assert_eq!(manager.name(ids[0]), Some("alice"));
        assert_eq!(manager.name(ids[1]), Some("bob"));
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let (mut manager, ids) = manager_with(2).await;
        assert!(manager.promote(ids[0], "alice"));
        assert!(!manager.promote(ids[1], "alice"));
        // Offender stays pending, untouched.
        assert!(manager.is_pending(ids[1]));
        assert!(manager.name_taken("alice"));
        assert!(!manager.name_taken("Alice"));
    }

    #[tokio::test]
    async fn test_promote_unknown_session_fails() {
        let (mut manager, _ids) = manager_with(1).await;
        assert!(!manager.promote(999, "ghost"));
    }

    #[tokio::test]
    async fn test_remove_pending() {
        let (mut manager, ids) = manager_with(1).await;
        let removed = manager.remove(ids[0]);
        assert!(removed.is_some());
        assert!(manager.is_empty());
        assert!(!manager.is_pending(ids[0]));
    }

    #[tokio::test]
    async fn test_remove_active_frees_name() {
        let (mut manager, ids) = manager_with(2).await;
        assert!(manager.promote(ids[0], "alice"));
        let removed = manager.remove(ids[0]).unwrap();
        assert_eq!(removed.name, "alice");
        assert!(!manager.name_taken("alice"));
        // The freed name is available to the next joiner.
        assert!(manager.promote(ids[1], "alice"));
    }

    #[tokio::test]
    async fn test_remove_unknown_session() {
        let (mut manager, _ids) = manager_with(1).await;
        assert!(manager.remove(42).is_none());
        assert_eq!(manager.len(), 1);
    }
}
