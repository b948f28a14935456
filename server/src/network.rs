//! Server network layer: TCP accept loop, per-connection reader tasks and
//! the event dispatcher that drives the game.
//!
//! Each accepted connection is split: the read half moves into a spawned
//! reader task that assembles protocol lines and forwards them as
//! [`SessionEvent`]s over an mpsc channel; the write half stays with the
//! dispatcher inside the registry. The dispatcher is the only place that
//! touches the registry or the game state, so every mutation is
//! serialized and a removal can never race a later use of the same
//! session. Events arriving for an id that has already been removed are
//! simply dropped.

use crate::game::{GameState, GuessOutcome};
use crate::line::{LineAssembler, LineOutcome};
use crate::player_manager::PlayerManager;
use crate::words::Dictionary;
use log::{debug, info, warn};
use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::OwnedReadHalf;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

/// Messages sent from reader tasks to the dispatcher.
#[derive(Debug)]
pub enum SessionEvent {
    /// A complete line arrived, terminator stripped.
    Line { id: u32, line: String },
    /// The client submitted an empty line.
    Blank { id: u32 },
    /// Accumulated unterminated input exceeded the line limit.
    Overflow { id: u32 },
    /// The peer closed the connection or the read failed.
    Closed { id: u32 },
}

impl SessionEvent {
    pub fn session_id(&self) -> u32 {
        match *self {
            SessionEvent::Line { id, .. }
            | SessionEvent::Blank { id }
            | SessionEvent::Overflow { id }
            | SessionEvent::Closed { id } => id,
        }
    }
}

/// Main server: owns the listener, the registry, the game state and the
/// dictionary, and runs the dispatcher loop.
pub struct Server {
    listener: TcpListener,
    players: PlayerManager,
    game: GameState,
    dict: Dictionary,
    event_tx: mpsc::UnboundedSender<SessionEvent>,
    event_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl Server {
    /// Binds the listener and deals the first word. The first round
    /// starts immediately; players join it as they connect.
    pub async fn new(addr: &str, mut dict: Dictionary, guess_budget: u32) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let mut game = GameState::new(guess_budget);
        let word = dict.next_word().to_string();
        game.start_round(&word);

        Ok(Server {
            listener,
            players: PlayerManager::new(),
            game,
            dict,
            event_tx,
            event_rx,
        })
    }

    /// The bound address; useful when binding to port 0.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Main dispatcher loop: accepts new connections and processes one
    /// session event at a time.
    pub async fn run(&mut self) -> io::Result<()> {
        info!("Server listening on {}", self.listener.local_addr()?);

        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, addr)) => self.accept_connection(stream, addr).await,
                        Err(e) => warn!("accept failed: {}", e),
                    }
                }
                event = self.event_rx.recv() => {
                    // The sender half lives in self, so recv cannot
                    // return None while the server runs.
                    if let Some(event) = event {
                        self.handle_event(event).await;
                    }
                }
            }
        }
    }

    /// Registers a new connection as pending and greets it.
    async fn accept_connection(&mut self, stream: TcpStream, addr: SocketAddr) {
        info!("A new client is connecting from {}", addr);
        let (read_half, write_half) = stream.into_split();
        let id = self.players.add(addr, write_half);
        let reader = tokio::spawn(read_session(id, read_half, self.event_tx.clone()));
        self.players.attach_reader(id, reader);

        if !self.send_to(id, shared::WELCOME).await {
            self.players.remove(id);
        }
    }

    /// Routes an event to the handler for the session's current group.
    async fn handle_event(&mut self, event: SessionEvent) {
        let id = event.session_id();
        if self.players.is_active(id) {
            self.handle_active_event(id, event).await;
        } else if self.players.is_pending(id) {
            self.handle_pending_event(id, event).await;
        } else {
            // Session was removed earlier in this or a previous cycle.
            debug!("dropping event for unknown session {}", id);
        }
    }

    /// Pending clients are only ever asked for a name.
    async fn handle_pending_event(&mut self, id: u32, event: SessionEvent) {
        match event {
            SessionEvent::Closed { .. } => {
                info!("client {} left before entering a name", id);
                self.players.remove(id);
            }
            SessionEvent::Overflow { .. } => {
                warn!("pending client {} exceeded the line limit, disconnecting", id);
                self.players.remove(id);
            }
            SessionEvent::Blank { .. } => {
                self.reprompt_name(id).await;
            }
            SessionEvent::Line { line, .. } => {
                let name = line.trim();
                if name.is_empty() {
                    self.reprompt_name(id).await;
                } else if !self.players.promote(id, name) {
                    info!("client {} picked already-taken name {:?}", id, name);
                    self.reprompt_name(id).await;
                } else {
                    self.welcome_player(id).await;
                }
            }
        }
    }

    /// Re-sends the greeting to a still-pending client.
    async fn reprompt_name(&mut self, id: u32) {
        if !self.send_to(id, shared::WELCOME).await {
            self.players.remove(id);
        }
    }

    /// A pending client just became active: hand it the turn if nobody
    /// holds one, then announce the join, the status and the turn.
    async fn welcome_player(&mut self, id: u32) {
        let Some(name) = self.players.name(id).map(str::to_string) else {
            return;
        };
        info!("{} has just joined", name);

        if self.game.turn().is_none() {
            self.game.set_turn(id);
        }

        self.broadcast(&shared::joined(&name), None).await;
        self.broadcast_status().await;
        self.announce_turn().await;
    }

    /// Active clients either guess (turn holder) or get told to wait.
    async fn handle_active_event(&mut self, id: u32, event: SessionEvent) {
        match event {
            SessionEvent::Closed { .. } => {
                self.depart_active(id).await;
            }
            SessionEvent::Overflow { .. } => {
                warn!("active client {} exceeded the line limit, disconnecting", id);
                self.depart_active(id).await;
            }
            SessionEvent::Blank { .. } => {
                if self.game.turn() == Some(id) {
                    if !self.send_to(id, shared::INVALID_GUESS).await {
                        self.remove_active(id);
                    }
                } else {
                    // Out-of-turn blank lines are ignored.
                    debug!("ignoring blank line from client {} out of turn", id);
                }
            }
            SessionEvent::Line { line, .. } => {
                if self.game.turn() == Some(id) {
                    self.handle_guess(id, &line).await;
                } else {
                    if let Some(name) = self.players.name(id) {
                        info!("Player {} tried to guess out of turn", name);
                    }
                    if !self.send_to(id, shared::NOT_YOUR_TURN).await {
                        self.remove_active(id);
                    }
                }
            }
        }
    }

    /// Runs one guess from the turn holder through the game state and
    /// performs the resulting announcements.
    async fn handle_guess(&mut self, id: u32, line: &str) {
        let Some(letter) = shared::parse_guess(line) else {
            if !self.send_to(id, shared::INVALID_GUESS).await {
                self.remove_active(id);
            }
            return;
        };
        if self.game.is_guessed(letter) {
            if !self.send_to(id, shared::ALREADY_GUESSED).await {
                self.remove_active(id);
            }
            return;
        }
        let Some(name) = self.players.name(id).map(str::to_string) else {
            return;
        };

        let outcome = self.game.apply_guess(letter);
        info!("{} guesses: {}", name, letter);
        self.broadcast(&shared::guessed(&name, letter), None).await;

        if !outcome.hit() {
            info!("Letter {} is not in the word", letter);
            // Advance while the guesser is still in the order, then tell
            // them; a failed write removes them without a second advance.
            self.game.advance_turn(&self.players.active_ids());
            if !self.send_to(id, &shared::not_in_word(letter)).await {
                self.remove_active(id);
            }
        }

        self.broadcast_status().await;

        match outcome {
            GuessOutcome::Win => {
                info!("Game over! {} won!", name);
                if !self.send_to(id, shared::WIN_SELF).await {
                    self.remove_active(id);
                }
                self.broadcast(&shared::won(&name), Some(id)).await;
                self.new_round().await;
            }
            GuessOutcome::Exhausted { .. } => {
                info!("No guesses left. Game over.");
                self.broadcast(shared::NO_GUESSES_LEFT, None).await;
                self.new_round().await;
            }
            GuessOutcome::Continue { .. } => {
                self.announce_turn().await;
            }
        }
    }

    /// Starts the next round with a fresh word. The turn holder carries
    /// over from the finished round.
    async fn new_round(&mut self) {
        let word = self.dict.next_word().to_string();
        self.game.start_round(&word);
        info!("New game.");
        self.broadcast(shared::NEW_GAME, None).await;
        self.broadcast_status().await;
        self.announce_turn().await;
    }

    /// Handles an active player's departure: remove (turn-safe), tell the
    /// survivors, re-announce the turn.
    async fn depart_active(&mut self, id: u32) {
        let Some(name) = self.remove_active(id) else {
            return;
        };
        info!("Goodbye {}", name);
        if self.players.active_is_empty() {
            return;
        }
        self.broadcast(&shared::goodbye(&name), None).await;
        self.announce_turn().await;
    }

    /// Removes an active player, advancing the turn off them first so
    /// the turn reference never dangles. Returns the departed name.
    fn remove_active(&mut self, id: u32) -> Option<String> {
        if self.game.turn() == Some(id) {
            self.game.advance_turn(&self.players.active_ids());
            if self.game.turn() == Some(id) {
                // They were the only active player.
                self.game.clear_turn();
            }
        }
        self.players.remove(id).map(|p| p.name)
    }

    /// Sends the "Your guess?" prompt to the holder and the waiting
    /// notice to everyone else. A failed prompt write drops the holder
    /// and retries with the next player in order.
    async fn announce_turn(&mut self) {
        loop {
            let Some(holder) = self.game.turn() else {
                return;
            };
            let Some(name) = self.players.name(holder).map(str::to_string) else {
                warn!("turn holder {} not found in registry", holder);
                self.game.clear_turn();
                return;
            };
            if self.send_to(holder, shared::YOUR_GUESS).await {
                info!("It's {}'s turn.", name);
                self.broadcast(&shared::turn(&name), Some(holder)).await;
                return;
            }
            self.remove_active(holder);
        }
    }

    /// Broadcasts the current reveal buffer and guess count.
    async fn broadcast_status(&mut self) {
        let status = shared::status(&self.game.revealed_word(), self.game.guesses_left());
        self.broadcast(&status, None).await;
    }

    /// Writes a message to every active player except `exclude`.
    ///
    /// A failed recipient is removed (turn-safe) after the sweep; the
    /// failure never aborts delivery to the remaining recipients.
    async fn broadcast(&mut self, message: &str, exclude: Option<u32>) {
        let mut failed = Vec::new();
        for id in self.players.active_ids() {
            if Some(id) == exclude {
                continue;
            }
            let Some(writer) = self.players.writer_mut(id) else {
                continue;
            };
            if let Err(e) = writer.write_all(message.as_bytes()).await {
                warn!("write to client {} failed: {}", id, e);
                failed.push(id);
            }
        }
        for id in failed {
            self.remove_active(id);
        }
    }

    /// Best-effort single-recipient write. Returns false on failure;
    /// the caller decides whether and how to remove the session.
    async fn send_to(&mut self, id: u32, message: &str) -> bool {
        let Some(writer) = self.players.writer_mut(id) else {
            return false;
        };
        match writer.write_all(message.as_bytes()).await {
            Ok(()) => true,
            Err(e) => {
                warn!("write to client {} failed: {}", id, e);
                false
            }
        }
    }
}

/// Reader task: one per connection. Performs bounded reads, feeds the
/// line assembler and forwards outcomes to the dispatcher. Exits on peer
/// close, read error, line overflow or a closed channel.
async fn read_session(id: u32, mut reader: OwnedReadHalf, tx: mpsc::UnboundedSender<SessionEvent>) {
    let mut assembler = LineAssembler::new(shared::MAX_LINE_BYTES);
    let mut buf = [0u8; 128];

    loop {
        let event = match reader.read(&mut buf).await {
            Ok(0) => SessionEvent::Closed { id },
            Ok(n) => match assembler.feed(&buf[..n]) {
                Ok(LineOutcome::Partial) => continue,
                Ok(LineOutcome::Blank) => SessionEvent::Blank { id },
                Ok(LineOutcome::Complete(line)) => SessionEvent::Line { id, line },
                Err(err) => {
                    debug!("client {}: {}", id, err);
                    SessionEvent::Overflow { id }
                }
            },
            Err(e) => {
                debug!("read from client {} failed: {}", id, e);
                SessionEvent::Closed { id }
            }
        };

        let done = matches!(
            event,
            SessionEvent::Closed { .. } | SessionEvent::Overflow { .. }
        );
        if tx.send(event).is_err() || done {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_event_ids() {
        assert_eq!(
            SessionEvent::Line {
                id: 1,
                line: "a".to_string()
            }
            .session_id(),
            1
        );
        assert_eq!(SessionEvent::Blank { id: 2 }.session_id(), 2);
        assert_eq!(SessionEvent::Overflow { id: 3 }.session_id(), 3);
        assert_eq!(SessionEvent::Closed { id: 4 }.session_id(), 4);
    }

    #[tokio::test]
    async fn test_server_binds_ephemeral_port() {
        let dict = Dictionary::from_words(vec!["apple".to_string()]);
        let server = Server::new("127.0.0.1:0", dict, 8).await.unwrap();
        let addr = server.local_addr().unwrap();
        assert_ne!(addr.port(), 0);
    }

    #[tokio::test]
    async fn test_first_word_is_dealt_on_construction() {
        let dict = Dictionary::from_words(vec!["apple".to_string(), "zebra".to_string()]);
        let server = Server::new("127.0.0.1:0", dict, 8).await.unwrap();
        assert_eq!(server.game.revealed_word(), "-----");
        assert_eq!(server.game.guesses_left(), 8);
        // Next round takes the following word from the cycle.
        assert_eq!(server.dict.clone().next_word(), "zebra");
    }
}
