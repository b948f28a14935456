//! # Word-Guessing Game Server Library
//!
//! This library implements the server side of a multiplayer, turn-based
//! word-guessing game. Clients connect over TCP, pick a display name, and
//! take turns guessing letters of a hidden word shared by everyone in the
//! room, receiving broadcast updates of the game state after every move.
//!
//! ## Architecture Design
//!
//! ### Single Dispatcher, Per-Connection Readers
//! Each accepted connection gets a lightweight reader task that frames the
//! byte stream into protocol lines and forwards them as events over an
//! mpsc channel. A single dispatcher task owns all mutable state (player
//! registry, game state, dictionary) and processes events sequentially,
//! so there is no locking and no race between a removal and a later use
//! of the same session.
//!
//! ### Sessions by Identifier
//! Sessions are referenced by a stable `u32` id, never by pointer. The
//! turn holder in particular is an id that is re-resolved against the
//! active group on every use, so removing a player can never leave a
//! dangling turn reference.
//!
//! ## Module Organization
//!
//! - [`line`] — accumulates partial reads into complete `\r\n`-terminated
//!   lines, with a hard cap on unterminated input.
//! - [`player_manager`] — the connection registry: pending clients (no
//!   name yet) and active players (joined, eligible for turns).
//! - [`game`] — the shared word puzzle and the cyclic turn scheduler.
//! - [`words`] — dictionary loading and word cycling.
//! - [`network`] — TCP accept loop, reader tasks and the event dispatcher
//!   that ties everything together.

pub mod game;
pub mod line;
pub mod network;
pub mod player_manager;
pub mod words;
