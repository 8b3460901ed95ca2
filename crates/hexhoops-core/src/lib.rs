//! HexHoops - rules engine for a two-team, hex-grid basketball card game
//!
//! This crate owns the authoritative state of a match and the only legal way
//! to change it: applying one validated action at a time. It includes:
//! - Hex coordinate geometry for the 5x14 court
//! - Board terrain and occupant placement with uniqueness checks
//! - Players, decks, cards and the read-only card catalog
//! - Movement and targeting rules
//! - A trigger registry for reactive abilities
//!
//! # Architecture
//!
//! `GameState` is an immutable snapshot. `ActionEngine::apply` clones it,
//! applies one `GameAction`, appends one `LoggedEvent`, re-checks the board
//! invariants and returns the new snapshot. The engine is platform-agnostic
//! and compiles to native code or, with the `wasm` feature, WebAssembly.
//!
//! # Modules
//!
//! - [`hex`]: Offset/cube coordinates, distance, ranges and lines
//! - [`board`]: Court terrain, teams and occupants
//! - [`cards`]: Card definitions, effects, catalog and card instances
//! - [`player`]: Basketball players, modifiers, attachments and decks
//! - [`game`]: Match state, configuration and errors
//! - [`actions`]: Actions, events and the event kind hierarchy
//! - [`engine`]: The action engine
//! - [`movement`]: Reachable positions and movement constraints
//! - [`targeting`]: Standard action targets and requirements
//! - [`triggers`]: Trigger registry

pub mod actions;
pub mod board;
pub mod cards;
pub mod engine;
pub mod game;
pub mod hex;
pub mod movement;
pub mod player;
pub mod targeting;
pub mod triggers;
#[cfg(feature = "wasm")]
pub mod wasm;

// Re-export commonly used types
pub use actions::{CardDestination, EventKind, GameAction, GameEvent, LoggedEvent};
pub use board::{Board, InvariantReport, Occupant, Team};
pub use cards::{CardDefinition, CardInstance, Catalog, Effect, PartialCardDefinition, PendingEffect};
pub use engine::ActionEngine;
pub use game::{Ball, GameError, GameState, MatchConfig, Phase, TeamConfig};
pub use hex::HexPosition;
pub use movement::{MoveConstraint, MovementResolver};
pub use player::{BasketballPlayer, Deck, DetachDestination, Modifier};
pub use targeting::{StandardActionKind, Target};
pub use triggers::{TriggerBinding, TriggerCondition, TriggerRegistry};
