//! Sequence Reflex State Library
//!
//! Server-side engine for the sequence reflex game: players click numbered
//! circles in ascending order as fast as they can.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Target Placement** - Scatters numbered circles over a safe area,
//!   keeping them apart and tagging any placement that could not be.
//!
//! - **Session State Machine** - Validates every click against the next
//!   expected number and detects wins and losses.
//!
//! - **Session Store** - Live sessions by id, with per-session locking and
//!   expiry sweeps.
//!
//! - **Results** - Finished games go to a [`ResultSink`] exactly once;
//!   leaderboards are read through [`Leaderboard`].
//!
//! # Design Principles
//!
//! 1. **The server decides** - Clients send click coordinates, the engine
//!    hit-tests and advances the game.
//!
//! 2. **No globals** - An [`Engine`] instance owns its sessions; build one at
//!    startup and share it.
//!
//! 3. **No networking** - This crate is pure state, no HTTP or database driver.
//!
//! 4. **Serialization-ready** - Requests and responses match the web client's
//!    JSON.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sequence_reflex_state::{
//!     ClickRequest, ClickResponse, Engine, EngineConfig, InMemoryRecordStore, StartGameRequest,
//! };
//!
//! let records = Arc::new(InMemoryRecordStore::new());
//! let engine = Engine::new(EngineConfig::default(), Arc::clone(&records)).unwrap();
//!
//! let game = engine
//!     .start_session(&StartGameRequest {
//!         player_name: Some("Alice".to_string()),
//!         numbers_count: 5,
//!         canvas_width: 1280.0,
//!         canvas_height: 720.0,
//!         safe_area: None,
//!     })
//!     .unwrap();
//!
//! // Click target 1 dead center
//! let first = game.circles.iter().find(|c| c.number == 1).unwrap();
//! let response = engine
//!     .click(&ClickRequest {
//!         game_id: game.game_id.clone(),
//!         x: first.x,
//!         y: first.y,
//!     })
//!     .unwrap();
//!
//! assert!(matches!(response, ClickResponse::Correct { current_number: 2, .. }));
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
