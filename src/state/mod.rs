//! Game session engine.
//!
//! This module provides the core state types and the engine tying them
//! together:
//!
//! - `geometry` - Targets, hit testing and overlap checks
//! - `placement` - Scattering numbered targets over a safe area
//! - `status` - Session status machine
//! - `session` - One player's game and click resolution
//! - `store` - Registry of live sessions with expiry
//! - `results` - Result sink and leaderboard queries
//! - `wire` - JSON request/response shapes
//! - `config` - Engine configuration
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                              Engine                                │
//! │                                                                    │
//! │   start ──▶ PlacementGenerator ──▶ SessionStore.create             │
//! │                                                                    │
//! │   click ──▶ SessionStore.with_session ──▶ Session.resolve_click    │
//! │                       (per-session lock)           │               │
//! │                                                    ▼ terminal only │
//! │                                               ResultSink           │
//! │                                                                    │
//! │   cleanup ──▶ expire_stale + cleanup_finished                      │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod geometry;
pub mod placement;
pub mod results;
pub mod session;
pub mod status;
pub mod store;
pub mod wire;

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

// Re-export commonly used types
pub use config::EngineConfig;
pub use error::GameError;
pub use geometry::{Target, PADDING};
pub use placement::{Placement, PlacementGenerator, SafeArea};
pub use results::{
    FinalResult, InMemoryRecordStore, Leaderboard, LeaderboardEntry, PersistenceError, RecordId,
    ResultRecord, ResultSink,
};
pub use session::{ClickReport, Outcome, Session};
pub use status::{InvalidTransition, SessionEvent, SessionStatus};
pub use store::SessionStore;
pub use wire::{ClickRequest, ClickResponse, ErrorResponse, StartGameRequest, StartGameResponse};

/// Serving-side engine: owns the live sessions and writes finished games
/// to the result sink.
#[derive(Debug)]
pub struct Engine<S: ResultSink> {
    config: EngineConfig,
    sessions: SessionStore,
    sink: S,
    rng: Mutex<StdRng>,
}

impl<S: ResultSink> Engine<S> {
    pub fn new(config: EngineConfig, sink: S) -> Result<Self, GameError> {
        Self::with_rng(config, sink, StdRng::from_entropy())
    }

    /// Engine with reproducible placements.
    pub fn with_seed(config: EngineConfig, sink: S, seed: u64) -> Result<Self, GameError> {
        Self::with_rng(config, sink, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: EngineConfig, sink: S, rng: StdRng) -> Result<Self, GameError> {
        config.validate()?;
        Ok(Self {
            config,
            sessions: SessionStore::new(),
            sink,
            rng: Mutex::new(rng),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Start a new game.
    pub fn start_session(&self, request: &StartGameRequest) -> Result<StartGameResponse, GameError> {
        self.start_session_at(request, Utc::now())
    }

    pub fn start_session_at(
        &self,
        request: &StartGameRequest,
        now: DateTime<Utc>,
    ) -> Result<StartGameResponse, GameError> {
        let count = request.numbers_count;
        self.config.check_target_count(count)?;

        let player_name = self.config.player_name(request.player_name.as_deref());
        let area = request.safe_area.unwrap_or_else(|| {
            SafeArea::from_canvas(request.canvas_width, request.canvas_height, &self.config)
        });

        let placements = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            PlacementGenerator::new(&self.config).generate(
                &mut *rng,
                count,
                area,
                self.config.circle_radius,
            )?
        };

        let forced = placement::forced_count(&placements);
        let targets: Vec<Target> = placements.into_iter().map(Placement::into_target).collect();
        let circles = targets.clone();

        let game_id = self.sessions.create(player_name.clone(), count, targets, now)?;
        log::info!(
            "Started session {} for {} with {} targets ({} forced)",
            game_id,
            player_name,
            count,
            forced
        );

        Ok(StartGameResponse {
            game_id,
            circles,
            next_expected: 1,
        })
    }

    /// Resolve a click and report the outcome.
    ///
    /// A failed result write does not fail the click; it is logged and the
    /// player still gets the outcome.
    pub fn click(&self, request: &ClickRequest) -> Result<ClickResponse, GameError> {
        self.click_at(request, Utc::now())
    }

    pub fn click_at(
        &self,
        request: &ClickRequest,
        now: DateTime<Utc>,
    ) -> Result<ClickResponse, GameError> {
        let (report, response) = self.sessions.with_session(&request.game_id, |session| {
            let report = session.resolve_click(request.x, request.y, now, &self.sink)?;
            let response = ClickResponse::from_outcome(&report.outcome, session.targets());
            Ok::<_, GameError>((report, response))
        })??;

        log::debug!(
            "Session {} click at ({:.1}, {:.1}): {}",
            request.game_id,
            request.x,
            request.y,
            report.outcome.as_str()
        );

        match &report.record {
            Some(Ok(record_id)) => log::info!(
                "Session {} finished ({}), recorded as {}",
                request.game_id,
                report.outcome.as_str(),
                record_id
            ),
            Some(Err(e)) => log::error!(
                "Session {} finished ({}) but the result was lost: {}",
                request.game_id,
                report.outcome.as_str(),
                e
            ),
            None => {}
        }

        Ok(response)
    }

    /// Quit a game before its final click.
    ///
    /// Records a failed result when `record_abandoned` is set and returns
    /// the record id.
    pub fn abandon(&self, session_id: &str, now: DateTime<Utc>) -> Result<Option<RecordId>, GameError> {
        let result = self.sessions.with_session(session_id, |session| session.abandon(now))??;
        log::info!(
            "Session {} abandoned after {:.2}s",
            session_id,
            result.elapsed_seconds
        );

        if !self.config.record_abandoned {
            return Ok(None);
        }

        match self.sink.record(&result) {
            Ok(id) => Ok(Some(id)),
            Err(e) => {
                log::error!("Abandoned session {} was not recorded: {}", session_id, e);
                Err(GameError::Persistence(e))
            }
        }
    }

    /// Current session state.
    pub fn session(&self, session_id: &str) -> Result<Session, GameError> {
        self.sessions.get(session_id)
    }

    /// Current session state as JSON.
    pub fn snapshot(&self, session_id: &str) -> Result<serde_json::Value, GameError> {
        Ok(self.sessions.get(session_id)?.to_json())
    }

    /// Drop idle and long-finished sessions.
    pub fn cleanup(&self, now: DateTime<Utc>) -> CleanupResult {
        let expired_sessions = self.sessions.expire_stale(now, self.config.session_ttl());
        let finished_sessions = self
            .sessions
            .cleanup_finished(now, self.config.finished_retention());

        let result = CleanupResult {
            expired_sessions,
            finished_sessions,
        };
        if !result.is_empty() {
            log::info!(
                "Cleanup removed {} idle and {} finished sessions",
                result.expired_sessions.len(),
                result.finished_sessions.len()
            );
        }
        result
    }
}

impl<S: ResultSink + Leaderboard> Engine<S> {
    /// Fastest completed games.
    pub fn leaderboard(&self, target_count: Option<u32>, limit: usize) -> Vec<LeaderboardEntry> {
        self.sink.top_results(target_count, limit)
    }
}

/// Result of cleanup operation.
#[derive(Debug, Default)]
pub struct CleanupResult {
    pub expired_sessions: Vec<String>,
    pub finished_sessions: Vec<String>,
}

impl CleanupResult {
    pub fn is_empty(&self) -> bool {
        self.expired_sessions.is_empty() && self.finished_sessions.is_empty()
    }
}
