//! Game session state and click resolution.
//!
//! A session owns its targets and tracks which number must be clicked
//! next. [`Session::resolve_click`] is the only way clicks change it.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::error::GameError;
use super::geometry::Target;
use super::results::{FinalResult, PersistenceError, RecordId, ResultSink};
use super::status::{SessionEvent, SessionStatus};

/// Result of one click, as seen by the player.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "lowercase")]
pub enum Outcome {
    /// No un-clicked target under the point
    Empty { expected: u32 },
    /// Right target, game continues
    Correct { expected: u32 },
    /// Last target clicked in order
    Complete { elapsed: f64 },
    /// Out-of-order target; game over
    Wrong {
        expected: u32,
        clicked: u32,
        elapsed: f64,
    },
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Empty { .. } => "empty",
            Self::Correct { .. } => "correct",
            Self::Complete { .. } => "complete",
            Self::Wrong { .. } => "wrong",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Wrong { .. })
    }
}

/// What a click did, plus the write it triggered (terminal clicks only).
#[derive(Debug, Clone, PartialEq)]
pub struct ClickReport {
    pub outcome: Outcome,
    pub record: Option<Result<RecordId, PersistenceError>>,
}

impl ClickReport {
    /// The write failed and the result is lost.
    pub fn persistence_error(&self) -> Option<&PersistenceError> {
        match &self.record {
            Some(Err(e)) => Some(e),
            _ => None,
        }
    }
}

/// One player's game.
#[derive(Debug, Clone)]
pub struct Session {
    /// Unique session ID
    pub id: String,

    /// Display name
    pub player_name: String,

    /// Targets in placement order
    targets: Vec<Target>,

    /// Also carries the next number to click while active
    status: SessionStatus,

    /// When the session was created
    pub started_at: DateTime<Utc>,

    /// Last click or creation
    pub last_activity: DateTime<Utc>,

    /// When a terminal state was reached
    pub ended_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Create a session. Targets must be numbered `1..=targets.len()`.
    pub fn new(
        id: String,
        player_name: String,
        targets: Vec<Target>,
        now: DateTime<Utc>,
    ) -> Result<Self, GameError> {
        if targets.is_empty() {
            return Err(GameError::invalid("a session needs at least one target"));
        }

        let mut numbers: Vec<u32> = targets.iter().map(|t| t.number).collect();
        numbers.sort_unstable();
        if numbers.iter().zip(1u32..).any(|(n, want)| *n != want) {
            return Err(GameError::invalid(
                "target numbers must form a contiguous range starting at 1",
            ));
        }

        Ok(Self {
            id,
            player_name,
            targets,
            status: SessionStatus::default(),
            started_at: now,
            last_activity: now,
            ended_at: None,
        })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target_count(&self) -> u32 {
        self.targets.len() as u32
    }

    /// Next number to click (`count + 1` once won).
    ///
    /// Correct clicks mark targets in ascending order, so once the status
    /// stops carrying the number it follows from the clicked count.
    pub fn expected(&self) -> u32 {
        self.status
            .expected()
            .unwrap_or_else(|| self.clicked_count() as u32 + 1)
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn clicked_count(&self) -> usize {
        self.targets.iter().filter(|t| t.clicked).count()
    }

    /// Seconds since start, never negative.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        let elapsed = now - self.started_at;
        let seconds = match elapsed.num_microseconds() {
            Some(us) => us as f64 / 1_000_000.0,
            None => elapsed.num_milliseconds() as f64 / 1_000.0,
        };
        seconds.max(0.0)
    }

    /// First un-clicked target under the point, in placement order.
    pub fn hit_test(&self, x: f64, y: f64) -> Option<usize> {
        self.targets
            .iter()
            .position(|t| !t.clicked && t.contains_point(x, y))
    }

    fn transition(&mut self, event: SessionEvent) -> Result<(), GameError> {
        self.status = self
            .status
            .apply(event, self.target_count())
            .map_err(|_| GameError::SessionAlreadyCompleted)?;
        Ok(())
    }

    fn finish(&mut self, now: DateTime<Utc>, completed: bool) -> FinalResult {
        self.ended_at = Some(now);
        FinalResult {
            player_name: self.player_name.clone(),
            elapsed_seconds: self.elapsed_seconds(now),
            target_count: self.target_count(),
            completed,
        }
    }

    /// Apply a click at (x, y).
    ///
    /// Returns the outcome and, for terminal outcomes, the result to record.
    pub(crate) fn apply_click(
        &mut self,
        x: f64,
        y: f64,
        now: DateTime<Utc>,
    ) -> Result<(Outcome, Option<FinalResult>), GameError> {
        if self.is_completed() {
            return Err(GameError::SessionAlreadyCompleted);
        }
        self.last_activity = now;

        let Some(index) = self.hit_test(x, y) else {
            return Ok((
                Outcome::Empty {
                    expected: self.expected(),
                },
                None,
            ));
        };

        let clicked = self.targets[index].number;
        let expected = self.expected();
        if clicked != expected {
            self.transition(SessionEvent::WrongClick)?;
            let result = self.finish(now, false);
            let outcome = Outcome::Wrong {
                expected,
                clicked,
                elapsed: result.elapsed_seconds,
            };
            return Ok((outcome, Some(result)));
        }

        self.transition(SessionEvent::CorrectClick)?;
        self.targets[index].clicked = true;

        if self.status.is_terminal() {
            let result = self.finish(now, true);
            let outcome = Outcome::Complete {
                elapsed: result.elapsed_seconds,
            };
            return Ok((outcome, Some(result)));
        }

        Ok((
            Outcome::Correct {
                expected: self.expected(),
            },
            None,
        ))
    }

    /// Resolve a click and forward a terminal result to `sink`.
    ///
    /// The sink is written exactly once per session, on the click that ends
    /// it. A failed write is returned in the report, not as an error.
    ///
    /// Outside this crate it is the only way to click:
    ///
    /// ```compile_fail
    /// # use sequence_reflex_state::{Session, Target};
    /// # let now = chrono::Utc::now();
    /// # let targets = vec![Target::new(0.0, 0.0, 1, 30.0)];
    /// # let mut session = Session::new("g".into(), "p".into(), targets, now).unwrap();
    /// session.apply_click(0.0, 0.0, now);
    /// ```
    pub fn resolve_click<S: ResultSink + ?Sized>(
        &mut self,
        x: f64,
        y: f64,
        now: DateTime<Utc>,
        sink: &S,
    ) -> Result<ClickReport, GameError> {
        let (outcome, result) = self.apply_click(x, y, now)?;
        let record = result.map(|r| sink.record(&r));
        Ok(ClickReport { outcome, record })
    }

    /// End the session without a final click.
    ///
    /// Returns the result to record for callers that keep quit games.
    pub fn abandon(&mut self, now: DateTime<Utc>) -> Result<FinalResult, GameError> {
        self.transition(SessionEvent::Abandon)?;
        self.last_activity = now;
        Ok(self.finish(now, false))
    }

    /// Convert to JSON for sending to clients.
    pub fn to_json(&self) -> serde_json::Value {
        let circles: Vec<serde_json::Value> = self.targets.iter().map(|t| t.to_json()).collect();

        serde_json::json!({
            "game_id": self.id,
            "player_name": self.player_name,
            "circles": circles,
            "current_number": self.expected(),
            "numbers_count": self.target_count(),
            "status": self.status.as_str(),
            "completed": self.is_completed()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::results::InMemoryRecordStore;
    use crate::state::results::Leaderboard;
    use pretty_assertions::assert_eq;

    /// Five well separated targets on a row: number n at x = 100 * n.
    fn make_targets(count: u32) -> Vec<Target> {
        (1..=count)
            .map(|n| Target::new(100.0 * n as f64, 200.0, n, 30.0))
            .collect()
    }

    fn make_session(count: u32) -> (Session, DateTime<Utc>) {
        let start = Utc::now();
        let session = Session::new(
            "game-1".to_string(),
            "Alice".to_string(),
            make_targets(count),
            start,
        )
        .unwrap();
        (session, start)
    }

    fn center(n: u32) -> (f64, f64) {
        (100.0 * n as f64, 200.0)
    }

    fn later(start: DateTime<Utc>, ms: i64) -> DateTime<Utc> {
        start + chrono::Duration::milliseconds(ms)
    }

    #[test]
    fn test_session_new() {
        let (session, start) = make_session(5);
        assert_eq!(session.expected(), 1);
        assert_eq!(session.target_count(), 5);
        assert!(!session.is_completed());
        assert_eq!(session.started_at, start);
        assert_eq!(session.status(), SessionStatus::AwaitingClick { expected: 1 });
    }

    #[test]
    fn test_session_rejects_bad_numbering() {
        let now = Utc::now();
        assert!(Session::new("g".into(), "p".into(), Vec::new(), now).is_err());

        let gap = vec![
            Target::new(0.0, 0.0, 1, 30.0),
            Target::new(100.0, 0.0, 3, 30.0),
        ];
        assert!(Session::new("g".into(), "p".into(), gap, now).is_err());

        let dup = vec![
            Target::new(0.0, 0.0, 1, 30.0),
            Target::new(100.0, 0.0, 1, 30.0),
        ];
        assert!(Session::new("g".into(), "p".into(), dup, now).is_err());
    }

    #[test]
    fn test_full_correct_sequence() {
        let (mut session, start) = make_session(5);
        let sink = InMemoryRecordStore::new();

        for n in 1..=4 {
            let (x, y) = center(n);
            let report = session
                .resolve_click(x, y, later(start, 100 * n as i64), &sink)
                .unwrap();
            assert_eq!(report.outcome, Outcome::Correct { expected: n + 1 });
            assert!(report.record.is_none());
        }

        let (x, y) = center(5);
        let report = session
            .resolve_click(x, y, later(start, 1500), &sink)
            .unwrap();
        assert_eq!(report.outcome, Outcome::Complete { elapsed: 1.5 });
        assert_eq!(report.record, Some(Ok(1)));

        assert!(session.is_completed());
        assert_eq!(session.status(), SessionStatus::Won);
        assert_eq!(session.expected(), 6);
        assert_eq!(session.clicked_count(), 5);
        assert_eq!(sink.count(), 1);
        assert_eq!(sink.top_results(Some(5), 10)[0].elapsed_seconds, 1.5);
    }

    #[test]
    fn test_wrong_click_ends_game() {
        let (mut session, start) = make_session(5);
        let sink = InMemoryRecordStore::new();

        let (x, y) = center(3);
        let report = session
            .resolve_click(x, y, later(start, 250), &sink)
            .unwrap();
        assert_eq!(
            report.outcome,
            Outcome::Wrong {
                expected: 1,
                clicked: 3,
                elapsed: 0.25
            }
        );
        assert_eq!(session.status(), SessionStatus::Lost);
        assert_eq!(session.expected(), 1);

        // Nothing else goes through, not even empty clicks
        let (x, y) = center(1);
        let err = session.resolve_click(x, y, later(start, 300), &sink);
        assert_eq!(err, Err(GameError::SessionAlreadyCompleted));
        let err = session.resolve_click(-500.0, -500.0, later(start, 300), &sink);
        assert_eq!(err, Err(GameError::SessionAlreadyCompleted));

        // One failed result, not ranked
        assert_eq!(sink.count(), 1);
        assert!(sink.top_results(None, 10).is_empty());
        assert!(!sink.recent_results(1)[0].completed);
    }

    #[test]
    fn test_lower_number_is_wrong() {
        let (mut session, start) = make_session(3);
        let sink = InMemoryRecordStore::new();

        let (x, y) = center(1);
        session.resolve_click(x, y, start, &sink).unwrap();

        // Clicked targets are skipped by hit testing, so re-clicking 1 is empty
        let report = session.resolve_click(x, y, start, &sink).unwrap();
        assert_eq!(report.outcome, Outcome::Empty { expected: 2 });

        let (x, y) = center(3);
        let report = session.resolve_click(x, y, start, &sink).unwrap();
        assert!(matches!(
            report.outcome,
            Outcome::Wrong {
                expected: 2,
                clicked: 3,
                ..
            }
        ));
    }

    #[test]
    fn test_empty_click() {
        let (mut session, start) = make_session(5);
        let sink = InMemoryRecordStore::new();

        let report = session
            .resolve_click(150.0, 200.0, later(start, 10), &sink)
            .unwrap();
        assert_eq!(report.outcome, Outcome::Empty { expected: 1 });
        assert_eq!(session.expected(), 1);
        assert!(!session.is_completed());
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn test_overlap_first_match_wins() {
        let start = Utc::now();
        let targets = vec![
            Target::new(100.0, 100.0, 1, 30.0),
            Target::new(110.0, 100.0, 2, 30.0),
        ];
        let mut session = Session::new("g".into(), "p".into(), targets, start).unwrap();

        // Point covered by both; placement order picks 1
        let (outcome, _) = session.apply_click(105.0, 100.0, start).unwrap();
        assert_eq!(outcome, Outcome::Correct { expected: 2 });

        // 1 is clicked now, so the same point hits 2
        let (outcome, result) = session.apply_click(105.0, 100.0, start).unwrap();
        assert_eq!(outcome, Outcome::Complete { elapsed: 0.0 });
        assert!(result.unwrap().completed);
    }

    #[test]
    fn test_persistence_failure_reported() {
        let (mut session, start) = make_session(1);
        let sink = InMemoryRecordStore::new();
        sink.set_available(false);

        let (x, y) = center(1);
        let report = session.resolve_click(x, y, start, &sink).unwrap();
        assert!(matches!(report.outcome, Outcome::Complete { .. }));
        assert!(report.persistence_error().is_some());

        // State still moved on
        assert!(session.is_completed());
    }

    #[test]
    fn test_abandon() {
        let (mut session, start) = make_session(5);

        let (x, y) = center(1);
        session.apply_click(x, y, start).unwrap();

        let result = session.abandon(later(start, 2000)).unwrap();
        assert_eq!(
            result,
            FinalResult {
                player_name: "Alice".to_string(),
                elapsed_seconds: 2.0,
                target_count: 5,
                completed: false,
            }
        );
        assert_eq!(session.status(), SessionStatus::Abandoned);
        assert_eq!(session.abandon(start), Err(GameError::SessionAlreadyCompleted));
    }

    #[test]
    fn test_expected_follows_status() {
        let (mut session, start) = make_session(3);
        let sink = InMemoryRecordStore::new();

        for n in 1..=3 {
            assert_eq!(session.status().expected(), Some(n));
            assert_eq!(session.expected(), n);
            let (x, y) = center(n);
            session.resolve_click(x, y, start, &sink).unwrap();
        }

        assert_eq!(session.status(), SessionStatus::Won);
        assert_eq!(session.status().expected(), None);
        assert_eq!(session.expected(), 4);
        assert_eq!(session.to_json()["current_number"], 4);
    }

    #[test]
    fn test_expected_kept_after_loss_and_abandon() {
        let (mut lost, start) = make_session(4);
        let sink = InMemoryRecordStore::new();
        let (x, y) = center(1);
        lost.resolve_click(x, y, start, &sink).unwrap();
        let (x, y) = center(4);
        lost.resolve_click(x, y, start, &sink).unwrap();
        assert_eq!(lost.status(), SessionStatus::Lost);
        assert_eq!(lost.expected(), 2);

        let (mut quit, start) = make_session(4);
        for n in 1..=2 {
            let (x, y) = center(n);
            quit.resolve_click(x, y, start, &sink).unwrap();
        }
        quit.abandon(start).unwrap();
        assert_eq!(quit.expected(), 3);
    }

    #[test]
    fn test_clock_skew_clamped() {
        let (session, start) = make_session(1);
        assert_eq!(session.elapsed_seconds(later(start, -500)), 0.0);
    }

    #[test]
    fn test_outcome_json() {
        let json = serde_json::to_value(Outcome::Wrong {
            expected: 1,
            clicked: 3,
            elapsed: 0.5,
        })
        .unwrap();
        assert_eq!(json["result"], "wrong");
        assert_eq!(json["clicked"], 3);

        let json = serde_json::to_value(Outcome::Empty { expected: 2 }).unwrap();
        assert_eq!(json["result"], "empty");
    }

    #[test]
    fn test_to_json() {
        let (session, _) = make_session(3);
        let json = session.to_json();
        assert_eq!(json["game_id"], "game-1");
        assert_eq!(json["circles"].as_array().unwrap().len(), 3);
        assert_eq!(json["current_number"], 1);
        assert_eq!(json["status"], "awaiting_click");
    }
}
