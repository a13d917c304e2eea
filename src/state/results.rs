//! Result recording and leaderboards.
//!
//! The engine only ever writes through [`ResultSink`]; ranking reads go
//! through [`Leaderboard`]. A database adapter implements both.
//! [`InMemoryRecordStore`] is the in-process implementation.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Identifier assigned by the store to a written record.
pub type RecordId = i64;

/// A finished game, ready to be written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinalResult {
    pub player_name: String,
    pub elapsed_seconds: f64,
    pub target_count: u32,
    pub completed: bool,
}

/// A stored result row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    pub id: RecordId,
    pub player_name: String,
    pub elapsed_seconds: f64,
    pub target_count: u32,
    pub completed: bool,
    pub timestamp: DateTime<Utc>,
}

/// A ranked row (completed games only).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub name: String,
    #[serde(rename = "time")]
    pub elapsed_seconds: f64,
    #[serde(rename = "circles")]
    pub target_count: u32,
    pub timestamp: DateTime<Utc>,
}

impl From<&ResultRecord> for LeaderboardEntry {
    fn from(record: &ResultRecord) -> Self {
        Self {
            name: record.player_name.clone(),
            elapsed_seconds: record.elapsed_seconds,
            target_count: record.target_count,
            timestamp: record.timestamp,
        }
    }
}

/// Write failure reported by a result store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistenceError {
    pub message: String,
}

impl PersistenceError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for PersistenceError {}

/// Destination for finished games.
pub trait ResultSink: Send + Sync {
    /// Store one outcome. Called at most once per session.
    fn record_outcome(
        &self,
        player_name: &str,
        elapsed_seconds: f64,
        target_count: u32,
        completed: bool,
    ) -> Result<RecordId, PersistenceError>;

    fn record(&self, result: &FinalResult) -> Result<RecordId, PersistenceError> {
        self.record_outcome(
            &result.player_name,
            result.elapsed_seconds,
            result.target_count,
            result.completed,
        )
    }
}

/// Read side of the result store.
pub trait Leaderboard {
    /// Fastest completed games, optionally for one target count.
    fn top_results(&self, target_count: Option<u32>, limit: usize) -> Vec<LeaderboardEntry>;

    /// Fastest completed games per target count, ascending by count.
    fn top_results_grouped(&self, limit_per_group: usize) -> BTreeMap<u32, Vec<LeaderboardEntry>>;

    /// Latest results of any kind, newest first.
    fn recent_results(&self, limit: usize) -> Vec<ResultRecord>;
}

impl<T: ResultSink + ?Sized> ResultSink for std::sync::Arc<T> {
    fn record_outcome(
        &self,
        player_name: &str,
        elapsed_seconds: f64,
        target_count: u32,
        completed: bool,
    ) -> Result<RecordId, PersistenceError> {
        (**self).record_outcome(player_name, elapsed_seconds, target_count, completed)
    }
}

impl<T: Leaderboard + ?Sized> Leaderboard for std::sync::Arc<T> {
    fn top_results(&self, target_count: Option<u32>, limit: usize) -> Vec<LeaderboardEntry> {
        (**self).top_results(target_count, limit)
    }

    fn top_results_grouped(&self, limit_per_group: usize) -> BTreeMap<u32, Vec<LeaderboardEntry>> {
        (**self).top_results_grouped(limit_per_group)
    }

    fn recent_results(&self, limit: usize) -> Vec<ResultRecord> {
        (**self).recent_results(limit)
    }
}

#[derive(Debug)]
struct RecordTable {
    rows: Vec<ResultRecord>,
    next_id: RecordId,
    available: bool,
}

/// Result store kept in memory.
#[derive(Debug)]
pub struct InMemoryRecordStore {
    table: Mutex<RecordTable>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self {
            table: Mutex::new(RecordTable {
                rows: Vec::new(),
                next_id: 1,
                available: true,
            }),
        }
    }
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn table(&self) -> std::sync::MutexGuard<'_, RecordTable> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Simulate the backing store going away (writes fail while unavailable).
    pub fn set_available(&self, available: bool) {
        self.table().available = available;
    }

    /// Total stored rows.
    pub fn count(&self) -> usize {
        self.table().rows.len()
    }

    /// Write a row with an explicit timestamp.
    pub fn insert_at(
        &self,
        result: &FinalResult,
        timestamp: DateTime<Utc>,
    ) -> Result<RecordId, PersistenceError> {
        let mut table = self.table();
        if !table.available {
            return Err(PersistenceError::new("result store unavailable"));
        }

        let id = table.next_id;
        table.next_id += 1;
        table.rows.push(ResultRecord {
            id,
            player_name: result.player_name.clone(),
            elapsed_seconds: result.elapsed_seconds,
            target_count: result.target_count,
            completed: result.completed,
            timestamp,
        });
        Ok(id)
    }

    fn ranked(rows: &[ResultRecord], target_count: Option<u32>) -> Vec<&ResultRecord> {
        let mut ranked: Vec<&ResultRecord> = rows
            .iter()
            .filter(|r| r.completed)
            .filter(|r| target_count.map_or(true, |n| r.target_count == n))
            .collect();
        ranked.sort_by(|a, b| {
            a.elapsed_seconds
                .total_cmp(&b.elapsed_seconds)
                .then(a.id.cmp(&b.id))
        });
        ranked
    }
}

impl ResultSink for InMemoryRecordStore {
    fn record_outcome(
        &self,
        player_name: &str,
        elapsed_seconds: f64,
        target_count: u32,
        completed: bool,
    ) -> Result<RecordId, PersistenceError> {
        let result = FinalResult {
            player_name: player_name.to_string(),
            elapsed_seconds,
            target_count,
            completed,
        };
        self.insert_at(&result, Utc::now())
    }
}

impl Leaderboard for InMemoryRecordStore {
    fn top_results(&self, target_count: Option<u32>, limit: usize) -> Vec<LeaderboardEntry> {
        let table = self.table();
        Self::ranked(&table.rows, target_count)
            .into_iter()
            .take(limit)
            .map(LeaderboardEntry::from)
            .collect()
    }

    fn top_results_grouped(&self, limit_per_group: usize) -> BTreeMap<u32, Vec<LeaderboardEntry>> {
        let table = self.table();
        let mut grouped: BTreeMap<u32, Vec<LeaderboardEntry>> = BTreeMap::new();

        for record in Self::ranked(&table.rows, None) {
            let group = grouped.entry(record.target_count).or_default();
            if group.len() < limit_per_group {
                group.push(LeaderboardEntry::from(record));
            }
        }

        grouped
    }

    fn recent_results(&self, limit: usize) -> Vec<ResultRecord> {
        let table = self.table();
        let mut rows: Vec<ResultRecord> = table.rows.clone();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        rows.truncate(limit);
        rows
    }
}
