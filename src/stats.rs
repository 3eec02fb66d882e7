//! Persisted data model for usage statistics.
//!
//! Two files live under the config directory:
//! - `usage.log` - append-only event log, one `UsageRecord` per line
//! - `usage_stats.json` - running `StatsDocument`, rewritten on every event

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pricing::calculate_cost;

/// Model name recorded when the caller does not specify one.
pub const DEFAULT_MODEL: &str = "kimi-k2";

/// Operation label recorded when the caller does not specify one.
pub const DEFAULT_OPERATION: &str = "chat";

/// One logged usage event. Immutable once appended to the usage log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    /// RFC 3339 timestamp of the event (local time)
    pub timestamp: String,
    /// Caller-supplied session identifier
    pub session_id: String,
    /// Input token count
    pub input_tokens: u64,
    /// Output token count
    pub output_tokens: u64,
    /// Derived: input + output
    pub total_tokens: u64,
    /// Derived cost in USD, rounded to 6 decimals
    pub cost_usd: f64,
    /// Model name (default `kimi-k2`)
    pub model: String,
    /// Operation label (default `chat`)
    pub operation: String,
}

impl UsageRecord {
    /// Builds a record timestamped now, with the cost derived from the
    /// pricing table.
    pub fn new(
        session_id: &str,
        input_tokens: u64,
        output_tokens: u64,
        model: &str,
        operation: &str,
    ) -> Self {
        Self {
            timestamp: Local::now().to_rfc3339(),
            session_id: session_id.to_string(),
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
            cost_usd: calculate_cost(input_tokens, output_tokens),
            model: model.to_string(),
            operation: operation.to_string(),
        }
    }
}

/// Aggregated counters for one calendar date. Never deleted once created.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayStats {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
    pub sessions: u64,
}

impl DayStats {
    fn add(&mut self, record: &UsageRecord) {
        self.input_tokens += record.input_tokens;
        self.output_tokens += record.output_tokens;
        self.total_cost += record.cost_usd;
        self.sessions += 1;
    }
}

/// All-time counters. Same shape as `DayStats`; exactly one instance.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TotalStats {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
    pub sessions: u64,
}

impl TotalStats {
    fn add(&mut self, record: &UsageRecord) {
        self.input_tokens += record.input_tokens;
        self.output_tokens += record.output_tokens;
        self.total_cost += record.cost_usd;
        self.sessions += 1;
    }
}

/// The persisted aggregate: all-time totals plus per-date buckets keyed by
/// ISO date string. `BTreeMap` keeps the date keys ordered on disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsDocument {
    pub total: TotalStats,
    pub daily: BTreeMap<String, DayStats>,
}

impl StatsDocument {
    /// Accumulates one record into the bucket for `date` (created
    /// zero-valued if absent) and into the all-time totals.
    pub fn apply(&mut self, date: &str, record: &UsageRecord) {
        self.daily.entry(date.to_string()).or_default().add(record);
        self.total.add(record);
    }
}
