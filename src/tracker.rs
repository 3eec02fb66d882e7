//! The usage store: logs events, maintains running statistics, and derives
//! reports and spending alerts.
//!
//! Persistence is two files under the config directory. `log_usage` appends
//! to `usage.log` first (the write-ahead record of truth), then rewrites
//! `usage_stats.json`. The stats rewrite is atomic (temp file + rename), but
//! the pair is not: a crash between the two writes leaves the log ahead of
//! the stats document. Single-process use is assumed; there is no locking.

use anyhow::{Context, Result};
use chrono::{Datelike, Duration, Local, NaiveDate};
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::PathBuf;

use crate::stats::{StatsDocument, UsageRecord, DEFAULT_MODEL};
use crate::storage_paths;

/// Default daily spending limit in USD.
pub const DEFAULT_DAILY_LIMIT: f64 = 5.0;

/// Default monthly spending limit in USD.
pub const DEFAULT_MONTHLY_LIMIT: f64 = 100.0;

/// Usage report over a window of calendar dates ending at the report date.
#[derive(Debug, Clone)]
pub struct UsageReport {
    /// Human-readable window, `<start> to <end>`
    pub period: String,
    /// Window length in days
    pub days: u32,
    pub total_cost: f64,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
    pub total_sessions: u64,
    /// One entry per date in the window, ascending; dates without data are
    /// zero-valued, not omitted
    pub daily_breakdown: Vec<DailyUsage>,
    /// `total_cost / days`, or 0 for an empty window
    pub average_daily_cost: f64,
}

/// One day's slice of a usage report.
#[derive(Debug, Clone)]
pub struct DailyUsage {
    pub date: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_cost: f64,
    pub sessions: u64,
}

/// A breached spending limit. Both checks run independently, so zero, one,
/// or both variants can be produced by a single check.
#[derive(Debug, Clone, PartialEq)]
pub enum SpendingAlert {
    DailyLimitExceeded { spent: f64, limit: f64 },
    MonthlyLimitExceeded { spent: f64, limit: f64 },
}

/// File-backed store for usage events and running statistics.
pub struct UsageTracker {
    usage_log: PathBuf,
    stats_file: PathBuf,
}

impl UsageTracker {
    /// Creates a tracker rooted at `config_dir`, or at `~/.kimi-claude` when
    /// none is given. Creates the directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or the
    /// config directory cannot be created.
    pub fn new(config_dir: Option<PathBuf>) -> Result<Self> {
        let config_dir = match config_dir {
            Some(dir) => dir,
            None => storage_paths::default_config_dir()?,
        };
        fs::create_dir_all(&config_dir).with_context(|| {
            format!("Failed to create config directory: {}", config_dir.display())
        })?;
        Ok(Self {
            usage_log: storage_paths::usage_log_path(&config_dir),
            stats_file: storage_paths::stats_path(&config_dir),
        })
    }

    /// Logs one usage event and returns its cost in USD.
    ///
    /// Appends a `<timestamp> USAGE <json>` line to the usage log, then
    /// accumulates the event into today's bucket and the all-time totals and
    /// persists the stats document.
    pub fn log_usage(
        &self,
        session_id: &str,
        input_tokens: u64,
        output_tokens: u64,
        operation: &str,
    ) -> Result<f64> {
        let record = UsageRecord::new(
            session_id,
            input_tokens,
            output_tokens,
            DEFAULT_MODEL,
            operation,
        );
        self.append_log_line(&record)?;

        let mut stats = self.load_stats()?;
        let today = Local::now().date_naive().to_string();
        stats.apply(&today, &record);
        self.save_stats(&stats)?;

        tracing::debug!(
            session_id,
            input_tokens,
            output_tokens,
            cost_usd = record.cost_usd,
            "logged usage event"
        );
        Ok(record.cost_usd)
    }

    fn append_log_line(&self, record: &UsageRecord) -> Result<()> {
        let json =
            serde_json::to_string(record).context("Failed to serialize usage record")?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.usage_log)
            .with_context(|| {
                format!("Failed to open usage log: {}", self.usage_log.display())
            })?;
        writeln!(file, "{} USAGE {}", record.timestamp, json).with_context(|| {
            format!("Failed to append to usage log: {}", self.usage_log.display())
        })?;
        Ok(())
    }

    /// Loads the stats document, or a zero-valued one if the file does not
    /// exist yet. A present-but-malformed file is an error, not a reset.
    pub fn load_stats(&self) -> Result<StatsDocument> {
        let content = match fs::read_to_string(&self.stats_file) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(
                    path = %self.stats_file.display(),
                    "stats file missing, starting from zero"
                );
                return Ok(StatsDocument::default());
            }
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read stats file: {}", self.stats_file.display())
                })
            }
        };
        serde_json::from_str(&content).with_context(|| {
            format!("Failed to parse stats file: {}", self.stats_file.display())
        })
    }

    /// Persists the stats document as pretty-printed JSON. Written to a temp
    /// file and renamed into place so the file is never half-written.
    pub fn save_stats(&self, stats: &StatsDocument) -> Result<()> {
        let content =
            serde_json::to_string_pretty(stats).context("Failed to serialize usage stats")?;
        let tmp_path = self.stats_file.with_extension("json.tmp");
        fs::write(&tmp_path, content).with_context(|| {
            format!("Failed to write stats file: {}", tmp_path.display())
        })?;
        fs::rename(&tmp_path, &self.stats_file).with_context(|| {
            format!("Failed to replace stats file: {}", self.stats_file.display())
        })?;
        Ok(())
    }

    /// Builds a usage report for the `days`-day window ending today.
    pub fn usage_report(&self, days: u32) -> Result<UsageReport> {
        self.report_for(days, Local::now().date_naive())
    }

    /// Builds a usage report for the `days`-day window ending at `end_date`
    /// inclusive. Every date in the window appears in the breakdown, in
    /// ascending order; dates with no recorded usage are zero-valued.
    pub fn report_for(&self, days: u32, end_date: NaiveDate) -> Result<UsageReport> {
        let stats = self.load_stats()?;
        let start_date = if days > 0 {
            end_date - Duration::days(i64::from(days) - 1)
        } else {
            end_date
        };

        let mut report = UsageReport {
            period: format!("{} to {}", start_date, end_date),
            days,
            total_cost: 0.0,
            total_input_tokens: 0,
            total_output_tokens: 0,
            total_sessions: 0,
            daily_breakdown: Vec::with_capacity(days as usize),
            average_daily_cost: 0.0,
        };

        for offset in 0..i64::from(days) {
            let date = (start_date + Duration::days(offset)).to_string();
            let day = stats.daily.get(&date).cloned().unwrap_or_default();

            report.total_cost += day.total_cost;
            report.total_input_tokens += day.input_tokens;
            report.total_output_tokens += day.output_tokens;
            report.total_sessions += day.sessions;
            report.daily_breakdown.push(DailyUsage {
                date,
                input_tokens: day.input_tokens,
                output_tokens: day.output_tokens,
                total_cost: day.total_cost,
                sessions: day.sessions,
            });
        }

        if days > 0 {
            report.average_daily_cost = report.total_cost / f64::from(days);
        }
        Ok(report)
    }

    /// Checks today's and this month's spend against the default limits.
    pub fn check_spending_alerts(&self) -> Result<Vec<SpendingAlert>> {
        self.alerts_for(
            DEFAULT_DAILY_LIMIT,
            DEFAULT_MONTHLY_LIMIT,
            Local::now().date_naive(),
        )
    }

    /// Checks spend for `today` against `daily_limit`, and the summed spend
    /// for dates from the first of `today`'s month through `today` against
    /// `monthly_limit`. Comparisons are strict.
    pub fn alerts_for(
        &self,
        daily_limit: f64,
        monthly_limit: f64,
        today: NaiveDate,
    ) -> Result<Vec<SpendingAlert>> {
        let stats = self.load_stats()?;
        let mut alerts = Vec::new();

        let daily_cost = stats
            .daily
            .get(&today.to_string())
            .map_or(0.0, |day| day.total_cost);
        if daily_cost > daily_limit {
            alerts.push(SpendingAlert::DailyLimitExceeded {
                spent: daily_cost,
                limit: daily_limit,
            });
        }

        let month_start = today.with_day(1).unwrap_or(today);
        let mut monthly_cost = 0.0;
        for (date_str, day) in &stats.daily {
            let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d").with_context(|| {
                format!("Invalid date key in stats file: {date_str}")
            })?;
            if date >= month_start && date <= today {
                monthly_cost += day.total_cost;
            }
        }
        if monthly_cost > monthly_limit {
            alerts.push(SpendingAlert::MonthlyLimitExceeded {
                spent: monthly_cost,
                limit: monthly_limit,
            });
        }

        Ok(alerts)
    }
}

#[cfg(test)]
#[path = "tracker_tests.rs"]
mod tests;
