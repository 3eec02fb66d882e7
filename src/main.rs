//! Kimi K2 usage tracker and cost calculator.
//!
//! Records per-session token usage, derives costs from the Kimi K2 pricing
//! table, and keeps running daily/total statistics under `~/.kimi-claude`.

mod pricing;
mod stats;
mod storage_paths;
mod tracker;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pricing::calculate_cost;
use stats::DEFAULT_OPERATION;
use tracker::{SpendingAlert, UsageReport, UsageTracker};

#[derive(Parser)]
#[command(name = "kimi-usage")]
#[command(about = "Kimi K2 usage tracker and cost calculator")]
#[command(version)]
struct Cli {
    /// Generate a usage report for the last N days
    #[arg(short, long, default_value_t = 7, value_name = "DAYS")]
    report: u32,

    /// Calculate cost for input and output token counts (no persistence)
    #[arg(short, long, num_args = 2, value_names = ["INPUT", "OUTPUT"])]
    cost: Option<Vec<u64>>,

    /// Log a usage event; OPERATION defaults to "chat" when omitted
    #[arg(long, num_args = 3..=4, value_names = ["SESSION", "INPUT", "OUTPUT", "OPERATION"])]
    log: Option<Vec<String>>,

    /// Check spending against the default limits ($5/day, $100/month)
    #[arg(short, long)]
    alerts: bool,

    /// Storage directory (defaults to ~/.kimi-claude)
    #[arg(long, value_name = "PATH")]
    config_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kimi_usage=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let tracker = UsageTracker::new(cli.config_dir)?;

    // One primary action per invocation: cost > log > alerts > report
    if let Some(cost_args) = cli.cost {
        let (input, output) = match cost_args.as_slice() {
            [input, output] => (*input, *output),
            _ => bail!("--cost requires INPUT and OUTPUT token counts"),
        };
        println!(
            "Cost for {} input + {} output tokens: ${:.6}",
            group_thousands(input),
            group_thousands(output),
            calculate_cost(input, output)
        );
    } else if let Some(log_args) = cli.log {
        let (session_id, input, output, operation) = parse_log_args(&log_args)?;
        let cost = tracker.log_usage(session_id, input, output, operation)?;
        println!("Logged usage: ${:.6}", cost);
    } else if cli.alerts {
        print_alerts(&tracker.check_spending_alerts()?);
    } else {
        print_report(&tracker.usage_report(cli.report)?);
    }

    Ok(())
}

/// Splits the `--log` values into session id, token counts, and operation.
fn parse_log_args(args: &[String]) -> Result<(&str, u64, u64, &str)> {
    let (session_id, input, output, operation) = match args {
        [session, input, output] => (session, input, output, DEFAULT_OPERATION),
        [session, input, output, operation] => (session, input, output, operation.as_str()),
        _ => bail!("--log requires SESSION INPUT OUTPUT [OPERATION]"),
    };
    let input = input
        .parse()
        .with_context(|| format!("Invalid input token count: {input}"))?;
    let output = output
        .parse()
        .with_context(|| format!("Invalid output token count: {output}"))?;
    Ok((session_id.as_str(), input, output, operation))
}

fn print_report(report: &UsageReport) {
    println!();
    println!("🎯 Kimi K2 Usage Report ({})", report.period);
    println!("{}", "=".repeat(50));
    println!("Total Cost: ${:.4}", report.total_cost);
    println!("Total Sessions: {}", report.total_sessions);
    println!(
        "Input Tokens: {}",
        group_thousands(report.total_input_tokens)
    );
    println!(
        "Output Tokens: {}",
        group_thousands(report.total_output_tokens)
    );
    println!("Average Daily Cost: ${:.4}", report.average_daily_cost);

    println!();
    println!("Daily Breakdown:");
    println!("{}", "-".repeat(50));
    if report.total_sessions == 0 {
        println!("No usage recorded in the last {} days", report.days);
        return;
    }
    for day in &report.daily_breakdown {
        if day.sessions > 0 {
            println!(
                "{}: ${:.4} ({} sessions, {} tokens)",
                day.date,
                day.total_cost,
                day.sessions,
                group_thousands(day.input_tokens + day.output_tokens)
            );
        }
    }
}

fn print_alerts(alerts: &[SpendingAlert]) {
    if alerts.is_empty() {
        println!("Spending is within the configured limits.");
        return;
    }
    for alert in alerts {
        match alert {
            SpendingAlert::DailyLimitExceeded { spent, limit } => {
                println!("⚠️  Daily spending limit exceeded: ${spent:.4} > ${limit:.2}");
            }
            SpendingAlert::MonthlyLimitExceeded { spent, limit } => {
                println!("⚠️  Monthly spending limit exceeded: ${spent:.4} > ${limit:.2}");
            }
        }
    }
}

/// Formats a count with thousands separators (e.g. `1234567` -> `1,234,567`).
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let offset = digits.len() % 3;
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (i + 3 - offset) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_thousands() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1000), "1,000");
        assert_eq!(group_thousands(1234567), "1,234,567");
    }

    #[test]
    fn test_parse_log_args_with_operation() {
        let args = vec![
            "s1".to_string(),
            "1000".to_string(),
            "2000".to_string(),
            "completion".to_string(),
        ];
        let (session, input, output, operation) = parse_log_args(&args).unwrap();
        assert_eq!(session, "s1");
        assert_eq!(input, 1000);
        assert_eq!(output, 2000);
        assert_eq!(operation, "completion");
    }

    #[test]
    fn test_parse_log_args_defaults_operation() {
        let args = vec!["s1".to_string(), "10".to_string(), "20".to_string()];
        let (_, _, _, operation) = parse_log_args(&args).unwrap();
        assert_eq!(operation, "chat");
    }

    #[test]
    fn test_parse_log_args_rejects_non_numeric_tokens() {
        let args = vec!["s1".to_string(), "abc".to_string(), "20".to_string()];
        let err = parse_log_args(&args).unwrap_err();
        assert!(err.to_string().contains("Invalid input token count"));
    }

    #[test]
    fn test_cli_rejects_negative_token_counts() {
        let result = Cli::try_parse_from(["kimi-usage", "--cost", "-5", "100"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_defaults_to_seven_day_report() {
        let cli = Cli::try_parse_from(["kimi-usage"]).unwrap();
        assert_eq!(cli.report, 7);
        assert!(cli.cost.is_none());
        assert!(cli.log.is_none());
        assert!(!cli.alerts);
    }
}
