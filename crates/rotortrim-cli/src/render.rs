//! Terminal and JSON output

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use rotortrim_core::report::{HubWeightTable, LimitEntry, OverviewRow};
use rotortrim_core::{Blade, Config, ConfigSource, StepDetail, StepStatus, StepSummary};
use serde::Serialize;

/// JSON envelope; the timestamp is added here, never by the engine
#[derive(Serialize)]
struct Stamped<'a, T: Serialize> {
    generated_at: DateTime<Utc>,
    flight: Option<String>,
    data: &'a T,
}

pub fn json<T: Serialize>(flight: Option<String>, data: &T) -> anyhow::Result<()> {
    let stamped = Stamped {
        generated_at: Utc::now(),
        flight,
        data,
    };
    println!("{}", serde_json::to_string_pretty(&stamped)?);
    Ok(())
}

pub fn header(title: &str, flight: Option<&str>) {
    println!(
        "{}  FLT {}  {}",
        title.bold(),
        flight.unwrap_or("-"),
        Utc::now().format("%d-%b-%Y %H:%M")
    );
}

fn status(status: StepStatus) -> ColoredString {
    let text = format!("{:>7}", status.as_str());
    match status {
        StepStatus::Done => text.green(),
        StepStatus::Needs => text.red().bold(),
        StepStatus::Missing => text.yellow(),
        StepStatus::Locked => text.dimmed(),
    }
}

pub fn summaries(summaries: &[StepSummary]) {
    for (i, s) in summaries.iter().enumerate() {
        println!("{}. {:<28} {}", i + 1, s.label, status(s.status));
    }
}

pub fn detail(detail: &StepDetail) {
    println!();
    println!("{}", detail.title.bold());
    for line in &detail.lines {
        println!("  {}", line);
    }
}

pub fn limits(rows: &[LimitEntry]) {
    println!("{:<14} {:<12} {}", "ITEM", "LIMIT", "MEASURED");
    for row in rows {
        let measured = if row.measured == "(missing)" {
            row.measured.yellow()
        } else {
            row.measured.normal()
        };
        println!("{:<14} {:<12} {}", row.item, row.limit, measured);
    }
}

pub fn warnings(warnings: &[String]) {
    for warning in warnings {
        let line = if warning.ends_with("OUT OF LIMIT") {
            warning.red()
        } else if warning.ends_with("INCOMPLETE") {
            warning.yellow()
        } else {
            warning.green()
        };
        println!("  {}", line);
    }
}

pub fn hub_weights(table: &HubWeightTable) {
    let grams = |b: Blade| table.get(&b).copied().unwrap_or(0);
    println!("Hub Weight (Grams)   + add  - remove");
    println!("BLU {:+4}  ORG {:+4}", grams(Blade::Blu), grams(Blade::Org));
    println!("RED {:+4}  GRN {:+4}", grams(Blade::Red), grams(Blade::Grn));
}

pub fn overview(rows: &[OverviewRow]) {
    if rows.is_empty() {
        println!("{}", "No measurements available.".yellow());
        return;
    }
    println!("{:<10} {:>14} {:>14}", "REGIME", "LAT 1R", "VRT 1R");
    for row in rows {
        println!(
            "{:<10} {:>8.3}@{:>4.0}° {:>8.3}@{:>4.0}°",
            row.regime,
            row.lateral.amplitude_ips,
            row.lateral.phase_deg,
            row.vertical.amplitude_ips,
            row.vertical.phase_deg
        );
    }
}

pub fn config(source: &ConfigSource, config: &Config) -> anyhow::Result<()> {
    let value = serde_json::to_value(config)?;
    println!("{}  ({})", "CONFIGURATION".bold(), source);
    if let Some(fields) = value.as_object() {
        for (key, v) in fields {
            println!("  {:<38} {}", key, v);
        }
    }
    println!("{}", "Configuration is valid".green());
    Ok(())
}
