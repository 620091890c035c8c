//! Diagnostic reports over a run set
//!
//! Read-only views a diagnostics screen shows next to the guided workflow:
//! every checked quantity against its limit, the warning list, the per-blade
//! hub weight split and an overview of all recorded regimes.

use crate::config::Config;
use crate::correction::balance::hub_grams;
use crate::measurement::{Blade, MeasurementRecord, RunSet, Vibration};
use crate::stage::{self, StageId, StepStatus, TrackCheck};
use crate::vector::{angle_diff, opposite, round_half_even};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the limits table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitEntry {
    pub item: String,
    pub limit: String,
    pub measured: String,
}

impl LimitEntry {
    fn new(item: &str, limit: String, measured: String) -> Self {
        Self {
            item: item.to_string(),
            limit,
            measured,
        }
    }
}

const MISSING: &str = "(missing)";

/// Every checked quantity with its limit and measured value
pub fn limits_table(run_set: &RunSet, config: &Config) -> Vec<LimitEntry> {
    let mut out = Vec::with_capacity(7);

    match stage::resolve(run_set, config, StageId::Track60) {
        Some(m) => {
            let check = TrackCheck::measure(m, config);
            let pair_limit = format!("<= {:.2}in", config.track_pair_tol_in);
            out.push(LimitEntry::new(
                "60NR RB diff",
                pair_limit.clone(),
                format!("{:.2}in", check.rb_diff_in.abs()),
            ));
            out.push(LimitEntry::new(
                "60NR OG diff",
                pair_limit,
                format!("{:.2}in", check.og_diff_in.abs()),
            ));
            out.push(LimitEntry::new(
                "60NR Pair sep",
                format!("{:.2}±{:.2}", config.pair_separation_in, config.sep_tol_in),
                format!("{:.2}in", check.sep_in),
            ));
        }
        None => out.push(LimitEntry::new(
            "60NR Track",
            "--".to_string(),
            MISSING.to_string(),
        )),
    }

    let vibration_rows: [(&str, StageId, fn(&MeasurementRecord) -> Vibration); 4] = [
        ("100NR LAT1R", StageId::Ground100, MeasurementRecord::lateral),
        ("HOVER LAT1R", StageId::Hover, MeasurementRecord::lateral),
        ("120K VRT1R", StageId::Kias120, MeasurementRecord::vertical),
        ("LDN  LAT1R", StageId::Letdown, MeasurementRecord::lateral),
    ];

    for (item, stage_id, channel) in vibration_rows {
        let limit = config.limit_for(stage_id).unwrap_or_default();
        let measured = stage::resolve(run_set, config, stage_id)
            .map(channel)
            .map_or_else(
                || MISSING.to_string(),
                |v| format!("{:.3}@{:>3.0}°", v.amplitude_ips, v.phase_deg),
            );
        out.push(LimitEntry::new(item, format!("< {:.2}", limit), measured));
    }

    out
}

/// Warning list: out-of-limit and incomplete stages
pub fn warnings(run_set: &RunSet, config: &Config) -> Vec<String> {
    if run_set.is_empty() {
        return vec!["No measurements available.".to_string()];
    }

    let warn: Vec<String> = stage::evaluate(run_set, config)
        .iter()
        .filter_map(|s| match s.status {
            StepStatus::Needs => Some(format!("{}: OUT OF LIMIT", s.label)),
            StepStatus::Missing | StepStatus::Locked => Some(format!("{}: INCOMPLETE", s.label)),
            StepStatus::Done => None,
        })
        .collect();

    if warn.is_empty() {
        vec!["All measurements within limits".to_string()]
    } else {
        warn
    }
}

/// Hub weight per blade in grams, positive means add
pub type HubWeightTable = BTreeMap<Blade, i64>;

/// Split the hub weight between the two blades nearest the correction angle.
///
/// Uses the ground run, or hover when no ground run is recorded. Without
/// either every blade gets 0 g.
pub fn hub_weight_table(run_set: &RunSet, config: &Config) -> HubWeightTable {
    let mut table: HubWeightTable = Blade::ALL.into_iter().map(|b| (b, 0)).collect();

    let source = stage::resolve(run_set, config, StageId::Ground100)
        .or_else(|| stage::resolve(run_set, config, StageId::Hover));
    let Some(m) = source else {
        return table;
    };

    let lat = m.lateral();
    let grams = hub_grams(lat.amplitude_ips, config.hub_weight_sensitivity_ips_per_100g);
    let correction = opposite(lat.phase_deg);

    let mut ranked: Vec<(f64, Blade)> = Blade::ALL
        .into_iter()
        .map(|b| (angle_diff(correction, config.blade_azimuth(b)), b))
        .collect();
    ranked.sort_by(|a, b| a.0.total_cmp(&b.0));

    let split = round_half_even(grams / 2.0) as i64;
    for (_, blade) in ranked.into_iter().take(2) {
        table.insert(blade, split);
    }
    table
}

/// One recorded regime in the flight overview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverviewRow {
    pub regime: String,
    pub lateral: Vibration,
    pub vertical: Vibration,
}

/// Lateral and vertical 1/rev of every recorded regime, sorted by name
pub fn flight_overview(run_set: &RunSet) -> Vec<OverviewRow> {
    run_set
        .iter()
        .map(|(name, m)| OverviewRow {
            regime: name.to_string(),
            lateral: m.lateral(),
            vertical: m.vertical(),
        })
        .collect()
}
