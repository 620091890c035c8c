//! Sequential stage gating
//!
//! The workflow runs five stages in a fixed order. A stage is only evaluated
//! once every earlier stage is `DONE`; until then it is `LOCKED`. An unlocked
//! stage with no matching measurement is `MISSING`, otherwise its limit test
//! decides between `DONE` and `NEEDS`.
//!
//! ```text
//! track60 --> ground100 --> hover --> kias120 --> letdown
//! ```
//!
//! Gating is a single fold over [`STAGES`]; each entry only knows how to
//! test its own measurement.

use crate::config::Config;
use crate::error::RotorTrimError;
use crate::measurement::{Blade, MeasurementRecord, RunSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical stage id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageId {
    /// Ground run at 60% NR, mechanical track
    Track60,
    /// Ground run at 100% NR, hub mass balance
    Ground100,
    /// Hover, mass vs aerodynamic decision
    Hover,
    /// 120 KIAS cruise, vertical smoothing
    Kias120,
    /// Letdown, final lateral trim
    Letdown,
}

impl StageId {
    /// All stages in workflow order
    pub const ALL: [StageId; 5] = [
        StageId::Track60,
        StageId::Ground100,
        StageId::Hover,
        StageId::Kias120,
        StageId::Letdown,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StageId::Track60 => "track60",
            StageId::Ground100 => "ground100",
            StageId::Hover => "hover",
            StageId::Kias120 => "kias120",
            StageId::Letdown => "letdown",
        }
    }

    /// Summary label shown in the step list
    pub fn label(self) -> &'static str {
        match self {
            StageId::Track60 => "GND 60% NR  Track Mech",
            StageId::Ground100 => "GND 100% NR  Mass Bal",
            StageId::Hover => "HOVER  Lateral Decision",
            StageId::Kias120 => "120 KIAS  Vertical Smooth",
            StageId::Letdown => "LETDOWN  Final Trim",
        }
    }

    /// Position in the workflow, 0-based
    pub fn index(self) -> usize {
        match self {
            StageId::Track60 => 0,
            StageId::Ground100 => 1,
            StageId::Hover => 2,
            StageId::Kias120 => 3,
            StageId::Letdown => 4,
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageId {
    type Err = RotorTrimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StageId::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| RotorTrimError::UnknownStage(s.to_string()))
    }
}

/// Gate outcome for one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StepStatus {
    /// An earlier stage is not DONE yet
    Locked,
    /// Reachable, but no measurement resolves
    Missing,
    /// Measured and out of limits
    Needs,
    /// Measured and within limits
    Done,
}

impl StepStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            StepStatus::Locked => "LOCKED",
            StepStatus::Missing => "MISSING",
            StepStatus::Needs => "NEEDS",
            StepStatus::Done => "DONE",
        }
    }

    pub fn is_done(self) -> bool {
        self == StepStatus::Done
    }
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the step list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub step_id: StageId,
    pub label: String,
    pub status: StepStatus,
}

/// How a stage decides pass/fail from its own measurement
#[derive(Clone, Copy)]
pub struct StageDefinition {
    pub id: StageId,
    pub passes: fn(&MeasurementRecord, &Config) -> bool,
}

impl fmt::Debug for StageDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageDefinition").field("id", &self.id).finish()
    }
}

/// Stage table in workflow order
pub const STAGES: [StageDefinition; 5] = [
    StageDefinition {
        id: StageId::Track60,
        passes: track_passes,
    },
    StageDefinition {
        id: StageId::Ground100,
        passes: ground_passes,
    },
    StageDefinition {
        id: StageId::Hover,
        passes: hover_passes,
    },
    StageDefinition {
        id: StageId::Kias120,
        passes: kias120_passes,
    },
    StageDefinition {
        id: StageId::Letdown,
        passes: letdown_passes,
    },
];

fn track_passes(m: &MeasurementRecord, config: &Config) -> bool {
    TrackCheck::measure(m, config).passes()
}

fn ground_passes(m: &MeasurementRecord, config: &Config) -> bool {
    m.lateral().amplitude_ips < config.ground_ips_limit
}

fn hover_passes(m: &MeasurementRecord, config: &Config) -> bool {
    m.lateral().amplitude_ips < config.hover_ips_limit
}

fn kias120_passes(m: &MeasurementRecord, config: &Config) -> bool {
    m.vertical().amplitude_ips < config.kias120_vert_limit
}

fn letdown_passes(m: &MeasurementRecord, config: &Config) -> bool {
    m.lateral().amplitude_ips < config.letdown_ips_limit
}

/// Resolve a stage's measurement through the alias table
pub fn resolve<'a>(
    run_set: &'a RunSet,
    config: &Config,
    stage: StageId,
) -> Option<&'a MeasurementRecord> {
    let found = run_set.resolve(config.aliases(stage));
    tracing::debug!(stage = %stage, found = found.is_some(), "Resolved stage measurement");
    found
}

/// Evaluate all five stages.
///
/// Pure and deterministic: the result depends only on `run_set` and `config`.
///
/// # Example
///
/// ```
/// use rotortrim_core::config::Config;
/// use rotortrim_core::measurement::RunSet;
/// use rotortrim_core::stage::{evaluate, StepStatus};
///
/// let config = Config::embedded().unwrap();
/// let summaries = evaluate(&RunSet::new(), &config);
///
/// assert_eq!(summaries[0].status, StepStatus::Missing);
/// assert!(summaries[1..].iter().all(|s| s.status == StepStatus::Locked));
/// ```
pub fn evaluate(run_set: &RunSet, config: &Config) -> [StepSummary; 5] {
    let mut reachable = true;

    STAGES.map(|stage| {
        let status = if !reachable {
            StepStatus::Locked
        } else {
            match resolve(run_set, config, stage.id) {
                None => StepStatus::Missing,
                Some(m) if (stage.passes)(m, config) => StepStatus::Done,
                Some(_) => StepStatus::Needs,
            }
        };
        reachable &= status.is_done();

        tracing::debug!(stage = %stage.id, status = %status, "Stage evaluated");
        StepSummary {
            step_id: stage.id,
            label: stage.id.label().to_string(),
            status,
        }
    })
}

/// Status of a single stage under the full gating chain
pub fn status_of(run_set: &RunSet, config: &Config, stage: StageId) -> StepStatus {
    evaluate(run_set, config)[stage.index()].status
}

/// Track geometry at 60% NR, all values in inches
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackCheck {
    pub red_in: f64,
    pub blu_in: f64,
    pub org_in: f64,
    pub grn_in: f64,

    /// RED - BLU
    pub rb_diff_in: f64,

    /// ORG - GRN
    pub og_diff_in: f64,

    /// Mean of RED/BLU minus mean of ORG/GRN
    pub sep_in: f64,

    pub pair_tol_in: f64,
    pub sep_tol_in: f64,
    pub target_sep_in: f64,
}

impl TrackCheck {
    pub fn measure(m: &MeasurementRecord, config: &Config) -> Self {
        let track = m.track();
        let red = track.inches(Blade::Red);
        let blu = track.inches(Blade::Blu);
        let org = track.inches(Blade::Org);
        let grn = track.inches(Blade::Grn);

        Self {
            red_in: red,
            blu_in: blu,
            org_in: org,
            grn_in: grn,
            rb_diff_in: red - blu,
            og_diff_in: org - grn,
            sep_in: (red + blu) / 2.0 - (org + grn) / 2.0,
            pair_tol_in: config.track_pair_tol_in,
            sep_tol_in: config.sep_tol_in,
            target_sep_in: config.pair_separation_in,
        }
    }

    pub fn rb_ok(&self) -> bool {
        self.rb_diff_in.abs() <= self.pair_tol_in
    }

    pub fn og_ok(&self) -> bool {
        self.og_diff_in.abs() <= self.pair_tol_in
    }

    pub fn sep_ok(&self) -> bool {
        (self.sep_in - self.target_sep_in).abs() <= self.sep_tol_in
    }

    /// All three tolerances hold
    pub fn passes(&self) -> bool {
        self.rb_ok() && self.og_ok() && self.sep_ok()
    }
}
