//! Correction detail generator
//!
//! Turns one stage's measurement into a concrete remedy (pitch-link flats,
//! hub or tip weights, tab bends) and renders it as display-width lines.
//!
//! Corrections are only computed for reachable stages with a measurement.
//! A `LOCKED` or `MISSING` stage yields a fixed informational message and an
//! unknown stage id yields a distinct fallback; neither is an error.
//!
//! # Example
//!
//! ```
//! use rotortrim_core::config::Config;
//! use rotortrim_core::correction::{detail, TabOption};
//! use rotortrim_core::measurement::RunSet;
//!
//! let config = Config::embedded().unwrap();
//! let out = detail(&RunSet::new(), &config, "hover", TabOption::default());
//!
//! assert_eq!(out.title, "Hover (Decision)");
//! assert!(out.lines[0].starts_with("LOCKED"));
//! ```

pub mod balance;
pub mod track;
pub mod vertical;

use crate::config::Config;
use crate::display::{wrap_lines, DISPLAY_WIDTH};
use crate::error::RotorTrimError;
use crate::measurement::RunSet;
use crate::stage::{self, StageId, StepStatus};
use serde::{Deserialize, Serialize};

/// Hover phase shift vs ground (deg) above which the imbalance is treated
/// as aerodynamic rather than mass-driven.
pub const AERO_DECISION_THRESHOLD_DEG: f64 = 30.0;

/// Approximate effect of one tip weight relative to one hub weight.
pub const TIP_TO_HUB_EFFECT_RATIO: u32 = 11;

/// Title plus ordered, display-width explanation lines
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDetail {
    pub title: String,
    pub lines: Vec<String>,
}

impl StepDetail {
    /// Build a detail, wrapping every line to the display width
    pub fn new<I, S>(title: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            title: title.into(),
            lines: wrap_lines(lines, DISPLAY_WIDTH),
        }
    }

    /// Fixed message once every stage is DONE
    pub fn complete() -> Self {
        Self::new("DIAGS", ["All steps DONE.", "Rotor within training limits."])
    }

    /// Fallback for a stage id outside the workflow
    pub fn unknown_stage() -> Self {
        Self::new("DIAGS", ["Unknown step"])
    }
}

/// Operator's strategy for vertical smoothing at 120 KIAS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TabOption {
    /// Option 1: bend the tab of the blade nearest the peak UP
    #[default]
    BendUp,
    /// Option 2: bend the tab of the opposite blade DOWN
    OppositeDown,
}

impl TabOption {
    /// Menu number shown to the operator
    pub fn number(self) -> u8 {
        match self {
            TabOption::BendUp => 1,
            TabOption::OppositeDown => 2,
        }
    }
}

impl TryFrom<u8> for TabOption {
    type Error = RotorTrimError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(TabOption::BendUp),
            2 => Ok(TabOption::OppositeDown),
            other => Err(RotorTrimError::InvalidOption(other)),
        }
    }
}

/// Detail for a stage given by id string.
///
/// Unknown ids return [`StepDetail::unknown_stage`].
pub fn detail(run_set: &RunSet, config: &Config, step_id: &str, option: TabOption) -> StepDetail {
    match step_id.parse::<StageId>() {
        Ok(stage) => detail_for(run_set, config, stage, option),
        Err(_) => {
            tracing::debug!("Detail requested for unknown stage {}", step_id);
            StepDetail::unknown_stage()
        }
    }
}

/// Detail for a stage, honouring the gating chain
pub fn detail_for(
    run_set: &RunSet,
    config: &Config,
    stage: StageId,
    option: TabOption,
) -> StepDetail {
    let status = stage::status_of(run_set, config, stage);
    if matches!(status, StepStatus::Locked | StepStatus::Missing) {
        return unavailable(stage, status);
    }

    let Some(measurement) = stage::resolve(run_set, config, stage) else {
        return unavailable(stage, StepStatus::Missing);
    };

    match stage {
        StageId::Track60 => track::detail(measurement, config),
        StageId::Ground100 => balance::ground_detail(measurement, config),
        StageId::Hover => balance::hover_detail(
            measurement,
            stage::resolve(run_set, config, StageId::Ground100),
            config,
        ),
        StageId::Kias120 => vertical::detail(measurement, config, option),
        StageId::Letdown => balance::letdown_detail(
            measurement,
            stage::resolve(run_set, config, StageId::Ground100),
            config,
        ),
    }
}

/// Short title used when no correction can be computed
pub fn short_title(stage: StageId) -> &'static str {
    match stage {
        StageId::Track60 => "60% NR (Track)",
        StageId::Ground100 => "100% NR (Ground Bal)",
        StageId::Hover => "Hover (Decision)",
        StageId::Kias120 => "120 KIAS (Vert)",
        StageId::Letdown => "Letdown (Trim)",
    }
}

fn unavailable(stage: StageId, status: StepStatus) -> StepDetail {
    let lines = match status {
        StepStatus::Missing => [
            "No measurement for this step.",
            "Go to MEASURE and run the regime.",
        ],
        _ => [
            "LOCKED: complete previous steps",
            "and re-measure until they are DONE.",
        ],
    };
    StepDetail::new(short_title(stage), lines)
}

/// Opening lines shared by the vibration stages
pub(crate) fn vibration_header(
    channel: &str,
    amplitude_ips: f64,
    phase_deg: f64,
    limit: f64,
) -> Vec<String> {
    let ok = amplitude_ips < limit;
    vec![
        format!("Status: {}", if ok { "DONE" } else { "NEEDS" }),
        format!("{}: {:.3} ips @ {:.1}°", channel, amplitude_ips, phase_deg),
        format!("Limit : < {:.2} ips", limit),
    ]
}
