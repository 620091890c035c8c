//! "What should the operator do next"
//!
//! [`diagnose`] is the single entry point a workflow layer needs: it runs the
//! gating chain, picks the first stage that is not `DONE`, and attaches the
//! correction detail for it.
//!
//! # Example
//!
//! ```
//! use rotortrim_core::config::Config;
//! use rotortrim_core::correction::TabOption;
//! use rotortrim_core::measurement::{MeasurementRecord, RunSet, TrackOffsets};
//! use rotortrim_core::orchestrator::{diagnose, NextStep};
//! use rotortrim_core::stage::StageId;
//!
//! let config = Config::embedded().unwrap();
//! let half = 0.875 * 25.4;
//! let runs = RunSet::new()
//!     .with("60NR", MeasurementRecord::track_only(TrackOffsets {
//!         red: half, blu: half, org: -half, grn: -half,
//!     }))
//!     .with("100NR", MeasurementRecord::lateral_only(0.22, 70.0));
//!
//! let diagnosis = diagnose(&runs, &config, TabOption::default());
//! assert_eq!(diagnosis.next_step, NextStep::Stage(StageId::Ground100));
//! assert_eq!(diagnosis.detail.title, "100% NR - Ground Mass Balance");
//! ```

use crate::config::Config;
use crate::correction::{self, StepDetail, TabOption};
use crate::measurement::RunSet;
use crate::stage::{self, StageId, StepSummary};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage the operator should work on, or the completion sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NextStep {
    Stage(StageId),
    Complete(CompleteMarker),
}

/// Serializes as the literal `"complete"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompleteMarker {
    Complete,
}

impl NextStep {
    /// The all-DONE sentinel
    pub const COMPLETE: NextStep = NextStep::Complete(CompleteMarker::Complete);

    pub fn stage(self) -> Option<StageId> {
        match self {
            NextStep::Stage(stage) => Some(stage),
            NextStep::Complete(_) => None,
        }
    }

    pub fn is_complete(self) -> bool {
        self.stage().is_none()
    }
}

impl fmt::Display for NextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextStep::Stage(stage) => write!(f, "{}", stage),
            NextStep::Complete(_) => f.write_str("complete"),
        }
    }
}

/// Full answer for one run set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub summaries: [StepSummary; 5],
    pub next_step: NextStep,
    pub detail: StepDetail,
}

/// Evaluate every stage and describe the first one that is not DONE.
///
/// Stateless: calling twice with the same inputs yields the same output.
pub fn diagnose(run_set: &RunSet, config: &Config, option: TabOption) -> Diagnosis {
    let summaries = stage::evaluate(run_set, config);

    let next_step = summaries
        .iter()
        .find(|s| !s.status.is_done())
        .map_or(NextStep::COMPLETE, |s| NextStep::Stage(s.step_id));

    let detail = match next_step {
        NextStep::Stage(stage) => correction::detail_for(run_set, config, stage, option),
        NextStep::Complete(_) => StepDetail::complete(),
    };

    tracing::debug!(next_step = %next_step, "Diagnosis complete");
    Diagnosis {
        summaries,
        next_step,
        detail,
    }
}
