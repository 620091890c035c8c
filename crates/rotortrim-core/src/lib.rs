//! Rotortrim Core - diagnostic engine for rotor track and balance
//!
//! Rotortrim turns per-regime blade track and 1/rev vibration measurements
//! into a gated pass/fail status for each stage of a four-blade rotor
//! smoothing procedure, and into the concrete correction the operator should
//! make next.
//!
//! # Architecture
//!
//! The engine is built leaf-first:
//!
//! 1. **Config** (`config`): validated, immutable parameter set, loaded once
//! 2. **Vector** (`vector`): angle arithmetic, clock positions and phasors
//! 3. **Stage** (`stage`): the five-stage gating chain
//! 4. **Correction** (`correction`): pitch links, hub/tip weights, tab bends
//! 5. **Orchestrator** (`orchestrator`): the single "what next" entry point
//!
//! # Quick Start
//!
//! ```
//! use rotortrim_core::{diagnose, Config, MeasurementRecord, NextStep, RunSet, StageId, TabOption};
//!
//! let config = Config::embedded().unwrap();
//!
//! // Nothing recorded yet: the operator starts with the 60% NR track run
//! let diagnosis = diagnose(&RunSet::new(), &config, TabOption::default());
//! assert_eq!(diagnosis.next_step, NextStep::Stage(StageId::Track60));
//!
//! // Measurements accumulate as regimes are flown
//! let runs = RunSet::new().with("100NR", MeasurementRecord::lateral_only(0.22, 70.0));
//! let diagnosis = diagnose(&runs, &config, TabOption::default());
//! assert!(diagnosis.summaries[1].status.as_str() == "LOCKED");
//! ```
//!
//! # Stages
//!
//! | Stage       | Channel        | Remedy                              |
//! |-------------|----------------|-------------------------------------|
//! | `track60`   | blade track    | pitch-link flats                    |
//! | `ground100` | lateral 1/rev  | hub weight                          |
//! | `hover`     | lateral 1/rev  | hub weight or tip weights           |
//! | `kias120`   | vertical 1/rev | outboard tab bend                   |
//! | `letdown`   | lateral 1/rev  | hub weight, with ground safety check |

#![deny(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations, clippy::all)]

pub mod config;
pub mod correction;
pub mod display;
pub mod error;
pub mod measurement;
pub mod orchestrator;
pub mod report;
pub mod stage;
pub mod vector;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigProvider, ConfigSource};
pub use correction::{detail, StepDetail, TabOption};
pub use error::{ConfigError, Result, RotorTrimError};
pub use measurement::{
    Blade, FlightLog, MeasurementRecord, RunSet, RunsDocument, TrackOffsets, Vibration,
};
pub use orchestrator::{diagnose, Diagnosis, NextStep};
pub use stage::{evaluate, StageId, StepStatus, StepSummary};
pub use vector::{ClockLabel, Phasor};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod integration_tests {
    use super::*;

    fn nominal_track() -> MeasurementRecord {
        let half = 0.875 * measurement::MM_PER_INCH;
        MeasurementRecord::track_only(TrackOffsets {
            red: half,
            blu: half,
            org: -half,
            grn: -half,
        })
    }

    #[test]
    fn test_end_to_end_workflow() {
        let provider = ConfigProvider::embedded();
        let config = provider.load().unwrap();

        // Fly the procedure, fixing each stage before moving on
        let mut runs = RunSet::new().with("60NR", nominal_track());
        let d = diagnose(&runs, &config, TabOption::BendUp);
        assert_eq!(d.next_step, NextStep::Stage(StageId::Ground100));
        assert_eq!(d.detail.lines[0], "No measurement for this step.");

        runs.insert("100NR", MeasurementRecord::lateral_only(0.22, 70.0));
        let d = diagnose(&runs, &config, TabOption::BendUp);
        assert_eq!(d.summaries[1].status, StepStatus::Needs);
        assert!(d.detail.lines.contains(&"Add HUB weight: ~200 g".to_string()));

        runs.insert("100NR", MeasurementRecord::lateral_only(0.05, 60.0));
        runs.insert("HOVER", MeasurementRecord::lateral_only(0.06, 75.0));
        runs.insert("120K", MeasurementRecord::vertical_only(0.04, 10.0));
        runs.insert("LETDOWN", MeasurementRecord::lateral_only(0.05, 300.0));
        let d = diagnose(&runs, &config, TabOption::BendUp);
        assert!(d.next_step.is_complete());
        assert_eq!(d.detail, StepDetail::complete());
    }

    #[test]
    fn test_version_constants() {
        assert_eq!(NAME, "rotortrim-core");
        assert!(!VERSION.is_empty());
    }
}
