//! Vertical smoothing at 120 KIAS by trailing-edge tab bends

use super::{vibration_header, StepDetail, TabOption};
use crate::config::Config;
use crate::measurement::{Blade, MeasurementRecord, Vibration};
use crate::vector::{angle_diff, opposite, round_to_step};
use serde::{Deserialize, Serialize};

/// Smallest tab bend worth making (deg)
pub const MIN_TAB_BEND_DEG: f64 = 0.2;

/// Tab bends are specified to a tenth of a degree
pub const TAB_BEND_STEP_DEG: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BendDirection {
    Up,
    Down,
}

impl BendDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            BendDirection::Up => "UP",
            BendDirection::Down => "DOWN",
        }
    }
}

/// One outboard tab instruction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TabBend {
    pub blade: Blade,
    pub direction: BendDirection,
    pub degrees: f64,
}

/// Bend angle for a vertical amplitude, never below [`MIN_TAB_BEND_DEG`]
pub fn bend_degrees(amplitude_ips: f64, ips_per_deg: f64) -> f64 {
    let raw = if ips_per_deg > 0.0 {
        amplitude_ips / ips_per_deg
    } else {
        tracing::warn!(
            "vertical_tab_ips_per_deg is {}, tab bend defaults to minimum",
            ips_per_deg
        );
        0.0
    };
    round_to_step(raw, TAB_BEND_STEP_DEG).max(MIN_TAB_BEND_DEG)
}

/// Blade whose azimuth is closest to `deg`; ties go to the earlier blade
pub fn nearest_blade(deg: f64, config: &Config) -> Blade {
    let mut best = Blade::ALL[0];
    let mut best_diff = angle_diff(deg, config.blade_azimuth(best));
    for blade in &Blade::ALL[1..] {
        let diff = angle_diff(deg, config.blade_azimuth(*blade));
        if diff < best_diff {
            best = *blade;
            best_diff = diff;
        }
    }
    best
}

/// Tab bend for the selected option
pub fn plan(peak: Vibration, config: &Config, option: TabOption) -> TabBend {
    let degrees = bend_degrees(peak.amplitude_ips, config.vertical_tab_ips_per_deg);
    match option {
        TabOption::BendUp => TabBend {
            blade: nearest_blade(peak.phase_deg, config),
            direction: BendDirection::Up,
            degrees,
        },
        TabOption::OppositeDown => TabBend {
            blade: nearest_blade(opposite(peak.phase_deg), config),
            direction: BendDirection::Down,
            degrees,
        },
    }
}

pub(crate) fn detail(m: &MeasurementRecord, config: &Config, option: TabOption) -> StepDetail {
    let title = "120 KIAS - Vertical Smoother";
    let vrt = m.vertical();
    let limit = config.kias120_vert_limit;
    let mut lines = vibration_header("VRT 1R", vrt.amplitude_ips, vrt.phase_deg, limit);

    if vrt.amplitude_ips < limit {
        lines.push("No correction required.".to_string());
        return StepDetail::new(title, lines);
    }

    let bend = plan(vrt, config, option);
    lines.push(format!("Option {} selected", option.number()));
    lines.push(format!(
        "Bend OUTBD TAB of {} {}",
        bend.blade,
        bend.direction.as_str()
    ));
    lines.push(format!("Amount: {:.1}°", bend.degrees));
    lines.push("Re-measure 120K to validate.".to_string());
    StepDetail::new(title, lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::embedded().unwrap()
    }

    #[test]
    fn test_nearest_blade() {
        let config = config();
        assert_eq!(nearest_blade(220.0, &config), Blade::Red);
        assert_eq!(nearest_blade(40.0, &config), Blade::Blu);
        assert_eq!(nearest_blade(350.0, &config), Blade::Blu);
        assert_eq!(nearest_blade(260.0, &config), Blade::Grn);
    }

    #[test]
    fn test_bend_degrees() {
        assert!((bend_degrees(0.30, 0.25) - 1.2).abs() < 1e-9);
        assert_eq!(bend_degrees(0.01, 0.25), MIN_TAB_BEND_DEG);
        assert_eq!(bend_degrees(0.30, 0.0), MIN_TAB_BEND_DEG);
    }

    #[test]
    fn test_options() {
        let config = config();
        let peak = Vibration::new(0.30, 220.0);

        let up = plan(peak, &config, TabOption::BendUp);
        assert_eq!(up.blade, Blade::Red);
        assert_eq!(up.direction, BendDirection::Up);

        let down = plan(peak, &config, TabOption::OppositeDown);
        assert_eq!(down.blade, Blade::Blu);
        assert_eq!(down.direction, BendDirection::Down);
        assert_eq!(up.degrees, down.degrees);
    }

    #[test]
    fn test_detail_lines() {
        let m = MeasurementRecord::vertical_only(0.30, 220.0);
        let out = detail(&m, &config(), TabOption::OppositeDown);

        assert_eq!(out.title, "120 KIAS - Vertical Smoother");
        assert_eq!(
            out.lines,
            vec![
                "Status: NEEDS",
                "VRT 1R: 0.300 ips @ 220.0°",
                "Limit : < 0.15 ips",
                "Option 2 selected",
                "Bend OUTBD TAB of BLU DOWN",
                "Amount: 1.2°",
                "Re-measure 120K to validate.",
            ]
        );
    }
}
