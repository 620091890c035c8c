//! Lateral 1/rev balancing: ground, hover and letdown
//!
//! All three stages oppose the measured lateral peak with weight placed 180°
//! away from it. Ground and letdown use hub weights. Hover chooses between
//! hub weights (peak in phase with ground) and tip weights (peak shifted,
//! i.e. aerodynamic).
//!
//! Letdown additionally predicts what a full correction does to the already
//! balanced ground run, and proposes a half-strength compromise when the
//! ground limit would be exceeded.

use super::{vibration_header, StepDetail, AERO_DECISION_THRESHOLD_DEG, TIP_TO_HUB_EFFECT_RATIO};
use crate::config::Config;
use crate::measurement::{Blade, MeasurementRecord, Vibration};
use crate::vector::{
    angle_diff, opposite, round_half_even, round_to_step, to_clock_label, ClockLabel,
};
use serde::{Deserialize, Serialize};

/// Hub weights are installed in 10 g steps
pub const HUB_WEIGHT_STEP_G: f64 = 10.0;

/// Strength of the letdown compromise correction
pub const COMPROMISE_STRENGTH: f64 = 0.5;

/// Hub grams to cancel `amplitude_ips`, rounded to the weight step.
///
/// A non-positive sensitivity yields 0 g.
pub fn hub_grams(amplitude_ips: f64, ips_per_100g: f64) -> f64 {
    if ips_per_100g <= 0.0 {
        tracing::warn!(
            "hub_weight_sensitivity_ips_per_100g is {}, hub weight defaults to 0 g",
            ips_per_100g
        );
        return 0.0;
    }
    round_to_step(amplitude_ips / ips_per_100g * 100.0, HUB_WEIGHT_STEP_G)
}

/// Blade pair to split a hub weight between, by clock sector
pub fn split_pair(clock: ClockLabel) -> (Blade, Blade) {
    match clock.hour {
        11 | 12 | 1 => (Blade::Grn, Blade::Org),
        2..=4 => (Blade::Red, Blade::Blu),
        5..=7 => (Blade::Blu, Blade::Org),
        _ => (Blade::Grn, Blade::Red),
    }
}

/// Hub weight remedy for one lateral peak
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HubCorrection {
    pub grams: f64,
    pub angle_deg: f64,
    pub clock: ClockLabel,
}

impl HubCorrection {
    pub fn oppose(peak: Vibration, ips_per_100g: f64) -> Self {
        let angle_deg = opposite(peak.phase_deg);
        Self {
            grams: hub_grams(peak.amplitude_ips, ips_per_100g),
            angle_deg,
            clock: to_clock_label(angle_deg),
        }
    }

    pub fn split(&self) -> (Blade, Blade) {
        split_pair(self.clock)
    }

    fn split_hint(&self) -> String {
        let (a, b) = self.split();
        format!("Split nearest: {}/{}", a, b)
    }
}

/// Tip (product) weight remedy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TipCorrection {
    pub units: u32,
    pub angle_deg: f64,
    pub clock: ClockLabel,
}

impl TipCorrection {
    pub fn oppose(peak: Vibration, weights_per_ips: f64) -> Self {
        let angle_deg = opposite(peak.phase_deg);
        let units = round_half_even(peak.amplitude_ips * weights_per_ips).max(1.0) as u32;
        Self {
            units,
            angle_deg,
            clock: to_clock_label(angle_deg),
        }
    }
}

/// Outcome of the hover mass-vs-aero comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum HoverDecision {
    /// Hover peak in phase with ground: more hub weight
    Mass(HubCorrection),
    /// Hover peak shifted from ground: tip weights
    Aero(TipCorrection),
}

/// Decide the hover remedy.
///
/// Returns the phase shift against ground (`None` without a ground
/// reference, which counts as maximal shift) and the decision.
pub fn decide_hover(
    hover: Vibration,
    ground: Option<Vibration>,
    config: &Config,
) -> (Option<f64>, HoverDecision) {
    let shift = ground.map(|g| angle_diff(hover.phase_deg, g.phase_deg));

    let decision = match shift {
        Some(d) if d <= AERO_DECISION_THRESHOLD_DEG => HoverDecision::Mass(HubCorrection::oppose(
            hover,
            config.hub_weight_sensitivity_ips_per_100g,
        )),
        _ => HoverDecision::Aero(TipCorrection::oppose(hover, config.product_weights_per_ips)),
    };
    (shift, decision)
}

/// Half-strength letdown correction and its predicted effects
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Compromise {
    pub grams: f64,
    pub predicted_ground_ips: f64,
    pub predicted_letdown_ips: f64,
}

/// Ground-run side effect of the letdown correction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GroundSafetyCheck {
    pub predicted_ground_ips: f64,
    pub ground_limit_ips: f64,
    pub compromise: Option<Compromise>,
}

/// Letdown remedy with the optional ground safety check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LetdownPlan {
    pub full: HubCorrection,
    pub safety: Option<GroundSafetyCheck>,
}

/// Amplitude after applying `strength` of a correction phasor to an
/// existing vibration
pub fn predict_amplitude(existing: Vibration, correction: Vibration, strength: f64) -> f64 {
    (existing.phasor() + correction.phasor().scale(strength)).magnitude()
}

/// Plan the letdown trim and check it against the ground limit.
///
/// The correction is modelled as a phasor of the letdown amplitude placed at
/// the correction angle.
pub fn plan_letdown(letdown: Vibration, ground: Option<Vibration>, config: &Config) -> LetdownPlan {
    let full = HubCorrection::oppose(letdown, config.hub_weight_sensitivity_ips_per_100g);
    let correction = Vibration::new(letdown.amplitude_ips, full.angle_deg);

    let safety = ground.map(|g| {
        let predicted_ground_ips = predict_amplitude(g, correction, 1.0);
        let compromise = (predicted_ground_ips > config.ground_ips_limit).then(|| Compromise {
            grams: round_to_step(full.grams * COMPROMISE_STRENGTH, HUB_WEIGHT_STEP_G),
            predicted_ground_ips: predict_amplitude(g, correction, COMPROMISE_STRENGTH),
            predicted_letdown_ips: predict_amplitude(letdown, correction, COMPROMISE_STRENGTH),
        });
        tracing::debug!(
            predicted_ground_ips,
            compromise = compromise.is_some(),
            "Letdown ground safety check"
        );
        GroundSafetyCheck {
            predicted_ground_ips,
            ground_limit_ips: config.ground_ips_limit,
            compromise,
        }
    });

    LetdownPlan { full, safety }
}

pub(crate) fn ground_detail(m: &MeasurementRecord, config: &Config) -> StepDetail {
    let title = "100% NR - Ground Mass Balance";
    let lat = m.lateral();
    let limit = config.ground_ips_limit;
    let mut lines = vibration_header("LAT 1R", lat.amplitude_ips, lat.phase_deg, limit);

    if lat.amplitude_ips < limit {
        lines.push("No correction required.".to_string());
        return StepDetail::new(title, lines);
    }

    let hub = HubCorrection::oppose(lat, config.hub_weight_sensitivity_ips_per_100g);
    lines.push(format!("Add HUB weight: ~{} g", hub.grams as i64));
    lines.push(format!("Place @ {} (180° from peak)", hub.clock));
    lines.push(hub.split_hint());
    lines.push("Re-measure 100NR to validate.".to_string());
    StepDetail::new(title, lines)
}

pub(crate) fn hover_detail(
    m: &MeasurementRecord,
    ground: Option<&MeasurementRecord>,
    config: &Config,
) -> StepDetail {
    let title = "Hover - Product Balance vs Roll";
    let lat = m.lateral();
    let limit = config.hover_ips_limit;
    let mut lines = vibration_header("LAT 1R", lat.amplitude_ips, lat.phase_deg, limit);

    if lat.amplitude_ips < limit {
        lines.push("No correction required.".to_string());
        return StepDetail::new(title, lines);
    }

    let (shift, decision) = decide_hover(lat, ground.map(MeasurementRecord::lateral), config);
    match shift {
        Some(d) => lines.push(format!("Angle vs Ground: Δ={:.0}°", d)),
        None => lines.push("No Ground reference available".to_string()),
    }

    match decision {
        HoverDecision::Mass(hub) => {
            lines.push("Decision: MASS (Hub) - keep ground bal".to_string());
            lines.push(format!("Add HUB weight: ~{} g", hub.grams as i64));
            lines.push(format!("Place @ {}", hub.clock));
            lines.push(hub.split_hint());
        }
        HoverDecision::Aero(tip) => {
            lines.push("Decision: AERO (Blade) - product bal".to_string());
            lines.push(format!("Add TIP weights: ~{} units", tip.units));
            lines.push(format!("Place @ {}", tip.clock));
            lines.push(format!(
                "NOTE: tip weights are ~{}x hub effect",
                TIP_TO_HUB_EFFECT_RATIO
            ));
            lines.push("      and will affect ground balance".to_string());
        }
    }

    lines.push("Re-measure HOVER to validate.".to_string());
    StepDetail::new(title, lines)
}

pub(crate) fn letdown_detail(
    m: &MeasurementRecord,
    ground: Option<&MeasurementRecord>,
    config: &Config,
) -> StepDetail {
    let title = "Letdown - Final Trim";
    let lat = m.lateral();
    let limit = config.letdown_ips_limit;
    let mut lines = vibration_header("LAT 1R", lat.amplitude_ips, lat.phase_deg, limit);

    if lat.amplitude_ips < limit {
        lines.push("No correction required.".to_string());
        return StepDetail::new(title, lines);
    }

    let plan = plan_letdown(lat, ground.map(MeasurementRecord::lateral), config);
    lines.push(format!("Suggested HUB weight: ~{} g", plan.full.grams as i64));
    lines.push(format!("Place @ {}", plan.full.clock));
    lines.push(plan.full.split_hint());

    if let Some(safety) = plan.safety {
        lines.push(format!(
            "Check 100NR: predicted {:.3} ips",
            safety.predicted_ground_ips
        ));
        lines.push(format!("Ground limit: {:.2} ips", safety.ground_limit_ips));

        if let Some(half) = safety.compromise {
            lines.push("Safety compromise triggered".to_string());
            lines.push(format!("Use 50%: ~{} g", half.grams as i64));
            lines.push(format!("Pred 100NR: {:.3} ips", half.predicted_ground_ips));
            lines.push(format!("Pred LET:  {:.3} ips", half.predicted_letdown_ips));
        }
    }

    lines.push("Re-measure LETDOWN to validate.".to_string());
    StepDetail::new(title, lines)
}
