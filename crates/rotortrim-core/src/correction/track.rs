//! Mechanical track at 60% NR
//!
//! Pair differences are removed by lengthening the low blade's pitch link.
//! A separation error moves the whole ORG/GRN pair.

use super::StepDetail;
use crate::config::Config;
use crate::measurement::{Blade, MeasurementRecord};
use crate::stage::TrackCheck;
use crate::vector::round_half_even;
use serde::{Deserialize, Serialize};

/// One pitch-link instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PitchLinkAdjustment {
    /// Lengthen one blade's link to raise it to its partner
    Lengthen { blade: Blade, flats: u32 },

    /// Shorten both ORG/GRN links, widening the separation
    LowerPairDown { flats: u32 },

    /// Lengthen both ORG/GRN links, narrowing the separation
    LowerPairUp { flats: u32 },
}

impl PitchLinkAdjustment {
    pub fn describe(&self) -> String {
        match self {
            Self::Lengthen { blade, flats } => {
                format!("Lengthen {} pitch link: +{} flats", blade, flats)
            }
            Self::LowerPairDown { flats } => {
                format!("Move ORG/GRN pair DOWN: shorten both {} flats", flats)
            }
            Self::LowerPairUp { flats } => {
                format!("Move ORG/GRN pair UP: lengthen both {} flats", flats)
            }
        }
    }
}

/// Flats needed to move a blade by `delta_in`, never less than one
pub fn flats_for(delta_in: f64, flat_in: f64) -> u32 {
    let raw = if flat_in > 0.0 {
        round_half_even(delta_in.abs() / flat_in)
    } else {
        tracing::warn!("pitch_link_flat_in is {}, flat count defaults to minimum", flat_in);
        0.0
    };
    raw.max(1.0) as u32
}

/// Adjustments for every out-of-tolerance criterion, in pair/pair/separation order
pub fn adjustments(check: &TrackCheck, flat_in: f64) -> Vec<PitchLinkAdjustment> {
    let mut out = Vec::new();

    if !check.rb_ok() {
        let low = if check.red_in > check.blu_in {
            Blade::Blu
        } else {
            Blade::Red
        };
        out.push(PitchLinkAdjustment::Lengthen {
            blade: low,
            flats: flats_for(check.rb_diff_in, flat_in),
        });
    }

    if !check.og_ok() {
        let low = if check.org_in > check.grn_in {
            Blade::Grn
        } else {
            Blade::Org
        };
        out.push(PitchLinkAdjustment::Lengthen {
            blade: low,
            flats: flats_for(check.og_diff_in, flat_in),
        });
    }

    if !check.sep_ok() {
        let delta = check.target_sep_in - check.sep_in;
        let flats = flats_for(delta, flat_in);
        out.push(if delta > 0.0 {
            PitchLinkAdjustment::LowerPairDown { flats }
        } else {
            PitchLinkAdjustment::LowerPairUp { flats }
        });
    }

    out
}

pub(crate) fn detail(m: &MeasurementRecord, config: &Config) -> StepDetail {
    let check = TrackCheck::measure(m, config);
    let ok = check.passes();

    let mut lines = vec![
        format!("Status: {}", if ok { "DONE" } else { "NEEDS" }),
        format!(
            "Pair sep: {:.2} in (target {:.2})",
            check.sep_in, check.target_sep_in
        ),
        format!("RB diff : {:.2} in", check.rb_diff_in),
        format!("OG diff : {:.2} in", check.og_diff_in),
    ];

    if ok {
        lines.push("No correction required.".to_string());
        return StepDetail::new("60% NR - Track Mechanical", lines);
    }

    lines.extend(
        adjustments(&check, config.pitch_link_flat_in)
            .iter()
            .map(PitchLinkAdjustment::describe),
    );
    lines.push("Re-measure 60NR to validate.".to_string());
    StepDetail::new("60% NR - Track Mechanical", lines)
}
