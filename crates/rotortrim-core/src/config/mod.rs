//! Parameter set for the diagnostic workflow
//!
//! Tolerances, limits, sensitivities, blade geometry and the alias table that
//! maps each canonical stage to the measurement names it accepts. A
//! [`Config`] is built once through a [`ConfigProvider`] and then shared
//! read-only (`Arc<Config>`) with every evaluation call.
//!
//! # Example
//!
//! ```
//! use rotortrim_core::config::ConfigProvider;
//! use rotortrim_core::stage::StageId;
//!
//! let provider = ConfigProvider::embedded();
//! let config = provider.load().unwrap();
//!
//! assert_eq!(config.limit_for(StageId::Ground100), Some(0.15));
//! assert_eq!(config.aliases(StageId::Track60)[0], "60NR");
//! ```

pub mod provider;

pub use provider::{ConfigFormat, ConfigProvider, ConfigSource};

use crate::error::ConfigError;
use crate::measurement::Blade;
use crate::stage::StageId;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Shipped parameter set, compiled into the binary.
pub const EMBEDDED_TOML: &str = include_str!("../../config/bht412_mm.toml");

/// Immutable parameter set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Config {
    /// Maximum |RED - BLU| and |ORG - GRN| track difference (in)
    pub track_pair_tol_in: f64,

    /// Allowed deviation of the pair separation from target (in)
    pub sep_tol_in: f64,

    /// Target separation between the RED/BLU and ORG/GRN pairs (in)
    pub pair_separation_in: f64,

    /// Track change produced by one pitch-link flat (in)
    pub pitch_link_flat_in: f64,

    /// Lateral 1/rev limit at 100% NR on ground (ips)
    pub ground_ips_limit: f64,

    /// Lateral 1/rev limit in hover (ips)
    pub hover_ips_limit: f64,

    /// Vertical 1/rev limit at 120 KIAS (ips)
    pub kias120_vert_limit: f64,

    /// Lateral 1/rev limit in letdown (ips)
    pub letdown_ips_limit: f64,

    /// Lateral response to 100 g of hub weight (ips)
    pub hub_weight_sensitivity_ips_per_100g: f64,

    /// Tip-weight units needed per ips of lateral vibration
    pub product_weights_per_ips: f64,

    /// Vertical response to one degree of tab bend (ips)
    pub vertical_tab_ips_per_deg: f64,

    /// Blade azimuth on the rotor disk (deg)
    pub blade_azimuth_deg: BTreeMap<Blade, f64>,

    /// Accepted measurement names per stage, in priority order
    pub state_map: BTreeMap<StageId, Vec<String>>,
}

impl Config {
    /// Parse and validate the shipped parameter set
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_toml_str(EMBEDDED_TOML)
    }

    /// Parse and validate a TOML document
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let table: toml::Value = toml::from_str(text).map_err(|e| ConfigError::Parse {
            format: "TOML".to_string(),
            message: e.to_string(),
        })?;
        let value = serde_json::to_value(table).map_err(|e| ConfigError::Parse {
            format: "TOML".to_string(),
            message: e.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// Parse and validate a JSON document
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(text).map_err(|e| ConfigError::Parse {
            format: "JSON".to_string(),
            message: e.to_string(),
        })?;
        Self::from_value(&value)
    }

    /// Validate an already-parsed document key by key
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let root = value.as_object().ok_or_else(|| ConfigError::WrongType {
            key: "<root>".to_string(),
            expected: "table".to_string(),
        })?;

        Ok(Self {
            track_pair_tol_in: number(root, "track_pair_tol_in")?,
            sep_tol_in: number(root, "sep_tol_in")?,
            pair_separation_in: number(root, "pair_separation_in")?,
            pitch_link_flat_in: number(root, "pitch_link_flat_in")?,
            ground_ips_limit: number(root, "ground_ips_limit")?,
            hover_ips_limit: number(root, "hover_ips_limit")?,
            kias120_vert_limit: number(root, "kias120_vert_limit")?,
            letdown_ips_limit: number(root, "letdown_ips_limit")?,
            hub_weight_sensitivity_ips_per_100g: number(
                root,
                "hub_weight_sensitivity_ips_per_100g",
            )?,
            product_weights_per_ips: number(root, "product_weights_per_ips")?,
            vertical_tab_ips_per_deg: number(root, "vertical_tab_ips_per_deg")?,
            blade_azimuth_deg: blade_azimuths(root)?,
            state_map: state_map(root)?,
        })
    }

    /// Measurement names accepted for a stage, highest priority first
    pub fn aliases(&self, stage: StageId) -> &[String] {
        self.state_map
            .get(&stage)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Amplitude limit for vibration stages; `None` for the track stage
    pub fn limit_for(&self, stage: StageId) -> Option<f64> {
        match stage {
            StageId::Track60 => None,
            StageId::Ground100 => Some(self.ground_ips_limit),
            StageId::Hover => Some(self.hover_ips_limit),
            StageId::Kias120 => Some(self.kias120_vert_limit),
            StageId::Letdown => Some(self.letdown_ips_limit),
        }
    }

    /// Azimuth of a blade in degrees
    pub fn blade_azimuth(&self, blade: Blade) -> f64 {
        self.blade_azimuth_deg.get(&blade).copied().unwrap_or(0.0)
    }
}

fn number(root: &Map<String, Value>, key: &str) -> Result<f64, ConfigError> {
    let value = root
        .get(key)
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?;
    match value.as_f64() {
        Some(n) if n.is_finite() => Ok(n),
        _ => Err(ConfigError::NotNumeric {
            key: key.to_string(),
            found: value.to_string(),
        }),
    }
}

fn table<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    root.get(key)
        .ok_or_else(|| ConfigError::MissingKey(key.to_string()))?
        .as_object()
        .ok_or_else(|| ConfigError::WrongType {
            key: key.to_string(),
            expected: "table".to_string(),
        })
}

fn blade_azimuths(root: &Map<String, Value>) -> Result<BTreeMap<Blade, f64>, ConfigError> {
    let entries = table(root, "blade_azimuth_deg")?;

    if let Some(unknown) = entries.keys().find(|k| k.parse::<Blade>().is_err()) {
        return Err(ConfigError::WrongType {
            key: format!("blade_azimuth_deg.{}", unknown),
            expected: "one of BLU, ORG, RED, GRN".to_string(),
        });
    }

    Blade::ALL
        .iter()
        .map(|&blade| {
            let az = number(entries, blade.as_str())
                .map_err(|e| nest("blade_azimuth_deg", e))?;
            Ok((blade, az))
        })
        .collect()
}

fn state_map(root: &Map<String, Value>) -> Result<BTreeMap<StageId, Vec<String>>, ConfigError> {
    let entries = table(root, "state_map")?;

    StageId::ALL
        .iter()
        .map(|&stage| {
            let key = format!("state_map.{}", stage.as_str());
            let list = entries
                .get(stage.as_str())
                .ok_or_else(|| ConfigError::MissingKey(key.clone()))?
                .as_array()
                .ok_or_else(|| ConfigError::WrongType {
                    key: key.clone(),
                    expected: "list of names".to_string(),
                })?;

            let names = list
                .iter()
                .map(|name| {
                    name.as_str()
                        .map(str::to_string)
                        .ok_or_else(|| ConfigError::WrongType {
                            key: key.clone(),
                            expected: "list of names".to_string(),
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;

            Ok((stage, names))
        })
        .collect()
}

fn nest(parent: &str, err: ConfigError) -> ConfigError {
    match err {
        ConfigError::MissingKey(k) => ConfigError::MissingKey(format!("{}.{}", parent, k)),
        ConfigError::NotNumeric { key, found } => ConfigError::NotNumeric {
            key: format!("{}.{}", parent, key),
            found,
        },
        other => other,
    }
}
