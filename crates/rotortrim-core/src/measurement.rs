//! Measurements produced by the acquisition side
//!
//! A [`MeasurementRecord`] is one regime of one flight: relative blade track
//! plus lateral and vertical 1/rev vibration. A [`RunSet`] collects the
//! records of a flight by regime name; a [`FlightLog`] collects run sets by
//! flight id.
//!
//! Records arrive as loosely-shaped JSON (older producers emit the lateral
//! channel as `vib_1r_ips`/`vib_1r_phase_deg`). That is resolved once, at
//! deserialization, into canonical fields. A present-but-null canonical
//! field reads as 0.0; only an absent one falls back to the legacy name.
//!
//! Files on disk hold either a single run set or a whole flight log; a
//! [`RunsDocument`] tells the two apart by shape.

use crate::error::{ResultExt, RotorTrimError};
use crate::vector::Phasor;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Millimetres per inch
pub const MM_PER_INCH: f64 = 25.4;

/// Blade colour code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Blade {
    Blu,
    Org,
    Red,
    Grn,
}

impl Blade {
    /// All blades in disk order
    pub const ALL: [Blade; 4] = [Blade::Blu, Blade::Org, Blade::Red, Blade::Grn];

    /// Colour code as written on the blade
    pub fn as_str(self) -> &'static str {
        match self {
            Blade::Blu => "BLU",
            Blade::Org => "ORG",
            Blade::Red => "RED",
            Blade::Grn => "GRN",
        }
    }
}

impl fmt::Display for Blade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Blade {
    type Err = RotorTrimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Blade::ALL
            .into_iter()
            .find(|b| b.as_str() == s)
            .ok_or_else(|| RotorTrimError::UnknownBlade(s.to_string()))
    }
}

/// Per-blade track height relative to the four-blade mean (mm)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrackOffsets {
    #[serde(rename = "BLU", default)]
    pub blu: f64,
    #[serde(rename = "ORG", default)]
    pub org: f64,
    #[serde(rename = "RED", default)]
    pub red: f64,
    #[serde(rename = "GRN", default)]
    pub grn: f64,
}

impl TrackOffsets {
    /// Offset of one blade in millimetres
    pub fn mm(&self, blade: Blade) -> f64 {
        match blade {
            Blade::Blu => self.blu,
            Blade::Org => self.org,
            Blade::Red => self.red,
            Blade::Grn => self.grn,
        }
    }

    /// Offset of one blade in inches
    pub fn inches(&self, blade: Blade) -> f64 {
        self.mm(blade) / MM_PER_INCH
    }
}

/// One vibration channel: amplitude (ips) and phase (deg)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vibration {
    pub amplitude_ips: f64,
    pub phase_deg: f64,
}

impl Vibration {
    pub fn new(amplitude_ips: f64, phase_deg: f64) -> Self {
        Self {
            amplitude_ips,
            phase_deg,
        }
    }

    /// The channel as a phasor
    pub fn phasor(&self) -> Phasor {
        Phasor::from_polar(self.amplitude_ips, self.phase_deg)
    }
}

/// One acquisition for one regime. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawMeasurement", into = "RawMeasurement")]
pub struct MeasurementRecord {
    track_rel_mm: TrackOffsets,
    lateral: Vibration,
    vertical: Vibration,
}

impl MeasurementRecord {
    pub fn new(track_rel_mm: TrackOffsets, lateral: Vibration, vertical: Vibration) -> Self {
        Self {
            track_rel_mm,
            lateral,
            vertical,
        }
    }

    /// Record carrying only a lateral 1/rev reading
    pub fn lateral_only(amplitude_ips: f64, phase_deg: f64) -> Self {
        Self {
            lateral: Vibration::new(amplitude_ips, phase_deg),
            ..Self::default()
        }
    }

    /// Record carrying only a vertical 1/rev reading
    pub fn vertical_only(amplitude_ips: f64, phase_deg: f64) -> Self {
        Self {
            vertical: Vibration::new(amplitude_ips, phase_deg),
            ..Self::default()
        }
    }

    /// Record carrying only track offsets
    pub fn track_only(track_rel_mm: TrackOffsets) -> Self {
        Self {
            track_rel_mm,
            ..Self::default()
        }
    }

    pub fn track(&self) -> &TrackOffsets {
        &self.track_rel_mm
    }

    pub fn lateral(&self) -> Vibration {
        self.lateral
    }

    pub fn vertical(&self) -> Vibration {
        self.vertical
    }
}

/// Wire shape of a record, legacy fields included
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawMeasurement {
    #[serde(default)]
    track_rel_mm: TrackOffsets,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    lat_1r_ips: Option<Option<f64>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    lat_1r_phase_deg: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vib_1r_ips: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vib_1r_phase_deg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vert_1r_ips: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    vert_1r_phase_deg: Option<f64>,
}

/// Outer `Some` marks the key as present, even when its value is null
fn present<'de, D>(deserializer: D) -> Result<Option<Option<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<f64>::deserialize(deserializer).map(Some)
}

/// Canonical field if the key is present, legacy field otherwise
fn lateral_field(canonical: Option<Option<f64>>, legacy: Option<f64>) -> f64 {
    match canonical {
        Some(value) => value.unwrap_or(0.0),
        None => legacy.unwrap_or(0.0),
    }
}

impl From<RawMeasurement> for MeasurementRecord {
    fn from(raw: RawMeasurement) -> Self {
        Self {
            track_rel_mm: raw.track_rel_mm,
            lateral: Vibration::new(
                lateral_field(raw.lat_1r_ips, raw.vib_1r_ips),
                lateral_field(raw.lat_1r_phase_deg, raw.vib_1r_phase_deg),
            ),
            vertical: Vibration::new(
                raw.vert_1r_ips.unwrap_or(0.0),
                raw.vert_1r_phase_deg.unwrap_or(0.0),
            ),
        }
    }
}

impl From<MeasurementRecord> for RawMeasurement {
    fn from(record: MeasurementRecord) -> Self {
        Self {
            track_rel_mm: record.track_rel_mm,
            lat_1r_ips: Some(Some(record.lateral.amplitude_ips)),
            lat_1r_phase_deg: Some(Some(record.lateral.phase_deg)),
            vert_1r_ips: Some(record.vertical.amplitude_ips),
            vert_1r_phase_deg: Some(record.vertical.phase_deg),
            ..Self::default()
        }
    }
}

/// Records of one flight keyed by regime name
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunSet {
    runs: BTreeMap<String, MeasurementRecord>,
}

impl RunSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record; a same-named earlier record is replaced and returned
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        record: MeasurementRecord,
    ) -> Option<MeasurementRecord> {
        self.runs.insert(name.into(), record)
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, record: MeasurementRecord) -> Self {
        self.insert(name, record);
        self
    }

    pub fn get(&self, name: &str) -> Option<&MeasurementRecord> {
        self.runs.get(name)
    }

    /// First record whose name appears in `aliases`, in alias order
    pub fn resolve(&self, aliases: &[String]) -> Option<&MeasurementRecord> {
        aliases.iter().find_map(|name| self.runs.get(name))
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Records sorted by regime name
    pub fn iter(&self) -> impl Iterator<Item = (&str, &MeasurementRecord)> {
        self.runs.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<S: Into<String>> FromIterator<(S, MeasurementRecord)> for RunSet {
    fn from_iter<I: IntoIterator<Item = (S, MeasurementRecord)>>(iter: I) -> Self {
        Self {
            runs: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// Run sets keyed by flight id
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightLog {
    flights: BTreeMap<String, RunSet>,
}

impl FlightLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one acquisition under a flight
    pub fn record(
        &mut self,
        flight_id: impl Into<String>,
        regime: impl Into<String>,
        record: MeasurementRecord,
    ) -> Option<MeasurementRecord> {
        self.flights
            .entry(flight_id.into())
            .or_default()
            .insert(regime, record)
    }

    /// The flight to diagnose: the requested one if recorded, else the
    /// highest flight id
    pub fn active(&self, flight_id: Option<&str>) -> Option<(&str, &RunSet)> {
        if let Some(id) = flight_id {
            if let Some((k, v)) = self.flights.get_key_value(id) {
                return Some((k.as_str(), v));
            }
            tracing::warn!("Flight {} not recorded, using latest flight", id);
        }
        self.flights
            .iter()
            .next_back()
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.flights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flights.is_empty()
    }
}

/// Field names that only appear inside a measurement record
pub const RECORD_KEYS: [&str; 7] = [
    "track_rel_mm",
    "lat_1r_ips",
    "lat_1r_phase_deg",
    "vib_1r_ips",
    "vib_1r_phase_deg",
    "vert_1r_ips",
    "vert_1r_phase_deg",
];

/// Contents of a measurements file
#[derive(Debug, Clone, PartialEq)]
pub enum RunsDocument {
    /// Records of one flight keyed by regime
    Single(RunSet),

    /// Run sets keyed by flight id
    Flights(FlightLog),
}

impl RunsDocument {
    /// Classify and parse an already-decoded JSON document.
    ///
    /// A flight log is a non-empty object whose every value is a non-empty
    /// object of objects, none keyed by a record field. Anything else is
    /// read as a run set, so empty records (`{"60NR": {}}`) stay regimes.
    pub fn from_value(value: serde_json::Value) -> crate::Result<Self> {
        if is_flight_log(&value) {
            Ok(Self::Flights(serde_json::from_value(value)?))
        } else {
            Ok(Self::Single(serde_json::from_value(value)?))
        }
    }

    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        Self::from_value(serde_json::from_str(text)?)
    }

    /// Read and classify a measurements file
    pub fn from_path(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(RotorTrimError::from)
            .with_context(|| format!("Cannot read {}", path.display()))?;
        let document = Self::from_json_str(&text)
            .with_context(|| format!("Invalid measurements in {}", path.display()))?;
        tracing::debug!(
            path = %path.display(),
            flight_log = matches!(document, Self::Flights(_)),
            "Measurements loaded"
        );
        Ok(document)
    }

    /// The run set to diagnose and, for a flight log, its flight id
    pub fn select(&self, flight_id: Option<&str>) -> (Option<String>, RunSet) {
        match self {
            Self::Single(runs) => {
                if let Some(id) = flight_id {
                    tracing::warn!("Single run set, flight {} ignored", id);
                }
                (None, runs.clone())
            }
            Self::Flights(log) => match log.active(flight_id) {
                Some((id, runs)) => (Some(id.to_string()), runs.clone()),
                None => (None, RunSet::new()),
            },
        }
    }
}

fn is_flight_log(value: &serde_json::Value) -> bool {
    let Some(top) = value.as_object() else {
        return false;
    };
    !top.is_empty()
        && top.values().all(|flight| {
            flight.as_object().is_some_and(|regimes| {
                !regimes.is_empty()
                    && regimes.iter().all(|(name, record)| {
                        record.is_object() && !RECORD_KEYS.contains(&name.as_str())
                    })
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_from_generator_json() {
        let record: MeasurementRecord = serde_json::from_value(json!({
            "aircraft_type": "412_50",
            "test_state": "100NR",
            "track_rel_mm": {"BLU": 18, "ORG": -20, "RED": 17, "GRN": -15},
            "lat_1r_ips": 0.22,
            "lat_1r_phase_deg": 70.0,
            "vert_1r_ips": 0.06,
            "vert_1r_phase_deg": 240.0,
            "vib_1r_ips": 0.99,
            "vib_1r_phase_deg": 1.0
        }))
        .unwrap();

        assert_eq!(record.lateral(), Vibration::new(0.22, 70.0));
        assert_eq!(record.vertical(), Vibration::new(0.06, 240.0));
        assert_eq!(record.track().mm(Blade::Org), -20.0);
        assert!((record.track().inches(Blade::Org) + 20.0 / 25.4).abs() < 1e-12);
    }

    #[test]
    fn test_legacy_lateral_fields() {
        let record: MeasurementRecord = serde_json::from_value(json!({
            "vib_1r_ips": 0.18,
            "vib_1r_phase_deg": 30.0
        }))
        .unwrap();

        assert_eq!(record.lateral(), Vibration::new(0.18, 30.0));
        assert_eq!(record.vertical(), Vibration::default());
        assert_eq!(*record.track(), TrackOffsets::default());
    }

    #[test]
    fn test_null_canonical_field_does_not_fall_back() {
        let record: MeasurementRecord = serde_json::from_value(json!({
            "lat_1r_ips": null,
            "lat_1r_phase_deg": null,
            "vib_1r_ips": 0.18,
            "vib_1r_phase_deg": 30.0
        }))
        .unwrap();
        assert_eq!(record.lateral(), Vibration::default());

        let mixed: MeasurementRecord = serde_json::from_value(json!({
            "lat_1r_ips": null,
            "vib_1r_ips": 0.18,
            "vib_1r_phase_deg": 30.0
        }))
        .unwrap();
        assert_eq!(mixed.lateral(), Vibration::new(0.0, 30.0));
    }

    #[test]
    fn test_serialize_uses_canonical_names() {
        let record = MeasurementRecord::lateral_only(0.1, 45.0);
        let value = serde_json::to_value(record).unwrap();

        assert_eq!(value["lat_1r_ips"], json!(0.1));
        assert!(value.get("vib_1r_ips").is_none());

        let back: MeasurementRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_resolve_follows_alias_priority() {
        let runs = RunSet::new()
            .with("IDLE", MeasurementRecord::lateral_only(0.2, 0.0))
            .with("60NR", MeasurementRecord::lateral_only(0.1, 0.0));

        let aliases = vec!["60NR".to_string(), "IDLE".to_string()];
        assert_eq!(runs.resolve(&aliases).unwrap().lateral().amplitude_ips, 0.1);

        let reversed = vec!["IDLE".to_string(), "60NR".to_string()];
        assert_eq!(runs.resolve(&reversed).unwrap().lateral().amplitude_ips, 0.2);

        assert!(runs.resolve(&["HOVER".to_string()]).is_none());
        assert!(runs.resolve(&[]).is_none());
    }

    #[test]
    fn test_insert_overwrites_same_name() {
        let mut runs = RunSet::new();
        assert!(runs.insert("HOVER", MeasurementRecord::lateral_only(0.25, 80.0)).is_none());

        let previous = runs.insert("HOVER", MeasurementRecord::lateral_only(0.10, 82.0));
        assert_eq!(previous.unwrap().lateral().amplitude_ips, 0.25);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs.get("HOVER").unwrap().lateral().amplitude_ips, 0.10);
    }

    #[test]
    fn test_flight_log_active_selection() {
        let mut log = FlightLog::new();
        assert!(log.active(None).is_none());

        log.record("1", "60NR", MeasurementRecord::default());
        log.record("2", "100NR", MeasurementRecord::lateral_only(0.22, 70.0));

        assert_eq!(log.active(Some("1")).unwrap().0, "1");
        assert_eq!(log.active(None).unwrap().0, "2");
        assert_eq!(log.active(Some("9")).unwrap().0, "2");
        assert_eq!(log.len(), 2);
    }

    #[test]
    fn test_document_run_set_shape() {
        let doc = RunsDocument::from_value(json!({
            "60NR": {"track_rel_mm": {"BLU": 22.2, "ORG": -22.2, "RED": 22.2, "GRN": -22.2}},
            "100NR": {"lat_1r_ips": 0.22, "lat_1r_phase_deg": 70.0}
        }))
        .unwrap();

        let (flight, runs) = doc.select(Some("3"));
        assert!(flight.is_none());
        assert_eq!(runs.len(), 2);
        assert_eq!(runs.get("100NR").unwrap().lateral(), Vibration::new(0.22, 70.0));
    }

    #[test]
    fn test_document_empty_records_stay_a_run_set() {
        let doc = RunsDocument::from_json_str(r#"{"60NR": {}}"#).unwrap();
        assert!(matches!(doc, RunsDocument::Single(_)));

        let (flight, runs) = doc.select(None);
        assert!(flight.is_none());
        assert_eq!(*runs.get("60NR").unwrap(), MeasurementRecord::default());

        let empty = RunsDocument::from_json_str("{}").unwrap();
        assert_eq!(empty, RunsDocument::Single(RunSet::new()));
    }

    #[test]
    fn test_document_flight_log_shape() {
        let doc = RunsDocument::from_value(json!({
            "1": {"60NR": {}},
            "2": {"100NR": {"vib_1r_ips": 0.22, "vib_1r_phase_deg": 70.0}}
        }))
        .unwrap();
        assert!(matches!(doc, RunsDocument::Flights(_)));

        let (flight, runs) = doc.select(None);
        assert_eq!(flight.as_deref(), Some("2"));
        assert_eq!(runs.get("100NR").unwrap().lateral(), Vibration::new(0.22, 70.0));

        let (flight, runs) = doc.select(Some("1"));
        assert_eq!(flight.as_deref(), Some("1"));
        assert!(runs.get("60NR").is_some());
    }

    #[test]
    fn test_document_track_only_records_are_not_flights() {
        let doc = RunsDocument::from_value(json!({
            "60NR": {"track_rel_mm": {"BLU": 1.0}}
        }))
        .unwrap();
        assert!(matches!(doc, RunsDocument::Single(_)));
    }

    #[test]
    fn test_document_rejects_bad_json() {
        let err = RunsDocument::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, RotorTrimError::Serialization(_)));

        let err = RunsDocument::from_value(json!([1, 2])).unwrap_err();
        assert!(err.to_string().starts_with("Serialization error"));
    }

    #[test]
    fn test_document_from_path() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"HOVER": {{"lat_1r_ips": 0.25, "lat_1r_phase_deg": 80.0}}}}"#).unwrap();
        let (_, runs) = RunsDocument::from_path(file.path()).unwrap().select(None);
        assert_eq!(runs.get("HOVER").unwrap().lateral().amplitude_ips, 0.25);

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("runs.json");
        let err = RunsDocument::from_path(&missing).unwrap_err();
        match &err {
            RotorTrimError::WithContext { context, source } => {
                assert!(context.starts_with("Cannot read"));
                assert!(matches!(**source, RotorTrimError::Io(_)));
            }
            other => panic!("unexpected error: {other}"),
        }

        let mut bad = tempfile::NamedTempFile::new().unwrap();
        write!(bad, "[").unwrap();
        let err = RunsDocument::from_path(bad.path()).unwrap_err();
        assert!(err.to_string().starts_with("Invalid measurements in"));
    }

    #[test]
    fn test_blade_parsing() {
        assert_eq!("GRN".parse::<Blade>().unwrap(), Blade::Grn);
        assert!("grn".parse::<Blade>().is_err());
        assert_eq!(Blade::Red.to_string(), "RED");
    }
}
