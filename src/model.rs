//! Domain and wire types for the W1000 portal client.
//!
//! Wire types (`SessionDocument`, `Curve`, `CurvePoint`) mirror the portal's
//! login payload and profile-data JSON. Domain types (`StatisticPoint`,
//! `ReportSummary`, `EntityState`) are what the aggregator and the facade
//! hand to the statistics sink and the listener layer.

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use serde_derive::Deserialize as DeriveDeserialize;
use std::fmt;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Suffix marking a delta/incremental signal curve (consumption within the
/// interval).
const INCREMENTAL_SIGNAL_SUFFIX: char = 'A';

/// Marker substring of an absolute-counter signal curve (running meter
/// reading, used to resynchronize the cumulative state).
const ABSOLUTE_SIGNAL_MARKER: &str = ".8.";

/// The portal emits naive local timestamps; statistic points are stamped
/// with this fixed offset. No DST adjustment, a documented limitation.
pub fn portal_offset() -> FixedOffset {
    FixedOffset::east_opt(2 * 3600).expect("+02:00 is a valid offset")
}

/// Returns true if the curve carries per-interval consumption deltas.
pub fn is_incremental_signal(curve_name: &str) -> bool {
    curve_name.ends_with(INCREMENTAL_SIGNAL_SUFFIX)
}

/// Returns true if the curve carries absolute meter-counter readings.
pub fn is_absolute_signal(curve_name: &str) -> bool {
    curve_name.contains(ABSOLUTE_SIGNAL_MARKER)
}

/// Derives the external statistic identifier for a report name.
///
/// The identifier must be deterministic and ASCII-safe, so accented report
/// names ("Fűtés") are NFKD-decomposed and stripped of combining marks
/// before the fixed namespace prefix is applied.
pub fn normalize_statistic_id(report_name: &str) -> String {
    let folded: String = report_name
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    format!("sensor.w1000_{}", folded)
}

/// The structured document embedded in a successful login response.
///
/// The portal serves it as a JavaScript object literal inside a
/// `W1000.start(...)` call; see [`crate::w1000::SessionManager`] for how it
/// is extracted and parsed.
#[derive(DeriveDeserialize, Debug, Clone)]
pub struct SessionDocument {
    #[serde(rename = "currentUser")]
    pub current_user: String,
    pub workareas: Vec<WorkArea>,
}

/// A portal-side grouping of report windows.
#[derive(DeriveDeserialize, Debug, Clone)]
pub struct WorkArea {
    pub name: String,
    pub windows: Vec<Window>,
}

/// Binds a human-readable report name to its numeric report id.
#[derive(DeriveDeserialize, Debug, Clone)]
pub struct Window {
    pub name: String,
    #[serde(deserialize_with = "lenient_i64")]
    pub reportid: i64,
}

/// Accepts a numeric id whether the payload quotes it or not.
fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(DeriveDeserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(i64),
        String(String),
    }

    match NumberOrString::deserialize(deserializer)? {
        NumberOrString::Number(n) => Ok(n),
        NumberOrString::String(s) => s.trim().parse::<i64>().map_err(serde::de::Error::custom),
    }
}

/// One named raw signal returned for a report.
#[derive(DeriveDeserialize, Debug, Clone)]
pub struct Curve {
    pub name: String,
    pub unit: String,
    pub data: Vec<CurvePoint>,
}

/// A single interval reading. Only points with `status > 0` are usable.
#[derive(DeriveDeserialize, Debug, Clone, PartialEq)]
pub struct CurvePoint {
    pub time: NaiveDateTime,
    pub value: f64,
    pub status: i64,
}

/// Per-hour accumulator used while reconciling the two signal kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HourBucket {
    /// Sum of delta-type values observed in this hour.
    pub incremental_sum: f64,
    /// Last-seen counter-type value in this hour, 0.0 if none.
    pub absolute_state: f64,
}

/// One hourly record destined for the external statistics store.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticPoint {
    pub start: DateTime<FixedOffset>,
    /// Cumulative meter reading at this hour, rounded to 3 decimals.
    pub state: f64,
    /// Running total of incremental consumption; non-decreasing.
    pub sum: f64,
}

/// Metadata accompanying a statistics import.
#[derive(Debug, Clone, PartialEq)]
pub struct StatisticMetadata {
    pub has_mean: bool,
    pub has_sum: bool,
    pub name: String,
    pub unit: String,
}

impl StatisticMetadata {
    /// Builds the metadata for one report's hourly consumption series.
    pub fn for_report(report_name: &str, unit: &str) -> Self {
        Self {
            has_mean: false,
            has_sum: true,
            name: format!("w1000 {}", report_name),
            unit: unit.to_string(),
        }
    }
}

/// Last-known reading of one report, rebuilt in full on every poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSummary {
    /// Name of the curve the summary was taken from.
    pub curve: String,
    pub last_value: f64,
    pub unit: String,
    pub last_time: DateTime<FixedOffset>,
}

/// Sensor state class derived from the summary curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateClass {
    TotalIncreasing,
    Measurement,
}

impl fmt::Display for StateClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StateClass::TotalIncreasing => write!(f, "total_increasing"),
            StateClass::Measurement => write!(f, "measurement"),
        }
    }
}

/// Sensor device class derived from the report unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Power,
    Energy,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DeviceClass::Power => write!(f, "power"),
            DeviceClass::Energy => write!(f, "energy"),
        }
    }
}

/// Attributes exposed alongside an entity state.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityAttributes {
    pub curve: String,
    pub generated: DateTime<FixedOffset>,
    pub state_class: StateClass,
    pub device_class: Option<DeviceClass>,
}

/// The per-report record consumed by the listener/entity layer.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityState {
    pub state: f64,
    pub unit: String,
    pub attributes: EntityAttributes,
}

impl EntityState {
    /// Derives the entity representation of a report summary.
    ///
    /// Units ending in `W`/`Var` map to the `power` device class, units
    /// ending in `Wh`/`Varh` to `energy`; counter-backed curves (name
    /// contains `.8.`) report `total_increasing`, all others `measurement`.
    pub fn from_summary(summary: &ReportSummary) -> Self {
        let state_class = if is_absolute_signal(&summary.curve) {
            StateClass::TotalIncreasing
        } else {
            StateClass::Measurement
        };

        // Wh/Varh must win over the bare W/Var suffix check.
        let device_class = if summary.unit.ends_with("Wh") || summary.unit.ends_with("Varh") {
            Some(DeviceClass::Energy)
        } else if summary.unit.ends_with('W') || summary.unit.ends_with("Var") {
            Some(DeviceClass::Power)
        } else {
            None
        };

        Self {
            state: summary.last_value,
            unit: summary.unit.clone(),
            attributes: EntityAttributes {
                curve: summary.curve.clone(),
                generated: summary.last_time,
                state_class,
                device_class,
            },
        }
    }
}
