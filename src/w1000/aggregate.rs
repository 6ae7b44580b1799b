//! Hourly aggregation of raw curves into a cumulative statistics series.
//!
//! A report's response mixes two signal kinds: delta curves (name ends in
//! `A`) carrying consumption per interval, and absolute-counter curves
//! (name contains `.8.`) carrying the running meter reading. The walk
//! integrates the deltas into a cumulative `state` and resynchronizes it
//! from the counter whenever one is present, so meter resets or missed
//! intervals cannot let the series drift.

use crate::model::{
    is_absolute_signal, is_incremental_signal, portal_offset, Curve, HourBucket, ReportSummary,
    StatisticPoint,
};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Timelike};
use std::collections::BTreeMap;

/// Transforms raw curves into ordered statistic points plus a last-known
/// summary.
///
/// Pure function. The walk over the hour buckets is strictly forward and
/// single-pass:
/// - leading buckets are skipped while no cumulative state, counter
///   reading, or measured consumption exists ("no meaningful reading has
///   started yet");
/// - a positive counter reading resynchronizes `state`, otherwise the
///   hour's delta sum is integrated;
/// - `sum` accumulates the delta sums unconditionally, so it is
///   non-decreasing across the emitted sequence;
/// - a point is emitted only for hours with a positive delta sum. Hours
///   with zero measured consumption produce no point even when a counter
///   resync changed `state` that hour.
///
/// The summary is taken from the absolute-counter curve when one is
/// present, else from the last curve of the response. `None` when no
/// bucket survives the skip phase.
pub fn aggregate_curves(curves: &[Curve]) -> (Vec<StatisticPoint>, Option<ReportSummary>) {
    let mut buckets: BTreeMap<NaiveDateTime, HourBucket> = BTreeMap::new();

    for curve in curves {
        let incremental = is_incremental_signal(&curve.name);
        let absolute = is_absolute_signal(&curve.name);
        tracing::debug!("curve: {}", curve.name);

        for point in &curve.data {
            if point.status <= 0 {
                continue;
            }
            let bucket = buckets.entry(truncate_to_hour(point.time)).or_default();
            if incremental {
                bucket.incremental_sum += point.value;
            }
            if absolute {
                // Last write wins when multiple readings share an hour.
                bucket.absolute_state = point.value;
            }
        }
    }

    let mut state = 0.0_f64;
    let mut sum = 0.0_f64;
    let mut points = Vec::new();
    let mut last_hour: Option<NaiveDateTime> = None;

    for (hour, bucket) in &buckets {
        // Skip the leading stretch where no reading has started yet: no
        // cumulative state, no counter reading, no measured consumption.
        if state == 0.0 && bucket.absolute_state == 0.0 && bucket.incremental_sum == 0.0 {
            continue;
        }

        if bucket.absolute_state > 0.0 {
            state = bucket.absolute_state;
        } else {
            state += bucket.incremental_sum;
        }
        sum += bucket.incremental_sum;
        last_hour = Some(*hour);

        if bucket.incremental_sum > 0.0 {
            points.push(StatisticPoint {
                start: at_portal_offset(*hour),
                state: round3(state),
                sum,
            });
        }
    }

    let summary = last_hour.and_then(|hour| {
        summary_curve(curves).map(|curve| ReportSummary {
            curve: curve.name.clone(),
            last_value: round3(state),
            unit: curve.unit.clone(),
            last_time: at_portal_offset(hour),
        })
    });

    (points, summary)
}

/// The curve a report's summary metadata is taken from: the
/// absolute-counter curve when present, else the last curve returned.
fn summary_curve(curves: &[Curve]) -> Option<&Curve> {
    curves
        .iter()
        .find(|curve| is_absolute_signal(&curve.name))
        .or_else(|| curves.last())
}

fn truncate_to_hour(time: NaiveDateTime) -> NaiveDateTime {
    time.date()
        .and_hms_opt(time.hour(), 0, 0)
        .expect("hour truncation keeps a valid time")
}

fn at_portal_offset(hour: NaiveDateTime) -> DateTime<FixedOffset> {
    hour.and_local_timezone(portal_offset())
        .single()
        .expect("fixed-offset conversion is unambiguous")
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
