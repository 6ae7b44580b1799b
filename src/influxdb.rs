//! InfluxDB2-backed statistics sink.
//!
//! Each hourly statistic point becomes one data point on the
//! `energy_statistics` measurement, tagged with the statistic id and unit
//! and timestamped at the hour start. Series key plus timestamp are
//! deterministic, so re-importing an overlapping point range overwrites
//! rather than duplicates.

use crate::config::InfluxConfig;
use crate::error::StorageError;
use crate::model::{StatisticMetadata, StatisticPoint};
use async_trait::async_trait;
use futures::prelude::stream;
use influxdb2::models::DataPoint;

const MEASUREMENT: &str = "energy_statistics";

/// Consumer of ordered statistic points keyed by a normalized identifier.
#[async_trait]
pub trait StatisticsSink: Send + Sync {
    async fn import_statistics(
        &self,
        statistic_id: &str,
        metadata: &StatisticMetadata,
        points: &[StatisticPoint],
    ) -> Result<(), StorageError>;
}

pub struct Client {
    client: influxdb2::Client,
    bucket: String,
}

impl Client {
    pub(crate) fn new(config: InfluxConfig) -> Self {
        let client = influxdb2::Client::new(config.url, config.org, config.token);
        Self {
            client,
            bucket: config.bucket,
        }
    }
}

#[async_trait]
impl StatisticsSink for Client {
    async fn import_statistics(
        &self,
        statistic_id: &str,
        metadata: &StatisticMetadata,
        points: &[StatisticPoint],
    ) -> Result<(), StorageError> {
        if points.is_empty() {
            return Ok(());
        }

        let data_points = points
            .iter()
            .map(|point| to_data_point(statistic_id, metadata, point))
            .collect::<Result<Vec<DataPoint>, StorageError>>()?;

        Ok(self
            .client
            .write(self.bucket.as_str(), stream::iter(data_points))
            .await?)
    }
}

fn to_data_point(
    statistic_id: &str,
    metadata: &StatisticMetadata,
    point: &StatisticPoint,
) -> Result<DataPoint, StorageError> {
    let timestamp = point
        .start
        .timestamp_nanos_opt()
        .ok_or_else(|| StorageError::write_failed(1, "timestamp overflow"))?;
    DataPoint::builder(MEASUREMENT)
        .tag("statistic_id", statistic_id)
        .tag("unit", metadata.unit.as_str())
        .field("state", point.state)
        .field("sum", point.sum)
        .timestamp(timestamp)
        .build()
        .map_err(|e| StorageError::write_failed(1, e))
}
