//! Mock sink and listener implementations.

use crate::error::StorageError;
use crate::influxdb::StatisticsSink;
use crate::model::{StatisticMetadata, StatisticPoint};
use crate::w1000::UpdateListener;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A sink that records every import for later inspection.
pub struct RecordingSink {
    imports: Mutex<Vec<(String, StatisticMetadata, Vec<StatisticPoint>)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            imports: Mutex::new(Vec::new()),
        }
    }

    pub fn imports(&self) -> Vec<(String, StatisticMetadata, Vec<StatisticPoint>)> {
        self.imports.lock().unwrap().clone()
    }
}

#[async_trait]
impl StatisticsSink for RecordingSink {
    async fn import_statistics(
        &self,
        statistic_id: &str,
        metadata: &StatisticMetadata,
        points: &[StatisticPoint],
    ) -> Result<(), StorageError> {
        self.imports.lock().unwrap().push((
            statistic_id.to_string(),
            metadata.clone(),
            points.to_vec(),
        ));
        Ok(())
    }
}

/// A sink whose imports always fail.
pub struct FailingSink;

#[async_trait]
impl StatisticsSink for FailingSink {
    async fn import_statistics(
        &self,
        _statistic_id: &str,
        _metadata: &StatisticMetadata,
        points: &[StatisticPoint],
    ) -> Result<(), StorageError> {
        Err(StorageError::write_failed(points.len(), "mock sink failure"))
    }
}

/// A listener that counts its callbacks.
pub struct CountingListener {
    entity_id: String,
    calls: AtomicUsize,
}

impl CountingListener {
    pub fn new(entity_id: &str) -> Self {
        Self {
            entity_id: entity_id.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl UpdateListener for CountingListener {
    fn entity_id(&self) -> &str {
        &self.entity_id
    }

    fn update_callback(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}
