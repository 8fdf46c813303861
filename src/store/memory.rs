//! In-memory store for tests
//!
//! Behaves like the remote tables: rows keep insertion order and ids are
//! assigned on create. Individual tables can be made to fail.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::{RemoteStore, StoreError, StoreResult};
use crate::model::{NewReading, Reading, RecordId, Site, Threshold, ThresholdPayload};

#[derive(Default)]
pub(crate) struct MemoryStore {
    sites: Mutex<Vec<Site>>,
    readings: Mutex<Vec<Reading>>,
    thresholds: Mutex<Vec<Threshold>>,
    next_id: Mutex<RecordId>,
    pub fail_sites: AtomicBool,
    pub fail_readings: AtomicBool,
    pub fail_thresholds: AtomicBool,
    pub reject_writes: AtomicBool,
    writes: Mutex<Vec<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            next_id: Mutex::new(1000),
            ..Default::default()
        }
    }

    pub fn with_sites(self, sites: Vec<Site>) -> Self {
        *self.sites.lock().unwrap() = sites;
        self
    }

    pub fn with_readings(self, readings: Vec<Reading>) -> Self {
        *self.readings.lock().unwrap() = readings;
        self
    }

    pub fn with_thresholds(self, thresholds: Vec<Threshold>) -> Self {
        *self.thresholds.lock().unwrap() = thresholds;
        self
    }

    pub fn thresholds(&self) -> Vec<Threshold> {
        self.thresholds.lock().unwrap().clone()
    }

    pub fn readings(&self) -> Vec<Reading> {
        self.readings.lock().unwrap().clone()
    }

    /// Log of write calls, e.g. `POST Seuils` or `PATCH Seuils/3`
    pub fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    fn next_id(&self) -> RecordId {
        let mut id = self.next_id.lock().unwrap();
        *id += 1;
        *id
    }

    fn check(flag: &AtomicBool) -> StoreResult<()> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }

    fn check_write(&self) -> StoreResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            Err(StoreError::Rejected {
                status: 400,
                message: "rejected".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn list_sites(&self) -> StoreResult<Vec<Site>> {
        Self::check(&self.fail_sites)?;
        Ok(self.sites.lock().unwrap().clone())
    }

    async fn list_readings(&self) -> StoreResult<Vec<Reading>> {
        Self::check(&self.fail_readings)?;
        Ok(self.readings.lock().unwrap().clone())
    }

    async fn list_thresholds(&self) -> StoreResult<Vec<Threshold>> {
        Self::check(&self.fail_thresholds)?;
        Ok(self.thresholds.lock().unwrap().clone())
    }

    async fn create_reading(&self, reading: &NewReading) -> StoreResult<()> {
        self.check_write()?;
        let id = self.next_id();
        self.readings.lock().unwrap().push(Reading {
            id,
            site_id: reading.site_id,
            reading_date: reading.reading_date,
            water: reading.water,
            electricity: reading.electricity,
            gas: reading.gas,
        });
        self.writes.lock().unwrap().push("POST Releves de compteurs".to_string());
        Ok(())
    }

    async fn create_threshold(&self, threshold: &ThresholdPayload) -> StoreResult<()> {
        self.check_write()?;
        let id = self.next_id();
        self.thresholds.lock().unwrap().push(Threshold {
            id,
            site_id: threshold.site_id,
            water: threshold.water,
            electricity: threshold.electricity,
            gas: threshold.gas,
        });
        self.writes.lock().unwrap().push("POST Seuils".to_string());
        Ok(())
    }

    async fn update_threshold(
        &self,
        id: RecordId,
        threshold: &ThresholdPayload,
    ) -> StoreResult<()> {
        self.check_write()?;
        let mut rows = self.thresholds.lock().unwrap();
        let row = rows
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| StoreError::Rejected {
                status: 404,
                message: format!("no row {}", id),
            })?;
        row.site_id = threshold.site_id;
        row.water = threshold.water;
        row.electricity = threshold.electricity;
        row.gas = threshold.gas;
        self.writes.lock().unwrap().push(format!("PATCH Seuils/{}", id));
        Ok(())
    }
}
