//! JSON-snapshot store: the whole state is rewritten on every commit.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use super::{ExtractedRow, InvoiceStore, Result};
use crate::error::StoreError;
use crate::models::invoice::{
    AggregatorInvoiceData, DriverInvoiceData, InvoiceData, InvoiceRef, Trip,
};

/// Serialized store state.
#[derive(Debug, Default, Serialize, Deserialize)]
struct State {
    #[serde(default)]
    trips: Vec<Trip>,
    #[serde(default)]
    invoices: Vec<InvoiceRef>,
    #[serde(default)]
    driver_data: Vec<DriverInvoiceData>,
    #[serde(default)]
    aggregator_data: Vec<AggregatorInvoiceData>,
}

/// File-backed store with per-call commit.
///
/// Each mutation rewrites the snapshot through a temp file and rename, so
/// the file on disk is always a complete, parseable state. This provides
/// the per-document commit granularity the pipeline depends on.
pub struct JsonStore {
    path: PathBuf,
    state: Mutex<State>,
}

impl JsonStore {
    /// Open an existing snapshot, or start empty when the file is missing.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = match std::fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => State::default(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            state: Mutex::new(state),
        })
    }

    fn commit(&self, state: &State) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(state)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl InvoiceStore for JsonStore {
    fn insert_trip(&self, trip: Trip) -> Result<()> {
        let mut state = self.lock();
        state.trips.retain(|existing| existing.trip_id != trip.trip_id);
        state.trips.push(trip);
        self.commit(&state)
    }

    fn insert_invoice(&self, trip_id: &str, download_url: &str) -> Result<InvoiceRef> {
        let mut state = self.lock();
        let id = state
            .invoices
            .iter()
            .map(|invoice| invoice.id)
            .max()
            .unwrap_or(0)
            + 1;

        let invoice = InvoiceRef {
            id,
            trip_id: trip_id.to_string(),
            download_url: download_url.to_string(),
            downloaded: false,
            processed: false,
            last_updated: chrono::Utc::now(),
        };
        state.invoices.push(invoice.clone());
        self.commit(&state)?;
        Ok(invoice)
    }

    fn trips(&self) -> Result<Vec<Trip>> {
        Ok(self.lock().trips.clone())
    }

    fn invoices_for_trips(&self, trip_ids: &[String]) -> Result<Vec<InvoiceRef>> {
        Ok(self
            .lock()
            .invoices
            .iter()
            .filter(|invoice| trip_ids.contains(&invoice.trip_id))
            .cloned()
            .collect())
    }

    fn invoices_by_ids(&self, ids: &[i64]) -> Result<Vec<InvoiceRef>> {
        Ok(self
            .lock()
            .invoices
            .iter()
            .filter(|invoice| ids.contains(&invoice.id))
            .cloned()
            .collect())
    }

    fn undownloaded(&self) -> Result<Vec<InvoiceRef>> {
        Ok(self
            .lock()
            .invoices
            .iter()
            .filter(|invoice| !invoice.downloaded)
            .cloned()
            .collect())
    }

    fn pending_extraction(&self) -> Result<Vec<InvoiceRef>> {
        Ok(self
            .lock()
            .invoices
            .iter()
            .filter(|invoice| invoice.downloaded && !invoice.processed)
            .cloned()
            .collect())
    }

    fn save_invoice(&self, invoice: &InvoiceRef) -> Result<()> {
        let mut state = self.lock();
        let slot = state
            .invoices
            .iter_mut()
            .find(|existing| existing.id == invoice.id)
            .ok_or(StoreError::UnknownInvoice(invoice.id))?;
        *slot = invoice.clone();
        self.commit(&state)
    }

    fn commit_extraction(&self, invoice: &InvoiceRef, data: &InvoiceData) -> Result<()> {
        let mut state = self.lock();
        let slot = state
            .invoices
            .iter_mut()
            .find(|existing| existing.id == invoice.id)
            .ok_or(StoreError::UnknownInvoice(invoice.id))?;
        slot.processed = true;

        match data {
            InvoiceData::Driver(record) => state.driver_data.push(record.clone()),
            InvoiceData::Aggregator(record) => state.aggregator_data.push(record.clone()),
        }
        self.commit(&state)
    }

    fn extracted_rows(&self) -> Result<Vec<ExtractedRow>> {
        let state = self.lock();
        Ok(state
            .trips
            .iter()
            .filter_map(|trip| {
                let driver = state
                    .driver_data
                    .iter()
                    .find(|record| record.trip_id == trip.trip_id)
                    .cloned();
                let aggregator = state
                    .aggregator_data
                    .iter()
                    .find(|record| record.trip_id == trip.trip_id)
                    .cloned();

                if driver.is_none() && aggregator.is_none() {
                    return None;
                }
                Some(ExtractedRow {
                    trip_id: trip.trip_id.clone(),
                    quoted_fare: trip.fare,
                    driver,
                    aggregator,
                })
            })
            .collect())
    }
}
