//! Session data store
//!
//! Fetch tools park their series here and hand the model a `data_id`;
//! analysis tools look the series back up by that id. Nothing is evicted:
//! the store lives exactly as long as the session that owns it.

use crate::model::{InstrumentKind, OhlcvSeries};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Store shared by both dispatch tiers of one session
pub type SharedDataStore = Arc<Mutex<DataStore>>;

/// What was fetched and for which window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    #[serde(rename = "type")]
    pub kind: InstrumentKind,
    pub symbol: String,
    /// Display name, the symbol itself when no name was found
    pub name: String,
    /// Requested start, `YYYYMMDD`
    pub start_date: String,
    /// Requested end, `YYYYMMDD`
    pub end_date: String,
}

impl DatasetMetadata {
    /// True when a real display name is known
    pub fn has_display_name(&self) -> bool {
        self.name != self.symbol
    }
}

/// One stored fetch result
#[derive(Debug, Clone)]
pub struct StoredDataset {
    pub id: String,
    pub series: OhlcvSeries,
    pub metadata: DatasetMetadata,
    pub created_at: DateTime<Local>,
}

/// In-memory map from generated ids to datasets
#[derive(Debug, Default)]
pub struct DataStore {
    datasets: HashMap<String, StoredDataset>,
    order: Vec<String>,
    counter: u64,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh store wrapped for sharing
    pub fn shared() -> SharedDataStore {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Store a series and return its id (`data_1`, `data_2`, ...)
    pub fn store(&mut self, series: OhlcvSeries, metadata: DatasetMetadata) -> String {
        self.counter += 1;
        let id = format!("data_{}", self.counter);
        tracing::debug!(data_id = %id, symbol = %metadata.symbol, rows = series.len(), "Stored dataset");

        self.datasets.insert(
            id.clone(),
            StoredDataset {
                id: id.clone(),
                series,
                metadata,
                created_at: Local::now(),
            },
        );
        self.order.push(id.clone());
        id
    }

    pub fn get(&self, id: &str) -> Option<&StoredDataset> {
        self.datasets.get(id)
    }

    pub fn len(&self) -> usize {
        self.datasets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }

    /// Ids in insertion order
    pub fn ids(&self) -> &[String] {
        &self.order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::tests::{ramp, series_from_closes};

    fn metadata(symbol: &str) -> DatasetMetadata {
        DatasetMetadata {
            kind: InstrumentKind::Stock,
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            start_date: "20240101".to_string(),
            end_date: "20240301".to_string(),
        }
    }

    #[test]
    fn test_sequential_ids() {
        let mut store = DataStore::new();
        let first = store.store(series_from_closes(&ramp(3)), metadata("600519"));
        let second = store.store(series_from_closes(&ramp(5)), metadata("000001"));

        assert_eq!(first, "data_1");
        assert_eq!(second, "data_2");
        assert_eq!(store.len(), 2);
        assert_eq!(store.ids(), &["data_1".to_string(), "data_2".to_string()]);
        assert_eq!(store.get("data_2").unwrap().series.len(), 5);
        assert_eq!(store.get("data_2").unwrap().metadata.symbol, "000001");
    }

    #[test]
    fn test_missing_id() {
        let store = DataStore::new();
        assert!(store.get("data_9").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_metadata_serialises_kind_as_type() {
        let value = serde_json::to_value(metadata("600519")).unwrap();
        assert_eq!(value["type"], "stock");
        assert!(!metadata("600519").has_display_name());
    }

    #[tokio::test]
    async fn test_shared_store() {
        let store = DataStore::shared();
        let id = store.lock().await.store(series_from_closes(&ramp(2)), metadata("510300"));
        assert!(store.lock().await.get(&id).is_some());
    }
}
