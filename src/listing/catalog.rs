use moka::sync::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::db::models::location::{BloodBank, Location};
use crate::store::{RecordStore, StoreResult};

const LOCATIONS_JSON: &str = include_str!("../data/locations.json");
const BLOOD_BANKS_JSON: &str = include_str!("../data/blood_banks.json");

/// Reference data compiled into the binary.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub locations: Vec<Location>,
    pub blood_banks: Vec<BloodBank>,
}

impl Catalog {
    pub fn embedded() -> Result<Self, serde_json::Error> {
        Ok(Catalog {
            locations: serde_json::from_str(LOCATIONS_JSON)?,
            blood_banks: serde_json::from_str(BLOOD_BANKS_JSON)?,
        })
    }
}

/// Static collection points followed by the ones registered in the store.
///
/// Store rows are cached for the configured TTL; a zero TTL disables the
/// cache and every call scans the table.
pub struct LocationDirectory {
    catalog: Catalog,
    cache: Option<Cache<(), Arc<Vec<Location>>>>,
}

impl LocationDirectory {
    pub fn new(catalog: Catalog, ttl: Duration) -> Self {
        let cache = (!ttl.is_zero()).then(|| Cache::builder().time_to_live(ttl).build());
        LocationDirectory { catalog, cache }
    }

    pub fn blood_banks(&self) -> &[BloodBank] {
        &self.catalog.blood_banks
    }

    pub async fn all_locations(&self, store: &dyn RecordStore) -> StoreResult<Vec<Location>> {
        let registered = self.registered(store).await?;
        let mut merged = Vec::with_capacity(self.catalog.locations.len() + registered.len());
        merged.extend(self.catalog.locations.iter().cloned());
        merged.extend(registered.iter().cloned());
        Ok(merged)
    }

    pub async fn find(&self, store: &dyn RecordStore, id: &str) -> StoreResult<Option<Location>> {
        if let Some(found) = self.catalog.locations.iter().find(|l| l.id == id) {
            return Ok(Some(found.clone()));
        }
        let registered = self.registered(store).await?;
        Ok(registered.iter().find(|l| l.id == id).cloned())
    }

    /// Drop cached store rows after a write through this service.
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate(&());
        }
    }

    async fn registered(&self, store: &dyn RecordStore) -> StoreResult<Arc<Vec<Location>>> {
        if let Some(hit) = self.cache.as_ref().and_then(|c| c.get(&())) {
            return Ok(hit);
        }

        let rows = store.list_locations().await?;
        tracing::debug!(count = rows.len(), backend = store.backend_tag(), "loaded registered locations");
        let mapped: Arc<Vec<Location>> = Arc::new(rows.into_iter().map(Location::from).collect());
        if let Some(cache) = &self.cache {
            cache.insert((), mapped.clone());
        }
        Ok(mapped)
    }
}
