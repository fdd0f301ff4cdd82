use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use crate::db::KvStore;
use crate::error::StoreError;
use crate::models::document::ShelterDocument;

/// Store key of the single shelter document record.
const DOCUMENT_KEY: &str = "data";

/// Serialized access to the persisted shelter document.
///
/// The store itself only offers put/get/delete, so every read-modify-write
/// cycle holds this service's lock for its full duration; callers never see
/// a half-applied mutation.
pub struct SupplyService {
    store: Mutex<KvStore>,
}

impl SupplyService {
    /// Wrap a store and seed the initial document into it.
    pub fn new(store: KvStore) -> Result<Self, StoreError> {
        let initial = serde_json::to_string(&ShelterDocument::initial())?;
        store.put(DOCUMENT_KEY, &initial)?;
        Ok(Self {
            store: Mutex::new(store),
        })
    }

    /// Set a supply field to `amount`.
    ///
    /// The field is looked up in `food` first, then `medicine`. Returns
    /// `Ok(false)` when it is in neither section; the document is left
    /// untouched in that case.
    pub async fn modify_supplies(&self, field: &str, amount: i64) -> Result<bool, StoreError> {
        let store = self.store.lock().await;
        let mut doc = load(&store)?;

        if let Some(value) = doc.food.get_mut(field) {
            *value = amount;
        } else if let Some(value) = doc.medicine.get_mut(field) {
            *value = amount;
        } else {
            return Ok(false);
        }

        persist(&store, &doc)?;
        Ok(true)
    }

    /// Apply an alert or emergency mutation.
    ///
    /// A known alert entry increments its counter by 1 (the passed value is
    /// ignored); a known emergency field is overwritten with `value`.
    /// Unknown fields are silently ignored in both directions.
    pub async fn modify_alerts_and_emergencies(
        &self,
        field: &str,
        value: &Value,
    ) -> Result<(), StoreError> {
        let store = self.store.lock().await;
        let mut doc = load(&store)?;

        if let Some(counter) = doc.alerts.get_mut(field) {
            *counter += 1;
        } else if field == "last_event" {
            doc.emergencies.last_event = value_as_string(value);
        } else if field == "date" {
            doc.emergencies.date = value_as_string(value);
        } else {
            debug!("ignoring unknown alert/emergency field: {field}");
            return Ok(());
        }

        persist(&store, &doc)
    }

    /// The `food` + `medicine` sections, for `GET /supplies`.
    pub async fn supplies_snapshot(&self) -> Result<Value, StoreError> {
        let store = self.store.lock().await;
        Ok(load(&store)?.supplies_view())
    }

    /// The `alerts` + `emergencies` sections, for `GET /alerts`.
    pub async fn alerts_snapshot(&self) -> Result<Value, StoreError> {
        let store = self.store.lock().await;
        Ok(load(&store)?.alerts_view())
    }
}

fn load(store: &KvStore) -> Result<ShelterDocument, StoreError> {
    // The document is seeded at startup, so a missing record means the
    // store was tampered with out-of-band; surface it as corruption.
    let raw = store.get(DOCUMENT_KEY)?.unwrap_or_default();
    Ok(serde_json::from_str(&raw)?)
}

fn persist(store: &KvStore, doc: &ShelterDocument) -> Result<(), StoreError> {
    store.put(DOCUMENT_KEY, &serde_json::to_string(doc)?)
}

fn value_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
