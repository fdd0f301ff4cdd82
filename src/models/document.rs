use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// The shelter document persisted under a single store key.
///
/// The key sets of `food`, `medicine` and `alerts` are fixed at
/// initialization and never grow or shrink; only values change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelterDocument {
    pub food: BTreeMap<String, i64>,
    pub medicine: BTreeMap<String, i64>,
    pub alerts: BTreeMap<String, i64>,
    pub emergencies: Emergencies,
}

/// Last emergency broadcast and when it happened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Emergencies {
    pub last_event: String,
    pub date: String,
}

impl ShelterDocument {
    /// The document as it is seeded into the store at every startup.
    pub fn initial() -> Self {
        let food = BTreeMap::from([
            ("meat".to_string(), 100),
            ("vegetables".to_string(), 200),
            ("fruits".to_string(), 150),
            ("water".to_string(), 1000),
        ]);
        let medicine = BTreeMap::from([
            ("antibiotics".to_string(), 50),
            ("analgesics".to_string(), 100),
            ("bandages".to_string(), 100),
        ]);
        let alerts = BTreeMap::from([
            ("north_entry".to_string(), 0),
            ("east_entry".to_string(), 0),
            ("west_entry".to_string(), 0),
            ("south_entry".to_string(), 0),
        ]);
        Self {
            food,
            medicine,
            alerts,
            emergencies: Emergencies {
                last_event: "NULL".to_string(),
                date: "NULL".to_string(),
            },
        }
    }

    /// The `food` + `medicine` view served by `GET /supplies`.
    pub fn supplies_view(&self) -> Value {
        json!({
            "food": self.food,
            "medicine": self.medicine,
        })
    }

    /// The `alerts` + `emergencies` view served by `GET /alerts`.
    pub fn alerts_view(&self) -> Value {
        json!({
            "alerts": self.alerts,
            "emergencies": self.emergencies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_document_has_fixed_key_sets() {
        let doc = ShelterDocument::initial();
        assert_eq!(doc.food.len(), 4);
        assert_eq!(doc.medicine.len(), 3);
        assert_eq!(doc.alerts.len(), 4);
        assert_eq!(doc.emergencies.last_event, "NULL");
        assert_eq!(doc.emergencies.date, "NULL");
    }

    #[test]
    fn views_split_the_document_in_two() {
        let doc = ShelterDocument::initial();
        let supplies = doc.supplies_view();
        assert!(supplies.get("food").is_some());
        assert!(supplies.get("medicine").is_some());
        assert!(supplies.get("alerts").is_none());

        let alerts = doc.alerts_view();
        assert!(alerts.get("alerts").is_some());
        assert!(alerts.get("emergencies").is_some());
        assert!(alerts.get("food").is_none());
    }
}
