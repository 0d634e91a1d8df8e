use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One flattened, progressively enriched output row.
///
/// Keys keep insertion order: source paths first, derived columns appended
/// as each enrichment step adds them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlatRecord {
    fields: Map<String, Value>,
}

impl FlatRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `key`, with absent and JSON null both reported as `None`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    /// Value for `key` with JSON null kept as a value.
    pub fn get_raw(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Insert or overwrite. Overwriting keeps the column's position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    pub fn insert_opt<T: Into<Value>>(&mut self, key: impl Into<String>, value: Option<T>) {
        self.insert(key, value.map_or(Value::Null, Into::into));
    }

    /// Move `from` to the end of the record under the name `to`.
    pub fn rename(&mut self, from: &str, to: &str) {
        let value = self.fields.shift_remove(from).unwrap_or(Value::Null);
        self.fields.insert(to.to_string(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Appointment identifier used to join aggregates back onto rows.
///
/// Strings and numbers are kept apart so `"7"` and `7` never collide. An
/// explicit `null` id is a key of its own.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AppointmentKey {
    Text(String),
    Number(String),
    Null,
}

impl AppointmentKey {
    /// Key for an id value; booleans, arrays and objects have none.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(AppointmentKey::Text(s.clone())),
            Value::Number(n) => Some(AppointmentKey::Number(n.to_string())),
            Value::Null => Some(AppointmentKey::Null),
            _ => None,
        }
    }
}

impl fmt::Display for AppointmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentKey::Text(s) | AppointmentKey::Number(s) => f.write_str(s),
            AppointmentKey::Null => f.write_str("null"),
        }
    }
}

/// A prescribed medicine inside `consultationData.medicines`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Medicine {
    #[serde(rename = "medicineName", default)]
    pub medicine_name: Option<String>,
    /// Any falsy JSON value (`null`, `0`, `""`, `[]`, `{}`) counts as inactive
    #[serde(rename = "isActive", deserialize_with = "truthy")]
    pub is_active: bool,
}

fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    })
}

/// Medicine counts for a single appointment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MedicineAggregate {
    #[serde(rename = "noOfMedicines")]
    pub no_of_medicines: usize,
    #[serde(rename = "noOfActiveMedicines")]
    pub no_of_active_medicines: usize,
    #[serde(rename = "noOfInactiveMedicines")]
    pub no_of_inactive_medicines: usize,
    /// Active medicine names in prescription order, joined with ", "
    #[serde(rename = "medicineNames")]
    pub medicine_names: String,
}

/// Normalized patient gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Others,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Others => "others",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rename_moves_field_to_end() {
        let mut record = FlatRecord::new();
        record.insert("a", 1);
        record.insert("birth", "2000-01-01");
        record.insert("c", 3);

        record.rename("birth", "DOB");

        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["a", "c", "DOB"]);
        assert_eq!(record.get_str("DOB"), Some("2000-01-01"));
        assert!(!record.contains_key("birth"));
    }

    #[test]
    fn test_overwrite_keeps_position() {
        let mut record = FlatRecord::new();
        record.insert("Age", 30);
        record.insert("other", true);
        record.insert("Age", 31);

        let keys: Vec<&str> = record.keys().collect();
        assert_eq!(keys, vec!["Age", "other"]);
        assert_eq!(record.get("Age"), Some(&json!(31)));
    }

    #[test]
    fn test_appointment_key_distinguishes_string_and_number() {
        let text = AppointmentKey::from_value(&json!("7")).unwrap();
        let number = AppointmentKey::from_value(&json!(7)).unwrap();
        assert_ne!(text, number);
        assert_eq!(text.to_string(), number.to_string());
        assert_eq!(AppointmentKey::from_value(&Value::Null), Some(AppointmentKey::Null));
        assert!(AppointmentKey::from_value(&json!(true)).is_none());
    }

    #[test]
    fn test_is_active_uses_truthiness() {
        let medicines: Vec<Medicine> = serde_json::from_value(json!([
            {"medicineName": "A", "isActive": 1},
            {"medicineName": "B", "isActive": null},
            {"medicineName": "C", "isActive": 0},
            {"medicineName": "D", "isActive": "yes"},
            {"medicineName": "E", "isActive": false}
        ]))
        .unwrap();

        let active: Vec<bool> = medicines.iter().map(|m| m.is_active).collect();
        assert_eq!(active, vec![true, false, false, true, false]);
    }

    #[test]
    fn test_is_active_is_still_required() {
        let result: serde_json::Result<Medicine> = serde_json::from_value(json!({"medicineName": "A"}));
        assert!(result.is_err());
    }
}
