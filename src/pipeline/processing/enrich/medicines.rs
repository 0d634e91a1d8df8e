use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::constants::{APPOINTMENT_ID, MEDICINE_NAME_SEPARATOR};
use crate::domain::{AppointmentKey, Medicine, MedicineAggregate};
use crate::error::{PipelineError, Result};
use crate::pipeline::processing::flatten::lookup;

const MEDICINES_PATH: &str = "consultationData.medicines";

/// Aggregate one list of medicines.
pub fn aggregate_medicines(medicines: &[Medicine]) -> std::result::Result<MedicineAggregate, String> {
    let mut active_names = Vec::new();
    for (i, medicine) in medicines.iter().filter(|m| m.is_active).enumerate() {
        match &medicine.medicine_name {
            Some(name) => active_names.push(name.as_str()),
            None => return Err(format!("active medicine #{i} has no medicineName")),
        }
    }

    Ok(MedicineAggregate {
        no_of_medicines: medicines.len(),
        no_of_active_medicines: active_names.len(),
        no_of_inactive_medicines: medicines.len() - active_names.len(),
        medicine_names: active_names.join(MEDICINE_NAME_SEPARATOR),
    })
}

/// Appointment identifier to medicine aggregate, in first-seen order.
///
/// Keys are typed rather than text so `"7"` and `7` stay separate entries.
#[derive(Debug, Clone, Default)]
pub struct MedicineIndex {
    entries: Vec<(AppointmentKey, MedicineAggregate)>,
    positions: HashMap<AppointmentKey, usize>,
}

impl MedicineIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an aggregate. A repeated identifier overwrites the earlier
    /// value but keeps its original position.
    pub fn insert(&mut self, key: AppointmentKey, aggregate: MedicineAggregate) {
        match self.positions.get(&key) {
            Some(&pos) => self.entries[pos].1 = aggregate,
            None => {
                self.positions.insert(key.clone(), self.entries.len());
                self.entries.push((key, aggregate));
            }
        }
    }

    pub fn get(&self, key: &AppointmentKey) -> Option<&MedicineAggregate> {
        self.positions.get(key).map(|&pos| &self.entries[pos].1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&AppointmentKey, &MedicineAggregate)> {
        self.entries.iter().map(|(key, aggregate)| (key, aggregate))
    }

    /// The whole index as a JSON object keyed by identifier text.
    pub fn to_json(&self) -> Result<Value> {
        let mut map = Map::new();
        for (key, aggregate) in self.iter() {
            map.insert(key.to_string(), serde_json::to_value(aggregate)?);
        }
        Ok(Value::Object(map))
    }
}

fn describe_appointment(item: &Value) -> String {
    lookup(item, APPOINTMENT_ID)
        .and_then(AppointmentKey::from_value)
        .map(|key| key.to_string())
        .unwrap_or_else(|| "<unknown>".to_string())
}

/// Key and aggregate for one source appointment.
///
/// Unlike the flattener this requires `appointmentId` and
/// `consultationData.medicines` to be present. An explicit `null` id is a
/// valid key.
pub fn aggregate_appointment(item: &Value) -> Result<(AppointmentKey, MedicineAggregate)> {
    let appointment = describe_appointment(item);

    let raw_id = lookup(item, APPOINTMENT_ID).ok_or_else(|| PipelineError::MissingField {
        field: APPOINTMENT_ID.to_string(),
        appointment: appointment.clone(),
    })?;
    let key = AppointmentKey::from_value(raw_id).ok_or_else(|| PipelineError::MalformedRecord {
        appointment: appointment.clone(),
        message: format!("{APPOINTMENT_ID} must be a string, number or null, got {raw_id}"),
    })?;

    let raw_medicines = lookup(item, MEDICINES_PATH).ok_or_else(|| PipelineError::MissingField {
        field: MEDICINES_PATH.to_string(),
        appointment: appointment.clone(),
    })?;

    let medicines: Vec<Medicine> =
        serde_json::from_value(raw_medicines.clone()).map_err(|e| PipelineError::MalformedRecord {
            appointment: appointment.clone(),
            message: format!("{MEDICINES_PATH}: {e}"),
        })?;

    let aggregate = aggregate_medicines(&medicines).map_err(|message| {
        PipelineError::MalformedRecord {
            appointment,
            message,
        }
    })?;

    Ok((key, aggregate))
}
