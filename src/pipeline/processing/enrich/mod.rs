use chrono::{Local, NaiveDate};
use metrics::counter;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::config::RecordErrorPolicy;
use crate::constants::*;
use crate::domain::{AppointmentKey, FlatRecord};
use crate::error::{PipelineError, Result};

pub mod age;
pub mod gender;
pub mod medicines;
pub mod phone;

pub use age::calculate_age;
pub use gender::normalize_gender;
pub use medicines::{aggregate_appointment, aggregate_medicines, MedicineIndex};
pub use phone::{is_valid_mobile, phone_number_hash};

/// Output of the enrichment stage.
#[derive(Debug, Clone)]
pub struct EnrichedBatch {
    /// Fully enriched rows, in input order
    pub records: Vec<FlatRecord>,
    /// Medicine aggregates built from the source appointments
    pub medicine_index: MedicineIndex,
    /// Record-level failures skipped under the `skip` policy
    pub skipped: Vec<String>,
}

/// Trait for adding derived columns to flattened appointment rows
pub trait Enricher {
    /// Enrich `records` (flattened from `appointments`, same order).
    fn enrich(&self, appointments: &[Value], records: Vec<FlatRecord>) -> Result<EnrichedBatch>;
}

/// Derives gender, DOB, full name, phone hash, age and medicine columns.
#[derive(Debug, Clone)]
pub struct DefaultEnricher {
    /// Date ages are computed against
    pub as_of: NaiveDate,
    pub policy: RecordErrorPolicy,
}

impl Default for DefaultEnricher {
    fn default() -> Self {
        Self {
            as_of: Local::now().date_naive(),
            policy: RecordErrorPolicy::Abort,
        }
    }
}

impl DefaultEnricher {
    pub fn new(policy: RecordErrorPolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Pin the reference date used for ages.
    pub fn with_as_of(mut self, as_of: NaiveDate) -> Self {
        self.as_of = as_of;
        self
    }

    /// Abort on the error, or record it and continue, per policy.
    fn handle(&self, err: PipelineError, skipped: &mut Vec<String>) -> Result<()> {
        if self.policy == RecordErrorPolicy::Abort || !err.is_record_level() {
            return Err(err);
        }
        warn!("Skipping derivation: {}", err);
        counter!("appointment_export_record_errors_total").increment(1);
        skipped.push(err.to_string());
        Ok(())
    }

    /// Per-row derivations that need nothing but the row itself.
    fn derive_columns(&self, record: &mut FlatRecord, skipped: &mut Vec<String>) -> Result<()> {
        let gender = normalize_gender(record.get(PATIENT_GENDER));
        record.insert(PATIENT_GENDER, gender.as_str());

        record.rename(BIRTH_DATE, DOB);

        let full_name = format!(
            "{} {}",
            name_part(record.get(FIRST_NAME)),
            name_part(record.get(LAST_NAME))
        );
        record.insert(FULL_NAME, full_name);

        let hash = scalar_text(record.get(PHONE_NUMBER)).and_then(|phone| {
            let hash = phone_number_hash(&phone);
            if hash.is_none() {
                debug!(phone_number = %phone, "Invalid mobile number, hash left empty");
                counter!("appointment_export_invalid_phone_total").increment(1);
            }
            hash
        });
        record.insert_opt(PHONE_NUMBER_HASH, hash);

        let age = match record.get(DOB) {
            None => Ok(None),
            Some(Value::String(dob)) => calculate_age(Some(dob.as_str()), self.as_of),
            Some(other) => Err(PipelineError::InvalidDate {
                value: other.to_string(),
                reason: "birth date is not a string".to_string(),
            }),
        };
        match age {
            Ok(age) => record.insert_opt(AGE, age),
            Err(e) => {
                self.handle(e, skipped)?;
                record.insert(AGE, Value::Null);
            }
        }
        Ok(())
    }

    /// Aggregate medicines over the source appointments.
    pub fn build_medicine_index(
        &self,
        appointments: &[Value],
        skipped: &mut Vec<String>,
    ) -> Result<MedicineIndex> {
        let mut index = MedicineIndex::new();
        for item in appointments {
            match aggregate_appointment(item) {
                Ok((key, aggregate)) => index.insert(key, aggregate),
                Err(e) => self.handle(e, skipped)?,
            }
        }
        Ok(index)
    }
}

/// Attach aggregate columns to a row, or null them out when the row's
/// appointment has no aggregate.
pub fn join_medicines(record: &mut FlatRecord, index: &MedicineIndex) {
    let aggregate = record
        .get_raw(APPOINTMENT_ID)
        .and_then(AppointmentKey::from_value)
        .and_then(|key| index.get(&key));

    match aggregate {
        Some(aggregate) => {
            record.insert(NO_OF_MEDICINES, aggregate.no_of_medicines);
            record.insert(NO_OF_ACTIVE_MEDICINES, aggregate.no_of_active_medicines);
            record.insert(NO_OF_INACTIVE_MEDICINES, aggregate.no_of_inactive_medicines);
            record.insert(MEDICINE_NAMES, aggregate.medicine_names.clone());
            let age = record.get(AGE).cloned().unwrap_or(Value::Null);
            record.insert(AGE, age);
            let gender = record.get(PATIENT_GENDER).cloned().unwrap_or(Value::Null);
            record.insert(GENDER, gender);
        }
        None => {
            for column in [
                NO_OF_MEDICINES,
                NO_OF_ACTIVE_MEDICINES,
                NO_OF_INACTIVE_MEDICINES,
                MEDICINE_NAMES,
                AGE,
                GENDER,
            ] {
                record.insert(column, Value::Null);
            }
        }
    }
}

impl Enricher for DefaultEnricher {
    #[instrument(skip_all, fields(records = records.len(), as_of = %self.as_of))]
    fn enrich(&self, appointments: &[Value], mut records: Vec<FlatRecord>) -> Result<EnrichedBatch> {
        let mut skipped = Vec::new();

        for record in records.iter_mut() {
            self.derive_columns(record, &mut skipped)?;
        }

        let medicine_index = self.build_medicine_index(appointments, &mut skipped)?;
        info!(
            "Aggregated medicines for {} of {} appointments",
            medicine_index.len(),
            appointments.len()
        );

        for record in records.iter_mut() {
            join_medicines(record, &medicine_index);
        }

        counter!("appointment_export_records_total").increment(records.len() as u64);
        Ok(EnrichedBatch {
            records,
            medicine_index,
            skipped,
        })
    }
}

/// A name as it appears in `fullName`; null is spelled `None`.
fn name_part(value: Option<&Value>) -> String {
    match value {
        None => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "True".to_string(),
        Some(Value::Bool(false)) => "False".to_string(),
        Some(other) => other.to_string(),
    }
}

fn scalar_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
