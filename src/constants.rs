/// Column and file name constants shared by the pipeline stages.
/// Source columns keep their dotted path as the column name.

// Source field paths
pub const APPOINTMENT_ID: &str = "appointmentId";
pub const PHONE_NUMBER: &str = "phoneNumber";
pub const FIRST_NAME: &str = "patientDetails.firstName";
pub const LAST_NAME: &str = "patientDetails.lastName";
pub const PATIENT_GENDER: &str = "patientDetails.gender";
pub const BIRTH_DATE: &str = "patientDetails.birthDate";

// Derived columns
pub const DOB: &str = "DOB";
pub const FULL_NAME: &str = "fullName";
pub const PHONE_NUMBER_HASH: &str = "phoneNumberHash";
pub const AGE: &str = "Age";
pub const NO_OF_MEDICINES: &str = "noOfMedicines";
pub const NO_OF_ACTIVE_MEDICINES: &str = "noOfActiveMedicines";
pub const NO_OF_INACTIVE_MEDICINES: &str = "noOfInactiveMedicines";
pub const MEDICINE_NAMES: &str = "medicineNames";
pub const GENDER: &str = "gender";

/// Paths projected out of every appointment, in output column order.
pub const DEFAULT_FIELD_PATHS: [&str; 6] = [
    APPOINTMENT_ID,
    PHONE_NUMBER,
    FIRST_NAME,
    LAST_NAME,
    PATIENT_GENDER,
    BIRTH_DATE,
];

// Default file names used when neither config nor CLI override them
pub const DEFAULT_INPUT_FILE: &str = "DataEngineeringQ2.json";
pub const DEFAULT_TABLE_FILE: &str = "output.csv";
pub const DEFAULT_AGGREGATES_FILE: &str = "aggregated_data.json";
pub const DEFAULT_CHART_FILE: &str = "gender_distribution.svg";
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_DELIMITER: char = '—';

/// Environment variable that points at an alternative config file
pub const CONFIG_ENV_VAR: &str = "APPOINTMENT_EXPORT_CONFIG";

/// Country code prefixed to a valid 10-digit mobile number before hashing
pub const PHONE_COUNTRY_CODE: &str = "91";
pub const PHONE_MIN: u64 = 6_000_000_000;
pub const PHONE_MAX: u64 = 9_999_999_999;

/// Separator between active medicine names in the aggregate
pub const MEDICINE_NAME_SEPARATOR: &str = ", ";
