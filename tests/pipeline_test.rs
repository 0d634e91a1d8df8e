use anyhow::Result;
use appointment_export::config::{Config, RecordErrorPolicy};
use appointment_export::{Pipeline, PipelineError};
use chrono::NaiveDate;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn sample_appointments() -> Value {
    json!([
        {
            "appointmentId": "apt-001",
            "phoneNumber": "98765 43210",
            "patientDetails": {
                "firstName": "Asha",
                "lastName": "Verma",
                "gender": "F",
                "birthDate": "2000-06-15T00:00:00.000Z"
            },
            "consultationData": {"medicines": [
                {"medicineName": "A", "isActive": true},
                {"medicineName": "B", "isActive": false},
                {"medicineName": "C", "isActive": true}
            ]}
        },
        {
            "appointmentId": "apt-002",
            "phoneNumber": "12345",
            "patientDetails": {
                "firstName": null,
                "lastName": "Singh",
                "gender": "M",
                "birthDate": null
            },
            "consultationData": {"medicines": []}
        },
        {
            "appointmentId": 3,
            "phoneNumber": "7000000000",
            "consultationData": {"medicines": [
                {"medicineName": "Zinc", "isActive": false}
            ]}
        }
    ])
}

fn write_input(dir: &Path, data: &Value) -> Result<()> {
    fs::write(dir.join("DataEngineeringQ2.json"), serde_json::to_string(data)?)?;
    Ok(())
}

fn config_for(dir: &Path) -> Config {
    let mut config = Config::default();
    config.input.path = dir.join("DataEngineeringQ2.json");
    config.output.dir = dir.join("out");
    config
}

fn pinned(config: Config) -> Result<Pipeline> {
    Ok(Pipeline::new(config)?.with_as_of(NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()))
}

fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

#[test]
fn test_full_run_writes_all_outputs() -> Result<()> {
    let temp_dir = tempdir()?;
    write_input(temp_dir.path(), &sample_appointments())?;

    let result = pinned(config_for(temp_dir.path()))?.run()?;
    assert_eq!(result.rows_written, 3);
    assert!(result.skipped.is_empty());

    let table = fs::read_to_string(&result.table_file)?;
    let lines: Vec<&str> = table.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "appointmentId—phoneNumber—patientDetails.firstName—patientDetails.lastName—\
         patientDetails.gender—DOB—fullName—phoneNumberHash—Age—noOfMedicines—\
         noOfActiveMedicines—noOfInactiveMedicines—medicineNames—gender"
    );

    let first: Vec<&str> = lines[1].split('—').collect();
    assert_eq!(first[0], "apt-001");
    assert_eq!(first[4], "female");
    assert_eq!(first[6], "Asha Verma");
    assert_eq!(first[7], sha256_hex("919876543210"));
    assert_eq!(first[8], "23");
    assert_eq!(&first[9..], &["3", "2", "1", "A, C", "female"]);

    let second: Vec<&str> = lines[2].split('—').collect();
    assert_eq!(second[6], "None Singh");
    assert_eq!(second[7], "");
    assert_eq!(second[8], "");
    assert_eq!(second[13], "male");

    let third: Vec<&str> = lines[3].split('—').collect();
    assert_eq!(third[0], "3");
    assert_eq!(third[4], "others");
    assert_eq!(third[6], "None None");
    assert_eq!(third[7], sha256_hex("917000000000"));
    assert_eq!(&third[9..], &["1", "0", "1", "", "others"]);

    let aggregates: Value = serde_json::from_str(&fs::read_to_string(&result.aggregates_file)?)?;
    let ids: Vec<&String> = aggregates.as_object().unwrap().keys().collect();
    assert_eq!(ids, vec!["apt-001", "apt-002", "3"]);
    assert_eq!(aggregates["apt-001"]["medicineNames"], "A, C");

    let chart = fs::read_to_string(result.chart_file.as_ref().unwrap())?;
    assert!(chart.contains("Number of Appointments by Gender"));
    assert_eq!(chart.matches("<path").count(), 3);
    Ok(())
}

#[test]
fn test_every_appointment_appears_once_in_input_order() -> Result<()> {
    let temp_dir = tempdir()?;
    let data: Vec<Value> = (0..25)
        .map(|i| {
            json!({
                "appointmentId": format!("id-{i:02}"),
                "phoneNumber": format!("9{:09}", i),
                "patientDetails": {"firstName": "P", "lastName": format!("{i}"), "gender": "M"},
                "consultationData": {"medicines": []}
            })
        })
        .collect();
    write_input(temp_dir.path(), &Value::Array(data))?;

    let mut config = config_for(temp_dir.path());
    config.output.chart_enabled = false;
    let result = pinned(config)?.run()?;
    assert!(result.chart_file.is_none());

    let table = fs::read_to_string(&result.table_file)?;
    let ids: Vec<&str> = table
        .lines()
        .skip(1)
        .map(|line| line.split('—').next().unwrap())
        .collect();
    let expected: Vec<String> = (0..25).map(|i| format!("id-{i:02}")).collect();
    assert_eq!(ids, expected);
    Ok(())
}

#[test]
fn test_missing_input_aborts_without_outputs() -> Result<()> {
    let temp_dir = tempdir()?;
    let config = config_for(temp_dir.path());

    let err = pinned(config)?.run().unwrap_err();
    assert!(matches!(err, PipelineError::Io { .. }));
    assert!(!temp_dir.path().join("out").join("output.csv").exists());
    Ok(())
}

#[test]
fn test_abort_policy_stops_on_missing_medicines() -> Result<()> {
    let temp_dir = tempdir()?;
    let mut data = sample_appointments();
    data[1].as_object_mut().unwrap().remove("consultationData");
    write_input(temp_dir.path(), &data)?;

    let err = pinned(config_for(temp_dir.path()))?.run().unwrap_err();
    assert!(matches!(err, PipelineError::MissingField { .. }));
    assert!(!temp_dir.path().join("out").join("output.csv").exists());
    Ok(())
}

#[test]
fn test_skip_policy_keeps_every_row() -> Result<()> {
    let temp_dir = tempdir()?;
    let mut data = sample_appointments();
    data[0]["patientDetails"]["birthDate"] = json!("15/06/2000");
    data[1].as_object_mut().unwrap().remove("consultationData");
    write_input(temp_dir.path(), &data)?;

    let mut config = config_for(temp_dir.path());
    config.pipeline.on_record_error = RecordErrorPolicy::Skip;
    let result = pinned(config)?.run()?;

    assert_eq!(result.rows_written, 3);
    assert_eq!(result.aggregates_written, 2);
    assert_eq!(result.skipped.len(), 2);

    let table = fs::read_to_string(&result.table_file)?;
    let rows: Vec<Vec<&str>> = table.lines().skip(1).map(|l| l.split('—').collect()).collect();
    // unparseable date: Age empty, aggregates still joined
    assert_eq!(rows[0][8], "");
    assert_eq!(rows[0][9], "3");
    // no aggregate: join columns and gender empty
    assert_eq!(&rows[1][8..], &["", "", "", "", "", ""]);
    assert_eq!(rows[1][4], "male");
    Ok(())
}

#[test]
fn test_custom_delimiter_from_toml() -> Result<()> {
    let temp_dir = tempdir()?;
    write_input(temp_dir.path(), &sample_appointments())?;

    let toml = format!(
        "[input]\npath = {:?}\n\n[output]\ndir = {:?}\ndelimiter = \"|\"\nchart_enabled = false\n",
        temp_dir.path().join("DataEngineeringQ2.json"),
        temp_dir.path().join("out"),
    );
    let config = Config::from_toml_str(&toml)?;
    let result = pinned(config)?.run()?;

    let table = fs::read_to_string(&result.table_file)?;
    assert!(table.starts_with("appointmentId|phoneNumber|"));
    assert!(table.contains("|A, C|"));
    Ok(())
}
