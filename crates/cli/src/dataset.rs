//! The fixed set of schools this tool loads.

use chrono::{TimeZone, Utc};

use rowseed_core::record::{ImportRecord, TargetTable};
use rowseed_core::types::Timestamp;

pub const SCHOOLS_TABLE: &str = "schools";
pub const SCHOOL_KEY_COLUMN: &str = "code";

pub fn schools_table() -> TargetTable {
    TargetTable::new(SCHOOLS_TABLE, SCHOOL_KEY_COLUMN)
}

/// 08:00 UTC on the given day. Only called with the literal dates below.
fn opened(year: i32, month: u32, day: u32) -> Timestamp {
    Utc.with_ymd_and_hms(year, month, day, 8, 0, 0)
        .single()
        .expect("valid opening date")
}

fn school(code: &str, name: &str, description: Option<&str>, region: &str, capacity: i32) -> ImportRecord {
    ImportRecord::new(code)
        .field("name", name)
        .field("description", description)
        .field("region", region)
        .field("capacity", capacity)
}

/// Schools in load order. Codes are unique.
pub fn school_records() -> Vec<ImportRecord> {
    vec![
        school("SCH-001", "Northfield Primary", Some("Primary school serving the northern suburbs"), "North", 420)
            .created_at(opened(1998, 9, 1)),
        school("SCH-002", "Riverside Secondary", Some("Secondary school with a maritime studies program"), "Central", 960)
            .created_at(opened(2003, 9, 1)),
        school("SCH-003", "Hillcrest Academy", Some("Selective-entry academy"), "East", 640),
        school("SCH-004", "Meadowbrook Primary", None, "South", 310),
        school("SCH-005", "Harbour View College", Some("Senior college, years 11 and 12"), "Coastal", 780)
            .created_at(opened(2011, 2, 1)),
        school("SCH-006", "Westgate Community School", Some("Combined primary and secondary campus"), "West", 1150),
        school("SCH-007", "Pine Ridge Primary", Some("Small rural primary school"), "North", 85),
        school("SCH-008", "Lakeside Secondary", None, "East", 870),
        school("SCH-009", "Summit Grammar", Some("Independent grammar school"), "Central", 720)
            .created_at(opened(1987, 2, 2)),
        school("SCH-010", "Bayside Special School", Some("Specialist provision for students with additional needs"), "Coastal", 120),
    ]
}

#[cfg(test)]
mod tests {
    use rowseed_core::validation::validate_records;

    use super::*;

    #[test]
    fn test_dataset_passes_validation() {
        assert!(validate_records(&schools_table(), &school_records()).is_ok());
    }

    #[test]
    fn test_dataset_shape() {
        let records = school_records();
        assert_eq!(records.len(), 10);
        for record in &records {
            assert!(record.natural_key.starts_with("SCH-"));
            for column in ["name", "description", "region", "capacity"] {
                assert!(record.get(column).is_some(), "{} missing {column}", record.natural_key);
            }
        }
    }

    #[test]
    fn test_created_at_overrides_are_fixed() {
        let overrides: Vec<(String, String)> = school_records()
            .into_iter()
            .filter_map(|r| Some((r.natural_key, r.created_at?.to_rfc3339())))
            .collect();

        assert_eq!(
            overrides,
            [
                ("SCH-001", "1998-09-01T08:00:00+00:00"),
                ("SCH-002", "2003-09-01T08:00:00+00:00"),
                ("SCH-005", "2011-02-01T08:00:00+00:00"),
                ("SCH-009", "1987-02-02T08:00:00+00:00"),
            ]
            .map(|(k, t)| (k.to_string(), t.to_string()))
        );
    }
}
