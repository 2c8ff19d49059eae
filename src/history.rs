use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::Method;
use crate::error::{HistoryError, RecordError};
use crate::model::entity::Id;
use crate::model::history::AssignmentRecord;

#[derive(Debug, Deserialize)]
struct RawRecord {
    date: Option<String>,
    groups: Option<Vec<Vec<Id>>>,
    method_used: Option<String>,
    lambda_value: Option<f64>,
    participants_count: Option<usize>,
}

/// Accepts `2024-05-01T18:30:00[.ffffff]`, RFC 3339 with an offset
/// (converted to UTC), or a bare `2024-05-01` (midnight).
pub fn parse_timestamp(s: &str) -> Result<NaiveDateTime, RecordError> {
    let s = s.trim();
    if let Ok(ts) = s.parse::<NaiveDateTime>() {
        return Ok(ts);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Ok(ts.naive_utc());
    }
    s.parse::<NaiveDate>()
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| RecordError::InvalidTimestamp(s.to_owned()))
}

pub fn parse_record(value: &Value) -> Result<AssignmentRecord, RecordError> {
    let raw = RawRecord::deserialize(value).map_err(|e| RecordError::Malformed(e.to_string()))?;
    let date = raw.date.ok_or(RecordError::MissingTimestamp)?;
    let groups = raw.groups.ok_or(RecordError::MissingGroups)?;
    let mut record = AssignmentRecord::new(parse_timestamp(&date)?, groups)?;
    record.method_used = raw.method_used.and_then(|m| m.parse::<Method>().ok());
    record.lambda_value = raw.lambda_value;
    record.participants_count = raw.participants_count;
    Ok(record)
}

pub fn parse_history(json: &str) -> Result<Vec<AssignmentRecord>, HistoryError> {
    let value: Value = serde_json::from_str(json)?;
    let Value::Array(entries) = value else {
        return Err(HistoryError::NotAnArray);
    };
    Ok(records_from(&entries))
}

pub fn records_from(entries: &[Value]) -> Vec<AssignmentRecord> {
    let mut records: Vec<AssignmentRecord> = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match parse_record(entry) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(index, error = %err, "skipping history entry");
                None
            }
        })
        .collect();
    records.sort_by_key(|r| r.timestamp);
    debug!(entries = entries.len(), kept = records.len(), "history loaded");
    records
}
