//! record: плоские записи свойств (`name, property, value`).
//!
//! Источник: вывод `zfs get -H -p -o name,property,value ...`, по строке на
//! запись, поля через TAB. Если в строке есть четвёртая колонка (source): она
//! игнорируется. Значение "-" означает «не задано» и хранится как None.
//!
//! Сбор таблиц с хоста (ssh, zfs get) сюда не входит: модуль только разбирает
//! уже полученный текст.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::consts::{ABSENT_VALUE, SNAPSHOT_SEP};
use crate::error::RecordError;
use crate::metrics::{record_records_ingested, record_records_skipped};

/// One `(entity, property, value)` triple.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyRecord {
    pub name: String,
    pub property: String,
    pub value: Option<String>,
}

impl PropertyRecord {
    /// Build a record; "-" is normalized to an absent value.
    pub fn new(name: impl Into<String>, property: impl Into<String>, value: &str) -> Self {
        Self {
            name: name.into(),
            property: property.into(),
            value: normalize_value(value),
        }
    }

    /// True for `dataset@label` names.
    #[inline]
    pub fn is_snapshot(&self) -> bool {
        self.name.contains(SNAPSHOT_SEP)
    }
}

#[inline]
fn normalize_value(v: &str) -> Option<String> {
    if v == ABSENT_VALUE {
        None
    } else {
        Some(v.to_string())
    }
}

/// Parse a single dump line. `line_no` is 1-based and only used in errors.
pub fn parse_line(line: &str, line_no: usize) -> Result<PropertyRecord, RecordError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 3 {
        return Err(RecordError::ShortLine {
            line: line_no,
            fields: fields.len(),
        });
    }
    Ok(PropertyRecord::new(fields[0], fields[1], fields[2]))
}

/// Parse a whole dump. Empty lines are skipped silently, short lines are
/// returned as warnings.
pub fn parse_dump(text: &str) -> (Vec<PropertyRecord>, Vec<RecordError>) {
    let mut records = Vec::new();
    let mut warnings = Vec::new();

    for (i, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        match parse_line(line, i + 1) {
            Ok(r) => records.push(r),
            Err(e) => {
                warn!("skip record: {e}");
                warnings.push(e);
            }
        }
    }

    record_records_ingested(records.len() as u64);
    record_records_skipped(warnings.len() as u64);
    debug!(
        "parse_dump: {} record(s), {} skipped",
        records.len(),
        warnings.len()
    );
    (records, warnings)
}

/// Split records into (dataset records, snapshot records).
pub fn split_records(records: Vec<PropertyRecord>) -> (Vec<PropertyRecord>, Vec<PropertyRecord>) {
    records.into_iter().partition(|r| !r.is_snapshot())
}
