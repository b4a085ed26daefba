//! Canonical names, typed values and merged synonym columns.

use traffic_core::data_processors::Coercion;
use traffic_core::models::{canonical_field_name, fields, FieldValue, Record};

use crate::observer::{CoercionFailure, ParseObserver};

/// Output of [`normalize`].
#[derive(Debug, Default)]
pub struct Normalized {
    pub records: Vec<Record>,
    pub coercion_failures: Vec<CoercionFailure>,
}

fn coercion_for(field: &str) -> Option<Coercion> {
    if field == fields::TIMESTAMP {
        Some(Coercion::Timestamp)
    } else if field == fields::BYTES {
        Some(Coercion::Number)
    } else if fields::PORT_COLUMNS.contains(&field) {
        Some(Coercion::Integer)
    } else {
        None
    }
}

/// Normalize detector output. Records are never dropped; values that fail
/// coercion become null and are reported to `observer`.
pub fn normalize(records: Vec<Record>, observer: &dyn ParseObserver) -> Normalized {
    let mut out = Normalized {
        records: Vec::with_capacity(records.len()),
        coercion_failures: Vec::new(),
    };

    for (index, record) in records.into_iter().enumerate() {
        let mut record: Record = record
            .fields()
            .map(|(k, v)| (canonical_field_name(k), v.clone()))
            .collect();

        let keys: Vec<String> = record.keys().map(str::to_string).collect();
        for key in keys {
            let Some(coercion) = coercion_for(&key) else {
                continue;
            };
            let Some(value) = record.get_mut(&key) else {
                continue;
            };
            if let Some(converted) = coercion.apply(value) {
                *value = converted;
                continue;
            }
            let failure = CoercionFailure {
                record_index: index,
                field: key.clone(),
                raw: value.to_string(),
            };
            *value = FieldValue::Null;
            observer.coercion_failed(&failure);
            out.coercion_failures.push(failure);
        }

        merge_synonyms(&mut record);
        out.records.push(record);
    }
    out
}

/// Fold synonym columns into their canonical names.
///
/// A canonical field with a value wins; otherwise the synonym's value moves
/// into the canonical slot.
pub fn merge_synonyms(record: &mut Record) {
    for (synonym, canonical) in fields::SYNONYMS {
        if !record.contains(synonym) {
            continue;
        }
        if record.has_value(canonical) {
            record.remove(synonym);
        } else if record.contains(canonical) {
            if let Some(value) = record.remove(synonym) {
                record.insert(*canonical, value);
            }
        } else {
            record.rename(synonym, canonical);
        }
    }
}
