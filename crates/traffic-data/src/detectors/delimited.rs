//! Comma-delimited tables with a header row.

use csv::{ReaderBuilder, Trim};
use traffic_core::models::{canonical_field_name, fields, FieldValue, Record};

use super::DetectorError;

/// Parse `lines` as one CSV document.
///
/// Any malformed row or field-count mismatch rejects the whole input. A
/// header needs at least two columns and no `key=value` cells, so a
/// single-column table such as `bytes\n100` is rejected here along with
/// every line-oriented log; it falls through to the other detectors.
pub fn parse(lines: &[&str]) -> Result<Vec<Record>, DetectorError> {
    let joined = lines.join("\n");
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(Trim::All)
        .from_reader(joined.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(canonical_field_name)
        .collect();
    if headers.len() < 2 {
        return Err(DetectorError::NarrowHeader(headers.len()));
    }
    if let Some(cell) = headers.iter().find(|h| h.contains('=')) {
        return Err(DetectorError::DataInHeader(cell.clone()));
    }

    let rename_time =
        headers.iter().any(|h| h == fields::TIME) && !headers.iter().any(|h| h == fields::TIMESTAMP);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut record: Record = headers
            .iter()
            .zip(row.iter())
            .map(|(name, cell)| {
                let value = if cell.is_empty() {
                    FieldValue::Null
                } else {
                    FieldValue::text(cell)
                };
                (name.as_str(), value)
            })
            .collect();
        if rename_time {
            record.rename(fields::TIME, fields::TIMESTAMP);
        }
        records.push(record);
    }
    Ok(records)
}
