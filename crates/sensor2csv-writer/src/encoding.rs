//! Row rendering for each sink format.

use std::borrow::Cow;

use sensor2csv_core::{Record, TableSchema};

use crate::error::{Result, WriterError};

/// One JSON object per line, every field of the record.
pub fn encode_json_lines(sink: &str, records: &[&Record]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(records.len() * 256);
    for record in records {
        serde_json::to_writer(&mut out, record)
            .map_err(|e| WriterError::encoding_failure(sink, e))?;
        out.push(b'\n');
    }
    Ok(out)
}

pub fn encode_csv_header(schema: &TableSchema) -> Result<Vec<u8>> {
    let mut writer = csv_writer();
    writer
        .write_record(schema.columns)
        .map_err(|e| WriterError::encoding_failure(schema.name, e))?;
    finish(schema.name, writer)
}

/// Project each record onto the schema's columns, in column order.
///
/// Fields outside the schema are ignored; missing or null fields become
/// empty cells so later columns never shift.
pub fn encode_csv_rows(schema: &TableSchema, records: &[&Record]) -> Result<Vec<u8>> {
    let mut writer = csv_writer();
    let mut row: Vec<Cow<'_, str>> = Vec::with_capacity(schema.columns.len());

    for record in records {
        row.clear();
        row.extend(
            schema
                .columns
                .iter()
                .map(|col| record.get(col).map(|v| v.render()).unwrap_or_default()),
        );
        writer
            .write_record(row.iter().map(|cell| cell.as_bytes()))
            .map_err(|e| WriterError::encoding_failure(schema.name, e))?;
    }

    finish(schema.name, writer)
}

fn csv_writer() -> csv::Writer<Vec<u8>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new())
}

fn finish(sink: &str, writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| WriterError::encoding_failure(sink, e.error()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensor2csv_core::{validate, ANALOG, ENVIRONMENTAL};

    #[test]
    fn header_is_column_list() {
        let header = encode_csv_header(&ANALOG).unwrap();
        assert_eq!(
            String::from_utf8(header).unwrap(),
            "timestamp,device_id,sequence,uptime,mq135,anemometer,rssi,snr\n"
        );
    }

    #[test]
    fn missing_fields_render_empty_without_shifting() {
        let record = validate(
            br#"{"device_id": 4, "sequence": 10, "anemometer": 301, "extra": "ignored"}"#,
        )
        .unwrap();
        let bytes = encode_csv_rows(&ANALOG, &[&record]).unwrap();
        let line = String::from_utf8(bytes).unwrap();

        let expected = format!("{},4,10,,,301,,\n", record.timestamp());
        assert_eq!(line, expected);
        assert!(!line.contains("ignored"));
    }

    #[test]
    fn text_cells_are_quoted_when_needed() {
        let record =
            validate(br#"{"temperature": 21.5, "iaq_label": "Good, stable", "stabilized": true}"#)
                .unwrap();
        let bytes = encode_csv_rows(&ENVIRONMENTAL, &[&record]).unwrap();

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes.as_slice());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(row.len(), ENVIRONMENTAL.columns.len());
        assert_eq!(&row[4], "21.5");
        assert_eq!(&row[9], "Good, stable");
        assert_eq!(&row[14], "true");
    }

    #[test]
    fn json_lines_keep_every_field() {
        let a = validate(br#"{"sequence": 1, "custom": "x"}"#).unwrap();
        let b = validate(br#"{"sequence": 2, "mq135": 77}"#).unwrap();
        let bytes = encode_json_lines("raw", &[&a, &b]).unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["custom"], "x");
        assert_eq!(lines[1]["mq135"], 77);
        assert!(text.ends_with('\n'));
    }
}
