//! Value vectors in and out of headered CSV tables.
//!
//! Input tables only need a header naming the value column; other columns are
//! ignored. Output tables carry one row per target cell:
//! `target_index,label,value`. Fields containing commas, quotes or line
//! breaks are quoted on write and unquoted on read.

use crate::mesh_error::MeshRegridError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Header of tables written by [`write_target_values`].
pub const TARGET_VALUES_HEADER: &str = "target_index,label,value";

/// Strip the blank and NUL padding that fixed-width attribute exports leave
/// around a field.
fn clean_field(raw: &str) -> &str {
    raw.trim_matches(|c: char| c == '\0' || c.is_whitespace())
}

/// Split one CSV record, honouring `"..."` quoting with `""` escapes.
///
/// Returns `None` while a quoted field is still open at the end of `record`,
/// i.e. the field continues on the next line.
fn split_fields(record: &str) -> Option<Vec<String>> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = record.chars().peekable();
    while let Some(c) = chars.next() {
        match (quoted, c) {
            (true, '"') if chars.peek() == Some(&'"') => {
                chars.next();
                field.push('"');
            }
            (true, '"') => quoted = false,
            (true, _) => field.push(c),
            (false, '"') => quoted = true,
            (false, ',') => fields.push(std::mem::take(&mut field)),
            (false, _) => field.push(c),
        }
    }
    if quoted {
        return None;
    }
    fields.push(field);
    Some(fields)
}

/// Iterate complete records with the 1-based line each one starts on.
fn records<R: Read>(
    reader: R,
) -> impl Iterator<Item = Result<(usize, Vec<String>), MeshRegridError>> {
    let mut lines = BufReader::new(reader).lines().enumerate();
    std::iter::from_fn(move || {
        let (i, first) = lines.next()?;
        let mut record = match first {
            Ok(line) => line,
            Err(e) => return Some(Err(e.into())),
        };
        loop {
            if let Some(fields) = split_fields(&record) {
                return Some(Ok((i + 1, fields)));
            }
            match lines.next() {
                Some((_, Ok(more))) => {
                    record.push('\n');
                    record.push_str(&more);
                }
                Some((_, Err(e))) => return Some(Err(e.into())),
                None => {
                    return Some(Err(MeshRegridError::ValueParse {
                        line: i + 1,
                        message: "unterminated quoted field".into(),
                    }));
                }
            }
        }
    })
}

/// Read the numeric column named `column`, one value per data row.
pub fn read_values<R: Read>(reader: R, column: &str) -> Result<Vec<f64>, MeshRegridError> {
    let mut records = records(reader);
    let (_, header) = records.next().ok_or(MeshRegridError::MissingHeader)??;
    let position = header
        .iter()
        .position(|name| clean_field(name) == column)
        .ok_or_else(|| MeshRegridError::MissingColumn(column.to_string()))?;

    let mut values = Vec::new();
    for record in records {
        let (line_no, fields) = record?;
        if fields.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let raw = fields.get(position).ok_or_else(|| MeshRegridError::ValueParse {
            line: line_no,
            message: format!("row has no `{column}` field"),
        })?;
        let cleaned = clean_field(raw);
        let value = cleaned
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| MeshRegridError::ValueParse {
                line: line_no,
                message: format!("`{cleaned}` is not a finite number"),
            })?;
        values.push(value);
    }
    Ok(values)
}

fn quote_label(label: &str) -> String {
    if label.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", label.replace('"', "\"\""))
    } else {
        label.to_string()
    }
}

/// Write aggregated target values, optionally labelled.
///
/// Targets beyond the end of `labels` get an empty label.
pub fn write_target_values<W: Write>(
    writer: W,
    values: &[f64],
    labels: Option<&[String]>,
) -> Result<(), MeshRegridError> {
    let mut out = BufWriter::new(writer);
    writeln!(out, "{TARGET_VALUES_HEADER}")?;
    for (i, value) in values.iter().enumerate() {
        let label = labels
            .and_then(|l| l.get(i))
            .map(|l| quote_label(l))
            .unwrap_or_default();
        writeln!(out, "{i},{label},{value}")?;
    }
    out.flush()?;
    Ok(())
}

pub fn read_values_file(path: impl AsRef<Path>, column: &str) -> Result<Vec<f64>, MeshRegridError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| MeshRegridError::from(e).in_file(path))?;
    read_values(file, column).map_err(|e| e.in_file(path))
}

pub fn write_target_values_file(
    path: impl AsRef<Path>,
    values: &[f64],
    labels: Option<&[String]>,
) -> Result<(), MeshRegridError> {
    let path = path.as_ref();
    let file = File::create(path).map_err(|e| MeshRegridError::from(e).in_file(path))?;
    write_target_values(file, values, labels).map_err(|e| e.in_file(path))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_named_column_and_trims_padding() {
        let text = "fid,TotalPopD,name\n1, 12.5 ,a\n2,3\0\0\0,b\n\n";
        let values = read_values(text.as_bytes(), "TotalPopD").unwrap();
        assert_eq!(values, vec![12.5, 3.0]);
    }

    #[test]
    fn missing_column_is_reported() {
        assert_eq!(
            read_values("a,b\n1,2\n".as_bytes(), "c"),
            Err(MeshRegridError::MissingColumn("c".into()))
        );
    }

    #[test]
    fn bad_value_is_fatal() {
        let err = read_values("v\n1\nnope\n".as_bytes(), "v").unwrap_err();
        assert!(matches!(err, MeshRegridError::ValueParse { line: 3, .. }), "{err}");
        let err = read_values("v\ninf\n".as_bytes(), "v").unwrap_err();
        assert!(matches!(err, MeshRegridError::ValueParse { line: 2, .. }));
    }

    #[test]
    fn short_row_is_fatal() {
        let err = read_values("a,v\n1\n".as_bytes(), "v").unwrap_err();
        assert!(matches!(err, MeshRegridError::ValueParse { line: 2, .. }));
    }

    #[test]
    fn writes_labels_with_quoting() {
        let labels = vec!["France".to_string(), "Korea, Republic of".to_string()];
        let mut buf = Vec::new();
        write_target_values(&mut buf, &[1.5, 2.0, 0.0], Some(&labels)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "target_index,label,value\n0,France,1.5\n1,\"Korea, Republic of\",2\n2,,0\n"
        );
    }

    #[test]
    fn writes_without_labels() {
        let mut buf = Vec::new();
        write_target_values(&mut buf, &[0.25], None).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "target_index,label,value\n0,,0.25\n");
    }

    #[test]
    fn inner_whitespace_is_not_a_number() {
        let err = read_values("v\n1 000\n".as_bytes(), "v").unwrap_err();
        assert_eq!(
            err,
            MeshRegridError::ValueParse {
                line: 2,
                message: "`1 000` is not a finite number".into()
            }
        );
    }

    #[test]
    fn quoted_fields_are_honoured() {
        let text = "name,v\n\"a, \"\"b\"\"\",2.5\n\"1,5\",7\n";
        assert_eq!(read_values(text.as_bytes(), "v").unwrap(), vec![2.5, 7.0]);
        assert_eq!(
            split_fields("\"a, \"\"b\"\"\",2.5"),
            Some(vec!["a, \"b\"".to_string(), "2.5".to_string()])
        );
    }

    #[test]
    fn written_tables_read_back() {
        let labels = vec![
            "Korea, Republic of".to_string(),
            "1,5".to_string(),
            "say \"hi\"".to_string(),
            "two\nlines".to_string(),
        ];
        let values = [42.0, 0.5, 3.25, 8.0];
        let mut buf = Vec::new();
        write_target_values(&mut buf, &values, Some(&labels)).unwrap();
        assert_eq!(read_values(buf.as_slice(), "value").unwrap(), values.to_vec());
        assert_eq!(
            read_values(buf.as_slice(), "target_index").unwrap(),
            vec![0.0, 1.0, 2.0, 3.0]
        );
    }

    #[test]
    fn unterminated_quote_is_fatal() {
        let err = read_values("name,v\n\"open,1\n".as_bytes(), "v").unwrap_err();
        assert!(matches!(err, MeshRegridError::ValueParse { line: 2, .. }), "{err}");
    }
}
