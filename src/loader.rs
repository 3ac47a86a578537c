use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::info;

use crate::error::AtlasError;

/// Splits one delimited record. Fields may be wrapped in the quote
/// character; inside a quoted field the separator is literal and a doubled
/// quote stands for one quote.
fn split_record(line: &str, separator: char, quote: char) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            if c == quote {
                if chars.peek() == Some(&quote) {
                    current.push(quote);
                    chars.next();
                } else {
                    quoted = false;
                }
            } else {
                current.push(c);
            }
        } else if c == quote {
            quoted = true;
        } else if c == separator {
            fields.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    fields.push(current);
    fields
}

fn read_lines<P: AsRef<Path>>(path: P) -> Result<Vec<String>, AtlasError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut lines = Vec::new();
    for line in reader.lines() {
        lines.push(line?);
    }
    Ok(lines)
}

fn header_index(
    header: &[String],
    field: &str,
    path: &Path,
) -> Result<usize, AtlasError> {
    header.iter().position(|h| h == field).ok_or_else(|| {
        AtlasError::MissingField {
            path: path.to_path_buf(),
            field: field.to_string(),
        }
    })
}

/// Field at `idx`, empty when the row is shorter than the header.
fn field_at(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

/// Flat form: one `key_field` → `value_field` entry per data row,
/// last row wins on duplicate keys.
pub fn load_flat<P: AsRef<Path>>(
    path: P,
    key_field: &str,
    value_field: &str,
    separator: char,
    quote: char,
) -> Result<BTreeMap<String, String>, AtlasError> {
    let path = path.as_ref();
    let lines = read_lines(path)?;
    let mut rows = lines.iter();
    let header_line = rows.next().ok_or_else(|| AtlasError::EmptySource {
        path: path.to_path_buf(),
    })?;
    let header = split_record(header_line, separator, quote);
    let key_idx = header_index(&header, key_field, path)?;
    let value_idx = header_index(&header, value_field, path)?;

    let mut result = BTreeMap::new();
    for line in rows.filter(|l| !l.is_empty()) {
        let row = split_record(line, separator, quote);
        result.insert(
            field_at(&row, key_idx).to_string(),
            field_at(&row, value_idx).to_string(),
        );
    }
    info!(path = %path.display(), entries = result.len(), "loaded flat table");
    Ok(result)
}

/// Nested form: `key_field` → full row (field name → field value),
/// last row wins on duplicate keys.
pub fn load_nested<P: AsRef<Path>>(
    path: P,
    key_field: &str,
    separator: char,
    quote: char,
) -> Result<BTreeMap<String, BTreeMap<String, String>>, AtlasError> {
    let path = path.as_ref();
    let lines = read_lines(path)?;
    let mut rows = lines.iter();
    let header_line = rows.next().ok_or_else(|| AtlasError::EmptySource {
        path: path.to_path_buf(),
    })?;
    let header = split_record(header_line, separator, quote);
    let key_idx = header_index(&header, key_field, path)?;

    let mut result = BTreeMap::new();
    for line in rows.filter(|l| !l.is_empty()) {
        let row = split_record(line, separator, quote);
        let mut fields = BTreeMap::new();
        for (i, name) in header.iter().enumerate() {
            fields.insert(name.clone(), field_at(&row, i).to_string());
        }
        result.insert(field_at(&row, key_idx).to_string(), fields);
    }
    info!(path = %path.display(), entries = result.len(), "loaded nested table");
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f
    }

    #[test]
    fn split_plain_fields() {
        assert_eq!(split_record("a,b,c", ',', '"'), vec!["a", "b", "c"]);
    }

    #[test]
    fn split_quoted_separator_and_doubled_quote() {
        assert_eq!(
            split_record(r#""Korea, Rep.",KOR,"say ""hi""""#, ',', '"'),
            vec!["Korea, Rep.", "KOR", r#"say "hi""#]
        );
    }

    #[test]
    fn split_keeps_empty_fields() {
        assert_eq!(split_record("a,,c,", ',', '"'), vec!["a", "", "c", ""]);
    }

    #[test]
    fn flat_maps_key_to_value() {
        let f = csv_file("code,name\nFR,France\nDE,Germany\n");
        let map = load_flat(f.path(), "code", "name", ',', '"').unwrap();
        assert_eq!(map.get("FR").unwrap(), "France");
        assert_eq!(map.get("DE").unwrap(), "Germany");
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn flat_duplicate_key_last_row_wins() {
        let f = csv_file("code,name\nFR,First\nFR,Second\n");
        let map = load_flat(f.path(), "code", "name", ',', '"').unwrap();
        assert_eq!(map.get("FR").unwrap(), "Second");
    }

    #[test]
    fn flat_unknown_field_is_fatal() {
        let f = csv_file("code,name\nFR,France\n");
        let err = load_flat(f.path(), "code", "nope", ',', '"').unwrap_err();
        assert!(matches!(err, AtlasError::MissingField { field, .. } if field == "nope"));
    }

    #[test]
    fn empty_source_is_fatal() {
        let f = csv_file("");
        let err = load_flat(f.path(), "a", "b", ',', '"').unwrap_err();
        assert!(matches!(err, AtlasError::EmptySource { .. }));
    }

    #[test]
    fn nested_keeps_full_row() {
        let f = csv_file("name,1960,1961\nFrance,100,\n");
        let map = load_nested(f.path(), "name", ',', '"').unwrap();
        let row = map.get("France").unwrap();
        assert_eq!(row.get("1960").unwrap(), "100");
        assert_eq!(row.get("1961").unwrap(), "");
        assert_eq!(row.get("name").unwrap(), "France");
    }

    #[test]
    fn nested_short_row_pads_with_empty() {
        let f = csv_file("name,1960,1961\nFrance,100\n");
        let map = load_nested(f.path(), "name", ',', '"').unwrap();
        assert_eq!(map.get("France").unwrap().get("1961").unwrap(), "");
    }

    #[test]
    fn alternate_separator_and_quote() {
        let f = csv_file("code;name\nFR;'Fra;nce'\n");
        let map = load_flat(f.path(), "code", "name", ';', '\'').unwrap();
        assert_eq!(map.get("FR").unwrap(), "Fra;nce");
    }
}
