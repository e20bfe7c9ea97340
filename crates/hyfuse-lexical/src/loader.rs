//! Line-delimited JSON corpus loading.
//!
//! Each line holds one record. The id is read from `id` (falling back to
//! `chunk_id`), the body from `full_text` (falling back to `text`), and the
//! optional `metadata` object is carried through untouched. Malformed records
//! are logged and skipped; only a corpus with no valid record is fatal.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use hyfuse_core::{Corpus, DocId, Document, HyfuseError, Metadata, Result};
use serde_json::Value;
use tracing::{info, warn};

/// Outcome of a corpus load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Records accepted into the corpus.
    pub accepted: usize,
    /// Records skipped as malformed or duplicate.
    pub skipped: usize,
}

/// Load a corpus from a JSONL file.
pub fn load_jsonl_path(path: impl AsRef<Path>) -> Result<(Corpus, LoadReport)> {
    let path = path.as_ref();
    info!("Loading corpus from {:?}", path);
    let file = File::open(path)?;
    load_jsonl(BufReader::new(file))
}

/// Load a corpus from JSONL records.
pub fn load_jsonl<R: BufRead>(reader: R) -> Result<(Corpus, LoadReport)> {
    let mut corpus = Corpus::new();
    let mut report = LoadReport::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let outcome = parse_record(line_no, &line).and_then(|doc| {
            let id = doc.id.clone();
            corpus
                .push(doc)
                .map(|_| ())
                .ok_or_else(|| HyfuseError::corpus_load(line_no, format!("duplicate id {}", id)))
        });

        match outcome {
            Ok(()) => report.accepted += 1,
            Err(e) if e.is_recoverable() => {
                warn!(code = e.error_code(), "Skipping record: {}", e);
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    if corpus.is_empty() {
        return Err(HyfuseError::EmptyCorpus);
    }

    info!(
        "Corpus loaded: {} accepted, {} skipped",
        report.accepted, report.skipped
    );

    Ok((corpus, report))
}

fn parse_record(line_no: usize, line: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| HyfuseError::corpus_load(line_no, format!("invalid JSON: {}", e)))?;
    let Value::Object(record) = value else {
        return Err(HyfuseError::corpus_load(line_no, "record is not an object"));
    };

    // An unusable `id` (e.g. "") still falls back to `chunk_id`.
    let id = match present(&record, "id").and_then(DocId::from_json) {
        Some(id) => id,
        None => {
            let raw_id = present(&record, "chunk_id")
                .or_else(|| present(&record, "id"))
                .ok_or_else(|| HyfuseError::corpus_load(line_no, "missing id"))?;
            DocId::from_json(raw_id).ok_or_else(|| {
                HyfuseError::corpus_load(line_no, format!("invalid id {}", raw_id))
            })?
        }
    };

    let text = extract_text(&record)
        .ok_or_else(|| HyfuseError::corpus_load(line_no, "missing text"))?;

    let metadata = match present(&record, "metadata") {
        None => Metadata::new(),
        Some(Value::Object(map)) => map.clone(),
        Some(_) => {
            return Err(HyfuseError::corpus_load(line_no, "metadata is not an object"));
        }
    };

    Ok(Document {
        id,
        text,
        metadata,
    })
}

/// A field that exists and is not `null`.
fn present<'a>(record: &'a Metadata, key: &str) -> Option<&'a Value> {
    record.get(key).filter(|v| !v.is_null())
}

/// Prefer a non-empty `full_text`, then `text`, then an empty `full_text`.
fn extract_text(record: &Metadata) -> Option<String> {
    let full_text = record.get("full_text").and_then(Value::as_str);
    let text = record.get("text").and_then(Value::as_str);

    match (full_text, text) {
        (Some(f), _) if !f.is_empty() => Some(f.to_string()),
        (_, Some(t)) => Some(t.to_string()),
        (Some(f), None) => Some(f.to_string()),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn load(input: &str) -> Result<(Corpus, LoadReport)> {
        load_jsonl(Cursor::new(input.to_string()))
    }

    #[test]
    fn test_load_valid_records() {
        let input = r#"{"id": "11666886", "full_text": "Low beams too bright", "metadata": {"vehicle_year": 2021}}
{"id": "abc", "text": "Brake pedal soft"}
"#;
        let (corpus, report) = load(input).unwrap();

        assert_eq!(report, LoadReport { accepted: 2, skipped: 0 });
        let first = corpus.document(&DocId::Int(11666886)).unwrap();
        assert_eq!(first.text, "Low beams too bright");
        assert_eq!(first.metadata["vehicle_year"], 2021);
        assert_eq!(corpus.document(&DocId::from("abc")).unwrap().text, "Brake pedal soft");
    }

    #[test]
    fn test_fallback_fields() {
        let input = r#"{"chunk_id": 7, "full_text": "", "text": "engine stall"}"#;
        let (corpus, _) = load(input).unwrap();
        let doc = corpus.get(0).unwrap();
        assert_eq!(doc.id, DocId::Int(7));
        assert_eq!(doc.text, "engine stall");
    }

    #[test]
    fn test_unusable_id_falls_back_to_chunk_id() {
        let input = r#"{"id": "", "chunk_id": 42, "full_text": "wipers stop mid sweep"}
{"id": null, "chunk_id": "c-9", "text": "door ajar chime"}
{"id": "", "full_text": "no usable id"}
"#;
        let (corpus, report) = load(input).unwrap();

        assert_eq!(report, LoadReport { accepted: 2, skipped: 1 });
        assert_eq!(corpus.get(0).unwrap().id, DocId::Int(42));
        assert_eq!(corpus.get(1).unwrap().id, DocId::from("c-9"));
    }

    #[test]
    fn test_malformed_records_skipped() {
        let input = r#"{"id": 1, "full_text": "airbag warning light"}
not json at all
{"full_text": "no id here"}
{"id": 2}
{"id": 3, "text": "fine", "metadata": "oops"}
{"id": 1, "full_text": "duplicate"}
["array"]

{"id": 4, "text": "seat belt latch"}
"#;
        let (corpus, report) = load(input).unwrap();

        assert_eq!(report, LoadReport { accepted: 2, skipped: 6 });
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get(0).unwrap().text, "airbag warning light");
        assert_eq!(corpus.get(1).unwrap().id, DocId::Int(4));
    }

    #[test]
    fn test_zero_valid_records_is_fatal() {
        let err = load("{\"id\": 1}\n\n{}\n").unwrap_err();
        assert!(matches!(err, HyfuseError::EmptyCorpus));

        let err = load("").unwrap_err();
        assert!(matches!(err, HyfuseError::EmptyCorpus));
    }

    #[test]
    fn test_parse_record_reports_line() {
        let err = parse_record(12, r#"{"text": "x"}"#).unwrap_err();
        match err {
            HyfuseError::CorpusLoad { line, reason } => {
                assert_eq!(line, 12);
                assert_eq!(reason, "missing id");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"id": 10, "full_text": "steering wheel locked"}}"#).unwrap();
        writeln!(file, r#"{{"id": 11, "full_text": "fuel leak"}}"#).unwrap();

        let (corpus, report) = load_jsonl_path(file.path()).unwrap();
        assert_eq!(report.accepted, 2);
        assert_eq!(corpus.position(&DocId::Int(11)), Some(1));
    }

    #[test]
    fn test_missing_file() {
        let err = load_jsonl_path("/nonexistent/corpus.jsonl").unwrap_err();
        assert_eq!(err.error_code(), "IO_ERROR");
    }
}
