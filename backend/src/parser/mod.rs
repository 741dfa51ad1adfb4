//! CSV decoding and splitting for bulk uploads.
//!
//! Bytes are decoded with encoding auto-detection, then split into records by
//! the `csv` crate. Every record keeps the line it started on, counted from
//! the header line, so validation errors can point back into the source file.
//! Blank lines above the header do not shift the count. No schema logic lives
//! here.

use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{CsvError, CsvResult};

/// One record of the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvRecord {
    /// 1-based line number, header line is 1.
    pub line: usize,
    /// Raw field values, untrimmed.
    pub values: Vec<String>,
}

/// A decoded document split into its header line and the records below it.
#[derive(Debug, Clone)]
pub struct CsvDocument {
    /// Header cells as written in the file.
    pub headers: Vec<String>,
    /// Every record after the header line, blank lines skipped.
    pub records: Vec<CsvRecord>,
    /// Encoding the bytes were decoded with.
    pub encoding: String,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the given encoding.
///
/// Unknown encodings and invalid UTF-8 fall back to lossy UTF-8. A leading
/// byte order mark is dropped so spreadsheet exports keep a clean first header.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.into_owned()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Split comma-separated text into a [`CsvDocument`].
///
/// Quoting and escaping follow the `csv` crate. Records may be shorter or
/// longer than the header line; aligning them is the caller's job.
pub fn parse_document(content: &str, encoding: impl Into<String>) -> CsvResult<CsvDocument> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut headers: Option<Vec<String>> = None;
    let mut header_line = 1;
    let mut records = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        let record = result?;
        if is_blank(&record) {
            continue;
        }

        let physical = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(idx + 1);
        let values: Vec<String> = record.iter().map(str::to_string).collect();
        if headers.is_none() {
            headers = Some(values);
            header_line = physical;
            continue;
        }

        records.push(CsvRecord {
            line: physical - header_line + 1,
            values,
        });
    }

    Ok(CsvDocument {
        headers: headers.unwrap_or_default(),
        records,
        encoding: encoding.into(),
    })
}

/// Decode bytes with auto-detected encoding, then split them.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<CsvDocument> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    parse_document(&content, encoding)
}

/// Read and split a file from disk.
pub fn parse_csv_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<CsvDocument> {
    let bytes = std::fs::read(path.as_ref()).map_err(CsvError::IoError)?;
    parse_bytes_auto(&bytes)
}

/// A whitespace-only line comes back from the reader as a single blank field.
fn is_blank(record: &csv::StringRecord) -> bool {
    record.len() <= 1 && record.iter().all(|f| f.trim().is_empty())
}
