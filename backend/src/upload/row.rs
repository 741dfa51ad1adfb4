//! Rows and cells of a bulk upload.
//!
//! A [`Cell`] is one column of one registration line. It keeps the raw text
//! untouched and parses it at most once: the outcome and any problems are
//! cached on first use, so the raw echo, the parsed echo and validation can
//! all ask for it without re-running lookups or logging twice.

use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::UploadError;
use crate::fields::{FieldContext, FieldKind, ParseOutcome, Problem, Problems};
use crate::schema::{SchemaRegistry, ValidationRule};

/// Machine-actionable location of a cell problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub header: String,
    /// 0-based column of the header.
    pub column_index: usize,
    /// Source line, header line is 1.
    pub row_index: usize,
    pub missing: bool,
    pub invalid: bool,
}

impl ErrorRecord {
    fn new(problem: Problem, header: &str, column_index: usize, row_index: usize) -> Self {
        Self {
            header: header.to_string(),
            column_index,
            row_index,
            missing: problem == Problem::Missing,
            invalid: problem == Problem::Invalid,
        }
    }
}

#[derive(Debug)]
struct ParsedCell {
    outcome: ParseOutcome,
    errors: Vec<ErrorRecord>,
}

#[derive(Debug)]
pub struct Cell {
    header: String,
    raw: String,
    column_index: usize,
    row_index: usize,
    kind: FieldKind,
    rule: Arc<ValidationRule>,
    parsed: OnceCell<ParsedCell>,
}

impl Cell {
    pub fn new(
        header: impl Into<String>,
        raw: impl Into<String>,
        column_index: usize,
        row_index: usize,
        rule: Arc<ValidationRule>,
    ) -> Self {
        let header = header.into();
        Self {
            kind: FieldKind::for_header(&header),
            header,
            raw: raw.into(),
            column_index,
            row_index,
            rule,
            parsed: OnceCell::new(),
        }
    }

    pub fn header(&self) -> &str {
        &self.header
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn rule(&self) -> &ValidationRule {
        &self.rule
    }

    pub fn is_metadata(&self) -> bool {
        self.kind.is_metadata()
    }

    /// The cell text exactly as read.
    pub fn get_raw_value(&self) -> &str {
        &self.raw
    }

    /// Parse once; later calls return the cached outcome.
    pub fn parse(&self, ctx: &FieldContext<'_>) -> &ParseOutcome {
        &self.parsed_cell(ctx).outcome
    }

    /// Run validation, caching the outcome.
    pub fn validate(&self, ctx: &FieldContext<'_>) {
        self.parsed_cell(ctx);
    }

    /// Problems found so far; empty until the cell has been parsed.
    pub fn errors(&self) -> &[ErrorRecord] {
        self.parsed.get().map(|p| p.errors.as_slice()).unwrap_or(&[])
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed.get().is_some()
    }

    /// `{header: parsed value}` as a single-entry JSON object.
    pub fn to_json(&self, ctx: &FieldContext<'_>) -> Value {
        let mut map = Map::new();
        map.insert(self.header.clone(), self.parse(ctx).to_json());
        Value::Object(map)
    }

    fn parsed_cell(&self, ctx: &FieldContext<'_>) -> &ParsedCell {
        self.parsed.get_or_init(|| {
            let mut problems = Problems::new();
            let outcome = self.kind.parse(&self.raw, &self.rule, ctx, &mut problems);
            let errors = problems
                .iter()
                .map(|p| ErrorRecord::new(p, &self.header, self.column_index, self.row_index))
                .collect();
            ParsedCell { outcome, errors }
        })
    }
}

/// Parsed view of a row, split by field family.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedRow {
    pub metadata: Map<String, Value>,
    pub registration_responses: Map<String, Value>,
}

/// One registration line, cells in header order.
#[derive(Debug)]
pub struct Row {
    row_index: usize,
    cells: Vec<Cell>,
}

impl Row {
    /// Build a row from lowercase headers and the line's values.
    ///
    /// Short lines are padded with empty cells and extra values are ignored.
    /// A header with no rule in `registry` is an upload-level error.
    pub fn new(
        row_index: usize,
        headers: &[String],
        values: &[String],
        registry: &SchemaRegistry,
    ) -> Result<Self, UploadError> {
        let cells = headers
            .iter()
            .enumerate()
            .map(|(column_index, header)| -> Result<Cell, UploadError> {
                let rule = registry.rule(header).ok_or_else(|| UploadError::UnknownHeaders {
                    unknown: vec![header.clone()],
                })?;
                let raw = values.get(column_index).map(String::as_str).unwrap_or("");
                Ok(Cell::new(header.as_str(), raw, column_index, row_index, Arc::clone(rule)))
            })
            .collect::<Result<Vec<_>, UploadError>>()?;

        Ok(Self { row_index, cells })
    }

    pub fn row_index(&self) -> usize {
        self.row_index
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn validate(&self, ctx: &FieldContext<'_>) {
        for cell in &self.cells {
            cell.validate(ctx);
        }
    }

    /// Problems of every parsed cell, in column order.
    pub fn errors(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.cells.iter().flat_map(|cell| cell.errors().iter())
    }

    /// Raw cell values joined with `,` in header order.
    pub fn get_raw_value(&self) -> String {
        self.cells
            .iter()
            .map(Cell::get_raw_value)
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn get_metadata(&self, ctx: &FieldContext<'_>) -> Map<String, Value> {
        self.collect(ctx, true)
    }

    pub fn get_registration_responses(&self, ctx: &FieldContext<'_>) -> Map<String, Value> {
        self.collect(ctx, false)
    }

    pub fn get_parsed_value(&self, ctx: &FieldContext<'_>) -> ParsedRow {
        ParsedRow {
            metadata: self.get_metadata(ctx),
            registration_responses: self.get_registration_responses(ctx),
        }
    }

    /// Every header → parsed value in one flat object.
    pub fn to_json(&self, ctx: &FieldContext<'_>) -> Value {
        let map = self
            .cells
            .iter()
            .map(|cell| (cell.header.clone(), cell.parse(ctx).to_json()))
            .collect();
        Value::Object(map)
    }

    fn collect(&self, ctx: &FieldContext<'_>, metadata: bool) -> Map<String, Value> {
        self.cells
            .iter()
            .filter(|cell| cell.is_metadata() == metadata)
            .map(|cell| (cell.header.clone(), cell.parse(ctx).to_json()))
            .collect()
    }
}
