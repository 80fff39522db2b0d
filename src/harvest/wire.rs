use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::table::{Cell, Column, ColumnKind, Table, TableError};

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];
const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"];

/// Column-oriented JSON shape tables travel in between this service and homeharvest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTable {
    pub columns: Vec<Column>,
    #[serde(default)]
    pub data: Vec<Vec<Value>>,
}

impl WireTable {
    pub fn from_table(table: &Table) -> Self {
        Self {
            columns: table.columns().to_vec(),
            data: table
                .cell_rows()
                .iter()
                .map(|cells| cells.iter().map(Cell::to_json).collect())
                .collect(),
        }
    }

    pub fn into_table(self) -> Result<Table, TableError> {
        let mut table = Table::new(self.columns.clone());
        for row in self.data {
            if row.len() != self.columns.len() {
                return Err(TableError::RowWidth {
                    expected: self.columns.len(),
                    found: row.len(),
                });
            }
            let cells = self
                .columns
                .iter()
                .zip(row)
                .map(|(column, value)| decode_cell(column, value))
                .collect::<Result<Vec<_>, _>>()?;
            table.push_row(cells)?;
        }
        Ok(table)
    }
}

fn decode_cell(column: &Column, value: Value) -> Result<Cell, TableError> {
    let cell = match (column.kind, value) {
        (ColumnKind::Float, Value::Null) => Cell::Float(f64::NAN),
        (ColumnKind::DateTime, Value::Null) => Cell::Timestamp(None),
        (_, Value::Null) => Cell::Null,
        (ColumnKind::Bool, Value::Bool(b)) => Cell::Bool(b),
        (ColumnKind::Int, Value::Number(n)) if n.is_i64() => Cell::from_json(&Value::Number(n)),
        (ColumnKind::Float, Value::Number(n)) => match n.as_f64() {
            Some(v) => Cell::Float(v),
            None => return Err(cell_error(column, Value::Number(n))),
        },
        (ColumnKind::Float, Value::String(s)) if s == "NaN" => Cell::Float(f64::NAN),
        (ColumnKind::Text, Value::String(s)) => Cell::Text(s),
        (ColumnKind::DateTime, Value::String(s)) => match parse_timestamp(&s) {
            Some(ts) => Cell::Timestamp(Some(ts)),
            None if s == "NaT" => Cell::Timestamp(None),
            None => return Err(cell_error(column, Value::String(s))),
        },
        (ColumnKind::Object, other) => Cell::from_json(&other),
        (_, other) => return Err(cell_error(column, other)),
    };
    Ok(cell)
}

/// Offset-aware values keep their wall-clock time; the offset is dropped.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .or_else(|| {
                    OFFSET_FORMATS
                        .iter()
                        .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
                })
                .map(|ts| ts.naive_local())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn cell_error(column: &Column, value: Value) -> TableError {
    TableError::Cell {
        column: column.name.clone(),
        kind: column.kind,
        value: value.to_string(),
    }
}
