use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Rendering used for every timestamp that leaves the service
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Error)]
pub enum TableError {
    #[error("record {index} is not a JSON object")]
    NotARecord { index: usize },

    #[error("row has {found} cells but the table has {expected} columns")]
    RowWidth { expected: usize, found: usize },

    #[error("column `{column}` ({kind:?}) cannot hold value {value}")]
    Cell {
        column: String,
        kind: ColumnKind,
        value: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Bool,
    Int,
    Float,
    Text,
    DateTime,
    Object,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A single loosely-typed value in a scraped table.
///
/// `Float(NaN)` and `Timestamp(None)` are the missing-value sentinels of
/// numeric and datetime columns; neither is representable in JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(Option<NaiveDateTime>),
    Json(Value),
}

impl Cell {
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Cell::Null,
            Value::Bool(b) => Cell::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(v) => Cell::Int(v),
                None => n.as_f64().map_or(Cell::Null, Cell::Float),
            },
            Value::String(s) => Cell::Text(s.clone()),
            other => Cell::Json(other.clone()),
        }
    }

    /// Renders the cell as JSON, turning every sentinel into `null`.
    pub fn to_json(&self) -> Value {
        match self {
            Cell::Null | Cell::Timestamp(None) => Value::Null,
            Cell::Bool(b) => Value::Bool(*b),
            Cell::Int(v) => Value::from(*v),
            Cell::Float(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
            Cell::Text(s) => Value::String(s.clone()),
            Cell::Timestamp(Some(ts)) => Value::String(ts.format(TIMESTAMP_FORMAT).to_string()),
            Cell::Json(v) => v.clone(),
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            Cell::Null | Cell::Timestamp(None) | Cell::Json(Value::Null) => true,
            Cell::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    /// Strictly numeric view used by aggregates; text is never coerced here.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) if !v.is_nan() => Some(*v),
            _ => None,
        }
    }

    /// Equality that never matches a missing value, not even another one.
    pub fn same_value(&self, other: &Cell) -> bool {
        !self.is_missing() && self == other
    }

    fn natural_kind(&self) -> ColumnKind {
        match self {
            Cell::Bool(_) => ColumnKind::Bool,
            Cell::Int(_) => ColumnKind::Int,
            Cell::Float(_) => ColumnKind::Float,
            Cell::Text(_) => ColumnKind::Text,
            Cell::Timestamp(_) => ColumnKind::DateTime,
            Cell::Null | Cell::Json(_) => ColumnKind::Object,
        }
    }
}

/// Lenient conversion out of a [`Cell`]. A failed conversion is `None`, never an error.
pub trait FromCell: Sized {
    fn from_cell(cell: &Cell) -> Option<Self>;
}

impl FromCell for f64 {
    fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Int(v) => Some(*v as f64),
            Cell::Float(v) if !v.is_nan() => Some(*v),
            Cell::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Cell::Text(s) => s.trim().parse::<f64>().ok().filter(|v| !v.is_nan()),
            _ => None,
        }
    }
}

impl FromCell for i64 {
    fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Int(v) => Some(*v),
            Cell::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            Cell::Bool(b) => Some(i64::from(*b)),
            Cell::Text(s) => s.trim().parse::<i64>().ok(),
            _ => None,
        }
    }
}

impl FromCell for String {
    fn from_cell(cell: &Cell) -> Option<Self> {
        match cell {
            Cell::Text(s) => Some(s.clone()),
            _ => None,
        }
    }
}

/// Borrowed view of one table row, addressed by column name.
#[derive(Debug, Clone, Copy)]
pub struct RowView<'a> {
    columns: &'a [Column],
    cells: &'a [Cell],
}

impl<'a> RowView<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Cell> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .and_then(|i| self.cells.get(i))
    }

    /// The cell under `name`, or `default` when the column is absent or the value missing.
    pub fn value_or(&self, name: &str, default: Cell) -> Cell {
        match self.get(name) {
            Some(cell) if !cell.is_missing() => cell.clone(),
            _ => default,
        }
    }

    pub fn read<T: FromCell>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(T::from_cell)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Builds a table from JSON objects. Columns are the union of keys in
    /// first-seen order; kinds are inferred from the non-missing values.
    pub fn from_records(records: &[Value]) -> Result<Self, TableError> {
        let mut objects = Vec::with_capacity(records.len());
        let mut names: Vec<&str> = Vec::new();
        for (index, record) in records.iter().enumerate() {
            let object = record
                .as_object()
                .ok_or(TableError::NotARecord { index })?;
            for key in object.keys() {
                if !names.contains(&key.as_str()) {
                    names.push(key);
                }
            }
            objects.push(object);
        }

        let mut columns = Vec::with_capacity(names.len());
        let mut cells_by_column = Vec::with_capacity(names.len());
        for name in &names {
            let cells: Vec<Cell> = objects
                .iter()
                .map(|o| o.get(*name).map_or(Cell::Null, Cell::from_json))
                .collect();
            let kind = infer_kind(&cells);
            columns.push(Column::new(*name, kind));
            cells_by_column.push(normalize_cells(kind, cells));
        }

        let mut rows: Vec<Vec<Cell>> = (0..objects.len())
            .map(|_| Vec::with_capacity(columns.len()))
            .collect();
        for cells in cells_by_column {
            for (row, cell) in rows.iter_mut().zip(cells) {
                row.push(cell);
            }
        }

        Ok(Self { columns, rows })
    }

    /// Converts the table into JSON row mappings with every sentinel replaced by `null`.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        self.rows
            .iter()
            .map(|cells| {
                self.columns
                    .iter()
                    .zip(cells)
                    .map(|(column, cell)| (column.name.clone(), cell.to_json()))
                    .collect()
            })
            .collect()
    }

    pub fn push_row(&mut self, cells: Vec<Cell>) -> Result<(), TableError> {
        if cells.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                expected: self.columns.len(),
                found: cells.len(),
            });
        }
        self.rows.push(cells);
        Ok(())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = RowView<'_>> {
        let columns = &self.columns;
        self.rows
            .iter()
            .map(move |cells| RowView { columns, cells })
    }

    pub fn retain(&mut self, mut keep: impl FnMut(RowView<'_>) -> bool) {
        let columns = &self.columns;
        self.rows.retain(|cells| keep(RowView { columns, cells }));
    }

    /// Rows whose `column` holds exactly `value`; `None` when the column does not exist.
    pub fn matching(&self, column: &str, value: &Cell) -> Option<Table> {
        let index = self.columns.iter().position(|c| c.name == column)?;
        let rows = self
            .rows
            .iter()
            .filter(|cells| cells[index].same_value(value))
            .cloned()
            .collect();
        Some(Table {
            columns: self.columns.clone(),
            rows,
        })
    }

    /// Non-missing numeric values of a column, or `None` when the column is
    /// absent or holds no numbers at all.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.columns.iter().position(|c| c.name == name)?;
        let values: Vec<f64> = self
            .rows
            .iter()
            .filter_map(|cells| cells[index].as_number())
            .collect();
        if values.is_empty() { None } else { Some(values) }
    }

    pub(crate) fn cell_rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }
}

fn infer_kind(cells: &[Cell]) -> ColumnKind {
    let mut kind = None;
    for cell in cells.iter().filter(|c| !c.is_missing()) {
        let this = cell.natural_kind();
        kind = Some(match (kind, this) {
            (None, k) => k,
            (Some(a), b) if a == b => a,
            (Some(ColumnKind::Int), ColumnKind::Float)
            | (Some(ColumnKind::Float), ColumnKind::Int) => ColumnKind::Float,
            _ => ColumnKind::Object,
        });
    }
    let kind = kind.unwrap_or(ColumnKind::Object);

    // integer columns with holes widen to float so the hole can be NaN
    if kind == ColumnKind::Int && cells.iter().any(Cell::is_missing) {
        ColumnKind::Float
    } else {
        kind
    }
}

fn normalize_cells(kind: ColumnKind, cells: Vec<Cell>) -> Vec<Cell> {
    cells
        .into_iter()
        .map(|cell| match (kind, cell) {
            (ColumnKind::Float, Cell::Int(v)) => Cell::Float(v as f64),
            (ColumnKind::Float, c) if c.is_missing() => Cell::Float(f64::NAN),
            (ColumnKind::DateTime, c) if c.is_missing() => Cell::Timestamp(None),
            (_, c) if c.is_missing() => Cell::Null,
            (_, c) => c,
        })
        .collect()
}
