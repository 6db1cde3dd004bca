//! Tabular values: column-oriented frames and single-column series.
//!
//! A [`Frame`] is an ordered set of equally long, named [`Column`]s. Equality
//! through [`Frame::equals`] treats NaN cells as equal, the way tabular
//! libraries compare frames; the derived `PartialEq` follows IEEE semantics.

use thiserror::Error;

/// Element type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Int64,
    Float64,
    Bool,
    Utf8,
}

impl DType {
    /// Stable tag used in encoded frames.
    pub const fn tag(self) -> u8 {
        match self {
            DType::Int64 => 1,
            DType::Float64 => 2,
            DType::Bool => 3,
            DType::Utf8 => 4,
        }
    }

    /// Inverse of [`DType::tag`].
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(DType::Int64),
            2 => Some(DType::Float64),
            3 => Some(DType::Bool),
            4 => Some(DType::Utf8),
            _ => None,
        }
    }

    /// Type name.
    pub const fn name(self) -> &'static str {
        match self {
            DType::Int64 => "int64",
            DType::Float64 => "float64",
            DType::Bool => "bool",
            DType::Utf8 => "utf8",
        }
    }
}

/// A typed column of values.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Bool(Vec<bool>),
    Utf8(Vec<String>),
}

impl Column {
    /// Number of values.
    pub fn len(&self) -> usize {
        match self {
            Column::Int64(v) => v.len(),
            Column::Float64(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Utf8(v) => v.len(),
        }
    }

    /// Check if the column has no values.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type.
    pub fn dtype(&self) -> DType {
        match self {
            Column::Int64(_) => DType::Int64,
            Column::Float64(_) => DType::Float64,
            Column::Bool(_) => DType::Bool,
            Column::Utf8(_) => DType::Utf8,
        }
    }

    /// Compare values, treating NaN as equal to NaN.
    pub fn equals(&self, other: &Column) -> bool {
        match (self, other) {
            (Column::Float64(a), Column::Float64(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b).all(|(x, y)| x == y || (x.is_nan() && y.is_nan()))
            }
            _ => self == other,
        }
    }
}

impl From<Vec<i64>> for Column {
    fn from(values: Vec<i64>) -> Self {
        Column::Int64(values)
    }
}

impl From<Vec<f64>> for Column {
    fn from(values: Vec<f64>) -> Self {
        Column::Float64(values)
    }
}

impl From<Vec<bool>> for Column {
    fn from(values: Vec<bool>) -> Self {
        Column::Bool(values)
    }
}

impl From<Vec<String>> for Column {
    fn from(values: Vec<String>) -> Self {
        Column::Utf8(values)
    }
}

impl From<Vec<&str>> for Column {
    fn from(values: Vec<&str>) -> Self {
        Column::Utf8(values.into_iter().map(str::to_string).collect())
    }
}

/// Errors from building frames.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// A column's length differs from the frame's row count
    #[error("Column {column} has {actual} rows, frame has {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    /// Two columns share a name
    #[error("Duplicate column: {0}")]
    DuplicateColumn(String),
}

/// An ordered collection of named, equally long columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    columns: Vec<(String, Column)>,
}

impl Frame {
    /// Create an empty frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame from `(name, column)` pairs.
    pub fn from_columns<N, C>(columns: impl IntoIterator<Item = (N, C)>) -> Result<Self, FrameError>
    where
        N: Into<String>,
        C: Into<Column>,
    {
        let mut frame = Self::new();
        for (name, column) in columns {
            frame.push_column(name, column)?;
        }
        Ok(frame)
    }

    /// Append a column.
    pub fn push_column(&mut self, name: impl Into<String>, column: impl Into<Column>) -> Result<(), FrameError> {
        let name = name.into();
        let column = column.into();
        if self.column(&name).is_some() {
            return Err(FrameError::DuplicateColumn(name));
        }
        if let Some((_, first)) = self.columns.first() {
            if first.len() != column.len() {
                return Err(FrameError::LengthMismatch {
                    column: name,
                    expected: first.len(),
                    actual: column.len(),
                });
            }
        }
        self.columns.push((name, column));
        Ok(())
    }

    /// Builder-style [`Frame::push_column`].
    pub fn with_column(mut self, name: impl Into<String>, column: impl Into<Column>) -> Result<Self, FrameError> {
        self.push_column(name, column)?;
        Ok(self)
    }

    /// Look up a column by name.
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Iterate over `(name, column)` pairs.
    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    /// Column names, in order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    /// Check if the frame has no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Frame equality: same names, order, types and values, NaN equal to NaN.
    pub fn equals(&self, other: &Frame) -> bool {
        self.columns.len() == other.columns.len()
            && self
                .columns
                .iter()
                .zip(&other.columns)
                .all(|((na, ca), (nb, cb))| na == nb && ca.equals(cb))
    }
}

/// A single named or unnamed column.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    name: Option<String>,
    values: Column,
}

impl Series {
    /// Create an unnamed series.
    pub fn new(values: impl Into<Column>) -> Self {
        Self { name: None, values: values.into() }
    }

    /// Create a named series.
    pub fn named(name: impl Into<String>, values: impl Into<Column>) -> Self {
        Self { name: Some(name.into()), values: values.into() }
    }

    /// Series name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Underlying values.
    pub fn values(&self) -> &Column {
        &self.values
    }

    /// Number of values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the series has no values.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Series equality, NaN equal to NaN.
    pub fn equals(&self, other: &Series) -> bool {
        self.name == other.name && self.values.equals(&other.values)
    }
}
