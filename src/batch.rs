//! Input model: a batch of named columns with heterogeneous physical storage.

use arrow_array::{Array, ArrayRef, RecordBatch};

use crate::{
    error::{EncodeError, Result},
    host::HostValue,
};

/// Physical backing of one input column.
#[derive(Debug, Clone)]
pub enum ColumnSource {
    /// One contiguous typed buffer without a validity bitmap.
    ///
    /// Datetime columns mark missing values with `i64::MIN`.
    Flat(ArrayRef),
    /// One or more Arrow chunks, each with an optional validity bitmap.
    Chunked(Vec<ArrayRef>),
    /// Boxed host-runtime cells.
    Boxed(Vec<HostValue>),
}

impl ColumnSource {
    /// Number of logical rows.
    pub fn len(&self) -> usize {
        match self {
            Self::Flat(array) => array.len(),
            Self::Chunked(chunks) => chunks.iter().map(|c| c.len()).sum(),
            Self::Boxed(cells) => cells.len(),
        }
    }

    /// Whether the column holds no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<ArrayRef> for ColumnSource {
    fn from(array: ArrayRef) -> Self {
        Self::Chunked(vec![array])
    }
}

impl From<Vec<ArrayRef>> for ColumnSource {
    fn from(chunks: Vec<ArrayRef>) -> Self {
        Self::Chunked(chunks)
    }
}

impl From<Vec<HostValue>> for ColumnSource {
    fn from(cells: Vec<HostValue>) -> Self {
        Self::Boxed(cells)
    }
}

/// A named input column.
#[derive(Debug, Clone)]
pub struct InputColumn {
    /// Column name, used as the symbol or field key.
    pub name: String,
    /// Physical storage.
    pub source: ColumnSource,
}

impl InputColumn {
    /// Create a column.
    pub fn new(name: impl Into<String>, source: impl Into<ColumnSource>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    /// A column backed by a single flat buffer.
    pub fn flat(name: impl Into<String>, array: ArrayRef) -> Self {
        Self::new(name, ColumnSource::Flat(array))
    }
}

/// An ordered set of equally long columns.
#[derive(Debug, Clone, Default)]
pub struct Batch {
    name: Option<String>,
    columns: Vec<InputColumn>,
    row_count: usize,
}

impl Batch {
    /// Build a batch, checking that all columns have the same length.
    pub fn try_new(columns: Vec<InputColumn>) -> Result<Self> {
        let row_count = columns.first().map_or(0, |c| c.source.len());
        if let Some(bad) = columns.iter().find(|c| c.source.len() != row_count) {
            return Err(EncodeError::bad_argument(
                "data",
                format_args!(
                    "column '{}' has {} rows, expected {}",
                    bad.name,
                    bad.source.len(),
                    row_count
                ),
            ));
        }
        Ok(Self {
            name: None,
            columns,
            row_count,
        })
    }

    /// Attach a batch name, used as the table name when none is given.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build a batch from one or more record batches sharing a schema.
    ///
    /// Each column becomes a chunked column with one chunk per record batch.
    pub fn from_record_batches(batches: &[RecordBatch]) -> Result<Self> {
        let Some(first) = batches.first() else {
            return Ok(Self::default());
        };
        let schema = first.schema();
        if let Some(other) = batches.iter().find(|b| b.schema() != schema) {
            return Err(EncodeError::bad_argument(
                "data",
                format_args!(
                    "record batches must share a schema: {:?} vs {:?}",
                    schema,
                    other.schema()
                ),
            ));
        }
        let columns = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, field)| {
                let chunks = batches.iter().map(|b| b.column(i).clone()).collect();
                InputColumn::new(field.name().clone(), ColumnSource::Chunked(chunks))
            })
            .collect();
        Self::try_new(columns)
    }

    /// Batch name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Columns in input order.
    pub fn columns(&self) -> &[InputColumn] {
        &self.columns
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

impl TryFrom<RecordBatch> for Batch {
    type Error = EncodeError;

    fn try_from(batch: RecordBatch) -> Result<Self> {
        Self::from_record_batches(std::slice::from_ref(&batch))
    }
}
