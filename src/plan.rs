//! Role resolution: which column feeds the table name, the symbols, the fields
//! and the designated timestamp, and the order in which they are written.

use std::fmt;

use tracing::debug;

use crate::{
    batch::Batch,
    column::{Column, Role, StorageKind, classify},
    dispatch::{Emit, SerializeFn, resolve},
    error::{CellError, EncodeError, Result},
    line::{ColumnName, LineWriter, TableName},
    strings::StrBuffer,
};

/// Reference to a batch column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// Position; negative values count from the end.
    Index(isize),
    /// Column name.
    Name(String),
}

impl ColumnRef {
    fn locate(&self, arg: &'static str, batch: &Batch) -> Result<usize> {
        let count = batch.column_count();
        match self {
            Self::Index(index) => {
                let resolved = if *index < 0 {
                    count.checked_sub(index.unsigned_abs())
                } else {
                    usize::try_from(*index).ok()
                };
                resolved.filter(|&i| i < count).ok_or_else(|| {
                    EncodeError::bad_argument(
                        arg,
                        format_args!("Index {index} out of range for {count} columns."),
                    )
                })
            }
            Self::Name(name) => batch
                .columns()
                .iter()
                .position(|c| &c.name == name)
                .ok_or_else(|| {
                    EncodeError::bad_argument(
                        arg,
                        format_args!("Column {name:?} not found in the dataframe."),
                    )
                }),
        }
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        Self::Name(name.to_owned())
    }
}

impl From<String> for ColumnRef {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<isize> for ColumnRef {
    fn from(index: isize) -> Self {
        Self::Index(index)
    }
}

/// Where each row's table name comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TableSpec {
    /// The batch name.
    #[default]
    BatchName,
    /// One name for every row.
    Name(String),
    /// A string column, read per row.
    Column(ColumnRef),
}

/// Which string columns are written as symbols.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SymbolsSpec {
    /// Dictionary-encoded string columns.
    #[default]
    Auto,
    /// Every string column.
    All,
    /// No symbols; string columns become string fields.
    None,
    /// Exactly these columns, each of which must hold strings.
    Columns(Vec<ColumnRef>),
}

/// Where each row's designated timestamp comes from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AtSpec {
    /// Let the server assign it.
    #[default]
    Server,
    /// One timestamp, in nanoseconds since the Unix epoch, for every row.
    Fixed(i64),
    /// A datetime column; null cells fall back to the server time.
    Column(ColumnRef),
}

/// A column with its final role and serializer.
pub struct PlannedColumn<'b, W> {
    column: Column<'b>,
    role: Role,
    serialize: SerializeFn<W>,
}

impl<'b, W: LineWriter> PlannedColumn<'b, W> {
    /// The classified column.
    pub fn column(&self) -> &Column<'b> {
        &self.column
    }

    /// Role in the output row.
    pub fn role(&self) -> Role {
        self.role
    }

    #[inline]
    pub(crate) fn serialize(
        &self,
        writer: &mut W,
        strings: &mut StrBuffer,
    ) -> Result<Emit, CellError> {
        (self.serialize)(writer, strings, &self.column)
    }

    /// Attach column, row and the offending value to a cell failure.
    pub(crate) fn cell_error(&self, row: usize, source: CellError) -> EncodeError {
        EncodeError::Cell {
            column: self.column.name().to_owned(),
            row,
            value: self.column.render(),
            source,
        }
    }
}

impl<W> fmt::Debug for PlannedColumn<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlannedColumn")
            .field("column", &self.column.name())
            .field("kind", &self.column.kind())
            .field("role", &self.role)
            .finish()
    }
}

/// Source of the designated timestamp.
pub enum AtTarget<'b, W> {
    /// Server-assigned.
    Server,
    /// Fixed nanoseconds since the Unix epoch.
    Fixed(i64),
    /// Read per row from a datetime column.
    Column(PlannedColumn<'b, W>),
}

impl<W> fmt::Debug for AtTarget<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Server => f.write_str("Server"),
            Self::Fixed(nanos) => f.debug_tuple("Fixed").field(nanos).finish(),
            Self::Column(col) => f.debug_tuple("Column").field(col).finish(),
        }
    }
}

/// Resolved emission plan of one batch.
///
/// Columns are ordered table name first, then symbols, then fields, each
/// group in input order. Columns with nothing to write are dropped.
pub struct Plan<'b, W> {
    table: Option<&'b str>,
    columns: Vec<PlannedColumn<'b, W>>,
    at: AtTarget<'b, W>,
}

impl<'b, W: LineWriter> Plan<'b, W> {
    /// Classify every column of `batch` and resolve the selectors into a plan.
    ///
    /// All configuration errors surface here, before any row is written.
    pub fn build(
        table: &'b TableSpec,
        symbols: &SymbolsSpec,
        at: &AtSpec,
        batch: &'b Batch,
        max_name_len: usize,
    ) -> Result<Self> {
        let table_col = match table {
            TableSpec::Column(col) => Some(col.locate("table_name_col", batch)?),
            _ => None,
        };
        let at_col = match at {
            AtSpec::Column(col) => Some(col.locate("at", batch)?),
            _ => None,
        };

        let columns = batch
            .columns()
            .iter()
            .enumerate()
            .map(|(index, input)| classify(index, input))
            .collect::<Result<Vec<_>>>()?;
        let mut roles: Vec<Role> = columns.iter().map(|c| c.kind().default_role()).collect();

        let fixed_table = match table {
            TableSpec::BatchName => Some(batch.name().ok_or_else(|| {
                EncodeError::bad_argument(
                    "table_name",
                    "Must specify at least one of `table_name` or `table_name_col`.",
                )
            })?),
            TableSpec::Name(name) => Some(name.as_str()),
            TableSpec::Column(_) => None,
        };
        if let Some(name) = fixed_table {
            TableName::new(name)
                .map_err(|err| EncodeError::bad_argument("table_name", err))?;
            check_len(name, max_name_len)
                .map_err(|msg| EncodeError::bad_argument("table_name", msg))?;
        }
        if let Some(i) = table_col {
            let column = &columns[i];
            if !Role::TableName.accepts(column.kind()) {
                return Err(bad_dtype("table_name_col", column, "strings"));
            }
            roles[i] = Role::TableName;
        }

        if let AtSpec::Fixed(nanos) = at {
            if *nanos < 0 {
                return Err(EncodeError::bad_argument(
                    "at",
                    "Cannot be before the Unix epoch (1970-01-01 00:00:00).",
                ));
            }
        }
        if let Some(i) = at_col {
            let column = &columns[i];
            if table_col == Some(i) {
                return Err(conflict("at", column, "the table name"));
            }
            if !Role::At.accepts(column.kind()) {
                return Err(bad_dtype("at", column, "datetime"));
            }
            roles[i] = Role::At;
        }

        match symbols {
            SymbolsSpec::Auto | SymbolsSpec::All => {
                let pick: fn(StorageKind) -> bool = match symbols {
                    SymbolsSpec::Auto => StorageKind::is_dictionary,
                    _ => StorageKind::is_string,
                };
                for (column, role) in columns.iter().zip(roles.iter_mut()) {
                    if role.is_payload() && pick(column.kind()) {
                        *role = Role::Symbol;
                    }
                }
            }
            SymbolsSpec::None => {}
            SymbolsSpec::Columns(refs) => {
                for col in refs {
                    let i = col.locate("symbols", batch)?;
                    let column = &columns[i];
                    if table_col == Some(i) {
                        return Err(conflict("symbols", column, "the table name"));
                    }
                    if at_col == Some(i) {
                        return Err(conflict("symbols", column, "the designated timestamp"));
                    }
                    if !Role::Symbol.accepts(column.kind()) {
                        return Err(bad_dtype("symbols", column, "strings"));
                    }
                    roles[i] = Role::Symbol;
                }
            }
        }

        let mut planned = Vec::with_capacity(columns.len());
        let mut at_target = match at {
            AtSpec::Fixed(nanos) => AtTarget::Fixed(*nanos),
            _ => AtTarget::Server,
        };
        for (column, role) in columns.into_iter().zip(roles) {
            if role == Role::Skip {
                debug!(column = column.name(), "skipping column without values");
                continue;
            }
            if role.is_payload() {
                ColumnName::new(column.name())
                    .map_err(|err| EncodeError::bad_column(column.name(), err))?;
                check_len(column.name(), max_name_len)
                    .map_err(|msg| EncodeError::bad_column(column.name(), msg))?;
            }
            let Some(serialize) = resolve::<W>(column.kind(), role) else {
                return Err(EncodeError::bad_column(
                    column.name(),
                    format_args!("Unsupported {} column for role {role:?}", column.kind()),
                ));
            };
            let entry = PlannedColumn {
                column,
                role,
                serialize,
            };
            if role == Role::At {
                at_target = AtTarget::Column(entry);
            } else {
                planned.push(entry);
            }
        }
        planned.sort_by_key(|p| match p.role {
            Role::TableName => 0u8,
            Role::Symbol => 1,
            _ => 2,
        });

        let plan = Self {
            table: fixed_table,
            columns: planned,
            at: at_target,
        };
        debug!(
            table = plan.table,
            order = ?plan.columns.iter().map(|p| (p.column.name(), p.role)).collect::<Vec<_>>(),
            at = ?plan.at,
            "planned batch"
        );
        Ok(plan)
    }

    /// Fixed table name shared by every row, if any.
    pub fn table(&self) -> Option<&'b str> {
        self.table
    }

    /// Columns in emission order, without the designated timestamp.
    pub fn columns(&self) -> &[PlannedColumn<'b, W>] {
        &self.columns
    }

    /// Designated timestamp source.
    pub fn at(&self) -> &AtTarget<'b, W> {
        &self.at
    }

    /// Storage kinds of every planned column.
    pub fn kinds(&self) -> impl Iterator<Item = StorageKind> + '_ {
        let at = match &self.at {
            AtTarget::Column(col) => Some(col.column.kind()),
            _ => None,
        };
        self.columns.iter().map(|p| p.column.kind()).chain(at)
    }

    /// Move every cursor to the next row.
    pub(crate) fn advance(&mut self) {
        for planned in &mut self.columns {
            planned.column.advance();
        }
        if let AtTarget::Column(planned) = &mut self.at {
            planned.column.advance();
        }
    }
}

impl<W> fmt::Debug for Plan<'_, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Plan")
            .field("table", &self.table)
            .field("columns", &self.columns)
            .field("at", &self.at)
            .finish()
    }
}

fn check_len(name: &str, max_name_len: usize) -> std::result::Result<(), String> {
    if name.len() > max_name_len {
        return Err(format!(
            "Bad name: {name:?}: Too long (max {max_name_len} characters)"
        ));
    }
    Ok(())
}

fn bad_dtype(arg: &'static str, column: &Column<'_>, expected: &str) -> EncodeError {
    EncodeError::bad_argument(
        arg,
        format_args!(
            "Bad dtype `{}` for the {:?} column: Must be a {expected} column.",
            column.kind(),
            column.name()
        ),
    )
}

fn conflict(arg: &'static str, column: &Column<'_>, used_as: &str) -> EncodeError {
    EncodeError::bad_argument(
        arg,
        format_args!(
            "Column {:?} is already used as {used_as}.",
            column.name()
        ),
    )
}
