//! Storage kinds and output roles.

use std::fmt;

/// Physical representation of a classified column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    /// Every cell is null; the column is skipped.
    Null,
    /// Boxed booleans.
    BoxedBool,
    /// Boxed integers, range-checked against `i64` per cell.
    BoxedInt,
    /// Boxed floats.
    BoxedFloat,
    /// Boxed strings in the host's native width.
    BoxedStr,
    /// Boxed exact decimals.
    BoxedDecimal,
    /// Bit-packed booleans without a validity bitmap.
    FlatBool,
    /// `i8` values without a validity bitmap.
    FlatI8,
    /// `i16` values without a validity bitmap.
    FlatI16,
    /// `i32` values without a validity bitmap.
    FlatI32,
    /// `i64` values without a validity bitmap.
    FlatI64,
    /// `u8` values without a validity bitmap.
    FlatU8,
    /// `u16` values without a validity bitmap.
    FlatU16,
    /// `u32` values without a validity bitmap.
    FlatU32,
    /// `u64` values without a validity bitmap, range-checked against `i64`.
    FlatU64,
    /// `f32` values without a validity bitmap.
    FlatF32,
    /// `f64` values without a validity bitmap.
    FlatF64,
    /// Naive nanosecond datetime; `i64::MIN` marks null.
    FlatDatetimeNs,
    /// Timezone-aware nanosecond datetime; `i64::MIN` marks null.
    FlatDatetimeTzNs,
    /// Nullable Arrow booleans.
    ChunkedBool,
    /// Nullable Arrow `Int8`.
    ChunkedI8,
    /// Nullable Arrow `Int16`.
    ChunkedI16,
    /// Nullable Arrow `Int32`.
    ChunkedI32,
    /// Nullable Arrow `Int64`.
    ChunkedI64,
    /// Nullable Arrow `UInt8`.
    ChunkedU8,
    /// Nullable Arrow `UInt16`.
    ChunkedU16,
    /// Nullable Arrow `UInt32`.
    ChunkedU32,
    /// Nullable Arrow `UInt64`.
    ChunkedU64,
    /// Nullable Arrow `Float32`.
    ChunkedF32,
    /// Nullable Arrow `Float64`.
    ChunkedF64,
    /// Nullable Arrow nanosecond timestamps, with or without a timezone.
    ChunkedTimestampNs,
    /// Nullable Arrow `Decimal128` with a non-negative scale.
    ChunkedDecimal128,
    /// Nullable Arrow `Decimal256` with a non-negative scale.
    ChunkedDecimal256,
    /// UTF-8 with 32-bit offsets.
    Utf8,
    /// UTF-8 with 64-bit offsets.
    LargeUtf8,
    /// UTF-8 dictionary with `i8` keys.
    DictI8,
    /// UTF-8 dictionary with `i16` keys.
    DictI16,
    /// UTF-8 dictionary with `i32` keys.
    DictI32,
    /// UTF-8 dictionary with `u8` keys.
    DictU8,
    /// UTF-8 dictionary with `u16` keys.
    DictU16,
    /// UTF-8 dictionary with `u32` keys.
    DictU32,
    /// List of f64 values.
    ListF64,
}

impl StorageKind {
    /// Every storage kind.
    pub const ALL: [StorageKind; 42] = [
        Self::Null,
        Self::BoxedBool,
        Self::BoxedInt,
        Self::BoxedFloat,
        Self::BoxedStr,
        Self::BoxedDecimal,
        Self::FlatBool,
        Self::FlatI8,
        Self::FlatI16,
        Self::FlatI32,
        Self::FlatI64,
        Self::FlatU8,
        Self::FlatU16,
        Self::FlatU32,
        Self::FlatU64,
        Self::FlatF32,
        Self::FlatF64,
        Self::FlatDatetimeNs,
        Self::FlatDatetimeTzNs,
        Self::ChunkedBool,
        Self::ChunkedI8,
        Self::ChunkedI16,
        Self::ChunkedI32,
        Self::ChunkedI64,
        Self::ChunkedU8,
        Self::ChunkedU16,
        Self::ChunkedU32,
        Self::ChunkedU64,
        Self::ChunkedF32,
        Self::ChunkedF64,
        Self::ChunkedTimestampNs,
        Self::ChunkedDecimal128,
        Self::ChunkedDecimal256,
        Self::Utf8,
        Self::LargeUtf8,
        Self::DictI8,
        Self::DictI16,
        Self::DictI32,
        Self::DictU8,
        Self::DictU16,
        Self::DictU32,
        Self::ListF64,
    ];

    /// Whether reading a cell touches host-runtime objects.
    pub fn needs_host_access(self) -> bool {
        matches!(
            self,
            Self::BoxedBool
                | Self::BoxedInt
                | Self::BoxedFloat
                | Self::BoxedStr
                | Self::BoxedDecimal
        )
    }

    /// Dictionary-encoded strings.
    pub fn is_dictionary(self) -> bool {
        matches!(
            self,
            Self::DictI8
                | Self::DictI16
                | Self::DictI32
                | Self::DictU8
                | Self::DictU16
                | Self::DictU32
        )
    }

    /// Any string representation usable as a symbol or table name.
    pub fn is_string(self) -> bool {
        matches!(self, Self::BoxedStr | Self::Utf8 | Self::LargeUtf8) || self.is_dictionary()
    }

    /// Nanosecond datetime representations.
    pub fn is_datetime(self) -> bool {
        matches!(
            self,
            Self::FlatDatetimeNs | Self::FlatDatetimeTzNs | Self::ChunkedTimestampNs
        )
    }

    /// Role a column takes when no selector claims it.
    pub fn default_role(self) -> Role {
        use StorageKind::*;
        match self {
            Null => Role::Skip,
            BoxedBool | FlatBool | ChunkedBool => Role::FieldBool,
            BoxedInt | FlatI8 | FlatI16 | FlatI32 | FlatI64 | FlatU8 | FlatU16 | FlatU32
            | FlatU64 | ChunkedI8 | ChunkedI16 | ChunkedI32 | ChunkedI64 | ChunkedU8
            | ChunkedU16 | ChunkedU32 | ChunkedU64 => Role::FieldI64,
            BoxedFloat | FlatF32 | FlatF64 | ChunkedF32 | ChunkedF64 => Role::FieldF64,
            BoxedStr | Utf8 | LargeUtf8 | DictI8 | DictI16 | DictI32 | DictU8 | DictU16
            | DictU32 => Role::FieldStr,
            FlatDatetimeNs | FlatDatetimeTzNs | ChunkedTimestampNs => Role::FieldTimestamp,
            ListF64 => Role::FieldArrayF64,
            BoxedDecimal | ChunkedDecimal128 | ChunkedDecimal256 => Role::FieldDecimal,
        }
    }

    /// Short dtype label for error messages.
    pub fn dtype_name(self) -> &'static str {
        use StorageKind::*;
        match self {
            Null => "null",
            BoxedBool => "object<bool>",
            BoxedInt => "object<int>",
            BoxedFloat => "object<float>",
            BoxedStr => "object<str>",
            BoxedDecimal => "object<Decimal>",
            FlatBool | ChunkedBool => "bool",
            FlatI8 | ChunkedI8 => "int8",
            FlatI16 | ChunkedI16 => "int16",
            FlatI32 | ChunkedI32 => "int32",
            FlatI64 | ChunkedI64 => "int64",
            FlatU8 | ChunkedU8 => "uint8",
            FlatU16 | ChunkedU16 => "uint16",
            FlatU32 | ChunkedU32 => "uint32",
            FlatU64 | ChunkedU64 => "uint64",
            FlatF32 | ChunkedF32 => "float32",
            FlatF64 | ChunkedF64 => "float64",
            FlatDatetimeNs | ChunkedTimestampNs => "datetime64[ns]",
            FlatDatetimeTzNs => "datetime64[ns, tz]",
            Utf8 => "string",
            LargeUtf8 => "large_string",
            DictI8 | DictI16 | DictI32 | DictU8 | DictU16 | DictU32 => "category",
            ListF64 => "list<float64>",
            ChunkedDecimal128 => "decimal128",
            ChunkedDecimal256 => "decimal256",
        }
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dtype_name())
    }
}

/// What a column contributes to each output line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Not written.
    Skip,
    /// Supplies the table name of each row.
    TableName,
    /// Written as a symbol (tag).
    Symbol,
    /// Boolean field.
    FieldBool,
    /// Integer field.
    FieldI64,
    /// Float field.
    FieldF64,
    /// String field.
    FieldStr,
    /// Timestamp field.
    FieldTimestamp,
    /// f64 array field.
    FieldArrayF64,
    /// Exact decimal field.
    FieldDecimal,
    /// Designated timestamp.
    At,
}

impl Role {
    /// Every role.
    pub const ALL: [Role; 11] = [
        Self::Skip,
        Self::TableName,
        Self::Symbol,
        Self::FieldBool,
        Self::FieldI64,
        Self::FieldF64,
        Self::FieldStr,
        Self::FieldTimestamp,
        Self::FieldArrayF64,
        Self::FieldDecimal,
        Self::At,
    ];

    /// Whether `kind` may take this role.
    pub fn accepts(self, kind: StorageKind) -> bool {
        match self {
            Self::Skip => kind == StorageKind::Null,
            Self::TableName | Self::Symbol => kind.is_string(),
            Self::At => kind.is_datetime(),
            field => kind.default_role() == field,
        }
    }

    /// Whether the role counts towards a row's payload.
    pub fn is_payload(self) -> bool {
        !matches!(self, Self::Skip | Self::TableName | Self::At)
    }
}
