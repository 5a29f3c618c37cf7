use thiserror::Error;

// ---------------------------------------------------------------------------
// StatsError – fatal caller-input errors
// ---------------------------------------------------------------------------

/// Errors that abort a call. Recoverable conditions are reported as
/// [`Warning`](crate::diagnostics::Warning)s instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// A column/group selection was neither a name nor a list of names.
    #[error("{field} should be either a string or a list of strings, got {found}")]
    InvalidSelection { field: &'static str, found: String },

    /// One or more requested names are not columns of the table.
    #[error("{field} not found in table: {}", .missing.join(", "))]
    MissingColumns {
        field: &'static str,
        missing: Vec<String>,
    },

    /// The same column name appears twice where names must be unique.
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    /// A column's length disagrees with the rest of the table.
    #[error("column '{name}' has {len} values but the table has {expected} rows")]
    ColumnLength {
        name: String,
        len: usize,
        expected: usize,
    },

    /// Tables being concatenated do not share the same columns.
    #[error("cannot concatenate tables with different columns: [{}] vs [{}]", .left.join(", "), .right.join(", "))]
    SchemaMismatch { left: Vec<String>, right: Vec<String> },

    /// Options could not be deserialized.
    #[error("invalid options: {0}")]
    Config(String),
}

/// Result alias for fallible table and statistics operations.
pub type Result<T> = std::result::Result<T, StatsError>;

impl StatsError {
    /// `true` for the type-error category (wrong kind of selection).
    pub fn is_type_error(&self) -> bool {
        matches!(self, StatsError::InvalidSelection { .. })
    }

    /// `true` for the value-error category (names absent from the table).
    pub fn is_value_error(&self) -> bool {
        matches!(
            self,
            StatsError::MissingColumns { .. } | StatsError::DuplicateColumn(_)
        )
    }
}
