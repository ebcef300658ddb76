//! The migration report (spec §3 "Migrated-table record" / "Migration
//! report", §6.3).

use serde::Serialize;

/// A migrated table's outcome (spec §3 state transitions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyStatus {
    None,
    Partial,
    Full,
}

impl CopyStatus {
    /// Computes the status transition of spec §3/§4.E step 6 from the
    /// outcome of one table's copy.
    #[must_use]
    pub fn from_outcome(count: u64, had_errors: bool) -> Self {
        match (count, had_errors) {
            (0, _) => CopyStatus::None,
            (_, true) => CopyStatus::Partial,
            (_, false) => CopyStatus::Full,
        }
    }
}

/// One column's name plus its source and target type spellings (spec §3).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigratedColumn {
    pub name: String,
    #[serde(rename = "source-type")]
    pub source_type: String,
    #[serde(rename = "target-type")]
    pub target_type: String,
}

/// One table's full migration record (spec §3 "Migrated-table record").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigratedTable {
    pub table: String,
    pub columns: Vec<MigratedColumn>,
    pub count: u64,
    pub status: CopyStatus,
}

impl MigratedTable {
    #[must_use]
    pub fn new(table: impl Into<String>, columns: Vec<MigratedColumn>) -> Self {
        Self {
            table: table.into(),
            columns,
            count: 0,
            status: CopyStatus::None,
        }
    }
}

/// A `{rdbms, schema}` pair as carried in the report header (spec §3
/// "Migration report").
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RdbmsSchema {
    pub rdbms: String,
    pub schema: String,
}

/// The full migration report returned to the caller (spec §3, §6.3).
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub started: String,
    pub finished: String,
    pub source: RdbmsSchema,
    pub target: RdbmsSchema,
    #[serde(rename = "migrated-tables")]
    pub migrated_tables: Vec<MigratedTable>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_none_requires_zero_count() {
        assert_eq!(CopyStatus::from_outcome(0, true), CopyStatus::None);
        assert_eq!(CopyStatus::from_outcome(0, false), CopyStatus::None);
    }

    #[test]
    fn status_partial_requires_count_and_errors() {
        assert_eq!(CopyStatus::from_outcome(5, true), CopyStatus::Partial);
    }

    #[test]
    fn status_full_requires_count_and_no_errors() {
        assert_eq!(CopyStatus::from_outcome(5, false), CopyStatus::Full);
    }
}
