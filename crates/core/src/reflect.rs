//! Neutral reflection descriptors (spec §3 Column/Table descriptor, spec §9
//! Design Note "Reflection dependency": the original leans on an external
//! ORM's reflection; here each dialect crate's adapter isolates its own
//! catalog queries behind [`crate::adapter::Connection::reflect_schema`],
//! returning only these dialect-neutral shapes).

use crate::types::SourceType;

/// One reflected column (spec §3 "Column descriptor").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub source_type: SourceType,
    pub nullable: bool,
    pub default: Option<String>,
    pub server_default: Option<String>,
    pub primary_key: bool,
    pub foreign_key: Option<ForeignKeyRef>,
}

/// The target table+column a foreign key points at, used only to compute
/// dependency order (spec §3 Table descriptor, §4.D step 2 "Sort by FK
/// dependency").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub table: String,
}

/// One reflected table (spec §3 "Table descriptor").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDescriptor {
    pub schema: String,
    pub name: String,
    pub columns: Vec<ColumnDescriptor>,
    pub creation_order_rank: usize,
}

/// RDBMS pseudo-function default values cleared during migration (spec §3
/// Column descriptor invariant: "`default` whose textual value matches a
/// known RDBMS pseudo-function... is cleared"). Matches are case-insensitive
/// against the default expression's *text*, not a method on the column
/// object. Spec §9 Open Question calls out the original's comparison bug
/// and directs implementers to compare the lowercased default text instead.
pub const PSEUDO_FUNCTION_DEFAULTS: &[&str] = &["sysdate", "systime"];

/// Whether `default` is a pseudo-function sentinel that must be cleared
/// before the column is recreated on the target (spec §3, §4.D step 5).
#[must_use]
pub fn is_pseudo_function_default(default: &str) -> bool {
    let lowered = default.trim().to_ascii_lowercase();
    PSEUDO_FUNCTION_DEFAULTS.contains(&lowered.as_str())
}
