//! The Type Equivalence Engine (spec §4.B): maps a source column's declared
//! type onto an equivalent type in the target dialect via an ordinal space.

use std::collections::HashMap;

use crate::engine::Engine;
use crate::error::{MigrationError, MigrationErrorKind};

/// Canonical type families a column can belong to, independent of dialect
/// spelling (spec §4.B step 2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TypeFamily {
    Char,
    Varchar,
    Clob,
    NChar,
    NVarchar,
    NClob,
    Binary,
    VarBinary,
    Blob,
    SmallInt,
    Integer,
    BigInt,
    Numeric,
    Float,
    Real,
    Double,
    Boolean,
    Date,
    Time,
    Timestamp,
    TimestampWithTz,
    Interval,
    Json,
    Xml,
    Uuid,
    Other,
}

/// A source column's declared type, decomposed into a family plus the
/// numeric/length qualifiers that matter for migration (spec §3 Column
/// descriptor, §4.B step 4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceType {
    pub family: TypeFamily,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub length: Option<u32>,
    /// The original declared spelling, e.g. `"NUMBER(10,2)"`; never empty
    /// (spec §3 invariant).
    pub raw: String,
}

impl SourceType {
    #[must_use]
    pub fn simple(family: TypeFamily, raw: impl Into<String>) -> Self {
        Self {
            family,
            precision: None,
            scale: None,
            length: None,
            raw: raw.into(),
        }
    }

    #[must_use]
    pub fn sized(family: TypeFamily, length: u32, raw: impl Into<String>) -> Self {
        Self {
            family,
            precision: None,
            scale: None,
            length: Some(length),
            raw: raw.into(),
        }
    }

    #[must_use]
    pub fn numeric(precision: Option<u32>, scale: Option<u32>, raw: impl Into<String>) -> Self {
        Self {
            family: TypeFamily::Numeric,
            precision,
            scale,
            length: None,
            raw: raw.into(),
        }
    }
}

/// The resolved type to declare for a column in the target dialect's DDL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetType {
    pub family: TypeFamily,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub length: Option<u32>,
    /// The rendered target DDL fragment, e.g. `"VARCHAR(50)"`.
    pub rendered: String,
}

/// Large-binary families excluded from the plain-data copy pass when
/// `migrate_lobdata` is false (spec §4.B `is_large_binary`).
#[must_use]
pub fn is_large_binary(source: &SourceType) -> bool {
    matches!(
        source.family,
        TypeFamily::Blob | TypeFamily::Clob | TypeFamily::NClob | TypeFamily::VarBinary
    )
}

/// A dialect's type families ordered narrowest to widest, used to widen a
/// column along `native_ordinal` when no direct equivalent exists (spec
/// §4.B).
pub type OrdinalSpace = &'static [TypeFamily];

/// A single dialect-neutral ordering, used as the fallback widening path
/// when a target dialect has no ordinal position for the source family at
/// all.
pub const REFERENCE_ORDINAL: &[TypeFamily] = &[
    TypeFamily::Boolean,
    TypeFamily::SmallInt,
    TypeFamily::Integer,
    TypeFamily::BigInt,
    TypeFamily::Real,
    TypeFamily::Float,
    TypeFamily::Double,
    TypeFamily::Numeric,
    TypeFamily::Char,
    TypeFamily::NChar,
    TypeFamily::Varchar,
    TypeFamily::NVarchar,
    TypeFamily::Clob,
    TypeFamily::NClob,
    TypeFamily::Binary,
    TypeFamily::VarBinary,
    TypeFamily::Blob,
    TypeFamily::Date,
    TypeFamily::Time,
    TypeFamily::Timestamp,
    TypeFamily::TimestampWithTz,
    TypeFamily::Interval,
    TypeFamily::Uuid,
    TypeFamily::Json,
    TypeFamily::Xml,
    TypeFamily::Other,
];

fn ordinal_of(space: OrdinalSpace, family: TypeFamily) -> Option<usize> {
    space.iter().position(|candidate| *candidate == family)
}

/// Reclassifies a zero-scale `NUMERIC`/`NUMBER` declaration as fixed-width
/// integer-bits by precision (spec §4.B step 2: the source family is
/// determined as "INTEGER-bits" or "NUMERIC(p,s)", not always the latter).
/// A declaration with no scale at all (Oracle's bare `NUMBER(p)`) counts as
/// zero-scale; a source with no precision is left as `Numeric`.
fn integer_family_for_scale_zero(source: &SourceType) -> Option<TypeFamily> {
    if source.family != TypeFamily::Numeric || source.scale.unwrap_or(0) != 0 {
        return None;
    }
    match source.precision? {
        p if p <= 4 => Some(TypeFamily::SmallInt),
        p if p <= 10 => Some(TypeFamily::Integer),
        p if p <= 19 => Some(TypeFamily::BigInt),
        _ => None,
    }
}

/// A per-column override supplied by the caller (spec §3 `external_columns`,
/// §4.B step 1). Keys are expected to already be lowercased by the
/// validator, per spec §4.C.
pub type ExternalOverrides<'a> = &'a HashMap<String, TargetType>;

/// Renders a target type declaration for `family`, preserving the source's
/// precision/scale/length where the family still carries that qualifier
/// (spec §4.B step 4). This is the dialect-neutral half of rendering;
/// dialects may further adjust punctuation via their own `render_type`.
fn render(target_engine: Engine, family: TypeFamily, source: &SourceType) -> TargetType {
    let name = default_type_name(target_engine, family);
    match family {
        TypeFamily::Numeric => {
            let rendered = match (source.precision, source.scale) {
                (Some(p), Some(s)) => format!("{name}({p},{s})"),
                (Some(p), None) => format!("{name}({p})"),
                _ => name.to_string(),
            };
            TargetType {
                family,
                precision: source.precision,
                scale: source.scale,
                length: None,
                rendered,
            }
        }
        TypeFamily::Char
        | TypeFamily::NChar
        | TypeFamily::Varchar
        | TypeFamily::NVarchar
        | TypeFamily::Binary
        | TypeFamily::VarBinary => {
            let rendered = match source.length {
                Some(length) => format!("{name}({length})"),
                None => name.to_string(),
            };
            TargetType {
                family,
                precision: None,
                scale: None,
                length: source.length,
                rendered,
            }
        }
        _ => TargetType {
            family,
            precision: None,
            scale: None,
            length: None,
            rendered: name.to_string(),
        },
    }
}

/// The family's default spelling in `engine`'s DDL, independent of
/// precision/scale/length. This is intentionally small and conservative,
/// since each dialect adapter crate may shadow/extend it for engine-specific
/// spellings it cares about (e.g. Postgres `TIMESTAMPTZ`).
fn default_type_name(engine: Engine, family: TypeFamily) -> &'static str {
    use Engine::{Mysql, Oracle, Postgres, SqlServer};
    use TypeFamily::{
        BigInt, Binary, Blob, Boolean, Char, Clob, Date, Double, Float, Integer, Interval, Json,
        NChar, NClob, NVarchar, Numeric, Other, Real, SmallInt, Time, Timestamp, TimestampWithTz,
        Uuid, VarBinary, Varchar, Xml,
    };
    match (engine, family) {
        (_, Char) => "CHAR",
        (_, NChar) => "NCHAR",
        (Oracle, Varchar) => "VARCHAR2",
        (_, Varchar) => "VARCHAR",
        (Oracle, NVarchar) => "NVARCHAR2",
        (_, NVarchar) => "NVARCHAR",
        (Oracle, Clob) => "CLOB",
        (Postgres, Clob) => "TEXT",
        (Mysql, Clob) => "LONGTEXT",
        (SqlServer, Clob) => "VARCHAR(MAX)",
        (_, Clob) => "TEXT",
        (SqlServer, NClob) => "NVARCHAR(MAX)",
        (_, NClob) => "NCLOB",
        (Oracle, Binary) => "RAW",
        (SqlServer, Binary) => "BINARY",
        (_, Binary) => "BINARY",
        (Oracle, VarBinary) => "RAW",
        (Postgres, VarBinary) => "BYTEA",
        (SqlServer, VarBinary) => "VARBINARY",
        (Mysql, VarBinary) => "VARBINARY",
        (_, VarBinary) => "VARBINARY",
        (Oracle, Blob) => "BLOB",
        (Postgres, Blob) => "BYTEA",
        (Mysql, Blob) => "LONGBLOB",
        (SqlServer, Blob) => "VARBINARY(MAX)",
        (_, Blob) => "BLOB",
        (_, SmallInt) => "SMALLINT",
        (Oracle, Integer) => "NUMBER(10)",
        (_, Integer) => "INTEGER",
        (Oracle, BigInt) => "NUMBER(19)",
        (_, BigInt) => "BIGINT",
        (Oracle, Numeric) => "NUMBER",
        (_, Numeric) => "NUMERIC",
        (_, Float) => "FLOAT",
        (_, Real) => "REAL",
        (Oracle, Double) => "BINARY_DOUBLE",
        (_, Double) => "DOUBLE PRECISION",
        (Oracle, Boolean) => "NUMBER(1)",
        (Mysql, Boolean) => "TINYINT(1)",
        (_, Boolean) => "BOOLEAN",
        (_, Date) => "DATE",
        (_, Time) => "TIME",
        (_, Timestamp) => "TIMESTAMP",
        (Postgres, TimestampWithTz) => "TIMESTAMPTZ",
        (_, TimestampWithTz) => "TIMESTAMP WITH TIME ZONE",
        (Oracle, Interval) => "INTERVAL DAY TO SECOND",
        (_, Interval) => "INTERVAL",
        (Postgres, Json) => "JSONB",
        (_, Json) => "JSON",
        (_, Xml) => "XML",
        (Postgres, Uuid) => "UUID",
        (Mysql, Uuid) => "CHAR(36)",
        (SqlServer, Uuid) => "UNIQUEIDENTIFIER",
        (Oracle, Uuid) => "RAW(16)",
        (_, Other) => "VARCHAR",
    }
}

/// Implements `migrate_type` (spec §4.B steps 1–4).
///
/// `target_space` is the target dialect's `native_ordinal` space (the
/// families it supports, narrowest to widest); [`REFERENCE_ORDINAL`] is the
/// dialect-neutral `reference_ordinal` space used to decide, among the
/// families `target_space` *does* support, which is the nearest one no
/// narrower than the source family when no direct equivalent exists.
///
/// # Errors
/// Returns `TypeUnsupported` if no family in `target_space` is as wide as
/// the source family along [`REFERENCE_ORDINAL`]. Precision loss is not an
/// error here; callers should check [`precision_loss`] separately and push
/// a non-fatal diagnostic, per spec §4.B step 4 / §7.
pub fn migrate_type(
    target_engine: Engine,
    target_space: OrdinalSpace,
    source: &SourceType,
    column_name: &str,
    overrides: ExternalOverrides<'_>,
) -> std::result::Result<TargetType, MigrationError> {
    if let Some(overridden) = overrides.get(&column_name.to_ascii_lowercase()) {
        return Ok(overridden.clone());
    }

    if let Some(integer_family) = integer_family_for_scale_zero(source) {
        if ordinal_of(target_space, integer_family).is_some() {
            return Ok(render(target_engine, integer_family, source));
        }
    }

    if ordinal_of(target_space, source.family).is_some() {
        return Ok(render(target_engine, source.family, source));
    }

    if let Some(family) = nearest_wider_supported(target_space, source.family) {
        return Ok(render(target_engine, family, source));
    }

    Err(MigrationError::new(
        MigrationErrorKind::TypeUnsupported,
        source.raw.clone(),
        format!("no equivalent type for `{}` in {target_engine}", source.raw),
    )
    .with_attribute(column_name))
}

/// Among the families `target_space` supports, finds the narrowest one that
/// is no narrower than `source_family` on the dialect-neutral
/// [`REFERENCE_ORDINAL`] scale. This is the widening fallback of spec §4.B
/// step 3 ("widen along `native_ordinal`... if none, fall back along
/// `reference_ordinal`"): `target_space` supplies what the dialect can
/// represent, `REFERENCE_ORDINAL` supplies the universal notion of "wider."
fn nearest_wider_supported(target_space: OrdinalSpace, source_family: TypeFamily) -> Option<TypeFamily> {
    let source_rank = ordinal_of(REFERENCE_ORDINAL, source_family)?;

    target_space
        .iter()
        .filter_map(|family| ordinal_of(REFERENCE_ORDINAL, *family).map(|rank| (rank, *family)))
        .filter(|(rank, _)| *rank >= source_rank)
        .min_by_key(|(rank, _)| *rank)
        .map(|(_, family)| family)
}

/// Splits a declared type spelling like `"NUMBER(10,2)"` into its bare name
/// and optional numeric arguments.
fn split_declared_type(declared: &str) -> (&str, Option<(&str, Option<&str>)>) {
    let declared = declared.trim();
    match declared.find('(') {
        Some(open) if declared.ends_with(')') => {
            let name = declared[..open].trim();
            let args = &declared[open + 1..declared.len() - 1];
            let mut parts = args.splitn(2, ',').map(str::trim);
            (name, Some((parts.next().unwrap_or(""), parts.next())))
        }
        _ => (declared, None),
    }
}

/// Resolves a caller-supplied type spelling (spec §3 `external_columns`
/// `column_type`) against `engine`'s type namespace, independent of any
/// source column (spec §4.C "external column-type overrides" validation).
/// Recognizes both `engine`'s own [`default_type_name`] spellings and a set
/// of common cross-dialect aliases (`INT`, `DECIMAL`, `BYTEA`, ...).
#[must_use]
pub fn resolve_external_type(engine: Engine, declared: &str) -> Option<TargetType> {
    let (name, args) = split_declared_type(declared);
    let family = family_for_type_name(engine, name)?;

    let (precision, scale, length) = match (family, args) {
        (TypeFamily::Numeric, Some((p, s))) => (p.parse().ok(), s.and_then(|s| s.parse().ok()), None),
        (
            TypeFamily::Char | TypeFamily::NChar | TypeFamily::Varchar | TypeFamily::NVarchar | TypeFamily::Binary | TypeFamily::VarBinary,
            Some((len, _)),
        ) => (None, None, len.parse().ok()),
        _ => (None, None, None),
    };

    Some(TargetType {
        family,
        precision,
        scale,
        length,
        rendered: declared.trim().to_string(),
    })
}

/// Maps a bare type-name spelling (already stripped of any `(...)`
/// arguments) onto its [`TypeFamily`] in `engine`'s namespace. A handful of
/// spellings are engine-specific (`VARCHAR2` only means anything on Oracle,
/// `BYTEA` only on Postgres); everything else is accepted on any engine.
fn family_for_type_name(engine: Engine, name: &str) -> Option<TypeFamily> {
    use Engine::{Mysql, Oracle, Postgres, SqlServer};
    use TypeFamily::{
        BigInt, Binary, Blob, Boolean, Char, Clob, Date, Double, Float, Integer, Interval, Json,
        NChar, NClob, NVarchar, Numeric, Real, SmallInt, Time, Timestamp, TimestampWithTz, Uuid,
        VarBinary, Varchar, Xml,
    };
    let upper = name.to_ascii_uppercase();
    if let Some(family) = match (engine, upper.as_str()) {
        (Oracle, "VARCHAR2") => Some(Varchar),
        (Oracle, "NVARCHAR2") => Some(NVarchar),
        (Oracle, "RAW") => Some(Binary),
        (Oracle, "NUMBER") => Some(Numeric),
        (Oracle, "BINARY_DOUBLE") => Some(Double),
        (Postgres, "BYTEA") => Some(VarBinary),
        (Postgres, "JSONB") => Some(Json),
        (Postgres, "TIMESTAMPTZ") => Some(TimestampWithTz),
        (Mysql, "LONGTEXT") => Some(Clob),
        (Mysql, "LONGBLOB") => Some(Blob),
        (SqlServer, "UNIQUEIDENTIFIER") => Some(Uuid),
        (SqlServer, "DATETIME2" | "DATETIME") => Some(Timestamp),
        _ => None,
    } {
        return Some(family);
    }

    Some(match upper.as_str() {
        "CHAR" | "CHARACTER" => Char,
        "NCHAR" => NChar,
        "VARCHAR" | "CHARACTER VARYING" => Varchar,
        "NVARCHAR" => NVarchar,
        "CLOB" | "TEXT" => Clob,
        "NCLOB" => NClob,
        "BINARY" => Binary,
        "VARBINARY" => VarBinary,
        "BLOB" => Blob,
        "SMALLINT" => SmallInt,
        "INT" | "INTEGER" => Integer,
        "BIGINT" => BigInt,
        "NUMERIC" | "DECIMAL" => Numeric,
        "FLOAT" => Float,
        "REAL" => Real,
        "DOUBLE" | "DOUBLE PRECISION" => Double,
        "BOOLEAN" | "BOOL" | "BIT" => Boolean,
        "DATE" => Date,
        "TIME" => Time,
        "TIMESTAMP" => Timestamp,
        "TIMESTAMP WITH TIME ZONE" => TimestampWithTz,
        "INTERVAL" => Interval,
        "JSON" => Json,
        "XML" => Xml,
        "UUID" => Uuid,
        _ => return None,
    })
}

/// Whether a computed target type truncates the source declaration (spec
/// §4.B step 4, `TypePrecisionLoss`).
#[must_use]
pub fn precision_loss(source: &SourceType, target: &TargetType) -> bool {
    match (source.length, target.length) {
        (Some(source_len), Some(target_len)) => target_len < source_len,
        _ => match (source.precision, target.precision) {
            (Some(source_p), Some(target_p)) => target_p < source_p,
            _ => false,
        },
    }
}
