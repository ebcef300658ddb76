//! Parses `pg_catalog.format_type` spellings (e.g. `"character varying(50)"`,
//! `"numeric(10,2)"`) into [`SourceType`]s.

use dbmigrate_core::{OrdinalSpace, SourceType, TypeFamily};

/// This dialect's supported families, narrowest to widest (spec §4.B
/// `native_ordinal`).
pub const ORDINAL_SPACE: OrdinalSpace = &[
    TypeFamily::Boolean,
    TypeFamily::SmallInt,
    TypeFamily::Integer,
    TypeFamily::BigInt,
    TypeFamily::Real,
    TypeFamily::Double,
    TypeFamily::Numeric,
    TypeFamily::Char,
    TypeFamily::Varchar,
    TypeFamily::Clob,
    TypeFamily::Binary,
    TypeFamily::VarBinary,
    TypeFamily::Date,
    TypeFamily::Time,
    TypeFamily::Timestamp,
    TypeFamily::TimestampWithTz,
    TypeFamily::Interval,
    TypeFamily::Json,
    TypeFamily::Xml,
    TypeFamily::Uuid,
];

pub fn parse_source_type(declared: &str) -> SourceType {
    let trimmed = declared.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let (bare, args) = match lowered.find('(') {
        Some(open) if lowered.ends_with(')') => (&lowered[..open], Some(&lowered[open + 1..lowered.len() - 1])),
        _ => (lowered.as_str(), None),
    };

    let family = match bare.trim() {
        "character varying" | "varchar" => TypeFamily::Varchar,
        "character" | "char" | "bpchar" => TypeFamily::Char,
        "text" => TypeFamily::Clob,
        "bytea" => TypeFamily::VarBinary,
        "smallint" | "int2" => TypeFamily::SmallInt,
        "integer" | "int" | "int4" => TypeFamily::Integer,
        "bigint" | "int8" => TypeFamily::BigInt,
        "numeric" | "decimal" => TypeFamily::Numeric,
        "real" | "float4" => TypeFamily::Real,
        "double precision" | "float8" => TypeFamily::Double,
        "boolean" | "bool" => TypeFamily::Boolean,
        "date" => TypeFamily::Date,
        "time without time zone" | "time" | "time with time zone" => TypeFamily::Time,
        "timestamp without time zone" | "timestamp" => TypeFamily::Timestamp,
        "timestamp with time zone" | "timestamptz" => TypeFamily::TimestampWithTz,
        "interval" => TypeFamily::Interval,
        "json" | "jsonb" => TypeFamily::Json,
        "xml" => TypeFamily::Xml,
        "uuid" => TypeFamily::Uuid,
        _ => TypeFamily::Other,
    };

    match family {
        TypeFamily::Numeric => {
            let mut parts = args.unwrap_or_default().splitn(2, ',').map(str::trim);
            let precision = parts.next().and_then(|p| p.parse().ok());
            let scale = parts.next().and_then(|s| s.parse().ok());
            SourceType {
                family,
                precision,
                scale,
                length: None,
                raw: trimmed.to_string(),
            }
        }
        TypeFamily::Char | TypeFamily::Varchar | TypeFamily::Binary | TypeFamily::VarBinary => {
            let length = args.and_then(|a| a.parse().ok());
            SourceType {
                family,
                precision: None,
                scale: None,
                length,
                raw: trimmed.to_string(),
            }
        }
        _ => SourceType::simple(family, trimmed),
    }
}
