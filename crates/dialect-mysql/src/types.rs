//! Parses MySQL's `information_schema.COLUMNS.COLUMN_TYPE` spellings (e.g.
//! `"varchar(50)"`, `"decimal(10,2)"`, `"tinyint(1) unsigned"`) into
//! [`SourceType`]s.

use dbmigrate_core::{OrdinalSpace, SourceType, TypeFamily};

/// This dialect's supported families, narrowest to widest (spec §4.B
/// `native_ordinal`). MySQL's `tinyint(1)` doubles as boolean, so `Boolean`
/// sits alongside the integer family it is stored as.
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
    TypeFamily::Blob,
    TypeFamily::Date,
    TypeFamily::Time,
    TypeFamily::Timestamp,
    TypeFamily::Json,
    TypeFamily::Uuid,
];

pub fn parse_source_type(declared: &str) -> SourceType {
    let trimmed = declared.trim();
    let lowered = trimmed.to_ascii_lowercase();
    let without_unsigned = lowered.trim_end_matches(" unsigned").trim_end_matches(" zerofill").trim();
    let (bare, args) = match without_unsigned.find('(') {
        Some(open) if without_unsigned.ends_with(')') => (&without_unsigned[..open], Some(&without_unsigned[open + 1..without_unsigned.len() - 1])),
        _ => (without_unsigned, None),
    };

    if bare.trim() == "tinyint" && args == Some("1") {
        return SourceType::simple(TypeFamily::Boolean, trimmed);
    }

    let family = match bare.trim() {
        "tinyint" | "smallint" => TypeFamily::SmallInt,
        "mediumint" | "int" | "integer" => TypeFamily::Integer,
        "bigint" => TypeFamily::BigInt,
        "decimal" | "numeric" => TypeFamily::Numeric,
        "float" => TypeFamily::Real,
        "double" | "double precision" => TypeFamily::Double,
        "char" => TypeFamily::Char,
        "varchar" => TypeFamily::Varchar,
        "tinytext" | "text" | "mediumtext" | "longtext" => TypeFamily::Clob,
        "binary" => TypeFamily::Binary,
        "varbinary" => TypeFamily::VarBinary,
        "tinyblob" | "blob" | "mediumblob" | "longblob" => TypeFamily::Blob,
        "date" => TypeFamily::Date,
        "time" => TypeFamily::Time,
        "datetime" | "timestamp" => TypeFamily::Timestamp,
        "json" => TypeFamily::Json,
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
