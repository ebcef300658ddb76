//! Parses SQL Server's `sys.types`/`INFORMATION_SCHEMA.COLUMNS` spellings,
//! composed by the connection layer as `"nvarchar(50)"`, `"decimal(10,2)"`,
//! or `"nvarchar(max)"`, into [`SourceType`]s.

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
        "bit" => TypeFamily::Boolean,
        "tinyint" | "smallint" => TypeFamily::SmallInt,
        "int" => TypeFamily::Integer,
        "bigint" => TypeFamily::BigInt,
        "decimal" | "numeric" | "money" | "smallmoney" => TypeFamily::Numeric,
        "float" => TypeFamily::Double,
        "real" => TypeFamily::Real,
        "char" => TypeFamily::Char,
        "nchar" => TypeFamily::NChar,
        "varchar" => TypeFamily::Varchar,
        "nvarchar" => TypeFamily::NVarchar,
        "text" => TypeFamily::Clob,
        "ntext" => TypeFamily::NClob,
        "binary" => TypeFamily::Binary,
        "varbinary" => TypeFamily::VarBinary,
        "image" => TypeFamily::Blob,
        "date" => TypeFamily::Date,
        "time" => TypeFamily::Time,
        "datetime" | "datetime2" | "smalldatetime" => TypeFamily::Timestamp,
        "datetimeoffset" => TypeFamily::TimestampWithTz,
        "uniqueidentifier" => TypeFamily::Uuid,
        "xml" => TypeFamily::Xml,
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
        TypeFamily::Char | TypeFamily::NChar | TypeFamily::Varchar | TypeFamily::NVarchar | TypeFamily::Binary | TypeFamily::VarBinary => {
            let length = args.filter(|a| *a != "max").and_then(|a| a.parse().ok());
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nvarchar_with_length() {
        let source_type = parse_source_type("nvarchar(50)");
        assert_eq!(source_type.family, TypeFamily::NVarchar);
        assert_eq!(source_type.length, Some(50));
    }

    #[test]
    fn nvarchar_max_has_no_length_cap() {
        let source_type = parse_source_type("nvarchar(max)");
        assert_eq!(source_type.length, None);
    }

    #[test]
    fn parses_decimal_precision_and_scale() {
        let source_type = parse_source_type("decimal(18,4)");
        assert_eq!(source_type.precision, Some(18));
        assert_eq!(source_type.scale, Some(4));
    }
}
