//! Parses Oracle's `ALL_TAB_COLUMNS` spellings, composed by the connection
//! layer as `"VARCHAR2(4000)"`, `"NUMBER(10,2)"`, or `"NUMBER(1)"`, into
//! [`SourceType`]s.

use dbmigrate_core::{OrdinalSpace, SourceType, TypeFamily};

/// This dialect's supported families, narrowest to widest (spec §4.B
/// `native_ordinal`). Oracle has no native boolean; `NUMBER(1)` columns are
/// migrated as `Numeric` unless an external-column override says otherwise
/// (spec §4.C).
///
/// `Binary` (`RAW`) and `VarBinary` (`LONG RAW`) are kept distinct: only the
/// latter is LOB-grade and excluded from the plain-data pass when
/// `migrate_lobdata` is false (spec §4.B `is_large_binary`).
pub const ORDINAL_SPACE: OrdinalSpace = &[
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
    TypeFamily::Timestamp,
    TypeFamily::TimestampWithTz,
    TypeFamily::Interval,
    TypeFamily::Xml,
    TypeFamily::Uuid,
];

pub fn parse_source_type(declared: &str) -> SourceType {
    let trimmed = declared.trim();
    let upper = trimmed.to_ascii_uppercase();
    let (bare, args) = match upper.find('(') {
        Some(open) if upper.ends_with(')') => (&upper[..open], Some(&upper[open + 1..upper.len() - 1])),
        _ => (upper.as_str(), None),
    };

    let family = match bare.trim() {
        "VARCHAR2" => TypeFamily::Varchar,
        "NVARCHAR2" => TypeFamily::NVarchar,
        "CHAR" => TypeFamily::Char,
        "NCHAR" => TypeFamily::NChar,
        "CLOB" => TypeFamily::Clob,
        "NCLOB" => TypeFamily::NClob,
        "RAW" => TypeFamily::Binary,
        "LONG RAW" => TypeFamily::VarBinary,
        "BLOB" | "BFILE" => TypeFamily::Blob,
        "NUMBER" => TypeFamily::Numeric,
        "FLOAT" => TypeFamily::Real,
        "BINARY_FLOAT" => TypeFamily::Real,
        "BINARY_DOUBLE" => TypeFamily::Double,
        "DATE" => TypeFamily::Date,
        name if name.starts_with("TIMESTAMP") && name.contains("TIME ZONE") => TypeFamily::TimestampWithTz,
        name if name.starts_with("TIMESTAMP") => TypeFamily::Timestamp,
        name if name.starts_with("INTERVAL") => TypeFamily::Interval,
        "XMLTYPE" => TypeFamily::Xml,
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
        TypeFamily::Char | TypeFamily::NChar | TypeFamily::Varchar | TypeFamily::NVarchar | TypeFamily::Binary => {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_varchar2_with_length() {
        let source_type = parse_source_type("VARCHAR2(4000)");
        assert_eq!(source_type.family, TypeFamily::Varchar);
        assert_eq!(source_type.length, Some(4000));
    }

    #[test]
    fn parses_number_with_precision_and_scale() {
        let source_type = parse_source_type("NUMBER(10,2)");
        assert_eq!(source_type.precision, Some(10));
        assert_eq!(source_type.scale, Some(2));
    }

    #[test]
    fn timestamp_with_time_zone_is_distinguished() {
        assert_eq!(parse_source_type("TIMESTAMP(6) WITH TIME ZONE").family, TypeFamily::TimestampWithTz);
        assert_eq!(parse_source_type("TIMESTAMP(6)").family, TypeFamily::Timestamp);
    }
}
