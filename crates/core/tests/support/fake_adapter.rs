//! An in-memory `DialectAdapter` shared by both ends of a fake migration,
//! so the seed scenarios of §8 can run without a live database.

use dbmigrate_core::{ColumnRef, ConnectionParams, DialectAdapter, Engine, OrdinalSpace, SourceType, TableDescriptor, TypeFamily};

#[derive(Debug, Clone, Copy)]
pub struct FakeAdapter(pub Engine);

pub const ORDINAL_SPACE: OrdinalSpace = &[
    TypeFamily::Boolean,
    TypeFamily::SmallInt,
    TypeFamily::Integer,
    TypeFamily::BigInt,
    TypeFamily::Numeric,
    TypeFamily::Real,
    TypeFamily::Double,
    TypeFamily::Char,
    TypeFamily::Varchar,
    TypeFamily::Clob,
    TypeFamily::Blob,
    TypeFamily::Date,
    TypeFamily::Timestamp,
];

impl DialectAdapter for FakeAdapter {
    fn engine(&self) -> Engine {
        self.0
    }

    fn ordinal_space(&self) -> OrdinalSpace {
        ORDINAL_SPACE
    }

    fn parse_source_type(&self, declared: &str) -> SourceType {
        parse_fake_type(declared)
    }

    fn connection_uri(&self, _params: &ConnectionParams) -> String {
        String::new()
    }

    fn bulk_insert_stmt(&self, schema: &str, table: &str, columns: &[ColumnRef]) -> String {
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${n}")).collect();
        format!("INSERT INTO {schema}.{table} ({}) VALUES ({})", names.join(","), placeholders.join(","))
    }

    fn drop_table_stmt(&self, qualified_name: &str) -> String {
        format!("DROP TABLE {qualified_name}")
    }

    fn drop_view_stmt(&self, qualified_name: &str) -> String {
        format!("DROP VIEW {qualified_name}")
    }

    fn create_schema_stmt(&self, schema: &str, _owner: &str) -> String {
        format!("CREATE SCHEMA {schema}")
    }

    fn create_table_stmt(&self, table: &TableDescriptor) -> String {
        let columns: Vec<String> = table.columns.iter().map(|c| format!("{}:{}", c.name, c.source_type.raw)).collect();
        format!("CREATE TABLE {}.{} ({})", table.schema, table.name, columns.join(","))
    }
}

/// Parses the handful of spellings the seed scenarios need: `NUMBER(p,s)`,
/// `VARCHAR2(n)`, `INTEGER`, `BLOB`. Not a stand-in for any real dialect's
/// catalog spellings, just enough surface for the fixtures below.
pub fn parse_fake_type(declared: &str) -> SourceType {
    let trimmed = declared.trim();
    let upper = trimmed.to_ascii_uppercase();
    let (bare, args) = match upper.find('(') {
        Some(open) if upper.ends_with(')') => (&upper[..open], Some(&upper[open + 1..upper.len() - 1])),
        _ => (upper.as_str(), None),
    };

    let family = match bare {
        "NUMBER" | "NUMERIC" => TypeFamily::Numeric,
        "VARCHAR2" | "VARCHAR" => TypeFamily::Varchar,
        "INTEGER" | "INT" => TypeFamily::Integer,
        "BLOB" => TypeFamily::Blob,
        "DATE" => TypeFamily::Date,
        _ => TypeFamily::Other,
    };

    match family {
        TypeFamily::Numeric => {
            let mut parts = args.unwrap_or_default().splitn(2, ',').map(str::trim);
            SourceType {
                family,
                precision: parts.next().and_then(|p| p.parse().ok()),
                scale: parts.next().and_then(|s| s.parse().ok()),
                length: None,
                raw: trimmed.to_string(),
            }
        }
        TypeFamily::Varchar => SourceType {
            family,
            precision: None,
            scale: None,
            length: args.and_then(|a| a.parse().ok()),
            raw: trimmed.to_string(),
        },
        _ => SourceType::simple(family, trimmed),
    }
}
