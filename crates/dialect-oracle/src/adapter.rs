use dbmigrate_core::{ColumnRef, ConnectionParams, DialectAdapter, Engine, OrdinalSpace, SourceType, TableDescriptor};

use crate::types::{self, ORDINAL_SPACE};

/// The pure SQL-synthesis half of the Oracle dialect (spec §4.A). Holds no
/// connection state; one instance is shared across a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct OracleAdapter;

impl DialectAdapter for OracleAdapter {
    fn engine(&self) -> Engine {
        Engine::Oracle
    }

    fn ordinal_space(&self) -> OrdinalSpace {
        ORDINAL_SPACE
    }

    fn parse_source_type(&self, declared: &str) -> SourceType {
        types::parse_source_type(declared)
    }

    fn connection_uri(&self, params: &ConnectionParams) -> String {
        format!("{}/{}@{}:{}/{}", params.user, params.pwd, params.host, params.port, params.name)
    }

    fn bulk_insert_stmt(&self, schema: &str, table: &str, columns: &[ColumnRef]) -> String {
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!(":{n}")).collect();
        format!("INSERT INTO {schema}.{table} ({}) VALUES ({})", names.join(", "), placeholders.join(", "))
    }

    fn drop_table_stmt(&self, qualified_name: &str) -> String {
        format!(
            "BEGIN EXECUTE IMMEDIATE 'DROP TABLE {qualified_name} CASCADE CONSTRAINTS'; EXCEPTION WHEN OTHERS THEN IF SQLCODE != -942 THEN RAISE; END IF; END;"
        )
    }

    fn drop_view_stmt(&self, qualified_name: &str) -> String {
        format!(
            "BEGIN EXECUTE IMMEDIATE 'DROP VIEW {qualified_name}'; EXCEPTION WHEN OTHERS THEN IF SQLCODE != -942 THEN RAISE; END IF; END;"
        )
    }

    fn create_schema_stmt(&self, schema: &str, owner: &str) -> String {
        format!("CREATE USER {schema} IDENTIFIED BY {owner}")
    }

    fn create_table_stmt(&self, table: &TableDescriptor) -> String {
        let mut columns = Vec::with_capacity(table.columns.len());
        for column in &table.columns {
            let mut def = format!("{} {}", column.name, column.source_type.raw);
            if !column.nullable {
                def.push_str(" NOT NULL");
            }
            if let Some(default) = &column.default {
                def.push_str(&format!(" DEFAULT {default}"));
            }
            columns.push(def);
        }

        let primary_key: Vec<&str> = table.columns.iter().filter(|c| c.primary_key).map(|c| c.name.as_str()).collect();
        if !primary_key.is_empty() {
            columns.push(format!("PRIMARY KEY ({})", primary_key.join(", ")));
        }

        format!("CREATE TABLE {}.{} (\n  {}\n)", table.schema, table.name, columns.join(",\n  "))
    }

    // Oracle has no session-level bulk-load toggle this spec's scope needs;
    // spec §9 Open Question confirms this as a genuine no-op.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_insert_uses_colon_placeholders() {
        let stmt = OracleAdapter.bulk_insert_stmt("HR", "EMP", &[ColumnRef { name: "ID".to_string() }, ColumnRef { name: "NAME".to_string() }]);
        assert_eq!(stmt, "INSERT INTO HR.EMP (ID, NAME) VALUES (:1, :2)");
    }

    #[test]
    fn drop_table_swallows_object_not_found() {
        assert!(OracleAdapter.drop_table_stmt("HR.EMP").contains("-942"));
    }

    #[test]
    fn drop_table_cascades_constraints() {
        assert!(OracleAdapter.drop_table_stmt("HR.EMP").contains("CASCADE CONSTRAINTS"));
    }
}
