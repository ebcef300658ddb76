use dbmigrate_core::{ColumnRef, ConnectionParams, DialectAdapter, Engine, OrdinalSpace, SourceType, TableDescriptor};

use crate::types::{self, ORDINAL_SPACE};

/// The pure SQL-synthesis half of the SQL Server dialect (spec §4.A). Holds
/// no connection state; one instance is shared across a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerAdapter;

impl DialectAdapter for SqlServerAdapter {
    fn engine(&self) -> Engine {
        Engine::SqlServer
    }

    fn ordinal_space(&self) -> OrdinalSpace {
        ORDINAL_SPACE
    }

    fn parse_source_type(&self, declared: &str) -> SourceType {
        types::parse_source_type(declared)
    }

    // Dedicated connection parameters for this engine (spec §9 Open Question,
    // fixing the original's bug of reading the Postgres params for SQL
    // Server); each adapter reads only its own engine's `ConnectionParams`.
    fn connection_uri(&self, params: &ConnectionParams) -> String {
        format!("mssql://{}:{}@{}:{}/{}", params.user, params.pwd, params.host, params.port, params.name)
    }

    fn bulk_insert_stmt(&self, schema: &str, table: &str, columns: &[ColumnRef]) -> String {
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        format!("INSERT INTO [{schema}].[{table}] ({}) VALUES ({placeholders})", names.join(", "))
    }

    fn drop_table_stmt(&self, qualified_name: &str) -> String {
        format!("IF OBJECT_ID('{qualified_name}', 'U') IS NOT NULL DROP TABLE {qualified_name}")
    }

    fn drop_view_stmt(&self, qualified_name: &str) -> String {
        format!("IF OBJECT_ID('{qualified_name}', 'V') IS NOT NULL DROP VIEW {qualified_name}")
    }

    fn create_schema_stmt(&self, schema: &str, owner: &str) -> String {
        format!("IF NOT EXISTS (SELECT 1 FROM sys.schemas WHERE name = '{schema}') EXEC('CREATE SCHEMA [{schema}] AUTHORIZATION [{owner}]')")
    }

    fn create_table_stmt(&self, table: &TableDescriptor) -> String {
        let mut columns = Vec::with_capacity(table.columns.len());
        for column in &table.columns {
            let mut def = format!("[{}] {}", column.name, column.source_type.raw);
            if !column.nullable {
                def.push_str(" NOT NULL");
            }
            if let Some(default) = &column.default {
                def.push_str(&format!(" DEFAULT {default}"));
            }
            columns.push(def);
        }

        let primary_key: Vec<String> = table.columns.iter().filter(|c| c.primary_key).map(|c| format!("[{}]", c.name)).collect();
        if !primary_key.is_empty() {
            columns.push(format!("PRIMARY KEY ({})", primary_key.join(", ")));
        }

        format!("CREATE TABLE [{}].[{}] (\n  {}\n)", table.schema, table.name, columns.join(",\n  "))
    }

    // SQL Server has no session-level bulk-load toggle this spec's scope
    // needs; spec §9 Open Question confirms this as a genuine no-op.
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_insert_uses_question_mark_placeholders() {
        let stmt = SqlServerAdapter.bulk_insert_stmt("dbo", "emp", &[ColumnRef { name: "id".to_string() }]);
        assert_eq!(stmt, "INSERT INTO [dbo].[emp] (id) VALUES (?)");
    }

    #[test]
    fn drop_table_checks_object_id_before_dropping() {
        assert!(SqlServerAdapter.drop_table_stmt("dbo.emp").contains("OBJECT_ID"));
    }
}
