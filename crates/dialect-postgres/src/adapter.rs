use dbmigrate_core::{ColumnRef, ConnectionParams, DialectAdapter, Engine, OrdinalSpace, SourceType, TableDescriptor};

use crate::types::{self, ORDINAL_SPACE};

/// The pure SQL-synthesis half of the PostgreSQL dialect (spec §4.A). Holds
/// no connection state; one instance is shared across a run.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresAdapter;

impl DialectAdapter for PostgresAdapter {
    fn engine(&self) -> Engine {
        Engine::Postgres
    }

    fn ordinal_space(&self) -> OrdinalSpace {
        ORDINAL_SPACE
    }

    fn parse_source_type(&self, declared: &str) -> SourceType {
        types::parse_source_type(declared)
    }

    fn connection_uri(&self, params: &ConnectionParams) -> String {
        format!("postgres://{}:{}@{}:{}/{}", params.user, params.pwd, params.host, params.port, params.name)
    }

    fn bulk_insert_stmt(&self, schema: &str, table: &str, columns: &[ColumnRef]) -> String {
        let names: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${n}")).collect();
        format!("INSERT INTO {schema}.{table} ({}) VALUES ({})", names.join(", "), placeholders.join(", "))
    }

    fn drop_table_stmt(&self, qualified_name: &str) -> String {
        format!("DROP TABLE IF EXISTS {qualified_name} CASCADE")
    }

    fn drop_view_stmt(&self, qualified_name: &str) -> String {
        format!("DROP VIEW IF EXISTS {qualified_name} CASCADE")
    }

    fn create_schema_stmt(&self, schema: &str, owner: &str) -> String {
        format!("CREATE SCHEMA IF NOT EXISTS {schema} AUTHORIZATION {owner}")
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

    fn disable_session_restrictions(&self, connection: &mut dyn dbmigrate_core::Connection) -> dbmigrate_core::Result<()> {
        connection.execute("SET session_replication_role = 'replica'")
    }

    fn restore_session_restrictions(&self, connection: &mut dyn dbmigrate_core::Connection) -> dbmigrate_core::Result<()> {
        connection.execute("SET session_replication_role = DEFAULT")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_insert_uses_dollar_placeholders() {
        let stmt = PostgresAdapter.bulk_insert_stmt("hr", "emp", &[ColumnRef { name: "id".to_string() }, ColumnRef { name: "name".to_string() }]);
        assert_eq!(stmt, "INSERT INTO hr.emp (id, name) VALUES ($1, $2)");
    }

    #[test]
    fn drop_table_is_idempotent_and_cascades() {
        assert_eq!(PostgresAdapter.drop_table_stmt("hr.emp"), "DROP TABLE IF EXISTS hr.emp CASCADE");
    }

    #[test]
    fn session_restrictions_toggle_between_replica_and_default() {
        struct RecordingConnection(Vec<String>);
        impl dbmigrate_core::Connection for RecordingConnection {
            fn reflect_schema(&mut self, _schema: &str) -> dbmigrate_core::Result<Vec<TableDescriptor>> {
                Ok(vec![])
            }
            fn schema_names(&mut self) -> dbmigrate_core::Result<Vec<String>> {
                Ok(vec![])
            }
            fn execute(&mut self, sql: &str) -> dbmigrate_core::Result<()> {
                self.0.push(sql.to_string());
                Ok(())
            }
            fn bulk_copy(&mut self, _select_stmt: &str, _insert_stmt: &str, _target: &mut dyn dbmigrate_core::Connection, _batch_size: u32) -> dbmigrate_core::Result<u64> {
                Ok(0)
            }
        }

        let mut connection = RecordingConnection(Vec::new());
        PostgresAdapter.disable_session_restrictions(&mut connection).unwrap();
        PostgresAdapter.restore_session_restrictions(&mut connection).unwrap();

        assert_eq!(connection.0, vec!["SET session_replication_role = 'replica'", "SET session_replication_role = DEFAULT"]);
    }
}
