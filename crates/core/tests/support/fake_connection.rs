//! An in-memory `Connection`, backed by a shared catalog so a source and a
//! target fixture can be built and inspected independently (spec §8 seed
//! scenarios).

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use dbmigrate_core::{ColumnDescriptor, Connection, MigrationError, MigrationErrorKind, Result, TableDescriptor};

use super::fake_adapter::parse_fake_type;

#[derive(Debug, Clone, Default)]
pub struct FakeTable {
    pub columns: Vec<ColumnDescriptor>,
    pub row_count: u64,
}

#[derive(Debug, Default)]
pub struct CatalogState {
    /// schema name -> table name -> table
    schemas: BTreeMap<String, BTreeMap<String, FakeTable>>,
}

#[derive(Debug, Clone, Default)]
pub struct Catalog(Arc<Mutex<CatalogState>>);

impl Catalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_schema(&self, name: &str) {
        self.0.lock().expect("catalog mutex should lock").schemas.entry(name.to_string()).or_default();
    }

    pub fn create_table(&self, schema: &str, name: &str, table: FakeTable) {
        self.0
            .lock()
            .expect("catalog mutex should lock")
            .schemas
            .entry(schema.to_string())
            .or_default()
            .insert(name.to_string(), table);
    }

    pub fn connection(&self) -> FakeConnection {
        FakeConnection { catalog: self.clone() }
    }
}

#[derive(Debug, Clone)]
pub struct FakeConnection {
    catalog: Catalog,
}

impl Connection for FakeConnection {
    fn reflect_schema(&mut self, schema: &str) -> Result<Vec<TableDescriptor>> {
        let state = self.catalog.0.lock().expect("catalog mutex should lock");
        let Some(tables) = state.schemas.get(schema) else {
            return Ok(vec![]);
        };
        Ok(tables
            .iter()
            .enumerate()
            .map(|(rank, (name, table))| TableDescriptor {
                schema: schema.to_string(),
                name: name.clone(),
                columns: table.columns.clone(),
                creation_order_rank: rank,
            })
            .collect())
    }

    fn schema_names(&mut self) -> Result<Vec<String>> {
        Ok(self.catalog.0.lock().expect("catalog mutex should lock").schemas.keys().cloned().collect())
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        if let Some(schema) = sql.strip_prefix("CREATE SCHEMA ") {
            self.catalog.create_schema(schema.trim());
            return Ok(());
        }
        if let Some(rest) = sql.strip_prefix("DROP TABLE ") {
            if let Some((schema, table)) = rest.split_once('.') {
                self.catalog.0.lock().expect("catalog mutex should lock").schemas.entry(schema.to_string()).or_default().remove(table);
            }
            return Ok(());
        }
        if let Some(rest) = sql.strip_prefix("CREATE TABLE ") {
            let (qualified, columns) = rest.split_once(" (").ok_or_else(|| {
                MigrationError::new(MigrationErrorKind::DdlFailed, sql, "fake CREATE TABLE missing column list")
            })?;
            let (schema, table) = qualified
                .split_once('.')
                .ok_or_else(|| MigrationError::new(MigrationErrorKind::DdlFailed, sql, "fake CREATE TABLE missing schema qualifier"))?;
            let columns = columns.trim_end_matches(')');
            let columns: Vec<ColumnDescriptor> = columns
                .split(',')
                .filter(|spec| !spec.is_empty())
                .map(|spec| {
                    let (name, declared) = spec.split_once(':').unwrap_or((spec, ""));
                    ColumnDescriptor {
                        name: name.to_string(),
                        source_type: parse_fake_type(declared),
                        nullable: true,
                        default: None,
                        server_default: None,
                        primary_key: false,
                        foreign_key: None,
                    }
                })
                .collect();
            self.catalog.create_table(schema, table, FakeTable { columns, row_count: 0 });
            return Ok(());
        }
        Ok(())
    }

    fn bulk_copy(&mut self, select_stmt: &str, _insert_stmt: &str, _target: &mut dyn Connection, _batch_size: u32) -> Result<u64> {
        let Some(rest) = select_stmt.split_once(" FROM ") else {
            return Ok(0);
        };
        let Some((schema, table)) = rest.1.split_once('.') else {
            return Ok(0);
        };
        let state = self.catalog.0.lock().expect("catalog mutex should lock");
        Ok(state.schemas.get(schema).and_then(|tables| tables.get(table)).map_or(0, |table| table.row_count))
    }
}
