//! The Bulk Copy Engine (spec §4.E): per-table streaming copy with
//! LOB-column exclusion and session-restriction scoping.

use crate::adapter::{ColumnRef, Connection, DialectAdapter};
use crate::error::{Errors, MigrationError, MigrationErrorKind, Result};
use crate::reflect::TableDescriptor;
use crate::report::{CopyStatus, MigratedTable};
use crate::types::is_large_binary;

/// Scoped acquisition of the target's session restrictions, guaranteeing
/// restoration on every exit path, including an early return or an
/// unwinding panic.
pub struct SessionRestrictionGuard<'a> {
    adapter: &'a dyn DialectAdapter,
    connection: &'a mut dyn Connection,
}

impl<'a> SessionRestrictionGuard<'a> {
    /// Disables session restrictions on `connection` and returns a guard
    /// that restores them when dropped.
    pub fn acquire(adapter: &'a dyn DialectAdapter, connection: &'a mut dyn Connection) -> Result<Self> {
        adapter.disable_session_restrictions(&mut *connection)?;
        Ok(Self { adapter, connection })
    }

    pub fn connection(&mut self) -> &mut dyn Connection {
        &mut *self.connection
    }
}

impl Drop for SessionRestrictionGuard<'_> {
    fn drop(&mut self) {
        if let Err(error) = self.adapter.restore_session_restrictions(&mut *self.connection) {
            tracing::warn!(%error, "failed to restore target session restrictions");
        }
    }
}

/// Runs the six-step copy algorithm of spec §4.E for every table in
/// `source_tables`/`target_tables` (aligned by index, per
/// [`crate::pipeline::PipelineOutcome`]), folding the outcome into
/// `migrated` (aligned the same way) and returning the accumulated errors.
#[tracing::instrument(skip_all)]
pub fn migrate_plain_data(
    source: &mut dyn Connection,
    target: &mut dyn Connection,
    target_adapter: &dyn DialectAdapter,
    source_schema: &str,
    source_tables: &[TableDescriptor],
    target_tables: &[TableDescriptor],
    migrated: &mut [MigratedTable],
    migrate_lobdata: bool,
    batch_size: u32,
) -> Errors {
    let mut errors = Errors::new();

    let mut guard = match SessionRestrictionGuard::acquire(target_adapter, target) {
        Ok(guard) => guard,
        Err(error) => {
            errors.push(error);
            return errors;
        }
    };

    for ((source_table, target_table), record) in source_tables.iter().zip(target_tables).zip(migrated.iter_mut()) {
        copy_table(source, guard.connection(), target_adapter, source_schema, source_table, target_table, record, migrate_lobdata, batch_size, &mut errors);
    }

    errors
}

#[allow(clippy::too_many_arguments)]
fn copy_table(
    source: &mut dyn Connection,
    target: &mut dyn Connection,
    target_adapter: &dyn DialectAdapter,
    source_schema: &str,
    source_table: &TableDescriptor,
    target_table: &TableDescriptor,
    record: &mut MigratedTable,
    migrate_lobdata: bool,
    batch_size: u32,
    errors: &mut Errors,
) {
    // Step 1: compose the column list, excluding large-binary columns when
    // LOB migration is disabled.
    let columns: Vec<&str> = source_table
        .columns
        .iter()
        .filter(|column| migrate_lobdata || !is_large_binary(&column.source_type))
        .map(|column| column.name.as_str())
        .collect();

    if columns.is_empty() {
        record.status = CopyStatus::Full;
        record.count = 0;
        return;
    }

    // Step 2: SELECT from the source.
    let select_stmt = format!("SELECT {} FROM {source_schema}.{}", columns.join(", "), source_table.name);

    // Step 3: INSERT into the target, dialect-native placeholders.
    let column_refs: Vec<ColumnRef> = columns.iter().map(|name| ColumnRef { name: (*name).to_string() }).collect();
    let insert_stmt = target_adapter.bulk_insert_stmt(&target_table.schema, &target_table.name, &column_refs);

    // Steps 4/6: stream in batches, then account for the outcome.
    match source.bulk_copy(&select_stmt, &insert_stmt, target, batch_size) {
        Ok(count) => {
            record.count = count;
            record.status = CopyStatus::from_outcome(count, false);
        }
        Err(error) => {
            let count = 0;
            record.count = count;
            record.status = CopyStatus::from_outcome(count, true);
            errors.push(MigrationError::new(MigrationErrorKind::CopyFailed, source_table.name.clone(), error.to_string()).with_attribute("plaindata"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::reflect::ColumnDescriptor;
    use crate::types::{OrdinalSpace, SourceType, TargetType, TypeFamily};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct FakeAdapter {
        disable_calls: AtomicU32,
        restore_calls: AtomicU32,
        fail_restore: bool,
    }

    impl DialectAdapter for FakeAdapter {
        fn engine(&self) -> Engine {
            Engine::Postgres
        }

        fn ordinal_space(&self) -> OrdinalSpace {
            &[TypeFamily::Integer]
        }

        fn parse_source_type(&self, declared: &str) -> SourceType {
            SourceType::simple(TypeFamily::Other, declared)
        }

        fn connection_uri(&self, _params: &crate::config::ConnectionParams) -> String {
            String::new()
        }

        fn bulk_insert_stmt(&self, schema: &str, table: &str, columns: &[ColumnRef]) -> String {
            let placeholders: Vec<String> = (1..=columns.len()).map(|n| format!("${n}")).collect();
            format!(
                "INSERT INTO {schema}.{table} ({}) VALUES({})",
                columns.iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(","),
                placeholders.join(",")
            )
        }

        fn drop_table_stmt(&self, qualified_name: &str) -> String {
            format!("DROP TABLE IF EXISTS {qualified_name} CASCADE")
        }

        fn drop_view_stmt(&self, qualified_name: &str) -> String {
            format!("DROP VIEW IF EXISTS {qualified_name} CASCADE")
        }

        fn create_schema_stmt(&self, schema: &str, owner: &str) -> String {
            format!("CREATE SCHEMA {schema} AUTHORIZATION {owner}")
        }

        fn create_table_stmt(&self, _table: &TableDescriptor) -> String {
            String::new()
        }

        fn disable_session_restrictions(&self, _connection: &mut dyn Connection) -> Result<()> {
            self.disable_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn restore_session_restrictions(&self, _connection: &mut dyn Connection) -> Result<()> {
            self.restore_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_restore {
                return Err(MigrationError::new(MigrationErrorKind::Unexpected, "restore", "boom"));
            }
            Ok(())
        }
    }

    struct FakeConnection {
        copy_result: std::result::Result<u64, MigrationError>,
    }

    impl Connection for FakeConnection {
        fn reflect_schema(&mut self, _schema: &str) -> Result<Vec<TableDescriptor>> {
            Ok(vec![])
        }

        fn schema_names(&mut self) -> Result<Vec<String>> {
            Ok(vec![])
        }

        fn execute(&mut self, _sql: &str) -> Result<()> {
            Ok(())
        }

        fn bulk_copy(&mut self, _select_stmt: &str, _insert_stmt: &str, _target: &mut dyn Connection, _batch_size: u32) -> Result<u64> {
            self.copy_result.clone()
        }
    }

    fn descriptor(name: &str, family: TypeFamily) -> TableDescriptor {
        TableDescriptor {
            schema: "hr".to_string(),
            name: "EMP".to_string(),
            columns: vec![ColumnDescriptor {
                name: name.to_string(),
                source_type: SourceType::simple(family, "RAW"),
                nullable: true,
                default: None,
                server_default: None,
                primary_key: false,
                foreign_key: None,
            }],
            creation_order_rank: 0,
        }
    }

    #[test]
    fn lob_exclusion_yields_full_zero_count_when_no_columns_remain() {
        let source_table = descriptor("PHOTO", TypeFamily::Blob);
        let target_table = descriptor("PHOTO", TypeFamily::Blob);
        let mut record = MigratedTable::new("EMP", vec![]);
        let mut errors = Errors::new();
        let adapter = FakeAdapter {
            disable_calls: AtomicU32::new(0),
            restore_calls: AtomicU32::new(0),
            fail_restore: false,
        };
        let mut source = FakeConnection { copy_result: Ok(0) };
        let mut target = FakeConnection { copy_result: Ok(0) };

        copy_table(&mut source, &mut target, &adapter, "hr", &source_table, &target_table, &mut record, false, 1000, &mut errors);

        assert!(errors.is_empty());
        assert_eq!(record.status, CopyStatus::Full);
        assert_eq!(record.count, 0);
    }

    #[test]
    fn successful_copy_marks_table_full() {
        let source_table = descriptor("ID", TypeFamily::Integer);
        let target_table = descriptor("ID", TypeFamily::Integer);
        let mut record = MigratedTable::new("EMP", vec![]);
        let mut errors = Errors::new();
        let adapter = FakeAdapter {
            disable_calls: AtomicU32::new(0),
            restore_calls: AtomicU32::new(0),
            fail_restore: false,
        };
        let mut source = FakeConnection { copy_result: Ok(42) };
        let mut target = FakeConnection { copy_result: Ok(0) };

        copy_table(&mut source, &mut target, &adapter, "hr", &source_table, &target_table, &mut record, true, 1000, &mut errors);

        assert!(errors.is_empty());
        assert_eq!(record.status, CopyStatus::Full);
        assert_eq!(record.count, 42);
    }

    #[test]
    fn failed_copy_marks_table_partial_and_records_error() {
        let source_table = descriptor("ID", TypeFamily::Integer);
        let target_table = descriptor("ID", TypeFamily::Integer);
        let mut record = MigratedTable::new("EMP", vec![]);
        let mut errors = Errors::new();
        let adapter = FakeAdapter {
            disable_calls: AtomicU32::new(0),
            restore_calls: AtomicU32::new(0),
            fail_restore: false,
        };
        let mut source = FakeConnection {
            copy_result: Err(MigrationError::new(MigrationErrorKind::CopyFailed, "EMP", "driver disconnected")),
        };
        let mut target = FakeConnection { copy_result: Ok(0) };

        copy_table(&mut source, &mut target, &adapter, "hr", &source_table, &target_table, &mut record, true, 1000, &mut errors);

        assert_eq!(errors.len(), 1);
        assert_eq!(record.status, CopyStatus::None);
        assert_eq!(record.count, 0);
    }

    #[test]
    fn session_restriction_guard_restores_on_drop() {
        let adapter = FakeAdapter {
            disable_calls: AtomicU32::new(0),
            restore_calls: AtomicU32::new(0),
            fail_restore: false,
        };
        let mut connection = FakeConnection { copy_result: Ok(0) };
        {
            let _guard = SessionRestrictionGuard::acquire(&adapter, &mut connection).unwrap();
            assert_eq!(adapter.disable_calls.load(Ordering::SeqCst), 1);
        }
        assert_eq!(adapter.restore_calls.load(Ordering::SeqCst), 1);
    }
}
