//! The Orchestrator (spec §4.F): the public entry point. Composes the
//! Validator, the Schema Migration Pipeline, and the Bulk Copy Engine, and
//! assembles the migration report.

use crate::config::MigrationConfig;
use crate::copy;
use crate::error::Errors;
use crate::pipeline;
use crate::registry::ConnectionRegistry;
use crate::report::{MigrationReport, RdbmsSchema};
use crate::validator;

/// Runs one end-to-end migration (spec §4.F steps 1–5), grounded on the
/// teacher's `Orchestrator::run`: connect once, delegate to a sequence of
/// pure components, assemble one report. Never panics; every failure is
/// folded into the returned `Errors` and reflected in the report's
/// migrated-table statuses.
#[tracing::instrument(skip(config, registry))]
pub fn migrate(config: &MigrationConfig, registry: &dyn ConnectionRegistry) -> (MigrationReport, Errors) {
    let started = chrono::Utc::now();

    let validation = validator::validate(config, &registry.engines());
    let mut errors = validation.errors;

    let header = || RdbmsSchema {
        rdbms: config.from_rdbms.clone(),
        schema: config.from_schema.clone(),
    };
    let target_header = || RdbmsSchema {
        rdbms: config.to_rdbms.clone(),
        schema: config.to_schema.clone(),
    };

    if !errors.is_empty() {
        return (empty_report(started, header(), target_header()), errors);
    }

    let (Some(source_engine), Some(target_engine)) = (validation.source_engine, validation.target_engine) else {
        return (empty_report(started, header(), target_header()), errors);
    };

    let target_adapter = match registry.adapter(target_engine) {
        Ok(adapter) => adapter,
        Err(error) => {
            errors.push(error);
            return (empty_report(started, header(), target_header()), errors);
        }
    };

    let mut source_connection = match registry.connect(source_engine) {
        Ok(connection) => connection,
        Err(error) => {
            errors.push(error);
            return (empty_report(started, header(), target_header()), errors);
        }
    };
    let mut target_connection = match registry.connect(target_engine) {
        Ok(connection) => connection,
        Err(error) => {
            errors.push(error);
            return (empty_report(started, header(), target_header()), errors);
        }
    };

    let outcome = pipeline::migrate_metadata(
        &mut *source_connection,
        &mut *target_connection,
        target_adapter,
        target_engine,
        config,
    );
    errors.extend(outcome.errors);
    let mut migrated = outcome.migrated;

    if config.migrate_plaindata {
        let copy_errors = copy::migrate_plain_data(
            &mut *source_connection,
            &mut *target_connection,
            target_adapter,
            &outcome.source_schema,
            &outcome.source_tables,
            &outcome.tables,
            &mut migrated,
            config.migrate_lobdata,
            config.batch_size,
        );
        errors.extend(copy_errors);
    }

    let report = MigrationReport {
        started: format_timestamp(started),
        finished: format_timestamp(chrono::Utc::now()),
        source: RdbmsSchema {
            rdbms: config.from_rdbms.clone(),
            schema: outcome.source_schema,
        },
        target: RdbmsSchema {
            rdbms: config.to_rdbms.clone(),
            schema: outcome.target_schema,
        },
        migrated_tables: migrated,
    };

    (report, errors)
}

fn empty_report(started: chrono::DateTime<chrono::Utc>, source: RdbmsSchema, target: RdbmsSchema) -> MigrationReport {
    MigrationReport {
        started: format_timestamp(started),
        finished: format_timestamp(chrono::Utc::now()),
        source,
        target,
        migrated_tables: vec![],
    }
}

/// ISO-8601 timestamp rendering (spec §3 "Migration report", the Rust
/// counterpart of the original's `strftime(DATETIME_FORMAT_INV)`).
fn format_timestamp(instant: chrono::DateTime<chrono::Utc>) -> String {
    instant.to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{ColumnRef, Connection, DialectAdapter};
    use crate::config::ConnectionParams;
    use crate::engine::Engine;
    use crate::error::{MigrationError, MigrationErrorKind, Result};
    use crate::reflect::TableDescriptor;
    use crate::types::{OrdinalSpace, SourceType, TypeFamily};
    use std::collections::HashSet;

    struct NoopAdapter;

    impl DialectAdapter for NoopAdapter {
        fn engine(&self) -> Engine {
            Engine::Postgres
        }

        fn ordinal_space(&self) -> OrdinalSpace {
            &[TypeFamily::Integer]
        }

        fn parse_source_type(&self, declared: &str) -> SourceType {
            SourceType::simple(TypeFamily::Other, declared)
        }

        fn connection_uri(&self, _params: &ConnectionParams) -> String {
            String::new()
        }

        fn bulk_insert_stmt(&self, _schema: &str, _table: &str, _columns: &[ColumnRef]) -> String {
            String::new()
        }

        fn drop_table_stmt(&self, _qualified_name: &str) -> String {
            String::new()
        }

        fn drop_view_stmt(&self, _qualified_name: &str) -> String {
            String::new()
        }

        fn create_schema_stmt(&self, _schema: &str, _owner: &str) -> String {
            String::new()
        }

        fn create_table_stmt(&self, _table: &TableDescriptor) -> String {
            String::new()
        }
    }

    struct EmptyConnection;

    impl Connection for EmptyConnection {
        fn reflect_schema(&mut self, _schema: &str) -> Result<Vec<TableDescriptor>> {
            Ok(vec![])
        }

        fn schema_names(&mut self) -> Result<Vec<String>> {
            Ok(vec!["hr".to_string()])
        }

        fn execute(&mut self, _sql: &str) -> Result<()> {
            Ok(())
        }

        fn bulk_copy(&mut self, _select_stmt: &str, _insert_stmt: &str, _target: &mut dyn Connection, _batch_size: u32) -> Result<u64> {
            Ok(0)
        }
    }

    struct FakeRegistry;

    impl ConnectionRegistry for FakeRegistry {
        fn engines(&self) -> HashSet<Engine> {
            HashSet::from([Engine::Oracle, Engine::Postgres])
        }

        fn adapter(&self, _engine: Engine) -> Result<&dyn DialectAdapter> {
            static ADAPTER: NoopAdapter = NoopAdapter;
            Ok(&ADAPTER)
        }

        fn params(&self, _engine: Engine) -> Result<ConnectionParams> {
            Err(MigrationError::new(MigrationErrorKind::ConnectionUnavailable, "unused", "not needed for this fake"))
        }

        fn connect(&self, _engine: Engine) -> Result<Box<dyn Connection>> {
            Ok(Box::new(EmptyConnection))
        }
    }

    fn config() -> MigrationConfig {
        serde_json::from_value(serde_json::json!({
            "from-rdbms": "oracle",
            "to-rdbms": "postgres",
            "from-schema": "hr",
            "to-schema": "hr",
            "migrate-metadata": true,
            "migrate-plaindata": true,
            "migrate-lobdata": false,
        }))
        .unwrap()
    }

    #[test]
    fn invalid_config_short_circuits_with_empty_report() {
        let mut bad_config = config();
        bad_config.to_rdbms = "oracle".to_string();
        let (report, errors) = migrate(&bad_config, &FakeRegistry);
        assert!(!errors.is_empty());
        assert!(report.migrated_tables.is_empty());
    }

    #[test]
    fn valid_config_with_no_source_tables_returns_empty_migrated_list() {
        let (report, errors) = migrate(&config(), &FakeRegistry);
        assert!(errors.is_empty(), "{errors:?}");
        assert!(report.migrated_tables.is_empty());
        assert_eq!(report.source.rdbms, "oracle");
        assert_eq!(report.target.rdbms, "postgres");
    }
}
