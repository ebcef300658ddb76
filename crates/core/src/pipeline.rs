//! The Schema Migration Pipeline (spec §4.D): reflect, filter, resolve the
//! target schema, drop colliding tables, rewrite column types, create.

use std::collections::{HashMap, HashSet};

use crate::adapter::{Connection, DialectAdapter};
use crate::config::{ExternalColumn, MigrationConfig, TableSelection};
use crate::engine::Engine;
use crate::error::{Errors, MigrationError, MigrationErrorKind};
use crate::reflect::{ColumnDescriptor, TableDescriptor, is_pseudo_function_default};
use crate::report::{MigratedColumn, MigratedTable};
use crate::types::{self, ExternalOverrides, TargetType, TypeFamily};

/// The outcome of running the pipeline: the rewritten (target-schema,
/// target-typed) tables ready for `CREATE TABLE`, the seed migrated-table
/// records (`count=0`, `status=none` per spec §4.D), and any non-fatal
/// errors accumulated along the way.
#[derive(Debug, Default)]
pub struct PipelineOutcome {
    /// The source-dialect tables as filtered and dependency-sorted (step 2),
    /// before type rewriting. Retained so the Bulk Copy Engine can tell
    /// which columns are large-binary on the *source* side without
    /// re-reflecting.
    pub source_tables: Vec<TableDescriptor>,
    /// The same tables rewritten onto the target schema and target types
    /// (step 5), ready for `CREATE TABLE` and for building the INSERT side
    /// of the copy.
    pub tables: Vec<TableDescriptor>,
    pub migrated: Vec<MigratedTable>,
    /// The catalog-cased source schema name resolved in step 1 (spec §3
    /// "Schema identity"), needed by the Bulk Copy Engine's `SELECT`.
    pub source_schema: String,
    /// The catalog-cased target schema name resolved/created in step 3.
    pub target_schema: String,
    pub errors: Errors,
}

impl PipelineOutcome {
    fn aborted(errors: Errors) -> Self {
        Self {
            source_tables: vec![],
            tables: vec![],
            migrated: vec![],
            source_schema: String::new(),
            target_schema: String::new(),
            errors,
        }
    }
}

/// Runs the six-step pipeline algorithm of spec §4.D.
#[tracing::instrument(skip(source, target, target_adapter, config))]
pub fn migrate_metadata(
    source: &mut dyn Connection,
    target: &mut dyn Connection,
    target_adapter: &dyn DialectAdapter,
    target_engine: Engine,
    config: &MigrationConfig,
) -> PipelineOutcome {
    let mut errors = Errors::new();

    // Step 1: reflect source schema.
    let Some(source_schema) = resolve_schema_name(source, &config.from_schema, "from-schema", &mut errors) else {
        return PipelineOutcome::aborted(errors);
    };

    let mut tables = match source.reflect_schema(&source_schema) {
        Ok(tables) => tables,
        Err(error) => {
            errors.push(error);
            return PipelineOutcome::aborted(errors);
        }
    };

    let selection = config.table_selection();
    if let TableSelection::Include(names) = &selection {
        let present: HashSet<&str> = tables.iter().map(|table| table.name.as_str()).collect();
        let missing: Vec<&str> = names.iter().map(String::as_str).filter(|name| !present.contains(name)).collect();
        if !missing.is_empty() {
            errors.push(MigrationError::new(
                MigrationErrorKind::TableNotFound,
                missing.join(", "),
                "requested table(s) not found in source schema",
            ));
            return PipelineOutcome::aborted(errors);
        }
    }

    // Step 2: filter, then sort by FK dependency (parents before children).
    apply_table_selection(&mut tables, &selection);
    tables.sort_by_key(|table| table.creation_order_rank);

    // Step 3: resolve target schema, creating it if absent.
    let Some(target_schema) = resolve_or_create_target_schema(target, target_adapter, &config.to_schema, &mut errors) else {
        return PipelineOutcome::aborted(errors);
    };

    // Step 4: drop colliding target tables, in reverse dependency order.
    // Each drop is independent; failures are collected, not fatal here.
    for table in tables.iter().rev() {
        let qualified = format!("{target_schema}.{}", table.name);
        if let Err(error) = target.execute(&target_adapter.drop_table_stmt(&qualified)) {
            errors.push(error);
        }
    }

    // Step 5: rewrite column types onto the target dialect.
    let overrides = build_overrides(target_engine, &config.external_columns, &mut errors);
    let mut source_tables = Vec::with_capacity(tables.len());
    let mut rewritten = Vec::with_capacity(tables.len());
    let mut migrated = Vec::with_capacity(tables.len());
    for table in tables {
        source_tables.push(table.clone());
        let (rewritten_table, migrated_table) =
            rewrite_table(table, &target_schema, target_engine, target_adapter.ordinal_space(), &overrides, &mut errors);
        rewritten.push(rewritten_table);
        migrated.push(migrated_table);
    }

    // Step 6: create tables, one statement per table, in dependency order.
    for table in &rewritten {
        if let Err(error) = target.execute(&target_adapter.create_table_stmt(table)) {
            errors.push(MigrationError::new(MigrationErrorKind::DdlFailed, table.name.clone(), error.to_string()));
        }
    }

    PipelineOutcome {
        source_tables,
        tables: rewritten,
        migrated,
        source_schema,
        target_schema,
        errors,
    }
}

/// Matches `requested` case-insensitively against the catalog's schema
/// names, returning the catalog-cased spelling (spec §3 "Schema identity").
fn resolve_schema_name(connection: &mut dyn Connection, requested: &str, attribute: &str, errors: &mut Errors) -> Option<String> {
    let names = match connection.schema_names() {
        Ok(names) => names,
        Err(error) => {
            errors.push(error);
            return None;
        }
    };
    let found = names.into_iter().find(|name| name.eq_ignore_ascii_case(requested));
    if found.is_none() {
        errors.push(
            MigrationError::new(MigrationErrorKind::SchemaNotFound, requested, format!("schema `{requested}` not found"))
                .with_attribute(attribute),
        );
    }
    found
}

fn resolve_or_create_target_schema(
    connection: &mut dyn Connection,
    adapter: &dyn DialectAdapter,
    requested: &str,
    errors: &mut Errors,
) -> Option<String> {
    if let Some(found) = connection
        .schema_names()
        .ok()
        .and_then(|names| names.into_iter().find(|name| name.eq_ignore_ascii_case(requested)))
    {
        return Some(found);
    }

    if let Err(error) = connection.execute(&adapter.create_schema_stmt(requested, requested)) {
        errors.push(error);
    }

    match connection
        .schema_names()
        .ok()
        .and_then(|names| names.into_iter().find(|name| name.eq_ignore_ascii_case(requested)))
    {
        Some(found) => Some(found),
        None => {
            errors.push(MigrationError::new(
                MigrationErrorKind::SchemaCreateFailed,
                requested,
                format!("schema `{requested}` still absent after creation"),
            ));
            None
        }
    }
}

fn apply_table_selection(tables: &mut Vec<TableDescriptor>, selection: &TableSelection) {
    match selection {
        TableSelection::All => {}
        TableSelection::Include(names) => {
            let names: HashSet<&str> = names.iter().map(String::as_str).collect();
            tables.retain(|table| names.contains(table.name.as_str()));
        }
        TableSelection::Exclude(names) => {
            let names: HashSet<&str> = names.iter().map(String::as_str).collect();
            tables.retain(|table| !names.contains(table.name.as_str()));
        }
    }
}

fn build_overrides(engine: Engine, external_columns: &[ExternalColumn], errors: &mut Errors) -> HashMap<String, TargetType> {
    let mut overrides = HashMap::new();
    for external_column in external_columns {
        match types::resolve_external_type(engine, &external_column.column_type) {
            Some(target_type) => {
                overrides.insert(external_column.column_name.to_ascii_lowercase(), target_type);
            }
            None => errors.push(
                MigrationError::new(
                    MigrationErrorKind::TypeUnknown,
                    external_column.column_type.clone(),
                    format!("not a valid column type for RDBMS {engine}"),
                )
                .with_attribute("external-columns"),
            ),
        }
    }
    overrides
}

/// Rewrites one table's columns onto the target dialect (spec §4.D step 5),
/// producing both the target-schema [`TableDescriptor`] ready for DDL
/// synthesis and the seed [`MigratedTable`] record for the report.
fn rewrite_table(
    table: TableDescriptor,
    target_schema: &str,
    target_engine: Engine,
    ordinal_space: crate::types::OrdinalSpace,
    overrides: ExternalOverrides<'_>,
    errors: &mut Errors,
) -> (TableDescriptor, MigratedTable) {
    let mut rewritten_columns = Vec::with_capacity(table.columns.len());
    let mut migrated_columns = Vec::with_capacity(table.columns.len());

    for column in table.columns {
        let target_type = match types::migrate_type(target_engine, ordinal_space, &column.source_type, &column.name, overrides) {
            Ok(target_type) => target_type,
            Err(error) => {
                let fallback = TargetType {
                    family: TypeFamily::Other,
                    precision: None,
                    scale: None,
                    length: None,
                    rendered: column.source_type.raw.clone(),
                };
                errors.push(error);
                fallback
            }
        };

        if types::precision_loss(&column.source_type, &target_type) {
            errors.push(
                MigrationError::new(
                    MigrationErrorKind::TypePrecisionLoss,
                    column.source_type.raw.clone(),
                    format!("`{}` narrows `{}` for column `{}`", target_type.rendered, column.source_type.raw, column.name),
                )
                .with_attribute(column.name.clone()),
            );
        }

        migrated_columns.push(MigratedColumn {
            name: column.name.clone(),
            source_type: column.source_type.raw.clone(),
            target_type: target_type.rendered.clone(),
        });

        let default = column.default.filter(|default| !is_pseudo_function_default(default));

        rewritten_columns.push(ColumnDescriptor {
            name: column.name,
            source_type: crate::types::SourceType {
                family: target_type.family,
                precision: target_type.precision,
                scale: target_type.scale,
                length: target_type.length,
                raw: target_type.rendered,
            },
            nullable: column.nullable,
            default,
            server_default: None,
            primary_key: column.primary_key,
            foreign_key: column.foreign_key,
        });
    }

    let rewritten_table = TableDescriptor {
        schema: target_schema.to_string(),
        name: table.name.clone(),
        columns: rewritten_columns,
        creation_order_rank: table.creation_order_rank,
    };

    (rewritten_table, MigratedTable::new(table.name, migrated_columns))
}
