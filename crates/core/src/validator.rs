//! The Validator (spec §4.C): accumulates configuration errors, never
//! raises across component boundaries.

use std::collections::HashSet;

use crate::config::{BATCH_SIZE_RANGE, CHUNK_SIZE_RANGE, MAX_PROCESSES_RANGE, MigrationConfig};
use crate::engine::{Engine, is_certified_pair};
use crate::error::{Errors, MigrationError, MigrationErrorKind};

/// The outcome of validation: the resolved engine pair (when determinable)
/// plus the accumulated errors. Spec §7: "Validation failures abort before
/// any driver call"; the Orchestrator checks `errors.is_empty()` before
/// proceeding to the Pipeline.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    pub source_engine: Option<Engine>,
    pub target_engine: Option<Engine>,
    pub errors: Errors,
}

impl ValidationOutcome {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty() && self.source_engine.is_some() && self.target_engine.is_some()
    }
}

/// Validates a [`MigrationConfig`] against `configured_engines` (the set the
/// driver registry reports, spec §6.2 `engines()`), enforcing every rule of
/// spec §4.C.
#[must_use]
#[tracing::instrument(skip(config, configured_engines))]
pub fn validate(config: &MigrationConfig, configured_engines: &HashSet<Engine>) -> ValidationOutcome {
    let mut errors = Errors::new();

    let (source_engine, target_engine) = assert_rdbms_pair(&mut errors, config, configured_engines);
    assert_migration_params(&mut errors, config);
    assert_migration_steps(&mut errors, config);
    assert_table_selection(&mut errors, config);
    assert_external_columns(&mut errors, config, target_engine);

    ValidationOutcome {
        source_engine,
        target_engine,
        errors,
    }
}

fn assert_rdbms_pair(
    errors: &mut Errors,
    config: &MigrationConfig,
    configured_engines: &HashSet<Engine>,
) -> (Option<Engine>, Option<Engine>) {
    let (parsed_source, parsed_target) = config.parsed_engines();

    let source_engine = parsed_source.filter(|engine| configured_engines.contains(engine));
    if source_engine.is_none() {
        errors.push(
            MigrationError::new(MigrationErrorKind::EngineUnknown, &config.from_rdbms, "unknown or unconfigured RDBMS engine")
                .with_attribute("from-rdbms"),
        );
    }

    let target_engine = parsed_target.filter(|engine| configured_engines.contains(engine));
    if target_engine.is_none() {
        errors.push(
            MigrationError::new(MigrationErrorKind::EngineUnknown, &config.to_rdbms, "unknown or unconfigured RDBMS engine")
                .with_attribute("to-rdbms"),
        );
    }

    if let (Some(source), Some(target)) = (source_engine, target_engine) {
        if source == target {
            errors.push(MigrationError::new(
                MigrationErrorKind::EnginePairInvalid,
                source.to_string(),
                "'from-rdbms' and 'to-rdbms' cannot be assigned the same engine",
            ));
        } else if !is_certified_pair(source, target) && !config.allow_uncertified_pair {
            errors.push(MigrationError::new(
                MigrationErrorKind::PairUncertified,
                format!("{source}->{target}"),
                "this migration path has not been certified; set allow-uncertified-pair to proceed anyway",
            ));
        }
    }

    (source_engine, target_engine)
}

fn assert_migration_params(errors: &mut Errors, config: &MigrationConfig) {
    if !BATCH_SIZE_RANGE.contains(&config.batch_size) {
        errors.push(
            MigrationError::new(
                MigrationErrorKind::OutOfRange,
                config.batch_size.to_string(),
                format!("must be in the range {}..={}", BATCH_SIZE_RANGE.start(), BATCH_SIZE_RANGE.end()),
            )
            .with_attribute("batch-size"),
        );
    }
    if !CHUNK_SIZE_RANGE.contains(&config.chunk_size) {
        errors.push(
            MigrationError::new(
                MigrationErrorKind::OutOfRange,
                config.chunk_size.to_string(),
                format!("must be in the range {}..={}", CHUNK_SIZE_RANGE.start(), CHUNK_SIZE_RANGE.end()),
            )
            .with_attribute("chunk-size"),
        );
    }
    if !MAX_PROCESSES_RANGE.contains(&config.max_processes) {
        errors.push(
            MigrationError::new(
                MigrationErrorKind::OutOfRange,
                config.max_processes.to_string(),
                format!("must be in the range {}..={}", MAX_PROCESSES_RANGE.start(), MAX_PROCESSES_RANGE.end()),
            )
            .with_attribute("max-processes"),
        );
    }
}

fn assert_migration_steps(errors: &mut Errors, config: &MigrationConfig) {
    let MigrationConfig {
        migrate_metadata: metadata,
        migrate_plaindata: plaindata,
        migrate_lobdata: lobdata,
        ..
    } = *config;

    if !metadata && !plaindata && !lobdata {
        errors.push(MigrationError::new(
            MigrationErrorKind::StepIncoherent,
            "migrate-metadata=false, migrate-plaindata=false, migrate-lobdata=false",
            "at least one migration step must be indicated",
        ));
    } else if metadata && lobdata && !plaindata {
        errors.push(MigrationError::new(
            MigrationErrorKind::StepIncoherent,
            "migrate-metadata=true, migrate-plaindata=false, migrate-lobdata=true",
            "migrating the metadata and the LOBs requires migrating the plain data as well",
        ));
    }
}

fn assert_table_selection(errors: &mut Errors, config: &MigrationConfig) {
    if config.include_tables.is_some() && config.exclude_tables.is_some() {
        errors.push(MigrationError::new(
            MigrationErrorKind::MutuallyExclusive,
            "include-tables, exclude-tables",
            "attributes cannot be assigned values at the same time",
        ));
    }
}

fn assert_external_columns(errors: &mut Errors, config: &MigrationConfig, target_engine: Option<Engine>) {
    let Some(target_engine) = target_engine else {
        return;
    };
    for external_column in &config.external_columns {
        if crate::types::resolve_external_type(target_engine, &external_column.column_type).is_none() {
            errors.push(
                MigrationError::new(
                    MigrationErrorKind::TypeUnknown,
                    external_column.column_type.clone(),
                    format!("not a valid column type for RDBMS {target_engine}"),
                )
                .with_attribute("external-columns"),
            );
        }
    }
}
