//! Renders a failed run's errors the way a terminal user reads them:
//! one line per [`dbmigrate_core::MigrationError`], categorized by its
//! `kind`, plus the surrounding I/O/config context.

use std::{io, path::PathBuf};

use anyhow::Context;
use dbmigrate_core::{Errors, MigrationError, MigrationErrorKind};
use miette::Report;

const CONFIG_READ_CONTEXT: &str = "while reading migration configuration";

pub(crate) type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug)]
pub(crate) enum CliError {
    ReadFile { path: PathBuf, source: io::Error },
    ParseJson { path: PathBuf, source: serde_json::Error },
    ParseYaml { path: PathBuf, source: serde_yaml::Error },
    Migration(Errors),
}

pub(crate) fn render_runtime_error(error: CliError) -> String {
    match error {
        CliError::ReadFile { path, source } => {
            let context = format!("{CONFIG_READ_CONTEXT} `{}`", path.display());
            format!("[io] {}", report_with_context(source, context))
        }
        CliError::ParseJson { path, source } => {
            let context = format!("{CONFIG_READ_CONTEXT} `{}`", path.display());
            format!("[config] {}", report_with_context(source, context))
        }
        CliError::ParseYaml { path, source } => {
            let context = format!("{CONFIG_READ_CONTEXT} `{}`", path.display());
            format!("[config] {}", report_with_context(source, context))
        }
        CliError::Migration(errors) => errors.iter().map(render_migration_error).collect::<Vec<_>>().join("\n"),
    }
}

fn render_migration_error(error: &MigrationError) -> String {
    format!("[{}] {error}", category(error.kind))
}

fn category(kind: MigrationErrorKind) -> &'static str {
    match kind {
        MigrationErrorKind::EngineUnknown
        | MigrationErrorKind::EnginePairInvalid
        | MigrationErrorKind::PairUncertified
        | MigrationErrorKind::OutOfRange
        | MigrationErrorKind::MutuallyExclusive
        | MigrationErrorKind::StepIncoherent => "config",
        MigrationErrorKind::SchemaNotFound | MigrationErrorKind::TableNotFound => "reflect",
        MigrationErrorKind::SchemaCreateFailed | MigrationErrorKind::DdlFailed => "ddl",
        MigrationErrorKind::TypeUnknown | MigrationErrorKind::TypeUnsupported | MigrationErrorKind::TypePrecisionLoss => "types",
        MigrationErrorKind::ConnectionUnavailable => "connect",
        MigrationErrorKind::CopyFailed => "copy",
        MigrationErrorKind::Unexpected => "unexpected",
    }
}

fn report_with_context<E, C>(source: E, context: C) -> Report
where
    E: std::error::Error + Send + Sync + 'static,
    C: Into<String>,
{
    let context = context.into();
    let anyhow_error = std::result::Result::<(), E>::Err(source).context(context).expect_err("context wrapping must produce an error");
    miette::miette!("{anyhow_error:#}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbmigrate_core::MigrationErrorKind;

    #[test]
    fn migration_errors_render_one_line_each() {
        let errors = vec![
            MigrationError::new(MigrationErrorKind::SchemaNotFound, "HR", "schema not found"),
            MigrationError::new(MigrationErrorKind::ConnectionUnavailable, "oracle", "ORACLE_USER is not set"),
        ];
        let rendered = render_runtime_error(CliError::Migration(errors));
        assert_eq!(rendered.lines().count(), 2);
        assert!(rendered.contains("[reflect]"));
        assert!(rendered.contains("[connect]"));
    }
}
