//! Cross-RDBMS schema-and-data migration core.
//!
//! Reflects a source schema, maps each column's type onto an equivalent
//! type on the target dialect, drops and recreates target tables, and
//! bulk-copies rows across, honoring large-object exclusions and
//! per-engine session tuning. Dialect-specific SQL synthesis and live I/O
//! are supplied by the `dbmigrate-dialect-*` crates through the
//! [`adapter::DialectAdapter`]/[`adapter::Connection`] contracts; credential
//! retrieval is supplied by a [`registry::ConnectionRegistry`]
//! implementation such as the CLI's environment-variable-backed registry.

pub mod adapter;
pub mod config;
pub mod copy;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod pipeline;
pub mod reflect;
pub mod registry;
pub mod report;
pub mod types;
pub mod validator;

pub use adapter::{ColumnRef, Connection, DialectAdapter};
pub use config::{ConnectionParams, ExternalColumn, MigrationConfig, TableSelection};
pub use engine::{Engine, is_certified_pair};
pub use error::{Errors, MigrationError, MigrationErrorKind, Result};
pub use orchestrator::migrate;
pub use reflect::{ColumnDescriptor, ForeignKeyRef, TableDescriptor};
pub use registry::ConnectionRegistry;
pub use report::{CopyStatus, MigratedColumn, MigratedTable, MigrationReport, RdbmsSchema};
pub use types::{OrdinalSpace, SourceType, TargetType, TypeFamily, migrate_type, precision_loss};
pub use validator::{ValidationOutcome, validate};
