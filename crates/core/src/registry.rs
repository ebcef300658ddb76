//! The driver registry contract (spec §6.2): the Orchestrator's sole view
//! onto which engines are configured and how to reach them. Implemented by
//! the CLI as `EnvConnectionRegistry`, reading credentials from environment
//! variables, the "connection-parameter retrieval" collaborator named in
//! spec §1.

use std::collections::HashSet;

use crate::adapter::{Connection, DialectAdapter};
use crate::config::ConnectionParams;
use crate::engine::Engine;
use crate::error::Result;

/// A source of adapters, connection parameters, and live connections for
/// every engine the host has configured. The Orchestrator never constructs
/// a `Connection` itself; it borrows one through this registry.
pub trait ConnectionRegistry {
    /// The engines this registry can open a connection for.
    fn engines(&self) -> HashSet<Engine>;

    /// The pure SQL-synthesis adapter for `engine`.
    fn adapter(&self, engine: Engine) -> Result<&dyn DialectAdapter>;

    /// The connection parameters configured for `engine`.
    fn params(&self, engine: Engine) -> Result<ConnectionParams>;

    /// Opens a live connection to `engine`, wrapping any driver-level
    /// failure as [`crate::error::MigrationErrorKind::ConnectionUnavailable`].
    fn connect(&self, engine: Engine) -> Result<Box<dyn Connection>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{MigrationError, MigrationErrorKind};

    struct EmptyRegistry;

    impl ConnectionRegistry for EmptyRegistry {
        fn engines(&self) -> HashSet<Engine> {
            HashSet::new()
        }

        fn adapter(&self, engine: Engine) -> Result<&dyn DialectAdapter> {
            Err(MigrationError::new(MigrationErrorKind::ConnectionUnavailable, engine.to_string(), "no adapter configured"))
        }

        fn params(&self, engine: Engine) -> Result<ConnectionParams> {
            Err(MigrationError::new(MigrationErrorKind::ConnectionUnavailable, engine.to_string(), "no params configured"))
        }

        fn connect(&self, engine: Engine) -> Result<Box<dyn Connection>> {
            Err(MigrationError::new(MigrationErrorKind::ConnectionUnavailable, engine.to_string(), "no driver configured"))
        }
    }

    #[test]
    fn empty_registry_reports_no_engines() {
        assert!(EmptyRegistry.engines().is_empty());
        assert!(EmptyRegistry.connect(Engine::Oracle).is_err());
    }
}
