//! `EnvConnectionRegistry`: the CLI's `ConnectionRegistry` implementation
//! (spec §6.2), reading `{ENGINE}_USER`/`{ENGINE}_PWD`/`{ENGINE}_HOST`/
//! `{ENGINE}_PORT`/`{ENGINE}_NAME`/`{ENGINE}_DRIVER` per configured engine.

use std::collections::HashSet;
use std::env;

use dbmigrate_core::{Connection, ConnectionParams, ConnectionRegistry, DialectAdapter, Engine, MigrationError, MigrationErrorKind, Result};

#[cfg(feature = "oracle")]
static ORACLE_ADAPTER: dbmigrate_dialect_oracle::OracleAdapter = dbmigrate_dialect_oracle::OracleAdapter;
#[cfg(feature = "postgres")]
static POSTGRES_ADAPTER: dbmigrate_dialect_postgres::PostgresAdapter = dbmigrate_dialect_postgres::PostgresAdapter;
#[cfg(feature = "mysql")]
static MYSQL_ADAPTER: dbmigrate_dialect_mysql::MysqlAdapter = dbmigrate_dialect_mysql::MysqlAdapter;
#[cfg(feature = "sqlserver")]
static SQLSERVER_ADAPTER: dbmigrate_dialect_sqlserver::SqlServerAdapter = dbmigrate_dialect_sqlserver::SqlServerAdapter;

/// The compiled-in engines this binary was built to support. Not every
/// engine returned here is necessarily *configured*: `params`/`connect`
/// still fail per-engine when the matching environment variables are
/// absent.
#[must_use]
pub fn compiled_engines() -> HashSet<Engine> {
    let mut engines = HashSet::new();
    #[cfg(feature = "oracle")]
    engines.insert(Engine::Oracle);
    #[cfg(feature = "postgres")]
    engines.insert(Engine::Postgres);
    #[cfg(feature = "mysql")]
    engines.insert(Engine::Mysql);
    #[cfg(feature = "sqlserver")]
    engines.insert(Engine::SqlServer);
    engines
}

pub struct EnvConnectionRegistry {
    engines: HashSet<Engine>,
}

impl EnvConnectionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self { engines: compiled_engines() }
    }
}

impl Default for EnvConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn env_var(engine: Engine, suffix: &str) -> Result<String> {
    let key = format!("{}_{suffix}", engine.as_str().to_ascii_uppercase());
    env::var(&key).map_err(|_| MigrationError::new(MigrationErrorKind::ConnectionUnavailable, key, "environment variable is not set"))
}

impl ConnectionRegistry for EnvConnectionRegistry {
    fn engines(&self) -> HashSet<Engine> {
        self.engines.clone()
    }

    fn adapter(&self, engine: Engine) -> Result<&dyn DialectAdapter> {
        match engine {
            #[cfg(feature = "oracle")]
            Engine::Oracle => Ok(&ORACLE_ADAPTER),
            #[cfg(feature = "postgres")]
            Engine::Postgres => Ok(&POSTGRES_ADAPTER),
            #[cfg(feature = "mysql")]
            Engine::Mysql => Ok(&MYSQL_ADAPTER),
            #[cfg(feature = "sqlserver")]
            Engine::SqlServer => Ok(&SQLSERVER_ADAPTER),
            #[allow(unreachable_patterns)]
            _ => Err(MigrationError::new(MigrationErrorKind::ConnectionUnavailable, engine.to_string(), "dialect not compiled into this binary")),
        }
    }

    fn params(&self, engine: Engine) -> Result<ConnectionParams> {
        let port: String = env_var(engine, "PORT")?;
        let port: u16 = port
            .parse()
            .map_err(|_| MigrationError::new(MigrationErrorKind::ConnectionUnavailable, port, "PORT is not a valid port number").with_attribute(format!("{}_PORT", engine.as_str().to_ascii_uppercase())))?;

        Ok(ConnectionParams {
            user: env_var(engine, "USER")?,
            pwd: env_var(engine, "PWD")?,
            host: env_var(engine, "HOST")?,
            port,
            name: env_var(engine, "NAME")?,
            driver: env::var(format!("{}_DRIVER", engine.as_str().to_ascii_uppercase())).ok(),
        })
    }

    fn connect(&self, engine: Engine) -> Result<Box<dyn Connection>> {
        let params = self.params(engine)?;
        match engine {
            #[cfg(feature = "oracle")]
            Engine::Oracle => Ok(Box::new(dbmigrate_dialect_oracle::connect(&params)?)),
            #[cfg(feature = "postgres")]
            Engine::Postgres => Ok(Box::new(dbmigrate_dialect_postgres::connect(&params)?)),
            #[cfg(feature = "mysql")]
            Engine::Mysql => Ok(Box::new(dbmigrate_dialect_mysql::connect(&params)?)),
            #[cfg(feature = "sqlserver")]
            Engine::SqlServer => Ok(Box::new(dbmigrate_dialect_sqlserver::connect(&params)?)),
            #[allow(unreachable_patterns)]
            _ => Err(MigrationError::new(MigrationErrorKind::ConnectionUnavailable, engine.to_string(), "dialect not compiled into this binary")),
        }
    }
}
