//! PostgreSQL `DialectAdapter` + `Connection` (spec §4.A), built on the
//! synchronous `postgres` crate.

mod adapter;
mod connection;
mod types;

pub use adapter::PostgresAdapter;
pub use connection::{PostgresConnection, connect};
