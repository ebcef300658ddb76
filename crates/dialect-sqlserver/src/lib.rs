//! SQL Server `DialectAdapter` + `Connection` (spec §4.A), built on
//! `tiberius`, sync-wrapped over a current-thread `tokio` runtime the way
//! the synchronous adapter crates expect.

mod adapter;
mod connection;
mod types;

pub use adapter::SqlServerAdapter;
pub use connection::{SqlServerConnection, connect};
