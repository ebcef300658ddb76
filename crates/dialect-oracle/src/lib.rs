//! Oracle `DialectAdapter` + `Connection` (spec §4.A), built on the
//! synchronous OCI binding in the `oracle` crate.

mod adapter;
mod connection;
mod types;

pub use adapter::OracleAdapter;
pub use connection::{OracleConnection, connect};
