//! MySQL `DialectAdapter` + `Connection` (spec §4.A), built on the
//! synchronous `mysql` crate.

mod adapter;
mod connection;
mod types;

pub use adapter::MysqlAdapter;
pub use connection::{MysqlConnection, connect};
