use std::error::Error as StdError;
use std::io;
use std::sync::Mutex;

use dbmigrate_core::{ColumnDescriptor, Connection, ConnectionParams, MigrationError, Result, SourceType, TableDescriptor};
use mysql::prelude::Queryable;
use mysql::{OptsBuilder, Pool, PooledConn, Row};

use crate::types::parse_source_type;

const SCHEMA_NAMES_QUERY: &str =
    "SELECT schema_name FROM information_schema.schemata WHERE schema_name NOT IN ('information_schema', 'mysql', 'performance_schema', 'sys')";

const TABLE_NAMES_QUERY: &str = "SELECT table_name FROM information_schema.tables WHERE table_schema = ? AND table_type = 'BASE TABLE' ORDER BY table_name ASC";

const TABLE_COLUMNS_QUERY: &str = r"
SELECT
  column_name,
  column_type,
  is_nullable,
  column_default,
  column_key
FROM information_schema.columns
WHERE table_schema = ? AND table_name = ?
ORDER BY ordinal_position ASC
";

/// The live half of the MySQL dialect (spec §4.A), a `mysql::PooledConn`
/// behind a mutex so the Orchestrator's `&mut dyn Connection` borrows stay
/// uniform across every dialect.
pub struct MysqlConnection {
    connection: Mutex<PooledConn>,
}

/// Opens a connection for `params` (spec §3 "Connection parameters").
pub fn connect(params: &ConnectionParams) -> Result<MysqlConnection> {
    let builder = OptsBuilder::new()
        .ip_or_hostname(Some(params.host.clone()))
        .tcp_port(params.port)
        .user(Some(params.user.clone()))
        .pass(Some(params.pwd.clone()))
        .db_name(Some(params.name.clone()));

    let pool = Pool::new(builder).map_err(|source| execution_error("CONNECT", source))?;
    let connection = pool.get_conn().map_err(|source| execution_error("CONNECT", source))?;
    Ok(MysqlConnection { connection: Mutex::new(connection) })
}

impl MysqlConnection {
    fn lock(&self, sql: &str) -> Result<std::sync::MutexGuard<'_, PooledConn>> {
        self.connection.lock().map_err(|_| execution_error(sql, io::Error::other("mysql connection state was poisoned")))
    }
}

impl Connection for MysqlConnection {
    fn reflect_schema(&mut self, schema: &str) -> Result<Vec<TableDescriptor>> {
        let mut connection = self.lock(TABLE_NAMES_QUERY)?;
        let table_rows: Vec<String> = connection.exec(TABLE_NAMES_QUERY, (schema,)).map_err(|source| execution_error(TABLE_NAMES_QUERY, source))?;

        let mut tables = Vec::with_capacity(table_rows.len());
        for (rank, name) in table_rows.into_iter().enumerate() {
            let column_rows: Vec<Row> = connection
                .exec(TABLE_COLUMNS_QUERY, (schema, &name))
                .map_err(|source| execution_error(TABLE_COLUMNS_QUERY, source))?;
            let columns = column_rows.iter().map(decode_column).collect::<Result<Vec<_>>>()?;

            tables.push(TableDescriptor {
                schema: schema.to_string(),
                name,
                columns,
                creation_order_rank: rank,
            });
        }

        Ok(tables)
    }

    fn schema_names(&mut self) -> Result<Vec<String>> {
        let mut connection = self.lock(SCHEMA_NAMES_QUERY)?;
        connection.query(SCHEMA_NAMES_QUERY).map_err(|source| execution_error(SCHEMA_NAMES_QUERY, source))
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        let mut connection = self.lock(sql)?;
        connection.query_drop(sql).map_err(|source| execution_error(sql, source))
    }

    fn bulk_copy(&mut self, select_stmt: &str, insert_stmt: &str, target: &mut dyn Connection, batch_size: u32) -> Result<u64> {
        let mut connection = self.lock(select_stmt)?;
        let rows: Vec<Row> = connection.query(select_stmt).map_err(|source| execution_error(select_stmt, source))?;

        let mut copied = 0u64;
        for chunk in rows.chunks(batch_size.max(1) as usize) {
            for row in chunk {
                let values = row_to_text_values(row)?;
                let stmt = substitute_placeholders(insert_stmt, &values);
                target.execute(&stmt)?;
                copied += 1;
            }
        }

        Ok(copied)
    }
}

fn decode_column(row: &Row) -> Result<ColumnDescriptor> {
    let name: String = row_string(row, "column_name", TABLE_COLUMNS_QUERY)?;
    let column_type: String = row_string(row, "column_type", TABLE_COLUMNS_QUERY)?;
    let is_nullable: String = row_string(row, "is_nullable", TABLE_COLUMNS_QUERY)?;
    let column_default: Option<String> = row.get("column_default");
    let column_key: String = row_string(row, "column_key", TABLE_COLUMNS_QUERY)?;

    let source_type: SourceType = parse_source_type(&column_type);
    let default = column_default.filter(|value| !value.trim().is_empty());

    Ok(ColumnDescriptor {
        name,
        source_type,
        nullable: is_nullable.eq_ignore_ascii_case("YES"),
        default: default.clone(),
        server_default: default,
        primary_key: column_key == "PRI",
        foreign_key: None,
    })
}

fn row_string(row: &Row, column: &str, sql: &str) -> Result<String> {
    row.get(column).ok_or_else(|| execution_error(sql, io::Error::other(format!("missing column `{column}` in query result"))))
}

/// Renders one row's columns as SQL literals and substitutes them
/// positionally into `insert_stmt`'s `?` placeholders, in column order.
fn row_to_text_values(row: &Row) -> Result<Vec<String>> {
    (0..row.len())
        .map(|index| {
            let value: Option<String> = row.get(index).ok_or_else(|| execution_error("bulk_copy row decode", io::Error::other("missing column")))?;
            Ok(match value {
                Some(text) => format!("'{}'", text.replace('\'', "''")),
                None => "NULL".to_string(),
            })
        })
        .collect()
}

fn substitute_placeholders(insert_stmt: &str, values: &[String]) -> String {
    let mut rendered = String::with_capacity(insert_stmt.len());
    let mut values = values.iter();
    for ch in insert_stmt.chars() {
        if ch == '?' {
            if let Some(value) = values.next() {
                rendered.push_str(value);
                continue;
            }
        }
        rendered.push(ch);
    }
    rendered
}

fn execution_error<E>(sql: &str, source: E) -> MigrationError
where
    E: StdError + Send + Sync + 'static,
{
    MigrationError::unexpected(sql, source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_substitution_replaces_each_question_mark_in_order() {
        let rendered = substitute_placeholders("INSERT INTO t (a, b) VALUES (?, ?)", &["'x'".to_string(), "NULL".to_string()]);
        assert_eq!(rendered, "INSERT INTO t (a, b) VALUES ('x', NULL)");
    }
}
