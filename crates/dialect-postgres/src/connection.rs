use std::error::Error as StdError;
use std::io;
use std::sync::Mutex;

use dbmigrate_core::{ColumnDescriptor, Connection, ConnectionParams, MigrationError, Result, SourceType, TableDescriptor};
use postgres::{Client, NoTls, Row};

use crate::types::parse_source_type;

const SCHEMA_NAMES_QUERY: &str = "SELECT nspname FROM pg_catalog.pg_namespace WHERE nspname NOT LIKE 'pg\\_%' AND nspname <> 'information_schema'";

const TABLE_NAMES_QUERY: &str = r"
SELECT c.relname AS table_name
FROM pg_catalog.pg_class c
INNER JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
WHERE n.nspname = $1
  AND c.relkind IN ('r', 'p')
ORDER BY c.relname ASC
";

const TABLE_COLUMNS_QUERY: &str = r"
SELECT
  a.attname AS column_name,
  pg_catalog.format_type(a.atttypid, a.atttypmod) AS data_type,
  a.attnotnull AS not_null,
  pg_catalog.pg_get_expr(ad.adbin, ad.adrelid) AS default_expr,
  EXISTS (
    SELECT 1 FROM pg_catalog.pg_constraint con
    WHERE con.conrelid = a.attrelid AND con.contype = 'p' AND a.attnum = ANY(con.conkey)
  ) AS is_primary_key
FROM pg_catalog.pg_attribute a
INNER JOIN pg_catalog.pg_class c ON c.oid = a.attrelid
INNER JOIN pg_catalog.pg_namespace n ON c.relnamespace = n.oid
LEFT JOIN pg_catalog.pg_attrdef ad ON ad.adrelid = a.attrelid AND ad.adnum = a.attnum
WHERE n.nspname = $1
  AND c.relname = $2
  AND a.attnum > 0
  AND NOT a.attisdropped
ORDER BY a.attnum ASC
";

/// The live half of the PostgreSQL dialect (spec §4.A), a `postgres::Client`
/// behind a mutex so the Orchestrator's `&mut dyn Connection` borrows stay
/// uniform across sync and sync-wrapped-async dialects alike.
pub struct PostgresConnection {
    client: Mutex<Client>,
}

/// Opens a connection for `params` (spec §3 "Connection parameters").
pub fn connect(params: &ConnectionParams) -> Result<PostgresConnection> {
    let mut config = postgres::Config::new();
    config.host(&params.host);
    config.port(params.port);
    config.user(&params.user);
    config.password(&params.pwd);
    config.dbname(&params.name);

    let client = config.connect(NoTls).map_err(|source| execution_error("CONNECT", source))?;
    Ok(PostgresConnection { client: Mutex::new(client) })
}

impl PostgresConnection {
    fn lock(&self, sql: &str) -> Result<std::sync::MutexGuard<'_, Client>> {
        self.client.lock().map_err(|_| execution_error(sql, io::Error::other("postgres connection state was poisoned")))
    }
}

impl Connection for PostgresConnection {
    fn reflect_schema(&mut self, schema: &str) -> Result<Vec<TableDescriptor>> {
        let mut client = self.lock(TABLE_NAMES_QUERY)?;
        let table_rows = client.query(TABLE_NAMES_QUERY, &[&schema]).map_err(|source| execution_error(TABLE_NAMES_QUERY, source))?;

        let mut tables = Vec::with_capacity(table_rows.len());
        for (rank, table_row) in table_rows.iter().enumerate() {
            let name: String = row_value(table_row, "table_name", TABLE_NAMES_QUERY)?;
            let column_rows = client
                .query(TABLE_COLUMNS_QUERY, &[&schema, &name])
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
        let mut client = self.lock(SCHEMA_NAMES_QUERY)?;
        let rows = client.query(SCHEMA_NAMES_QUERY, &[]).map_err(|source| execution_error(SCHEMA_NAMES_QUERY, source))?;
        rows.iter().map(|row| row_value(row, "nspname", SCHEMA_NAMES_QUERY)).collect()
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        let mut client = self.lock(sql)?;
        client.batch_execute(sql).map_err(|source| execution_error(sql, source))
    }

    fn bulk_copy(&mut self, select_stmt: &str, insert_stmt: &str, target: &mut dyn Connection, batch_size: u32) -> Result<u64> {
        let mut client = self.lock(select_stmt)?;
        let rows = client.query(select_stmt, &[]).map_err(|source| execution_error(select_stmt, source))?;

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
    let name: String = row_value(row, "column_name", TABLE_COLUMNS_QUERY)?;
    let data_type: String = row_value(row, "data_type", TABLE_COLUMNS_QUERY)?;
    let not_null: bool = row_value(row, "not_null", TABLE_COLUMNS_QUERY)?;
    let default_expr: Option<String> = row_value(row, "default_expr", TABLE_COLUMNS_QUERY)?;
    let is_primary_key: bool = row_value(row, "is_primary_key", TABLE_COLUMNS_QUERY)?;

    let source_type: SourceType = parse_source_type(&data_type);
    let default = default_expr.filter(|value| !value.trim().is_empty());

    Ok(ColumnDescriptor {
        name,
        source_type,
        nullable: !not_null,
        default: default.clone(),
        server_default: default,
        primary_key: is_primary_key,
        foreign_key: None,
    })
}

fn row_value<T>(row: &Row, column: &str, sql: &str) -> Result<T>
where
    T: postgres::types::FromSqlOwned,
{
    row.try_get(column).map_err(|source| execution_error(sql, source))
}

/// Renders one row's columns as SQL literals and substitutes them
/// positionally into `insert_stmt`'s `$1..$n` placeholders. `postgres`
/// offers no generic "insert this row elsewhere" primitive, so the copy
/// loop builds literal `INSERT` text per row rather than binding typed
/// parameters across two distinct connections.
fn row_to_text_values(row: &Row) -> Result<Vec<String>> {
    (0..row.len())
        .map(|index| {
            row.try_get::<_, Option<String>>(index)
                .map(|value| match value {
                    Some(text) => format!("'{}'", text.replace('\'', "''")),
                    None => "NULL".to_string(),
                })
                .map_err(|source| execution_error("bulk_copy row decode", source))
        })
        .collect()
}

/// Substitutes from the highest-numbered placeholder down so `$1` can't
/// match as a prefix of `$10..$19` before those get their turn.
fn substitute_placeholders(insert_stmt: &str, values: &[String]) -> String {
    let mut rendered = insert_stmt.to_string();
    for (index, value) in values.iter().enumerate().rev() {
        rendered = rendered.replace(&format!("${}", index + 1), value);
    }
    rendered
}

fn execution_error<E>(sql: &str, source: E) -> MigrationError
where
    E: StdError + Send + Sync + 'static,
{
    MigrationError::unexpected(sql, source)
}
