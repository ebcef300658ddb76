use std::error::Error as StdError;
use std::io;
use std::sync::Mutex;

use dbmigrate_core::{ColumnDescriptor, Connection, ConnectionParams, MigrationError, Result, SourceType, TableDescriptor};
use oracle::Row;
use oracle::sql_type::{FromSql, ToSql};

use crate::types::parse_source_type;

const SCHEMA_NAMES_QUERY: &str = "SELECT username FROM all_users WHERE username NOT IN (SELECT username FROM dba_users WHERE oracle_maintained = 'Y')";

const TABLE_NAMES_QUERY: &str = "SELECT table_name FROM all_tables WHERE owner = :1 ORDER BY table_name ASC";

const TABLE_COLUMNS_QUERY: &str = r"
SELECT
  column_name,
  data_type,
  data_length,
  data_precision,
  data_scale,
  nullable,
  data_default
FROM all_tab_columns
WHERE owner = :1 AND table_name = :2
ORDER BY column_id ASC
";

const PRIMARY_KEY_COLUMNS_QUERY: &str = r"
SELECT cols.column_name
FROM all_constraints cons
INNER JOIN all_cons_columns cols ON cons.constraint_name = cols.constraint_name AND cons.owner = cols.owner
WHERE cons.constraint_type = 'P' AND cons.owner = :1 AND cons.table_name = :2
";

/// The live half of the Oracle dialect (spec §4.A), an `oracle::Connection`
/// (OCI binding) behind a mutex so the Orchestrator's `&mut dyn Connection`
/// borrows stay uniform across every dialect.
pub struct OracleConnection {
    connection: Mutex<oracle::Connection>,
}

/// Opens a connection for `params` (spec §3 "Connection parameters").
pub fn connect(params: &ConnectionParams) -> Result<OracleConnection> {
    let connect_string = format!("{}:{}/{}", params.host, params.port, params.name);
    let connection =
        oracle::Connection::connect(&params.user, &params.pwd, &connect_string).map_err(|source| execution_error("CONNECT", source))?;
    Ok(OracleConnection { connection: Mutex::new(connection) })
}

impl OracleConnection {
    fn lock(&self, sql: &str) -> Result<std::sync::MutexGuard<'_, oracle::Connection>> {
        self.connection.lock().map_err(|_| execution_error(sql, io::Error::other("oracle connection state was poisoned")))
    }
}

impl Connection for OracleConnection {
    fn reflect_schema(&mut self, schema: &str) -> Result<Vec<TableDescriptor>> {
        let connection = self.lock(TABLE_NAMES_QUERY)?;
        let table_names = query_column::<String>(&connection, TABLE_NAMES_QUERY, &[&schema as &dyn ToSql])?;

        let mut tables = Vec::with_capacity(table_names.len());
        for (rank, name) in table_names.into_iter().enumerate() {
            let primary_key_columns =
                query_column::<String>(&connection, PRIMARY_KEY_COLUMNS_QUERY, &[&schema as &dyn ToSql, &name.as_str() as &dyn ToSql])?;
            let rows = connection
                .query(TABLE_COLUMNS_QUERY, &[&schema as &dyn ToSql, &name.as_str() as &dyn ToSql])
                .map_err(|source| execution_error(TABLE_COLUMNS_QUERY, source))?;

            let mut columns = Vec::new();
            for row in rows {
                let row = row.map_err(|source| execution_error(TABLE_COLUMNS_QUERY, source))?;
                columns.push(decode_column(&row, &primary_key_columns)?);
            }

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
        let connection = self.lock(SCHEMA_NAMES_QUERY)?;
        query_column::<String>(&connection, SCHEMA_NAMES_QUERY, &[])
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        let connection = self.lock(sql)?;
        connection.execute(sql, &[]).map_err(|source| execution_error(sql, source))?;
        connection.commit().map_err(|source| execution_error(sql, source))
    }

    fn bulk_copy(&mut self, select_stmt: &str, insert_stmt: &str, target: &mut dyn Connection, _batch_size: u32) -> Result<u64> {
        let connection = self.lock(select_stmt)?;
        let rows = connection.query(select_stmt, &[]).map_err(|source| execution_error(select_stmt, source))?;

        let mut copied = 0u64;
        for row in rows {
            let row = row.map_err(|source| execution_error(select_stmt, source))?;
            let values = row_to_text_values(&row)?;
            let stmt = substitute_placeholders(insert_stmt, &values);
            target.execute(&stmt)?;
            copied += 1;
        }

        Ok(copied)
    }
}

fn decode_column(row: &Row, primary_key_columns: &[String]) -> Result<ColumnDescriptor> {
    let name: String = row_get(row, "COLUMN_NAME")?;
    let data_type: String = row_get(row, "DATA_TYPE")?;
    let data_length: Option<i64> = row_get(row, "DATA_LENGTH")?;
    let data_precision: Option<i64> = row_get(row, "DATA_PRECISION")?;
    let data_scale: Option<i64> = row_get(row, "DATA_SCALE")?;
    let nullable: String = row_get(row, "NULLABLE")?;
    let data_default: Option<String> = row_get(row, "DATA_DEFAULT")?;

    let declared = compose_declared_type(&data_type, data_length, data_precision, data_scale);
    let source_type: SourceType = parse_source_type(&declared);
    let default = data_default.map(|value| value.trim().to_string()).filter(|value| !value.is_empty());

    Ok(ColumnDescriptor {
        name: name.clone(),
        source_type,
        nullable: nullable.eq_ignore_ascii_case("Y"),
        default: default.clone(),
        server_default: default,
        primary_key: primary_key_columns.iter().any(|column| column.eq_ignore_ascii_case(&name)),
        foreign_key: None,
    })
}

/// `all_tab_columns` separates type name, length and precision/scale into
/// distinct columns; this recomposes the `"NAME(args)"` spelling
/// [`parse_source_type`] expects.
fn compose_declared_type(data_type: &str, data_length: Option<i64>, data_precision: Option<i64>, data_scale: Option<i64>) -> String {
    match data_type.to_ascii_uppercase().as_str() {
        "NUMBER" => match (data_precision, data_scale) {
            (Some(p), Some(s)) if s != 0 => format!("NUMBER({p},{s})"),
            (Some(p), _) => format!("NUMBER({p})"),
            _ => "NUMBER".to_string(),
        },
        "VARCHAR2" | "NVARCHAR2" | "CHAR" | "NCHAR" | "RAW" => match data_length {
            Some(length) => format!("{data_type}({length})"),
            None => data_type.to_string(),
        },
        _ => data_type.to_string(),
    }
}

fn row_get<T>(row: &Row, column: &str) -> Result<T>
where
    T: FromSql,
{
    row.get(column).map_err(|source| execution_error(column, source))
}

fn query_column<T>(connection: &oracle::Connection, sql: &str, params: &[&dyn ToSql]) -> Result<Vec<T>>
where
    T: FromSql,
{
    let rows = connection.query(sql, params).map_err(|source| execution_error(sql, source))?;
    let mut values = Vec::new();
    for row in rows {
        let row = row.map_err(|source| execution_error(sql, source))?;
        values.push(row.get::<T>(0).map_err(|source| execution_error(sql, source))?);
    }
    Ok(values)
}

/// Renders one row's columns as SQL literals and substitutes them
/// positionally into `insert_stmt`'s `:1..:n` placeholders.
fn row_to_text_values(row: &Row) -> Result<Vec<String>> {
    let column_count = row.column_info().len();
    (0..column_count)
        .map(|index| {
            row.get::<Option<String>>(index)
                .map(|value| match value {
                    Some(text) => format!("'{}'", text.replace('\'', "''")),
                    None => "NULL".to_string(),
                })
                .map_err(|source| execution_error("bulk_copy row decode", source))
        })
        .collect()
}

/// Substitutes from the highest-numbered placeholder down so `:1` can't
/// match as a prefix of `:10..:19` before those get their turn.
fn substitute_placeholders(insert_stmt: &str, values: &[String]) -> String {
    let mut rendered = insert_stmt.to_string();
    for (index, value) in values.iter().enumerate().rev() {
        rendered = rendered.replace(&format!(":{}", index + 1), value);
    }
    rendered
}

fn execution_error<E>(sql: &str, source: E) -> MigrationError
where
    E: StdError + Send + Sync + 'static,
{
    MigrationError::unexpected(sql, source)
}
