use std::error::Error as StdError;
use std::io;
use std::sync::Mutex;

use dbmigrate_core::{ColumnDescriptor, Connection, ConnectionParams, MigrationError, Result, SourceType, TableDescriptor};
use futures_util::TryStreamExt;
use tiberius::{AuthMethod, Client, Config, QueryItem};
use tokio::net::TcpStream;
use tokio::runtime::{Builder, Runtime};
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::types::parse_source_type;

type TdsClient = Client<Compat<TcpStream>>;

const SCHEMA_NAMES_QUERY: &str = "SELECT name FROM sys.schemas WHERE name NOT IN ('sys', 'guest', 'INFORMATION_SCHEMA') AND schema_id < 16384";

const TABLE_NAMES_QUERY_TEMPLATE: &str = "SELECT t.name FROM sys.tables t INNER JOIN sys.schemas s ON t.schema_id = s.schema_id WHERE s.name = '{schema}' ORDER BY t.name ASC";

const TABLE_COLUMNS_QUERY_TEMPLATE: &str = r"
SELECT
  c.name AS column_name,
  TYPE_NAME(c.user_type_id) AS type_name,
  c.max_length,
  c.precision,
  c.scale,
  c.is_nullable,
  OBJECT_DEFINITION(c.default_object_id) AS default_expr,
  CASE WHEN pk.column_id IS NOT NULL THEN 1 ELSE 0 END AS is_primary_key
FROM sys.columns c
INNER JOIN sys.tables t ON t.object_id = c.object_id
INNER JOIN sys.schemas s ON t.schema_id = s.schema_id
LEFT JOIN (
  SELECT ic.object_id, ic.column_id
  FROM sys.index_columns ic
  INNER JOIN sys.indexes i ON ic.object_id = i.object_id AND ic.index_id = i.index_id
  WHERE i.is_primary_key = 1
) pk ON pk.object_id = c.object_id AND pk.column_id = c.column_id
WHERE s.name = '{schema}' AND t.name = '{table}'
ORDER BY c.column_id ASC
";

/// The live half of the SQL Server dialect (spec §4.A). `tiberius` is
/// async-only, so each call drives it through a current-thread `tokio`
/// runtime owned alongside the client, matching the synchronous
/// `&mut dyn Connection` contract every other dialect crate satisfies
/// directly.
pub struct SqlServerConnection {
    state: Mutex<LiveState>,
}

struct LiveState {
    runtime: Runtime,
    client: TdsClient,
}

/// Opens a connection for `params` (spec §3 "Connection parameters").
pub fn connect(params: &ConnectionParams) -> Result<SqlServerConnection> {
    let runtime = Builder::new_current_thread().enable_all().build().map_err(|source| execution_error("CONNECT", source))?;

    let mut config = Config::new();
    config.host(params.host.as_str());
    config.port(params.port);
    config.database(params.name.as_str());
    config.authentication(AuthMethod::sql_server(params.user.as_str(), params.pwd.as_str()));
    config.trust_cert();

    let client = runtime.block_on(async {
        let tcp = TcpStream::connect(config.get_addr()).await.map_err(|source| execution_error("CONNECT", source))?;
        tcp.set_nodelay(true).map_err(|source| execution_error("CONNECT", source))?;
        Client::connect(config, tcp.compat_write()).await.map_err(|source| execution_error("CONNECT", source))
    })?;

    Ok(SqlServerConnection { state: Mutex::new(LiveState { runtime, client }) })
}

impl SqlServerConnection {
    fn lock(&self, sql: &str) -> Result<std::sync::MutexGuard<'_, LiveState>> {
        self.state.lock().map_err(|_| execution_error(sql, io::Error::other("sqlserver connection state was poisoned")))
    }
}

impl Connection for SqlServerConnection {
    fn reflect_schema(&mut self, schema: &str) -> Result<Vec<TableDescriptor>> {
        let table_names_query = TABLE_NAMES_QUERY_TEMPLATE.replace("{schema}", schema);
        let table_rows = {
            let mut state = self.lock(&table_names_query)?;
            query_rows(&mut state, &table_names_query)?
        };

        let mut tables = Vec::with_capacity(table_rows.len());
        for (rank, row) in table_rows.into_iter().enumerate() {
            let name = row.into_iter().next().unwrap_or_default();
            let columns_query = TABLE_COLUMNS_QUERY_TEMPLATE.replace("{schema}", schema).replace("{table}", &name);
            let column_rows = {
                let mut state = self.lock(&columns_query)?;
                query_rows(&mut state, &columns_query)?
            };
            let columns = column_rows.iter().map(|row| decode_column(row, &columns_query)).collect::<Result<Vec<_>>>()?;

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
        let mut state = self.lock(SCHEMA_NAMES_QUERY)?;
        let rows = query_rows(&mut state, SCHEMA_NAMES_QUERY)?;
        Ok(rows.into_iter().filter_map(|row| row.into_iter().next()).collect())
    }

    fn execute(&mut self, sql: &str) -> Result<()> {
        let mut state = self.lock(sql)?;
        execute_sql(&mut state, sql)
    }

    fn bulk_copy(&mut self, select_stmt: &str, insert_stmt: &str, target: &mut dyn Connection, batch_size: u32) -> Result<u64> {
        let rows = {
            let mut state = self.lock(select_stmt)?;
            query_rows(&mut state, select_stmt)?
        };

        let mut copied = 0u64;
        for chunk in rows.chunks(batch_size.max(1) as usize) {
            for row in chunk {
                let values: Vec<String> = row.iter().map(|value| quote_literal(value)).collect();
                let stmt = substitute_placeholders(insert_stmt, &values);
                target.execute(&stmt)?;
                copied += 1;
            }
        }

        Ok(copied)
    }
}

fn decode_column(row: &[String], sql: &str) -> Result<ColumnDescriptor> {
    let name = column_at(row, 0, sql)?;
    let type_name = column_at(row, 1, sql)?;
    let max_length = column_at(row, 2, sql)?;
    let precision = column_at(row, 3, sql)?;
    let scale = column_at(row, 4, sql)?;
    let is_nullable = column_at(row, 5, sql)?;
    let default_expr = row.get(6).map(|value| value.trim().to_string()).filter(|value| !value.is_empty());
    let is_primary_key = column_at(row, 7, sql)?;

    let declared = compose_declared_type(&type_name, &max_length, &precision, &scale);
    let source_type: SourceType = parse_source_type(&declared);

    Ok(ColumnDescriptor {
        name,
        source_type,
        nullable: is_nullable.eq_ignore_ascii_case("1") || is_nullable.eq_ignore_ascii_case("true"),
        default: default_expr.clone(),
        server_default: default_expr,
        primary_key: is_primary_key == "1",
        foreign_key: None,
    })
}

/// `sys.columns` separates type name, length and precision/scale into
/// distinct columns; this recomposes the `"name(args)"` spelling
/// [`parse_source_type`] expects, the same shape the other dialect crates'
/// catalogs already return in one string.
fn compose_declared_type(type_name: &str, max_length: &str, precision: &str, scale: &str) -> String {
    match type_name.to_ascii_lowercase().as_str() {
        "decimal" | "numeric" => format!("{type_name}({precision},{scale})"),
        "char" | "varchar" | "binary" | "varbinary" => match max_length.parse::<i32>() {
            Ok(-1) => format!("{type_name}(max)"),
            Ok(length) => format!("{type_name}({length})"),
            Err(_) => type_name.to_string(),
        },
        "nchar" | "nvarchar" => match max_length.parse::<i32>() {
            Ok(-1) => format!("{type_name}(max)"),
            Ok(length) => format!("{type_name}({})", length / 2),
            Err(_) => type_name.to_string(),
        },
        _ => type_name.to_string(),
    }
}

fn column_at(row: &[String], index: usize, sql: &str) -> Result<String> {
    row.get(index).cloned().ok_or_else(|| execution_error(sql, io::Error::other(format!("missing column at index {index}"))))
}

fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
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

fn execute_sql(state: &mut LiveState, sql: &str) -> Result<()> {
    let LiveState { runtime, client } = state;
    runtime.block_on(async {
        let mut stream = client.simple_query(sql).await.map_err(|source| execution_error(sql, source))?;
        while stream.try_next().await.map_err(|source| execution_error(sql, source))?.is_some() {}
        Ok(())
    })
}

fn query_rows(state: &mut LiveState, sql: &str) -> Result<Vec<Vec<String>>> {
    let LiveState { runtime, client } = state;
    runtime.block_on(async {
        let mut stream = client.simple_query(sql).await.map_err(|source| execution_error(sql, source))?;
        let mut rows = Vec::new();

        while let Some(item) = stream.try_next().await.map_err(|source| execution_error(sql, source))? {
            if let QueryItem::Row(row) = item {
                let mut values = Vec::with_capacity(row.columns().len());
                for index in 0..row.columns().len() {
                    values.push(row.get::<&str, usize>(index).unwrap_or_default().to_string());
                }
                rows.push(values);
            }
        }

        Ok(rows)
    })
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
    fn composes_decimal_precision_and_scale() {
        assert_eq!(compose_declared_type("decimal", "0", "18", "4"), "decimal(18,4)");
    }

    #[test]
    fn composes_nvarchar_max_from_negative_length() {
        assert_eq!(compose_declared_type("nvarchar", "-1", "0", "0"), "nvarchar(max)");
    }

    #[test]
    fn nvarchar_length_is_halved_from_byte_length() {
        assert_eq!(compose_declared_type("nvarchar", "100", "0", "0"), "nvarchar(50)");
    }
}
