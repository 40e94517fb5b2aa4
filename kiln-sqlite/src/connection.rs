use crate::extract::{extract_value, to_sqlite};
use async_stream::try_stream;
use kiln_core::{
    BatchResult, Context, DriverError, Error, ExecutionOptions, Result, Row, RowLabeled, RowNames,
    Statement, StreamTransport, Transport, UpdateResult,
    future::BoxFuture,
    stream::BoxStream,
    truncate_long,
};
use rusqlite::{Connection as RawConnection, OpenFlags};
use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};
use tokio::{sync::mpsc, task::spawn_blocking};
use url::Url;

/// Rows buffered between the blocking reader and the stream when no fetch size is given.
const DEFAULT_FETCH_SIZE: usize = 64;

/// A SQLite database, usable both as a blocking and as a streaming transport.
///
/// Cloning shares the same underlying connection, statements are serialized.
#[derive(Clone)]
pub struct SqliteConnection {
    connection: Arc<Mutex<RawConnection>>,
}

impl SqliteConnection {
    /// Opens the database at `url`, for example `sqlite://data.db`, `sqlite:///tmp/data.db`
    /// or `sqlite::memory:`.
    ///
    /// Query parameters: `mode` is one of `ro`, `rw` or `rwc` (the default), `busy_timeout` is
    /// how many milliseconds a statement waits on a locked database.
    pub fn open(url: &str) -> Result<Self> {
        let context = || format!("While trying to connect to `{}`", truncate_long!(url));
        let parsed = Url::parse(url).with_context(context)?;
        if parsed.scheme() != "sqlite" {
            let error = Error::msg("SQLite connection url must start with `sqlite:`")
                .context(context());
            log::error!("{:#}", error);
            return Err(error);
        }
        let path = if parsed.cannot_be_a_base() {
            parsed.path().to_string()
        } else {
            format!("{}{}", parsed.host_str().unwrap_or_default(), parsed.path())
        };
        let mut flags = OpenFlags::default();
        let mut busy_timeout = None;
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                "mode" => {
                    let mode = match value.as_ref() {
                        "ro" => OpenFlags::SQLITE_OPEN_READ_ONLY,
                        "rw" => OpenFlags::SQLITE_OPEN_READ_WRITE,
                        "rwc" => OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE,
                        other => {
                            let error = Error::msg(format!("Unknown SQLite open mode `{}`", other))
                                .context(context());
                            log::error!("{:#}", error);
                            return Err(error);
                        }
                    };
                    flags.remove(
                        OpenFlags::SQLITE_OPEN_READ_ONLY
                            | OpenFlags::SQLITE_OPEN_READ_WRITE
                            | OpenFlags::SQLITE_OPEN_CREATE,
                    );
                    flags.insert(mode);
                }
                "busy_timeout" => {
                    let millis = value.parse::<u64>().with_context(context)?;
                    busy_timeout = Some(Duration::from_millis(millis));
                }
                _ => log::warn!("Ignoring the unknown SQLite connection parameter `{}`", key),
            }
        }
        let connection = if path == ":memory:" {
            RawConnection::open_in_memory()
        } else {
            RawConnection::open_with_flags(&path, flags)
        }
        .map_err(driver_error)
        .with_context(context)?;
        if let Some(timeout) = busy_timeout {
            connection
                .busy_timeout(timeout)
                .map_err(driver_error)
                .with_context(context)?;
        }
        Ok(Self::from_raw(connection))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open("sqlite::memory:")
    }

    pub fn from_raw(connection: RawConnection) -> Self {
        Self {
            connection: Arc::new(Mutex::new(connection)),
        }
    }
}

fn lock(connection: &Mutex<RawConnection>) -> Result<MutexGuard<'_, RawConnection>> {
    connection
        .lock()
        .map_err(|_| Error::msg("The SQLite connection was poisoned by a panic"))
}

pub(crate) fn driver_error(error: rusqlite::Error) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(code, message) => {
            let message = message.unwrap_or_else(|| code.to_string());
            DriverError::new("", code.extended_code, message).into()
        }
        rusqlite::Error::SqlInputError { error, msg, .. } => {
            DriverError::new("", error.extended_code, msg).into()
        }
        error => Error::new(error),
    }
}

fn statement_context(statement: &Statement) -> String {
    format!(
        "While executing the statement:\n{}",
        truncate_long!(statement.sql)
    )
}

fn prepare<'c>(
    connection: &'c RawConnection,
    statement: &Statement,
    options: &ExecutionOptions,
) -> Result<rusqlite::Statement<'c>> {
    if let Some(timeout) = options.query_timeout {
        connection.busy_timeout(timeout).map_err(driver_error)?;
    }
    let mut prepared = connection.prepare(&statement.sql).map_err(driver_error)?;
    for (i, arg) in statement.args.iter().enumerate() {
        prepared.raw_bind_parameter(i + 1, to_sqlite(arg)?).map_err(driver_error)?;
    }
    Ok(prepared)
}

fn run_query(
    connection: &RawConnection,
    statement: &Statement,
    options: &ExecutionOptions,
    handler: &mut dyn FnMut(RowLabeled) -> Result<()>,
) -> Result<()> {
    let mut prepared = prepare(connection, statement, options)?;
    let labels: RowNames = prepared
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();
    let max_rows = options.max_rows.map(|v| v as usize).unwrap_or(usize::MAX);
    let mut rows = prepared.raw_query();
    let mut read = 0;
    while read < max_rows {
        let Some(row) = rows.next().map_err(driver_error)? else {
            break;
        };
        let values = (0..labels.len())
            .map(|i| row.get_ref(i).map_err(driver_error).and_then(extract_value))
            .collect::<Result<Row>>()?;
        handler(RowLabeled::new(labels.clone(), values))?;
        read += 1;
    }
    Ok(())
}

fn run_update(
    connection: &RawConnection,
    statement: &Statement,
    options: &ExecutionOptions,
    return_generated_keys: bool,
) -> Result<UpdateResult> {
    let mut prepared = prepare(connection, statement, options)?;
    let count = prepared.raw_execute().map_err(driver_error)? as u64;
    let generated_keys = if return_generated_keys && count > 0 {
        // Rows of a single insert get consecutive row ids
        let last = connection.last_insert_rowid();
        ((last - count as i64 + 1)..=last).collect()
    } else {
        Vec::new()
    };
    Ok(UpdateResult {
        count,
        generated_keys,
    })
}

fn run_batch(
    connection: &RawConnection,
    statements: &[Statement],
    options: &ExecutionOptions,
    return_generated_keys: bool,
) -> Result<BatchResult> {
    let mut result = BatchResult::default();
    for statement in statements {
        let update = run_update(connection, statement, options, return_generated_keys)
            .with_context(|| statement_context(statement))?;
        result.counts.push(update.count);
        result.generated_keys.extend(update.generated_keys);
    }
    Ok(result)
}

fn run_execute(
    connection: &RawConnection,
    statement: &Statement,
    options: &ExecutionOptions,
) -> Result<()> {
    if statement.args.is_empty() {
        if let Some(timeout) = options.query_timeout {
            connection.busy_timeout(timeout).map_err(driver_error)?;
        }
        connection.execute_batch(&statement.sql).map_err(driver_error)
    } else {
        prepare(connection, statement, options)?
            .raw_execute()
            .map_err(driver_error)?;
        Ok(())
    }
}

fn logged<T>(result: Result<T>) -> Result<T> {
    if let Err(error) = &result {
        log::error!("{:#}", error);
    }
    result
}

impl Transport for SqliteConnection {
    fn execute_query(
        &mut self,
        statement: &Statement,
        options: &ExecutionOptions,
        handler: &mut dyn FnMut(RowLabeled) -> Result<()>,
    ) -> Result<()> {
        let connection = lock(&self.connection)?;
        logged(
            run_query(&connection, statement, options, handler)
                .with_context(|| statement_context(statement)),
        )
    }

    fn execute_update(
        &mut self,
        statement: &Statement,
        options: &ExecutionOptions,
        return_generated_keys: bool,
    ) -> Result<UpdateResult> {
        let connection = lock(&self.connection)?;
        logged(
            run_update(&connection, statement, options, return_generated_keys)
                .with_context(|| statement_context(statement)),
        )
    }

    fn execute_batch(
        &mut self,
        statements: &[Statement],
        options: &ExecutionOptions,
        return_generated_keys: bool,
    ) -> Result<BatchResult> {
        let connection = lock(&self.connection)?;
        logged(run_batch(
            &connection,
            statements,
            options,
            return_generated_keys,
        ))
    }

    fn execute(&mut self, statement: &Statement, options: &ExecutionOptions) -> Result<()> {
        let connection = lock(&self.connection)?;
        logged(
            run_execute(&connection, statement, options)
                .with_context(|| statement_context(statement)),
        )
    }
}

impl StreamTransport for SqliteConnection {
    fn execute_query<'a>(
        &'a mut self,
        statement: Statement,
        options: ExecutionOptions,
    ) -> BoxStream<'a, Result<RowLabeled>> {
        let connection = self.connection.clone();
        let capacity = options
            .fetch_size
            .map(|v| v.max(1) as usize)
            .unwrap_or(DEFAULT_FETCH_SIZE);
        Box::pin(try_stream! {
            let (sender, mut receiver) = mpsc::channel::<Result<RowLabeled>>(capacity);
            let task = spawn_blocking(move || {
                let result = lock(&connection).and_then(|connection| {
                    run_query(&connection, &statement, &options, &mut |row| {
                        // A closed channel means the stream was dropped, stop reading
                        sender
                            .blocking_send(Ok(row))
                            .map_err(|_| Error::msg("The row stream was dropped"))
                    })
                    .with_context(|| statement_context(&statement))
                });
                if let Err(error) = result {
                    if !sender.is_closed() {
                        log::error!("{:#}", error);
                        let _ = sender.blocking_send(Err(error));
                    }
                }
            });
            while let Some(row) = receiver.recv().await {
                yield row?;
            }
            task.await?;
        })
    }

    fn execute_update<'a>(
        &'a mut self,
        statement: Statement,
        options: ExecutionOptions,
        return_generated_keys: bool,
    ) -> BoxFuture<'a, Result<UpdateResult>> {
        let connection = self.connection.clone();
        Box::pin(async move {
            spawn_blocking(move || {
                let connection = lock(&connection)?;
                logged(
                    run_update(&connection, &statement, &options, return_generated_keys)
                        .with_context(|| statement_context(&statement)),
                )
            })
            .await?
        })
    }

    fn execute_batch<'a>(
        &'a mut self,
        statements: Vec<Statement>,
        options: ExecutionOptions,
        return_generated_keys: bool,
    ) -> BoxFuture<'a, Result<BatchResult>> {
        let connection = self.connection.clone();
        Box::pin(async move {
            spawn_blocking(move || {
                let connection = lock(&connection)?;
                logged(run_batch(
                    &connection,
                    &statements,
                    &options,
                    return_generated_keys,
                ))
            })
            .await?
        })
    }

    fn execute<'a>(
        &'a mut self,
        statement: Statement,
        options: ExecutionOptions,
    ) -> BoxFuture<'a, Result<()>> {
        let connection = self.connection.clone();
        Box::pin(async move {
            spawn_blocking(move || {
                let connection = lock(&connection)?;
                logged(
                    run_execute(&connection, &statement, &options)
                        .with_context(|| statement_context(&statement)),
                )
            })
            .await?
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SqliteDialect;
    use kiln_core::{AsValue, Dialect, stream::StreamExt};

    fn statement(sql: &str, args: Vec<kiln_core::Value>) -> Statement {
        Statement::new(sql, args)
    }

    #[test]
    fn generated_keys_follow_the_last_row_id() {
        let mut connection = SqliteConnection::open_in_memory().unwrap();
        let options = ExecutionOptions::default();
        Transport::execute(
            &mut connection,
            &statement(
                "CREATE TABLE T (ID INTEGER PRIMARY KEY AUTOINCREMENT, NAME TEXT NOT NULL);",
                vec![],
            ),
            &options,
        )
        .unwrap();
        let result = Transport::execute_update(
            &mut connection,
            &statement(
                "INSERT INTO T (NAME) VALUES (?), (?), (?);",
                vec![
                    String::from("a").as_value(),
                    String::from("b").as_value(),
                    String::from("c").as_value(),
                ],
            ),
            &options,
            true,
        )
        .unwrap();
        assert_eq!(result.count, 3);
        assert_eq!(result.generated_keys, [1, 2, 3]);
    }

    #[test]
    fn unique_violations_carry_the_extended_code() {
        let mut connection = SqliteConnection::open("sqlite::memory:").unwrap();
        let options = ExecutionOptions::default();
        Transport::execute(
            &mut connection,
            &statement("CREATE TABLE T (ID INTEGER PRIMARY KEY, CODE TEXT UNIQUE);", vec![]),
            &options,
        )
        .unwrap();
        let insert = statement(
            "INSERT INTO T (ID, CODE) VALUES (?, ?);",
            vec![1i64.as_value(), String::from("x").as_value()],
        );
        Transport::execute_update(&mut connection, &insert, &options, false).unwrap();
        let error =
            Transport::execute_update(&mut connection, &insert, &options, false).unwrap_err();
        let driver = DriverError::find(&error).expect("Expected a driver error");
        assert_eq!(driver.vendor_code, 1555);
        assert!(format!("{:#}", error).contains("While executing the statement"));
    }

    #[test]
    fn creating_an_existing_table_is_recognized() {
        let mut connection = SqliteConnection::open_in_memory().unwrap();
        let options = ExecutionOptions::default();
        let create = statement("CREATE TABLE T (ID INTEGER PRIMARY KEY, NAME TEXT);", vec![]);
        Transport::execute(&mut connection, &create, &options).unwrap();
        let error = Transport::execute(&mut connection, &create, &options).unwrap_err();
        let driver = DriverError::find(&error).expect("Expected a driver error");
        assert!(driver.message.contains("already exists"));
        assert!(SqliteDialect.is_table_exists_error(&error));
    }

    #[test]
    fn rejects_other_schemes() {
        assert!(SqliteConnection::open("postgres://localhost/db").is_err());
    }

    #[tokio::test]
    async fn streams_rows_and_stops_early() {
        let mut connection = SqliteConnection::open_in_memory().unwrap();
        let options = ExecutionOptions::default();
        StreamTransport::execute(
            &mut connection,
            statement(
                indoc::indoc! {"
                    CREATE TABLE N (V INTEGER);
                    WITH RECURSIVE S(X) AS (SELECT 1 UNION ALL SELECT X + 1 FROM S WHERE X < 500)
                    INSERT INTO N SELECT X FROM S;
                "},
                vec![],
            ),
            options,
        )
        .await
        .unwrap();
        let rows = StreamTransport::execute_query(
            &mut connection,
            statement("SELECT V FROM N ORDER BY V;", vec![]),
            ExecutionOptions {
                fetch_size: Some(8),
                ..Default::default()
            },
        )
        .take(3)
        .collect::<Vec<_>>()
        .await;
        let values = rows
            .into_iter()
            .map(|v| i64::try_from_value(v.unwrap().values[0].clone()).unwrap())
            .collect::<Vec<_>>();
        assert_eq!(values, [1, 2, 3]);
        // The connection is usable again once the stream is gone
        let update = StreamTransport::execute_update(
            &mut connection,
            statement("DELETE FROM N WHERE V > ?;", vec![100i64.as_value()]),
            options,
            false,
        )
        .await
        .unwrap();
        assert_eq!(update.count, 400);
    }
}
