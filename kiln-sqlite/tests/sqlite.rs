#[cfg(test)]
mod tests {
    use kiln_core::DatabaseConfig;
    use kiln_sqlite::{SqliteConnection, SqliteDialect};
    use kiln_tests::{execute_stream_tests, execute_tests, init_logs, silent_logs};
    use std::{path::Path, sync::Mutex};

    static MUTEX: Mutex<()> = Mutex::new(());

    #[test]
    fn sqlite() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/tests.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            std::fs::remove_file(DB_PATH).expect(
                format!("Failed to remove existing test database file {}", DB_PATH).as_str(),
            );
        }
        let mut connection = SqliteConnection::open(&format!("sqlite://{}?mode=rwc", DB_PATH))
            .expect("Could not open the database");
        assert!(
            Path::new(DB_PATH).exists(),
            "Database file should be created after connection"
        );
        let config = DatabaseConfig::new(SqliteDialect);
        execute_tests(&mut connection, &config);
    }

    #[test]
    fn sqlite_in_memory() {
        init_logs();
        let mut connection =
            SqliteConnection::open_in_memory().expect("Could not open the in memory database");
        execute_tests(&mut connection, &DatabaseConfig::new(SqliteDialect));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sqlite_stream() {
        init_logs();
        let mut connection =
            SqliteConnection::open_in_memory().expect("Could not open the in memory database");
        execute_stream_tests(&mut connection, &DatabaseConfig::new(SqliteDialect)).await;
    }

    #[test]
    fn read_only_requires_the_file() {
        init_logs();
        const DB_PATH: &'static str = "../target/debug/missing.sqlite";
        let _guard = MUTEX.lock().unwrap();
        if Path::new(DB_PATH).exists() {
            std::fs::remove_file(DB_PATH).expect("Failed to remove the database file");
        }
        silent_logs! {
            assert!(
                SqliteConnection::open(&format!("sqlite://{}?mode=ro", DB_PATH)).is_err(),
                "Should not be able to open in read only a missing database"
            );
            assert!(SqliteConnection::open("sqlite::memory:?mode=xyz").is_err());
        }
    }
}
