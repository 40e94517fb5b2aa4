use crate::{Dialect, GenericDialect};
use std::{
    fmt::{self, Debug},
    sync::Arc,
    time::Duration,
};
use time::OffsetDateTime;
use uuid::Uuid;

/// Transport level knobs, every field is optional and unset means "transport default".
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// Entities per statement batch.
    pub batch_size: Option<u32>,
    /// Rows fetched per round trip.
    pub fetch_size: Option<u32>,
    /// Maximum number of rows a query returns.
    pub max_rows: Option<u32>,
    pub query_timeout: Option<Duration>,
}

impl ExecutionOptions {
    /// Fields set in `other` win over the ones in `self`.
    pub fn merge(&self, other: &ExecutionOptions) -> ExecutionOptions {
        ExecutionOptions {
            batch_size: other.batch_size.or(self.batch_size),
            fetch_size: other.fetch_size.or(self.fetch_size),
            max_rows: other.max_rows.or(self.max_rows),
            query_timeout: other.query_timeout.or(self.query_timeout),
        }
    }
}

/// Source of the current time, used for created-at and updated-at properties.
pub trait ClockProvider: Send + Sync + Debug {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Default, Debug, Clone, Copy)]
pub struct SystemClock;

impl ClockProvider for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub OffsetDateTime);

impl ClockProvider for FixedClock {
    fn now(&self) -> OffsetDateTime {
        self.0
    }
}

/// Everything a runner needs besides the transport: dialect, clock and execution defaults.
#[derive(Clone)]
pub struct DatabaseConfig {
    pub id: Uuid,
    pub dialect: Arc<dyn Dialect>,
    pub clock: Arc<dyn ClockProvider>,
    pub execution: ExecutionOptions,
}

impl DatabaseConfig {
    pub fn new(dialect: impl Dialect + 'static) -> Self {
        Self {
            id: Uuid::new_v4(),
            dialect: Arc::new(dialect),
            clock: Arc::new(SystemClock),
            execution: Default::default(),
        }
    }
    pub fn with_clock(mut self, clock: impl ClockProvider + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }
    pub fn with_execution_options(mut self, execution: ExecutionOptions) -> Self {
        self.execution = execution;
        self
    }
    /// The configuration dry runs use unless told otherwise.
    pub fn dry_run() -> Self {
        Self::new(GenericDialect)
    }
}

impl Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("id", &self.id)
            .field("dialect", &self.dialect.name())
            .field("clock", &self.clock)
            .field("execution", &self.execution)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_options_win() {
        let base = ExecutionOptions {
            batch_size: Some(10),
            fetch_size: Some(100),
            ..Default::default()
        };
        let merged = base.merge(&ExecutionOptions {
            batch_size: Some(2),
            query_timeout: Some(Duration::from_secs(1)),
            ..Default::default()
        });
        assert_eq!(
            merged,
            ExecutionOptions {
                batch_size: Some(2),
                fetch_size: Some(100),
                max_rows: None,
                query_timeout: Some(Duration::from_secs(1)),
            }
        );
    }
}
