mod composition;
mod entities;
mod guard;
#[cfg(not(feature = "disable-identity"))]
mod identity;
mod projection;
mod relations;
mod schema;
mod simple;
mod streaming;
mod timestamps;
#[cfg(not(feature = "disable-upsert-keys"))]
mod upsert;

pub use entities::*;

use kiln::{DatabaseConfig, IntoQuery, SchemaDsl, StreamTransport, TableMetamodel, Transport};
use log::LevelFilter;
use std::{env, sync::Arc};

pub fn init_logs() {
    let mut logger = env_logger::builder();
    logger
        .is_test(true)
        .format_file(true)
        .format_line_number(true);
    if env::var("RUST_LOG").is_err() {
        logger.filter_level(LevelFilter::Warn);
    }
    let _ = logger.try_init();
}

/// Drops and creates again the given tables.
pub fn reset(
    transport: &mut dyn Transport,
    config: &DatabaseConfig,
    tables: impl IntoIterator<Item = Arc<dyn TableMetamodel>>,
) {
    let tables = tables.into_iter().collect::<Vec<_>>();
    SchemaDsl::drop(tables.clone())
        .and_then(SchemaDsl::create(tables))
        .run(transport, config)
        .expect("Failed to reset the tables");
}

/// Like [`reset`], on a streaming transport.
pub async fn reset_stream(
    transport: &mut dyn StreamTransport,
    config: &DatabaseConfig,
    tables: impl IntoIterator<Item = Arc<dyn TableMetamodel>>,
) {
    let tables = tables.into_iter().collect::<Vec<_>>();
    SchemaDsl::drop(tables.clone())
        .and_then(SchemaDsl::create(tables))
        .run_stream(transport, config)
        .await
        .expect("Failed to reset the tables");
}

/// Every scenario, in order, on a blocking transport. The scenarios create their own tables.
pub fn execute_tests(transport: &mut dyn Transport, config: &DatabaseConfig) {
    schema::schema(transport, config);
    simple::simple(transport, config);
    simple::optimistic_lock(transport, config);
    simple::unique_constraint(transport, config);
    guard::empty_where(transport, config);
    relations::one_to_many(transport, config);
    relations::aliased_self_join(transport, config);
    projection::projections(transport, config);
    projection::records(transport, config);
    composition::composition(transport, config);
    timestamps::timestamps(transport, config);
    #[cfg(not(feature = "disable-upsert-keys"))]
    upsert::upsert(transport, config);
    #[cfg(not(feature = "disable-identity"))]
    identity::identity(transport, config);
}

/// The scenarios of a streaming transport.
pub async fn execute_stream_tests(transport: &mut dyn StreamTransport, config: &DatabaseConfig) {
    streaming::simple(transport, config).await;
    streaming::rows(transport, config).await;
    streaming::relations(transport, config).await;
    streaming::composition(transport, config).await;
    #[cfg(not(feature = "disable-identity"))]
    streaming::identity(transport, config).await;
}

#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let level = log::max_level();
        log::set_max_level(log::LevelFilter::Off);
        $($code)+
        log::set_max_level(level);
    }};
}
