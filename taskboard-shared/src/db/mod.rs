/// Database layer
///
/// - `pool`: PostgreSQL connection pool and health checks
/// - `migrations`: embedded schema migrations
///
/// Only used when the API runs with the PostgreSQL store.

pub mod migrations;
pub mod pool;
