// src/persist/postgres.rs
// =============================================================================
// Commits a crawl batch straight into PostgreSQL.
//
// How it works:
// 1. encode() turns the batch into schema + INSERT statements
// 2. One transaction is opened on the pool
// 3. Every statement is executed with its parameters bound (never spliced)
// 4. The transaction commits; any failure rolls the whole batch back
//
// Rust concepts:
// - sqlx::query(..).bind(..): parameters travel separately from the SQL text
// - Transaction: dropped without commit() means rolled back
// - fold: threads the query builder through every parameter
// =============================================================================

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPool, PgPoolOptions, Postgres};
use sqlx::query::Query;
use std::time::Duration;
use tracing::{debug, info};

use super::statements::{encode, Param, Statement};
use super::Persister;
use crate::error::PersistError;
use crate::sink::Record;

type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

// A crawl commits once, so a couple of connections is plenty
const MAX_CONNECTIONS: u32 = 2;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct PgPersister {
    pool: PgPool,
}

impl PgPersister {
    /// Wraps an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Opens a pool and checks that the database is reachable
    pub async fn connect(database_url: &str) -> Result<Self, PersistError> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }
}

// Binds one parameter with its column type, NULLs included
fn bind_param<'q>(query: PgQuery<'q>, param: &Param) -> PgQuery<'q> {
    match param {
        Param::Int(value) => query.bind(*value),
        Param::Text(value) => query.bind(value.clone()),
    }
}

fn prepare(statement: &Statement) -> PgQuery<'static> {
    statement
        .params
        .iter()
        .fold(sqlx::query(statement.sql), bind_param)
}

#[async_trait]
impl Persister for PgPersister {
    async fn commit(&self, batch: &[Record]) -> Result<(), PersistError> {
        let statements = encode(batch);

        // Everything below runs in one transaction:
        // either the whole crawl lands in the tables or none of it does
        let mut tx = self.pool.begin().await?;
        for statement in &statements {
            debug!(sql = statement.sql, params = statement.params.len(), "executing");
            prepare(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        info!(records = batch.len(), "batch committed to postgres");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CrawlGraph, NodeKey};
    use crate::sink::RecordSink;

    #[test]
    fn test_every_statement_binds_all_its_placeholders() {
        let mut graph = CrawlGraph::new();
        let seed = graph.add_account("seed", None);
        let post = graph.add_post(5, NodeKey::Account("seed".into()), "hi");
        let mut sink = RecordSink::new();
        sink.record(graph.get(seed).unwrap(), None, 0);
        sink.record(
            graph.get(post).unwrap(),
            Some((graph.get(seed).unwrap(), crate::model::Relation::HasPosts)),
            1,
        );

        for statement in encode(sink.batch()) {
            let placeholders = (1..=statement.params.len())
                .filter(|n| statement.sql.contains(&format!("${}", n)))
                .count();
            assert_eq!(placeholders, statement.params.len(), "{}", statement.sql);
            assert!(!statement.sql.contains(&format!("${}", statement.params.len() + 1)));
            // building the query must not panic for typed NULLs either
            let _ = prepare(&statement);
        }
    }

    #[tokio::test]
    async fn test_unreachable_database_is_a_persist_error() {
        // Port 1 refuses connections; the lazy pool only finds out on commit
        let pool = PgPoolOptions::new()
            .acquire_timeout(Duration::from_millis(300))
            .connect_lazy("postgres://crawler@127.0.0.1:1/crawl")
            .unwrap();
        let persister = PgPersister::new(pool);

        let err = persister.commit(&[]).await.unwrap_err();
        assert!(matches!(err, PersistError::Database(_)));
    }
}
