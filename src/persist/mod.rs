// src/persist/mod.rs
// =============================================================================
// Where a finished crawl batch goes.
//
// The engine calls `Persister::commit` exactly once per crawl, after the
// traversal has ended (normally or by deadline). Implementations:
// - jsonl: one JSON object per record
// - statements: parameterized INSERT statements (values never spliced into SQL)
// - postgres: runs those statements against PostgreSQL in one transaction
// - MemoryPersister: keeps batches in memory (tests, library users)
// =============================================================================

mod jsonl;
mod postgres;
mod statements;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::io::AsyncWriteExt;

use crate::error::PersistError;
use crate::sink::Record;

pub use jsonl::JsonLinesPersister;
pub use postgres::PgPersister;
pub use statements::{encode, Param, Statement, StatementPersister};

/// Accepts the finished batch of a crawl
#[async_trait]
pub trait Persister: Send + Sync {
    async fn commit(&self, batch: &[Record]) -> Result<(), PersistError>;
}

/// Where file-based persisters write
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
}

impl Output {
    // Writes all lines at once; a file is replaced, not appended to
    async fn write_lines(&self, lines: &[String]) -> Result<(), PersistError> {
        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        match self {
            Output::Stdout => {
                let mut stdout = tokio::io::stdout();
                stdout.write_all(content.as_bytes()).await?;
                stdout.flush().await?;
            }
            Output::File(path) => tokio::fs::write(path, content).await?,
        }
        Ok(())
    }
}

/// Keeps every committed batch in memory
#[derive(Debug, Default)]
pub struct MemoryPersister {
    batches: Mutex<Vec<Vec<Record>>>,
}

impl MemoryPersister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of times commit() was called
    pub fn commits(&self) -> usize {
        self.lock().len()
    }

    /// All committed records, flattened in commit order
    pub fn records(&self) -> Vec<Record> {
        self.lock().iter().flatten().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Vec<Record>>> {
        self.batches.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl Persister for MemoryPersister {
    async fn commit(&self, batch: &[Record]) -> Result<(), PersistError> {
        self.lock().push(batch.to_vec());
        Ok(())
    }
}
