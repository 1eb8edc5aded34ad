// src/persist/statements.rs
// =============================================================================
// Encodes a crawl batch as parameterized SQL statements (PostgreSQL style
// $1, $2 placeholders).
//
// Values are never spliced into the SQL text: every statement carries its
// parameters separately, ready to be bound by a database driver. The output
// starts with the schema (drop + create for both tables), then one INSERT per
// record in discovery order.
//
// Tables:
//   accounts(seq, name, lang, parent_seq, relation, depth)
//   posts(seq, post_id, text, parent_seq, relation, depth)
// =============================================================================

use async_trait::async_trait;
use serde::Serialize;

use super::{Output, Persister};
use crate::error::PersistError;
use crate::model::NodeKey;
use crate::sink::Record;

const SCHEMA: [&str; 4] = [
    "DROP TABLE IF EXISTS accounts",
    "CREATE TABLE accounts (seq BIGINT PRIMARY KEY, name VARCHAR(256) NOT NULL, \
     lang VARCHAR(64), parent_seq BIGINT, relation VARCHAR(32), depth INTEGER NOT NULL)",
    "DROP TABLE IF EXISTS posts",
    "CREATE TABLE posts (seq BIGINT PRIMARY KEY, post_id BIGINT NOT NULL, \
     text VARCHAR(64), parent_seq BIGINT, relation VARCHAR(32), depth INTEGER NOT NULL)",
];

const INSERT_ACCOUNT: &str =
    "INSERT INTO accounts (seq, name, lang, parent_seq, relation, depth) VALUES ($1, $2, $3, $4, $5, $6)";

const INSERT_POST: &str =
    "INSERT INTO posts (seq, post_id, text, parent_seq, relation, depth) VALUES ($1, $2, $3, $4, $5, $6)";

/// A bind parameter.
///
/// NULLs keep their column type: Postgres rejects a text-typed NULL bound
/// to a BIGINT column, so a missing parent_seq is `Int(None)`, not a bare null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Param {
    Int(Option<i64>),
    Text(Option<String>),
}

impl Param {
    pub fn int(value: i64) -> Self {
        Param::Int(Some(value))
    }

    pub fn text(value: impl Into<String>) -> Self {
        Param::Text(Some(value.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Param::Int(None) | Param::Text(None))
    }
}

impl From<Option<String>> for Param {
    fn from(value: Option<String>) -> Self {
        Param::Text(value)
    }
}

impl From<Option<i64>> for Param {
    fn from(value: Option<i64>) -> Self {
        Param::Int(value)
    }
}

/// SQL text plus the values for its placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Statement {
    pub sql: &'static str,
    pub params: Vec<Param>,
}

fn insert(record: &Record) -> Statement {
    let parent_seq = Param::from(record.parent_seq.map(|p| p.0 as i64));
    let relation = Param::from(record.relation.map(|r| r.label().to_string()));
    let seq = Param::int(record.seq.0 as i64);
    let depth = Param::int(i64::from(record.depth));

    match &record.key {
        NodeKey::Account(name) => Statement {
            sql: INSERT_ACCOUNT,
            params: vec![
                seq,
                Param::text(name.as_str()),
                Param::from(record.lang.clone()),
                parent_seq,
                relation,
                depth,
            ],
        },
        NodeKey::Post(post_id) => Statement {
            sql: INSERT_POST,
            params: vec![
                seq,
                Param::int(*post_id as i64),
                Param::from(record.text.clone()),
                parent_seq,
                relation,
                depth,
            ],
        },
    }
}

/// Schema statements followed by one INSERT per record
pub fn encode(batch: &[Record]) -> Vec<Statement> {
    let schema = SCHEMA.iter().map(|sql| Statement {
        sql: *sql,
        params: Vec::new(),
    });
    schema.chain(batch.iter().map(insert)).collect()
}

/// Writes the encoded statements as JSON lines: {"sql": ..., "params": [...]}
pub struct StatementPersister {
    output: Output,
}

impl StatementPersister {
    pub fn new(output: Output) -> Self {
        Self { output }
    }
}

#[async_trait]
impl Persister for StatementPersister {
    async fn commit(&self, batch: &[Record]) -> Result<(), PersistError> {
        let lines = encode(batch)
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        self.output.write_lines(&lines).await
    }
}
