// src/persist/jsonl.rs
// JSON Lines output: one serialized Record per line, in discovery order.

use async_trait::async_trait;

use super::{Output, Persister};
use crate::error::PersistError;
use crate::sink::Record;

pub struct JsonLinesPersister {
    output: Output,
}

impl JsonLinesPersister {
    pub fn new(output: Output) -> Self {
        Self { output }
    }
}

#[async_trait]
impl Persister for JsonLinesPersister {
    async fn commit(&self, batch: &[Record]) -> Result<(), PersistError> {
        let lines = batch
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        self.output.write_lines(&lines).await
    }
}
