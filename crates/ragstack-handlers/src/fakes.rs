//! In-memory fakes for the handler seams (testing)

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use ragstack_cloud::FieldMapping;

use crate::error::{HandlerError, Result};
use crate::generation::GenerationClient;
use crate::vector_index::VectorIndexApi;

/// In-memory index namespace.
///
/// Created indexes are stored with their definitions; readiness can be
/// delayed by a configurable number of polls to exercise the waiting
/// path.
#[derive(Default)]
pub struct MemoryVectorIndex {
    indexes: Mutex<HashMap<String, Value>>,
    /// How many readiness polls each index answers `false` to first.
    ready_after: Mutex<HashMap<String, u32>>,
    polls: Mutex<HashMap<String, u32>>,
    fail_create: Mutex<Option<String>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create an index, as if a previous invocation already ran.
    pub fn with_existing(self, index: &str, body: Value) -> Self {
        self.indexes.lock().unwrap().insert(index.to_string(), body);
        self
    }

    /// Answer `false` to the first `polls` readiness checks of `index`.
    pub fn ready_after_polls(&self, index: &str, polls: u32) {
        self.ready_after
            .lock()
            .unwrap()
            .insert(index.to_string(), polls);
    }

    /// Make every create fail with `reason`.
    pub fn fail_create(&self, reason: &str) {
        *self.fail_create.lock().unwrap() = Some(reason.to_string());
    }

    /// Definition an index was created with, if any.
    pub fn definition(&self, index: &str) -> Option<Value> {
        self.indexes.lock().unwrap().get(index).cloned()
    }

    /// How many readiness polls an index received.
    pub fn poll_count(&self, index: &str) -> u32 {
        self.polls.lock().unwrap().get(index).copied().unwrap_or(0)
    }
}

#[async_trait]
impl VectorIndexApi for MemoryVectorIndex {
    async fn index_exists(&self, index: &str) -> Result<bool> {
        Ok(self.indexes.lock().unwrap().contains_key(index))
    }

    async fn create_index(&self, index: &str, body: Value) -> Result<()> {
        if let Some(reason) = self.fail_create.lock().unwrap().as_ref() {
            return Err(HandlerError::VectorIndex(reason.clone()));
        }
        if self.indexes.lock().unwrap().contains_key(index) {
            return Err(HandlerError::VectorIndex(format!(
                "index '{index}' already exists"
            )));
        }
        self.indexes.lock().unwrap().insert(index.to_string(), body);
        Ok(())
    }

    async fn index_ready(&self, index: &str) -> Result<bool> {
        if !self.indexes.lock().unwrap().contains_key(index) {
            return Ok(false);
        }
        let mut polls = self.polls.lock().unwrap();
        let seen = polls.entry(index.to_string()).or_insert(0);
        *seen += 1;
        let delay = self
            .ready_after
            .lock()
            .unwrap()
            .get(index)
            .copied()
            .unwrap_or(0);
        Ok(*seen > delay)
    }
}

/// Generation client with a canned answer.
pub struct StaticGeneration {
    answer: std::result::Result<String, String>,
    questions: Mutex<Vec<String>>,
}

impl StaticGeneration {
    pub fn answering(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(reason: &str) -> Self {
        Self {
            answer: Err(reason.to_string()),
            questions: Mutex::new(Vec::new()),
        }
    }

    /// Every question asked so far, in order.
    pub fn questions(&self) -> Vec<String> {
        self.questions.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerationClient for StaticGeneration {
    async fn answer(&self, question: &str) -> Result<String> {
        self.questions.lock().unwrap().push(question.to_string());
        match &self.answer {
            Ok(answer) => Ok(answer.clone()),
            Err(reason) => Err(HandlerError::Generation(reason.clone())),
        }
    }
}

/// Generation client whose retrieval honours the field-mapping contract.
///
/// Passages are stored under the field names the index was created
/// with; retrieval looks them up by the names the knowledge base was
/// bound with. When the two mappings drift apart, retrieval finds
/// nothing and the answer comes back empty — no error is raised
/// anywhere, exactly like the real stack.
pub struct MappedRetrieval {
    index_mapping: FieldMapping,
    query_mapping: FieldMapping,
    passages: Vec<String>,
}

impl MappedRetrieval {
    pub fn new(index_mapping: FieldMapping, query_mapping: FieldMapping) -> Self {
        Self {
            index_mapping,
            query_mapping,
            passages: Vec::new(),
        }
    }

    /// Ingest a passage under the index's field mapping.
    pub fn with_passage(mut self, text: &str) -> Self {
        self.passages.push(text.to_string());
        self
    }
}

#[async_trait]
impl GenerationClient for MappedRetrieval {
    async fn answer(&self, _question: &str) -> Result<String> {
        if self.query_mapping == self.index_mapping {
            Ok(self.passages.join(" "))
        } else {
            Ok(String::new())
        }
    }
}
