//! Keyed document storage (redb).
//!
//! Questions, per-provider response records, and analysis verdicts are
//! JSON documents addressed by message id, one table per document kind.

use crate::analyzer::AnalysisVerdict;
use crate::dispatch::AggregatedAnswerSet;
use crate::error::{Result, StoreError};
use crate::providers::GenerationResult;
use redb::{Database, ReadableTable as _, TableDefinition};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

const QUESTIONS: TableDefinition<&str, &str> = TableDefinition::new("questions");
const RESPONSES: TableDefinition<&str, &str> = TableDefinition::new("responses");
const ANALYSES: TableDefinition<&str, &str> = TableDefinition::new("analyses");

/// Persistence record for one provider's outcome. Answer and error are
/// mutually exclusive; the timestamp is epoch milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: i64,
}

impl StoredResponse {
    fn from_result(result: &GenerationResult) -> Self {
        Self {
            answer: result.answer().map(str::to_string),
            error: result.error_message(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Document store for questions, responses, and verdicts.
#[derive(Clone)]
pub struct ResultStore {
    db: Arc<Database>,
}

impl ResultStore {
    /// Open (or create) the store at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Record a question under its message id.
    pub fn save_question(&self, message_id: &str, content: &str) -> Result<()> {
        let document = serde_json::json!({
            "content": content,
            "timestamp": chrono::Utc::now().timestamp_millis(),
        });
        self.put(QUESTIONS, message_id, &document)?;
        tracing::debug!(message_id, "question saved");
        Ok(())
    }

    pub fn load_question(&self, message_id: &str) -> Result<Option<Value>> {
        Ok(self.get(QUESTIONS, message_id)?)
    }

    /// Persist one record per dispatched provider and return the records
    /// for the caller's response.
    pub fn save_responses(
        &self,
        message_id: &str,
        answers: &AggregatedAnswerSet,
    ) -> Result<BTreeMap<String, StoredResponse>> {
        let records: BTreeMap<String, StoredResponse> = answers
            .iter()
            .map(|(provider, result)| {
                (provider.to_string(), StoredResponse::from_result(result))
            })
            .collect();

        let document = serde_json::to_value(&records).map_err(StoreError::Encode)?;
        self.put(RESPONSES, message_id, &document)?;
        tracing::debug!(message_id, providers = records.len(), "responses saved");
        Ok(records)
    }

    pub fn load_responses(
        &self,
        message_id: &str,
    ) -> Result<Option<BTreeMap<String, StoredResponse>>> {
        match self.get(RESPONSES, message_id)? {
            Some(document) => {
                let records = serde_json::from_value(document).map_err(StoreError::Encode)?;
                Ok(Some(records))
            }
            None => Ok(None),
        }
    }

    /// Persist a verdict in its wire shape.
    pub fn save_analysis(&self, message_id: &str, verdict: &AnalysisVerdict) -> Result<()> {
        self.put(ANALYSES, message_id, &verdict.to_wire())?;
        tracing::debug!(message_id, "analysis saved");
        Ok(())
    }

    pub fn load_analysis(&self, message_id: &str) -> Result<Option<Value>> {
        Ok(self.get(ANALYSES, message_id)?)
    }

    fn put(
        &self,
        table: TableDefinition<&str, &str>,
        key: &str,
        document: &Value,
    ) -> std::result::Result<(), StoreError> {
        let encoded = document.to_string();
        let txn = self.db.begin_write()?;
        {
            let mut table = txn.open_table(table)?;
            table.insert(key, encoded.as_str())?;
        }
        txn.commit()?;
        Ok(())
    }

    fn get(
        &self,
        table: TableDefinition<&str, &str>,
        key: &str,
    ) -> std::result::Result<Option<Value>, StoreError> {
        let txn = self.db.begin_read()?;
        let table = match txn.open_table(table) {
            Ok(table) => table,
            // A table that was never written to does not exist yet.
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(error) => return Err(error.into()),
        };

        match table.get(key)? {
            Some(guard) => Ok(Some(serde_json::from_str(guard.value())?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{FailureKind, ProviderId};

    fn setup_store() -> (tempfile::TempDir, ResultStore) {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store =
            ResultStore::open(&dir.path().join("test.redb")).expect("store should open");
        (dir, store)
    }

    #[test]
    fn questions_round_trip() {
        let (_dir, store) = setup_store();

        store
            .save_question("msg-1", "What is 2+2?")
            .expect("question should save");

        let document = store
            .load_question("msg-1")
            .expect("load should succeed")
            .expect("question should exist");

        assert_eq!(document["content"], "What is 2+2?");
        assert!(document["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn missing_documents_load_as_none() {
        let (_dir, store) = setup_store();

        assert!(store.load_question("absent").expect("load ok").is_none());
        assert!(store.load_responses("absent").expect("load ok").is_none());
        assert!(store.load_analysis("absent").expect("load ok").is_none());
    }

    #[test]
    fn response_records_keep_answer_and_error_exclusive() {
        let (_dir, store) = setup_store();

        let mut answers = AggregatedAnswerSet::new();
        answers.insert(
            ProviderId::OpenAi,
            GenerationResult::Success {
                provider: ProviderId::OpenAi,
                text: "4".into(),
            },
        );
        answers.insert(
            ProviderId::Grok,
            GenerationResult::Failure {
                provider: ProviderId::Grok,
                kind: FailureKind::Timeout,
                message: "call exceeded 30s".into(),
            },
        );

        let records = store
            .save_responses("msg-2", &answers)
            .expect("responses should save");
        assert_eq!(records.len(), 2);

        let loaded = store
            .load_responses("msg-2")
            .expect("load should succeed")
            .expect("records should exist");

        let openai = &loaded["openai"];
        assert_eq!(openai.answer.as_deref(), Some("4"));
        assert!(openai.error.is_none());

        let grok = &loaded["grok"];
        assert!(grok.answer.is_none());
        assert_eq!(grok.error.as_deref(), Some("timeout: call exceeded 30s"));
    }

    #[test]
    fn verdicts_persist_in_wire_shape() {
        let (_dir, store) = setup_store();

        let verdict = AnalysisVerdict::Verdict {
            summary: "All agree: 4.".into(),
            best_provider: ProviderId::OpenAi,
            explanation: "Clearest answer.".into(),
        };
        store
            .save_analysis("msg-3", &verdict)
            .expect("verdict should save");

        let document = store
            .load_analysis("msg-3")
            .expect("load should succeed")
            .expect("verdict should exist");

        assert_eq!(document["bestModel"], "openai");
        assert_eq!(document["summary"], "All agree: 4.");
    }
}
