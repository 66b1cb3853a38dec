use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: String,
    pub user_id: String,
    pub tutorial_id: String,
    pub date: DateTime<Utc>,
    pub score: u32,
    pub total_questions: usize,
}

impl HistoryRecord {
    pub fn new(user_id: &str, tutorial_id: &str, score: u32, total_questions: usize) -> Self {
        Self {
            id: format!("hist-{}", Uuid::new_v4().simple()),
            user_id: user_id.to_string(),
            tutorial_id: tutorial_id.to_string(),
            date: Utc::now(),
            score,
            total_questions,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HistoryFilter {
    pub user_id: Option<String>,
    pub tutorial_id: Option<String>,
}

impl HistoryFilter {
    pub fn for_user(user_id: &str) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            ..Self::default()
        }
    }

    fn matches(&self, record: &HistoryRecord) -> bool {
        self.user_id.as_deref().map_or(true, |u| u == record.user_id)
            && self
                .tutorial_id
                .as_deref()
                .map_or(true, |t| t == record.tutorial_id)
    }
}

/// Storage for submitted assessments. Records are appended, never updated.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    async fn append(&self, record: HistoryRecord);

    /// Matching records in insertion order.
    async fn query(&self, filter: &HistoryFilter) -> Vec<HistoryRecord>;
}

/// Process-lifetime history; contents are lost on restart.
#[derive(Default)]
pub struct InMemoryHistory {
    records: RwLock<Vec<HistoryRecord>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryRepository for InMemoryHistory {
    async fn append(&self, record: HistoryRecord) {
        self.records.write().await.push(record);
    }

    async fn query(&self, filter: &HistoryFilter) -> Vec<HistoryRecord> {
        self.records
            .read()
            .await
            .iter()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect()
    }
}
