//! Append-only activity feed, written as a side effect of business mutations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::MemStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub kind: String,
    pub customer_id: Option<i64>,
    pub job_id: Option<i64>,
    pub invoice_id: Option<i64>,
    pub description: String,
    pub timestamp: DateTime<Utc>,
    pub metadata: serde_json::Value,
}

#[derive(Debug, Clone)]
pub(crate) struct NewActivity {
    pub kind: &'static str,
    pub customer_id: Option<i64>,
    pub job_id: Option<i64>,
    pub invoice_id: Option<i64>,
    pub description: String,
    pub metadata: serde_json::Value,
}

impl NewActivity {
    pub(crate) fn new(kind: &'static str, description: String) -> Self {
        Self {
            kind,
            customer_id: None,
            job_id: None,
            invoice_id: None,
            description,
            metadata: serde_json::Value::Null,
        }
    }

    pub(crate) fn customer(mut self, id: i64) -> Self {
        self.customer_id = Some(id);
        self
    }

    pub(crate) fn job(mut self, id: i64) -> Self {
        self.job_id = Some(id);
        self
    }

    pub(crate) fn invoice(mut self, id: i64) -> Self {
        self.invoice_id = Some(id);
        self
    }

    pub(crate) fn metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActivityFilters {
    pub kind: Option<String>,
    pub customer_id: Option<i64>,
    pub job_id: Option<i64>,
    pub since: Option<DateTime<Utc>>,
}

impl MemStore {
    pub(crate) async fn record_activity(&self, entry: NewActivity) -> Activity {
        let activity = self
            .activities
            .insert(|id| Activity {
                id,
                kind: entry.kind.to_string(),
                customer_id: entry.customer_id,
                job_id: entry.job_id,
                invoice_id: entry.invoice_id,
                description: entry.description.clone(),
                timestamp: Utc::now(),
                metadata: entry.metadata.clone(),
            })
            .await;
        log::info!("activity {}: {}", activity.kind, activity.description);
        activity
    }

    pub async fn list_activities(&self, filters: ActivityFilters) -> Vec<Activity> {
        self.activities
            .all()
            .await
            .into_iter()
            .filter(|a| filters.kind.as_ref().is_none_or(|k| &a.kind == k))
            .filter(|a| filters.customer_id.is_none_or(|id| a.customer_id == Some(id)))
            .filter(|a| filters.job_id.is_none_or(|id| a.job_id == Some(id)))
            .filter(|a| filters.since.is_none_or(|t| a.timestamp >= t))
            .collect()
    }

    /// Most recent entries first. Map order is never relied on; the feed is
    /// sorted by timestamp descending explicitly.
    pub async fn recent_activities(&self, limit: usize) -> Vec<Activity> {
        let mut all = self.activities.all().await;
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        all.truncate(limit);
        all
    }
}
