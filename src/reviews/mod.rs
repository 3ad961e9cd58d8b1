use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::NewActivity;
use crate::store::MemStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    pub customer_id: i64,
    pub job_id: Option<i64>,
    pub rating: i32,
    pub comment: Option<String>,
    pub source: Option<String>,
    pub responded: bool,
    pub response_text: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReview {
    pub customer_id: i64,
    pub job_id: Option<i64>,
    pub rating: i32,
    pub comment: Option<String>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewUpdate {
    pub rating: Option<i32>,
    pub comment: Option<String>,
    pub responded: Option<bool>,
    pub response_text: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewFilters {
    pub customer_id: Option<i64>,
    pub job_id: Option<i64>,
    pub responded: Option<bool>,
    pub min_rating: Option<i32>,
}

impl MemStore {
    pub async fn create_review(&self, data: CreateReview) -> Review {
        self.reviews
            .insert(|id| Review {
                id,
                customer_id: data.customer_id,
                job_id: data.job_id,
                rating: data.rating,
                comment: data.comment.clone(),
                source: data.source.clone(),
                responded: false,
                response_text: None,
                created_at: Utc::now(),
            })
            .await
    }

    pub async fn get_review(&self, id: i64) -> Option<Review> {
        self.reviews.get(id).await
    }

    pub async fn update_review(&self, id: i64, update: ReviewUpdate) -> Option<Review> {
        let previous = self.reviews.get(id).await?;

        let updated = self
            .reviews
            .modify(id, |review| {
                if let Some(rating) = update.rating {
                    review.rating = rating;
                }
                if let Some(comment) = update.comment {
                    review.comment = Some(comment);
                }
                if let Some(responded) = update.responded {
                    review.responded = responded;
                }
                if let Some(response_text) = update.response_text {
                    review.response_text = Some(response_text);
                }
            })
            .await?;

        if !previous.responded && updated.responded && updated.response_text.is_some() {
            self.record_activity(
                NewActivity::new(
                    "review_responded",
                    format!("Responded to review #{}", updated.id),
                )
                .customer(updated.customer_id),
            )
            .await;
        }

        Some(updated)
    }

    pub async fn list_reviews(&self, filters: ReviewFilters) -> Vec<Review> {
        self.reviews
            .all()
            .await
            .into_iter()
            .filter(|r| filters.customer_id.is_none_or(|id| r.customer_id == id))
            .filter(|r| filters.job_id.is_none_or(|id| r.job_id == Some(id)))
            .filter(|r| filters.responded.is_none_or(|responded| r.responded == responded))
            .filter(|r| filters.min_rating.is_none_or(|min| r.rating >= min))
            .collect()
    }
}
