//! Scheduled detailing jobs and their service line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::NewActivity;
use crate::store::{MemStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "scheduled",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub customer_id: i64,
    pub vehicle_id: i64,
    pub technician_id: Option<i64>,
    pub status: JobStatus,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Line item fixing the service price at booking time. Replaced wholesale
/// whenever the job's services are edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobService {
    pub id: i64,
    pub job_id: i64,
    pub service_id: i64,
    pub quantity: i32,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobServiceInput {
    pub service_id: i64,
    pub quantity: i32,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateJob {
    pub customer_id: i64,
    pub vehicle_id: i64,
    pub technician_id: Option<i64>,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub notes: Option<String>,
    pub services: Vec<JobServiceInput>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobUpdate {
    pub technician_id: Option<i64>,
    pub status: Option<JobStatus>,
    pub scheduled_start: Option<DateTime<Utc>>,
    pub scheduled_end: Option<DateTime<Utc>>,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobFilters {
    pub status: Option<JobStatus>,
    pub customer_id: Option<i64>,
    pub technician_id: Option<i64>,
    pub scheduled_after: Option<DateTime<Utc>>,
    pub scheduled_before: Option<DateTime<Utc>>,
}

impl MemStore {
    pub async fn create_job(&self, data: CreateJob) -> Result<Job, StoreError> {
        let lines = self.price_lines(&data.services).await?;

        let job = self
            .jobs
            .insert(|id| Job {
                id,
                customer_id: data.customer_id,
                vehicle_id: data.vehicle_id,
                technician_id: data.technician_id,
                status: JobStatus::Scheduled,
                scheduled_start: data.scheduled_start,
                scheduled_end: data.scheduled_end,
                actual_start: None,
                actual_end: None,
                address: data.address.clone(),
                city: data.city.clone(),
                state: data.state.clone(),
                zip: data.zip.clone(),
                notes: data.notes.clone(),
                created_at: Utc::now(),
            })
            .await;

        for (service_id, quantity, price) in lines {
            self.job_services
                .insert(|id| JobService {
                    id,
                    job_id: job.id,
                    service_id,
                    quantity,
                    price,
                })
                .await;
        }

        self.record_activity(
            NewActivity::new(
                "job_created",
                format!(
                    "Job #{} scheduled for {}",
                    job.id,
                    job.scheduled_start.format("%Y-%m-%d %H:%M")
                ),
            )
            .customer(job.customer_id)
            .job(job.id),
        )
        .await;

        Ok(job)
    }

    pub async fn get_job(&self, id: i64) -> Option<Job> {
        self.jobs.get(id).await
    }

    pub async fn update_job(&self, id: i64, update: JobUpdate) -> Option<Job> {
        let previous = self.jobs.get(id).await?;

        let updated = self
            .jobs
            .modify(id, |job| {
                if let Some(technician_id) = update.technician_id {
                    job.technician_id = Some(technician_id);
                }
                if let Some(status) = update.status {
                    job.status = status;
                }
                if let Some(scheduled_start) = update.scheduled_start {
                    job.scheduled_start = scheduled_start;
                }
                if let Some(scheduled_end) = update.scheduled_end {
                    job.scheduled_end = Some(scheduled_end);
                }
                if let Some(actual_start) = update.actual_start {
                    job.actual_start = Some(actual_start);
                }
                if let Some(actual_end) = update.actual_end {
                    job.actual_end = Some(actual_end);
                }
                if let Some(address) = update.address {
                    job.address = Some(address);
                }
                if let Some(city) = update.city {
                    job.city = Some(city);
                }
                if let Some(state) = update.state {
                    job.state = Some(state);
                }
                if let Some(zip) = update.zip {
                    job.zip = Some(zip);
                }
                if let Some(notes) = update.notes {
                    job.notes = Some(notes);
                }
            })
            .await?;

        if updated.status != previous.status {
            self.record_job_status_activity(&updated).await;
        }

        Some(updated)
    }

    pub async fn delete_job(&self, id: i64) -> bool {
        let removed = self.jobs.remove(id).await;
        if removed {
            self.job_services.remove_where(|line| line.job_id == id).await;
        }
        removed
    }

    pub async fn list_jobs(&self, filters: JobFilters) -> Vec<Job> {
        self.jobs
            .all()
            .await
            .into_iter()
            .filter(|j| filters.status.is_none_or(|s| j.status == s))
            .filter(|j| filters.customer_id.is_none_or(|id| j.customer_id == id))
            .filter(|j| filters.technician_id.is_none_or(|id| j.technician_id == Some(id)))
            .filter(|j| filters.scheduled_after.is_none_or(|t| j.scheduled_start >= t))
            .filter(|j| filters.scheduled_before.is_none_or(|t| j.scheduled_start <= t))
            .collect()
    }

    pub async fn job_services(&self, job_id: i64) -> Vec<JobService> {
        self.job_services
            .all()
            .await
            .into_iter()
            .filter(|line| line.job_id == job_id)
            .collect()
    }

    /// Replaces the job's line items wholesale: delete all, then recreate.
    pub async fn set_job_services(
        &self,
        job_id: i64,
        services: Vec<JobServiceInput>,
    ) -> Result<Vec<JobService>, StoreError> {
        if self.jobs.get(job_id).await.is_none() {
            return Err(StoreError::MissingRef { entity: "job", id: job_id });
        }
        let lines = self.price_lines(&services).await?;

        self.job_services.remove_where(|line| line.job_id == job_id).await;

        let mut created = Vec::with_capacity(lines.len());
        for (service_id, quantity, price) in lines {
            created.push(
                self.job_services
                    .insert(|id| JobService {
                        id,
                        job_id,
                        service_id,
                        quantity,
                        price,
                    })
                    .await,
            );
        }
        Ok(created)
    }

    /// Resolves each line's booking price, defaulting to the current catalog
    /// price. Resolution happens before any write so a bad service id leaves
    /// the store untouched.
    async fn price_lines(
        &self,
        inputs: &[JobServiceInput],
    ) -> Result<Vec<(i64, i32, f64)>, StoreError> {
        let mut lines = Vec::with_capacity(inputs.len());
        for input in inputs {
            let price = match input.price {
                Some(price) => price,
                None => {
                    self.services
                        .get(input.service_id)
                        .await
                        .ok_or(StoreError::MissingRef {
                            entity: "service",
                            id: input.service_id,
                        })?
                        .price
                }
            };
            lines.push((input.service_id, input.quantity, price));
        }
        Ok(lines)
    }

    async fn record_job_status_activity(&self, job: &Job) {
        let kind = match job.status {
            JobStatus::Scheduled => "job_scheduled",
            JobStatus::InProgress => "job_in_progress",
            JobStatus::Completed => "job_completed",
            JobStatus::Cancelled => "job_cancelled",
        };
        self.record_activity(
            NewActivity::new(kind, format!("Job #{} is now {}", job.id, job.status.as_str()))
                .customer(job.customer_id)
                .job(job.id),
        )
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::ActivityFilters;
    use crate::catalog::CreateService;
    use crate::tests::test_util;

    async fn seeded_store() -> (MemStore, i64) {
        let store = MemStore::default();
        let service = store
            .create_service(CreateService {
                name: "Interior Detail".to_string(),
                description: None,
                price: 120.0,
                duration_minutes: 90,
                active: None,
                color: None,
            })
            .await;
        (store, service.id)
    }

    fn job_for(service_id: i64) -> CreateJob {
        CreateJob {
            customer_id: 1,
            vehicle_id: 1,
            technician_id: None,
            scheduled_start: Utc::now(),
            scheduled_end: None,
            address: None,
            city: None,
            state: None,
            zip: None,
            notes: None,
            services: vec![JobServiceInput { service_id, quantity: 1, price: None }],
        }
    }

    #[tokio::test]
    async fn test_create_fixes_price_from_catalog() {
        test_util::setup();
        let (store, service_id) = seeded_store().await;
        let job = crate::assert_ok!(store.create_job(job_for(service_id)).await);

        let lines = store.job_services(job.id).await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].price, 120.0);

        store
            .update_service(
                service_id,
                crate::catalog::ServiceUpdate { price: Some(150.0), ..Default::default() },
            )
            .await
            .unwrap();
        let lines = store.job_services(job.id).await;
        assert_eq!(lines[0].price, 120.0, "booked price must not track the catalog");
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_service() {
        let store = MemStore::default();
        let err = crate::assert_err!(store.create_job(job_for(42)).await);
        assert!(matches!(err, StoreError::MissingRef { entity: "service", id: 42 }));
        assert!(store.list_jobs(JobFilters::default()).await.is_empty());
    }

    #[tokio::test]
    async fn test_status_change_emits_activity() {
        let (store, service_id) = seeded_store().await;
        let job = store.create_job(job_for(service_id)).await.unwrap();

        store
            .update_job(job.id, JobUpdate { status: Some(JobStatus::Completed), ..Default::default() })
            .await
            .unwrap();

        let completed = store
            .list_activities(ActivityFilters {
                kind: Some("job_completed".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].job_id, Some(job.id));

        // Same-status update must not emit again.
        store
            .update_job(job.id, JobUpdate { status: Some(JobStatus::Completed), ..Default::default() })
            .await
            .unwrap();
        let completed = store
            .list_activities(ActivityFilters {
                kind: Some("job_completed".to_string()),
                ..Default::default()
            })
            .await;
        assert_eq!(completed.len(), 1);
    }

    #[tokio::test]
    async fn test_set_job_services_replaces_wholesale() {
        let (store, service_id) = seeded_store().await;
        let job = store.create_job(job_for(service_id)).await.unwrap();
        let original = store.job_services(job.id).await;

        let replaced = store
            .set_job_services(
                job.id,
                vec![
                    JobServiceInput { service_id, quantity: 2, price: Some(100.0) },
                    JobServiceInput { service_id, quantity: 1, price: None },
                ],
            )
            .await
            .unwrap();
        assert_eq!(replaced.len(), 2);

        let lines = store.job_services(job.id).await;
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.id != original[0].id), "old lines are gone");

        let err = store.set_job_services(999, vec![]).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingRef { entity: "job", .. }));
    }

    #[tokio::test]
    async fn test_delete_job_removes_line_items() {
        let (store, service_id) = seeded_store().await;
        let job = store.create_job(job_for(service_id)).await.unwrap();

        assert!(store.delete_job(job.id).await);
        assert!(store.job_services(job.id).await.is_empty());
        assert!(!store.delete_job(job.id).await);
    }

    #[tokio::test]
    async fn test_list_filters_by_window_and_status() {
        let (store, service_id) = seeded_store().await;
        let mut early = job_for(service_id);
        early.scheduled_start = "2026-03-01T10:00:00Z".parse().unwrap();
        let mut late = job_for(service_id);
        late.scheduled_start = "2026-05-01T10:00:00Z".parse().unwrap();
        let early = store.create_job(early).await.unwrap();
        store.create_job(late).await.unwrap();

        let march = store
            .list_jobs(JobFilters {
                scheduled_after: Some("2026-02-15T00:00:00Z".parse().unwrap()),
                scheduled_before: Some("2026-03-31T00:00:00Z".parse().unwrap()),
                ..Default::default()
            })
            .await;
        assert_eq!(march.len(), 1);
        assert_eq!(march[0].id, early.id);

        let completed = store
            .list_jobs(JobFilters { status: Some(JobStatus::Completed), ..Default::default() })
            .await;
        assert!(completed.is_empty());
    }
}
