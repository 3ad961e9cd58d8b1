//! Read-side aggregation. Every report scans its collections at call time;
//! nothing is materialized or cached.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::inventory::TransactionKind;
use crate::jobs::{Job, JobStatus};
use crate::store::MemStore;

#[derive(Debug, Clone, Serialize)]
pub struct RevenueStats {
    pub total_revenue: f64,
    pub jobs_completed: u64,
    pub new_customers: u64,
    pub avg_job_value: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TopService {
    pub service_id: i64,
    pub name: String,
    pub revenue: f64,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TechnicianHolding {
    pub inventory_item_id: i64,
    pub name: String,
    pub sku: String,
    pub quantity: i32,
}

impl MemStore {
    pub async fn revenue_stats(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> RevenueStats {
        let completed = self.completed_jobs_in(start, end).await;
        let job_ids: HashSet<i64> = completed.iter().map(|j| j.id).collect();

        let total_revenue: f64 = self
            .invoices
            .all()
            .await
            .iter()
            .filter(|i| i.paid && job_ids.contains(&i.job_id))
            .map(|i| i.paid_amount.unwrap_or(0.0))
            .sum();

        let new_customers = self
            .customers
            .all()
            .await
            .iter()
            .filter(|c| c.created_at >= start && c.created_at <= end)
            .count() as u64;

        let jobs_completed = completed.len() as u64;
        let avg_job_value = if jobs_completed == 0 {
            0.0
        } else {
            total_revenue / jobs_completed as f64
        };

        RevenueStats {
            total_revenue,
            jobs_completed,
            new_customers,
            avg_job_value,
        }
    }

    pub async fn top_services(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        limit: usize,
    ) -> Vec<TopService> {
        let job_ids: HashSet<i64> = self
            .completed_jobs_in(start, end)
            .await
            .iter()
            .map(|j| j.id)
            .collect();

        let mut by_service: HashMap<i64, (f64, i64)> = HashMap::new();
        for line in self.job_services.all().await {
            if !job_ids.contains(&line.job_id) {
                continue;
            }
            let entry = by_service.entry(line.service_id).or_insert((0.0, 0));
            entry.0 += line.price * line.quantity as f64;
            entry.1 += line.quantity as i64;
        }

        let mut ranked = Vec::with_capacity(by_service.len());
        for (service_id, (revenue, count)) in by_service {
            let name = match self.services.get(service_id).await {
                Some(service) => service.name,
                None => format!("Service #{service_id}"),
            };
            ranked.push(TopService { service_id, name, revenue, count });
        }
        ranked.sort_by(|a, b| b.revenue.partial_cmp(&a.revenue).unwrap_or(Ordering::Equal));
        ranked.truncate(limit);
        ranked
    }

    /// Net stock currently held by a technician: everything issued to them
    /// minus everything returned, per item, positive balances only.
    pub async fn technician_inventory(&self, user_id: i64) -> Vec<TechnicianHolding> {
        let mut net: HashMap<i64, i32> = HashMap::new();
        for txn in self.inventory_transactions.all().await {
            if txn.user_id != Some(user_id) {
                continue;
            }
            match txn.kind {
                TransactionKind::Out => *net.entry(txn.inventory_item_id).or_insert(0) += txn.quantity,
                TransactionKind::Return => {
                    *net.entry(txn.inventory_item_id).or_insert(0) -= txn.quantity
                }
                TransactionKind::In | TransactionKind::Adjustment => {}
            }
        }

        let mut holdings = Vec::new();
        for (item_id, quantity) in net {
            if quantity <= 0 {
                continue;
            }
            if let Some(item) = self.inventory_items.get(item_id).await {
                holdings.push(TechnicianHolding {
                    inventory_item_id: item.id,
                    name: item.name,
                    sku: item.sku,
                    quantity,
                });
            }
        }
        holdings.sort_by(|a, b| a.name.cmp(&b.name));
        holdings
    }

    async fn completed_jobs_in(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<Job> {
        self.jobs
            .all()
            .await
            .into_iter()
            .filter(|j| j.status == JobStatus::Completed)
            .filter(|j| j.scheduled_start >= start && j.scheduled_start <= end)
            .collect()
    }
}
