//! Membership plans and customer subscriptions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::NewActivity;
use crate::store::{MemStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Annual,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipPlan {
    pub id: i64,
    pub name: String,
    pub monthly_price: f64,
    pub annual_price: f64,
    pub features: Vec<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembershipPlan {
    pub name: String,
    pub monthly_price: f64,
    pub annual_price: f64,
    pub features: Option<Vec<String>>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MembershipPlanUpdate {
    pub name: Option<String>,
    pub monthly_price: Option<f64>,
    pub annual_price: Option<f64>,
    pub features: Option<Vec<String>>,
    pub active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerSubscription {
    pub id: i64,
    pub customer_id: i64,
    pub plan_id: i64,
    pub status: SubscriptionStatus,
    pub billing_cycle: BillingCycle,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscription {
    pub customer_id: i64,
    pub plan_id: i64,
    pub billing_cycle: BillingCycle,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionFilters {
    pub customer_id: Option<i64>,
    pub status: Option<SubscriptionStatus>,
}

impl MemStore {
    pub async fn create_membership_plan(&self, data: CreateMembershipPlan) -> MembershipPlan {
        self.membership_plans
            .insert(|id| MembershipPlan {
                id,
                name: data.name.clone(),
                monthly_price: data.monthly_price,
                annual_price: data.annual_price,
                features: data.features.clone().unwrap_or_default(),
                active: data.active.unwrap_or(true),
            })
            .await
    }

    pub async fn get_membership_plan(&self, id: i64) -> Option<MembershipPlan> {
        self.membership_plans.get(id).await
    }

    pub async fn update_membership_plan(
        &self,
        id: i64,
        update: MembershipPlanUpdate,
    ) -> Option<MembershipPlan> {
        self.membership_plans
            .modify(id, |plan| {
                if let Some(name) = update.name {
                    plan.name = name;
                }
                if let Some(monthly_price) = update.monthly_price {
                    plan.monthly_price = monthly_price;
                }
                if let Some(annual_price) = update.annual_price {
                    plan.annual_price = annual_price;
                }
                if let Some(features) = update.features {
                    plan.features = features;
                }
                if let Some(active) = update.active {
                    plan.active = active;
                }
            })
            .await
    }

    /// Refused while any subscription still references the plan.
    pub async fn delete_membership_plan(&self, id: i64) -> bool {
        let referenced = self
            .subscriptions
            .all()
            .await
            .iter()
            .any(|s| s.plan_id == id);
        if referenced {
            return false;
        }
        self.membership_plans.remove(id).await
    }

    pub async fn list_membership_plans(&self, active: Option<bool>) -> Vec<MembershipPlan> {
        self.membership_plans
            .all()
            .await
            .into_iter()
            .filter(|p| active.is_none_or(|a| p.active == a))
            .collect()
    }

    /// Creates an active subscription, cancelling any prior active one for
    /// the customer first so at most one is active at a time.
    pub async fn create_subscription(
        &self,
        data: CreateSubscription,
    ) -> Result<CustomerSubscription, StoreError> {
        let customer = self
            .customers
            .get(data.customer_id)
            .await
            .ok_or(StoreError::MissingRef { entity: "customer", id: data.customer_id })?;
        let plan = self
            .membership_plans
            .get(data.plan_id)
            .await
            .ok_or(StoreError::MissingRef { entity: "membership plan", id: data.plan_id })?;

        let prior_active: Vec<i64> = self
            .subscriptions
            .all()
            .await
            .into_iter()
            .filter(|s| s.customer_id == customer.id && s.status == SubscriptionStatus::Active)
            .map(|s| s.id)
            .collect();
        for id in prior_active {
            self.cancel_subscription(id).await;
        }

        let subscription = self
            .subscriptions
            .insert(|id| CustomerSubscription {
                id,
                customer_id: customer.id,
                plan_id: plan.id,
                status: SubscriptionStatus::Active,
                billing_cycle: data.billing_cycle,
                stripe_customer_id: data.stripe_customer_id.clone(),
                stripe_subscription_id: data.stripe_subscription_id.clone(),
                created_at: Utc::now(),
                canceled_at: None,
            })
            .await;

        self.record_activity(
            NewActivity::new(
                "subscription_created",
                format!("{} subscribed to {}", customer.full_name, plan.name),
            )
            .customer(customer.id),
        )
        .await;

        Ok(subscription)
    }

    /// Soft state change; already-canceled subscriptions are returned as-is.
    pub async fn cancel_subscription(&self, id: i64) -> Option<CustomerSubscription> {
        let existing = self.subscriptions.get(id).await?;
        if existing.status == SubscriptionStatus::Canceled {
            return Some(existing);
        }

        let canceled = self
            .subscriptions
            .modify(id, |s| {
                s.status = SubscriptionStatus::Canceled;
                s.canceled_at = Some(Utc::now());
            })
            .await?;

        self.record_activity(
            NewActivity::new(
                "subscription_canceled",
                format!("Subscription #{} canceled", canceled.id),
            )
            .customer(canceled.customer_id),
        )
        .await;

        Some(canceled)
    }

    pub async fn get_subscription(&self, id: i64) -> Option<CustomerSubscription> {
        self.subscriptions.get(id).await
    }

    pub async fn active_subscription(&self, customer_id: i64) -> Option<CustomerSubscription> {
        self.subscriptions
            .all()
            .await
            .into_iter()
            .find(|s| s.customer_id == customer_id && s.status == SubscriptionStatus::Active)
    }

    pub async fn list_subscriptions(
        &self,
        filters: SubscriptionFilters,
    ) -> Vec<CustomerSubscription> {
        self.subscriptions
            .all()
            .await
            .into_iter()
            .filter(|s| filters.customer_id.is_none_or(|id| s.customer_id == id))
            .filter(|s| filters.status.is_none_or(|status| s.status == status))
            .collect()
    }
}
