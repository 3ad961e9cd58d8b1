//! Admin-managed catalog of detailing services.

use serde::{Deserialize, Serialize};

use crate::store::MemStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_minutes: i32,
    pub active: bool,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateService {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub duration_minutes: i32,
    pub active: Option<bool>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub duration_minutes: Option<i32>,
    pub active: Option<bool>,
    pub color: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceFilters {
    pub active: Option<bool>,
}

impl MemStore {
    pub async fn create_service(&self, data: CreateService) -> Service {
        self.services
            .insert(|id| Service {
                id,
                name: data.name.clone(),
                description: data.description.clone(),
                price: data.price,
                duration_minutes: data.duration_minutes,
                active: data.active.unwrap_or(true),
                color: data.color.clone(),
            })
            .await
    }

    pub async fn get_service(&self, id: i64) -> Option<Service> {
        self.services.get(id).await
    }

    pub async fn update_service(&self, id: i64, update: ServiceUpdate) -> Option<Service> {
        self.services
            .modify(id, |service| {
                if let Some(name) = update.name {
                    service.name = name;
                }
                if let Some(description) = update.description {
                    service.description = Some(description);
                }
                if let Some(price) = update.price {
                    service.price = price;
                }
                if let Some(duration_minutes) = update.duration_minutes {
                    service.duration_minutes = duration_minutes;
                }
                if let Some(active) = update.active {
                    service.active = active;
                }
                if let Some(color) = update.color {
                    service.color = Some(color);
                }
            })
            .await
    }

    pub async fn delete_service(&self, id: i64) -> bool {
        self.services.remove(id).await
    }

    pub async fn list_services(&self, filters: ServiceFilters) -> Vec<Service> {
        self.services
            .all()
            .await
            .into_iter()
            .filter(|s| filters.active.is_none_or(|active| s.active == active))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wash(price: f64) -> CreateService {
        CreateService {
            name: "Exterior Wash".to_string(),
            description: None,
            price,
            duration_minutes: 45,
            active: None,
            color: None,
        }
    }

    #[tokio::test]
    async fn test_active_defaults_true_and_filter_applies() {
        let store = MemStore::default();
        let s = store.create_service(wash(59.0)).await;
        assert!(s.active);

        store
            .update_service(s.id, ServiceUpdate { active: Some(false), ..Default::default() })
            .await
            .unwrap();

        let active = store.list_services(ServiceFilters { active: Some(true) }).await;
        assert!(active.is_empty());
        let all = store.list_services(ServiceFilters::default()).await;
        assert_eq!(all.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_returns_false_for_missing() {
        let store = MemStore::default();
        let s = store.create_service(wash(59.0)).await;
        assert!(store.delete_service(s.id).await);
        assert!(!store.delete_service(s.id).await);
    }
}
