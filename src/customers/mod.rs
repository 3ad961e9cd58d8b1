use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::NewActivity;
use crate::store::MemStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub tags: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub full_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerFilters {
    pub search: Option<String>,
    pub tag: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerPage {
    pub customers: Vec<Customer>,
    pub total_count: u64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: i64,
    pub customer_id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub vin: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVehicle {
    pub customer_id: i64,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub vin: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VehicleUpdate {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub color: Option<String>,
    pub license_plate: Option<String>,
    pub vin: Option<String>,
}

impl MemStore {
    pub async fn create_customer(&self, data: CreateCustomer) -> Customer {
        let customer = self
            .customers
            .insert(|id| Customer {
                id,
                full_name: data.full_name.clone(),
                email: data.email.clone(),
                phone: data.phone.clone(),
                address: data.address.clone(),
                city: data.city.clone(),
                state: data.state.clone(),
                zip: data.zip.clone(),
                tags: data.tags.clone().unwrap_or_default(),
                notes: data.notes.clone(),
                created_at: Utc::now(),
            })
            .await;

        self.record_activity(
            NewActivity::new(
                "customer_created",
                format!("New customer added: {}", customer.full_name),
            )
            .customer(customer.id),
        )
        .await;

        customer
    }

    pub async fn get_customer(&self, id: i64) -> Option<Customer> {
        self.customers.get(id).await
    }

    pub async fn update_customer(&self, id: i64, update: CustomerUpdate) -> Option<Customer> {
        self.customers
            .modify(id, |customer| {
                if let Some(full_name) = update.full_name {
                    customer.full_name = full_name;
                }
                if let Some(email) = update.email {
                    customer.email = Some(email);
                }
                if let Some(phone) = update.phone {
                    customer.phone = Some(phone);
                }
                if let Some(address) = update.address {
                    customer.address = Some(address);
                }
                if let Some(city) = update.city {
                    customer.city = Some(city);
                }
                if let Some(state) = update.state {
                    customer.state = Some(state);
                }
                if let Some(zip) = update.zip {
                    customer.zip = Some(zip);
                }
                if let Some(tags) = update.tags {
                    customer.tags = tags;
                }
                if let Some(notes) = update.notes {
                    customer.notes = Some(notes);
                }
            })
            .await
    }

    /// Customer deletion does not cascade; vehicles, jobs, and reviews keep
    /// their customer_id and become dangling references.
    pub async fn delete_customer(&self, id: i64) -> bool {
        self.customers.remove(id).await
    }

    /// The only paginated listing in the store.
    pub async fn list_customers(&self, filters: CustomerFilters) -> CustomerPage {
        let needle = filters.search.as_deref().map(str::to_lowercase);
        let matching: Vec<Customer> = self
            .customers
            .all()
            .await
            .into_iter()
            .filter(|c| filters.tag.as_ref().is_none_or(|t| c.tags.contains(t)))
            .filter(|c| {
                needle.as_deref().is_none_or(|needle| {
                    c.full_name.to_lowercase().contains(needle)
                        || c.email
                            .as_deref()
                            .is_some_and(|e| e.to_lowercase().contains(needle))
                })
            })
            .collect();

        let total_count = matching.len() as u64;
        let per_page = filters.page_size.unwrap_or(self.config.page_size).max(1);
        let page = filters.page.unwrap_or(1).max(1);
        let total_pages = (total_count as u32).div_ceil(per_page);

        let start = ((page - 1) * per_page) as usize;
        let customers = matching
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        CustomerPage {
            customers,
            total_count,
            page,
            per_page,
            total_pages,
        }
    }

    pub async fn create_vehicle(&self, data: CreateVehicle) -> Vehicle {
        self.vehicles
            .insert(|id| Vehicle {
                id,
                customer_id: data.customer_id,
                make: data.make.clone(),
                model: data.model.clone(),
                year: data.year,
                color: data.color.clone(),
                license_plate: data.license_plate.clone(),
                vin: data.vin.clone(),
            })
            .await
    }

    pub async fn get_vehicle(&self, id: i64) -> Option<Vehicle> {
        self.vehicles.get(id).await
    }

    pub async fn update_vehicle(&self, id: i64, update: VehicleUpdate) -> Option<Vehicle> {
        self.vehicles
            .modify(id, |vehicle| {
                if let Some(make) = update.make {
                    vehicle.make = make;
                }
                if let Some(model) = update.model {
                    vehicle.model = model;
                }
                if let Some(year) = update.year {
                    vehicle.year = year;
                }
                if let Some(color) = update.color {
                    vehicle.color = Some(color);
                }
                if let Some(license_plate) = update.license_plate {
                    vehicle.license_plate = Some(license_plate);
                }
                if let Some(vin) = update.vin {
                    vehicle.vin = Some(vin);
                }
            })
            .await
    }

    pub async fn delete_vehicle(&self, id: i64) -> bool {
        self.vehicles.remove(id).await
    }

    pub async fn list_vehicles(&self, customer_id: Option<i64>) -> Vec<Vehicle> {
        self.vehicles
            .all()
            .await
            .into_iter()
            .filter(|v| customer_id.is_none_or(|id| v.customer_id == id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_util;

    fn customer(name: &str, tags: &[&str]) -> CreateCustomer {
        CreateCustomer {
            full_name: name.to_string(),
            email: Some(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
            phone: None,
            address: None,
            city: None,
            state: None,
            zip: None,
            tags: Some(tags.iter().map(|t| t.to_string()).collect()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_create_stamps_id_and_created_at() {
        test_util::setup();
        let store = MemStore::default();
        let before = Utc::now();
        let created = store.create_customer(customer("Dana Fox", &[])).await;
        assert_eq!(created.id, 1);
        assert!(created.created_at >= before);

        let feed = store.recent_activities(5).await;
        assert_eq!(feed[0].kind, "customer_created");
        assert_eq!(feed[0].customer_id, Some(created.id));
    }

    #[tokio::test]
    async fn test_pagination_envelope() {
        let store = MemStore::default();
        for n in 0..7 {
            store.create_customer(customer(&format!("Customer {n}"), &[])).await;
        }

        let page = store
            .list_customers(CustomerFilters {
                page: Some(2),
                page_size: Some(3),
                ..Default::default()
            })
            .await;
        assert_eq!(page.total_count, 7);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.customers.len(), 3);
        assert_eq!(page.customers[0].full_name, "Customer 3");

        let past_end = store
            .list_customers(CustomerFilters {
                page: Some(9),
                page_size: Some(3),
                ..Default::default()
            })
            .await;
        assert!(past_end.customers.is_empty());
        assert_eq!(past_end.total_count, 7);
    }

    #[tokio::test]
    async fn test_filters_by_tag_and_search() {
        let store = MemStore::default();
        store.create_customer(customer("Dana Fox", &["vip"])).await;
        store.create_customer(customer("Sam Hill", &[])).await;

        let vips = store
            .list_customers(CustomerFilters {
                tag: Some("vip".into()),
                ..Default::default()
            })
            .await;
        assert_eq!(vips.customers.len(), 1);
        assert_eq!(vips.customers[0].full_name, "Dana Fox");

        let by_email = store
            .list_customers(CustomerFilters {
                search: Some("sam.hill@".into()),
                ..Default::default()
            })
            .await;
        assert_eq!(by_email.customers.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_customer_leaves_vehicles_behind() {
        let store = MemStore::default();
        let c = store.create_customer(customer("Dana Fox", &[])).await;
        let v = store
            .create_vehicle(CreateVehicle {
                customer_id: c.id,
                make: "Honda".into(),
                model: "Civic".into(),
                year: 2021,
                color: None,
                license_plate: None,
                vin: None,
            })
            .await;

        assert!(store.delete_customer(c.id).await);
        assert!(!store.delete_customer(c.id).await);
        assert_eq!(store.get_vehicle(v.id).await.map(|v| v.customer_id), Some(c.id));
    }

    #[tokio::test]
    async fn test_vehicle_list_filters_by_owner() {
        let store = MemStore::default();
        let a = store.create_customer(customer("A", &[])).await;
        let b = store.create_customer(customer("B", &[])).await;
        for (owner, model) in [(a.id, "Civic"), (b.id, "Tacoma"), (a.id, "Model 3")] {
            store
                .create_vehicle(CreateVehicle {
                    customer_id: owner,
                    make: "x".into(),
                    model: model.into(),
                    year: 2020,
                    color: None,
                    license_plate: None,
                    vin: None,
                })
                .await;
        }

        let of_a = store.list_vehicles(Some(a.id)).await;
        assert_eq!(of_a.len(), 2);
        assert!(of_a.iter().all(|v| v.customer_id == a.id));
        assert_eq!(store.list_vehicles(None).await.len(), 3);
    }
}
