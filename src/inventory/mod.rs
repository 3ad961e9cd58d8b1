//! Inventory items and the append-only stock ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::activity::NewActivity;
use crate::store::{MemStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    In,
    Out,
    Return,
    Adjustment,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
            Self::Return => "return",
            Self::Adjustment => "adjustment",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub unit_price: f64,
    pub cost_price: f64,
    pub quantity_in_stock: i32,
    pub min_stock_level: i32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInventoryItem {
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub unit_price: f64,
    pub cost_price: f64,
    pub quantity_in_stock: Option<i32>,
    pub min_stock_level: Option<i32>,
}

/// Stock quantity is deliberately absent: it moves only through transactions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryItemUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub unit_price: Option<f64>,
    pub cost_price: Option<f64>,
    pub min_stock_level: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryItemFilters {
    pub category: Option<String>,
    pub active: Option<bool>,
}

/// Immutable ledger entry. `in` and `return` add to stock, `out` subtracts,
/// `adjustment` overwrites the count with `quantity` verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryTransaction {
    pub id: i64,
    pub inventory_item_id: i64,
    pub quantity: i32,
    pub kind: TransactionKind,
    pub user_id: Option<i64>,
    pub job_id: Option<i64>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInventoryTransaction {
    pub inventory_item_id: i64,
    pub quantity: i32,
    pub kind: TransactionKind,
    pub user_id: Option<i64>,
    pub job_id: Option<i64>,
    pub date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionFilters {
    pub inventory_item_id: Option<i64>,
    pub user_id: Option<i64>,
    pub job_id: Option<i64>,
    pub kind: Option<TransactionKind>,
}

/// Next stock count for a transaction, or `None` when an `out` would drive
/// the count negative.
pub(crate) fn apply_stock(kind: TransactionKind, current: i32, quantity: i32) -> Option<i32> {
    match kind {
        TransactionKind::In | TransactionKind::Return => Some(current + quantity),
        TransactionKind::Out => (quantity <= current).then(|| current - quantity),
        TransactionKind::Adjustment => Some(quantity),
    }
}

pub(crate) fn describe_transaction(
    kind: TransactionKind,
    quantity: i32,
    item: &str,
    user: Option<&str>,
) -> String {
    let base = match kind {
        TransactionKind::In => format!("Received {quantity} x {item}"),
        TransactionKind::Out => format!("Issued {quantity} x {item}"),
        TransactionKind::Return => format!("Returned {quantity} x {item}"),
        TransactionKind::Adjustment => format!("Stock for {item} adjusted to {quantity}"),
    };
    match user {
        Some(name) => format!("{base} ({name})"),
        None => base,
    }
}

impl MemStore {
    pub async fn create_inventory_item(&self, data: CreateInventoryItem) -> InventoryItem {
        let item = self
            .inventory_items
            .insert(|id| InventoryItem {
                id,
                name: data.name.clone(),
                sku: data.sku.clone(),
                category: data.category.clone(),
                unit_price: data.unit_price,
                cost_price: data.cost_price,
                quantity_in_stock: data.quantity_in_stock.unwrap_or(0),
                min_stock_level: data.min_stock_level.unwrap_or(0),
                is_active: true,
            })
            .await;
        log::info!("created inventory item {} ({})", item.name, item.sku);
        item
    }

    pub async fn get_inventory_item(&self, id: i64) -> Option<InventoryItem> {
        self.inventory_items.get(id).await
    }

    pub async fn get_inventory_item_by_sku(&self, sku: &str) -> Option<InventoryItem> {
        self.inventory_items
            .all()
            .await
            .into_iter()
            .find(|item| item.sku == sku)
    }

    pub async fn update_inventory_item(
        &self,
        id: i64,
        update: InventoryItemUpdate,
    ) -> Option<InventoryItem> {
        self.inventory_items
            .modify(id, |item| {
                if let Some(name) = update.name {
                    item.name = name;
                }
                if let Some(category) = update.category {
                    item.category = Some(category);
                }
                if let Some(unit_price) = update.unit_price {
                    item.unit_price = unit_price;
                }
                if let Some(cost_price) = update.cost_price {
                    item.cost_price = cost_price;
                }
                if let Some(min_stock_level) = update.min_stock_level {
                    item.min_stock_level = min_stock_level;
                }
                if let Some(is_active) = update.is_active {
                    item.is_active = is_active;
                }
            })
            .await
    }

    /// Hard-deletes only when the item has no ledger history; otherwise the
    /// item is deactivated so the ledger keeps a valid reference.
    pub async fn delete_inventory_item(&self, id: i64) -> bool {
        if self.inventory_items.get(id).await.is_none() {
            return false;
        }
        let has_history = self
            .inventory_transactions
            .all()
            .await
            .iter()
            .any(|t| t.inventory_item_id == id);
        if has_history {
            self.inventory_items
                .modify(id, |item| item.is_active = false)
                .await;
            true
        } else {
            self.inventory_items.remove(id).await
        }
    }

    pub async fn list_inventory_items(&self, filters: InventoryItemFilters) -> Vec<InventoryItem> {
        self.inventory_items
            .all()
            .await
            .into_iter()
            .filter(|i| filters.category.as_ref().is_none_or(|c| i.category.as_ref() == Some(c)))
            .filter(|i| filters.active.is_none_or(|active| i.is_active == active))
            .collect()
    }

    pub async fn low_stock_items(&self) -> Vec<InventoryItem> {
        self.inventory_items
            .all()
            .await
            .into_iter()
            .filter(|i| i.is_active && i.quantity_in_stock <= i.min_stock_level)
            .collect()
    }

    pub async fn record_inventory_transaction(
        &self,
        data: CreateInventoryTransaction,
    ) -> Result<InventoryTransaction, StoreError> {
        let item = self
            .inventory_items
            .get(data.inventory_item_id)
            .await
            .ok_or(StoreError::MissingRef {
                entity: "inventory item",
                id: data.inventory_item_id,
            })?;

        // Reject before any write so a refused `out` leaves both the item
        // and the ledger untouched.
        let new_stock = apply_stock(data.kind, item.quantity_in_stock, data.quantity).ok_or(
            StoreError::InsufficientStock {
                item: item.name.clone(),
                requested: data.quantity,
                available: item.quantity_in_stock,
            },
        )?;

        self.inventory_items
            .modify(item.id, |item| item.quantity_in_stock = new_stock)
            .await;

        let transaction = self
            .inventory_transactions
            .insert(|id| InventoryTransaction {
                id,
                inventory_item_id: item.id,
                quantity: data.quantity,
                kind: data.kind,
                user_id: data.user_id,
                job_id: data.job_id,
                date: data.date.unwrap_or_else(Utc::now),
            })
            .await;

        let technician = match data.user_id {
            Some(user_id) => self.users.get(user_id).await.map(|u| u.full_name),
            None => None,
        };
        let mut entry = NewActivity::new(
            "inventory_transaction",
            describe_transaction(data.kind, data.quantity, &item.name, technician.as_deref()),
        )
        .metadata(serde_json::json!({
            "inventory_item_id": item.id,
            "kind": data.kind.as_str(),
            "quantity": data.quantity,
        }));
        if let Some(job_id) = data.job_id {
            entry = entry.job(job_id);
        }
        self.record_activity(entry).await;

        Ok(transaction)
    }

    /// Ledger view, most recent first.
    pub async fn list_inventory_transactions(
        &self,
        filters: TransactionFilters,
    ) -> Vec<InventoryTransaction> {
        let mut rows: Vec<InventoryTransaction> = self
            .inventory_transactions
            .all()
            .await
            .into_iter()
            .filter(|t| filters.inventory_item_id.is_none_or(|id| t.inventory_item_id == id))
            .filter(|t| filters.user_id.is_none_or(|id| t.user_id == Some(id)))
            .filter(|t| filters.job_id.is_none_or(|id| t.job_id == Some(id)))
            .filter(|t| filters.kind.is_none_or(|k| t.kind == k))
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));
        rows
    }
}
