//! The typed data-access seam consumed by the ledger.
//!
//! Persistence is an external collaborator: the ledger talks to these
//! traits, and the `database` crate (or an in-memory fake in tests)
//! supplies the implementation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{CostTemplate, CustomCost, Employee, Expense, ManualCost, Order, OrderStatus};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

/// A storage backend failure. The ledger propagates these unmodified; no
/// retries happen at this layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

/// Filter for order reads. All fields optional; absent means unfiltered.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderFilter {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub status: Option<OrderStatus>,
    pub product_key: Option<String>,
}

/// The input for order creation, already normalized at the ingestion
/// boundary (canonical status, coerced numerics).
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub order_ref: String,
    pub product_key: Option<String>,
    pub product_name: Option<String>,
    pub selling_price: Decimal,
    pub status: OrderStatus,
    pub created_at: Option<DateTime<Utc>>,
}

/// A partial update. `None` leaves the stored field untouched. The
/// template snapshot is deliberately not patchable.
#[derive(Debug, Clone, Default)]
pub struct OrderPatch {
    pub order_ref: Option<String>,
    pub selling_price: Option<Decimal>,
    pub status: Option<OrderStatus>,
    pub return_charges: Option<Decimal>,
    pub recovered_amount: Option<Decimal>,
    pub return_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewManualCost {
    pub order_id: Option<Uuid>,
    pub kind: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub incurred_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub name: String,
    pub salary: Decimal,
    pub position: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewExpense {
    pub kind: String,
    pub amount: Decimal,
    pub effective_date: Option<DateTime<Utc>>,
}

/// The input for creating or updating a cost template. A draft carrying
/// an `id` targets that record; without one, the save upserts by
/// (owner, SKU) so that saving an existing SKU edits it instead of
/// duplicating it.
#[derive(Debug, Clone)]
pub struct TemplateDraft {
    pub id: Option<Uuid>,
    pub product_name: String,
    pub product_key: String,
    pub base_cost: Decimal,
    pub marketing_cost: Decimal,
    pub salary_cost: Decimal,
    pub other_fixed_costs: Decimal,
    pub custom_costs: Vec<CustomCost>,
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn find_orders(&self, owner: Uuid, filter: &OrderFilter)
        -> Result<Vec<Order>, StoreError>;

    /// Counts an owner's orders with `created_at` in `[start, end)`.
    async fn count_orders_in_range(
        &self,
        owner: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    async fn insert_order(&self, order: &Order) -> Result<(), StoreError>;

    /// `None` when no order matches (id, owner).
    async fn update_order(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: &OrderPatch,
    ) -> Result<Option<Order>, StoreError>;

    /// Removes the order and cascades deletion of its manual costs.
    /// `false` when no order matches (id, owner).
    async fn delete_order(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait TemplateStore: Send + Sync {
    async fn find_by_id(
        &self,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<CostTemplate>, StoreError>;

    async fn find_by_key(
        &self,
        owner: Uuid,
        product_key: &str,
    ) -> Result<Option<CostTemplate>, StoreError>;

    /// Case-insensitive exact match on the product name.
    async fn find_by_name_ci(
        &self,
        owner: Uuid,
        product_name: &str,
    ) -> Result<Option<CostTemplate>, StoreError>;

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<CostTemplate>, StoreError>;

    /// Inserts the template, or replaces the stored cost fields when a
    /// record with the same id already exists.
    async fn upsert_template(&self, template: &CostTemplate) -> Result<(), StoreError>;

    /// `false` when no template matches (id, owner).
    async fn delete_template(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait OverheadStore: Send + Sync {
    async fn list_employees(&self, owner: Uuid) -> Result<Vec<Employee>, StoreError>;
    async fn insert_employee(&self, employee: &Employee) -> Result<(), StoreError>;
    async fn delete_employee(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError>;

    /// Expenses with `effective_date` in `[start, end)`.
    async fn list_expenses_in_range(
        &self,
        owner: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Expense>, StoreError>;
    async fn list_expenses(&self, owner: Uuid) -> Result<Vec<Expense>, StoreError>;
    async fn insert_expense(&self, expense: &Expense) -> Result<(), StoreError>;
    async fn delete_expense(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError>;
}

#[async_trait]
pub trait ManualCostStore: Send + Sync {
    async fn list_by_order(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<ManualCost>, StoreError>;

    /// All order-linked costs for the given orders, in one read.
    async fn list_for_orders(
        &self,
        owner: Uuid,
        order_ids: &[Uuid],
    ) -> Result<Vec<ManualCost>, StoreError>;

    /// Costs with no order linkage ("global costs"), filtered by
    /// `incurred_at` when bounds are given.
    async fn list_global_in_range(
        &self,
        owner: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<ManualCost>, StoreError>;

    async fn insert_manual_cost(&self, cost: &ManualCost) -> Result<(), StoreError>;
    async fn delete_manual_cost(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError>;
}
