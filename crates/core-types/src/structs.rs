use crate::enums::OrderStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named, ad hoc cost line inside a product template (e.g. "gift wrap").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomCost {
    pub name: String,
    pub amount: Decimal,
}

/// The per-product fixed cost definition, owned by a business account.
///
/// Templates are mutable: the product-management UI updates them over time.
/// Orders never read a template after creation; they read their own frozen
/// `TemplateSnapshot` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostTemplate {
    pub id: Uuid,
    pub owner: Uuid,
    pub product_name: String,
    /// The SKU. Unique per owner.
    pub product_key: String,
    pub base_cost: Decimal,
    pub marketing_cost: Decimal,
    pub salary_cost: Decimal,
    pub other_fixed_costs: Decimal,
    pub custom_costs: Vec<CustomCost>,
    pub created_at: DateTime<Utc>,
}

impl CostTemplate {
    /// The live template total. Snapshots precompute their own copy of this
    /// figure at order-creation time.
    pub fn template_total(&self) -> Decimal {
        let custom: Decimal = self.custom_costs.iter().map(|c| c.amount).sum();
        self.base_cost + self.marketing_cost + self.salary_cost + self.other_fixed_costs + custom
    }
}

/// An immutable copy of a `CostTemplate`'s cost fields, captured once at
/// order creation. Changing the source template later must not alter past
/// orders' reported profit, so this struct is never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateSnapshot {
    pub base_cost: Decimal,
    pub marketing_cost: Decimal,
    pub salary_cost: Decimal,
    pub other_fixed_costs: Decimal,
    pub custom_costs: Vec<CustomCost>,
    /// Precomputed at capture time: base + marketing + salary + other fixed
    /// + sum of custom cost amounts.
    pub total: Decimal,
}

impl TemplateSnapshot {
    /// A zeroed snapshot, used when no template matches at creation time.
    pub fn zero() -> Self {
        Self {
            base_cost: Decimal::ZERO,
            marketing_cost: Decimal::ZERO,
            salary_cost: Decimal::ZERO,
            other_fixed_costs: Decimal::ZERO,
            custom_costs: Vec::new(),
            total: Decimal::ZERO,
        }
    }
}

/// A single order record with its frozen cost snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub owner: Uuid,
    /// The business-facing order number.
    pub order_ref: String,
    pub product_key: String,
    pub product_name: String,
    pub selling_price: Decimal,
    pub status: OrderStatus,
    /// Frozen at creation. `None` on malformed legacy records; the profit
    /// calculator treats a missing snapshot as a zero template cost.
    pub template_snapshot: Option<TemplateSnapshot>,
    /// A flat per-unit cost carried by orders that predate snapshotting.
    pub legacy_unit_cost: Option<Decimal>,
    /// Only meaningful when `status` is `Returned`.
    pub return_charges: Decimal,
    /// Only meaningful when `status` is `Returned`.
    pub recovered_amount: Decimal,
    pub return_reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An ad hoc cost attached after order creation (e.g. a courier fee), or a
/// period-level cost with no order linkage ("global cost").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManualCost {
    pub id: Uuid,
    pub owner: Uuid,
    /// `Some` when the cost is scoped to a single order; `None` for global
    /// costs that only appear in period summaries.
    pub order_id: Option<Uuid>,
    pub kind: String,
    pub amount: Decimal,
    pub description: Option<String>,
    pub incurred_at: DateTime<Utc>,
}

/// A salaried employee. Salaries are treated as flat monthly overhead, not
/// prorated by join date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: Uuid,
    pub owner: Uuid,
    pub name: String,
    pub salary: Decimal,
    pub position: Option<String>,
    pub joined_at: DateTime<Utc>,
}

/// A recurring business expense, counted toward the overhead of the month
/// its `effective_date` falls in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub owner: Uuid,
    pub kind: String,
    pub amount: Decimal,
    pub effective_date: DateTime<Utc>,
}
