//! The order ledger service: creation-time snapshotting, batched overhead
//! allocation, and profit annotation.

use crate::error::LedgerError;
use crate::stores::{
    ManualCostStore, NewEmployee, NewExpense, NewManualCost, OrderDraft, OrderFilter,
    OrderPatch, OrderStore, OverheadStore, TemplateDraft, TemplateStore,
};
use chrono::{Datelike, Utc};
use core_types::{CostTemplate, Employee, Expense, ManualCost, Order, TemplateSnapshot};
use costing::{
    capture_snapshot, compute_profit, month_bounds, overhead_per_order, resolve_cost_basis,
    CostedOrder,
};
use futures::future::try_join_all;
use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

/// The orchestration service over a set of store implementations.
///
/// Generic over the store bundle so production runs against Postgres and
/// tests run against in-memory fakes.
#[derive(Debug, Clone)]
pub struct OrderLedger<S> {
    stores: S,
}

impl<S> OrderLedger<S>
where
    S: OrderStore + TemplateStore + OverheadStore + ManualCostStore,
{
    pub fn new(stores: S) -> Self {
        Self { stores }
    }

    pub fn stores(&self) -> &S {
        &self.stores
    }

    /// Creates an order, resolving and freezing its template snapshot.
    ///
    /// Lookup order for the template: exact SKU match, else
    /// case-insensitive exact product-name match, else a zero snapshot.
    /// The snapshot is computed here, once, and never recomputed later.
    pub async fn create_order(
        &self,
        owner: Uuid,
        draft: OrderDraft,
    ) -> Result<Order, LedgerError> {
        if draft.order_ref.trim().is_empty() {
            return Err(LedgerError::Validation("order_ref is required".into()));
        }
        let key = draft.product_key.as_deref().filter(|k| !k.trim().is_empty());
        let name = draft.product_name.as_deref().filter(|n| !n.trim().is_empty());
        if key.is_none() && name.is_none() {
            return Err(LedgerError::Validation(
                "a product key or product name is required".into(),
            ));
        }

        let mut template = None;
        if let Some(k) = key {
            template = self.stores.find_by_key(owner, k).await?;
        }
        if template.is_none() {
            if let Some(n) = name {
                template = self.stores.find_by_name_ci(owner, n).await?;
            }
        }

        let snapshot = template
            .as_ref()
            .map(capture_snapshot)
            .unwrap_or_else(TemplateSnapshot::zero);

        let order = Order {
            id: Uuid::new_v4(),
            owner,
            order_ref: draft.order_ref.trim().to_string(),
            product_key: key
                .map(str::to_string)
                .or_else(|| template.as_ref().map(|t| t.product_key.clone()))
                .unwrap_or_else(|| "N/A".to_string()),
            product_name: name
                .map(str::to_string)
                .or_else(|| template.as_ref().map(|t| t.product_name.clone()))
                .unwrap_or_default(),
            selling_price: draft.selling_price,
            status: draft.status,
            template_snapshot: Some(snapshot),
            legacy_unit_cost: None,
            return_charges: Decimal::ZERO,
            recovered_amount: Decimal::ZERO,
            return_reason: None,
            created_at: draft.created_at.unwrap_or_else(Utc::now),
        };

        self.stores.insert_order(&order).await?;
        tracing::info!(order_id = %order.id, order_ref = %order.order_ref, "order created");
        Ok(order)
    }

    /// The overhead allocator: converts (owner, month) into the overhead
    /// figure each of that month's orders absorbs. Pure read, no side
    /// effects; exactly zero when the month has no orders.
    pub async fn allocate_overhead(
        &self,
        owner: Uuid,
        year: i32,
        month: u32,
    ) -> Result<Decimal, LedgerError> {
        let (start, end) = month_bounds(year, month)
            .ok_or_else(|| LedgerError::Validation(format!("invalid month: {year}-{month}")))?;

        // The three inputs are independent reads.
        let (count, employees, expenses) = tokio::join!(
            self.stores.count_orders_in_range(owner, start, end),
            self.stores.list_employees(owner),
            self.stores.list_expenses_in_range(owner, start, end),
        );

        Ok(overhead_per_order(count?, &employees?, &expenses?))
    }

    /// Fetches orders and annotates every one with its profit breakdown.
    ///
    /// Overhead is computed once per distinct (owner, month) pair in the
    /// batch; a month's figure is never applied to another month's orders.
    pub async fn orders_with_profit(
        &self,
        owner: Uuid,
        filter: &OrderFilter,
    ) -> Result<Vec<CostedOrder>, LedgerError> {
        let orders = self.stores.find_orders(owner, filter).await?;
        let ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let manual_costs = self.stores.list_for_orders(owner, &ids).await?;

        let mut manual_totals: HashMap<Uuid, Decimal> = HashMap::new();
        for cost in &manual_costs {
            if let Some(order_id) = cost.order_id {
                *manual_totals.entry(order_id).or_insert(Decimal::ZERO) += cost.amount;
            }
        }

        // One overhead figure per distinct month in the batch.
        let mut months: Vec<(i32, u32)> = orders
            .iter()
            .map(|o| (o.created_at.year(), o.created_at.month()))
            .collect();
        months.sort_unstable();
        months.dedup();

        let overheads: HashMap<(i32, u32), Decimal> =
            try_join_all(months.into_iter().map(|(year, month)| async move {
                let figure = self.allocate_overhead(owner, year, month).await?;
                Ok::<_, LedgerError>(((year, month), figure))
            }))
            .await?
            .into_iter()
            .collect();

        let costed = orders
            .into_iter()
            .map(|order| {
                let overhead = overheads
                    .get(&(order.created_at.year(), order.created_at.month()))
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                let manual_total = manual_totals
                    .get(&order.id)
                    .copied()
                    .unwrap_or(Decimal::ZERO);
                let (basis, template_total) = resolve_cost_basis(&order, None);
                tracing::debug!(order_id = %order.id, ?basis, "resolved cost basis");
                let breakdown = compute_profit(&order, template_total, manual_total, overhead);
                CostedOrder { order, manual_total, breakdown }
            })
            .collect();

        Ok(costed)
    }

    /// Applies a normalized patch. The template snapshot is not patchable.
    pub async fn update_order(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: OrderPatch,
    ) -> Result<Order, LedgerError> {
        self.stores
            .update_order(id, owner, &patch)
            .await?
            .ok_or(LedgerError::NotFound("order"))
    }

    /// Deletes the order and its manual costs.
    pub async fn delete_order(&self, id: Uuid, owner: Uuid) -> Result<(), LedgerError> {
        if self.stores.delete_order(id, owner).await? {
            Ok(())
        } else {
            Err(LedgerError::NotFound("order"))
        }
    }

    /// Creates or updates a cost template. A draft carrying an id targets
    /// that record; otherwise the save upserts by (owner, SKU). Orders
    /// created before the save keep their frozen snapshot either way.
    pub async fn save_template(
        &self,
        owner: Uuid,
        draft: TemplateDraft,
    ) -> Result<CostTemplate, LedgerError> {
        if draft.product_name.trim().is_empty() {
            return Err(LedgerError::Validation("product name is required".into()));
        }
        if draft.product_key.trim().is_empty() {
            return Err(LedgerError::Validation("a product key (SKU) is required".into()));
        }

        let existing = match draft.id {
            Some(id) => Some(
                self.stores
                    .find_by_id(id, owner)
                    .await?
                    .ok_or(LedgerError::NotFound("product template"))?,
            ),
            None => self.stores.find_by_key(owner, draft.product_key.trim()).await?,
        };

        let template = CostTemplate {
            id: existing.as_ref().map(|t| t.id).unwrap_or_else(Uuid::new_v4),
            owner,
            product_name: draft.product_name.trim().to_string(),
            product_key: draft.product_key.trim().to_string(),
            base_cost: draft.base_cost,
            marketing_cost: draft.marketing_cost,
            salary_cost: draft.salary_cost,
            other_fixed_costs: draft.other_fixed_costs,
            custom_costs: draft.custom_costs,
            created_at: existing.map(|t| t.created_at).unwrap_or_else(Utc::now),
        };

        self.stores.upsert_template(&template).await?;
        tracing::info!(template_id = %template.id, sku = %template.product_key, "template saved");
        Ok(template)
    }

    pub async fn list_templates(&self, owner: Uuid) -> Result<Vec<CostTemplate>, LedgerError> {
        Ok(self.stores.list_by_owner(owner).await?)
    }

    /// The overhead figure each of the current month's orders is absorbing
    /// so far, shown alongside templates for price setting.
    pub async fn projected_overhead(&self, owner: Uuid) -> Result<Decimal, LedgerError> {
        let now = Utc::now();
        self.allocate_overhead(owner, now.year(), now.month()).await
    }

    pub async fn remove_template(&self, id: Uuid, owner: Uuid) -> Result<(), LedgerError> {
        if self.stores.delete_template(id, owner).await? {
            Ok(())
        } else {
            Err(LedgerError::NotFound("product template"))
        }
    }

    pub async fn add_manual_cost(
        &self,
        owner: Uuid,
        new: NewManualCost,
    ) -> Result<ManualCost, LedgerError> {
        if new.kind.trim().is_empty() {
            return Err(LedgerError::Validation("cost kind is required".into()));
        }
        let cost = ManualCost {
            id: Uuid::new_v4(),
            owner,
            order_id: new.order_id,
            kind: new.kind.trim().to_string(),
            amount: new.amount,
            description: new.description,
            incurred_at: new.incurred_at.unwrap_or_else(Utc::now),
        };
        self.stores.insert_manual_cost(&cost).await?;
        Ok(cost)
    }

    pub async fn manual_costs_for_order(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<ManualCost>, LedgerError> {
        Ok(self.stores.list_by_order(owner, order_id).await?)
    }

    pub async fn remove_manual_cost(&self, id: Uuid, owner: Uuid) -> Result<(), LedgerError> {
        if self.stores.delete_manual_cost(id, owner).await? {
            Ok(())
        } else {
            Err(LedgerError::NotFound("manual cost"))
        }
    }

    /// Global costs for a period: manual costs carrying no order linkage.
    pub async fn global_costs(
        &self,
        owner: Uuid,
        from: Option<chrono::DateTime<Utc>>,
        to: Option<chrono::DateTime<Utc>>,
    ) -> Result<Vec<ManualCost>, LedgerError> {
        Ok(self.stores.list_global_in_range(owner, from, to).await?)
    }

    pub async fn global_costs_total(
        &self,
        owner: Uuid,
        from: Option<chrono::DateTime<Utc>>,
        to: Option<chrono::DateTime<Utc>>,
    ) -> Result<Decimal, LedgerError> {
        let costs = self.global_costs(owner, from, to).await?;
        Ok(costs.iter().map(|c| c.amount).sum())
    }

    pub async fn list_employees(&self, owner: Uuid) -> Result<Vec<Employee>, LedgerError> {
        Ok(self.stores.list_employees(owner).await?)
    }

    pub async fn add_employee(
        &self,
        owner: Uuid,
        new: NewEmployee,
    ) -> Result<Employee, LedgerError> {
        if new.name.trim().is_empty() {
            return Err(LedgerError::Validation("employee name is required".into()));
        }
        let employee = Employee {
            id: Uuid::new_v4(),
            owner,
            name: new.name.trim().to_string(),
            salary: new.salary,
            position: new.position,
            joined_at: Utc::now(),
        };
        self.stores.insert_employee(&employee).await?;
        Ok(employee)
    }

    pub async fn remove_employee(&self, id: Uuid, owner: Uuid) -> Result<(), LedgerError> {
        if self.stores.delete_employee(id, owner).await? {
            Ok(())
        } else {
            Err(LedgerError::NotFound("employee"))
        }
    }

    pub async fn list_expenses(&self, owner: Uuid) -> Result<Vec<Expense>, LedgerError> {
        Ok(self.stores.list_expenses(owner).await?)
    }

    pub async fn add_expense(&self, owner: Uuid, new: NewExpense) -> Result<Expense, LedgerError> {
        if new.kind.trim().is_empty() {
            return Err(LedgerError::Validation("expense kind is required".into()));
        }
        let expense = Expense {
            id: Uuid::new_v4(),
            owner,
            kind: new.kind.trim().to_string(),
            amount: new.amount,
            effective_date: new.effective_date.unwrap_or_else(Utc::now),
        };
        self.stores.insert_expense(&expense).await?;
        Ok(expense)
    }

    pub async fn remove_expense(&self, id: Uuid, owner: Uuid) -> Result<(), LedgerError> {
        if self.stores.delete_expense(id, owner).await? {
            Ok(())
        } else {
            Err(LedgerError::NotFound("expense"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::StoreError;
    use async_trait::async_trait;
    use chrono::{DateTime, TimeZone};
    use core_types::{CostTemplate, CustomCost, OrderStatus};
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// In-memory fakes for all four store traits.
    #[derive(Default)]
    struct MemStores {
        orders: Mutex<Vec<Order>>,
        templates: Mutex<Vec<CostTemplate>>,
        employees: Mutex<Vec<Employee>>,
        expenses: Mutex<Vec<Expense>>,
        manual_costs: Mutex<Vec<ManualCost>>,
    }

    #[async_trait]
    impl OrderStore for MemStores {
        async fn find_orders(
            &self,
            owner: Uuid,
            filter: &OrderFilter,
        ) -> Result<Vec<Order>, StoreError> {
            let orders = self.orders.lock().unwrap();
            Ok(orders
                .iter()
                .filter(|o| o.owner == owner)
                .filter(|o| filter.from.is_none_or(|from| o.created_at >= from))
                .filter(|o| filter.to.is_none_or(|to| o.created_at <= to))
                .filter(|o| filter.status.is_none_or(|s| o.status == s))
                .filter(|o| {
                    filter
                        .product_key
                        .as_ref()
                        .is_none_or(|k| &o.product_key == k)
                })
                .cloned()
                .collect())
        }

        async fn count_orders_in_range(
            &self,
            owner: Uuid,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<u64, StoreError> {
            let orders = self.orders.lock().unwrap();
            Ok(orders
                .iter()
                .filter(|o| o.owner == owner && o.created_at >= start && o.created_at < end)
                .count() as u64)
        }

        async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
            self.orders.lock().unwrap().push(order.clone());
            Ok(())
        }

        async fn update_order(
            &self,
            id: Uuid,
            owner: Uuid,
            patch: &OrderPatch,
        ) -> Result<Option<Order>, StoreError> {
            let mut orders = self.orders.lock().unwrap();
            let Some(order) = orders.iter_mut().find(|o| o.id == id && o.owner == owner)
            else {
                return Ok(None);
            };
            if let Some(order_ref) = &patch.order_ref {
                order.order_ref = order_ref.clone();
            }
            if let Some(price) = patch.selling_price {
                order.selling_price = price;
            }
            if let Some(status) = patch.status {
                order.status = status;
            }
            if let Some(charges) = patch.return_charges {
                order.return_charges = charges;
            }
            if let Some(recovered) = patch.recovered_amount {
                order.recovered_amount = recovered;
            }
            if let Some(reason) = &patch.return_reason {
                order.return_reason = Some(reason.clone());
            }
            Ok(Some(order.clone()))
        }

        async fn delete_order(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
            let mut orders = self.orders.lock().unwrap();
            let before = orders.len();
            orders.retain(|o| !(o.id == id && o.owner == owner));
            let deleted = orders.len() < before;
            if deleted {
                self.manual_costs
                    .lock()
                    .unwrap()
                    .retain(|c| c.order_id != Some(id));
            }
            Ok(deleted)
        }
    }

    #[async_trait]
    impl TemplateStore for MemStores {
        async fn find_by_id(
            &self,
            id: Uuid,
            owner: Uuid,
        ) -> Result<Option<CostTemplate>, StoreError> {
            let templates = self.templates.lock().unwrap();
            Ok(templates.iter().find(|t| t.id == id && t.owner == owner).cloned())
        }

        async fn find_by_key(
            &self,
            owner: Uuid,
            product_key: &str,
        ) -> Result<Option<CostTemplate>, StoreError> {
            let templates = self.templates.lock().unwrap();
            Ok(templates
                .iter()
                .find(|t| t.owner == owner && t.product_key == product_key)
                .cloned())
        }

        async fn find_by_name_ci(
            &self,
            owner: Uuid,
            product_name: &str,
        ) -> Result<Option<CostTemplate>, StoreError> {
            let templates = self.templates.lock().unwrap();
            Ok(templates
                .iter()
                .find(|t| {
                    t.owner == owner && t.product_name.eq_ignore_ascii_case(product_name)
                })
                .cloned())
        }

        async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<CostTemplate>, StoreError> {
            let templates = self.templates.lock().unwrap();
            Ok(templates.iter().filter(|t| t.owner == owner).cloned().collect())
        }

        async fn upsert_template(&self, template: &CostTemplate) -> Result<(), StoreError> {
            let mut templates = self.templates.lock().unwrap();
            match templates.iter_mut().find(|t| t.id == template.id) {
                Some(slot) => *slot = template.clone(),
                None => templates.push(template.clone()),
            }
            Ok(())
        }

        async fn delete_template(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
            let mut templates = self.templates.lock().unwrap();
            let before = templates.len();
            templates.retain(|t| !(t.id == id && t.owner == owner));
            Ok(templates.len() < before)
        }
    }

    #[async_trait]
    impl OverheadStore for MemStores {
        async fn list_employees(&self, owner: Uuid) -> Result<Vec<Employee>, StoreError> {
            let employees = self.employees.lock().unwrap();
            Ok(employees.iter().filter(|e| e.owner == owner).cloned().collect())
        }

        async fn insert_employee(&self, employee: &Employee) -> Result<(), StoreError> {
            self.employees.lock().unwrap().push(employee.clone());
            Ok(())
        }

        async fn delete_employee(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
            let mut employees = self.employees.lock().unwrap();
            let before = employees.len();
            employees.retain(|e| !(e.id == id && e.owner == owner));
            Ok(employees.len() < before)
        }

        async fn list_expenses_in_range(
            &self,
            owner: Uuid,
            start: DateTime<Utc>,
            end: DateTime<Utc>,
        ) -> Result<Vec<Expense>, StoreError> {
            let expenses = self.expenses.lock().unwrap();
            Ok(expenses
                .iter()
                .filter(|e| {
                    e.owner == owner && e.effective_date >= start && e.effective_date < end
                })
                .cloned()
                .collect())
        }

        async fn list_expenses(&self, owner: Uuid) -> Result<Vec<Expense>, StoreError> {
            let expenses = self.expenses.lock().unwrap();
            Ok(expenses.iter().filter(|e| e.owner == owner).cloned().collect())
        }

        async fn insert_expense(&self, expense: &Expense) -> Result<(), StoreError> {
            self.expenses.lock().unwrap().push(expense.clone());
            Ok(())
        }

        async fn delete_expense(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
            let mut expenses = self.expenses.lock().unwrap();
            let before = expenses.len();
            expenses.retain(|e| !(e.id == id && e.owner == owner));
            Ok(expenses.len() < before)
        }
    }

    #[async_trait]
    impl ManualCostStore for MemStores {
        async fn list_by_order(
            &self,
            owner: Uuid,
            order_id: Uuid,
        ) -> Result<Vec<ManualCost>, StoreError> {
            let costs = self.manual_costs.lock().unwrap();
            Ok(costs
                .iter()
                .filter(|c| c.owner == owner && c.order_id == Some(order_id))
                .cloned()
                .collect())
        }

        async fn list_for_orders(
            &self,
            owner: Uuid,
            order_ids: &[Uuid],
        ) -> Result<Vec<ManualCost>, StoreError> {
            let costs = self.manual_costs.lock().unwrap();
            Ok(costs
                .iter()
                .filter(|c| {
                    c.owner == owner
                        && c.order_id.is_some_and(|id| order_ids.contains(&id))
                })
                .cloned()
                .collect())
        }

        async fn list_global_in_range(
            &self,
            owner: Uuid,
            from: Option<DateTime<Utc>>,
            to: Option<DateTime<Utc>>,
        ) -> Result<Vec<ManualCost>, StoreError> {
            let costs = self.manual_costs.lock().unwrap();
            Ok(costs
                .iter()
                .filter(|c| c.owner == owner && c.order_id.is_none())
                .filter(|c| from.is_none_or(|f| c.incurred_at >= f))
                .filter(|c| to.is_none_or(|t| c.incurred_at <= t))
                .cloned()
                .collect())
        }

        async fn insert_manual_cost(&self, cost: &ManualCost) -> Result<(), StoreError> {
            self.manual_costs.lock().unwrap().push(cost.clone());
            Ok(())
        }

        async fn delete_manual_cost(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
            let mut costs = self.manual_costs.lock().unwrap();
            let before = costs.len();
            costs.retain(|c| !(c.id == id && c.owner == owner));
            Ok(costs.len() < before)
        }
    }

    fn ledger() -> OrderLedger<MemStores> {
        OrderLedger::new(MemStores::default())
    }

    fn template(owner: Uuid, key: &str, name: &str, base: Decimal) -> CostTemplate {
        CostTemplate {
            id: Uuid::new_v4(),
            owner,
            product_name: name.to_string(),
            product_key: key.to_string(),
            base_cost: base,
            marketing_cost: Decimal::ZERO,
            salary_cost: Decimal::ZERO,
            other_fixed_costs: Decimal::ZERO,
            custom_costs: vec![],
            created_at: Utc::now(),
        }
    }

    fn draft(order_ref: &str, key: &str, price: Decimal) -> OrderDraft {
        OrderDraft {
            order_ref: order_ref.to_string(),
            product_key: Some(key.to_string()),
            product_name: None,
            selling_price: price,
            status: OrderStatus::Delivered,
            created_at: None,
        }
    }

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn template_draft(key: &str, name: &str, base: Decimal) -> TemplateDraft {
        TemplateDraft {
            id: None,
            product_name: name.to_string(),
            product_key: key.to_string(),
            base_cost: base,
            marketing_cost: Decimal::ZERO,
            salary_cost: Decimal::ZERO,
            other_fixed_costs: Decimal::ZERO,
            custom_costs: vec![],
        }
    }

    #[tokio::test]
    async fn save_template_upserts_by_sku() {
        let ledger = ledger();
        let owner = Uuid::new_v4();

        let first = ledger
            .save_template(owner, template_draft("SKU-1", "Widget", dec!(80)))
            .await
            .unwrap();
        let second = ledger
            .save_template(owner, template_draft("SKU-1", "Widget v2", dec!(95)))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let all = ledger.list_templates(owner).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].base_cost, dec!(95));
        assert_eq!(all[0].product_name, "Widget v2");
    }

    #[tokio::test]
    async fn save_template_by_id_can_change_the_sku() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let created = ledger
            .save_template(owner, template_draft("SKU-1", "Widget", dec!(80)))
            .await
            .unwrap();

        let mut rename = template_draft("SKU-2", "Widget", dec!(80));
        rename.id = Some(created.id);
        let renamed = ledger.save_template(owner, rename).await.unwrap();

        assert_eq!(renamed.id, created.id);
        assert_eq!(renamed.product_key, "SKU-2");
        assert_eq!(ledger.list_templates(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_template_rejects_missing_fields_and_unknown_ids() {
        let ledger = ledger();
        let owner = Uuid::new_v4();

        let no_name = ledger
            .save_template(owner, template_draft("SKU-1", "  ", dec!(10)))
            .await;
        assert!(matches!(no_name, Err(LedgerError::Validation(_))));

        let no_key = ledger
            .save_template(owner, template_draft("", "Widget", dec!(10)))
            .await;
        assert!(matches!(no_key, Err(LedgerError::Validation(_))));

        let mut unknown = template_draft("SKU-1", "Widget", dec!(10));
        unknown.id = Some(Uuid::new_v4());
        assert!(matches!(
            ledger.save_template(owner, unknown).await,
            Err(LedgerError::NotFound("product template"))
        ));
    }

    #[tokio::test]
    async fn saved_templates_feed_order_snapshots() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let mut draft_with_custom = template_draft("SKU-1", "Widget", dec!(80));
        draft_with_custom
            .custom_costs
            .push(CustomCost { name: "wrap".into(), amount: dec!(20) });
        ledger.save_template(owner, draft_with_custom).await.unwrap();

        let order = ledger
            .create_order(owner, draft("ORD-1", "SKU-1", dec!(500)))
            .await
            .unwrap();
        assert_eq!(order.template_snapshot.unwrap().total, dec!(100));
    }

    #[tokio::test]
    async fn remove_template_distinguishes_not_found_and_keeps_old_snapshots() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let template = ledger
            .save_template(owner, template_draft("SKU-1", "Widget", dec!(80)))
            .await
            .unwrap();
        ledger
            .create_order(owner, draft("ORD-1", "SKU-1", dec!(500)))
            .await
            .unwrap();

        ledger.remove_template(template.id, owner).await.unwrap();
        assert!(matches!(
            ledger.remove_template(template.id, owner).await,
            Err(LedgerError::NotFound("product template"))
        ));

        // The order created before the deletion keeps its frozen cost.
        let costed = ledger
            .orders_with_profit(owner, &OrderFilter::default())
            .await
            .unwrap();
        assert_eq!(costed[0].breakdown.total_cost, dec!(80));
    }

    #[tokio::test]
    async fn projected_overhead_tracks_the_current_month() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        ledger.stores().employees.lock().unwrap().push(Employee {
            id: Uuid::new_v4(),
            owner,
            name: "a".into(),
            salary: dec!(3000),
            position: None,
            joined_at: Utc::now(),
        });
        for i in 0..2u32 {
            ledger
                .create_order(owner, draft(&format!("ORD-{i}"), "SKU-1", dec!(100)))
                .await
                .unwrap();
        }

        assert_eq!(ledger.projected_overhead(owner).await.unwrap(), dec!(1500));
    }

    #[tokio::test]
    async fn create_order_freezes_a_snapshot_from_the_sku_template() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let mut t = template(owner, "SKU-1", "Widget", dec!(80));
        t.custom_costs.push(CustomCost { name: "wrap".into(), amount: dec!(20) });
        ledger.stores().templates.lock().unwrap().push(t);

        let order = ledger
            .create_order(owner, draft("ORD-1", "SKU-1", dec!(500)))
            .await
            .unwrap();

        let snapshot = order.template_snapshot.unwrap();
        assert_eq!(snapshot.total, dec!(100));
        assert_eq!(order.product_name, "Widget");
    }

    #[tokio::test]
    async fn create_order_falls_back_to_case_insensitive_name_lookup() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        ledger
            .stores()
            .templates
            .lock()
            .unwrap()
            .push(template(owner, "SKU-9", "Gadget", dec!(60)));

        let order = ledger
            .create_order(
                owner,
                OrderDraft {
                    order_ref: "ORD-2".into(),
                    product_key: None,
                    product_name: Some("gAdGeT".into()),
                    selling_price: dec!(300),
                    status: OrderStatus::InTransit,
                    created_at: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(order.template_snapshot.unwrap().total, dec!(60));
        assert_eq!(order.product_key, "SKU-9");
    }

    #[tokio::test]
    async fn create_order_without_a_template_gets_a_zero_snapshot() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let order = ledger
            .create_order(owner, draft("ORD-3", "UNKNOWN", dec!(100)))
            .await
            .unwrap();
        assert_eq!(order.template_snapshot.unwrap().total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn create_order_rejects_missing_required_fields() {
        let ledger = ledger();
        let owner = Uuid::new_v4();

        let no_ref = ledger.create_order(owner, draft("  ", "SKU-1", dec!(10))).await;
        assert!(matches!(no_ref, Err(LedgerError::Validation(_))));

        let no_product = ledger
            .create_order(
                owner,
                OrderDraft {
                    order_ref: "ORD-4".into(),
                    product_key: None,
                    product_name: None,
                    selling_price: dec!(10),
                    status: OrderStatus::Delivered,
                    created_at: None,
                },
            )
            .await;
        assert!(matches!(no_product, Err(LedgerError::Validation(_))));
    }

    #[tokio::test]
    async fn snapshot_survives_later_template_edits() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        ledger
            .stores()
            .templates
            .lock()
            .unwrap()
            .push(template(owner, "SKU-1", "Widget", dec!(100)));

        ledger
            .create_order(owner, draft("ORD-1", "SKU-1", dec!(500)))
            .await
            .unwrap();

        // The product gets more expensive after the fact.
        ledger.stores().templates.lock().unwrap()[0].base_cost = dec!(900);

        let costed = ledger
            .orders_with_profit(owner, &OrderFilter::default())
            .await
            .unwrap();
        assert_eq!(costed[0].order.template_snapshot.as_ref().unwrap().total, dec!(100));
        assert_eq!(costed[0].breakdown.total_cost, dec!(100));
    }

    #[tokio::test]
    async fn allocate_overhead_matches_the_monthly_inputs() {
        let ledger = ledger();
        let owner = Uuid::new_v4();

        for (i, name) in ["a", "b"].iter().enumerate() {
            ledger.stores().employees.lock().unwrap().push(Employee {
                id: Uuid::new_v4(),
                owner,
                name: name.to_string(),
                salary: Decimal::from((i as i64 + 1) * 1000),
                position: None,
                joined_at: Utc::now(),
            });
        }
        ledger.stores().expenses.lock().unwrap().push(Expense {
            id: Uuid::new_v4(),
            owner,
            kind: "rent".into(),
            amount: dec!(500),
            effective_date: at(2024, 3, 10),
        });
        for i in 0..5u32 {
            let mut d = draft(&format!("ORD-{i}"), "SKU-1", dec!(100));
            d.created_at = Some(at(2024, 3, i + 1));
            ledger.create_order(owner, d).await.unwrap();
        }

        // (1000 + 2000 + 500) / 5
        let figure = ledger.allocate_overhead(owner, 2024, 3).await.unwrap();
        assert_eq!(figure, dec!(700));
    }

    #[tokio::test]
    async fn allocate_overhead_is_zero_for_an_orderless_month() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        ledger.stores().employees.lock().unwrap().push(Employee {
            id: Uuid::new_v4(),
            owner,
            name: "a".into(),
            salary: dec!(5000),
            position: None,
            joined_at: Utc::now(),
        });
        let figure = ledger.allocate_overhead(owner, 2024, 7).await.unwrap();
        assert_eq!(figure, Decimal::ZERO);
    }

    #[tokio::test]
    async fn allocate_overhead_rejects_invalid_months() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        assert!(matches!(
            ledger.allocate_overhead(owner, 2024, 13).await,
            Err(LedgerError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn batches_never_mix_overhead_figures_across_months() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        ledger.stores().employees.lock().unwrap().push(Employee {
            id: Uuid::new_v4(),
            owner,
            name: "a".into(),
            salary: dec!(1200),
            position: None,
            joined_at: Utc::now(),
        });

        // One order in March, three in April: 1200/1 vs 1200/3.
        let mut d = draft("ORD-M", "SKU-1", dec!(100));
        d.created_at = Some(at(2024, 3, 5));
        ledger.create_order(owner, d).await.unwrap();
        for i in 0..3u32 {
            let mut d = draft(&format!("ORD-A{i}"), "SKU-1", dec!(100));
            d.created_at = Some(at(2024, 4, i + 1));
            ledger.create_order(owner, d).await.unwrap();
        }

        let costed = ledger
            .orders_with_profit(owner, &OrderFilter::default())
            .await
            .unwrap();

        for c in &costed {
            let expected = if c.order.created_at.month() == 3 {
                dec!(1200)
            } else {
                dec!(400)
            };
            assert_eq!(c.breakdown.overhead_applied, expected);
        }
    }

    #[tokio::test]
    async fn manual_costs_flow_into_the_breakdown() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let order = ledger
            .create_order(owner, draft("ORD-1", "SKU-1", dec!(1000)))
            .await
            .unwrap();

        ledger
            .add_manual_cost(
                owner,
                NewManualCost {
                    order_id: Some(order.id),
                    kind: "courier".into(),
                    amount: dec!(50),
                    description: None,
                    incurred_at: None,
                },
            )
            .await
            .unwrap();

        let costed = ledger
            .orders_with_profit(owner, &OrderFilter::default())
            .await
            .unwrap();
        assert_eq!(costed[0].manual_total, dec!(50));
        // Zero template, manual 50, overhead 0 (no employees/expenses).
        assert_eq!(costed[0].breakdown.profit, dec!(950));
    }

    #[tokio::test]
    async fn update_and_delete_distinguish_not_found() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let order = ledger
            .create_order(owner, draft("ORD-1", "SKU-1", dec!(100)))
            .await
            .unwrap();

        let updated = ledger
            .update_order(
                order.id,
                owner,
                OrderPatch { status: Some(OrderStatus::Returned), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Returned);

        let stranger = Uuid::new_v4();
        assert!(matches!(
            ledger.update_order(order.id, stranger, OrderPatch::default()).await,
            Err(LedgerError::NotFound("order"))
        ));
        assert!(matches!(
            ledger.delete_order(Uuid::new_v4(), owner).await,
            Err(LedgerError::NotFound("order"))
        ));
    }

    #[tokio::test]
    async fn deleting_an_order_cascades_its_manual_costs() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let order = ledger
            .create_order(owner, draft("ORD-1", "SKU-1", dec!(100)))
            .await
            .unwrap();
        ledger
            .add_manual_cost(
                owner,
                NewManualCost {
                    order_id: Some(order.id),
                    kind: "courier".into(),
                    amount: dec!(10),
                    description: None,
                    incurred_at: None,
                },
            )
            .await
            .unwrap();

        ledger.delete_order(order.id, owner).await.unwrap();
        let remaining = ledger.manual_costs_for_order(owner, order.id).await.unwrap();
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn global_costs_exclude_order_linked_entries() {
        let ledger = ledger();
        let owner = Uuid::new_v4();
        let order = ledger
            .create_order(owner, draft("ORD-1", "SKU-1", dec!(100)))
            .await
            .unwrap();

        ledger
            .add_manual_cost(
                owner,
                NewManualCost {
                    order_id: Some(order.id),
                    kind: "courier".into(),
                    amount: dec!(10),
                    description: None,
                    incurred_at: None,
                },
            )
            .await
            .unwrap();
        ledger
            .add_manual_cost(
                owner,
                NewManualCost {
                    order_id: None,
                    kind: "ads".into(),
                    amount: dec!(250),
                    description: Some("campaign".into()),
                    incurred_at: None,
                },
            )
            .await
            .unwrap();

        let total = ledger.global_costs_total(owner, None, None).await.unwrap();
        assert_eq!(total, dec!(250));
    }
}
