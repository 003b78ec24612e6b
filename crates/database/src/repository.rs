use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{
    numeric, CostTemplate, CustomCost, Employee, Expense, ManualCost, Order, OrderStatus,
    TemplateSnapshot,
};
use ledger::{
    ManualCostStore, OrderFilter, OrderPatch, OrderStore, OverheadStore, StoreError,
    TemplateStore,
};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::postgres::PgPool;
use sqlx::FromRow;
use uuid::Uuid;

/// The Postgres-backed implementation of the ledger's store traits. It
/// encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct ProfitRepository {
    pool: PgPool,
}

/// Raw `orders` row. Numeric columns come back optional so that partially
/// malformed legacy rows coerce to zero instead of failing the batch.
#[derive(Debug, Clone, FromRow)]
struct OrderRow {
    id: Uuid,
    owner: Uuid,
    order_ref: String,
    product_key: String,
    product_name: String,
    selling_price: Option<Decimal>,
    status: String,
    template_snapshot: Option<JsonValue>,
    legacy_unit_cost: Option<Decimal>,
    return_charges: Option<Decimal>,
    recovered_amount: Option<Decimal>,
    return_reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        // An unreadable snapshot maps to None; the calculator treats that
        // as a zero template cost.
        let template_snapshot: Option<TemplateSnapshot> = row
            .template_snapshot
            .and_then(|v| serde_json::from_value(v).ok());

        Order {
            id: row.id,
            owner: row.owner,
            order_ref: row.order_ref,
            product_key: row.product_key,
            product_name: row.product_name,
            selling_price: numeric::or_zero(row.selling_price),
            status: OrderStatus::normalize(&row.status),
            template_snapshot,
            legacy_unit_cost: row.legacy_unit_cost,
            return_charges: numeric::or_zero(row.return_charges),
            recovered_amount: numeric::or_zero(row.recovered_amount),
            return_reason: row.return_reason,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct TemplateRow {
    id: Uuid,
    owner: Uuid,
    product_name: String,
    product_key: String,
    base_cost: Option<Decimal>,
    marketing_cost: Option<Decimal>,
    salary_cost: Option<Decimal>,
    other_fixed_costs: Option<Decimal>,
    custom_costs: JsonValue,
    created_at: DateTime<Utc>,
}

impl From<TemplateRow> for CostTemplate {
    fn from(row: TemplateRow) -> Self {
        let custom_costs: Vec<CustomCost> =
            serde_json::from_value(row.custom_costs).unwrap_or_default();
        CostTemplate {
            id: row.id,
            owner: row.owner,
            product_name: row.product_name,
            product_key: row.product_key,
            base_cost: numeric::or_zero(row.base_cost),
            marketing_cost: numeric::or_zero(row.marketing_cost),
            salary_cost: numeric::or_zero(row.salary_cost),
            other_fixed_costs: numeric::or_zero(row.other_fixed_costs),
            custom_costs,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct ManualCostRow {
    id: Uuid,
    owner: Uuid,
    order_id: Option<Uuid>,
    kind: String,
    amount: Option<Decimal>,
    description: Option<String>,
    incurred_at: DateTime<Utc>,
}

impl From<ManualCostRow> for ManualCost {
    fn from(row: ManualCostRow) -> Self {
        ManualCost {
            id: row.id,
            owner: row.owner,
            order_id: row.order_id,
            kind: row.kind,
            amount: numeric::or_zero(row.amount),
            description: row.description,
            incurred_at: row.incurred_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct EmployeeRow {
    id: Uuid,
    owner: Uuid,
    name: String,
    salary: Option<Decimal>,
    position: Option<String>,
    joined_at: DateTime<Utc>,
}

impl From<EmployeeRow> for Employee {
    fn from(row: EmployeeRow) -> Self {
        Employee {
            id: row.id,
            owner: row.owner,
            name: row.name,
            salary: numeric::or_zero(row.salary),
            position: row.position,
            joined_at: row.joined_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct ExpenseRow {
    id: Uuid,
    owner: Uuid,
    kind: String,
    amount: Option<Decimal>,
    effective_date: DateTime<Utc>,
}

impl From<ExpenseRow> for Expense {
    fn from(row: ExpenseRow) -> Self {
        Expense {
            id: row.id,
            owner: row.owner,
            kind: row.kind,
            amount: numeric::or_zero(row.amount),
            effective_date: row.effective_date,
        }
    }
}

impl ProfitRepository {
    /// Creates a new `ProfitRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderStore for ProfitRepository {
    async fn find_orders(
        &self,
        owner: Uuid,
        filter: &OrderFilter,
    ) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, owner, order_ref, product_key, product_name, selling_price,
                   status, template_snapshot, legacy_unit_cost, return_charges,
                   recovered_amount, return_reason, created_at
            FROM orders
            WHERE owner = $1
              AND ($2::timestamptz IS NULL OR created_at >= $2)
              AND ($3::timestamptz IS NULL OR created_at <= $3)
              AND ($4::text IS NULL OR status = $4)
              AND ($5::text IS NULL OR product_key = $5)
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.status.map(|s| s.as_str().to_string()))
        .bind(filter.product_key.as_deref())
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(rows.into_iter().map(Order::from).collect())
    }

    async fn count_orders_in_range(
        &self,
        owner: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE owner = $1 AND created_at >= $2 AND created_at < $3",
        )
        .bind(owner)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(count as u64)
    }

    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let snapshot = order
            .template_snapshot
            .as_ref()
            .map(serde_json::to_value)
            .transpose()
            .map_err(StoreError::backend)?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, owner, order_ref, product_key, product_name, selling_price,
                status, template_snapshot, legacy_unit_cost, return_charges,
                recovered_amount, return_reason, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(order.id)
        .bind(order.owner)
        .bind(&order.order_ref)
        .bind(&order.product_key)
        .bind(&order.product_name)
        .bind(order.selling_price)
        .bind(order.status.as_str())
        .bind(snapshot)
        .bind(order.legacy_unit_cost)
        .bind(order.return_charges)
        .bind(order.recovered_amount)
        .bind(order.return_reason.as_deref())
        .bind(order.created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(())
    }

    async fn update_order(
        &self,
        id: Uuid,
        owner: Uuid,
        patch: &OrderPatch,
    ) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders SET
                order_ref        = COALESCE($3, order_ref),
                selling_price    = COALESCE($4, selling_price),
                status           = COALESCE($5, status),
                return_charges   = COALESCE($6, return_charges),
                recovered_amount = COALESCE($7, recovered_amount),
                return_reason    = COALESCE($8, return_reason)
            WHERE id = $1 AND owner = $2
            RETURNING id, owner, order_ref, product_key, product_name, selling_price,
                      status, template_snapshot, legacy_unit_cost, return_charges,
                      recovered_amount, return_reason, created_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(patch.order_ref.as_deref())
        .bind(patch.selling_price)
        .bind(patch.status.map(|s| s.as_str().to_string()))
        .bind(patch.return_charges)
        .bind(patch.recovered_amount)
        .bind(patch.return_reason.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(row.map(Order::from))
    }

    async fn delete_order(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await.map_err(StoreError::backend)?;

        sqlx::query("DELETE FROM manual_costs WHERE order_id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::backend)?;

        let result = sqlx::query("DELETE FROM orders WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&mut *tx)
            .await
            .map_err(StoreError::backend)?;

        tx.commit().await.map_err(StoreError::backend)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TemplateStore for ProfitRepository {
    async fn find_by_id(
        &self,
        id: Uuid,
        owner: Uuid,
    ) -> Result<Option<CostTemplate>, StoreError> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, owner, product_name, product_key, base_cost, marketing_cost,
                   salary_cost, other_fixed_costs, custom_costs, created_at
            FROM cost_templates
            WHERE id = $1 AND owner = $2
            "#,
        )
        .bind(id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(row.map(CostTemplate::from))
    }

    async fn find_by_key(
        &self,
        owner: Uuid,
        product_key: &str,
    ) -> Result<Option<CostTemplate>, StoreError> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, owner, product_name, product_key, base_cost, marketing_cost,
                   salary_cost, other_fixed_costs, custom_costs, created_at
            FROM cost_templates
            WHERE owner = $1 AND product_key = $2
            "#,
        )
        .bind(owner)
        .bind(product_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(row.map(CostTemplate::from))
    }

    async fn find_by_name_ci(
        &self,
        owner: Uuid,
        product_name: &str,
    ) -> Result<Option<CostTemplate>, StoreError> {
        let row = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, owner, product_name, product_key, base_cost, marketing_cost,
                   salary_cost, other_fixed_costs, custom_costs, created_at
            FROM cost_templates
            WHERE owner = $1 AND LOWER(product_name) = LOWER($2)
            LIMIT 1
            "#,
        )
        .bind(owner)
        .bind(product_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(row.map(CostTemplate::from))
    }

    async fn list_by_owner(&self, owner: Uuid) -> Result<Vec<CostTemplate>, StoreError> {
        let rows = sqlx::query_as::<_, TemplateRow>(
            r#"
            SELECT id, owner, product_name, product_key, base_cost, marketing_cost,
                   salary_cost, other_fixed_costs, custom_costs, created_at
            FROM cost_templates
            WHERE owner = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(rows.into_iter().map(CostTemplate::from).collect())
    }

    async fn upsert_template(&self, template: &CostTemplate) -> Result<(), StoreError> {
        let custom_costs =
            serde_json::to_value(&template.custom_costs).map_err(StoreError::backend)?;

        sqlx::query(
            r#"
            INSERT INTO cost_templates (
                id, owner, product_name, product_key, base_cost, marketing_cost,
                salary_cost, other_fixed_costs, custom_costs, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (id) DO UPDATE SET
                product_name      = EXCLUDED.product_name,
                product_key       = EXCLUDED.product_key,
                base_cost         = EXCLUDED.base_cost,
                marketing_cost    = EXCLUDED.marketing_cost,
                salary_cost       = EXCLUDED.salary_cost,
                other_fixed_costs = EXCLUDED.other_fixed_costs,
                custom_costs      = EXCLUDED.custom_costs
            "#,
        )
        .bind(template.id)
        .bind(template.owner)
        .bind(&template.product_name)
        .bind(&template.product_key)
        .bind(template.base_cost)
        .bind(template.marketing_cost)
        .bind(template.salary_cost)
        .bind(template.other_fixed_costs)
        .bind(custom_costs)
        .bind(template.created_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(())
    }

    async fn delete_template(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM cost_templates WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl OverheadStore for ProfitRepository {
    async fn list_employees(&self, owner: Uuid) -> Result<Vec<Employee>, StoreError> {
        let rows = sqlx::query_as::<_, EmployeeRow>(
            "SELECT id, owner, name, salary, position, joined_at FROM employees WHERE owner = $1 ORDER BY joined_at ASC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(rows.into_iter().map(Employee::from).collect())
    }

    async fn insert_employee(&self, employee: &Employee) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO employees (id, owner, name, salary, position, joined_at) VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(employee.id)
        .bind(employee.owner)
        .bind(&employee.name)
        .bind(employee.salary)
        .bind(employee.position.as_deref())
        .bind(employee.joined_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn delete_employee(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_expenses_in_range(
        &self,
        owner: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Expense>, StoreError> {
        let rows = sqlx::query_as::<_, ExpenseRow>(
            r#"
            SELECT id, owner, kind, amount, effective_date
            FROM expenses
            WHERE owner = $1 AND effective_date >= $2 AND effective_date < $3
            ORDER BY effective_date ASC
            "#,
        )
        .bind(owner)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(rows.into_iter().map(Expense::from).collect())
    }

    async fn list_expenses(&self, owner: Uuid) -> Result<Vec<Expense>, StoreError> {
        let rows = sqlx::query_as::<_, ExpenseRow>(
            "SELECT id, owner, kind, amount, effective_date FROM expenses WHERE owner = $1 ORDER BY effective_date DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(rows.into_iter().map(Expense::from).collect())
    }

    async fn insert_expense(&self, expense: &Expense) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO expenses (id, owner, kind, amount, effective_date) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(expense.id)
        .bind(expense.owner)
        .bind(&expense.kind)
        .bind(expense.amount)
        .bind(expense.effective_date)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn delete_expense(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ManualCostStore for ProfitRepository {
    async fn list_by_order(
        &self,
        owner: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<ManualCost>, StoreError> {
        let rows = sqlx::query_as::<_, ManualCostRow>(
            r#"
            SELECT id, owner, order_id, kind, amount, description, incurred_at
            FROM manual_costs
            WHERE owner = $1 AND order_id = $2
            ORDER BY incurred_at ASC
            "#,
        )
        .bind(owner)
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(rows.into_iter().map(ManualCost::from).collect())
    }

    async fn list_for_orders(
        &self,
        owner: Uuid,
        order_ids: &[Uuid],
    ) -> Result<Vec<ManualCost>, StoreError> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, ManualCostRow>(
            r#"
            SELECT id, owner, order_id, kind, amount, description, incurred_at
            FROM manual_costs
            WHERE owner = $1 AND order_id = ANY($2)
            "#,
        )
        .bind(owner)
        .bind(order_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(rows.into_iter().map(ManualCost::from).collect())
    }

    async fn list_global_in_range(
        &self,
        owner: Uuid,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<ManualCost>, StoreError> {
        let rows = sqlx::query_as::<_, ManualCostRow>(
            r#"
            SELECT id, owner, order_id, kind, amount, description, incurred_at
            FROM manual_costs
            WHERE owner = $1 AND order_id IS NULL
              AND ($2::timestamptz IS NULL OR incurred_at >= $2)
              AND ($3::timestamptz IS NULL OR incurred_at <= $3)
            ORDER BY incurred_at DESC
            "#,
        )
        .bind(owner)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(StoreError::backend)?;

        Ok(rows.into_iter().map(ManualCost::from).collect())
    }

    async fn insert_manual_cost(&self, cost: &ManualCost) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO manual_costs (id, owner, order_id, kind, amount, description, incurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(cost.id)
        .bind(cost.owner)
        .bind(cost.order_id)
        .bind(&cost.kind)
        .bind(cost.amount)
        .bind(cost.description.as_deref())
        .bind(cost.incurred_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::backend)?;
        Ok(())
    }

    async fn delete_manual_cost(&self, id: Uuid, owner: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM manual_costs WHERE id = $1 AND owner = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(StoreError::backend)?;
        Ok(result.rows_affected() > 0)
    }
}
