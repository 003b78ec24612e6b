use crate::{error::AppError, AppState};
use analytics::{DashboardSummary, Insight, ProductRollup};
use axum::{
    async_trait,
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use core_types::{numeric, CostTemplate, CustomCost, Employee, Expense, ManualCost, Order, OrderStatus};
use costing::CostedOrder;
use ledger::{
    NewEmployee, NewExpense, NewManualCost, OrderDraft, OrderFilter, OrderPatch, TemplateDraft,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

/// The authenticated business account, taken from the `x-owner-id` header.
///
/// Authentication itself lives in front of this service; by the time a
/// request gets here the gateway has already resolved the account id.
pub struct OwnerId(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get("x-owner-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
            .map(OwnerId)
            .ok_or(AppError::Unauthorized)
    }
}

/// Parses a date query parameter as the start of its day.
///
/// Accepts a full RFC 3339 timestamp or a bare `YYYY-MM-DD` date; anything
/// else reads as an absent bound.
fn parse_day_start(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = raw.parse::<NaiveDate>().ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// Like `parse_day_start`, but a bare date reads as the end of its day so
/// that `?to=2024-03-31` includes the whole of March 31st.
fn parse_day_end(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let date = raw.parse::<NaiveDate>().ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(23, 59, 59)?))
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl RangeQuery {
    fn bounds(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        (
            self.from.as_deref().and_then(parse_day_start),
            self.to.as_deref().and_then(parse_day_end),
        )
    }
}

// ==============================================================================
// Orders
// ==============================================================================

/// The order creation body. Legacy callers use several spellings for the
/// same fields; the aliases fold them into one canonical schema before
/// anything reaches the core.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default, alias = "orderNo", alias = "orderNumber")]
    pub order_ref: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default, alias = "orderPrice")]
    pub selling_price: Option<JsonValue>,
    #[serde(default, alias = "deliveryStatus")]
    pub status: Option<String>,
}

/// # POST /api/orders
/// Creates an order, freezing its template cost snapshot.
pub async fn create_order(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse, AppError> {
    let draft = OrderDraft {
        order_ref: req.order_ref.unwrap_or_default(),
        product_key: req.sku,
        product_name: req.product_name,
        selling_price: req
            .selling_price
            .as_ref()
            .map(numeric::coerce)
            .unwrap_or(Decimal::ZERO),
        status: OrderStatus::normalize(req.status.as_deref().unwrap_or("")),
        created_at: None,
    };

    let order = state.ledger.create_order(owner, draft).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub status: Option<String>,
    pub sku: Option<String>,
}

/// # GET /api/orders
/// Fetches orders annotated with their profit breakdown. This endpoint is
/// the only place order profit comes from; clients never derive it.
pub async fn list_orders(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<CostedOrder>>, AppError> {
    let filter = OrderFilter {
        from: query.from.as_deref().and_then(parse_day_start),
        to: query.to.as_deref().and_then(parse_day_end),
        // Strict parse: an unrecognized status reads as "no status filter".
        status: query.status.as_deref().and_then(OrderStatus::parse),
        product_key: query.sku,
    };

    let costed = state.ledger.orders_with_profit(owner, &filter).await?;
    Ok(Json(costed))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    #[serde(default, alias = "orderNo", alias = "orderNumber")]
    pub order_ref: Option<String>,
    #[serde(default, alias = "orderPrice")]
    pub selling_price: Option<JsonValue>,
    #[serde(default, alias = "deliveryStatus")]
    pub status: Option<String>,
    #[serde(default)]
    pub return_charges: Option<JsonValue>,
    #[serde(default)]
    pub recovered_amount: Option<JsonValue>,
    #[serde(default)]
    pub return_reason: Option<String>,
}

/// # PUT /api/orders/:id
pub async fn update_order(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    let patch = OrderPatch {
        order_ref: req.order_ref,
        selling_price: req.selling_price.as_ref().map(numeric::coerce),
        status: req.status.as_deref().map(OrderStatus::normalize),
        return_charges: req.return_charges.as_ref().map(numeric::coerce),
        recovered_amount: req.recovered_amount.as_ref().map(numeric::coerce),
        return_reason: req.return_reason,
    };

    let order = state.ledger.update_order(id, owner, patch).await?;
    Ok(Json(order))
}

/// # DELETE /api/orders/:id
/// Removes the order and cascades deletion of its manual costs.
pub async fn delete_order(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    state.ledger.delete_order(id, owner).await?;
    Ok(Json(serde_json::json!({ "message": "Order deleted" })))
}

// ==============================================================================
// Product cost templates
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct CustomCostInput {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: Option<JsonValue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveTemplateRequest {
    #[serde(default)]
    pub id: Option<Uuid>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default, alias = "sku")]
    pub product_key: Option<String>,
    #[serde(default)]
    pub base_cost: Option<JsonValue>,
    #[serde(default)]
    pub marketing_cost: Option<JsonValue>,
    #[serde(default)]
    pub salary_cost: Option<JsonValue>,
    #[serde(default, alias = "otherCosts")]
    pub other_fixed_costs: Option<JsonValue>,
    #[serde(default)]
    pub custom_costs: Vec<CustomCostInput>,
}

#[derive(Debug, Serialize)]
pub struct TemplateView {
    #[serde(flatten)]
    pub template: CostTemplate,
    pub template_total: Decimal,
}

/// The template listing, with each template's live total and the overhead
/// figure the current month's orders are absorbing so far.
#[derive(Debug, Serialize)]
pub struct TemplateListing {
    pub projected_overhead: Decimal,
    pub templates: Vec<TemplateView>,
}

/// # GET /api/products
pub async fn list_product_templates(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
) -> Result<Json<TemplateListing>, AppError> {
    let (templates, projected_overhead) = tokio::join!(
        state.ledger.list_templates(owner),
        state.ledger.projected_overhead(owner),
    );

    let templates = templates?
        .into_iter()
        .map(|template| TemplateView { template_total: template.template_total(), template })
        .collect();

    Ok(Json(TemplateListing { projected_overhead: projected_overhead?, templates }))
}

/// # POST /api/products
/// Creates or updates a cost template: a body carrying an id targets that
/// record, otherwise the save upserts by SKU.
pub async fn save_product_template(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveTemplateRequest>,
) -> Result<Json<CostTemplate>, AppError> {
    let custom_costs = req
        .custom_costs
        .iter()
        .map(|c| CustomCost {
            name: c.name.clone().unwrap_or_default(),
            amount: c.amount.as_ref().map(numeric::coerce).unwrap_or(Decimal::ZERO),
        })
        .collect();

    let draft = TemplateDraft {
        id: req.id,
        product_name: req.product_name.unwrap_or_default(),
        product_key: req.product_key.unwrap_or_default(),
        base_cost: req.base_cost.as_ref().map(numeric::coerce).unwrap_or(Decimal::ZERO),
        marketing_cost: req
            .marketing_cost
            .as_ref()
            .map(numeric::coerce)
            .unwrap_or(Decimal::ZERO),
        salary_cost: req.salary_cost.as_ref().map(numeric::coerce).unwrap_or(Decimal::ZERO),
        other_fixed_costs: req
            .other_fixed_costs
            .as_ref()
            .map(numeric::coerce)
            .unwrap_or(Decimal::ZERO),
        custom_costs,
    };

    let template = state.ledger.save_template(owner, draft).await?;
    Ok(Json(template))
}

/// # DELETE /api/products/:id
pub async fn delete_product_template(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    state.ledger.remove_template(id, owner).await?;
    Ok(Json(serde_json::json!({ "message": "Product template deleted" })))
}

// ==============================================================================
// Manual / global costs
// ==============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCostRequest {
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,
    #[serde(default)]
    pub amount: Option<JsonValue>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order_id: Option<Uuid>,
    #[serde(default)]
    pub date: Option<String>,
}

/// # POST /api/costs
/// Attaches a cost to an order, or records a global cost when no order id
/// is given.
pub async fn create_cost(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateCostRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new = NewManualCost {
        order_id: req.order_id,
        kind: req.kind.unwrap_or_default(),
        amount: req.amount.as_ref().map(numeric::coerce).unwrap_or(Decimal::ZERO),
        description: req.description,
        incurred_at: req.date.as_deref().and_then(parse_day_start),
    };

    let cost = state.ledger.add_manual_cost(owner, new).await?;
    Ok((StatusCode::CREATED, Json(cost)))
}

/// # GET /api/costs
/// Lists global costs (no order linkage) for the period.
pub async fn list_global_costs(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<ManualCost>>, AppError> {
    let (from, to) = range.bounds();
    let costs = state.ledger.global_costs(owner, from, to).await?;
    Ok(Json(costs))
}

/// # GET /api/costs/order/:order_id
pub async fn costs_by_order(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<Json<Vec<ManualCost>>, AppError> {
    let costs = state.ledger.manual_costs_for_order(owner, order_id).await?;
    Ok(Json(costs))
}

/// # DELETE /api/costs/:id
pub async fn delete_cost(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    state.ledger.remove_manual_cost(id, owner).await?;
    Ok(Json(serde_json::json!({ "message": "Cost deleted" })))
}

// ==============================================================================
// Company overhead records
// ==============================================================================

#[derive(Debug, Deserialize)]
pub struct CreateEmployeeRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub salary: Option<JsonValue>,
    #[serde(default)]
    pub position: Option<String>,
}

/// # GET /api/company/employees
pub async fn list_employees(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Employee>>, AppError> {
    Ok(Json(state.ledger.list_employees(owner).await?))
}

/// # POST /api/company/employees
pub async fn add_employee(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateEmployeeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new = NewEmployee {
        name: req.name.unwrap_or_default(),
        salary: req.salary.as_ref().map(numeric::coerce).unwrap_or(Decimal::ZERO),
        position: req.position,
    };
    let employee = state.ledger.add_employee(owner, new).await?;
    Ok((StatusCode::CREATED, Json(employee)))
}

/// # DELETE /api/company/employees/:id
pub async fn delete_employee(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    state.ledger.remove_employee(id, owner).await?;
    Ok(Json(serde_json::json!({ "message": "Employee deleted" })))
}

#[derive(Debug, Deserialize)]
pub struct CreateExpenseRequest {
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,
    #[serde(default)]
    pub amount: Option<JsonValue>,
    #[serde(default)]
    pub date: Option<String>,
}

/// # GET /api/company/expenses
pub async fn list_expenses(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Expense>>, AppError> {
    Ok(Json(state.ledger.list_expenses(owner).await?))
}

/// # POST /api/company/expenses
pub async fn add_expense(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateExpenseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let new = NewExpense {
        kind: req.kind.unwrap_or_default(),
        amount: req.amount.as_ref().map(numeric::coerce).unwrap_or(Decimal::ZERO),
        effective_date: req.date.as_deref().and_then(parse_day_start),
    };
    let expense = state.ledger.add_expense(owner, new).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

/// # DELETE /api/company/expenses/:id
pub async fn delete_expense(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<JsonValue>, AppError> {
    state.ledger.remove_expense(id, owner).await?;
    Ok(Json(serde_json::json!({ "message": "Expense deleted" })))
}

// ==============================================================================
// Dashboard & insights
// ==============================================================================

async fn costed_orders_in_range(
    state: &AppState,
    owner: Uuid,
    range: &RangeQuery,
) -> Result<(Vec<CostedOrder>, Decimal), AppError> {
    let (from, to) = range.bounds();
    let filter = OrderFilter { from, to, status: None, product_key: None };

    // Independent reads; fetch them concurrently before the profit pass.
    let (costed, global) = tokio::join!(
        state.ledger.orders_with_profit(owner, &filter),
        state.ledger.global_costs_total(owner, from, to),
    );

    Ok((costed?, global?))
}

/// # GET /api/dashboard/summary
pub async fn dashboard_summary(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<DashboardSummary>, AppError> {
    let (costed, global) = costed_orders_in_range(&state, owner, &range).await?;
    Ok(Json(analytics::summarize(&costed, global)))
}

/// # GET /api/dashboard/products
pub async fn product_analytics(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<ProductRollup>>, AppError> {
    let (costed, _global) = costed_orders_in_range(&state, owner, &range).await?;
    Ok(Json(analytics::product_rollup(&costed)))
}

/// # GET /api/insights
pub async fn period_insights(
    OwnerId(owner): OwnerId,
    State(state): State<Arc<AppState>>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<Insight>>, AppError> {
    let (costed, global) = costed_orders_in_range(&state, owner, &range).await?;
    let summary = analytics::summarize(&costed, global);
    let insights = analytics::insights(&summary, state.config.insights.success_threshold);
    Ok(Json(insights))
}
