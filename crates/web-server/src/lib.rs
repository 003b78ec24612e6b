use axum::{
    routing::{delete, get, post, put},
    Router,
};
use configuration::Config;
use database::ProfitRepository;
use ledger::OrderLedger;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
#[derive(Clone)]
pub struct AppState {
    pub ledger: OrderLedger<ProfitRepository>,
    pub config: Config,
}

/// The main function to configure and run the web server.
pub async fn run_server(addr: SocketAddr, config: Config) -> anyhow::Result<()> {
    // Tracing is initialized in main.rs; this function only wires routes.

    let db_pool = database::connect(config.database.max_connections).await?;
    database::run_migrations(&db_pool).await?;
    let ledger = OrderLedger::new(ProfitRepository::new(db_pool));

    let app_state = Arc::new(AppState { ledger, config });
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    // --- DEFINE THE APPLICATION ROUTES ---
    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/orders", post(handlers::create_order))
        .route("/api/orders", get(handlers::list_orders))
        .route("/api/orders/:id", put(handlers::update_order))
        .route("/api/orders/:id", delete(handlers::delete_order))
        .route("/api/products", get(handlers::list_product_templates))
        .route("/api/products", post(handlers::save_product_template))
        .route("/api/products/:id", delete(handlers::delete_product_template))
        .route("/api/costs", get(handlers::list_global_costs))
        .route("/api/costs", post(handlers::create_cost))
        .route("/api/costs/:id", delete(handlers::delete_cost))
        .route("/api/costs/order/:order_id", get(handlers::costs_by_order))
        .route("/api/company/employees", get(handlers::list_employees))
        .route("/api/company/employees", post(handlers::add_employee))
        .route("/api/company/employees/:id", delete(handlers::delete_employee))
        .route("/api/company/expenses", get(handlers::list_expenses))
        .route("/api/company/expenses", post(handlers::add_expense))
        .route("/api/company/expenses/:id", delete(handlers::delete_expense))
        .route("/api/dashboard/summary", get(handlers::dashboard_summary))
        .route("/api/dashboard/products", get(handlers::product_analytics))
        .route("/api/insights", get(handlers::period_insights))
        .with_state(app_state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http());

    tracing::info!("Web server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
