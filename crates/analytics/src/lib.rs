//! # Analytics Layer
//!
//! Rolls per-order profit figures up into period summaries and per-product
//! rollups, and derives rule-based business insights from them.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** Pure aggregation over already-costed orders. It has
//!   no knowledge of storage; the ledger fetches and annotates orders, this
//!   crate only folds them.
//! - **Total Functions:** Like the costing engine, every aggregation here
//!   produces numbers for any input, including an empty period.
//!
//! ## Public API
//!
//! - `summarize` / `DashboardSummary`: the period-level dashboard figures.
//! - `product_rollup` / `ProductRollup`: per-product profitability, sorted
//!   by profit.
//! - `insights` / `Insight`: advisory messages derived from a summary.

pub mod insights;
pub mod products;
pub mod summary;

// Re-export the key components to create a clean, public-facing API.
pub use insights::{insights, Insight, InsightLevel};
pub use products::{product_rollup, ProductRollup};
pub use summary::{summarize, DashboardSummary};
