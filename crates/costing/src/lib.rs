//! # Costing Engine
//!
//! This crate is the single source of truth for turning orders, cost
//! snapshots, manual costs, and monthly overhead into profit figures.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   storage or transport. It depends only on `core-types` (Layer 0).
//! - **Total Functions:** Every calculation here produces a numeric result,
//!   even over malformed historical records. Missing inputs read as zero;
//!   nothing in this crate panics or returns an error for bad data.
//! - **Stateless Calculation:** Identical inputs always yield identical
//!   output. Callers may freely parallelize across orders.
//!
//! ## Public API
//!
//! - `overhead_per_order` / `month_bounds`: the overhead allocation math.
//! - `compute_profit` / `ProfitBreakdown` / `CostedOrder`: the per-order
//!   profit calculator.
//! - `capture_snapshot` / `resolve_cost_basis` / `CostBasis`: template
//!   snapshotting and the prioritized cost-basis resolver.

pub mod allocator;
pub mod calculator;
pub mod resolver;

// Re-export the key components to create a clean, public-facing API.
pub use allocator::{month_bounds, overhead_per_order};
pub use calculator::{compute_profit, CostedOrder, ProfitBreakdown};
pub use resolver::{capture_snapshot, resolve_cost_basis, CostBasis};
