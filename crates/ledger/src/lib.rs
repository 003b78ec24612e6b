//! # Order Ledger
//!
//! The orchestration layer between the stores and the costing engine. It
//! owns the two rules that make profit figures trustworthy:
//!
//! - the template snapshot is captured exactly once, at order creation,
//!   and never recomputed from a live template afterwards;
//! - overhead for a given (owner, month) pair is computed at most once per
//!   batch operation and never applied to another month's orders.
//!
//! ## Architectural Principles
//!
//! - **Layer 2 Orchestration:** Store access goes through the traits in
//!   [`stores`]; the ledger never reaches into a database directly, which
//!   is what makes it testable against in-memory fakes.
//! - **Single Source of Truth:** Every profit-bearing read returns orders
//!   already annotated with their breakdown. Callers never recompute
//!   profit from raw fields.

pub mod error;
pub mod service;
pub mod stores;

// Re-export the key components to create a clean, public-facing API.
pub use error::LedgerError;
pub use service::OrderLedger;
pub use stores::{
    ManualCostStore, NewEmployee, NewExpense, NewManualCost, OrderDraft, OrderFilter,
    OrderPatch, OrderStore, OverheadStore, StoreError, TemplateDraft, TemplateStore,
};
