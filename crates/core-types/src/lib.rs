pub mod enums;
pub mod numeric;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::OrderStatus;
pub use numeric::{coerce, or_zero};
pub use structs::{
    CostTemplate, CustomCost, Employee, Expense, ManualCost, Order, TemplateSnapshot,
};
