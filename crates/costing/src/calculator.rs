//! The per-order profit calculator.

use core_types::{Order, OrderStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// The derived profit figures for a single order.
///
/// Every profit-bearing read returns orders annotated with this struct;
/// callers never recompute profit from raw fields themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitBreakdown {
    /// Snapshot template cost + manual costs + allocated monthly overhead.
    pub total_cost: Decimal,
    pub profit: Decimal,
    /// Percentage of selling price; zero when the selling price is zero.
    pub profit_margin: Decimal,
    /// The overhead figure actually applied to this order.
    pub overhead_applied: Decimal,
}

/// An order together with its separately-stored manual cost total and its
/// computed profit breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostedOrder {
    #[serde(flatten)]
    pub order: Order,
    pub manual_total: Decimal,
    #[serde(flatten)]
    pub breakdown: ProfitBreakdown,
}

/// Computes the profit breakdown for one order.
///
/// `template_total` is the resolved template cost basis (see
/// [`crate::resolve_cost_basis`]); a missing snapshot resolves to zero
/// upstream. Status drives a pure function over the inputs:
///
/// - `Delivered` and `InTransit` (an unresolved order is priced as if it
///   will deliver): `selling_price - total_cost`.
/// - `Returned`: `-(total_cost + return_charges - recovered_amount)`. A
///   recovery larger than cost plus charges legitimately yields a
///   positive figure.
/// - `Cancelled`: `-total_cost`; the cost is sunk and there is no revenue.
///
/// Total over malformed input and idempotent: no error path, no state.
pub fn compute_profit(
    order: &Order,
    template_total: Decimal,
    manual_total: Decimal,
    overhead_per_order: Decimal,
) -> ProfitBreakdown {
    let total_cost = template_total + manual_total + overhead_per_order;

    let profit = match order.status {
        OrderStatus::Delivered | OrderStatus::InTransit => order.selling_price - total_cost,
        OrderStatus::Returned => {
            -(total_cost + order.return_charges - order.recovered_amount)
        }
        OrderStatus::Cancelled => -total_cost,
    };

    let profit_margin = if order.selling_price > Decimal::ZERO {
        profit / order.selling_price * HUNDRED
    } else {
        Decimal::ZERO
    };

    ProfitBreakdown {
        total_cost,
        profit,
        profit_margin,
        overhead_applied: overhead_per_order,
    }
}
