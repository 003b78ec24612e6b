//! Period-level dashboard aggregation.

use costing::CostedOrder;
use core_types::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The dashboard figures for one owner over one date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub total_orders: u64,
    pub delivered_orders: u64,
    pub returned_orders: u64,
    pub cancelled_orders: u64,
    pub in_transit_orders: u64,
    /// Selling price of delivered orders only.
    pub total_revenue: Decimal,
    /// Template + manual cost of delivered orders only. Overhead is a
    /// period-level figure and is deliberately not folded into COGS here.
    pub total_cogs: Decimal,
    /// Template + manual + return charges - recovered, for returned orders.
    pub total_return_loss: Decimal,
    /// Manual costs in the period with no order linkage.
    pub total_global_costs: Decimal,
    pub gross_profit: Decimal,
    pub net_profit: Decimal,
    /// Returned orders as a percentage of all orders; zero when empty.
    pub return_rate: Decimal,
}

/// Folds a batch of costed orders plus the period's global costs into a
/// `DashboardSummary`. Total over any input, including an empty period.
pub fn summarize(orders: &[CostedOrder], global_costs: Decimal) -> DashboardSummary {
    let mut delivered = 0u64;
    let mut returned = 0u64;
    let mut cancelled = 0u64;
    let mut in_transit = 0u64;
    let mut revenue = Decimal::ZERO;
    let mut cogs = Decimal::ZERO;
    let mut return_loss = Decimal::ZERO;

    for costed in orders {
        // Template + manual, without the amortized overhead share.
        let direct_cost = costed.breakdown.total_cost - costed.breakdown.overhead_applied;

        match costed.order.status {
            OrderStatus::Delivered => {
                delivered += 1;
                revenue += costed.order.selling_price;
                cogs += direct_cost;
            }
            OrderStatus::Returned => {
                returned += 1;
                return_loss += direct_cost + costed.order.return_charges
                    - costed.order.recovered_amount;
            }
            OrderStatus::Cancelled => cancelled += 1,
            OrderStatus::InTransit => in_transit += 1,
        }
    }

    let total = orders.len() as u64;
    let gross_profit = revenue - (cogs + return_loss);
    let return_rate = if total > 0 {
        Decimal::from(returned) / Decimal::from(total) * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    DashboardSummary {
        total_orders: total,
        delivered_orders: delivered,
        returned_orders: returned,
        cancelled_orders: cancelled,
        in_transit_orders: in_transit,
        total_revenue: revenue,
        total_cogs: cogs,
        total_return_loss: return_loss,
        total_global_costs: global_costs,
        gross_profit,
        net_profit: gross_profit - global_costs,
        return_rate,
    }
}
