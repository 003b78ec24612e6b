//! Per-product profitability rollups.

use costing::CostedOrder;
use core_types::OrderStatus;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the per-product analytics table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRollup {
    pub product_key: String,
    pub product_name: String,
    pub total_orders: u64,
    pub delivered_count: u64,
    pub returned_count: u64,
    pub revenue: Decimal,
    /// Each member order's overhead share summed up. Overhead is
    /// distributed proportionally by order count per product, not as a
    /// flat per-product charge.
    pub allocated_overhead: Decimal,
    pub total_product_cost: Decimal,
    pub profit: Decimal,
    pub return_rate: Decimal,
    /// Profit over total product cost; zero when the cost is zero.
    pub roi: Decimal,
}

/// Groups costed orders by product key and computes each group's
/// profitability, sorted descending by profit.
pub fn product_rollup(orders: &[CostedOrder]) -> Vec<ProductRollup> {
    struct Group {
        product_name: String,
        total_orders: u64,
        delivered: u64,
        returned: u64,
        revenue: Decimal,
        cogs: Decimal,
        return_loss: Decimal,
        overhead: Decimal,
    }

    let mut groups: HashMap<String, Group> = HashMap::new();

    for costed in orders {
        let entry = groups
            .entry(costed.order.product_key.clone())
            .or_insert_with(|| Group {
                product_name: costed.order.product_name.clone(),
                total_orders: 0,
                delivered: 0,
                returned: 0,
                revenue: Decimal::ZERO,
                cogs: Decimal::ZERO,
                return_loss: Decimal::ZERO,
                overhead: Decimal::ZERO,
            });

        entry.total_orders += 1;
        entry.overhead += costed.breakdown.overhead_applied;

        let direct_cost = costed.breakdown.total_cost - costed.breakdown.overhead_applied;
        match costed.order.status {
            OrderStatus::Delivered => {
                entry.delivered += 1;
                entry.revenue += costed.order.selling_price;
                entry.cogs += direct_cost;
            }
            OrderStatus::Returned => {
                entry.returned += 1;
                entry.return_loss += direct_cost + costed.order.return_charges
                    - costed.order.recovered_amount;
            }
            OrderStatus::Cancelled | OrderStatus::InTransit => {}
        }
    }

    let mut rollups: Vec<ProductRollup> = groups
        .into_iter()
        .map(|(product_key, g)| {
            let total_product_cost = g.cogs + g.return_loss + g.overhead;
            let profit = g.revenue - total_product_cost;
            let roi = if total_product_cost > Decimal::ZERO {
                profit / total_product_cost
            } else {
                Decimal::ZERO
            };
            let return_rate = if g.total_orders > 0 {
                Decimal::from(g.returned) / Decimal::from(g.total_orders) * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            };
            ProductRollup {
                product_key,
                product_name: g.product_name,
                total_orders: g.total_orders,
                delivered_count: g.delivered,
                returned_count: g.returned,
                revenue: g.revenue,
                allocated_overhead: g.overhead,
                total_product_cost,
                profit,
                return_rate,
                roi,
            }
        })
        .collect();

    rollups.sort_by(|a, b| b.profit.cmp(&a.profit));
    rollups
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::{Order, TemplateSnapshot};
    use costing::compute_profit;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    /// Builds a costed order the way the ledger does: snapshot total,
    /// manual total and overhead fed through the profit calculator.
    pub(crate) fn costed(
        sku: &str,
        status: OrderStatus,
        selling_price: Decimal,
        template_total: Decimal,
        manual_total: Decimal,
        overhead: Decimal,
    ) -> CostedOrder {
        let order = Order {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            order_ref: format!("ORD-{sku}"),
            product_key: sku.to_string(),
            product_name: format!("Product {sku}"),
            selling_price,
            status,
            template_snapshot: Some(TemplateSnapshot {
                total: template_total,
                ..TemplateSnapshot::zero()
            }),
            legacy_unit_cost: None,
            return_charges: Decimal::ZERO,
            recovered_amount: Decimal::ZERO,
            return_reason: None,
            created_at: Utc::now(),
        };
        let breakdown = compute_profit(&order, template_total, manual_total, overhead);
        CostedOrder { order, manual_total, breakdown }
    }

    #[test]
    fn overhead_is_distributed_by_order_count_per_product() {
        // Three orders for SKU "X" at 100 overhead each: the group absorbs
        // 300, included in its total product cost.
        let orders = vec![
            costed("X", OrderStatus::Delivered, dec!(500), dec!(100), dec!(0), dec!(100)),
            costed("X", OrderStatus::Delivered, dec!(500), dec!(100), dec!(0), dec!(100)),
            costed("X", OrderStatus::Delivered, dec!(500), dec!(100), dec!(0), dec!(100)),
        ];
        let rollups = product_rollup(&orders);
        assert_eq!(rollups.len(), 1);
        assert_eq!(rollups[0].allocated_overhead, dec!(300));
        assert_eq!(rollups[0].total_product_cost, dec!(600));
        assert_eq!(rollups[0].profit, dec!(900));
    }

    #[test]
    fn groups_are_sorted_descending_by_profit() {
        let orders = vec![
            costed("LOW", OrderStatus::Delivered, dec!(200), dec!(150), dec!(0), dec!(10)),
            costed("HIGH", OrderStatus::Delivered, dec!(900), dec!(100), dec!(0), dec!(10)),
            costed("MID", OrderStatus::Delivered, dec!(500), dec!(100), dec!(0), dec!(10)),
        ];
        let keys: Vec<String> = product_rollup(&orders)
            .into_iter()
            .map(|r| r.product_key)
            .collect();
        assert_eq!(keys, vec!["HIGH", "MID", "LOW"]);
    }

    #[test]
    fn roi_is_zero_when_cost_is_zero() {
        let orders = vec![costed(
            "FREE",
            OrderStatus::Delivered,
            dec!(100),
            dec!(0),
            dec!(0),
            dec!(0),
        )];
        let rollups = product_rollup(&orders);
        assert_eq!(rollups[0].total_product_cost, Decimal::ZERO);
        assert_eq!(rollups[0].roi, Decimal::ZERO);
    }

    #[test]
    fn returned_orders_feed_return_loss_and_rate() {
        let mut returned = costed("X", OrderStatus::Returned, dec!(500), dec!(100), dec!(20), dec!(50));
        returned.order.return_charges = dec!(30);
        let orders = vec![
            costed("X", OrderStatus::Delivered, dec!(500), dec!(100), dec!(0), dec!(50)),
            returned,
        ];
        let rollups = product_rollup(&orders);
        assert_eq!(rollups[0].returned_count, 1);
        assert_eq!(rollups[0].return_rate, dec!(50));
        // cogs 100 + return loss (120 + 30) + overhead 100
        assert_eq!(rollups[0].total_product_cost, dec!(350));
    }
}
