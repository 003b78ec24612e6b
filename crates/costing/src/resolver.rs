//! Template snapshotting and the prioritized cost-basis resolver.

use core_types::{CostTemplate, Order, TemplateSnapshot};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Captures an immutable snapshot of a template's cost fields.
///
/// The `total` is computed here, once, and persisted onto the order. This
/// is the historical-accuracy guarantee: editing the template afterwards
/// does not alter the profit reported for orders created before the edit.
pub fn capture_snapshot(template: &CostTemplate) -> TemplateSnapshot {
    TemplateSnapshot {
        base_cost: template.base_cost,
        marketing_cost: template.marketing_cost,
        salary_cost: template.salary_cost,
        other_fixed_costs: template.other_fixed_costs,
        custom_costs: template.custom_costs.clone(),
        total: template.template_total(),
    }
}

/// Where an order's template cost figure came from.
///
/// Older records predate snapshotting, so reads fall through a prioritized
/// chain. The tag lets tests (and debugging) assert which path fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CostBasis {
    /// The frozen snapshot captured at creation time. The normal case.
    Snapshot,
    /// A flat legacy per-unit cost stored inline on the order.
    LegacyInline,
    /// A live template lookup; only used when the record carries neither a
    /// snapshot nor a legacy cost, and therefore not historically stable.
    LiveTemplate,
    /// Nothing matched. The cost basis is zero.
    None,
}

/// Resolves the template cost for an order: snapshot, then legacy inline
/// field, then live template, then zero.
pub fn resolve_cost_basis(
    order: &Order,
    live_template: Option<&CostTemplate>,
) -> (CostBasis, Decimal) {
    if let Some(snapshot) = &order.template_snapshot {
        return (CostBasis::Snapshot, snapshot.total);
    }
    if let Some(legacy) = order.legacy_unit_cost {
        return (CostBasis::LegacyInline, legacy);
    }
    if let Some(template) = live_template {
        return (CostBasis::LiveTemplate, template.template_total());
    }
    (CostBasis::None, Decimal::ZERO)
}
