//! Rule-based advisory insights derived from a period summary.

use crate::summary::DashboardSummary;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightLevel {
    Info,
    Success,
    Warning,
    Caution,
    Danger,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insight {
    pub level: InsightLevel,
    pub message: String,
}

impl Insight {
    fn new(level: InsightLevel, message: impl Into<String>) -> Self {
        Self { level, message: message.into() }
    }
}

/// Derives advisory messages from a summary.
///
/// `success_threshold` is the net-profit level above which the period is
/// flagged as a success; it comes from configuration since a sensible
/// figure depends on the size of the business.
pub fn insights(summary: &DashboardSummary, success_threshold: Decimal) -> Vec<Insight> {
    let mut out = Vec::new();

    if summary.return_rate > Decimal::from(20) {
        out.push(Insight::new(
            InsightLevel::Warning,
            "Returns are high (>20%); check product quality or sizing accuracy.",
        ));
    }

    if summary.total_revenue > Decimal::ZERO {
        let loss_share = summary.total_return_loss / summary.total_revenue;
        if loss_share > Decimal::new(15, 2) {
            out.push(Insight::new(
                InsightLevel::Caution,
                "Return losses are eating up more than 15% of your revenue. \
                 Consider revising return policies.",
            ));
        }
    }

    if summary.net_profit < Decimal::ZERO {
        out.push(Insight::new(
            InsightLevel::Danger,
            "Your net profit for this period is negative. Review global costs \
             and pause ads on losing products.",
        ));
    } else if summary.net_profit > success_threshold {
        out.push(Insight::new(
            InsightLevel::Success,
            "Great job! Your business is performing well. Consider scaling \
             your top winning products.",
        ));
    }

    if out.is_empty() {
        out.push(Insight::new(
            InsightLevel::Info,
            "Keep collecting data. Once you have more orders, actionable \
             business insights will appear here.",
        ));
    }

    out
}
