//! Overhead allocation: turning an owner's monthly salaries and expenses
//! into a single "overhead per order" figure.

use chrono::{DateTime, TimeZone, Utc};
use core_types::{Employee, Expense};
use rust_decimal::Decimal;

/// Computes the overhead figure absorbed by each order in a month.
///
/// Salaries are flat monthly amounts summed across all employees; expenses
/// are summed as given (the caller has already restricted them to the
/// month). When the month has no orders there is nothing to absorb the
/// overhead, so the figure is exactly zero rather than an infinite
/// implied cost.
pub fn overhead_per_order(
    order_count: u64,
    employees: &[Employee],
    expenses: &[Expense],
) -> Decimal {
    if order_count == 0 {
        return Decimal::ZERO;
    }

    let total_salaries: Decimal = employees.iter().map(|e| e.salary).sum();
    let total_expenses: Decimal = expenses.iter().map(|e| e.amount).sum();

    (total_salaries + total_expenses) / Decimal::from(order_count)
}

/// The half-open UTC interval `[start of month, start of next month)`.
///
/// Returns `None` for an out-of-range month number.
pub fn month_bounds(year: i32, month: u32) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
    let start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).single()?;
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let end = Utc.with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0).single()?;
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn employee(salary: Decimal) -> Employee {
        Employee {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            name: "staff".to_string(),
            salary,
            position: None,
            joined_at: Utc::now(),
        }
    }

    fn expense(amount: Decimal) -> Expense {
        Expense {
            id: Uuid::new_v4(),
            owner: Uuid::new_v4(),
            kind: "rent".to_string(),
            amount,
            effective_date: Utc::now(),
        }
    }

    #[test]
    fn spreads_salaries_and_expenses_across_orders() {
        // 2 employees (1000 + 2000) and one 500 expense over 5 orders.
        let employees = vec![employee(dec!(1000)), employee(dec!(2000))];
        let expenses = vec![expense(dec!(500))];
        assert_eq!(overhead_per_order(5, &employees, &expenses), dec!(700));
    }

    #[test]
    fn zero_orders_yields_zero_not_a_division_artifact() {
        let employees = vec![employee(dec!(9000))];
        let expenses = vec![expense(dec!(1234))];
        assert_eq!(overhead_per_order(0, &employees, &expenses), Decimal::ZERO);
    }

    #[test]
    fn empty_overhead_records_yield_zero() {
        assert_eq!(overhead_per_order(10, &[], &[]), Decimal::ZERO);
    }

    #[test]
    fn month_bounds_are_half_open() {
        let (start, end) = month_bounds(2024, 1).unwrap();
        assert_eq!(start.day(), 1);
        assert_eq!(end.month(), 2);
        assert!(start < end);
    }

    #[test]
    fn month_bounds_wrap_december() {
        let (start, end) = month_bounds(2024, 12).unwrap();
        assert_eq!(start.year(), 2024);
        assert_eq!(end.year(), 2025);
        assert_eq!(end.month(), 1);
    }

    #[test]
    fn month_bounds_reject_invalid_months() {
        assert!(month_bounds(2024, 0).is_none());
        assert!(month_bounds(2024, 13).is_none());
    }
}
