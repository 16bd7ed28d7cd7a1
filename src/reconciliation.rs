//! Reconciliation engine.
//!
//! Compares the declared invoice total against the sum of the line totals and
//! builds the line-item table shown next to the verdict. Pure computation.

use bigdecimal::BigDecimal;
use std::cmp::max;

use crate::normalizer::{CanonicalInvoiceRecord, LineItem};

/// Allowed discrepancy, in percent of the larger of the two compared magnitudes.
pub const TOLERANCE_PERCENT: u32 = 1;

pub const SUBTOTAL_LABEL: &str = "Subtotal";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    Validated,
    Mismatch,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationResult {
    pub line_total_sum: BigDecimal,
    pub status: ValidationStatus,
    pub table: Vec<TableRow>,
}

impl ReconciliationResult {
    pub fn is_validated(&self) -> bool {
        self.status == ValidationStatus::Validated
    }

    /// Line items only, excluding the synthetic subtotal row.
    pub fn line_rows(&self) -> impl Iterator<Item = &TableRow> {
        self.table.iter().filter(|row| !row.is_subtotal())
    }
}

/// One row of the line-item table. `index` is `None` for the subtotal row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub index: Option<usize>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<String>,
    pub total: BigDecimal,
}

impl TableRow {
    fn from_line_item(item: &LineItem) -> Self {
        Self {
            index: Some(item.index),
            date: item.date.clone(),
            description: item.description.clone(),
            quantity: item.quantity.clone(),
            total: item.total.clone(),
        }
    }

    fn subtotal(sum: &BigDecimal) -> Self {
        Self {
            index: None,
            date: None,
            description: Some(SUBTOTAL_LABEL.to_string()),
            quantity: None,
            total: sum.clone(),
        }
    }

    pub fn is_subtotal(&self) -> bool {
        self.index.is_none()
    }
}

pub fn reconcile(record: &CanonicalInvoiceRecord) -> ReconciliationResult {
    let line_total_sum = sum_line_totals(&record.line_items);
    let status = classify(&record.invoice_total, &line_total_sum);

    let mut table: Vec<TableRow> = record
        .line_items
        .iter()
        .map(TableRow::from_line_item)
        .collect();
    if !table.is_empty() {
        table.push(TableRow::subtotal(&line_total_sum));
    }

    ReconciliationResult {
        line_total_sum,
        status,
        table,
    }
}

pub fn sum_line_totals(items: &[LineItem]) -> BigDecimal {
    items
        .iter()
        .fold(BigDecimal::from(0), |acc, item| acc + &item.total)
}

/// Validated iff `|declared - computed| <= 1% * max(|declared|, |computed|)`.
///
/// Both sides zero counts as validated.
pub fn classify(declared: &BigDecimal, computed: &BigDecimal) -> ValidationStatus {
    let difference = (declared - computed).abs();
    let larger = max(declared.abs(), computed.abs());

    if difference * BigDecimal::from(100) <= larger * BigDecimal::from(TOLERANCE_PERCENT) {
        ValidationStatus::Validated
    } else {
        ValidationStatus::Mismatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalizer::TokensUsed;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn record_with(invoice_total: &str, totals: &[&str]) -> CanonicalInvoiceRecord {
        CanonicalInvoiceRecord {
            prompt_version: "N/A".to_string(),
            tokens_used: TokensUsed::NotAvailable,
            cost_incurred: BigDecimal::from(0),
            invoice_number: "N/A".to_string(),
            accrual_date: "N/A".to_string(),
            due_date: "N/A".to_string(),
            service_locations: Vec::new(),
            line_items: totals
                .iter()
                .enumerate()
                .map(|(i, total)| LineItem {
                    index: i + 1,
                    date: None,
                    description: Some(format!("Item {}", i + 1)),
                    quantity: None,
                    total: dec(total),
                })
                .collect(),
            invoice_total: dec(invoice_total),
        }
    }

    #[test]
    fn test_tolerance_boundary() {
        assert_eq!(classify(&dec("100.00"), &dec("100.99")), ValidationStatus::Validated);
        assert_eq!(classify(&dec("100.00"), &dec("99.00")), ValidationStatus::Validated);
        assert_eq!(classify(&dec("100.00"), &dec("101.02")), ValidationStatus::Mismatch);
        assert_eq!(classify(&dec("100.00"), &dec("98.99")), ValidationStatus::Mismatch);
    }

    #[test]
    fn test_tolerance_uses_larger_magnitude() {
        // 1.01 <= 1% of 101.01
        assert_eq!(classify(&dec("100.00"), &dec("101.01")), ValidationStatus::Validated);
        assert_eq!(classify(&dec("101.01"), &dec("100.00")), ValidationStatus::Validated);
    }

    #[test]
    fn test_zero_against_zero_is_validated() {
        assert_eq!(classify(&dec("0"), &dec("0")), ValidationStatus::Validated);
        assert_eq!(classify(&dec("0"), &dec("0.01")), ValidationStatus::Mismatch);
    }

    #[test]
    fn test_subtotal_row_appended() {
        let result = reconcile(&record_with("35.01", &["10.00", "20.005", "5"]));

        assert_eq!(result.line_total_sum, dec("35.005"));
        assert_eq!(result.table.len(), 4);
        let subtotal = result.table.last().unwrap();
        assert!(subtotal.is_subtotal());
        assert_eq!(subtotal.description.as_deref(), Some(SUBTOTAL_LABEL));
        assert_eq!(subtotal.total, dec("35.005"));
        assert_eq!(result.line_rows().count(), 3);
        assert!(result.is_validated());
    }

    #[test]
    fn test_zero_line_items() {
        let result = reconcile(&record_with("250.00", &[]));
        assert_eq!(result.line_total_sum, BigDecimal::from(0));
        assert!(result.table.is_empty());
        assert_eq!(result.status, ValidationStatus::Mismatch);
    }

    #[test]
    fn test_rows_keep_payload_order() {
        let result = reconcile(&record_with("6", &["3", "1", "2"]));
        let indices: Vec<_> = result.line_rows().map(|r| r.index).collect();
        assert_eq!(indices, vec![Some(1), Some(2), Some(3)]);
        assert_eq!(result.table[0].total, dec("3"));
    }

    #[test]
    fn test_negative_credit_lines_are_summed() {
        let result = reconcile(&record_with("90.00", &["100.00", "-10.00"]));
        assert_eq!(result.line_total_sum, dec("90"));
        assert!(result.is_validated());
    }
}
