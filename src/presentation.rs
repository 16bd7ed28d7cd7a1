use bigdecimal::{BigDecimal, RoundingMode};
use serde::Serialize;
use serde_json::Value;

use crate::normalizer::{CanonicalInvoiceRecord, TokensUsed};
use crate::reconciliation::{ReconciliationResult, TableRow};

/// Everything the display layer needs for one analyzed invoice.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresentationState {
    pub header: InvoiceHeader,
    pub kpis: Kpis,
    pub table: Vec<DisplayRow>,
    /// `None` when there are no line items to validate.
    pub validation_badge: Option<String>,
    /// Upstream payload, verbatim.
    pub raw_payload: Value,
}

/// Substituted for the whole [`PresentationState`] when a request fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorState {
    pub error_message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceHeader {
    pub invoice_number: String,
    pub invoice_total: String,
    pub accrual_date: String,
    pub due_date: String,
    pub locations: Vec<LocationDisplay>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LocationDisplay {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Kpis {
    pub prompt_version: String,
    pub tokens_used: TokensUsed,
    pub cost: String,
    pub line_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRow {
    /// `None` on the subtotal row.
    pub index: Option<usize>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<String>,
    pub total_display: String,
}

impl PresentationState {
    pub fn assemble(
        record: &CanonicalInvoiceRecord,
        result: &ReconciliationResult,
        raw_payload: Value,
    ) -> Self {
        let header = InvoiceHeader {
            invoice_number: record.invoice_number.clone(),
            invoice_total: format_currency(&record.invoice_total),
            accrual_date: record.accrual_date.clone(),
            due_date: record.due_date.clone(),
            locations: record
                .service_locations
                .iter()
                .map(|loc| LocationDisplay {
                    name: loc.name.clone(),
                    address: loc.address.clone(),
                })
                .collect(),
        };

        let kpis = Kpis {
            prompt_version: record.prompt_version.clone(),
            tokens_used: record.tokens_used.clone(),
            cost: format_cost(&record.cost_incurred),
            line_count: record.line_items.len(),
        };

        Self {
            header,
            kpis,
            table: result.table.iter().map(DisplayRow::from).collect(),
            validation_badge: validation_badge(result),
            raw_payload,
        }
    }
}

impl From<&TableRow> for DisplayRow {
    fn from(row: &TableRow) -> Self {
        Self {
            index: row.index,
            date: row.date.clone(),
            description: row.description.clone(),
            quantity: row.quantity.clone(),
            total_display: format_currency(&row.total),
        }
    }
}

fn validation_badge(result: &ReconciliationResult) -> Option<String> {
    result.line_rows().next()?;
    if result.is_validated() {
        Some("VALIDATED".to_string())
    } else {
        Some(format!("MISMATCH ({})", format_currency(&result.line_total_sum)))
    }
}

/// `$1,234.50`: two decimals, half-up, thousands grouping.
pub fn format_currency(amount: &BigDecimal) -> String {
    format_dollars(amount, 2, true)
}

/// `$0.0412`: four decimals, no grouping. Used for the extraction cost KPI.
pub fn format_cost(amount: &BigDecimal) -> String {
    format_dollars(amount, 4, false)
}

fn format_dollars(amount: &BigDecimal, decimals: u32, grouped: bool) -> String {
    let (digits, _) = amount
        .with_scale_round(decimals as i64, RoundingMode::HalfUp)
        .as_bigint_and_exponent();
    let digits = digits.to_string();
    let (negative, digits) = match digits.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, digits.as_str()),
    };

    let decimals = decimals as usize;
    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (whole, fraction) = padded.split_at(padded.len() - decimals);
    let whole = if grouped {
        group_thousands(whole)
    } else {
        whole.to_string()
    };

    let sign = if negative { "-" } else { "" };
    if fraction.is_empty() {
        format!("{}${}", sign, whole)
    } else {
        format!("{}${}.{}", sign, whole, fraction)
    }
}

fn group_thousands(whole: &str) -> String {
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}
