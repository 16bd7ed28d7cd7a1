//! Response normalizer.
//!
//! Turns the extraction service's loosely-typed JSON into a
//! [`CanonicalInvoiceRecord`]. Absent fields get defaults; present but
//! unparsable amounts are rejected.

use bigdecimal::BigDecimal;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use crate::errors::AppError;
use crate::extraction_models::{
    ExtractionContent, ExtractionEnvelope, RawAddress, RawLineItem, RawServiceLocation, Scalar,
};

pub const NOT_AVAILABLE: &str = "N/A";
pub const ADDRESS_NOT_FOUND: &str = "Address not found";

/// Fully-typed, defaulted, separator-normalized view of one extraction response.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalInvoiceRecord {
    pub prompt_version: String,
    pub tokens_used: TokensUsed,
    pub cost_incurred: BigDecimal,
    pub invoice_number: String,
    pub accrual_date: String,
    pub due_date: String,
    pub service_locations: Vec<ServiceLocation>,
    /// Line items of the first service location only.
    pub line_items: Vec<LineItem>,
    pub invoice_total: BigDecimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLocation {
    pub name: String,
    pub address: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    /// 1-based position in the payload.
    pub index: usize,
    pub date: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<String>,
    pub total: BigDecimal,
}

/// Token count reported by the extraction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokensUsed {
    Count(u64),
    /// Reported, but not as a whole number; shown verbatim.
    Reported(String),
    NotAvailable,
}

impl fmt::Display for TokensUsed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokensUsed::Count(n) => write!(f, "{}", n),
            TokensUsed::Reported(text) => write!(f, "{}", text),
            TokensUsed::NotAvailable => write!(f, "{}", NOT_AVAILABLE),
        }
    }
}

impl serde::Serialize for TokensUsed {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            TokensUsed::Count(n) => serializer.serialize_u64(*n),
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

/// Normalizes a raw extraction response.
///
/// Never fails because a key is missing. Fails with
/// [`AppError::ResponseParse`] when the payload has the wrong structure
/// (e.g. `line_items` is not an array) or an amount is not a number.
pub fn normalize(raw: &Value) -> Result<CanonicalInvoiceRecord, AppError> {
    let envelope = ExtractionEnvelope::deserialize(raw)
        .map_err(|e| AppError::ResponseParse(format!("unexpected payload shape: {}", e)))?;
    let content = envelope
        .message
        .and_then(|m| m.content)
        .unwrap_or_default();

    normalize_content(content)
}

fn normalize_content(content: ExtractionContent) -> Result<CanonicalInvoiceRecord, AppError> {
    let locations = content.service_locations.unwrap_or_default();

    let line_items = match locations.first() {
        Some(first) => normalize_line_items(first)?,
        None => Vec::new(),
    };
    if locations.len() > 1 {
        tracing::debug!(
            "Payload has {} service locations; only the first location's line items are reconciled",
            locations.len()
        );
    }

    Ok(CanonicalInvoiceRecord {
        prompt_version: text_or_na(content.prompt_version.as_ref()),
        tokens_used: tokens_used(content.tokens_used.as_ref()),
        cost_incurred: amount_or_zero("GPTCostIncurred", content.cost_incurred.as_ref())?,
        invoice_number: text_or_na(content.invoice_number.as_ref()),
        accrual_date: text_or_na(content.accrual_date.as_ref()),
        due_date: text_or_na(content.due_date.as_ref()),
        service_locations: locations.iter().map(service_location).collect(),
        line_items,
        invoice_total: amount_or_zero("invoice_total", content.invoice_total.as_ref())?,
    })
}

fn normalize_line_items(location: &RawServiceLocation) -> Result<Vec<LineItem>, AppError> {
    location
        .line_items
        .as_deref()
        .unwrap_or_default()
        .iter()
        .enumerate()
        .map(|(position, item)| line_item(position + 1, item))
        .collect()
}

fn line_item(index: usize, raw: &RawLineItem) -> Result<LineItem, AppError> {
    Ok(LineItem {
        index,
        date: raw.date.as_ref().map(Scalar::to_text),
        description: raw.description.as_ref().map(Scalar::to_text),
        quantity: raw.quantity.as_ref().map(Scalar::to_text),
        total: amount_or_zero(&format!("line_items[{}].total", index), raw.total.as_ref())?,
    })
}

fn service_location(raw: &RawServiceLocation) -> ServiceLocation {
    ServiceLocation {
        name: text_or_na(raw.location_name.as_ref()),
        address: assemble_address(raw.address.as_ref()),
    }
}

/// Builds `"<street> <city>, <state> <zip>"`, dropping empty parts and the
/// separators they would leave behind.
pub fn assemble_address(address: Option<&RawAddress>) -> String {
    let Some(address) = address else {
        return ADDRESS_NOT_FOUND.to_string();
    };

    let part = |value: &Option<Scalar>| {
        value
            .as_ref()
            .map(|v| v.to_text().trim().to_string())
            .unwrap_or_default()
    };
    let join = |parts: [String; 2]| {
        parts
            .into_iter()
            .filter(|p| !p.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    };

    let locality = join([part(&address.street), part(&address.city)]);
    let region = join([part(&address.state), part(&address.zip)]);

    let full = [locality, region]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
    let full = full.trim_matches(|c: char| c == ',' || c.is_whitespace());

    if full.is_empty() {
        ADDRESS_NOT_FOUND.to_string()
    } else {
        full.to_string()
    }
}

/// Plain decimal numerals only. Exponent notation is rejected so an upstream
/// value such as `1e2000000` cannot expand into millions of digits.
fn amount_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[+-]?(\d+(\.\d*)?|\.\d+)$").expect("amount pattern is valid")
    })
}

/// Parses a possibly comma-grouped amount: stringify, drop every `,`, parse.
pub fn parse_amount(raw: &Scalar) -> Result<BigDecimal, String> {
    let text = raw.to_text();
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim();
    if !amount_pattern().is_match(cleaned) {
        return Err(format!("{:?} is not a plain decimal number", text));
    }
    BigDecimal::from_str(cleaned).map_err(|_| format!("{:?} is not a number", text))
}

/// Absent amounts are zero; present ones must parse.
fn amount_or_zero(field: &str, raw: Option<&Scalar>) -> Result<BigDecimal, AppError> {
    match raw {
        None => Ok(BigDecimal::from(0)),
        Some(value) => parse_amount(value)
            .map_err(|reason| AppError::ResponseParse(format!("field `{}`: {}", field, reason))),
    }
}

fn text_or_na(raw: Option<&Scalar>) -> String {
    raw.map(Scalar::to_text)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn tokens_used(raw: Option<&Scalar>) -> TokensUsed {
    let Some(value) = raw else {
        return TokensUsed::NotAvailable;
    };
    let text = value.to_text();
    let cleaned: String = text.chars().filter(|c| *c != ',').collect();
    match cleaned.trim().parse::<u64>() {
        Ok(count) => TokensUsed::Count(count),
        Err(_) => TokensUsed::Reported(text),
    }
}
