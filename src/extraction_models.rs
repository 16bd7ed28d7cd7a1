use serde::Deserialize;

/// Extraction service response envelope: `{ "message": { "content": {...} } }`.
///
/// Every level is optional. A missing or `null` object decodes as `None` and
/// is treated by the normalizer exactly like an empty object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionEnvelope {
    pub message: Option<ExtractionMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionMessage {
    pub content: Option<ExtractionContent>,
}

/// Extracted invoice facts plus the extraction run's own bookkeeping.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractionContent {
    #[serde(rename = "Prompt_Version")]
    pub prompt_version: Option<Scalar>,

    #[serde(rename = "NoOfTokensUsed")]
    pub tokens_used: Option<Scalar>,

    /// Cost of the extraction run, possibly comma-formatted
    #[serde(rename = "GPTCostIncurred")]
    pub cost_incurred: Option<Scalar>,

    pub invoice_number: Option<Scalar>,
    pub invoice_total: Option<Scalar>,
    pub accrual_date: Option<Scalar>,
    pub due_date: Option<Scalar>,
    pub service_locations: Option<Vec<RawServiceLocation>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawServiceLocation {
    pub location_name: Option<Scalar>,
    pub address: Option<RawAddress>,
    pub line_items: Option<Vec<RawLineItem>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAddress {
    pub street: Option<Scalar>,
    pub city: Option<Scalar>,
    pub state: Option<Scalar>,
    pub zip: Option<Scalar>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawLineItem {
    pub date: Option<Scalar>,
    pub description: Option<Scalar>,
    pub quantity: Option<Scalar>,
    pub total: Option<Scalar>,
}

/// A leaf value as the extraction service sends it: the same field may arrive
/// as `1234.5`, `"1234.50"` or `"1,234.50"` depending on the document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Number(serde_json::Number),
    Text(String),
    Flag(bool),
}

impl Scalar {
    /// Stringified form, used both for display text and as the input of
    /// amount parsing.
    pub fn to_text(&self) -> String {
        match self {
            Scalar::Number(n) => n.to_string(),
            Scalar::Text(s) => s.clone(),
            Scalar::Flag(b) => b.to_string(),
        }
    }
}
