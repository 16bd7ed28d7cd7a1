//! Runs normalization and reconciliation over a saved extraction response.
//!
//! Usage: reconcile_payload <response.json>
use anyhow::Context;
use invoice_intel_api::pipeline::present_payload;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let path = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("usage: reconcile_payload <response.json>"))?;

    let text =
        std::fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path))?;
    let raw: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("{} is not valid JSON", path))?;

    let state = present_payload(raw).map_err(|e| anyhow::anyhow!("{}", e))?;
    println!("{}", serde_json::to_string_pretty(&state)?);

    Ok(())
}
