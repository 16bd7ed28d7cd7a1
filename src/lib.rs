//! Invoice Intelligence API Library
//!
//! Sends an uploaded invoice to an external extraction service and turns the
//! service's JSON answer into a reconciled, display-ready summary.
//!
//! # Modules
//!
//! - `api`: HTTP-facing components.
//! - `core`: Pure reconciliation pipeline stages.
//! - `integrations`: External service integrations.
//! - `config`: Configuration management.
//! - `errors`: Error handling types.
//! - `extraction_client`: Extraction webhook client.
//! - `extraction_models`: Extraction response payload models.
//! - `handlers`: HTTP request handlers.
//! - `normalizer`: Raw payload to canonical invoice record.
//! - `pipeline`: Per-request orchestration and its immutable context.
//! - `presentation`: Presentation state and currency formatting.
//! - `reconciliation`: Line-sum computation and tolerance check.
//! - `routes`: Router assembly.

pub mod api;
pub mod core;
pub mod integrations;

pub mod config;
pub mod errors;
pub mod extraction_client;
pub mod extraction_models;
pub mod handlers;
pub mod normalizer;
pub mod pipeline;
pub mod presentation;
pub mod reconciliation;
pub mod routes;
