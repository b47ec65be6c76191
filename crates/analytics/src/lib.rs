//! # Analytics Engine
//!
//! This crate derives the service's revenue and churn analytics from a
//! snapshot of the account base.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** This is a pure logic crate. It has no knowledge of
//!   external systems. It depends only on `core-types` (Layer 0).
//! - **Stateless Calculation:** The `AnalyticsEngine` is a stateless
//!   calculator. It takes accounts as input and produces report structs as
//!   output; every method is total over valid input. This makes it highly
//!   reliable and easy to test.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: the scoring and aggregation logic.
//! - `RevenueMetrics`, `CohortReport`, `ChurnPrediction`, `RiskAlert`: the
//!   standardized report structs returned to the HTTP layer.

// Declare the modules that constitute this crate.
pub mod engine;
pub mod report;

// Re-export the key components to create a clean, public-facing API.
pub use engine::{AnalyticsEngine, RECOMMENDED_ACTION};
pub use report::{ChurnPrediction, CohortReport, RevenueMetrics, RiskAlert};
