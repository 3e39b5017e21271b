//! Shift-handover metrics: locate the shift's metrics row, check its order
//! totals against the goal, reconcile released and received trips against
//! their SLA, and compose everything into one report payload.

pub mod aggregator;
pub mod composer;
pub mod config;
pub mod error;
pub mod loader;
pub mod locator;
pub mod lookups;
pub mod output;
pub mod pipeline;
pub mod reconciler;
pub mod source;
pub mod types;
pub mod util;
