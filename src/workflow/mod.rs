//! Webhook workflow
//!
//! Classification, stage tracking and the three phase handlers driven by
//! [`WebhookProcessor`].

pub mod classify;
mod deliverable;
mod inquiry;
pub mod markers;
mod processor;
pub mod render;
pub mod stage;
mod testing;
pub mod verdict;

pub use classify::classify;
pub use processor::WebhookProcessor;
pub use stage::{current_stage, has_override, StageTracker};
pub use testing::Completion;
pub use verdict::{compute_verdict, COVERAGE_THRESHOLD, PASS_THRESHOLD};
