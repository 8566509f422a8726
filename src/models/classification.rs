use serde::{Deserialize, Serialize};

/// Why an event was classified as not actionable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    UnsupportedEvent,
    MissingIssue,
    UnsupportedIssueType,
    NoStatusChange,
    NotCriteriaIssue,
    StatusNotActionable,
    AlreadyProcessed,
}

impl IgnoreReason {
    pub fn describe(&self) -> &'static str {
        match self {
            IgnoreReason::UnsupportedEvent => "event type is not created/updated",
            IgnoreReason::MissingIssue => "event carries no keyed issue",
            IgnoreReason::UnsupportedIssueType => "issue type is not Story or Task",
            IgnoreReason::NoStatusChange => "update carries no status change",
            IgnoreReason::NotCriteriaIssue => "only criteria issues react to updates",
            IgnoreReason::StatusNotActionable => "status is not actionable",
            IgnoreReason::AlreadyProcessed => "issue already carries automation markers",
        }
    }
}

/// Processing intent for one webhook event; recomputed on every delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    /// Human-authored issue that needs requirements analysis
    InitialInquiry,
    /// Criteria issue moved to a ready status: generate the implementation
    DeliverableCriteria,
    /// Criteria issue moved to the testing status: evaluate the implementation
    TestingCriteria,
    Ignore(IgnoreReason),
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::InitialInquiry => "initial_inquiry",
            Classification::DeliverableCriteria => "deliverable_criteria",
            Classification::TestingCriteria => "testing_criteria",
            Classification::Ignore(_) => "ignore",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Classification::Ignore(reason) => write!(f, "ignore ({})", reason.describe()),
            other => f.write_str(other.as_str()),
        }
    }
}

impl Serialize for Classification {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
