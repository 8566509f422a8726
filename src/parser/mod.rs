pub mod criteria;
pub mod issue_key;
pub mod response;

pub use criteria::{extract_requirements, CriteriaRequirements};
pub use issue_key::{KeyExtractor, KeySource};
pub use response::extract_json_object;
