//! Recovery of the original issue key from a criteria issue

use crate::error::ExtractionError;
use crate::models::Issue;
use regex::Regex;

const GENERIC_PATTERN: &str = r"\b([A-Z]+-\d+)\b";
const PERMISSIVE_PATTERN: &str = r"\b([A-Z][A-Z0-9_]*-\d+)\b";
const ORIGINAL_LINE_PATTERN: &str =
    r"(?i)original\s+issue\s*:?\s*\**\s*:?\s*\[?(?-i:([A-Z][A-Z0-9_]*-\d+))";

/// Where a key was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    /// Key directly after the criteria marker
    MarkerPattern,
    ProjectPattern,
    GenericPattern,
    PermissivePattern,
    DescriptionLine,
}

/// Extracts original issue keys, trying the most specific pattern first
pub struct KeyExtractor {
    marker: Regex,
    project: Option<Regex>,
    generic: Regex,
    permissive: Regex,
    original_line: Regex,
}

impl KeyExtractor {
    /// Build an extractor
    ///
    /// `criteria_marker` anchors the most specific pattern; `project_keys`
    /// feed the project-specific one.
    pub fn new(criteria_marker: &str, project_keys: &[String]) -> Result<Self, regex::Error> {
        let keys: Vec<String> = project_keys
            .iter()
            .map(|k| k.trim())
            .filter(|k| !k.is_empty())
            .map(regex::escape)
            .collect();
        let project = if keys.is_empty() {
            None
        } else {
            Some(Regex::new(&format!(r"\b((?:{})-\d+)\b", keys.join("|")))?)
        };

        let marker = Regex::new(&format!(
            r"{}\s*:?\s*([A-Z][A-Z0-9_]*-\d+)\b",
            regex::escape(criteria_marker.trim())
        ))?;

        Ok(Self {
            marker,
            project,
            generic: Regex::new(GENERIC_PATTERN)?,
            permissive: Regex::new(PERMISSIVE_PATTERN)?,
            original_line: Regex::new(ORIGINAL_LINE_PATTERN)?,
        })
    }

    /// Find the original key in summary, then description
    ///
    /// The criteria issue's own key is never returned.
    pub fn extract_with_source(&self, issue: &Issue) -> Option<(String, KeySource)> {
        let summary = issue.summary();
        let own_key = issue.key.as_str();

        let summary_patterns = [
            (Some(&self.marker), KeySource::MarkerPattern),
            (self.project.as_ref(), KeySource::ProjectPattern),
            (Some(&self.generic), KeySource::GenericPattern),
            (Some(&self.permissive), KeySource::PermissivePattern),
        ];
        for (pattern, source) in summary_patterns {
            let Some(pattern) = pattern else { continue };
            let found = pattern
                .captures_iter(summary)
                .filter_map(|c| c.get(1))
                .map(|m| m.as_str())
                .find(|k| *k != own_key);
            if let Some(key) = found {
                return Some((key.to_string(), source));
            }
        }

        self.original_line
            .captures_iter(issue.description())
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str())
            .find(|k| *k != own_key)
            .map(|k| (k.to_string(), KeySource::DescriptionLine))
    }

    pub fn extract(&self, issue: &Issue) -> Result<String, ExtractionError> {
        self.extract_with_source(issue)
            .map(|(key, _)| key)
            .ok_or_else(|| ExtractionError {
                criteria_key: issue.key.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IssueType;

    const MARKER: &str = "Deliverable Criteria";

    fn criteria(summary: &str, description: &str) -> Issue {
        Issue::new("PCP1-68", IssueType::Task, "Ready for Implementation", summary, description)
    }

    #[test]
    fn test_key_after_marker_wins_over_later_keys() {
        let extractor = KeyExtractor::new(MARKER, &[]).unwrap();
        let issue = criteria("Deliverable Criteria: PCP1-67 - Port fix from WEB-12", "");
        assert_eq!(
            extractor.extract_with_source(&issue),
            Some(("PCP1-67".to_string(), KeySource::MarkerPattern))
        );
    }

    #[test]
    fn test_project_pattern_before_generic() {
        let extractor = KeyExtractor::new(MARKER, &["PCP1".to_string()]).unwrap();
        let issue = criteria("Port WEB-12 to PCP1-67 - Deliverable Criteria", "");
        assert_eq!(
            extractor.extract_with_source(&issue),
            Some(("PCP1-67".to_string(), KeySource::ProjectPattern))
        );
    }

    #[test]
    fn test_generic_then_permissive_pattern() {
        let extractor = KeyExtractor::new(MARKER, &[]).unwrap();
        let issue = criteria("Export CSV for ABC-12 (Deliverable Criteria)", "");
        assert_eq!(
            extractor.extract_with_source(&issue),
            Some(("ABC-12".to_string(), KeySource::GenericPattern))
        );

        let issue = criteria("Export CSV for PCP1-67 (Deliverable Criteria)", "");
        assert_eq!(
            extractor.extract_with_source(&issue),
            Some(("PCP1-67".to_string(), KeySource::PermissivePattern))
        );
    }

    #[test]
    fn test_lowercase_tokens_are_not_keys() {
        let extractor = KeyExtractor::new(MARKER, &[]).unwrap();
        let issue = criteria(
            "Deliverable Criteria: Fix utf-8 decoding",
            "**Original Issue:** ABC-12",
        );
        assert_eq!(
            extractor.extract_with_source(&issue),
            Some(("ABC-12".to_string(), KeySource::DescriptionLine))
        );
    }

    #[test]
    fn test_description_fallback() {
        let extractor = KeyExtractor::new(MARKER, &["PCP1".to_string()]).unwrap();
        let issue = criteria(
            "Deliverable Criteria: Fix login bug",
            "Some intro\n\n**Original Issue:** ABC-12\n\nMore text",
        );
        assert_eq!(
            extractor.extract_with_source(&issue),
            Some(("ABC-12".to_string(), KeySource::DescriptionLine))
        );
    }

    #[test]
    fn test_no_key_fails() {
        let extractor = KeyExtractor::new(MARKER, &[]).unwrap();
        let issue = criteria("Deliverable Criteria: Fix login bug", "No reference here");
        let err = extractor.extract(&issue).unwrap_err();
        assert_eq!(err.criteria_key, "PCP1-68");
    }

    #[test]
    fn test_own_key_is_skipped() {
        let extractor = KeyExtractor::new(MARKER, &[]).unwrap();
        let issue = criteria("PCP1-68 Deliverable Criteria: Fix", "Original Issue: PCP1-67");
        assert_eq!(extractor.extract(&issue).unwrap(), "PCP1-67");
    }
}
