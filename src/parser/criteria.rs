//! Requirement sections of a criteria issue description

use pulldown_cmark::{Event, HeadingLevel, Parser, Tag, TagEnd};
use serde::{Deserialize, Serialize};

pub const FUNCTIONAL_HEADING: &str = "Functional Requirements";
pub const TECHNICAL_HEADING: &str = "Technical Requirements";
pub const ACCEPTANCE_HEADING: &str = "Acceptance Criteria";
pub const DONE_HEADING: &str = "Definition of Done";
pub const VALIDATION_HEADING: &str = "Validation Tests";

/// Structured requirement lists read back from a criteria issue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriteriaRequirements {
    pub functional: Vec<String>,
    pub technical: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    pub definition_of_done: Vec<String>,
    pub validation_tests: Vec<String>,
}

impl CriteriaRequirements {
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn total(&self) -> usize {
        self.functional.len()
            + self.technical.len()
            + self.acceptance_criteria.len()
            + self.definition_of_done.len()
            + self.validation_tests.len()
    }

    /// Sections in rendering order, paired with their headings
    pub fn sections(&self) -> [(&'static str, &[String]); 5] {
        [
            (FUNCTIONAL_HEADING, &self.functional),
            (TECHNICAL_HEADING, &self.technical),
            (ACCEPTANCE_HEADING, &self.acceptance_criteria),
            (DONE_HEADING, &self.definition_of_done),
            (VALIDATION_HEADING, &self.validation_tests),
        ]
    }

    fn slot(&mut self, heading: &str) -> Option<&mut Vec<String>> {
        let heading = heading.to_lowercase();
        let matches = |name: &str| heading.contains(&name.to_lowercase());
        if matches(FUNCTIONAL_HEADING) {
            Some(&mut self.functional)
        } else if matches(TECHNICAL_HEADING) {
            Some(&mut self.technical)
        } else if matches(ACCEPTANCE_HEADING) {
            Some(&mut self.acceptance_criteria)
        } else if matches(DONE_HEADING) {
            Some(&mut self.definition_of_done)
        } else if matches(VALIDATION_HEADING) {
            Some(&mut self.validation_tests)
        } else {
            None
        }
    }
}

/// Extract the bulleted lists under each known heading
///
/// A known heading owns every list item until the next heading of the same or
/// a higher level, so nested sub-headings (e.g. "Unit Tests" under
/// "Validation Tests") stay inside it. Missing sections yield empty lists.
pub fn extract_requirements(description: &str) -> CriteriaRequirements {
    let mut requirements = CriteriaRequirements::default();

    // (heading text, level) of the section currently collecting items
    let mut active: Option<(String, HeadingLevel)> = None;
    let mut heading_text: Option<(String, HeadingLevel)> = None;
    // Open list items; nested items are collected separately
    let mut items: Vec<String> = Vec::new();

    for event in Parser::new(description) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                heading_text = Some((String::new(), level));
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((text, level)) = heading_text.take() {
                    let ends_active = active
                        .as_ref()
                        .map(|(_, active_level)| level <= *active_level)
                        .unwrap_or(true);
                    if requirements.slot(&text).is_some() {
                        active = Some((text, level));
                    } else if ends_active {
                        active = None;
                    }
                }
            }
            Event::Start(Tag::Item) => items.push(String::new()),
            Event::End(TagEnd::Item) => {
                if let Some(item) = items.pop() {
                    let item = item.split_whitespace().collect::<Vec<_>>().join(" ");
                    if let (false, Some((section, _))) = (item.is_empty(), &active) {
                        if let Some(slot) = requirements.slot(section) {
                            slot.push(item);
                        }
                    }
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((heading, _)) = heading_text.as_mut() {
                    heading.push_str(&text);
                } else if let Some(item) = items.last_mut() {
                    item.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some(item) = items.last_mut() {
                    item.push(' ');
                }
            }
            _ => {}
        }
    }

    requirements
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTION: &str = r#"# Deliverable Criteria for PCP1-67

**Original Issue:** PCP1-67

## Functional Requirements
- Users can reset their password
- Reset links expire after **24 hours**

## Technical Requirements
* Use the existing `mailer` service

## Acceptance Criteria
1. Email is sent within a minute

## Definition of Done
- Code reviewed

## Validation Tests
### Unit Tests
- token generation is unique
### Integration Tests
- end-to-end reset flow

## Estimated Effort
- 5 story points
"#;

    #[test]
    fn test_extracts_all_sections() {
        let req = extract_requirements(DESCRIPTION);
        assert_eq!(
            req.functional,
            vec![
                "Users can reset their password".to_string(),
                "Reset links expire after 24 hours".to_string()
            ]
        );
        assert_eq!(req.technical, vec!["Use the existing mailer service".to_string()]);
        assert_eq!(req.acceptance_criteria, vec!["Email is sent within a minute".to_string()]);
        assert_eq!(req.definition_of_done, vec!["Code reviewed".to_string()]);
        assert_eq!(
            req.validation_tests,
            vec![
                "token generation is unique".to_string(),
                "end-to-end reset flow".to_string()
            ]
        );
        assert_eq!(req.total(), 7);
    }

    #[test]
    fn test_unknown_section_ends_collection() {
        let req = extract_requirements(DESCRIPTION);
        assert!(!req.definition_of_done.iter().any(|i| i.contains("story points")));
        assert!(!req.validation_tests.iter().any(|i| i.contains("story points")));
    }

    #[test]
    fn test_missing_sections_are_empty() {
        let req = extract_requirements("## Functional Requirements\n- Only one\n");
        assert_eq!(req.functional.len(), 1);
        assert!(req.technical.is_empty());
        assert!(req.validation_tests.is_empty());

        let req = extract_requirements("");
        assert!(req.is_empty());
    }
}
