//! Prompt templates for the three model calls
//!
//! Each prompt asks for a single JSON object in a ```json fence; the reply is
//! validated against the matching [`super::schema::ResponseSchema`].

use crate::models::{ImplementationArtifact, Issue};
use crate::parser::CriteriaRequirements;
use crate::store::FileMap;

/// Maximum characters of one implementation file embedded in the evaluation prompt
pub const FILE_EXCERPT_LIMIT: usize = 8_000;

fn bullets(items: &[String]) -> String {
    if items.is_empty() {
        return "- (none specified)".to_string();
    }
    items
        .iter()
        .map(|i| format!("- {}", i))
        .collect::<Vec<_>>()
        .join("\n")
}

fn criteria_block(requirements: &CriteriaRequirements) -> String {
    requirements
        .sections()
        .iter()
        .map(|(heading, items)| format!("### {}\n{}", heading, bullets(items)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn excerpt(content: &str) -> String {
    if content.chars().count() <= FILE_EXCERPT_LIMIT {
        return content.to_string();
    }
    let head: String = content.chars().take(FILE_EXCERPT_LIMIT).collect();
    format!("{}\n... [truncated]", head)
}

/// Requirements analysis of a human-authored issue
pub fn analysis_prompt(issue: &Issue) -> String {
    format!(
        r#"## Issue
Key: {key}
Type: {issue_type}
Summary: {summary}

## Description
{description}

## Task
Analyze this issue and produce structured delivery requirements.

## Output
Reply with exactly one JSON object in a ```json fence:
```json
{{
  "functional_requirements": ["..."],
  "technical_requirements": ["..."],
  "quality_requirements": ["..."],
  "acceptance_criteria": ["..."],
  "definition_of_done": ["..."],
  "test_scenarios": {{
    "unit": ["..."],
    "integration": ["..."],
    "edge_cases": ["..."],
    "performance": ["..."]
  }},
  "technical_approach": "...",
  "effort": {{"story_points": 3, "hours": 6, "complexity": "Low|Medium|High"}}
}}
```
"#,
        key = issue.key,
        issue_type = issue.issue_type().map(|t| t.name()).unwrap_or("Unknown"),
        summary = issue.summary(),
        description = issue.description(),
    )
}

/// Deliverable generation for a criteria issue
pub fn implementation_prompt(
    criteria: &Issue,
    original_key: &str,
    requirements: &CriteriaRequirements,
) -> String {
    format!(
        r#"## Criteria Issue
Key: {criteria_key}
Original Issue: {original_key}
Summary: {summary}

## Delivery Criteria
{criteria}

## Task
Produce the deliverable that satisfies every criterion above. Choose the
deliverable type that fits the work: code, documentation, analysis, process
or other. Include tests for code.

## Output
Reply with exactly one JSON object in a ```json fence:
```json
{{
  "deliverable_type": "code|documentation|analysis|process|other",
  "language": "python",
  "summary": "...",
  "primary_content": "...",
  "supporting_files": [{{"name": "tests/test_main.py", "content": "..."}}],
  "validation_tests": ["..."],
  "documentation": "...",
  "usage_instructions": ["..."],
  "validation": {{
    "requirements_met": ["..."],
    "requirements_pending": ["..."],
    "confidence": 0.9
  }}
}}
```
"#,
        criteria_key = criteria.key,
        original_key = original_key,
        summary = criteria.summary(),
        criteria = criteria_block(requirements),
    )
}

/// Grading of a stored implementation against the criteria rubric
pub fn evaluation_prompt(
    criteria: &Issue,
    original_key: &str,
    requirements: &CriteriaRequirements,
    artifact: &ImplementationArtifact,
    files: &FileMap,
) -> String {
    let embedded = files
        .iter()
        .map(|(name, content)| format!("### {}\n```\n{}\n```", name, excerpt(content)))
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"## Criteria Issue
Key: {criteria_key}
Original Issue: {original_key}
Summary: {summary}

## Rubric
{criteria}

## Deliverable
Type: {deliverable_type}
Summary: {deliverable_summary}

## Files
{embedded}

## Task
Grade the files above against the rubric. Score each category from 0 to 25.
List every problem with a severity (CRITICAL, HIGH, MEDIUM, LOW) and a
category (FUNCTIONAL, TECHNICAL, USABILITY, DOCUMENTATION). Judge the actual
file contents, not the summary.

## Output
Reply with exactly one JSON object in a ```json fence:
```json
{{
  "scores": {{
    "requirements_coverage": 0,
    "technical_quality": 0,
    "usability": 0,
    "documentation": 0
  }},
  "issues": [
    {{"severity": "HIGH", "category": "FUNCTIONAL", "description": "...", "recommendation": "..."}}
  ],
  "ready_for_deployment": false,
  "narrative": "...",
  "usage_instructions": ["..."]
}}
```
"#,
        criteria_key = criteria.key,
        original_key = original_key,
        summary = criteria.summary(),
        criteria = criteria_block(requirements),
        deliverable_type = artifact.result.deliverable_type,
        deliverable_summary = artifact.result.summary,
        embedded = embedded,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IssueType;

    #[test]
    fn test_analysis_prompt_includes_issue() {
        let issue = Issue::new("ABC-1", IssueType::Story, "To Do", "Export CSV", "Users want CSV");
        let prompt = analysis_prompt(&issue);
        assert!(prompt.contains("Key: ABC-1"));
        assert!(prompt.contains("Type: Story"));
        assert!(prompt.contains("Users want CSV"));
        assert!(prompt.contains("\"effort\""));
    }

    #[test]
    fn test_excerpt_caps_long_files() {
        let long = "x".repeat(FILE_EXCERPT_LIMIT + 10);
        let cut = excerpt(&long);
        assert!(cut.ends_with("[truncated]"));
        assert_eq!(excerpt("short"), "short");
    }

    #[test]
    fn test_criteria_block_marks_empty_sections() {
        let requirements = CriteriaRequirements {
            functional: vec!["Export all rows".to_string()],
            ..CriteriaRequirements::default()
        };
        let block = criteria_block(&requirements);
        assert!(block.contains("### Functional Requirements\n- Export all rows"));
        assert!(block.contains("### Validation Tests\n- (none specified)"));
    }
}
