//! JSON Schema contracts for model replies

use crate::error::AdapterError;
use jsonschema::Validator;
use serde_json::Value;

/// Expected shape of a model reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSchema {
    Analysis,
    Implementation,
    Evaluation,
}

const STRING_LIST: &str = r#"{"type": "array", "items": {"type": "string"}}"#;

impl ResponseSchema {
    pub fn name(&self) -> &'static str {
        match self {
            ResponseSchema::Analysis => "analysis",
            ResponseSchema::Implementation => "implementation",
            ResponseSchema::Evaluation => "evaluation",
        }
    }

    fn definition(&self) -> String {
        match self {
            ResponseSchema::Analysis => format!(
                r#"{{
  "type": "object",
  "required": ["functional_requirements", "technical_requirements", "acceptance_criteria", "effort"],
  "properties": {{
    "functional_requirements": {list},
    "technical_requirements": {list},
    "quality_requirements": {list},
    "acceptance_criteria": {list},
    "definition_of_done": {list},
    "test_scenarios": {{
      "type": "object",
      "properties": {{
        "unit": {list},
        "integration": {list},
        "edge_cases": {list},
        "performance": {list}
      }}
    }},
    "technical_approach": {{"type": "string"}},
    "effort": {{
      "type": "object",
      "required": ["story_points", "hours", "complexity"],
      "properties": {{
        "story_points": {{"type": "integer", "minimum": 0}},
        "hours": {{"type": "number", "minimum": 0}},
        "complexity": {{"type": "string"}}
      }}
    }}
  }}
}}"#,
                list = STRING_LIST
            ),
            ResponseSchema::Implementation => format!(
                r#"{{
  "type": "object",
  "required": ["deliverable_type", "summary", "primary_content"],
  "properties": {{
    "deliverable_type": {{"enum": ["code", "documentation", "analysis", "process", "other"]}},
    "language": {{"type": ["string", "null"]}},
    "summary": {{"type": "string", "minLength": 1}},
    "primary_content": {{"type": "string", "minLength": 1}},
    "supporting_files": {{
      "type": "array",
      "items": {{
        "type": "object",
        "required": ["name", "content"],
        "properties": {{
          "name": {{"type": "string", "minLength": 1}},
          "content": {{"type": "string"}}
        }}
      }}
    }},
    "validation_tests": {list},
    "documentation": {{"type": "string"}},
    "usage_instructions": {list},
    "validation": {{
      "type": "object",
      "properties": {{
        "requirements_met": {list},
        "requirements_pending": {list},
        "confidence": {{"type": "number", "minimum": 0, "maximum": 1}}
      }}
    }}
  }}
}}"#,
                list = STRING_LIST
            ),
            ResponseSchema::Evaluation => format!(
                r#"{{
  "type": "object",
  "required": ["scores", "ready_for_deployment"],
  "properties": {{
    "scores": {{
      "type": "object",
      "required": ["requirements_coverage", "technical_quality", "usability", "documentation"],
      "properties": {{
        "requirements_coverage": {{"type": "number"}},
        "technical_quality": {{"type": "number"}},
        "usability": {{"type": "number"}},
        "documentation": {{"type": "number"}}
      }}
    }},
    "issues": {{
      "type": "array",
      "items": {{
        "type": "object",
        "required": ["severity", "category", "description"],
        "properties": {{
          "severity": {{"enum": ["CRITICAL", "HIGH", "MEDIUM", "LOW"]}},
          "category": {{"enum": ["FUNCTIONAL", "TECHNICAL", "USABILITY", "DOCUMENTATION"]}},
          "description": {{"type": "string"}},
          "recommendation": {{"type": ["string", "null"]}}
        }}
      }}
    }},
    "ready_for_deployment": {{"type": "boolean"}},
    "narrative": {{"type": "string"}},
    "usage_instructions": {list}
  }}
}}"#,
                list = STRING_LIST
            ),
        }
    }

    /// Validate `instance`, collecting every violation
    pub fn validate(&self, instance: &Value) -> Result<(), AdapterError> {
        let schema: Value =
            serde_json::from_str(&self.definition()).map_err(|e| AdapterError::Schema {
                schema: self.name(),
                violations: vec![format!("schema definition is invalid: {}", e)],
            })?;
        let validator = Validator::new(&schema).map_err(|e| AdapterError::Schema {
            schema: self.name(),
            violations: vec![format!("schema failed to compile: {}", e)],
        })?;

        let violations: Vec<String> = validator
            .iter_errors(instance)
            .map(|error| {
                let path = error.instance_path.to_string();
                if path.is_empty() {
                    error.to_string()
                } else {
                    format!("{}: {}", path, error)
                }
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(AdapterError::Schema {
                schema: self.name(),
                violations,
            })
        }
    }
}
