//! File layout of the implementation and evaluation bundles

use super::{ArtifactStore, FileMap, Phase};
use crate::error::StoreError;
use crate::models::{
    DeliverableType, EvaluationRecord, ImplementationArtifact, ImplementationResult,
};
use chrono::Utc;
use serde_json::json;

pub const IMPLEMENTATION_JSON: &str = "implementation.json";
pub const IMPLEMENTATION_SUMMARY: &str = "IMPLEMENTATION_SUMMARY.md";
pub const VALIDATION_TESTS: &str = "validation_tests.md";
pub const DOCUMENTATION: &str = "README.md";
pub const CONFIG: &str = "config.json";
pub const EVALUATION_JSON: &str = "evaluation.json";
pub const EVALUATION_REPORT: &str = "EVALUATION_REPORT.md";

const RESERVED: &[&str] = &[
    IMPLEMENTATION_JSON,
    IMPLEMENTATION_SUMMARY,
    VALIDATION_TESTS,
    DOCUMENTATION,
    CONFIG,
];

/// File extension for a code deliverable's language
fn extension_for(language: Option<&str>) -> &'static str {
    match language.map(|l| l.trim().to_lowercase()).as_deref() {
        Some("python") | Some("py") => "py",
        Some("rust") | Some("rs") => "rs",
        Some("javascript") | Some("js") | Some("node") => "js",
        Some("typescript") | Some("ts") => "ts",
        Some("go") | Some("golang") => "go",
        Some("java") => "java",
        Some("bash") | Some("shell") | Some("sh") => "sh",
        Some("sql") => "sql",
        Some("yaml") | Some("yml") => "yaml",
        _ => "txt",
    }
}

/// Name of the primary file, chosen by deliverable type
pub fn primary_file_name(result: &ImplementationResult) -> String {
    match result.deliverable_type {
        DeliverableType::Code => format!("main.{}", extension_for(result.language.as_deref())),
        DeliverableType::Documentation => "documentation.md".to_string(),
        DeliverableType::Analysis => "analysis.md".to_string(),
        DeliverableType::Process => "process.md".to_string(),
        DeliverableType::Other => "deliverable.md".to_string(),
    }
}

/// Strip traversal and absolute components from a model-chosen file name
fn sanitize_name(raw: &str, index: usize) -> String {
    let cleaned = raw
        .split(|c: char| c == '/' || c == '\\')
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
        .collect::<Vec<_>>()
        .join("/");
    if cleaned.is_empty() {
        format!("supporting_{}.txt", index + 1)
    } else {
        cleaned
    }
}

fn bullet_list(items: &[String]) -> String {
    if items.is_empty() {
        return "- (none)\n".to_string();
    }
    items.iter().map(|i| format!("- {}\n", i)).collect()
}

fn summary_document(
    criteria_key: &str,
    original_key: &str,
    result: &ImplementationResult,
    files: &[String],
) -> String {
    let mut doc = String::new();
    doc.push_str(&format!("# Implementation Summary: {}\n\n", original_key));
    doc.push_str(&format!("- **Criteria Issue:** {}\n", criteria_key));
    doc.push_str(&format!("- **Deliverable Type:** {}\n", result.deliverable_type));
    if let Some(language) = &result.language {
        doc.push_str(&format!("- **Language:** {}\n", language));
    }
    doc.push_str(&format!(
        "- **Generated At:** {}\n\n",
        result.generated_at.to_rfc3339()
    ));

    doc.push_str("## Summary\n\n");
    doc.push_str(result.summary.trim());
    doc.push_str("\n\n## Files\n\n");
    doc.push_str(&bullet_list(files));

    doc.push_str("\n## Requirements Met\n\n");
    doc.push_str(&bullet_list(&result.validation.requirements_met));
    doc.push_str("\n## Requirements Pending\n\n");
    doc.push_str(&bullet_list(&result.validation.requirements_pending));
    doc.push_str(&format!(
        "\n**Self-assessed confidence:** {:.0}%\n",
        result.validation.confidence * 100.0
    ));

    if !result.usage_instructions.is_empty() {
        doc.push_str("\n## Usage\n\n");
        for (i, step) in result.usage_instructions.iter().enumerate() {
            doc.push_str(&format!("{}. {}\n", i + 1, step));
        }
    }
    doc
}

/// Build the implementation bundle for a generated deliverable
pub fn implementation_files(
    criteria_key: &str,
    original_key: &str,
    result: &ImplementationResult,
) -> Result<FileMap, StoreError> {
    let mut files = FileMap::new();
    let primary = primary_file_name(result);
    files.insert(primary.clone(), result.primary_content.clone());

    for (index, file) in result.supporting_files.iter().enumerate() {
        let mut name = sanitize_name(&file.name, index);
        if name == primary || RESERVED.contains(&name.as_str()) || files.contains_key(&name) {
            name = format!("supporting/{}", name);
        }
        files.insert(name, file.content.clone());
    }

    let mut tests = format!("# Validation Tests: {}\n\n", original_key);
    tests.push_str(&bullet_list(&result.validation_tests));
    files.insert(VALIDATION_TESTS.to_string(), tests);

    let documentation = if result.documentation.trim().is_empty() {
        format!("# {}\n\n{}\n", original_key, result.summary.trim())
    } else {
        result.documentation.clone()
    };
    files.insert(DOCUMENTATION.to_string(), documentation);

    if result.deliverable_type.has_config() {
        let config = json!({
            "original_issue": original_key,
            "criteria_issue": criteria_key,
            "deliverable_type": result.deliverable_type,
            "language": result.language,
            "entry_point": primary,
            "generated_at": result.generated_at,
        });
        files.insert(CONFIG.to_string(), pretty(CONFIG, &config)?);
    }

    // Names listed in the summary include the two files written below
    let mut names: Vec<String> = files.keys().cloned().collect();
    names.push(IMPLEMENTATION_SUMMARY.to_string());
    names.push(IMPLEMENTATION_JSON.to_string());
    names.sort();

    files.insert(
        IMPLEMENTATION_SUMMARY.to_string(),
        summary_document(criteria_key, original_key, result, &names),
    );

    let artifact = ImplementationArtifact {
        original_key: original_key.to_string(),
        criteria_key: criteria_key.to_string(),
        result: result.clone(),
        files: names,
        stored_at: Utc::now(),
    };
    files.insert(IMPLEMENTATION_JSON.to_string(), pretty(IMPLEMENTATION_JSON, &artifact)?);

    Ok(files)
}

fn pretty<T: serde::Serialize>(file: &str, value: &T) -> Result<String, StoreError> {
    serde_json::to_string_pretty(value).map_err(|e| StoreError::Decode {
        file: file.to_string(),
        message: e.to_string(),
    })
}

/// Render the human-readable evaluation report
fn evaluation_report(record: &EvaluationRecord) -> String {
    let eval = &record.evaluation;
    let scores = eval.scores.clamped();
    let mut doc = String::new();
    doc.push_str(&format!("# Evaluation Report: {}\n\n", record.original_key));
    doc.push_str(&format!("- **Criteria Issue:** {}\n", record.criteria_key));
    doc.push_str(&format!(
        "- **Verdict:** {}\n",
        if record.verdict.passed { "PASSED" } else { "FAILED" }
    ));
    doc.push_str(&format!("- **Overall Score:** {}/100\n", record.verdict.overall));
    doc.push_str(&format!(
        "- **Ready for Deployment:** {}\n",
        if eval.ready_for_deployment { "yes" } else { "no" }
    ));
    doc.push_str(&format!(
        "- **Evaluated At:** {}\n\n",
        record.evaluated_at.to_rfc3339()
    ));

    doc.push_str("## Scores\n\n| Category | Score |\n|----------|-------|\n");
    doc.push_str(&format!(
        "| Requirements Coverage | {}/25 |\n",
        scores.requirements_coverage
    ));
    doc.push_str(&format!("| Technical Quality | {}/25 |\n", scores.technical_quality));
    doc.push_str(&format!("| Usability | {}/25 |\n", scores.usability));
    doc.push_str(&format!("| Documentation | {}/25 |\n", scores.documentation));

    if !record.verdict.failures.is_empty() {
        doc.push_str("\n## Failed Conditions\n\n");
        for failure in &record.verdict.failures {
            doc.push_str(&format!("- {}\n", failure.describe()));
        }
    }

    doc.push_str("\n## Issues\n\n");
    if eval.issues.is_empty() {
        doc.push_str("No issues reported.\n");
    } else {
        for issue in &eval.issues {
            doc.push_str(&format!("- {}\n", issue.format()));
        }
    }

    if !eval.narrative.trim().is_empty() {
        doc.push_str("\n## Assessment\n\n");
        doc.push_str(eval.narrative.trim());
        doc.push('\n');
    }
    doc
}

/// Build the evaluation bundle
pub fn evaluation_files(record: &EvaluationRecord) -> Result<FileMap, StoreError> {
    let mut files = FileMap::new();
    files.insert(EVALUATION_JSON.to_string(), pretty(EVALUATION_JSON, record)?);
    files.insert(EVALUATION_REPORT.to_string(), evaluation_report(record));
    Ok(files)
}

/// Reload the structured implementation stored for an original issue
pub async fn load_implementation(
    store: &dyn ArtifactStore,
    original_key: &str,
) -> Result<(ImplementationArtifact, FileMap), StoreError> {
    let files = store.read_files(original_key, Phase::Implementation).await?;
    let raw = files
        .get(IMPLEMENTATION_JSON)
        .ok_or_else(|| StoreError::Decode {
            file: IMPLEMENTATION_JSON.to_string(),
            message: "missing from bundle".to_string(),
        })?;
    let artifact: ImplementationArtifact =
        serde_json::from_str(raw).map_err(|e| StoreError::Decode {
            file: IMPLEMENTATION_JSON.to_string(),
            message: e.to_string(),
        })?;
    Ok((artifact, files))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SupportingFile, ValidationSummary};
    use crate::store::MemoryStore;

    fn result(deliverable_type: DeliverableType, language: Option<&str>) -> ImplementationResult {
        ImplementationResult {
            deliverable_type,
            language: language.map(str::to_string),
            summary: "Adds password reset".to_string(),
            primary_content: "def reset(): pass".to_string(),
            supporting_files: vec![
                SupportingFile {
                    name: "tests/test_reset.py".to_string(),
                    content: "def test(): pass".to_string(),
                },
                SupportingFile {
                    name: "../../README.md".to_string(),
                    content: "escape attempt".to_string(),
                },
            ],
            validation_tests: vec!["reset sends email".to_string()],
            documentation: String::new(),
            usage_instructions: vec!["Run main.py".to_string()],
            validation: ValidationSummary {
                requirements_met: vec!["FR1".to_string()],
                requirements_pending: Vec::new(),
                confidence: 0.9,
            },
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_primary_file_names() {
        assert_eq!(primary_file_name(&result(DeliverableType::Code, Some("Python"))), "main.py");
        assert_eq!(primary_file_name(&result(DeliverableType::Code, None)), "main.txt");
        assert_eq!(
            primary_file_name(&result(DeliverableType::Documentation, None)),
            "documentation.md"
        );
        assert_eq!(primary_file_name(&result(DeliverableType::Other, None)), "deliverable.md");
    }

    #[test]
    fn test_code_bundle_layout() {
        let files =
            implementation_files("PCP1-68", "PCP1-67", &result(DeliverableType::Code, Some("python")))
                .unwrap();

        assert!(files.contains_key("main.py"));
        assert!(files.contains_key("tests/test_reset.py"));
        // sanitized name collides with the generated README
        assert!(files.contains_key("supporting/README.md"));
        assert!(files.contains_key(VALIDATION_TESTS));
        assert!(files.contains_key(DOCUMENTATION));
        assert!(files.contains_key(CONFIG));
        assert!(files.contains_key(IMPLEMENTATION_SUMMARY));
        assert!(files.contains_key(IMPLEMENTATION_JSON));

        let summary = &files[IMPLEMENTATION_SUMMARY];
        assert!(summary.contains("main.py"));
        assert!(summary.contains("PCP1-68"));
    }

    #[test]
    fn test_documentation_bundle_has_no_config() {
        let files = implementation_files(
            "PCP1-68",
            "PCP1-67",
            &result(DeliverableType::Documentation, None),
        )
        .unwrap();
        assert!(files.contains_key("documentation.md"));
        assert!(!files.contains_key(CONFIG));
    }

    #[tokio::test]
    async fn test_load_implementation_roundtrip_and_errors() {
        let store = MemoryStore::new();
        let err = load_implementation(&store, "PCP1-67").await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));

        let generated = result(DeliverableType::Code, Some("python"));
        let files = implementation_files("PCP1-68", "PCP1-67", &generated).unwrap();
        store.put("PCP1-67", Phase::Implementation, files);

        let (artifact, raw) = load_implementation(&store, "PCP1-67").await.unwrap();
        assert_eq!(artifact.criteria_key, "PCP1-68");
        assert_eq!(artifact.result.primary_content, generated.primary_content);
        assert!(raw.contains_key("main.py"));

        let mut broken = FileMap::new();
        broken.insert(IMPLEMENTATION_JSON.to_string(), "{not json".to_string());
        store.put("PCP1-67", Phase::Implementation, broken);
        let err = load_implementation(&store, "PCP1-67").await.unwrap_err();
        assert!(matches!(err, StoreError::Decode { .. }));
    }
}
