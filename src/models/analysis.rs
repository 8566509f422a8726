use serde::{Deserialize, Serialize};

/// Effort estimate produced by requirements analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffortEstimate {
    pub story_points: u32,
    pub hours: f64,
    pub complexity: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestScenarios {
    #[serde(default)]
    pub unit: Vec<String>,
    #[serde(default)]
    pub integration: Vec<String>,
    #[serde(default)]
    pub edge_cases: Vec<String>,
    #[serde(default)]
    pub performance: Vec<String>,
}

impl TestScenarios {
    pub fn total(&self) -> usize {
        self.unit.len() + self.integration.len() + self.edge_cases.len() + self.performance.len()
    }
}

/// Structured requirements analysis of a human-authored issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub functional_requirements: Vec<String>,
    pub technical_requirements: Vec<String>,
    #[serde(default)]
    pub quality_requirements: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub definition_of_done: Vec<String>,
    #[serde(default)]
    pub test_scenarios: TestScenarios,
    #[serde(default)]
    pub technical_approach: String,
    pub effort: EffortEstimate,
    /// Set when the model output could not be parsed and the generic
    /// template was substituted
    #[serde(default)]
    pub fallback: bool,
}

impl AnalysisResult {
    pub fn requirement_count(&self) -> usize {
        self.functional_requirements.len()
            + self.technical_requirements.len()
            + self.quality_requirements.len()
    }
}
