//! Matrix expansion: one submission into N concrete configurations.
//!
//! Expansion is pure and deterministic. The Cartesian product is taken over
//! exactly eight fixed axes; the nesting order (provider → model →
//! tempExtraction → tempDedup → tempImpact → tempProposal → embeddingsModel
//! → dedupThreshold) fixes result ordering but not membership.

use crate::domain::config::{Configuration, RunRequest, Target};
use crate::domain::error::ValidationError;

/// Derive the unique, traceable name for an expanded configuration.
///
/// Only provider, model and the extraction temperature feed the name, so
/// matrices varying other axes can produce duplicates; `duplicate_names`
/// surfaces those for eager rejection.
fn derived_name(base: &str, provider: &str, model: &str, temp_extraction: f64) -> String {
    format!("{base}-{provider}-{model}-t{temp_extraction}")
}

/// Expand a submission into its ordered list of concrete configurations.
///
/// A request lacking both `matrix` and `baseTarget` is the identity case:
/// its own `target` becomes the single configuration, name unchanged.
pub fn expand(request: &RunRequest) -> Result<Vec<Configuration>, ValidationError> {
    request.validate()?;
    let name = request
        .name
        .as_deref()
        .ok_or(ValidationError::MissingName)?;
    let suites = request.effective_suites();
    let runs_per_case = request.effective_runs_per_case();

    if request.matrix.is_none() && request.base_target.is_none() {
        let target = request
            .target
            .clone()
            .ok_or(ValidationError::MissingTarget)?;
        return Ok(vec![Configuration {
            name: name.to_string(),
            suites,
            runs_per_case,
            target,
        }]);
    }

    // Matrix path: absent axes degrade to a single candidate from the base.
    let base = request
        .base_target
        .clone()
        .or_else(|| request.target.clone())
        .ok_or(ValidationError::MissingTarget)?;
    let matrix = request.matrix.clone().unwrap_or_default();

    let providers = matrix.provider.unwrap_or_else(|| vec![base.provider.clone()]);
    let models = matrix.model.unwrap_or_else(|| vec![base.model.clone()]);
    let temps_extraction = matrix
        .temp_extraction
        .unwrap_or_else(|| vec![base.temp_extraction]);
    let temps_dedup = matrix.temp_dedup.unwrap_or_else(|| vec![base.temp_dedup]);
    let temps_impact = matrix.temp_impact.unwrap_or_else(|| vec![base.temp_impact]);
    let temps_proposal = matrix
        .temp_proposal
        .unwrap_or_else(|| vec![base.temp_proposal]);
    let embeddings: Vec<Option<String>> = match matrix.embeddings_model {
        Some(values) => values.into_iter().map(Some).collect(),
        None => vec![base.embeddings_model.clone()],
    };
    let thresholds: Vec<Option<f64>> = match matrix.dedup_threshold {
        Some(values) => values.into_iter().map(Some).collect(),
        None => vec![base.dedup_threshold],
    };

    let mut expanded = Vec::new();
    for provider in &providers {
        for model in &models {
            for temp_extraction in &temps_extraction {
                for temp_dedup in &temps_dedup {
                    for temp_impact in &temps_impact {
                        for temp_proposal in &temps_proposal {
                            for embeddings_model in &embeddings {
                                for dedup_threshold in &thresholds {
                                    expanded.push(Configuration {
                                        name: derived_name(
                                            name,
                                            provider,
                                            model,
                                            *temp_extraction,
                                        ),
                                        suites: suites.clone(),
                                        runs_per_case,
                                        target: Target {
                                            provider: provider.clone(),
                                            model: model.clone(),
                                            temp_extraction: *temp_extraction,
                                            temp_dedup: *temp_dedup,
                                            temp_impact: *temp_impact,
                                            temp_proposal: *temp_proposal,
                                            embeddings_model: embeddings_model.clone(),
                                            dedup_threshold: *dedup_threshold,
                                        },
                                    });
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    Ok(expanded)
}

/// Names that appear more than once within one expansion batch, in first
/// appearance order.
pub fn duplicate_names(configs: &[Configuration]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut duplicates = Vec::new();
    for config in configs {
        if !seen.insert(config.name.as_str()) && !duplicates.contains(&config.name) {
            duplicates.push(config.name.clone());
        }
    }
    duplicates
}
