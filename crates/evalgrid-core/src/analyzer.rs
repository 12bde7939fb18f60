//! Comparative analyzer: mines the recent run corpus for tuning suggestions.
//!
//! Seven independent detection rules run over the most recent completed
//! records (newest first, `records[0]` is "latest") and their outputs are
//! concatenated. Rules never short-circuit each other. All thresholds are
//! fixed constants; changing them changes the suggestion contract.

use crate::domain::config::{MatrixAxes, RunRequest, Target};
use crate::domain::record::RunRecord;
use crate::domain::suggestion::{Gap, GapSide, Suggestion, SuggestionKind};

/// How many recent records the analyzer looks at.
pub const ANALYSIS_WINDOW: usize = 20;

/// A metric mean below this on the latest run is flagged.
const LOW_METRIC_FLOOR: f64 = 0.5;

/// Overall-score margin for "latest is not the best".
const BEST_OVERALL_MARGIN: f64 = 0.02;

/// Margin for model/provider spreads, sweet spots, regressions and declines.
const COMPARISON_MARGIN: f64 = 0.03;

/// Step probed around a temperature sweet spot.
const NEIGHBOR_STEP: f64 = 0.05;

/// Gaps above this get the stronger wording.
const VERY_SIGNIFICANT: f64 = 0.1;

/// Valid sampling temperature range for neighbor probing.
const TEMP_RANGE: (f64, f64) = (0.0, 2.0);

/// Run every rule over the window and concatenate the results.
pub fn analyze(records: &[RunRecord]) -> Vec<Suggestion> {
    if records.is_empty() {
        return Vec::new();
    }

    let mut suggestions = Vec::new();
    suggestions.extend(check_low_scores(records));
    suggestions.extend(check_best_overall(records));
    suggestions.extend(check_group_spread(
        records,
        SuggestionKind::ModelComparison,
        "model",
        |t| t.model.as_str(),
        set_model,
    ));
    for axis in TempAxis::ALL {
        suggestions.extend(check_sweet_spot(records, axis));
    }
    suggestions.extend(check_regression(records));
    suggestions.extend(check_declining_suites(records));
    suggestions.extend(check_group_spread(
        records,
        SuggestionKind::ProviderComparison,
        "provider",
        |t| t.provider.as_str(),
        set_provider,
    ));
    suggestions
}

fn severity(delta: f64) -> &'static str {
    if delta > VERY_SIGNIFICANT {
        "very significant"
    } else {
        "significant"
    }
}

/// A resubmittable request built from a historical target.
fn rerun_request(name: String, target: Target) -> RunRequest {
    RunRequest {
        name: Some(name),
        target: Some(target),
        ..Default::default()
    }
}

fn set_model(target: &mut Target, value: &str) {
    target.model = value.to_string();
}

fn set_provider(target: &mut Target, value: &str) {
    target.provider = value.to_string();
}

// ---------------------------------------------------------------------------
// Rule 1: low metric scores on the latest run
// ---------------------------------------------------------------------------

fn check_low_scores(records: &[RunRecord]) -> Vec<Suggestion> {
    let latest = &records[0];
    let mut out = Vec::new();

    for (metric, mean) in latest.metric_means() {
        if mean >= LOW_METRIC_FLOOR {
            continue;
        }

        let best_other = records[1..]
            .iter()
            .filter_map(|r| r.metric_means().get(&metric).copied().map(|m| (r, m)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match best_other {
            Some((reference, best_mean)) if best_mean > mean => {
                let gap = Gap::new(
                    GapSide {
                        label: latest.config.name.clone(),
                        score: mean,
                    },
                    GapSide {
                        label: reference.config.name.clone(),
                        score: best_mean,
                    },
                );
                out.push(Suggestion {
                    kind: SuggestionKind::LowScore,
                    title: format!("Low '{metric}' score"),
                    message: format!(
                        "'{metric}' scored {mean:.2} on '{}', below the {LOW_METRIC_FLOOR:.2} floor",
                        latest.config.name
                    ),
                    detail: format!(
                        "'{}' reached {best_mean:.2} on the same metric, a {} gap of {:.2}. \
                         Rerunning its parameters may recover the score.",
                        reference.config.name,
                        severity(gap.delta),
                        gap.delta
                    ),
                    gap: Some(gap),
                    suggested_config: Some(rerun_request(
                        format!("{}-rerun", reference.config.name),
                        reference.target.clone(),
                    )),
                });
            }
            _ => {
                out.push(Suggestion {
                    kind: SuggestionKind::LowScore,
                    title: format!("Low '{metric}' score"),
                    message: format!(
                        "'{metric}' scored {mean:.2} on '{}', below the {LOW_METRIC_FLOOR:.2} floor",
                        latest.config.name
                    ),
                    detail: format!(
                        "No run in the recent window did better on '{metric}'; \
                         try different parameters for this metric."
                    ),
                    gap: None,
                    suggested_config: None,
                });
            }
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Rule 2: latest run is not the best overall
// ---------------------------------------------------------------------------

fn check_best_overall(records: &[RunRecord]) -> Vec<Suggestion> {
    let latest = &records[0];
    let Some(best) = records[1..]
        .iter()
        .max_by(|a, b| a.overall_score.total_cmp(&b.overall_score))
    else {
        return Vec::new();
    };

    if best.overall_score - latest.overall_score <= BEST_OVERALL_MARGIN {
        return Vec::new();
    }

    let gap = Gap::new(
        GapSide {
            label: latest.config.name.clone(),
            score: latest.overall_score,
        },
        GapSide {
            label: best.config.name.clone(),
            score: best.overall_score,
        },
    );
    vec![Suggestion {
        kind: SuggestionKind::BestConfig,
        title: "Latest run is not the best".to_string(),
        message: format!(
            "'{}' scored {:.2} overall while '{}' holds {:.2}",
            latest.config.name, latest.overall_score, best.config.name, best.overall_score
        ),
        detail: format!(
            "A {} gap of {:.2} separates the latest run from the best recent run.",
            severity(gap.delta),
            gap.delta
        ),
        gap: Some(gap),
        suggested_config: Some(rerun_request(
            format!("{}-rerun", best.config.name),
            best.target.clone(),
        )),
    }]
}

// ---------------------------------------------------------------------------
// Rules 3 and 7: best-vs-worst spread across a target axis
// ---------------------------------------------------------------------------

struct GroupStat {
    label: String,
    peak: f64,
    peak_config: String,
    sum: f64,
    count: usize,
}

fn check_group_spread(
    records: &[RunRecord],
    kind: SuggestionKind,
    axis: &str,
    extract: fn(&Target) -> &str,
    apply: fn(&mut Target, &str),
) -> Vec<Suggestion> {
    let latest = &records[0];
    let mut groups: Vec<GroupStat> = Vec::new();
    for record in records {
        let label = extract(&record.target);
        match groups.iter_mut().find(|g| g.label == label) {
            Some(group) => {
                if record.overall_score > group.peak {
                    group.peak = record.overall_score;
                    group.peak_config = record.config.name.clone();
                }
                group.sum += record.overall_score;
                group.count += 1;
            }
            None => groups.push(GroupStat {
                label: label.to_string(),
                peak: record.overall_score,
                peak_config: record.config.name.clone(),
                sum: record.overall_score,
                count: 1,
            }),
        }
    }

    if groups.len() < 2 {
        return Vec::new();
    }
    let best = groups
        .iter()
        .max_by(|a, b| a.peak.total_cmp(&b.peak))
        .map(|g| (g.label.clone(), g.peak, g.sum / g.count as f64));
    let worst = groups
        .iter()
        .min_by(|a, b| a.peak.total_cmp(&b.peak))
        .map(|g| (g.label.clone(), g.peak, g.sum / g.count as f64));
    let (Some((best_label, best_peak, best_mean)), Some((worst_label, worst_peak, worst_mean))) =
        (best, worst)
    else {
        return Vec::new();
    };
    if best_peak - worst_peak <= COMPARISON_MARGIN {
        return Vec::new();
    }

    let gap = Gap::new(
        GapSide {
            label: worst_label.clone(),
            score: worst_peak,
        },
        GapSide {
            label: best_label.clone(),
            score: best_peak,
        },
    );
    let mut target = latest.target.clone();
    apply(&mut target, &best_label);
    vec![Suggestion {
        kind,
        title: format!("{axis} comparison: '{best_label}' leads"),
        message: format!(
            "{axis} '{best_label}' peaks at {best_peak:.2} while '{worst_label}' peaks at {worst_peak:.2}"
        ),
        detail: format!(
            "Across the recent window, '{best_label}' averages {best_mean:.2} and \
             '{worst_label}' averages {worst_mean:.2}; the peak spread of {:.2} is {}.",
            gap.delta,
            severity(gap.delta)
        ),
        gap: Some(gap),
        suggested_config: Some(rerun_request(
            format!("{}-{}", latest.config.name, best_label),
            target,
        )),
    }]
}

// ---------------------------------------------------------------------------
// Rule 4: temperature sweet spots + neighborhood exploration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TempAxis {
    Extraction,
    Dedup,
    Impact,
    Proposal,
}

impl TempAxis {
    const ALL: [TempAxis; 4] = [
        TempAxis::Extraction,
        TempAxis::Dedup,
        TempAxis::Impact,
        TempAxis::Proposal,
    ];

    fn key(self) -> &'static str {
        match self {
            TempAxis::Extraction => "tempExtraction",
            TempAxis::Dedup => "tempDedup",
            TempAxis::Impact => "tempImpact",
            TempAxis::Proposal => "tempProposal",
        }
    }

    fn get(self, target: &Target) -> f64 {
        match self {
            TempAxis::Extraction => target.temp_extraction,
            TempAxis::Dedup => target.temp_dedup,
            TempAxis::Impact => target.temp_impact,
            TempAxis::Proposal => target.temp_proposal,
        }
    }

    fn set(self, target: &mut Target, value: f64) {
        match self {
            TempAxis::Extraction => target.temp_extraction = value,
            TempAxis::Dedup => target.temp_dedup = value,
            TempAxis::Impact => target.temp_impact = value,
            TempAxis::Proposal => target.temp_proposal = value,
        }
    }

    fn matrix(self, values: Vec<f64>) -> MatrixAxes {
        let mut matrix = MatrixAxes::default();
        match self {
            TempAxis::Extraction => matrix.temp_extraction = Some(values),
            TempAxis::Dedup => matrix.temp_dedup = Some(values),
            TempAxis::Impact => matrix.temp_impact = Some(values),
            TempAxis::Proposal => matrix.temp_proposal = Some(values),
        }
        matrix
    }
}

fn same_temp(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn check_sweet_spot(records: &[RunRecord], axis: TempAxis) -> Vec<Suggestion> {
    let latest = &records[0];

    // Collapse to one best score per distinct temperature value.
    let mut per_value: Vec<(f64, f64, String)> = Vec::new();
    for record in records {
        let value = axis.get(&record.target);
        match per_value.iter_mut().find(|(v, _, _)| same_temp(*v, value)) {
            Some(entry) => {
                if record.overall_score > entry.1 {
                    entry.1 = record.overall_score;
                    entry.2 = record.config.name.clone();
                }
            }
            None => per_value.push((value, record.overall_score, record.config.name.clone())),
        }
    }

    if per_value.len() < 2 {
        return Vec::new();
    }
    let Some(best) = per_value
        .iter()
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .cloned()
    else {
        return Vec::new();
    };
    let Some(worst) = per_value
        .iter()
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .cloned()
    else {
        return Vec::new();
    };
    if best.1 - worst.1 <= COMPARISON_MARGIN {
        return Vec::new();
    }

    let key = axis.key();
    let mut out = Vec::new();

    let gap = Gap::new(
        GapSide {
            label: format!("{key}={}", worst.0),
            score: worst.1,
        },
        GapSide {
            label: format!("{key}={}", best.0),
            score: best.1,
        },
    );
    let mut target = latest.target.clone();
    axis.set(&mut target, best.0);
    out.push(Suggestion {
        kind: SuggestionKind::TemperatureSweetSpot,
        title: format!("Sweet spot for {key}"),
        message: format!(
            "{key}={} peaks at {:.2} ('{}'), while {key}={} only reaches {:.2}",
            best.0, best.1, best.2, worst.0, worst.1
        ),
        detail: format!(
            "The spread of {:.2} across tested {key} values is {}.",
            gap.delta,
            severity(gap.delta)
        ),
        gap: Some(gap),
        suggested_config: Some(rerun_request(
            format!("{}-{key}-{}", latest.config.name, best.0),
            target,
        )),
    });

    // Probe one step either side of the best value for untested neighbors.
    let mut untested = Vec::new();
    for candidate in [best.0 - NEIGHBOR_STEP, best.0 + NEIGHBOR_STEP] {
        let candidate = (candidate * 1000.0).round() / 1000.0;
        let in_range = candidate >= TEMP_RANGE.0 && candidate <= TEMP_RANGE.1;
        let tested = per_value.iter().any(|(v, _, _)| same_temp(*v, candidate));
        if in_range && !tested {
            untested.push(candidate);
        }
    }
    if !untested.is_empty() {
        let listed = untested
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        out.push(Suggestion {
            kind: SuggestionKind::TemperatureSweetSpot,
            title: format!("Explore around the {key} sweet spot"),
            message: format!("{key} {listed} near the best value {} were never tested", best.0),
            detail: format!(
                "The matrix below runs exactly the untested neighbor(s) of {key}={}.",
                best.0
            ),
            gap: None,
            suggested_config: Some(RunRequest {
                name: Some(format!("{}-{key}-explore", latest.config.name)),
                matrix: Some(axis.matrix(untested)),
                base_target: Some(latest.target.clone()),
                ..Default::default()
            }),
        });
    }
    out
}

// ---------------------------------------------------------------------------
// Rule 5: regression versus the best historical run
// ---------------------------------------------------------------------------

fn check_regression(records: &[RunRecord]) -> Vec<Suggestion> {
    let latest = &records[0];
    let Some(best) = records[1..]
        .iter()
        .max_by(|a, b| a.overall_score.total_cmp(&b.overall_score))
    else {
        return Vec::new();
    };
    if best.overall_score - latest.overall_score <= COMPARISON_MARGIN {
        return Vec::new();
    }

    let differences = diff_targets(&latest.target, &best.target);
    let detail = if differences.is_empty() {
        "Both runs used identical parameters; the regression likely has a \
         non-parameter cause (suite changes, provider drift, flakiness)."
            .to_string()
    } else {
        format!(
            "Parameter differences (latest vs best): {}.",
            differences.join("; ")
        )
    };

    let gap = Gap::new(
        GapSide {
            label: latest.config.name.clone(),
            score: latest.overall_score,
        },
        GapSide {
            label: best.config.name.clone(),
            score: best.overall_score,
        },
    );
    vec![Suggestion {
        kind: SuggestionKind::Regression,
        title: "Regression versus best historical run".to_string(),
        message: format!(
            "'{}' dropped to {:.2} overall; '{}' previously reached {:.2}",
            latest.config.name, latest.overall_score, best.config.name, best.overall_score
        ),
        detail: format!("{} The gap of {:.2} is {}.", detail, gap.delta, severity(gap.delta)),
        gap: Some(gap),
        suggested_config: Some(rerun_request(
            format!("{}-rerun", best.config.name),
            best.target.clone(),
        )),
    }]
}

/// Differences across provider, model and the four temperatures.
fn diff_targets(latest: &Target, reference: &Target) -> Vec<String> {
    let mut diffs = Vec::new();
    if latest.model != reference.model {
        diffs.push(format!("model: {} vs {}", latest.model, reference.model));
    }
    if latest.provider != reference.provider {
        diffs.push(format!(
            "provider: {} vs {}",
            latest.provider, reference.provider
        ));
    }
    for axis in TempAxis::ALL {
        let (a, b) = (axis.get(latest), axis.get(reference));
        if !same_temp(a, b) {
            diffs.push(format!("{}: {} vs {}", axis.key(), a, b));
        }
    }
    diffs
}

// ---------------------------------------------------------------------------
// Rule 6: per-suite declining trend
// ---------------------------------------------------------------------------

fn check_declining_suites(records: &[RunRecord]) -> Vec<Suggestion> {
    // Oldest → newest, the order trends are read in.
    let chronological: Vec<&RunRecord> = records.iter().rev().collect();

    let mut series: Vec<(String, Vec<(String, f64)>)> = Vec::new();
    for record in &chronological {
        for suite in &record.suites {
            let Some(average) = suite.average_mean() else {
                continue;
            };
            match series.iter_mut().find(|(name, _)| *name == suite.suite) {
                Some((_, points)) => points.push((record.config.name.clone(), average)),
                None => {
                    series.push((
                        suite.suite.clone(),
                        vec![(record.config.name.clone(), average)],
                    ));
                }
            }
        }
    }

    let mut out = Vec::new();
    for (suite, points) in series {
        if points.len() < 3 {
            continue;
        }
        let window = &points[points.len() - 3..];
        let strictly_decreasing = window[0].1 > window[1].1 && window[1].1 > window[2].1;
        let drop = window[0].1 - window[2].1;
        if !strictly_decreasing || drop <= COMPARISON_MARGIN {
            continue;
        }

        let gap = Gap::new(
            GapSide {
                label: window[2].0.clone(),
                score: window[2].1,
            },
            GapSide {
                label: window[0].0.clone(),
                score: window[0].1,
            },
        );
        out.push(Suggestion {
            kind: SuggestionKind::SuiteDeclining,
            title: format!("Suite '{suite}' is declining"),
            message: format!(
                "'{suite}' fell over the last three runs: {:.2} ('{}') → {:.2} ('{}') → {:.2} ('{}')",
                window[0].1, window[0].0, window[1].1, window[1].0, window[2].1, window[2].0
            ),
            detail: format!(
                "Cumulative loss of {drop:.2} across three consecutive runs is {}.",
                severity(drop)
            ),
            gap: Some(gap),
            suggested_config: None,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::{MetricAggregate, RecordConfig, SuiteRecord};
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeMap;

    fn target(provider: &str, model: &str, temp_extraction: f64) -> Target {
        Target {
            provider: provider.to_string(),
            model: model.to_string(),
            temp_extraction,
            temp_dedup: 0.1,
            temp_impact: 0.3,
            temp_proposal: 0.5,
            embeddings_model: None,
            dedup_threshold: None,
        }
    }

    /// Records newest first; `age` 0 is the latest.
    fn record(name: &str, target: Target, overall: f64, age: i64) -> RunRecord {
        RunRecord {
            id: format!("res-{name}"),
            timestamp: Utc.with_ymd_and_hms(2026, 8, 20, 12, 0, 0).unwrap()
                - Duration::hours(age),
            config: RecordConfig {
                name: name.to_string(),
            },
            target,
            overall_score: overall,
            suites: Vec::new(),
        }
    }

    fn with_suite(mut record: RunRecord, suite: &str, means: &[(&str, f64)]) -> RunRecord {
        let aggregated: BTreeMap<String, MetricAggregate> = means
            .iter()
            .map(|(metric, mean)| (metric.to_string(), MetricAggregate { mean: *mean }))
            .collect();
        record.suites.push(SuiteRecord {
            suite: suite.to_string(),
            aggregated,
        });
        record
    }

    fn of_kind(suggestions: &[Suggestion], kind: SuggestionKind) -> Vec<&Suggestion> {
        suggestions.iter().filter(|s| s.kind == kind).collect()
    }

    #[test]
    fn test_empty_window_yields_nothing() {
        assert!(analyze(&[]).is_empty());
    }

    #[test]
    fn test_best_overall_fires_above_margin() {
        // 0.74 - 0.70 = 0.04 > 0.02
        let records = vec![
            record("latest", target("p", "m", 0.2), 0.70, 0),
            record("older", target("p", "m", 0.2), 0.74, 1),
        ];
        let found = analyze(&records);
        let best = of_kind(&found, SuggestionKind::BestConfig);
        assert_eq!(best.len(), 1);
        let gap = best[0].gap.as_ref().expect("gap");
        assert_eq!(gap.latest.label, "latest");
        assert_eq!(gap.reference.label, "older");
        assert!((gap.delta - 0.04).abs() < 1e-9);
    }

    #[test]
    fn test_best_overall_is_strict_comparison() {
        // Exactly 0.02 must not fire.
        let records = vec![
            record("latest", target("p", "m", 0.2), 0.70, 0),
            record("older", target("p", "m", 0.2), 0.72, 1),
        ];
        assert!(of_kind(&analyze(&records), SuggestionKind::BestConfig).is_empty());
    }

    #[test]
    fn test_model_comparison_fires_on_spread() {
        let records = vec![
            record("r1", target("p", "alpha", 0.2), 0.60, 0),
            record("r2", target("p", "beta", 0.2), 0.70, 1),
            record("r3", target("p", "alpha", 0.2), 0.62, 2),
        ];
        let found = of_kind(&analyze(&records), SuggestionKind::ModelComparison)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(found.len(), 1);
        let gap = found[0].gap.as_ref().expect("gap");
        assert_eq!(gap.reference.label, "beta");
        assert_eq!(gap.latest.label, "alpha");
        // Suggested config swaps the latest run's model for the leader.
        let suggested = found[0].suggested_config.as_ref().expect("config");
        assert_eq!(suggested.target.as_ref().expect("target").model, "beta");
    }

    #[test]
    fn test_model_comparison_needs_two_models() {
        let records = vec![
            record("r1", target("p", "alpha", 0.2), 0.40, 0),
            record("r2", target("p", "alpha", 0.2), 0.90, 1),
        ];
        assert!(of_kind(&analyze(&records), SuggestionKind::ModelComparison).is_empty());
    }

    #[test]
    fn test_provider_comparison_mirrors_model_rule() {
        let records = vec![
            record("r1", target("p1", "m", 0.2), 0.60, 0),
            record("r2", target("p2", "m", 0.2), 0.70, 1),
        ];
        let suggestions = analyze(&records);
        let found = of_kind(&suggestions, SuggestionKind::ProviderComparison);
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("p2"));
    }

    #[test]
    fn test_sweet_spot_and_neighborhood_exploration() {
        // Tested: 0.1 → 0.60, 0.3 → 0.75. Best is 0.3; neighbors 0.25 and
        // 0.35 are both untested → one sweet-spot + one exploration.
        let records = vec![
            record("r1", target("p", "m", 0.3), 0.75, 0),
            record("r2", target("p", "m", 0.1), 0.60, 1),
        ];
        let found = analyze(&records);
        let spots = of_kind(&found, SuggestionKind::TemperatureSweetSpot);
        assert_eq!(spots.len(), 2);

        let exploration = spots
            .iter()
            .find(|s| s.title.contains("Explore"))
            .expect("exploration suggestion");
        assert!(exploration.message.contains("0.25"));
        assert!(exploration.message.contains("0.35"));
        let config = exploration.suggested_config.as_ref().expect("config");
        let matrix = config.matrix.as_ref().expect("matrix");
        assert_eq!(
            matrix.temp_extraction.as_ref().expect("axis"),
            &vec![0.25, 0.35]
        );
        assert!(config.base_target.is_some());
    }

    #[test]
    fn test_sweet_spot_skips_tested_neighbors() {
        let records = vec![
            record("r1", target("p", "m", 0.3), 0.75, 0),
            record("r2", target("p", "m", 0.25), 0.60, 1),
            record("r3", target("p", "m", 0.35), 0.61, 2),
        ];
        let found = analyze(&records);
        let spots = of_kind(&found, SuggestionKind::TemperatureSweetSpot);
        // Both neighbors tested: sweet spot only, no exploration.
        assert_eq!(spots.len(), 1);
        assert!(spots[0].title.contains("Sweet spot"));
    }

    #[test]
    fn test_sweet_spot_needs_spread_above_margin() {
        let records = vec![
            record("r1", target("p", "m", 0.3), 0.75, 0),
            record("r2", target("p", "m", 0.1), 0.73, 1),
        ];
        assert!(of_kind(&analyze(&records), SuggestionKind::TemperatureSweetSpot).is_empty());
    }

    #[test]
    fn test_regression_diffs_targets() {
        let records = vec![
            record("latest", target("p", "m", 0.4), 0.60, 0),
            record("best", target("p", "m", 0.2), 0.70, 1),
        ];
        let found = of_kind(&analyze(&records), SuggestionKind::Regression)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(found.len(), 1);
        assert!(found[0].detail.contains("tempExtraction: 0.4 vs 0.2"));
    }

    #[test]
    fn test_regression_identical_targets_points_elsewhere() {
        let records = vec![
            record("latest", target("p", "m", 0.2), 0.60, 0),
            record("best", target("p", "m", 0.2), 0.70, 1),
        ];
        let found = of_kind(&analyze(&records), SuggestionKind::Regression)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(found.len(), 1);
        assert!(found[0].detail.contains("identical"));
    }

    #[test]
    fn test_declining_suite_fires_on_strict_decrease() {
        // Chronological averages 0.80 → 0.70 → 0.60, drop 0.20 > 0.03.
        let records = vec![
            with_suite(
                record("r3", target("p", "m", 0.2), 0.6, 0),
                "s1",
                &[("acc", 0.60)],
            ),
            with_suite(
                record("r2", target("p", "m", 0.2), 0.7, 1),
                "s1",
                &[("acc", 0.70)],
            ),
            with_suite(
                record("r1", target("p", "m", 0.2), 0.8, 2),
                "s1",
                &[("acc", 0.80)],
            ),
        ];
        let found = of_kind(&analyze(&records), SuggestionKind::SuiteDeclining)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("r1"));
        assert!(found[0].message.contains("r2"));
        assert!(found[0].message.contains("r3"));
        assert!(found[0].detail.contains("0.20"));
    }

    #[test]
    fn test_declining_suite_requires_monotonic_drop() {
        // 0.80 → 0.85 → 0.60 is not strictly decreasing.
        let records = vec![
            with_suite(
                record("r3", target("p", "m", 0.2), 0.6, 0),
                "s1",
                &[("acc", 0.60)],
            ),
            with_suite(
                record("r2", target("p", "m", 0.2), 0.85, 1),
                "s1",
                &[("acc", 0.85)],
            ),
            with_suite(
                record("r1", target("p", "m", 0.2), 0.8, 2),
                "s1",
                &[("acc", 0.80)],
            ),
        ];
        assert!(of_kind(&analyze(&records), SuggestionKind::SuiteDeclining).is_empty());
    }

    #[test]
    fn test_low_score_with_and_without_reference() {
        let latest = with_suite(
            record("latest", target("p", "m", 0.2), 0.45, 0),
            "s1",
            &[("precision", 0.40), ("recall", 0.90)],
        );
        let older = with_suite(
            record("older", target("p", "m", 0.2), 0.46, 1),
            "s1",
            &[("precision", 0.80)],
        );
        let found = of_kind(&analyze(&[latest.clone(), older]), SuggestionKind::LowScore)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(found.len(), 1);
        assert!(found[0].gap.is_some());
        assert!(found[0].message.contains("precision"));

        // Alone in the window: no reference, lower-confidence form.
        let found = of_kind(&analyze(&[latest]), SuggestionKind::LowScore)
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();
        assert_eq!(found.len(), 1);
        assert!(found[0].gap.is_none());
    }

    #[test]
    fn test_rules_do_not_short_circuit() {
        // One window triggering best-config, regression and model spread.
        let records = vec![
            record("latest", target("p", "alpha", 0.2), 0.60, 0),
            record("older", target("p", "beta", 0.2), 0.74, 1),
        ];
        let found = analyze(&records);
        assert!(!of_kind(&found, SuggestionKind::BestConfig).is_empty());
        assert!(!of_kind(&found, SuggestionKind::Regression).is_empty());
        assert!(!of_kind(&found, SuggestionKind::ModelComparison).is_empty());
    }
}
