//! Weighted reconciliation of the two specialist proposals
//!
//! Proposals are compared along four structural axes. Axes are not equally
//! weighted: data-model and auth divergence is costlier to fix after code
//! generation than integration or routing divergence, so those axes carry
//! more of the score. The threshold sits at the auth weight so that full
//! disagreement on either heavy axis escalates on its own, while the two
//! light axes only escalate in combination.

use std::collections::HashSet;

use crate::agents::{BuildArchitecture, Proposal};

/// Axis weights, summing to 1.0
pub const WEIGHT_DATA_MODEL: f64 = 0.35;
pub const WEIGHT_AUTH: f64 = 0.30;
pub const WEIGHT_INTEGRATIONS: f64 = 0.20;
pub const WEIGHT_ROUTING: f64 = 0.15;

/// Disagreement scores at or above this escalate to a human
pub const DEFAULT_ESCALATION_THRESHOLD: f64 = 0.30;

/// A structural comparison axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    DataModel,
    Auth,
    Integrations,
    Routing,
}

impl Axis {
    /// Human-readable axis name, used in escalation reasons
    pub fn label(self) -> &'static str {
        match self {
            Axis::DataModel => "data model",
            Axis::Auth => "authentication",
            Axis::Integrations => "external integrations",
            Axis::Routing => "routing",
        }
    }
}

/// Result of comparing one axis across both proposals
#[derive(Debug, Clone, Copy)]
pub struct AxisComparison {
    pub axis: Axis,
    pub weight: f64,
    /// Disagreement in [0, 1]; 0 means the proposals agree on this axis
    pub disagreement: f64,
}

impl AxisComparison {
    /// This axis's contribution to the total score
    pub fn weighted(&self) -> f64 {
        self.weight * self.disagreement
    }
}

/// Compare both proposals along every structural axis
pub fn compare(visual: &Proposal, architecture: &Proposal) -> Vec<AxisComparison> {
    vec![
        AxisComparison {
            axis: Axis::DataModel,
            weight: WEIGHT_DATA_MODEL,
            disagreement: data_model_disagreement(visual, architecture),
        },
        AxisComparison {
            axis: Axis::Auth,
            weight: WEIGHT_AUTH,
            disagreement: auth_disagreement(visual, architecture),
        },
        AxisComparison {
            axis: Axis::Integrations,
            weight: WEIGHT_INTEGRATIONS,
            disagreement: integrations_disagreement(visual, architecture),
        },
        AxisComparison {
            axis: Axis::Routing,
            weight: WEIGHT_ROUTING,
            disagreement: routing_disagreement(visual, architecture),
        },
    ]
}

/// Weighted disagreement score in [0, 1]
pub fn disagreement_score(comparisons: &[AxisComparison]) -> f64 {
    comparisons.iter().map(AxisComparison::weighted).sum()
}

/// Generate the natural-language escalation reason
///
/// Names the axes that disagreed most, strongest first. Axes with
/// disagreement below one half are only named when nothing stronger
/// exists.
pub fn escalation_reason(comparisons: &[AxisComparison]) -> String {
    let mut ranked: Vec<&AxisComparison> = comparisons.iter().filter(|c| c.disagreement > 0.0).collect();
    ranked.sort_by(|a, b| {
        b.weighted()
            .partial_cmp(&a.weighted())
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let strong: Vec<&str> = ranked
        .iter()
        .filter(|c| c.disagreement >= 0.5)
        .map(|c| c.axis.label())
        .collect();
    let named = if strong.is_empty() {
        ranked.iter().take(2).map(|c| c.axis.label()).collect::<Vec<_>>()
    } else {
        strong
    };

    format!(
        "The visual and architecture specialists produced irreconcilable proposals; the strongest disagreement is on {}. A manual selection is required.",
        named.join(" and ")
    )
}

/// Merge two reconcilable proposals into one build plan
///
/// Structural decisions come from the architecture specialist,
/// presentational decisions from the visual specialist.
pub fn merge(app_name: &str, visual: &Proposal, architecture: &Proposal) -> BuildArchitecture {
    BuildArchitecture {
        app_name: app_name.to_string(),
        summary: architecture.summary.clone(),
        data_model: architecture.data_model.clone(),
        auth: architecture.auth.clone(),
        integrations: architecture.integrations.clone(),
        routes: architecture.routes.clone(),
        presentation: visual.presentation.clone(),
    }
}

/// Build a plan from a single surviving proposal
pub fn from_single(app_name: &str, proposal: &Proposal) -> BuildArchitecture {
    BuildArchitecture {
        app_name: app_name.to_string(),
        summary: proposal.summary.clone(),
        data_model: proposal.data_model.clone(),
        auth: proposal.auth.clone(),
        integrations: proposal.integrations.clone(),
        routes: proposal.routes.clone(),
        presentation: proposal.presentation.clone(),
    }
}

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

fn normalized_set<'a, I: IntoIterator<Item = &'a String>>(items: I) -> HashSet<String> {
    items.into_iter().map(|s| normalize(s)).collect()
}

/// 1 - |a ∩ b| / |a ∪ b|; two empty sets agree completely
fn jaccard_distance(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    1.0 - (intersection as f64 / union as f64)
}

fn data_model_disagreement(visual: &Proposal, architecture: &Proposal) -> f64 {
    let a = normalized_set(visual.data_model.iter().map(|e| &e.name));
    let b = normalized_set(architecture.data_model.iter().map(|e| &e.name));
    jaccard_distance(&a, &b)
}

/// Strategy mismatch is total disagreement; with the same strategy, role
/// differences count at half strength
fn auth_disagreement(visual: &Proposal, architecture: &Proposal) -> f64 {
    if normalize(&visual.auth.strategy) != normalize(&architecture.auth.strategy) {
        return 1.0;
    }
    let a = normalized_set(&visual.auth.roles);
    let b = normalized_set(&architecture.auth.roles);
    0.5 * jaccard_distance(&a, &b)
}

fn integrations_disagreement(visual: &Proposal, architecture: &Proposal) -> f64 {
    let a = normalized_set(&visual.integrations);
    let b = normalized_set(&architecture.integrations);
    jaccard_distance(&a, &b)
}

fn routing_disagreement(visual: &Proposal, architecture: &Proposal) -> f64 {
    let a = normalized_set(visual.routes.iter().map(|r| &r.path));
    let b = normalized_set(architecture.routes.iter().map(|r| &r.path));
    jaccard_distance(&a, &b)
}
