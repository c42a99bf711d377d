// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kddn_core::{DifferentialLabel, NetworkResult, RunDiagnostics, VariableSet};
use kddn_preprocess::StepReport;

/// Condition an output edge belongs to.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    ConditionOne,
    ConditionTwo,
    /// Edge of a single-condition network.
    Static,
}

/// Edge between two named variables.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct NamedEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
    pub p_value: Option<f64>,
}

/// Penalties and thresholds the run actually used.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResolvedParams {
    pub lambda1: f64,
    pub lambda2: f64,
    pub theta: f64,
    pub alpha: f64,
    pub delta: f64,
    pub knowledge_edge_count: usize,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentResult {
    pub variables: VariableSet,
    pub network: NetworkResult,
    pub params: ResolvedParams,
    pub two_condition: bool,
    pub preprocessing: Vec<StepReport>,
    pub diagnostics: RunDiagnostics,
}

impl ExperimentResult {
    fn name(&self, index: usize) -> String {
        self.variables.name(index).unwrap_or_default().to_string()
    }

    /// Output edges with variable names.
    ///
    /// Two-condition runs list the differential edges; single-condition runs
    /// list every edge of the condition-one network as [`EdgeKind::Static`].
    pub fn edges(&self) -> Vec<NamedEdge> {
        if self.two_condition {
            return self
                .network
                .differential_edges
                .iter()
                .filter_map(|edge| {
                    let kind = match edge.label {
                        DifferentialLabel::ConditionOne => EdgeKind::ConditionOne,
                        DifferentialLabel::ConditionTwo => EdgeKind::ConditionTwo,
                        DifferentialLabel::Same => return None,
                    };
                    Some(NamedEdge {
                        source: self.name(edge.source),
                        target: self.name(edge.target),
                        kind,
                        p_value: edge.p_value,
                    })
                })
                .collect();
        }

        let adjacency = &self.network.adjacency;
        let p = adjacency.p();
        let mut edges = vec![];
        for i in 0..p {
            for j in i + 1..p {
                if adjacency.first(i, j) != 0 {
                    edges.push(NamedEdge {
                        source: self.name(i),
                        target: self.name(j),
                        kind: EdgeKind::Static,
                        p_value: None,
                    });
                }
            }
        }
        edges
    }
}
