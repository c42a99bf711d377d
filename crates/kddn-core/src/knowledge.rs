// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::KddnError;
use crate::matrix::VariableSet;
use tracing::{debug, warn};

/// Conditions an external edge is asserted for.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeCondition {
    Both,
    First,
    Second,
}

impl EdgeCondition {
    /// Parses the host flag: `0` both, `1` condition one, `2` condition two.
    pub fn from_flag(flag: &str) -> Result<Self, KddnError> {
        match flag.trim() {
            "0" => Ok(Self::Both),
            "1" => Ok(Self::First),
            "2" => Ok(Self::Second),
            other => Err(KddnError::invalid_input(format!(
                "knowledge edge flag must be 0, 1 or 2; got {other:?}"
            ))),
        }
    }

    fn applies_to_first(self) -> bool {
        matches!(self, Self::Both | Self::First)
    }

    fn applies_to_second(self) -> bool {
        matches!(self, Self::Both | Self::Second)
    }
}

/// One prior-knowledge edge between two named variables.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KnowledgeEdge {
    pub source: String,
    pub target: String,
    pub condition: EdgeCondition,
}

impl KnowledgeEdge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        condition: EdgeCondition,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            condition,
        }
    }

    /// Builds an edge from a host row `(geneA, geneB, flag)`.
    pub fn parse(source: &str, target: &str, flag: &str) -> Result<Self, KddnError> {
        Ok(Self::new(source, target, EdgeCondition::from_flag(flag)?))
    }
}

/// Binary `p × 2p` prior matrix; columns `p..2p` belong to condition two.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PriorKnowledge {
    p: usize,
    bits: Vec<bool>,
}

impl PriorKnowledge {
    /// Prior with no asserted edges.
    pub fn empty(p: usize) -> Self {
        Self {
            p,
            bits: vec![false; p * 2 * p],
        }
    }

    /// Prior with the given unordered pairs asserted in both conditions.
    pub fn from_shared_pairs(p: usize, pairs: &[(usize, usize)]) -> Result<Self, KddnError> {
        let mut prior = Self::empty(p);
        for &(i, j) in pairs {
            prior.assert_pair(i, j, EdgeCondition::Both)?;
        }
        Ok(prior)
    }

    pub fn p(&self) -> usize {
        self.p
    }

    /// Weight at `(row, col)` with `col < 2p`.
    pub fn weight(&self, row: usize, col: usize) -> f64 {
        if self.bits[row * 2 * self.p + col] {
            1.0
        } else {
            0.0
        }
    }

    /// Marks the pair symmetrically for the selected conditions.
    pub fn assert_pair(
        &mut self,
        i: usize,
        j: usize,
        condition: EdgeCondition,
    ) -> Result<(), KddnError> {
        if i >= self.p || j >= self.p {
            return Err(KddnError::invalid_input(format!(
                "knowledge pair ({i}, {j}) out of bounds for p={}",
                self.p
            )));
        }
        let width = 2 * self.p;
        if condition.applies_to_first() {
            self.bits[i * width + j] = true;
            self.bits[j * width + i] = true;
        }
        if condition.applies_to_second() {
            self.bits[i * width + j + self.p] = true;
            self.bits[j * width + i + self.p] = true;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        !self.bits.iter().any(|&bit| bit)
    }

    /// Number of asserted upper-triangle pairs in the condition-one block.
    pub fn knowledge_edge_count(&self) -> usize {
        let width = 2 * self.p;
        (0..self.p)
            .flat_map(|i| (i + 1..self.p).map(move |j| i * width + j))
            .filter(|&index| self.bits[index])
            .count()
    }
}

/// Result of mapping named edges onto variable indices.
#[derive(Clone, Debug, PartialEq)]
pub struct KnowledgeMapping {
    pub prior: PriorKnowledge,
    pub mapped: usize,
    pub skipped_unknown: usize,
    pub skipped_self: usize,
}

/// Maps named edges onto `variables`, matching names case-insensitively.
///
/// Edges naming an unknown variable, or a variable with itself, are skipped.
pub fn map_knowledge(variables: &VariableSet, edges: &[KnowledgeEdge]) -> KnowledgeMapping {
    let mut prior = PriorKnowledge::empty(variables.len());
    let mut mapped = 0;
    let mut skipped_unknown = 0;
    let mut skipped_self = 0;

    for edge in edges {
        let (Some(i), Some(j)) = (
            variables.index_of_ignore_case(&edge.source),
            variables.index_of_ignore_case(&edge.target),
        ) else {
            skipped_unknown += 1;
            continue;
        };
        if i == j {
            skipped_self += 1;
            continue;
        }
        // Both indices come from `variables`, so the pair is in bounds.
        if prior.assert_pair(i, j, edge.condition).is_ok() {
            mapped += 1;
        }
    }

    if skipped_unknown > 0 || skipped_self > 0 {
        warn!(
            skipped_unknown,
            skipped_self, "knowledge edges skipped during mapping"
        );
    }
    debug!(
        mapped,
        knowledge_edges = prior.knowledge_edge_count(),
        "prior knowledge mapped"
    );

    KnowledgeMapping {
        prior,
        mapped,
        skipped_unknown,
        skipped_self,
    }
}

#[cfg(test)]
mod tests {
    use super::{EdgeCondition, KnowledgeEdge, PriorKnowledge, map_knowledge};
    use crate::matrix::VariableSet;

    fn variables() -> VariableSet {
        VariableSet::new(vec!["TP53".into(), "MDM2".into(), "CDKN1A".into()])
            .expect("valid names")
    }

    #[test]
    fn from_flag_parses_host_flags() {
        assert_eq!(EdgeCondition::from_flag("0").expect("flag 0"), EdgeCondition::Both);
        assert_eq!(EdgeCondition::from_flag(" 1 ").expect("flag 1"), EdgeCondition::First);
        assert_eq!(EdgeCondition::from_flag("2").expect("flag 2"), EdgeCondition::Second);
        let err = EdgeCondition::from_flag("3").expect_err("flag 3 is malformed");
        assert!(err.to_string().contains("flag"));
        assert!(KnowledgeEdge::parse("A", "B", "both").is_err());
    }

    #[test]
    fn both_condition_sets_four_symmetric_entries() {
        let mapping = map_knowledge(
            &variables(),
            &[KnowledgeEdge::new("tp53", "Mdm2", EdgeCondition::Both)],
        );
        let prior = &mapping.prior;
        assert_eq!(mapping.mapped, 1);
        assert_eq!(prior.weight(0, 1), 1.0);
        assert_eq!(prior.weight(1, 0), 1.0);
        assert_eq!(prior.weight(0, 4), 1.0);
        assert_eq!(prior.weight(1, 3), 1.0);
        assert_eq!(prior.weight(0, 2), 0.0);
        assert_eq!(prior.knowledge_edge_count(), 1);
    }

    #[test]
    fn single_condition_flags_touch_one_block() {
        let mapping = map_knowledge(
            &variables(),
            &[
                KnowledgeEdge::new("TP53", "CDKN1A", EdgeCondition::First),
                KnowledgeEdge::new("MDM2", "CDKN1A", EdgeCondition::Second),
            ],
        );
        let prior = &mapping.prior;
        assert_eq!(prior.weight(0, 2), 1.0);
        assert_eq!(prior.weight(0, 5), 0.0);
        assert_eq!(prior.weight(1, 2), 0.0);
        assert_eq!(prior.weight(1, 5), 1.0);
        assert_eq!(prior.weight(2, 4), 1.0);
        assert_eq!(prior.knowledge_edge_count(), 1);
    }

    #[test]
    fn unknown_names_and_self_pairs_are_skipped() {
        let mapping = map_knowledge(
            &variables(),
            &[
                KnowledgeEdge::new("TP53", "EGFR", EdgeCondition::Both),
                KnowledgeEdge::new("MDM2", "mdm2", EdgeCondition::Both),
            ],
        );
        assert_eq!(mapping.mapped, 0);
        assert_eq!(mapping.skipped_unknown, 1);
        assert_eq!(mapping.skipped_self, 1);
        assert!(mapping.prior.is_empty());
    }

    #[test]
    fn from_shared_pairs_checks_bounds() {
        let prior = PriorKnowledge::from_shared_pairs(3, &[(0, 2), (1, 2)]).expect("valid pairs");
        assert_eq!(prior.knowledge_edge_count(), 2);
        assert_eq!(prior.weight(2, 3), 1.0);
        assert!(PriorKnowledge::from_shared_pairs(3, &[(0, 3)]).is_err());
    }
}
