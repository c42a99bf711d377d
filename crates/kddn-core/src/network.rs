// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::KddnError;

/// Row-major `p × 2p` matrix: columns `0..p` hold condition one and
/// columns `p..2p` condition two.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct BlockMatrix<T> {
    p: usize,
    values: Vec<T>,
}

pub type CoefficientMatrix = BlockMatrix<f64>;
pub type SignMatrix = BlockMatrix<i8>;

impl<T: Copy + Default> BlockMatrix<T> {
    pub fn zeros(p: usize) -> Self {
        Self {
            p,
            values: vec![T::default(); p * 2 * p],
        }
    }

    /// Builds a matrix from `p` rows of `2p` values each.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self, KddnError> {
        let p = rows.len();
        let mut values = Vec::with_capacity(p * 2 * p);
        for (index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != 2 * p {
                return Err(KddnError::invalid_input(format!(
                    "block row {index} has {} values, expected {}",
                    row.len(),
                    2 * p
                )));
            }
            values.extend_from_slice(row);
        }
        Ok(Self { p, values })
    }

    pub fn p(&self) -> usize {
        self.p
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.values[row * 2 * self.p + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.values[row * 2 * self.p + col] = value;
    }

    /// Entry of the condition-one block.
    pub fn first(&self, row: usize, col: usize) -> T {
        self.get(row, col)
    }

    /// Entry of the condition-two block.
    pub fn second(&self, row: usize, col: usize) -> T {
        self.get(row, col + self.p)
    }

    pub fn row(&self, row: usize) -> &[T] {
        let width = 2 * self.p;
        &self.values[row * width..(row + 1) * width]
    }

    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        let width = 2 * self.p;
        &mut self.values[row * width..(row + 1) * width]
    }

    /// Backing storage, `2p` values per row.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.values
    }
}

impl CoefficientMatrix {
    /// Elementwise sign in `{-1, 0, 1}`.
    pub fn signs(&self) -> SignMatrix {
        BlockMatrix {
            p: self.p,
            values: self.values.iter().map(|&value| sign_of(value)).collect(),
        }
    }
}

pub fn sign_of(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Label of an unordered pair in the differential network.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum DifferentialLabel {
    #[default]
    Same,
    ConditionOne,
    ConditionTwo,
}

impl DifferentialLabel {
    /// Labels a pair from its condition-one and condition-two signs.
    ///
    /// Opposite nonzero signs are `Same`; symmetrization never produces
    /// them, so the pair has no condition-private edge.
    pub fn from_signs(first: i8, second: i8) -> Self {
        if first == second {
            Self::Same
        } else if first == 0 {
            Self::ConditionTwo
        } else if second == 0 {
            Self::ConditionOne
        } else {
            Self::Same
        }
    }

    /// Host encoding: 0 same, 1 condition one, 2 condition two.
    pub fn code(self) -> u8 {
        match self {
            Self::Same => 0,
            Self::ConditionOne => 1,
            Self::ConditionTwo => 2,
        }
    }
}

/// Ternary `p × p` network over unordered pairs.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct DifferentialNetwork {
    p: usize,
    labels: Vec<DifferentialLabel>,
}

impl DifferentialNetwork {
    /// Labels every pair `i < j` of a symmetrized adjacency.
    pub fn from_adjacency(adjacency: &SignMatrix) -> Self {
        let p = adjacency.p();
        let mut labels = vec![DifferentialLabel::Same; p * p];
        for i in 0..p {
            for j in i + 1..p {
                labels[i * p + j] =
                    DifferentialLabel::from_signs(adjacency.first(i, j), adjacency.second(i, j));
            }
        }
        Self { p, labels }
    }

    pub fn p(&self) -> usize {
        self.p
    }

    /// Label of the unordered pair `{i, j}`.
    pub fn label(&self, i: usize, j: usize) -> DifferentialLabel {
        let (lo, hi) = if i <= j { (i, j) } else { (j, i) };
        self.labels[lo * self.p + hi]
    }

    /// Differential pairs `i < j` ordered by `(i, j)`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize, DifferentialLabel)> + '_ {
        (0..self.p)
            .flat_map(move |i| (i + 1..self.p).map(move |j| (i, j)))
            .filter_map(move |(i, j)| {
                let label = self.labels[i * self.p + j];
                (label != DifferentialLabel::Same).then_some((i, j, label))
            })
    }
}

/// One row of the p-value table.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DifferentialEdge {
    pub source: usize,
    pub target: usize,
    pub label: DifferentialLabel,
    pub p_value: Option<f64>,
}

/// Output of one orchestrator call.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkResult {
    pub beta: CoefficientMatrix,
    pub adjacency: SignMatrix,
    pub differential: DifferentialNetwork,
    pub differential_edges: Vec<DifferentialEdge>,
    pub unconverged_nodes: Vec<usize>,
}

impl NetworkResult {
    /// Assembles a result from coefficients and their symmetrized signs.
    pub fn new(
        beta: CoefficientMatrix,
        adjacency: SignMatrix,
        unconverged_nodes: Vec<usize>,
    ) -> Self {
        let differential = DifferentialNetwork::from_adjacency(&adjacency);
        let differential_edges = differential
            .edges()
            .map(|(source, target, label)| DifferentialEdge {
                source,
                target,
                label,
                p_value: None,
            })
            .collect();
        Self {
            beta,
            adjacency,
            differential,
            differential_edges,
            unconverged_nodes,
        }
    }

    pub fn p(&self) -> usize {
        self.beta.p()
    }

    pub fn total_edges(&self) -> usize {
        total_edges(&self.adjacency)
    }
}

/// Edges over both conditions: pairs `i < j` with a nonzero sign, counted
/// once per condition.
pub fn total_edges(adjacency: &SignMatrix) -> usize {
    let p = adjacency.p();
    let mut count = 0;
    for i in 0..p {
        for j in i + 1..p {
            count += usize::from(adjacency.first(i, j) != 0);
            count += usize::from(adjacency.second(i, j) != 0);
        }
    }
    count
}

/// Share of directed coefficients that differ between conditions, doubled.
///
/// Every nonzero coefficient adds to the network size; a coefficient present
/// in only one condition adds one difference, and a sign flip adds one more.
/// Returns `None` when no coefficient is nonzero.
pub fn null_differential_rate(beta: &CoefficientMatrix) -> Option<f64> {
    let p = beta.p();
    let mut net_size = 0usize;
    let mut dif_size = 0usize;
    for i in 0..p {
        for j in 0..p {
            let first = beta.first(i, j);
            let second = beta.second(i, j);
            net_size += usize::from(first != 0.0);
            net_size += usize::from(second != 0.0);
            if (first == 0.0) != (second == 0.0) {
                dif_size += 1;
            }
            if first * second < 0.0 {
                dif_size += 1;
            }
        }
    }
    (net_size > 0).then(|| dif_size as f64 / net_size as f64 * 2.0)
}

/// Directed `p × p` indicator, row-major: coefficient `(i, j)` is present in
/// exactly one condition or flips sign.
pub fn differential_support(beta: &CoefficientMatrix) -> Vec<bool> {
    let p = beta.p();
    let mut support = Vec::with_capacity(p * p);
    for i in 0..p {
        for j in 0..p {
            let first = beta.first(i, j);
            let second = beta.second(i, j);
            support.push((first == 0.0) != (second == 0.0) || first * second < 0.0);
        }
    }
    support
}
