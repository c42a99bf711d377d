// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::fused::{FusedPenalty, solve2d};
use kddn_core::{KddnError, SolverConfig};

/// One nodewise regression: responses of both conditions against the
/// remaining `q` predictor columns.
#[derive(Clone, Debug)]
pub struct NodeProblem<'a> {
    y1: &'a [f64],
    y2: &'a [f64],
    x1: Vec<&'a [f64]>,
    x2: Vec<&'a [f64]>,
    lambda1: &'a [f64],
    lambda2: f64,
}

impl<'a> NodeProblem<'a> {
    /// `lambda1` holds the `q` condition-one weights followed by the `q`
    /// condition-two weights.
    pub fn new(
        y1: &'a [f64],
        y2: &'a [f64],
        x1: Vec<&'a [f64]>,
        x2: Vec<&'a [f64]>,
        lambda1: &'a [f64],
        lambda2: f64,
    ) -> Result<Self, KddnError> {
        let q = x1.len();
        if x2.len() != q {
            return Err(KddnError::invalid_input(format!(
                "predictor count mismatch: {q} condition-one vs {} condition-two columns",
                x2.len()
            )));
        }
        if lambda1.len() != 2 * q {
            return Err(KddnError::invalid_input(format!(
                "lambda1 length mismatch: got {}, expected {}",
                lambda1.len(),
                2 * q
            )));
        }
        if let Some(col) = x1.iter().position(|column| column.len() != y1.len()) {
            return Err(KddnError::invalid_input(format!(
                "condition-one predictor {col} has {} samples, expected {}",
                x1[col].len(),
                y1.len()
            )));
        }
        if let Some(col) = x2.iter().position(|column| column.len() != y2.len()) {
            return Err(KddnError::invalid_input(format!(
                "condition-two predictor {col} has {} samples, expected {}",
                x2[col].len(),
                y2.len()
            )));
        }
        if !lambda2.is_finite() || lambda2 < 0.0 {
            return Err(KddnError::invalid_input(format!(
                "lambda2 must be finite and >= 0; got {lambda2}"
            )));
        }
        Ok(Self {
            y1,
            y2,
            x1,
            x2,
            lambda1,
            lambda2,
        })
    }

    /// Number of predictors per condition.
    pub fn q(&self) -> usize {
        self.x1.len()
    }

    fn penalty(&self, k: usize) -> FusedPenalty {
        FusedPenalty::new(self.lambda1[k], self.lambda1[k + self.q()], self.lambda2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SolveOutcome {
    Converged { sweeps: usize },
    IterationLimitExceeded { sweeps: usize, last_change: f64 },
}

impl SolveOutcome {
    pub fn converged(&self) -> bool {
        matches!(self, Self::Converged { .. })
    }

    pub fn sweeps(&self) -> usize {
        match self {
            Self::Converged { sweeps } | Self::IterationLimitExceeded { sweeps, .. } => *sweeps,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeSolution {
    pub beta1: Vec<f64>,
    pub beta2: Vec<f64>,
    pub outcome: SolveOutcome,
}

fn partial_residual(y: &[f64], x: &[&[f64]], beta: &[f64], skip: usize, out: &mut [f64]) {
    out.copy_from_slice(y);
    for (col, (column, &coef)) in x.iter().zip(beta).enumerate() {
        if col == skip {
            continue;
        }
        for (value, &predictor) in out.iter_mut().zip(column.iter()) {
            *value -= predictor * coef;
        }
    }
}

/// Runs block coordinate descent on one node.
///
/// Coordinates are visited round-robin from index `1 % q`, continuing across
/// sweeps. After each sweep of `q` updates the run stops once the summed
/// absolute change of both coefficient vectors drops below
/// `tolerance · 2q`.
pub fn solve_node(problem: &NodeProblem<'_>, config: &SolverConfig) -> NodeSolution {
    let q = problem.q();
    let mut beta1 = vec![0.0; q];
    let mut beta2 = vec![0.0; q];

    if q == 0 {
        return NodeSolution {
            beta1,
            beta2,
            outcome: SolveOutcome::Converged { sweeps: 0 },
        };
    }

    if q == 1 {
        let step = solve2d(
            problem.y1,
            problem.y2,
            problem.x1[0],
            problem.x2[0],
            &problem.penalty(0),
        );
        beta1[0] = step.b1;
        beta2[0] = step.b2;
        return NodeSolution {
            beta1,
            beta2,
            outcome: SolveOutcome::Converged { sweeps: 1 },
        };
    }

    let mut z1 = vec![0.0; problem.y1.len()];
    let mut z2 = vec![0.0; problem.y2.len()];
    let mut beta1_old = vec![0.0; q];
    let mut beta2_old = vec![0.0; q];
    let threshold = config.tolerance * q as f64 * 2.0;
    let mut counter = 0usize;
    let mut last_change = f64::INFINITY;

    for sweep in 1..=config.max_sweeps {
        beta1_old.copy_from_slice(&beta1);
        beta2_old.copy_from_slice(&beta2);

        for _ in 0..q {
            counter += 1;
            let k = counter % q;
            partial_residual(problem.y1, &problem.x1, &beta1, k, &mut z1);
            partial_residual(problem.y2, &problem.x2, &beta2, k, &mut z2);
            let step = solve2d(&z1, &z2, problem.x1[k], problem.x2[k], &problem.penalty(k));
            beta1[k] = step.b1;
            beta2[k] = step.b2;
        }

        last_change = beta1
            .iter()
            .zip(&beta1_old)
            .zip(beta2.iter().zip(&beta2_old))
            .map(|((b1, o1), (b2, o2))| (b1 - o1).abs() + (b2 - o2).abs())
            .sum();
        if last_change < threshold {
            return NodeSolution {
                beta1,
                beta2,
                outcome: SolveOutcome::Converged { sweeps: sweep },
            };
        }
    }

    NodeSolution {
        beta1,
        beta2,
        outcome: SolveOutcome::IterationLimitExceeded {
            sweeps: config.max_sweeps,
            last_change,
        },
    }
}
