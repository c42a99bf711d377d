// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use std::fmt;
use thiserror::Error;

/// Stage of a run in which a solver call was issued.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RunPhase {
    #[default]
    InitialSolve,
    Lambda1Search,
    Lambda2Search,
    ThetaSearch,
    Permutation,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::InitialSolve => "initial solve",
            Self::Lambda1Search => "lambda1 search",
            Self::Lambda2Search => "lambda2 search",
            Self::ThetaSearch => "theta search",
            Self::Permutation => "permutation",
        };
        f.write_str(name)
    }
}

/// Error type shared by every kddn crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KddnError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("numerical issue: {0}")]
    NumericalIssue(String),
    #[error("node {node} did not converge after {sweeps} sweeps during {phase}")]
    NotConverged {
        node: usize,
        sweeps: usize,
        phase: RunPhase,
    },
    #[error("resource limit exceeded: {0}")]
    ResourceLimit(String),
    #[error("cancelled")]
    Cancelled,
}

impl KddnError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn numerical_issue(message: impl Into<String>) -> Self {
        Self::NumericalIssue(message.into())
    }

    pub fn not_converged(node: usize, sweeps: usize, phase: RunPhase) -> Self {
        Self::NotConverged {
            node,
            sweeps,
            phase,
        }
    }

    pub fn resource_limit(message: impl Into<String>) -> Self {
        Self::ResourceLimit(message.into())
    }

    pub fn cancelled() -> Self {
        Self::Cancelled
    }

    /// Returns true for the cancellation outcome.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
