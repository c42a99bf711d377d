// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::error::KddnError;

/// Default convergence tolerance per coefficient of a BCD sweep.
pub const DEFAULT_TOLERANCE: f64 = 1e-5;
/// Default sweep limit of a single nodewise regression.
pub const DEFAULT_MAX_SWEEPS: usize = 10_000;
/// Upper bound for the knowledge weight.
pub const MAX_THETA: f64 = 0.5;

/// A hyperparameter that is either fixed by the caller or tuned automatically.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Param {
    #[default]
    Auto,
    Fixed(f64),
}

impl Param {
    /// Maps the host convention where `-1` (any negative value) means auto.
    pub fn from_sentinel(value: f64) -> Self {
        if value < 0.0 {
            Self::Auto
        } else {
            Self::Fixed(value)
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, Self::Auto)
    }

    pub fn fixed(&self) -> Option<f64> {
        match self {
            Self::Auto => None,
            Self::Fixed(value) => Some(*value),
        }
    }
}

/// What to do with a node whose regression exhausts its sweep limit.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NonConvergencePolicy {
    /// Fail the whole run.
    #[default]
    Abort,
    /// Zero the node's row, record it, and continue.
    SkipNode,
}

/// Block coordinate descent settings.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SolverConfig {
    pub tolerance: f64,
    pub max_sweeps: usize,
    pub non_convergence: NonConvergencePolicy,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_sweeps: DEFAULT_MAX_SWEEPS,
            non_convergence: NonConvergencePolicy::Abort,
        }
    }
}

impl SolverConfig {
    pub fn validate(&self) -> Result<(), KddnError> {
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(KddnError::invalid_input(format!(
                "solver tolerance must be finite and > 0; got {}",
                self.tolerance
            )));
        }
        if self.max_sweeps == 0 {
            return Err(KddnError::invalid_input("solver max_sweeps must be >= 1"));
        }
        Ok(())
    }
}

/// Resolved penalties of one orchestrator call.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PenaltyParams {
    pub lambda1: f64,
    pub lambda2: f64,
    pub theta: f64,
}

impl PenaltyParams {
    pub fn new(lambda1: f64, lambda2: f64, theta: f64) -> Self {
        Self {
            lambda1,
            lambda2,
            theta,
        }
    }

    pub fn validate(&self) -> Result<(), KddnError> {
        validate_lambda1(self.lambda1)?;
        validate_lambda2(self.lambda2)?;
        validate_theta(self.theta)
    }
}

fn validate_lambda1(value: f64) -> Result<(), KddnError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(KddnError::invalid_input(format!(
            "lambda1 must be finite and > 0; got {value}"
        )));
    }
    Ok(())
}

fn validate_lambda2(value: f64) -> Result<(), KddnError> {
    if !value.is_finite() || value < 0.0 {
        return Err(KddnError::invalid_input(format!(
            "lambda2 must be finite and >= 0; got {value}"
        )));
    }
    Ok(())
}

fn validate_theta(value: f64) -> Result<(), KddnError> {
    if !value.is_finite() || !(0.0..=MAX_THETA).contains(&value) {
        return Err(KddnError::invalid_input(format!(
            "theta must lie in [0, {MAX_THETA}]; got {value}"
        )));
    }
    Ok(())
}

/// Full configuration of an experiment run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    pub lambda1: Param,
    pub lambda2: Param,
    pub alpha: f64,
    pub theta: Param,
    pub delta: f64,
    pub num_permutation: usize,
    pub two_condition: bool,
    pub need_pvalue: bool,
    pub seed: u64,
    pub solver: SolverConfig,
    pub num_threads: Option<usize>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            lambda1: Param::Auto,
            lambda2: Param::Auto,
            alpha: 0.05,
            theta: Param::Auto,
            delta: 0.1,
            num_permutation: 1000,
            two_condition: true,
            need_pvalue: false,
            seed: 0,
            solver: SolverConfig::default(),
            num_threads: None,
        }
    }
}

impl RunConfig {
    /// Rejects configurations that no run could satisfy.
    pub fn validate(&self) -> Result<(), KddnError> {
        if let Param::Fixed(value) = self.lambda1 {
            validate_lambda1(value)?;
        }
        if let Param::Fixed(value) = self.lambda2 {
            validate_lambda2(value)?;
        }
        if let Param::Fixed(value) = self.theta {
            validate_theta(value)?;
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 || self.alpha >= 1.0 {
            return Err(KddnError::invalid_input(format!(
                "alpha must lie in (0, 1); got {}",
                self.alpha
            )));
        }
        if !self.delta.is_finite() || self.delta <= 0.0 {
            return Err(KddnError::invalid_input(format!(
                "delta must be finite and > 0; got {}",
                self.delta
            )));
        }
        if self.need_pvalue && self.num_permutation == 0 {
            return Err(KddnError::invalid_input(
                "num_permutation must be >= 1 when p-values are requested",
            ));
        }
        if self.num_threads == Some(0) {
            return Err(KddnError::invalid_input("num_threads must be >= 1 when set"));
        }
        self.solver.validate()
    }
}
