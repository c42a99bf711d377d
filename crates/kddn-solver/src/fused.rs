// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

//! Closed-form minimizer of the two-coefficient fused-lasso subproblem
//!
//! ```text
//! 0.5·‖z1 − b1·x1‖² + 0.5·‖z2 − b2·x2‖² + λa|b1| + λb|b2| + λ2|b1 − b2|
//! ```
//!
//! for unit-norm `x1`, `x2`. The plane of correlations `(ρ1, ρ2)` splits into
//! twelve regions with an affine solution each. Regions are tested in a fixed
//! order and a later match overwrites an earlier one, which only matters on
//! shared boundaries where both formulas agree.

/// Penalties of one coordinate pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FusedPenalty {
    /// Lasso weight of the condition-one coefficient.
    pub lambda_a: f64,
    /// Lasso weight of the condition-two coefficient.
    pub lambda_b: f64,
    /// Fusion weight on the difference.
    pub lambda2: f64,
}

impl FusedPenalty {
    pub fn new(lambda_a: f64, lambda_b: f64, lambda2: f64) -> Self {
        Self {
            lambda_a,
            lambda_b,
            lambda2,
        }
    }
}

/// Solution region, listed in evaluation order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FusedRegion {
    /// No region matched; both coefficients are zero.
    Zero,
    FusedPositive,
    PositiveSecondLarger,
    SecondOnlyPositive,
    OppositeFirstNegative,
    FirstOnlyNegative,
    NegativeSecondLarger,
    FusedNegative,
    NegativeFirstLarger,
    SecondOnlyNegative,
    OppositeFirstPositive,
    FirstOnlyPositive,
    PositiveFirstLarger,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FusedStep {
    pub b1: f64,
    pub b2: f64,
    pub region: FusedRegion,
}

impl FusedStep {
    fn new(b1: f64, b2: f64, region: FusedRegion) -> Self {
        Self { b1, b2, region }
    }
}

/// Solves the subproblem from the correlations `ρ1 = x1ᵀz1`, `ρ2 = x2ᵀz2`.
pub fn solve_fused_pair(rho1: f64, rho2: f64, penalty: &FusedPenalty) -> FusedStep {
    let la = penalty.lambda_a;
    let lb = penalty.lambda_b;
    let l2 = penalty.lambda2;
    let mut step = FusedStep::new(0.0, 0.0, FusedRegion::Zero);

    if rho2 <= (rho1 - (la - lb) + 2.0 * l2)
        && rho2 >= (rho1 - (la - lb) - 2.0 * l2)
        && rho2 >= (la + lb - rho1)
    {
        let fused = (rho1 + rho2) / 2.0 - (la + lb) / 2.0;
        step = FusedStep::new(fused, fused, FusedRegion::FusedPositive);
    }

    if rho2 > (rho1 - (la - lb) + 2.0 * l2) && rho1 >= (la - l2) {
        step = FusedStep::new(
            rho1 - la + l2,
            rho2 - lb - l2,
            FusedRegion::PositiveSecondLarger,
        );
    }

    if rho1 < (la - l2) && rho1 >= -(la + l2) && rho2 >= (lb + l2) {
        step = FusedStep::new(0.0, rho2 - lb - l2, FusedRegion::SecondOnlyPositive);
    }

    if rho1 < -(la + l2) && rho2 >= (lb + l2) {
        step = FusedStep::new(
            rho1 + la + l2,
            rho2 - lb - l2,
            FusedRegion::OppositeFirstNegative,
        );
    }

    if rho1 < -(la + l2) && rho2 < (lb + l2) && rho2 >= -(lb - l2) {
        step = FusedStep::new(rho1 + la + l2, 0.0, FusedRegion::FirstOnlyNegative);
    }

    if rho2 < -(lb - l2) && rho2 >= (rho1 + (la - lb) + 2.0 * l2) {
        step = FusedStep::new(
            rho1 + la + l2,
            rho2 + lb - l2,
            FusedRegion::NegativeSecondLarger,
        );
    }

    if rho2 >= (rho1 + (la - lb) - 2.0 * l2)
        && rho2 < (rho1 + (la - lb) + 2.0 * l2)
        && rho2 <= (-(la + lb) - rho1)
    {
        let fused = (rho1 + rho2) / 2.0 + (la + lb) / 2.0;
        step = FusedStep::new(fused, fused, FusedRegion::FusedNegative);
    }

    if rho2 < (rho1 + (la - lb) - 2.0 * l2) && rho1 <= -(la - l2) {
        step = FusedStep::new(
            rho1 + la - l2,
            rho2 + lb + l2,
            FusedRegion::NegativeFirstLarger,
        );
    }

    if rho1 <= (la + l2) && rho1 >= -(la - l2) && rho2 <= -(lb + l2) {
        step = FusedStep::new(0.0, rho2 + lb + l2, FusedRegion::SecondOnlyNegative);
    }

    if rho1 > (la + l2) && rho2 <= -(lb + l2) {
        step = FusedStep::new(
            rho1 - la - l2,
            rho2 + lb + l2,
            FusedRegion::OppositeFirstPositive,
        );
    }

    if rho2 > -(lb + l2) && rho2 <= (lb - l2) && rho1 >= (la + l2) {
        step = FusedStep::new(rho1 - la - l2, 0.0, FusedRegion::FirstOnlyPositive);
    }

    if rho2 > (lb - l2) && rho2 < (rho1 - (la - lb) - 2.0 * l2) {
        step = FusedStep::new(
            rho1 - la - l2,
            rho2 - lb + l2,
            FusedRegion::PositiveFirstLarger,
        );
    }

    step
}

/// Inner product accumulated left to right.
pub fn dot(left: &[f64], right: &[f64]) -> f64 {
    left.iter().zip(right).fold(0.0, |acc, (l, r)| acc + l * r)
}

/// Solves the subproblem for partial residuals `z` and predictor columns `x`.
pub fn solve2d(
    z1: &[f64],
    z2: &[f64],
    x1: &[f64],
    x2: &[f64],
    penalty: &FusedPenalty,
) -> FusedStep {
    solve_fused_pair(dot(z1, x1), dot(z2, x2), penalty)
}

#[cfg(test)]
mod tests {
    use super::{FusedPenalty, FusedRegion, dot, solve2d, solve_fused_pair};

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-12,
            "actual={actual}, expected={expected}"
        );
    }

    fn check(rho1: f64, rho2: f64, penalty: FusedPenalty, b1: f64, b2: f64, region: FusedRegion) {
        let step = solve_fused_pair(rho1, rho2, &penalty);
        assert_eq!(step.region, region, "rho=({rho1}, {rho2})");
        assert_close(step.b1, b1);
        assert_close(step.b2, b2);
    }

    #[test]
    fn representative_points_land_in_expected_regions() {
        let penalty = FusedPenalty::new(0.1, 0.1, 0.05);
        check(1.0, 1.02, penalty, 0.91, 0.91, FusedRegion::FusedPositive);
        check(1.0, 0.0, penalty, 0.85, 0.0, FusedRegion::FirstOnlyPositive);
        check(0.0, 1.0, penalty, 0.0, 0.85, FusedRegion::SecondOnlyPositive);
        check(-1.0, 1.0, penalty, -0.85, 0.85, FusedRegion::OppositeFirstNegative);
        check(1.0, -1.0, penalty, 0.85, -0.85, FusedRegion::OppositeFirstPositive);
        check(-1.0, -1.3, penalty, -0.95, -1.15, FusedRegion::NegativeFirstLarger);
        check(-1.3, -1.0, penalty, -1.15, -0.95, FusedRegion::NegativeSecondLarger);
        check(-1.0, -1.02, penalty, -0.91, -0.91, FusedRegion::FusedNegative);
        check(0.0, -1.0, penalty, 0.0, -0.85, FusedRegion::SecondOnlyNegative);
        check(-1.0, 0.0, penalty, -0.85, 0.0, FusedRegion::FirstOnlyNegative);
        check(1.3, 1.0, penalty, 1.15, 0.95, FusedRegion::PositiveFirstLarger);
        check(1.0, 1.3, penalty, 0.95, 1.15, FusedRegion::PositiveSecondLarger);
    }

    #[test]
    fn small_correlations_give_zero() {
        let penalty = FusedPenalty::new(0.1, 0.1, 0.05);
        check(0.05, 0.02, penalty, 0.0, 0.0, FusedRegion::Zero);
        check(0.0, 0.0, penalty, 0.0, 0.0, FusedRegion::Zero);
    }

    #[test]
    fn zero_fusion_penalty_decouples_into_soft_thresholds() {
        let penalty = FusedPenalty::new(0.1, 0.2, 0.0);
        let step = solve_fused_pair(0.3, 0.5, &penalty);
        assert_close(step.b1, 0.2);
        assert_close(step.b2, 0.3);
    }

    #[test]
    fn solve2d_uses_inner_products() {
        let penalty = FusedPenalty::new(0.1, 0.1, 0.05);
        let x = [0.6, 0.8];
        let z1 = [0.6, 0.8];
        let z2 = [0.0, 0.0];
        assert_close(dot(&z1, &x), 1.0);
        let step = solve2d(&z1, &z2, &x, &x, &penalty);
        assert_eq!(step.region, FusedRegion::FirstOnlyPositive);
        assert_close(step.b1, 0.85);
        assert_eq!(step.b2, 0.0);
    }
}
