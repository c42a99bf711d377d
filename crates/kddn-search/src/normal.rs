// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kddn_core::KddnError;

const SPLIT: f64 = 0.42;
const A: [f64; 4] = [2.50662823884, -18.61500062529, 41.39119773534, -25.44106049637];
const B: [f64; 4] = [-8.47351093090, 23.08336743743, -21.06224101826, 3.13082909833];
const C: [f64; 4] = [-2.78718931138, -2.29796479134, 4.85014127135, 2.32121276858];
const D: [f64; 2] = [3.54388924762, 1.63706781897];

/// Lower-tail standard normal quantile, Beasley–Springer AS 111.
///
/// Accurate to about 1e-6 in the tails. The endpoints `0` and `1` have no
/// finite quantile; the algorithm returns `0` for both.
pub fn qnorm(p: f64) -> Result<f64, KddnError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(KddnError::invalid_input(format!(
            "qnorm probability must lie in [0, 1]; got {p}"
        )));
    }

    let q = p - 0.5;
    if q.abs() <= SPLIT {
        let r = q * q;
        let num = ((A[3] * r + A[2]) * r + A[1]) * r + A[0];
        let den = (((B[3] * r + B[2]) * r + B[1]) * r + B[0]) * r + 1.0;
        return Ok(q * num / den);
    }

    let tail = if q > 0.0 { 1.0 - p } else { p };
    if tail <= 0.0 {
        return Ok(0.0);
    }
    let r = (-tail.ln()).sqrt();
    let value = (((C[3] * r + C[2]) * r + C[1]) * r + C[0]) / ((D[1] * r + D[0]) * r + 1.0);
    Ok(if q < 0.0 { -value } else { value })
}
