// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use kddn_core::SignMatrix;

fn merge(a: i8, b: i8) -> Option<i8> {
    let sum = a + b;
    let product = a * b;
    if sum > 0 && product >= 0 {
        Some(1)
    } else if sum < 0 && product >= 0 {
        Some(-1)
    } else if product < 0 {
        Some(0)
    } else {
        None
    }
}

/// Makes each condition block symmetric in place.
///
/// A pair with one nonzero sign, or two equal ones, takes that sign in both
/// directions; opposite signs cancel to zero.
pub fn symmetrize(adjacency: &mut SignMatrix) {
    let p = adjacency.p();
    for offset in [0, p] {
        for i in 0..p {
            for j in i + 1..p {
                let upper = adjacency.get(i, j + offset);
                let lower = adjacency.get(j, i + offset);
                if let Some(sign) = merge(upper, lower) {
                    adjacency.set(i, j + offset, sign);
                    adjacency.set(j, i + offset, sign);
                }
            }
        }
    }
}

pub fn symmetrized(adjacency: &SignMatrix) -> SignMatrix {
    let mut out = adjacency.clone();
    symmetrize(&mut out);
    out
}
