// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

/// Diagnostics schema version for experiment run metadata.
pub const DIAGNOSTICS_SCHEMA_VERSION: u32 = 1;

/// Structured diagnostics captured from an experiment run.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, PartialEq)]
pub struct RunDiagnostics {
    pub p: usize,
    pub n1: usize,
    pub n2: usize,
    pub schema_version: u32,
    pub engine_version: Option<String>,
    pub runtime_ms: Option<u64>,
    pub notes: Vec<String>,
    pub warnings: Vec<String>,
    pub seed: Option<u64>,
    pub thread_count: Option<usize>,
    pub unconverged_nodes: Vec<usize>,
}

impl Default for RunDiagnostics {
    fn default() -> Self {
        Self {
            p: 0,
            n1: 0,
            n2: 0,
            schema_version: DIAGNOSTICS_SCHEMA_VERSION,
            engine_version: Some(env!("CARGO_PKG_VERSION").to_string()),
            runtime_ms: None,
            notes: vec![],
            warnings: vec![],
            seed: None,
            thread_count: None,
            unconverged_nodes: vec![],
        }
    }
}
