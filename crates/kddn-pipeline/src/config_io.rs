// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::experiment::KddnExperiment;
use kddn_core::{KddnError, RunConfig};

/// Parses and validates a JSON run configuration; absent fields take their
/// defaults.
pub fn parse_run_config(json: &str) -> Result<RunConfig, KddnError> {
    let config: RunConfig = serde_json::from_str(json)
        .map_err(|err| KddnError::invalid_input(format!("invalid run config JSON: {err}")))?;
    config.validate()?;
    Ok(config)
}

/// Parses and validates a JSON experiment including search settings.
pub fn parse_experiment_config(json: &str) -> Result<KddnExperiment, KddnError> {
    let experiment: KddnExperiment = serde_json::from_str(json)
        .map_err(|err| KddnError::invalid_input(format!("invalid experiment JSON: {err}")))?;
    experiment.config.validate()?;
    experiment.lambda2_search.validate()?;
    experiment.theta_search.validate()?;
    Ok(experiment)
}
