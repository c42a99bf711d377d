// SPDX-License-Identifier: MIT OR Apache-2.0

#![forbid(unsafe_code)]

use crate::result::{ExperimentResult, ResolvedParams};
use kddn_core::{
    ConditionMatrix, ExecutionContext, KddnError, KnowledgeEdge, Param, PenaltyParams,
    RunConfig, RunDiagnostics, RunPhase, map_knowledge,
};
use kddn_preprocess::{PreprocessConfig, PreprocessPipeline, standardize};
use kddn_search::{
    Lambda2Search, ThetaSearch, calculate_pvalues, find_lambda1, find_lambda2, find_theta,
};
use kddn_solver::solve_ddn;
use std::time::Instant;
use tracing::{info, warn};

const LAMBDA2_WINDOW: (f64, f64) = (0.0, 0.3);
const THETA_WINDOW: (f64, f64) = (0.3, 0.6);
const PVALUE_WINDOW: (f64, f64) = (0.6, 1.0);

/// Named expression data and optional prior knowledge for one run.
#[derive(Clone, Debug, PartialEq)]
pub struct ExperimentInput {
    pub names: Vec<String>,
    pub data1: ConditionMatrix,
    /// Condition-two samples; ignored by single-condition runs.
    pub data2: Option<ConditionMatrix>,
    pub knowledge: Vec<KnowledgeEdge>,
}

impl ExperimentInput {
    pub fn two_condition(
        names: Vec<String>,
        data1: ConditionMatrix,
        data2: ConditionMatrix,
    ) -> Self {
        Self {
            names,
            data1,
            data2: Some(data2),
            knowledge: vec![],
        }
    }

    pub fn single_condition(names: Vec<String>, data: ConditionMatrix) -> Self {
        Self {
            names,
            data1: data,
            data2: None,
            knowledge: vec![],
        }
    }

    pub fn with_knowledge(mut self, knowledge: Vec<KnowledgeEdge>) -> Self {
        self.knowledge = knowledge;
        self
    }
}

/// Configured experiment: run settings plus the search tunables.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KddnExperiment {
    pub config: RunConfig,
    pub preprocess: PreprocessConfig,
    pub lambda2_search: Lambda2Search,
    pub theta_search: ThetaSearch,
}

impl KddnExperiment {
    pub fn new(config: RunConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn with_lambda2_search(mut self, search: Lambda2Search) -> Self {
        self.lambda2_search = search;
        self
    }

    pub fn with_theta_search(mut self, search: ThetaSearch) -> Self {
        self.theta_search = search;
        self
    }

    /// Runs the experiment, on a dedicated pool when `num_threads` is set.
    pub fn run(
        &self,
        input: &ExperimentInput,
        ctx: &ExecutionContext<'_>,
    ) -> Result<ExperimentResult, KddnError> {
        self.config.validate()?;
        self.lambda2_search.validate()?;
        self.theta_search.validate()?;
        let started_at = Instant::now();

        let mut result = match self.config.num_threads {
            Some(threads) => self.run_on_pool(threads, input, ctx)?,
            None => self.run_inner(input, ctx)?,
        };

        result.diagnostics.runtime_ms =
            Some(u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX));
        ctx.report_progress(1.0);
        info!(
            p = result.diagnostics.p,
            lambda1 = result.params.lambda1,
            lambda2 = result.params.lambda2,
            theta = result.params.theta,
            differential = result.network.differential_edges.len(),
            runtime_ms = result.diagnostics.runtime_ms,
            "experiment finished"
        );
        Ok(result)
    }

    #[cfg(feature = "rayon")]
    fn run_on_pool(
        &self,
        threads: usize,
        input: &ExperimentInput,
        ctx: &ExecutionContext<'_>,
    ) -> Result<ExperimentResult, KddnError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|err| {
                KddnError::resource_limit(format!("failed to build {threads}-thread pool: {err}"))
            })?;
        let mut result = pool.install(|| self.run_inner(input, ctx))?;
        result.diagnostics.thread_count = Some(threads);
        Ok(result)
    }

    #[cfg(not(feature = "rayon"))]
    fn run_on_pool(
        &self,
        threads: usize,
        input: &ExperimentInput,
        ctx: &ExecutionContext<'_>,
    ) -> Result<ExperimentResult, KddnError> {
        let mut result = self.run_inner(input, ctx)?;
        result.diagnostics.warnings.push(format!(
            "num_threads={threads} ignored; built without rayon"
        ));
        result.diagnostics.thread_count = Some(1);
        Ok(result)
    }

    fn run_inner(
        &self,
        input: &ExperimentInput,
        ctx: &ExecutionContext<'_>,
    ) -> Result<ExperimentResult, KddnError> {
        let config = &self.config;
        let mut notes = vec![];
        let mut warnings = vec![];

        let data2 = if config.two_condition {
            input.data2.as_ref().ok_or_else(|| {
                KddnError::invalid_input("two-condition run needs condition-two data")
            })?
        } else {
            if input.data2.is_some() {
                warnings.push("condition-two data ignored in single-condition run".to_string());
            }
            &input.data1
        };

        let preprocessed = PreprocessPipeline::new(PreprocessConfig {
            standardize: false,
            ..self.preprocess
        })
        .apply(&input.names, &input.data1, data2)?;
        let raw1 = &preprocessed.data1;
        let raw2 = &preprocessed.data2;
        let p = preprocessed.variables.len();

        let mapping = map_knowledge(&preprocessed.variables, &input.knowledge);
        if mapping.skipped_unknown > 0 || mapping.skipped_self > 0 {
            warnings.push(format!(
                "knowledge edges skipped: unknown={}, self={}",
                mapping.skipped_unknown, mapping.skipped_self
            ));
        }
        let prior = mapping.prior;
        let knowledge_edge_count = prior.knowledge_edge_count();
        ctx.check_cancelled()?;

        let lambda1 = match config.lambda1 {
            Param::Fixed(value) => value,
            Param::Auto => {
                let value = find_lambda1(raw1, raw2, &config.solver, ctx)?;
                notes.push(format!("lambda1 resolved automatically: {value}"));
                value
            }
        };
        ctx.check_cancelled()?;

        let lambda2 = match config.lambda2 {
            Param::Fixed(value) => value,
            Param::Auto if config.two_condition => {
                let value = find_lambda2(
                    raw1,
                    raw2,
                    lambda1,
                    config.alpha,
                    config.seed,
                    &self.lambda2_search,
                    &config.solver,
                    &ctx.subtask(LAMBDA2_WINDOW.0, LAMBDA2_WINDOW.1),
                )?;
                notes.push(format!("lambda2 resolved automatically: {value}"));
                value
            }
            Param::Auto => 0.0,
        };
        ctx.check_cancelled()?;
        ctx.report_progress(LAMBDA2_WINDOW.1);

        let theta = match config.theta {
            Param::Fixed(value) => value,
            Param::Auto if knowledge_edge_count > 0 => {
                let value = find_theta(
                    raw1,
                    raw2,
                    lambda1,
                    lambda2,
                    knowledge_edge_count,
                    config.delta,
                    config.seed,
                    &self.theta_search,
                    &config.solver,
                    &ctx.subtask(THETA_WINDOW.0, THETA_WINDOW.1),
                )?;
                notes.push(format!("theta resolved automatically: {value}"));
                value
            }
            Param::Auto => 0.0,
        };
        ctx.check_cancelled()?;
        ctx.report_progress(THETA_WINDOW.1);

        let params = PenaltyParams::new(lambda1, lambda2, theta);
        let solve_ctx = ctx.with_phase(RunPhase::InitialSolve);
        let mut network = solve_ddn(
            &standardize(raw1),
            &standardize(raw2),
            &prior,
            &params,
            &config.solver,
            &solve_ctx,
        )?;
        ctx.check_cancelled()?;

        if config.need_pvalue {
            if config.two_condition {
                network = calculate_pvalues(
                    &network,
                    raw1,
                    raw2,
                    &prior,
                    &params,
                    config.num_permutation,
                    config.seed,
                    &config.solver,
                    &ctx.subtask(PVALUE_WINDOW.0, PVALUE_WINDOW.1),
                )?;
            } else {
                warn!("p-values requested for a single-condition run; skipped");
                warnings.push("p-values are only computed for two-condition runs".to_string());
            }
        }

        if !network.unconverged_nodes.is_empty() {
            warnings.push(format!(
                "{} node(s) skipped after reaching the sweep limit",
                network.unconverged_nodes.len()
            ));
        }

        let diagnostics = RunDiagnostics {
            p,
            n1: raw1.n_samples(),
            n2: raw2.n_samples(),
            notes,
            warnings,
            seed: Some(config.seed),
            thread_count: Some(current_thread_count()),
            unconverged_nodes: network.unconverged_nodes.clone(),
            ..RunDiagnostics::default()
        };

        Ok(ExperimentResult {
            variables: preprocessed.variables,
            network,
            params: ResolvedParams {
                lambda1,
                lambda2,
                theta,
                alpha: config.alpha,
                delta: config.delta,
                knowledge_edge_count,
            },
            two_condition: config.two_condition,
            preprocessing: preprocessed.reports,
            diagnostics,
        })
    }
}

#[cfg(feature = "rayon")]
fn current_thread_count() -> usize {
    rayon::current_num_threads()
}

#[cfg(not(feature = "rayon"))]
fn current_thread_count() -> usize {
    1
}

/// Runs an experiment with default search settings.
pub fn run_experiment(
    input: &ExperimentInput,
    config: &RunConfig,
    ctx: &ExecutionContext<'_>,
) -> Result<ExperimentResult, KddnError> {
    KddnExperiment::new(config.clone()).run(input, ctx)
}
