#[cfg(not(feature = "std"))]
use alloc::{string::String, vec, vec::Vec};

use core::mem;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use tracing::{debug, trace};

use crate::buffer::RowBuffer;
use crate::convergence::Criterion;
use crate::energy::energy;
use crate::error::{PcsError, PcsResult};
use crate::history::{History, HistoryTable};
use crate::network::{Activation, Matrix, Network};
use crate::state::{clamped_count, reset_in_place};
use crate::update::update_into;

pub use crate::update::{ExecutionTier, UpdateParams};

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PcsConfig {
    /// Pull toward the resting levels per iteration.
    pub decay: f64,
    pub floor: f64,
    pub ceiling: f64,
    /// Energy differences below this count as stable.
    pub stability_threshold: f64,
    /// Hard cap on the iteration index. `None` runs until every criterion
    /// is satisfied.
    pub max_iterations: Option<usize>,
    pub execution_tier: ExecutionTier,
}

impl Default for PcsConfig {
    fn default() -> Self {
        Self {
            decay: 0.1,
            floor: -1.0,
            ceiling: 1.0,
            stability_threshold: 1e-6,
            max_iterations: None,
            execution_tier: ExecutionTier::Scalar,
        }
    }
}

impl PcsConfig {
    /// Validate the configuration, returning an error message if invalid.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.decay.is_finite() || self.decay < 0.0 {
            return Err("decay must be finite and >= 0");
        }
        if !self.floor.is_finite() || !self.ceiling.is_finite() {
            return Err("floor and ceiling must be finite");
        }
        if self.floor >= self.ceiling {
            return Err("floor must be < ceiling");
        }
        if !self.stability_threshold.is_finite() {
            return Err("stability_threshold must be finite");
        }
        Ok(())
    }

    pub fn update_params(&self) -> UpdateParams {
        UpdateParams {
            decay: self.decay,
            floor: self.floor,
            ceiling: self.ceiling,
        }
    }

    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    /// Set the activation floor and ceiling.
    pub fn with_bounds(mut self, floor: f64, ceiling: f64) -> Self {
        self.floor = floor;
        self.ceiling = ceiling;
        self
    }

    pub fn with_stability_threshold(mut self, threshold: f64) -> Self {
        self.stability_threshold = threshold;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_execution_tier(mut self, tier: ExecutionTier) -> Self {
        self.execution_tier = tier;
        self
    }
}

/// Lifecycle of a [`Simulation`].
///
/// `Init` → `Running` → `Converged` | `MaxIterationsReached`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing logged yet.
    Init,
    Running,
    /// Every criterion is satisfied (or the network is empty).
    Converged,
    MaxIterationsReached,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Converged | Phase::MaxIterationsReached)
    }
}

/// Why a run stopped.
///
/// Hitting the iteration cap is a normal outcome, not an error; callers that
/// care must check for [`Termination::MaxIterations`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Termination {
    Converged,
    MaxIterations,
    /// Zero-node network: a single row with energy 0.
    EmptyNetwork,
}

/// The iteration loop.
///
/// Owns the state vector and both logs for the lifetime of the run; the
/// network is only read.
pub struct Simulation<'a> {
    network: &'a Network,
    cfg: PcsConfig,
    params: UpdateParams,
    criteria: Vec<Criterion>,

    state: Vec<Activation>,
    next: Vec<Activation>,
    net: Vec<f64>,

    history: History,
    convergence_log: RowBuffer<bool>,
    signals: Vec<bool>,

    iteration: usize,
    phase: Phase,
}

impl<'a> Simulation<'a> {
    /// Prepare a run. Fails before any iteration on an invalid config, an
    /// empty criterion list or duplicate criterion names.
    pub fn new(network: &'a Network, cfg: PcsConfig, criteria: Vec<Criterion>) -> PcsResult<Self> {
        cfg.validate().map_err(PcsError::InvalidConfig)?;
        if criteria.is_empty() {
            return Err(PcsError::NoCriteria);
        }
        for (i, c) in criteria.iter().enumerate() {
            if criteria[..i].iter().any(|prev| prev.name == c.name) {
                return Err(PcsError::DuplicateCriterion(c.name.clone()));
            }
        }

        let n = network.dim();
        Ok(Self {
            network,
            cfg,
            params: cfg.update_params(),
            state: network.initial_state().to_vec(),
            next: vec![0.0; n],
            net: vec![0.0; n],
            history: History::new(network.node_names().to_vec()),
            convergence_log: RowBuffer::new(criteria.len()),
            signals: vec![true; criteria.len()],
            criteria,
            iteration: 0,
            phase: Phase::Init,
        })
    }

    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Index of the most recently logged row.
    #[inline]
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn state(&self) -> &[Activation] {
        &self.state
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &PcsConfig {
        &self.cfg
    }

    /// Continue signals of the latest row, in criterion order.
    pub fn signals(&self) -> &[bool] {
        &self.signals
    }

    /// Advance by one transition and return the new phase.
    ///
    /// From `Init` this logs iteration 0; from `Running` it applies one update.
    /// Terminal phases are left unchanged.
    pub fn step(&mut self) -> Phase {
        match self.phase {
            Phase::Init => self.initialize(),
            Phase::Running => self.advance(),
            Phase::Converged | Phase::MaxIterationsReached => {}
        }
        self.phase
    }

    /// Step until a terminal phase is reached.
    pub fn run_to_end(&mut self) -> Phase {
        while !self.phase.is_terminal() {
            self.step();
        }
        self.phase
    }

    fn initialize(&mut self) {
        let network = self.network;
        let matrix = network.matrix();
        reset_in_place(&mut self.state, network.reset());
        let e = energy(matrix, &self.state);
        self.iteration = self.history.push(e, &self.state);

        // Row 0 never stops the run.
        self.signals.iter_mut().for_each(|s| *s = true);
        self.convergence_log.push_row(&self.signals);

        debug!(
            nodes = matrix.dim(),
            clamped = clamped_count(network.reset()),
            criteria = self.criteria.len(),
            energy = e,
            "simulation initialized"
        );

        self.phase = if matrix.dim() == 0 {
            Phase::Converged
        } else if self.at_iteration_cap() {
            Phase::MaxIterationsReached
        } else {
            Phase::Running
        };
        self.log_if_terminal();
    }

    fn advance(&mut self) {
        let network = self.network;
        let matrix = network.matrix();
        update_into(
            matrix,
            &self.state,
            network.resting_levels(),
            &self.params,
            self.cfg.execution_tier,
            &mut self.net,
            &mut self.next,
        );
        reset_in_place(&mut self.next, network.reset());
        mem::swap(&mut self.state, &mut self.next);

        let e = energy(matrix, &self.state);
        if self.history.needs_growth() {
            trace!(
                rows = self.history.len(),
                capacity = self.history.capacity_rows(),
                "growing history"
            );
            self.history.grow();
        }
        self.iteration = self.history.push(e, &self.state);

        let threshold = self.cfg.stability_threshold;
        for (signal, c) in self.signals.iter_mut().zip(&self.criteria) {
            *signal = c
                .predicate
                .should_continue(self.iteration, e, &self.history, threshold);
        }
        if self.convergence_log.needs_growth() {
            self.convergence_log.grow();
        }
        self.convergence_log.push_row(&self.signals);

        trace!(iteration = self.iteration, energy = e, "step");

        self.phase = if !self.signals.iter().any(|&s| s) {
            Phase::Converged
        } else if self.at_iteration_cap() {
            Phase::MaxIterationsReached
        } else {
            Phase::Running
        };
        self.log_if_terminal();
    }

    fn at_iteration_cap(&self) -> bool {
        self.cfg
            .max_iterations
            .is_some_and(|max| self.iteration >= max)
    }

    fn log_if_terminal(&self) {
        if self.phase.is_terminal() {
            debug!(
                phase = ?self.phase,
                iterations = self.iteration,
                energy = self.history.last().map(|r| r.energy).unwrap_or(0.0),
                "simulation finished"
            );
        }
    }

    /// Run to the end (if needed), compact the logs and build the result.
    pub fn finish(mut self) -> SimulationResult {
        self.run_to_end();
        self.history.truncate();
        self.convergence_log.truncate();

        // Continue signals that triggered a further update: every logged row
        // except the last one.
        let decisive = self.convergence_log.len().saturating_sub(1);
        let convergence = self
            .criteria
            .iter()
            .enumerate()
            .map(|(j, c)| {
                let count = self
                    .convergence_log
                    .rows()
                    .take(decisive)
                    .filter(|row| row[j])
                    .count();
                (c.name.clone(), count)
            })
            .collect();

        let termination = match self.phase {
            _ if self.network.dim() == 0 => Termination::EmptyNetwork,
            Phase::MaxIterationsReached => Termination::MaxIterations,
            _ => Termination::Converged,
        };

        SimulationResult {
            iterations: self.history,
            convergence,
            convergence_log: self.convergence_log,
            criterion_names: self.criteria.into_iter().map(|c| c.name).collect(),
            termination,
        }
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    /// Trajectory, iteration 0 through the final iteration.
    pub iterations: History,
    /// Per criterion, in registration order: the iteration at which it was
    /// satisfied, counted as the number of rows on which it asked to continue.
    /// Equals the iteration cap when the run was cut off.
    pub convergence: Vec<(String, usize)>,
    /// Row-for-row continue signals, one column per criterion.
    pub convergence_log: RowBuffer<bool>,
    pub criterion_names: Vec<String>,
    pub termination: Termination,
}

impl SimulationResult {
    pub fn convergence_of(&self, name: &str) -> Option<usize> {
        self.convergence
            .iter()
            .find(|(n, _)| n == name)
            .map(|&(_, count)| count)
    }

    /// Continue signals of one criterion across all rows.
    pub fn criterion_log(&self, name: &str) -> Option<Vec<bool>> {
        let j = self.criterion_names.iter().position(|n| n == name)?;
        Some(self.convergence_log.column(j).copied().collect())
    }

    /// Number of updates applied (rows - 1).
    pub fn iterations_run(&self) -> usize {
        self.iterations.len().saturating_sub(1)
    }

    pub fn final_energy(&self) -> f64 {
        self.iterations.last().map(|r| r.energy).unwrap_or(0.0)
    }

    pub fn final_state(&self) -> &[Activation] {
        self.iterations.final_state().unwrap_or(&[])
    }

    pub fn converged(&self) -> bool {
        self.termination != Termination::MaxIterations
    }

    /// Owned, serializable summary.
    pub fn to_report(&self) -> ResultReport {
        ResultReport {
            iterations: self.iterations.to_table(),
            convergence: self
                .convergence
                .iter()
                .map(|(name, iteration)| ConvergenceEntry {
                    name: name.clone(),
                    iteration: *iteration,
                })
                .collect(),
            termination: self.termination,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ConvergenceEntry {
    pub name: String,
    pub iteration: usize,
}

/// Result record in exportable form.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ResultReport {
    pub iterations: HistoryTable,
    pub convergence: Vec<ConvergenceEntry>,
    pub termination: Termination,
}

/// Run a validated network to completion.
pub fn run(
    network: &Network,
    cfg: &PcsConfig,
    criteria: Vec<Criterion>,
) -> PcsResult<SimulationResult> {
    Ok(Simulation::new(network, *cfg, criteria)?.finish())
}

/// Run with all-zero initial state and resting levels, node 0 held at 1.0 as
/// the source, and default parameters.
pub fn run_from_matrix(matrix: Matrix, criteria: Vec<Criterion>) -> PcsResult<SimulationResult> {
    let network = Network::from_matrix(matrix);
    run(&network, &PcsConfig::default(), criteria)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::{default_criteria, IterationLimit, McClellandRumelhart};

    /// Source node, four cues of decreasing validity, two competing options.
    fn cue_choice_matrix() -> Matrix {
        let mut m = Matrix::zeros(7);
        for (cue, w) in [0.1015, 0.0470, 0.0126, 0.0034].into_iter().enumerate() {
            m.link(0, cue + 1, w);
        }
        for cue in 1..=3 {
            m.link(cue, 5, 0.01);
            m.link(cue, 6, -0.01);
        }
        m.link(4, 5, -0.01);
        m.link(4, 6, 0.01);
        m.link(5, 6, -0.2);
        m
    }

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    #[test]
    fn cue_choice_network_converges_at_116() {
        let result = run_from_matrix(cue_choice_matrix(), default_criteria()).unwrap();

        assert_eq!(result.termination, Termination::Converged);
        assert_eq!(result.convergence_of("default"), Some(116));
        assert_eq!(result.iterations_run(), 116);
        assert_eq!(result.iterations.len(), 117);
        assert!(close(result.final_energy(), -0.291636, 5e-7));

        let expected = [1.0, 0.529312, 0.366908, 0.190641, -0.070232, 0.547761, -0.547761];
        for (got, want) in result.final_state().iter().zip(expected) {
            assert!(close(*got, want, 1e-6), "{got} vs {want}");
        }
    }

    #[test]
    fn first_rows_reflect_reset_state_then_one_update() {
        let result = run_from_matrix(cue_choice_matrix(), default_criteria()).unwrap();

        let row0 = result.iterations.row(0).unwrap();
        assert_eq!(row0.activations, &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        assert_eq!(row0.energy, 0.0);

        let row1 = result.iterations.row(1).unwrap();
        let expected = [1.0, 0.1015, 0.047, 0.0126, 0.0034, 0.0, 0.0];
        for (got, want) in row1.activations.iter().zip(expected) {
            assert!(close(*got, want, 1e-12));
        }
        assert!(close(row1.energy, -0.02536314, 1e-12));
    }

    #[test]
    fn history_grows_past_first_block_and_truncates_exactly() {
        let result = run_from_matrix(cue_choice_matrix(), default_criteria()).unwrap();
        assert_eq!(result.iterations.capacity_rows(), 117);
        assert_eq!(result.convergence_log.len(), 117);
        assert_eq!(result.convergence_log.capacity_rows(), 117);
        assert!(result.iterations.rows().all(|r| r.energy.is_finite()));
        for (i, r) in result.iterations.rows().enumerate() {
            assert_eq!(r.iteration, i);
        }
    }

    #[test]
    fn convergence_log_flips_once() {
        let result = run_from_matrix(cue_choice_matrix(), default_criteria()).unwrap();
        let log = result.criterion_log("default").unwrap();
        assert_eq!(log.len(), 117);
        assert!(log[..116].iter().all(|&c| c));
        assert!(!log[116]);
    }

    #[test]
    fn run_from_matrix_matches_explicit_run() {
        let m = cue_choice_matrix();
        let mut reset = vec![0.0; 7];
        reset[0] = 1.0;
        let network = Network::new(m.clone(), vec![0.0; 7], vec![0.0; 7], reset).unwrap();

        let explicit = run(&network, &PcsConfig::default(), default_criteria()).unwrap();
        let implicit = run_from_matrix(m, default_criteria()).unwrap();
        assert_eq!(explicit, implicit);
    }

    #[test]
    fn iteration_cap_is_not_an_error() {
        let network = Network::from_matrix(cue_choice_matrix());
        let cfg = PcsConfig::default().with_max_iterations(50);
        let result = run(&network, &cfg, default_criteria()).unwrap();

        assert_eq!(result.termination, Termination::MaxIterations);
        assert!(!result.converged());
        assert_eq!(result.convergence_of("default"), Some(50));
        assert_eq!(result.iterations.len(), 51);
        assert!(close(result.final_energy(), -0.284117747, 1e-9));
    }

    #[test]
    fn zero_iteration_cap_logs_only_the_initial_row() {
        let network = Network::from_matrix(cue_choice_matrix());
        let cfg = PcsConfig::default().with_max_iterations(0);
        let result = run(&network, &cfg, default_criteria()).unwrap();
        assert_eq!(result.iterations.len(), 1);
        assert_eq!(result.convergence_of("default"), Some(0));
    }

    #[test]
    fn empty_network_stops_after_one_row() {
        let result = run_from_matrix(Matrix::zeros(0), default_criteria()).unwrap();
        assert_eq!(result.termination, Termination::EmptyNetwork);
        assert_eq!(result.iterations.len(), 1);
        assert_eq!(result.final_energy(), 0.0);
        assert_eq!(result.convergence_of("default"), Some(0));
    }

    #[test]
    fn loop_runs_until_every_criterion_is_satisfied() {
        let criteria = vec![
            Criterion::default(),
            Criterion::new("at_least_200", IterationLimit(200)),
        ];
        let result = run_from_matrix(cue_choice_matrix(), criteria).unwrap();

        assert_eq!(result.termination, Termination::Converged);
        assert_eq!(result.iterations.len(), 201);
        assert_eq!(result.convergence_of("default"), Some(116));
        assert_eq!(result.convergence_of("at_least_200"), Some(200));
    }

    #[test]
    fn closure_criteria_see_the_history_so_far() {
        let criteria = vec![Criterion::new(
            "rows_match_iteration",
            |iteration: usize, energy: f64, history: &History, _: f64| {
                assert_eq!(history.len(), iteration + 1);
                assert_eq!(history.energy(iteration), Some(energy));
                iteration < 5
            },
        )];
        let result = run_from_matrix(cue_choice_matrix(), criteria).unwrap();
        assert_eq!(result.iterations_run(), 5);
    }

    #[test]
    fn stepping_walks_the_phases() {
        let network = Network::from_matrix(cue_choice_matrix());
        let mut sim = Simulation::new(&network, PcsConfig::default(), default_criteria()).unwrap();
        assert_eq!(sim.phase(), Phase::Init);
        assert!(sim.history().is_empty());

        assert_eq!(sim.step(), Phase::Running);
        assert_eq!(sim.history().len(), 1);
        assert_eq!(sim.state()[0], 1.0);

        assert_eq!(sim.step(), Phase::Running);
        assert_eq!(sim.iteration(), 1);
        assert_eq!(sim.signals(), &[true]);

        assert_eq!(sim.run_to_end(), Phase::Converged);
        assert_eq!(sim.iteration(), 116);
        assert_eq!(sim.step(), Phase::Converged);
        assert_eq!(sim.iteration(), 116);
    }

    #[test]
    fn parallel_tier_matches_scalar() {
        let network = Network::from_matrix(cue_choice_matrix());
        let scalar = run(&network, &PcsConfig::default(), default_criteria()).unwrap();
        let cfg = PcsConfig::default().with_execution_tier(ExecutionTier::Parallel);
        let parallel = run(&network, &cfg, default_criteria()).unwrap();
        assert_eq!(scalar, parallel);
    }

    #[test]
    fn bad_inputs_fail_before_running() {
        let network = Network::from_matrix(cue_choice_matrix());

        assert_eq!(
            Simulation::new(&network, PcsConfig::default(), Vec::new()).err(),
            Some(PcsError::NoCriteria)
        );

        let dupes = vec![
            Criterion::default(),
            Criterion::new("default", McClellandRumelhart::with_window(5)),
        ];
        assert_eq!(
            run(&network, &PcsConfig::default(), dupes).err(),
            Some(PcsError::DuplicateCriterion("default".into()))
        );

        let inverted = PcsConfig::default().with_bounds(1.0, -1.0);
        assert_eq!(
            run(&network, &inverted, default_criteria()).err(),
            Some(PcsError::InvalidConfig("floor must be < ceiling"))
        );

        let mismatch = Network::new(Matrix::zeros(3), vec![0.0; 4], vec![0.0; 3], vec![0.0; 3])
            .and_then(|n| run(&n, &PcsConfig::default(), default_criteria()));
        assert!(matches!(
            mismatch,
            Err(PcsError::DimensionMismatch { expected: 3, actual: 4, .. })
        ));
    }

    #[test]
    fn config_validation() {
        assert!(PcsConfig::default().validate().is_ok());
        assert!(PcsConfig::default().with_decay(-0.1).validate().is_err());
        assert!(PcsConfig::default().with_decay(f64::NAN).validate().is_err());
        assert!(PcsConfig::default()
            .with_stability_threshold(f64::INFINITY)
            .validate()
            .is_err());
        assert!(PcsConfig::default().with_bounds(0.0, 0.0).validate().is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn report_serializes_with_named_columns() {
        let result = run_from_matrix(cue_choice_matrix(), default_criteria()).unwrap();
        let json = serde_json::to_value(result.to_report()).unwrap();

        assert_eq!(json["termination"], "converged");
        assert_eq!(json["convergence"][0]["name"], "default");
        assert_eq!(json["convergence"][0]["iteration"], 116);
        assert_eq!(json["iterations"]["columns"][0], "iteration");
        assert_eq!(json["iterations"]["columns"][8], "node_7");
        assert_eq!(json["iterations"]["rows"].as_array().unwrap().len(), 117);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn config_deserializes_with_defaults() {
        let cfg: PcsConfig = serde_json::from_str(r#"{"decay": 0.05, "max_iterations": 500}"#).unwrap();
        assert_eq!(cfg.decay, 0.05);
        assert_eq!(cfg.max_iterations, Some(500));
        assert_eq!(cfg.floor, -1.0);
        assert_eq!(cfg.execution_tier, ExecutionTier::Scalar);
    }
}
