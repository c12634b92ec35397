#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::simulation::{SimulationResult, Termination};

/// Decision read-out of a finished run.
///
/// Design intent:
/// - Observers cannot mutate the result; everything here is derived.
/// - Choice is the option with the highest final activation.
/// - Decision time is the convergence iteration of one criterion.
/// - Confidence is the activation margin between the best and runner-up option.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecisionSnapshot {
    /// Name of the chosen option node; `None` on an exact tie or with no options.
    pub choice: Option<String>,
    pub decision_time: Option<usize>,
    pub confidence: f64,
    pub final_energy: f64,
    pub termination: Termination,
    /// `(name, final activation)` for every option node, in the order given.
    pub options: Vec<(String, f64)>,
}

pub struct ResultAdapter<'a> {
    result: &'a SimulationResult,
}

impl<'a> ResultAdapter<'a> {
    pub fn new(result: &'a SimulationResult) -> Self {
        Self { result }
    }

    /// Final activations of the given option nodes. Out-of-range indices are
    /// skipped.
    pub fn option_activations(&self, options: &[usize]) -> Vec<(String, f64)> {
        let names = self.result.iterations.node_names();
        let state = self.result.final_state();
        options
            .iter()
            .filter_map(|&i| Some((names.get(i)?.clone(), *state.get(i)?)))
            .collect()
    }

    /// Snapshot using `criterion` for the decision time.
    pub fn decision(&self, options: &[usize], criterion: &str) -> DecisionSnapshot {
        let options = self.option_activations(options);

        let mut best: Option<(usize, f64)> = None;
        let mut runner_up: Option<f64> = None;
        for (i, &(_, a)) in options.iter().enumerate() {
            match best {
                Some((_, b)) if a <= b => {
                    if runner_up.map_or(true, |r| a > r) {
                        runner_up = Some(a);
                    }
                }
                _ => {
                    runner_up = best.map(|(_, b)| b);
                    best = Some((i, a));
                }
            }
        }

        let confidence = match (best, runner_up) {
            (Some((_, b)), Some(r)) => b - r,
            _ => 0.0,
        };
        // An exact tie leaves the choice open.
        let choice = match best {
            Some((i, _)) if confidence > 0.0 || runner_up.is_none() => Some(options[i].0.clone()),
            _ => None,
        };

        DecisionSnapshot {
            choice,
            decision_time: self.result.convergence_of(criterion),
            confidence,
            final_energy: self.result.final_energy(),
            termination: self.result.termination,
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convergence::default_criteria;
    use crate::network::{Matrix, Network};
    use crate::simulation::{run, run_from_matrix, PcsConfig};

    fn two_option_matrix() -> Matrix {
        let mut m = Matrix::zeros(4);
        m.link(0, 1, 0.1);
        m.link(1, 2, 0.01);
        m.link(1, 3, -0.01);
        m.link(2, 3, -0.2);
        m
    }

    #[test]
    fn supported_option_wins() {
        let result = run_from_matrix(two_option_matrix(), default_criteria()).unwrap();
        let snap = ResultAdapter::new(&result).decision(&[2, 3], "default");

        assert_eq!(snap.choice.as_deref(), Some("node_3"));
        assert!(snap.confidence > 0.0);
        assert_eq!(snap.decision_time, result.convergence_of("default"));
        assert_eq!(snap.final_energy, result.final_energy());
        assert_eq!(snap.options.len(), 2);
    }

    #[test]
    fn symmetric_options_tie() {
        let mut m = Matrix::zeros(3);
        m.link(0, 1, 0.05);
        m.link(0, 2, 0.05);
        m.link(1, 2, -0.2);
        let result = run_from_matrix(m, default_criteria()).unwrap();
        let snap = ResultAdapter::new(&result).decision(&[1, 2], "default");

        assert_eq!(snap.choice, None);
        assert_eq!(snap.confidence, 0.0);
    }

    #[test]
    fn named_nodes_and_unknown_criterion() {
        let network = Network::from_matrix(two_option_matrix())
            .with_node_names(vec![
                "source".into(),
                "cue".into(),
                "left".into(),
                "right".into(),
            ])
            .unwrap();
        let result = run(&network, &PcsConfig::default(), default_criteria()).unwrap();
        let snap = ResultAdapter::new(&result).decision(&[3, 2, 9], "missing");

        assert_eq!(snap.choice.as_deref(), Some("left"));
        assert_eq!(snap.decision_time, None);
        assert_eq!(
            snap.options.iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
            vec!["right", "left"]
        );
    }

    #[test]
    fn single_option_is_chosen_with_zero_margin() {
        let result = run_from_matrix(two_option_matrix(), default_criteria()).unwrap();
        let snap = ResultAdapter::new(&result).decision(&[2], "default");
        assert_eq!(snap.choice.as_deref(), Some("node_3"));
        assert_eq!(snap.confidence, 0.0);
    }
}
