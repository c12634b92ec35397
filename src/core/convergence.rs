//! Pluggable convergence criteria.
//!
//! A criterion is evaluated once per iteration against the history logged so
//! far and answers "keep iterating?". Its polarity is therefore *continue*:
//! `true` means the criterion is not yet satisfied. The simulation stops once
//! every registered criterion returns `false` (or the iteration cap is hit).

#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, string::String, vec, vec::Vec};

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::history::History;

/// A convergence predicate.
///
/// `iteration` is the 0-based index of the row just logged, `energy` its
/// energy, and `history` contains every row up to and including it.
pub trait ConvergenceCriterion {
    /// `true` to keep iterating, `false` once this criterion is satisfied.
    fn should_continue(
        &self,
        iteration: usize,
        energy: f64,
        history: &History,
        stability_threshold: f64,
    ) -> bool;
}

impl<F> ConvergenceCriterion for F
where
    F: Fn(usize, f64, &History, f64) -> bool,
{
    fn should_continue(
        &self,
        iteration: usize,
        energy: f64,
        history: &History,
        stability_threshold: f64,
    ) -> bool {
        self(iteration, energy, history, stability_threshold)
    }
}

/// Output mode of [`McClellandRumelhart::evaluate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CriterionMode {
    /// Continue / stop decision.
    #[default]
    Qualitative,
    /// Number of stable energy differences in the window, for diagnostics.
    Quantitative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CriterionOutput {
    Continue(bool),
    StableCount(usize),
}

/// McClelland & Rumelhart stability criterion.
///
/// Over the first `window` logged rows it always continues. After that it
/// looks at the last `window` energy differences `E[t-1] - E[t]` and is
/// satisfied only when every one of them is below the stability threshold.
/// The difference is signed: a rise in energy also counts as stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct McClellandRumelhart {
    pub window: usize,
}

impl Default for McClellandRumelhart {
    fn default() -> Self {
        Self { window: 10 }
    }
}

impl McClellandRumelhart {
    pub fn with_window(window: usize) -> Self {
        Self {
            window: window.max(1),
        }
    }

    /// Count of stable differences in the trailing window, or `None` while
    /// fewer than `window + 1` rows have been logged.
    pub fn stable_differences(&self, history: &History, stability_threshold: f64) -> Option<usize> {
        let rows = history.len();
        if rows <= self.window {
            return None;
        }

        let mut stable = 0;
        for t in rows - self.window..rows {
            let prev = history.energy(t - 1)?;
            let cur = history.energy(t)?;
            if prev - cur < stability_threshold {
                stable += 1;
            }
        }
        Some(stable)
    }

    pub fn evaluate(
        &self,
        history: &History,
        stability_threshold: f64,
        mode: CriterionMode,
    ) -> CriterionOutput {
        match (self.stable_differences(history, stability_threshold), mode) {
            (None, _) => CriterionOutput::Continue(true),
            (Some(k), CriterionMode::Quantitative) => CriterionOutput::StableCount(k),
            (Some(k), CriterionMode::Qualitative) => CriterionOutput::Continue(k < self.window),
        }
    }
}

impl ConvergenceCriterion for McClellandRumelhart {
    fn should_continue(
        &self,
        _iteration: usize,
        _energy: f64,
        history: &History,
        stability_threshold: f64,
    ) -> bool {
        match self.evaluate(history, stability_threshold, CriterionMode::Qualitative) {
            CriterionOutput::Continue(keep_going) => keep_going,
            CriterionOutput::StableCount(k) => k < self.window,
        }
    }
}

/// Satisfied once `iteration` reaches the limit.
///
/// Registered alongside other criteria it does not force an early stop (the
/// loop runs while *any* criterion continues); use
/// [`crate::simulation::PcsConfig::max_iterations`] for a hard cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IterationLimit(pub usize);

impl ConvergenceCriterion for IterationLimit {
    fn should_continue(&self, iteration: usize, _: f64, _: &History, _: f64) -> bool {
        iteration < self.0
    }
}

/// A named criterion as registered with the simulation.
pub struct Criterion {
    pub name: String,
    pub predicate: Box<dyn ConvergenceCriterion>,
}

impl Criterion {
    pub fn new(name: impl Into<String>, predicate: impl ConvergenceCriterion + 'static) -> Self {
        Self {
            name: name.into(),
            predicate: Box::new(predicate),
        }
    }
}

impl Default for Criterion {
    /// `"default"`: McClelland & Rumelhart with a window of 10.
    fn default() -> Self {
        Self::new("default", McClellandRumelhart::default())
    }
}

impl fmt::Debug for Criterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Criterion")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The criteria used when the caller has no preference.
pub fn default_criteria() -> Vec<Criterion> {
    vec![Criterion::default()]
}
