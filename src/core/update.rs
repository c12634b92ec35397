#[cfg(not(feature = "std"))]
use alloc::{vec, vec::Vec};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::network::{Activation, Matrix};

/// Execution tier for the net-input computation.
///
/// - `Scalar`: single-threaded (default, works everywhere)
/// - `Parallel`: one rayon task per node row (requires `parallel` feature)
///
/// Both tiers sum each row in the same order, so trajectories are identical.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ExecutionTier {
    #[default]
    Scalar,
    Parallel,
}

impl ExecutionTier {
    /// The tier that will actually run, honoring compile-time feature gates.
    pub fn effective(self) -> ExecutionTier {
        match self {
            ExecutionTier::Parallel if cfg!(feature = "parallel") => ExecutionTier::Parallel,
            _ => ExecutionTier::Scalar,
        }
    }
}

/// Parameters of the activation update rule.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UpdateParams {
    /// Pull toward the resting level per iteration.
    pub decay: f64,
    pub floor: f64,
    pub ceiling: f64,
}

impl Default for UpdateParams {
    fn default() -> Self {
        Self {
            decay: 0.1,
            floor: -1.0,
            ceiling: 1.0,
        }
    }
}

/// Net input per node: `net[i] = sum_j s[j] * M[i][j]`.
pub fn net_input(matrix: &Matrix, state: &[Activation]) -> Vec<f64> {
    let mut net = vec![0.0; matrix.dim()];
    net_input_into(matrix, state, &mut net, ExecutionTier::Scalar);
    net
}

/// Write the net input into `out`, dispatching on the execution tier.
pub fn net_input_into(matrix: &Matrix, state: &[Activation], out: &mut [f64], tier: ExecutionTier) {
    debug_assert_eq!(state.len(), matrix.dim());
    debug_assert_eq!(out.len(), matrix.dim());

    match tier.effective() {
        ExecutionTier::Scalar => net_input_scalar(matrix, state, out),
        ExecutionTier::Parallel => net_input_parallel(matrix, state, out),
    }
}

#[inline]
fn row_input(row: &[f64], state: &[Activation]) -> f64 {
    let mut acc = 0.0;
    for (&w, &s) in row.iter().zip(state) {
        acc += s * w;
    }
    acc
}

fn net_input_scalar(matrix: &Matrix, state: &[Activation], out: &mut [f64]) {
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = row_input(matrix.row(i), state);
    }
}

#[cfg(feature = "parallel")]
fn net_input_parallel(matrix: &Matrix, state: &[Activation], out: &mut [f64]) {
    out.par_iter_mut()
        .enumerate()
        .for_each(|(i, slot)| *slot = row_input(matrix.row(i), state));
}

#[cfg(not(feature = "parallel"))]
fn net_input_parallel(matrix: &Matrix, state: &[Activation], out: &mut [f64]) {
    net_input_scalar(matrix, state, out);
}

/// Bounded integration of one node's net input.
///
/// Excitation is scaled by the headroom to the ceiling, inhibition by the
/// headroom to the floor, so activations saturate smoothly.
#[inline]
pub fn integrate(net: f64, activation: Activation, params: &UpdateParams) -> f64 {
    if net >= 0.0 {
        net * (params.ceiling - activation)
    } else {
        net * (-params.floor + activation)
    }
}

/// Next activation of a single node from its net input.
#[inline]
pub fn next_activation(
    net: f64,
    activation: Activation,
    resting: Activation,
    params: &UpdateParams,
) -> Activation {
    let decay = params.decay * (activation - resting);
    activation - decay + integrate(net, activation, params)
}

/// One discrete-time update of the whole state vector.
///
/// No hard clamp to `[floor, ceiling]` is applied; bounding comes only from
/// the saturating integration term.
pub fn update(
    matrix: &Matrix,
    state: &[Activation],
    resting: &[Activation],
    params: &UpdateParams,
) -> Vec<Activation> {
    let mut net = vec![0.0; matrix.dim()];
    let mut next = vec![0.0; matrix.dim()];
    update_into(
        matrix,
        state,
        resting,
        params,
        ExecutionTier::Scalar,
        &mut net,
        &mut next,
    );
    next
}

/// Allocation-free form of [`update`]; `net` is scratch space.
pub fn update_into(
    matrix: &Matrix,
    state: &[Activation],
    resting: &[Activation],
    params: &UpdateParams,
    tier: ExecutionTier,
    net: &mut [f64],
    next: &mut [Activation],
) {
    debug_assert_eq!(resting.len(), state.len());
    debug_assert_eq!(next.len(), state.len());

    net_input_into(matrix, state, net, tier);
    for i in 0..state.len() {
        next[i] = next_activation(net[i], state[i], resting[i], params);
    }
}
