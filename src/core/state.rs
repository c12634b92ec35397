//! State vector operations.
//!
//! A nonzero entry in the reset specification pins that node to the given
//! value after every update. This is how a constant-activation source node is
//! represented: as a projection applied after the update rule, not as a
//! boundary condition inside it.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::network::Activation;

/// `result[i] = clamp[i]` where `clamp[i] != 0`, otherwise `state[i]`.
///
/// Both slices must have the same length; the simulation guarantees this via
/// [`crate::network::Network`].
pub fn reset(state: &[Activation], clamp: &[Activation]) -> Vec<Activation> {
    debug_assert_eq!(state.len(), clamp.len());
    state
        .iter()
        .zip(clamp)
        .map(|(&s, &z)| if z != 0.0 { z } else { s })
        .collect()
}

/// In-place variant of [`reset`] used by the simulation loop.
pub fn reset_in_place(state: &mut [Activation], clamp: &[Activation]) {
    debug_assert_eq!(state.len(), clamp.len());
    for (s, &z) in state.iter_mut().zip(clamp) {
        if z != 0.0 {
            *s = z;
        }
    }
}

/// Number of nodes pinned by a reset specification.
pub fn clamped_count(clamp: &[Activation]) -> usize {
    clamp.iter().filter(|&&z| z != 0.0).count()
}
