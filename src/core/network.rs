#[cfg(not(feature = "std"))]
use alloc::{format, string::String, vec, vec::Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{expect_len, PcsError, PcsResult};

/// Type alias for link weights. Sign encodes excitation (+) or inhibition (-).
pub type Weight = f64;

/// Type alias for node activations (conceptually in `[floor, ceiling]`).
pub type Activation = f64;

/// Dense n×n interconnection matrix, stored row-major.
///
/// Entry `(i, j)` is the weight of the link carrying node `j`'s activation
/// into node `i`. Matrices are usually symmetric with a zero diagonal, but
/// neither is required.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "Vec<Vec<Weight>>", into = "Vec<Vec<Weight>>")
)]
pub struct Matrix {
    dim: usize,
    /// Flat weights: row i occupies `[i * dim..(i + 1) * dim)`.
    weights: Vec<Weight>,
}

impl Matrix {
    /// All-zero n×n matrix.
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            weights: vec![0.0; dim * dim],
        }
    }

    /// Build from nested rows, rejecting ragged or non-square input.
    pub fn from_rows(rows: Vec<Vec<Weight>>) -> PcsResult<Self> {
        let dim = rows.len();
        let mut weights = Vec::with_capacity(dim * dim);
        for row in rows {
            expect_len("interconnection matrix row", dim, row.len())?;
            weights.extend(row);
        }
        Ok(Self { dim, weights })
    }

    /// Build from a flat row-major slice of `dim * dim` weights.
    pub fn from_flat(dim: usize, weights: Vec<Weight>) -> PcsResult<Self> {
        expect_len("flat interconnection matrix", dim * dim, weights.len())?;
        Ok(Self { dim, weights })
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> Weight {
        self.weights[i * self.dim + j]
    }

    #[inline]
    pub fn set(&mut self, i: usize, j: usize, w: Weight) {
        self.weights[i * self.dim + j] = w;
    }

    /// Set both `(i, j)` and `(j, i)`.
    pub fn link(&mut self, i: usize, j: usize, w: Weight) {
        self.set(i, j, w);
        self.set(j, i, w);
    }

    /// Incoming weights of node `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[Weight] {
        &self.weights[i * self.dim..(i + 1) * self.dim]
    }

    pub fn weights(&self) -> &[Weight] {
        &self.weights
    }

    pub fn is_symmetric(&self, tolerance: f64) -> bool {
        (0..self.dim).all(|i| {
            (0..i).all(|j| {
                let d = self.get(i, j) - self.get(j, i);
                d <= tolerance && -d <= tolerance
            })
        })
    }

    pub fn to_rows(&self) -> Vec<Vec<Weight>> {
        (0..self.dim).map(|i| self.row(i).to_vec()).collect()
    }
}

impl TryFrom<Vec<Vec<Weight>>> for Matrix {
    type Error = PcsError;

    fn try_from(rows: Vec<Vec<Weight>>) -> PcsResult<Self> {
        Self::from_rows(rows)
    }
}

impl From<Matrix> for Vec<Vec<Weight>> {
    fn from(m: Matrix) -> Self {
        m.to_rows()
    }
}

/// Default node labels: `node_1`, `node_2`, ...
pub fn default_node_names(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("node_{i}")).collect()
}

/// Validated simulation inputs.
///
/// Construction guarantees that the initial state, resting levels, reset
/// specification and node names all have the matrix dimension, so the
/// simulation loop never re-checks shapes.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    matrix: Matrix,
    initial_state: Vec<Activation>,
    resting_levels: Vec<Activation>,
    reset: Vec<Activation>,
    node_names: Vec<String>,
}

impl Network {
    pub fn new(
        matrix: Matrix,
        initial_state: Vec<Activation>,
        resting_levels: Vec<Activation>,
        reset: Vec<Activation>,
    ) -> PcsResult<Self> {
        let n = matrix.dim();
        expect_len("initial state", n, initial_state.len())?;
        expect_len("resting levels", n, resting_levels.len())?;
        expect_len("reset specification", n, reset.len())?;

        Ok(Self {
            matrix,
            initial_state,
            resting_levels,
            reset,
            node_names: default_node_names(n),
        })
    }

    /// All-zero initial state and resting levels with node 0 held at 1.0 as
    /// the source node.
    pub fn from_matrix(matrix: Matrix) -> Self {
        let n = matrix.dim();
        let mut reset = vec![0.0; n];
        if let Some(source) = reset.first_mut() {
            *source = 1.0;
        }
        Self {
            matrix,
            initial_state: vec![0.0; n],
            resting_levels: vec![0.0; n],
            reset,
            node_names: default_node_names(n),
        }
    }

    pub fn with_node_names(mut self, names: Vec<String>) -> PcsResult<Self> {
        expect_len("node names", self.matrix.dim(), names.len())?;
        self.node_names = names;
        Ok(self)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.matrix.dim()
    }

    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    pub fn initial_state(&self) -> &[Activation] {
        &self.initial_state
    }

    pub fn resting_levels(&self) -> &[Activation] {
        &self.resting_levels
    }

    pub fn reset(&self) -> &[Activation] {
        &self.reset
    }

    pub fn node_names(&self) -> &[String] {
        &self.node_names
    }

    /// Index of the node labelled `name`.
    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.node_names.iter().position(|n| n == name)
    }
}
