#[cfg(not(feature = "std"))]
use alloc::{string::String, vec::Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::buffer::RowBuffer;
use crate::network::Activation;

/// One logged iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryRow<'a> {
    pub iteration: usize,
    pub energy: f64,
    pub activations: &'a [Activation],
}

/// Trajectory of a run: one row per iteration, starting with the initial
/// (already reset) state at iteration 0.
///
/// Rows are stored as `[energy, activation_1, ..., activation_n]`; the
/// iteration index is the row position, so it is always dense and ordered.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    node_names: Vec<String>,
    table: RowBuffer<f64>,
    scratch: Vec<f64>,
}

impl History {
    pub fn new(node_names: Vec<String>) -> Self {
        let width = node_names.len() + 1;
        Self {
            node_names,
            table: RowBuffer::new(width),
            scratch: Vec::with_capacity(width),
        }
    }

    /// Append a row; returns its iteration index.
    pub fn push(&mut self, energy: f64, state: &[Activation]) -> usize {
        debug_assert_eq!(state.len(), self.node_names.len());
        self.scratch.clear();
        self.scratch.push(energy);
        self.scratch.extend_from_slice(state);
        self.table.push_row(&self.scratch)
    }

    #[inline]
    pub fn needs_growth(&self) -> bool {
        self.table.needs_growth()
    }

    pub fn grow(&mut self) {
        self.table.grow();
    }

    /// Drop unused capacity. Idempotent.
    pub fn truncate(&mut self) {
        self.table.truncate();
        self.scratch = Vec::new();
    }

    /// Number of logged rows (iterations run + 1).
    #[inline]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn capacity_rows(&self) -> usize {
        self.table.capacity_rows()
    }

    /// Number of nodes per row.
    pub fn dim(&self) -> usize {
        self.node_names.len()
    }

    pub fn node_names(&self) -> &[String] {
        &self.node_names
    }

    /// `["iteration", "energy", node names...]`
    pub fn column_names(&self) -> Vec<String> {
        let mut cols = Vec::with_capacity(self.node_names.len() + 2);
        cols.push(String::from("iteration"));
        cols.push(String::from("energy"));
        cols.extend(self.node_names.iter().cloned());
        cols
    }

    pub fn row(&self, iteration: usize) -> Option<HistoryRow<'_>> {
        self.table.row(iteration).map(|r| HistoryRow {
            iteration,
            energy: r[0],
            activations: &r[1..],
        })
    }

    pub fn last(&self) -> Option<HistoryRow<'_>> {
        self.len().checked_sub(1).and_then(|i| self.row(i))
    }

    pub fn rows(&self) -> impl Iterator<Item = HistoryRow<'_>> + '_ {
        self.table.rows().enumerate().map(|(iteration, r)| HistoryRow {
            iteration,
            energy: r[0],
            activations: &r[1..],
        })
    }

    pub fn energy(&self, iteration: usize) -> Option<f64> {
        self.table.row(iteration).map(|r| r[0])
    }

    pub fn energies(&self) -> impl Iterator<Item = f64> + '_ {
        self.table.column(0).copied()
    }

    pub fn state(&self, iteration: usize) -> Option<&[Activation]> {
        self.table.row(iteration).map(|r| &r[1..])
    }

    pub fn final_state(&self) -> Option<&[Activation]> {
        self.last().map(|r| r.activations)
    }

    /// Activation trajectory of one node.
    pub fn node_trajectory(&self, node: usize) -> impl Iterator<Item = Activation> + '_ {
        self.table.column(node + 1).copied()
    }

    /// Owned, serializable copy in data-frame layout.
    pub fn to_table(&self) -> HistoryTable {
        HistoryTable {
            columns: self.column_names(),
            rows: self
                .rows()
                .map(|r| {
                    let mut cells = Vec::with_capacity(r.activations.len() + 2);
                    cells.push(r.iteration as f64);
                    cells.push(r.energy);
                    cells.extend_from_slice(r.activations);
                    cells
                })
                .collect(),
        }
    }
}

/// Column-named export of a [`History`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HistoryTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}
