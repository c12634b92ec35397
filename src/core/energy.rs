use crate::network::{Activation, Matrix};

/// Network energy `-(s · M) · s`, the negated quadratic form `sᵀMs`.
///
/// Lower (more negative) energy means a more internally consistent state.
/// An empty network has energy 0.
pub fn energy(matrix: &Matrix, state: &[Activation]) -> f64 {
    let n = matrix.dim();
    debug_assert_eq!(state.len(), n);

    let mut total = 0.0;
    for i in 0..n {
        // (s · M)[i] = sum_j s[j] * M[j][i]
        let mut column = 0.0;
        for (j, &s_j) in state.iter().enumerate() {
            column += s_j * matrix.get(j, i);
        }
        total += column * state[i];
    }
    -total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_node_uses_self_link() {
        let m = Matrix::from_rows(vec![vec![0.5]]).unwrap();
        assert_eq!(energy(&m, &[2.0]), -2.0);
    }

    #[test]
    fn two_nodes_by_hand() {
        // sᵀMs = 1*0.3*(-0.5) + (-0.5)*0.3*1 = -0.3
        let m = Matrix::from_rows(vec![vec![0.0, 0.3], vec![0.3, 0.0]]).unwrap();
        let e = energy(&m, &[1.0, -0.5]);
        assert!((e - 0.3).abs() < 1e-15);
    }

    #[test]
    fn three_nodes_asymmetric_by_hand() {
        let m = Matrix::from_rows(vec![
            vec![0.0, 1.0, 2.0],
            vec![0.0, 0.0, 3.0],
            vec![-1.0, 0.0, 0.0],
        ])
        .unwrap();
        let s = [1.0, 2.0, 3.0];
        // sᵀMs = s0*s1*1 + s0*s2*2 + s1*s2*3 + s2*s0*(-1) = 2 + 6 + 18 - 3 = 23
        assert_eq!(energy(&m, &s), -23.0);
    }

    #[test]
    fn empty_network_has_zero_energy() {
        assert_eq!(energy(&Matrix::zeros(0), &[]), 0.0);
    }

    #[test]
    fn coherent_state_has_lower_energy() {
        let m = Matrix::from_rows(vec![vec![0.0, 0.2], vec![0.2, 0.0]]).unwrap();
        assert!(energy(&m, &[1.0, 1.0]) < energy(&m, &[1.0, -1.0]));
    }
}
