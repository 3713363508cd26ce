use num_traits::Float;

use super::{LinalgError, Matrix};

/// In-place LU factorization with partial pivoting.
///
/// `lu` holds the unit-lower factor below the diagonal and the upper factor on
/// and above it. `pivots[i]` is the row swapped into row `i` at step `i`.
#[derive(Debug, Clone)]
pub struct LuDecomposition<T> {
    lu: Matrix<T>,
    pivots: Vec<usize>,
}

impl<T: Float> LuDecomposition<T> {
    /// Fails on the first exactly-zero pivot.
    pub fn factorize(matrix: &Matrix<T>) -> Result<Self, LinalgError> {
        if !matrix.is_square() {
            return Err(LinalgError::NotSquare { rows: matrix.rows(), cols: matrix.cols() });
        }
        let n = matrix.rows();
        let mut lu = matrix.clone();
        let mut pivots = Vec::with_capacity(n);

        for i in 0..n {
            let mut best = i;
            for r in i + 1..n {
                if lu[(r, i)].abs() > lu[(best, i)].abs() {
                    best = r;
                }
            }
            pivots.push(best);
            if lu[(best, i)] == T::zero() {
                return Err(LinalgError::Singular { pivot: i });
            }
            lu.swap_rows(i, best);

            let inv = T::one() / lu[(i, i)];
            for r in i + 1..n {
                lu[(r, i)] = lu[(r, i)] * inv;
            }
            for r in i + 1..n {
                let l = lu[(r, i)];
                for c in i + 1..n {
                    lu[(r, c)] = lu[(r, c)] - l * lu[(i, c)];
                }
            }
        }
        Ok(Self { lu, pivots })
    }

    pub fn dim(&self) -> usize {
        self.lu.rows()
    }

    /// Overwrite `rhs` (n x k) with the solution of `A X = rhs`.
    pub fn solve_in_place(&self, rhs: &mut Matrix<T>) -> Result<(), LinalgError> {
        let n = self.dim();
        if rhs.rows() != n {
            return Err(LinalgError::DimensionMismatch {
                left: (n, n),
                right: (rhs.rows(), rhs.cols()),
            });
        }
        for (i, &p) in self.pivots.iter().enumerate() {
            rhs.swap_rows(i, p);
        }
        for c in 0..rhs.cols() {
            for r in 1..n {
                let mut acc = rhs[(r, c)];
                for k in 0..r {
                    acc = acc - self.lu[(r, k)] * rhs[(k, c)];
                }
                rhs[(r, c)] = acc;
            }
            for r in (0..n).rev() {
                let mut acc = rhs[(r, c)];
                for k in r + 1..n {
                    acc = acc - self.lu[(r, k)] * rhs[(k, c)];
                }
                rhs[(r, c)] = acc / self.lu[(r, r)];
            }
        }
        Ok(())
    }

    pub fn solve(&self, b: &[T]) -> Result<Vec<T>, LinalgError> {
        let mut rhs = Matrix::from_row_slice(b.len(), 1, b)?;
        self.solve_in_place(&mut rhs)?;
        Ok(rhs.as_slice().to_vec())
    }

    pub fn inverse(&self) -> Result<Matrix<T>, LinalgError> {
        let mut inv = Matrix::identity(self.dim());
        self.solve_in_place(&mut inv)?;
        Ok(inv)
    }
}

/// Invert a square matrix through its LU factors.
pub fn invert<T: Float>(matrix: &Matrix<T>) -> Result<Matrix<T>, LinalgError> {
    LuDecomposition::factorize(matrix)?.inverse()
}
