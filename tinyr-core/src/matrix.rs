/// Dense row-major matrices of `f32`.
///
/// Every operation returns a new [`Matrix`]; nothing mutates its operands.
/// Products, determinants and elimination accumulate in `f64` and round back
/// to `f32` once per cell.
///
/// The arithmetic operators (`*`, `+`, `-`) panic on incompatible shapes, the
/// same contract as slice indexing. Use [`Matrix::checked_mul`],
/// [`Matrix::checked_add`] and [`Matrix::checked_sub`] to get a
/// [`MatrixError`] instead.
use std::fmt;
use std::ops::{Add, Index, IndexMut, Mul, Sub};

use nalgebra::DMatrix;

use crate::error::{MatrixError, MatrixResult};

/// Pivots with a smaller magnitude are treated as zero during inversion.
pub const PIVOT_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f32>,
}

impl Matrix {
    /// Zero-filled `rows x cols` matrix.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is zero. See [`Matrix::try_new`].
    pub fn new(rows: usize, cols: usize) -> Self {
        assert!(
            rows > 0 && cols > 0,
            "matrix dimensions must be positive, got {rows}x{cols}"
        );
        Self::zeroed(rows, cols)
    }

    pub fn try_new(rows: usize, cols: usize) -> MatrixResult<Self> {
        if rows == 0 || cols == 0 {
            return Err(MatrixError::InvalidDimensions { rows, cols });
        }
        Ok(Self::zeroed(rows, cols))
    }

    fn zeroed(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// `n x n` identity.
    ///
    /// # Panics
    ///
    /// Panics if `n` is zero.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::new(n, n);
        for i in 0..n {
            m[i][i] = 1.0;
        }
        m
    }

    /// Build a matrix from row slices, all of the same length.
    pub fn from_rows<R: AsRef<[f32]>>(rows: &[R]) -> MatrixResult<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut m = Self::try_new(rows.len(), cols)?;
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(MatrixError::RaggedRows {
                    row: i,
                    expected: cols,
                    found: row.len(),
                });
            }
            m[i].copy_from_slice(row);
        }
        Ok(m)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    fn require_square(&self, op: &'static str) -> MatrixResult<usize> {
        if self.is_square() {
            Ok(self.rows)
        } else {
            Err(MatrixError::NotSquare {
                op,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    pub fn checked_mul(&self, rhs: &Matrix) -> MatrixResult<Matrix> {
        if self.cols != rhs.rows {
            return Err(MatrixError::DimensionMismatch {
                op: "multiply",
                left: self.shape(),
                right: rhs.shape(),
            });
        }
        let mut out = Self::zeroed(self.rows, rhs.cols);
        for i in 0..self.rows {
            for j in 0..rhs.cols {
                let mut sum = 0.0f64;
                for k in 0..self.cols {
                    sum += f64::from(self[i][k]) * f64::from(rhs[k][j]);
                }
                out[i][j] = sum as f32;
            }
        }
        Ok(out)
    }

    pub fn checked_add(&self, rhs: &Matrix) -> MatrixResult<Matrix> {
        self.zip_with(rhs, "add", |a, b| a + b)
    }

    pub fn checked_sub(&self, rhs: &Matrix) -> MatrixResult<Matrix> {
        self.zip_with(rhs, "subtract", |a, b| a - b)
    }

    fn zip_with(
        &self,
        rhs: &Matrix,
        op: &'static str,
        f: impl Fn(f32, f32) -> f32,
    ) -> MatrixResult<Matrix> {
        if self.shape() != rhs.shape() {
            return Err(MatrixError::DimensionMismatch {
                op,
                left: self.shape(),
                right: rhs.shape(),
            });
        }
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&rhs.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Every element multiplied by `factor`.
    pub fn scale(&self, factor: f32) -> Matrix {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|v| v * factor).collect(),
        }
    }

    pub fn transpose(&self) -> Matrix {
        let mut out = Self::zeroed(self.cols, self.rows);
        for i in 0..self.rows {
            for j in 0..self.cols {
                out[j][i] = self[i][j];
            }
        }
        out
    }

    /// Inverse by Gauss-Jordan elimination with partial pivoting.
    ///
    /// For each column the row with the largest remaining pivot is swapped
    /// into place, scaled to a unit pivot and eliminated from every other row;
    /// the same row operations build the inverse out of an identity matrix.
    /// `self` is left untouched.
    pub fn inverse(&self) -> MatrixResult<Matrix> {
        let n = self.require_square("inverse")?;
        let mut a: Vec<f64> = self.data.iter().map(|&v| f64::from(v)).collect();
        let mut inv = vec![0.0f64; n * n];
        for i in 0..n {
            inv[i * n + i] = 1.0;
        }

        for col in 0..n {
            let pivot_row = (col..n)
                .max_by(|&r, &s| a[r * n + col].abs().total_cmp(&a[s * n + col].abs()))
                .unwrap_or(col);
            let pivot = a[pivot_row * n + col];
            if !(pivot.abs() > PIVOT_EPSILON) {
                return Err(MatrixError::Singular { column: col });
            }
            if pivot_row != col {
                swap_rows(&mut a, n, col, pivot_row);
                swap_rows(&mut inv, n, col, pivot_row);
            }

            for j in 0..n {
                a[col * n + j] /= pivot;
                inv[col * n + j] /= pivot;
            }

            for row in 0..n {
                if row == col {
                    continue;
                }
                let factor = a[row * n + col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n {
                    a[row * n + j] -= factor * a[col * n + j];
                    inv[row * n + j] -= factor * inv[col * n + j];
                }
            }
        }

        Ok(Matrix {
            rows: n,
            cols: n,
            data: inv.into_iter().map(|v| v as f32).collect(),
        })
    }

    /// Determinant by Laplace expansion along the first row.
    pub fn determinant(&self) -> MatrixResult<f32> {
        let n = self.require_square("determinant")?;
        let cells: Vec<f64> = self.data.iter().map(|&v| f64::from(v)).collect();
        Ok(laplace_determinant(&cells, n) as f32)
    }

    /// The `(n-1) x (n-1)` matrix left after deleting `row` and `col`.
    pub fn minor(&self, row: usize, col: usize) -> MatrixResult<Matrix> {
        let n = self.require_square("minor")?;
        if n < 2 {
            return Err(MatrixError::InvalidDimensions {
                rows: n - 1,
                cols: n - 1,
            });
        }
        if row >= n || col >= n {
            return Err(MatrixError::DimensionMismatch {
                op: "minor",
                left: self.shape(),
                right: (row, col),
            });
        }
        let mut out = Self::zeroed(n - 1, n - 1);
        let mut k = 0;
        for i in (0..n).filter(|&i| i != row) {
            for j in (0..n).filter(|&j| j != col) {
                out.data[k] = self[i][j];
                k += 1;
            }
        }
        Ok(out)
    }

    /// Signed minor determinant `(-1)^(row+col) * det(minor(row, col))`.
    pub fn cofactor(&self, row: usize, col: usize) -> MatrixResult<f32> {
        let det = self.minor(row, col)?.determinant()?;
        Ok(if (row + col) % 2 == 0 { det } else { -det })
    }

    /// Adjugate: the transposed cofactor matrix, so `A * adj(A) = det(A) * I`.
    ///
    /// A 1x1 matrix has adjugate `[1]`.
    pub fn adjoint(&self) -> MatrixResult<Matrix> {
        let n = self.require_square("adjoint")?;
        if n == 1 {
            return Ok(Self::identity(1));
        }
        let mut out = Self::zeroed(n, n);
        for i in 0..n {
            for j in 0..n {
                out[j][i] = self.cofactor(i, j)?;
            }
        }
        Ok(out)
    }
}

fn swap_rows(cells: &mut [f64], n: usize, r: usize, s: usize) {
    for j in 0..n {
        cells.swap(r * n + j, s * n + j);
    }
}

fn laplace_determinant(cells: &[f64], n: usize) -> f64 {
    match n {
        1 => cells[0],
        2 => cells[0] * cells[3] - cells[1] * cells[2],
        _ => {
            let mut det = 0.0;
            let mut sub = vec![0.0; (n - 1) * (n - 1)];
            for col in 0..n {
                let a = cells[col];
                if a == 0.0 {
                    continue;
                }
                let mut k = 0;
                for i in 1..n {
                    for j in (0..n).filter(|&j| j != col) {
                        sub[k] = cells[i * n + j];
                        k += 1;
                    }
                }
                let sign = if col % 2 == 0 { 1.0 } else { -1.0 };
                det += sign * a * laplace_determinant(&sub, n - 1);
            }
            det
        }
    }
}

impl Index<usize> for Matrix {
    type Output = [f32];

    fn index(&self, row: usize) -> &[f32] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }
}

impl IndexMut<usize> for Matrix {
    fn index_mut(&mut self, row: usize) -> &mut [f32] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }
}

impl Mul for &Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Matrix {
        match self.checked_mul(rhs) {
            Ok(m) => m,
            Err(e) => panic!("{e}"),
        }
    }
}

impl Mul<f32> for &Matrix {
    type Output = Matrix;

    fn mul(self, factor: f32) -> Matrix {
        self.scale(factor)
    }
}

impl Add for &Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Matrix {
        match self.checked_add(rhs) {
            Ok(m) => m,
            Err(e) => panic!("{e}"),
        }
    }
}

impl Sub for &Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Matrix {
        match self.checked_sub(rhs) {
            Ok(m) => m,
            Err(e) => panic!("{e}"),
        }
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.rows {
            let row: Vec<String> = self[i].iter().map(|v| v.to_string()).collect();
            writeln!(f, "{}", row.join(" "))?;
        }
        Ok(())
    }
}

impl From<&Matrix> for DMatrix<f32> {
    fn from(m: &Matrix) -> Self {
        DMatrix::from_row_slice(m.rows, m.cols, &m.data)
    }
}

impl TryFrom<&DMatrix<f32>> for Matrix {
    type Error = MatrixError;

    fn try_from(m: &DMatrix<f32>) -> MatrixResult<Self> {
        let mut out = Matrix::try_new(m.nrows(), m.ncols())?;
        for i in 0..m.nrows() {
            for j in 0..m.ncols() {
                out[i][j] = m[(i, j)];
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_4x4() -> Matrix {
        Matrix::from_rows(&[
            [4.0, 7.0, 2.0, 1.0],
            [3.0, 6.0, 1.0, 5.0],
            [2.0, 5.0, 3.0, 2.0],
            [1.0, 1.0, 8.0, 9.0],
        ])
        .unwrap()
    }

    fn assert_matrix_eq(a: &Matrix, b: &Matrix, epsilon: f32) {
        assert_eq!(a.shape(), b.shape());
        for i in 0..a.rows() {
            for j in 0..a.cols() {
                assert_relative_eq!(a[i][j], b[i][j], epsilon = epsilon);
            }
        }
    }

    #[test]
    fn test_new_is_zeroed() {
        let m = Matrix::new(2, 3);
        assert_eq!(m.shape(), (2, 3));
        assert!((0..2).all(|i| m[i].iter().all(|&v| v == 0.0)));
    }

    #[test]
    #[should_panic(expected = "matrix dimensions must be positive")]
    fn test_new_rejects_zero_rows() {
        Matrix::new(0, 4);
    }

    #[test]
    fn test_try_new_rejects_zero_dimension() {
        assert_eq!(
            Matrix::try_new(3, 0),
            Err(MatrixError::InvalidDimensions { rows: 3, cols: 0 })
        );
    }

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        let rows: [&[f32]; 2] = [&[1.0, 2.0], &[3.0]];
        assert_eq!(
            Matrix::from_rows(&rows),
            Err(MatrixError::RaggedRows {
                row: 1,
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn test_row_indexing_mutates() {
        let mut m = Matrix::new(2, 2);
        m[1][0] = 3.5;
        assert_eq!(m.get(1, 0), Some(3.5));
        assert_eq!(m.get(2, 0), None);
    }

    #[test]
    fn test_identity() {
        let e = Matrix::identity(3);
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(e[i][j], if i == j { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn test_multiply_rectangular() {
        let a = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        let b = Matrix::from_rows(&[[7.0, 8.0], [9.0, 10.0], [11.0, 12.0]]).unwrap();
        let c = &a * &b;
        assert_eq!(c, Matrix::from_rows(&[[58.0, 64.0], [139.0, 154.0]]).unwrap());
    }

    #[test]
    fn test_multiply_dimension_mismatch() {
        let a = Matrix::new(2, 3);
        let b = Matrix::new(2, 3);
        assert_eq!(
            a.checked_mul(&b),
            Err(MatrixError::DimensionMismatch {
                op: "multiply",
                left: (2, 3),
                right: (2, 3)
            })
        );
    }

    #[test]
    #[should_panic(expected = "dimension mismatch in add")]
    fn test_add_operator_panics_on_mismatch() {
        let _ = &Matrix::new(2, 2) + &Matrix::new(3, 2);
    }

    #[test]
    fn test_add_sub_scale() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let b = Matrix::from_rows(&[[0.5, 0.5], [1.0, -1.0]]).unwrap();
        assert_eq!(&a + &b, Matrix::from_rows(&[[1.5, 2.5], [4.0, 3.0]]).unwrap());
        assert_eq!(&a - &b, Matrix::from_rows(&[[0.5, 1.5], [2.0, 5.0]]).unwrap());
        assert_eq!(&a * 2.0, Matrix::from_rows(&[[2.0, 4.0], [6.0, 8.0]]).unwrap());
        assert!(a.checked_sub(&Matrix::new(2, 3)).is_err());
    }

    #[test]
    fn test_transpose_twice_is_identity() {
        let a = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        let t = a.transpose();
        assert_eq!(t.shape(), (3, 2));
        assert_eq!(t[2][1], 6.0);
        assert_eq!(t.transpose(), a);
    }

    #[test]
    fn test_inverse_times_matrix_is_identity() {
        let a = sample_4x4();
        let inv = a.inverse().unwrap();
        assert_matrix_eq(&(&a * &inv), &Matrix::identity(4), 1e-5);
        assert_matrix_eq(&(&inv * &a), &Matrix::identity(4), 1e-5);
    }

    #[test]
    fn test_inverse_leaves_receiver_untouched() {
        let a = sample_4x4();
        let before = a.clone();
        let _ = a.inverse().unwrap();
        assert_eq!(a, before);
    }

    #[test]
    fn test_inverse_needs_pivoting() {
        // Zero on the leading diagonal; only solvable with a row swap.
        let a = Matrix::from_rows(&[[0.0, 1.0], [1.0, 0.0]]).unwrap();
        let inv = a.inverse().unwrap();
        assert_matrix_eq(&inv, &a, 1e-7);

        let b = Matrix::from_rows(&[[0.0, 2.0, 1.0], [1.0, 0.0, 0.0], [3.0, 1.0, 4.0]]).unwrap();
        assert_matrix_eq(&(&b * &b.inverse().unwrap()), &Matrix::identity(3), 1e-6);
    }

    #[test]
    fn test_inverse_rejects_singular_matrix() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [2.0, 4.0]]).unwrap();
        assert_eq!(a.inverse(), Err(MatrixError::Singular { column: 1 }));
        assert_eq!(Matrix::new(3, 3).inverse(), Err(MatrixError::Singular { column: 0 }));
    }

    #[test]
    fn test_inverse_rejects_non_square() {
        assert_eq!(
            Matrix::new(2, 3).inverse(),
            Err(MatrixError::NotSquare {
                op: "inverse",
                rows: 2,
                cols: 3
            })
        );
    }

    #[test]
    fn test_inverse_matches_nalgebra() {
        let a = sample_4x4();
        let expected = DMatrix::<f32>::from(&a).try_inverse().unwrap();
        let expected = Matrix::try_from(&expected).unwrap();
        assert_matrix_eq(&a.inverse().unwrap(), &expected, 1e-5);
    }

    #[test]
    fn test_determinant_matches_nalgebra() {
        let a = sample_4x4();
        let expected = DMatrix::<f32>::from(&a).determinant();
        assert_relative_eq!(a.determinant().unwrap(), expected, epsilon = 1e-3);

        let five = Matrix::from_rows(&[
            [2.0, 0.0, 1.0, 3.0, -1.0],
            [1.0, 4.0, 0.0, 2.0, 2.0],
            [0.0, -2.0, 5.0, 1.0, 0.0],
            [3.0, 1.0, 1.0, 0.0, 4.0],
            [1.0, 0.0, 2.0, -3.0, 1.0],
        ])
        .unwrap();
        let expected = DMatrix::<f32>::from(&five).determinant();
        assert_relative_eq!(five.determinant().unwrap(), expected, epsilon = 1e-2);
    }

    #[test]
    fn test_determinant_base_cases() {
        assert_eq!(Matrix::from_rows(&[[7.5]]).unwrap().determinant(), Ok(7.5));
        let two = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert_eq!(two.determinant(), Ok(-2.0));
    }

    #[test]
    fn test_minor_and_cofactor() {
        let a = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 10.0]]).unwrap();
        let m = a.minor(0, 1).unwrap();
        assert_eq!(m, Matrix::from_rows(&[[4.0, 6.0], [7.0, 10.0]]).unwrap());
        assert_eq!(a.cofactor(0, 1), Ok(-(4.0 * 10.0 - 6.0 * 7.0)));
    }

    #[test]
    fn test_adjoint_of_identity() {
        for n in 1..=5 {
            assert_eq!(Matrix::identity(n).adjoint().unwrap(), Matrix::identity(n));
        }
    }

    #[test]
    fn test_adjoint_of_1x1_is_one() {
        let a = Matrix::from_rows(&[[42.0]]).unwrap();
        assert_eq!(a.adjoint().unwrap(), Matrix::identity(1));
    }

    #[test]
    fn test_adjoint_2x2() {
        let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
        assert_eq!(
            a.adjoint().unwrap(),
            Matrix::from_rows(&[[4.0, -2.0], [-3.0, 1.0]]).unwrap()
        );
    }

    #[test]
    fn test_matrix_times_adjoint_is_scaled_identity() {
        let a = sample_4x4();
        let det = a.determinant().unwrap();
        let product = &a * &a.adjoint().unwrap();
        assert_matrix_eq(&product, &Matrix::identity(4).scale(det), 1e-2);
    }

    #[test]
    fn test_adjoint_rejects_non_square() {
        assert!(matches!(
            Matrix::new(3, 2).adjoint(),
            Err(MatrixError::NotSquare { op: "adjoint", .. })
        ));
    }

    #[test]
    fn test_display() {
        let a = Matrix::from_rows(&[[1.0, 2.5], [-3.0, 0.0]]).unwrap();
        assert_eq!(a.to_string(), "1 2.5\n-3 0\n");
    }
}
