use rand::Rng;

use crate::error::{NetError, Result};

/// Dense row-major grid of `f64`.
///
/// The shape is fixed at construction; cells are mutated through `get`/`set`
/// and `row_mut`. Every arithmetic operation checks shapes and reports
/// `NetError::DimensionMismatch` instead of panicking.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<Vec<f64>>,
}

impl Matrix {
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix {
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows],
        }
    }

    /// A `1 × n` matrix holding `values`.
    pub fn from_row(values: &[f64]) -> Matrix {
        Matrix {
            rows: 1,
            cols: values.len(),
            data: vec![values.to_vec()],
        }
    }

    /// An `n × 1` matrix holding `values`, e.g. the weights into a single
    /// output neuron.
    pub fn column(values: &[f64]) -> Matrix {
        Matrix {
            rows: values.len(),
            cols: 1,
            data: values.iter().map(|&v| vec![v]).collect(),
        }
    }

    pub fn identity(n: usize) -> Matrix {
        let mut res = Matrix::zeros(n, n);
        for i in 0..n {
            res.data[i][i] = 1.0;
        }
        res
    }

    /// Copies a 2-D array. Every row must have the same length as the first.
    pub fn from_data(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let rows = data.len();
        let cols = data.first().map_or(0, |row| row.len());

        if let Some(bad) = data.iter().find(|row| row.len() != cols) {
            return Err(NetError::DimensionMismatch {
                op: "from_data",
                expected: (1, cols),
                actual: (1, bad.len()),
            });
        }

        Ok(Matrix { rows, cols, data })
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

    /// Fills every cell with an independent uniform sample in `[-1, 1)`.
    pub fn initialize<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for row in self.data.iter_mut() {
            for cell in row.iter_mut() {
                *cell = rng.gen::<f64>() * 2.0 - 1.0;
            }
        }
    }

    /// Panics if `(row, col)` is out of bounds, like slice indexing.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row][col] = value;
    }

    /// Bounds-checked copy of one row as a `1 × cols` matrix.
    pub fn row(&self, row: usize) -> Result<Matrix> {
        self.data
            .get(row)
            .map(|values| Matrix::from_row(values))
            .ok_or(NetError::DimensionMismatch {
                op: "row",
                expected: (self.rows, self.cols),
                actual: (row + 1, self.cols),
            })
    }

    /// Read-only view of one row.
    pub fn row_slice(&self, row: usize) -> Option<&[f64]> {
        self.data.get(row).map(Vec::as_slice)
    }

    /// Mutable view of one row; the row length cannot change through it.
    pub fn row_mut(&mut self, row: usize) -> Option<&mut [f64]> {
        self.data.get_mut(row).map(Vec::as_mut_slice)
    }

    /// Overwrites the leading cells of row 0 with `values`, leaving any
    /// trailing cells (such as a bias unit) untouched.
    pub fn load_row(&mut self, values: &[f64]) -> Result<()> {
        let mismatch = NetError::DimensionMismatch {
            op: "load_row",
            expected: (1, self.cols),
            actual: (1, values.len()),
        };
        if values.len() > self.cols {
            return Err(mismatch);
        }
        let row = self.row_mut(0).ok_or(mismatch)?;
        row[..values.len()].copy_from_slice(values);
        Ok(())
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn plus(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with("plus", rhs, |a, b| a + b)
    }

    pub fn minus(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with("minus", rhs, |a, b| a - b)
    }

    /// Standard matrix product; requires `self.cols == rhs.rows`.
    pub fn times(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(NetError::DimensionMismatch {
                op: "times",
                expected: (self.cols, rhs.cols),
                actual: rhs.shape(),
            });
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..res.rows {
            for j in 0..res.cols {
                let mut sum = 0.0;

                for k in 0..self.cols {
                    sum += self.data[i][k] * rhs.data[k][j];
                }

                res.data[i][j] = sum;
            }
        }

        Ok(res)
    }

    /// Exact cell-by-cell comparison. Differently shaped matrices are an
    /// error rather than simply unequal.
    pub fn equals(&self, rhs: &Matrix) -> Result<bool> {
        self.check_same_shape("equals", rhs)?;
        Ok(self.data == rhs.data)
    }

    fn zip_with<F>(&self, op: &'static str, rhs: &Matrix, functor: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_shape(op, rhs)?;

        let mut res = Matrix::zeros(self.rows, self.cols);

        for i in 0..self.rows {
            for j in 0..self.cols {
                res.data[i][j] = functor(self.data[i][j], rhs.data[i][j]);
            }
        }

        Ok(res)
    }

    fn check_same_shape(&self, op: &'static str, rhs: &Matrix) -> Result<()> {
        if self.shape() != rhs.shape() {
            return Err(NetError::DimensionMismatch {
                op,
                expected: self.shape(),
                actual: rhs.shape(),
            });
        }
        Ok(())
    }
}
