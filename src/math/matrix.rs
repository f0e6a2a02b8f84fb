use rand::Rng;
use serde::{Serialize, Deserialize};
use std::f64::consts::PI;

use crate::error::{Error, Result};

/// Dense row-major matrix of `f64`.
///
/// Batches are stored column-wise: the leading axis is the feature (or class)
/// index and the trailing axis is the sample index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    /// Builds a matrix from row vectors. All rows must have the same length.
    pub fn from_rows(data: Vec<Vec<f64>>) -> Result<Matrix> {
        let rows = data.len();
        let cols = data.first().map_or(0, |row| row.len());
        if let Some(bad) = data.iter().find(|row| row.len() != cols) {
            return Err(Error::shape("from_rows", (1, cols), (1, bad.len())));
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Builds a matrix whose columns are the given samples.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Matrix> {
        let cols = columns.len();
        let rows = columns.first().map_or(0, |col| col.len());
        let mut res = Matrix::zeros(rows, cols);
        for (j, column) in columns.iter().enumerate() {
            if column.len() != rows {
                return Err(Error::shape("from_columns", (rows, 1), (column.len(), 1)));
            }
            for (i, &value) in column.iter().enumerate() {
                res.data[i][j] = value;
            }
        }
        Ok(res)
    }

    /// An `n × 1` column vector.
    pub fn column(values: Vec<f64>) -> Matrix {
        Matrix {
            rows: values.len(),
            cols: 1,
            data: values.into_iter().map(|v| vec![v]).collect(),
        }
    }

    /// Samples a single value from N(0, 1) using the Box-Muller transform.
    /// Both u1 and u2 must be uniform on (0, 1].
    fn sample_standard_normal<R: Rng + ?Sized>(rng: &mut R) -> f64 {
        // Draw two independent uniform samples in (0, 1] to avoid log(0).
        let u1: f64 = 1.0 - rng.gen::<f64>();
        let u2: f64 = 1.0 - rng.gen::<f64>();
        (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
    }

    /// Entries drawn i.i.d. from N(0, 1) and multiplied by `std_dev`.
    pub fn normal<R: Rng + ?Sized>(rows: usize, cols: usize, std_dev: f64, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);
        for row in res.data.iter_mut() {
            for value in row.iter_mut() {
                *value = Matrix::sample_standard_normal(rng) * std_dev;
            }
        }
        res
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row][col]
    }

    /// Copies out column `col` (one sample of a batch).
    pub fn column_values(&self, col: usize) -> Vec<f64> {
        self.data.iter().map(|row| row[col]).collect()
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

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data
                .iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Matrix product `self · rhs`.
    pub fn dot(&self, rhs: &Matrix) -> Result<Matrix> {
        if self.cols != rhs.rows {
            return Err(Error::shape("dot", (self.cols, rhs.cols), rhs.shape()));
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        // i-k-j order walks both operands row by row.
        for (res_row, lhs_row) in res.data.iter_mut().zip(self.data.iter()) {
            for (&a, rhs_row) in lhs_row.iter().zip(rhs.data.iter()) {
                for (r, &b) in res_row.iter_mut().zip(rhs_row.iter()) {
                    *r += a * b;
                }
            }
        }

        Ok(res)
    }

    /// Element-wise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "hadamard", |a, b| a * b)
    }

    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, "sub", |a, b| a - b)
    }

    /// Adds the `rows × 1` column `col` to every column of `self`.
    pub fn add_column_broadcast(&self, col: &Matrix) -> Result<Matrix> {
        if col.shape() != (self.rows, 1) {
            return Err(Error::shape("add_column_broadcast", (self.rows, 1), col.shape()));
        }
        let data = self.data.iter().zip(col.data.iter())
            .map(|(row, c)| row.iter().map(|x| x + c[0]).collect())
            .collect();
        Ok(Matrix { rows: self.rows, cols: self.cols, data })
    }

    /// Sums over the trailing (sample) axis, giving a `rows × 1` column.
    pub fn sum_columns(&self) -> Matrix {
        Matrix::column(self.data.iter().map(|row| row.iter().sum()).collect())
    }

    /// Row index of the largest entry of each column. Ties go to the lowest
    /// index; an empty column maps to 0.
    pub fn argmax_columns(&self) -> Vec<usize> {
        (0..self.cols)
            .map(|c| {
                let mut best = 0;
                for r in 1..self.rows {
                    if self.data[r][c] > self.data[best][c] {
                        best = r;
                    }
                }
                best
            })
            .collect()
    }

    pub fn frobenius_norm(&self) -> f64 {
        self.data.iter().flatten().map(|x| x * x).sum::<f64>().sqrt()
    }

    fn zip_with<F>(&self, rhs: &Matrix, op: &'static str, f: F) -> Result<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        if self.shape() != rhs.shape() {
            return Err(Error::shape(op, self.shape(), rhs.shape()));
        }
        let data = self.data.iter().zip(rhs.data.iter())
            .map(|(row_a, row_b)| {
                row_a.iter().zip(row_b.iter()).map(|(&x, &y)| f(x, y)).collect()
            })
            .collect();
        Ok(Matrix { rows: self.rows, cols: self.cols, data })
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}
