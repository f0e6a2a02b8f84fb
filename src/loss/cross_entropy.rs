use log::{trace, warn};

use crate::error::{Error, Result};
use crate::math::matrix::Matrix;

/// Softmax followed by categorical cross-entropy, over a `classes × batch`
/// score matrix and one integer label per sample.
pub struct CrossEntropyLoss;

impl CrossEntropyLoss {
    /// Column-wise softmax: `exp(z)` normalized so each column sums to 1.
    ///
    /// The per-column maximum is not subtracted first, so scores above ~709
    /// overflow to `inf` and yield NaN probabilities.
    pub fn softmax(scores: &Matrix) -> Matrix {
        let exp = scores.map(f64::exp);
        let totals = exp.data.iter().fold(vec![0.0; exp.cols], |mut acc, row| {
            for (t, x) in acc.iter_mut().zip(row.iter()) {
                *t += x;
            }
            acc
        });
        let data = exp.data.iter()
            .map(|row| row.iter().zip(totals.iter()).map(|(x, t)| x / t).collect())
            .collect();
        Matrix { rows: exp.rows, cols: exp.cols, data }
    }

    /// Returns the mean loss over the batch and ∂L/∂scores, which seeds the
    /// backward pass of the network that produced `scores`:
    ///
    ///   L  = -mean_i log(p[y_i, i])
    ///   dZ = (p - onehot(y)) / N
    pub fn compute(labels: &[usize], scores: &Matrix) -> Result<(f64, Matrix)> {
        check_labels(labels, scores)?;
        let n = labels.len() as f64;

        let mut grad = CrossEntropyLoss::softmax(scores);
        let loss = labels.iter().enumerate()
            .map(|(i, &y)| -grad.data[y][i].ln())
            .sum::<f64>() / n;
        if !loss.is_finite() {
            warn!("cross-entropy loss is {} (scores too large for exp?)", loss);
        }

        for (i, &y) in labels.iter().enumerate() {
            grad.data[y][i] -= 1.0;
        }
        let grad = grad.scale(1.0 / n);

        trace!("cross-entropy over {} samples: {}", labels.len(), loss);
        Ok((loss, grad))
    }
}

/// Labels must match the batch size and index a row of `scores`.
pub(crate) fn check_labels(labels: &[usize], scores: &Matrix) -> Result<()> {
    if labels.is_empty() {
        return Err(Error::EmptyBatch);
    }
    if labels.len() != scores.cols {
        return Err(Error::shape("labels", (1, scores.cols), (1, labels.len())));
    }
    match labels.iter().enumerate().find(|&(_, &y)| y >= scores.rows) {
        Some((index, &label)) => Err(Error::LabelOutOfRange {
            index,
            label,
            num_classes: scores.rows,
        }),
        None => Ok(()),
    }
}
