use crate::error::Result;
use crate::loss::cross_entropy::check_labels;
use crate::math::matrix::Matrix;

/// Fraction of samples whose arg-max score matches the label, in `[0, 1]`.
///
/// Ties go to the lowest class index.
pub fn accuracy(scores: &Matrix, labels: &[usize]) -> Result<f64> {
    check_labels(labels, scores)?;
    let correct = scores.argmax_columns()
        .iter()
        .zip(labels.iter())
        .filter(|(predicted, label)| predicted == label)
        .count();
    Ok(correct as f64 / labels.len() as f64)
}
