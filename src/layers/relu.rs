use log::trace;

use crate::{
    error::{Error, Result},
    layers::layer::Layer,
    math::matrix::Matrix,
};

/// Element-wise `max(x, 0)`. No learnable parameters.
#[derive(Debug, Clone, Default)]
pub struct Relu {
    cached_input: Option<Matrix>,
}

impl Relu {
    pub fn new() -> Relu {
        Relu::default()
    }
}

impl Layer for Relu {
    fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        let out = input.map(|x| if x > 0.0 { x } else { 0.0 });
        self.cached_input = Some(input.clone());
        Ok(out)
    }

    /// Passes `grad_output` through where the cached input was strictly
    /// positive and zeroes it elsewhere.
    fn backward(&mut self, grad_output: &Matrix) -> Result<Matrix> {
        let input = self.cached_input.as_ref()
            .ok_or(Error::UninitializedCache { layer: "relu" })?;
        let mask = input.map(|x| if x > 0.0 { 1.0 } else { 0.0 });
        let grad_input = grad_output.hadamard(&mask)?;
        trace!("relu backward {:?}", grad_input.shape());
        self.cached_input = None;
        Ok(grad_input)
    }

    fn clear_cache(&mut self) {
        self.cached_input = None;
    }

    fn kind(&self) -> &'static str {
        "relu"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_clamps_negatives() {
        let mut relu = Relu::new();
        let x = Matrix::from_rows(vec![vec![-1.0, 0.0, 2.5]]).unwrap();
        assert_eq!(relu.forward(&x).unwrap(), Matrix::from_rows(vec![vec![0.0, 0.0, 2.5]]).unwrap());
        assert!(relu.parameters().is_empty());
    }

    #[test]
    fn backward_masks_non_positive_inputs() {
        let mut relu = Relu::new();
        let x = Matrix::from_rows(vec![vec![-1.0, 0.0, 2.5], vec![3.0, -0.5, 1e-9]]).unwrap();
        relu.forward(&x).unwrap();
        let dz = Matrix::from_rows(vec![vec![7.0, 7.0, 7.0], vec![-2.0, -2.0, -2.0]]).unwrap();
        let dx = relu.backward(&dz).unwrap();
        assert_eq!(dx, Matrix::from_rows(vec![vec![0.0, 0.0, 7.0], vec![-2.0, 0.0, -2.0]]).unwrap());
    }

    #[test]
    fn backward_without_forward_fails() {
        let mut relu = Relu::new();
        assert!(matches!(
            relu.backward(&Matrix::zeros(1, 1)),
            Err(Error::UninitializedCache { layer: "relu" })
        ));
    }

    #[test]
    fn backward_rejects_mismatched_gradient() {
        let mut relu = Relu::new();
        relu.forward(&Matrix::zeros(2, 2)).unwrap();
        assert!(matches!(
            relu.backward(&Matrix::zeros(2, 3)),
            Err(Error::ShapeMismatch { .. })
        ));
    }
}
