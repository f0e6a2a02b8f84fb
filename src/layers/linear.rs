use log::{debug, trace};
use rand::Rng;

use crate::{
    error::{Error, Result},
    layers::{init::InitScheme, layer::{Layer, Parameter, ParameterVisitor}},
    math::matrix::Matrix,
};

/// Gradients of a [`Linear`] layer, keyed like its parameters.
#[derive(Debug, Clone)]
pub struct LinearGrads {
    pub weight: Matrix,
    pub bias: Matrix,
}

/// Affine layer `z = W·x + b` applied to every column of a batch.
#[derive(Debug, Clone)]
pub struct Linear {
    input_dim: usize,
    output_dim: usize,
    /// `output_dim × input_dim`
    pub weight: Matrix,
    /// `output_dim × 1`
    pub bias: Matrix,
    grads: Option<LinearGrads>,
    cached_input: Option<Matrix>,  // input of the last forward, consumed by backward
}

impl Linear {
    /// Random weights from `init`, zero bias.
    pub fn new<R: Rng + ?Sized>(
        input_dim: usize,
        output_dim: usize,
        init: InitScheme,
        rng: &mut R,
    ) -> Linear {
        debug!("linear {} -> {} ({:?} init)", input_dim, output_dim, init);
        Linear {
            input_dim,
            output_dim,
            weight: Matrix::normal(output_dim, input_dim, init.scale(input_dim), rng),
            bias: Matrix::zeros(output_dim, 1),
            grads: None,
            cached_input: None,
        }
    }

    /// Builds a layer from explicit parameters. `bias` must be `weight.rows × 1`.
    pub fn with_params(weight: Matrix, bias: Matrix) -> Result<Linear> {
        if bias.shape() != (weight.rows, 1) {
            return Err(Error::shape("linear bias", (weight.rows, 1), bias.shape()));
        }
        Ok(Linear {
            input_dim: weight.cols,
            output_dim: weight.rows,
            weight,
            bias,
            grads: None,
            cached_input: None,
        })
    }

    /// Gradients from the most recent backward pass.
    pub fn grads(&self) -> Option<&LinearGrads> {
        self.grads.as_ref()
    }
}

impl Layer for Linear {
    fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        if input.rows != self.input_dim {
            return Err(Error::shape("linear forward", (self.input_dim, input.cols), input.shape()));
        }
        let z = self.weight.dot(input)?.add_column_broadcast(&self.bias)?;
        trace!("linear forward {:?} -> {:?}", input.shape(), z.shape());
        self.cached_input = Some(input.clone());
        Ok(z)
    }

    fn backward(&mut self, grad_output: &Matrix) -> Result<Matrix> {
        let input = self.cached_input.as_ref()
            .ok_or(Error::UninitializedCache { layer: "linear" })?;
        if grad_output.shape() != (self.output_dim, input.cols) {
            return Err(Error::shape(
                "linear backward",
                (self.output_dim, input.cols),
                grad_output.shape(),
            ));
        }

        let bias = grad_output.sum_columns();
        let weight = grad_output.dot(&input.transpose())?;
        let grad_input = self.weight.transpose().dot(grad_output)?;

        trace!("linear backward {:?} -> {:?}", grad_output.shape(), grad_input.shape());
        self.grads = Some(LinearGrads { weight, bias });
        self.cached_input = None;
        Ok(grad_input)
    }

    fn clear_cache(&mut self) {
        self.cached_input = None;
    }

    fn parameters(&self) -> Vec<Parameter<'_>> {
        vec![
            Parameter {
                name: "weight",
                value: &self.weight,
                grad: self.grads.as_ref().map(|g| &g.weight),
            },
            Parameter {
                name: "bias",
                value: &self.bias,
                grad: self.grads.as_ref().map(|g| &g.bias),
            },
        ]
    }

    fn visit_parameters_mut(&mut self, visitor: &mut ParameterVisitor<'_>) {
        let grads = self.grads.as_ref();
        visitor("weight", &mut self.weight, grads.map(|g| &g.weight));
        visitor("bias", &mut self.bias, grads.map(|g| &g.bias));
    }

    fn input_dim(&self) -> Option<usize> {
        Some(self.input_dim)
    }

    fn output_dim(&self) -> Option<usize> {
        Some(self.output_dim)
    }

    fn kind(&self) -> &'static str {
        "linear"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn layer() -> Linear {
        let weight = Matrix::from_rows(vec![
            vec![1.0, -1.0, 0.5],
            vec![2.0, 0.0, -2.0],
        ]).unwrap();
        Linear::with_params(weight, Matrix::column(vec![0.5, -1.0])).unwrap()
    }

    #[test]
    fn new_has_zero_bias_and_no_grads() {
        let mut rng = StdRng::seed_from_u64(1);
        let layer = Linear::new(4, 3, InitScheme::Xavier, &mut rng);
        assert_eq!(layer.weight.shape(), (3, 4));
        assert_eq!(layer.bias, Matrix::zeros(3, 1));
        assert!(layer.grads().is_none());
        assert!(layer.parameters().iter().all(|p| p.grad.is_none()));
    }

    #[test]
    fn legacy_init_has_std_of_inverse_input_dim() {
        let mut rng = StdRng::seed_from_u64(7);
        let layer = Linear::new(400, 50, InitScheme::Legacy, &mut rng);
        let values: Vec<f64> = layer.weight.data.iter().flatten().copied().collect();
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = (values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n).sqrt();
        assert!(mean.abs() < 1e-4, "mean = {}", mean);
        assert!((std - 1.0 / 400.0).abs() < 0.1 / 400.0, "std = {}", std);
    }

    #[test]
    fn forward_is_affine_per_column() {
        let mut layer = layer();
        let x = Matrix::from_columns(&[vec![1.0, 2.0, 2.0], vec![0.0, 0.0, 0.0]]).unwrap();
        let z = layer.forward(&x).unwrap();
        assert_eq!(z.column_values(0), vec![0.5, -3.0]);
        assert_eq!(z.column_values(1), vec![0.5, -1.0]);
    }

    #[test]
    fn forward_rejects_wrong_input_dim() {
        let mut layer = layer();
        assert!(matches!(
            layer.forward(&Matrix::zeros(2, 4)),
            Err(Error::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn backward_without_forward_fails() {
        let mut layer = layer();
        assert!(matches!(
            layer.backward(&Matrix::zeros(2, 1)),
            Err(Error::UninitializedCache { layer: "linear" })
        ));
    }

    #[test]
    fn backward_consumes_the_cache() {
        let mut layer = layer();
        layer.forward(&Matrix::zeros(3, 2)).unwrap();
        layer.backward(&Matrix::zeros(2, 2)).unwrap();
        assert!(matches!(
            layer.backward(&Matrix::zeros(2, 2)),
            Err(Error::UninitializedCache { .. })
        ));
    }

    #[test]
    fn backward_rejects_mismatched_gradient_and_keeps_cache() {
        let mut layer = layer();
        layer.forward(&Matrix::zeros(3, 2)).unwrap();
        assert!(matches!(
            layer.backward(&Matrix::zeros(2, 3)),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(layer.backward(&Matrix::zeros(2, 2)).is_ok());
    }

    #[test]
    fn backward_gradients() {
        let mut layer = layer();
        let x = Matrix::from_columns(&[vec![1.0, 2.0, 3.0], vec![-1.0, 0.0, 1.0]]).unwrap();
        layer.forward(&x).unwrap();
        let dz = Matrix::from_columns(&[vec![1.0, 0.0], vec![2.0, 1.0]]).unwrap();
        let dx = layer.backward(&dz).unwrap();

        let grads = layer.grads().unwrap();
        assert_eq!(grads.bias, Matrix::column(vec![3.0, 1.0]));
        assert_eq!(
            grads.weight,
            Matrix::from_rows(vec![vec![-1.0, 2.0, 5.0], vec![-1.0, 0.0, 1.0]]).unwrap()
        );
        // Wᵗ·dZ
        assert_eq!(dx.column_values(0), vec![1.0, -1.0, 0.5]);
        assert_eq!(dx.column_values(1), vec![4.0, -2.0, -1.0]);
    }
}
