use log::{debug, trace};

use crate::{
    error::{Error, Result},
    layers::layer::{Layer, Parameter, ParameterVisitor},
    math::matrix::Matrix,
};

/// Ordered chain of layers. Forward runs front to back, backward back to front.
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
}

impl Sequential {
    /// Builds the chain, checking that each layer's output dimension matches
    /// the next layer's input dimension wherever both are fixed. Layers that
    /// fix neither (activations) keep the running dimension unchanged.
    pub fn new(layers: Vec<Box<dyn Layer>>) -> Result<Sequential> {
        let mut current: Option<usize> = None;
        for layer in &layers {
            if let (Some(have), Some(want)) = (current, layer.input_dim()) {
                if have != want {
                    return Err(Error::shape("sequential", (want, 1), (have, 1)));
                }
            }
            if let Some(out) = layer.output_dim() {
                current = Some(out);
            } else if current.is_none() {
                current = layer.input_dim();
            }
        }
        debug!(
            "sequential: [{}]",
            layers.iter().map(|l| l.kind()).collect::<Vec<_>>().join(", ")
        );
        Ok(Sequential { layers })
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    /// Total number of learnable scalars across all layers.
    pub fn parameter_count(&self) -> usize {
        self.layers.iter()
            .flat_map(|layer| layer.parameters())
            .map(|p| p.value.rows * p.value.cols)
            .sum()
    }
}

impl Layer for Sequential {
    /// Forward pass; every layer caches its input for backprop. If any layer
    /// fails, all caches are cleared so no layer holds a partial pass.
    fn forward(&mut self, input: &Matrix) -> Result<Matrix> {
        let mut current = input.clone();
        for i in 0..self.layers.len() {
            current = match self.layers[i].forward(&current) {
                Ok(out) => out,
                Err(e) => {
                    self.clear_cache();
                    return Err(e);
                }
            };
        }
        trace!("sequential forward {:?} -> {:?}", input.shape(), current.shape());
        Ok(current)
    }

    /// Backward pass. Populates every layer's gradients; the returned matrix
    /// is the gradient w.r.t. the network input.
    fn backward(&mut self, grad_output: &Matrix) -> Result<Matrix> {
        let mut delta = grad_output.clone();
        for layer in self.layers.iter_mut().rev() {
            delta = layer.backward(&delta)?;
        }
        Ok(delta)
    }

    fn clear_cache(&mut self) {
        for layer in &mut self.layers {
            layer.clear_cache();
        }
    }

    fn parameters(&self) -> Vec<Parameter<'_>> {
        self.layers.iter().flat_map(|layer| layer.parameters()).collect()
    }

    /// Visits each layer's parameters with names of the form `"{index}.{name}"`.
    fn visit_parameters_mut(&mut self, visitor: &mut ParameterVisitor<'_>) {
        for (i, layer) in self.layers.iter_mut().enumerate() {
            layer.visit_parameters_mut(&mut |name, value, grad| {
                visitor(&format!("{}.{}", i, name), value, grad)
            });
        }
    }

    fn input_dim(&self) -> Option<usize> {
        self.layers.iter().find_map(|layer| layer.input_dim())
    }

    fn output_dim(&self) -> Option<usize> {
        self.layers.iter().rev().find_map(|layer| layer.output_dim())
    }

    fn kind(&self) -> &'static str {
        "sequential"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::{InitScheme, Linear, Relu};
    use rand::{rngs::StdRng, SeedableRng};

    fn mlp(rng: &mut StdRng) -> Sequential {
        Sequential::new(vec![
            Box::new(Linear::new(4, 5, InitScheme::Kaiming, rng)),
            Box::new(Relu::new()),
            Box::new(Linear::new(5, 3, InitScheme::Kaiming, rng)),
        ]).unwrap()
    }

    #[test]
    fn rejects_mismatched_dimensions() {
        let mut rng = StdRng::seed_from_u64(0);
        let result = Sequential::new(vec![
            Box::new(Linear::new(4, 5, InitScheme::Kaiming, &mut rng)),
            Box::new(Relu::new()),
            Box::new(Linear::new(6, 3, InitScheme::Kaiming, &mut rng)),
        ]);
        assert!(matches!(result, Err(Error::ShapeMismatch { op: "sequential", .. })));
    }

    #[test]
    fn forward_shape_and_dims() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut net = mlp(&mut rng);
        assert_eq!(net.len(), 3);
        assert_eq!(net.input_dim(), Some(4));
        assert_eq!(net.output_dim(), Some(3));
        assert_eq!(net.parameter_count(), 4 * 5 + 5 + 5 * 3 + 3);
        let out = net.forward(&Matrix::normal(4, 7, 1.0, &mut rng)).unwrap();
        assert_eq!(out.shape(), (3, 7));
    }

    #[test]
    fn backward_before_forward_propagates_cache_error() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut net = mlp(&mut rng);
        assert!(matches!(
            net.backward(&Matrix::zeros(3, 1)),
            Err(Error::UninitializedCache { layer: "linear" })
        ));
    }

    #[test]
    fn failed_forward_clears_every_cache() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut net = Sequential::new(vec![
            Box::new(Relu::new()),
            Box::new(Linear::new(2, 2, InitScheme::Kaiming, &mut rng)),
        ]).unwrap();
        net.forward(&Matrix::normal(2, 4, 1.0, &mut rng)).unwrap();

        // The relu accepts the 3-row input, the linear layer rejects it.
        assert!(matches!(
            net.forward(&Matrix::zeros(3, 4)),
            Err(Error::ShapeMismatch { .. })
        ));
        assert!(matches!(
            net.backward(&Matrix::zeros(2, 4)),
            Err(Error::UninitializedCache { layer: "linear" })
        ));
        assert!(net.parameters().iter().all(|p| p.grad.is_none()));
    }

    #[test]
    fn visitor_sees_prefixed_names() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut net = mlp(&mut rng);
        let mut names = Vec::new();
        net.visit_parameters_mut(&mut |name, _, grad| {
            assert!(grad.is_none());
            names.push(name.to_string());
        });
        assert_eq!(names, vec!["0.weight", "0.bias", "2.weight", "2.bias"]);
    }
}
