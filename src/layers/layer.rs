use crate::{error::Result, math::matrix::Matrix};

/// Read-only view of one learnable tensor and its most recent gradient.
///
/// `grad` is `None` until the owning layer has completed a backward pass.
#[derive(Debug, Clone, Copy)]
pub struct Parameter<'a> {
    pub name: &'static str,
    pub value: &'a Matrix,
    pub grad: Option<&'a Matrix>,
}

/// Callback for [`Layer::visit_parameters_mut`]: `(name, value, gradient)`.
pub type ParameterVisitor<'v> = dyn FnMut(&str, &mut Matrix, Option<&Matrix>) + 'v;

/// A differentiable unit of a network.
///
/// Tensors are `features × batch`. `forward` caches whatever the layer needs
/// for the next `backward`; `backward` consumes that cache, overwrites the
/// layer's gradients and returns the gradient w.r.t. the layer input.
pub trait Layer {
    fn forward(&mut self, input: &Matrix) -> Result<Matrix>;

    /// `grad_output` is ∂L/∂output, same shape as the last forward output.
    /// Fails with `Error::UninitializedCache` if no forward preceded it.
    fn backward(&mut self, grad_output: &Matrix) -> Result<Matrix>;

    /// Drops the cached forward input, so the next `backward` fails until a
    /// new `forward` succeeds.
    fn clear_cache(&mut self) {}

    /// Parameter set paired with the gradient set. Empty for layers
    /// without learnable parameters.
    fn parameters(&self) -> Vec<Parameter<'_>> {
        Vec::new()
    }

    /// Hands every `(name, value, gradient)` triple to `visitor`, which may
    /// update the value in place. This is the hook an external optimizer uses.
    fn visit_parameters_mut(&mut self, _visitor: &mut ParameterVisitor<'_>) {}

    /// Expected leading dimension of the input, if the layer fixes one.
    fn input_dim(&self) -> Option<usize> {
        None
    }

    /// Leading dimension of the output, if the layer fixes one.
    fn output_dim(&self) -> Option<usize> {
        None
    }

    /// Short name used in logs and errors.
    fn kind(&self) -> &'static str;
}
