/// Two Gaussian blobs, one per class, pushed through Linear → ReLU → Linear.
///
/// The crate computes gradients only; this demo plays the part of the
/// external optimizer with a plain gradient step applied through
/// `visit_parameters_mut`.
///
/// Run with:
///   cargo run --example separable
use rand::{rngs::StdRng, Rng, SeedableRng};

use sgd_blocks::{accuracy, CrossEntropyLoss, Layer, Matrix, NetworkSpec};

fn blobs(n: usize, rng: &mut StdRng) -> (Matrix, Vec<usize>) {
    let mut columns = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    for i in 0..n {
        let class = i % 2;
        let centre = if class == 0 { -2.0 } else { 2.0 };
        columns.push(vec![
            centre + rng.gen_range(-1.0..1.0),
            centre + rng.gen_range(-1.0..1.0),
        ]);
        labels.push(class);
    }
    (Matrix::from_columns(&columns).expect("columns share a length"), labels)
}

fn main() -> sgd_blocks::Result<()> {
    env_logger::init();

    let mut rng = StdRng::seed_from_u64(42);
    let (x, y) = blobs(64, &mut rng);
    let mut network = NetworkSpec::mlp("blobs", &[2, 8, 2], "Kaiming").build(&mut rng)?;

    let learning_rate = 0.5;
    for step in 0..50 {
        let scores = network.forward(&x)?;
        let (loss, grad) = CrossEntropyLoss::compute(&y, &scores)?;
        if step % 10 == 0 {
            println!("step {step:>2}: loss = {loss:.6}, accuracy = {:.3}", accuracy(&scores, &y)?);
        }
        network.backward(&grad)?;
        let mut failed = None;
        network.visit_parameters_mut(&mut |_, value, grad| {
            let Some(grad) = grad else { return };
            match value.sub(&grad.scale(learning_rate)) {
                Ok(updated) => *value = updated,
                Err(e) => failed = failed.take().or(Some(e)),
            }
        });
        if let Some(e) = failed {
            return Err(e);
        }
    }

    let scores = network.forward(&x)?;
    println!("final accuracy = {:.3}", accuracy(&scores, &y)?);
    Ok(())
}
