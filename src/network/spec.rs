use std::path::Path;

use log::debug;
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::layers::{InitScheme, Layer, Linear, Relu};
use crate::network::sequential::Sequential;

/// Describes one layer in a network specification.
///
/// `init` is resolved with [`InitScheme::from_name`]; a missing value means
/// Kaiming, an unrecognized one means the legacy `1 / input_dim` scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Linear {
        input_dim: usize,
        output_dim: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        init: Option<String>,
    },
    Relu,
}

impl LayerSpec {
    fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Box<dyn Layer> {
        match self {
            LayerSpec::Linear { input_dim, output_dim, init } => {
                let scheme = init.as_deref().map_or(InitScheme::default(), InitScheme::from_name);
                Box::new(Linear::new(*input_dim, *output_dim, scheme, rng))
            }
            LayerSpec::Relu => Box::new(Relu::new()),
        }
    }
}

/// A serializable description of a network architecture.
///
/// Only the architecture is stored; weights are drawn fresh by [`NetworkSpec::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    /// Human-readable name, used in logs.
    pub name: String,
    /// Ordered list of layer descriptions (input → output).
    pub layers: Vec<LayerSpec>,
}

impl NetworkSpec {
    /// Linear layers of the given widths with a ReLU between consecutive
    /// pairs. `dims = [784, 64, 10]` gives Linear(784→64), ReLU, Linear(64→10).
    pub fn mlp(name: &str, dims: &[usize], init: &str) -> NetworkSpec {
        let n_linear = dims.len().saturating_sub(1);
        let mut layers = Vec::with_capacity(n_linear * 2);
        for (i, pair) in dims.windows(2).enumerate() {
            layers.push(LayerSpec::Linear {
                input_dim: pair[0],
                output_dim: pair[1],
                init: Some(init.to_owned()),
            });
            if i + 1 < n_linear {
                layers.push(LayerSpec::Relu);
            }
        }
        NetworkSpec { name: name.to_owned(), layers }
    }

    /// Instantiates the layers and checks that their dimensions chain.
    pub fn build<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Sequential> {
        debug!("building network '{}' ({} layers)", self.name, self.layers.len());
        Sequential::new(self.layers.iter().map(|spec| spec.build(&mut *rng)).collect())
    }

    pub fn from_json_str(json: &str) -> Result<NetworkSpec> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the spec to a pretty-printed JSON file.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a `NetworkSpec` from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<NetworkSpec> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
