use serde::{Serialize, Deserialize};

/// Weight initialization scheme for a linear layer.
///
/// All schemes draw from N(0, 1) and differ only in the scale factor applied
/// for a fan-in of `input_dim`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InitScheme {
    /// He initialization, scale `sqrt(2 / input_dim)`. Suited to ReLU.
    #[default]
    Kaiming,
    /// Scale `sqrt(1 / input_dim)`.
    Xavier,
    /// Scale `1 / input_dim`. Selected by any unrecognized name.
    Legacy,
}

impl InitScheme {
    /// Resolves a scheme by name: `"Kaiming"` and `"Xavier"` are recognized
    /// (case-sensitive), anything else falls back to `Legacy`.
    pub fn from_name(name: &str) -> InitScheme {
        match name {
            "Kaiming" => InitScheme::Kaiming,
            "Xavier" => InitScheme::Xavier,
            _ => InitScheme::Legacy,
        }
    }

    pub fn scale(self, input_dim: usize) -> f64 {
        let fan_in = input_dim as f64;
        match self {
            InitScheme::Kaiming => (2.0 / fan_in).sqrt(),
            InitScheme::Xavier => (1.0 / fan_in).sqrt(),
            InitScheme::Legacy => 1.0 / fan_in,
        }
    }
}
