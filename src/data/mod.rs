pub mod idx;

pub use idx::{Dataset, parse_idx_pair};
