//! Transform implementations run inside execution units

pub mod panorama;

pub use panorama::{PanoramaEngine, PanoramaTransformer};
