use thiserror::Error;

use crate::cache::StoreError;
use crate::config::ConfigError;
use crate::geocoder::GeocodeError;
use crate::visual::VisualModelError;

/// Failures while assembling a pipeline from configuration.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to set up visual model: {0}")]
    Visual(#[from] VisualModelError),

    #[error("failed to set up geocoder: {0}")]
    Geocoder(#[from] GeocodeError),

    #[error("failed to open verdict store: {0}")]
    Store(#[from] StoreError),
}
