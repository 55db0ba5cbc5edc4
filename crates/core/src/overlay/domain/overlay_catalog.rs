use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;

use crate::expression::domain::expression_label::ExpressionLabel;
use crate::overlay::domain::overlay_descriptor::{OverlayDescriptor, OverlayError};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("no overlay asset for expression '{0}'")]
    MissingAsset(ExpressionLabel),
    #[error("failed to load overlay '{label}' from {path}: {source}")]
    Load {
        label: ExpressionLabel,
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    #[error("invalid overlay for expression '{label}': {source}")]
    Invalid {
        label: ExpressionLabel,
        source: OverlayError,
    },
}

/// Closed mapping from every expression label to its overlay.
///
/// Construction fails unless all six labels resolve, so lookups never miss.
#[derive(Clone, Debug)]
pub struct OverlayCatalog {
    overlays: HashMap<ExpressionLabel, OverlayDescriptor>,
}

impl OverlayCatalog {
    pub fn new(
        entries: impl IntoIterator<Item = (ExpressionLabel, OverlayDescriptor)>,
    ) -> Result<Self, CatalogError> {
        let overlays: HashMap<_, _> = entries.into_iter().collect();
        if let Some(missing) = ExpressionLabel::ALL
            .into_iter()
            .find(|label| !overlays.contains_key(label))
        {
            return Err(CatalogError::MissingAsset(missing));
        }
        Ok(Self { overlays })
    }

    pub fn lookup(&self, label: ExpressionLabel) -> &OverlayDescriptor {
        // Every label is present: checked in `new`.
        &self.overlays[&label]
    }
}
