use std::collections::HashSet;

use crate::registry::models::ImageIdentifier;

/// Result of classifying a repository's images against the active tag set
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kept: Vec<ImageIdentifier>,
    /// In input order
    pub stale: Vec<ImageIdentifier>,
}

/// Split images into kept and stale, preserving input order in both halves
///
/// An image is kept only when it has a tag and that tag is active. Untagged
/// images never match anything and are always stale.
pub fn partition(images: &[ImageIdentifier], active: &HashSet<String>) -> Classification {
    let mut classification = Classification::default();

    for image in images {
        let is_active = image
            .tag
            .as_ref()
            .is_some_and(|tag| active.contains(tag));

        if is_active {
            classification.kept.push(image.clone());
        } else {
            classification.stale.push(image.clone());
        }
    }

    classification
}

/// The stale images of a repository, in input order
#[cfg_attr(not(test), allow(dead_code))]
pub fn classify(images: &[ImageIdentifier], active: &HashSet<String>) -> Vec<ImageIdentifier> {
    partition(images, active).stale
}
