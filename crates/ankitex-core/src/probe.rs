use std::path::PathBuf;
use tracing::debug;

use crate::error::{AnkiTexError, Result};
use crate::model::ImageInfo;
use crate::tools::ImageIntrospector;

/// Probes every source image and returns the format and size they share.
///
/// Image 0 is the reference; the first image that differs from it in color
/// format, width or height fails the set with its index.
pub fn probe_image_set(introspector: &dyn ImageIntrospector, paths: &[PathBuf]) -> Result<ImageInfo> {
    let Some((first, rest)) = paths.split_first() else {
        return Err(AnkiTexError::InvalidConfig("no input images".into()));
    };
    let reference = introspector.identify(first)?;
    debug!(path = %first.display(), ?reference, "reference image");

    for (i, path) in rest.iter().enumerate() {
        let info = introspector.identify(path)?;
        if info != reference {
            return Err(AnkiTexError::InconsistentImageSet {
                index: i + 1,
                format: info.format,
                width: info.width,
                height: info.height,
                expected_format: reference.format,
                expected_width: reference.width,
                expected_height: reference.height,
            });
        }
    }
    Ok(reference)
}
