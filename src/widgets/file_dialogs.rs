//! File picker for uploads.

use crate::entities::data_url::IMAGE_EXTENSIONS;

/// Single-image picker filtered to decodable formats.
pub fn image_dialog(title: &str) -> rfd::FileDialog {
    rfd::FileDialog::new()
        .add_filter("Images", IMAGE_EXTENSIONS)
        .set_title(title)
}
