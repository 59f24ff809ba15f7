//! Inline previews of a selected file, before the form it belongs to is submitted.
//!
//! A preview is the file rendered as a `data:` URL that can be used directly as an image
//! source. No file selected means an empty source, which clears the preview.
use crate::images::UploadedImage;

pub fn preview_src(file: Option<&UploadedImage>) -> String {
    guard!(let Some(file) = file else {
        return String::new()
    });
    format!(
        "data:{};base64,{}",
        file.content_type.essence_str(),
        base64::encode(&file.bytes)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selected_file_becomes_data_url() {
        let file = UploadedImage {
            content_type: mime::IMAGE_PNG,
            bytes: b"hello".to_vec(),
        };
        assert_eq!(preview_src(Some(&file)), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn test_no_file_clears_preview() {
        assert_eq!(preview_src(None), "");
    }
}
