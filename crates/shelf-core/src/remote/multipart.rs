//! Multipart form for product submissions.

use reqwest::multipart::{Form, Part};

use crate::models::ProductPayload;

pub const IMAGE_FILE_NAME: &str = "image.jpg";
pub const IMAGE_MIME_TYPE: &str = "image/jpeg";

/// Render a decimal the way the service parses it: whole numbers keep one
/// fractional digit (`5.0`), everything else uses the shortest exact form.
pub fn format_decimal(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        value.to_string()
    }
}

/// Text fields in the order the service reads them.
pub fn product_fields(payload: &ProductPayload) -> [(&'static str, String); 4] {
    [
        ("product_name", payload.name.clone()),
        ("product_type", payload.category.clone()),
        ("price", format_decimal(payload.price)),
        ("tax", format_decimal(payload.tax_rate)),
    ]
}

/// Build the `multipart/form-data` body for `payload`.
///
/// The image part, when present, goes last as `image.jpg` with a JPEG mime type.
pub fn product_form(payload: &ProductPayload) -> reqwest::Result<Form> {
    let form = product_fields(payload)
        .into_iter()
        .fold(Form::new(), |form, (name, value)| form.text(name, value));

    let Some(image) = &payload.image else {
        return Ok(form);
    };
    let image_part = Part::bytes(image.clone())
        .file_name(IMAGE_FILE_NAME)
        .mime_str(IMAGE_MIME_TYPE)?;
    Ok(form.part("image", image_part))
}
