//! Typed form input and pure validation.
//!
//! Untrusted request bodies are decoded into the input structs here and
//! checked by validation functions that return either ok or a list of
//! field-level violations. Existence checks that need the store (does the
//! referenced group exist?) are performed by the handlers and merged into
//! the same violation list.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::{MIN_POST_TEXT_CHARS, TEXT_TOO_SHORT};

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Image formats accepted as post attachments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Gif,
    Png,
    Jpeg,
    Webp,
}

impl ImageFormat {
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        match content_type {
            "image/gif" => Some(Self::Gif),
            "image/png" => Some(Self::Png),
            "image/jpeg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Gif => "gif",
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Webp => "webp",
        }
    }

    /// Check that the payload's leading bytes agree with the declared format.
    pub fn matches_magic(&self, bytes: &[u8]) -> bool {
        match self {
            Self::Gif => bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a"),
            Self::Png => bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            Self::Jpeg => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
            Self::Webp => {
                bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP"
            }
        }
    }
}

/// An image payload as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub content_type: String,
    pub bytes: Bytes,
}

impl ImageUpload {
    pub fn format(&self) -> Option<ImageFormat> {
        ImageFormat::from_content_type(&self.content_type)
    }
}

/// Input for creating or editing a post.
///
/// `group` carries the slug of the selected group, or nothing.
#[derive(Debug, Clone, Default)]
pub struct PostInput {
    pub text: String,
    pub group: Option<String>,
    pub image: Option<ImageUpload>,
}

/// Input for adding a comment to a post.
#[derive(Debug, Clone, Default)]
pub struct CommentInput {
    pub text: String,
}

/// Shape-check a post input.
pub fn validate_post(input: &PostInput) -> Result<(), Vec<FieldViolation>> {
    let mut violations = Vec::new();

    if input.text.trim().chars().count() < MIN_POST_TEXT_CHARS {
        violations.push(FieldViolation::new("text", TEXT_TOO_SHORT));
    }

    if let Some(image) = &input.image {
        match image.format() {
            None => violations.push(FieldViolation::new(
                "image",
                format!("Unsupported image type: {}", image.content_type),
            )),
            Some(format) if !format.matches_magic(&image.bytes) => violations.push(
                FieldViolation::new("image", "Upload a valid image. The file you uploaded was either not an image or a corrupted image."),
            ),
            Some(_) => {}
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Shape-check a comment input. Any non-empty text is accepted.
pub fn validate_comment(input: &CommentInput) -> Result<(), Vec<FieldViolation>> {
    if input.text.trim().is_empty() {
        return Err(vec![FieldViolation::new("text", "This field is required.")]);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // 1x2 transparent GIF, the smallest well-formed payload.
    const SMALL_GIF: &[u8] = &[
        0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x02, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
        0x00, 0xFF, 0xFF, 0xFF, 0x21, 0xF9, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x2C, 0x00, 0x00,
        0x00, 0x00, 0x02, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x0C, 0x0A, 0x00, 0x3B,
    ];

    fn gif_upload() -> ImageUpload {
        ImageUpload {
            filename: Some("small.gif".to_string()),
            content_type: "image/gif".to_string(),
            bytes: Bytes::from_static(SMALL_GIF),
        }
    }

    #[test]
    fn short_text_is_a_text_violation() {
        let input = PostInput {
            text: "too short".to_string(),
            ..Default::default()
        };

        let violations = validate_post(&input).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "text");
        assert_eq!(
            violations[0].message,
            "This field must be at least 15 characters long."
        );
    }

    #[test]
    fn valid_post_with_image_passes() {
        let input = PostInput {
            text: "a perfectly reasonable post".to_string(),
            group: Some("rust".to_string()),
            image: Some(gif_upload()),
        };

        assert!(validate_post(&input).is_ok());
    }

    #[test]
    fn unknown_content_type_is_an_image_violation() {
        let input = PostInput {
            text: "a perfectly reasonable post".to_string(),
            image: Some(ImageUpload {
                filename: Some("notes.txt".to_string()),
                content_type: "text/plain".to_string(),
                bytes: Bytes::from_static(b"not an image"),
            }),
            ..Default::default()
        };

        let violations = validate_post(&input).unwrap_err();
        assert_eq!(violations[0].field, "image");
    }

    #[test]
    fn mismatched_magic_bytes_are_rejected() {
        let input = PostInput {
            text: "a perfectly reasonable post".to_string(),
            image: Some(ImageUpload {
                filename: Some("fake.png".to_string()),
                content_type: "image/png".to_string(),
                bytes: Bytes::from_static(SMALL_GIF),
            }),
            ..Default::default()
        };

        let violations = validate_post(&input).unwrap_err();
        assert_eq!(violations[0].field, "image");
    }

    #[test]
    fn short_text_and_bad_image_report_both_fields() {
        let input = PostInput {
            text: "nope".to_string(),
            image: Some(ImageUpload {
                filename: None,
                content_type: "application/pdf".to_string(),
                bytes: Bytes::new(),
            }),
            ..Default::default()
        };

        let violations = validate_post(&input).unwrap_err();
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["text", "image"]);
    }

    #[test]
    fn empty_comment_is_rejected() {
        let input = CommentInput {
            text: "   ".to_string(),
        };
        assert!(validate_comment(&input).is_err());
    }

    #[test]
    fn one_character_comment_is_accepted() {
        let input = CommentInput {
            text: "+".to_string(),
        };
        assert!(validate_comment(&input).is_ok());
    }
}
