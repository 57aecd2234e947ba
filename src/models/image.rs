//! Image references
//!
//! An image reference is the bare file name of a receipt photo inside the
//! image store. It is never a path: references come from archives and user
//! input, so anything that could escape the store directory is rejected.

use std::fmt;

/// Longest accepted reference, in bytes
pub const MAX_REFERENCE_LEN: usize = 255;

/// Reasons an image reference is refused
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageReferenceError {
    Empty,
    TooLong(usize),
    ParentTraversal,
    Absolute,
    Separator,
    ControlCharacter,
    SurroundingWhitespace,
}

impl fmt::Display for ImageReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "Image reference cannot be empty"),
            Self::TooLong(len) => write!(
                f,
                "Image reference too long ({} bytes, max {})",
                len, MAX_REFERENCE_LEN
            ),
            Self::ParentTraversal => write!(f, "Image reference cannot contain '..'"),
            Self::Absolute => write!(f, "Image reference cannot be an absolute path"),
            Self::Separator => write!(f, "Image reference cannot contain path separators"),
            Self::ControlCharacter => {
                write!(f, "Image reference cannot contain control characters")
            }
            Self::SurroundingWhitespace => {
                write!(f, "Image reference cannot start or end with whitespace")
            }
        }
    }
}

impl std::error::Error for ImageReferenceError {}

/// Check that `reference` is a plain file name safe to join onto the store directory
pub fn validate_image_reference(reference: &str) -> Result<(), ImageReferenceError> {
    if reference.trim().is_empty() {
        return Err(ImageReferenceError::Empty);
    }

    if reference.len() > MAX_REFERENCE_LEN {
        return Err(ImageReferenceError::TooLong(reference.len()));
    }

    if reference.contains("..") {
        return Err(ImageReferenceError::ParentTraversal);
    }

    // Drive prefixes like "C:" are absolute on Windows
    if reference.starts_with('/')
        || reference.starts_with('\\')
        || reference.as_bytes().get(1) == Some(&b':')
    {
        return Err(ImageReferenceError::Absolute);
    }

    if reference.contains('/') || reference.contains('\\') {
        return Err(ImageReferenceError::Separator);
    }

    if reference.chars().any(char::is_control) {
        return Err(ImageReferenceError::ControlCharacter);
    }

    if reference.trim() != reference {
        return Err(ImageReferenceError::SurroundingWhitespace);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_accepted() {
        assert!(validate_image_reference("img_20241213_143022.jpg").is_ok());
        assert!(validate_image_reference("receipt.png").is_ok());
        assert!(validate_image_reference("photo 1.jpeg").is_ok());
    }

    #[test]
    fn test_traversal_rejected() {
        assert_eq!(
            validate_image_reference("../../etc/passwd"),
            Err(ImageReferenceError::ParentTraversal)
        );
        assert_eq!(
            validate_image_reference(".."),
            Err(ImageReferenceError::ParentTraversal)
        );
    }

    #[test]
    fn test_absolute_rejected() {
        assert_eq!(
            validate_image_reference("/etc/passwd"),
            Err(ImageReferenceError::Absolute)
        );
        assert_eq!(
            validate_image_reference("\\windows\\system32"),
            Err(ImageReferenceError::Absolute)
        );
        assert_eq!(
            validate_image_reference("C:evil.jpg"),
            Err(ImageReferenceError::Absolute)
        );
    }

    #[test]
    fn test_nested_and_empty_rejected() {
        assert_eq!(
            validate_image_reference("sub/img.jpg"),
            Err(ImageReferenceError::Separator)
        );
        assert_eq!(validate_image_reference(""), Err(ImageReferenceError::Empty));
        assert_eq!(validate_image_reference("  "), Err(ImageReferenceError::Empty));
        assert_eq!(
            validate_image_reference("a\0b"),
            Err(ImageReferenceError::ControlCharacter)
        );
        assert!(matches!(
            validate_image_reference(&"a".repeat(300)),
            Err(ImageReferenceError::TooLong(300))
        ));
    }

    #[test]
    fn test_padded_names_rejected() {
        assert_eq!(
            validate_image_reference(" a.jpg"),
            Err(ImageReferenceError::SurroundingWhitespace)
        );
        assert_eq!(
            validate_image_reference("a.jpg "),
            Err(ImageReferenceError::SurroundingWhitespace)
        );
    }
}
