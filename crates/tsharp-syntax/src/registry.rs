//! Lookup of built-in readers.

use crate::traits::Reader;

/// Every reader compiled into this build.
static READERS: &[&dyn Reader] = &[
    #[cfg(feature = "read-typescript")]
    &crate::input::typescript::TYPESCRIPT_READER,
];

/// Get a reader for a file extension (without the leading dot).
pub fn reader_for_extension(ext: &str) -> Option<&'static dyn Reader> {
    READERS
        .iter()
        .find(|r| r.extensions().contains(&ext))
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(feature = "read-typescript")]
    fn test_lookup_by_extension() {
        let reader = reader_for_extension("ts").unwrap();
        assert_eq!(reader.language(), "typescript");
        assert!(reader_for_extension("py").is_none());
        assert_eq!(reader_for_extension("mts").map(|r| r.language()), Some("typescript"));
    }
}
