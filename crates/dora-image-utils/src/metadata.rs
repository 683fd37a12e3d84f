use dora_node_api::{MetadataParameters, Parameter};

use crate::error::ImageUtilsError;

/// Typed lookups over the parameters attached to a dora input.
pub trait MetadataExt {
    /// Returns the string parameter `key`, if present with a string value.
    fn get_str(&self, key: &str) -> Option<&str>;

    /// Returns the integer parameter `key`, if present with an integer value.
    fn get_int(&self, key: &str) -> Option<i64>;

    /// Returns the string parameter `key` or an [`ImageUtilsError::InvalidMetadata`].
    fn require_str(&self, key: &str) -> Result<&str, ImageUtilsError> {
        self.get_str(key)
            .ok_or_else(|| ImageUtilsError::InvalidMetadata(key.to_string()))
    }

    /// Returns the non-negative integer parameter `key` as a `usize`.
    fn require_usize(&self, key: &str) -> Result<usize, ImageUtilsError> {
        self.get_int(key)
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| ImageUtilsError::InvalidMetadata(key.to_string()))
    }
}

impl MetadataExt for MetadataParameters {
    fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Parameter::String(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    fn get_int(&self, key: &str) -> Option<i64> {
        match self.get(key) {
            Some(Parameter::Integer(value)) => Some(*value),
            _ => None,
        }
    }
}
