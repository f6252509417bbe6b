//! Common types used throughout lanepager
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use bytes::Bytes;
use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// A single entity record as decoded from a page body.
///
/// The engine never looks inside a record.
pub type Record = serde_json::Value;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

// ============================================================================
// Raw Response
// ============================================================================

/// Status and undecoded body of one lane's response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body bytes
    pub body: Bytes,
}

impl RawResponse {
    /// Create a response from a status and body
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Create a 200 response with a JSON body
    pub fn json(value: &serde_json::Value) -> Self {
        Self::new(200, value.to_string())
    }

    /// Create a 404 response with an empty body
    pub fn not_found() -> Self {
        Self::new(404, Bytes::new())
    }

    /// Check if the status is in the 2xx range
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as lossy UTF-8, for error messages
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

// ============================================================================
// Utilities
// ============================================================================

/// Extension trait for Option<String> to handle empty strings
pub trait OptionStringExt {
    /// Returns None if the string is empty
    fn none_if_empty(self) -> Option<String>;
}

impl OptionStringExt for Option<String> {
    fn none_if_empty(self) -> Option<String> {
        self.filter(|s| !s.is_empty())
    }
}
