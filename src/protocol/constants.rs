//! Wire-level constants.

/// Parameter keys starting with this marker name a local file to upload.
pub const FILE_MARKER: char = '@';

/// Content types set by the request helpers.
pub mod content_types {
    /// URL-encoded form body.
    pub const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";
    /// Content type of uploaded files.
    pub const OCTET_STREAM: &str = "application/octet-stream";
}
