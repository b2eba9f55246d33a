//! HTTP status classification for upstream responses.
//!
//! Every transport execution terminates in exactly one [`ResultStatus`];
//! the mapping is total over the status-code domain so no upstream code can
//! escape classification.

/// Unified terminal status of a transport execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultStatus {
    /// Upstream answered with a 2xx.
    Ok,
    /// The inbound call carried no usable credential.
    Unauthenticated,
    /// Upstream rejected the credential or the resource (401/403/404),
    /// or a required token was absent before dispatch.
    NotFound,
    /// Transport-level failure or any other upstream status.
    Internal,
}

/// Map an upstream HTTP status code to a [`ResultStatus`].
///
/// 200 itself is OK and 300 is INTERNAL; the inclusive 2xx range is spelled
/// out to keep the boundaries explicit.
pub fn map_status(code: u16) -> ResultStatus {
    match code {
        401 | 403 | 404 => ResultStatus::NotFound,
        200..=299 => ResultStatus::Ok,
        _ => ResultStatus::Internal,
    }
}
