//! DTO for the QR payload endpoint.

use serde::Serialize;

/// Content to be encoded into a QR image by the client.
#[derive(Debug, Serialize)]
pub struct QrResponse {
    pub code: String,
    pub short_url: String,
}
