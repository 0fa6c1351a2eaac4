//! DTOs for the link listing endpoint.

use serde::Serialize;

use super::shorten::LinkResponse;

/// A page of links, newest first.
#[derive(Debug, Serialize)]
pub struct LinkListResponse {
    pub urls: Vec<LinkResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}
