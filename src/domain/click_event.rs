//! Click event model for asynchronous click tracking.

use crate::domain::entities::NewClick;

/// An in-memory click event handed from the redirect path to the click worker.
///
/// `link_id` is `None` when the link id could not be determined (for example a
/// cache hit whose store lookup failed). Such events are never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickEvent {
    pub link_id: Option<i64>,
    pub ip_address: String,
    pub user_agent: String,
    pub referer: String,
}

impl ClickEvent {
    /// Creates a new click event. Missing headers are stored as empty strings.
    pub fn new(
        link_id: Option<i64>,
        ip_address: impl Into<String>,
        user_agent: Option<&str>,
        referer: Option<&str>,
    ) -> Self {
        Self {
            link_id,
            ip_address: ip_address.into(),
            user_agent: user_agent.unwrap_or_default().to_string(),
            referer: referer.unwrap_or_default().to_string(),
        }
    }

    /// Converts the event into a persistable click.
    ///
    /// Returns `None` for events without a link id. Geolocation is not
    /// performed, so `country` and `city` are always empty.
    pub fn into_new_click(self) -> Option<NewClick> {
        let link_id = self.link_id?;

        Some(NewClick {
            link_id,
            ip_address: self.ip_address,
            user_agent: self.user_agent,
            referer: self.referer,
            country: None,
            city: None,
        })
    }
}
