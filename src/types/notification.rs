//! Track-change notification payloads

use serde::{Deserialize, Serialize};

use super::state::{PlaybackState, trimmed};

/// One row of a list notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationItem {
    /// Left column
    pub title: String,
    /// Right column
    pub message: String,
}

/// A user-visible notification describing the current track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Site or player name
    pub title: String,
    /// Song title
    pub message: String,
    /// Cover art, presenter falls back to its own icon when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    /// Song, artist/album and time rows
    pub items: Vec<NotificationItem>,
}

impl Notification {
    /// Build the notification for a state report
    ///
    /// Returns `None` when the report has no song title.
    #[must_use]
    pub fn from_state(state: &PlaybackState) -> Option<Self> {
        let song = state.song_title()?;
        let text = |v: Option<&String>| v.map(|s| s.trim().to_string()).unwrap_or_default();

        let mut items = vec![NotificationItem {
            title: song.to_string(),
            message: String::new(),
        }];

        if state.artist.is_some() || state.album.is_some() {
            items.push(NotificationItem {
                title: text(state.artist.as_ref()),
                message: text(state.album.as_ref()),
            });
        }

        if state.current_time.is_some() || state.total_time.is_some() {
            items.push(NotificationItem {
                title: text(state.current_time.as_ref()),
                message: text(state.total_time.as_ref()),
            });
        }

        Some(Self {
            title: text(state.site_name.as_ref()),
            message: song.to_string(),
            icon_url: trimmed(state.art_url.as_deref()).map(str::to_string),
            items,
        })
    }
}
