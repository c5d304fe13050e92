//! Playback state reported by agents
//!
//! Reports arrive from page scripts that may be half-loaded, so every field is
//! optional on the wire and a missing or `null` value falls back to its default.
//! Consumers treat the contents as best effort and omit what they cannot use.

use bitflags::bitflags;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

bitflags! {
    /// Transport capabilities advertised by an agent
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PlaybackCapabilities: u8 {
        /// Can skip to the next track
        const NEXT = 0b0001;
        /// Can go back to the previous track
        const PREVIOUS = 0b0010;
        /// Can toggle play/pause
        const PLAY_PAUSE = 0b0100;
        /// Can seek within the track
        const SEEK = 0b1000;
    }
}

// Serialized as the four boolean keys agents send
impl Serialize for PlaybackCapabilities {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("PlaybackCapabilities", 4)?;
        state.serialize_field("canPlayNext", &self.contains(Self::NEXT))?;
        state.serialize_field("canPlayPrev", &self.contains(Self::PREVIOUS))?;
        state.serialize_field("canPlayPause", &self.contains(Self::PLAY_PAUSE))?;
        state.serialize_field("canSeek", &self.contains(Self::SEEK))?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for PlaybackCapabilities {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Helper {
            #[serde(default)]
            can_play_next: Option<bool>,
            #[serde(default)]
            can_play_prev: Option<bool>,
            #[serde(default)]
            can_play_pause: Option<bool>,
            #[serde(default)]
            can_seek: Option<bool>,
        }

        let h = Helper::deserialize(deserializer)?;
        let mut caps = Self::empty();
        if h.can_play_next.unwrap_or(false) {
            caps |= Self::NEXT;
        }
        if h.can_play_prev.unwrap_or(false) {
            caps |= Self::PREVIOUS;
        }
        if h.can_play_pause.unwrap_or(false) {
            caps |= Self::PLAY_PAUSE;
        }
        if h.can_seek.unwrap_or(false) {
            caps |= Self::SEEK;
        }
        Ok(caps)
    }
}

/// Last reported playback state of one agent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackState {
    /// Whether the agent is currently producing audio
    #[serde(default, deserialize_with = "null_as_false")]
    pub is_playing: bool,
    /// Track title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub song: Option<String>,
    /// Track artist
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    /// Album name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
    /// Elapsed time as a clock string (`m:ss`, `h:mm:ss`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<String>,
    /// Track length as a clock string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<String>,
    /// Cover art url
    #[serde(default, rename = "art", skip_serializing_if = "Option::is_none")]
    pub art_url: Option<String>,
    /// Volume in `0.0..=1.0`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    /// Human readable name of the site or player
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    /// Transport capabilities
    #[serde(flatten)]
    pub capabilities: PlaybackCapabilities,
}

impl PlaybackState {
    /// Builder-style constructor for a playing/paused state with a title
    pub fn track(song: impl Into<String>, is_playing: bool) -> Self {
        Self {
            is_playing,
            song: Some(song.into()),
            ..Self::default()
        }
    }

    /// Trimmed, non-empty song title
    #[must_use]
    pub fn song_title(&self) -> Option<&str> {
        trimmed(self.song.as_deref())
    }

    /// Elapsed seconds, if the clock string parses
    #[must_use]
    pub fn position_seconds(&self) -> Option<u64> {
        parse_clock(self.current_time.as_deref().unwrap_or("0"))
    }

    /// Track length in seconds, if the clock string parses
    #[must_use]
    pub fn length_seconds(&self) -> Option<u64> {
        parse_clock(self.total_time.as_deref().unwrap_or("0"))
    }
}

fn null_as_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Trim a text field, mapping blank values to `None`
pub(crate) fn trimmed(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Convert a clock string (`s`, `m:s` or `h:m:s`) into whole seconds
///
/// Returns `None` for blank input or any non-numeric segment.
///
/// # Examples
/// ```
/// use kodegen_media_keys::types::parse_clock;
///
/// assert_eq!(parse_clock("1:02:03"), Some(3723));
/// assert_eq!(parse_clock("4:05"), Some(245));
/// assert_eq!(parse_clock("live"), None);
/// ```
#[must_use]
pub fn parse_clock(value: &str) -> Option<u64> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    let mut seconds: u64 = 0;
    let mut multiplier: u64 = 1;
    for part in value.rsplit(':') {
        let unit: u64 = part.trim().parse().ok()?;
        seconds = seconds.checked_add(unit.checked_mul(multiplier)?)?;
        multiplier = multiplier.checked_mul(60)?;
    }
    Some(seconds)
}
