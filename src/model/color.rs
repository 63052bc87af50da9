// Symbolic colour tags assigned to calendars in the config.
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use strum::{EnumIter, EnumString, IntoStaticStr};

/// Colour tag carried by every event. Unknown tags collapse to `Orange`
/// instead of failing config loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EventColor {
    Aqua,
    Teal,
    Green,
    Red,
    Blue,
    Yellow,
    Purple,
    #[default]
    Orange,
}

impl EventColor {
    /// The tag reserved for the "current time" marker.
    pub const HIGHLIGHT: EventColor = EventColor::Red;

    pub fn from_tag(tag: &str) -> Self {
        tag.trim().parse().unwrap_or_default()
    }

    pub fn as_tag(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for EventColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl Serialize for EventColor {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_tag())
    }
}

impl<'de> Deserialize<'de> for EventColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(EventColor::from_tag(&tag))
    }
}
