//! Named layer indices
//!
//! Window managers hand out a handful of well-known bands and leave gaps
//! between them so that callers can slot extra bands in between (for example
//! "just above normal windows" at 7).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A layer index, with names for the standard bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerLevel(usize);

impl LayerLevel {
    pub const MENU: LayerLevel = LayerLevel(0);
    pub const ABOVE_DOCK: LayerLevel = LayerLevel(2);
    pub const DOCK: LayerLevel = LayerLevel(4);
    pub const TOP: LayerLevel = LayerLevel(6);
    pub const NORMAL: LayerLevel = LayerLevel(8);
    pub const BOTTOM: LayerLevel = LayerLevel(10);
    pub const DESKTOP: LayerLevel = LayerLevel(12);

    /// Number of layers needed to hold every named band.
    pub const COUNT: usize = 13;

    const NAMED: [(LayerLevel, &'static str); 7] = [
        (Self::MENU, "Menu"),
        (Self::ABOVE_DOCK, "AboveDock"),
        (Self::DOCK, "Dock"),
        (Self::TOP, "Top"),
        (Self::NORMAL, "Normal"),
        (Self::BOTTOM, "Bottom"),
        (Self::DESKTOP, "Desktop"),
    ];

    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    pub const fn index(self) -> usize {
        self.0
    }

    /// The band's name, if it is one of the standard ones.
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(level, _)| *level == self)
            .map(|(_, name)| *name)
    }
}

impl Default for LayerLevel {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl From<usize> for LayerLevel {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

impl From<LayerLevel> for usize {
    fn from(level: LayerLevel) -> Self {
        level.0
    }
}

impl fmt::Display for LayerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Error returned when a string names no layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown layer: {0:?}")]
pub struct ParseLayerError(String);

impl FromStr for LayerLevel {
    type Err = ParseLayerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(index) = trimmed.parse::<usize>() {
            return Ok(Self(index));
        }
        // "above_dock" and "above-dock" name the same band as "AboveDock"
        let squashed: String = trimmed.chars().filter(|c| !matches!(c, '_' | '-')).collect();
        Self::NAMED
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(&squashed))
            .map(|(level, _)| *level)
            .ok_or_else(|| ParseLayerError(s.to_string()))
    }
}

impl Serialize for LayerLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.name() {
            Some(name) => serializer.serialize_str(&name.to_ascii_lowercase()),
            None => serializer.serialize_u64(self.0 as u64),
        }
    }
}

impl<'de> Deserialize<'de> for LayerLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Index(usize),
            Name(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Index(index) => Ok(Self(index)),
            Raw::Name(name) => name.parse().map_err(serde::de::Error::custom),
        }
    }
}
