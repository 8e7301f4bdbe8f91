//! Render priority tiers

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest valid priority
pub const PRIORITY_MIN: i16 = -250;
/// Highest valid priority
pub const PRIORITY_MAX: i16 = 250;

/// Draw tier. Lower values draw first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i16", into = "i16")]
pub struct RenderPriority(i16);

impl RenderPriority {
    /// Skyboxes and similar, behind everything
    pub const ABSOLUTE_BACKGROUND: Self = Self(PRIORITY_MIN);
    /// Background scenery
    pub const BACKGROUND: Self = Self(-100);
    /// Distant objects
    pub const DISTANT: Self = Self(-50);
    /// Default tier
    pub const MAIN: Self = Self(0);
    /// Close objects
    pub const NEAR: Self = Self(50);
    /// Overlays drawn over the scene
    pub const FOREGROUND: Self = Self(100);
    /// HUD, always on top
    pub const ABSOLUTE_FOREGROUND: Self = Self(PRIORITY_MAX);

    /// Priority from a raw value
    ///
    /// # Panics
    ///
    /// If `value` is outside `[PRIORITY_MIN, PRIORITY_MAX]`. Priorities come
    /// from authored content, so an out-of-range value is a content bug.
    pub fn new(value: i16) -> Self {
        assert!(
            (PRIORITY_MIN..=PRIORITY_MAX).contains(&value),
            "render priority {value} outside [{PRIORITY_MIN}, {PRIORITY_MAX}]"
        );
        Self(value)
    }

    /// Checked constructor
    pub fn try_new(value: i16) -> Option<Self> {
        (PRIORITY_MIN..=PRIORITY_MAX)
            .contains(&value)
            .then_some(Self(value))
    }

    /// Raw value
    pub const fn value(self) -> i16 {
        self.0
    }
}

impl Default for RenderPriority {
    fn default() -> Self {
        Self::MAIN
    }
}

impl fmt::Display for RenderPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<i16> for RenderPriority {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Self::try_new(value)
            .ok_or_else(|| format!("render priority {value} outside [{PRIORITY_MIN}, {PRIORITY_MAX}]"))
    }
}

impl From<RenderPriority> for i16 {
    fn from(priority: RenderPriority) -> Self {
        priority.0
    }
}
