//! Navigator settings.
//!
//! # Environment variables
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `FTUI_NAV_LAYOUT` | `compact` or `expanded` |
//! | `FTUI_NAV_COMPACT_MAX_WIDTH` | widest column count still treated as compact |
//! | `FTUI_NAV_GESTURE_SAMPLES` | progress samples kept per predictive back gesture |
//!
//! Unparseable values are ignored with a `tracing::warn!` and the default is kept.

use std::env;
use std::str::FromStr;

/// Window-size class that decides how panes collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LayoutMode {
    /// One pane visible at a time.
    #[default]
    Compact,
    /// Several panes side by side.
    Expanded,
}

impl LayoutMode {
    /// Classify a width against the compact breakpoint.
    #[must_use]
    pub const fn from_width(width: u16, compact_max_width: u16) -> Self {
        if width <= compact_max_width {
            Self::Compact
        } else {
            Self::Expanded
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compact => "compact",
            Self::Expanded => "expanded",
        }
    }
}

impl FromStr for LayoutMode {
    type Err = ();

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.eq_ignore_ascii_case("compact") {
            Ok(Self::Compact)
        } else if raw.eq_ignore_ascii_case("expanded") {
            Ok(Self::Expanded)
        } else {
            Err(())
        }
    }
}

/// Configuration for a [`Navigator`](crate::Navigator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigatorConfig {
    /// Layout used by back resolution until [`set_layout`](crate::Navigator::set_layout).
    pub layout: LayoutMode,

    /// Widths up to and including this are compact.
    pub compact_max_width: u16,

    /// Upper bound on buffered predictive back progress samples.
    pub gesture_sample_capacity: usize,

    /// Key of the root stack created for a fresh navigator.
    pub root_key: String,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            layout: LayoutMode::Compact,
            compact_max_width: 600,
            gesture_sample_capacity: 64,
            root_key: "root".to_owned(),
        }
    }
}

impl NavigatorConfig {
    /// Defaults overridden by `FTUI_NAV_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(layout) = parsed(&lookup, "FTUI_NAV_LAYOUT") {
            config.layout = layout;
        }
        if let Some(width) = parsed(&lookup, "FTUI_NAV_COMPACT_MAX_WIDTH") {
            config.compact_max_width = width;
        }
        if let Some(samples) = parsed::<usize>(&lookup, "FTUI_NAV_GESTURE_SAMPLES") {
            config.gesture_sample_capacity = samples.max(1);
        }
        config
    }

    #[must_use]
    pub fn with_layout(mut self, layout: LayoutMode) -> Self {
        self.layout = layout;
        self
    }

    #[must_use]
    pub fn with_root_key(mut self, root_key: impl Into<String>) -> Self {
        self.root_key = root_key.into();
        self
    }

    #[must_use]
    pub fn layout_for_width(&self, width: u16) -> LayoutMode {
        LayoutMode::from_width(width, self.compact_max_width)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    let value = raw.trim().parse().ok();
    if value.is_none() {
        tracing::warn!(variable = name, value = %raw, "ignoring unparseable navigator setting");
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = NavigatorConfig::default();
        assert_eq!(config.layout, LayoutMode::Compact);
        assert_eq!(config.compact_max_width, 600);
        assert_eq!(config.gesture_sample_capacity, 64);
        assert_eq!(config.root_key, "root");
    }

    #[test]
    fn lookup_overrides() {
        let config = NavigatorConfig::from_lookup(|name| match name {
            "FTUI_NAV_LAYOUT" => Some("Expanded".to_owned()),
            "FTUI_NAV_COMPACT_MAX_WIDTH" => Some(" 840 ".to_owned()),
            "FTUI_NAV_GESTURE_SAMPLES" => Some("0".to_owned()),
            _ => None,
        });
        assert_eq!(config.layout, LayoutMode::Expanded);
        assert_eq!(config.compact_max_width, 840);
        assert_eq!(config.gesture_sample_capacity, 1);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let config = NavigatorConfig::from_lookup(|name| match name {
            "FTUI_NAV_LAYOUT" => Some("wide".to_owned()),
            "FTUI_NAV_COMPACT_MAX_WIDTH" => Some("-3".to_owned()),
            _ => None,
        });
        assert_eq!(config, NavigatorConfig::default());
    }

    #[test]
    fn width_breakpoint_is_inclusive() {
        let config = NavigatorConfig::default();
        assert_eq!(config.layout_for_width(600), LayoutMode::Compact);
        assert_eq!(config.layout_for_width(601), LayoutMode::Expanded);
    }
}
