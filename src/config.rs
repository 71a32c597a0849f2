use std::str::FromStr;

use chrono_tz::Tz;

use crate::limits::*;

/// How a window's shift label is decided when members disagree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftPolicy {
    /// Take the first member's label. Relies on upstream filtering so that a
    /// continuous window never straddles two shifts.
    #[default]
    Inherit,
    /// Discard windows whose members carry different shift labels.
    Strict,
}

impl FromStr for ShiftPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inherit" => Ok(ShiftPolicy::Inherit),
            "strict" => Ok(ShiftPolicy::Strict),
            other => Err(format!("unknown shift policy: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Used when a request carries no (or a zero) granularity.
    pub default_granularity_minutes: u32,
    /// Max |prev.end - curr.start| for two slots to count as consecutive.
    pub continuity_tolerance_minutes: u32,
    /// Zone used to read wall-clock time out of timestamps. `None` keeps
    /// each timestamp's own offset.
    pub timezone: Option<Tz>,
    pub shift_policy: ShiftPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_granularity_minutes: DEFAULT_SLOT_GRANULARITY_MINUTES,
            continuity_tolerance_minutes: CONTINUITY_TOLERANCE_MINUTES,
            timezone: None,
            shift_policy: ShiftPolicy::Inherit,
        }
    }
}

impl EngineConfig {
    /// Read `SLOTGROUP_*` environment variables over the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an arbitrary key lookup. Unparseable values
    /// keep the default and log a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("SLOTGROUP_GRANULARITY_MINUTES") {
            match raw.trim().parse::<u32>() {
                Ok(g) if g > 0 => config.default_granularity_minutes = g,
                _ => tracing::warn!("ignoring SLOTGROUP_GRANULARITY_MINUTES={raw:?}"),
            }
        }
        if let Some(raw) = lookup("SLOTGROUP_CONTINUITY_TOLERANCE_MINUTES") {
            match raw.trim().parse::<u32>() {
                Ok(t) => config.continuity_tolerance_minutes = t,
                Err(e) => {
                    tracing::warn!("ignoring SLOTGROUP_CONTINUITY_TOLERANCE_MINUTES={raw:?}: {e}")
                }
            }
        }
        if let Some(raw) = lookup("SLOTGROUP_TIMEZONE") {
            match raw.trim().parse::<Tz>() {
                Ok(tz) => config.timezone = Some(tz),
                Err(e) => tracing::warn!("ignoring SLOTGROUP_TIMEZONE={raw:?}: {e}"),
            }
        }
        if let Some(raw) = lookup("SLOTGROUP_SHIFT_POLICY") {
            match raw.parse::<ShiftPolicy>() {
                Ok(p) => config.shift_policy = p,
                Err(e) => tracing::warn!("ignoring SLOTGROUP_SHIFT_POLICY: {e}"),
            }
        }

        config
    }
}
