//! Channel partitioning for listener bindings.
//!
//! A channel is a named partition used to restrict which listeners receive a
//! dispatched event. A binding declares a [`ChannelSet`]; dispatch names a
//! single channel, or [`ALL`] to reach every binding regardless of its
//! restriction.

use std::collections::BTreeSet;
use std::fmt;

/// The all-channels dispatch expression. Dispatching to `ALL` reaches every
/// binding; a binding with [`ChannelSet::All`] hears every channel.
pub const ALL: &str = "@all";

/// The no-channels expression.
pub const NONE: &str = "!@all";

/// Abstract representation of a binding's channel inclusion rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChannelSet {
    /// Listens on every channel.
    All,
    /// Listens on no channel (only reachable through an [`ALL`] dispatch).
    None,
    /// Listens on an explicit set of channels.
    Include(BTreeSet<String>),
}

impl ChannelSet {
    /// Build an explicit inclusion set.
    pub fn include<I, S>(channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Include(channels.into_iter().map(Into::into).collect())
    }

    /// Build a single-channel inclusion set.
    pub fn single(channel: impl Into<String>) -> Self {
        Self::include([channel.into()])
    }

    /// Parse a channel expression: [`ALL`], [`NONE`], or a comma-separated
    /// channel list.
    pub fn expression(expr: &str) -> Self {
        match expr.trim() {
            ALL => Self::All,
            NONE => Self::None,
            list => Self::include(
                list.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            ),
        }
    }

    /// Whether this set includes `channel`.
    pub fn contains(&self, channel: &str) -> bool {
        match self {
            Self::All => true,
            Self::None => false,
            Self::Include(channels) => channels.contains(channel),
        }
    }

    /// Whether this set includes any of `channels`.
    pub fn contains_any<'a, I: IntoIterator<Item = &'a str>>(&self, channels: I) -> bool {
        channels.into_iter().any(|c| self.contains(c))
    }

    /// The explicit channel set, empty for `All` and `None`.
    pub fn to_set(&self) -> BTreeSet<String> {
        match self {
            Self::Include(channels) => channels.clone(),
            _ => BTreeSet::new(),
        }
    }
}

impl Default for ChannelSet {
    fn default() -> Self {
        Self::All
    }
}

impl fmt::Display for ChannelSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::None => f.write_str(NONE),
            Self::Include(channels) => {
                let mut first = true;
                for channel in channels {
                    if !first {
                        f.write_str(",")?;
                    }
                    f.write_str(channel)?;
                    first = false;
                }
                Ok(())
            }
        }
    }
}
