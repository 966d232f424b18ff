//! Blue/green variant tags and the `<base>--<variant>` naming convention.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One of the two deployment slots a service alternates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    Blue,
    Green,
}

impl Variant {
    /// The slot that is not `self`.
    pub fn other(self) -> Self {
        match self {
            Variant::Blue => Variant::Green,
            Variant::Green => Variant::Blue,
        }
    }

    /// Tag value used in the `version` label.
    pub fn as_str(self) -> &'static str {
        match self {
            Variant::Blue => "blue",
            Variant::Green => "green",
        }
    }

    /// Name suffix used for replica groups of this variant.
    pub fn suffix(self) -> &'static str {
        match self {
            Variant::Blue => "--blue",
            Variant::Green => "--green",
        }
    }

    /// Parse an exact `version` label value.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "blue" => Some(Variant::Blue),
            "green" => Some(Variant::Green),
            _ => None,
        }
    }

    /// Classify a replica group by its name suffix.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.ends_with(Variant::Blue.suffix()) {
            Some(Variant::Blue)
        } else if name.ends_with(Variant::Green.suffix()) {
            Some(Variant::Green)
        } else {
            None
        }
    }

    /// Strip a trailing `--blue` / `--green` suffix, if any.
    pub fn base_name(name: &str) -> &str {
        name.strip_suffix(Variant::Blue.suffix())
            .or_else(|| name.strip_suffix(Variant::Green.suffix()))
            .unwrap_or(name)
    }

    /// Name of the replica group for the other slot, e.g.
    /// `orders--blue` → `orders--green`.
    pub fn counterpart_name(self, name: &str) -> String {
        format!("{}{}", Self::base_name(name), self.other().suffix())
    }

    /// The tag a service selector moves to when the active replica group
    /// carries `prior_tag`.
    ///
    /// Unrecognised or missing tags fall back to blue.
    pub fn switch_target(prior_tag: Option<&str>) -> Self {
        match prior_tag.and_then(Self::from_tag) {
            Some(prior) => prior.other(),
            None => Variant::Blue,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_tag(s).ok_or_else(|| format!("unknown variant: {s}"))
    }
}
