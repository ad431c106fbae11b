//! Trigger events: the pushed tag and the pattern it must match.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriggerError};

/// Default release pattern: three dot-separated wildcard components
pub const DEFAULT_PATTERN: &str = "*.*.*";

/// One component of a release pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Component {
    Any,
    Exact(u64),
}

/// Tag pattern made of exactly three dot-separated components, each a
/// non-negative integer or `*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePattern {
    raw: String,
    components: [Component; 3],
}

impl ReleasePattern {
    /// Parse a pattern such as `*.*.*` or `2.*.*`
    pub fn parse(pattern: &str) -> Result<Self> {
        let invalid = |reason: &str| TriggerError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = pattern.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid("expected three dot-separated components").into());
        }

        let mut components = [Component::Any; 3];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = match *part {
                "*" => Component::Any,
                digits if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
                    let value = digits
                        .parse::<u64>()
                        .map_err(|e| invalid(&e.to_string()))?;
                    Component::Exact(value)
                }
                other => {
                    return Err(invalid(&format!(
                        "component '{}' is neither a number nor '*'",
                        other
                    ))
                    .into());
                }
            };
        }

        Ok(Self {
            raw: pattern.to_string(),
            components,
        })
    }

    /// Whether a tag triggers a release under this pattern
    pub fn matches(&self, tag: &str) -> bool {
        let parts: Vec<&str> = tag.split('.').collect();
        if parts.len() != 3 {
            return false;
        }

        // A tag is a single ref segment; components never span a separator
        self.components.iter().zip(&parts).all(|(component, part)| {
            if part.is_empty() || part.contains(['/', '\\']) {
                return false;
            }
            match component {
                Component::Any => true,
                Component::Exact(want) => part.parse::<u64>().is_ok_and(|got| got == *want),
            }
        })
    }

    /// Pattern text as configured
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl Default for ReleasePattern {
    fn default() -> Self {
        Self {
            raw: DEFAULT_PATTERN.to_string(),
            components: [Component::Any; 3],
        }
    }
}

impl FromStr for ReleasePattern {
    type Err = crate::error::ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ReleasePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Immutable identity of one release run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerEvent {
    tag: String,
}

impl TriggerEvent {
    /// Accept a tag only if it matches the release pattern
    pub fn from_tag(tag: &str, pattern: &ReleasePattern) -> Result<Self> {
        if !pattern.matches(tag) {
            return Err(TriggerError::NoMatch {
                tag: tag.to_string(),
                pattern: pattern.to_string(),
            }
            .into());
        }
        Ok(Self {
            tag: tag.to_string(),
        })
    }

    /// Resolve the tag from the argument, falling back to `GITHUB_REF_NAME`
    pub fn resolve_tag(arg: Option<&str>) -> Result<String> {
        match arg {
            Some(tag) => Ok(tag.to_string()),
            None => std::env::var("GITHUB_REF_NAME")
                .ok()
                .filter(|t| !t.is_empty())
                .ok_or_else(|| TriggerError::Missing.into()),
        }
    }

    /// The tag string
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Semantic version of the tag, if it is one (a leading `v` is allowed)
    pub fn version(&self) -> Option<semver::Version> {
        let raw = self.tag.strip_prefix('v').unwrap_or(&self.tag);
        semver::Version::parse(raw).ok()
    }
}

impl fmt::Display for TriggerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_components_trigger() {
        let pattern = ReleasePattern::default();
        assert!(pattern.matches("2.3.1"));
        assert!(TriggerEvent::from_tag("2.3.1", &pattern).is_ok());
    }

    #[test]
    fn two_components_do_not_trigger() {
        let pattern = ReleasePattern::default();
        assert!(!pattern.matches("2.3"));
        assert!(!pattern.matches("2.3.1.4"));
        assert!(!pattern.matches("2..1"));
        assert!(!pattern.matches("release/1.2.3"));
        assert!(!pattern.matches("1.2.3-rc/x"));
        assert!(!pattern.matches("1.2.3\\x"));
        assert!(matches!(
            TriggerEvent::from_tag("2.3", &pattern),
            Err(crate::ReleaseError::Trigger(TriggerError::NoMatch { .. }))
        ));
    }

    #[test]
    fn numeric_components_pin_the_tag() {
        let pattern = ReleasePattern::parse("2.*.*").unwrap();
        assert!(pattern.matches("2.0.9"));
        assert!(!pattern.matches("3.0.9"));
        assert!(!pattern.matches("x.0.9"));
    }

    #[test]
    fn malformed_patterns_are_rejected() {
        assert!(ReleasePattern::parse("*.*").is_err());
        assert!(ReleasePattern::parse("v*.*.*").is_err());
        assert!(ReleasePattern::parse("1..*").is_err());
    }

    #[test]
    fn version_is_parsed_when_semver() {
        let pattern = ReleasePattern::default();
        let event = TriggerEvent::from_tag("v1.4.0", &pattern).unwrap();
        assert_eq!(event.version(), Some(semver::Version::new(1, 4, 0)));

        let event = TriggerEvent::from_tag("a.b.c", &pattern).unwrap();
        assert_eq!(event.version(), None);
    }
}
