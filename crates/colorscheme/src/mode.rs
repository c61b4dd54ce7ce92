//! The user's preference and the schemes it resolves to.
//!
//! A [`Mode`] is what the user asked for; a [`Scheme`] is what actually gets
//! displayed. The two only differ when the user chose [`Mode::System`], in
//! which case the scheme comes from the operating system at query time.
//!
//! ## Persisted Form
//!
//! Modes are stored as the strings `"light"`, `"dark"` and `"light dark"`.
//! The last one doubles as the CSS `color-scheme` keyword that lets the
//! platform pick, so stored preferences can be applied to a stylesheet as-is:
//!
//! ```rust
//! use colorscheme::Mode;
//!
//! assert_eq!(Mode::System.as_str(), "light dark");
//! assert_eq!("dark".parse::<Mode>().unwrap(), Mode::Dark);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::SchemeError;

/// A concrete, displayable color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    /// Light background, dark text.
    Light,
    /// Dark background, light text.
    Dark,
}

impl Scheme {
    pub fn is_dark(self) -> bool {
        matches!(self, Scheme::Dark)
    }

    /// Builds a scheme from the `is_dark` flag OS notifications carry.
    pub fn from_dark(is_dark: bool) -> Self {
        if is_dark {
            Scheme::Dark
        } else {
            Scheme::Light
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Scheme::Light => Scheme::Dark,
            Scheme::Dark => Scheme::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Light => "light",
            Scheme::Dark => "dark",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = SchemeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Scheme::Light),
            "dark" => Ok(Scheme::Dark),
            other => Err(SchemeError::invalid_mode(other)),
        }
    }
}

/// The user's declared preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mode {
    /// Always light, whatever the OS reports.
    Light,
    /// Always dark, whatever the OS reports.
    Dark,
    /// Follow the operating system.
    #[default]
    System,
}

impl Mode {
    /// Persisted string for the follow-system mode.
    pub const SYSTEM_SENTINEL: &'static str = "light dark";

    /// All modes, in menu order.
    pub const ALL: [Mode; 3] = [Mode::Light, Mode::Dark, Mode::System];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Light => "light",
            Mode::Dark => "dark",
            Mode::System => Self::SYSTEM_SENTINEL,
        }
    }

    /// Human-facing name: `light`, `dark` or `system`.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Light => "light",
            Mode::Dark => "dark",
            Mode::System => "system",
        }
    }

    /// Value for a CSS `color-scheme` declaration.
    ///
    /// Identical to the persisted string: `light dark` tells the platform to
    /// choose.
    pub fn css_keyword(self) -> &'static str {
        self.as_str()
    }

    /// Returns true when the mode pins a scheme regardless of the OS.
    pub fn is_pinned(self) -> bool {
        !matches!(self, Mode::System)
    }

    /// Resolves the displayed scheme given what the system currently reports.
    pub fn resolve(self, system: Scheme) -> Scheme {
        match self {
            Mode::Light => Scheme::Light,
            Mode::Dark => Scheme::Dark,
            Mode::System => system,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = SchemeError;

    /// Parses the persisted strings. `system` is accepted as an alias for
    /// `light dark` since that is what users type.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "light" => Ok(Mode::Light),
            "dark" => Ok(Mode::Dark),
            Self::SYSTEM_SENTINEL | "system" => Ok(Mode::System),
            other => Err(SchemeError::invalid_mode(other)),
        }
    }
}

impl From<Scheme> for Mode {
    fn from(scheme: Scheme) -> Self {
        match scheme {
            Scheme::Light => Mode::Light,
            Scheme::Dark => Mode::Dark,
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = SchemeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.as_str().to_string()
    }
}

/// Snapshot delivered to change subscribers.
///
/// Serializes with the field names of the notification contract:
/// `{"user": "light dark", "current": "dark"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// What the user chose.
    #[serde(rename = "user")]
    pub mode: Mode,
    /// What is displayed.
    #[serde(rename = "current")]
    pub effective: Scheme,
}

impl Status {
    pub fn new(mode: Mode, system: Scheme) -> Self {
        Self {
            mode,
            effective: mode.resolve(system),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_persisted_strings() {
        assert_eq!(Mode::Light.as_str(), "light");
        assert_eq!(Mode::Dark.as_str(), "dark");
        assert_eq!(Mode::System.as_str(), "light dark");
    }

    #[test]
    fn test_mode_parse_accepts_system_alias() {
        assert_eq!("light dark".parse::<Mode>().unwrap(), Mode::System);
        assert_eq!("system".parse::<Mode>().unwrap(), Mode::System);
        assert_eq!(" dark ".parse::<Mode>().unwrap(), Mode::Dark);
    }

    #[test]
    fn test_mode_parse_rejects_unknown() {
        let err = "blue".parse::<Mode>().unwrap_err();
        assert!(matches!(err, SchemeError::InvalidMode(ref v) if v == "blue"));
        assert!("".parse::<Mode>().is_err());
        assert!("Light".parse::<Mode>().is_err());
    }

    #[test]
    fn test_mode_label_round_trips_through_parse() {
        for mode in Mode::ALL {
            assert_eq!(mode.label().parse::<Mode>().unwrap(), mode);
            assert_eq!(mode.as_str().parse::<Mode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_mode_default_is_system() {
        assert_eq!(Mode::default(), Mode::System);
    }

    #[test]
    fn test_resolve_pinned_ignores_system() {
        assert_eq!(Mode::Light.resolve(Scheme::Dark), Scheme::Light);
        assert_eq!(Mode::Dark.resolve(Scheme::Light), Scheme::Dark);
    }

    #[test]
    fn test_resolve_system_follows() {
        assert_eq!(Mode::System.resolve(Scheme::Dark), Scheme::Dark);
        assert_eq!(Mode::System.resolve(Scheme::Light), Scheme::Light);
    }

    #[test]
    fn test_scheme_helpers() {
        assert!(Scheme::Dark.is_dark());
        assert!(!Scheme::Light.is_dark());
        assert_eq!(Scheme::from_dark(true), Scheme::Dark);
        assert_eq!(Scheme::Light.toggled(), Scheme::Dark);
        assert_eq!(Mode::from(Scheme::Dark), Mode::Dark);
    }

    #[test]
    fn test_status_serializes_with_contract_names() {
        let status = Status::new(Mode::System, Scheme::Dark);
        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"user":"light dark","current":"dark"}"#);

        let back: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(back, status);
    }

    #[test]
    fn test_status_rejects_unknown_mode() {
        let result: Result<Status, _> =
            serde_json::from_str(r#"{"user":"sepia","current":"light"}"#);
        assert!(result.is_err());
    }
}
