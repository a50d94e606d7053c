use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// Role played by a driver process.
///
/// - `Controller`: cluster-wide instance; provisions volumes and runs tag reconciliation.
/// - `Node`: per-node agent; makes attached volumes usable on its node.
///
/// Exactly one role is chosen per process, once, before any service starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentRole {
    Controller,
    Node,
}

impl ComponentRole {
    /// Canonical name, as accepted by `--component_type`.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ComponentRole::Controller => "controller",
            ComponentRole::Node => "node",
        }
    }

    /// Parse an optional flag value: blank means "not supplied".
    pub fn from_flag(s: &str) -> ModelResult<Option<Self>> {
        if s.trim().is_empty() {
            return Ok(None);
        }
        s.parse().map(Some)
    }

    #[inline]
    pub const fn is_controller(&self) -> bool {
        matches!(self, ComponentRole::Controller)
    }
}

impl FromStr for ComponentRole {
    type Err = ModelError;
    fn from_str(s: &str) -> ModelResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "controller" => Ok(ComponentRole::Controller),
            "node" => Ok(ComponentRole::Node),
            _ => Err(ModelError::UnknownRole(s.to_string())),
        }
    }
}

impl fmt::Display for ComponentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitive() {
        assert_eq!(
            "controller".parse::<ComponentRole>().unwrap(),
            ComponentRole::Controller
        );
        assert_eq!(" Node ".parse::<ComponentRole>().unwrap(), ComponentRole::Node);
        assert_eq!(
            "CONTROLLER".parse::<ComponentRole>().unwrap(),
            ComponentRole::Controller
        );
    }

    #[test]
    fn rejects_unknown_roles() {
        for bad in ["", "master", "agent", "nodes"] {
            assert!(
                bad.parse::<ComponentRole>().is_err(),
                "expected error for role {bad:?}"
            );
        }
    }

    #[test]
    fn blank_flag_means_unset() {
        assert_eq!(ComponentRole::from_flag("").unwrap(), None);
        assert_eq!(ComponentRole::from_flag("   ").unwrap(), None);
        assert_eq!(
            ComponentRole::from_flag("node").unwrap(),
            Some(ComponentRole::Node)
        );
        assert!(matches!(
            ComponentRole::from_flag("both"),
            Err(ModelError::UnknownRole(_))
        ));
    }

    #[test]
    fn display_matches_flag_values() {
        assert_eq!(ComponentRole::Controller.to_string(), "controller");
        assert_eq!(ComponentRole::Node.to_string(), "node");
    }
}
