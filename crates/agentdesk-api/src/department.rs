//! Agent classification by department

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::LazyLock};

/// Closed set of agent kinds used for grouping and avatar selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    HumanResources,
    InformationTechnology,
    Finance,
    Sales,
    Marketing,
    Legal,
    Support,
    Engineering,
    General,
}

/// Department keyword patterns, checked in order. First match wins, so
/// "IT Support" classifies as IT.
static DEPARTMENT_PATTERNS: LazyLock<Vec<(AgentKind, Regex)>> = LazyLock::new(|| {
    [
        (
            AgentKind::HumanResources,
            r"(?i)\bhr\b|human.?resource|\bpeople\b|recruit|payroll",
        ),
        (
            AgentKind::InformationTechnology,
            r"(?i)\bit\b|information.?tech|helpdesk|help.?desk|infrastructure",
        ),
        (AgentKind::Finance, r"(?i)financ|accounting|budget|treasury"),
        (AgentKind::Sales, r"(?i)\bsales?\b|business.?dev"),
        (AgentKind::Marketing, r"(?i)marketing|\bbrand"),
        (AgentKind::Legal, r"(?i)legal|complian|contract"),
        (AgentKind::Support, r"(?i)support|customer.?service|customer.?success"),
        (AgentKind::Engineering, r"(?i)engineer|develop|devops|\bqa\b"),
    ]
    .into_iter()
    .filter_map(|(kind, p)| Regex::new(p).ok().map(|re| (kind, re)))
    .collect()
});

impl AgentKind {
    /// Classify a free-form department name; unknown departments are `General`.
    pub fn classify(department: &str) -> Self {
        DEPARTMENT_PATTERNS
            .iter()
            .find(|(_, re)| re.is_match(department))
            .map(|(kind, _)| *kind)
            .unwrap_or(AgentKind::General)
    }

    /// Human-readable label
    pub fn label(&self) -> &'static str {
        match self {
            AgentKind::HumanResources => "Human Resources",
            AgentKind::InformationTechnology => "IT",
            AgentKind::Finance => "Finance",
            AgentKind::Sales => "Sales",
            AgentKind::Marketing => "Marketing",
            AgentKind::Legal => "Legal",
            AgentKind::Support => "Support",
            AgentKind::Engineering => "Engineering",
            AgentKind::General => "General",
        }
    }

    /// Stable key a presentation layer maps to an avatar asset
    pub fn avatar_key(&self) -> &'static str {
        match self {
            AgentKind::HumanResources => "hr",
            AgentKind::InformationTechnology => "it",
            AgentKind::Finance => "finance",
            AgentKind::Sales => "sales",
            AgentKind::Marketing => "marketing",
            AgentKind::Legal => "legal",
            AgentKind::Support => "support",
            AgentKind::Engineering => "engineering",
            AgentKind::General => "general",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_common_departments() {
        assert_eq!(AgentKind::classify("HR"), AgentKind::HumanResources);
        assert_eq!(AgentKind::classify("Human Resources"), AgentKind::HumanResources);
        assert_eq!(AgentKind::classify("IT"), AgentKind::InformationTechnology);
        assert_eq!(
            AgentKind::classify("Information Technology"),
            AgentKind::InformationTechnology
        );
        assert_eq!(AgentKind::classify("Finance"), AgentKind::Finance);
        assert_eq!(AgentKind::classify("Corporate Accounting"), AgentKind::Finance);
        assert_eq!(AgentKind::classify("Legal & Compliance"), AgentKind::Legal);
    }

    #[test]
    fn test_classify_first_match_wins() {
        assert_eq!(AgentKind::classify("IT Support"), AgentKind::InformationTechnology);
    }

    #[test]
    fn test_classify_requires_word_boundaries_for_short_codes() {
        // "it" and "hr" inside other words must not match
        assert_eq!(AgentKind::classify("Editorial"), AgentKind::General);
        assert_eq!(AgentKind::classify("Three Rivers"), AgentKind::General);
    }

    #[test]
    fn test_classify_defaults_to_general() {
        assert_eq!(AgentKind::classify(""), AgentKind::General);
        assert_eq!(AgentKind::classify("Facilities"), AgentKind::General);
    }

    #[test]
    fn test_avatar_keys_are_distinct() {
        let kinds = [
            AgentKind::HumanResources,
            AgentKind::InformationTechnology,
            AgentKind::Finance,
            AgentKind::Sales,
            AgentKind::Marketing,
            AgentKind::Legal,
            AgentKind::Support,
            AgentKind::Engineering,
            AgentKind::General,
        ];
        let keys: std::collections::HashSet<_> = kinds.iter().map(|k| k.avatar_key()).collect();
        assert_eq!(keys.len(), kinds.len());
    }
}
