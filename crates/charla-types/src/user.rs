//! User account types.
//!
//! A user owns conversations and carries the per-period usage counter that
//! the quota gate reads. The counter is incremented by this service and
//! reset by an external scheduled job -- never reset here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Subscription tier of a user.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (plan IN ('basic', 'premium'))`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Basic,
    Premium,
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlanTier::Basic => write!(f, "basic"),
            PlanTier::Premium => write!(f, "premium"),
        }
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(PlanTier::Basic),
            "premium" => Ok(PlanTier::Premium),
            other => Err(format!("invalid plan tier: '{other}'")),
        }
    }
}

impl Default for PlanTier {
    fn default() -> Self {
        PlanTier::Basic
    }
}

/// A user account.
///
/// `message_count` counts exchanges started in the current quota period.
/// It only ever grows here; the external reset job zeroes it periodically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub plan: PlanTier,
    pub message_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_tier_roundtrip() {
        for plan in [PlanTier::Basic, PlanTier::Premium] {
            let s = plan.to_string();
            let parsed: PlanTier = s.parse().unwrap();
            assert_eq!(plan, parsed);
        }
    }

    #[test]
    fn test_plan_tier_serde() {
        let json = serde_json::to_string(&PlanTier::Premium).unwrap();
        assert_eq!(json, "\"premium\"");
        let parsed: PlanTier = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, PlanTier::Premium);
    }

    #[test]
    fn test_plan_tier_default_is_basic() {
        assert_eq!(PlanTier::default(), PlanTier::Basic);
    }

    #[test]
    fn test_plan_tier_invalid() {
        assert!("gold".parse::<PlanTier>().is_err());
    }

    #[test]
    fn test_user_serialize() {
        let user = User {
            id: Uuid::now_v7(),
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            plan: PlanTier::Basic,
            message_count: 3,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("\"plan\":\"basic\""));
        assert!(json.contains("\"message_count\":3"));
    }
}
