//! Per-user exchange quota gate.
//!
//! Decides whether a user may start a new exchange. Basic-tier users are
//! admitted only while their period counter is strictly below the ceiling;
//! premium users are always admitted. Admission costs exactly one counter
//! increment (performed by the caller through `UserRepository`), regardless
//! of how many chunks the exchange later produces, and is never reversed
//! when the upstream call fails afterwards.

use charla_types::user::PlanTier;

/// Maximum exchanges a basic-tier user may start per counting period.
pub const BASIC_MESSAGE_LIMIT: u32 = 5;

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Admitted,
    /// The user has exhausted the period's quota.
    Rejected { limit: u32 },
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Admission::Admitted)
    }
}

/// Evaluate whether a user with the given plan and counter may start a new
/// exchange. Pure decision; the counter increment is a separate step taken
/// by the caller on admission.
pub fn evaluate(plan: PlanTier, message_count: u32) -> Admission {
    match plan {
        PlanTier::Premium => Admission::Admitted,
        PlanTier::Basic => {
            if message_count < BASIC_MESSAGE_LIMIT {
                Admission::Admitted
            } else {
                Admission::Rejected {
                    limit: BASIC_MESSAGE_LIMIT,
                }
            }
        }
    }
}
