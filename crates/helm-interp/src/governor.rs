//! Cumulative motor-runtime governor.
//!
//! Timed commands are charged up front. Untimed commands open a timer that
//! the next `stop` folds into the running total. The total only moves
//! forward; [`MotorGovernor::reset`] is the one way back to zero.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GovernorError {
    #[error("Motor runtime limit reached: {used_ms}ms used of {limit_ms}ms")]
    Exhausted { used_ms: u64, limit_ms: u64 },

    #[error("Motor runtime limit would be exceeded: {used_ms}ms used + {requested_ms}ms requested > {limit_ms}ms")]
    WouldExceed {
        used_ms: u64,
        requested_ms: u64,
        limit_ms: u64,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorGovernor {
    cumulative_ms: u64,
    motor_start_ms: Option<u64>,
}

impl MotorGovernor {
    pub fn cumulative_ms(&self) -> u64 {
        self.cumulative_ms
    }

    pub fn timer_open(&self) -> bool {
        self.motor_start_ms.is_some()
    }

    /// Check an activation against `limit_ms` without changing anything.
    pub fn check(&self, duration_ms: Option<u64>, limit_ms: u64) -> Result<(), GovernorError> {
        if self.cumulative_ms >= limit_ms {
            return Err(GovernorError::Exhausted {
                used_ms: self.cumulative_ms,
                limit_ms,
            });
        }
        if let Some(requested_ms) = duration_ms {
            if self.cumulative_ms.saturating_add(requested_ms) > limit_ms {
                return Err(GovernorError::WouldExceed {
                    used_ms: self.cumulative_ms,
                    requested_ms,
                    limit_ms,
                });
            }
        }
        Ok(())
    }

    /// Record an accepted activation issued at `now_ms`.
    pub fn commit(&mut self, duration_ms: Option<u64>, now_ms: u64) {
        match duration_ms {
            Some(ms) => self.cumulative_ms = self.cumulative_ms.saturating_add(ms),
            None => {
                if self.motor_start_ms.is_none() {
                    self.motor_start_ms = Some(now_ms);
                }
            }
        }
    }

    /// Fold the open timer, if any, into the total. Returns the folded span.
    pub fn finalize(&mut self, now_ms: u64) -> u64 {
        match self.motor_start_ms.take() {
            Some(start) => {
                let span = now_ms.saturating_sub(start);
                self.cumulative_ms = self.cumulative_ms.saturating_add(span);
                span
            }
            None => 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_activation_charged_immediately() {
        let mut gov = MotorGovernor::default();
        gov.check(Some(80), 100).unwrap();
        gov.commit(Some(80), 0);
        assert_eq!(gov.cumulative_ms(), 80);
        assert!(!gov.timer_open());
    }

    #[test]
    fn test_projection_rejects_without_mutation() {
        let mut gov = MotorGovernor::default();
        gov.commit(Some(80), 0);
        let err = gov.check(Some(50), 100).unwrap_err();
        assert!(matches!(err, GovernorError::WouldExceed { used_ms: 80, .. }));
        assert!(err.to_string().contains("runtime limit"));
        assert_eq!(gov.cumulative_ms(), 80);
    }

    #[test]
    fn test_exhausted_budget_rejects_untimed() {
        let mut gov = MotorGovernor::default();
        gov.commit(Some(100), 0);
        assert!(matches!(
            gov.check(None, 100),
            Err(GovernorError::Exhausted { .. })
        ));
    }

    #[test]
    fn test_untimed_timer_opens_once_and_folds_on_stop() {
        let mut gov = MotorGovernor::default();
        gov.commit(None, 1_000);
        gov.commit(None, 1_400);
        assert!(gov.timer_open());
        assert_eq!(gov.finalize(1_500), 500);
        assert_eq!(gov.cumulative_ms(), 500);
        assert!(!gov.timer_open());
        assert_eq!(gov.finalize(2_000), 0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut gov = MotorGovernor::default();
        gov.commit(Some(10), 0);
        gov.commit(None, 5);
        gov.reset();
        assert_eq!(gov, MotorGovernor::default());
    }
}
