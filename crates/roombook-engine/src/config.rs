//! Scheduling rules: operating hours and slot granularity.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationReason};
use crate::model::TimeOfDay;

pub const DEFAULT_OPENING: TimeOfDay = TimeOfDay::hm(7, 0);
pub const DEFAULT_CLOSING: TimeOfDay = TimeOfDay::hm(22, 0);
pub const DEFAULT_SLOT_MINUTES: u16 = 15;

/// Business rules every booking interval must satisfy.
///
/// Missing fields fall back to their defaults when deserialized, so a config
/// file may override only the values it cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingRules {
    /// Earliest allowed start time.
    pub opening: TimeOfDay,
    /// Latest allowed end time.
    pub closing: TimeOfDay,
    /// Grid size in minutes; start times and durations must be multiples of it.
    pub slot_minutes: u16,
    /// Shortest allowed booking, in minutes.
    pub min_duration_minutes: u16,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            opening: DEFAULT_OPENING,
            closing: DEFAULT_CLOSING,
            slot_minutes: DEFAULT_SLOT_MINUTES,
            min_duration_minutes: DEFAULT_SLOT_MINUTES,
        }
    }
}

impl SchedulingRules {
    /// Check that the rules themselves are coherent.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(ValidationReason::InvalidRules(msg).into()) };

        if self.slot_minutes == 0 {
            return invalid("slot_minutes must be positive".to_string());
        }
        if self.closing <= self.opening {
            return invalid(format!(
                "closing {} must be after opening {}",
                self.closing, self.opening
            ));
        }
        if self.min_duration_minutes == 0 || self.min_duration_minutes % self.slot_minutes != 0 {
            return invalid(format!(
                "min_duration_minutes {} must be a positive multiple of slot_minutes {}",
                self.min_duration_minutes, self.slot_minutes
            ));
        }
        Ok(())
    }
}
