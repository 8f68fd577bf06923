use chrono::{Duration, NaiveDateTime, Timelike};

/// Reviewer response window configuration. A decision raised before the
/// cutoff hour is due the same business day (12h); anything later gets the
/// overnight window (24h). The same rule covers RM and SRM deadlines.
#[derive(Debug, Clone, Copy)]
pub struct SlaPolicy {
    pub cutoff_hour: u32,
}

impl Default for SlaPolicy {
    fn default() -> Self {
        Self { cutoff_hour: 12 }
    }
}

/// Deadline for the next human decision, anchored at `raised_at`.
pub fn sla_deadline(raised_at: NaiveDateTime, cutoff_hour: u32) -> NaiveDateTime {
    if raised_at.hour() < cutoff_hour {
        raised_at + Duration::hours(12)
    } else {
        raised_at + Duration::hours(24)
    }
}
