use crate::config::{FlowConfig, SchedulingConfig};
use crate::slots::{FitPolicy, MergePolicy, MAX_LEAD_MINUTES};
use chrono::Duration;

/// The screens that derive slots. Each carries its own lead time and merge behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingFlow {
    /// Learner or teacher moving an existing lesson.
    Reschedule,
    /// Teacher booking a lesson on behalf of a learner.
    BookWithStudent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowPolicy {
    pub lead_time: Duration,
    pub merge: MergePolicy,
    pub fit: FitPolicy,
}

impl From<FlowConfig> for FlowPolicy {
    fn from(c: FlowConfig) -> Self {
        Self {
            // validated config is already in range; the clamp only guards hand-built values
            lead_time: Duration::minutes(c.lead_minutes.clamp(0, MAX_LEAD_MINUTES)),
            merge: c.merge,
            fit: c.fit,
        }
    }
}

impl BookingFlow {
    pub const ALL: [BookingFlow; 2] = [BookingFlow::Reschedule, BookingFlow::BookWithStudent];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reschedule" => Some(Self::Reschedule),
            "bookWithStudent" => Some(Self::BookWithStudent),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reschedule => "reschedule",
            Self::BookWithStudent => "bookWithStudent",
        }
    }

    pub fn policy(self, cfg: &SchedulingConfig) -> FlowPolicy {
        match self {
            Self::Reschedule => cfg.reschedule.into(),
            Self::BookWithStudent => cfg.book_with_student.into(),
        }
    }
}
