use crate::prefs::{KvStore, StoreError};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OnboardingStep {
    Profile,
    Subjects,
    Availability,
    Payouts,
    IntroVideo,
}

impl OnboardingStep {
    /// Wizard order.
    pub const ALL: [OnboardingStep; 5] = [
        OnboardingStep::Profile,
        OnboardingStep::Subjects,
        OnboardingStep::Availability,
        OnboardingStep::Payouts,
        OnboardingStep::IntroVideo,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "profile" => Some(Self::Profile),
            "subjects" => Some(Self::Subjects),
            "availability" => Some(Self::Availability),
            "payouts" => Some(Self::Payouts),
            "introVideo" => Some(Self::IntroVideo),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Profile => "profile",
            Self::Subjects => "subjects",
            Self::Availability => "availability",
            Self::Payouts => "payouts",
            Self::IntroVideo => "introVideo",
        }
    }

    fn completed_key(self) -> String {
        format!("onboarding.{}.completed", self.as_str())
    }

    fn skipped_key(self) -> String {
        format!("onboarding.{}.skipped", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepState {
    pub step: OnboardingStep,
    pub completed: bool,
    pub skipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub steps: Vec<StepState>,
    /// First step neither completed nor skipped.
    pub next_step: Option<OnboardingStep>,
    pub completed_count: usize,
    pub finished: bool,
}

/// Teacher onboarding wizard state.
///
/// Completion is remembered in `progress` across restarts; "skip for now" lives in `skips`,
/// normally the session store, so skipped steps come back on the next launch.
pub struct OnboardingProgress<'a> {
    progress: &'a mut dyn KvStore,
    skips: &'a mut dyn KvStore,
}

impl<'a> OnboardingProgress<'a> {
    pub fn new(progress: &'a mut dyn KvStore, skips: &'a mut dyn KvStore) -> Self {
        Self { progress, skips }
    }

    pub fn complete(&mut self, step: OnboardingStep) -> Result<ProgressSnapshot, StoreError> {
        self.progress.set_flag(&step.completed_key(), true)?;
        self.skips.set_flag(&step.skipped_key(), false)?;
        self.snapshot()
    }

    pub fn skip(&mut self, step: OnboardingStep) -> Result<ProgressSnapshot, StoreError> {
        if !self.progress.get_flag(&step.completed_key())? {
            self.skips.set_flag(&step.skipped_key(), true)?;
        }
        self.snapshot()
    }

    pub fn reset(&mut self) -> Result<ProgressSnapshot, StoreError> {
        for step in OnboardingStep::ALL {
            self.progress.set_flag(&step.completed_key(), false)?;
            self.skips.set_flag(&step.skipped_key(), false)?;
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> Result<ProgressSnapshot, StoreError> {
        let mut steps = Vec::with_capacity(OnboardingStep::ALL.len());
        for step in OnboardingStep::ALL {
            steps.push(StepState {
                step,
                completed: self.progress.get_flag(&step.completed_key())?,
                skipped: self.skips.get_flag(&step.skipped_key())?,
            });
        }
        let next_step = steps
            .iter()
            .find(|s| !s.completed && !s.skipped)
            .map(|s| s.step);
        let completed_count = steps.iter().filter(|s| s.completed).count();
        Ok(ProgressSnapshot {
            finished: completed_count == steps.len(),
            next_step,
            completed_count,
            steps,
        })
    }
}
