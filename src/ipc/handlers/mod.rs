pub mod catalog;
pub mod core;
pub mod onboarding;
pub mod prefs;
pub mod slots;
