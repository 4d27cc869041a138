//! Fixed display and ranking tables. Adding a variant without a table entry does not compile.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {table} key: {key:?}")]
pub struct CatalogError {
    pub table: &'static str,
    pub key: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LessonStatus {
    Scheduled,
    Completed,
    Cancelled,
    Rescheduled,
    NoShow,
}

impl LessonStatus {
    pub const ALL: [LessonStatus; 5] = [
        LessonStatus::Scheduled,
        LessonStatus::Completed,
        LessonStatus::Cancelled,
        LessonStatus::Rescheduled,
        LessonStatus::NoShow,
    ];

    pub fn parse(s: &str) -> Result<Self, CatalogError> {
        match s {
            "scheduled" => Ok(Self::Scheduled),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            "rescheduled" => Ok(Self::Rescheduled),
            // rows written by the backend use snake_case
            "noShow" | "no_show" => Ok(Self::NoShow),
            _ => Err(CatalogError {
                table: "lessonStatus",
                key: s.to_string(),
            }),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::Rescheduled => "Rescheduled",
            Self::NoShow => "No-show",
        }
    }

    /// Badge colour token.
    pub fn color(self) -> &'static str {
        match self {
            Self::Scheduled => "blue",
            Self::Completed => "green",
            Self::Cancelled => "red",
            Self::Rescheduled => "amber",
            Self::NoShow => "gray",
        }
    }

    pub fn is_terminal(self) -> bool {
        match self {
            Self::Scheduled | Self::Rescheduled => false,
            Self::Completed | Self::Cancelled | Self::NoShow => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SubjectCategory {
    Languages,
    Mathematics,
    Sciences,
    Music,
    Arts,
    Programming,
    TestPrep,
    Other,
}

impl SubjectCategory {
    pub const ALL: [SubjectCategory; 8] = [
        SubjectCategory::Languages,
        SubjectCategory::Mathematics,
        SubjectCategory::Sciences,
        SubjectCategory::Music,
        SubjectCategory::Arts,
        SubjectCategory::Programming,
        SubjectCategory::TestPrep,
        SubjectCategory::Other,
    ];

    pub fn parse(s: &str) -> Result<Self, CatalogError> {
        match s {
            "languages" => Ok(Self::Languages),
            "mathematics" => Ok(Self::Mathematics),
            "sciences" => Ok(Self::Sciences),
            "music" => Ok(Self::Music),
            "arts" => Ok(Self::Arts),
            "programming" => Ok(Self::Programming),
            "testPrep" | "test_prep" => Ok(Self::TestPrep),
            "other" => Ok(Self::Other),
            _ => Err(CatalogError {
                table: "subject",
                key: s.to_string(),
            }),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Languages => "Languages",
            Self::Mathematics => "Mathematics",
            Self::Sciences => "Sciences",
            Self::Music => "Music",
            Self::Arts => "Arts",
            Self::Programming => "Programming",
            Self::TestPrep => "Test Prep",
            Self::Other => "Other",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            Self::Languages => "languages",
            Self::Mathematics => "calculator",
            Self::Sciences => "flask-conical",
            Self::Music => "music",
            Self::Arts => "palette",
            Self::Programming => "code",
            Self::TestPrep => "graduation-cap",
            Self::Other => "book-open",
        }
    }
}

/// Ordered lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TeacherTier {
    Starter,
    Rising,
    Pro,
    Elite,
}

impl TeacherTier {
    pub const ALL: [TeacherTier; 4] = [
        TeacherTier::Starter,
        TeacherTier::Rising,
        TeacherTier::Pro,
        TeacherTier::Elite,
    ];

    pub fn parse(s: &str) -> Result<Self, CatalogError> {
        match s {
            "starter" => Ok(Self::Starter),
            "rising" => Ok(Self::Rising),
            "pro" => Ok(Self::Pro),
            "elite" => Ok(Self::Elite),
            _ => Err(CatalogError {
                table: "tier",
                key: s.to_string(),
            }),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Starter => "Starter",
            Self::Rising => "Rising",
            Self::Pro => "Pro",
            Self::Elite => "Elite",
        }
    }

    /// Listing boost used when ordering search results.
    pub fn score(self) -> u32 {
        match self {
            Self::Starter => 0,
            Self::Rising => 25,
            Self::Pro => 60,
            Self::Elite => 100,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Self::Starter => "slate",
            Self::Rising => "teal",
            Self::Pro => "violet",
            Self::Elite => "gold",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("noShow", LessonStatus::NoShow)]
    #[case("no_show", LessonStatus::NoShow)]
    #[case("cancelled", LessonStatus::Cancelled)]
    fn lesson_status_accepts_backend_spellings(#[case] raw: &str, #[case] expected: LessonStatus) {
        assert_eq!(LessonStatus::parse(raw), Ok(expected));
    }

    #[rstest]
    #[case("canceled")]
    #[case("Scheduled")]
    #[case("")]
    fn unknown_keys_are_errors_not_fallbacks(#[case] raw: &str) {
        assert_eq!(
            LessonStatus::parse(raw),
            Err(CatalogError {
                table: "lessonStatus",
                key: raw.to_string(),
            })
        );
    }

    #[test]
    fn every_status_has_distinct_colour() {
        let mut colours: Vec<_> = LessonStatus::ALL.iter().map(|s| s.color()).collect();
        colours.sort_unstable();
        colours.dedup();
        assert_eq!(colours.len(), LessonStatus::ALL.len());
    }

    #[test]
    fn terminal_statuses() {
        assert!(!LessonStatus::Scheduled.is_terminal());
        assert!(!LessonStatus::Rescheduled.is_terminal());
        assert!(LessonStatus::NoShow.is_terminal());
    }

    #[test]
    fn subject_icons_cover_every_category() {
        for c in SubjectCategory::ALL {
            assert!(!c.icon().is_empty());
        }
        assert_eq!(SubjectCategory::parse("test_prep"), Ok(SubjectCategory::TestPrep));
        assert!(SubjectCategory::parse("cooking").is_err());
    }

    #[test]
    fn tier_scores_rise_with_rank() {
        for pair in TeacherTier::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].score() < pair[1].score());
        }
        assert_eq!(TeacherTier::parse("elite"), Ok(TeacherTier::Elite));
    }
}
