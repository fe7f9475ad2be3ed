//! Attribution of feed segments to the child being processed.
//!
//! The feed shown for one child regularly carries cards belonging to a
//! sibling or another classroom. Two cues are checked: an explicit subject
//! name on attendance cards, and the classroom of the recorder.

use kidpulse_core::AttributionConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

static SUBJECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:Sign (?:In|Out))[^·]*·\s*([A-Z][a-z]+\s+[A-Z][a-z]+)").unwrap()
});
static RECORDER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"Recorded by\s+([^·\n]+)").unwrap());

/// Outcome of an attribution check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attribution {
    Accepted,
    /// The card names a different child.
    OtherChild(String),
    /// A staff recorder from a classroom this child is not in.
    OtherClassroom(String),
}

impl Attribution {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

pub struct AttributionFilter {
    config: AttributionConfig,
}

impl AttributionFilter {
    pub fn new(config: AttributionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AttributionConfig {
        &self.config
    }

    pub fn applies_to(&self, segment: &str, child_name: &str) -> bool {
        let outcome = self.check(segment, child_name);
        if !outcome.is_accepted() {
            debug!("Segment not attributed to {}: {:?}", child_name, outcome);
        }
        outcome.is_accepted()
    }

    /// Decide whether `segment` belongs to `child_name`.
    ///
    /// Segments without a name or recorder cue are accepted.
    pub fn check(&self, segment: &str, child_name: &str) -> Attribution {
        let child_lower = child_name.trim().to_lowercase();

        for caps in SUBJECT_RE.captures_iter(segment) {
            let named = caps[1].split_whitespace().collect::<Vec<_>>().join(" ");
            if named.to_lowercase() != child_lower {
                return Attribution::OtherChild(named);
            }
        }

        if let Some(caps) = RECORDER_RE.captures(segment) {
            let recorder = caps[1].trim().trim_end_matches('.').trim();
            let expected = self.config.expected_classrooms(child_name);
            if !expected.is_empty() {
                let in_classroom = expected.iter().any(|room| recorder.contains(room.as_str()));
                let is_guardian = !self
                    .config
                    .known_classroom_labels
                    .iter()
                    .any(|label| recorder.contains(label.as_str()));
                if !in_classroom && !is_guardian {
                    return Attribution::OtherClassroom(recorder.to_string());
                }
            }
        }

        Attribution::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> AttributionFilter {
        AttributionFilter::new(
            AttributionConfig::default()
                .with_child("Jane", &["Infant C"])
                .with_child("John", &["Older P"]),
        )
    }

    #[test]
    fn test_other_child_rejected() {
        let seg = "Sign Out · John Smith\nRecorded by Older P Teacher\nOccurred at Jan 5, 2026 5:30 PM";
        assert_eq!(
            filter().check(seg, "Jane Doe"),
            Attribution::OtherChild("John Smith".into())
        );
        assert!(!filter().applies_to(seg, "Jane Doe"));
    }

    #[test]
    fn test_same_child_accepted() {
        let seg = "Sign In · Jane Doe\nRecorded by Infant C Teacher.\nOccurred at Jan 5, 2026 7:55 AM";
        assert!(filter().applies_to(seg, "Jane Doe"));
        assert!(filter().applies_to(seg, "jane doe"));
    }

    #[test]
    fn test_other_classroom_rejected() {
        let seg = "Diaper\nWet\nRecorded by Older P Teacher\nOccurred at Jan 5, 2026 9:00 AM";
        assert_eq!(
            filter().check(seg, "Jane Doe"),
            Attribution::OtherClassroom("Older P Teacher".into())
        );
        assert!(filter().applies_to(seg, "John Doe"));
    }

    #[test]
    fn test_guardian_recorder_accepted() {
        let seg = "Bottle\n4 oz\nRecorded by Mary Doe\nOccurred at Jan 5, 2026 6:00 AM";
        assert!(filter().applies_to(seg, "Jane Doe"));
    }

    #[test]
    fn test_no_cues_accepted() {
        assert!(filter().applies_to("Fluids 3 oz at 10:00 AM", "Jane Doe"));
        // No classroom configured for this child: any recorder passes.
        let seg = "Diaper\nRecorded by Toddler B Teacher";
        assert!(filter().applies_to(seg, "Sam Roe"));
    }
}
