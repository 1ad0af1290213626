//! Domain vocabularies for the synthetic dataset.
//!
//! Weights are relative frequencies; each list sums to one.

/// A categorical value with its sampling weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weighted<T> {
    pub value: T,
    pub weight: f64,
}

const fn w<T>(value: T, weight: f64) -> Weighted<T> {
    Weighted { value, weight }
}

pub const PROGRAMMES: &[Weighted<&str>] = &[
    w("Pharmacy", 0.20),
    w("Nursing", 0.25),
    w("Medicine", 0.20),
    w("Physiotherapy", 0.20),
    w("PublicHealth", 0.15),
];

/// Academic terms in chronological order.
pub const TERMS: &[&str] = &["2023-Fall", "2024-Spring", "2024-Fall", "2025-Spring"];

/// Intake cohort with the first term its students can enrol in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intake {
    pub name: &'static str,
    pub first_term: &'static str,
}

pub const INTAKES: &[Weighted<Intake>] = &[
    w(
        Intake {
            name: "2023-Sep",
            first_term: "2023-Fall",
        },
        0.7,
    ),
    w(
        Intake {
            name: "2024-Jan",
            first_term: "2024-Spring",
        },
        0.3,
    ),
];

pub const WP_FLAGS: &[Weighted<i64>] = &[w(0, 0.7), w(1, 0.3)];

pub const AGE_BANDS: &[Weighted<&str>] = &[
    w("<21", 0.25),
    w("21-24", 0.45),
    w("25-34", 0.25),
    w("35+", 0.05),
];

pub const GENDERS: &[Weighted<&str>] = &[w("F", 0.55), w("M", 0.43), w("Other/NA", 0.02)];

pub const ADMISSION_ROUTES: &[Weighted<&str>] = &[
    w("Domestic", 0.70),
    w("International", 0.25),
    w("Transfer", 0.05),
];

pub const OFFER_STATUSES: &[Weighted<&str>] =
    &[w("Offer", 0.78), w("Reject", 0.18), w("Waitlist", 0.04)];

/// QAA Quality Code theme with the short code used in survey rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QaaTheme {
    pub name: &'static str,
    pub code: &'static str,
}

pub const QAA_THEMES: &[QaaTheme] = &[
    QaaTheme {
        name: "Admissions, Recruitment and Widening Access",
        code: "Admissions",
    },
    QaaTheme {
        name: "Assessment",
        code: "Assessment",
    },
    QaaTheme {
        name: "Learning and Teaching",
        code: "LearningTeaching",
    },
    QaaTheme {
        name: "Enabling Student Achievement",
        code: "StudentSupport",
    },
    QaaTheme {
        name: "Monitoring and Evaluation",
        code: "Monitoring",
    },
    QaaTheme {
        name: "Student Engagement",
        code: "StudentEngagement",
    },
];

pub const ASSESSMENT_TYPES: &[&str] = &["CW1", "CW2", "Exam"];

pub const SUPPORT_SERVICES: &[&str] = &["Advising", "WritingCenter", "MathLab", "Counselling"];

pub const COMPLAINT_CATEGORIES: &[Weighted<&str>] = &[
    w("Assessment", 0.45),
    w("Service", 0.35),
    w("Harassment", 0.05),
    w("Facilities", 0.15),
];

pub const UPHELD_FLAGS: &[Weighted<i64>] = &[w(0, 0.7), w(1, 0.3)];

pub const PLACEMENT_PARTNERS: &[&str] = &["NHS-A", "NHS-B", "Clinic-X", "Pharma-Y"];

pub const PLACEMENT_OUTCOMES: &[Weighted<&str>] =
    &[w("Pass", 0.90), w("Fail", 0.07), w("Withdrawn", 0.03)];

/// Turnaround bin labels in display order.
pub const TURNAROUND_BINS: &[&str] = &["<=10", "11-15", "16-20", ">20"];

/// Position of a term in the academic calendar.
pub fn term_position(term: &str) -> Option<usize> {
    TERMS.iter().position(|candidate| *candidate == term)
}

/// Terms a student of the given intake can enrol in.
pub fn terms_from(first_term: &str) -> &'static [&'static str] {
    match term_position(first_term) {
        Some(idx) => &TERMS[idx..],
        None => &[],
    }
}

pub fn programme_names() -> Vec<&'static str> {
    PROGRAMMES.iter().map(|entry| entry.value).collect()
}

pub fn intake(name: &str) -> Option<Intake> {
    INTAKES
        .iter()
        .map(|entry| entry.value)
        .find(|intake| intake.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total<T>(entries: &[Weighted<T>]) -> f64 {
        entries.iter().map(|entry| entry.weight).sum()
    }

    #[test]
    fn weights_sum_to_one() {
        for sum in [
            total(PROGRAMMES),
            total(INTAKES),
            total(WP_FLAGS),
            total(AGE_BANDS),
            total(GENDERS),
            total(ADMISSION_ROUTES),
            total(OFFER_STATUSES),
            total(COMPLAINT_CATEGORIES),
            total(UPHELD_FLAGS),
            total(PLACEMENT_OUTCOMES),
        ] {
            assert!((sum - 1.0).abs() < 1e-9, "weights sum to {sum}");
        }
    }

    #[test]
    fn january_intake_skips_first_term() {
        let intake = intake("2024-Jan").expect("january intake");
        assert_eq!(terms_from(intake.first_term), &TERMS[1..]);
        assert!(terms_from("1999-Fall").is_empty());
    }
}
