use serde::{Deserialize, Serialize};

/// Letter grade for the health score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u8) -> Self {
        match score {
            90..=100 => Grade::A,
            75..=89 => Grade::B,
            60..=74 => Grade::C,
            40..=59 => Grade::D,
            _ => Grade::F,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::F => "F",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Grade::A => "Looks healthy",
            Grade::B => "Minor defects detected",
            Grade::C => "Needs a review pass",
            Grade::D => "Heavily defect-laden",
            Grade::F => "Likely broken as generated",
        }
    }
}

impl std::fmt::Display for Grade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Individual component scores that make up the overall health
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ComponentScores {
    /// Score penalized 10 points per blocking issue (0-100)
    pub issues: u8,
    /// Score penalized 5 points per advisory warning (0-100)
    pub warnings: u8,
    /// Score penalized 20 points per execution error (0-100)
    pub execution: u8,
}

impl ComponentScores {
    pub fn calculate(issue_count: usize, warning_count: usize, error_count: usize) -> Self {
        Self {
            issues: penalized(issue_count, 10),
            warnings: penalized(warning_count, 5),
            execution: penalized(error_count, 20),
        }
    }
}

fn penalized(count: usize, weight: i64) -> u8 {
    (100 - weight * count as i64).clamp(0, 100) as u8
}

/// The composite health score for one analyzed file
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct HealthScore {
    /// Overall score 0-100
    pub value: u8,
    /// Letter grade
    pub grade: Grade,
    /// Individual component scores
    pub components: ComponentScores,
}

impl HealthScore {
    /// Rounded mean of the three sub-scores, each already clamped to
    /// [0, 100], so the composite stays in range too.
    pub fn calculate(issue_count: usize, warning_count: usize, error_count: usize) -> Self {
        let components = ComponentScores::calculate(issue_count, warning_count, error_count);
        let mean = (components.issues as f64 + components.warnings as f64
            + components.execution as f64)
            / 3.0;
        let value = mean.round() as u8;

        Self {
            value,
            grade: Grade::from_score(value),
            components,
        }
    }

    /// Format as display string like "78/100 (B)"
    pub fn display(&self) -> String {
        format!("{}/100 ({})", self.value, self.grade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grade_from_score() {
        assert_eq!(Grade::from_score(95), Grade::A);
        assert_eq!(Grade::from_score(90), Grade::A);
        assert_eq!(Grade::from_score(89), Grade::B);
        assert_eq!(Grade::from_score(74), Grade::C);
        assert_eq!(Grade::from_score(40), Grade::D);
        assert_eq!(Grade::from_score(39), Grade::F);
    }

    #[test]
    fn test_clean_file_scores_hundred() {
        let score = HealthScore::calculate(0, 0, 0);
        assert_eq!(score.value, 100);
        assert_eq!(score.grade, Grade::A);
    }

    #[test]
    fn test_sub_scores_floor_at_zero() {
        let score = HealthScore::calculate(50, 100, 20);
        assert_eq!(score.components.issues, 0);
        assert_eq!(score.components.warnings, 0);
        assert_eq!(score.components.execution, 0);
        assert_eq!(score.value, 0);
    }

    #[test]
    fn test_composite_is_rounded_mean() {
        // issues 90, warnings 95, execution 80 -> mean 88.33 -> 88
        let score = HealthScore::calculate(1, 1, 1);
        assert_eq!(score.components.issues, 90);
        assert_eq!(score.components.warnings, 95);
        assert_eq!(score.components.execution, 80);
        assert_eq!(score.value, 88);
    }

    #[test]
    fn test_score_stays_in_bounds() {
        for issues in [0usize, 1, 3, 10, 100] {
            for warnings in [0usize, 2, 20, 500] {
                for errors in [0usize, 1, 5, 50] {
                    let score = HealthScore::calculate(issues, warnings, errors);
                    assert!(score.value <= 100);
                }
            }
        }
    }
}
