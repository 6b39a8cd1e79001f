use std::fmt::Write;

use crate::models::{FactorScore, MatchCandidate, UserProfile};
use crate::score;

pub fn build_report(
    learner: &UserProfile,
    skill_name: &str,
    candidates: &[MatchCandidate],
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Mentor Match Report");
    let _ = writeln!(
        output,
        "Learner: {} ({}) requesting {}",
        learner.full_name, learner.email, skill_name
    );
    let _ = writeln!(output);

    if candidates.is_empty() {
        let _ = writeln!(output, "No mentors offer this skill.");
        return output;
    }

    for candidate in candidates {
        let result = &candidate.result;
        let _ = writeln!(
            output,
            "## {} ({}) — {:.2}, {}",
            candidate.mentor.full_name,
            candidate.mentor.email,
            result.total_score,
            score::recommendation(result.total_score)
        );
        let _ = writeln!(output);
        let _ = writeln!(output, "| Factor | Score | Weight | Contribution |");
        let _ = writeln!(output, "|---|---|---|---|");
        write_factor_row(&mut output, "Skills", &result.breakdown.skills);
        write_factor_row(&mut output, "Campus", &result.breakdown.campus);
        write_factor_row(&mut output, "Availability", &result.breakdown.availability);
        write_factor_row(&mut output, "Experience", &result.breakdown.experience);
        write_factor_row(&mut output, "Rating", &result.breakdown.rating);
        let _ = writeln!(output);
    }

    output
}

fn write_factor_row(output: &mut String, label: &str, factor: &FactorScore) {
    let _ = writeln!(
        output,
        "| {} | {:.2} | {:.2} | {:.3} |",
        label, factor.score, factor.weight, factor.contribution
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{score_match, FixedRating, MatchInputs};
    use uuid::Uuid;

    fn sample_learner() -> UserProfile {
        UserProfile {
            user_id: Uuid::new_v4(),
            full_name: "Priya Nair".to_string(),
            email: "priya.nair@campus.edu".to_string(),
            campus: Some("North Campus".to_string()),
            availability: None,
        }
    }

    #[test]
    fn report_lists_every_factor_per_candidate() {
        let learner = sample_learner();
        let mentor = UserProfile {
            user_id: Uuid::new_v4(),
            full_name: "Marcus Webb".to_string(),
            email: "marcus.webb@campus.edu".to_string(),
            campus: Some("North Campus".to_string()),
            availability: None,
        };
        let result = score_match(&MatchInputs::default(), &FixedRating);
        let candidates = vec![MatchCandidate { mentor, result }];

        let report = build_report(&learner, "Data Structures", &candidates);
        assert!(report.contains("Marcus Webb"));
        for factor in ["Skills", "Campus", "Availability", "Experience", "Rating"] {
            assert!(report.contains(factor), "missing factor row: {factor}");
        }
    }

    #[test]
    fn empty_candidate_list_still_renders() {
        let report = build_report(&sample_learner(), "Statistics", &[]);
        assert!(report.contains("No mentors offer this skill."));
    }
}
