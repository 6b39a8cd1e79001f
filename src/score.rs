use crate::models::{
    AvailabilitySlot, FactorScore, MatchBreakdown, MatchResult, RatingInputs, SkillRecord,
    SkillType,
};

pub const SKILLS_WEIGHT: f64 = 0.35;
pub const CAMPUS_WEIGHT: f64 = 0.20;
pub const AVAILABILITY_WEIGHT: f64 = 0.25;
pub const EXPERIENCE_WEIGHT: f64 = 0.10;
pub const RATING_WEIGHT: f64 = 0.10;

/// Everything the scorer needs about one (learner, mentor, skill) triple,
/// fetched up front so the scoring itself is a pure computation over a
/// consistent snapshot.
#[derive(Debug, Clone, Default)]
pub struct MatchInputs {
    pub mentor_offered: Option<SkillRecord>,
    /// The learner's own `needed` record is fetched alongside the mentor's,
    /// but the default strategy does not yet fold it into the score.
    pub learner_needed: Option<SkillRecord>,
    pub learner_campus: Option<String>,
    pub mentor_campus: Option<String>,
    pub learner_availability: Option<String>,
    pub mentor_availability: Option<String>,
    pub completed_sessions: i64,
    pub rating: RatingInputs,
}

/// Source of the rating factor. The default is a fixed placeholder until
/// enough feedback accumulates to make the aggregate trustworthy.
pub trait RatingProvider {
    fn rating_score(&self, inputs: &RatingInputs) -> f64;
}

pub struct FixedRating;

impl RatingProvider for FixedRating {
    fn rating_score(&self, _inputs: &RatingInputs) -> f64 {
        0.7
    }
}

/// Aggregates real session feedback: 1-5 average normalized to [0,1], with a
/// reliability boost that saturates at 20 ratings. Unrated mentors keep the
/// 0.7 default.
pub struct FeedbackRating;

impl RatingProvider for FeedbackRating {
    fn rating_score(&self, inputs: &RatingInputs) -> f64 {
        let avg = match inputs.avg_rating {
            Some(avg) if inputs.rating_count > 0 => avg,
            _ => return 0.7,
        };
        let normalized = ((avg - 1.0) / 4.0).clamp(0.0, 1.0);
        let reliability = (inputs.rating_count as f64 / 20.0).min(1.0);
        (normalized * (0.8 + 0.2 * reliability)).min(1.0)
    }
}

/// Weighted composite of the five factors. Every factor is always computed
/// and reported, even when one is structurally zero, so the breakdown stays
/// informative for non-matches.
pub fn score_match(inputs: &MatchInputs, rating_provider: &dyn RatingProvider) -> MatchResult {
    let skills = skill_match_score(inputs.mentor_offered.as_ref());
    let campus = campus_match_score(
        inputs.learner_campus.as_deref(),
        inputs.mentor_campus.as_deref(),
    );
    let availability = availability_overlap_score(
        inputs.learner_availability.as_deref(),
        inputs.mentor_availability.as_deref(),
    );
    let experience = experience_score(inputs.completed_sessions);
    let rating = rating_provider.rating_score(&inputs.rating).clamp(0.0, 1.0);

    let breakdown = MatchBreakdown {
        skills: factor(skills, SKILLS_WEIGHT),
        campus: factor(campus, CAMPUS_WEIGHT),
        availability: factor(availability, AVAILABILITY_WEIGHT),
        experience: factor(experience, EXPERIENCE_WEIGHT),
        rating: factor(rating, RATING_WEIGHT),
    };

    let total = breakdown.skills.contribution
        + breakdown.campus.contribution
        + breakdown.availability.contribution
        + breakdown.experience.contribution
        + breakdown.rating.contribution;

    MatchResult {
        total_score: round2(total),
        breakdown,
    }
}

fn factor(score: f64, weight: f64) -> FactorScore {
    FactorScore {
        score,
        weight,
        contribution: score * weight,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// A mentor without an `offered` record scores zero here but the other four
/// factors still apply; otherwise the 1-5 proficiency maps linearly to [0,1].
pub fn skill_match_score(mentor_offered: Option<&SkillRecord>) -> f64 {
    match mentor_offered {
        Some(record) if record.skill_type == SkillType::Offered => {
            (record.proficiency_level as f64 / 5.0).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

pub fn campus_match_score(learner_campus: Option<&str>, mentor_campus: Option<&str>) -> f64 {
    let learner = learner_campus.filter(|c| !c.is_empty());
    let mentor = mentor_campus.filter(|c| !c.is_empty());
    match (learner, mentor) {
        (Some(a), Some(b)) if a == b => 1.0,
        (Some(_), Some(_)) => 0.3,
        _ => 0.5,
    }
}

/// Missing, empty, or unparseable availability on either side is neutral 0.5.
/// Otherwise overlapping same-day slot pairs are counted and normalized by
/// the larger slot list, which rewards broad mutual availability over a
/// single lucky overlap.
pub fn availability_overlap_score(learner_raw: Option<&str>, mentor_raw: Option<&str>) -> f64 {
    let learner_slots = match parse_availability(learner_raw) {
        Some(slots) if !slots.is_empty() => slots,
        _ => return 0.5,
    };
    let mentor_slots = match parse_availability(mentor_raw) {
        Some(slots) if !slots.is_empty() => slots,
        _ => return 0.5,
    };

    let mut overlap_count = 0usize;
    for learner_slot in &learner_slots {
        for mentor_slot in &mentor_slots {
            if slots_overlap(learner_slot, mentor_slot) {
                overlap_count += 1;
            }
        }
    }

    let max_overlaps = learner_slots.len().max(mentor_slots.len());
    (overlap_count as f64 / max_overlaps as f64).min(1.0)
}

/// Parse failure is treated the same as absent availability.
pub fn parse_availability(raw: Option<&str>) -> Option<Vec<AvailabilitySlot>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    serde_json::from_str(raw).ok()
}

fn slots_overlap(a: &AvailabilitySlot, b: &AvailabilitySlot) -> bool {
    a.day == b.day && a.start <= b.end && b.start <= a.end
}

/// New mentors start at a 0.3 baseline instead of zero, ramping linearly to
/// 1.0 at ten completed sessions for the requested skill.
pub fn experience_score(completed_sessions: i64) -> f64 {
    if completed_sessions <= 0 {
        return 0.3;
    }
    (0.3 + completed_sessions as f64 / 10.0 * 0.7).min(1.0)
}

pub fn recommendation(total_score: f64) -> &'static str {
    if total_score > 0.7 {
        "Highly Recommended"
    } else if total_score > 0.4 {
        "Recommended"
    } else {
        "Limited Match"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offered_record(proficiency_level: i32) -> SkillRecord {
        SkillRecord {
            skill_type: SkillType::Offered,
            proficiency_level,
        }
    }

    fn slots_json(slots: &[(&str, &str, &str)]) -> String {
        let slots: Vec<AvailabilitySlot> = slots
            .iter()
            .map(|(day, start, end)| AvailabilitySlot {
                day: day.to_string(),
                start: start.to_string(),
                end: end.to_string(),
            })
            .collect();
        serde_json::to_string(&slots).unwrap()
    }

    fn perfect_inputs() -> MatchInputs {
        MatchInputs {
            mentor_offered: Some(offered_record(5)),
            learner_needed: None,
            learner_campus: Some("North Campus".to_string()),
            mentor_campus: Some("North Campus".to_string()),
            learner_availability: Some(slots_json(&[("monday", "14:00", "16:00")])),
            mentor_availability: Some(slots_json(&[("monday", "14:00", "16:00")])),
            completed_sessions: 10,
            rating: RatingInputs::default(),
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let sum = SKILLS_WEIGHT + CAMPUS_WEIGHT + AVAILABILITY_WEIGHT + EXPERIENCE_WEIGHT
            + RATING_WEIGHT;
        assert!((sum - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn total_matches_weighted_sum_of_breakdown() {
        let result = score_match(&perfect_inputs(), &FixedRating);
        let b = &result.breakdown;
        let expected = b.skills.score * b.skills.weight
            + b.campus.score * b.campus.weight
            + b.availability.score * b.availability.weight
            + b.experience.score * b.experience.weight
            + b.rating.score * b.rating.weight;
        assert_eq!(result.total_score, (expected * 100.0).round() / 100.0);
        assert!(result.total_score >= 0.0 && result.total_score <= 1.0);
    }

    #[test]
    fn perfect_mentor_scores_097() {
        let result = score_match(&perfect_inputs(), &FixedRating);
        assert_eq!(result.breakdown.skills.score, 1.0);
        assert_eq!(result.breakdown.campus.score, 1.0);
        assert_eq!(result.breakdown.availability.score, 1.0);
        assert_eq!(result.breakdown.experience.score, 1.0);
        assert_eq!(result.breakdown.rating.score, 0.7);
        assert_eq!(result.total_score, 0.97);
    }

    #[test]
    fn missing_skill_does_not_short_circuit() {
        let mut inputs = perfect_inputs();
        inputs.mentor_offered = None;
        let result = score_match(&inputs, &FixedRating);
        assert_eq!(result.breakdown.skills.score, 0.0);
        assert_eq!(result.total_score, 0.62);
    }

    #[test]
    fn skill_score_scales_with_proficiency() {
        assert_eq!(skill_match_score(Some(&offered_record(1))), 0.2);
        assert_eq!(skill_match_score(Some(&offered_record(3))), 0.6);
        assert_eq!(skill_match_score(Some(&offered_record(5))), 1.0);
        assert_eq!(skill_match_score(None), 0.0);
    }

    #[test]
    fn campus_tiers() {
        assert_eq!(campus_match_score(Some("North"), Some("North")), 1.0);
        assert_eq!(campus_match_score(Some("North"), Some("South")), 0.3);
        assert_eq!(campus_match_score(None, Some("South")), 0.5);
        assert_eq!(campus_match_score(Some("North"), None), 0.5);
        assert_eq!(campus_match_score(Some(""), Some("South")), 0.5);
    }

    #[test]
    fn experience_ramp() {
        assert_eq!(experience_score(0), 0.3);
        assert!((experience_score(5) - 0.65).abs() < 1e-9);
        assert_eq!(experience_score(10), 1.0);
        assert_eq!(experience_score(25), 1.0);
        let mut previous = 0.0;
        for count in 0..15 {
            let score = experience_score(count);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn malformed_availability_is_neutral() {
        let valid = slots_json(&[("monday", "14:00", "16:00")]);
        assert_eq!(
            availability_overlap_score(Some("{not json"), Some(valid.as_str())),
            0.5
        );
        assert_eq!(
            availability_overlap_score(Some(valid.as_str()), Some("[1, 2]")),
            0.5
        );
    }

    #[test]
    fn absent_availability_is_neutral() {
        let valid = slots_json(&[("monday", "14:00", "16:00")]);
        assert_eq!(availability_overlap_score(None, None), 0.5);
        assert_eq!(availability_overlap_score(None, Some(valid.as_str())), 0.5);
        assert_eq!(availability_overlap_score(Some("[]"), Some(valid.as_str())), 0.5);
    }

    #[test]
    fn availability_normalizes_by_larger_slot_list() {
        let learner = slots_json(&[
            ("monday", "14:00", "16:00"),
            ("tuesday", "10:00", "12:00"),
            ("friday", "09:00", "11:00"),
        ]);
        let mentor = slots_json(&[("monday", "15:00", "17:00")]);
        let score = availability_overlap_score(Some(&learner), Some(&mentor));
        assert!((score - 1.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn disjoint_same_day_slots_do_not_overlap() {
        let learner = slots_json(&[("monday", "08:00", "09:00")]);
        let mentor = slots_json(&[("monday", "10:00", "11:00")]);
        assert_eq!(availability_overlap_score(Some(&learner), Some(&mentor)), 0.0);
    }

    #[test]
    fn identical_inputs_give_identical_results() {
        let inputs = perfect_inputs();
        let first = score_match(&inputs, &FixedRating);
        let second = score_match(&inputs, &FixedRating);
        assert_eq!(first, second);
    }

    #[test]
    fn feedback_rating_defaults_when_unrated() {
        let unrated = RatingInputs::default();
        assert_eq!(FeedbackRating.rating_score(&unrated), 0.7);
    }

    #[test]
    fn feedback_rating_applies_reliability_boost() {
        let inputs = RatingInputs {
            avg_rating: Some(5.0),
            rating_count: 20,
        };
        assert_eq!(FeedbackRating.rating_score(&inputs), 1.0);

        let few_ratings = RatingInputs {
            avg_rating: Some(5.0),
            rating_count: 2,
        };
        let expected = 1.0 * (0.8 + 0.2 * (2.0 / 20.0));
        assert!((FeedbackRating.rating_score(&few_ratings) - expected).abs() < 1e-9);
    }

    #[test]
    fn recommendation_labels() {
        assert_eq!(recommendation(0.97), "Highly Recommended");
        assert_eq!(recommendation(0.62), "Recommended");
        assert_eq!(recommendation(0.35), "Limited Match");
    }
}
