use crate::models::match_request::{MatchRequest, MatchingScore};
use crate::models::profile::{CandidateProfile, InterviewerProfile};
use crate::utils::normalize::contains_ignore_case;

const WEIGHT_PROFESSION: f64 = 0.40;
const WEIGHT_TECH_STACK: f64 = 0.30;
const WEIGHT_LANGUAGE: f64 = 0.15;
const WEIGHT_LEVEL: f64 = 0.10;
const WEIGHT_TIMEZONE: f64 = 0.05;

/// Tech-stack overlap at or above this ratio counts as a matched criterion
/// when deciding whether the score meets the threshold.
const TECH_STACK_CRITERION_MIN: f64 = 0.2;

/// At least this many of the five criteria must match for a pairing to be
/// considered viable.
const CRITERIA_THRESHOLD: usize = 3;

/// The five compatibility signals, independent of where they came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchSignals {
    pub profession_match: bool,
    pub tech_stack_overlap: f64,
    pub language_match: bool,
    pub level_match: bool,
    pub timezone_match: bool,
}

/// Weighted compatibility score. Pure and deterministic: same signals in,
/// same score out, with no iteration-order dependence.
pub fn compute_score(signals: &MatchSignals) -> MatchingScore {
    let overlap = signals.tech_stack_overlap.clamp(0.0, 1.0);

    let weighted = WEIGHT_PROFESSION * bool_signal(signals.profession_match)
        + WEIGHT_TECH_STACK * overlap
        + WEIGHT_LANGUAGE * bool_signal(signals.language_match)
        + WEIGHT_LEVEL * bool_signal(signals.level_match)
        + WEIGHT_TIMEZONE * bool_signal(signals.timezone_match);

    let matched = [
        signals.profession_match,
        overlap >= TECH_STACK_CRITERION_MIN,
        signals.language_match,
        signals.level_match,
        signals.timezone_match,
    ]
    .iter()
    .filter(|m| **m)
    .count();

    MatchingScore {
        percentage: (weighted * 100.0).round() as i32,
        meets_threshold: matched >= CRITERIA_THRESHOLD,
    }
}

/// Derives the signals for a stored request against one interviewer.
///
/// Empty preference lists count in the candidate's favor: a request with no
/// focus areas or no preferred languages does not penalize any interviewer.
pub fn derive_signals(
    request: &MatchRequest,
    candidate: &CandidateProfile,
    interviewer: &InterviewerProfile,
) -> MatchSignals {
    let target = request.target_role.trim();
    let profession = interviewer.profession.trim();
    let profession_match = !target.is_empty()
        && (target.eq_ignore_ascii_case(profession)
            || profession
                .to_lowercase()
                .contains(&target.to_lowercase())
            || target
                .to_lowercase()
                .contains(&profession.to_lowercase()));

    let tech_stack_overlap = if request.focus_areas.is_empty() {
        1.0
    } else {
        let covered = request
            .focus_areas
            .iter()
            .filter(|area| contains_ignore_case(&interviewer.specializations, area))
            .count();
        covered as f64 / request.focus_areas.len() as f64
    };

    let language_match = request.preferred_languages.is_empty()
        || request
            .preferred_languages
            .iter()
            .any(|lang| contains_ignore_case(&interviewer.languages, lang));

    MatchSignals {
        profession_match,
        tech_stack_overlap,
        language_match,
        level_match: interviewer.experience_years >= candidate.experience_years,
        timezone_match: interviewer
            .timezone
            .trim()
            .eq_ignore_ascii_case(candidate.timezone.trim()),
    }
}

pub fn score_pairing(
    request: &MatchRequest,
    candidate: &CandidateProfile,
    interviewer: &InterviewerProfile,
) -> MatchingScore {
    compute_score(&derive_signals(request, candidate, interviewer))
}

fn bool_signal(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signals(
        profession: bool,
        overlap: f64,
        language: bool,
        level: bool,
        timezone: bool,
    ) -> MatchSignals {
        MatchSignals {
            profession_match: profession,
            tech_stack_overlap: overlap,
            language_match: language,
            level_match: level,
            timezone_match: timezone,
        }
    }

    #[test]
    fn all_signals_matched_scores_100() {
        let score = compute_score(&signals(true, 1.0, true, true, true));
        assert_eq!(score.percentage, 100);
        assert!(score.meets_threshold);
    }

    #[test]
    fn no_signals_matched_scores_0() {
        let score = compute_score(&signals(false, 0.0, false, false, false));
        assert_eq!(score.percentage, 0);
        assert!(!score.meets_threshold);
    }

    #[test]
    fn worked_example_from_design_review() {
        // profession + overlap 0.5 + timezone: 0.40 + 0.15 + 0.05 = 0.60,
        // and three of five criteria matched.
        let score = compute_score(&signals(true, 0.5, false, false, true));
        assert_eq!(score.percentage, 60);
        assert!(score.meets_threshold);
    }

    #[test]
    fn overlap_below_criterion_min_does_not_count_toward_threshold() {
        let score = compute_score(&signals(true, 0.1, true, false, false));
        assert!(!score.meets_threshold);
        let score = compute_score(&signals(true, 0.2, true, false, false));
        assert!(score.meets_threshold);
    }

    #[test]
    fn percentage_is_monotone_in_each_signal() {
        let base = signals(false, 0.3, false, true, false);
        let base_score = compute_score(&base).percentage;

        let mut s = base;
        s.profession_match = true;
        assert!(compute_score(&s).percentage >= base_score);

        let mut s = base;
        s.tech_stack_overlap = 0.8;
        assert!(compute_score(&s).percentage >= base_score);

        let mut s = base;
        s.language_match = true;
        assert!(compute_score(&s).percentage >= base_score);

        let mut s = base;
        s.timezone_match = true;
        assert!(compute_score(&s).percentage >= base_score);
    }

    #[test]
    fn percentage_stays_within_bounds_for_out_of_range_overlap() {
        let score = compute_score(&signals(true, 7.5, true, true, true));
        assert!(score.percentage <= 100);
        let score = compute_score(&signals(false, -3.0, false, false, false));
        assert!(score.percentage >= 0);
    }
}
