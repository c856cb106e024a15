//! Spaced-repetition review state and scheduling.
//!
//! Persistence code only sees the [`ReviewPolicy`] trait; the shipped
//! [`StepLadderPolicy`] is driven entirely by the `[review]` section of the
//! configuration, so the schedule can be tuned or the whole policy swapped
//! without touching any handler or query.
//!
//! All timestamps are unix seconds; intervals are stored in seconds.

use serde::{Deserialize, Serialize};

use crate::config::ReviewConfig;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_DAY: i64 = 86_400;

/// Where a card sits in its review lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardStatus {
    /// Still inside the short-interval learning-step ladder
    Learning,
    /// Graduated to long-interval reviews
    Review,
}

impl CardStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CardStatus::Learning => "LEARNING",
            CardStatus::Review => "REVIEW",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LEARNING" => Some(CardStatus::Learning),
            "REVIEW" => Some(CardStatus::Review),
            _ => None,
        }
    }
}

/// A card's spaced-repetition progress.
///
/// Zeroed timestamps mean "never reviewed"; such a card is always due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReviewState {
    pub status: CardStatus,
    pub learning_step: i64,
    pub cur_interval: i64,
    pub last_review: i64,
    pub next_review: i64,
}

impl ReviewState {
    /// State assigned to a freshly created card.
    pub fn new_card() -> Self {
        Self {
            status: CardStatus::Learning,
            learning_step: 0,
            cur_interval: 0,
            last_review: 0,
            next_review: 0,
        }
    }

    pub fn is_due(&self, now: i64) -> bool {
        self.next_review <= now
    }
}

/// Grade reported by the user after studying a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Again,
    Good,
    Easy,
}

/// Computes the state a card moves to after being studied.
pub trait ReviewPolicy: Send + Sync {
    fn next_state(&self, state: &ReviewState, answer: Answer, now: i64) -> ReviewState;
}

/// The default policy: a fixed ladder of learning steps, then a
/// multiplicative interval schedule after graduation.
pub struct StepLadderPolicy {
    /// Learning-step delays in seconds, never empty
    steps: Vec<i64>,
    graduating_interval: i64,
    easy_interval: i64,
    interval_multiplier: f64,
    easy_bonus: f64,
    max_interval: i64,
}

impl StepLadderPolicy {
    pub fn from_config(config: &ReviewConfig) -> Self {
        let mut steps: Vec<i64> = config
            .learning_steps_minutes
            .iter()
            .map(|minutes| minutes * SECS_PER_MINUTE)
            .collect();
        if steps.is_empty() {
            steps.push(SECS_PER_MINUTE);
        }

        Self {
            steps,
            graduating_interval: config.graduating_interval_days * SECS_PER_DAY,
            easy_interval: config.easy_interval_days * SECS_PER_DAY,
            interval_multiplier: config.interval_multiplier,
            easy_bonus: config.easy_bonus,
            max_interval: config.max_interval_days * SECS_PER_DAY,
        }
    }

    fn first_step(&self) -> i64 {
        self.steps[0]
    }

    fn graduate(&self, interval: i64, now: i64) -> ReviewState {
        ReviewState {
            status: CardStatus::Review,
            learning_step: 0,
            cur_interval: interval,
            last_review: now,
            next_review: now + interval,
        }
    }

    fn grow(&self, interval: i64, factor: f64) -> i64 {
        let grown = (interval as f64 * factor) as i64;
        grown.max(self.graduating_interval).min(self.max_interval)
    }
}

impl ReviewPolicy for StepLadderPolicy {
    fn next_state(&self, state: &ReviewState, answer: Answer, now: i64) -> ReviewState {
        match (state.status, answer) {
            (CardStatus::Learning, Answer::Again) => ReviewState {
                status: CardStatus::Learning,
                learning_step: 0,
                cur_interval: 0,
                last_review: now,
                next_review: now + self.first_step(),
            },
            (CardStatus::Learning, Answer::Good) => {
                let next_step = state.learning_step + 1;
                match self.steps.get(next_step as usize) {
                    Some(delay) => ReviewState {
                        status: CardStatus::Learning,
                        learning_step: next_step,
                        cur_interval: 0,
                        last_review: now,
                        next_review: now + delay,
                    },
                    // Last step passed: graduate
                    None => self.graduate(self.graduating_interval, now),
                }
            }
            (CardStatus::Learning, Answer::Easy) => self.graduate(self.easy_interval, now),
            // A lapse sends the card back to the start of the ladder
            (CardStatus::Review, Answer::Again) => ReviewState {
                status: CardStatus::Learning,
                learning_step: 0,
                cur_interval: 0,
                last_review: now,
                next_review: now + self.first_step(),
            },
            (CardStatus::Review, Answer::Good) => {
                let interval = self.grow(state.cur_interval, self.interval_multiplier);
                ReviewState {
                    status: CardStatus::Review,
                    learning_step: 0,
                    cur_interval: interval,
                    last_review: now,
                    next_review: now + interval,
                }
            }
            (CardStatus::Review, Answer::Easy) => {
                let interval =
                    self.grow(state.cur_interval, self.interval_multiplier * self.easy_bonus);
                ReviewState {
                    status: CardStatus::Review,
                    learning_step: 0,
                    cur_interval: interval,
                    last_review: now,
                    next_review: now + interval,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn policy() -> StepLadderPolicy {
        StepLadderPolicy::from_config(&ReviewConfig::default())
    }

    fn learning(step: i64) -> ReviewState {
        ReviewState {
            status: CardStatus::Learning,
            learning_step: step,
            cur_interval: 0,
            last_review: 0,
            next_review: 0,
        }
    }

    fn review(interval: i64) -> ReviewState {
        ReviewState {
            status: CardStatus::Review,
            learning_step: 0,
            cur_interval: interval,
            last_review: 0,
            next_review: 0,
        }
    }

    #[test]
    fn test_new_card_is_due() {
        let state = ReviewState::new_card();
        assert_eq!(state.status, CardStatus::Learning);
        assert_eq!(state.learning_step, 0);
        assert!(state.is_due(NOW));
    }

    #[test]
    fn test_good_advances_learning_ladder() {
        let next = policy().next_state(&learning(0), Answer::Good, NOW);
        assert_eq!(next.status, CardStatus::Learning);
        assert_eq!(next.learning_step, 1);
        // Second default step is 10 minutes
        assert_eq!(next.next_review, NOW + 600);
        assert!(!next.is_due(NOW));
    }

    #[test]
    fn test_again_resets_learning_ladder() {
        let next = policy().next_state(&learning(1), Answer::Again, NOW);
        assert_eq!(next.status, CardStatus::Learning);
        assert_eq!(next.learning_step, 0);
        assert_eq!(next.next_review, NOW + 60);
    }

    #[test]
    fn test_good_on_last_step_graduates() {
        let next = policy().next_state(&learning(1), Answer::Good, NOW);
        assert_eq!(next.status, CardStatus::Review);
        assert_eq!(next.cur_interval, 86_400);
        assert_eq!(next.next_review, NOW + 86_400);
        assert_eq!(next.last_review, NOW);
    }

    #[test]
    fn test_easy_graduates_immediately() {
        let next = policy().next_state(&learning(0), Answer::Easy, NOW);
        assert_eq!(next.status, CardStatus::Review);
        assert_eq!(next.cur_interval, 4 * 86_400);
    }

    #[test]
    fn test_good_grows_review_interval() {
        let next = policy().next_state(&review(86_400), Answer::Good, NOW);
        assert_eq!(next.status, CardStatus::Review);
        assert_eq!(next.cur_interval, 216_000); // 1 day * 2.5
        assert_eq!(next.next_review, NOW + 216_000);
    }

    #[test]
    fn test_easy_applies_bonus_on_review() {
        let good = policy().next_state(&review(86_400), Answer::Good, NOW);
        let easy = policy().next_state(&review(86_400), Answer::Easy, NOW);
        assert!(easy.cur_interval > good.cur_interval);
    }

    #[test]
    fn test_again_on_review_lapses_to_learning() {
        let next = policy().next_state(&review(10 * 86_400), Answer::Again, NOW);
        assert_eq!(next.status, CardStatus::Learning);
        assert_eq!(next.learning_step, 0);
        assert_eq!(next.cur_interval, 0);
        assert_eq!(next.next_review, NOW + 60);
    }

    #[test]
    fn test_interval_is_capped() {
        let config = ReviewConfig {
            max_interval_days: 10,
            ..ReviewConfig::default()
        };
        let policy = StepLadderPolicy::from_config(&config);

        let next = policy.next_state(&review(9 * 86_400), Answer::Good, NOW);
        assert_eq!(next.cur_interval, 10 * 86_400);
    }

    #[test]
    fn test_empty_ladder_falls_back_to_one_step() {
        let config = ReviewConfig {
            learning_steps_minutes: vec![],
            ..ReviewConfig::default()
        };
        let policy = StepLadderPolicy::from_config(&config);

        let next = policy.next_state(&learning(0), Answer::Again, NOW);
        assert_eq!(next.next_review, NOW + 60);
    }

    #[test]
    fn test_status_round_trips_through_strings() {
        assert_eq!(CardStatus::parse("LEARNING"), Some(CardStatus::Learning));
        assert_eq!(CardStatus::parse("REVIEW"), Some(CardStatus::Review));
        assert_eq!(CardStatus::parse("learning"), None);
        assert_eq!(CardStatus::Learning.as_str(), "LEARNING");
    }
}
