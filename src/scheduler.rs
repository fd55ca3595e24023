use crate::clock::{Clock, DAY_MS};

/// Lowest easiness factor an item can reach
pub const MIN_EF: f64 = 1.3;

/// Easiness factor of an item that has never been graded
pub const DEFAULT_EF: f64 = 2.5;

/// Grades at or above this count as a successful recall
pub const PASSING_GRADE: i64 = 3;

/// Longest interval in days; imported state can carry anything
pub const MAX_INTERVAL: i64 = 36_500;

/// Scheduling fields produced by one review
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchedulingState {
    pub ef: f64,
    pub interval: i64,
    pub reps: i64,
    pub due: i64,
}

impl Default for SchedulingState {
    fn default() -> Self {
        Self {
            ef: DEFAULT_EF,
            interval: 0,
            reps: 0,
            due: 0,
        }
    }
}

/// Outcome of a multiple-choice answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizOutcome {
    Correct,
    Wrong,
}

impl QuizOutcome {
    /// Grade recorded for this outcome
    pub fn grade(self, correct_grade: i64, wrong_grade: i64) -> i64 {
        match self {
            QuizOutcome::Correct => correct_grade,
            QuizOutcome::Wrong => wrong_grade,
        }
    }
}

/// Compute the next scheduling state for a review graded `grade` at `now_ms`.
///
/// Simplified SM-2: grades are clamped to 0..=5, a failing grade resets the
/// streak to a one-day interval, and passing grades step 1 → 3 → `interval * ef`
/// days. The interval step uses the easiness factor from *before* this review.
/// Intervals stay within `1..=MAX_INTERVAL` and the other fields saturate, so
/// out-of-range input still yields a usable state.
pub fn next_state(grade: i64, previous: &SchedulingState, now_ms: i64) -> SchedulingState {
    let q = grade.clamp(0, 5);

    let (interval, reps) = if q < PASSING_GRADE {
        (1, 0)
    } else {
        let interval = match previous.reps {
            0 => 1,
            1 => 3,
            _ => (previous.interval as f64 * previous.ef).round() as i64,
        };
        (interval.clamp(1, MAX_INTERVAL), previous.reps.saturating_add(1))
    };

    // EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
    let miss = (5 - q) as f64;
    let ef = (previous.ef + (0.1 - miss * (0.08 + miss * 0.02))).max(MIN_EF);

    SchedulingState {
        ef,
        interval,
        reps,
        due: now_ms.saturating_add(interval * DAY_MS),
    }
}

/// Scheduler reading the time from an injected clock
pub struct Scheduler<C: Clock> {
    clock: C,
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    /// Schedule an item after a review, returning the new state
    pub fn schedule(&self, grade: i64, previous: &SchedulingState) -> SchedulingState {
        next_state(grade, previous, self.clock.now_ms())
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }
}
