//! Coarse session state and hysteresis voting.

use std::fmt;

use serde::{Deserialize, Serialize};

use handpad_common::error::{HandpadError, HandpadResult};

use crate::check;

/// Coarse operating mode of the session.
///
/// The display labels keep the historical wording. In particular
/// `YChangingSizeStable` is "index finger moving vertically while the hand
/// size holds steady".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Initializing,
    HandAtRest,
    YChangingSizeStable,
    YStableSizeChanging,
    YChangingSizeChanging,
    HandOffSurface,
}

impl SessionState {
    pub const ALL: [SessionState; 6] = [
        SessionState::Initializing,
        SessionState::HandAtRest,
        SessionState::YChangingSizeStable,
        SessionState::YStableSizeChanging,
        SessionState::YChangingSizeChanging,
        SessionState::HandOffSurface,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SessionState::Initializing => "Initializing",
            SessionState::HandAtRest => "Hand at rest",
            SessionState::YChangingSizeStable => "Y changing, size stable",
            SessionState::YStableSizeChanging => "Y stable, size changing",
            SessionState::YChangingSizeChanging => "Y changing, size changing",
            SessionState::HandOffSurface => "Hand off surface",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds for the coarse state classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    /// Votes a candidate needs before it becomes the effective state.
    pub vote_threshold: u32,
    /// Index Y travel (pixels) that counts as vertical finger motion.
    pub threshold_y: f64,
    /// Hand-center movement (pixels); half of it counts as a moving hand.
    pub move_threshold: f64,
    /// Hand-center movement below which taps and holds are checked.
    pub stillness_threshold: f64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            vote_threshold: 3,
            threshold_y: 15.0,
            move_threshold: 20.0,
            stillness_threshold: 5.0,
        }
    }
}

impl StateConfig {
    pub fn validate(&self) -> HandpadResult<()> {
        if self.vote_threshold == 0 {
            return Err(HandpadError::config("state.vote_threshold must be > 0"));
        }
        check::positive("state.threshold_y", self.threshold_y)?;
        check::positive("state.move_threshold", self.move_threshold)?;
        check::positive("state.stillness_threshold", self.stillness_threshold)
    }
}

/// Anti-flicker voter over [`SessionState`] candidates.
///
/// Each frame the candidate gains a vote and every other state loses one
/// (floored at zero). The effective state only switches once the
/// candidate holds `threshold` votes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateVoter {
    votes: [u32; 6],
    threshold: u32,
    current: SessionState,
}

impl StateVoter {
    pub fn new(threshold: u32) -> Self {
        Self {
            votes: [0; 6],
            threshold: threshold.max(1),
            current: SessionState::Initializing,
        }
    }

    pub fn current(&self) -> SessionState {
        self.current
    }

    pub fn votes(&self, state: SessionState) -> u32 {
        self.votes[state.slot()]
    }

    /// Cast one vote. Returns the new state when the effective state changed.
    pub fn vote(&mut self, candidate: SessionState) -> Option<SessionState> {
        for state in SessionState::ALL {
            let slot = state.slot();
            if state == candidate {
                self.votes[slot] = self.votes[slot].saturating_add(1);
            } else {
                self.votes[slot] = self.votes[slot].saturating_sub(1);
            }
        }

        if self.votes[candidate.slot()] >= self.threshold && self.current != candidate {
            self.current = candidate;
            return Some(candidate);
        }
        None
    }

    /// Switch immediately, discarding accumulated votes.
    pub fn force(&mut self, state: SessionState) -> Option<SessionState> {
        self.votes = [0; 6];
        if self.current == state {
            return None;
        }
        self.current = state;
        Some(state)
    }

    /// Back to `Initializing` with no votes.
    pub fn reset(&mut self) {
        self.votes = [0; 6];
        self.current = SessionState::Initializing;
    }
}

impl Default for StateVoter {
    fn default() -> Self {
        Self::new(StateConfig::default().vote_threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(SessionState::HandAtRest.to_string(), "Hand at rest");
        assert_eq!(
            SessionState::YChangingSizeStable.to_string(),
            "Y changing, size stable"
        );
        assert_eq!(SessionState::HandOffSurface.label(), "Hand off surface");
    }

    #[test]
    fn test_switch_needs_threshold_votes() {
        let mut voter = StateVoter::new(3);
        assert_eq!(voter.vote(SessionState::HandAtRest), None);
        assert_eq!(voter.vote(SessionState::HandAtRest), None);
        assert_eq!(
            voter.vote(SessionState::HandAtRest),
            Some(SessionState::HandAtRest)
        );
        assert_eq!(voter.vote(SessionState::HandAtRest), None);
        assert_eq!(voter.current(), SessionState::HandAtRest);
    }

    #[test]
    fn test_single_spike_does_not_flip() {
        let mut voter = StateVoter::new(3);
        for _ in 0..5 {
            voter.vote(SessionState::HandAtRest);
        }
        assert_eq!(voter.vote(SessionState::YChangingSizeChanging), None);
        assert_eq!(voter.current(), SessionState::HandAtRest);
        for _ in 0..3 {
            voter.vote(SessionState::HandAtRest);
        }
        assert_eq!(voter.current(), SessionState::HandAtRest);
        assert_eq!(voter.votes(SessionState::YChangingSizeChanging), 0);
    }

    #[test]
    fn test_sustained_run_flips() {
        let mut voter = StateVoter::new(2);
        voter.vote(SessionState::HandAtRest);
        voter.vote(SessionState::HandAtRest);
        assert_eq!(voter.vote(SessionState::YStableSizeChanging), None);
        assert_eq!(
            voter.vote(SessionState::YStableSizeChanging),
            Some(SessionState::YStableSizeChanging)
        );
    }

    #[test]
    fn test_force_and_reset() {
        let mut voter = StateVoter::new(3);
        assert_eq!(
            voter.force(SessionState::HandOffSurface),
            Some(SessionState::HandOffSurface)
        );
        assert_eq!(voter.force(SessionState::HandOffSurface), None);
        voter.reset();
        assert_eq!(voter.current(), SessionState::Initializing);
        assert_eq!(voter.votes(SessionState::HandOffSurface), 0);
    }
}
