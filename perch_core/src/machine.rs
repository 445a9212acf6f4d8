// perch_core/src/machine.rs

//! The landing controller's finite-state skeleton.
//!
//! State selection is a pure lookup over `(current state, transition)`,
//! deliberately separated from the per-state behaviors in
//! [`crate::controller`]: the behaviors decide *which* transition to request,
//! this module alone decides *where* it leads.

use std::fmt;

/// The four operating modes of the landing controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandingState {
    /// Transit toward the goal.
    Goto,
    /// Climb or descend to the loiter height above the ground estimate.
    AltitudeChange,
    /// Hold position while landability evidence accumulates.
    Loiter,
    /// Committed descent. Terminal for this controller.
    Land,
}

impl fmt::Display for LandingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Goto => "GOTO",
            Self::AltitudeChange => "ALTITUDE_CHANGE",
            Self::Loiter => "LOITER",
            Self::Land => "LAND",
        };
        f.write_str(label)
    }
}

/// Outcome of running one state's behavior for a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Stay put.
    Repeat,
    /// First outgoing edge of the current state.
    Next1,
    /// Second outgoing edge of the current state.
    Next2,
    /// Abort: unconditional restart from GOTO.
    Error,
}

/// Pure transition lookup.
///
/// | from            | Next1           | Next2  |
/// |-----------------|-----------------|--------|
/// | Goto            | AltitudeChange  | Loiter |
/// | AltitudeChange  | Loiter          | —      |
/// | Loiter          | Land            | Goto   |
/// | Land            | —               | —      |
///
/// `Repeat` always holds the current state, `Error` always yields `Goto`,
/// and an edge a state does not define also holds the current state.
pub fn choose_next_state(current: LandingState, transition: Transition) -> LandingState {
    use LandingState::*;
    match (current, transition) {
        (_, Transition::Repeat) => current,
        (_, Transition::Error) => Goto,
        (Goto, Transition::Next1) => AltitudeChange,
        (Goto, Transition::Next2) => Loiter,
        (AltitudeChange, Transition::Next1) => Loiter,
        (Loiter, Transition::Next1) => Land,
        (Loiter, Transition::Next2) => Goto,
        // Land is terminal; AltitudeChange has a single outgoing edge.
        (AltitudeChange, Transition::Next2) | (Land, _) => current,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use LandingState::*;
    use Transition::*;

    const STATES: [LandingState; 4] = [Goto, AltitudeChange, Loiter, Land];

    #[test]
    fn repeat_holds_every_state() {
        for state in STATES {
            assert_eq!(choose_next_state(state, Repeat), state);
        }
    }

    #[test]
    fn error_restarts_from_goto_everywhere() {
        for state in STATES {
            assert_eq!(choose_next_state(state, Error), Goto);
        }
    }

    #[test]
    fn forward_edges_match_the_table() {
        assert_eq!(choose_next_state(Goto, Next1), AltitudeChange);
        assert_eq!(choose_next_state(Goto, Next2), Loiter);
        assert_eq!(choose_next_state(AltitudeChange, Next1), Loiter);
        assert_eq!(choose_next_state(Loiter, Next1), Land);
        assert_eq!(choose_next_state(Loiter, Next2), Goto);
    }

    #[test]
    fn land_is_terminal_and_undefined_edges_hold() {
        for transition in [Repeat, Next1, Next2] {
            assert_eq!(choose_next_state(Land, transition), Land);
        }
        assert_eq!(choose_next_state(AltitudeChange, Next2), AltitudeChange);
    }
}
