//! Selection and prediction lifecycle.
//!
//! A click moves the machine to `Selecting` and mints a fresh
//! [`RequestToken`]. Gateway replies are applied with
//! [`SelectionMachine::complete`], which accepts a reply only if its token
//! is still the one being waited on. Replies can arrive in any order
//! relative to clicks; anything carrying an older token is a
//! [`StaleResult`] and leaves the state untouched.
//!
//! ```text
//! Idle ──select──▶ Selecting ──ok──▶ Resolved ──dismiss──▶ Idle
//!                    ▲   │                │
//!                    │   └──err──▶ Failed ┴──dismiss──▶ Idle
//!                    └──select (from any state)
//! ```

use road_risk_gateway::{GatewayError, GatewayErrorKind};
use road_risk_models::{Coordinate, PredictionResult};
use strum_macros::{AsRefStr, Display};

/// Identifies one prediction request. Only the most recently minted token
/// is ever current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why the current prediction failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Network or response failure.
    pub kind: GatewayErrorKind,
    /// Human-readable cause shown in the panel.
    pub message: String,
}

impl From<&GatewayError> for Failure {
    fn from(e: &GatewayError) -> Self {
        Self {
            kind: e.kind(),
            message: e.user_message(),
        }
    }
}

/// Current selection.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionState {
    /// Nothing selected.
    Idle,
    /// A coordinate was clicked and its prediction is in flight.
    Selecting {
        /// Clicked location.
        coordinate: Coordinate,
        /// Request being waited on.
        token: RequestToken,
    },
    /// The prediction for the current coordinate is available.
    Resolved {
        /// Clicked location.
        coordinate: Coordinate,
        /// Request that produced `prediction`.
        token: RequestToken,
        /// The prediction.
        prediction: PredictionResult,
        /// Report collapsed by the user without discarding it.
        minimized: bool,
    },
    /// The prediction request for the current coordinate failed.
    Failed {
        /// Clicked location.
        coordinate: Coordinate,
        /// Request that failed.
        token: RequestToken,
        /// Cause.
        failure: Failure,
    },
}

/// Discriminant of [`SelectionState`], for logging and quick checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum Phase {
    /// See [`SelectionState::Idle`].
    Idle,
    /// See [`SelectionState::Selecting`].
    Selecting,
    /// See [`SelectionState::Resolved`].
    Resolved,
    /// See [`SelectionState::Failed`].
    Failed,
}

impl SelectionState {
    /// Which phase this state is in.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        match self {
            Self::Idle => Phase::Idle,
            Self::Selecting { .. } => Phase::Selecting,
            Self::Resolved { .. } => Phase::Resolved,
            Self::Failed { .. } => Phase::Failed,
        }
    }

    /// The selected coordinate, if any.
    #[must_use]
    pub const fn coordinate(&self) -> Option<Coordinate> {
        match self {
            Self::Idle => None,
            Self::Selecting { coordinate, .. }
            | Self::Resolved { coordinate, .. }
            | Self::Failed { coordinate, .. } => Some(*coordinate),
        }
    }

    /// The token of the current request, if any.
    #[must_use]
    pub const fn token(&self) -> Option<RequestToken> {
        match self {
            Self::Idle => None,
            Self::Selecting { token, .. }
            | Self::Resolved { token, .. }
            | Self::Failed { token, .. } => Some(*token),
        }
    }

    /// The current prediction, if resolved.
    #[must_use]
    pub const fn prediction(&self) -> Option<&PredictionResult> {
        match self {
            Self::Resolved { prediction, .. } => Some(prediction),
            _ => None,
        }
    }
}

/// Outcome of applying the current request's reply.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Moved to `Resolved`.
    Resolved,
    /// Moved to `Failed`.
    Failed(Failure),
}

/// A reply that belongs to a superseded selection. Never shown to the
/// user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("discarded stale result for request {token} (current: {current:?})")]
pub struct StaleResult {
    /// Token the reply carried.
    pub token: RequestToken,
    /// Token currently awaited, if any.
    pub current: Option<RequestToken>,
}

/// Owns the selection state and the token counter.
#[derive(Debug)]
pub struct SelectionMachine {
    state: SelectionState,
    last_token: u64,
}

impl Default for SelectionMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionMachine {
    /// Creates an idle machine.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: SelectionState::Idle,
            last_token: 0,
        }
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &SelectionState {
        &self.state
    }

    /// Records `coordinate` as the selection and returns the token its
    /// prediction reply must carry. Supersedes whatever was current.
    pub fn select(&mut self, coordinate: Coordinate) -> RequestToken {
        self.last_token += 1;
        let token = RequestToken(self.last_token);

        log::debug!(
            "{} -> Selecting {token} at {coordinate}",
            self.state.phase()
        );

        self.state = SelectionState::Selecting { coordinate, token };
        token
    }

    /// Applies a gateway reply.
    ///
    /// # Errors
    ///
    /// Returns [`StaleResult`] if `token` is not the request currently
    /// being waited on; the state is left unchanged.
    pub fn complete(
        &mut self,
        token: RequestToken,
        result: Result<PredictionResult, GatewayError>,
    ) -> Result<Transition, StaleResult> {
        let coordinate = match &self.state {
            SelectionState::Selecting {
                coordinate,
                token: current,
            } if *current == token => *coordinate,
            other => {
                return Err(StaleResult {
                    token,
                    current: other.token(),
                });
            }
        };

        match result {
            Ok(prediction) => {
                log::debug!(
                    "Selecting {token} -> Resolved ({} {})",
                    prediction.risk_level,
                    prediction.confidence_text()
                );
                self.state = SelectionState::Resolved {
                    coordinate,
                    token,
                    prediction,
                    minimized: false,
                };
                Ok(Transition::Resolved)
            }
            Err(e) => {
                log::debug!("Selecting {token} -> Failed: {e}");
                let failure = Failure::from(&e);
                self.state = SelectionState::Failed {
                    coordinate,
                    token,
                    failure: failure.clone(),
                };
                Ok(Transition::Failed(failure))
            }
        }
    }

    /// Clears the selection. Only acts in `Resolved` or `Failed`; returns
    /// `false` (and does nothing) otherwise.
    pub fn dismiss(&mut self) -> bool {
        match self.state.phase() {
            Phase::Resolved | Phase::Failed => {
                log::debug!("{} -> Idle (dismissed)", self.state.phase());
                self.state = SelectionState::Idle;
                true
            }
            Phase::Idle | Phase::Selecting => false,
        }
    }

    /// Collapses a resolved report while keeping it. Returns `false` if
    /// there is no expanded report.
    pub fn minimize(&mut self) -> bool {
        self.set_minimized(true)
    }

    /// Re-expands a minimized report. Returns `false` if there is no
    /// minimized report.
    pub fn restore(&mut self) -> bool {
        self.set_minimized(false)
    }

    fn set_minimized(&mut self, value: bool) -> bool {
        match &mut self.state {
            SelectionState::Resolved { minimized, .. } if *minimized != value => {
                *minimized = value;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use road_risk_models::RiskLevel;

    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn prediction(level: RiskLevel, score: f64) -> PredictionResult {
        PredictionResult {
            risk_level: level,
            risk_score: score,
            explanation: None,
            recommendation: None,
        }
    }

    fn network_error() -> GatewayError {
        GatewayError::Network {
            message: "connection refused".to_string(),
        }
    }

    #[test]
    fn select_then_resolve() {
        let mut machine = SelectionMachine::new();
        let token = machine.select(coord(28.6139, 77.209));
        assert_eq!(machine.state().phase(), Phase::Selecting);

        let transition = machine
            .complete(token, Ok(prediction(RiskLevel::High, 0.82)))
            .unwrap();
        assert_eq!(transition, Transition::Resolved);
        assert_eq!(machine.state().phase(), Phase::Resolved);
        assert_eq!(
            machine.state().prediction().unwrap().risk_level,
            RiskLevel::High
        );
    }

    #[test]
    fn tokens_are_unique_and_increasing() {
        let mut machine = SelectionMachine::new();
        let a = machine.select(coord(1.0, 1.0));
        let b = machine.select(coord(1.0, 1.0));
        assert!(b > a);
    }

    #[test]
    fn late_reply_for_earlier_click_is_discarded() {
        let mut machine = SelectionMachine::new();
        let a = machine.select(coord(10.0, 10.0));
        let b = machine.select(coord(20.0, 20.0));

        machine
            .complete(b, Ok(prediction(RiskLevel::Low, 0.2)))
            .unwrap();
        let stale = machine
            .complete(a, Ok(prediction(RiskLevel::High, 0.9)))
            .unwrap_err();

        assert_eq!(stale.token, a);
        assert_eq!(stale.current, Some(b));
        assert_eq!(machine.state().coordinate(), Some(coord(20.0, 20.0)));
        assert_eq!(
            machine.state().prediction().unwrap().risk_level,
            RiskLevel::Low
        );
    }

    #[test]
    fn stale_failure_does_not_overwrite_pending_selection() {
        let mut machine = SelectionMachine::new();
        let a = machine.select(coord(10.0, 10.0));
        let b = machine.select(coord(20.0, 20.0));

        assert!(machine.complete(a, Err(network_error())).is_err());
        assert_eq!(
            machine.state(),
            &SelectionState::Selecting {
                coordinate: coord(20.0, 20.0),
                token: b
            }
        );
    }

    #[test]
    fn failure_carries_kind_and_message() {
        let mut machine = SelectionMachine::new();
        let token = machine.select(coord(0.0, 0.0));
        let transition = machine.complete(token, Err(network_error())).unwrap();

        let Transition::Failed(failure) = transition else {
            panic!("expected failure");
        };
        assert_eq!(failure.kind, GatewayErrorKind::Network);
        assert!(failure.message.contains("connection refused"));
        assert_eq!(machine.state().phase(), Phase::Failed);
    }

    #[test]
    fn duplicate_reply_is_stale() {
        let mut machine = SelectionMachine::new();
        let token = machine.select(coord(0.0, 0.0));
        machine
            .complete(token, Ok(prediction(RiskLevel::Medium, 0.5)))
            .unwrap();
        assert!(machine.complete(token, Err(network_error())).is_err());
        assert_eq!(machine.state().phase(), Phase::Resolved);
    }

    #[test]
    fn dismiss_only_from_resolved_or_failed() {
        let mut machine = SelectionMachine::new();
        assert!(!machine.dismiss());

        let token = machine.select(coord(0.0, 0.0));
        assert!(!machine.dismiss());
        assert_eq!(machine.state().phase(), Phase::Selecting);

        machine.complete(token, Err(network_error())).unwrap();
        assert!(machine.dismiss());
        assert_eq!(machine.state(), &SelectionState::Idle);

        let token = machine.select(coord(0.0, 0.0));
        machine
            .complete(token, Ok(prediction(RiskLevel::Low, 0.1)))
            .unwrap();
        assert!(machine.dismiss());
        assert_eq!(machine.state(), &SelectionState::Idle);
    }

    #[test]
    fn reply_after_dismiss_is_stale() {
        let mut machine = SelectionMachine::new();
        let a = machine.select(coord(0.0, 0.0));
        machine.complete(a, Err(network_error())).unwrap();
        machine.dismiss();

        assert!(machine.complete(a, Ok(prediction(RiskLevel::High, 0.9))).is_err());
        assert_eq!(machine.state(), &SelectionState::Idle);
    }

    #[test]
    fn minimize_and_restore_keep_prediction() {
        let mut machine = SelectionMachine::new();
        assert!(!machine.minimize());

        let token = machine.select(coord(0.0, 0.0));
        assert!(!machine.minimize());
        machine
            .complete(token, Ok(prediction(RiskLevel::High, 0.9)))
            .unwrap();

        assert!(machine.minimize());
        assert!(!machine.minimize());
        assert!(machine.state().prediction().is_some());
        assert!(machine.restore());
        assert!(!machine.restore());
    }

    #[test]
    fn new_click_replaces_resolved_report() {
        let mut machine = SelectionMachine::new();
        let a = machine.select(coord(0.0, 0.0));
        machine
            .complete(a, Ok(prediction(RiskLevel::High, 0.9)))
            .unwrap();

        machine.select(coord(5.0, 5.0));
        assert_eq!(machine.state().phase(), Phase::Selecting);
        assert!(machine.state().prediction().is_none());
    }
}
