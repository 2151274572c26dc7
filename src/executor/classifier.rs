use serde::Serialize;

use crate::adapter::OutcomeSignal;
use crate::config::UnconfirmedPolicy;

/// Terminal classification of one batch item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Success,
    Failure { reason: String },
}

impl Verdict {
    pub fn failure(reason: impl Into<String>) -> Self {
        Verdict::Failure {
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Verdict::Success)
    }

    pub fn detail(&self) -> &str {
        match self {
            Verdict::Success => "ok",
            Verdict::Failure { reason } => reason,
        }
    }
}

/// What the confirmation window produced: an explicit signal, or nothing
/// plus the state of the action's input surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Signal(OutcomeSignal),
    Unconfirmed { input_surface_open: bool },
}

pub const NOT_FOUND_DETAIL: &str = "target does not exist on the platform";
pub const OTHER_ERROR_DETAIL: &str = "platform reported an error";
pub const NO_RESPONSE_DETAIL: &str = "no server response";

/// Pure decision procedure for one observed outcome. Precedence is
/// fixed: explicit success beats the domain error, which beats the
/// generic error, which beats the no-signal default path. Retrying is a
/// caller concern; nothing here re-runs the action.
pub fn classify(observation: Observation, policy: UnconfirmedPolicy) -> Verdict {
    match observation {
        Observation::Signal(OutcomeSignal::ConfirmedSuccess) => Verdict::Success,
        Observation::Signal(OutcomeSignal::ConfirmedNotFound) => {
            Verdict::failure(NOT_FOUND_DETAIL)
        }
        Observation::Signal(OutcomeSignal::ConfirmedOtherError) => {
            Verdict::failure(OTHER_ERROR_DETAIL)
        }
        Observation::Signal(OutcomeSignal::NoSignal) => {
            // Callers polling signals short-circuit on non-NoSignal; a
            // NoSignal handed in directly takes the unconfirmed path
            // with the surface assumed closed.
            classify(
                Observation::Unconfirmed {
                    input_surface_open: false,
                },
                policy,
            )
        }
        Observation::Unconfirmed { input_surface_open } => match policy {
            UnconfirmedPolicy::Optimistic if !input_surface_open => Verdict::Success,
            _ => Verdict::failure(NO_RESPONSE_DETAIL),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_success_always_wins() {
        for policy in [UnconfirmedPolicy::Optimistic, UnconfirmedPolicy::Pessimistic] {
            let verdict = classify(Observation::Signal(OutcomeSignal::ConfirmedSuccess), policy);
            assert!(verdict.is_success());
        }
    }

    #[test]
    fn domain_error_maps_to_not_found_detail() {
        let verdict = classify(
            Observation::Signal(OutcomeSignal::ConfirmedNotFound),
            UnconfirmedPolicy::Optimistic,
        );
        assert_eq!(verdict, Verdict::failure(NOT_FOUND_DETAIL));
    }

    #[test]
    fn generic_error_maps_to_other_detail() {
        let verdict = classify(
            Observation::Signal(OutcomeSignal::ConfirmedOtherError),
            UnconfirmedPolicy::Optimistic,
        );
        assert_eq!(verdict, Verdict::failure(OTHER_ERROR_DETAIL));
    }

    #[test]
    fn unconfirmed_with_closed_surface_is_optimistic_success() {
        let verdict = classify(
            Observation::Unconfirmed {
                input_surface_open: false,
            },
            UnconfirmedPolicy::Optimistic,
        );
        assert!(verdict.is_success());
    }

    #[test]
    fn unconfirmed_with_open_surface_downgrades_to_failure() {
        let verdict = classify(
            Observation::Unconfirmed {
                input_surface_open: true,
            },
            UnconfirmedPolicy::Optimistic,
        );
        assert_eq!(verdict, Verdict::failure(NO_RESPONSE_DETAIL));
    }

    #[test]
    fn pessimistic_policy_never_assumes_success() {
        let verdict = classify(
            Observation::Unconfirmed {
                input_surface_open: false,
            },
            UnconfirmedPolicy::Pessimistic,
        );
        assert_eq!(verdict, Verdict::failure(NO_RESPONSE_DETAIL));
    }
}
