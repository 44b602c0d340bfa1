use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Session, Target, TargetType};

/// Coarse health of a target or of a whole session.
///
/// Variants are declared in ascending severity so that `Ord` gives
/// `Error > Pending > Ok`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Pending,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Ok => "ok",
            Status::Pending => "pending",
            Status::Error => "error",
        };
        f.pad(s)
    }
}

/// Status of a single target.
///
/// Targets with no state set at all are `Pending`: Tilt has registered them
/// but not reported on them yet.
pub fn target_status(target: &Target) -> Status {
    let state = &target.state;

    if let Some(terminated) = &state.terminated {
        if terminated.error.as_deref().is_some_and(|e| !e.is_empty()) {
            return Status::Error;
        }
    }

    if state.waiting.is_some() {
        return Status::Pending;
    }

    if let Some(active) = &state.active {
        // Builds and jobs are only done once they terminate
        return match target.target_type {
            TargetType::Update | TargetType::Job => Status::Pending,
            _ if active.ready => Status::Ok,
            _ => Status::Pending,
        };
    }

    if state.terminated.is_some() {
        return Status::Ok;
    }

    Status::Pending
}

/// Most severe status across the session's targets; `Ok` when there are none.
pub fn aggregate_status(session: &Session) -> Status {
    session
        .targets()
        .iter()
        .map(target_status)
        .max()
        .unwrap_or(Status::Ok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilt::{
        SessionStatus, TargetState, TargetStateActive, TargetStateTerminated, TargetStateWaiting,
    };
    use proptest::prelude::*;

    fn session_of(targets: Vec<Target>) -> Session {
        Session {
            status: Some(SessionStatus {
                targets,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn ok_target(name: &str) -> Target {
        Target {
            target_type: TargetType::Server,
            state: TargetState {
                active: Some(TargetStateActive {
                    ready: true,
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Target::new(name)
        }
    }

    fn pending_target(name: &str) -> Target {
        Target {
            state: TargetState {
                waiting: Some(TargetStateWaiting {
                    wait_reason: "waiting-for-dependencies".to_string(),
                }),
                ..Default::default()
            },
            ..Target::new(name)
        }
    }

    fn error_target(name: &str) -> Target {
        Target {
            target_type: TargetType::Update,
            state: TargetState {
                terminated: Some(TargetStateTerminated {
                    error: Some("docker build failed".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Target::new(name)
        }
    }

    #[test]
    fn test_severity_order() {
        assert!(Status::Error > Status::Pending);
        assert!(Status::Pending > Status::Ok);
        assert_eq!(Status::Pending.to_string(), "pending");
    }

    #[test]
    fn test_unknown_state_is_pending() {
        assert_eq!(target_status(&Target::new("api")), Status::Pending);
    }

    #[test]
    fn test_terminated_without_error_is_ok() {
        let mut target = error_target("api:update");
        target.state.terminated.as_mut().unwrap().error = Some(String::new());
        assert_eq!(target_status(&target), Status::Ok);

        target.state.terminated.as_mut().unwrap().error = None;
        assert_eq!(target_status(&target), Status::Ok);
    }

    #[test]
    fn test_active_server_waits_for_ready() {
        let mut target = ok_target("api:runtime");
        assert_eq!(target_status(&target), Status::Ok);

        target.state.active.as_mut().unwrap().ready = false;
        assert_eq!(target_status(&target), Status::Pending);
    }

    #[test]
    fn test_active_build_is_pending() {
        let mut target = ok_target("api:update");
        target.target_type = TargetType::Update;
        assert_eq!(target_status(&target), Status::Pending);
    }

    #[test]
    fn test_error_wins_over_other_fields() {
        let mut target = error_target("web");
        target.state.waiting = pending_target("web").state.waiting;
        assert_eq!(target_status(&target), Status::Error);
    }

    #[test]
    fn test_aggregate_ok_and_error() {
        let session = session_of(vec![ok_target("api"), error_target("web")]);
        assert_eq!(aggregate_status(&session), Status::Error);
    }

    #[test]
    fn test_aggregate_ok_and_pending() {
        let session = session_of(vec![ok_target("api"), pending_target("web")]);
        assert_eq!(aggregate_status(&session), Status::Pending);
    }

    #[test]
    fn test_aggregate_empty_is_ok() {
        assert_eq!(aggregate_status(&session_of(Vec::new())), Status::Ok);
        assert_eq!(aggregate_status(&Session::default()), Status::Ok);
    }

    fn arb_target() -> impl Strategy<Value = Target> {
        let target_type = prop_oneof![
            Just(TargetType::Update),
            Just(TargetType::Server),
            Just(TargetType::Job),
            Just(TargetType::Unknown),
        ];
        let waiting = proptest::option::of(".{0,8}".prop_map(|wait_reason| TargetStateWaiting {
            wait_reason,
        }));
        let active = proptest::option::of(any::<bool>().prop_map(|ready| TargetStateActive {
            ready,
            ..Default::default()
        }));
        let terminated = proptest::option::of(proptest::option::of(".{0,8}").prop_map(|error| {
            TargetStateTerminated {
                error,
                ..Default::default()
            }
        }));
        (
            "[a-z]{1,6}",
            proptest::collection::vec("[a-z]{1,6}", 0..3),
            target_type,
            waiting,
            active,
            terminated,
        )
            .prop_map(|(name, resources, target_type, waiting, active, terminated)| Target {
                name,
                resources,
                target_type,
                state: TargetState {
                    waiting,
                    active,
                    terminated,
                },
            })
    }

    proptest! {
        #[test]
        fn prop_aggregate_is_max_target_status(targets in proptest::collection::vec(arb_target(), 0..12)) {
            let expected = targets.iter().map(target_status).fold(Status::Ok, Ord::max);
            prop_assert_eq!(aggregate_status(&session_of(targets)), expected);
        }

        #[test]
        fn prop_adding_error_never_lowers(targets in proptest::collection::vec(arb_target(), 0..12)) {
            let before = aggregate_status(&session_of(targets.clone()));
            let mut more = targets;
            more.push(error_target("broken"));
            let after = aggregate_status(&session_of(more));
            prop_assert!(after >= before);
            prop_assert_eq!(after, Status::Error);
        }

        #[test]
        fn prop_target_status_is_total(target in arb_target()) {
            let status = target_status(&target);
            prop_assert!(matches!(status, Status::Ok | Status::Pending | Status::Error));
        }

        #[test]
        fn prop_aggregate_is_idempotent(targets in proptest::collection::vec(arb_target(), 0..12)) {
            let session = session_of(targets);
            prop_assert_eq!(aggregate_status(&session), aggregate_status(&session));
        }
    }
}
