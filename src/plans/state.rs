//! # Plan state machine.
//!
//! ```text
//! Created ─► Approved ─► Running ─┬─► InterruptRequested ─┬─► Interrupted ─► Canceled
//!                                 │          ▲ (idem)     ├─► Error ───────► Canceled
//!                                 ├─► Error  └────────────┘─► Success
//!                                 └─► Success
//! Success ─► Success, Canceled ─► Canceled, Error ─► Error     (terminal no-ops)
//! ```
//!
//! Every pair outside this table is illegal. Self transitions are accepted but change
//! nothing and are never persisted.

use std::fmt;

/// Lifecycle state of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlanState {
    Created,
    Approved,
    Running,
    InterruptRequested,
    Interrupted,
    Error,
    Success,
    Canceled,
}

impl PlanState {
    /// Every state, in lifecycle order.
    pub const ALL: [PlanState; 8] = [
        PlanState::Created,
        PlanState::Approved,
        PlanState::Running,
        PlanState::InterruptRequested,
        PlanState::Interrupted,
        PlanState::Error,
        PlanState::Success,
        PlanState::Canceled,
    ];

    /// True when `self → to` is in the legal transition table.
    pub const fn can_transition(self, to: PlanState) -> bool {
        use PlanState::*;
        matches!(
            (self, to),
            (Created, Approved)
                | (Approved, Running)
                | (Running, InterruptRequested | Error | Success)
                | (
                    InterruptRequested,
                    InterruptRequested | Interrupted | Error | Success
                )
                | (Interrupted, Canceled)
                | (Error, Canceled | Error)
                | (Success, Success)
                | (Canceled, Canceled)
        )
    }

    /// Success, Canceled and Error. Error still accepts Canceled.
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            PlanState::Success | PlanState::Canceled | PlanState::Error
        )
    }

    /// A worker may still be executing the plan.
    pub const fn is_in_flight(self) -> bool {
        matches!(self, PlanState::Running | PlanState::InterruptRequested)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            PlanState::Created => "CREATED",
            PlanState::Approved => "APPROVED",
            PlanState::Running => "RUNNING",
            PlanState::InterruptRequested => "INTERRUPT_REQUESTED",
            PlanState::Interrupted => "INTERRUPTED",
            PlanState::Error => "ERROR",
            PlanState::Success => "SUCCESS",
            PlanState::Canceled => "CANCELED",
        }
    }
}

impl fmt::Display for PlanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legal_table_is_exact() {
        use PlanState::*;
        let legal = [
            (Created, Approved),
            (Approved, Running),
            (Running, InterruptRequested),
            (Running, Error),
            (Running, Success),
            (InterruptRequested, InterruptRequested),
            (InterruptRequested, Interrupted),
            (InterruptRequested, Error),
            (InterruptRequested, Success),
            (Interrupted, Canceled),
            (Error, Canceled),
            (Error, Error),
            (Success, Success),
            (Canceled, Canceled),
        ];
        for from in PlanState::ALL {
            for to in PlanState::ALL {
                assert_eq!(
                    from.can_transition(to),
                    legal.contains(&(from, to)),
                    "{from} -> {to}"
                );
            }
        }
    }

    #[test]
    fn test_in_flight_states_are_not_terminal() {
        for s in PlanState::ALL {
            if s.is_in_flight() {
                assert!(!s.is_terminal());
            }
        }
        assert!(!PlanState::Interrupted.is_terminal());
    }
}
