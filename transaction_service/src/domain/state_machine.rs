//! The legal transition graph of §4.4, extracted from the teacher's
//! inline status mutation in `ProcessTransactionUseCase` into a guard
//! function the repository-level `updateTransactionIfStatusIn` and the
//! saga both consult.

use crate::domain::entities::TransactionStatus;
use crate::domain::error::TransactionError;

/// Returns `Ok(())` if `from -> to` is a legal edge in §4.4's graph,
/// `Err(InvalidStateTransition)` otherwise. Terminal states admit no edges.
pub fn validate_transition(from: TransactionStatus, to: TransactionStatus) -> Result<(), TransactionError> {
    use TransactionStatus::*;

    let legal = matches!(
        (from, to),
        (Initiated, Debited)
            | (Initiated, Failed)
            | (Debited, Completed)
            | (Debited, Refunding)
            | (Refunding, Failed)
    );

    if legal {
        Ok(())
    } else {
        Err(TransactionError::InvalidStateTransition(format!(
            "{:?} -> {:?} is not a legal transition",
            from, to
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use TransactionStatus::*;

    #[test]
    fn happy_path_edges_are_legal() {
        assert!(validate_transition(Initiated, Debited).is_ok());
        assert!(validate_transition(Debited, Completed).is_ok());
    }

    #[test]
    fn compensation_edges_are_legal() {
        assert!(validate_transition(Initiated, Failed).is_ok());
        assert!(validate_transition(Debited, Refunding).is_ok());
        assert!(validate_transition(Refunding, Failed).is_ok());
    }

    #[test]
    fn terminal_states_admit_no_transitions() {
        assert!(validate_transition(Completed, Failed).is_err());
        assert!(validate_transition(Failed, Initiated).is_err());
    }

    #[test]
    fn credited_is_never_a_legal_target() {
        assert!(validate_transition(Initiated, Credited).is_err());
        assert!(validate_transition(Debited, Credited).is_err());
    }

    #[test]
    fn skipping_states_is_illegal() {
        assert!(validate_transition(Initiated, Completed).is_err());
        assert!(validate_transition(Initiated, Refunding).is_err());
    }
}
