//! Per-call pipeline state.
//!
//! Every create, derive or verify call walks a short state machine. The
//! state is local to the call; nothing is shared between calls.

use std::fmt;

use tracing::{debug, warn};

use crate::error::Result;
use crate::suite::{CryptosuiteKind, SuiteId};

/// Stage of one proof operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Idle,
    ConfiguringProof,
    Transforming,
    Hashing,
    Serializing,
    Verifying,
    Done,
    Failed,
}

impl PipelineState {
    /// Whether `self -> next` is a legal step. Any live state may fail, and
    /// a verification may conclude early once it has started.
    pub fn can_advance_to(self, next: PipelineState) -> bool {
        use PipelineState::*;
        match (self, next) {
            (Done | Failed, _) => false,
            (_, Failed) => true,
            (Idle, Done) => false,
            (_, Done) => true,
            (Idle, ConfiguringProof)
            | (ConfiguringProof, Transforming)
            | (Transforming, Hashing)
            | (Transforming, Serializing)
            | (Hashing, Serializing)
            | (Hashing, Verifying) => true,
            _ => false,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::ConfiguringProof => "configuring-proof",
            Self::Transforming => "transforming",
            Self::Hashing => "hashing",
            Self::Serializing => "serializing",
            Self::Verifying => "verifying",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Tracks the stages of a single call.
#[derive(Debug)]
pub(crate) struct Pipeline {
    suite: SuiteId,
    kind: CryptosuiteKind,
    state: PipelineState,
}

impl Pipeline {
    pub(crate) fn new(suite: SuiteId, kind: CryptosuiteKind) -> Self {
        Self {
            suite,
            kind,
            state: PipelineState::Idle,
        }
    }

    pub(crate) fn enter(&mut self, next: PipelineState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal pipeline step {} -> {}",
            self.state,
            next
        );
        debug!(
            suite = %self.suite,
            kind = ?self.kind,
            from = %self.state,
            to = %next,
            "pipeline step"
        );
        self.state = next;
    }

    /// Close the pipeline with the call's outcome.
    pub(crate) fn finish<T>(&mut self, result: Result<T>) -> Result<T> {
        match &result {
            Ok(_) => self.enter(PipelineState::Done),
            Err(e) => {
                warn!(
                    suite = %self.suite,
                    kind = ?self.kind,
                    stage = %self.state,
                    code = %e.code(),
                    error = %e,
                    "proof operation failed"
                );
                self.enter(PipelineState::Failed);
            }
        }
        result
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> PipelineState {
        self.state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProofError;

    #[test]
    fn test_base_create_path() {
        let mut pipeline = Pipeline::new(SuiteId::EddsaRdfc2022, CryptosuiteKind::Base);
        for next in [
            PipelineState::ConfiguringProof,
            PipelineState::Transforming,
            PipelineState::Hashing,
            PipelineState::Serializing,
        ] {
            pipeline.enter(next);
        }
        assert_eq!(pipeline.finish(Ok(1)).unwrap(), 1);
        assert_eq!(pipeline.state(), PipelineState::Done);
    }

    #[test]
    fn test_failure_is_terminal() {
        let mut pipeline = Pipeline::new(SuiteId::EcdsaSd2023, CryptosuiteKind::Derive);
        pipeline.enter(PipelineState::ConfiguringProof);
        let result: Result<()> = pipeline.finish(Err(ProofError::Decode("bad".into())));
        assert!(result.is_err());
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert!(pipeline.state().is_terminal());
    }

    #[test]
    fn test_transitions() {
        use PipelineState::*;
        assert!(Idle.can_advance_to(ConfiguringProof));
        assert!(Hashing.can_advance_to(Verifying));
        assert!(Transforming.can_advance_to(Serializing));
        assert!(Verifying.can_advance_to(Failed));
        assert!(ConfiguringProof.can_advance_to(Done));
        assert!(!Idle.can_advance_to(Done));
        assert!(!Idle.can_advance_to(Hashing));
        assert!(!Done.can_advance_to(Failed));
        assert!(!Serializing.can_advance_to(Verifying));
    }
}
