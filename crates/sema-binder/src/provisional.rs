//! Provisional contexts for speculative typing.
//!
//! A consumer that wants to try a typing (e.g. an overload candidate) pushes
//! a frame, assigns types with `set_symbol_type`, and pops the frame with
//! either `Commit` or `Abandon`. Types assigned under a frame are always
//! reset on pop; diagnostics raised under it survive only a commit.

use crate::chain::SemanticInfoChain;
use crate::errors::{BindResult, BinderError};
use crate::ids::{SymbolId, UnitId};
use crate::symbol::{ResolutionState, SymbolKind};
use sema_common::Diagnostic;
use tracing::trace;

/// How a provisional frame ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProvisionalOutcome {
    /// Promote buffered diagnostics to the enclosing frame or their unit.
    Commit,
    /// Drop buffered diagnostics.
    Abandon,
}

#[derive(Debug, Default)]
pub(crate) struct ProvisionalFrame {
    /// Symbols typed while this frame was innermost.
    pub typed: Vec<SymbolId>,
    pub diagnostics: Vec<(UnitId, Diagnostic)>,
    pub had_provisional_errors: bool,
}

impl SemanticInfoChain {
    pub fn push_provisional(&mut self) {
        self.provisional.push(ProvisionalFrame::default());
        trace!(depth = self.provisional.len(), "provisional frame pushed");
    }

    /// Pop the innermost frame. Returns whether any diagnostic was raised
    /// under it.
    pub fn pop_provisional(&mut self, outcome: ProvisionalOutcome) -> BindResult<bool> {
        let frame = self.provisional.pop().ok_or(BinderError::NoProvisionalContext)?;
        for symbol in frame.typed {
            if let Some(s) = self.symbols.get_mut(symbol) {
                s.type_id = SymbolId::NONE;
                s.resolution = ResolutionState::Unresolved;
            }
        }
        if outcome == ProvisionalOutcome::Commit {
            for (unit, diagnostic) in frame.diagnostics {
                self.add_diagnostic(unit, diagnostic);
            }
        }
        trace!(depth = self.provisional.len(), ?outcome, "provisional frame popped");
        Ok(frame.had_provisional_errors)
    }

    pub fn in_provisional(&self) -> bool {
        !self.provisional.is_empty()
    }

    /// Whether the innermost frame has buffered a diagnostic so far.
    pub fn had_provisional_errors(&self) -> bool {
        self.provisional.last().is_some_and(|f| f.had_provisional_errors)
    }

    /// Assign the type of a value symbol. Under a provisional frame the
    /// assignment is undone when the frame pops.
    pub fn set_symbol_type(&mut self, symbol: SymbolId, ty: SymbolId) -> BindResult<()> {
        let s = self.symbol_mut(symbol)?;
        if s.kind == SymbolKind::Reference {
            return Err(BinderError::ReadOnlyReference(symbol));
        }
        s.type_id = ty;
        s.resolution = ResolutionState::Resolved;
        self.note_typed(symbol);
        Ok(())
    }

    /// Remember that `symbol` got its type under the innermost frame.
    pub(crate) fn note_typed(&mut self, symbol: SymbolId) {
        if let Some(frame) = self.provisional.last_mut() {
            frame.typed.push(symbol);
        }
    }
}
