use weft_diagnostic::{Diagnostic, ErrorCode};
use weft_engine::{same_as, Batch, Binding};
use weft_ir::Precedence;

/// Reports every word nothing else claimed as an unknown identifier.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct UnknownWord;

impl Binding for UnknownWord {
    fn precedence(&self) -> Precedence {
        Precedence::FALLBACK
    }

    fn is_same(&self, other: &dyn Binding) -> bool {
        same_as(self, other)
    }

    fn process(&self, batch: &mut Batch<'_>) {
        for &node in batch.nodes() {
            if !batch.tree().is_attached(node) {
                continue;
            }
            batch.error(
                Diagnostic::error(ErrorCode::E2001)
                    .with_message(format!("unknown identifier `{}`", batch.text(node)))
                    .with_label(batch.span(node), "not declared before this point"),
            );
        }
    }
}
