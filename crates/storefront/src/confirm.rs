//! Confirmation seam for destructive or irreversible actions.

/// Asks the user to confirm an action. Returning `false` aborts it before
/// any request is sent.
pub trait Confirm: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Confirms everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        true
    }
}

/// Declines everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&self, _prompt: &str) -> bool {
        false
    }
}

/// Wraps a closure, e.g. a terminal prompt or a test recorder.
pub struct FnConfirm<F>(pub F);

impl<F> Confirm for FnConfirm<F>
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, prompt: &str) -> bool {
        (self.0)(prompt)
    }
}

/// How a confirmed, guarded action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    /// The user declined; nothing was sent.
    Declined,
    /// Another mutation was in flight; nothing was sent.
    Busy,
}
