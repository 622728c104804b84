use std::fmt;

/// The outcome of a single [`crate::ActionPipeline::execute`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionResult {
    /// `true` iff the container ran to completion without an aborting
    /// validator or processor (and a matching container/signature was found).
    pub success: bool,
    /// Whether every validator passed (or none were registered).
    pub validation_passed: bool,
    /// The canonical signature `execute` was called with.
    pub signature: &'static str,
    /// `SequentialProcessors.len() + 1 if a FinalProcessor is present`,
    /// computed before processors run.
    pub total_processors: usize,
    /// How many processors actually ran before completion or abort.
    pub executed_processors: usize,
    /// How many of the container's own `CompletionListeners` fired.
    pub completion_listeners_fired: usize,
    /// The reason execution stopped early, if it did: a validator's
    /// description, or a processor's returned error text.
    pub error_message: Option<String>,
    /// Every handler-reported error message seen along the way (trigger,
    /// validation-listener, and completion-listener failures are caught
    /// here rather than aborting; `error_message` duplicates the abort
    /// reason, if any, as its own entry too).
    pub diagnostics: Vec<String>,
}

impl fmt::Display for ActionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (`{}`): validation_passed={}, processors={}/{}",
            if self.success { "ok" } else { "failed" },
            self.signature,
            self.validation_passed,
            self.executed_processors,
            self.total_processors
        )?;
        if let Some(msg) = &self.error_message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}
