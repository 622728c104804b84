use std::fmt;

/// Which handler population a `publish` call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Deliver to every registered multicast handler.
    Multicast,
    /// Deliver to the single registered unicast handler, if any.
    Unicast,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Multicast => "Multicast",
            Mode::Unicast => "Unicast",
        })
    }
}

/// The outcome of a single [`crate::EventBus::publish`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishResult {
    /// `true` iff at least one handler executed successfully.
    pub success: bool,
    /// Which bucket was targeted.
    pub mode: Mode,
    /// How many handlers were registered for the key at dispatch time.
    pub total: usize,
    /// How many of those matched the published signature and ran.
    pub successful: usize,
    /// How many were skipped due to signature/arity mismatch.
    pub failed: usize,
    /// The canonical signature of the published arguments.
    pub published_signature: &'static str,
    /// The signatures of handlers that did not match, in dispatch order.
    pub failed_signatures: Vec<&'static str>,
    /// The signatures of every handler considered, in dispatch order.
    pub expected_signatures: Vec<&'static str>,
    /// A human-readable summary, set when `successful == 0`.
    pub diagnostic: Option<String>,
}

impl fmt::Display for PublishResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} ({}) {}", self.successful, self.total, self.mode, self.published_signature)?;
        if let Some(diag) = &self.diagnostic {
            write!(f, ": {diag}")?;
        }
        Ok(())
    }
}
