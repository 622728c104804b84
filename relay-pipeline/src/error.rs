/// Errors produced by registration calls on [`crate::ActionPipeline`].
///
/// Execution failures (signature mismatch at `execute` time, a missing key)
/// are reported through [`crate::ActionResult`] instead, since they are
/// expected outcomes of caller input rather than a misuse of the API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    /// A key already registered in non-overload mode received a
    /// registration with a different parameter signature.
    #[error("key already registered in non-overload mode as `{registered}`, requested as `{requested}`")]
    SignatureMismatch {
        /// The signature the key's single container was created with.
        registered: &'static str,
        /// The signature of the rejected registration.
        requested: &'static str,
    },
}
