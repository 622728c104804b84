/// A settable single-argument diagnostic callback.
///
/// If never set, diagnostics print to stderr (and, with the `log` feature,
/// also go through [`log::debug!`]).
pub struct DiagnosticSink(Box<dyn Fn(&str)>);

impl DiagnosticSink {
    /// Install a caller-supplied sink.
    pub fn new(f: impl Fn(&str) + 'static) -> Self {
        Self(Box::new(f))
    }

    /// Report a message through the sink.
    pub fn report(&self, message: &str) {
        (self.0)(message)
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new(default_sink)
    }
}

fn default_sink(message: &str) {
    #[cfg(feature = "log")]
    log::debug!("{message}");
    eprintln!("{message}");
}
