//! Routes panics through `tracing` instead of letting them fall straight to
//! stderr, so a panic in a spawned task shows up in the same log stream
//! (and the same log aggregator) as everything else.

/// Replaces the default panic hook. Call once, right after
/// [`crate::tracing::initialize`].
pub fn install() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        tracing::error!(panic = %info, "thread panicked");
        default_hook(info);
    }));
}
