//! Ambient operational plumbing shared by every binary: structured logging,
//! panic reporting, and the Prometheus metrics/health server. None of this
//! is specific to routing or swaps; it is the same shape every service in
//! this workspace wires up first, before touching its own domain.

pub mod metrics;
pub mod panic_hook;
pub mod shutdown;
pub mod tracing;
