/// Install the global `tracing` subscriber: `fmt` output filtered by `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn setup_log() {
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::{EnvFilter, fmt};
    if tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .try_init()
        .is_err()
    {}
}
