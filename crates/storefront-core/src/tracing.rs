use tracing_subscriber::EnvFilter;

/// Initializes structured logging for the storefront client.
///
/// # Environment Variables
///
/// Set `RUST_LOG` to control log verbosity:
/// - `RUST_LOG=info` - Accepted and rejected mutations
/// - `RUST_LOG=debug` - Every backend request, stock re-fetches
/// - `RUST_LOG=storefront=debug,storefront_core=warn` - Per-crate levels
///
/// Calling it again after a subscriber is installed has no effect.
///
/// # Example
///
/// ```ignore
/// setup_tracing();
/// tracing::info!("Storefront started");
/// ```
pub fn setup_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .try_init();
}
