pub use tracing_common::setup_tracing;

/// Installs the `color_eyre` panic and error report handlers.
pub fn setup_error_reporting() -> crate::Result<()> {
    color_eyre::install()
}
