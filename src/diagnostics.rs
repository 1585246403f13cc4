//! Stderr diagnostics shared across the pipeline.
//!
//! Warnings are for recoverable trace inconsistencies (dangling references);
//! anything fatal goes through error values instead.

/// Print a non-fatal warning to stderr.
pub fn warn(msg: impl AsRef<str>) {
    eprintln!("\x1b[93mWARNING:\x1b[0m {}", msg.as_ref());
}

/// Format an error message with the shared prefix (for anyhow contexts).
pub fn error_message(msg: impl AsRef<str>) -> String {
    format!("\x1b[91mERROR:\x1b[0m {}", msg.as_ref())
}
