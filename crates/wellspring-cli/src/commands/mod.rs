//! CLI command implementations
//!
//! Commands are organized by what they report:
//! - `core` - Shared utilities (config loading, CSV inputs, `name=value` parsing)
//! - `analyze` - Full analysis report
//! - `correlations` - Ranked correlation table
//! - `predict` - Single-metric prediction
//! - `scenario` - What-if scenario
//! - `config` - Effective configuration

pub mod analyze;
pub mod config;
pub mod core;
pub mod correlations;
pub mod predict;
pub mod scenario;

// Re-export command functions for main.rs
pub use analyze::*;
pub use config::*;
pub use self::core::*;
pub use correlations::*;
pub use predict::*;
pub use scenario::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Signed value with two decimals, e.g. `+0.42`
pub fn signed(value: f64) -> String {
    format!("{:+.2}", value)
}
