//! Effective configuration

use std::path::Path;

use anyhow::{Context, Result};
use wellspring_core::config::default_config_path;
use wellspring_core::AnalysisConfig;

pub fn cmd_config(path: Option<&Path>) -> Result<()> {
    let (config, source) = AnalysisConfig::load(path).context("Failed to load analysis config")?;

    println!();
    println!("⚙️  Wellspring Config");
    println!("   ─────────────────────────────────────────────────────────────");
    println!("   Source: {}", source);
    if let Some(user_path) = default_config_path() {
        println!("   User config path: {}", user_path.display());
    }

    println!();
    println!("   Anomaly threshold:     mean + {} stddev", config.aggregation.anomaly_std_devs);
    println!("   Correlation floor:     |r| >= {}", config.correlation.min_abs_r);
    println!(
        "   Confidence by weeks:   low < {}, high >= {}",
        config.correlation.low_confidence_below, config.correlation.high_confidence_from
    );
    println!(
        "   Predictors per model:  up to {} (weeks >= predictors + {})",
        config.regression.max_predictors,
        config.regression.min_residual_dof + 1
    );
    println!(
        "   Suggested scenarios:   +/- {:.0}%",
        config.scenario.suggestion_fraction * 100.0
    );

    println!();
    println!(
        "   Categories (first match wins): {}",
        config.category_names().join(", ")
    );
    for rule in &config.categories {
        println!(
            "   - {:<16} {:<8} {}",
            rule.name,
            rule.pattern_type.as_str(),
            rule.pattern
        );
    }
    println!();

    Ok(())
}
