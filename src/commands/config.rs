//! Config command handler.

use mechstore::config::StoreConfig;

/// Config command.
pub fn cmd_config(config: &StoreConfig) {
    println!("Current Configuration");
    println!("=====================");
    println!();
    println!(
        "Default Format: {}",
        config
            .default_format
            .map_or_else(|| "binary (built-in)".to_string(), |f| f.to_string())
    );
    println!("Overwrite Existing: {}", config.overwrite);
    println!();
    println!("Logging:");
    println!(
        "  Format: {}",
        config.logging.format.as_deref().unwrap_or("pretty")
    );
    println!(
        "  Filter: {}",
        config.logging.filter.as_deref().unwrap_or("(default)")
    );
    println!(
        "  File: {}",
        config
            .logging
            .file
            .as_ref()
            .map_or_else(|| "(stderr)".to_string(), |p| p.display().to_string())
    );
}
