//! Config validation CLI tool
//!
//! Validates a gpu-reaper policy file and reports any errors.

use reaper_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a gpu-reaper policy file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            eprintln!();
            eprintln!("Example:");
            eprintln!("  validate-config {}", default_path.display());
            eprintln!("  validate-config pod_config.json");
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match reaper_config::load_config(&config_path) {
        Ok(policy) => {
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Default window: {}", policy.default_window);

            let mut excluded: Vec<_> = policy.excluded_namespaces.iter().collect();
            excluded.sort();
            if excluded.is_empty() {
                println!("  Excluded namespaces: (none)");
            } else {
                let excluded: Vec<&str> = excluded.into_iter().map(String::as_str).collect();
                println!("  Excluded namespaces: {}", excluded.join(", "));
            }

            println!("  Namespace overrides: {}", policy.namespaces.len());
            println!("  Pod overrides: {}", policy.pod_override_count());

            let mut namespaces: Vec<_> = policy.namespaces.iter().collect();
            namespaces.sort_by(|a, b| a.0.cmp(b.0));
            if !namespaces.is_empty() {
                println!();
                println!("Overrides:");
                for (name, ns) in namespaces {
                    match ns.window {
                        Some(window) => println!("  - {}: {}", name, window),
                        None => println!("  - {}: (default {})", name, policy.default_window),
                    }

                    let mut pods: Vec<_> = ns.pods.iter().collect();
                    pods.sort_by(|a, b| a.0.cmp(b.0));
                    for (pod, window) in pods {
                        if policy.is_excluded(name) {
                            println!("      {}: {} (namespace excluded)", pod, window);
                        } else {
                            println!("      {}: {}", pod, window);
                        }
                    }
                }
            }

            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                reaper_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                reaper_config::ConfigError::WriteError(io_err) => {
                    eprintln!("Failed to write file: {}", io_err);
                }
                reaper_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("JSON parse error:");
                    eprintln!("  {}", parse_err);
                }
                reaper_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
            }
            ExitCode::from(1)
        }
    }
}
