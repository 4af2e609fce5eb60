use crate::{
    cli::CliArgs,
    config::{keybind, Config, KeybindStatus},
    utils::Result,
};
use std::path::Path;

/// Runs the informational commands. Returns `true` when one was handled.
pub async fn handle_commands(args: &CliArgs) -> Result<bool> {
    if args.validate_config {
        validate_config(args.config.as_deref()).await?;
        return Ok(true);
    }

    if let Some(key) = &args.check_keybind {
        check_keybind(key, &args.bound_keys);
        return Ok(true);
    }

    Ok(false)
}

async fn validate_config(config_path: Option<&Path>) -> Result<()> {
    match Config::load_with_fallback(config_path) {
        Ok(config) => {
            if let Some(path) = config_path {
                println!("✓ Configuration file is valid: {}", path.display());
            } else {
                println!("✓ Configuration is valid (using discovered/default config)");
            }
            for warning in &config.warnings {
                println!("⚠ {}", warning);
            }
            println!();

            println!("Configuration Summary:");
            println!("{:-<40}", "");
            println!("FFmpeg: {}", config.tools.ffmpeg);
            println!("FFprobe: {}", config.tools.ffprobe);
            println!(
                "Timeout: {}",
                config
                    .tools
                    .timeout_seconds
                    .map(|s| format!("{}s", s))
                    .unwrap_or_else(|| "none".to_string())
            );
            println!("Tonemap: {}", config.capture.tonemap());
            println!(
                "Pipeline: {}",
                if config.capture.zscale { "zscale" } else { "scale" }
            );
            println!(
                "Screenshot folder: {}",
                config
                    .capture
                    .screenshot_dir
                    .as_deref()
                    .unwrap_or("(next to source)")
            );
            println!("Probe frames: {}", config.capture.probe_frames);
            println!(
                "Keybind: {}",
                config.keybind.as_deref().unwrap_or("(none)")
            );

            Ok(())
        }
        Err(e) => {
            println!("✗ Configuration validation failed: {}", e);
            Err(e)
        }
    }
}

fn check_keybind(raw: &str, bound: &[String]) {
    let resolution = keybind::resolve(raw, bound.iter().map(String::as_str));

    println!("{}", resolution.status);
    if !resolution.normalized.is_empty() {
        println!("Normalized: {}", resolution.normalized);
    }
    if resolution.conflict {
        println!("⚠ Keybind conflicts with an existing binding");
    }

    match (resolution.binding(), &resolution.status) {
        (Some(binding), _) => println!("Binding to register: {}", binding),
        (None, KeybindStatus::Disabled) => {}
        (None, _) => println!("No binding will be registered"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[tokio::test]
    async fn test_validate_config_reports_bad_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "capture:\n  probe_frames: 0").unwrap();

        assert!(validate_config(Some(file.path())).await.is_err());
    }

    #[tokio::test]
    async fn test_info_commands_are_handled() {
        let args = CliArgs::parse_from(["hdr-screenshot", "--check-keybind", "ctrl+h"]);
        assert!(handle_commands(&args).await.unwrap());

        let args = CliArgs::parse_from(["hdr-screenshot", "-i", "a.mkv", "-t", "1"]);
        assert!(!handle_commands(&args).await.unwrap());
    }
}
