use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use tracing::{debug, info};

use hdr_screenshot::{
    capture::{CaptureOrchestrator, Notice},
    cli::{handle_commands, CliArgs},
    config::Config,
    utils::{setup_logging, CaptureSpinner, SystemRunner},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();

    if !args.is_info_command() && !args.has_source() {
        use clap::CommandFactory;
        let mut cmd = CliArgs::command();
        cmd.print_help()?;
        println!();
        return Ok(());
    }

    args.validate()?;

    if handle_commands(&args).await? {
        return Ok(());
    }

    let mut config = Config::load_with_fallback(args.config.as_deref())
        .context("Failed to load configuration")?;
    args.apply_overrides(&mut config);

    setup_logging(
        args.get_log_level(&config.logging.level),
        config.logging.show_timestamps,
        config.logging.colored_output && args.should_use_color(),
    )?;
    config.log_warnings();

    let notice = handle_capture(&args, &config).await;
    println!("{}", notice);

    if !notice.is_success() {
        std::process::exit(1);
    }

    Ok(())
}

async fn handle_capture(args: &CliArgs, config: &Config) -> Notice {
    let runner = Arc::new(SystemRunner::new(config.tools.timeout_seconds));
    let orchestrator = CaptureOrchestrator::new(config, runner);

    let mut player = args.player_state(config);
    if let Some(source) = args.source_path().filter(|_| !player.is_network_resource) {
        player = player
            .fill_color_from_probe(orchestrator.ffmpeg(), &source)
            .await;
    }
    debug!("Player state: {:?}", player);

    let spinner = if console::Term::stderr().is_term() {
        CaptureSpinner::new(&Notice::InProgress.to_string())
    } else {
        CaptureSpinner::hidden()
    };

    let notice = orchestrator.capture(&player).await;
    spinner.finish();

    if let Notice::Captured { path, .. } = &notice {
        info!(
            "Saved {} in {:.1}s",
            path.display(),
            spinner.elapsed().as_secs_f64()
        );
    }

    notice
}
