use anyhow::Result;
use clap::CommandFactory;
use lipread::app::{
    load_config, run_dataview_build, run_dataview_list, run_evaluate, run_frames, run_init,
    run_landmarks, run_transcribe,
};
use lipread::cli::{Cli, Commands, ConfigAction, DataviewAction, DictionaryAction};
use lipread::config::Config;
use lipread::dictionary::{get_dictionary, is_installed, list_dictionaries};
use lipread::output::{paint, render_evaluation};
use lipread::workspace::Workspace;
use owo_colors::Style;
use std::io::IsTerminal;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_env()?;
    lipread::logging::init(cli.quiet, cli.verbose)?;
    let color = std::io::stdout().is_terminal();
    let err_color = std::io::stderr().is_terminal();

    match cli.command {
        Commands::Init => {
            let config = load_config(cli.config.as_deref(), &cli.overrides)?;
            let root = run_init(&config)?;
            println!(
                "Workspace ready at {}",
                paint(root.display(), Style::new().green(), color)
            );
        }
        Commands::Frames { video, out } => {
            let config = load_config(cli.config.as_deref(), &cli.overrides)?;
            let frames = run_frames(&config, &video, out.as_deref())?;
            if let Some(dir) = frames.first().and_then(|f| f.parent()) {
                println!("{} frames in {}", frames.len(), dir.display());
            }
        }
        Commands::Landmarks { input, out } => {
            let config = load_config(cli.config.as_deref(), &cli.overrides)?;
            let (tracked, saved) = run_landmarks(&config, &input, out.as_deref())?;
            for frame in &tracked {
                let f = &frame.face;
                let line = format!(
                    "{:>5}  face {:.0},{:.0} {:.0}x{:.0}  mouth {:.3}",
                    frame.index,
                    f.x,
                    f.y,
                    f.width,
                    f.height,
                    frame.landmarks.normalized(f).mouth_opening()
                );
                if frame.interpolated {
                    println!(
                        "{}  {}",
                        paint(&line, Style::new().dimmed(), color),
                        paint("reused", Style::new().yellow(), color)
                    );
                } else {
                    println!("{line}");
                }
            }
            if let Some(path) = saved {
                println!("Saved {}", path.display());
            }
        }
        Commands::Dataview { action } => {
            let config = load_config(cli.config.as_deref(), &cli.overrides)?;
            handle_dataview_command(action, &config, color, err_color)?;
        }
        Commands::Transcribe {
            inputs,
            no_correction,
            show_ids,
        } => {
            let config = load_config(cli.config.as_deref(), &cli.overrides)?;
            let summary = run_transcribe(&config, &inputs, no_correction, show_ids, color)?;
            if summary.failures() > 0 && !cli.quiet {
                let message = format!("{} of {} clips failed", summary.failures(), inputs.len());
                eprintln!("{}", paint(message, Style::new().yellow(), err_color));
            }
        }
        Commands::Evaluate {
            tier,
            no_correction,
            json,
        } => {
            let config = load_config(cli.config.as_deref(), &cli.overrides)?;
            let report = run_evaluate(&config, tier, no_correction)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", render_evaluation(&report, color));
            }
        }
        Commands::Dictionary { action } => {
            let config = load_config(cli.config.as_deref(), &cli.overrides)?;
            handle_dictionary_command(action, &config, color).await?;
        }
        Commands::Config { action } => {
            let config = load_config(cli.config.as_deref(), &cli.overrides)?;
            handle_config_command(action, &config)?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "lipread", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn handle_dataview_command(
    action: DataviewAction,
    config: &Config,
    color: bool,
    err_color: bool,
) -> Result<()> {
    match action {
        DataviewAction::Build { tier, overwrite } => {
            let summary = run_dataview_build(config, tier, overwrite)?;
            for (clip, error) in &summary.failed {
                eprintln!(
                    "  {} {clip}: {error}",
                    paint("failed", Style::new().red(), err_color)
                );
            }
            println!(
                "Built {} examples, skipped {}, failed {}",
                paint(summary.built.len(), Style::new().green(), color),
                summary.skipped,
                summary.failed.len()
            );
        }
        DataviewAction::List => {
            let stats = run_dataview_list(config)?;
            println!("{:<8} {:>9} {:>10}", "tier", "examples", "frames");
            for s in stats {
                println!("{:<8} {:>9} {:>10}", s.tier, s.examples, s.frames);
            }
        }
    }
    Ok(())
}

async fn handle_dictionary_command(
    action: DictionaryAction,
    config: &Config,
    color: bool,
) -> Result<()> {
    let workspace = Workspace::resolve(config)?;
    match action {
        DictionaryAction::List => {
            println!("Available dictionaries:");
            for info in list_dictionaries() {
                let status = if is_installed(&workspace, info) {
                    paint("installed", Style::new().green(), color)
                } else {
                    paint("not installed", Style::new().dimmed(), color)
                };
                println!(
                    "  {:<4} {:<10} {:>6} KB  {status}",
                    info.language, info.display_name, info.size_kb
                );
            }
        }
        DictionaryAction::Install { language } => {
            let Some(info) = get_dictionary(&language) else {
                anyhow::bail!(
                    "Unknown dictionary language '{language}'. Run `lipread dictionary list`."
                );
            };
            #[cfg(feature = "model-download")]
            {
                let path = lipread::download::install_dictionary(
                    &workspace,
                    info,
                    std::io::stderr().is_terminal(),
                )
                .await?;
                println!("Dictionary '{}' installed at {}", info.language, path.display());
            }
            #[cfg(not(feature = "model-download"))]
            {
                anyhow::bail!(
                    "Built without downloads; place {} at {}",
                    info.filename,
                    lipread::dictionary::installed_path(&workspace, info).display()
                );
            }
        }
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction, config: &Config) -> Result<()> {
    match action {
        ConfigAction::Get { key } => match config.get_value(&key) {
            Some(toml::Value::String(s)) => println!("{s}"),
            Some(value) => println!("{value}"),
            None => anyhow::bail!("Unknown configuration key '{key}'"),
        },
        ConfigAction::List => print!("{}", config.to_toml()?),
        ConfigAction::Dump => print!("{}", Config::default().to_toml()?),
    }
    Ok(())
}
