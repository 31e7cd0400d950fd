use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use obs_transporter_lib::core::collection::default_archive_path;
use obs_transporter_lib::core::settings::{SettingsManager, TransporterSettings};
use obs_transporter_lib::{
    export_collection, import_collection, list_collections, SceneCollection, TransportOptions,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

/// Import or export an OBS Studio scene collection, together with every file it
/// references, using a zip archive.
#[derive(Parser, Debug)]
#[command(name = "obs-scene-transporter", version, about)]
struct Cli {
    /// Log every asset as it is processed.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Scene collection directory to use instead of the OBS Studio default.
    #[arg(long, global = true, value_name = "DIR")]
    scenes_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the scene collections available for export.
    #[command(visible_alias = "ls")]
    List(ListArgs),
    /// Package a scene collection and its assets into a zip archive.
    Export(ExportArgs),
    /// Install a scene collection from a zip archive.
    Import(ImportArgs),
    /// Show or change persistent settings.
    Config(ConfigArgs),
}

#[derive(Parser, Debug)]
struct ConfigArgs {
    #[command(subcommand)]
    action: Option<ConfigAction>,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Show where settings, scene collections and imported assets live (default).
    Show,
    /// Change one setting: scenesDir, assetRoot, archivePrefix or prettyJson.
    Set {
        key: String,
        /// New value; empty clears a directory back to its default.
        value: String,
    },
    /// Delete the settings file and return to defaults.
    Reset,
}

#[derive(Parser, Debug)]
struct ListArgs {
    /// Include path, counts and assets; missing assets are marked with `*`.
    #[arg(short, long)]
    long: bool,

    /// Print the listing as JSON.
    #[arg(long, conflicts_with = "long")]
    json: bool,
}

#[derive(Parser, Debug)]
struct ExportArgs {
    /// Collection name, or path to a collection file.
    collection: String,

    /// Archive to write; defaults to `<name>.zip`.
    archive: Option<PathBuf>,

    /// Name the archive `<NAME>.zip` instead of after the collection.
    #[arg(short, long, conflicts_with = "archive")]
    name: Option<String>,
}

#[derive(Parser, Debug)]
struct ImportArgs {
    /// Archive to import.
    archive: PathBuf,

    /// Directory to store assets in.
    #[arg(short, long, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Install the collection under this name.
    #[arg(short, long)]
    name: Option<String>,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    // Avoid panics if already initialized (tests).
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Command::Config(ConfigArgs {
        action: Some(action @ (ConfigAction::Set { .. } | ConfigAction::Reset)),
    }) = cli.cmd
    {
        return cmd_config_change(action);
    }

    let settings = SettingsManager::for_current_user()
        .map(|manager| manager.load())
        .unwrap_or_else(|e| {
            warn!("Using default settings: {}", e);
            TransporterSettings::default()
        });
    let mut options = TransportOptions::from_settings(&settings)
        .context("cannot determine the scene collection directory")?;
    if let Some(dir) = cli.scenes_dir {
        options.scenes_dir = dir;
    }

    match cli.cmd {
        Command::List(args) => cmd_list(args, &options),
        Command::Export(args) => cmd_export(args, &options),
        Command::Import(args) => cmd_import(args, &options),
        Command::Config(_) => cmd_config(&options),
    }
}

/// Name shown for a collection: its file stem, as OBS Studio shows it.
fn display_name(collection: &SceneCollection) -> String {
    collection
        .path
        .as_deref()
        .and_then(Path::file_stem)
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| collection.name.clone())
}

fn cmd_list(args: ListArgs, options: &TransportOptions) -> anyhow::Result<()> {
    let collections = list_collections(&options.scenes_dir)
        .with_context(|| format!("list '{}'", options.scenes_dir.display()))?;

    if args.json {
        let summaries: Vec<_> = collections.iter().map(SceneCollection::summary).collect();
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for collection in &collections {
        if !args.long {
            println!("{}", display_name(collection));
            continue;
        }

        let summary = collection.summary();
        let path = summary
            .path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!("{}:\t{}", display_name(collection), path);
        println!("    name:     {}", summary.name);
        println!("    scenes:   {}", summary.scenes);
        println!("    sources:  {}", summary.sources);
        for (id, count) in &summary.counts {
            println!("        {id}: {count}");
        }
        println!("    assets:");
        for asset in &summary.assets {
            let marker = if asset.exists { "" } else { " *" };
            println!("        {}{}", asset.path, marker);
        }
    }
    Ok(())
}

fn cmd_export(args: ExportArgs, options: &TransportOptions) -> anyhow::Result<()> {
    let archive = args.archive.or_else(|| args.name.as_deref().map(default_archive_path));
    let report = export_collection(&args.collection, archive.as_deref(), options)
        .with_context(|| format!("export '{}'", args.collection))?;

    eprintln!(
        "wrote {} ({} assets, {} missing)",
        report.archive.display(),
        report.added.len(),
        report.missing.len()
    );
    Ok(())
}

fn cmd_import(args: ImportArgs, options: &TransportOptions) -> anyhow::Result<()> {
    let report = import_collection(
        &args.archive,
        args.name.as_deref(),
        args.assets.as_deref(),
        options,
    )
    .with_context(|| format!("import '{}'", args.archive.display()))?;

    eprintln!(
        "installed {:?} as {} ({} assets in {}, {} skipped)",
        report.name,
        report.collection_file.display(),
        report.extracted.len(),
        report.asset_dir.display(),
        report.skipped.len()
    );
    Ok(())
}

fn cmd_config(options: &TransportOptions) -> anyhow::Result<()> {
    let settings_path = SettingsManager::for_current_user()
        .map(|manager| manager.settings_path().display().to_string())
        .unwrap_or_else(|e| format!("<unavailable: {e}>"));
    let asset_root = options
        .resolved_asset_root()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|e| format!("<unavailable: {e}>"));

    println!("settings:       {settings_path}");
    println!("scenes:         {}", options.scenes_dir.display());
    println!("assets:         {asset_root}");
    println!("archive prefix: {}", options.archive_prefix);
    println!("platform:       {}", options.platform);
    Ok(())
}

fn cmd_config_change(action: ConfigAction) -> anyhow::Result<()> {
    let manager = SettingsManager::for_current_user()?;
    match action {
        ConfigAction::Set { key, value } => {
            let mut settings = manager.load();
            settings
                .set(&key, &value)
                .with_context(|| format!("set '{key}'"))?;
            manager
                .save(&settings)
                .with_context(|| format!("write '{}'", manager.settings_path().display()))?;
            eprintln!("updated {}", manager.settings_path().display());
        }
        ConfigAction::Reset => {
            manager
                .reset()
                .with_context(|| format!("reset '{}'", manager.settings_path().display()))?;
            eprintln!("settings reset to defaults");
        }
        ConfigAction::Show => {}
    }
    Ok(())
}
