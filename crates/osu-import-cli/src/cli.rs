//! Command line interface for scripting and testing
//!
//! Usage:
//!   osu-import import <paths...>       Import .osz files or extracted folders
//!   osu-import list                    List imported beatmap sets
//!   osu-import show <set-id>           Show one beatmap set
//!   osu-import verify                  Re-hash stored archives
//!   osu-import reset --yes             Delete every imported set
//!
//! Options:
//!   --storage <dir>    Storage directory (overrides the config file)
//!   --json             Output in JSON format
//!   --verbose          Debug logging

use std::path::PathBuf;

use osu_import_core::{BeatmapDatabase, BeatmapSetInfo, Config, ImportOutcome, ImportResult};

/// CLI command to execute
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    Import { paths: Vec<PathBuf> },
    List,
    Show { beatmap_set_id: i32 },
    Verify,
    Reset { confirmed: bool },
}

/// CLI options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOptions {
    pub json: bool,
    pub verbose: bool,
    pub storage: Option<PathBuf>,
}

/// Parse CLI arguments and return command + options
pub fn parse_args(args: &[String]) -> Result<(CliCommand, CliOptions), String> {
    let mut options = CliOptions::default();
    let mut command: Option<CliCommand> = None;
    let mut confirmed = false;

    let mut i = 0;
    while i < args.len() {
        let arg = &args[i];
        match arg.as_str() {
            "--json" => options.json = true,
            "--verbose" | "-v" => options.verbose = true,
            "--yes" | "-y" => confirmed = true,
            "--storage" => {
                i += 1;
                if i >= args.len() {
                    return Err("--storage requires a directory".to_string());
                }
                options.storage = Some(PathBuf::from(&args[i]));
            }
            "import" if command.is_none() => command = Some(CliCommand::Import { paths: Vec::new() }),
            "list" if command.is_none() => command = Some(CliCommand::List),
            "verify" if command.is_none() => command = Some(CliCommand::Verify),
            "reset" if command.is_none() => command = Some(CliCommand::Reset { confirmed: false }),
            "show" if command.is_none() => {
                i += 1;
                if i >= args.len() {
                    return Err("show requires a beatmap set ID".to_string());
                }
                let beatmap_set_id = args[i]
                    .parse::<i32>()
                    .map_err(|_| format!("Invalid set ID: {}", args[i]))?;
                command = Some(CliCommand::Show { beatmap_set_id });
            }
            _ if arg.starts_with('-') => return Err(format!("Unknown option: {}", arg)),
            _ => match command.as_mut() {
                Some(CliCommand::Import { paths }) => paths.push(PathBuf::from(arg)),
                None => return Err(format!("Unknown command: {}", arg)),
                Some(_) => return Err(format!("Unexpected argument: {}", arg)),
            },
        }
        i += 1;
    }

    let command = match command {
        Some(CliCommand::Import { paths }) if paths.is_empty() => {
            return Err("import requires at least one path".to_string())
        }
        Some(CliCommand::Reset { .. }) => CliCommand::Reset { confirmed },
        Some(cmd) => cmd,
        None => {
            return Err(
                "No command specified. Use: import <paths...>, list, show <id>, verify, or reset"
                    .to_string(),
            )
        }
    };

    Ok((command, options))
}

/// Run CLI command
pub fn run(command: CliCommand, options: CliOptions) -> anyhow::Result<()> {
    let config = match &options.storage {
        Some(storage) => Config::with_storage_path(storage),
        None => Config::load(),
    };
    let mut db = BeatmapDatabase::open(&config)?;

    match command {
        CliCommand::Import { paths } => run_import(&mut db, paths, &options),
        CliCommand::List => run_list(&db, &options),
        CliCommand::Show { beatmap_set_id } => run_show(&db, beatmap_set_id, &options),
        CliCommand::Verify => run_verify(&db, &options),
        CliCommand::Reset { confirmed } => run_reset(&mut db, confirmed),
    }
}

fn run_import(
    db: &mut BeatmapDatabase,
    paths: Vec<PathBuf>,
    options: &CliOptions,
) -> anyhow::Result<()> {
    // Extracted folders are stored by path, so make them independent of the working directory
    let paths: Vec<PathBuf> = paths
        .into_iter()
        .map(|p| std::fs::canonicalize(&p).unwrap_or(p))
        .collect();

    if !options.json {
        db.on_beatmap_set_added(|set| {
            eprintln!("Imported [{}] {}", set.beatmap_set_id, set.display_name());
        });
    }

    let result = db.import(&paths);
    print_import_result(&result, options);

    if !result.is_success() {
        anyhow::bail!("{} of {} paths failed to import", result.failed_count(), result.total());
    }
    Ok(())
}

fn run_list(db: &BeatmapDatabase, options: &CliOptions) -> anyhow::Result<()> {
    let sets = db.get_all_with_children::<BeatmapSetInfo>(None, false)?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&sets)?);
        return Ok(());
    }

    println!("{} beatmap sets:", sets.len());
    for set in &sets {
        println!(
            "  [{}] {} ({} difficulties)",
            set.beatmap_set_id,
            set.display_name(),
            set.beatmaps.len()
        );
    }
    Ok(())
}

fn run_show(db: &BeatmapDatabase, beatmap_set_id: i32, options: &CliOptions) -> anyhow::Result<()> {
    let set = db
        .get_beatmap_set(beatmap_set_id)?
        .ok_or_else(|| anyhow::anyhow!("Beatmap set {} is not imported", beatmap_set_id))?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&set)?);
        return Ok(());
    }

    println!("[{}] {}", set.beatmap_set_id, set.display_name());
    if let Some(meta) = &set.metadata {
        println!("  Mapped by {}", meta.creator);
    }
    println!("  Path: {}", set.path);
    if let Some(hash) = &set.hash {
        println!("  Hash: {}", hash);
    }
    println!();
    for beatmap in &set.beatmaps {
        let diff = &beatmap.difficulty;
        println!(
            "  {:<24} {:?}  HP {:.1}  CS {:.1}  OD {:.1}  AR {:.1}",
            beatmap.version,
            beatmap.mode,
            diff.hp_drain,
            diff.circle_size,
            diff.overall_difficulty,
            diff.approach_rate
        );
    }
    Ok(())
}

fn run_verify(db: &BeatmapDatabase, options: &CliOptions) -> anyhow::Result<()> {
    let sets = db.query::<BeatmapSetInfo>()?;
    let mut problems = Vec::new();

    for set in sets.iter().filter(|s| s.is_relocated()) {
        if let Err(e) = db.verify_beatmap_set(set) {
            problems.push((set.beatmap_set_id, e.to_string()));
        }
    }

    if options.json {
        let items: Vec<_> = problems
            .iter()
            .map(|(id, message)| serde_json::json!({ "set_id": id, "message": message }))
            .collect();
        println!(
            "{}",
            serde_json::json!({ "checked": sets.len(), "problems": items })
        );
    } else {
        println!("Checked {} beatmap sets", sets.len());
        for (id, message) in &problems {
            println!("  - [{}] {}", id, message);
        }
    }

    if !problems.is_empty() {
        anyhow::bail!("{} stored archives failed verification", problems.len());
    }
    Ok(())
}

fn run_reset(db: &mut BeatmapDatabase, confirmed: bool) -> anyhow::Result<()> {
    if !confirmed {
        anyhow::bail!("reset deletes every imported beatmap set; pass --yes to confirm");
    }
    db.reset()?;
    println!("Beatmap database reset");
    Ok(())
}

fn print_import_result(result: &ImportResult, options: &CliOptions) {
    if options.json {
        let items: Vec<_> = result
            .entries
            .iter()
            .map(|entry| {
                let (status, set_id, message) = match &entry.outcome {
                    ImportOutcome::Imported(set) => ("imported", Some(set.beatmap_set_id), None),
                    ImportOutcome::Skipped { beatmap_set_id } => {
                        ("skipped", Some(*beatmap_set_id), None)
                    }
                    ImportOutcome::Failed(e) => ("failed", None, Some(e.to_string())),
                };
                serde_json::json!({
                    "path": entry.path.to_string_lossy(),
                    "status": status,
                    "set_id": set_id,
                    "message": message,
                })
            })
            .collect();

        println!(
            "{}",
            serde_json::json!({
                "imported": result.imported_count(),
                "skipped": result.skipped_count(),
                "failed": result.failed_count(),
                "items": items,
            })
        );
    } else {
        println!("Import Complete:");
        println!("  Imported: {}", result.imported_count());
        println!("  Skipped:  {}", result.skipped_count());
        println!("  Failed:   {}", result.failed_count());

        if result.failed_count() > 0 {
            println!();
            println!("Errors:");
            for (path, error) in result.errors() {
                println!("  - {}: {}", path.display(), error);
            }
        }
    }
}

/// Print CLI help
pub fn print_help() {
    println!("osu-import v{}", env!("CARGO_PKG_VERSION"));
    println!("Import osu! beatmap sets into a local beatmap database");
    println!();
    println!("USAGE:");
    println!("    osu-import <command> [options]");
    println!();
    println!("COMMANDS:");
    println!("    import <paths...>           Import .osz files or extracted folders");
    println!("    list                        List imported beatmap sets");
    println!("    show <set-id>               Show one beatmap set and its difficulties");
    println!("    verify                      Check stored archives against their hashes");
    println!("    reset --yes                 Delete every imported set and stored archive");
    println!();
    println!("OPTIONS:");
    println!("    --storage <dir>             Storage directory (default from config)");
    println!("    --json                      Output in JSON format");
    println!("    --verbose, -v               Enable debug logging");
    println!("    --help, -h                  Show this help message");
    println!();
    println!("EXAMPLES:");
    println!("    osu-import import ~/Downloads/*.osz");
    println!("    osu-import import \"Songs/42 Artist - Title\" --json");
    println!("    osu-import show 42");
}
