//! galleria CLI — print the merged gallery of a directory tree.
//!
//! Commands:
//!   galleria scan <dir> [flags]          List albums (all media first)
//!   galleria album <dir> <name> [flags]  List the items of one album
//!   galleria version                     Print the version
//!
//! Flags: --no-images, --no-videos, --no-gifs, --json
//!
//! `GALLERIA_OPTIONS` may hold JSON load options, e.g.
//! `{"load_gifs": false}`; flags can only switch things off on top of it.
//! `GALLERIA_LABELS` may hold JSON overriding the well-known album names,
//! e.g. `{"all_media": "Everything"}`.

use std::process::ExitCode;

use galleria_core::{AggregateResult, Labels, LoadOptions, LoadOutcome, MediaGroup, MediaLoader};

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        print_usage();
        return ExitCode::SUCCESS;
    }

    let (positional, flags) = split_flags(&args[1..]);

    let result = match args[0].as_str() {
        "scan" => cmd_scan(&positional, &flags),
        "album" => cmd_album(&positional, &flags),
        "version" => {
            println!("galleria {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(format!("unknown command: {}", other)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{}", msg);
            ExitCode::FAILURE
        }
    }
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

#[derive(Debug, Default, PartialEq, Eq)]
struct Flags {
    no_images: bool,
    no_videos: bool,
    no_gifs: bool,
    json: bool,
}

fn split_flags(args: &[String]) -> (Vec<String>, Flags) {
    let mut flags = Flags::default();
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--no-images" => flags.no_images = true,
            "--no-videos" => flags.no_videos = true,
            "--no-gifs" => flags.no_gifs = true,
            "--json" => flags.json = true,
            _ => positional.push(arg.clone()),
        }
    }
    (positional, flags)
}

fn load_options(flags: &Flags, options_env: Option<&str>, labels_env: Option<&str>) -> LoadOptions {
    let base = match options_env.map(serde_json::from_str::<serde_json::Value>) {
        Some(Ok(value)) => LoadOptions::from_json(&value),
        Some(Err(e)) => {
            log::warn!("galleria: ignoring invalid GALLERIA_OPTIONS ({})", e);
            LoadOptions::default()
        }
        None => LoadOptions::default(),
    };
    let labels = match labels_env {
        Some(raw) => serde_json::from_str::<Labels>(raw).unwrap_or_else(|e| {
            log::warn!("galleria: ignoring invalid GALLERIA_LABELS ({})", e);
            Labels::default()
        }),
        None => base.labels.clone(),
    };
    LoadOptions::new(
        base.load_images && !flags.no_images,
        base.load_videos && !flags.no_videos,
        base.load_gifs && !flags.no_gifs,
    )
    .with_labels(labels)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_scan(args: &[String], flags: &Flags) -> Result<(), String> {
    let dir = args.first().ok_or("usage: galleria scan <dir> [flags]")?;
    let Some(gallery) = load(dir, flags)? else {
        return Ok(());
    };

    if flags.json {
        let json = serde_json::to_string_pretty(&gallery).map_err(|e| e.to_string())?;
        println!("{}", json);
    } else {
        for group in gallery.groups() {
            println!("{}", album_line(group));
        }
    }
    Ok(())
}

fn cmd_album(args: &[String], flags: &Flags) -> Result<(), String> {
    let (dir, name) = match args {
        [dir, name, ..] => (dir, name),
        _ => return Err("usage: galleria album <dir> <name> [flags]".into()),
    };
    let Some(gallery) = load(dir, flags)? else {
        return Ok(());
    };
    let group = gallery
        .find(name)
        .ok_or_else(|| format!("no album named: {}", name))?;

    if flags.json {
        let json = serde_json::to_string_pretty(group).map_err(|e| e.to_string())?;
        println!("{}", json);
    } else {
        for item in &group.items {
            println!("{:>15}  {:<5}  {}", item.time, item.kind.as_str(), item.path);
        }
    }
    Ok(())
}

/// Run one load cycle. `None` means nothing was found (already reported).
fn load(dir: &str, flags: &Flags) -> Result<Option<AggregateResult>, String> {
    let options_env = std::env::var("GALLERIA_OPTIONS").ok();
    let labels_env = std::env::var("GALLERIA_LABELS").ok();
    let options = load_options(flags, options_env.as_deref(), labels_env.as_deref());
    let loader = MediaLoader::from_directory(dir, options);

    match loader.load_blocking().map_err(|e| format!("load failed: {}", e))? {
        LoadOutcome::Loaded(gallery) => Ok(Some(gallery)),
        LoadOutcome::NoMedia => {
            println!("no media found in {}", dir);
            Ok(None)
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn album_line(group: &MediaGroup) -> String {
    let marker = if group.selected { '*' } else { ' ' };
    let cover = group.cover.as_ref().map(|c| c.name()).unwrap_or("-");
    format!("{} {:<24} {:>6}  {}", marker, group.name, group.len(), cover)
}

fn print_usage() {
    println!("galleria - merged image/video gallery");
    println!();
    println!("usage: galleria <command> [args] [flags]");
    println!();
    println!("commands:");
    println!("  scan <dir>             List albums, all media first");
    println!("  album <dir> <name>     List the items of one album");
    println!("  version                Print the version");
    println!();
    println!("flags:");
    println!("  --no-images            Skip still images");
    println!("  --no-videos            Skip videos");
    println!("  --no-gifs              Skip animated images");
    println!("  --json                 Print JSON instead of text");
    println!();
    println!("env:");
    println!("  GALLERIA_OPTIONS       JSON load options");
    println!("  GALLERIA_LABELS        JSON album labels");
}
