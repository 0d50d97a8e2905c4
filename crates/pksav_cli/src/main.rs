use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{ArgAction, Args, Parser, Subcommand};
use log::LevelFilter;
use pksav_core::core_api::{Engine, Session, Snapshot};
use pksav_core::generation::{GameVersion, Generation, Language};
use pksav_core::pkm::{Pkm, PkmSummary};
use pksav_core::registry::{StringTables, TableRegistry, read_resource};
use pksav_core::sav::SaveFile;
use serde_json::{Value as JsonValue, json};

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Raise log output to debug (repeat for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct Input {
    #[arg(value_name = "SAVE")]
    path: PathBuf,
    #[arg(long, value_name = "VERSION", value_parser = parse_version)]
    game: Option<GameVersion>,
    #[arg(long = "personal", value_name = "GEN=PATH", value_parser = parse_personal)]
    personal: Vec<(Generation, PathBuf)>,
    #[arg(long = "strings", value_name = "LANG=PATH", value_parser = parse_strings)]
    strings: Vec<(Language, PathBuf)>,
    #[arg(long = "swsh-keys", value_name = "PATH")]
    swsh_keys: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Trainer, party and box totals
    Summary {
        #[command(flatten)]
        input: Input,
    },
    /// Occupied slots of one box
    List {
        #[command(flatten)]
        input: Input,
        #[arg(long = "box", default_value_t = 0)]
        box_index: usize,
    },
    /// Write one decrypted record to a file; without --box the slot is a party slot
    Export {
        #[command(flatten)]
        input: Input,
        #[arg(long = "box")]
        box_index: Option<usize>,
        #[arg(long)]
        slot: usize,
        #[arg(long)]
        output: PathBuf,
    },
    /// Apply trainer edits, recompute every checksum and write the image
    Resign {
        #[command(flatten)]
        input: Input,
        #[arg(long)]
        output: PathBuf,
        #[arg(long = "set-money")]
        money: Option<u32>,
        #[arg(long = "set-ot")]
        ot_name: Option<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let input = match &cli.command {
        Command::Summary { input }
        | Command::List { input, .. }
        | Command::Export { input, .. }
        | Command::Resign { input, .. } => input,
    };
    let engine = Engine::new(build_registry(input));
    let bytes = fs::read(&input.path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {e}", input.path.display());
        process::exit(1);
    });
    let mut session = engine.open_bytes(bytes, input.game).unwrap_or_else(|e| {
        eprintln!("Error parsing save file: {}", input.path.display());
        eprintln!("  {e}");
        process::exit(1);
    });

    match &cli.command {
        Command::Summary { .. } => {
            let snapshot = session.snapshot().unwrap_or_else(|e| fail("reading the save", e));
            if cli.json {
                let value =
                    serde_json::to_value(&snapshot).unwrap_or_else(|e| fail("rendering JSON", e));
                print_json(&value);
            } else {
                print_summary(&session, &snapshot);
            }
        }
        Command::List { box_index, .. } => list_box(&session, *box_index, cli.json),
        Command::Export {
            box_index,
            slot,
            output,
            ..
        } => {
            let save = session.container();
            let pk = match box_index {
                Some(b) => save.pkm(*b, *slot),
                None => save.party_pkm(*slot),
            }
            .unwrap_or_else(|e| fail("reading the slot", e));
            if pk.is_empty() {
                eprintln!("Slot {slot} is empty");
                process::exit(1);
            }
            write_file(output, pk.bytes());
            println!("Wrote {} bytes to {}", pk.bytes().len(), output.display());
        }
        Command::Resign {
            output,
            money,
            ot_name,
            ..
        } => {
            let save = session.container_mut();
            if let Some(money) = money {
                save.set_money(*money).unwrap_or_else(|e| fail("applying money edit", e));
            }
            if let Some(name) = ot_name {
                save.set_ot_name(name).unwrap_or_else(|e| fail("applying OT name edit", e));
            }
            let edited = session.finish().unwrap_or_else(|e| fail("sealing the save", e));
            write_file(output, &edited);
            println!("Wrote re-signed save to {}", output.display());
        }
    }
}

fn build_registry(input: &Input) -> TableRegistry {
    let mut registry = TableRegistry::new();
    for (generation, path) in &input.personal {
        registry
            .load_personal(*generation, path)
            .unwrap_or_else(|e| fail(&format!("loading {}", path.display()), e));
    }
    if !input.strings.is_empty() {
        let mut tables = StringTables::new();
        for (language, path) in &input.strings {
            let bytes = read_resource(path)
                .unwrap_or_else(|e| fail(&format!("loading {}", path.display()), e));
            tables
                .load_json(*language, &bytes)
                .unwrap_or_else(|e| fail(&format!("loading {}", path.display()), e));
        }
        registry = registry.with_localizer(Box::new(tables));
    }
    if let Some(path) = &input.swsh_keys {
        registry
            .load_swsh_keys(path)
            .unwrap_or_else(|e| fail(&format!("loading {}", path.display()), e));
    }
    registry
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn print_summary(session: &Session, snapshot: &Snapshot) {
    let trainer = &snapshot.trainer;
    let time = trainer.play_time;
    println!("Game:      {} ({:?})", snapshot.game, session.version());
    println!("Trainer:   {}", trainer.ot_name);
    println!("TID/SID:   {:05}/{:05}", trainer.tid, trainer.sid);
    println!("Money:     {}", trainer.money);
    println!(
        "Play time: {}:{:02}:{:02}",
        time.hours, time.minutes, time.seconds
    );
    println!();
    println!("Party ({}):", snapshot.party.len());
    for (i, pk) in snapshot.party.iter().enumerate() {
        println!("  {}. {}", i + 1, describe(session, pk));
    }
    let occupied: usize = snapshot.boxes.iter().map(|b| b.occupied).sum();
    let capacity: usize = snapshot.boxes.iter().map(|b| b.capacity).sum();
    println!();
    println!("Boxes:     {occupied}/{capacity} slots in {} boxes", snapshot.boxes.len());
    println!(
        "Dex:       {} caught, {} seen",
        snapshot.dex_caught, snapshot.dex_seen
    );
}

fn list_box(session: &Session, box_index: usize, as_json: bool) {
    let save = session.container();
    let mut rows = Vec::new();
    for slot in 0..save.slots_per_box() {
        let pk = save
            .pkm(box_index, slot)
            .unwrap_or_else(|e| fail("reading the box", e));
        if !pk.is_empty() {
            rows.push((slot, pk.summary(session.registry())));
        }
    }
    if as_json {
        let slots: Vec<JsonValue> = rows
            .iter()
            .map(|(slot, pk)| json!({ "slot": slot, "pkm": pk }))
            .collect();
        print_json(&json!({ "box": box_index, "slots": slots }));
        return;
    }
    println!("Box {} ({} occupied)", box_index + 1, rows.len());
    for (slot, pk) in &rows {
        println!("  {:>2}: {}", slot + 1, describe(session, pk));
    }
}

fn describe(session: &Session, pk: &PkmSummary) -> String {
    let name = session.registry().species_name(pk.language, pk.species);
    let level = pk
        .level
        .map(|l| format!("Lv. {l}"))
        .unwrap_or_else(|| "Lv. ?".to_string());
    let mut line = format!("{name} {level}");
    if pk.nickname != name && !pk.nickname.is_empty() {
        line.push_str(&format!(" \"{}\"", pk.nickname));
    }
    if pk.is_egg {
        line.push_str(" [Egg]");
    }
    if pk.is_shiny {
        line.push_str(" [Shiny]");
    }
    line
}

fn print_json(value: &JsonValue) {
    let rendered =
        serde_json::to_string_pretty(value).unwrap_or_else(|e| fail("rendering JSON", e));
    println!("{rendered}");
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn fail(action: &str, e: impl std::fmt::Display) -> ! {
    eprintln!("Error {action}: {e}");
    process::exit(1);
}

fn write_file(path: &Path, bytes: &[u8]) {
    fs::write(path, bytes).unwrap_or_else(|e| {
        eprintln!("Error writing {}: {e}", path.display());
        process::exit(1);
    });
}

fn parse_version(value: &str) -> Result<GameVersion, String> {
    GameVersion::from_name(value).ok_or_else(|| {
        format!("invalid game value '{value}', expected a version name such as emerald or 41")
    })
}

fn parse_personal(value: &str) -> Result<(Generation, PathBuf), String> {
    let (generation, path) = split_pair(value)?;
    let generation = generation
        .parse::<u8>()
        .ok()
        .and_then(Generation::from_number)
        .ok_or_else(|| format!("invalid generation '{generation}', expected 1 to 8"))?;
    Ok((generation, path))
}

fn parse_strings(value: &str) -> Result<(Language, PathBuf), String> {
    let (language, path) = split_pair(value)?;
    let language = Language::from_code(language)
        .ok_or_else(|| format!("invalid language '{language}', expected a code such as eng"))?;
    Ok((language, path))
}

fn split_pair(value: &str) -> Result<(&str, PathBuf), String> {
    value
        .split_once('=')
        .map(|(key, path)| (key, PathBuf::from(path)))
        .ok_or_else(|| format!("expected KEY=PATH, got '{value}'"))
}
