use std::fs;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use strumline::{Song, StrumError};

#[derive(Parser, Debug)]
#[command(name = "strumline")]
#[command(about = "Render pluck, strum and tab song documents to MIDI", long_about = None)]
struct Args {
    /// Song document (YAML)
    song: PathBuf,

    /// Output MIDI file (default: the song's `output`, else `<song>.mid`)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Seed for time and velocity randomization
    #[arg(long)]
    seed: Option<u64>,

    /// Print the finished tracks as YAML instead of writing a file
    #[arg(long)]
    events: bool,

    /// More logging (-v debug, -vv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(args: Args) -> Result<(), StrumError> {
    let source = fs::read_to_string(&args.song)?;
    let mut song = Song::from_yaml(&source)?;
    if args.seed.is_some() {
        song.config.seed = args.seed;
    }

    let sequence = song.render()?;

    if args.events {
        print!("{}", serde_yaml::to_string(&sequence)?);
        return Ok(());
    }

    let path = args
        .output
        .or_else(|| sequence.output.clone())
        .unwrap_or_else(|| args.song.with_extension("mid"));
    sequence.write_to_file(&path)?;
    eprintln!("Wrote MIDI to {}", path.display());
    Ok(())
}
