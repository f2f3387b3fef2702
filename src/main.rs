use clap::Parser;
use nananana::pipeline::{Orchestrator, PlaybackConfig};
use nananana::player::detect_backend;
use nananana::songs;

const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const BLACK_BG: &str = "\x1b[40m";
const RESET: &str = "\x1b[0m";

const LOGO: &str = r#"
      _,    _   _    ,_
  .o888P     Y8o8Y     Y888o.
 d88888      88888      88888b
d888888b_  _d88888b_  _d888888b
8888888888888888888888888888888
8888888888888888888888888888888
YJGS8P"Y888P"Y888P"Y888P"Y8888P
 Y888   '8'   Y8P   '8'   888Y
  "8o          V          o8"
    `                     `
"#;

/// Play the Batman theme song from your terminal
#[derive(Parser, Debug)]
#[command(name = "nananana", version)]
struct Cli {
    /// Play the single-note melody
    #[arg(short, long, group = "mode")]
    basic: bool,

    /// Play the two-hand piano arrangement
    #[arg(short, long, group = "mode")]
    piano: bool,

    /// Play a short tour of every event kind
    #[arg(short, long, group = "mode")]
    demo: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let sequence = if cli.basic {
        songs::basic()?
    } else if cli.piano {
        songs::piano()?
    } else if cli.demo {
        songs::demo()?
    } else {
        songs::theme()?
    };

    println!("{YELLOW}{BOLD}{BLACK_BG}{LOGO}{RESET}");
    println!("{YELLOW}{BOLD}Playing Batman Theme...{RESET}");

    let mut orchestrator = Orchestrator::new(detect_backend(), PlaybackConfig::default());
    orchestrator.play(&sequence);

    println!("{YELLOW}{BOLD}BATMAN!{RESET}");
    Ok(())
}
