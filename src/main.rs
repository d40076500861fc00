//! mdlc - thin CLI front-end over the compiler core.
//!
//! This is a smoke-testing convenience, not the real multi-process
//! driver (parsing, sandboxing, and sequencer IPC are all out of
//! scope for the core and absent here): it compiles a small embedded
//! test program and writes the resulting binary event stream to
//! stdout or a file.

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use mdlc::ast::{AbsNote, ExprKind, MusicExpr, RelNote};
use mdlc::event::write_all;
use mdlc::notesym::NoteSym;
use mdlc::textloc::Textloc;
use mdlc::{compile, Compiler, Song};

/// Command-line options for the binary.
struct CliOptions {
    /// Destination for the binary event stream; `None` means stdout.
    out: Option<PathBuf>,
}

impl CliOptions {
    fn parse() -> Result<Option<Self>> {
        let mut out = None;
        let mut args = std::env::args().skip(1);

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out" => {
                    let path = args.next().context("--out requires a path argument")?;
                    out = Some(PathBuf::from(path));
                }
                "-h" | "--help" => {
                    print_help();
                    return Ok(None);
                }
                other => {
                    eprintln!("Unknown option: {other}");
                    eprintln!("Use --help for usage information");
                    return Ok(None);
                }
            }
        }

        Ok(Some(CliOptions { out }))
    }
}

fn print_help() {
    eprintln!("mdlc - compiles an embedded test program to a MIDI event stream");
    eprintln!();
    eprintln!("Usage: mdlc [--out <path>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --out <path>   Write the binary event stream to a file instead of stdout");
    eprintln!("  -h, --help     Print this help message");
}

fn relnote(notesym: NoteSym) -> MusicExpr {
    MusicExpr::new(
        0,
        Textloc::zero(),
        ExprKind::RelNote(RelNote {
            notesym,
            notemods: 0,
            octavemods: 0,
            length: 0.25,
        }),
    )
}

/// A small embedded program standing in for what the (out-of-scope)
/// parser would otherwise deliver: an ascending C major scale.
fn sample_program(default_track: mdlc::track::TrackId) -> MusicExpr {
    MusicExpr::new(
        0,
        Textloc::zero(),
        ExprKind::Sequence(vec![
            relnote(NoteSym::C),
            relnote(NoteSym::D),
            relnote(NoteSym::E),
            relnote(NoteSym::F),
            relnote(NoteSym::G),
            relnote(NoteSym::A),
            relnote(NoteSym::B),
            MusicExpr::new(
                0,
                Textloc::zero(),
                ExprKind::AbsNote(AbsNote {
                    notesym: NoteSym::C,
                    note: 72,
                    length: 0.5,
                    track: default_track,
                    instrument: &mdlc::instrument::DEFAULT_TONED,
                }),
            ),
        ]),
    )
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let options = match CliOptions::parse()? {
        Some(options) => options,
        None => return Ok(()),
    };

    let mut song = Song::new();
    let default_track = song.default_track;
    let mut compiler = Compiler::new();
    let events = compile(&mut compiler, &mut song, sample_program(default_track)).context("compile failed")?;

    tracing::info!(count = events.len(), "compiled sample program");

    match options.out {
        Some(path) => {
            let mut file = File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
            write_all(&events, &mut file).context("failed to write event stream")?;
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            write_all(&events, &mut lock).context("failed to write event stream")?;
            lock.flush().context("failed to flush stdout")?;
        }
    }

    Ok(())
}
