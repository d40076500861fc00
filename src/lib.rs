//! mdlc - compiles a textual music notation tree into a time-ordered
//! MIDI event stream.
//!
//! This crate provides the core compiler pipeline: function
//! application, relative-to-absolute pitch resolution, join fusion,
//! flattening, and dynamic channel allocation. Parsing the source
//! text into an expression tree, and delivering the resulting event
//! stream to an actual MIDI device, are both out of scope — see
//! `compiler::compile` for the single entry point this crate exposes.

pub mod ast;
pub mod chord;
pub mod compiler;
pub mod error;
pub mod event;
pub mod instrument;
pub mod midistream;
pub mod notesym;
pub mod passes;
pub mod textloc;
pub mod track;

pub use compiler::{compile, Compiler};
pub use error::{CompileError, Result};
pub use event::TimedMidiEvent;
pub use track::Song;
