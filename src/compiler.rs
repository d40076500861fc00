//! Top-level pipeline: owns the per-compile node-id counter and
//! threads an expression tree through every pass in order.

use crate::ast::{ExprKind, MusicExpr, NodeId};
use crate::error::{CompileError, Result};
use crate::event::{self, TimedMidiEvent};
use crate::midistream;
use crate::passes::{flatten, functions, join, relative};
use crate::track::Song;

/// Owns the monotonic node-id counter for one compile. Running several
/// compiles concurrently just means constructing one `Compiler` per
/// thread; nothing here is shared.
pub struct Compiler {
    next_id: NodeId,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler { next_id: 1 }
    }

    /// Mints the next node id, failing fatally on overflow rather than
    /// wrapping into a reused id.
    pub fn next_id(&mut self) -> Result<NodeId> {
        let id = self.next_id;
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| CompileError::resource_exhausted("node id counter overflowed"))?;
        Ok(id)
    }
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs the full pipeline: track canonicalization, function
/// application, relative-to-absolute resolution, join fusion,
/// flattening, channel allocation, and record encoding.
pub fn compile(compiler: &mut Compiler, song: &mut Song, mut root: MusicExpr) -> Result<Vec<TimedMidiEvent>> {
    root.id = compiler.next_id()?;
    tracing::debug!(node_id = root.id, "starting compile");

    song.canonicalize_tracks(&mut root);
    tracing::trace!("track canonicalization complete");

    functions::apply(&mut root)?;
    tracing::trace!("function application complete");

    relative::resolve(song, &mut root)?;
    tracing::trace!("relative-to-absolute resolution complete");

    join::apply(&mut root);
    tracing::trace!("join pass complete");

    let flat = flatten::flatten(&root)?;
    let length = match &flat.kind {
        ExprKind::FlatSimultence { length, .. } => *length,
        other => {
            return Err(CompileError::invariant(format!(
                "flatten() must return FLATSIMULTENCE, got {other:?}"
            )))
        }
    };
    tracing::debug!(song_length = length, "flattened to offset stream");

    let stream = midistream::build(&flat)?;
    let resolved = midistream::allocate(song, &stream, length)?;
    tracing::info!(event_count = resolved.len(), "compile finished");

    Ok(event::from_resolved(&resolved))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RelNote;
    use crate::event::TimedMidiEvent as Tme;
    use crate::notesym::NoteSym;
    use crate::textloc::Textloc;

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

    #[test]
    fn c_scale_compiles_to_expected_note_on_sequence() {
        let mut song = Song::new();
        let mut compiler = Compiler::new();
        let root = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::Sequence(vec![
                relnote(NoteSym::C),
                relnote(NoteSym::D),
                relnote(NoteSym::E),
                relnote(NoteSym::F),
                relnote(NoteSym::G),
            ]),
        );

        let events = compile(&mut compiler, &mut song, root).unwrap();
        let notes_on: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                Tme::NoteOn { note, .. } => Some(*note),
                _ => None,
            })
            .collect();
        assert_eq!(notes_on, vec![60, 62, 64, 65, 67]);
        assert!(matches!(events.last(), Some(Tme::SongEnd { .. })));
    }

    #[test]
    fn unknown_function_aborts_the_whole_compile() {
        let mut song = Song::new();
        let mut compiler = Compiler::new();
        let root = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::Function {
                name: "reverb".to_string(),
                args: vec![],
            },
        );
        assert!(compile(&mut compiler, &mut song, root).is_err());
    }
}
