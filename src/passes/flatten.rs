//! Flattening: expands chords, note-offset sets, and scaled/offset
//! subtrees into a single `FLATSIMULTENCE` of absolute-time-offset
//! leaves.
//!
//! Must run after the join pass. Every `ABSNOTE`/`ABSDRUM` in the
//! input becomes one `OFFSETEXPR` leaf in the output; nothing else
//! survives except `TEMPOCHANGE`/`VOLUMECHANGE`/`MARKER`, which are
//! carried through unchanged but time-stamped.

use crate::ast::{ExprKind, MusicExpr, MIN_LENGTH};
use crate::error::{CompileError, Result};

/// Runs the flatten pass, producing a `FLATSIMULTENCE` node whose
/// length is the running maximum offset reached by any leaf.
pub fn flatten(expr: &MusicExpr) -> Result<MusicExpr> {
    let mut events = Vec::new();
    let end = walk(expr, 0.0, &mut events)?;

    let inner = MusicExpr::new(expr.id, expr.textloc, ExprKind::Simultence(events));
    Ok(MusicExpr::new(
        expr.id,
        expr.textloc,
        ExprKind::FlatSimultence {
            length: end,
            child: Box::new(inner),
        },
    ))
}

fn walk(expr: &MusicExpr, offset: f32, events: &mut Vec<MusicExpr>) -> Result<f32> {
    match &expr.kind {
        ExprKind::AbsNote(n) => {
            emit(expr, offset, events);
            Ok(offset + n.length)
        }
        ExprKind::AbsDrum(d) => {
            emit(expr, offset, events);
            Ok(offset + d.length)
        }
        ExprKind::Rest { length } => Ok(offset + length),
        ExprKind::Empty => Ok(offset),

        ExprKind::Chord { chordtype, child } => {
            if !matches!(child.kind, ExprKind::AbsNote(_)) {
                return Err(CompileError::invariant(
                    "CHORD child must resolve to ABSNOTE before flattening",
                ));
            }
            let synthesized = MusicExpr::new(
                expr.id,
                expr.textloc,
                ExprKind::NoteOffsetExpr {
                    child: child.clone(),
                    offsets: chordtype.offsets().to_vec(),
                },
            );
            walk(&synthesized, offset, events)
        }

        ExprKind::NoteOffsetExpr { child, offsets } => {
            let mut max_end = offset;
            for note_offset in offsets {
                let mut cloned = (**child).clone();
                apply_note_offset(&mut cloned, *note_offset);
                let end = walk(&cloned, offset, events)?;
                max_end = max_end.max(end);
            }
            Ok(max_end)
        }

        ExprKind::OffsetExpr { offset: shift, child } => walk(child, offset + shift, events),

        ExprKind::OnTrack { child, .. } => walk(child, offset, events),

        ExprKind::ScaledExpr { length: target, child } => {
            if *target < MIN_LENGTH {
                return Ok(offset);
            }
            let intrinsic = length(child)?;
            if intrinsic.abs() < MIN_LENGTH {
                return Ok(offset);
            }
            let factor = target / intrinsic;
            let mut cloned = (**child).clone();
            stretch(&mut cloned, factor);
            walk(&cloned, offset, events)
        }

        ExprKind::Sequence(items) => {
            let mut cur = offset;
            for item in items {
                cur = walk(item, cur, events)?;
            }
            Ok(cur)
        }

        ExprKind::Simultence(items) => {
            let mut max_end = offset;
            for item in items {
                let end = walk(item, offset, events)?;
                max_end = max_end.max(end);
            }
            Ok(max_end)
        }

        ExprKind::FlatSimultence { length: stored, child } => {
            let computed = walk(child, offset, events)?;
            Ok((offset + stored).max(computed))
        }

        ExprKind::JoinExpr { a, b } => {
            // Not expected post join-pass except when the join pass
            // left an un-fusable pair marked `joining` instead; treat
            // the pair as adjacent in time.
            let mid = walk(a, offset, events)?;
            walk(b, mid, events)
        }

        ExprKind::TempoChange { .. } | ExprKind::VolumeChange { .. } | ExprKind::Marker => {
            emit(expr, offset, events);
            Ok(offset)
        }

        ExprKind::RelNote(_) | ExprKind::RelDrum(_) | ExprKind::RelSimultence { .. } => Err(
            CompileError::invariant("relative-pitch node survived into the flatten pass"),
        ),

        ExprKind::Function { .. } => Err(CompileError::invariant(
            "FUNCTION node survived into the flatten pass",
        )),
    }
}

fn emit(leaf: &MusicExpr, offset: f32, events: &mut Vec<MusicExpr>) {
    events.push(MusicExpr::new(
        leaf.id,
        leaf.textloc,
        ExprKind::OffsetExpr {
            offset,
            child: Box::new(leaf.clone()),
        },
    ));
}

/// The intrinsic measure-length of an already-absolute expression,
/// per §4.5.1: the length it would occupy on its own, ignoring any
/// enclosing offset.
pub fn length(expr: &MusicExpr) -> Result<f32> {
    Ok(match &expr.kind {
        ExprKind::AbsNote(n) => n.length,
        ExprKind::AbsDrum(d) => d.length,
        ExprKind::Rest { length } => *length,
        ExprKind::ScaledExpr { length, .. } => *length,
        ExprKind::FlatSimultence { length, .. } => *length,
        ExprKind::Empty | ExprKind::TempoChange { .. } | ExprKind::VolumeChange { .. } | ExprKind::Marker => 0.0,
        ExprKind::Chord { child, .. } | ExprKind::NoteOffsetExpr { child, .. } | ExprKind::OnTrack { child, .. } => {
            length(child)?
        }
        ExprKind::OffsetExpr { offset, child } => offset + length(child)?,
        ExprKind::JoinExpr { a, b } => length(a)? + length(b)?,
        ExprKind::Sequence(items) => {
            let mut total = 0.0;
            for item in items {
                total += length(item)?;
            }
            total
        }
        ExprKind::Simultence(items) => {
            let mut max_len: f32 = 0.0;
            for item in items {
                max_len = max_len.max(length(item)?);
            }
            max_len
        }
        ExprKind::RelNote(_) | ExprKind::RelDrum(_) | ExprKind::RelSimultence { .. } | ExprKind::Function { .. } => {
            return Err(CompileError::invariant(
                "length() called on an unresolved relative or function node",
            ))
        }
    })
}

/// Multiplies every note, rest, scaled, and offset length in place by
/// `factor`. Used by `ScaledExpr` handling to retime a cloned subtree
/// to its target duration.
pub fn stretch(expr: &mut MusicExpr, factor: f32) {
    match &mut expr.kind {
        ExprKind::AbsNote(n) => n.length *= factor,
        ExprKind::AbsDrum(d) => d.length *= factor,
        ExprKind::Rest { length } => *length *= factor,
        ExprKind::ScaledExpr { length, child } => {
            *length *= factor;
            stretch(child, factor);
        }
        ExprKind::RelSimultence { length, child } => {
            *length *= factor;
            stretch(child, factor);
        }
        ExprKind::FlatSimultence { length, child } => {
            *length *= factor;
            stretch(child, factor);
        }
        ExprKind::OffsetExpr { offset, child } => {
            *offset *= factor;
            stretch(child, factor);
        }
        ExprKind::Chord { child, .. }
        | ExprKind::NoteOffsetExpr { child, .. }
        | ExprKind::OnTrack { child, .. } => stretch(child, factor),
        ExprKind::JoinExpr { a, b } => {
            stretch(a, factor);
            stretch(b, factor);
        }
        ExprKind::Sequence(items) | ExprKind::Simultence(items) => {
            for item in items {
                stretch(item, factor);
            }
        }
        ExprKind::RelNote(n) => n.length *= factor,
        ExprKind::RelDrum(d) => d.length *= factor,
        ExprKind::Empty | ExprKind::TempoChange { .. } | ExprKind::VolumeChange { .. } | ExprKind::Marker | ExprKind::Function { .. } => {}
    }
}

/// Shifts every `ABSNOTE` pitch inside the subtree by `offset`
/// semitones, leaving rests and empties untouched. Used to expand a
/// chord's root note into its stacked voicing.
fn apply_note_offset(expr: &mut MusicExpr, offset: i32) {
    match &mut expr.kind {
        ExprKind::AbsNote(n) => n.note += offset,
        ExprKind::JoinExpr { a, b } => {
            apply_note_offset(a, offset);
            apply_note_offset(b, offset);
        }
        ExprKind::Sequence(items) | ExprKind::Simultence(items) => {
            for item in items {
                apply_note_offset(item, offset);
            }
        }
        ExprKind::Chord { child, .. }
        | ExprKind::NoteOffsetExpr { child, .. }
        | ExprKind::OffsetExpr { child, .. }
        | ExprKind::OnTrack { child, .. }
        | ExprKind::ScaledExpr { child, .. }
        | ExprKind::RelSimultence { child, .. }
        | ExprKind::FlatSimultence { child, .. } => apply_note_offset(child, offset),
        ExprKind::Rest { .. } | ExprKind::Empty | ExprKind::AbsDrum(_) => {}
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AbsNote;
    use crate::chord::ChordType;
    use crate::instrument::DEFAULT_TONED;
    use crate::notesym::NoteSym;
    use crate::textloc::Textloc;
    use crate::track::TrackId;

    fn note(pitch: i32, len: f32) -> MusicExpr {
        MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::AbsNote(AbsNote {
                notesym: NoteSym::C,
                note: pitch,
                length: len,
                track: TrackId(0),
                instrument: &DEFAULT_TONED,
            }),
        )
    }

    fn offsets_of(flat: &MusicExpr) -> Vec<(f32, i32)> {
        let ExprKind::FlatSimultence { child, .. } = &flat.kind else {
            panic!("expected FLATSIMULTENCE");
        };
        let ExprKind::Simultence(items) = &child.kind else {
            panic!("expected inner SIMULTENCE");
        };
        items
            .iter()
            .map(|item| match &item.kind {
                ExprKind::OffsetExpr { offset, child } => match &child.kind {
                    ExprKind::AbsNote(n) => (*offset, n.note),
                    other => panic!("unexpected leaf {other:?}"),
                },
                other => panic!("expected OFFSETEXPR, got {other:?}"),
            })
            .collect()
    }

    #[test]
    fn sequence_of_notes_flattens_to_increasing_offsets() {
        let seq = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::Sequence(vec![note(60, 0.25), note(62, 0.25), note(64, 0.25)]),
        );
        let flat = flatten(&seq).unwrap();
        assert_eq!(offsets_of(&flat), vec![(0.0, 60), (0.25, 62), (0.5, 64)]);
        match flat.kind {
            ExprKind::FlatSimultence { length, .. } => assert!((length - 0.75).abs() < 1e-6),
            _ => unreachable!(),
        }
    }

    #[test]
    fn chord_expands_to_simultaneous_notes() {
        let chord = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::Chord {
                chordtype: ChordType::Maj,
                child: Box::new(note(60, 0.25)),
            },
        );
        let flat = flatten(&chord).unwrap();
        let mut result = offsets_of(&flat);
        result.sort_by_key(|(_, note)| *note);
        assert_eq!(result, vec![(0.0, 60), (0.0, 64), (0.0, 67)]);
    }

    #[test]
    fn rest_advances_offset_without_emitting() {
        let seq = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::Sequence(vec![
                MusicExpr::new(0, Textloc::zero(), ExprKind::Rest { length: 0.25 }),
                note(60, 0.25),
            ]),
        );
        let flat = flatten(&seq).unwrap();
        assert_eq!(offsets_of(&flat), vec![(0.25, 60)]);
    }

    #[test]
    fn scaled_expr_retimes_child_to_target_length() {
        let scaled = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::ScaledExpr {
                length: 0.5,
                child: Box::new(MusicExpr::new(
                    0,
                    Textloc::zero(),
                    ExprKind::Sequence(vec![note(60, 0.25), note(62, 0.25)]),
                )),
            },
        );
        let flat = flatten(&scaled).unwrap();
        assert_eq!(offsets_of(&flat), vec![(0.0, 60), (0.25, 62)]);
        match flat.kind {
            ExprKind::FlatSimultence { length, .. } => assert!((length - 0.5).abs() < 1e-6),
            _ => unreachable!(),
        }
    }

    #[test]
    fn length_matches_flatten_round_trip() {
        let seq = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::Sequence(vec![note(60, 0.25), note(62, 0.5)]),
        );
        let computed = length(&seq).unwrap();
        let flat = flatten(&seq).unwrap();
        match flat.kind {
            ExprKind::FlatSimultence { length: flat_len, .. } => {
                assert!((flat_len - computed).abs() < 1e-6);
            }
            _ => unreachable!(),
        }
    }
}
