//! Relative-to-absolute pitch and length resolution.
//!
//! Threads a sliding "previous note" context through the tree,
//! converting `RELNOTE`/`RELDRUM`/`RELSIMULTENCE` into their absolute
//! forms. Must run after function application and before the join
//! pass (see `compiler`).

use crate::ast::{AbsDrum, AbsNote, ExprKind, MusicExpr, TrackRef};
use crate::chord::ChordType;
use crate::error::{CompileError, Result};
use crate::notesym::{compare_notesyms, NoteSym};
use crate::track::Song;

#[derive(Debug, Clone)]
struct Prev {
    absnote: AbsNote,
    chordtype: ChordType,
}

/// Runs the pass over the whole tree, seeding the initial context from
/// the song's default track (quarter-note C4, major chords).
pub fn resolve(song: &Song, expr: &mut MusicExpr) -> Result<()> {
    let default_track = song.default_track;
    let instrument = song.track(default_track).default_instrument();

    let mut prev = Prev {
        absnote: AbsNote {
            notesym: NoteSym::C,
            note: 60,
            length: 0.25,
            track: default_track,
            instrument,
        },
        chordtype: ChordType::Maj,
    };

    relative_to_absolute(song, expr, &mut prev)
}

fn relative_to_absolute(song: &Song, expr: &mut MusicExpr, prev: &mut Prev) -> Result<()> {
    let kind = std::mem::replace(&mut expr.kind, ExprKind::Empty);

    let new_kind = match kind {
        ExprKind::AbsNote(absnote) => {
            prev.absnote = absnote.clone();
            ExprKind::AbsNote(absnote)
        }

        ExprKind::AbsDrum(absdrum) => ExprKind::AbsDrum(absdrum),

        ExprKind::RelDrum(reldrum) => {
            let length = if reldrum.length == 0.0 {
                prev.absnote.length
            } else {
                prev.absnote.length = reldrum.length;
                reldrum.length
            };
            ExprKind::AbsDrum(AbsDrum {
                drumsym: reldrum.drumsym,
                note: reldrum.drumsym.note(),
                length,
                track: prev.absnote.track,
                instrument: prev.absnote.instrument,
            })
        }

        ExprKind::RelNote(relnote) => {
            let notevalue = relnote.notesym.semitone();
            let mut note = 12 * (prev.absnote.note / 12) + notevalue + relnote.notemods;

            // cmp>0 with prev still above the naive note means the naive
            // note wrapped below prev's octave and needs to jump up one;
            // cmp<0 with prev still below means it wrapped above and
            // needs to drop one. See DESIGN.md for why this follows
            // relative.c's literal direction rather than the spec prose.
            match compare_notesyms(prev.absnote.notesym, relnote.notesym) {
                std::cmp::Ordering::Greater if prev.absnote.note > note => note += 12,
                std::cmp::Ordering::Less if prev.absnote.note < note => note -= 12,
                _ => {}
            }
            note += 12 * relnote.octavemods;

            let length = if relnote.length == 0.0 {
                prev.absnote.length
            } else {
                relnote.length
            };

            let absnote = AbsNote {
                notesym: relnote.notesym,
                note,
                length,
                track: prev.absnote.track,
                instrument: prev.absnote.instrument,
            };
            prev.absnote = absnote.clone();
            ExprKind::AbsNote(absnote)
        }

        ExprKind::Rest { mut length } => {
            if length == 0.0 {
                length = prev.absnote.length;
            } else {
                prev.absnote.length = length;
            }
            ExprKind::Rest { length }
        }

        ExprKind::Empty => ExprKind::Empty,

        ExprKind::Chord { mut chordtype, mut child } => {
            relative_to_absolute(song, &mut child, prev)?;
            if chordtype == ChordType::None {
                chordtype = prev.chordtype;
            }
            prev.chordtype = chordtype;
            ExprKind::Chord { chordtype, child }
        }

        ExprKind::NoteOffsetExpr { mut child, offsets } => {
            relative_to_absolute(song, &mut child, prev)?;
            ExprKind::NoteOffsetExpr { child, offsets }
        }

        ExprKind::OffsetExpr { offset, mut child } => {
            relative_to_absolute(song, &mut child, prev)?;
            ExprKind::OffsetExpr { offset, child }
        }

        ExprKind::OnTrack { track, mut child } => {
            let track_id = track.id();
            let saved = prev.clone();
            prev.absnote.track = track_id;
            prev.absnote.instrument = song.track(track_id).default_instrument();
            relative_to_absolute(song, &mut child, prev)?;
            *prev = saved;
            ExprKind::OnTrack {
                track: TrackRef::Id(track_id),
                child,
            }
        }

        ExprKind::JoinExpr { mut a, mut b } => {
            relative_to_absolute(song, &mut a, prev)?;
            relative_to_absolute(song, &mut b, prev)?;
            ExprKind::JoinExpr { a, b }
        }

        ExprKind::Sequence(mut items) => {
            let saved = prev.clone();
            let mut snapshot = saved.clone();
            let mut first_seen = false;
            for item in items.iter_mut() {
                relative_to_absolute(song, item, prev)?;
                if !first_seen {
                    snapshot = prev.clone();
                    first_seen = true;
                }
            }
            *prev = snapshot;
            ExprKind::Sequence(items)
        }

        ExprKind::Simultence(mut items) => {
            let saved = prev.clone();
            for item in items.iter_mut() {
                let mut branch = saved.clone();
                relative_to_absolute(song, item, &mut branch)?;
            }
            *prev = saved;
            ExprKind::Simultence(items)
        }

        ExprKind::RelSimultence { mut length, mut child } => {
            if length == 0.0 {
                length = prev.absnote.length;
            }

            {
                let items = match &mut child.kind {
                    ExprKind::Simultence(items) => items,
                    _ => {
                        return Err(CompileError::invariant(
                            "RELSIMULTENCE child must be SIMULTENCE",
                        ))
                    }
                };
                let mut snapshot = prev.clone();
                let mut first_seen = false;
                for item in items.iter_mut() {
                    relative_to_absolute(song, item, prev)?;
                    if !first_seen {
                        snapshot = prev.clone();
                        first_seen = true;
                    }
                }
                *prev = snapshot;
            }

            prev.absnote.length = length;
            ExprKind::ScaledExpr { length, child }
        }

        ExprKind::ScaledExpr { length, mut child } => {
            relative_to_absolute(song, &mut child, prev)?;
            ExprKind::ScaledExpr { length, child }
        }

        ExprKind::FlatSimultence { .. } => {
            return Err(CompileError::invariant(
                "FLATSIMULTENCE must not appear before the flatten pass",
            ))
        }

        ExprKind::Function { .. } => {
            return Err(CompileError::invariant(
                "FUNCTION must not survive the function-application pass",
            ))
        }

        other @ (ExprKind::TempoChange { .. } | ExprKind::VolumeChange { .. } | ExprKind::Marker) => other,
    };

    expr.kind = new_kind;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::RelNote;
    use crate::textloc::Textloc;

    fn relnote(notesym: NoteSym, notemods: i32, octavemods: i32, length: f32) -> MusicExpr {
        MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::RelNote(RelNote {
                notesym,
                notemods,
                octavemods,
                length,
            }),
        )
    }

    fn abs_note(expr: &MusicExpr) -> &AbsNote {
        match &expr.kind {
            ExprKind::AbsNote(n) => n,
            other => panic!("expected AbsNote, got {other:?}"),
        }
    }

    #[test]
    fn c_scale_resolves_to_ascending_semitones() {
        let song = Song::new();
        let mut seq = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::Sequence(vec![
                relnote(NoteSym::C, 0, 0, 0.25),
                relnote(NoteSym::D, 0, 0, 0.25),
                relnote(NoteSym::E, 0, 0, 0.25),
                relnote(NoteSym::F, 0, 0, 0.25),
                relnote(NoteSym::G, 0, 0, 0.25),
            ]),
        );
        resolve(&song, &mut seq).unwrap();

        let items = match &seq.kind {
            ExprKind::Sequence(items) => items,
            _ => unreachable!(),
        };
        let notes: Vec<i32> = items.iter().map(|e| abs_note(e).note).collect();
        assert_eq!(notes, vec![60, 62, 64, 65, 67]);
    }

    #[test]
    fn octave_crossing_scenario() {
        // "c b": prev is C4=60. Naive B lands at 71 (above prev), but
        // cmp(C,B) is Less and prev(60) < naive(71), so relative.c's
        // literal direction drops it an octave to 59. See DESIGN.md.
        let song = Song::new();
        let mut seq = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::Sequence(vec![relnote(NoteSym::C, 0, 0, 0.25), relnote(NoteSym::B, 0, 0, 0.25)]),
        );
        resolve(&song, &mut seq).unwrap();
        let items = match &seq.kind {
            ExprKind::Sequence(items) => items,
            _ => unreachable!(),
        };
        assert_eq!(abs_note(&items[1]).note, 59);
    }

    #[test]
    fn simultence_does_not_leak_pitch_context_to_next_sibling() {
        let song = Song::new();
        let mut seq = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::Sequence(vec![
                MusicExpr::new(
                    0,
                    Textloc::zero(),
                    ExprKind::Simultence(vec![relnote(NoteSym::G, 0, 1, 0.25), relnote(NoteSym::C, 0, 0, 0.25)]),
                ),
                relnote(NoteSym::C, 0, 0, 0.25),
            ]),
        );
        resolve(&song, &mut seq).unwrap();
        let items = match &seq.kind {
            ExprKind::Sequence(items) => items,
            _ => unreachable!(),
        };
        let trailing = match &items[1].kind {
            ExprKind::Simultence(_) => panic!("expected the trailing note, not the simultence"),
            ExprKind::AbsNote(n) => n,
            other => panic!("unexpected kind {other:?}"),
        };
        // Default prev (C4=60) must still govern the trailing note, not the
        // simultence's second child (also C, but with a different octave
        // context had it leaked).
        assert_eq!(trailing.note, 60);
    }

    #[test]
    fn relsimultence_becomes_scaledexpr() {
        let song = Song::new();
        let mut expr = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::RelSimultence {
                length: 0.5,
                child: Box::new(MusicExpr::new(
                    0,
                    Textloc::zero(),
                    ExprKind::Simultence(vec![relnote(NoteSym::C, 0, 0, 0.0)]),
                )),
            },
        );
        resolve(&song, &mut expr).unwrap();
        assert!(matches!(expr.kind, ExprKind::ScaledExpr { length, .. } if length == 0.5));
    }
}
