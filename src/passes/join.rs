//! Join pass: fuses runs of identical adjacent notes and rests that
//! were separated by a `~` (`JOINEXPR`) in the source, and flags the
//! cases it cannot fuse outright.
//!
//! Must run after the relative pass (no `RELNOTE` may remain) and
//! recurses bottom-up, so nested `JOINEXPR`s are already resolved by
//! the time a parent is considered.

use crate::ast::{ExprKind, MusicExpr, NodeId};
use crate::textloc::Textloc;

pub fn apply(expr: &mut MusicExpr) {
    for child in expr.children_mut() {
        apply(child);
    }

    if matches!(expr.kind, ExprKind::JoinExpr { .. }) {
        let id = expr.id;
        let textloc = expr.textloc;
        let kind = std::mem::replace(&mut expr.kind, ExprKind::Empty);
        if let ExprKind::JoinExpr { a, b } = kind {
            *expr = join_pair(*a, *b, id, textloc);
        }
    }
}

fn join_pair(a: MusicExpr, b: MusicExpr, fallback_id: NodeId, fallback_textloc: Textloc) -> MusicExpr {
    let MusicExpr {
        id: a_id,
        textloc: a_textloc,
        kind: a_kind,
        ..
    } = a;
    let MusicExpr {
        id: b_id,
        textloc: b_textloc,
        kind: b_kind,
        ..
    } = b;

    match (a_kind, b_kind) {
        (ExprKind::AbsNote(mut an), ExprKind::AbsNote(bn)) if an.note == bn.note => {
            an.length += bn.length;
            MusicExpr::new(a_id, a_textloc, ExprKind::AbsNote(an))
        }

        (ExprKind::Rest { length: al }, ExprKind::Rest { length: bl }) => {
            MusicExpr::new(a_id, a_textloc, ExprKind::Rest { length: al + bl })
        }

        (ExprKind::Sequence(mut a_items), ExprKind::Sequence(b_items)) => {
            splice_sequences(&mut a_items, b_items, fallback_id, fallback_textloc);
            MusicExpr::new(fallback_id, fallback_textloc, ExprKind::Sequence(a_items))
        }

        (a_kind @ (ExprKind::AbsNote(_) | ExprKind::Rest { .. }), ExprKind::Sequence(b_items)) => {
            let lifted_a = MusicExpr::new(a_id, a_textloc, ExprKind::Sequence(vec![MusicExpr::new(a_id, a_textloc, a_kind)]));
            join_pair(
                lifted_a,
                MusicExpr::new(b_id, b_textloc, ExprKind::Sequence(b_items)),
                fallback_id,
                fallback_textloc,
            )
        }

        (ExprKind::Sequence(a_items), b_kind @ (ExprKind::AbsNote(_) | ExprKind::Rest { .. })) => {
            let lifted_b = MusicExpr::new(b_id, b_textloc, ExprKind::Sequence(vec![MusicExpr::new(b_id, b_textloc, b_kind)]));
            join_pair(
                MusicExpr::new(a_id, a_textloc, ExprKind::Sequence(a_items)),
                lifted_b,
                fallback_id,
                fallback_textloc,
            )
        }

        (ExprKind::AbsNote(an), ExprKind::AbsNote(bn)) => MusicExpr::new(
            fallback_id,
            fallback_textloc,
            ExprKind::Sequence(vec![
                MusicExpr::new(a_id, a_textloc, ExprKind::AbsNote(an)),
                MusicExpr::new(b_id, b_textloc, ExprKind::AbsNote(bn)),
            ]),
        ),

        (other_a, other_b) => {
            let mut left = MusicExpr::new(a_id, a_textloc, other_a);
            let mut right = MusicExpr::new(b_id, b_textloc, other_b);
            mark_joining_rightmost(&mut left);
            mark_joining_leftmost(&mut right);
            MusicExpr::new(
                fallback_id,
                fallback_textloc,
                ExprKind::JoinExpr {
                    a: Box::new(left),
                    b: Box::new(right),
                },
            )
        }
    }
}

/// Welds the boundary between two sequences: the last element of `a`
/// and the first of `b` are themselves join-joined (recursively, so a
/// run longer than two can fully fuse), then the remaining elements
/// are concatenated as-is.
fn splice_sequences(a_items: &mut Vec<MusicExpr>, mut b_items: Vec<MusicExpr>, fallback_id: NodeId, fallback_textloc: Textloc) {
    match (a_items.pop(), if b_items.is_empty() { None } else { Some(b_items.remove(0)) }) {
        (Some(last), Some(first)) => {
            a_items.push(join_pair(last, first, fallback_id, fallback_textloc));
        }
        (Some(last), None) => a_items.push(last),
        (None, Some(first)) => b_items.insert(0, first),
        (None, None) => {}
    }
    a_items.extend(b_items);
}

fn mark_joining_rightmost(expr: &mut MusicExpr) {
    match &mut expr.kind {
        ExprKind::Sequence(items) | ExprKind::Simultence(items) => {
            if let Some(last) = items.last_mut() {
                mark_joining_rightmost(last);
                return;
            }
        }
        ExprKind::JoinExpr { b, .. } => {
            mark_joining_rightmost(b);
            return;
        }
        ExprKind::Chord { child, .. }
        | ExprKind::NoteOffsetExpr { child, .. }
        | ExprKind::OffsetExpr { child, .. }
        | ExprKind::OnTrack { child, .. }
        | ExprKind::ScaledExpr { child, .. }
        | ExprKind::RelSimultence { child, .. }
        | ExprKind::FlatSimultence { child, .. } => {
            mark_joining_rightmost(child);
            return;
        }
        _ => {}
    }
    expr.joining = true;
}

fn mark_joining_leftmost(expr: &mut MusicExpr) {
    match &mut expr.kind {
        ExprKind::Sequence(items) | ExprKind::Simultence(items) => {
            if let Some(first) = items.first_mut() {
                mark_joining_leftmost(first);
                return;
            }
        }
        ExprKind::JoinExpr { a, .. } => {
            mark_joining_leftmost(a);
            return;
        }
        ExprKind::Chord { child, .. }
        | ExprKind::NoteOffsetExpr { child, .. }
        | ExprKind::OffsetExpr { child, .. }
        | ExprKind::OnTrack { child, .. }
        | ExprKind::ScaledExpr { child, .. }
        | ExprKind::RelSimultence { child, .. }
        | ExprKind::FlatSimultence { child, .. } => {
            mark_joining_leftmost(child);
            return;
        }
        _ => {}
    }
    expr.joining = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AbsNote;
    use crate::instrument::DEFAULT_TONED;
    use crate::notesym::NoteSym;
    use crate::track::TrackId;

    fn note(note: i32, length: f32) -> MusicExpr {
        MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::AbsNote(AbsNote {
                notesym: NoteSym::C,
                note,
                length,
                track: TrackId(0),
                instrument: &DEFAULT_TONED,
            }),
        )
    }

    fn joinexpr(a: MusicExpr, b: MusicExpr) -> MusicExpr {
        MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::JoinExpr {
                a: Box::new(a),
                b: Box::new(b),
            },
        )
    }

    #[test]
    fn identical_notes_fuse_lengths() {
        let mut expr = joinexpr(note(60, 0.25), note(60, 0.25));
        apply(&mut expr);
        match expr.kind {
            ExprKind::AbsNote(n) => assert_eq!(n.length, 0.5),
            other => panic!("expected fused AbsNote, got {other:?}"),
        }
    }

    #[test]
    fn rests_fuse_lengths() {
        let a = MusicExpr::new(0, Textloc::zero(), ExprKind::Rest { length: 0.25 });
        let b = MusicExpr::new(0, Textloc::zero(), ExprKind::Rest { length: 0.5 });
        let mut expr = joinexpr(a, b);
        apply(&mut expr);
        match expr.kind {
            ExprKind::Rest { length } => assert_eq!(length, 0.75),
            other => panic!("expected fused Rest, got {other:?}"),
        }
    }

    #[test]
    fn mismatched_notes_become_a_sequence() {
        let mut expr = joinexpr(note(60, 0.25), note(64, 0.25));
        apply(&mut expr);
        assert!(matches!(expr.kind, ExprKind::Sequence(ref items) if items.len() == 2));
    }

    #[test]
    fn unfusable_combination_marks_endpoints_joining() {
        let mut expr = joinexpr(
            MusicExpr::new(0, Textloc::zero(), ExprKind::Marker),
            MusicExpr::new(0, Textloc::zero(), ExprKind::Marker),
        );
        apply(&mut expr);
        match &expr.kind {
            ExprKind::JoinExpr { a, b } => {
                assert!(a.joining);
                assert!(b.joining);
            }
            other => panic!("expected JoinExpr left intact, got {other:?}"),
        }
    }

    #[test]
    fn sequence_splice_fuses_boundary_notes() {
        let seq_a = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::Sequence(vec![note(60, 0.25), note(62, 0.25)]),
        );
        let seq_b = MusicExpr::new(0, Textloc::zero(), ExprKind::Sequence(vec![note(62, 0.25), note(64, 0.25)]));
        let mut expr = joinexpr(seq_a, seq_b);
        apply(&mut expr);
        match expr.kind {
            ExprKind::Sequence(items) => {
                assert_eq!(items.len(), 3);
                match &items[1].kind {
                    ExprKind::AbsNote(n) => assert_eq!(n.length, 0.5),
                    other => panic!("expected fused boundary note, got {other:?}"),
                }
            }
            other => panic!("expected Sequence, got {other:?}"),
        }
    }
}
