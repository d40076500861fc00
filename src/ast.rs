//! The expression tree: a tagged union of note, timing, and structural
//! nodes produced by the (external) parser and rewritten in place by
//! each compiler pass.

use crate::chord::ChordType;
use crate::instrument::Instrument;
use crate::notesym::{DrumSym, NoteSym};
use crate::textloc::Textloc;
use crate::track::TrackId;

/// Monotonically increasing per-[`crate::compiler::Compiler`] node id.
/// Used only for diagnostics (matching two log lines to the same
/// rewrite); nothing in the pipeline branches on its value.
pub type NodeId = u32;

/// The minimum length, in measures, any timed leaf may have once the
/// flatten pass has run. Below this a note would produce a zero-width
/// NOTEON/NOTEOFF pair that breaks the event sort.
pub const MIN_LENGTH: f32 = 1e-4;

/// A track reference that starts out as a bare name (as the parser
/// produces it) and is canonicalized to a [`TrackId`] by
/// [`crate::track::Song`] before any other pass runs.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackRef {
    Name(String),
    Id(TrackId),
}

impl TrackRef {
    pub fn id(&self) -> TrackId {
        match self {
            TrackRef::Id(id) => *id,
            TrackRef::Name(name) => {
                panic!("track reference '{name}' was not canonicalized before use")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct AbsNote {
    pub notesym: NoteSym,
    pub note: i32,
    pub length: f32,
    pub track: TrackId,
    pub instrument: &'static Instrument,
}

#[derive(Debug, Clone)]
pub struct RelNote {
    pub notesym: NoteSym,
    pub notemods: i32,
    pub octavemods: i32,
    pub length: f32,
}

#[derive(Debug, Clone)]
pub struct AbsDrum {
    pub drumsym: DrumSym,
    pub note: u8,
    pub length: f32,
    pub track: TrackId,
    pub instrument: &'static Instrument,
}

#[derive(Debug, Clone)]
pub struct RelDrum {
    pub drumsym: DrumSym,
    pub length: f32,
}

#[derive(Debug, Clone)]
pub struct FuncArg {
    pub value: String,
    pub textloc: Textloc,
}

/// The tagged union itself. Every variant's node also carries
/// `(id, textloc, joining)` via [`MusicExpr`]; this enum only holds
/// the variant-specific payload.
#[derive(Debug, Clone)]
pub enum ExprKind {
    AbsNote(AbsNote),
    RelNote(RelNote),
    AbsDrum(AbsDrum),
    RelDrum(RelDrum),
    Rest { length: f32 },
    Empty,
    Chord { chordtype: ChordType, child: Box<MusicExpr> },
    NoteOffsetExpr { child: Box<MusicExpr>, offsets: Vec<i32> },
    OffsetExpr { offset: f32, child: Box<MusicExpr> },
    OnTrack { track: TrackRef, child: Box<MusicExpr> },
    JoinExpr { a: Box<MusicExpr>, b: Box<MusicExpr> },
    Sequence(Vec<MusicExpr>),
    Simultence(Vec<MusicExpr>),
    ScaledExpr { length: f32, child: Box<MusicExpr> },
    RelSimultence { length: f32, child: Box<MusicExpr> },
    FlatSimultence { length: f32, child: Box<MusicExpr> },
    Function { name: String, args: Vec<FuncArg> },
    TempoChange { bpm: f32 },
    VolumeChange { track: TrackRef, volume: u8 },
    Marker,
}

/// One node of the expression tree.
#[derive(Debug, Clone)]
pub struct MusicExpr {
    pub id: NodeId,
    pub textloc: Textloc,
    /// Set by the join pass when two adjacent leaves could not be
    /// fused outright but should still be treated as one sounding
    /// note by anything downstream that cares (see `passes::join`).
    pub joining: bool,
    pub kind: ExprKind,
}

impl MusicExpr {
    pub fn new(id: NodeId, textloc: Textloc, kind: ExprKind) -> Self {
        MusicExpr {
            id,
            textloc,
            joining: false,
            kind,
        }
    }

    /// Overwrites this node's payload in place while keeping its
    /// identity fields untouched, mirroring the upstream `replace`
    /// operation that rewrites a node without disturbing its id.
    pub fn replace_kind(&mut self, kind: ExprKind) {
        self.kind = kind;
    }

    /// The immediate children of this node, in the order §4.1
    /// specifies. Leaves yield none.
    pub fn children(&self) -> Vec<&MusicExpr> {
        match &self.kind {
            ExprKind::AbsNote(_)
            | ExprKind::RelNote(_)
            | ExprKind::AbsDrum(_)
            | ExprKind::RelDrum(_)
            | ExprKind::Rest { .. }
            | ExprKind::Empty
            | ExprKind::TempoChange { .. }
            | ExprKind::VolumeChange { .. }
            | ExprKind::Marker
            | ExprKind::Function { .. } => vec![],
            ExprKind::Chord { child, .. }
            | ExprKind::OffsetExpr { child, .. }
            | ExprKind::OnTrack { child, .. }
            | ExprKind::ScaledExpr { child, .. }
            | ExprKind::RelSimultence { child, .. }
            | ExprKind::FlatSimultence { child, .. }
            | ExprKind::NoteOffsetExpr { child, .. } => vec![child.as_ref()],
            ExprKind::JoinExpr { a, b } => vec![a.as_ref(), b.as_ref()],
            ExprKind::Sequence(items) | ExprKind::Simultence(items) => items.iter().collect(),
        }
    }

    pub fn is_empty_node(&self) -> bool {
        matches!(self.kind, ExprKind::Empty)
    }

    /// Mutable counterpart of [`MusicExpr::children`], used by passes
    /// that rewrite nodes in place without caring about the specific
    /// variant (the function-application walk is the only one of
    /// those; every other pass needs variant-specific handling and
    /// matches directly on `kind`).
    pub fn children_mut(&mut self) -> Vec<&mut MusicExpr> {
        match &mut self.kind {
            ExprKind::AbsNote(_)
            | ExprKind::RelNote(_)
            | ExprKind::AbsDrum(_)
            | ExprKind::RelDrum(_)
            | ExprKind::Rest { .. }
            | ExprKind::Empty
            | ExprKind::TempoChange { .. }
            | ExprKind::VolumeChange { .. }
            | ExprKind::Marker
            | ExprKind::Function { .. } => vec![],
            ExprKind::Chord { child, .. }
            | ExprKind::OffsetExpr { child, .. }
            | ExprKind::OnTrack { child, .. }
            | ExprKind::ScaledExpr { child, .. }
            | ExprKind::RelSimultence { child, .. }
            | ExprKind::FlatSimultence { child, .. }
            | ExprKind::NoteOffsetExpr { child, .. } => vec![child.as_mut()],
            ExprKind::JoinExpr { a, b } => vec![a.as_mut(), b.as_mut()],
            ExprKind::Sequence(items) | ExprKind::Simultence(items) => items.iter_mut().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instrument::DEFAULT_TONED;
    use crate::track::TrackId as Tid;

    fn leaf_note() -> MusicExpr {
        MusicExpr::new(
            1,
            Textloc::zero(),
            ExprKind::AbsNote(AbsNote {
                notesym: NoteSym::C,
                note: 60,
                length: 0.25,
                track: Tid(0),
                instrument: &DEFAULT_TONED,
            }),
        )
    }

    #[test]
    fn leaf_has_no_children() {
        assert!(leaf_note().children().is_empty());
    }

    #[test]
    fn join_expr_has_two_children() {
        let join = MusicExpr::new(
            2,
            Textloc::zero(),
            ExprKind::JoinExpr {
                a: Box::new(leaf_note()),
                b: Box::new(leaf_note()),
            },
        );
        assert_eq!(join.children().len(), 2);
    }

    #[test]
    fn sequence_yields_all_elements() {
        let seq = MusicExpr::new(
            3,
            Textloc::zero(),
            ExprKind::Sequence(vec![leaf_note(), leaf_note(), leaf_note()]),
        );
        assert_eq!(seq.children().len(), 3);
    }
}
