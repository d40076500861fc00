//! Chord types and their semitone-offset expansions.
//!
//! A `CHORD` node names a [`ChordType`] over a single absolute-note
//! child; the flatten pass (see `passes::flatten`) turns it into a
//! note-offset expression carrying this table's offsets.

/// The full set of named chord shapes. `None` is the "inherit from
/// context" placeholder used before the relative pass resolves a
/// default chord type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChordType {
    None,
    Maj,
    Min,
    Aug,
    Dim,
    Dom7,
    Maj7,
    Min7,
    Dim7,
    Aug7,
    Dim5Min7,
    Min5Maj7,
    Maj6,
    Min6,
    Dom9,
    Maj9,
    Min9,
    Dom11,
    Maj11,
    Min11,
    Dom13,
    Dom13_11,
    Maj13_11,
    Min13_11,
    Sus2,
    Sus4,
    Fifth,
    FifthOctave,
}

impl ChordType {
    /// Semitone offsets from the chord's root, ascending. Empty for
    /// [`ChordType::None`], which a caller must first resolve to a
    /// concrete type (the relative pass does this; see
    /// `passes::relative`).
    pub fn offsets(self) -> &'static [i32] {
        use ChordType::*;
        match self {
            None => &[],
            Maj => &[0, 4, 7],
            Min => &[0, 3, 7],
            Aug => &[0, 4, 8],
            Dim => &[0, 3, 6],
            Dom7 => &[0, 4, 7, 10],
            Maj7 => &[0, 4, 7, 11],
            Min7 => &[0, 3, 7, 10],
            Dim7 => &[0, 3, 6, 9],
            Aug7 => &[0, 4, 8, 10],
            Dim5Min7 => &[0, 3, 5, 10],
            Min5Maj7 => &[0, 3, 7, 11],
            Maj6 => &[0, 4, 7, 9],
            Min6 => &[0, 3, 7, 9],
            Dom9 => &[0, 4, 7, 10, 14],
            Maj9 => &[0, 4, 7, 11, 14],
            Min9 => &[0, 3, 7, 10, 14],
            Dom11 => &[0, 4, 7, 10, 14, 17],
            Maj11 => &[0, 4, 7, 11, 14, 17],
            Min11 => &[0, 3, 7, 10, 14, 17],
            Dom13 => &[0, 4, 7, 10, 14, 21],
            Dom13_11 => &[0, 4, 7, 10, 14, 17, 21],
            Maj13_11 => &[0, 4, 7, 11, 14, 17, 21],
            Min13_11 => &[0, 3, 7, 10, 14, 17, 21],
            Sus2 => &[0, 2, 7],
            Sus4 => &[0, 5, 7],
            Fifth => &[0, 7],
            FifthOctave => &[0, 7, 12],
        }
    }
}
