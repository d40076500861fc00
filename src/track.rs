//! Track registry and the per-track settings the compiler consults
//! during relative resolution and channel allocation.

use crate::ast::{ExprKind, MusicExpr, TrackRef};
use crate::instrument::{self, Instrument, InstrumentKind, DEFAULT_DRUMKIT, DEFAULT_TONED};

/// Whether a track carries melodic notes or drum hits. Drum tracks are
/// pinned to the reserved percussion channel (see `midistream`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Toned,
    Drum,
}

/// A unique handle into a [`Song`]'s track registry. Lightweight and
/// `Copy` so expression nodes can carry one without borrowing the
/// registry itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackId(pub(crate) usize);

/// A named track: its playback defaults and channel-allocation policy.
#[derive(Debug, Clone)]
pub struct Track {
    pub name: String,
    /// Linear volume in `[0, 1]`; the channel allocator scales this to
    /// a MIDI 0..127 value before emitting VOLUMECHANGE.
    pub volume: f32,
    /// A sticky channel preference. `None` means "no preference yet";
    /// the allocator fills this in the first time it assigns a channel
    /// to this track and reuses it afterward.
    pub preferred_channel: Option<u8>,
    /// If false, `preferred_channel` must already be set and is used
    /// verbatim rather than dynamically assigned.
    pub autoallocate: bool,
    pub instrument: &'static Instrument,
    pub kind: TrackKind,
}

impl Track {
    fn new_toned(name: impl Into<String>) -> Self {
        Track {
            name: name.into(),
            volume: 0.5,
            preferred_channel: None,
            autoallocate: true,
            instrument: &DEFAULT_TONED,
            kind: TrackKind::Toned,
        }
    }

    fn new_drum(name: impl Into<String>) -> Self {
        Track {
            name: name.into(),
            volume: 0.5,
            preferred_channel: Some(crate::midistream::DRUM_CHANNEL),
            autoallocate: false,
            instrument: &DEFAULT_DRUMKIT,
            kind: TrackKind::Drum,
        }
    }

    pub fn default_instrument(&self) -> &'static Instrument {
        self.instrument
    }
}

/// Owns every [`Track`] referenced by a compiled expression tree.
///
/// `ONTRACK` nodes in a freshly parsed tree carry only a track name;
/// `Song::new` walks the tree once, replacing each name with a
/// [`TrackId`] into this registry so every later pass can look a
/// track up by cheap handle instead of string comparison.
#[derive(Debug, Clone)]
pub struct Song {
    tracks: Vec<Track>,
    pub default_track: TrackId,
    pub default_drumtrack: TrackId,
}

impl Song {
    /// Builds an empty registry seeded with the default toned track
    /// ("acoustic grand") and default drum track, per §4.8.
    pub fn new() -> Self {
        let mut tracks = Vec::new();
        tracks.push(Track::new_toned("acoustic grand"));
        tracks.push(Track::new_drum("drums"));
        Song {
            tracks,
            default_track: TrackId(0),
            default_drumtrack: TrackId(1),
        }
    }

    pub fn track(&self, id: TrackId) -> &Track {
        &self.tracks[id.0]
    }

    pub fn track_mut(&mut self, id: TrackId) -> &mut Track {
        &mut self.tracks[id.0]
    }

    /// Returns the existing track with an exact name match, or
    /// allocates a new one (looking up its default instrument by name
    /// in the instrument tables, falling back to the toned/drum
    /// defaults on a miss).
    pub fn find_or_create(&mut self, name: &str) -> TrackId {
        if let Some(pos) = self.tracks.iter().position(|t| t.name == name) {
            return TrackId(pos);
        }

        let is_drum = name.eq_ignore_ascii_case("drums");
        let mut track = if is_drum {
            Track::new_drum(name)
        } else {
            Track::new_toned(name)
        };

        let kind = if is_drum {
            InstrumentKind::Drumkit
        } else {
            InstrumentKind::Toned
        };
        if let Some(found) = instrument::lookup(kind, name) {
            track.instrument = found;
        }

        self.tracks.push(track);
        TrackId(self.tracks.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Walks the tree once, replacing every `ONTRACK`/`VOLUMECHANGE`
    /// name reference with a canonical [`TrackId`] into this registry.
    /// Must run before any other pass: `passes::relative` panics on an
    /// uncanonicalized `TrackRef::Name`.
    pub fn canonicalize_tracks(&mut self, expr: &mut MusicExpr) {
        match &mut expr.kind {
            ExprKind::OnTrack { track, child } => {
                self.canonicalize_ref(track);
                self.canonicalize_tracks(child);
            }
            ExprKind::VolumeChange { track, .. } => {
                self.canonicalize_ref(track);
            }
            _ => {
                for child in expr.children_mut() {
                    self.canonicalize_tracks(child);
                }
            }
        }
    }

    fn canonicalize_ref(&mut self, track: &mut TrackRef) {
        if let TrackRef::Name(name) = track {
            let id = self.find_or_create(name);
            *track = TrackRef::Id(id);
        }
    }
}

impl Default for Song {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_song_has_default_toned_and_drum_tracks() {
        let song = Song::new();
        assert_eq!(song.len(), 2);
        assert_eq!(song.track(song.default_track).kind, TrackKind::Toned);
        assert_eq!(song.track(song.default_drumtrack).kind, TrackKind::Drum);
    }

    #[test]
    fn find_or_create_is_idempotent_by_name() {
        let mut song = Song::new();
        let a = song.find_or_create("piano");
        let b = song.find_or_create("piano");
        assert_eq!(a, b);
        assert_eq!(song.len(), 3);
    }

    #[test]
    fn drum_named_track_gets_drum_kind_and_fixed_channel() {
        let mut song = Song::new();
        let id = song.find_or_create("drums2");
        // Only the exact name "drums" is auto-detected as a drum track;
        // anything else defaults to toned.
        assert_eq!(song.track(id).kind, TrackKind::Toned);
    }

    #[test]
    fn looks_up_instrument_by_name_on_creation() {
        let mut song = Song::new();
        let id = song.find_or_create("trumpet");
        assert_eq!(song.track(id).instrument.code, 56);
    }

    #[test]
    fn canonicalize_tracks_resolves_ontrack_name_in_place() {
        use crate::textloc::Textloc;

        let mut song = Song::new();
        let mut expr = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::OnTrack {
                track: TrackRef::Name("lead".to_string()),
                child: Box::new(MusicExpr::new(0, Textloc::zero(), ExprKind::Empty)),
            },
        );

        song.canonicalize_tracks(&mut expr);

        match &expr.kind {
            ExprKind::OnTrack { track, .. } => {
                assert_eq!(track.id(), song.find_or_create("lead"));
            }
            other => panic!("expected OnTrack, got {other:?}"),
        }
        assert_eq!(song.len(), 3);
    }
}
