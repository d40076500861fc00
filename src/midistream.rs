//! Mid-stream event model, its sort order, and the dynamic MIDI
//! channel allocator.
//!
//! Takes the flattened offset stream and produces the final sorted
//! sequence of events a [`crate::event::TimedMidiEvent`] stream is
//! encoded from. Must run after `passes::flatten`.

use crate::ast::{ExprKind, MusicExpr};
use crate::error::{CompileError, Result};
use crate::track::{Song, TrackId};

/// Channel 9 (zero-indexed) is the General MIDI percussion channel and
/// is never handed out by the general allocator.
pub const DRUM_CHANNEL: u8 = 9;

const CHANNEL_COUNT: usize = 16;
const MIN_LENGTH: f32 = crate::ast::MIN_LENGTH;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MidiEventKind {
    NoteOff { note: u8, velocity: u8, joining: bool },
    TempoChange { bpm: f32 },
    VolumeChange { volume: u8 },
    NoteOn { note: u8, velocity: u8, joining: bool },
    InstrumentChange { code: u8 },
    Marker,
    SongEnd,
}

impl MidiEventKind {
    /// Sort ordinal at a fixed timestamp: note-offs must drain before
    /// note-ons of the same instant so a same-pitch retrigger doesn't
    /// read as silence.
    fn ordinal(&self) -> u8 {
        match self {
            MidiEventKind::NoteOff { .. } => 0,
            MidiEventKind::TempoChange { .. } => 1,
            MidiEventKind::VolumeChange { .. } => 2,
            MidiEventKind::InstrumentChange { .. } => 3,
            MidiEventKind::NoteOn { .. } => 4,
            MidiEventKind::Marker => 5,
            MidiEventKind::SongEnd => 6,
        }
    }
}

/// One event in the unresolved mid-stream, before channel allocation
/// has assigned a concrete channel.
#[derive(Debug, Clone)]
pub struct MidiStreamEvent {
    pub time: f32,
    pub track: TrackId,
    pub kind: MidiEventKind,
}

fn sort_key(event: &MidiStreamEvent) -> (f32, u8, i32, u8) {
    let (note, velocity) = match event.kind {
        MidiEventKind::NoteOn { note, velocity, .. } | MidiEventKind::NoteOff { note, velocity, .. } => {
            (note as i32, velocity)
        }
        _ => (-1, 0),
    };
    (event.time, event.kind.ordinal(), note, velocity)
}

/// Walks a flattened `FLATSIMULTENCE` and produces the unresolved
/// mid-stream (§4.6), sorted by `(time, evtype ordinal, note, velocity)`.
pub fn build(flat: &MusicExpr) -> Result<Vec<MidiStreamEvent>> {
    let ExprKind::FlatSimultence { child, .. } = &flat.kind else {
        return Err(CompileError::invariant(
            "midistream::build requires a FLATSIMULTENCE root",
        ));
    };
    let ExprKind::Simultence(items) = &child.kind else {
        return Err(CompileError::invariant(
            "FLATSIMULTENCE child must be SIMULTENCE",
        ));
    };

    let mut events = Vec::new();
    for item in items {
        let ExprKind::OffsetExpr { offset, child } = &item.kind else {
            return Err(CompileError::invariant(
                "flattened leaf must be wrapped in OFFSETEXPR",
            ));
        };
        emit_leaf(*offset, child, &mut events)?;
    }

    events.sort_by(|a, b| sort_key(a).partial_cmp(&sort_key(b)).unwrap());
    Ok(events)
}

fn emit_leaf(time: f32, leaf: &MusicExpr, events: &mut Vec<MidiStreamEvent>) -> Result<()> {
    match &leaf.kind {
        ExprKind::AbsNote(n) => {
            if n.note < 0 || n.note >= 128 || n.length < MIN_LENGTH {
                return Ok(());
            }
            let note = n.note as u8;
            events.push(MidiStreamEvent {
                time,
                track: n.track,
                kind: MidiEventKind::NoteOn {
                    note,
                    velocity: 80,
                    joining: leaf.joining,
                },
            });
            events.push(MidiStreamEvent {
                time: time + n.length,
                track: n.track,
                kind: MidiEventKind::NoteOff {
                    note,
                    velocity: 80,
                    joining: leaf.joining,
                },
            });
            Ok(())
        }
        ExprKind::AbsDrum(d) => {
            if d.length < MIN_LENGTH {
                return Ok(());
            }
            events.push(MidiStreamEvent {
                time,
                track: d.track,
                kind: MidiEventKind::NoteOn {
                    note: d.note,
                    velocity: 80,
                    joining: leaf.joining,
                },
            });
            events.push(MidiStreamEvent {
                time: time + d.length,
                track: d.track,
                kind: MidiEventKind::NoteOff {
                    note: d.note,
                    velocity: 80,
                    joining: leaf.joining,
                },
            });
            Ok(())
        }
        ExprKind::TempoChange { bpm } => {
            events.push(MidiStreamEvent {
                time,
                track: TrackId(0),
                kind: MidiEventKind::TempoChange { bpm: *bpm },
            });
            Ok(())
        }
        ExprKind::VolumeChange { track, volume } => {
            events.push(MidiStreamEvent {
                time,
                track: track.id(),
                kind: MidiEventKind::VolumeChange { volume: *volume },
            });
            Ok(())
        }
        ExprKind::Marker => {
            events.push(MidiStreamEvent {
                time,
                track: TrackId(0),
                kind: MidiEventKind::Marker,
            });
            Ok(())
        }
        other => Err(CompileError::invariant(format!(
            "unexpected leaf kind reaching the mid-stream builder: {other:?}"
        ))),
    }
}

#[derive(Debug, Clone)]
struct ChannelSlot {
    prev_instrument: Option<u8>,
    prev_volume: Option<u8>,
    reserved_by: Option<TrackId>,
    notecount: [u32; 128],
    total_notecount: u32,
}

impl Default for ChannelSlot {
    fn default() -> Self {
        ChannelSlot {
            prev_instrument: None,
            prev_volume: None,
            reserved_by: None,
            notecount: [0; 128],
            total_notecount: 0,
        }
    }
}

/// Dynamic channel allocator: a serial fold over the sorted mid-stream
/// that assigns concrete channels, suppresses retriggered notes while
/// already sounding, and interleaves instrument/volume change events.
struct Allocator<'a> {
    song: &'a mut Song,
    slots: Vec<ChannelSlot>,
}

impl<'a> Allocator<'a> {
    fn new(song: &'a mut Song) -> Self {
        Allocator {
            song,
            slots: vec![ChannelSlot::default(); CHANNEL_COUNT],
        }
    }

    fn lookup_channel(&mut self, track_id: TrackId) -> Result<u8> {
        let track = self.song.track(track_id);
        let autoallocate = track.autoallocate;
        let preferred_channel = track.preferred_channel;

        if !autoallocate {
            let ch = preferred_channel.ok_or_else(|| {
                CompileError::invariant("fixed-channel track has no preferred_channel set")
            })?;
            self.slots[ch as usize].reserved_by = Some(track_id);
            return Ok(ch);
        }

        if let Some(preferred) = preferred_channel {
            let slot = &self.slots[preferred as usize];
            if slot.reserved_by == Some(track_id) {
                return Ok(preferred);
            }
            if slot.reserved_by.is_none() {
                self.slots[preferred as usize].reserved_by = Some(track_id);
                return Ok(preferred);
            }
        }

        // Step 3: no sticky preference (or it's taken by someone else).
        // Reserve the first free channel and make it sticky by writing
        // it back onto the track, so the next lookup for this track
        // hits the preferred-channel branch above instead of drifting
        // to a different channel whenever its note count returns to 0.
        for ch in 0..CHANNEL_COUNT as u8 {
            if ch == DRUM_CHANNEL {
                continue;
            }
            if self.slots[ch as usize].reserved_by.is_none() {
                self.slots[ch as usize].reserved_by = Some(track_id);
                self.song.track_mut(track_id).preferred_channel = Some(ch);
                return Ok(ch);
            }
        }

        Err(CompileError::resource_exhausted("out of available midi tracks"))
    }

    fn channel_of(&self, track_id: TrackId) -> Result<u8> {
        self.slots
            .iter()
            .position(|slot| slot.reserved_by == Some(track_id))
            .map(|ch| ch as u8)
            .ok_or_else(|| CompileError::invariant("NOTEOFF for a track with no reserved channel"))
    }

}

/// A mid-stream event bound to a concrete channel, ready for §6 binary
/// encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEvent {
    pub time: f32,
    pub channel: u8,
    pub kind: MidiEventKind,
}

/// Runs the channel allocator over the sorted mid-stream and appends
/// the terminal `SONG_END`, returning the fully resolved, re-sorted
/// event list.
pub fn allocate(song: &mut Song, events: &[MidiStreamEvent], song_length: f32) -> Result<Vec<ResolvedEvent>> {
    let mut alloc = Allocator::new(song);
    let mut out = Vec::with_capacity(events.len());

    for event in events {
        match event.kind {
            MidiEventKind::NoteOn { note, velocity, joining } => {
                let ch = alloc.lookup_channel(event.track)?;
                maybe_emit_instrument_change(&mut alloc, ch, event.track, event.time, &mut out);
                maybe_emit_volume_change(&mut alloc, ch, event.track, event.time, &mut out);

                let slot = &mut alloc.slots[ch as usize];
                slot.notecount[note as usize] += 1;
                slot.total_notecount += 1;
                if slot.notecount[note as usize] == 1 {
                    out.push(ResolvedEvent {
                        time: event.time,
                        channel: ch,
                        kind: MidiEventKind::NoteOn { note, velocity, joining },
                    });
                }
            }
            MidiEventKind::NoteOff { note, velocity, joining } => {
                let ch = alloc.channel_of(event.track)?;
                let slot = &mut alloc.slots[ch as usize];
                if slot.notecount[note as usize] > 0 {
                    slot.notecount[note as usize] -= 1;
                    slot.total_notecount = slot.total_notecount.saturating_sub(1);
                }
                if slot.total_notecount == 0 {
                    slot.reserved_by = None;
                }
                if slot.notecount[note as usize] == 0 {
                    out.push(ResolvedEvent {
                        time: event.time,
                        channel: ch,
                        kind: MidiEventKind::NoteOff { note, velocity, joining },
                    });
                }
            }
            MidiEventKind::TempoChange { bpm } => out.push(ResolvedEvent {
                time: event.time,
                channel: 0,
                kind: MidiEventKind::TempoChange { bpm },
            }),
            MidiEventKind::VolumeChange { .. } => {
                let ch = alloc.channel_of(event.track)?;
                let volume = scaled_volume(alloc.song, event.track);
                out.push(ResolvedEvent {
                    time: event.time,
                    channel: ch,
                    kind: MidiEventKind::VolumeChange { volume },
                });
            }
            MidiEventKind::Marker => out.push(ResolvedEvent {
                time: event.time,
                channel: 0,
                kind: MidiEventKind::Marker,
            }),
            MidiEventKind::InstrumentChange { .. } | MidiEventKind::SongEnd => {
                return Err(CompileError::invariant(
                    "INSTRUMENT_CHANGE/SONG_END must not appear in the unresolved mid-stream",
                ))
            }
        }
    }

    for slot in &alloc.slots {
        if slot.total_notecount != 0 {
            return Err(CompileError::invariant(
                "channel allocator left a note sounding at stream end",
            ));
        }
    }

    out.push(ResolvedEvent {
        time: song_length,
        channel: 0,
        kind: MidiEventKind::SongEnd,
    });

    out.sort_by(|a, b| {
        let ak = (a.time, a.kind.ordinal(), a.channel, note_of(&a.kind), velocity_of(&a.kind));
        let bk = (b.time, b.kind.ordinal(), b.channel, note_of(&b.kind), velocity_of(&b.kind));
        ak.partial_cmp(&bk).unwrap()
    });

    Ok(out)
}

fn note_of(kind: &MidiEventKind) -> i32 {
    match kind {
        MidiEventKind::NoteOn { note, .. } | MidiEventKind::NoteOff { note, .. } => *note as i32,
        _ => -1,
    }
}

fn velocity_of(kind: &MidiEventKind) -> u8 {
    match kind {
        MidiEventKind::NoteOn { velocity, .. } | MidiEventKind::NoteOff { velocity, .. } => *velocity,
        _ => 0,
    }
}

fn scaled_volume(song: &Song, track_id: TrackId) -> u8 {
    let linear = song.track(track_id).volume.clamp(0.0, 1.0);
    (linear * 127.0).round() as u8
}

fn maybe_emit_instrument_change(
    alloc: &mut Allocator,
    ch: u8,
    track_id: TrackId,
    time: f32,
    out: &mut Vec<ResolvedEvent>,
) {
    let code = alloc.song.track(track_id).instrument.code;
    let slot = &mut alloc.slots[ch as usize];
    if slot.prev_instrument != Some(code) {
        slot.prev_instrument = Some(code);
        out.push(ResolvedEvent {
            time,
            channel: ch,
            kind: MidiEventKind::InstrumentChange { code },
        });
    }
}

fn maybe_emit_volume_change(
    alloc: &mut Allocator,
    ch: u8,
    track_id: TrackId,
    time: f32,
    out: &mut Vec<ResolvedEvent>,
) {
    let volume = scaled_volume(alloc.song, track_id);
    let slot = &mut alloc.slots[ch as usize];
    if slot.prev_volume != Some(volume) {
        slot.prev_volume = Some(volume);
        out.push(ResolvedEvent {
            time,
            channel: ch,
            kind: MidiEventKind::VolumeChange { volume },
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AbsNote;
    use crate::instrument::DEFAULT_TONED;
    use crate::notesym::NoteSym;
    use crate::passes::flatten::flatten;
    use crate::textloc::Textloc;

    fn note(pitch: i32, len: f32, track: TrackId) -> MusicExpr {
        MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::AbsNote(AbsNote {
                notesym: NoteSym::C,
                note: pitch,
                length: len,
                track,
                instrument: &DEFAULT_TONED,
            }),
        )
    }

    #[test]
    fn simple_scale_produces_paired_on_off_events() {
        let mut song = Song::new();
        let seq = MusicExpr::new(
            0,
            Textloc::zero(),
            ExprKind::Sequence(vec![
                note(60, 0.25, song.default_track),
                note(62, 0.25, song.default_track),
            ]),
        );
        let flat = flatten(&seq).unwrap();
        let stream = build(&flat).unwrap();
        assert_eq!(stream.len(), 4);
        assert!(matches!(stream[0].kind, MidiEventKind::NoteOn { note: 60, .. }));

        let length = match &flat.kind {
            ExprKind::FlatSimultence { length, .. } => *length,
            _ => unreachable!(),
        };
        let resolved = allocate(&mut song, &stream, length).unwrap();
        assert!(resolved.iter().any(|e| matches!(e.kind, MidiEventKind::SongEnd)));
        assert!(resolved.iter().any(|e| matches!(e.kind, MidiEventKind::InstrumentChange { .. })));
    }

    #[test]
    fn same_pitch_retrigger_is_suppressed_while_still_sounding() {
        let mut song = Song::new();
        let stream = vec![
            MidiStreamEvent {
                time: 0.0,
                track: song.default_track,
                kind: MidiEventKind::NoteOn { note: 60, velocity: 80, joining: false },
            },
            MidiStreamEvent {
                time: 0.0,
                track: song.default_track,
                kind: MidiEventKind::NoteOn { note: 60, velocity: 80, joining: false },
            },
            MidiStreamEvent {
                time: 0.25,
                track: song.default_track,
                kind: MidiEventKind::NoteOff { note: 60, velocity: 80, joining: false },
            },
            MidiStreamEvent {
                time: 0.25,
                track: song.default_track,
                kind: MidiEventKind::NoteOff { note: 60, velocity: 80, joining: false },
            },
        ];
        let resolved = allocate(&mut song, &stream, 0.25).unwrap();
        let note_ons = resolved.iter().filter(|e| matches!(e.kind, MidiEventKind::NoteOn { .. })).count();
        let note_offs = resolved.iter().filter(|e| matches!(e.kind, MidiEventKind::NoteOff { .. })).count();
        assert_eq!(note_ons, 1);
        assert_eq!(note_offs, 1);
    }

    #[test]
    fn drum_track_is_pinned_to_channel_nine() {
        let mut song = Song::new();
        let stream = vec![
            MidiStreamEvent {
                time: 0.0,
                track: song.default_drumtrack,
                kind: MidiEventKind::NoteOn { note: 38, velocity: 80, joining: false },
            },
            MidiStreamEvent {
                time: 0.25,
                track: song.default_drumtrack,
                kind: MidiEventKind::NoteOff { note: 38, velocity: 80, joining: false },
            },
        ];
        let resolved = allocate(&mut song, &stream, 0.25).unwrap();
        let note_on = resolved.iter().find(|e| matches!(e.kind, MidiEventKind::NoteOn { .. })).unwrap();
        assert_eq!(note_on.channel, DRUM_CHANNEL);
    }

    #[test]
    fn channel_exhaustion_is_a_resource_error() {
        let mut song = Song::new();
        let mut stream = Vec::new();
        // 15 non-drum channels available (0..15 minus channel 9); the
        // 16th toned track must fail to allocate.
        for i in 0..16 {
            let track = song.find_or_create(&format!("toned-{i}"));
            stream.push(MidiStreamEvent {
                time: 0.0,
                track,
                kind: MidiEventKind::NoteOn { note: 60 + i as u8, velocity: 80, joining: false },
            });
        }
        let err = allocate(&mut song, &stream, 1.0).unwrap_err();
        assert!(matches!(err, CompileError::ResourceExhausted { .. }));
    }
}
