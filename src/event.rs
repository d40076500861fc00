//! The final, resolved event stream and its binary record encoding.
//!
//! `TimedMidiEvent` is the public shape a caller gets back from
//! [`crate::compiler::compile`]; [`write_all`] serializes a slice of
//! them as fixed-size records for a downstream sequencer.

use std::io::{self, Write};

use crate::error::Result;
use crate::midistream::{MidiEventKind, ResolvedEvent};

/// One tag per record. Order fixes the on-wire discriminant and must
/// not be reordered once a consumer depends on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EventTag {
    InstrumentChange = 0,
    Marker = 1,
    NoteOff = 2,
    NoteOn = 3,
    SongEnd = 4,
    TempoChange = 5,
    VolumeChange = 6,
}

/// A fully resolved event ready for the sequencer. `time_as_measures`
/// is always nondecreasing across a valid stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimedMidiEvent {
    InstrumentChange { time: f32, channel: u8, code: u8 },
    Marker { time: f32 },
    NoteOff { time: f32, channel: u8, note: u8, velocity: u8, joining: bool },
    NoteOn { time: f32, channel: u8, note: u8, velocity: u8, joining: bool },
    SongEnd { time: f32 },
    TempoChange { time: f32, bpm: f32 },
    VolumeChange { time: f32, channel: u8, volume: u8 },
}

/// Byte length of one on-wire record: a 4-byte time, a 1-byte tag, and
/// a 4-byte payload slot (zero-padded for tags that use less).
pub const RECORD_SIZE: usize = 9;

impl TimedMidiEvent {
    pub fn time(&self) -> f32 {
        match *self {
            TimedMidiEvent::InstrumentChange { time, .. }
            | TimedMidiEvent::Marker { time }
            | TimedMidiEvent::NoteOff { time, .. }
            | TimedMidiEvent::NoteOn { time, .. }
            | TimedMidiEvent::SongEnd { time }
            | TimedMidiEvent::TempoChange { time, .. }
            | TimedMidiEvent::VolumeChange { time, .. } => time,
        }
    }

    fn tag(&self) -> EventTag {
        match self {
            TimedMidiEvent::InstrumentChange { .. } => EventTag::InstrumentChange,
            TimedMidiEvent::Marker { .. } => EventTag::Marker,
            TimedMidiEvent::NoteOff { .. } => EventTag::NoteOff,
            TimedMidiEvent::NoteOn { .. } => EventTag::NoteOn,
            TimedMidiEvent::SongEnd { .. } => EventTag::SongEnd,
            TimedMidiEvent::TempoChange { .. } => EventTag::TempoChange,
            TimedMidiEvent::VolumeChange { .. } => EventTag::VolumeChange,
        }
    }

    /// Encodes this event as one fixed-size record: 4 bytes of little
    /// endian `time_as_measures`, 1 tag byte, then a 4-byte payload
    /// slot (unused trailing bytes are zero).
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];
        buf[0..4].copy_from_slice(&self.time().to_le_bytes());
        buf[4] = self.tag() as u8;

        match *self {
            TimedMidiEvent::InstrumentChange { channel, code, .. } => {
                buf[5] = channel;
                buf[6] = code;
            }
            TimedMidiEvent::NoteOff { channel, note, velocity, joining, .. }
            | TimedMidiEvent::NoteOn { channel, note, velocity, joining, .. } => {
                buf[5] = channel;
                buf[6] = note;
                buf[7] = velocity;
                buf[8] = joining as u8;
            }
            TimedMidiEvent::TempoChange { bpm, .. } => {
                buf[5..9].copy_from_slice(&bpm.to_le_bytes());
            }
            TimedMidiEvent::VolumeChange { channel, volume, .. } => {
                buf[5] = channel;
                buf[6] = volume;
            }
            TimedMidiEvent::Marker { .. } | TimedMidiEvent::SongEnd { .. } => {}
        }

        buf
    }
}

/// Converts the channel allocator's resolved stream into the public
/// record type.
pub fn from_resolved(events: &[ResolvedEvent]) -> Vec<TimedMidiEvent> {
    events
        .iter()
        .map(|e| match e.kind {
            MidiEventKind::InstrumentChange { code } => TimedMidiEvent::InstrumentChange {
                time: e.time,
                channel: e.channel,
                code,
            },
            MidiEventKind::Marker => TimedMidiEvent::Marker { time: e.time },
            MidiEventKind::NoteOff { note, velocity, joining } => TimedMidiEvent::NoteOff {
                time: e.time,
                channel: e.channel,
                note,
                velocity,
                joining,
            },
            MidiEventKind::NoteOn { note, velocity, joining } => TimedMidiEvent::NoteOn {
                time: e.time,
                channel: e.channel,
                note,
                velocity,
                joining,
            },
            MidiEventKind::SongEnd => TimedMidiEvent::SongEnd { time: e.time },
            MidiEventKind::TempoChange { bpm } => TimedMidiEvent::TempoChange { time: e.time, bpm },
            MidiEventKind::VolumeChange { volume } => TimedMidiEvent::VolumeChange {
                time: e.time,
                channel: e.channel,
                volume,
            },
        })
        .collect()
}

/// Writes every event as a contiguous run of fixed-size records with
/// no framing header, retrying on `ErrorKind::Interrupted` and failing
/// fatally on any other I/O error.
pub fn write_all<W: Write>(events: &[TimedMidiEvent], sink: &mut W) -> Result<()> {
    for event in events {
        write_record(sink, &event.encode())?;
    }
    Ok(())
}

fn write_record<W: Write>(sink: &mut W, record: &[u8; RECORD_SIZE]) -> Result<()> {
    let mut written = 0;
    while written < record.len() {
        match sink.write(&record[written..]) {
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "sink accepted zero bytes").into())
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
