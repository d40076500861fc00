//! Static General MIDI instrument tables.
//!
//! Both tables are sorted by name so lookup is a binary search rather
//! than a linear scan; names are matched case-insensitively by prefix,
//! so `"acoustic grand piano"` and `"Acoustic Grand"` both resolve to
//! the same entry.

/// Whether an [`Instrument`] selects a melodic program (via a MIDI
/// program-change) or a percussion kit (which only affects which
/// sounds live under the fixed drum channel's key map).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstrumentKind {
    Toned,
    Drumkit,
}

/// A named program: a General MIDI program number together with the
/// kind of track it applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instrument {
    pub kind: InstrumentKind,
    pub name: &'static str,
    pub code: u8,
}

/// Default instrument for a freshly created toned track.
pub const DEFAULT_TONED: Instrument = Instrument {
    kind: InstrumentKind::Toned,
    name: "acoustic grand",
    code: 0,
};

/// Default instrument for a freshly created drum track.
pub const DEFAULT_DRUMKIT: Instrument = Instrument {
    kind: InstrumentKind::Drumkit,
    name: "drums",
    code: 0,
};

macro_rules! instr {
    ($kind:expr, $name:expr, $code:expr) => {
        Instrument {
            kind: $kind,
            name: $name,
            code: $code,
        }
    };
}

/// General MIDI drum kits, sorted by name.
static DRUMKITS: &[Instrument] = &[
    instr!(InstrumentKind::Drumkit, "brush drums", 40),
    instr!(InstrumentKind::Drumkit, "brush kit", 40),
    instr!(InstrumentKind::Drumkit, "classical drums", 48),
    instr!(InstrumentKind::Drumkit, "cm-64 drums", 127),
    instr!(InstrumentKind::Drumkit, "cm-64 kit", 127),
    instr!(InstrumentKind::Drumkit, "drums", 0),
    instr!(InstrumentKind::Drumkit, "electronic drums", 24),
    instr!(InstrumentKind::Drumkit, "electronic kit", 24),
    instr!(InstrumentKind::Drumkit, "jazz drums", 32),
    instr!(InstrumentKind::Drumkit, "jazz kit", 32),
    instr!(InstrumentKind::Drumkit, "mt-32 drums", 127),
    instr!(InstrumentKind::Drumkit, "mt-32 kit", 127),
    instr!(InstrumentKind::Drumkit, "orchestra drums", 48),
    instr!(InstrumentKind::Drumkit, "orchestra kit", 48),
    instr!(InstrumentKind::Drumkit, "power drums", 16),
    instr!(InstrumentKind::Drumkit, "power kit", 16),
    instr!(InstrumentKind::Drumkit, "rock drums", 16),
    instr!(InstrumentKind::Drumkit, "room drums", 8),
    instr!(InstrumentKind::Drumkit, "room kit", 8),
    instr!(InstrumentKind::Drumkit, "sfx drums", 56),
    instr!(InstrumentKind::Drumkit, "sfx kit", 56),
    instr!(InstrumentKind::Drumkit, "standard drums", 0),
    instr!(InstrumentKind::Drumkit, "standard kit", 0),
    instr!(InstrumentKind::Drumkit, "tr-808 drums", 25),
    instr!(InstrumentKind::Drumkit, "tr-808 kit", 25),
];

/// General MIDI toned instruments, sorted by name.
static TONED: &[Instrument] = &[
    instr!(InstrumentKind::Toned, "accordion", 21),
    instr!(InstrumentKind::Toned, "acoustic bass", 32),
    instr!(InstrumentKind::Toned, "acoustic grand", 0),
    instr!(InstrumentKind::Toned, "acoustic guitar (nylon)", 24),
    instr!(InstrumentKind::Toned, "acoustic guitar (steel)", 25),
    instr!(InstrumentKind::Toned, "agogo", 113),
    instr!(InstrumentKind::Toned, "alto sax", 65),
    instr!(InstrumentKind::Toned, "applause", 126),
    instr!(InstrumentKind::Toned, "bagpipe", 109),
    instr!(InstrumentKind::Toned, "banjo", 105),
    instr!(InstrumentKind::Toned, "baritone sax", 67),
    instr!(InstrumentKind::Toned, "bassoon", 70),
    instr!(InstrumentKind::Toned, "bird tweet", 123),
    instr!(InstrumentKind::Toned, "blown bottle", 76),
    instr!(InstrumentKind::Toned, "brass section", 61),
    instr!(InstrumentKind::Toned, "breath noise", 121),
    instr!(InstrumentKind::Toned, "bright acoustic", 1),
    instr!(InstrumentKind::Toned, "celesta", 8),
    instr!(InstrumentKind::Toned, "cello", 42),
    instr!(InstrumentKind::Toned, "choir aahs", 52),
    instr!(InstrumentKind::Toned, "church organ", 19),
    instr!(InstrumentKind::Toned, "clarinet", 71),
    instr!(InstrumentKind::Toned, "clav", 7),
    instr!(InstrumentKind::Toned, "concertina", 23),
    instr!(InstrumentKind::Toned, "contrabass", 43),
    instr!(InstrumentKind::Toned, "distorted guitar", 30),
    instr!(InstrumentKind::Toned, "drawbar organ", 16),
    instr!(InstrumentKind::Toned, "dulcimer", 15),
    instr!(InstrumentKind::Toned, "electric bass (finger)", 33),
    instr!(InstrumentKind::Toned, "electric bass (pick)", 34),
    instr!(InstrumentKind::Toned, "electric grand", 2),
    instr!(InstrumentKind::Toned, "electric guitar (clean)", 27),
    instr!(InstrumentKind::Toned, "electric guitar (jazz)", 26),
    instr!(InstrumentKind::Toned, "electric guitar (muted)", 28),
    instr!(InstrumentKind::Toned, "electric piano 1", 4),
    instr!(InstrumentKind::Toned, "electric piano 2", 5),
    instr!(InstrumentKind::Toned, "english horn", 69),
    instr!(InstrumentKind::Toned, "fiddle", 110),
    instr!(InstrumentKind::Toned, "flute", 73),
    instr!(InstrumentKind::Toned, "french horn", 60),
    instr!(InstrumentKind::Toned, "fretless bass", 35),
    instr!(InstrumentKind::Toned, "fx 1 (rain)", 96),
    instr!(InstrumentKind::Toned, "fx 2 (soundtrack)", 97),
    instr!(InstrumentKind::Toned, "fx 3 (crystal)", 98),
    instr!(InstrumentKind::Toned, "fx 4 (atmosphere)", 99),
    instr!(InstrumentKind::Toned, "fx 5 (brightness)", 100),
    instr!(InstrumentKind::Toned, "fx 6 (goblins)", 101),
    instr!(InstrumentKind::Toned, "fx 7 (echoes)", 102),
    instr!(InstrumentKind::Toned, "fx 8 (sci-fi)", 103),
    instr!(InstrumentKind::Toned, "glockenspiel", 9),
    instr!(InstrumentKind::Toned, "guitar fret noise", 120),
    instr!(InstrumentKind::Toned, "guitar harmonics", 31),
    instr!(InstrumentKind::Toned, "gunshot", 127),
    instr!(InstrumentKind::Toned, "harmonica", 22),
    instr!(InstrumentKind::Toned, "harpsichord", 6),
    instr!(InstrumentKind::Toned, "helicopter", 125),
    instr!(InstrumentKind::Toned, "honky-tonk", 3),
    instr!(InstrumentKind::Toned, "kalimba", 108),
    instr!(InstrumentKind::Toned, "koto", 107),
    instr!(InstrumentKind::Toned, "lead 1 (square)", 80),
    instr!(InstrumentKind::Toned, "lead 2 (sawtooth)", 81),
    instr!(InstrumentKind::Toned, "lead 3 (calliope)", 82),
    instr!(InstrumentKind::Toned, "lead 4 (chiff)", 83),
    instr!(InstrumentKind::Toned, "lead 5 (charang)", 84),
    instr!(InstrumentKind::Toned, "lead 6 (voice)", 85),
    instr!(InstrumentKind::Toned, "lead 7 (fifths)", 86),
    instr!(InstrumentKind::Toned, "lead 8 (bass+lead)", 87),
    instr!(InstrumentKind::Toned, "marimba", 12),
    instr!(InstrumentKind::Toned, "melodic tom", 117),
    instr!(InstrumentKind::Toned, "music box", 10),
    instr!(InstrumentKind::Toned, "muted trumpet", 59),
    instr!(InstrumentKind::Toned, "oboe", 68),
    instr!(InstrumentKind::Toned, "ocarina", 79),
    instr!(InstrumentKind::Toned, "orchestra hit", 55),
    instr!(InstrumentKind::Toned, "orchestral harp", 46),
    instr!(InstrumentKind::Toned, "overdriven guitar", 29),
    instr!(InstrumentKind::Toned, "pad 1 (new age)", 88),
    instr!(InstrumentKind::Toned, "pad 2 (warm)", 89),
    instr!(InstrumentKind::Toned, "pad 3 (polysynth)", 90),
    instr!(InstrumentKind::Toned, "pad 4 (choir)", 91),
    instr!(InstrumentKind::Toned, "pad 5 (bowed)", 92),
    instr!(InstrumentKind::Toned, "pad 6 (metallic)", 93),
    instr!(InstrumentKind::Toned, "pad 7 (halo)", 94),
    instr!(InstrumentKind::Toned, "pad 8 (sweep)", 95),
    instr!(InstrumentKind::Toned, "pan flute", 75),
    instr!(InstrumentKind::Toned, "percussive organ", 17),
    instr!(InstrumentKind::Toned, "piccolo", 72),
    instr!(InstrumentKind::Toned, "pizzicato strings", 45),
    instr!(InstrumentKind::Toned, "recorder", 74),
    instr!(InstrumentKind::Toned, "reed organ", 20),
    instr!(InstrumentKind::Toned, "reverse cymbal", 119),
    instr!(InstrumentKind::Toned, "rock organ", 18),
    instr!(InstrumentKind::Toned, "seashore", 122),
    instr!(InstrumentKind::Toned, "shakuhachi", 77),
    instr!(InstrumentKind::Toned, "shamisen", 106),
    instr!(InstrumentKind::Toned, "shanai", 111),
    instr!(InstrumentKind::Toned, "sitar", 104),
    instr!(InstrumentKind::Toned, "slap bass 1", 36),
    instr!(InstrumentKind::Toned, "slap bass 2", 37),
    instr!(InstrumentKind::Toned, "soprano sax", 64),
    instr!(InstrumentKind::Toned, "steel drums", 114),
    instr!(InstrumentKind::Toned, "string ensemble 1", 48),
    instr!(InstrumentKind::Toned, "string ensemble 2", 49),
    instr!(InstrumentKind::Toned, "synth bass 1", 38),
    instr!(InstrumentKind::Toned, "synth bass 2", 39),
    instr!(InstrumentKind::Toned, "synth drum", 118),
    instr!(InstrumentKind::Toned, "synth voice", 54),
    instr!(InstrumentKind::Toned, "synthbrass 1", 62),
    instr!(InstrumentKind::Toned, "synthbrass 2", 63),
    instr!(InstrumentKind::Toned, "synthstrings 1", 50),
    instr!(InstrumentKind::Toned, "synthstrings 2", 51),
    instr!(InstrumentKind::Toned, "taiko drum", 116),
    instr!(InstrumentKind::Toned, "telephone ring", 124),
    instr!(InstrumentKind::Toned, "tenor sax", 66),
    instr!(InstrumentKind::Toned, "timpani", 47),
    instr!(InstrumentKind::Toned, "tinkle bell", 112),
    instr!(InstrumentKind::Toned, "tremolo strings", 44),
    instr!(InstrumentKind::Toned, "trombone", 57),
    instr!(InstrumentKind::Toned, "trumpet", 56),
    instr!(InstrumentKind::Toned, "tuba", 58),
    instr!(InstrumentKind::Toned, "tubular bells", 14),
    instr!(InstrumentKind::Toned, "vibraphone", 11),
    instr!(InstrumentKind::Toned, "viola", 41),
    instr!(InstrumentKind::Toned, "violin", 40),
    instr!(InstrumentKind::Toned, "voice oohs", 53),
    instr!(InstrumentKind::Toned, "whistle", 78),
    instr!(InstrumentKind::Toned, "woodblock", 115),
    instr!(InstrumentKind::Toned, "xylophone", 13),
];

/// Looks up an instrument by case-insensitive name prefix.
///
/// Returns `None` on no match; callers apply [`DEFAULT_TONED`] or
/// [`DEFAULT_DRUMKIT`] themselves rather than this function guessing
/// which default applies.
pub fn lookup(kind: InstrumentKind, name: &str) -> Option<&'static Instrument> {
    let table = match kind {
        InstrumentKind::Toned => TONED,
        InstrumentKind::Drumkit => DRUMKITS,
    };
    let needle = name.to_ascii_lowercase();
    table.iter().find(|entry| entry.name.starts_with(needle.as_str()))
}
