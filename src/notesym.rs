//! Note names, drum names, and the pitch-class comparison used by the
//! relative-to-absolute pass.

/// The seven natural note names, in scale order starting at C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum NoteSym {
    C = 0,
    D = 1,
    E = 2,
    F = 3,
    G = 4,
    A = 5,
    B = 6,
}

const NOTE_SYM_COUNT: i32 = 7;

/// Semitone offset from C for each natural note name, indexed by
/// [`NoteSym`] discriminant.
const SEMITONES: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];

impl NoteSym {
    pub fn semitone(self) -> i32 {
        SEMITONES[self as usize]
    }
}

/// A percussion voice name, mapped to a fixed General MIDI percussion
/// key rather than a program change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum DrumSym {
    AcousticBassDrum,
    BassDrum,
    HiSideStick,
    SideStick,
    LoSideStick,
    AcousticSnare,
    Snare,
    HandClap,
    ElectricSnare,
    LowFloorTom,
    ClosedHiHat,
    HiHat,
    HighFloorTom,
    PedalHiHat,
    LowTom,
    OpenHiHat,
    HalfOpenHiHat,
    LowMidTom,
    HiMidTom,
    CrashCymbalA,
    CrashCymbal,
    HighTom,
    RideCymbalA,
    RideCymbal,
    ChineseCymbal,
    RideBell,
    Tambourine,
    SplashCymbal,
    Cowbell,
    CrashCymbalB,
    Vibraslap,
    RideCymbalB,
    MuteHiBongo,
    HiBongo,
    OpenHiBongo,
    MuteLoBongo,
    LoBongo,
    OpenLoBongo,
    MuteHiConga,
    MuteLoConga,
    OpenHiConga,
    HiConga,
    OpenLoConga,
    LoConga,
    HiTimbale,
    LoTimbale,
    HiAgogo,
    LoAgogo,
    Cabasa,
    Maracas,
    ShortWhistle,
    LongWhistle,
    ShortGuiro,
    LongGuiro,
    Guiro,
    Claves,
    HiWoodBlock,
    LoWoodBlock,
    MuteCuica,
    OpenCuica,
    MuteTriangle,
    Triangle,
    OpenTriangle,
}

impl DrumSym {
    /// The General MIDI percussion key this symbol triggers on channel 9.
    pub fn note(self) -> u8 {
        use DrumSym::*;
        match self {
            AcousticBassDrum => 35,
            BassDrum => 36,
            HiSideStick | SideStick | LoSideStick => 37,
            AcousticSnare => 38,
            Snare => 38,
            HandClap => 39,
            ElectricSnare => 40,
            LowFloorTom => 41,
            ClosedHiHat => 42,
            HiHat => 42,
            HighFloorTom => 43,
            PedalHiHat => 44,
            LowTom => 45,
            OpenHiHat => 46,
            HalfOpenHiHat => 46,
            LowMidTom => 47,
            HiMidTom => 48,
            CrashCymbalA | CrashCymbal => 49,
            HighTom => 50,
            RideCymbalA | RideCymbal => 51,
            ChineseCymbal => 52,
            RideBell => 53,
            Tambourine => 54,
            SplashCymbal => 55,
            Cowbell => 56,
            CrashCymbalB => 57,
            Vibraslap => 58,
            RideCymbalB => 59,
            MuteHiBongo | HiBongo => 60,
            OpenHiBongo => 60,
            MuteLoBongo | LoBongo => 61,
            OpenLoBongo => 61,
            MuteHiConga => 62,
            OpenHiConga | HiConga => 63,
            MuteLoConga => 62,
            OpenLoConga | LoConga => 64,
            HiTimbale => 65,
            LoTimbale => 66,
            HiAgogo => 67,
            LoAgogo => 68,
            Cabasa => 69,
            Maracas => 70,
            ShortWhistle => 71,
            LongWhistle => 72,
            ShortGuiro => 73,
            LongGuiro => 74,
            Guiro => 74,
            Claves => 75,
            HiWoodBlock => 76,
            LoWoodBlock => 77,
            MuteCuica => 78,
            OpenCuica => 79,
            MuteTriangle => 80,
            Triangle => 81,
            OpenTriangle => 81,
        }
    }
}

/// Compares two note symbols as positions on the 7-note scale circle,
/// biased toward the lower neighbor on an exact tie.
///
/// Returns `Ordering::Equal` for identical symbols. Otherwise returns
/// `Less` if `b` is closer to `a` going down the circle, `Greater` if
/// closer going up; a distance of exactly half the circle (3 or 4 of 7)
/// resolves to `Greater` (upward), matching the reference bias.
pub fn compare_notesyms(a: NoteSym, b: NoteSym) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    if a == b {
        return Ordering::Equal;
    }

    let mut diff = a as i32 - b as i32;
    if diff < 0 {
        diff += NOTE_SYM_COUNT;
    }

    if diff < 4 {
        Ordering::Less
    } else {
        Ordering::Greater
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cmp::Ordering;

    #[test]
    fn semitone_table_matches_natural_scale() {
        assert_eq!(NoteSym::C.semitone(), 0);
        assert_eq!(NoteSym::E.semitone(), 4);
        assert_eq!(NoteSym::B.semitone(), 11);
    }

    #[test]
    fn compare_notesyms_equal() {
        assert_eq!(compare_notesyms(NoteSym::G, NoteSym::G), Ordering::Equal);
    }

    #[test]
    fn compare_notesyms_matches_reference_example() {
        // c b: cmp(C, B) must be Less per the octave-crossing scenario.
        assert_eq!(compare_notesyms(NoteSym::C, NoteSym::B), Ordering::Less);
    }

    #[test]
    fn drum_note_lookup_is_in_gm_percussion_range() {
        assert_eq!(DrumSym::AcousticBassDrum.note(), 35);
        assert_eq!(DrumSym::OpenTriangle.note(), 81);
    }
}
