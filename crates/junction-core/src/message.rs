//! MIDI 1.0 message classification by status nibble.

/// Nibble code carried by system messages, active sense included.
pub const ACTIVE_SENSE: u8 = 15;

/// Highest status byte that can be transposed (Polyphonic Aftertouch, channel 16).
///
/// Note Off, Note On and Polyphonic Aftertouch all carry the note number in
/// their first data byte.
pub const TRANSPOSABLE_STATUS_MAX: u8 = 0xAF;

/// Top four bits of a status byte.
#[inline]
pub fn message_type(status: u8) -> u8 {
    status >> 4
}

/// Message categories selectable in a route filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MessageType {
    NoteOff,
    NoteOn,
    PolyAftertouch,
    ControlChange,
    ProgramChange,
    ChannelAftertouch,
    PitchBend,
    /// Nibble 15: system common, realtime and active sense.
    System,
}

impl MessageType {
    /// The channel voice types offered when editing a route.
    pub const SELECTABLE: [MessageType; 7] = [
        MessageType::NoteOff,
        MessageType::NoteOn,
        MessageType::PolyAftertouch,
        MessageType::ControlChange,
        MessageType::ProgramChange,
        MessageType::ChannelAftertouch,
        MessageType::PitchBend,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            8 => Some(Self::NoteOff),
            9 => Some(Self::NoteOn),
            10 => Some(Self::PolyAftertouch),
            11 => Some(Self::ControlChange),
            12 => Some(Self::ProgramChange),
            13 => Some(Self::ChannelAftertouch),
            14 => Some(Self::PitchBend),
            ACTIVE_SENSE => Some(Self::System),
            _ => None,
        }
    }

    /// Classify a raw status byte. Data bytes (< 0x80) have no type.
    #[inline]
    pub fn from_status(status: u8) -> Option<Self> {
        Self::from_code(message_type(status))
    }

    pub fn code(self) -> u8 {
        match self {
            Self::NoteOff => 8,
            Self::NoteOn => 9,
            Self::PolyAftertouch => 10,
            Self::ControlChange => 11,
            Self::ProgramChange => 12,
            Self::ChannelAftertouch => 13,
            Self::PitchBend => 14,
            Self::System => ACTIVE_SENSE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NoteOff => "Note Off",
            Self::NoteOn => "Note On",
            Self::PolyAftertouch => "Polyphonic Aftertouch",
            Self::ControlChange => "Control Change",
            Self::ProgramChange => "Program Change",
            Self::ChannelAftertouch => "Channel Aftertouch",
            Self::PitchBend => "Pitch Bend",
            Self::System => "System",
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether a message is eligible for transposition.
#[inline]
pub fn is_transposable(message: &[u8]) -> bool {
    message.len() >= 2 && message[0] <= TRANSPOSABLE_STATUS_MAX
}
