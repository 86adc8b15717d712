//! The shape every device codec shares.
//!
//! A codec recognizes its own dumps, parses them into a typed patch and emits
//! a patch back as an ordered list of [`Packet`]s. Devices that cannot absorb
//! a whole dump in one burst get [`Packet::Pause`] entries between fragments,
//! and the transport must honour them in order.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use crate::error::CodecError;
use crate::registry::AnyPatch;

/// Result of parsing one incoming message.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome<P> {
    /// The message was decoded into a patch
    Succeeded(P),
    /// The message belongs to the device but could not be decoded
    Failed(CodecError),
    /// Unrelated device chatter that should be dropped without a report
    Cancelled,
}

impl<P> ParseOutcome<P> {
    /// The patch, if parsing succeeded
    pub fn ok(self) -> Option<P> {
        match self {
            ParseOutcome::Succeeded(patch) => Some(patch),
            _ => None,
        }
    }

    /// True for [`ParseOutcome::Succeeded`]
    pub fn is_succeeded(&self) -> bool {
        matches!(self, ParseOutcome::Succeeded(_))
    }

    /// True for [`ParseOutcome::Cancelled`]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ParseOutcome::Cancelled)
    }

    /// Transform the patch of a successful outcome
    pub fn map<Q, F: FnOnce(P) -> Q>(self, f: F) -> ParseOutcome<Q> {
        match self {
            ParseOutcome::Succeeded(patch) => ParseOutcome::Succeeded(f(patch)),
            ParseOutcome::Failed(err) => ParseOutcome::Failed(err),
            ParseOutcome::Cancelled => ParseOutcome::Cancelled,
        }
    }
}

impl<P> From<Result<P, CodecError>> for ParseOutcome<P> {
    fn from(result: Result<P, CodecError>) -> Self {
        match result {
            Ok(patch) => ParseOutcome::Succeeded(patch),
            Err(err) => ParseOutcome::Failed(err),
        }
    }
}

/// One element of an emission, sent in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// A complete sysex message or one fragment of a divided one
    Sysex(Vec<u8>),
    /// A three byte channel message (NRPN control changes)
    Short([u8; 3]),
    /// A two byte program change
    Program([u8; 2]),
    /// Wait before sending the next packet
    Pause(Duration),
}

/// Ordered packets produced by an emit or request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Emission {
    packets: Vec<Packet>,
}

impl Emission {
    /// An empty emission
    pub fn new() -> Self {
        Self::default()
    }

    /// A single complete message
    pub fn single(message: Vec<u8>) -> Self {
        Self {
            packets: vec![Packet::Sysex(message)],
        }
    }

    /// Append a sysex message or fragment
    pub fn sysex(mut self, message: Vec<u8>) -> Self {
        self.packets.push(Packet::Sysex(message));
        self
    }

    /// Append a control change on `channel`
    pub fn control_change(mut self, channel: Channel, controller: u8, value: u8) -> Self {
        self.packets
            .push(Packet::Short([0xB0 | channel.get(), controller & 0x7F, value & 0x7F]));
        self
    }

    /// Append a program change on `channel`
    pub fn program_change(mut self, channel: Channel, program: u8) -> Self {
        self.packets
            .push(Packet::Program([0xC0 | channel.get(), program & 0x7F]));
        self
    }

    /// Append a pause of `ms` milliseconds
    pub fn pause(mut self, ms: u64) -> Self {
        self.packets.push(Packet::Pause(Duration::from_millis(ms)));
        self
    }

    /// Append every packet of `other`
    pub fn extend(mut self, other: Emission) -> Self {
        self.packets.extend(other.packets);
        self
    }

    /// The packets in send order
    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    /// Only the sysex packets, in order
    pub fn sysex_messages(&self) -> impl Iterator<Item = &[u8]> {
        self.packets.iter().filter_map(|p| match p {
            Packet::Sysex(bytes) => Some(bytes.as_slice()),
            _ => None,
        })
    }

    /// Every byte packet concatenated, pauses dropped. This is the form a
    /// `.syx` file holds.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for packet in &self.packets {
            match packet {
                Packet::Sysex(bytes) => out.extend_from_slice(bytes),
                Packet::Short(bytes) => out.extend_from_slice(bytes),
                Packet::Program(bytes) => out.extend_from_slice(bytes),
                Packet::Pause(_) => {}
            }
        }
        out
    }
}

/// A bank and patch number on the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct PatchLocation {
    /// Bank index, zero based
    pub bank: u8,
    /// Patch number within the bank, zero based
    pub number: u8,
}

impl PatchLocation {
    /// Location `number` of `bank`
    pub fn new(bank: u8, number: u8) -> Self {
        Self { bank, number }
    }
}

/// Where an emitted patch is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The device's working memory
    EditBuffer,
    /// A stored patch slot on the device
    Store(PatchLocation),
    /// A file on disk, addressed as if it were a stored slot
    File(PatchLocation),
}

impl Target {
    /// Stored location, `None` for the edit buffer
    pub fn location(&self) -> Option<PatchLocation> {
        match *self {
            Target::EditBuffer => None,
            Target::Store(location) | Target::File(location) => Some(location),
        }
    }

    /// True when the bytes are written to disk rather than sent
    pub fn is_file(&self) -> bool {
        matches!(self, Target::File(_))
    }
}

/// A MIDI channel, 0..=15 on the wire.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Channel(u8);

impl Channel {
    /// Wire channel `channel`
    pub fn new(channel: u8) -> Result<Self, CodecError> {
        if channel > 15 {
            return Err(CodecError::InvalidChannel(channel));
        }
        Ok(Self(channel))
    }

    /// Channel as written into status and header bytes
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

/// Settings shared by every codec built from a registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecConfig {
    /// Channel used for outgoing headers and NRPN messages
    pub channel: Channel,
}

/// A patch type owned by one codec.
pub trait Patch: Clone + fmt::Debug + Serialize {
    /// Display name of the patch
    fn name(&self) -> String;

    /// Stored location, `None` for an edit buffer dump
    fn location(&self) -> Option<PatchLocation>;

    /// Clamp every field into its range and normalize the name
    fn revise(&mut self);

    /// Wrap into the registry's patch enum
    fn into_any(self) -> AnyPatch;

    /// Borrow out of the registry's patch enum
    fn from_any(patch: &AnyPatch) -> Option<&Self>;
}

/// A sysex codec for one device family.
pub trait Codec {
    /// The patch this codec reads and writes
    type Patch: Patch;

    /// Short human readable device name
    fn name(&self) -> &'static str;

    /// Cheap check whether `data` is one of this device's patch dumps.
    /// Never panics, whatever the input.
    fn recognize(&self, data: &[u8]) -> bool;

    /// Decode a dump. The returned patch is already revised.
    fn parse(&self, data: &[u8]) -> ParseOutcome<Self::Patch>;

    /// Encode `patch` for `target`
    fn emit(&self, patch: &Self::Patch, target: Target) -> Result<Emission, CodecError>;

    /// Ask the device for a stored patch, or the edit buffer for `None`
    fn request_dump(&self, location: Option<PatchLocation>) -> Emission;

    /// Front panel name of a location
    fn location_name(&self, location: PatchLocation) -> String;

    /// The location after `location`, wrapping at the end of the device
    fn next_location(&self, location: PatchLocation) -> PatchLocation;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_range() {
        assert_eq!(Channel::new(15).unwrap().get(), 15);
        assert_eq!(Channel::new(16), Err(CodecError::InvalidChannel(16)));
        assert_eq!(Channel::new(0).unwrap().to_string(), "1");
    }

    #[test]
    fn test_emission_bytes() {
        let ch = Channel::new(2).unwrap();
        let emission = Emission::single(vec![0xF0, 0x01])
            .pause(100)
            .sysex(vec![0x02, 0xF7])
            .control_change(ch, 99, 0x10)
            .program_change(ch, 0x85);

        assert_eq!(emission.packets().len(), 5);
        assert_eq!(emission.sysex_messages().count(), 2);
        assert_eq!(emission.packets()[4], Packet::Program([0xC2, 0x05]));
        assert_eq!(
            emission.to_bytes(),
            vec![0xF0, 0x01, 0x02, 0xF7, 0xB2, 99, 0x10, 0xC2, 0x05]
        );
    }

    #[test]
    fn test_outcome_map() {
        let outcome: ParseOutcome<u8> = ParseOutcome::Succeeded(2);
        assert_eq!(outcome.map(|v| v * 2), ParseOutcome::Succeeded(4));

        let cancelled: ParseOutcome<u8> = ParseOutcome::Cancelled;
        assert!(cancelled.is_cancelled());
        assert_eq!(cancelled.ok(), None);
    }

    #[test]
    fn test_target_location() {
        let loc = PatchLocation::new(1, 7);
        assert_eq!(Target::EditBuffer.location(), None);
        assert_eq!(Target::Store(loc).location(), Some(loc));
        assert!(Target::File(loc).is_file());
    }
}
