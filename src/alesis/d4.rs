//! Alesis D4 / DM5 drum kit dumps

use num_traits::clamp;
use serde::Serialize;

use crate::codec::{Channel, Codec, CodecConfig, Emission, ParseOutcome, Patch, PatchLocation, Target};
use crate::error::CodecError;
use crate::name;
use crate::registry::AnyPatch;
use crate::sysex::{checksum7, has_prefix, ALESIS_ID, SYSEX_END};

/// Total length of a kit dump
pub const DUMP_SIZE: usize = 343;

/// Drum records per kit
pub const NUM_DRUMS: usize = 61;

/// External trigger inputs
pub const NUM_TRIGGERS: usize = 12;

/// Stored kits on the device
pub const NUM_KITS: u8 = 21;

const NAME_LENGTH: usize = 14;
const NAME_OFFSET: usize = 7;
const ROOT_OFFSET: usize = NAME_OFFSET + NAME_LENGTH;
const TRIGGER_OFFSET: usize = ROOT_OFFSET + 3;
const DRUM_OFFSET: usize = TRIGGER_OFFSET + NUM_TRIGGERS;
const DRUM_RECORD_SIZE: usize = 5;
const CHECKSUM_OFFSET: usize = DUMP_SIZE - 2;

const EDIT_BUFFER_OPCODE: u8 = 0x01;
const KIT_OPCODE: u8 = 32;
const REQUEST_OFFSET: u8 = 64;
const REQUEST_CURRENT_OPCODE: u8 = 65;

const D4_ID: u8 = 0x06;
const DM5_ID: u8 = 0x13;

const D4_BANKS: [u16; 6] = [99, 99, 55, 92, 76, 80];
const DM5_BANKS: [u16; 8] = [95, 117, 71, 34, 36, 114, 65, 16];

/// Which of the two sibling drum modules a kit belongs to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum DeviceVariant {
    /// Alesis D4
    #[default]
    D4,
    /// Alesis DM5
    Dm5,
}

impl DeviceVariant {
    /// Model id byte in the sysex header
    pub fn device_id(self) -> u8 {
        match self {
            DeviceVariant::D4 => D4_ID,
            DeviceVariant::Dm5 => DM5_ID,
        }
    }

    /// Variant for a header model id byte
    pub fn from_device_id(id: u8) -> Option<Self> {
        match id {
            D4_ID => Some(DeviceVariant::D4),
            DM5_ID => Some(DeviceVariant::Dm5),
            _ => None,
        }
    }

    /// Number of voices in each sound bank
    pub fn bank_sizes(self) -> &'static [u16] {
        match self {
            DeviceVariant::D4 => &D4_BANKS,
            DeviceVariant::Dm5 => &DM5_BANKS,
        }
    }

    /// Voices across every bank
    pub fn total_voices(self) -> u16 {
        self.bank_sizes().iter().sum()
    }

    /// Model name
    pub fn name(self) -> &'static str {
        match self {
            DeviceVariant::D4 => "Alesis D4",
            DeviceVariant::Dm5 => "Alesis DM5",
        }
    }
}

/// Split a flat voice index into `(bank, number)`.
pub fn decompose_voice(variant: DeviceVariant, voice: u16) -> Option<(u8, u8)> {
    let mut remaining = voice;
    for (bank, &size) in variant.bank_sizes().iter().enumerate() {
        if remaining < size {
            return Some((bank as u8, remaining as u8));
        }
        remaining -= size;
    }
    None
}

/// Flat voice index of `number` in `bank`.
///
/// A bank index past the table counts the first bank's size for the missing
/// entries, which is what the hardware dumps imply.
pub fn compose_voice(variant: DeviceVariant, bank: u8, number: u8) -> u16 {
    let sizes = variant.bank_sizes();
    let preceding: u16 = (0..bank as usize)
        .map(|i| sizes.get(i).copied().unwrap_or(sizes[0]))
        .sum();
    preceding + number as u16
}

/// One of the 61 drum records of a kit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Drum {
    /// 0-99
    pub volume: u8,
    /// 0-6, 3 is center
    pub pan: u8,
    /// Main (0) or auxiliary (1) output
    pub output: u8,
    /// Flat index across the sound banks
    pub voice: u16,
    /// Fine tune, 0-99
    pub fine: u8,
    /// Mute group, 0-3
    pub groups: u8,
    /// Coarse tune, 0-7
    pub coarse: u8,
}

impl Default for Drum {
    fn default() -> Self {
        Self {
            volume: 99,
            pan: 3,
            output: 0,
            voice: 0,
            fine: 0,
            groups: 0,
            coarse: 4,
        }
    }
}

impl Drum {
    fn unpack(variant: DeviceVariant, record: &[u8]) -> Self {
        let bank = record[1] & 7;
        let number = record[2];
        Self {
            volume: record[0],
            pan: record[1] >> 4,
            output: (record[1] >> 3) & 1,
            voice: compose_voice(variant, bank, number),
            fine: record[3],
            groups: (record[4] >> 3) & 7,
            coarse: record[4] & 7,
        }
    }

    fn pack(&self, variant: DeviceVariant) -> Result<[u8; DRUM_RECORD_SIZE], CodecError> {
        let (bank, number) =
            decompose_voice(variant, self.voice).ok_or(CodecError::UnresolvableVoice {
                voice: self.voice,
                variant: variant.name(),
            })?;
        Ok([
            self.volume & 0x7F,
            ((self.pan & 7) << 4) | ((self.output & 1) << 3) | bank,
            number,
            self.fine & 0x7F,
            ((self.groups & 7) << 3) | (self.coarse & 7),
        ])
    }

    fn revise(&mut self, variant: DeviceVariant) {
        self.volume = clamp(self.volume, 0, 99);
        self.pan = clamp(self.pan, 0, 6);
        self.output = clamp(self.output, 0, 1);
        self.voice = clamp(self.voice, 0, variant.total_voices() - 1);
        self.fine = clamp(self.fine, 0, 99);
        self.groups = clamp(self.groups, 0, 3);
        self.coarse = clamp(self.coarse, 0, 7);
    }
}

/// A complete drum kit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DrumKit {
    /// D4 or DM5 bank tables
    pub variant: DeviceVariant,
    /// Stored kit slot, `None` for the edit buffer
    pub location: Option<PatchLocation>,
    /// Up to 14 characters
    pub name: String,
    /// Note of the first drum, 0-67
    pub root: u8,
    /// Drum played when the footswitch closes, 0-60
    pub footswitch_closing: u8,
    /// Drum played while the footswitch is held, 0-60
    pub footswitch_held: u8,
    /// Drum assigned to each trigger input, 0-60
    pub triggers: [u8; NUM_TRIGGERS],
    /// Always [`NUM_DRUMS`] long
    pub drums: Vec<Drum>,
}

impl Default for DrumKit {
    fn default() -> Self {
        Self {
            variant: DeviceVariant::D4,
            location: None,
            name: String::new(),
            root: 36,
            footswitch_closing: 0,
            footswitch_held: 0,
            triggers: [0; NUM_TRIGGERS],
            drums: vec![Drum::default(); NUM_DRUMS],
        }
    }
}

impl Patch for DrumKit {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn location(&self) -> Option<PatchLocation> {
        self.location
    }

    fn revise(&mut self) {
        self.name = name::printable(&name::truncate(self.name.trim(), NAME_LENGTH))
            .trim()
            .to_string();
        self.root = clamp(self.root, 0, 67);
        self.footswitch_closing = clamp(self.footswitch_closing, 0, 60);
        self.footswitch_held = clamp(self.footswitch_held, 0, 60);
        for trigger in self.triggers.iter_mut() {
            *trigger = clamp(*trigger, 0, 60);
        }
        self.drums.resize(NUM_DRUMS, Drum::default());
        let variant = self.variant;
        for drum in self.drums.iter_mut() {
            drum.revise(variant);
        }
    }

    fn into_any(self) -> AnyPatch {
        AnyPatch::AlesisD4(self)
    }

    fn from_any(patch: &AnyPatch) -> Option<&Self> {
        match patch {
            AnyPatch::AlesisD4(kit) => Some(kit),
            _ => None,
        }
    }
}

/// Codec for D4 and DM5 kit dumps. Parsing accepts both variants; the
/// configured variant only picks the model id of dump requests.
#[derive(Debug, Clone, Copy)]
pub struct AlesisD4 {
    channel: Channel,
    variant: DeviceVariant,
}

impl AlesisD4 {
    /// Codec talking to `variant` on the configured channel
    pub fn new(config: CodecConfig, variant: DeviceVariant) -> Self {
        Self {
            channel: config.channel,
            variant,
        }
    }

    /// Outgoing MIDI channel
    pub fn channel(&self) -> Channel {
        self.channel
    }

    fn unpack(&self, data: &[u8]) -> Result<DrumKit, CodecError> {
        const DEVICE: &str = "Alesis D4";

        if data.len() != DUMP_SIZE {
            return Err(CodecError::BadLength {
                device: DEVICE,
                actual: data.len(),
            });
        }
        let variant =
            DeviceVariant::from_device_id(data[4]).ok_or(CodecError::BadHeader { device: DEVICE })?;

        let location = match data[6] {
            EDIT_BUFFER_OPCODE => None,
            opcode @ KIT_OPCODE..=63 => {
                let number = opcode - KIT_OPCODE;
                if number > NUM_KITS {
                    return Err(CodecError::InvalidLocation { bank: 0, number });
                }
                Some(PatchLocation::new(0, number))
            }
            _ => return Err(CodecError::BadHeader { device: DEVICE }),
        };

        let checksum = checksum7(&data[NAME_OFFSET..CHECKSUM_OFFSET]);
        if checksum != data[CHECKSUM_OFFSET] {
            log::warn!(
                "{}: checksum {:#04x} does not match computed {:#04x}",
                variant.name(),
                data[CHECKSUM_OFFSET],
                checksum
            );
        }

        let mut triggers = [0u8; NUM_TRIGGERS];
        triggers.copy_from_slice(&data[TRIGGER_OFFSET..DRUM_OFFSET]);

        let drums = data[DRUM_OFFSET..CHECKSUM_OFFSET]
            .chunks_exact(DRUM_RECORD_SIZE)
            .map(|record| Drum::unpack(variant, record))
            .collect();

        Ok(DrumKit {
            variant,
            location,
            name: name::from_bytes(&data[NAME_OFFSET..ROOT_OFFSET]),
            root: data[ROOT_OFFSET],
            footswitch_closing: data[ROOT_OFFSET + 1],
            footswitch_held: data[ROOT_OFFSET + 2],
            triggers,
            drums,
        })
    }
}

impl Codec for AlesisD4 {
    type Patch = DrumKit;

    fn name(&self) -> &'static str {
        "Alesis D4/DM5"
    }

    fn recognize(&self, data: &[u8]) -> bool {
        data.len() == DUMP_SIZE
            && has_prefix(data, &ALESIS_ID)
            && DeviceVariant::from_device_id(data[4]).is_some()
            && (data[6] == EDIT_BUFFER_OPCODE
                || (KIT_OPCODE..KIT_OPCODE + NUM_KITS).contains(&data[6]))
    }

    fn parse(&self, data: &[u8]) -> ParseOutcome<DrumKit> {
        match self.unpack(data) {
            Ok(mut kit) => {
                log::debug!("{}: parsed kit '{}'", kit.variant.name(), kit.name);
                kit.revise();
                ParseOutcome::Succeeded(kit)
            }
            Err(err) => ParseOutcome::Failed(err),
        }
    }

    fn emit(&self, kit: &DrumKit, target: Target) -> Result<Emission, CodecError> {
        let opcode = match target.location() {
            None => EDIT_BUFFER_OPCODE,
            Some(loc) if loc.number < NUM_KITS => KIT_OPCODE + loc.number,
            Some(loc) => {
                return Err(CodecError::InvalidLocation {
                    bank: loc.bank,
                    number: loc.number,
                })
            }
        };

        let mut data = Vec::with_capacity(DUMP_SIZE);
        data.extend_from_slice(&ALESIS_ID);
        data.push(kit.variant.device_id());
        data.push(self.channel.get());
        data.push(opcode);
        data.extend(name::to_bytes(&kit.name, NAME_LENGTH));
        data.push(kit.root & 0x7F);
        data.push(kit.footswitch_closing & 0x7F);
        data.push(kit.footswitch_held & 0x7F);
        data.extend(kit.triggers.iter().map(|t| t & 0x7F));

        if kit.drums.len() != NUM_DRUMS {
            return Err(CodecError::BadLength {
                device: kit.variant.name(),
                actual: kit.drums.len(),
            });
        }
        for drum in &kit.drums {
            data.extend_from_slice(&drum.pack(kit.variant)?);
        }

        data.push(checksum7(&data[NAME_OFFSET..]));
        data.push(SYSEX_END);
        debug_assert_eq!(data.len(), DUMP_SIZE);

        Ok(Emission::single(data))
    }

    fn request_dump(&self, location: Option<PatchLocation>) -> Emission {
        let opcode = match location {
            Some(loc) => loc.number + KIT_OPCODE + REQUEST_OFFSET,
            None => REQUEST_CURRENT_OPCODE,
        };
        let mut data = ALESIS_ID.to_vec();
        data.extend_from_slice(&[self.variant.device_id(), self.channel.get(), opcode, SYSEX_END]);
        Emission::single(data)
    }

    fn location_name(&self, location: PatchLocation) -> String {
        format!("{:02}", location.number)
    }

    fn next_location(&self, location: PatchLocation) -> PatchLocation {
        let number = location.number + 1;
        PatchLocation::new(0, if number >= NUM_KITS { 0 } else { number })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_kit(variant: DeviceVariant) -> DrumKit {
        let mut kit = DrumKit {
            variant,
            location: Some(PatchLocation::new(0, 5)),
            name: "ROCK KIT".to_string(),
            root: 40,
            footswitch_closing: 12,
            footswitch_held: 13,
            ..DrumKit::default()
        };
        for (i, trigger) in kit.triggers.iter_mut().enumerate() {
            *trigger = ((i * 5) % 128) as u8;
        }
        for (i, drum) in kit.drums.iter_mut().enumerate() {
            drum.volume = ((i * 7) % 100) as u8;
            drum.pan = i as u8 % 7;
            drum.output = i as u8 % 2;
            drum.voice = (i as u16 * 8) % variant.total_voices();
            drum.fine = ((i * 3) % 100) as u8;
            drum.groups = i as u8 % 4;
            drum.coarse = i as u8 % 8;
        }
        kit.revise();
        kit
    }

    #[test]
    fn test_bank_totals() {
        assert_eq!(DeviceVariant::D4.total_voices(), 501);
        assert_eq!(DeviceVariant::Dm5.total_voices(), 548);
    }

    #[test]
    fn test_voice_decomposition_is_identity() {
        for variant in [DeviceVariant::D4, DeviceVariant::Dm5] {
            for voice in 0..variant.total_voices() {
                let (bank, number) = decompose_voice(variant, voice).unwrap();
                assert_eq!(compose_voice(variant, bank, number), voice);
            }
            assert_eq!(decompose_voice(variant, variant.total_voices()), None);
        }
    }

    #[test]
    fn test_voice_bank_boundaries() {
        assert_eq!(decompose_voice(DeviceVariant::D4, 98), Some((0, 98)));
        assert_eq!(decompose_voice(DeviceVariant::D4, 99), Some((1, 0)));
        assert_eq!(decompose_voice(DeviceVariant::Dm5, 547), Some((7, 15)));
    }

    #[test]
    fn test_round_trip() {
        let codec = AlesisD4::new(CodecConfig::default(), DeviceVariant::D4);
        for variant in [DeviceVariant::D4, DeviceVariant::Dm5] {
            let kit = sample_kit(variant);
            let emission = codec.emit(&kit, Target::Store(PatchLocation::new(0, 5))).unwrap();
            let bytes = emission.to_bytes();
            assert_eq!(bytes.len(), DUMP_SIZE);
            assert!(codec.recognize(&bytes));
            assert_eq!(codec.parse(&bytes).ok(), Some(kit));
        }
    }

    #[test]
    fn test_checksum_covers_payload() {
        let codec = AlesisD4::new(CodecConfig::default(), DeviceVariant::D4);
        let bytes = codec
            .emit(&sample_kit(DeviceVariant::D4), Target::EditBuffer)
            .unwrap()
            .to_bytes();
        assert_eq!(bytes[341], checksum7(&bytes[7..341]));
        assert_eq!(bytes[342], SYSEX_END);
    }

    #[test]
    fn test_edit_buffer_dump() {
        let codec = AlesisD4::new(CodecConfig::default(), DeviceVariant::D4);
        let kit = sample_kit(DeviceVariant::D4);
        let bytes = codec.emit(&kit, Target::EditBuffer).unwrap().to_bytes();
        assert_eq!(bytes[6], 0x01);

        let parsed = codec.parse(&bytes).ok().unwrap();
        assert_eq!(parsed.location, None);
        assert_eq!(parsed.drums, kit.drums);
        assert_eq!(parsed.drums[60], kit.drums[60]);
    }

    #[test]
    fn test_unresolvable_voice_is_an_error() {
        let codec = AlesisD4::new(CodecConfig::default(), DeviceVariant::D4);
        let mut kit = sample_kit(DeviceVariant::D4);
        kit.drums[3].voice = 501;
        assert_eq!(
            codec.emit(&kit, Target::EditBuffer),
            Err(CodecError::UnresolvableVoice {
                voice: 501,
                variant: "Alesis D4"
            })
        );
    }

    #[test]
    fn test_recognize_rejects_short_and_foreign() {
        let codec = AlesisD4::new(CodecConfig::default(), DeviceVariant::D4);
        assert!(!codec.recognize(&[]));
        assert!(!codec.recognize(&[0xF0, 0x00]));
        let mut bytes = vec![0u8; DUMP_SIZE];
        bytes[..4].copy_from_slice(&ALESIS_ID);
        bytes[4] = 0x07;
        bytes[6] = 0x01;
        assert!(!codec.recognize(&bytes));
        bytes[4] = 0x13;
        assert!(codec.recognize(&bytes));
        bytes[6] = 53;
        assert!(!codec.recognize(&bytes));
    }

    #[test]
    fn test_requests_and_locations() {
        let config = CodecConfig {
            channel: Channel::new(3).unwrap(),
        };
        let codec = AlesisD4::new(config, DeviceVariant::Dm5);
        assert_eq!(
            codec.request_dump(Some(PatchLocation::new(0, 2))).to_bytes(),
            vec![0xF0, 0x00, 0x00, 0x0E, 0x13, 0x03, 98, 0xF7]
        );
        assert_eq!(
            codec.request_dump(None).to_bytes(),
            vec![0xF0, 0x00, 0x00, 0x0E, 0x13, 0x03, 65, 0xF7]
        );
        assert_eq!(codec.location_name(PatchLocation::new(0, 7)), "07");
        assert_eq!(
            codec.next_location(PatchLocation::new(0, 20)),
            PatchLocation::new(0, 0)
        );
    }

    #[test]
    fn test_name_revise() {
        let mut kit = DrumKit {
            name: " JAZZ\u{1}KIT WITH BRUSHES ".to_string(),
            ..DrumKit::default()
        };
        kit.revise();
        assert_eq!(kit.name, "JAZZ KIT WITH");
    }
}
