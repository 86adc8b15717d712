//! Oberheim Matrix 1000 single patch dumps and remote edits

use std::collections::BTreeMap;

use num_traits::clamp;
use serde::Serialize;

use crate::codec::{Codec, CodecConfig, Emission, ParseOutcome, Patch, PatchLocation, Target};
use crate::error::CodecError;
use crate::name;
use crate::registry::AnyPatch;
use crate::sysex::{hex, OBERHEIM_ID, SYSEX_END, SYSEX_START};

use super::params::{
    from_seven_bits_signed, from_six_bits_signed, to_seven_bits_signed, to_six_bits_signed,
    Encoding, FlagGroup, ModField, ModSlot, Param, Slot, DUMP_ORDER, DUMP_SLOTS,
    MOD_DESTINATION_MAX, MOD_SOURCE_MAX, NUM_MODS,
};

const DEVICE: &str = "Oberheim Matrix 1000";
pub(super) const HEADER: [u8; 3] = [SYSEX_START, OBERHEIM_ID, 0x06];

/// Dump length with the trailing checksum
pub const DUMP_SIZE: usize = 275;
/// Dump length when the device leaves the checksum out
pub const SHORT_DUMP_SIZE: usize = DUMP_SIZE - 1;

const PAYLOAD_OFFSET: usize = 5;
const CHECKSUM_OFFSET: usize = PAYLOAD_OFFSET + 2 * DUMP_SLOTS;

const SINGLE_PATCH_OPCODE: u8 = 0x01;
const REQUEST_OPCODE: u8 = 0x04;
const PARAMETER_OPCODE: u8 = 0x06;
const SET_BANK_OPCODE: u8 = 0x0A;
const MOD_OPCODE: u8 = 0x0B;
const UNLOCK_BANK_OPCODE: u8 = 0x0C;
const EDIT_BUFFER_OPCODE: u8 = 0x0D;

const NAME_LENGTH: usize = 8;

/// Banks on the device
pub const NUM_BANKS: u8 = 10;
/// Patches per bank
pub const PATCHES_PER_BANK: u8 = 100;

/// Pause the device needs between consecutive messages, in milliseconds
pub const PAUSE_BETWEEN_SENDS: u64 = 50;

/// A Matrix 1000 patch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Matrix1000Patch {
    /// Stored slot, `None` for the edit buffer
    pub location: Option<PatchLocation>,
    /// Up to 8 characters. The device does not display it.
    pub name: String,
    values: BTreeMap<Param, u8>,
    /// Modulation matrix
    pub mods: [ModSlot; NUM_MODS],
}

impl Default for Matrix1000Patch {
    fn default() -> Self {
        Self {
            location: None,
            name: "UNTITLED".to_string(),
            values: Param::ALL.iter().map(|&p| (p, p.default_value())).collect(),
            mods: [ModSlot::default(); NUM_MODS],
        }
    }
}

impl Matrix1000Patch {
    /// Current value of `param`
    pub fn get(&self, param: Param) -> u8 {
        self.values
            .get(&param)
            .copied()
            .unwrap_or_else(|| param.default_value())
    }

    /// Set `param`, clamped into its range
    pub fn set(&mut self, param: Param, value: u8) {
        self.values
            .insert(param, clamp(value, param.min(), param.max()));
    }

    fn flags(&self, group: FlagGroup) -> u8 {
        group
            .members()
            .iter()
            .enumerate()
            .fold(0, |acc, (bit, &p)| acc | ((self.get(p) & 1) << bit))
    }

    fn set_flags(&mut self, group: FlagGroup, value: u8) {
        for (bit, &p) in group.members().iter().enumerate() {
            self.values.insert(p, (value >> bit) & 1);
        }
    }

    /// Wire byte of a stand alone parameter
    fn encoded(&self, param: Param) -> u8 {
        let value = self.get(param);
        match param.encoding() {
            Encoding::Plain => value,
            Encoding::Signed6 => to_six_bits_signed(value),
            Encoding::Signed7 => to_seven_bits_signed(value),
        }
    }

    fn mod_byte(&self, index: usize, field: ModField) -> u8 {
        let slot = &self.mods[index];
        match field {
            ModField::Amount => to_seven_bits_signed(slot.amount),
            _ if !slot.is_active() => 0,
            ModField::Source => slot.source,
            ModField::Destination => slot.destination,
        }
    }
}

impl Patch for Matrix1000Patch {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn location(&self) -> Option<PatchLocation> {
        self.location
    }

    fn revise(&mut self) {
        let trimmed = name::truncate(self.name.trim(), NAME_LENGTH);
        self.name = name::printable(&trimmed).trim().to_string();

        for &p in Param::ALL {
            let value = self.get(p);
            self.set(p, value);
        }
        for slot in self.mods.iter_mut() {
            slot.source = clamp(slot.source, 0, MOD_SOURCE_MAX);
            slot.amount = clamp(slot.amount, 1, 127);
            slot.destination = clamp(slot.destination, 0, MOD_DESTINATION_MAX);
        }
    }

    fn into_any(self) -> AnyPatch {
        AnyPatch::Matrix1000(self)
    }

    fn from_any(patch: &AnyPatch) -> Option<&Self> {
        match patch {
            AnyPatch::Matrix1000(p) => Some(p),
            _ => None,
        }
    }
}

/// Codec for Matrix 1000 patches. The device's sysex carries no channel.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matrix1000;

impl Matrix1000 {
    /// New codec; the channel in `config` is unused
    pub fn new(_config: CodecConfig) -> Self {
        Self
    }

    fn unpack(&self, data: &[u8]) -> Result<Matrix1000Patch, CodecError> {
        if data.len() != DUMP_SIZE && data.len() != SHORT_DUMP_SIZE {
            return Err(CodecError::BadLength {
                device: DEVICE,
                actual: data.len(),
            });
        }
        if data[..3] != HEADER {
            return Err(CodecError::BadHeader { device: DEVICE });
        }

        let number = data[4];
        let edit_buffer = match data[3] {
            EDIT_BUFFER_OPCODE => true,
            SINGLE_PATCH_OPCODE if number < PATCHES_PER_BANK => false,
            SINGLE_PATCH_OPCODE => return Err(CodecError::InvalidLocation { bank: 0, number }),
            _ => return Err(CodecError::BadHeader { device: DEVICE }),
        };

        let mut patch = Matrix1000Patch::default();
        let mut name = [b' '; NAME_LENGTH];
        let mut sum: u8 = 0;

        for (i, slot) in DUMP_ORDER.iter().enumerate() {
            let lo = data[PAYLOAD_OFFSET + 2 * i];
            let hi = data[PAYLOAD_OFFSET + 2 * i + 1];
            // bit 7 of a nibble pair can be set by the device; drop it
            let value = (((hi & 0x0F) << 4) | (lo & 0x0F)) & 0x7F;
            sum = sum.wrapping_add(value);

            match *slot {
                Slot::Name(n) => name[n] = value,
                Slot::Flags(group) => patch.set_flags(group, value),
                Slot::Value(Param::PortamentoMode) => {
                    // two exponential modes on the device; fold the second
                    let mode = if value == 4 { 3 } else { value };
                    patch.values.insert(Param::PortamentoMode, mode);
                }
                Slot::Value(param) => {
                    let decoded = match param.encoding() {
                        Encoding::Plain => value,
                        Encoding::Signed6 => from_six_bits_signed(value),
                        Encoding::Signed7 => from_seven_bits_signed(value),
                    };
                    patch.values.insert(param, decoded);
                }
                Slot::Mod(n, ModField::Source) => patch.mods[n].source = value,
                Slot::Mod(n, ModField::Amount) => {
                    patch.mods[n].amount = from_seven_bits_signed(value)
                }
                Slot::Mod(n, ModField::Destination) => patch.mods[n].destination = value,
            }
        }

        if data.len() == DUMP_SIZE && data[CHECKSUM_OFFSET] != sum & 0x7F {
            log::warn!(
                "{}: checksum {:#04x} does not match computed {:#04x}",
                DEVICE,
                data[CHECKSUM_OFFSET],
                sum & 0x7F
            );
        }

        patch.name = name::from_bytes(&name);
        if !edit_buffer {
            // the dump only carries the number; the bank is the name's
            // fourth character on factory patches
            let bank = name[3].wrapping_sub(b'0');
            let bank = if bank < NUM_BANKS { bank } else { 0 };
            patch.location = Some(PatchLocation::new(bank, number));
        }
        Ok(patch)
    }

    /// Single-parameter edit of `param` to its value in `patch`.
    /// Flags resend their whole packed byte.
    pub fn parameter_edit(
        &self,
        patch: &Matrix1000Patch,
        param: Param,
    ) -> Result<Emission, CodecError> {
        let (index, value) = match (param.internal(), param.group()) {
            (Some(index), _) => (index, patch.encoded(param)),
            (None, Some(group)) => (group.internal(), patch.flags(group)),
            (None, None) => return Err(CodecError::NotEditable(param.key())),
        };
        Ok(Emission::single(vec![
            SYSEX_START,
            OBERHEIM_ID,
            0x06,
            PARAMETER_OPCODE,
            index & 0x7F,
            value & 0x7F,
            SYSEX_END,
        ]))
    }

    /// Remote edit of modulation slot `number`, counted from 1.
    pub fn mod_edit(&self, patch: &Matrix1000Patch, number: usize) -> Result<Emission, CodecError> {
        if number == 0 || number > NUM_MODS {
            return Err(CodecError::NotEditable("modulation slot"));
        }
        let index = number - 1;
        Ok(Emission::single(vec![
            SYSEX_START,
            OBERHEIM_ID,
            0x06,
            MOD_OPCODE,
            index as u8,
            patch.mod_byte(index, ModField::Source),
            patch.mod_byte(index, ModField::Amount),
            patch.mod_byte(index, ModField::Destination),
            SYSEX_END,
        ]))
    }

    /// Select the bank later dumps and program changes refer to. This also
    /// locks the bank against writes.
    pub fn bank_select(&self, bank: u8) -> Result<Emission, CodecError> {
        if bank >= NUM_BANKS {
            return Err(CodecError::InvalidLocation { bank, number: 0 });
        }
        Ok(Emission::single(vec![
            SYSEX_START,
            OBERHEIM_ID,
            0x06,
            SET_BANK_OPCODE,
            bank,
            SYSEX_END,
        ]))
    }

    /// Allow writes to the selected bank
    pub fn unlock_bank(&self) -> Emission {
        Emission::single(vec![
            SYSEX_START,
            OBERHEIM_ID,
            0x06,
            UNLOCK_BANK_OPCODE,
            SYSEX_END,
        ])
    }

    fn dump(&self, patch: &Matrix1000Patch, header: [u8; 2]) -> Vec<u8> {
        let name_bytes = name::to_bytes(&patch.name, NAME_LENGTH);
        let mut data = Vec::with_capacity(DUMP_SIZE);
        data.extend_from_slice(&HEADER);
        data.extend_from_slice(&header);

        let mut sum: u8 = 0;
        for slot in DUMP_ORDER.iter() {
            let value = match *slot {
                Slot::Name(n) => name_bytes[n],
                Slot::Value(param) => patch.encoded(param),
                Slot::Flags(group) => patch.flags(group),
                Slot::Mod(n, field) => patch.mod_byte(n, field),
            };
            let value = value & 0x7F;
            sum = sum.wrapping_add(value);
            data.push(value & 0x0F);
            data.push(value >> 4);
        }
        data.push(sum & 0x7F);
        data.push(SYSEX_END);
        data
    }
}

impl Codec for Matrix1000 {
    type Patch = Matrix1000Patch;

    fn name(&self) -> &'static str {
        DEVICE
    }

    fn recognize(&self, data: &[u8]) -> bool {
        (data.len() == DUMP_SIZE || data.len() == SHORT_DUMP_SIZE)
            && data[..3] == HEADER
            && (data[3] == SINGLE_PATCH_OPCODE || data[3] == EDIT_BUFFER_OPCODE)
    }

    fn parse(&self, data: &[u8]) -> ParseOutcome<Matrix1000Patch> {
        match self.unpack(data) {
            Ok(mut patch) => {
                log::debug!("{}: parsed patch '{}'", DEVICE, patch.name);
                patch.revise();
                ParseOutcome::Succeeded(patch)
            }
            Err(err) => ParseOutcome::Failed(err),
        }
    }

    fn emit(&self, patch: &Matrix1000Patch, target: Target) -> Result<Emission, CodecError> {
        let location = match target.location() {
            None => return Ok(Emission::single(self.dump(patch, [EDIT_BUFFER_OPCODE, 0]))),
            Some(loc) if loc.bank < NUM_BANKS && loc.number < PATCHES_PER_BANK => loc,
            Some(loc) => {
                return Err(CodecError::InvalidLocation {
                    bank: loc.bank,
                    number: loc.number,
                })
            }
        };

        let dump = self.dump(patch, [SINGLE_PATCH_OPCODE, location.number]);
        if target.is_file() {
            return Ok(Emission::single(dump));
        }

        // set bank relocks, so unlock has to follow it
        let emission = self
            .bank_select(location.bank)?
            .pause(PAUSE_BETWEEN_SENDS)
            .extend(self.unlock_bank())
            .pause(PAUSE_BETWEEN_SENDS)
            .sysex(dump);
        log::debug!("{}: store to {}", DEVICE, self.location_name(location));
        Ok(emission)
    }

    fn request_dump(&self, location: Option<PatchLocation>) -> Emission {
        match location {
            Some(loc) => {
                let message = vec![
                    SYSEX_START,
                    OBERHEIM_ID,
                    0x06,
                    REQUEST_OPCODE,
                    0x01,
                    loc.number & 0x7F,
                    SYSEX_END,
                ];
                log::debug!("{}: request {}", DEVICE, hex(&message));
                Emission::single(message)
            }
            None => {
                log::warn!("{}: the edit buffer cannot be requested", DEVICE);
                Emission::new()
            }
        }
    }

    fn location_name(&self, location: PatchLocation) -> String {
        format!("{}{:02}", location.bank, location.number)
    }

    fn next_location(&self, location: PatchLocation) -> PatchLocation {
        let number = location.number.saturating_add(1);
        if number < PATCHES_PER_BANK {
            PatchLocation::new(location.bank, number)
        } else {
            PatchLocation::new(location.bank.saturating_add(1) % NUM_BANKS, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sysex::checksum7;
    use pretty_assertions::assert_eq;

    fn sample() -> Matrix1000Patch {
        let mut patch = Matrix1000Patch {
            name: "ORC3 HIT".to_string(),
            ..Default::default()
        };
        patch.set(Param::VcfFrequency, 100);
        patch.set(Param::Dco2Detune, 20);
        patch.set(Param::Lfo1SpeedMod, 10);
        patch.set(Param::Dco2Noise, 1);
        patch.set(Param::Dco2Pulse, 1);
        patch.set(Param::PortamentoMode, 2);
        patch.mods[0] = ModSlot {
            source: 4,
            amount: 90,
            destination: 9,
        };
        patch.revise();
        patch
    }

    fn payload_value(dump: &[u8], slot: usize) -> u8 {
        (dump[PAYLOAD_OFFSET + 2 * slot + 1] << 4) | dump[PAYLOAD_OFFSET + 2 * slot]
    }

    #[test]
    fn test_emit_parse_round_trip() {
        let codec = Matrix1000;
        let patch = sample();
        let emission = codec.emit(&patch, Target::EditBuffer).unwrap();
        let dump = emission.sysex_messages().next().unwrap().to_vec();
        assert_eq!(dump.len(), DUMP_SIZE);
        assert_eq!(&dump[..5], &[0xF0, 0x10, 0x06, 0x0D, 0x00]);
        assert!(codec.recognize(&dump));

        let parsed = codec.parse(&dump).ok().unwrap();
        assert_eq!(parsed, patch);
    }

    #[test]
    fn test_checksum_is_sum_of_values() {
        let dump = Matrix1000.dump(&sample(), [SINGLE_PATCH_OPCODE, 12]);
        let values: Vec<u8> = (0..DUMP_SLOTS).map(|i| payload_value(&dump, i)).collect();
        assert_eq!(dump[CHECKSUM_OFFSET], checksum7(&values));
        assert_eq!(dump[DUMP_SIZE - 1], SYSEX_END);
    }

    #[test]
    fn test_short_dump_without_checksum() {
        let mut dump = Matrix1000.dump(&sample(), [SINGLE_PATCH_OPCODE, 42]);
        dump.remove(CHECKSUM_OFFSET);
        assert_eq!(dump.len(), SHORT_DUMP_SIZE);
        assert!(Matrix1000.recognize(&dump));

        let parsed = Matrix1000.parse(&dump).ok().unwrap();
        assert_eq!(parsed.location, Some(PatchLocation::new(3, 42)));
        assert_eq!(parsed.name, "ORC3 HIT");
    }

    #[test]
    fn test_portamento_mode_four_becomes_three() {
        let mut dump = Matrix1000.dump(&sample(), [EDIT_BUFFER_OPCODE, 0]);
        let slot = DUMP_ORDER
            .iter()
            .position(|s| *s == Slot::Value(Param::PortamentoMode))
            .unwrap();
        dump[PAYLOAD_OFFSET + 2 * slot] = 4;
        dump[PAYLOAD_OFFSET + 2 * slot + 1] = 0;

        let parsed = Matrix1000.parse(&dump).ok().unwrap();
        assert_eq!(parsed.get(Param::PortamentoMode), 3);
    }

    #[test]
    fn test_signed_values_on_the_wire() {
        let dump = Matrix1000.dump(&sample(), [EDIT_BUFFER_OPCODE, 0]);
        let detune = DUMP_ORDER
            .iter()
            .position(|s| *s == Slot::Value(Param::Dco2Detune))
            .unwrap();
        // 20 is 12 below zero, sign extended into bit 6
        assert_eq!(payload_value(&dump, detune), 0x74);

        let wave = DUMP_ORDER
            .iter()
            .position(|s| *s == Slot::Flags(FlagGroup::Dco2WaveEnable))
            .unwrap();
        assert_eq!(payload_value(&dump, wave), 0b110);
    }

    #[test]
    fn test_inactive_mod_slots_zero_both_ends() {
        let mut patch = sample();
        patch.mods[1] = ModSlot {
            source: 5,
            amount: 70,
            destination: 0,
        };
        let dump = Matrix1000.dump(&patch, [EDIT_BUFFER_OPCODE, 0]);
        let parsed = Matrix1000.parse(&dump).ok().unwrap();
        assert_eq!(parsed.mods[1].source, 0);
        assert_eq!(parsed.mods[1].destination, 0);
        assert_eq!(parsed.mods[1].amount, 70);
        assert_eq!(parsed.mods[0], patch.mods[0]);
    }

    #[test]
    fn test_parameter_edits() {
        let patch = sample();
        let edit = Matrix1000.parameter_edit(&patch, Param::VcfFrequency).unwrap();
        assert_eq!(edit.to_bytes(), vec![0xF0, 0x10, 0x06, 0x06, 21, 100, 0xF7]);

        let edit = Matrix1000.parameter_edit(&patch, Param::Dco2Noise).unwrap();
        assert_eq!(edit.to_bytes(), vec![0xF0, 0x10, 0x06, 0x06, 16, 0b110, 0xF7]);

        let edit = Matrix1000.parameter_edit(&patch, Param::Lfo1SpeedMod).unwrap();
        assert_eq!(edit.to_bytes(), vec![0xF0, 0x10, 0x06, 0x06, 81, 74, 0xF7]);
    }

    #[test]
    fn test_mod_edit() {
        let patch = sample();
        let edit = Matrix1000.mod_edit(&patch, 1).unwrap();
        assert_eq!(edit.to_bytes(), vec![0xF0, 0x10, 0x06, 0x0B, 0, 4, 26, 9, 0xF7]);
        assert!(Matrix1000.mod_edit(&patch, 0).is_err());
        assert!(Matrix1000.mod_edit(&patch, 11).is_err());
    }

    #[test]
    fn test_store_selects_and_unlocks_bank() {
        let emission = Matrix1000
            .emit(&sample(), Target::Store(PatchLocation::new(2, 5)))
            .unwrap();
        let messages: Vec<&[u8]> = emission.sysex_messages().collect();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0], &[0xF0, 0x10, 0x06, 0x0A, 2, 0xF7]);
        assert_eq!(messages[1], &[0xF0, 0x10, 0x06, 0x0C, 0xF7]);
        assert_eq!(&messages[2][3..5], &[0x01, 5]);

        let file = Matrix1000
            .emit(&sample(), Target::File(PatchLocation::new(2, 5)))
            .unwrap();
        assert_eq!(file.packets().len(), 1);

        assert!(matches!(
            Matrix1000.emit(&sample(), Target::Store(PatchLocation::new(10, 0))),
            Err(CodecError::InvalidLocation { .. })
        ));
    }

    #[test]
    fn test_requests_and_locations() {
        let request = Matrix1000.request_dump(Some(PatchLocation::new(4, 17)));
        assert_eq!(request.to_bytes(), vec![0xF0, 0x10, 0x06, 0x04, 0x01, 17, 0xF7]);
        assert!(Matrix1000.request_dump(None).packets().is_empty());

        assert_eq!(Matrix1000.location_name(PatchLocation::new(3, 7)), "307");
        assert_eq!(
            Matrix1000.next_location(PatchLocation::new(9, 99)),
            PatchLocation::new(0, 0)
        );
    }

    #[test]
    fn test_recognize_rejects_other_dumps() {
        assert!(!Matrix1000.recognize(&[]));
        assert!(!Matrix1000.recognize(&[0xF0, 0x10, 0x06]));
        let mut dump = Matrix1000.dump(&sample(), [EDIT_BUFFER_OPCODE, 0]);
        dump[3] = 0x02;
        assert!(!Matrix1000.recognize(&dump));
        assert!(matches!(Matrix1000.parse(&dump), ParseOutcome::Failed(_)));
    }

    #[test]
    fn test_name_revise() {
        let mut patch = Matrix1000Patch {
            name: "  LONG\u{7}NAME HERE".to_string(),
            ..Default::default()
        };
        patch.revise();
        assert_eq!(patch.name, "LONG NAM");
    }
}
