//! Live single-parameter edits over NRPN.
//!
//! The service manual's scaling (`value * 127 / max`) does not match what the
//! hardware accepts. [`scale`] is the rule that does, and coarse tune needs
//! its own `(value + 1) * 127 / 8`.

use crate::codec::{Channel, Emission};
use crate::error::CodecError;

use super::d4::{decompose_voice, DrumKit, NUM_DRUMS};

const NRPN_ROOT: u16 = 0x10;
const NRPN_NOTE: u16 = 0x19;
const NRPN_BANK: u16 = 0x08;
const NRPN_NUMBER: u16 = 0x09;
const NRPN_COARSE: u16 = 0x0A;
const NRPN_FINE: u16 = 0x0B;
const NRPN_VOLUME: u16 = 0x0C;
const NRPN_PAN: u16 = 0x0D;
const NRPN_OUTPUT: u16 = 0x0E;
const NRPN_GROUP: u16 = 0x0F;

/// Pause after every NRPN, in milliseconds
pub const PAUSE_NRPN: u64 = 50;

/// A kit parameter that can be changed without a full dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KitParam {
    /// Root note of the kit
    Root,
    /// A field of drum `n`
    Drum(usize, DrumParam),
}

/// Per-drum fields with an NRPN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrumParam {
    /// Sound bank and number
    Voice,
    /// Coarse tune
    Coarse,
    /// Fine tune
    Fine,
    /// Level
    Volume,
    /// Stereo position
    Pan,
    /// Main or aux output
    Output,
    /// Mute group
    Groups,
}

/// Scale `value` in `0..=max` onto the 7-bit NRPN data MSB.
pub fn scale(value: u16, max: u16) -> u16 {
    let v = ((value as f64 * 127.0 + max as f64) / max as f64) as u16;
    v.min(127)
}

fn coarse_scale(value: u8) -> u16 {
    (value as u16 + 1) * 127 / 8
}

/// CC 99/98/6/38 for one NRPN, followed by the settle pause.
fn push_nrpn(emission: Emission, channel: Channel, parameter: u16, value: u16) -> Emission {
    emission
        .control_change(channel, 99, (parameter >> 7) as u8)
        .control_change(channel, 98, (parameter & 127) as u8)
        .control_change(channel, 6, (value >> 7) as u8)
        .control_change(channel, 38, (value & 127) as u8)
        .pause(PAUSE_NRPN)
}

/// Build the NRPN sequence that sets `param` on the device to its value in
/// `kit`. Drum parameters first select the drum by note.
pub fn nrpn_edit(kit: &DrumKit, param: KitParam, channel: Channel) -> Result<Emission, CodecError> {
    let (n, field) = match param {
        KitParam::Root => {
            let value = 128 * scale(kit.root as u16, 67);
            return Ok(push_nrpn(Emission::new(), channel, NRPN_ROOT, value));
        }
        KitParam::Drum(n, field) => (n, field),
    };

    let drum = kit.drums.get(n).ok_or(CodecError::NotEditable("drum index"))?;

    // select the drum; must precede any per-drum change
    let emission = push_nrpn(
        Emission::new(),
        channel,
        NRPN_NOTE,
        128 * scale(n as u16, NUM_DRUMS as u16 - 1),
    );

    let (parameter, value) = match field {
        DrumParam::Voice => {
            let (bank, number) =
                decompose_voice(kit.variant, drum.voice).ok_or(CodecError::UnresolvableVoice {
                    voice: drum.voice,
                    variant: kit.variant.name(),
                })?;
            let sizes = kit.variant.bank_sizes();
            let bank_value = (bank as u16 + 1) * 127 / sizes.len() as u16;
            let emission = push_nrpn(emission, channel, NRPN_BANK, 128 * bank_value);
            let number_value = scale(number as u16, sizes[bank as usize] - 1);
            return Ok(push_nrpn(emission, channel, NRPN_NUMBER, 128 * number_value));
        }
        DrumParam::Coarse => (NRPN_COARSE, coarse_scale(drum.coarse)),
        DrumParam::Fine => (NRPN_FINE, scale(drum.fine as u16, 99)),
        DrumParam::Volume => (NRPN_VOLUME, scale(drum.volume as u16, 99)),
        DrumParam::Pan => (NRPN_PAN, scale(drum.pan as u16, 6)),
        DrumParam::Output => (NRPN_OUTPUT, scale(drum.output as u16, 1)),
        DrumParam::Groups => (NRPN_GROUP, scale(drum.groups as u16, 3)),
    };

    Ok(push_nrpn(emission, channel, parameter, 128 * value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Packet;
    use std::time::Duration;

    #[test]
    fn test_scale_matches_hardware() {
        assert_eq!(scale(0, 99), 1);
        assert_eq!(scale(50, 99), 65);
        assert_eq!(scale(99, 99), 127);
        assert_eq!(scale(1, 1), 127);
        assert_eq!(scale(0, 1), 1);
        assert_eq!(coarse_scale(0), 15);
        assert_eq!(coarse_scale(7), 127);
    }

    #[test]
    fn test_root_edit() {
        let kit = DrumKit::default();
        let ch = Channel::new(1).unwrap();
        let emission = nrpn_edit(&kit, KitParam::Root, ch).unwrap();
        let value = 128 * scale(36, 67);
        assert_eq!(
            emission.packets(),
            &[
                Packet::Short([0xB1, 99, 0]),
                Packet::Short([0xB1, 98, 0x10]),
                Packet::Short([0xB1, 6, (value >> 7) as u8]),
                Packet::Short([0xB1, 38, 0]),
                Packet::Pause(Duration::from_millis(PAUSE_NRPN)),
            ]
        );
    }

    #[test]
    fn test_voice_edit_selects_drum_then_bank_and_number() {
        let mut kit = DrumKit::default();
        kit.drums[10].voice = 100; // bank 1, number 1
        let emission = nrpn_edit(&kit, KitParam::Drum(10, DrumParam::Voice), Channel::default()).unwrap();
        let shorts: Vec<[u8; 3]> = emission
            .packets()
            .iter()
            .filter_map(|p| match p {
                Packet::Short(b) => Some(*b),
                _ => None,
            })
            .collect();
        assert_eq!(shorts.len(), 12);
        assert_eq!(shorts[1], [0xB0, 98, 0x19]);
        assert_eq!(shorts[5], [0xB0, 98, 0x08]);
        assert_eq!(shorts[6], [0xB0, 6, (2 * 127 / 6) as u8]);
        assert_eq!(shorts[9], [0xB0, 98, 0x09]);
        assert_eq!(shorts[10], [0xB0, 6, scale(1, 98) as u8]);
    }

    #[test]
    fn test_unresolvable_voice() {
        let mut kit = DrumKit::default();
        kit.drums[0].voice = 9999;
        assert!(matches!(
            nrpn_edit(&kit, KitParam::Drum(0, DrumParam::Voice), Channel::default()),
            Err(CodecError::UnresolvableVoice { .. })
        ));
    }
}
