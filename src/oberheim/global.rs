//! Oberheim Matrix 1000 master parameters.
//!
//! The dump is `F0 10 06 03 03`, 172 nibblized bytes, a checksum and `F7`.
//! Like patch dumps the device may leave the checksum out. Signed values are
//! plain two's complement bytes here, unlike the 6 and 7 bit encodings of
//! patch parameters.

use num_traits::clamp;
use serde::Serialize;

use crate::codec::{Codec, CodecConfig, Emission, ParseOutcome, Patch, PatchLocation, Target};
use crate::error::CodecError;
use crate::registry::AnyPatch;
use crate::sysex::{checksum7, hex, NibbleReader, NibbleWriter, SYSEX_END};

use super::matrix1000::HEADER;

const DEVICE: &str = "Oberheim Matrix 1000 [Global]";

/// Dump length with the trailing checksum
pub const DUMP_SIZE: usize = 351;
/// Dump length when the device leaves the checksum out
pub const SHORT_DUMP_SIZE: usize = DUMP_SIZE - 1;

const MASTER_OPCODE: u8 = 0x03;
const REQUEST_OPCODE: u8 = 0x04;
const MASTER_TYPE: u8 = 0x03;

const PAYLOAD_OFFSET: usize = 5;
const PAYLOAD_SIZE: usize = 172;
const CHECKSUM_OFFSET: usize = PAYLOAD_OFFSET + 2 * PAYLOAD_SIZE;

/// Patches that group mode can switch on or off
pub const NUM_GROUP_PATCHES: usize = 1000;
const GROUP_OFFSET: usize = 36;
const GROUP_BYTES: usize = NUM_GROUP_PATCHES / 8;
// trails the group enables; the device does not document it
const GROUP_PAD: usize = GROUP_OFFSET + GROUP_BYTES;

/// Master tune and transpose reach one step short of the signed range
pub const MAX_SIGNED: i8 = 31;

/// The device needs this long after a master parameter write, in ms
pub const PAUSE_AFTER_WRITE: u64 = 300;

/// Vibrato applied to every voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Vibrato {
    /// 0-63
    pub speed: u8,
    /// 0 off, 1 lever 2, 2 pedal 1
    pub speed_mod_source: u8,
    /// 0-63
    pub speed_mod_amount: u8,
    /// 0 triangle, 1 up saw, 2 down saw, 3 square, 4 random
    pub waveform: u8,
    /// 0-63
    pub amplitude: u8,
    /// 0 off, 1 lever 2, 2 pedal 1
    pub amp_mod_source: u8,
    /// 0-63
    pub amp_mod_amount: u8,
}

impl Default for Vibrato {
    fn default() -> Self {
        Self {
            speed: 48,
            speed_mod_source: 0,
            speed_mod_amount: 0,
            waveform: 0,
            amplitude: 0,
            amp_mod_source: 1,
            amp_mod_amount: 63,
        }
    }
}

impl Vibrato {
    fn revise(&mut self) {
        self.speed = clamp(self.speed, 0, 63);
        self.speed_mod_source = clamp(self.speed_mod_source, 0, 2);
        self.speed_mod_amount = clamp(self.speed_mod_amount, 0, 63);
        self.waveform = clamp(self.waveform, 0, 4);
        self.amplitude = clamp(self.amplitude, 0, 63);
        self.amp_mod_source = clamp(self.amp_mod_source, 0, 2);
        self.amp_mod_amount = clamp(self.amp_mod_amount, 0, 63);
    }
}

/// How the device listens to MIDI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MidiSettings {
    /// Receive channel, 0-15
    pub basic_channel: u8,
    /// Respond on every channel
    pub omni: bool,
    /// Respond to controllers
    pub controllers: bool,
    /// Respond to program changes
    pub patch_changes: bool,
    /// Echo incoming messages to MIDI out
    pub echo: bool,
    /// One voice per channel
    pub mono: bool,
    /// Controller number driving pedal 1
    pub pedal1_controller: u8,
    /// Controller number driving pedal 2
    pub pedal2_controller: u8,
    /// Controller number driving lever 2
    pub lever2_controller: u8,
    /// Controller number driving lever 3
    pub lever3_controller: u8,
}

impl Default for MidiSettings {
    fn default() -> Self {
        Self {
            basic_channel: 0,
            omni: true,
            controllers: true,
            patch_changes: false,
            echo: false,
            mono: false,
            pedal1_controller: 4,
            pedal2_controller: 64,
            lever2_controller: 1,
            lever3_controller: 2,
        }
    }
}

impl MidiSettings {
    fn revise(&mut self) {
        self.basic_channel = clamp(self.basic_channel, 0, 15);
        for cc in [
            &mut self.pedal1_controller,
            &mut self.pedal2_controller,
            &mut self.lever2_controller,
            &mut self.lever3_controller,
        ] {
            *cc = clamp(*cc, 0, 127);
        }
    }
}

/// The Matrix 1000 master parameters. There is one set per device, so it
/// has no location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GlobalParameters {
    /// Vibrato section
    pub vibrato: Vibrato,
    /// MIDI reception
    pub midi: MidiSettings,
    /// `-31..=31`
    pub master_tune: i8,
    /// Semitones, `-31..=31`
    pub master_transpose: i8,
    /// Semitones, 0-24
    pub bend_range: u8,
    /// Keep the front panel on the current bank
    pub bank_lock: bool,
    /// Stack every voice on one note
    pub unison: bool,
    /// Invert the volume pedal
    pub volume_invert: bool,
    /// Refuse patch writes
    pub memory_protect: bool,
    /// Share voices across chained units
    pub group_mode: bool,
    /// Chained units, 1-6
    pub units: u8,
    /// This unit's position in the chain, 0-15
    pub unit_number: u8,
    /// Which patches play in group mode, one flag per patch number
    pub groups: Vec<bool>,
}

impl Default for GlobalParameters {
    fn default() -> Self {
        Self {
            vibrato: Vibrato::default(),
            midi: MidiSettings::default(),
            master_tune: 0,
            master_transpose: 0,
            bend_range: 12,
            bank_lock: false,
            unison: false,
            volume_invert: false,
            memory_protect: false,
            group_mode: false,
            units: 1,
            unit_number: 0,
            groups: vec![true; NUM_GROUP_PATCHES],
        }
    }
}

impl GlobalParameters {
    /// True when patch `number` plays in group mode
    pub fn group_enabled(&self, number: usize) -> bool {
        self.groups.get(number).copied().unwrap_or(false)
    }

    fn unpack(d: &[u8; PAYLOAD_SIZE]) -> Self {
        let groups = d[GROUP_OFFSET..GROUP_PAD]
            .iter()
            .flat_map(|&byte| (0..8).map(move |bit| (byte >> bit) & 1 == 1))
            .collect();

        Self {
            vibrato: Vibrato {
                speed: d[1],
                speed_mod_source: d[2],
                speed_mod_amount: d[3],
                waveform: d[4],
                amplitude: d[5],
                amp_mod_source: d[6],
                amp_mod_amount: d[7],
            },
            midi: MidiSettings {
                basic_channel: d[11],
                omni: d[12] != 0,
                controllers: d[13] != 0,
                patch_changes: d[14] != 0,
                echo: d[32] != 0,
                mono: d[35] != 0,
                pedal1_controller: d[17],
                pedal2_controller: d[18],
                lever2_controller: d[19],
                lever3_controller: d[20],
            },
            master_tune: d[8] as i8,
            master_transpose: d[34] as i8,
            bend_range: d[164],
            // only the high nibble carries these two
            bank_lock: d[165] >> 4 != 0,
            units: d[166],
            unit_number: d[167],
            group_mode: d[168] >> 4 != 0,
            unison: d[169] != 0,
            volume_invert: d[170] != 0,
            memory_protect: d[171] != 0,
            groups,
        }
    }

    fn pack(&self) -> [u8; PAYLOAD_SIZE] {
        let mut d = [0u8; PAYLOAD_SIZE];
        let v = &self.vibrato;
        d[1] = v.speed;
        d[2] = v.speed_mod_source;
        d[3] = v.speed_mod_amount;
        d[4] = v.waveform;
        d[5] = v.amplitude;
        d[6] = v.amp_mod_source;
        d[7] = v.amp_mod_amount;
        d[8] = self.master_tune as u8;

        let m = &self.midi;
        d[11] = m.basic_channel;
        d[12] = m.omni as u8;
        d[13] = m.controllers as u8;
        d[14] = m.patch_changes as u8;
        d[17] = m.pedal1_controller;
        d[18] = m.pedal2_controller;
        d[19] = m.lever2_controller;
        d[20] = m.lever3_controller;
        d[32] = m.echo as u8;
        d[34] = self.master_transpose as u8;
        d[35] = m.mono as u8;

        for (byte, chunk) in d[GROUP_OFFSET..GROUP_PAD]
            .iter_mut()
            .zip(self.groups.chunks(8))
        {
            *byte = chunk
                .iter()
                .enumerate()
                .fold(0, |acc, (bit, &on)| acc | ((on as u8) << bit));
        }
        d[GROUP_PAD] = 0xFF;

        d[164] = self.bend_range;
        d[165] = (self.bank_lock as u8) << 4;
        d[166] = self.units;
        d[167] = self.unit_number;
        d[168] = (self.group_mode as u8) << 4;
        d[169] = self.unison as u8;
        d[170] = self.volume_invert as u8;
        d[171] = self.memory_protect as u8;
        d
    }
}

impl Patch for GlobalParameters {
    fn name(&self) -> String {
        "Global".to_string()
    }

    fn location(&self) -> Option<PatchLocation> {
        None
    }

    fn revise(&mut self) {
        self.vibrato.revise();
        self.midi.revise();
        self.master_tune = clamp(self.master_tune, -MAX_SIGNED, MAX_SIGNED);
        self.master_transpose = clamp(self.master_transpose, -MAX_SIGNED, MAX_SIGNED);
        self.bend_range = clamp(self.bend_range, 0, 24);
        self.units = clamp(self.units, 1, 6);
        self.unit_number = clamp(self.unit_number, 0, 15);
        self.groups.resize(NUM_GROUP_PATCHES, true);
    }

    fn into_any(self) -> AnyPatch {
        AnyPatch::Matrix1000Global(self)
    }

    fn from_any(patch: &AnyPatch) -> Option<&Self> {
        match patch {
            AnyPatch::Matrix1000Global(p) => Some(p),
            _ => None,
        }
    }
}

/// Codec for the Matrix 1000 master parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct Matrix1000Global;

impl Matrix1000Global {
    /// New codec; the channel in `config` is unused
    pub fn new(_config: CodecConfig) -> Self {
        Self
    }

    fn unpack(&self, data: &[u8]) -> Result<GlobalParameters, CodecError> {
        if data.len() != DUMP_SIZE && data.len() != SHORT_DUMP_SIZE {
            return Err(CodecError::BadLength {
                device: DEVICE,
                actual: data.len(),
            });
        }
        if !self.recognize(data) {
            return Err(CodecError::BadHeader { device: DEVICE });
        }

        let mut d = [0u8; PAYLOAD_SIZE];
        let mut r = NibbleReader::new(data, PAYLOAD_OFFSET);
        for byte in d.iter_mut() {
            *byte = r.byte()?;
        }

        let sum = checksum7(&d);
        if data.len() == DUMP_SIZE && data[CHECKSUM_OFFSET] != sum {
            log::warn!(
                "{}: checksum {:#04x} does not match computed {:#04x}",
                DEVICE,
                data[CHECKSUM_OFFSET],
                sum
            );
        }
        Ok(GlobalParameters::unpack(&d))
    }

    fn dump(&self, globals: &GlobalParameters) -> Vec<u8> {
        let d = globals.pack();
        let mut w = NibbleWriter::with_header(&HEADER);
        w.push_raw(&[MASTER_OPCODE, MASTER_TYPE]);
        for &byte in d.iter() {
            w.push(byte);
        }
        w.push_raw(&[checksum7(&d), SYSEX_END]);
        w.into_bytes()
    }
}

impl Codec for Matrix1000Global {
    type Patch = GlobalParameters;

    fn name(&self) -> &'static str {
        DEVICE
    }

    fn recognize(&self, data: &[u8]) -> bool {
        (data.len() == DUMP_SIZE || data.len() == SHORT_DUMP_SIZE)
            && data[..3] == HEADER
            && data[3] == MASTER_OPCODE
            && data[4] == MASTER_TYPE
    }

    fn parse(&self, data: &[u8]) -> ParseOutcome<GlobalParameters> {
        match self.unpack(data) {
            Ok(mut globals) => {
                log::debug!("{}: parsed master parameters", DEVICE);
                globals.revise();
                ParseOutcome::Succeeded(globals)
            }
            Err(err) => ParseOutcome::Failed(err),
        }
    }

    fn emit(&self, globals: &GlobalParameters, target: Target) -> Result<Emission, CodecError> {
        match target {
            Target::File(_) => Ok(Emission::single(self.dump(globals))),
            Target::EditBuffer => Ok(Emission::single(self.dump(globals)).pause(PAUSE_AFTER_WRITE)),
            Target::Store(_) => Err(CodecError::CannotStore(DEVICE)),
        }
    }

    fn request_dump(&self, location: Option<PatchLocation>) -> Emission {
        if location.is_some() {
            log::debug!("{}: master parameters have no location", DEVICE);
        }
        let message = vec![
            HEADER[0],
            HEADER[1],
            HEADER[2],
            REQUEST_OPCODE,
            MASTER_TYPE,
            0x00,
            SYSEX_END,
        ];
        log::debug!("{}: request {}", DEVICE, hex(&message));
        Emission::single(message)
    }

    fn location_name(&self, _location: PatchLocation) -> String {
        "global".to_string()
    }

    fn next_location(&self, location: PatchLocation) -> PatchLocation {
        location
    }
}
