//! Yamaha DX7 single voice and 32 voice bulk dumps.
//!
//! A single voice travels unpacked (VCED, 155 bytes). Banks hold 32 packed
//! voices (VMEM, 128 bytes each) with several fields sharing a byte. Both are
//! followed by a checksum that makes the payload sum to zero modulo 128.

use serde::Serialize;

use crate::codec::{
    Channel, Codec, CodecConfig, Emission, ParseOutcome, Patch, PatchLocation, Target,
};
use crate::error::CodecError;
use crate::name;
use crate::registry::AnyPatch;
use crate::sysex::{checksum7, hex, SYSEX_END, SYSEX_START, YAMAHA_ID};

const DEVICE: &str = "Yamaha DX7";
const BANK_DEVICE: &str = "Yamaha DX7 bank";

/// Unpacked single voice payload
pub const VCED_SIZE: usize = 155;
/// Packed voice inside a bank payload
pub const VMEM_SIZE: usize = 128;
/// Voices in a bulk dump
pub const NUM_VOICES: usize = 32;
/// Operators per voice
pub const NUM_OPERATORS: usize = 6;

/// Single voice dump including header, checksum and `F7`
pub const SINGLE_DUMP_SIZE: usize = HEADER_SIZE + VCED_SIZE + 2;
/// 32 voice bulk dump including header, checksum and `F7`
pub const BULK_FULL_SYSEX_SIZE: usize = HEADER_SIZE + NUM_VOICES * VMEM_SIZE + 2;

const HEADER_SIZE: usize = 6;
const SINGLE_FORMAT: [u8; 3] = [0x00, 0x01, 0x1B];
const BANK_FORMAT: [u8; 3] = [0x09, 0x20, 0x00];

const NAME_LENGTH: usize = 10;
const VCED_OP_SIZE: usize = 21;
const VMEM_OP_SIZE: usize = 17;

/// DX7 envelope parameters (4-stage)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Envelope {
    /// Rate for each of the 4 envelope stages
    pub rate: [u8; 4],
    /// Level for each of the 4 envelope stages
    pub level: [u8; 4],
}

impl Envelope {
    fn unpack(d: &[u8]) -> Self {
        Self {
            rate: [d[0], d[1], d[2], d[3]],
            level: [d[4], d[5], d[6], d[7]],
        }
    }

    fn pack(&self, d: &mut [u8]) {
        d[..4].copy_from_slice(&self.rate);
        d[4..8].copy_from_slice(&self.level);
    }

    fn revise(&mut self) {
        for v in self.rate.iter_mut().chain(self.level.iter_mut()) {
            *v = (*v).min(99);
        }
    }
}

/// Keyboard scaling parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KeyboardScaling {
    /// Break point key (0-99)
    pub break_point: u8,
    /// Depth of scaling on the left side of break point
    pub left_depth: u8,
    /// Depth of scaling on the right side of break point
    pub right_depth: u8,
    /// Curve type for left side (0-3)
    pub left_curve: u8,
    /// Curve type for right side (0-3)
    pub right_curve: u8,
}

/// DX7 operator parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Operator {
    /// Amplitude envelope
    pub envelope: Envelope,
    /// Keyboard scaling settings
    pub keyboard_scaling: KeyboardScaling,
    /// Rate scaling (0-7)
    pub rate_scaling: u8,
    /// Amplitude modulation sensitivity (0-3)
    pub amp_mod_sensitivity: u8,
    /// Velocity sensitivity (0-7)
    pub velocity_sensitivity: u8,
    /// Output level (0-99)
    pub level: u8,
    /// Oscillator mode: 0 = ratio, 1 = fixed frequency
    pub mode: u8,
    /// Coarse frequency multiplier (0-31)
    pub coarse: u8,
    /// Fine frequency adjustment (0-99)
    pub fine: u8,
    /// Detune amount (0-14, 7 is centre)
    pub detune: u8,
}

impl Operator {
    fn from_vced(d: &[u8]) -> Self {
        Self {
            envelope: Envelope::unpack(d),
            keyboard_scaling: KeyboardScaling {
                break_point: d[8],
                left_depth: d[9],
                right_depth: d[10],
                left_curve: d[11],
                right_curve: d[12],
            },
            rate_scaling: d[13],
            amp_mod_sensitivity: d[14],
            velocity_sensitivity: d[15],
            level: d[16],
            mode: d[17],
            coarse: d[18],
            fine: d[19],
            detune: d[20],
        }
    }

    fn to_vced(&self, d: &mut [u8]) {
        self.envelope.pack(d);
        let ks = &self.keyboard_scaling;
        d[8] = ks.break_point;
        d[9] = ks.left_depth;
        d[10] = ks.right_depth;
        d[11] = ks.left_curve;
        d[12] = ks.right_curve;
        d[13] = self.rate_scaling;
        d[14] = self.amp_mod_sensitivity;
        d[15] = self.velocity_sensitivity;
        d[16] = self.level;
        d[17] = self.mode;
        d[18] = self.coarse;
        d[19] = self.fine;
        d[20] = self.detune;
    }

    fn from_vmem(op_data: &[u8]) -> Self {
        let mut o = Self::default();

        // Envelope rates and levels
        for j in 0..4 {
            o.envelope.rate[j] = (op_data[j] & 0x7f).min(99);
            o.envelope.level[j] = (op_data[4 + j] & 0x7f).min(99);
        }

        // Keyboard scaling
        o.keyboard_scaling.break_point = (op_data[8] & 0x7f).min(99);
        o.keyboard_scaling.left_depth = (op_data[9] & 0x7f).min(99);
        o.keyboard_scaling.right_depth = (op_data[10] & 0x7f).min(99);
        o.keyboard_scaling.left_curve = op_data[11] & 0x3;
        o.keyboard_scaling.right_curve = (op_data[11] >> 2) & 0x3;

        o.rate_scaling = op_data[12] & 0x7;
        o.detune = ((op_data[12] >> 3) & 0xf).min(14);
        o.amp_mod_sensitivity = op_data[13] & 0x3;
        o.velocity_sensitivity = (op_data[13] >> 2) & 0x7;
        o.level = (op_data[14] & 0x7f).min(99);
        o.mode = op_data[15] & 0x1;
        o.coarse = (op_data[15] >> 1) & 0x1f;
        o.fine = (op_data[16] & 0x7f).min(99);
        o
    }

    fn to_vmem(&self, d: &mut [u8]) {
        self.envelope.pack(d);
        let ks = &self.keyboard_scaling;
        d[8] = ks.break_point;
        d[9] = ks.left_depth;
        d[10] = ks.right_depth;
        d[11] = (ks.left_curve & 0x3) | ((ks.right_curve & 0x3) << 2);
        d[12] = (self.rate_scaling & 0x7) | ((self.detune & 0xf) << 3);
        d[13] = (self.amp_mod_sensitivity & 0x3) | ((self.velocity_sensitivity & 0x7) << 2);
        d[14] = self.level;
        d[15] = (self.mode & 0x1) | ((self.coarse & 0x1f) << 1);
        d[16] = self.fine;
    }

    fn revise(&mut self) {
        self.envelope.revise();
        let ks = &mut self.keyboard_scaling;
        ks.break_point = ks.break_point.min(99);
        ks.left_depth = ks.left_depth.min(99);
        ks.right_depth = ks.right_depth.min(99);
        ks.left_curve = ks.left_curve.min(3);
        ks.right_curve = ks.right_curve.min(3);
        self.rate_scaling = self.rate_scaling.min(7);
        self.amp_mod_sensitivity = self.amp_mod_sensitivity.min(3);
        self.velocity_sensitivity = self.velocity_sensitivity.min(7);
        self.level = self.level.min(99);
        self.mode = self.mode.min(1);
        self.coarse = self.coarse.min(31);
        self.fine = self.fine.min(99);
        self.detune = self.detune.min(14);
    }
}

/// LFO modulation parameters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Lfo {
    /// LFO rate (0-99)
    pub speed: u8,
    /// LFO delay (0-99)
    pub delay: u8,
    /// Pitch modulation depth (0-99)
    pub pitch_mod_depth: u8,
    /// Amplitude modulation depth (0-99)
    pub amp_mod_depth: u8,
    /// Restart the LFO on every key
    pub key_sync: u8,
    /// Waveform (0-5): triangle, saw down, saw up, square, sine, sample and hold
    pub waveform: u8,
    /// Pitch modulation sensitivity (0-7)
    pub pitch_mod_sensitivity: u8,
}

/// A complete DX7 voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dx7Voice {
    /// Slot in a bank, `None` for a single voice dump
    pub location: Option<PatchLocation>,
    /// Operators in wire order, so `op[0]` is operator 6
    pub op: [Operator; NUM_OPERATORS],
    /// Pitch envelope
    pub pitch_envelope: Envelope,
    /// Algorithm number (0-31)
    pub algorithm: u8,
    /// Feedback amount (0-7)
    pub feedback: u8,
    /// Reset oscillator phases on note trigger
    pub osc_key_sync: u8,
    /// LFO settings
    pub lfo: Lfo,
    /// Transpose (0-48, 24 is middle C)
    pub transpose: u8,
    /// Voice name, at most 10 characters
    pub name: String,
}

impl Default for Dx7Voice {
    /// The front panel's init voice: operator 1 alone at full level.
    fn default() -> Self {
        let op = Operator {
            envelope: Envelope {
                rate: [99; 4],
                level: [99, 99, 99, 0],
            },
            coarse: 1,
            detune: 7,
            ..Default::default()
        };
        let mut ops = [op; NUM_OPERATORS];
        ops[NUM_OPERATORS - 1].level = 99;

        Self {
            location: None,
            op: ops,
            pitch_envelope: Envelope {
                rate: [99; 4],
                level: [50; 4],
            },
            algorithm: 0,
            feedback: 0,
            osc_key_sync: 1,
            lfo: Lfo {
                speed: 35,
                key_sync: 1,
                pitch_mod_sensitivity: 3,
                ..Default::default()
            },
            transpose: 24,
            name: "INIT VOICE".to_string(),
        }
    }
}

impl Dx7Voice {
    /// Decode the 155 byte unpacked form. Values are taken as sent; call
    /// [`Patch::revise`] to clamp them.
    pub fn from_vced(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < VCED_SIZE {
            return Err(CodecError::Truncated(data.len()));
        }
        let d: Vec<u8> = data[..VCED_SIZE].iter().map(|b| b & 0x7F).collect();

        let mut op = [Operator::default(); NUM_OPERATORS];
        for (i, o) in op.iter_mut().enumerate() {
            *o = Operator::from_vced(&d[i * VCED_OP_SIZE..]);
        }

        Ok(Self {
            location: None,
            op,
            pitch_envelope: Envelope::unpack(&d[126..134]),
            algorithm: d[134],
            feedback: d[135],
            osc_key_sync: d[136],
            lfo: Lfo {
                speed: d[137],
                delay: d[138],
                pitch_mod_depth: d[139],
                amp_mod_depth: d[140],
                key_sync: d[141],
                waveform: d[142],
                pitch_mod_sensitivity: d[143],
            },
            transpose: d[144],
            name: decode_name(&d[145..155]),
        })
    }

    /// Encode the 155 byte unpacked form.
    pub fn to_vced(&self) -> [u8; VCED_SIZE] {
        let mut d = [0u8; VCED_SIZE];
        for (i, o) in self.op.iter().enumerate() {
            o.to_vced(&mut d[i * VCED_OP_SIZE..]);
        }
        self.pitch_envelope.pack(&mut d[126..134]);
        d[134] = self.algorithm;
        d[135] = self.feedback;
        d[136] = self.osc_key_sync;
        d[137] = self.lfo.speed;
        d[138] = self.lfo.delay;
        d[139] = self.lfo.pitch_mod_depth;
        d[140] = self.lfo.amp_mod_depth;
        d[141] = self.lfo.key_sync;
        d[142] = self.lfo.waveform;
        d[143] = self.lfo.pitch_mod_sensitivity;
        d[144] = self.transpose;
        d[145..155].copy_from_slice(&name::to_bytes(&self.name, NAME_LENGTH));
        d.iter_mut().for_each(|b| *b &= 0x7F);
        d
    }

    /// Decode the 128 byte packed form used inside banks.
    pub fn from_vmem(data: &[u8]) -> Result<Self, CodecError> {
        if data.len() < VMEM_SIZE {
            return Err(CodecError::Truncated(data.len()));
        }

        let mut op = [Operator::default(); NUM_OPERATORS];
        for (i, o) in op.iter_mut().enumerate() {
            *o = Operator::from_vmem(&data[i * VMEM_OP_SIZE..]);
        }

        let mut pitch_envelope = Envelope::default();
        for j in 0..4 {
            pitch_envelope.rate[j] = (data[102 + j] & 0x7f).min(99);
            pitch_envelope.level[j] = (data[106 + j] & 0x7f).min(99);
        }

        Ok(Self {
            location: None,
            op,
            pitch_envelope,
            algorithm: data[110] & 0x1f,
            feedback: data[111] & 0x7,
            osc_key_sync: (data[111] >> 3) & 0x1,
            lfo: Lfo {
                speed: (data[112] & 0x7f).min(99),
                delay: (data[113] & 0x7f).min(99),
                pitch_mod_depth: (data[114] & 0x7f).min(99),
                amp_mod_depth: (data[115] & 0x7f).min(99),
                key_sync: data[116] & 0x1,
                waveform: ((data[116] >> 1) & 0x7).min(5),
                pitch_mod_sensitivity: (data[116] >> 4) & 0x7,
            },
            transpose: (data[117] & 0x7f).min(48),
            name: decode_name(&data[118..128]),
        })
    }

    /// Encode the 128 byte packed form.
    pub fn to_vmem(&self) -> [u8; VMEM_SIZE] {
        let mut d = [0u8; VMEM_SIZE];
        for (i, o) in self.op.iter().enumerate() {
            o.to_vmem(&mut d[i * VMEM_OP_SIZE..]);
        }
        self.pitch_envelope.pack(&mut d[102..110]);
        d[110] = self.algorithm & 0x1f;
        d[111] = (self.feedback & 0x7) | ((self.osc_key_sync & 0x1) << 3);
        d[112] = self.lfo.speed;
        d[113] = self.lfo.delay;
        d[114] = self.lfo.pitch_mod_depth;
        d[115] = self.lfo.amp_mod_depth;
        d[116] = (self.lfo.key_sync & 0x1)
            | ((self.lfo.waveform & 0x7) << 1)
            | ((self.lfo.pitch_mod_sensitivity & 0x7) << 4);
        d[117] = self.transpose;
        d[118..128].copy_from_slice(&name::to_bytes(&self.name, NAME_LENGTH));
        d.iter_mut().for_each(|b| *b &= 0x7F);
        d
    }
}

fn decode_name(bytes: &[u8]) -> String {
    name::from_bytes(bytes).trim_end().to_string()
}

impl Patch for Dx7Voice {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn location(&self) -> Option<PatchLocation> {
        self.location
    }

    fn revise(&mut self) {
        let truncated = name::truncate(&self.name, NAME_LENGTH);
        self.name = name::printable(&truncated).trim_end().to_string();

        for o in self.op.iter_mut() {
            o.revise();
        }
        self.pitch_envelope.revise();
        self.algorithm = self.algorithm.min(31);
        self.feedback = self.feedback.min(7);
        self.osc_key_sync = self.osc_key_sync.min(1);
        let lfo = &mut self.lfo;
        lfo.speed = lfo.speed.min(99);
        lfo.delay = lfo.delay.min(99);
        lfo.pitch_mod_depth = lfo.pitch_mod_depth.min(99);
        lfo.amp_mod_depth = lfo.amp_mod_depth.min(99);
        lfo.key_sync = lfo.key_sync.min(1);
        lfo.waveform = lfo.waveform.min(5);
        lfo.pitch_mod_sensitivity = lfo.pitch_mod_sensitivity.min(7);
        self.transpose = self.transpose.min(48);
    }

    fn into_any(self) -> AnyPatch {
        AnyPatch::Dx7(self)
    }

    fn from_any(patch: &AnyPatch) -> Option<&Self> {
        match patch {
            AnyPatch::Dx7(voice) => Some(voice),
            _ => None,
        }
    }
}

/// A bank of 32 voices as held in the device's internal memory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dx7Bank {
    /// The voices, slot 1 first
    pub voices: [Dx7Voice; NUM_VOICES],
}

impl Patch for Dx7Bank {
    fn name(&self) -> String {
        format!("{} voices from '{}'", NUM_VOICES, self.voices[0].name)
    }

    fn location(&self) -> Option<PatchLocation> {
        None
    }

    fn revise(&mut self) {
        for (i, voice) in self.voices.iter_mut().enumerate() {
            voice.revise();
            voice.location = Some(PatchLocation::new(0, i as u8));
        }
    }

    fn into_any(self) -> AnyPatch {
        AnyPatch::Dx7Bank(self)
    }

    fn from_any(patch: &AnyPatch) -> Option<&Self> {
        match patch {
            AnyPatch::Dx7Bank(bank) => Some(bank),
            _ => None,
        }
    }
}

/// Checksum that brings the payload sum to zero modulo 128.
pub fn checksum(payload: &[u8]) -> u8 {
    (128 - checksum7(payload) as u16) as u8 & 0x7F
}

/// Byte 2 is the channel and is not checked. Some units send `10` instead
/// of `20` in the bulk byte count, so the middle format byte is skipped too.
fn is_dump(data: &[u8], size: usize, format: [u8; 3]) -> bool {
    data.len() == size
        && data[0] == SYSEX_START
        && data[1] == YAMAHA_ID
        && data[3] == format[0]
        && (format == BANK_FORMAT || data[4] == format[1])
        && data[5] == format[2]
}

/// Header, payload, checksum and `F7`.
fn frame(channel: Channel, format: [u8; 3], payload: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(HEADER_SIZE + payload.len() + 2);
    data.extend_from_slice(&[SYSEX_START, YAMAHA_ID, channel.get()]);
    data.extend_from_slice(&format);
    data.extend_from_slice(payload);
    data.push(checksum(payload));
    data.push(SYSEX_END);
    data
}

/// Payload of a framed dump, warning when the checksum is off.
fn payload<'a>(
    data: &'a [u8],
    size: usize,
    format: [u8; 3],
    device: &'static str,
) -> Result<&'a [u8], CodecError> {
    if data.len() != size {
        return Err(CodecError::BadLength {
            device,
            actual: data.len(),
        });
    }
    if !is_dump(data, size, format) {
        return Err(CodecError::BadHeader { device });
    }
    let payload = &data[HEADER_SIZE..size - 2];
    let expected = checksum(payload);
    if data[size - 2] != expected {
        log::warn!(
            "{}: checksum {:02X} does not match computed {:02X}",
            device,
            data[size - 2],
            expected
        );
    }
    Ok(payload)
}

fn request(channel: Channel, format: u8) -> Emission {
    let message = vec![SYSEX_START, YAMAHA_ID, 0x20 | channel.get(), format, SYSEX_END];
    log::debug!("{}: request {}", DEVICE, hex(&message));
    Emission::single(message)
}

fn location_name(location: PatchLocation) -> String {
    format!("{:02}", location.number as usize + 1)
}

fn next_location(location: PatchLocation) -> PatchLocation {
    PatchLocation::new(0, (location.number as usize + 1) as u8 % NUM_VOICES as u8)
}

/// Codec for single voice dumps.
#[derive(Debug, Clone, Copy)]
pub struct Dx7 {
    channel: Channel,
}

impl Dx7 {
    /// Codec on the configured channel
    pub fn new(config: CodecConfig) -> Self {
        Self {
            channel: config.channel,
        }
    }

    /// Change one parameter of the edit buffer. `index` is the parameter's
    /// offset in the unpacked voice, so `145..155` are the name characters.
    pub fn parameter_edit(&self, voice: &Dx7Voice, index: usize) -> Result<Emission, CodecError> {
        let value = *voice
            .to_vced()
            .get(index)
            .ok_or(CodecError::NotEditable("voice parameter index"))?;
        let message = vec![
            SYSEX_START,
            YAMAHA_ID,
            0x10 | self.channel.get(),
            (index >> 7) as u8 & 0x03,
            index as u8 & 0x7F,
            value,
            SYSEX_END,
        ];
        Ok(Emission::single(message))
    }
}

impl Codec for Dx7 {
    type Patch = Dx7Voice;

    fn name(&self) -> &'static str {
        DEVICE
    }

    fn recognize(&self, data: &[u8]) -> bool {
        is_dump(data, SINGLE_DUMP_SIZE, SINGLE_FORMAT)
    }

    fn parse(&self, data: &[u8]) -> ParseOutcome<Dx7Voice> {
        let voice = payload(data, SINGLE_DUMP_SIZE, SINGLE_FORMAT, DEVICE)
            .and_then(Dx7Voice::from_vced);
        match voice {
            Ok(mut voice) => {
                log::debug!("{}: parsed voice '{}'", DEVICE, voice.name);
                voice.revise();
                ParseOutcome::Succeeded(voice)
            }
            Err(err) => ParseOutcome::Failed(err),
        }
    }

    fn emit(&self, voice: &Dx7Voice, target: Target) -> Result<Emission, CodecError> {
        if let Target::Store(_) = target {
            return Err(CodecError::CannotStore(DEVICE));
        }
        Ok(Emission::single(frame(self.channel, SINGLE_FORMAT, &voice.to_vced())))
    }

    fn request_dump(&self, location: Option<PatchLocation>) -> Emission {
        if let Some(loc) = location {
            log::debug!("{}: select {} before requesting it", DEVICE, location_name(loc));
        }
        request(self.channel, SINGLE_FORMAT[0])
    }

    fn location_name(&self, location: PatchLocation) -> String {
        location_name(location)
    }

    fn next_location(&self, location: PatchLocation) -> PatchLocation {
        next_location(location)
    }
}

/// Codec for 32 voice bulk dumps.
#[derive(Debug, Clone, Copy)]
pub struct Dx7Bulk {
    channel: Channel,
}

impl Dx7Bulk {
    /// Codec on the configured channel
    pub fn new(config: CodecConfig) -> Self {
        Self {
            channel: config.channel,
        }
    }

    fn unpack(&self, data: &[u8]) -> Result<Dx7Bank, CodecError> {
        let patch_data = payload(data, BULK_FULL_SYSEX_SIZE, BANK_FORMAT, BANK_DEVICE)?;
        let mut bank = Dx7Bank::default();
        for (idx, voice) in bank.voices.iter_mut().enumerate() {
            let start = idx * VMEM_SIZE;
            *voice = Dx7Voice::from_vmem(&patch_data[start..start + VMEM_SIZE])?;
        }
        Ok(bank)
    }
}

impl Codec for Dx7Bulk {
    type Patch = Dx7Bank;

    fn name(&self) -> &'static str {
        BANK_DEVICE
    }

    fn recognize(&self, data: &[u8]) -> bool {
        is_dump(data, BULK_FULL_SYSEX_SIZE, BANK_FORMAT)
    }

    fn parse(&self, data: &[u8]) -> ParseOutcome<Dx7Bank> {
        match self.unpack(data) {
            Ok(mut bank) => {
                log::debug!("{}: parsed {} voices", BANK_DEVICE, NUM_VOICES);
                bank.revise();
                ParseOutcome::Succeeded(bank)
            }
            Err(err) => ParseOutcome::Failed(err),
        }
    }

    /// A bulk dump always replaces the whole internal memory, so every
    /// target gets the same bytes.
    fn emit(&self, bank: &Dx7Bank, _target: Target) -> Result<Emission, CodecError> {
        let mut payload = Vec::with_capacity(NUM_VOICES * VMEM_SIZE);
        for voice in bank.voices.iter() {
            payload.extend_from_slice(&voice.to_vmem());
        }
        Ok(Emission::single(frame(self.channel, BANK_FORMAT, &payload)))
    }

    fn request_dump(&self, _location: Option<PatchLocation>) -> Emission {
        request(self.channel, BANK_FORMAT[0])
    }

    fn location_name(&self, location: PatchLocation) -> String {
        location_name(location)
    }

    fn next_location(&self, location: PatchLocation) -> PatchLocation {
        next_location(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Dx7Voice {
        let mut voice = Dx7Voice {
            name: "E.PIANO 1".to_string(),
            algorithm: 4,
            feedback: 6,
            transpose: 24,
            ..Default::default()
        };
        voice.op[0].keyboard_scaling = KeyboardScaling {
            break_point: 39,
            left_depth: 0,
            right_depth: 12,
            left_curve: 3,
            right_curve: 1,
        };
        voice.op[2].rate_scaling = 5;
        voice.op[2].velocity_sensitivity = 6;
        voice.op[2].amp_mod_sensitivity = 2;
        voice.op[3].mode = 1;
        voice.op[3].coarse = 14;
        voice.op[3].detune = 10;
        voice.op[4].fine = 58;
        voice.lfo.waveform = 4;
        voice.lfo.pitch_mod_sensitivity = 7;
        voice.lfo.delay = 33;
        voice
    }

    #[test]
    fn test_vced_round_trip() {
        let voice = sample();
        let bytes = voice.to_vced();
        assert_eq!(&bytes[145..155], b"E.PIANO 1 ");
        assert_eq!(bytes[134], 4);
        assert_eq!(Dx7Voice::from_vced(&bytes).unwrap(), voice);
    }

    #[test]
    fn test_vmem_round_trip() {
        let voice = sample();
        let bytes = voice.to_vmem();
        // rate scaling and detune share a byte
        assert_eq!(bytes[2 * 17 + 12], 5 | (7 << 3));
        assert_eq!(bytes[3 * 17 + 15], 1 | (14 << 1));
        assert_eq!(bytes[11], 3 | (1 << 2));
        assert_eq!(bytes[116], 1 | (4 << 1) | (7 << 4));
        assert_eq!(Dx7Voice::from_vmem(&bytes).unwrap(), voice);
    }

    #[test]
    fn test_vced_vmem_agree() {
        let voice = sample();
        let via_vmem = Dx7Voice::from_vmem(&voice.to_vmem()).unwrap();
        assert_eq!(via_vmem.to_vced(), voice.to_vced());
    }

    #[test]
    fn test_short_payloads() {
        assert_eq!(Dx7Voice::from_vced(&[0; 20]), Err(CodecError::Truncated(20)));
        assert_eq!(Dx7Voice::from_vmem(&[0; 127]), Err(CodecError::Truncated(127)));
    }

    #[test]
    fn test_single_dump() {
        let codec = Dx7::new(CodecConfig {
            channel: Channel::new(2).unwrap(),
        });
        let voice = sample();
        let emission = codec.emit(&voice, Target::EditBuffer).unwrap();
        let dump = emission.sysex_messages().next().unwrap().to_vec();

        assert_eq!(dump.len(), SINGLE_DUMP_SIZE);
        assert_eq!(&dump[..6], &[0xF0, 0x43, 0x02, 0x00, 0x01, 0x1B]);
        let sum: u32 = dump[6..162].iter().map(|&b| b as u32).sum();
        assert_eq!(sum % 128, 0);

        assert!(codec.recognize(&dump));
        assert_eq!(codec.parse(&dump), ParseOutcome::Succeeded(voice));
    }

    #[test]
    fn test_single_store_is_refused() {
        let codec = Dx7::new(CodecConfig::default());
        let loc = PatchLocation::new(0, 3);
        assert_eq!(
            codec.emit(&sample(), Target::Store(loc)),
            Err(CodecError::CannotStore(DEVICE))
        );
        assert!(codec.emit(&sample(), Target::File(loc)).is_ok());
    }

    #[test]
    fn test_name_high_bytes() {
        let mut bytes = sample().to_vced();
        bytes[145] = 0x01;
        bytes[146] = 0x7F;
        let voice = Dx7Voice::from_vced(&bytes).unwrap();
        assert_eq!(voice.name, " \u{7f}PIANO 1");

        let mut voice = sample();
        voice.name = "BRASS \u{e9}SECTION".to_string();
        voice.revise();
        assert_eq!(voice.name, "BRASS  SEC");
    }

    #[test]
    fn test_revise_clamps() {
        let mut voice = sample();
        voice.op[1].detune = 20;
        voice.algorithm = 40;
        voice.lfo.waveform = 6;
        voice.transpose = 60;
        voice.revise();
        assert_eq!(voice.op[1].detune, 14);
        assert_eq!(voice.algorithm, 31);
        assert_eq!(voice.lfo.waveform, 5);
        assert_eq!(voice.transpose, 48);
    }

    #[test]
    fn test_bank_round_trip() {
        let codec = Dx7Bulk::new(CodecConfig::default());
        let mut bank = Dx7Bank::default();
        bank.voices[7] = sample();
        bank.voices[31].name = "LAST ONE".to_string();
        bank.revise();

        let dump = codec.emit(&bank, Target::EditBuffer).unwrap().to_bytes();
        assert_eq!(dump.len(), BULK_FULL_SYSEX_SIZE);
        assert_eq!(&dump[..6], &[0xF0, 0x43, 0x00, 0x09, 0x20, 0x00]);
        assert!(codec.recognize(&dump));
        assert!(!Dx7::new(CodecConfig::default()).recognize(&dump));

        let parsed = codec.parse(&dump).ok().unwrap();
        assert_eq!(parsed, bank);
        assert_eq!(parsed.voices[7].location, Some(PatchLocation::new(0, 7)));
    }

    #[test]
    fn test_bad_checksum_still_parses() {
        let codec = Dx7::new(CodecConfig::default());
        let mut dump = codec.emit(&sample(), Target::EditBuffer).unwrap().to_bytes();
        dump[161] ^= 0x01;
        assert!(codec.parse(&dump).is_succeeded());
    }

    #[test]
    fn test_recognize_rejects() {
        let codec = Dx7::new(CodecConfig::default());
        let dump = codec.emit(&sample(), Target::EditBuffer).unwrap().to_bytes();
        assert!(!codec.recognize(&dump[..100]));
        assert!(!codec.recognize(&[]));

        let mut other = dump.clone();
        other[1] = 0x42;
        assert!(!codec.recognize(&other));
        assert!(matches!(codec.parse(&other), ParseOutcome::Failed(CodecError::BadHeader { .. })));
        assert!(matches!(
            codec.parse(&dump[..100]),
            ParseOutcome::Failed(CodecError::BadLength { .. })
        ));
    }

    #[test]
    fn test_parameter_edit() {
        let codec = Dx7::new(CodecConfig {
            channel: Channel::new(1).unwrap(),
        });
        let voice = sample();
        let algorithm = codec.parameter_edit(&voice, 134).unwrap();
        assert_eq!(algorithm.to_bytes(), vec![0xF0, 0x43, 0x11, 0x01, 0x06, 4, 0xF7]);
        let name = codec.parameter_edit(&voice, 145).unwrap();
        assert_eq!(name.to_bytes(), vec![0xF0, 0x43, 0x11, 0x01, 0x11, b'E', 0xF7]);
        assert_eq!(
            codec.parameter_edit(&voice, VCED_SIZE),
            Err(CodecError::NotEditable("voice parameter index"))
        );
    }

    #[test]
    fn test_bulk_byte_count_quirk() {
        let codec = Dx7Bulk::new(CodecConfig::default());
        let mut dump = codec.emit(&Dx7Bank::default(), Target::EditBuffer).unwrap().to_bytes();
        dump[4] = 0x10;
        assert!(codec.recognize(&dump));
        assert!(codec.parse(&dump).is_succeeded());
    }

    #[test]
    fn test_requests_and_locations() {
        let config = CodecConfig {
            channel: Channel::new(5).unwrap(),
        };
        let single = Dx7::new(config);
        let bulk = Dx7Bulk::new(config);
        assert_eq!(single.request_dump(None).to_bytes(), vec![0xF0, 0x43, 0x25, 0x00, 0xF7]);
        assert_eq!(bulk.request_dump(None).to_bytes(), vec![0xF0, 0x43, 0x25, 0x09, 0xF7]);

        assert_eq!(single.location_name(PatchLocation::new(0, 0)), "01");
        assert_eq!(single.next_location(PatchLocation::new(0, 31)), PatchLocation::new(0, 0));
        assert_eq!(bulk.next_location(PatchLocation::new(0, 4)), PatchLocation::new(0, 5));
    }
}
