//! Korg MicroKorg vocoder programs.
//!
//! Same frame and global block as the synth programs; voice mode 3 swaps the
//! two synth timbres for a single vocoder timbre and its channel table.

use num_traits::clamp;
use serde::Serialize;

use crate::codec::{Channel, Codec, CodecConfig, Emission, ParseOutcome, Patch, PatchLocation, Target};
use crate::error::CodecError;
use crate::name;
use crate::registry::AnyPatch;

use super::microkorg::{
    decode_name, dump_voice_mode, frame, location_name, payload, program_request, revise_name,
    Envelope, Global, Lfo, Osc1, VoiceMode, FIRST_VOCODER_PROGRAM, NAME_LENGTH, NUM_BANKS,
    PAYLOAD_SIZE, PROGRAMS_PER_BANK, TIMBRE_OFFSET, VOICE_MODE_OFFSET,
};

const DEVICE: &str = "Korg MicroKorg [Vocoder]";

/// Vocoder channels
pub const NUM_CHANNELS: usize = 8;

/// Largest hold value the device accepts
pub const MAX_HOLD: u32 = 0x7FFF_FF00;

const LEVEL_OFFSET: usize = 46;
const PAN_OFFSET: usize = 62;
const HOLD_OFFSET: usize = 78;

/// One vocoder channel. Level and pan drive a pair of filter bands; each
/// band has its own hold value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VocoderChannel {
    /// 0-127
    pub level: u8,
    /// 0-127, 64 is center
    pub pan: u8,
    /// Frozen formant of both bands, `0..=MAX_HOLD`
    pub hold: [u32; 2],
}

impl Default for VocoderChannel {
    fn default() -> Self {
        Self {
            level: 127,
            pan: 64,
            hold: [0; 2],
        }
    }
}

/// The vocoder's single timbre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VocoderTimbre {
    /// Mono, poly or unison
    pub assign_mode: u8,
    /// Amp envelope restarts on each note
    pub eg2_reset: bool,
    /// Retrigger envelopes in legato playing
    pub multi_trigger: bool,
    /// Cents, 0-99
    pub unison_detune: u8,
    /// 14-114, 64 is center
    pub tune: u8,
    /// 52-76, 64 is center
    pub bend_range: u8,
    /// 40-88, 64 is center
    pub transpose: u8,
    /// 1-127, 64 is center
    pub vibrato_int: u8,
    /// Glide time
    pub portamento: u8,
    /// Carrier oscillator
    pub osc1: Osc1,
    /// Gate the audio input's high pass
    pub hpf_gate: bool,
    /// Mixer level of oscillator 1
    pub osc1_level: u8,
    /// Mixer level of the audio input
    pub audio_level: u8,
    /// Mixer level of the noise generator
    pub noise_level: u8,
    /// High pass level of the audio input
    pub hpf_level: u8,
    /// Audio input gate sensitivity
    pub gate_sense: u8,
    /// Audio input threshold
    pub threshold: u8,
    /// Formant shift, 0-4
    pub formant_shift: u8,
    /// 1-127, 64 is center
    pub cutoff: u8,
    /// 0-127
    pub resonance: u8,
    /// Off, AEG, LFO 1, LFO 2, velocity, keyboard, bend, mod wheel
    pub mod_source: u8,
    /// 1-127, 64 is center
    pub mod_intensity: u8,
    /// Envelope follower sensitivity
    pub ef_sense: u8,
    /// Vocoder output level
    pub amp_level: u8,
    /// Unprocessed input level
    pub direct_level: u8,
    /// Amp distortion
    pub distortion: bool,
    /// 1-127, 64 is center
    pub amp_key_track: u8,
    /// Sustain of the filter envelope, the only stage the vocoder keeps
    pub env1_sustain: u8,
    /// Amp envelope
    pub env2: Envelope,
    /// LFO 1 and 2
    pub lfos: [Lfo; 2],
}

impl Default for VocoderTimbre {
    fn default() -> Self {
        Self {
            assign_mode: 1,
            eg2_reset: false,
            multi_trigger: false,
            unison_detune: 0,
            tune: 64,
            bend_range: 66,
            transpose: 64,
            vibrato_int: 64,
            portamento: 0,
            osc1: Osc1::default(),
            hpf_gate: false,
            osc1_level: 127,
            audio_level: 0,
            noise_level: 0,
            hpf_level: 0,
            gate_sense: 0,
            threshold: 0,
            formant_shift: 0,
            cutoff: 64,
            resonance: 0,
            mod_source: 0,
            mod_intensity: 64,
            ef_sense: 127,
            amp_level: 127,
            direct_level: 0,
            distortion: false,
            amp_key_track: 64,
            env1_sustain: 127,
            env2: Envelope::default(),
            lfos: [Lfo::default(); 2],
        }
    }
}

impl VocoderTimbre {
    fn unpack(d: &[u8]) -> Self {
        Self {
            assign_mode: (d[1] >> 6) & 3,
            eg2_reset: d[1] & 0x20 != 0,
            multi_trigger: d[1] & 0x08 != 0,
            unison_detune: d[2],
            tune: d[3],
            bend_range: d[4],
            transpose: d[5],
            vibrato_int: d[6],
            osc1: Osc1 {
                wave: d[7],
                ctrl1: d[8],
                ctrl2: d[9],
                dwgs_wave: d[10],
            },
            hpf_gate: d[12] & 1 != 0,
            portamento: d[14] & 0x7F,
            osc1_level: d[15],
            audio_level: d[16],
            noise_level: d[17],
            hpf_level: d[18],
            gate_sense: d[19],
            threshold: d[20],
            formant_shift: d[21],
            cutoff: d[22],
            resonance: d[23],
            mod_source: d[24],
            mod_intensity: d[25],
            ef_sense: d[26],
            amp_level: d[27],
            direct_level: d[28],
            distortion: d[29] & 1 != 0,
            amp_key_track: d[31],
            env1_sustain: d[34],
            env2: Envelope::unpack(&d[36..40]),
            lfos: [Lfo::unpack(&d[40..43]), Lfo::unpack(&d[43..46])],
        }
    }

    fn pack(&self, d: &mut [u8]) {
        d[0] = 0xFF;
        d[1] = (self.assign_mode << 6)
            | ((self.eg2_reset as u8) << 5)
            | ((self.multi_trigger as u8) << 3);
        d[2] = self.unison_detune;
        d[3] = self.tune;
        d[4] = self.bend_range;
        d[5] = self.transpose;
        d[6] = self.vibrato_int;
        d[7] = self.osc1.wave;
        d[8] = self.osc1.ctrl1;
        d[9] = self.osc1.ctrl2;
        d[10] = self.osc1.dwgs_wave;
        d[11] = 0;
        d[12] = self.hpf_gate as u8;
        d[13] = 0;
        d[14] = self.portamento;
        d[15] = self.osc1_level;
        d[16] = self.audio_level;
        d[17] = self.noise_level;
        d[18] = self.hpf_level;
        d[19] = self.gate_sense;
        d[20] = self.threshold;
        d[21] = self.formant_shift;
        d[22] = self.cutoff;
        d[23] = self.resonance;
        d[24] = self.mod_source;
        d[25] = self.mod_intensity;
        d[26] = self.ef_sense;
        d[27] = self.amp_level;
        d[28] = self.direct_level;
        d[29] = self.distortion as u8;
        d[30] = 64;
        d[31] = self.amp_key_track;
        d[32] = 0;
        d[33] = 0;
        d[34] = self.env1_sustain;
        d[35] = 0;
        d[36..40].copy_from_slice(&self.env2.pack());
        d[40..43].copy_from_slice(&self.lfos[0].pack());
        d[43..46].copy_from_slice(&self.lfos[1].pack());
    }

    fn revise(&mut self) {
        self.assign_mode = clamp(self.assign_mode, 0, 2);
        self.unison_detune = clamp(self.unison_detune, 0, 99);
        self.tune = clamp(self.tune, 14, 114);
        self.bend_range = clamp(self.bend_range, 52, 76);
        self.transpose = clamp(self.transpose, 40, 88);
        self.vibrato_int = clamp(self.vibrato_int, 1, 127);
        self.portamento = clamp(self.portamento, 0, 127);
        self.osc1.revise();
        self.osc1_level = clamp(self.osc1_level, 0, 127);
        self.audio_level = clamp(self.audio_level, 0, 127);
        self.noise_level = clamp(self.noise_level, 0, 127);
        self.hpf_level = clamp(self.hpf_level, 0, 127);
        self.gate_sense = clamp(self.gate_sense, 0, 127);
        self.threshold = clamp(self.threshold, 0, 127);
        self.formant_shift = clamp(self.formant_shift, 0, 4);
        self.cutoff = clamp(self.cutoff, 1, 127);
        self.resonance = clamp(self.resonance, 0, 127);
        self.mod_source = clamp(self.mod_source, 0, 7);
        self.mod_intensity = clamp(self.mod_intensity, 1, 127);
        self.ef_sense = clamp(self.ef_sense, 0, 127);
        self.amp_level = clamp(self.amp_level, 0, 127);
        self.direct_level = clamp(self.direct_level, 0, 127);
        self.amp_key_track = clamp(self.amp_key_track, 1, 127);
        self.env1_sustain = clamp(self.env1_sustain, 0, 127);
        self.env2.revise();
        for lfo in self.lfos.iter_mut() {
            lfo.revise();
        }
    }
}

/// A MicroKorg vocoder program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VocoderProgram {
    /// Stored slot, `None` for the edit buffer
    pub location: Option<PatchLocation>,
    /// Up to 12 characters
    pub name: String,
    /// Effects, arpeggiator and keyboard octave
    pub global: Global,
    /// Carrier and filter settings
    pub timbre: VocoderTimbre,
    /// Per channel level, pan and hold
    pub channels: [VocoderChannel; NUM_CHANNELS],
}

impl Default for VocoderProgram {
    fn default() -> Self {
        Self {
            location: None,
            name: "Init Vocoder".to_string(),
            global: Global::default(),
            timbre: VocoderTimbre::default(),
            channels: [VocoderChannel::default(); NUM_CHANNELS],
        }
    }
}

impl Patch for VocoderProgram {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn location(&self) -> Option<PatchLocation> {
        self.location
    }

    fn revise(&mut self) {
        self.name = revise_name(&self.name);
        self.global.revise();
        self.timbre.revise();
        for channel in self.channels.iter_mut() {
            channel.level = clamp(channel.level, 0, 127);
            channel.pan = clamp(channel.pan, 0, 127);
            for hold in channel.hold.iter_mut() {
                *hold = (*hold).min(MAX_HOLD);
            }
        }
    }

    fn into_any(self) -> AnyPatch {
        AnyPatch::MicroKorgVocoder(self)
    }

    fn from_any(patch: &AnyPatch) -> Option<&Self> {
        match patch {
            AnyPatch::MicroKorgVocoder(p) => Some(p),
            _ => None,
        }
    }
}

/// Decode a big-endian hold value. The device sends garbage above
/// [`MAX_HOLD`] now and then.
fn decode_hold(bytes: &[u8], band: usize) -> u32 {
    let value = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if value >= 0x8000_0000 {
        log::warn!("{}: hold of band {} is negative: {:#x}", DEVICE, band + 1, value);
        0
    } else if value >= MAX_HOLD {
        log::warn!("{}: hold of band {} too large: {:#x}", DEVICE, band + 1, value);
        MAX_HOLD
    } else {
        value
    }
}

/// Codec for MicroKorg vocoder programs.
#[derive(Debug, Clone, Copy)]
pub struct MicroKorgVocoder {
    channel: Channel,
}

impl MicroKorgVocoder {
    /// Codec on the configured channel
    pub fn new(config: CodecConfig) -> Self {
        Self {
            channel: config.channel,
        }
    }

    fn unpack(&self, data: &[u8]) -> Result<VocoderProgram, CodecError> {
        let d = payload(data, DEVICE)?;
        let t = &d[TIMBRE_OFFSET..];

        let mut channels = [VocoderChannel::default(); NUM_CHANNELS];
        for (j, channel) in channels.iter_mut().enumerate() {
            let level = &t[LEVEL_OFFSET + 2 * j..LEVEL_OFFSET + 2 * j + 2];
            let pan = &t[PAN_OFFSET + 2 * j..PAN_OFFSET + 2 * j + 2];
            if level[0] != level[1] {
                log::warn!(
                    "{}: channel {} level differs within its pair: {} / {}",
                    DEVICE,
                    j + 1,
                    level[0],
                    level[1]
                );
            }
            if pan[0] != pan[1] {
                log::warn!(
                    "{}: channel {} pan differs within its pair: {} / {}",
                    DEVICE,
                    j + 1,
                    pan[0],
                    pan[1]
                );
            }
            channel.level = level[0];
            channel.pan = pan[0];
            for (k, hold) in channel.hold.iter_mut().enumerate() {
                let band = 2 * j + k;
                let offset = HOLD_OFFSET + 4 * band;
                *hold = decode_hold(&t[offset..offset + 4], band);
            }
        }

        Ok(VocoderProgram {
            location: None,
            name: decode_name(&d),
            global: Global::unpack(&d),
            timbre: VocoderTimbre::unpack(t),
            channels,
        })
    }

    fn pack(&self, program: &VocoderProgram) -> Vec<u8> {
        let mut d = vec![0u8; PAYLOAD_SIZE];
        d[..NAME_LENGTH].copy_from_slice(&name::to_bytes(&program.name, NAME_LENGTH));
        program.global.pack(&mut d);
        d[VOICE_MODE_OFFSET] = VoiceMode::Vocoder.to_raw() << 4;

        let t = &mut d[TIMBRE_OFFSET..];
        program.timbre.pack(t);
        for (j, channel) in program.channels.iter().enumerate() {
            t[LEVEL_OFFSET + 2 * j] = channel.level;
            t[LEVEL_OFFSET + 2 * j + 1] = channel.level;
            t[PAN_OFFSET + 2 * j] = channel.pan;
            t[PAN_OFFSET + 2 * j + 1] = channel.pan;
            for (k, hold) in channel.hold.iter().enumerate() {
                let offset = HOLD_OFFSET + 4 * (2 * j + k);
                t[offset..offset + 4].copy_from_slice(&(*hold).min(MAX_HOLD).to_be_bytes());
            }
        }
        d
    }
}

impl Codec for MicroKorgVocoder {
    type Patch = VocoderProgram;

    fn name(&self) -> &'static str {
        DEVICE
    }

    fn recognize(&self, data: &[u8]) -> bool {
        dump_voice_mode(data) == Some(VoiceMode::Vocoder)
    }

    fn parse(&self, data: &[u8]) -> ParseOutcome<VocoderProgram> {
        if matches!(
            dump_voice_mode(data),
            Some(VoiceMode::Single) | Some(VoiceMode::Layer)
        ) {
            log::debug!("{}: synth program left to the synth codec", DEVICE);
            return ParseOutcome::Cancelled;
        }
        match self.unpack(data) {
            Ok(mut program) => {
                log::debug!("{}: parsed program '{}'", DEVICE, program.name);
                program.revise();
                ParseOutcome::Succeeded(program)
            }
            Err(err) => ParseOutcome::Failed(err),
        }
    }

    fn emit(&self, program: &VocoderProgram, target: Target) -> Result<Emission, CodecError> {
        frame(self.channel, &self.pack(program), target, DEVICE)
    }

    fn request_dump(&self, location: Option<PatchLocation>) -> Emission {
        program_request(self.channel, location)
    }

    fn location_name(&self, location: PatchLocation) -> String {
        location_name(location)
    }

    fn next_location(&self, location: PatchLocation) -> PatchLocation {
        let number = location.number.saturating_add(1).max(FIRST_VOCODER_PROGRAM);
        if number < PROGRAMS_PER_BANK {
            PatchLocation::new(location.bank, number)
        } else {
            PatchLocation::new(
                location.bank.saturating_add(1) % NUM_BANKS,
                FIRST_VOCODER_PROGRAM,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::Packet;
    use crate::korg::microkorg::MicroKorg;
    use pretty_assertions::assert_eq;

    fn sample() -> VocoderProgram {
        let mut program = VocoderProgram {
            name: "Robot Choir".to_string(),
            ..Default::default()
        };
        program.timbre.formant_shift = 3;
        program.timbre.hpf_gate = true;
        program.timbre.lfos[0].tempo_sync = true;
        program.timbre.lfos[0].sync_note = 4;
        program.channels[2] = VocoderChannel {
            level: 90,
            pan: 10,
            hold: [0x1234_5678, 7],
        };
        program.global.arpeggiator.tempo = 95;
        program
    }

    fn dump(program: &VocoderProgram) -> Vec<u8> {
        MicroKorgVocoder::new(CodecConfig::default())
            .emit(program, Target::EditBuffer)
            .unwrap()
            .sysex_messages()
            .next()
            .unwrap()
            .to_vec()
    }

    #[test]
    fn test_emit_parse_round_trip() {
        let codec = MicroKorgVocoder::new(CodecConfig::default());
        let program = sample();
        let data = dump(&program);
        assert!(codec.recognize(&data));
        assert_eq!(codec.parse(&data).ok().unwrap(), program);
    }

    #[test]
    fn test_routing_by_voice_mode() {
        let config = CodecConfig::default();
        let data = dump(&sample());
        assert!(!MicroKorg::new(config).recognize(&data));
        assert!(MicroKorg::new(config).parse(&data).is_cancelled());

        let synth = MicroKorg::new(config)
            .emit(&Default::default(), Target::EditBuffer)
            .unwrap();
        let synth = synth.sysex_messages().next().unwrap();
        assert!(!MicroKorgVocoder::new(config).recognize(synth));
        assert!(MicroKorgVocoder::new(config).parse(synth).is_cancelled());
    }

    #[test]
    fn test_channel_pairs_and_holds() {
        let codec = MicroKorgVocoder::new(CodecConfig::default());
        let d = codec.pack(&sample());
        let t = &d[TIMBRE_OFFSET..];
        assert_eq!(d[16], 0x30);
        assert_eq!(&t[LEVEL_OFFSET + 4..LEVEL_OFFSET + 6], &[90, 90]);
        assert_eq!(&t[PAN_OFFSET + 4..PAN_OFFSET + 6], &[10, 10]);
        assert_eq!(&t[HOLD_OFFSET + 16..HOLD_OFFSET + 20], &[0x12, 0x34, 0x56, 0x78]);
        assert_eq!(t[42], 0x80 | 4);
    }

    #[test]
    fn test_out_of_range_holds_are_clamped() {
        assert_eq!(decode_hold(&[0xFF, 0xFF, 0xFF, 0xFF], 0), 0);
        assert_eq!(decode_hold(&[0x7F, 0xFF, 0xFF, 0xFF], 0), MAX_HOLD);
        assert_eq!(decode_hold(&[0x00, 0x00, 0x01, 0x00], 0), 256);
    }

    #[test]
    fn test_mismatched_pair_keeps_first_value() {
        let codec = MicroKorgVocoder::new(CodecConfig::default());
        let mut d = codec.pack(&sample());
        d[TIMBRE_OFFSET + LEVEL_OFFSET + 1] = 3;

        let mut data = vec![0xF0, 0x42, 0x30, 0x58, 0x40];
        data.extend(crate::korg::packing::pack_7bit(&d));
        data.push(0xF7);

        let parsed = codec.parse(&data).ok().unwrap();
        assert_eq!(parsed.channels[0].level, 127);
    }

    #[test]
    fn test_vocoder_locations() {
        let codec = MicroKorgVocoder::new(CodecConfig::default());
        assert_eq!(codec.location_name(PatchLocation::new(0, 56)), "A.81");
        assert_eq!(
            codec.next_location(PatchLocation::new(0, 63)),
            PatchLocation::new(1, 56)
        );
        assert_eq!(
            codec.next_location(PatchLocation::new(1, 3)),
            PatchLocation::new(1, 56)
        );
    }

    #[test]
    fn test_vocoder_request_selects_program() {
        let codec = MicroKorgVocoder::new(CodecConfig::default());
        let packets = codec.request_dump(Some(PatchLocation::new(0, 60)));
        assert_eq!(packets.packets()[0], Packet::Program([0xC0, 60]));
        assert_eq!(
            packets.sysex_messages().collect::<Vec<_>>(),
            vec![&[0xF0, 0x42, 0x30, 0x58, 0x10, 0xF7][..]]
        );
        assert_eq!(codec.request_dump(None).packets().len(), 1);
    }
}
