//! Korg MicroKorg synth programs.
//!
//! A program dump is `F0 42 3n 58 40`, 291 packed bytes, `F7`. Unpacked it is
//! 254 bytes: 38 bytes of global settings followed by either two 108 byte
//! synth timbres or one vocoder timbre (see [`super::vocoder`]).

use num_traits::clamp;
use serde::Serialize;

use crate::codec::{
    Channel, Codec, CodecConfig, Emission, ParseOutcome, Patch, PatchLocation, Target,
};
use crate::error::CodecError;
use crate::name;
use crate::registry::AnyPatch;
use crate::sysex::{hex, KORG_ID, SYSEX_END, SYSEX_START};

use super::packing::{pack_7bit, unpack_8bit};

const DEVICE: &str = "Korg MicroKorg";

/// Total length of a program dump
pub const DUMP_SIZE: usize = 297;
/// Unpacked payload length
pub const PAYLOAD_SIZE: usize = 254;

const MODEL_ID: u8 = 0x58;
const PROGRAM_DUMP: u8 = 0x40;
const CURRENT_PROGRAM_REQUEST: u8 = 0x10;
const PROGRAM_WRITE_REQUEST: u8 = 0x11;
const WRITE_ERRORS: [u8; 3] = [0x26, 0x24, 0x22];
/// Time the device needs to settle on a new program, in ms
const PAUSE_AFTER_PROGRAM_CHANGE: u64 = 200;

pub(crate) const NAME_LENGTH: usize = 12;
pub(crate) const TIMBRE_OFFSET: usize = 38;
const TIMBRE_SIZE: usize = 108;
pub(crate) const VOICE_MODE_OFFSET: usize = 16;

/// Banks A and B
pub const NUM_BANKS: u8 = 2;
/// Programs per bank, synth and vocoder together
pub const PROGRAMS_PER_BANK: u8 = 64;
/// First program number reserved for vocoder programs
pub const FIRST_VOCODER_PROGRAM: u8 = 56;

/// How the timbres of a program are played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum VoiceMode {
    /// Timbre 1 only
    #[default]
    Single,
    /// Timbres 1 and 2 together
    Layer,
    /// Vocoder timbre
    Vocoder,
}

impl VoiceMode {
    /// The 2-bit field of the dump. It skips 1.
    pub fn to_raw(self) -> u8 {
        match self {
            VoiceMode::Single => 0,
            VoiceMode::Layer => 2,
            VoiceMode::Vocoder => 3,
        }
    }

    /// Decode the 2-bit field; 1 reads as a layer
    pub fn from_raw(raw: u8) -> Self {
        match raw & 3 {
            0 => VoiceMode::Single,
            3 => VoiceMode::Vocoder,
            _ => VoiceMode::Layer,
        }
    }
}

/// Arpeggiator settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Arpeggiator {
    /// Arpeggiator running
    pub on: bool,
    /// Keep playing after the keys are released
    pub latch: bool,
    /// 0 both timbres, 1 timbre 1, 2 timbre 2
    pub target: u8,
    /// Restart the pattern on every note
    pub key_sync: bool,
    /// Up, down, alt1, alt2, random, trigger
    pub kind: u8,
    /// Octave range, 0-3
    pub range: u8,
    /// 0-100
    pub gate: u8,
    /// 1/24 to 1/4, 0-5
    pub resolution: u8,
    /// -100 to 100
    pub swing: i8,
    /// BPM, 20-300
    pub tempo: u16,
    /// Steps, 0-7 for 1-8
    pub trigger_length: u8,
    /// One bit per step
    pub trigger_pattern: u8,
}

impl Default for Arpeggiator {
    fn default() -> Self {
        Self {
            on: false,
            latch: false,
            target: 0,
            key_sync: false,
            kind: 0,
            range: 0,
            gate: 80,
            resolution: 1,
            swing: 0,
            tempo: 120,
            trigger_length: 7,
            trigger_pattern: 0xFF,
        }
    }
}

impl Arpeggiator {
    fn revise(&mut self) {
        self.target = clamp(self.target, 0, 2);
        self.kind = clamp(self.kind, 0, 5);
        self.range = clamp(self.range, 0, 3);
        self.gate = clamp(self.gate, 0, 100);
        self.resolution = clamp(self.resolution, 0, 5);
        self.swing = clamp(self.swing, -100, 100);
        self.tempo = clamp(self.tempo, 20, 300);
        self.trigger_length = clamp(self.trigger_length, 0, 7);
    }
}

/// Delay effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Delay {
    /// Time follows the arpeggiator tempo
    pub sync: bool,
    /// Note value when synced, 0-14
    pub time_base: u8,
    /// 0-127
    pub time: u8,
    /// 0-127
    pub depth: u8,
    /// Stereo, cross or left/right
    pub kind: u8,
}

impl Default for Delay {
    fn default() -> Self {
        Self {
            sync: false,
            time_base: 8,
            time: 64,
            depth: 0,
            kind: 0,
        }
    }
}

/// Modulation effect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModFx {
    /// 0-127
    pub lfo_speed: u8,
    /// 0-127
    pub depth: u8,
    /// Chorus/flanger, ensemble or phaser
    pub kind: u8,
}

/// Two band equalizer. Gains are 52-76 with 64 flat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Equalizer {
    /// High band frequency, 0-29
    pub hi_freq: u8,
    /// High band gain
    pub hi_gain: u8,
    /// Low band frequency, 0-29
    pub low_freq: u8,
    /// Low band gain
    pub low_gain: u8,
}

impl Default for Equalizer {
    fn default() -> Self {
        Self {
            hi_freq: 29,
            hi_gain: 64,
            low_freq: 0,
            low_gain: 64,
        }
    }
}

/// Settings outside the timbres, shared by synth and vocoder programs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Global {
    /// Arpeggiator
    pub arpeggiator: Arpeggiator,
    /// Delay effect
    pub delay: Delay,
    /// Modulation effect
    pub mod_fx: ModFx,
    /// Equalizer
    pub eq: Equalizer,
    /// Keyboard octave shift, -3 to 3
    pub octave: i8,
}

impl Global {
    pub(crate) fn unpack(d: &[u8]) -> Self {
        Self {
            arpeggiator: Arpeggiator {
                on: d[32] & 0x80 != 0,
                latch: d[32] & 0x40 != 0,
                target: (d[32] >> 4) & 3,
                key_sync: d[32] & 1 != 0,
                kind: d[33] & 7,
                range: (d[33] >> 4) & 3,
                gate: d[34],
                resolution: d[35],
                swing: d[36] as i8,
                tempo: u16::from_be_bytes([d[30], d[31]]),
                trigger_length: d[14] & 7,
                trigger_pattern: d[15],
            },
            delay: Delay {
                sync: d[19] & 0x80 != 0,
                time_base: d[19] & 0x0F,
                time: d[20],
                depth: d[21],
                kind: d[22],
            },
            mod_fx: ModFx {
                lfo_speed: d[23],
                depth: d[24],
                kind: d[25],
            },
            eq: Equalizer {
                hi_freq: d[26],
                hi_gain: d[27],
                low_freq: d[28],
                low_gain: d[29],
            },
            octave: d[37] as i8,
        }
    }

    pub(crate) fn pack(&self, d: &mut [u8]) {
        let arp = &self.arpeggiator;
        d[14] = arp.trigger_length;
        d[15] = arp.trigger_pattern;
        d[17] = 0;
        d[18] = 60;
        d[19] = ((self.delay.sync as u8) << 7) | self.delay.time_base;
        d[20] = self.delay.time;
        d[21] = self.delay.depth;
        d[22] = self.delay.kind;
        d[23] = self.mod_fx.lfo_speed;
        d[24] = self.mod_fx.depth;
        d[25] = self.mod_fx.kind;
        d[26] = self.eq.hi_freq;
        d[27] = self.eq.hi_gain;
        d[28] = self.eq.low_freq;
        d[29] = self.eq.low_gain;
        d[30..32].copy_from_slice(&arp.tempo.to_be_bytes());
        d[32] = ((arp.on as u8) << 7)
            | ((arp.latch as u8) << 6)
            | (arp.target << 4)
            | arp.key_sync as u8;
        d[33] = arp.kind | (arp.range << 4);
        d[34] = arp.gate;
        d[35] = arp.resolution;
        d[36] = arp.swing as u8;
        d[37] = self.octave as u8;
    }

    pub(crate) fn revise(&mut self) {
        self.arpeggiator.revise();
        self.delay.time_base = clamp(self.delay.time_base, 0, 14);
        self.delay.time = clamp(self.delay.time, 0, 127);
        self.delay.depth = clamp(self.delay.depth, 0, 127);
        self.delay.kind = clamp(self.delay.kind, 0, 2);
        self.mod_fx.lfo_speed = clamp(self.mod_fx.lfo_speed, 0, 127);
        self.mod_fx.depth = clamp(self.mod_fx.depth, 0, 127);
        self.mod_fx.kind = clamp(self.mod_fx.kind, 0, 2);
        self.eq.hi_freq = clamp(self.eq.hi_freq, 0, 29);
        self.eq.hi_gain = clamp(self.eq.hi_gain, 52, 76);
        self.eq.low_freq = clamp(self.eq.low_freq, 0, 29);
        self.eq.low_gain = clamp(self.eq.low_gain, 52, 76);
        self.octave = clamp(self.octave, -3, 3);
    }
}

/// Oscillator 1, shared by synth and vocoder timbres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Osc1 {
    /// Saw, pulse, triangle, sine, vox, DWGS, noise, audio in
    pub wave: u8,
    /// Control 1, 0-127
    pub ctrl1: u8,
    /// Control 2, 0-127
    pub ctrl2: u8,
    /// 0-63
    pub dwgs_wave: u8,
}

impl Osc1 {
    pub(crate) fn revise(&mut self) {
        self.wave = clamp(self.wave, 0, 7);
        self.ctrl1 = clamp(self.ctrl1, 0, 127);
        self.ctrl2 = clamp(self.ctrl2, 0, 127);
        self.dwgs_wave = clamp(self.dwgs_wave, 0, 63);
    }
}

/// ADSR envelope, each stage 0-127.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Envelope {
    /// Attack time
    pub attack: u8,
    /// Decay time
    pub decay: u8,
    /// Sustain level
    pub sustain: u8,
    /// Release time
    pub release: u8,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: 0,
            decay: 64,
            sustain: 127,
            release: 0,
        }
    }
}

impl Envelope {
    pub(crate) fn unpack(d: &[u8]) -> Self {
        Self {
            attack: d[0],
            decay: d[1],
            sustain: d[2],
            release: d[3],
        }
    }

    pub(crate) fn pack(&self) -> [u8; 4] {
        [self.attack, self.decay, self.sustain, self.release]
    }

    pub(crate) fn revise(&mut self) {
        self.attack = clamp(self.attack, 0, 127);
        self.decay = clamp(self.decay, 0, 127);
        self.sustain = clamp(self.sustain, 0, 127);
        self.release = clamp(self.release, 0, 127);
    }
}

/// Timbre LFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Lfo {
    /// Saw, square, triangle, sample and hold
    pub wave: u8,
    /// Off, timbre or voice
    pub key_sync: u8,
    /// Rate, 0-127
    pub frequency: u8,
    /// Rate follows the arpeggiator tempo
    pub tempo_sync: bool,
    /// Note value when synced, 0-14
    pub sync_note: u8,
}

impl Default for Lfo {
    fn default() -> Self {
        Self {
            wave: 0,
            key_sync: 0,
            frequency: 64,
            tempo_sync: false,
            sync_note: 0,
        }
    }
}

impl Lfo {
    pub(crate) fn unpack(d: &[u8]) -> Self {
        Self {
            wave: d[0] & 3,
            key_sync: (d[0] >> 4) & 3,
            frequency: d[1],
            tempo_sync: d[2] & 0x80 != 0,
            sync_note: d[2] & 0x0F,
        }
    }

    /// The sync byte carries both the tempo sync flag and the note.
    pub(crate) fn pack(&self) -> [u8; 3] {
        [
            (self.key_sync << 4) | self.wave,
            self.frequency,
            ((self.tempo_sync as u8) << 7) | self.sync_note,
        ]
    }

    pub(crate) fn revise(&mut self) {
        self.wave = clamp(self.wave, 0, 3);
        self.key_sync = clamp(self.key_sync, 0, 2);
        self.frequency = clamp(self.frequency, 0, 127);
        self.sync_note = clamp(self.sync_note, 0, 14);
    }
}

/// One of the four virtual patch cords of a synth timbre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PatchRoute {
    /// 0-7
    pub source: u8,
    /// 0-7
    pub destination: u8,
    /// 1-127, 64 is off
    pub intensity: u8,
}

impl Default for PatchRoute {
    fn default() -> Self {
        Self {
            source: 0,
            destination: 0,
            intensity: 64,
        }
    }
}

/// A synth timbre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Timbre {
    /// Mono, poly or unison
    pub assign_mode: u8,
    /// Filter envelope restarts on each note
    pub eg1_reset: bool,
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
    /// Glide time, 0-127
    pub portamento: u8,
    /// Oscillator 1
    pub osc1: Osc1,
    /// Saw, square or triangle
    pub osc2_wave: u8,
    /// Off, ring, sync, ring and sync
    pub osc2_mod_select: u8,
    /// 40-88, 64 is center
    pub osc2_semitone: u8,
    /// 1-127, 64 is center
    pub osc2_tune: u8,
    /// Mixer level of oscillator 1
    pub osc1_level: u8,
    /// Mixer level of oscillator 2
    pub osc2_level: u8,
    /// Mixer level of the noise generator
    pub noise_level: u8,
    /// 24LP, 12LP, 12BP, 12HP
    pub filter_type: u8,
    /// Filter cutoff, 0-127
    pub cutoff: u8,
    /// Filter resonance, 0-127
    pub resonance: u8,
    /// 1-127, 64 is center
    pub eg1_intensity: u8,
    /// 1-127, 64 is center
    pub filter_key_track: u8,
    /// Output level
    pub amp_level: u8,
    /// 0-127, 64 is center
    pub pan: u8,
    /// Amp distortion
    pub distortion: bool,
    /// 1-127, 64 is center
    pub amp_key_track: u8,
    /// Filter envelope
    pub env1: Envelope,
    /// Amp envelope
    pub env2: Envelope,
    /// LFO 1 and 2
    pub lfos: [Lfo; 2],
    /// Virtual patch cords
    pub patches: [PatchRoute; 4],
}

impl Default for Timbre {
    fn default() -> Self {
        Self {
            assign_mode: 1,
            eg1_reset: false,
            eg2_reset: false,
            multi_trigger: false,
            unison_detune: 0,
            tune: 64,
            bend_range: 66,
            transpose: 64,
            vibrato_int: 64,
            portamento: 0,
            osc1: Osc1::default(),
            osc2_wave: 0,
            osc2_mod_select: 0,
            osc2_semitone: 64,
            osc2_tune: 64,
            osc1_level: 127,
            osc2_level: 0,
            noise_level: 0,
            filter_type: 1,
            cutoff: 127,
            resonance: 0,
            eg1_intensity: 64,
            filter_key_track: 64,
            amp_level: 127,
            pan: 64,
            distortion: false,
            amp_key_track: 64,
            env1: Envelope::default(),
            env2: Envelope::default(),
            lfos: [Lfo::default(); 2],
            patches: [PatchRoute::default(); 4],
        }
    }
}

impl Timbre {
    fn unpack(d: &[u8]) -> Self {
        let mut patches = [PatchRoute::default(); 4];
        for (j, route) in patches.iter_mut().enumerate() {
            let cord = d[44 + 2 * j];
            *route = PatchRoute {
                source: cord & 7,
                destination: (cord >> 4) & 7,
                intensity: d[45 + 2 * j],
            };
        }

        Self {
            assign_mode: (d[1] >> 6) & 3,
            eg2_reset: d[1] & 0x20 != 0,
            eg1_reset: d[1] & 0x10 != 0,
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
            osc2_mod_select: (d[12] >> 4) & 3,
            osc2_wave: d[12] & 3,
            osc2_semitone: d[13],
            osc2_tune: d[14],
            portamento: d[15] & 0x7F,
            osc1_level: d[16],
            osc2_level: d[17],
            noise_level: d[18],
            filter_type: d[19],
            cutoff: d[20],
            resonance: d[21],
            eg1_intensity: d[22],
            filter_key_track: d[24],
            amp_level: d[25],
            pan: d[26],
            distortion: d[27] & 1 != 0,
            amp_key_track: d[29],
            env1: Envelope::unpack(&d[30..34]),
            env2: Envelope::unpack(&d[34..38]),
            lfos: [Lfo::unpack(&d[38..41]), Lfo::unpack(&d[41..44])],
            patches,
        }
    }

    fn pack(&self, d: &mut [u8]) {
        d[0] = 0xFF;
        d[1] = (self.assign_mode << 6)
            | ((self.eg2_reset as u8) << 5)
            | ((self.eg1_reset as u8) << 4)
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
        d[12] = (self.osc2_mod_select << 4) | self.osc2_wave;
        d[13] = self.osc2_semitone;
        d[14] = self.osc2_tune;
        d[15] = self.portamento;
        d[16] = self.osc1_level;
        d[17] = self.osc2_level;
        d[18] = self.noise_level;
        d[19] = self.filter_type;
        d[20] = self.cutoff;
        d[21] = self.resonance;
        d[22] = self.eg1_intensity;
        d[23] = 64;
        d[24] = self.filter_key_track;
        d[25] = self.amp_level;
        d[26] = self.pan;
        d[27] = self.distortion as u8;
        d[28] = 64;
        d[29] = self.amp_key_track;
        d[30..34].copy_from_slice(&self.env1.pack());
        d[34..38].copy_from_slice(&self.env2.pack());
        d[38..41].copy_from_slice(&self.lfos[0].pack());
        d[41..44].copy_from_slice(&self.lfos[1].pack());
        for (j, route) in self.patches.iter().enumerate() {
            d[44 + 2 * j] = (route.destination << 4) | route.source;
            d[45 + 2 * j] = route.intensity;
        }
        for b in d[52..TIMBRE_SIZE].iter_mut() {
            *b = 0;
        }
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
        self.osc2_wave = clamp(self.osc2_wave, 0, 2);
        self.osc2_mod_select = clamp(self.osc2_mod_select, 0, 3);
        self.osc2_semitone = clamp(self.osc2_semitone, 40, 88);
        self.osc2_tune = clamp(self.osc2_tune, 1, 127);
        self.osc1_level = clamp(self.osc1_level, 0, 127);
        self.osc2_level = clamp(self.osc2_level, 0, 127);
        self.noise_level = clamp(self.noise_level, 0, 127);
        self.filter_type = clamp(self.filter_type, 0, 3);
        self.cutoff = clamp(self.cutoff, 0, 127);
        self.resonance = clamp(self.resonance, 0, 127);
        self.eg1_intensity = clamp(self.eg1_intensity, 1, 127);
        self.filter_key_track = clamp(self.filter_key_track, 1, 127);
        self.amp_level = clamp(self.amp_level, 0, 127);
        self.pan = clamp(self.pan, 0, 127);
        self.amp_key_track = clamp(self.amp_key_track, 1, 127);
        self.env1.revise();
        self.env2.revise();
        for lfo in self.lfos.iter_mut() {
            lfo.revise();
        }
        for route in self.patches.iter_mut() {
            route.source = clamp(route.source, 0, 7);
            route.destination = clamp(route.destination, 0, 7);
            route.intensity = clamp(route.intensity, 1, 127);
        }
    }
}

/// A MicroKorg synth program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MicroKorgProgram {
    /// Stored slot, `None` for the edit buffer
    pub location: Option<PatchLocation>,
    /// Up to 12 characters
    pub name: String,
    /// Single or layer
    pub voice_mode: VoiceMode,
    /// Effects, arpeggiator and keyboard octave
    pub global: Global,
    /// Timbre 1 and 2; timbre 2 only sounds in layer mode
    pub timbres: [Timbre; 2],
}

impl Default for MicroKorgProgram {
    fn default() -> Self {
        Self {
            location: None,
            name: "Init".to_string(),
            voice_mode: VoiceMode::Single,
            global: Global::default(),
            timbres: [Timbre::default(); 2],
        }
    }
}

pub(crate) fn revise_name(name: &str) -> String {
    name::printable(&name::truncate(name, NAME_LENGTH))
        .trim_end()
        .to_string()
}

impl Patch for MicroKorgProgram {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn location(&self) -> Option<PatchLocation> {
        self.location
    }

    fn revise(&mut self) {
        self.name = revise_name(&self.name);
        if self.voice_mode == VoiceMode::Vocoder {
            self.voice_mode = VoiceMode::Single;
        }
        self.global.revise();
        for timbre in self.timbres.iter_mut() {
            timbre.revise();
        }
    }

    fn into_any(self) -> AnyPatch {
        AnyPatch::MicroKorg(self)
    }

    fn from_any(patch: &AnyPatch) -> Option<&Self> {
        match patch {
            AnyPatch::MicroKorg(p) => Some(p),
            _ => None,
        }
    }
}

/// Unpacked payload of a program dump, or why there is none.
pub(crate) fn payload(data: &[u8], device: &'static str) -> Result<Vec<u8>, CodecError> {
    if data.len() != DUMP_SIZE {
        return Err(CodecError::BadLength {
            device,
            actual: data.len(),
        });
    }
    if !is_program_dump(data) {
        return Err(CodecError::BadHeader { device });
    }
    let payload = unpack_8bit(data, 5);
    if payload.len() != PAYLOAD_SIZE {
        return Err(CodecError::Truncated(payload.len()));
    }
    Ok(payload)
}

fn is_program_dump(data: &[u8]) -> bool {
    data.len() == DUMP_SIZE
        && data[0] == SYSEX_START
        && data[1] == KORG_ID
        && data[3] == MODEL_ID
        && data[4] == PROGRAM_DUMP
        && data[DUMP_SIZE - 1] == SYSEX_END
}

/// Voice mode of a program dump, `None` when `data` is not one.
pub(crate) fn dump_voice_mode(data: &[u8]) -> Option<VoiceMode> {
    if !is_program_dump(data) {
        return None;
    }
    let payload = unpack_8bit(data, 5);
    payload
        .get(VOICE_MODE_OFFSET)
        .map(|b| VoiceMode::from_raw(b >> 4))
}

pub(crate) fn decode_name(payload: &[u8]) -> String {
    name::from_bytes(&payload[..NAME_LENGTH])
}

/// Frame a 254 byte payload into a program dump, plus the write request
/// when it is headed for a stored slot.
pub(crate) fn frame(
    channel: Channel,
    payload: &[u8],
    target: Target,
    device: &'static str,
) -> Result<Emission, CodecError> {
    let mut dump = Vec::with_capacity(DUMP_SIZE);
    dump.extend_from_slice(&[SYSEX_START, KORG_ID, 0x30 | channel.get(), MODEL_ID, PROGRAM_DUMP]);
    dump.extend(pack_7bit(payload));
    dump.push(SYSEX_END);
    let emission = Emission::single(dump);

    match target {
        Target::EditBuffer | Target::File(_) => Ok(emission),
        Target::Store(loc) => {
            if loc.bank >= NUM_BANKS || loc.number >= PROGRAMS_PER_BANK {
                return Err(CodecError::InvalidLocation {
                    bank: loc.bank,
                    number: loc.number,
                });
            }
            // the device only writes from its edit buffer
            let write = vec![
                SYSEX_START,
                KORG_ID,
                0x30 | channel.get(),
                MODEL_ID,
                PROGRAM_WRITE_REQUEST,
                0x00,
                loc.bank * PROGRAMS_PER_BANK + loc.number,
                SYSEX_END,
            ];
            log::debug!("{}: write request {}", device, hex(&write));
            Ok(emission.sysex(write))
        }
    }
}

/// Ask for the program in the edit buffer
pub(crate) fn current_program_request(channel: Channel) -> Emission {
    Emission::single(vec![
        SYSEX_START,
        KORG_ID,
        0x30 | channel.get(),
        MODEL_ID,
        CURRENT_PROGRAM_REQUEST,
        SYSEX_END,
    ])
}

/// Ask for a stored program by selecting it first, then dumping the current
/// program. Without a location only the current program is requested.
pub(crate) fn program_request(channel: Channel, location: Option<PatchLocation>) -> Emission {
    let Some(loc) = location else {
        return current_program_request(channel);
    };

    let program = loc.bank as u16 * PROGRAMS_PER_BANK as u16 + loc.number as u16;
    if program > 0x7F {
        log::warn!(
            "{}: no program at bank {} number {}, requesting program {}",
            DEVICE,
            loc.bank,
            loc.number,
            program & 0x7F
        );
    }
    log::debug!("{}: select {} before requesting it", DEVICE, location_name(loc));

    Emission::new()
        .program_change(channel, (program & 0x7F) as u8)
        .pause(PAUSE_AFTER_PROGRAM_CHANGE)
        .extend(current_program_request(channel))
}

/// Front panel name, `A.11` to `B.88`
pub(crate) fn location_name(location: PatchLocation) -> String {
    format!(
        "{}.{}{}",
        if location.bank == 0 { 'A' } else { 'B' },
        location.number / 8 + 1,
        location.number % 8 + 1
    )
}

/// True for the device's reply to a failed program write.
pub fn is_write_error(message: &[u8]) -> bool {
    message.len() == 6
        && message[0] == SYSEX_START
        && message[1] == KORG_ID
        && message[3] == MODEL_ID
        && WRITE_ERRORS.contains(&message[4])
}

/// Codec for MicroKorg synth programs.
#[derive(Debug, Clone, Copy)]
pub struct MicroKorg {
    channel: Channel,
}

impl MicroKorg {
    /// Codec on the configured channel
    pub fn new(config: CodecConfig) -> Self {
        Self {
            channel: config.channel,
        }
    }

    fn unpack(&self, data: &[u8]) -> Result<MicroKorgProgram, CodecError> {
        let d = payload(data, DEVICE)?;
        let voice_mode = VoiceMode::from_raw(d[VOICE_MODE_OFFSET] >> 4);

        let first = TIMBRE_OFFSET;
        let second = TIMBRE_OFFSET + TIMBRE_SIZE;
        Ok(MicroKorgProgram {
            location: None,
            name: decode_name(&d),
            voice_mode,
            global: Global::unpack(&d),
            timbres: [
                Timbre::unpack(&d[first..first + TIMBRE_SIZE]),
                Timbre::unpack(&d[second..second + TIMBRE_SIZE]),
            ],
        })
    }

    fn pack(&self, program: &MicroKorgProgram) -> Vec<u8> {
        let mut d = vec![0u8; PAYLOAD_SIZE];
        d[..NAME_LENGTH].copy_from_slice(&name::to_bytes(&program.name, NAME_LENGTH));
        program.global.pack(&mut d);
        d[VOICE_MODE_OFFSET] = program.voice_mode.to_raw() << 4;
        for (t, timbre) in program.timbres.iter().enumerate() {
            let offset = TIMBRE_OFFSET + TIMBRE_SIZE * t;
            timbre.pack(&mut d[offset..offset + TIMBRE_SIZE]);
        }
        d
    }
}

impl Codec for MicroKorg {
    type Patch = MicroKorgProgram;

    fn name(&self) -> &'static str {
        DEVICE
    }

    fn recognize(&self, data: &[u8]) -> bool {
        matches!(
            dump_voice_mode(data),
            Some(VoiceMode::Single) | Some(VoiceMode::Layer)
        )
    }

    fn parse(&self, data: &[u8]) -> ParseOutcome<MicroKorgProgram> {
        if dump_voice_mode(data) == Some(VoiceMode::Vocoder) {
            log::debug!("{}: vocoder program left to the vocoder codec", DEVICE);
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

    fn emit(&self, program: &MicroKorgProgram, target: Target) -> Result<Emission, CodecError> {
        frame(self.channel, &self.pack(program), target, DEVICE)
    }

    fn request_dump(&self, location: Option<PatchLocation>) -> Emission {
        program_request(self.channel, location)
    }

    fn location_name(&self, location: PatchLocation) -> String {
        location_name(location)
    }

    fn next_location(&self, location: PatchLocation) -> PatchLocation {
        let number = location.number.saturating_add(1);
        if number < FIRST_VOCODER_PROGRAM {
            PatchLocation::new(location.bank, number)
        } else {
            PatchLocation::new(location.bank.saturating_add(1) % NUM_BANKS, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::codec::Packet;
    use pretty_assertions::assert_eq;

    fn sample() -> MicroKorgProgram {
        let mut program = MicroKorgProgram {
            name: "Pulse Lead".to_string(),
            voice_mode: VoiceMode::Layer,
            ..Default::default()
        };
        program.global.arpeggiator.tempo = 287;
        program.global.arpeggiator.swing = -40;
        program.global.arpeggiator.on = true;
        program.global.delay.sync = true;
        program.global.delay.time_base = 12;
        program.global.octave = -2;
        program.timbres[0].lfos[1] = Lfo {
            wave: 3,
            key_sync: 2,
            frequency: 90,
            tempo_sync: true,
            sync_note: 9,
        };
        program.timbres[1].eg1_reset = true;
        program.timbres[1].patches[2] = PatchRoute {
            source: 5,
            destination: 6,
            intensity: 20,
        };
        program
    }

    #[test]
    fn test_emit_parse_round_trip() {
        let codec = MicroKorg::new(CodecConfig::default());
        let program = sample();
        let emission = codec.emit(&program, Target::EditBuffer).unwrap();
        let dump = emission.sysex_messages().next().unwrap().to_vec();
        assert_eq!(dump.len(), DUMP_SIZE);
        assert_eq!(&dump[..5], &[0xF0, 0x42, 0x30, 0x58, 0x40]);
        assert!(codec.recognize(&dump));

        assert_eq!(codec.parse(&dump).ok().unwrap(), program);
    }

    #[test]
    fn test_payload_layout() {
        let codec = MicroKorg::new(CodecConfig::default());
        let d = codec.pack(&sample());
        assert_eq!(d[16], 0x20);
        assert_eq!(d[18], 60);
        assert_eq!(d[19], 0x80 | 12);
        assert_eq!(&d[30..32], &[0x01, 0x1F]);
        assert_eq!(d[36], (-40i8) as u8);
        assert_eq!(d[37], 0xFE);
        assert_eq!(d[TIMBRE_OFFSET], 0xFF);
        assert_eq!(d[TIMBRE_OFFSET + 23], 64);
        // tempo sync and sync note share a byte
        assert_eq!(d[TIMBRE_OFFSET + 43], 0x80 | 9);
        assert_eq!(d[TIMBRE_OFFSET + TIMBRE_SIZE + 1] & 0x10, 0x10);
        assert_eq!(d[TIMBRE_OFFSET + TIMBRE_SIZE + 48], 0x65);
    }

    #[test]
    fn test_store_appends_write_request() {
        let codec = MicroKorg::new(CodecConfig {
            channel: Channel::new(3).unwrap(),
        });
        let emission = codec
            .emit(&sample(), Target::Store(PatchLocation::new(1, 10)))
            .unwrap();
        let messages: Vec<&[u8]> = emission.sysex_messages().collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0][2], 0x33);
        assert_eq!(messages[1], &[0xF0, 0x42, 0x33, 0x58, 0x11, 0x00, 74, 0xF7]);

        assert!(codec
            .emit(&sample(), Target::Store(PatchLocation::new(2, 0)))
            .is_err());
        assert_eq!(
            codec
                .emit(&sample(), Target::File(PatchLocation::new(0, 0)))
                .unwrap()
                .packets()
                .len(),
            1
        );
    }

    #[test]
    fn test_located_request_selects_program_first() {
        let codec = MicroKorg::new(CodecConfig {
            channel: Channel::new(4).unwrap(),
        });
        let located = codec.request_dump(Some(PatchLocation::new(1, 10)));
        assert_ne!(located, codec.request_dump(None));
        assert_eq!(
            located.packets(),
            &[
                Packet::Program([0xC4, 74]),
                Packet::Pause(Duration::from_millis(200)),
                Packet::Sysex(vec![0xF0, 0x42, 0x34, 0x58, 0x10, 0xF7]),
            ]
        );
    }

    #[test]
    fn test_request_and_locations() {
        let codec = MicroKorg::new(CodecConfig::default());
        assert_eq!(
            codec.request_dump(None).to_bytes(),
            vec![0xF0, 0x42, 0x30, 0x58, 0x10, 0xF7]
        );
        assert_eq!(codec.location_name(PatchLocation::new(0, 0)), "A.11");
        assert_eq!(codec.location_name(PatchLocation::new(1, 63)), "B.88");
        assert_eq!(
            codec.next_location(PatchLocation::new(0, 55)),
            PatchLocation::new(1, 0)
        );
    }

    #[test]
    fn test_write_error_replies() {
        assert!(is_write_error(&[0xF0, 0x42, 0x30, 0x58, 0x26, 0xF7]));
        assert!(is_write_error(&[0xF0, 0x42, 0x30, 0x58, 0x22, 0xF7]));
        assert!(!is_write_error(&[0xF0, 0x42, 0x30, 0x58, 0x23, 0xF7]));
        assert!(!is_write_error(&[0xF0, 0x42, 0x30, 0x58, 0x26]));
    }

    #[test]
    fn test_recognize_never_panics() {
        let codec = MicroKorg::new(CodecConfig::default());
        assert!(!codec.recognize(&[]));
        assert!(!codec.recognize(&[0xF0, 0x42, 0x30, 0x58, 0x40, 0xF7]));
        let mut junk = vec![0xF0; DUMP_SIZE];
        junk[1] = 0x42;
        assert!(!codec.recognize(&junk));
    }

    #[test]
    fn test_name_revise() {
        let mut program = MicroKorgProgram {
            name: "Way Too Long A Name\u{1}".to_string(),
            ..Default::default()
        };
        program.revise();
        assert_eq!(program.name, "Way Too Long");
    }
}
