//! Casio CZ tone dumps.
//!
//! Every logical byte travels as two nibbles, low first. The CZ-101 family
//! sends 128 logical bytes per tone and the CZ-1 sends 144, adding a name,
//! per-envelope velocity and a DCA master level. A dump may or may not carry
//! a location byte, so the four layouts are told apart by length alone.

use num_traits::clamp;
use serde::Serialize;

use crate::codec::{Channel, Codec, CodecConfig, Emission, ParseOutcome, Patch, PatchLocation, Target};
use crate::error::CodecError;
use crate::registry::AnyPatch;
use crate::sysex::{NibbleReader, NibbleWriter, CASIO_ID, SYSEX_END, SYSEX_START};

use super::transform::{self, Vibrato, DCA_KEY_FOLLOW, DCW_KEY_FOLLOW, DCW_KEY_FOLLOW_CZ1};

/// Bank names, in location byte order
pub const BANKS: [&str; 13] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "CA", "CB", "SA", "SB", "SC",
];

/// Pause between the fragments of a divided message, in milliseconds
pub const MIDI_PAUSE: u64 = 100;

const HEADER_SIZE: usize = 6;
const CZ101_BLOCK: usize = 128;
const CZ1_BLOCK: usize = 144;
const NAME_LENGTH: usize = 16;
const EDIT_BUFFER_LOCATION: u8 = 0x60;
const HIGHEST_LOCATION: u8 = 80;
const SEND_REQUEST: u8 = 0x30;
const RECEIVE_REQUEST_CZ101: u8 = 0x20;
const RECEIVE_REQUEST_CZ1: u8 = 0x21;
const UNTITLED: &str = "UNTITLED";

/// The two dump layouts of the CZ family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum CzModel {
    /// CZ-101, CZ-1000, CZ-3000 and CZ-5000
    #[default]
    Cz101,
    /// CZ-1
    Cz1,
}

impl CzModel {
    fn block_size(self) -> usize {
        match self {
            CzModel::Cz101 => CZ101_BLOCK,
            CzModel::Cz1 => CZ1_BLOCK,
        }
    }

    fn receive_opcode(self) -> u8 {
        match self {
            CzModel::Cz101 => RECEIVE_REQUEST_CZ101,
            CzModel::Cz1 => RECEIVE_REQUEST_CZ1,
        }
    }

    fn send_opcode(self) -> u8 {
        match self {
            CzModel::Cz101 => 0x10,
            CzModel::Cz1 => 0x11,
        }
    }
}

/// Which of the three envelopes of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Dco,
    Dcw,
    Dca,
}

impl Stage {
    fn max_rate(self) -> u8 {
        match self {
            Stage::Dca => 106,
            _ => 99,
        }
    }

    fn max_level(self) -> u8 {
        match self {
            Stage::Dco => 123,
            _ => 99,
        }
    }

    fn rate_to_sysex(self, rate: u8) -> u8 {
        match self {
            Stage::Dco => transform::dco_rate_to_sysex(rate),
            Stage::Dcw => transform::dcw_rate_to_sysex(rate),
            Stage::Dca => transform::dca_rate_to_sysex(rate),
        }
    }

    fn sysex_to_rate(self, value: u8) -> u8 {
        match self {
            Stage::Dco => transform::sysex_to_dco_rate(value),
            Stage::Dcw => transform::sysex_to_dcw_rate(value),
            Stage::Dca => transform::sysex_to_dca_rate(value),
        }
    }

    fn level_to_sysex(self, level: u8) -> u8 {
        match self {
            Stage::Dco => transform::dco_level_to_sysex(level),
            Stage::Dcw => transform::dcw_level_to_sysex(level),
            Stage::Dca => transform::dca_level_to_sysex(level),
        }
    }

    fn sysex_to_level(self, value: u8) -> u8 {
        match self {
            Stage::Dco => transform::sysex_to_dco_level(value),
            Stage::Dcw => transform::sysex_to_dcw_level(value),
            Stage::Dca => transform::sysex_to_dca_level(value),
        }
    }
}

/// An eight step CZ envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Envelope {
    /// Step rates
    pub rates: [u8; 8],
    /// Step levels
    pub levels: [u8; 8],
    /// Last step, 0-7
    pub end: u8,
    /// Sustain step, 1-8, or 0 for none
    pub sustain: u8,
    /// Velocity sensitivity, 0-15 (CZ-1 only)
    pub velocity: u8,
}

impl Envelope {
    fn write(&self, stage: Stage, model: CzModel, w: &mut NibbleWriter) {
        let mut head = self.end & 0x0F;
        if model == CzModel::Cz1 {
            head |= self.velocity << 4;
        }
        w.push(head);

        for i in 0..8 {
            let mut rate = stage.rate_to_sysex(self.rates[i]);
            let mut level = stage.level_to_sysex(self.levels[i]);
            // the device wants to know which way each step moves
            if i > 0 && self.levels[i] < self.levels[i - 1] {
                rate |= 0x80;
            }
            if self.sustain as usize == i + 1 {
                level |= 0x80;
            }
            w.push(rate);
            w.push(level);
        }
    }

    fn read(stage: Stage, model: CzModel, r: &mut NibbleReader<'_>) -> Result<Self, CodecError> {
        let head = r.byte()?;
        let mut env = Envelope {
            end: head & 0x0F,
            velocity: if model == CzModel::Cz1 { head >> 4 } else { 0 },
            ..Envelope::default()
        };

        for i in 0..8 {
            let rate = r.byte()?;
            let level = r.byte()?;
            env.rates[i] = stage.sysex_to_rate(rate & 0x7F);
            env.levels[i] = stage.sysex_to_level(level & 0x7F);
            if level & 0x80 != 0 {
                env.sustain = i as u8 + 1;
            }
        }
        Ok(env)
    }

    fn revise(&mut self, stage: Stage) {
        for rate in self.rates.iter_mut() {
            *rate = clamp(*rate, 0, stage.max_rate());
        }
        for level in self.levels.iter_mut() {
            *level = clamp(*level, 0, stage.max_level());
        }
        self.end = clamp(self.end, 0, 7);
        self.sustain = clamp(self.sustain, 0, 8);
        self.velocity = clamp(self.velocity, 0, 15);
    }
}

/// One of the two lines of a tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Line {
    /// 0-7
    pub waveform1: u8,
    /// 0-7
    pub waveform2: u8,
    /// Second waveform enabled
    pub waveform2_on: bool,
    /// DCW window, 0-5
    pub window: u8,
    /// 0-9
    pub dca_key_follow: u8,
    /// 0-9
    pub dcw_key_follow: u8,
    /// DCA master level, 1-15 (CZ-1 only)
    pub main_level: u8,
    /// Pitch envelope
    pub dco: Envelope,
    /// Waveshape envelope
    pub dcw: Envelope,
    /// Amplitude envelope
    pub dca: Envelope,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            waveform1: 0,
            waveform2: 0,
            waveform2_on: false,
            window: 0,
            dca_key_follow: 0,
            dcw_key_follow: 0,
            main_level: 15,
            dco: Envelope::default(),
            dcw: Envelope::default(),
            dca: Envelope::default(),
        }
    }
}

impl Line {
    fn revise(&mut self) {
        self.waveform1 = clamp(self.waveform1, 0, 7);
        self.waveform2 = clamp(self.waveform2, 0, 7);
        self.window = clamp(self.window, 0, 5);
        self.dca_key_follow = clamp(self.dca_key_follow, 0, 9);
        self.dcw_key_follow = clamp(self.dcw_key_follow, 0, 9);
        self.main_level = clamp(self.main_level, 1, 15);
        self.dco.revise(Stage::Dco);
        self.dcw.revise(Stage::Dcw);
        self.dca.revise(Stage::Dca);
    }
}

/// A CZ tone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CzTone {
    /// Dump layout
    pub model: CzModel,
    /// Stored location, `None` for the edit buffer
    pub location: Option<PatchLocation>,
    /// Up to 16 characters from the CZ-1 character set
    pub name: String,
    /// 0: 1, 1: 2, 2: 1+1', 3: 1+2'
    pub line_select: u8,
    /// 0: 0, 1: +1, 2: -1
    pub octave: u8,
    /// Line 2 detune in semitones, -47..=47
    pub detune: i8,
    /// Fine detune, 0-60
    pub fine: u8,
    /// Triangle, saw up, saw down, square
    pub vibrato_wave: u8,
    /// 0-99
    pub vibrato_delay: u8,
    /// 0-99
    pub vibrato_rate: u8,
    /// 0-99
    pub vibrato_depth: u8,
    /// Ring and noise modulation, 0-7
    pub modulation: u8,
    /// Silence line 1
    pub mute_line1: bool,
    /// Line 1 and line 2
    pub lines: [Line; 2],
}

impl Default for CzTone {
    fn default() -> Self {
        Self {
            model: CzModel::Cz101,
            location: None,
            name: UNTITLED.to_string(),
            line_select: 0,
            octave: 0,
            detune: 0,
            fine: 0,
            vibrato_wave: 0,
            vibrato_delay: 0,
            vibrato_rate: 0,
            vibrato_depth: 0,
            modulation: 0,
            mute_line1: false,
            lines: [Line::default(); 2],
        }
    }
}

/// Uppercase, only `A-Z 0-9 * - / .` and space, at most 16 characters.
pub fn revise_name(name: &str) -> String {
    name.chars()
        .take(NAME_LENGTH)
        .map(|c| c.to_ascii_uppercase())
        .map(|c| match c {
            'A'..='Z' | '0'..='9' | '*' | '-' | '/' | ' ' | '.' => c,
            _ => ' ',
        })
        .collect::<String>()
        .trim_end()
        .to_string()
}

impl Patch for CzTone {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn location(&self) -> Option<PatchLocation> {
        self.location
    }

    fn revise(&mut self) {
        let revised = revise_name(&self.name);
        if revised != self.name {
            log::debug!("Casio CZ: name '{}' revised to '{}'", self.name, revised);
            self.name = revised;
        }
        self.line_select = clamp(self.line_select, 0, 3);
        self.octave = clamp(self.octave, 0, 2);
        self.detune = clamp(self.detune, -47, 47);
        self.fine = clamp(self.fine, 0, 60);
        self.vibrato_wave = clamp(self.vibrato_wave, 0, 3);
        self.vibrato_delay = clamp(self.vibrato_delay, 0, 99);
        self.vibrato_rate = clamp(self.vibrato_rate, 0, 99);
        self.vibrato_depth = clamp(self.vibrato_depth, 0, 99);
        self.modulation = clamp(self.modulation, 0, 7);
        for line in self.lines.iter_mut() {
            line.revise();
        }
    }

    fn into_any(self) -> AnyPatch {
        AnyPatch::CasioCz(self)
    }

    fn from_any(patch: &AnyPatch) -> Option<&Self> {
        match patch {
            AnyPatch::CasioCz(tone) => Some(tone),
            _ => None,
        }
    }
}

fn location_byte(location: PatchLocation) -> Result<u8, CodecError> {
    let numbers = if location.bank == 12 { 4 } else { 8 };
    if (location.bank as usize) < BANKS.len() && location.number < numbers {
        Ok(location.bank * 8 + location.number)
    } else {
        Err(CodecError::InvalidLocation {
            bank: location.bank,
            number: location.number,
        })
    }
}

fn vibrato_wave_to_sysex(wave: u8) -> u8 {
    match wave {
        0 => 8,
        1 => 4,
        2 => 32,
        _ => 2,
    }
}

fn sysex_to_vibrato_wave(pvk: u8) -> Option<u8> {
    if pvk & 0x08 != 0 {
        Some(0)
    } else if pvk & 0x04 != 0 {
        Some(1)
    } else if pvk & 0x20 != 0 {
        Some(2)
    } else if pvk & 0x02 != 0 {
        Some(3)
    } else {
        None
    }
}

fn read_vibrato(r: &mut NibbleReader<'_>, vibrato: Vibrato, current: u8) -> Result<u8, CodecError> {
    let low = r.byte()?;
    let high = r.byte()?;
    let medium = r.byte()?;
    Ok(match vibrato.from_sysex(low, high, medium) {
        Some(value) => value,
        None => {
            log::warn!(
                "Casio CZ: unknown vibrato {:?} encoding {:02X} {:02X} {:02X}",
                vibrato,
                high,
                medium,
                low
            );
            current
        }
    })
}

/// Codec for every CZ layout.
#[derive(Debug, Clone, Copy)]
pub struct CasioCz {
    channel: Channel,
    model: CzModel,
}

impl CasioCz {
    /// Codec for `model`; requests are phrased for that model
    pub fn new(config: CodecConfig, model: CzModel) -> Self {
        Self {
            channel: config.channel,
            model,
        }
    }

    fn unpack(data: &[u8], model: CzModel, pos: usize) -> Result<CzTone, CodecError> {
        let mut tone = CzTone {
            model,
            ..CzTone::default()
        };
        let mut r = NibbleReader::new(data, pos);

        let pflag = r.byte()?;
        tone.line_select = pflag & 3;
        tone.octave = (pflag >> 2) & 3;

        let pds = r.byte()?;
        tone.fine = transform::sysex_to_fine(r.byte()?);
        let detune = (r.byte()? & 0x7F) as i8;
        tone.detune = if pds == 0 { detune } else { -detune };

        let pvk = r.byte()?;
        if let Some(wave) = sysex_to_vibrato_wave(pvk) {
            tone.vibrato_wave = wave;
        }
        tone.vibrato_delay = read_vibrato(&mut r, Vibrato::Delay, tone.vibrato_delay)?;
        tone.vibrato_rate = read_vibrato(&mut r, Vibrato::Rate, tone.vibrato_rate)?;
        tone.vibrato_depth = read_vibrato(&mut r, Vibrato::Depth, tone.vibrato_depth)?;

        for (i, line) in tone.lines.iter_mut().enumerate() {
            // high byte first, whatever the CZ-1 manual says
            let high = r.byte()? as u16;
            let low = r.byte()? as u16;
            let mfw = (high << 8) | low;
            if i == 0 {
                tone.modulation = ((mfw >> 3) & 7) as u8;
                tone.mute_line1 = (mfw >> 2) & 1 == 1;
            }
            line.window = ((mfw >> 6) & 7) as u8;
            line.waveform2 = ((mfw >> 10) & 7) as u8;
            line.waveform2_on = (mfw >> 9) & 1 == 1;
            line.waveform1 = ((mfw >> 13) & 7) as u8;

            let mamd = r.byte()?;
            let _mamv = r.byte()?;
            line.dca_key_follow = mamd & 0x0F;
            line.main_level = match model {
                CzModel::Cz1 => transform::sysex_to_dca_main_level(mamd >> 4),
                CzModel::Cz101 => 15,
            };

            // both models agree in the low nibble
            let mwmd = r.byte()?;
            let _mwmv = r.byte()?;
            line.dcw_key_follow = mwmd & 0x0F;

            line.dca = Envelope::read(Stage::Dca, model, &mut r)?;
            line.dcw = Envelope::read(Stage::Dcw, model, &mut r)?;
            line.dco = Envelope::read(Stage::Dco, model, &mut r)?;
        }

        if model == CzModel::Cz1 {
            let mut name = [0u8; NAME_LENGTH];
            for c in name.iter_mut() {
                *c = r.byte()?;
            }
            tone.name = crate::name::from_bytes(&name);
        }

        Ok(tone)
    }

    fn pack(&self, tone: &CzTone, location: u8) -> Vec<u8> {
        let model = tone.model;
        let mut w = NibbleWriter::with_header(&[
            SYSEX_START,
            CASIO_ID,
            0x00,
            0x00,
            0x70 | self.channel.get(),
            model.receive_opcode(),
            location,
        ]);

        w.push((tone.line_select & 3) | ((tone.octave & 3) << 2));
        w.push(if tone.detune >= 0 { 0 } else { 1 });
        w.push(transform::fine_to_sysex(tone.fine));
        w.push(tone.detune.unsigned_abs());
        w.push(vibrato_wave_to_sysex(tone.vibrato_wave));
        for (vibrato, value) in [
            (Vibrato::Delay, tone.vibrato_delay),
            (Vibrato::Rate, tone.vibrato_rate),
            (Vibrato::Depth, tone.vibrato_depth),
        ] {
            for b in vibrato.to_sysex(value) {
                w.push(b);
            }
        }

        for (i, line) in tone.lines.iter().enumerate() {
            let mut mfw = ((line.window as u16 & 7) << 6)
                | ((line.waveform2 as u16 & 7) << 10)
                | ((line.waveform2_on as u16) << 9)
                | ((line.waveform1 as u16 & 7) << 13);
            if i == 0 {
                mfw |= (tone.modulation as u16 & 7) << 3;
                mfw |= (tone.mute_line1 as u16) << 2;
            }
            w.push((mfw >> 8) as u8);
            w.push((mfw & 0xFF) as u8);

            let dca_kf = DCA_KEY_FOLLOW[line.dca_key_follow.min(9) as usize];
            let dcw_kf = line.dcw_key_follow.min(9) as usize;
            match model {
                CzModel::Cz1 => {
                    w.push(dca_kf[0] | (transform::dca_main_level_to_sysex(line.main_level) << 4));
                    w.push(dca_kf[1]);
                    w.push(DCW_KEY_FOLLOW_CZ1[dcw_kf][0]);
                    w.push(DCW_KEY_FOLLOW_CZ1[dcw_kf][1]);
                }
                CzModel::Cz101 => {
                    w.push(dca_kf[0]);
                    w.push(dca_kf[1]);
                    w.push(DCA_KEY_FOLLOW[dcw_kf][0]);
                    w.push(DCW_KEY_FOLLOW[dcw_kf][1]);
                }
            }

            line.dca.write(Stage::Dca, model, &mut w);
            line.dcw.write(Stage::Dcw, model, &mut w);
            line.dco.write(Stage::Dco, model, &mut w);
        }

        if model == CzModel::Cz1 {
            for b in crate::name::to_bytes(&tone.name, NAME_LENGTH) {
                w.push(b);
            }
        }

        let mut data = w.into_bytes();
        data.push(SYSEX_END);
        debug_assert_eq!(data.len(), 8 + model.block_size() * 2);
        data
    }
}

impl Codec for CasioCz {
    type Patch = CzTone;

    fn name(&self) -> &'static str {
        "Casio CZ"
    }

    fn recognize(&self, data: &[u8]) -> bool {
        let lengths = [
            HEADER_SIZE + 1 + CZ101_BLOCK * 2,
            HEADER_SIZE + 2 + CZ101_BLOCK * 2,
            HEADER_SIZE + 1 + CZ1_BLOCK * 2,
            HEADER_SIZE + 2 + CZ1_BLOCK * 2,
        ];
        lengths.contains(&data.len())
            && data[0] == SYSEX_START
            && data[1] == CASIO_ID
            && data[2] == 0x00
            && data[3] == 0x00
            && (0x70..=0x7F).contains(&data[4])
            && matches!(
                data[5],
                RECEIVE_REQUEST_CZ101 | RECEIVE_REQUEST_CZ1 | SEND_REQUEST
            )
    }

    fn parse(&self, data: &[u8]) -> ParseOutcome<CzTone> {
        // the CZ answers requests with chatter of other lengths
        let (model, pos) = match data.len() {
            n if n == HEADER_SIZE + 1 + CZ1_BLOCK * 2 => (CzModel::Cz1, 6),
            n if n == HEADER_SIZE + 2 + CZ1_BLOCK * 2 => (CzModel::Cz1, 7),
            n if n == HEADER_SIZE + 1 + CZ101_BLOCK * 2 => (CzModel::Cz101, 6),
            n if n == HEADER_SIZE + 2 + CZ101_BLOCK * 2 => (CzModel::Cz101, 7),
            n => {
                log::debug!("Casio CZ: ignoring {} byte message", n);
                return ParseOutcome::Cancelled;
            }
        };

        if data[1] != CASIO_ID {
            return ParseOutcome::Failed(CodecError::BadHeader { device: "Casio CZ" });
        }

        let location = if pos == 7 && data[6] <= HIGHEST_LOCATION {
            Some(PatchLocation::new(data[6] / 8, data[6] % 8))
        } else {
            None
        };

        match Self::unpack(data, model, pos) {
            Ok(mut tone) => {
                tone.location = location;
                tone.revise();
                ParseOutcome::Succeeded(tone)
            }
            Err(err) => ParseOutcome::Failed(err),
        }
    }

    fn emit(&self, tone: &CzTone, target: Target) -> Result<Emission, CodecError> {
        let location = match target.location() {
            Some(location) => location_byte(location)?,
            None => EDIT_BUFFER_LOCATION,
        };
        let data = self.pack(tone, location);

        if target.is_file() {
            return Ok(Emission::single(data));
        }

        // the CZ drops bytes unless the header arrives on its own
        let (header, payload) = data.split_at(HEADER_SIZE + 1);
        Ok(Emission::new()
            .sysex(header.to_vec())
            .pause(MIDI_PAUSE)
            .sysex(payload.to_vec()))
    }

    fn request_dump(&self, location: Option<PatchLocation>) -> Emission {
        let chan = 0x70 | self.channel.get();
        let location = location
            .and_then(|loc| location_byte(loc).ok())
            .unwrap_or(EDIT_BUFFER_LOCATION);
        Emission::new()
            .sysex(vec![
                SYSEX_START,
                CASIO_ID,
                0x00,
                0x00,
                chan,
                self.model.send_opcode(),
                location,
            ])
            .pause(MIDI_PAUSE)
            .sysex(vec![chan, 0x31])
            .pause(MIDI_PAUSE)
    }

    fn location_name(&self, location: PatchLocation) -> String {
        let bank = BANKS.get(location.bank as usize).copied().unwrap_or("?");
        format!("{}{}", bank, location.number + 1)
    }

    fn next_location(&self, location: PatchLocation) -> PatchLocation {
        let mut bank = location.bank;
        let mut number = location.number + 1;
        if number >= 8 || (number >= 4 && bank == 12) {
            bank += 1;
            number = 0;
            if bank >= 12 {
                bank = 0;
            }
        }
        PatchLocation::new(bank, number)
    }
}
