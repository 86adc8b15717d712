//! Every codec behind one lookup.
//!
//! Recognizers are mutually exclusive, so the first codec that accepts a
//! message is the only one that would.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::alesis::{AlesisD4, DeviceVariant, DrumKit};
use crate::casio::{CasioCz, CzModel, CzTone};
use crate::codec::{Codec, CodecConfig, Emission, ParseOutcome, Patch, PatchLocation, Target};
use crate::error::CodecError;
use crate::korg::{MicroKorg, MicroKorgProgram, MicroKorgVocoder, VocoderProgram};
use crate::oberheim::{GlobalParameters, Matrix1000, Matrix1000Global, Matrix1000Patch};
use crate::sysex::hex;
use crate::yamaha::{Dx7, Dx7Bank, Dx7Bulk, Dx7Voice};

/// A codec family, one per patch type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Family {
    /// Alesis D4 and DM5 drum kits
    AlesisD4,
    /// Casio CZ tones
    CasioCz,
    /// Oberheim Matrix 1000 patches
    #[serde(rename = "matrix-1000")]
    Matrix1000,
    /// Oberheim Matrix 1000 master parameters
    #[serde(rename = "matrix-1000-global")]
    Matrix1000Global,
    /// Korg MicroKorg synth programs
    #[serde(rename = "microkorg")]
    MicroKorg,
    /// Korg MicroKorg vocoder programs
    #[serde(rename = "microkorg-vocoder")]
    MicroKorgVocoder,
    /// Yamaha DX7 single voices
    Dx7,
    /// Yamaha DX7 32 voice banks
    Dx7Bank,
}

impl Family {
    /// Every family, in registry order
    pub const ALL: &'static [Family] = &[
        Family::AlesisD4,
        Family::CasioCz,
        Family::Matrix1000,
        Family::Matrix1000Global,
        Family::MicroKorg,
        Family::MicroKorgVocoder,
        Family::Dx7,
        Family::Dx7Bank,
    ];

    /// Command line name
    pub fn key(self) -> &'static str {
        match self {
            Family::AlesisD4 => "alesis-d4",
            Family::CasioCz => "casio-cz",
            Family::Matrix1000 => "matrix-1000",
            Family::Matrix1000Global => "matrix-1000-global",
            Family::MicroKorg => "microkorg",
            Family::MicroKorgVocoder => "microkorg-vocoder",
            Family::Dx7 => "dx7",
            Family::Dx7Bank => "dx7-bank",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Family {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Family::ALL
            .iter()
            .copied()
            .find(|family| family.key() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Family::ALL.iter().map(|f| f.key()).collect();
                format!("unknown family '{}', expected one of: {}", s, known.join(", "))
            })
    }
}

/// A patch of any family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "family", content = "patch", rename_all = "kebab-case")]
pub enum AnyPatch {
    /// A D4 or DM5 kit
    AlesisD4(DrumKit),
    /// A CZ tone
    CasioCz(CzTone),
    /// A Matrix 1000 patch
    #[serde(rename = "matrix-1000")]
    Matrix1000(Matrix1000Patch),
    /// Matrix 1000 master parameters
    #[serde(rename = "matrix-1000-global")]
    Matrix1000Global(GlobalParameters),
    /// A MicroKorg synth program
    #[serde(rename = "microkorg")]
    MicroKorg(MicroKorgProgram),
    /// A MicroKorg vocoder program
    #[serde(rename = "microkorg-vocoder")]
    MicroKorgVocoder(VocoderProgram),
    /// A DX7 voice
    Dx7(Dx7Voice),
    /// A DX7 bank
    Dx7Bank(Dx7Bank),
}

impl AnyPatch {
    /// Family owning this patch
    pub fn family(&self) -> Family {
        match self {
            AnyPatch::AlesisD4(_) => Family::AlesisD4,
            AnyPatch::CasioCz(_) => Family::CasioCz,
            AnyPatch::Matrix1000(_) => Family::Matrix1000,
            AnyPatch::Matrix1000Global(_) => Family::Matrix1000Global,
            AnyPatch::MicroKorg(_) => Family::MicroKorg,
            AnyPatch::MicroKorgVocoder(_) => Family::MicroKorgVocoder,
            AnyPatch::Dx7(_) => Family::Dx7,
            AnyPatch::Dx7Bank(_) => Family::Dx7Bank,
        }
    }

    /// Display name of the wrapped patch
    pub fn name(&self) -> String {
        match self {
            AnyPatch::AlesisD4(p) => p.name(),
            AnyPatch::CasioCz(p) => p.name(),
            AnyPatch::Matrix1000(p) => p.name(),
            AnyPatch::Matrix1000Global(p) => p.name(),
            AnyPatch::MicroKorg(p) => p.name(),
            AnyPatch::MicroKorgVocoder(p) => p.name(),
            AnyPatch::Dx7(p) => p.name(),
            AnyPatch::Dx7Bank(p) => p.name(),
        }
    }

    /// Stored location of the wrapped patch
    pub fn location(&self) -> Option<PatchLocation> {
        match self {
            AnyPatch::AlesisD4(p) => p.location(),
            AnyPatch::CasioCz(p) => p.location(),
            AnyPatch::Matrix1000(p) => p.location(),
            AnyPatch::Matrix1000Global(p) => p.location(),
            AnyPatch::MicroKorg(p) => p.location(),
            AnyPatch::MicroKorgVocoder(p) => p.location(),
            AnyPatch::Dx7(p) => p.location(),
            AnyPatch::Dx7Bank(p) => p.location(),
        }
    }
}

/// A codec with its patch type erased to [`AnyPatch`].
pub trait DynCodec {
    /// Family this codec serves
    fn family(&self) -> Family;

    /// Short human readable device name
    fn name(&self) -> &'static str;

    /// See [`Codec::recognize`]
    fn recognize(&self, data: &[u8]) -> bool;

    /// See [`Codec::parse`]
    fn parse(&self, data: &[u8]) -> ParseOutcome<AnyPatch>;

    /// See [`Codec::emit`]; a patch of another family is an error
    fn emit(&self, patch: &AnyPatch, target: Target) -> Result<Emission, CodecError>;

    /// See [`Codec::request_dump`]
    fn request_dump(&self, location: Option<PatchLocation>) -> Emission;

    /// See [`Codec::location_name`]
    fn location_name(&self, location: PatchLocation) -> String;

    /// See [`Codec::next_location`]
    fn next_location(&self, location: PatchLocation) -> PatchLocation;
}

struct Registered<C> {
    family: Family,
    codec: C,
}

impl<C: Codec> DynCodec for Registered<C> {
    fn family(&self) -> Family {
        self.family
    }

    fn name(&self) -> &'static str {
        self.codec.name()
    }

    fn recognize(&self, data: &[u8]) -> bool {
        self.codec.recognize(data)
    }

    fn parse(&self, data: &[u8]) -> ParseOutcome<AnyPatch> {
        self.codec.parse(data).map(Patch::into_any)
    }

    fn emit(&self, patch: &AnyPatch, target: Target) -> Result<Emission, CodecError> {
        let patch = C::Patch::from_any(patch).ok_or(CodecError::WrongFamily(self.codec.name()))?;
        self.codec.emit(patch, target)
    }

    fn request_dump(&self, location: Option<PatchLocation>) -> Emission {
        self.codec.request_dump(location)
    }

    fn location_name(&self, location: PatchLocation) -> String {
        self.codec.location_name(location)
    }

    fn next_location(&self, location: PatchLocation) -> PatchLocation {
        self.codec.next_location(location)
    }
}

fn register<C: Codec + 'static>(family: Family, codec: C) -> Box<dyn DynCodec> {
    Box::new(Registered { family, codec })
}

/// All codecs, built from one configuration.
pub struct Registry {
    codecs: Vec<Box<dyn DynCodec>>,
}

impl Registry {
    /// Registry talking to a D4 and a CZ-101 when requesting dumps
    pub fn new(config: CodecConfig) -> Self {
        Self::with_models(config, DeviceVariant::D4, CzModel::Cz101)
    }

    /// Registry whose Alesis and Casio requests address `variant` and `model`.
    /// Parsing accepts every model regardless.
    pub fn with_models(config: CodecConfig, variant: DeviceVariant, model: CzModel) -> Self {
        let codecs = vec![
            register(Family::AlesisD4, AlesisD4::new(config, variant)),
            register(Family::CasioCz, CasioCz::new(config, model)),
            register(Family::Matrix1000, Matrix1000::new(config)),
            register(Family::Matrix1000Global, Matrix1000Global::new(config)),
            register(Family::MicroKorg, MicroKorg::new(config)),
            register(Family::MicroKorgVocoder, MicroKorgVocoder::new(config)),
            register(Family::Dx7, Dx7::new(config)),
            register(Family::Dx7Bank, Dx7Bulk::new(config)),
        ];
        Self { codecs }
    }

    /// Every codec, in [`Family::ALL`] order
    pub fn codecs(&self) -> impl Iterator<Item = &dyn DynCodec> {
        self.codecs.iter().map(|c| c.as_ref())
    }

    /// The codec serving `family`
    pub fn codec(&self, family: Family) -> Option<&dyn DynCodec> {
        self.codecs().find(|c| c.family() == family)
    }

    /// The codec whose recognizer accepts `data`
    pub fn recognize(&self, data: &[u8]) -> Option<&dyn DynCodec> {
        self.codecs().find(|c| c.recognize(data))
    }

    /// Parse with the recognizing codec. Messages no codec claims are
    /// cancelled.
    pub fn parse(&self, data: &[u8]) -> ParseOutcome<AnyPatch> {
        match self.recognize(data) {
            Some(codec) => codec.parse(data),
            None => {
                log::debug!(
                    "no codec for {} byte message starting {}",
                    data.len(),
                    hex(&data[..data.len().min(6)])
                );
                ParseOutcome::Cancelled
            }
        }
    }

    /// Emit `patch` through the codec of its family
    pub fn emit(&self, patch: &AnyPatch, target: Target) -> Result<Emission, CodecError> {
        let family = patch.family();
        match self.codec(family) {
            Some(codec) => codec.emit(patch, target),
            None => Err(CodecError::WrongFamily(family.key())),
        }
    }

    /// Dump request for `family`
    pub fn request_dump(&self, family: Family, location: Option<PatchLocation>) -> Emission {
        self.codec(family)
            .map(|codec| codec.request_dump(location))
            .unwrap_or_default()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(CodecConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::korg::VoiceMode;

    fn samples() -> Vec<AnyPatch> {
        vec![
            DrumKit::default().into_any(),
            CzTone::default().into_any(),
            Matrix1000Patch::default().into_any(),
            GlobalParameters::default().into_any(),
            MicroKorgProgram::default().into_any(),
            VocoderProgram::default().into_any(),
            Dx7Voice::default().into_any(),
            Dx7Bank::default().into_any(),
        ]
    }

    #[test]
    fn test_family_keys() {
        for &family in Family::ALL {
            assert_eq!(family.key().parse::<Family>(), Ok(family));
            assert_eq!(
                serde_json::to_value(family).unwrap(),
                serde_json::Value::from(family.key())
            );
        }
        assert!("tx81z".parse::<Family>().is_err());
    }

    #[test]
    fn test_exactly_one_codec_recognizes_each_dump() {
        let registry = Registry::default();
        for patch in samples() {
            let bytes = registry
                .emit(&patch, Target::File(PatchLocation::new(0, 1)))
                .unwrap()
                .to_bytes();
            let claimed: Vec<Family> = registry
                .codecs()
                .filter(|c| c.recognize(&bytes))
                .map(|c| c.family())
                .collect();
            assert_eq!(claimed, vec![patch.family()]);
        }
    }

    #[test]
    fn test_parse_dispatches() {
        let registry = Registry::default();
        let mut program = MicroKorgProgram::default();
        program.voice_mode = VoiceMode::Layer;
        let patch = program.into_any();
        let bytes = registry.emit(&patch, Target::EditBuffer).unwrap().to_bytes();
        let parsed = registry.parse(&bytes).ok().unwrap();
        assert_eq!(parsed.family(), Family::MicroKorg);
        assert_eq!(parsed.name(), "Init");
    }

    #[test]
    fn test_unknown_is_cancelled() {
        let registry = Registry::default();
        assert!(registry.parse(&[0xF0, 0x7E, 0x00, 0x06, 0x01, 0xF7]).is_cancelled());
        assert!(registry.parse(&[]).is_cancelled());
    }

    #[test]
    fn test_wrong_family() {
        let registry = Registry::default();
        let codec = registry.codec(Family::Dx7).unwrap();
        let patch = Matrix1000Patch::default().into_any();
        assert_eq!(
            codec.emit(&patch, Target::EditBuffer),
            Err(CodecError::WrongFamily("Yamaha DX7"))
        );
    }
}
