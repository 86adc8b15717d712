#![allow(dead_code)]

use std::io::Write;

use tempfile::NamedTempFile;

use synthsyx::alesis::DrumKit;
use synthsyx::casio::{CzModel, CzTone};
use synthsyx::korg::{MicroKorgProgram, VocoderProgram, VoiceMode};
use synthsyx::oberheim::{GlobalParameters, Matrix1000Patch, Param};
use synthsyx::yamaha::{Dx7Bank, Dx7Voice};
use synthsyx::{AnyPatch, CodecConfig, Patch, PatchLocation, Registry, Target};

pub fn registry() -> Registry {
    Registry::new(CodecConfig::default())
}

/// One patch per family, with a few fields moved off their defaults.
pub fn sample_patches() -> Vec<AnyPatch> {
    let mut kit = DrumKit {
        name: "ROCK KIT".to_string(),
        location: Some(PatchLocation::new(0, 5)),
        ..Default::default()
    };
    kit.drums[12].volume = 80;
    kit.drums[12].pan = 2;

    let tone = CzTone {
        model: CzModel::Cz1,
        name: "SOFT PAD".to_string(),
        location: Some(PatchLocation::new(2, 5)),
        ..Default::default()
    };

    let mut matrix = Matrix1000Patch::default();
    matrix.name = "BRS4 BIG".to_string();
    matrix.location = Some(PatchLocation::new(4, 17));
    matrix.set(Param::VcfFrequency, 77);

    let program = MicroKorgProgram {
        name: "Dirty Bass".to_string(),
        voice_mode: VoiceMode::Single,
        ..Default::default()
    };

    let mut vocoder = VocoderProgram::default();
    vocoder.channels[3].level = 90;

    let mut voice = Dx7Voice {
        name: "TUB BELLS".to_string(),
        algorithm: 4,
        feedback: 7,
        ..Default::default()
    };
    voice.op[1].coarse = 3;

    let mut bank = Dx7Bank::default();
    bank.voices[0] = voice.clone();
    bank.voices[9].name = "STRINGS 2".to_string();

    let mut globals = GlobalParameters::default();
    globals.master_transpose = -5;
    globals.midi.basic_channel = 4;
    globals.groups[42] = false;

    let mut patches = vec![
        kit.into_any(),
        tone.into_any(),
        matrix.into_any(),
        program.into_any(),
        vocoder.into_any(),
        voice.into_any(),
        bank.into_any(),
        globals.into_any(),
    ];
    for patch in patches.iter_mut() {
        revise(patch);
    }
    patches
}

fn revise(patch: &mut AnyPatch) {
    match patch {
        AnyPatch::AlesisD4(p) => p.revise(),
        AnyPatch::CasioCz(p) => p.revise(),
        AnyPatch::Matrix1000(p) => p.revise(),
        AnyPatch::Matrix1000Global(p) => p.revise(),
        AnyPatch::MicroKorg(p) => p.revise(),
        AnyPatch::MicroKorgVocoder(p) => p.revise(),
        AnyPatch::Dx7(p) => p.revise(),
        AnyPatch::Dx7Bank(p) => p.revise(),
    }
}

/// The target whose dump carries the patch's own location.
pub fn file_target(patch: &AnyPatch) -> Target {
    Target::File(patch.location().unwrap_or_default())
}

pub fn write_syx(messages: &[Vec<u8>]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    for message in messages {
        file.write_all(message).unwrap();
    }
    file.flush().unwrap();
    file
}
