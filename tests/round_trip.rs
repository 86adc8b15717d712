use pretty_assertions::assert_eq;

use synthsyx::sysex::SYSEX_END;
use synthsyx::{Family, Packet, ParseOutcome, PatchLocation, Target};

mod common;
use common::{file_target, registry, sample_patches};

#[test]
fn parse_of_emit_is_a_fixed_point() {
    let registry = registry();
    for patch in sample_patches() {
        let target = file_target(&patch);
        let bytes = registry.emit(&patch, target).unwrap().to_bytes();
        let first = registry.parse(&bytes).ok().unwrap();
        assert_eq!(first.family(), patch.family());

        let again = registry.emit(&first, target).unwrap().to_bytes();
        assert_eq!(again, bytes, "{} dump changed on re-emit", patch.family());
        assert_eq!(registry.parse(&again).ok(), Some(first));
    }
}

#[test]
fn typed_fields_survive_the_wire() {
    let registry = registry();
    for patch in sample_patches() {
        let bytes = registry.emit(&patch, file_target(&patch)).unwrap().to_bytes();
        let parsed = registry.parse(&bytes).ok().unwrap();
        match patch.family() {
            // envelope tables are lossy, so only the header fields are exact
            Family::CasioCz => {
                assert_eq!(parsed.name(), patch.name());
                assert_eq!(parsed.location(), patch.location());
            }
            _ => assert_eq!(parsed, patch),
        }
    }
}

#[test]
fn every_dump_is_framed() {
    let registry = registry();
    for patch in sample_patches() {
        let emission = registry.emit(&patch, Target::EditBuffer).unwrap();
        let bytes = emission.to_bytes();
        assert_eq!(bytes.first(), Some(&0xF0));
        assert_eq!(bytes.last(), Some(&SYSEX_END));
        for message in emission.sysex_messages() {
            assert!(message.iter().skip(1).take(message.len() - 2).all(|&b| b < 0x80));
        }
    }
}

#[test]
fn store_sequences_keep_their_pauses() {
    let registry = registry();
    let matrix = sample_patches()
        .into_iter()
        .find(|p| p.family() == Family::Matrix1000)
        .unwrap();
    let emission = registry
        .emit(&matrix, Target::Store(PatchLocation::new(4, 17)))
        .unwrap();
    let pauses = emission
        .packets()
        .iter()
        .filter(|p| matches!(p, Packet::Pause(_)))
        .count();
    assert_eq!(pauses, 2);
    assert!(matches!(emission.packets().last(), Some(Packet::Sysex(_))));
}

#[test]
fn truncated_dumps_fail_or_cancel_without_panicking() {
    let registry = registry();
    for patch in sample_patches() {
        let bytes = registry.emit(&patch, file_target(&patch)).unwrap().to_bytes();
        for len in [0, 1, 5, bytes.len() / 2] {
            let outcome = registry.parse(&bytes[..len]);
            assert!(!matches!(outcome, ParseOutcome::Succeeded(_)));
        }
    }
}
