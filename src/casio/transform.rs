//! Value transforms between front panel values and CZ sysex bytes.
//!
//! Every `*_to_sysex` has an exact inverse over the front panel range. The
//! DCA level offset of 28 and the detune step skipping come from listening to
//! the hardware; the published tables disagree with it.

use super::tables::{VIBRATO_DELAY, VIBRATO_DEPTH, VIBRATO_RATE};

/// DCA key follow, `[low, high]` per setting
pub const DCA_KEY_FOLLOW: [[u8; 2]; 10] = [
    [0x00, 0x00],
    [0x01, 0x08],
    [0x02, 0x11],
    [0x03, 0x1A],
    [0x04, 0x24],
    [0x05, 0x2F],
    [0x06, 0x3A],
    [0x07, 0x45],
    [0x08, 0x52],
    [0x09, 0x5F],
];

/// DCW key follow for the CZ-101 family; the low byte comes from
/// [`DCA_KEY_FOLLOW`]
pub const DCW_KEY_FOLLOW: [[u8; 2]; 10] = [
    [0x00, 0x00],
    [0x01, 0x1F],
    [0x02, 0x2C],
    [0x03, 0x39],
    [0x04, 0x46],
    [0x05, 0x53],
    [0x06, 0x60],
    [0x07, 0x6E],
    [0x08, 0x92],
    [0x09, 0xFF],
];

/// DCW key follow for the CZ-1
pub const DCW_KEY_FOLLOW_CZ1: [[u8; 2]; 10] = [
    [0x00, 0x00],
    [0x01, 0x19],
    [0x02, 0x33],
    [0x03, 0x4E],
    [0x04, 0x6A],
    [0x05, 0x86],
    [0x06, 0xA3],
    [0x07, 0xC1],
    [0x08, 0xDF],
    [0x09, 0xFF],
];

/// Which vibrato curve a triple belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vibrato {
    /// Delay time
    Delay,
    /// Rate
    Rate,
    /// Depth
    Depth,
}

impl Vibrato {
    fn table(self) -> &'static [[u8; 3]; 100] {
        match self {
            Vibrato::Delay => &VIBRATO_DELAY,
            Vibrato::Rate => &VIBRATO_RATE,
            Vibrato::Depth => &VIBRATO_DEPTH,
        }
    }

    /// Bytes for `value` (0-99) in transmission order: low, high, medium.
    pub fn to_sysex(self, value: u8) -> [u8; 3] {
        let [low, medium, high] = self.table()[value.min(99) as usize];
        [low, high, medium]
    }

    /// Value for received bytes, `None` for an encoding the table lacks.
    pub fn from_sysex(self, low: u8, high: u8, medium: u8) -> Option<u8> {
        self.table()
            .iter()
            .position(|&entry| entry == [low, medium, high])
            .map(|i| i as u8)
    }
}

/// Master level 1-15 to the inverted nibble.
pub fn dca_main_level_to_sysex(level: u8) -> u8 {
    15 - level.min(15)
}

/// Inverted nibble to master level.
pub fn sysex_to_dca_main_level(value: u8) -> u8 {
    15 - value.min(15)
}

/// DCO rate, 0-99
pub fn dco_rate_to_sysex(rate: u8) -> u8 {
    (rate as u16 * 127 / 99) as u8
}

/// Inverse of [`dco_rate_to_sysex`]
pub fn sysex_to_dco_rate(value: u8) -> u8 {
    match value {
        0 => 0,
        127 => 99,
        v => (v as u16 * 99 / 127 + 1) as u8,
    }
}

/// DCO level, 0-123. The device skips 64-67.
pub fn dco_level_to_sysex(level: u8) -> u8 {
    if level > 63 {
        level + 4
    } else {
        level
    }
}

/// Inverse of [`dco_level_to_sysex`]
pub fn sysex_to_dco_level(value: u8) -> u8 {
    if value > 63 {
        value - 4
    } else {
        value
    }
}

/// DCW rate, 0-99
pub fn dcw_rate_to_sysex(rate: u8) -> u8 {
    (rate as u16 * 119 / 99 + 8) as u8
}

/// Inverse of [`dcw_rate_to_sysex`]
pub fn sysex_to_dcw_rate(value: u8) -> u8 {
    match value {
        0..=8 => 0,
        127 => 99,
        v => ((v as u16 - 8) * 99 / 119 + 1) as u8,
    }
}

/// DCW level, 0-99. Same curve as the DCO rate.
pub fn dcw_level_to_sysex(level: u8) -> u8 {
    dco_rate_to_sysex(level)
}

/// Inverse of [`dcw_level_to_sysex`]
pub fn sysex_to_dcw_level(value: u8) -> u8 {
    sysex_to_dco_rate(value)
}

/// DCA rate, 0-106
pub fn dca_rate_to_sysex(rate: u8) -> u8 {
    (rate as u16 * 119 / 99) as u8
}

/// Inverse of [`dca_rate_to_sysex`]
pub fn sysex_to_dca_rate(value: u8) -> u8 {
    match value {
        0 => 0,
        119 => 99,
        v => (v as u16 * 99 / 119 + 1) as u8,
    }
}

/// DCA level, 0-99: zero stays zero, everything else is offset by 28.
pub fn dca_level_to_sysex(level: u8) -> u8 {
    if level == 0 {
        0
    } else {
        level + 28
    }
}

/// Inverse of [`dca_level_to_sysex`]
pub fn sysex_to_dca_level(value: u8) -> u8 {
    value.saturating_sub(28)
}

/// Fine detune 0-60 to the PDETL byte. The device skips one step after
/// 15, 30 and 45.
pub fn fine_to_sysex(fine: u8) -> u8 {
    let skipped = match fine {
        46.. => fine + 3,
        31.. => fine + 2,
        16.. => fine + 1,
        _ => fine,
    };
    skipped << 2
}

/// Inverse of [`fine_to_sysex`]
pub fn sysex_to_fine(value: u8) -> u8 {
    let fine = value >> 2;
    match fine {
        49.. => fine - 3,
        33.. => fine - 2,
        17.. => fine - 1,
        _ => fine,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_inverse(max: u8, to: fn(u8) -> u8, from: fn(u8) -> u8) {
        for v in 0..=max {
            assert_eq!(from(to(v)), v, "value {}", v);
        }
    }

    #[test]
    fn test_envelope_transforms_invert() {
        assert_inverse(99, dco_rate_to_sysex, sysex_to_dco_rate);
        assert_inverse(123, dco_level_to_sysex, sysex_to_dco_level);
        assert_inverse(99, dcw_rate_to_sysex, sysex_to_dcw_rate);
        assert_inverse(99, dcw_level_to_sysex, sysex_to_dcw_level);
        assert_inverse(106, dca_rate_to_sysex, sysex_to_dca_rate);
        assert_inverse(99, dca_level_to_sysex, sysex_to_dca_level);
        assert_inverse(60, fine_to_sysex, sysex_to_fine);
    }

    #[test]
    fn test_transforms_stay_in_seven_bits() {
        assert_eq!(dco_level_to_sysex(123), 127);
        assert_eq!(dca_rate_to_sysex(106), 127);
        assert_eq!(dca_level_to_sysex(99), 127);
        assert_eq!(dcw_rate_to_sysex(99), 127);
        assert_eq!(dca_level_to_sysex(0), 0);
        assert_eq!(dca_level_to_sysex(1), 29);
    }

    #[test]
    fn test_main_level() {
        for level in 1..=15 {
            assert_eq!(sysex_to_dca_main_level(dca_main_level_to_sysex(level)), level);
        }
        assert_eq!(dca_main_level_to_sysex(15), 0);
    }

    #[test]
    fn test_vibrato_tables_invert() {
        for vibrato in [Vibrato::Delay, Vibrato::Rate, Vibrato::Depth] {
            for v in 0..100 {
                let [low, high, medium] = vibrato.to_sysex(v);
                assert_eq!(vibrato.from_sysex(low, high, medium), Some(v));
            }
        }
    }

    #[test]
    fn test_vibrato_odd_entries() {
        assert_eq!(Vibrato::Delay.to_sysex(87), [0x67, 0x7F, 0x01]);
        assert_eq!(Vibrato::Rate.to_sysex(7), [0x07, 0x00, 0x00]);
        assert_eq!(Vibrato::Depth.to_sysex(99), [0x63, 0x00, 0x03]);
        assert_eq!(Vibrato::Depth.from_sysex(0x63, 0x00, 0x04), None);
    }
}
