//! Korg 7-in-8 packing.
//!
//! Each group of up to seven data bytes travels behind a byte whose bit `x`
//! carries bit 7 of data byte `x`.

/// Pack 8-bit data into 7-bit sysex bytes.
pub fn pack_7bit(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(packed_len(data.len()));
    for group in data.chunks(7) {
        let msbs = group
            .iter()
            .enumerate()
            .fold(0u8, |acc, (x, &b)| acc | ((b >> 7) << x));
        out.push(msbs);
        out.extend(group.iter().map(|b| b & 0x7F));
    }
    out
}

/// Unpack 7-bit sysex bytes starting at `offset` back into 8-bit data. The
/// last byte of `data` is the closing `F7` and is not decoded.
pub fn unpack_8bit(data: &[u8], offset: usize) -> Vec<u8> {
    let end = data.len().saturating_sub(1);
    if offset >= end {
        return Vec::new();
    }

    let mut out = Vec::with_capacity(unpacked_len(end - offset));
    for group in data[offset..end].chunks(8) {
        let msbs = group[0];
        for (x, &b) in group[1..].iter().enumerate() {
            out.push((b & 0x7F) | (((msbs >> x) & 1) << 7));
        }
    }
    out
}

/// Packed size of `len` data bytes
pub fn packed_len(len: usize) -> usize {
    let rem = len % 7;
    len / 7 * 8 + if rem > 0 { rem + 1 } else { 0 }
}

/// Data bytes held by `len` packed bytes
pub fn unpacked_len(len: usize) -> usize {
    let rem = len % 8;
    len / 8 * 7 + rem.saturating_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let data: Vec<u8> = (0..254).map(|i| (i * 37 % 256) as u8).collect();
        let mut packed = pack_7bit(&data);
        assert_eq!(packed.len(), 291);
        assert!(packed.iter().all(|&b| b < 0x80));

        packed.push(0xF7);
        assert_eq!(unpack_8bit(&packed, 0), data);
    }

    #[test]
    fn test_msb_byte_layout() {
        assert_eq!(pack_7bit(&[0x80, 0x01, 0xFF]), vec![0b101, 0x00, 0x01, 0x7F]);
        assert_eq!(unpack_8bit(&[0xF0, 0b101, 0x00, 0x01, 0x7F, 0xF7], 1), vec![0x80, 0x01, 0xFF]);
    }

    #[test]
    fn test_lengths() {
        assert_eq!(packed_len(254), 291);
        assert_eq!(unpacked_len(291), 254);
        assert_eq!(packed_len(7), 8);
        assert_eq!(unpacked_len(8), 7);
    }

    #[test]
    fn test_short_input_does_not_panic() {
        assert!(unpack_8bit(&[], 0).is_empty());
        assert!(unpack_8bit(&[0xF7], 0).is_empty());
        assert!(unpack_8bit(&[0x01, 0xF7], 5).is_empty());
        assert!(unpack_8bit(&[0x01, 0xF7], 0).is_empty());
    }
}
