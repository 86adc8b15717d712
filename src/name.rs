//! Patch name normalization

/// Replace anything outside printable 7-bit ASCII with a space.
pub fn printable(name: &str) -> String {
    name.chars()
        .map(|c| if (c as u32) < 32 || (c as u32) > 127 { ' ' } else { c })
        .collect()
}

/// Truncate to `width` characters.
pub fn truncate(name: &str, width: usize) -> String {
    name.chars().take(width).collect()
}

/// Truncate or right-pad with spaces to exactly `width` characters.
pub fn fit(name: &str, width: usize) -> String {
    format!("{:<width$}", truncate(name, width), width = width)
}

/// Decode a fixed width name field. Bytes above 127 become spaces.
pub fn from_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|&b| if b < 32 || b > 127 { ' ' } else { char::from(b) })
        .collect()
}

/// Encode a name into a fixed width field, padding with spaces.
pub fn to_bytes(name: &str, width: usize) -> Vec<u8> {
    let mut out: Vec<u8> = name
        .chars()
        .take(width)
        .map(|c| if c.is_ascii() { c as u8 } else { b' ' })
        .collect();
    out.resize(width, b' ');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_printable() {
        assert_eq!(printable("AB\u{7}C\u{e9}"), "AB C ");
    }

    #[test]
    fn test_fit() {
        assert_eq!(fit("KICK", 6), "KICK  ");
        assert_eq!(fit("SNARE DRUM", 5), "SNARE");
    }

    #[test]
    fn test_bytes() {
        assert_eq!(from_bytes(&[b'A', 0x80, 0x1F, b'z']), "A  z");
        assert_eq!(to_bytes("HI\u{e9}", 4), vec![b'H', b'I', b' ', b' ']);
    }
}
