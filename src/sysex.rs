//! Sysex framing and the byte helpers shared by every codec.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::error::CodecError;

/// Start of a system exclusive message
pub const SYSEX_START: u8 = 0xF0;
/// End of a system exclusive message
pub const SYSEX_END: u8 = 0xF7;

/// Alesis manufacturer id, including the leading `F0`
pub const ALESIS_ID: [u8; 4] = [SYSEX_START, 0x00, 0x00, 0x0E];
/// Casio manufacturer id
pub const CASIO_ID: u8 = 0x44;
/// Oberheim manufacturer id
pub const OBERHEIM_ID: u8 = 0x10;
/// Korg manufacturer id
pub const KORG_ID: u8 = 0x42;
/// Yamaha manufacturer id
pub const YAMAHA_ID: u8 = 0x43;

/// Read a `.syx` file and split it into its messages.
pub fn read_sysex_file<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<u8>>> {
    let path = path.as_ref();
    let data = fs::read(path)
        .with_context(|| format!("Failed to read SYSEX file '{}'", path.display()))?;

    let messages = split_messages(&data)
        .with_context(|| format!("Failed to split SYSEX file '{}'", path.display()))?;

    log::debug!(
        "SYSEX: {} message(s) in {} bytes from '{}'",
        messages.len(),
        data.len(),
        path.display()
    );

    Ok(messages.into_iter().map(<[u8]>::to_vec).collect())
}

/// Iterator over the `F0 .. F7` frames of a byte stream.
///
/// Bytes outside of frames are skipped. A frame that never closes yields
/// one `Unterminated` error and ends the iteration.
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> Frames<'a> {
    /// Scan `data` from the start
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = Result<&'a [u8], CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = self.data.get(self.offset..)?;
        let start = self.offset + rest.iter().position(|&b| b == SYSEX_START)?;
        let frame = &self.data[start..];

        match frame.iter().position(|&b| b == SYSEX_END) {
            Some(end) => {
                self.offset = start + end + 1;
                Some(Ok(&frame[..=end]))
            }
            None => {
                self.offset = self.data.len();
                Some(Err(CodecError::Unterminated(start)))
            }
        }
    }
}

/// Split a byte stream into `F0 .. F7` frames.
///
/// Running off the end inside a frame is an error, since a truncated dump
/// would otherwise be handed to a parser.
pub fn split_messages(data: &[u8]) -> Result<Vec<&[u8]>, CodecError> {
    let messages = Frames::new(data).collect::<Result<Vec<_>, _>>()?;
    if messages.is_empty() {
        return Err(CodecError::Empty);
    }
    Ok(messages)
}

/// 7-bit running sum of a payload region.
pub fn checksum7(data: &[u8]) -> u8 {
    (data.iter().map(|&b| b as u32).sum::<u32>() & 0x7F) as u8
}

/// True when `data` is long enough and starts with `prefix`.
pub fn has_prefix(data: &[u8], prefix: &[u8]) -> bool {
    data.len() >= prefix.len() && &data[..prefix.len()] == prefix
}

/// Space separated upper case hex, for logs and the CLI.
pub fn hex(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Writes logical bytes as nibble pairs, low nibble first.
#[derive(Debug, Default)]
pub struct NibbleWriter {
    out: Vec<u8>,
}

impl NibbleWriter {
    /// Start an empty payload
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a payload behind an existing header
    pub fn with_header(header: &[u8]) -> Self {
        Self {
            out: header.to_vec(),
        }
    }

    /// Append one logical byte as two data bytes
    pub fn push(&mut self, value: u8) {
        self.out.push(value & 0x0F);
        self.out.push(value >> 4);
    }

    /// Append raw bytes without splitting them
    pub fn push_raw(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }

    /// Number of bytes written so far
    pub fn len(&self) -> usize {
        self.out.len()
    }

    /// True before anything was written
    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Finish the payload
    pub fn into_bytes(self) -> Vec<u8> {
        self.out
    }
}

/// Reads nibble pairs back into logical bytes.
#[derive(Debug)]
pub struct NibbleReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> NibbleReader<'a> {
    /// Start reading at `pos`
    pub fn new(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    /// Next logical byte; a pair that runs past the end is an error.
    pub fn byte(&mut self) -> Result<u8, CodecError> {
        match (self.data.get(self.pos), self.data.get(self.pos + 1)) {
            (Some(&lo), Some(&hi)) => {
                self.pos += 2;
                Ok((lo & 0x0F) | ((hi & 0x0F) << 4))
            }
            _ => Err(CodecError::Truncated(self.pos)),
        }
    }

    /// Offset of the next unread data byte
    pub fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_data() {
        assert_eq!(split_messages(&[]), Err(CodecError::Empty));
        assert_eq!(split_messages(&[0x00, 0x01]), Err(CodecError::Empty));
    }

    #[test]
    fn test_split_skips_garbage() {
        let data = [0x00, 0xF0, 0x43, 0xF7, 0x12, 0xF0, 0x44, 0x45, 0xF7];
        let messages = split_messages(&data).unwrap();
        assert_eq!(messages, vec![&data[1..4], &data[5..9]]);
    }

    #[test]
    fn test_unterminated() {
        let data = [0xF0, 0x43, 0xF7, 0xF0, 0x10, 0x06];
        assert_eq!(split_messages(&data), Err(CodecError::Unterminated(3)));
    }

    #[test]
    fn test_frames_stop_after_unterminated() {
        let data = [0xF7, 0xF0, 0x7E, 0xF7, 0xF0, 0x01];
        let mut frames = Frames::new(&data);
        assert_eq!(frames.next(), Some(Ok(&data[1..4])));
        assert_eq!(frames.next(), Some(Err(CodecError::Unterminated(4))));
        assert_eq!(frames.next(), None);

        let trailing = [0xF0, 0xF7, 0x00, 0x00];
        assert_eq!(Frames::new(&trailing).count(), 1);
    }

    #[test]
    fn test_nibbles() {
        let mut writer = NibbleWriter::with_header(&[SYSEX_START]);
        for b in 0..=255u8 {
            writer.push(b);
        }
        let bytes = writer.into_bytes();
        assert_eq!(bytes.len(), 1 + 512);
        assert!(bytes[1..].iter().all(|&b| b < 16));

        let mut reader = NibbleReader::new(&bytes, 1);
        for b in 0..=255u8 {
            assert_eq!(reader.byte().unwrap(), b);
        }
        assert_eq!(reader.byte(), Err(CodecError::Truncated(513)));
    }

    #[test]
    fn test_checksum() {
        assert_eq!(checksum7(&[]), 0);
        assert_eq!(checksum7(&[0x7F, 0x01]), 0);
        assert_eq!(checksum7(&[0x40, 0x40, 0x05]), 0x05);
    }

    #[test]
    fn test_hex() {
        assert_eq!(hex(&[0xF0, 0x0A, 0xF7]), "F0 0A F7");
    }
}
