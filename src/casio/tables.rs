//! Vibrato encodings observed on the hardware.
//!
//! Entry `i` holds the `[low, medium, high]` bytes sent for logical value `i`.
//! The curves are not monotonic in any single byte, so lookups go through
//! the whole triple.

/// Vibrato delay time. Entry 87 really does start with `0x67`.
pub const VIBRATO_DELAY: [[u8; 3]; 100] = [
    [0x00, 0x00, 0x00], [0x01, 0x00, 0x01], [0x02, 0x00, 0x02], [0x03, 0x00, 0x03],
    [0x04, 0x00, 0x04], [0x05, 0x00, 0x05], [0x06, 0x00, 0x06], [0x07, 0x00, 0x07],
    [0x08, 0x00, 0x08], [0x09, 0x00, 0x09], [0x0A, 0x00, 0x0A], [0x0B, 0x00, 0x0B],
    [0x0C, 0x00, 0x0C], [0x0D, 0x00, 0x0D], [0x0E, 0x00, 0x0E], [0x0F, 0x00, 0x0F],
    [0x10, 0x00, 0x10], [0x11, 0x00, 0x11], [0x12, 0x00, 0x12], [0x13, 0x00, 0x13],
    [0x14, 0x00, 0x14], [0x15, 0x00, 0x15], [0x16, 0x00, 0x16], [0x17, 0x00, 0x17],
    [0x18, 0x00, 0x18], [0x19, 0x00, 0x19], [0x1A, 0x00, 0x1A], [0x1B, 0x00, 0x1B],
    [0x1C, 0x00, 0x1C], [0x1D, 0x00, 0x1D], [0x1E, 0x00, 0x1E], [0x1F, 0x00, 0x1F],
    [0x20, 0x00, 0x21], [0x21, 0x00, 0x23], [0x22, 0x00, 0x25], [0x23, 0x00, 0x27],
    [0x24, 0x00, 0x29], [0x25, 0x00, 0x2B], [0x26, 0x00, 0x2D], [0x27, 0x00, 0x2F],
    [0x28, 0x00, 0x31], [0x29, 0x00, 0x33], [0x2A, 0x00, 0x35], [0x2B, 0x00, 0x37],
    [0x2C, 0x00, 0x39], [0x2D, 0x00, 0x3B], [0x2E, 0x00, 0x3D], [0x2F, 0x00, 0x3F],
    [0x30, 0x00, 0x43], [0x31, 0x00, 0x47], [0x32, 0x00, 0x4B], [0x33, 0x00, 0x4F],
    [0x34, 0x00, 0x53], [0x35, 0x00, 0x57], [0x36, 0x00, 0x5B], [0x37, 0x00, 0x5F],
    [0x38, 0x00, 0x63], [0x39, 0x00, 0x67], [0x3A, 0x00, 0x6B], [0x3B, 0x00, 0x6F],
    [0x3C, 0x00, 0x73], [0x3D, 0x00, 0x77], [0x3E, 0x00, 0x7B], [0x3F, 0x00, 0x7F],
    [0x40, 0x00, 0x87], [0x41, 0x00, 0x8F], [0x42, 0x00, 0x97], [0x43, 0x00, 0x9F],
    [0x44, 0x00, 0xA7], [0x45, 0x00, 0xAF], [0x46, 0x00, 0xB7], [0x47, 0x00, 0xBF],
    [0x48, 0x00, 0xC7], [0x49, 0x00, 0xCF], [0x4A, 0x00, 0xD7], [0x4B, 0x00, 0xDF],
    [0x4C, 0x00, 0xE7], [0x4D, 0x00, 0xEF], [0x4E, 0x00, 0xF7], [0x4F, 0x00, 0xFF],
    [0x50, 0x01, 0x0F], [0x51, 0x01, 0x1F], [0x52, 0x01, 0x2F], [0x53, 0x01, 0x3F],
    [0x54, 0x01, 0x4F], [0x55, 0x01, 0x5F], [0x56, 0x01, 0x6F], [0x67, 0x01, 0x7F],
    [0x58, 0x01, 0x8F], [0x59, 0x01, 0x9F], [0x5A, 0x01, 0xAF], [0x5B, 0x01, 0xBF],
    [0x5C, 0x01, 0xCF], [0x5D, 0x01, 0xDF], [0x5E, 0x01, 0xEF], [0x5F, 0x01, 0xFF],
    [0x60, 0x02, 0x1F], [0x61, 0x02, 0x3F], [0x62, 0x02, 0x5F], [0x63, 0x02, 0x7F],
];

/// Vibrato rate
pub const VIBRATO_RATE: [[u8; 3]; 100] = [
    [0x00, 0x00, 0x20], [0x01, 0x00, 0x40], [0x02, 0x00, 0x60], [0x03, 0x00, 0x80],
    [0x04, 0x00, 0xA0], [0x05, 0x00, 0xC0], [0x06, 0x00, 0xE0], [0x07, 0x00, 0x00],
    [0x08, 0x01, 0x20], [0x09, 0x01, 0x40], [0x0A, 0x01, 0x60], [0x0B, 0x01, 0x80],
    [0x0C, 0x01, 0xA0], [0x0D, 0x01, 0xC0], [0x0E, 0x01, 0xE0], [0x0F, 0x02, 0x00],
    [0x10, 0x02, 0x20], [0x11, 0x02, 0x40], [0x12, 0x02, 0x60], [0x13, 0x02, 0x80],
    [0x14, 0x02, 0xA0], [0x15, 0x02, 0xC0], [0x16, 0x03, 0xE0], [0x17, 0x03, 0x00],
    [0x18, 0x03, 0x20], [0x19, 0x03, 0x40], [0x1A, 0x03, 0x60], [0x1B, 0x03, 0x80],
    [0x1C, 0x03, 0xA0], [0x1D, 0x03, 0xC0], [0x1E, 0x03, 0xE0], [0x1F, 0x04, 0x00],
    [0x20, 0x04, 0x60], [0x21, 0x04, 0xA0], [0x22, 0x04, 0xE0], [0x23, 0x05, 0x20],
    [0x24, 0x05, 0x60], [0x25, 0x05, 0xA0], [0x26, 0x05, 0xE0], [0x27, 0x06, 0x20],
    [0x28, 0x06, 0x60], [0x29, 0x06, 0xA0], [0x2A, 0x06, 0xE0], [0x2B, 0x07, 0x20],
    [0x2C, 0x07, 0x60], [0x2D, 0x07, 0xA0], [0x2E, 0x07, 0xE0], [0x2F, 0x08, 0x20],
    [0x30, 0x08, 0xE0], [0x31, 0x09, 0x60], [0x32, 0x09, 0xE0], [0x33, 0x0A, 0x60],
    [0x34, 0x0A, 0xE0], [0x35, 0x0B, 0x60], [0x36, 0x0B, 0xE0], [0x37, 0x0C, 0x60],
    [0x38, 0x0C, 0xE0], [0x39, 0x0D, 0x60], [0x3A, 0x0D, 0xE0], [0x3B, 0x0E, 0x60],
    [0x3C, 0x0E, 0xE0], [0x3D, 0x0F, 0x60], [0x3E, 0x0F, 0xE0], [0x3F, 0x10, 0x60],
    [0x40, 0x11, 0xE0], [0x41, 0x12, 0xE0], [0x42, 0x13, 0xE0], [0x43, 0x14, 0xE0],
    [0x44, 0x15, 0xE0], [0x45, 0x16, 0xE0], [0x46, 0x17, 0xE0], [0x47, 0x18, 0xE0],
    [0x48, 0x19, 0xE0], [0x49, 0x1A, 0xE0], [0x4A, 0x1B, 0xE0], [0x4B, 0x1C, 0xE0],
    [0x4C, 0x1D, 0xE0], [0x4D, 0x1E, 0xE0], [0x4E, 0x1F, 0xE0], [0x4F, 0x20, 0xE0],
    [0x50, 0x23, 0xE0], [0x51, 0x25, 0xE0], [0x52, 0x27, 0xE0], [0x53, 0x29, 0xE0],
    [0x54, 0x2B, 0xE0], [0x55, 0x2D, 0xE0], [0x56, 0x2F, 0xE0], [0x57, 0x31, 0xE0],
    [0x58, 0x33, 0xE0], [0x59, 0x35, 0xE0], [0x5A, 0x37, 0xE0], [0x5B, 0x39, 0xE0],
    [0x5C, 0x3B, 0xE0], [0x5D, 0x3D, 0xE0], [0x5E, 0x3F, 0xE0], [0x5F, 0x41, 0xE0],
    [0x60, 0x47, 0xE0], [0x61, 0x4B, 0xE0], [0x62, 0x4F, 0xE0], [0x63, 0x53, 0xE0],
];

/// Vibrato depth
pub const VIBRATO_DEPTH: [[u8; 3]; 100] = [
    [0x00, 0x00, 0x01], [0x01, 0x00, 0x02], [0x02, 0x00, 0x03], [0x03, 0x00, 0x04],
    [0x04, 0x00, 0x05], [0x05, 0x00, 0x06], [0x06, 0x00, 0x07], [0x07, 0x00, 0x08],
    [0x08, 0x00, 0x09], [0x09, 0x00, 0x0A], [0x0A, 0x00, 0x0B], [0x0B, 0x00, 0x0C],
    [0x0C, 0x00, 0x0D], [0x0D, 0x00, 0x0E], [0x0E, 0x00, 0x0F], [0x0F, 0x00, 0x10],
    [0x10, 0x00, 0x11], [0x11, 0x00, 0x12], [0x12, 0x00, 0x13], [0x13, 0x00, 0x14],
    [0x14, 0x00, 0x15], [0x15, 0x00, 0x16], [0x16, 0x00, 0x17], [0x17, 0x00, 0x18],
    [0x18, 0x00, 0x19], [0x19, 0x00, 0x1A], [0x1A, 0x00, 0x1B], [0x1B, 0x00, 0x1C],
    [0x1C, 0x00, 0x1D], [0x1D, 0x00, 0x1E], [0x1E, 0x00, 0x1F], [0x1F, 0x00, 0x20],
    [0x20, 0x00, 0x23], [0x21, 0x00, 0x25], [0x22, 0x00, 0x27], [0x23, 0x00, 0x29],
    [0x24, 0x00, 0x2B], [0x25, 0x00, 0x2D], [0x26, 0x00, 0x2F], [0x27, 0x00, 0x31],
    [0x28, 0x00, 0x33], [0x29, 0x00, 0x35], [0x2A, 0x00, 0x37], [0x2B, 0x00, 0x39],
    [0x2C, 0x00, 0x3B], [0x2D, 0x00, 0x3D], [0x2E, 0x00, 0x3F], [0x2F, 0x00, 0x41],
    [0x30, 0x00, 0x47], [0x31, 0x00, 0x4B], [0x32, 0x00, 0x4F], [0x33, 0x00, 0x53],
    [0x34, 0x00, 0x57], [0x35, 0x00, 0x5B], [0x36, 0x00, 0x5F], [0x37, 0x00, 0x63],
    [0x38, 0x00, 0x67], [0x39, 0x00, 0x6B], [0x3A, 0x00, 0x6F], [0x3B, 0x00, 0x73],
    [0x3C, 0x00, 0x77], [0x3D, 0x00, 0x7B], [0x3E, 0x00, 0x7F], [0x3F, 0x00, 0x83],
    [0x40, 0x00, 0x8F], [0x41, 0x00, 0x97], [0x42, 0x00, 0x9F], [0x43, 0x00, 0xA7],
    [0x44, 0x00, 0xAF], [0x45, 0x00, 0xB7], [0x46, 0x00, 0xBF], [0x47, 0x00, 0xC7],
    [0x48, 0x00, 0xCF], [0x49, 0x00, 0xD7], [0x4A, 0x00, 0xDF], [0x4B, 0x00, 0xE7],
    [0x4C, 0x00, 0xEF], [0x4D, 0x00, 0xF7], [0x4E, 0x00, 0xFF], [0x4F, 0x01, 0x07],
    [0x50, 0x01, 0x1F], [0x51, 0x01, 0x2F], [0x52, 0x01, 0x3F], [0x53, 0x01, 0x4F],
    [0x54, 0x01, 0x5F], [0x55, 0x01, 0x6F], [0x56, 0x01, 0x7F], [0x57, 0x01, 0x8F],
    [0x58, 0x01, 0x9F], [0x59, 0x01, 0xAF], [0x5A, 0x01, 0xBF], [0x5B, 0x01, 0xCF],
    [0x5C, 0x01, 0xDF], [0x5D, 0x01, 0xEF], [0x5E, 0x01, 0xFF], [0x5F, 0x02, 0x0F],
    [0x60, 0x02, 0x3F], [0x61, 0x02, 0x5F], [0x62, 0x02, 0x7F], [0x63, 0x03, 0x00],
];
