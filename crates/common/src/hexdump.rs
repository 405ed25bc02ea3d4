//! Hex dump of device responses
//!
//! Bytes are printed as two-digit uppercase hex, each followed by a space,
//! sixteen to a line.

/// Bytes per output line
pub const BYTES_PER_LINE: usize = 16;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Render the first `length` bytes of `data` as a hex dump
///
/// A line break follows every 16th byte. `length` is clamped to the buffer.
pub fn render(data: &[u8], length: usize) -> String {
    let data = &data[..length.min(data.len())];
    let mut out = String::with_capacity(data.len() * 3 + data.len() / BYTES_PER_LINE);

    for (i, byte) in data.iter().enumerate() {
        out.push(HEX_DIGITS[usize::from(byte >> 4)] as char);
        out.push(HEX_DIGITS[usize::from(byte & 0x0F)] as char);
        out.push(' ');
        if i % BYTES_PER_LINE == BYTES_PER_LINE - 1 {
            out.push('\n');
        }
    }

    out
}
