//! The itoa64-style encoding used by phpass.
//!
//! phpass packs binary digest bytes into printable characters with a custom
//! base64-like encoding. The alphabet matches the one used by traditional
//! crypt(3) schemes, but the grouping and bit order differ from standard
//! base64: bytes are consumed low byte first, and each 6-bit window is taken
//! from the bottom of the accumulator. Getting this bit-for-bit right is the
//! compatibility contract with the historical format, so it is written out
//! explicitly rather than derived from a generic base64 engine.

/// Custom base64 alphabet (itoa64) used by phpass.
///
/// Index 0 is `.`, index 63 is `z`. The same alphabet is used by crypt(3)
/// DES and APR1-MD5, but the phpass grouping below is its own thing.
pub(crate) const ITOA64: &[u8; 64] =
    b"./0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Encode the first `count` bytes of `input` using the itoa64 alphabet.
///
/// Each group of 3 input bytes becomes 4 output characters. The first byte
/// fills accumulator bits 0-7, the second bits 8-15, the third bits 16-23,
/// and 6-bit windows are emitted from the bottom upwards. When fewer than 3
/// bytes remain in the final group the missing high-order bits are simply
/// never shifted in, so they read as zero: 1 trailing byte yields 2
/// characters, 2 trailing bytes yield 3. `count` must not exceed
/// `input.len()`.
pub(crate) fn encode64(input: &[u8], count: usize) -> String {
    debug_assert!(count <= input.len(), "count exceeds input length");
    let mut output = String::with_capacity(count.div_ceil(3) * 4);
    let mut i = 0;
    while i < count {
        let mut value = u32::from(input[i]);
        i += 1;
        output.push(ITOA64[(value & 0x3f) as usize] as char);
        if i < count {
            value |= u32::from(input[i]) << 8;
        }
        output.push(ITOA64[((value >> 6) & 0x3f) as usize] as char);
        if i >= count {
            break;
        }
        i += 1;
        if i < count {
            value |= u32::from(input[i]) << 16;
        }
        output.push(ITOA64[((value >> 12) & 0x3f) as usize] as char);
        if i >= count {
            break;
        }
        i += 1;
        output.push(ITOA64[((value >> 18) & 0x3f) as usize] as char);
    }
    output
}
