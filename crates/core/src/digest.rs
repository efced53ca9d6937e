//! Rolling integrity digest for backup payloads.
//!
//! This is a corruption-detection checksum, not a security control: it
//! detects accidental modification of a stored payload but offers no
//! resistance against deliberate tampering. Anything needing authenticity
//! must layer a real MAC on top; do not reuse this digest for that.

/// Compute the integrity digest of a canonical payload string.
///
/// Classic 32-bit rolling hash (`h = h * 31 + c` via shift-and-subtract)
/// with wrapping arithmetic, rendered as 8 hex digits.
pub fn integrity_digest(input: &str) -> String {
    let mut hash: i32 = 0;
    for ch in input.chars() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(ch as i32);
    }
    format!("{:08x}", hash as u32)
}
