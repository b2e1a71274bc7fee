//! Name-table hash.
//!
//! The resource compiler stores a 32-bit hash beside every name so the
//! runtime can compare hashes before comparing text. The algorithm works on
//! UTF-16 code units:
//!
//! ```text
//! h = 0
//! for unit in utf16(name):
//!     h = (h << 4) + unit
//!     h ^= (h & 0xF000_0000) >> 23
//!     h &= 0x0FFF_FFFF
//! ```
//!
//! All arithmetic wraps at 32 bits, and the result always fits in 28.

/// Hash `name` the way the resource compiler does.
pub fn name_hash(name: &str) -> u32 {
    let mut h: u32 = 0;
    for unit in name.encode_utf16() {
        h = (h << 4).wrapping_add(unit as u32);
        h ^= (h & 0xF000_0000) >> 23;
        h &= 0x0FFF_FFFF;
    }
    h
}
