//! Low-level byte primitives shared by the container readers.
//!
//! Every table in the container is big-endian regardless of the host, so all
//! multi-byte reads go through the `be_*_at` helpers below. Each one returns
//! [`None`] rather than panicking when the read would run past the buffer.

/// Read a big-endian `u16` at `offset`.
#[inline]
pub(crate) fn be_u16_at(buf: &[u8], offset: usize) -> Option<u16> {
    let b = buf.get(offset..offset.checked_add(2)?)?;
    Some(u16::from_be_bytes([b[0], b[1]]))
}

/// Read a big-endian `u32` at `offset`.
#[inline]
pub(crate) fn be_u32_at(buf: &[u8], offset: usize) -> Option<u32> {
    let b = buf.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Borrow exactly `len` bytes at `offset`.
#[inline]
pub(crate) fn bytes_at(buf: &[u8], offset: usize, len: usize) -> Option<&[u8]> {
    buf.get(offset..offset.checked_add(len)?)
}

/// Decode `units` UTF-16BE code units starting at `offset`.
///
/// Returns [`None`] on a short buffer or unpaired surrogate.
pub(crate) fn utf16be_at(buf: &[u8], offset: usize, units: usize) -> Option<String> {
    let raw = bytes_at(buf, offset, units.checked_mul(2)?)?;
    let code_units = raw.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]]));
    char::decode_utf16(code_units)
        .collect::<Result<String, _>>()
        .ok()
}

/// Encode `text` as UTF-16BE bytes.
pub(crate) fn utf16be(text: &str) -> Vec<u8> {
    text.encode_utf16().flat_map(u16::to_be_bytes).collect()
}

/// Iterate over every offset in `from..to` at which `needle` starts.
///
/// A match may extend past `to`, but never past the end of `haystack`.
/// Offsets are absolute (relative to `haystack`, not to `from`).
pub(crate) fn find_all<'a>(
    haystack: &'a [u8],
    needle: &'a [u8],
    from: usize,
    to: usize,
) -> impl Iterator<Item = usize> + 'a {
    let from = from.min(haystack.len());
    let starts = to.min(haystack.len()).saturating_sub(from);
    haystack[from..]
        .windows(needle.len().max(1))
        .take(starts)
        .enumerate()
        .filter(move |(_, w)| !needle.is_empty() && *w == needle)
        .map(move |(i, _)| from + i)
}

/// Whether `needle` occurs anywhere in `haystack`.
#[inline]
pub(crate) fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    !needle.is_empty() && haystack.windows(needle.len()).any(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_reads_ignore_host_order() {
        let buf = [0x12, 0x34, 0x56, 0x78, 0x9A];
        assert_eq!(be_u16_at(&buf, 0), Some(0x1234));
        assert_eq!(be_u32_at(&buf, 1), Some(0x3456_789A));
        assert_eq!(be_u32_at(&buf, 2), None);
        assert_eq!(be_u16_at(&buf, usize::MAX), None);
    }

    #[test]
    fn utf16be_round_trips_non_ascii() {
        let encoded = utf16be("Map-é");
        assert_eq!(&encoded[..4], &[0x00, b'M', 0x00, b'a']);
        assert_eq!(utf16be_at(&encoded, 0, 5).as_deref(), Some("Map-é"));
        assert_eq!(utf16be_at(&encoded, 0, 6), None);
    }

    #[test]
    fn find_all_reports_absolute_offsets() {
        let hay = b"xxabxxabab";
        let hits: Vec<_> = find_all(hay, b"ab", 3, hay.len()).collect();
        assert_eq!(hits, vec![6, 8]);
        assert_eq!(find_all(hay, b"ab", 0, 3).count(), 1);
    }
}
