// hash.rs -- Content hashing for Image equality buckets.
//
// CRC-32 (IEEE 802.3: polynomial 0x04C11DB7, reflected input and output,
// register seeded with 0xFFFFFFFF, final complement) over the raw byte view
// of the element buffer. The element kind and the shape are folded in with
// the usual `* 31 +` combination so that, e.g., a 2×8 and a 4×4 image over
// the same bytes hash differently.
//
// The table is built by a `const fn`, so it is baked into the binary and
// there is no lazy initialisation at runtime.
//
// Not a cryptographic hash. It only has to agree with `==` on equal content.

use crate::element::NumericElement;

const POLYNOMIAL: u32 = 0x04C1_1DB7;

/// Reverse the low `bits` bits of `value`.
const fn reflect(mut value: u32, bits: u32) -> u32 {
    let mut result = 0u32;
    let mut i = 1;
    while i <= bits {
        if value & 1 != 0 {
            result |= 1 << (bits - i);
        }
        value >>= 1;
        i += 1;
    }
    result
}

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut value = reflect(i as u32, 8) << 24;
        let mut bit = 0;
        while bit < 8 {
            value = (value << 1) ^ if value & (1 << 31) != 0 { POLYNOMIAL } else { 0 };
            bit += 1;
        }
        table[i] = reflect(value, 32);
        i += 1;
    }
    table
}

static TABLE: [u32; 256] = build_table();

/// Standard CRC-32 of `bytes` (the value `crc32("123456789") == 0xCBF43926`).
pub fn crc32(bytes: &[u8]) -> u32 {
    let mut register = 0xFFFF_FFFFu32;
    for &byte in bytes {
        register = TABLE[((register ^ byte as u32) & 0xFF) as usize] ^ (register >> 8);
    }
    !register
}

/// CRC of the buffer's bytes combined with the element kind id.
pub fn buffer_hash<T: NumericElement>(data: &[T]) -> u32 {
    crc32(bytemuck::cast_slice(data))
        .wrapping_mul(31)
        .wrapping_add(T::KIND.type_id())
}

/// Full container hash: `((buffer_hash * 31) + width) * 31 + height`,
/// all in wrapping 32-bit arithmetic.
pub fn content_hash<T: NumericElement>(data: &[T], height: usize, width: usize) -> u32 {
    buffer_hash(data)
        .wrapping_mul(31)
        .wrapping_add(width as u32)
        .wrapping_mul(31)
        .wrapping_add(height as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_matches_reflected_polynomial() {
        assert_eq!(TABLE[0], 0);
        assert_eq!(TABLE[1], 0x7707_3096);
        assert_eq!(TABLE[255], 0x2D02_EF8D);
    }

    #[test]
    fn crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn kind_changes_buffer_hash() {
        // Same bytes, different element kinds.
        let bytes = [1u8, 0, 0, 0];
        let words = [u32::from_ne_bytes(bytes)];
        assert_eq!(crc32(&bytes), crc32(bytemuck::cast_slice(&words)));
        assert_ne!(buffer_hash(&bytes), buffer_hash(&words));
    }

    #[test]
    fn shape_changes_content_hash() {
        let data: Vec<i16> = (0..16).collect();
        assert_ne!(content_hash(&data, 2, 8), content_hash(&data, 4, 4));
        assert_eq!(content_hash(&data, 4, 4), content_hash(&data.clone(), 4, 4));
    }

    #[test]
    fn content_hash_formula() {
        let data = [7u8, 8, 9];
        let expected = buffer_hash(&data)
            .wrapping_mul(31)
            .wrapping_add(3)
            .wrapping_mul(31)
            .wrapping_add(1);
        assert_eq!(content_hash(&data, 1, 3), expected);
    }
}
