//! CRC-32 as specified for `EbmlCrc32` coverage (§4.3): reflected
//! polynomial 0xEDB88320, initial value 0xFFFFFFFF, final XOR 0xFFFFFFFF.
//!
//! Grounded in `lib/libebml/ebml/EbmlCrc32.h`; a dedicated crate is not
//! warranted since the parameters are fixed by the spec and the table
//! is tiny.

const POLY: u32 = 0xEDB8_8320;

fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];

    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ POLY
            } else {
                crc >> 1
            };
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }

    table
}

struct Crc32Table([u32; 256]);

impl Crc32Table {
    fn get() -> &'static Crc32Table {
        use std::sync::OnceLock;
        static TABLE: OnceLock<Crc32Table> = OnceLock::new();
        TABLE.get_or_init(|| Crc32Table(build_table()))
    }
}

/// Computes the CRC-32 of `data` per the §4.3 parameters.
pub fn crc32(data: &[u8]) -> u32 {
    let table = &Crc32Table::get().0;

    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        let idx = ((crc ^ byte as u32) & 0xFF) as usize;
        crc = (crc >> 8) ^ table[idx];
    }

    crc ^ 0xFFFF_FFFF
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn known_vector() {
        // CRC-32/ISO-HDLC("123456789") == 0xCBF43926, a standard check
        // vector for this exact polynomial/init/xor combination.
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn empty_input() {
        assert_eq!(crc32(b""), 0);
    }

    #[test]
    fn differs_on_single_bit_flip() {
        let a = crc32(b"matroska cluster payload");
        let b = crc32(b"matroska Cluster payload");
        assert_ne!(a, b);
    }
}
