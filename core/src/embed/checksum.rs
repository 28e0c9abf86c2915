//! Payload checksum
//!
//! A 16-bit XOR-then-multiply running hash. Both steps are bijective on the
//! accumulator (the multiplier is odd, so multiplication is invertible mod
//! 2^16), which means any single corrupted byte is guaranteed to change the
//! result. That is the entire contract: this detects accidental corruption of
//! embedded records, it is not tamper resistance, and changing it is a wire
//! format break.

const CHECKSUM_SEED: u16 = 0xA5C3;
const CHECKSUM_MULTIPLIER: u16 = 31;

/// Checksum over an embedded record's unpadded payload bytes.
pub fn payload_checksum(bytes: &[u8]) -> u16 {
    let mut acc = CHECKSUM_SEED;
    for &byte in bytes {
        acc ^= byte as u16;
        acc = acc.wrapping_mul(CHECKSUM_MULTIPLIER);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_payload_is_the_seed() {
        assert_eq!(payload_checksum(&[]), CHECKSUM_SEED);
    }

    #[test]
    fn test_any_single_byte_change_is_detected() {
        let payload: Vec<u8> = (0..=255).collect();
        let reference = payload_checksum(&payload);

        for position in [0usize, 1, 127, 254, 255] {
            let mut corrupted = payload.clone();
            corrupted[position] ^= 0x01;
            assert_ne!(
                payload_checksum(&corrupted),
                reference,
                "corruption at byte {} went undetected",
                position
            );
        }
    }

    #[test]
    fn test_order_matters() {
        assert_ne!(payload_checksum(b"ab"), payload_checksum(b"ba"));
    }

    #[test]
    fn test_length_matters() {
        assert_ne!(payload_checksum(b"abc"), payload_checksum(b"abc\0"));
    }
}
