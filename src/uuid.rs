//! Random identifiers for stanzas.

use std::fmt::Write;

use rand::{thread_rng, RngCore};

/// Generate a random RFC 4122 version 4 UUID, handy as an `<iq/>` id.
pub fn uuid4() -> String {
    let mut bytes = [0u8; 16];
    thread_rng().fill_bytes(&mut bytes);
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    let mut out = String::with_capacity(36);
    for (i, byte) in bytes.iter().enumerate() {
        if let 4 | 6 | 8 | 10 = i {
            out.push('-');
        }
        // writing to a String cannot fail
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape() {
        let uuid = uuid4();
        assert_eq!(uuid.len(), 36);
        let dashes: Vec<usize> = uuid
            .char_indices()
            .filter(|(_, c)| *c == '-')
            .map(|(i, _)| i)
            .collect();
        assert_eq!(dashes, vec![8, 13, 18, 23]);
        assert_eq!(&uuid[14..15], "4");
        assert!(matches!(&uuid[19..20], "8" | "9" | "a" | "b"));
    }

    #[test]
    fn test_unique() {
        assert_ne!(uuid4(), uuid4());
    }
}
