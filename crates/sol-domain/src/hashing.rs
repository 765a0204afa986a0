//! Hash helpers – digest sha-256 de contenido de archivos.
//!
//! El digest es la identidad del contenido: se recalcula en cada escritura y
//! permite detectar ediciones (staleness) sin comparar el texto completo.

use sha2::{Digest, Sha256};

/// Hashea un string y devuelve hex (64 chars).
pub fn sha256_hex(input: &str) -> String {
    let mut h = Sha256::new();
    h.update(input.as_bytes());
    let out = h.finalize();
    let mut hex = String::with_capacity(out.len() * 2);
    for b in out {
        use std::fmt::Write;
        let _ = write!(hex, "{:02x}", b);
    }
    hex
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_string_digest() {
        assert_eq!(sha256_hex(""),
                   "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855");
    }

    #[test]
    fn known_vector() {
        assert_eq!(sha256_hex("abc"),
                   "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad");
    }
}
