// src/blake3.rs
use std::{fs::File, io, io::Read, path::Path};

/// BLAKE3 otisk souboru jako hex řetězec.
pub fn compute_blake3(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;

    let mut hasher = blake3::Hasher::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_matches_in_memory_digest() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("page.json");
        std::fs::write(&p, b"Invoice 2024").unwrap();
        assert_eq!(
            compute_blake3(&p).unwrap(),
            blake3::hash(b"Invoice 2024").to_hex().to_string()
        );
    }
}
