use crate::model::error::Error;
use crate::model::error::io::IOError;
use crate::model::error::system::SystemError;
use crate::model::hash_type::HashType;
use blake2::{Blake2b512, Blake2s256};
use digest::Digest;
use md5::Md5;
use sha2::Sha256;
use sha3::Sha3_256;
use std::fmt::Write;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

pub async fn checksum(path: PathBuf, hash_type: HashType) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || file_hash(&path, hash_type))
        .await
        .map_err(SystemError::thread_panic)?
}

/// Hex digest of a file's content.
pub fn file_hash(path: &Path, hash_type: HashType) -> Result<String, Error> {
    let file = File::open(path).map_err(|err| IOError::read_file_failed(path, err))?;
    let digest = match hash_type {
        HashType::MD5 => digest_file(file, path, Md5::new())?,
        HashType::SHA3 => digest_file(file, path, Sha3_256::new())?,
        HashType::SHA256 => digest_file(file, path, Sha256::new())?,
        HashType::BLAKE2B => digest_file(file, path, Blake2b512::new())?,
        HashType::BLAKE2S => digest_file(file, path, Blake2s256::new())?,
        HashType::BLAKE3 => digest_file(file, path, blake3::Hasher::new())?,
    };
    Ok(to_hex(&digest))
}

fn digest_file(mut file: File, path: &Path, mut hasher: impl Digest) -> Result<Vec<u8>, Error> {
    let mut buffer = [0; 65536];
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|err| IOError::read_file_failed(path, err))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(hasher.finalize().to_vec())
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut hex, byte| {
        let _ = write!(hex, "{byte:02x}");
        hex
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn known_digests() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();

        assert_eq!(
            file_hash(&path, HashType::MD5).unwrap(),
            "900150983cd24fb0d6963f7d28e17f72"
        );
        assert_eq!(
            file_hash(&path, HashType::SHA256).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(file_hash(&path, HashType::BLAKE3).unwrap().len(), 64);
        assert_eq!(file_hash(&path, HashType::BLAKE2B).unwrap().len(), 128);
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(file_hash(&dir.path().join("absent"), HashType::SHA3).is_err());
    }
}
