use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashType {
    MD5,
    SHA3,
    SHA256,
    BLAKE2B,
    BLAKE2S,
    BLAKE3,
}

impl fmt::Display for HashType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HashType::MD5 => "md5",
            HashType::SHA3 => "sha3-256",
            HashType::SHA256 => "sha256",
            HashType::BLAKE2B => "blake2b-512",
            HashType::BLAKE2S => "blake2s-256",
            HashType::BLAKE3 => "blake3",
        };
        f.write_str(name)
    }
}
