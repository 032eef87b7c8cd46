use cryptoxide::digest::Digest as _;
use cryptoxide::ripemd160::Ripemd160;
use cryptoxide::sha2::Sha256;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum HashFromStrError {
    #[error("invalid hexadecimal: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

macro_rules! fixed_hash {
    ($Type:ident, $SIZE:expr) => {
        impl $Type {
            /// number of bytes of the hash
            pub const SIZE: usize = $SIZE;

            #[inline(always)]
            pub const fn new(bytes: [u8; $SIZE]) -> Self {
                Self(bytes)
            }

            /// build the hash from a slice, fails if the slice does not
            /// have exactly [`Self::SIZE`] bytes.
            pub fn from_slice(bytes: &[u8]) -> Result<Self, HashFromStrError> {
                let bytes: [u8; $SIZE] =
                    bytes
                        .try_into()
                        .map_err(|_| HashFromStrError::InvalidLength {
                            expected: $SIZE,
                            actual: bytes.len(),
                        })?;
                Ok(Self(bytes))
            }

            #[inline]
            pub fn as_bytes(&self) -> &[u8; $SIZE] {
                &self.0
            }
        }

        impl Default for $Type {
            fn default() -> Self {
                Self([0; $SIZE])
            }
        }

        impl AsRef<[u8]> for $Type {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }

        impl fmt::Display for $Type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&hex::encode(self.0))
            }
        }

        impl fmt::Debug for $Type {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_tuple(stringify!($Type))
                    .field(&hex::encode(self.0))
                    .finish()
            }
        }

        impl str::FromStr for $Type {
            type Err = HashFromStrError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s)?;
                Self::from_slice(&bytes)
            }
        }

        impl Serialize for $Type {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: Serializer,
            {
                if serializer.is_human_readable() {
                    serializer.serialize_str(&hex::encode(self.0))
                } else {
                    serializer.serialize_bytes(&self.0)
                }
            }
        }

        impl<'de> Deserialize<'de> for $Type {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: Deserializer<'de>,
            {
                struct HashVisitor;

                impl<'de> de::Visitor<'de> for HashVisitor {
                    type Value = $Type;

                    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                        write!(f, "{} bytes, either raw or hex encoded", $SIZE)
                    }

                    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                        v.parse().map_err(E::custom)
                    }

                    fn visit_bytes<E: de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                        $Type::from_slice(v).map_err(E::custom)
                    }

                    fn visit_byte_buf<E: de::Error>(self, v: Vec<u8>) -> Result<Self::Value, E> {
                        self.visit_bytes(&v)
                    }
                }

                if deserializer.is_human_readable() {
                    deserializer.deserialize_str(HashVisitor)
                } else {
                    deserializer.deserialize_bytes(HashVisitor)
                }
            }
        }
    };
}

/// 256 bits hash
///
/// identifies transactions, blocks, assets and sidechain transactions.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Uint256([u8; 32]);

fixed_hash!(Uint256, 32);

impl Uint256 {
    /// the empty hash, used as a sentinel (coinbase input, absent values)
    pub const ZERO: Self = Self([0; 32]);
}

/// program hash: one byte of address prefix followed by the
/// RIPEMD160 of the SHA256 of the program code.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
pub struct Uint168([u8; 21]);

fixed_hash!(Uint168, 21);

impl Uint168 {
    /// build a program hash from its prefix and the 20 bytes digest
    pub fn from_prefix_and_digest(prefix: u8, digest: &[u8; 20]) -> Self {
        let mut bytes = [0; 21];
        bytes[0] = prefix;
        bytes[1..].copy_from_slice(digest);
        Self(bytes)
    }

    /// the address prefix of the program hash
    #[inline]
    pub fn prefix(&self) -> u8 {
        self.0[0]
    }
}

/// address prefix of the single signature programs
pub const PREFIX_STANDARD: u8 = 0x21;
/// address prefix of the m-of-n programs
pub const PREFIX_MULTISIG: u8 = 0x12;
/// address prefix of the addresses that lock value moving across chains
pub const PREFIX_CROSS_CHAIN: u8 = 0x4B;

/// double SHA256, the content hash of every chain object
pub fn sha256d(bytes: &[u8]) -> Uint256 {
    let mut first = [0; 32];
    let mut hasher = Sha256::new();
    hasher.input(bytes);
    hasher.result(&mut first);

    let mut second = [0; 32];
    let mut hasher = Sha256::new();
    hasher.input(&first);
    hasher.result(&mut second);

    Uint256(second)
}

/// RIPEMD160(SHA256(bytes))
pub fn hash160(bytes: &[u8]) -> [u8; 20] {
    let mut sha = [0; 32];
    let mut hasher = Sha256::new();
    hasher.input(bytes);
    hasher.result(&mut sha);

    let mut out = [0; 20];
    let mut hasher = Ripemd160::new();
    hasher.input(&sha);
    hasher.result(&mut out);
    out
}
