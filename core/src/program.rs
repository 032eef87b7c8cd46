//! signature verification programs
//!
//! a program code ends with the opcode that selects how it is run:
//!
//! * `CHECKSIG`: `PUSH32 <key> CHECKSIG`, one signature by the key;
//! * `CHECKMULTISIG`: `OP_m (PUSH32 <key>)*n OP_n CHECKMULTISIG`, `m`
//!   signatures out of the `n` keys, in the keys order;
//! * `CROSSCHAIN`: same layout as `CHECKMULTISIG`, used by the
//!   arbitrators to lock and release value moving across chains.
//!
//! the parameter is a sequence of `0x40 <signature>` chunks.

use crate::signature::{SignatureVerifier, PUBLIC_KEY_LENGTH, SIGNATURE_LENGTH};
use crate::tx::Program;
use crate::{hash160, Uint168, PREFIX_CROSS_CHAIN, PREFIX_MULTISIG, PREFIX_STANDARD};
use thiserror::Error;

pub const CHECKSIG: u8 = 0xac;
pub const CHECKMULTISIG: u8 = 0xae;
pub const CROSSCHAIN: u8 = 0xaf;

const PUSH_KEY: u8 = PUBLIC_KEY_LENGTH as u8;
const PUSH_SIGNATURE: u8 = SIGNATURE_LENGTH as u8;
const OP_1: u8 = 0x51;
const OP_16: u8 = 0x60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProgramError {
    #[error("empty program code")]
    EmptyCode,

    #[error("unknown program sign type {0:#04x}")]
    UnknownSignType(u8),

    #[error("malformed program code")]
    MalformedCode,

    #[error("malformed program parameter")]
    MalformedParameter,

    #[error("invalid signature count: expected {expected}, got {actual}")]
    SignatureCount { expected: usize, actual: usize },

    #[error("signature verification failed")]
    InvalidSignature,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ProgramKind {
    Standard,
    MultiSig,
    CrossChain,
}

impl ProgramKind {
    fn of(code: &[u8]) -> Result<Self, ProgramError> {
        match code.last() {
            None => Err(ProgramError::EmptyCode),
            Some(&CHECKSIG) => Ok(Self::Standard),
            Some(&CHECKMULTISIG) => Ok(Self::MultiSig),
            Some(&CROSSCHAIN) => Ok(Self::CrossChain),
            Some(&other) => Err(ProgramError::UnknownSignType(other)),
        }
    }

    fn prefix(self) -> u8 {
        match self {
            Self::Standard => PREFIX_STANDARD,
            Self::MultiSig => PREFIX_MULTISIG,
            Self::CrossChain => PREFIX_CROSS_CHAIN,
        }
    }
}

/// the program hash (address) of the given program code
pub fn program_hash(code: &[u8]) -> Result<Uint168, ProgramError> {
    let kind = ProgramKind::of(code)?;
    Ok(Uint168::from_prefix_and_digest(kind.prefix(), &hash160(code)))
}

pub fn standard_code(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> Vec<u8> {
    let mut code = Vec::with_capacity(PUBLIC_KEY_LENGTH + 2);
    code.push(PUSH_KEY);
    code.extend_from_slice(public_key);
    code.push(CHECKSIG);
    code
}

/// the program hash of the single signature program of a public key
///
/// returns `None` if the key does not have the expected length.
pub fn standard_program_hash(public_key: &[u8]) -> Option<Uint168> {
    let public_key: &[u8; PUBLIC_KEY_LENGTH] = public_key.try_into().ok()?;
    program_hash(&standard_code(public_key)).ok()
}

fn m_of_n_code(
    required: u8,
    public_keys: &[[u8; PUBLIC_KEY_LENGTH]],
    sign_type: u8,
) -> Result<Vec<u8>, ProgramError> {
    let n = public_keys.len();
    if required == 0 || usize::from(required) > n || n > usize::from(OP_16 - OP_1 + 1) {
        return Err(ProgramError::MalformedCode);
    }
    let mut code = Vec::with_capacity(n * (PUBLIC_KEY_LENGTH + 1) + 3);
    code.push(OP_1 + required - 1);
    for key in public_keys {
        code.push(PUSH_KEY);
        code.extend_from_slice(key);
    }
    code.push(OP_1 + n as u8 - 1);
    code.push(sign_type);
    Ok(code)
}

pub fn multisig_code(
    required: u8,
    public_keys: &[[u8; PUBLIC_KEY_LENGTH]],
) -> Result<Vec<u8>, ProgramError> {
    m_of_n_code(required, public_keys, CHECKMULTISIG)
}

pub fn cross_chain_code(
    required: u8,
    public_keys: &[[u8; PUBLIC_KEY_LENGTH]],
) -> Result<Vec<u8>, ProgramError> {
    m_of_n_code(required, public_keys, CROSSCHAIN)
}

/// encode signatures into a program parameter
pub fn signatures_parameter<'a, I>(signatures: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a [u8; SIGNATURE_LENGTH]>,
{
    let mut parameter = Vec::new();
    for signature in signatures {
        parameter.push(PUSH_SIGNATURE);
        parameter.extend_from_slice(signature);
    }
    parameter
}

fn parse_signatures(parameter: &[u8]) -> Result<Vec<&[u8]>, ProgramError> {
    const CHUNK: usize = SIGNATURE_LENGTH + 1;
    if parameter.len() % CHUNK != 0 {
        return Err(ProgramError::MalformedParameter);
    }
    parameter
        .chunks(CHUNK)
        .map(|chunk| {
            if chunk[0] == PUSH_SIGNATURE {
                Ok(&chunk[1..])
            } else {
                Err(ProgramError::MalformedParameter)
            }
        })
        .collect()
}

/// required signatures and keys of a m-of-n code
fn parse_m_of_n(code: &[u8]) -> Result<(usize, Vec<&[u8]>), ProgramError> {
    // OP_m, at least one key, OP_n and the sign type
    if code.len() < PUBLIC_KEY_LENGTH + 4 {
        return Err(ProgramError::MalformedCode);
    }
    let op_m = code[0];
    let op_n = code[code.len() - 2];
    if !(OP_1..=OP_16).contains(&op_m) || !(OP_1..=OP_16).contains(&op_n) {
        return Err(ProgramError::MalformedCode);
    }
    let required = usize::from(op_m - OP_1 + 1);
    let total = usize::from(op_n - OP_1 + 1);

    let keys_part = &code[1..code.len() - 2];
    if keys_part.len() != total * (PUBLIC_KEY_LENGTH + 1) || required > total {
        return Err(ProgramError::MalformedCode);
    }
    let keys = keys_part
        .chunks(PUBLIC_KEY_LENGTH + 1)
        .map(|chunk| {
            if chunk[0] == PUSH_KEY {
                Ok(&chunk[1..])
            } else {
                Err(ProgramError::MalformedCode)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok((required, keys))
}

/// run the program against the signed `message`
pub fn run_program<V>(program: &Program, message: &[u8], verifier: &V) -> Result<(), ProgramError>
where
    V: SignatureVerifier + ?Sized,
{
    let signatures = parse_signatures(&program.parameter)?;

    match ProgramKind::of(&program.code)? {
        ProgramKind::Standard => {
            let code = &program.code;
            if code.len() != PUBLIC_KEY_LENGTH + 2 || code[0] != PUSH_KEY {
                return Err(ProgramError::MalformedCode);
            }
            if signatures.len() != 1 {
                return Err(ProgramError::SignatureCount {
                    expected: 1,
                    actual: signatures.len(),
                });
            }
            let public_key = &code[1..=PUBLIC_KEY_LENGTH];
            if verifier.verify(public_key, message, signatures[0]) {
                Ok(())
            } else {
                Err(ProgramError::InvalidSignature)
            }
        }
        ProgramKind::MultiSig | ProgramKind::CrossChain => {
            let (required, keys) = parse_m_of_n(&program.code)?;
            if signatures.len() != required {
                return Err(ProgramError::SignatureCount {
                    expected: required,
                    actual: signatures.len(),
                });
            }

            // signatures come in the keys order, a key signs at most once
            let mut keys = keys.into_iter();
            for signature in signatures {
                if !keys
                    .by_ref()
                    .any(|key| verifier.verify(key, message, signature))
                {
                    return Err(ProgramError::InvalidSignature);
                }
            }
            Ok(())
        }
    }
}
