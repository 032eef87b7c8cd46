use cryptoxide::ed25519;

pub const PUBLIC_KEY_LENGTH: usize = ed25519::PUBLIC_KEY_LENGTH;
pub const SIGNATURE_LENGTH: usize = ed25519::SIGNATURE_LENGTH;

/// the signature checking capability the validators rely on
///
/// the validators never look into the key or signature formats, they only
/// ask whether `signature` is a valid signature of `message` by `public_key`.
pub trait SignatureVerifier: Send + Sync {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool;
}

/// Ed25519 signatures
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519;

impl SignatureVerifier for Ed25519 {
    fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        let public_key: &[u8; PUBLIC_KEY_LENGTH] = match public_key.try_into() {
            Ok(public_key) => public_key,
            Err(_) => return false,
        };
        let signature: &[u8; SIGNATURE_LENGTH] = match signature.try_into() {
            Ok(signature) => signature,
            Err(_) => return false,
        };
        ed25519::verify(message, public_key, signature)
    }
}

/// Ed25519 key pair, used by wallets and arbitrators to produce the
/// signatures the validators check.
#[derive(Clone)]
pub struct Ed25519Keypair {
    keypair: [u8; ed25519::KEYPAIR_LENGTH],
    public_key: [u8; PUBLIC_KEY_LENGTH],
}

impl Ed25519Keypair {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let (keypair, public_key) = ed25519::keypair(seed);
        Self {
            keypair,
            public_key,
        }
    }

    #[inline]
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.public_key
    }

    pub fn sign(&self, message: &[u8]) -> [u8; SIGNATURE_LENGTH] {
        ed25519::signature(message, &self.keypair)
    }
}

impl std::fmt::Debug for Ed25519Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Keypair")
            .field("public_key", &hex::encode(self.public_key))
            .finish_non_exhaustive()
    }
}
