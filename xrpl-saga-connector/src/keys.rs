//! Ed25519 key material in the ledger's encodings.
//!
//! Seeds are 16 bytes of entropy in base58check with the `sEd` family prefix.
//! The signing key is the first half of SHA-512 over that entropy, the public
//! key is `0xED` followed by the 32-byte Ed25519 key, and the account ID is
//! RIPEMD-160 of SHA-256 of the public key.

use crate::{error::TransactionError, types::Address};
use ed25519_dalek::{Signer, SigningKey};
use rand::{rngs::OsRng, RngCore};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256, Sha512};
use zeroize::Zeroizing;

const ACCOUNT_ID_PREFIX: u8 = 0x00;
const ED25519_SEED_PREFIX: [u8; 3] = [0x01, 0xE1, 0x4B];
const SECP256K1_SEED_PREFIX: u8 = 0x21;
const ED25519_KEY_PREFIX: u8 = 0xED;
const ENTROPY_LEN: usize = 16;

pub(crate) const ACCOUNT_ID_LEN: usize = 20;

/// First 32 bytes of SHA-512 over the concatenated parts.
pub(crate) fn sha512_half(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha512::new();
    for part in parts {
        hasher.update(part);
    }
    let digest = hasher.finalize();
    let mut half = [0u8; 32];
    half.copy_from_slice(&digest[..32]);
    half
}

fn checksum(payload: &[u8]) -> [u8; 4] {
    let digest = Sha256::digest(Sha256::digest(payload));
    [digest[0], digest[1], digest[2], digest[3]]
}

fn encode_check(payload: &[u8]) -> String {
    let mut data = payload.to_vec();
    data.extend_from_slice(&checksum(payload));
    bs58::encode(data)
        .with_alphabet(bs58::Alphabet::RIPPLE)
        .into_string()
}

fn decode_check(encoded: &str) -> Option<Zeroizing<Vec<u8>>> {
    let data = Zeroizing::new(
        bs58::decode(encoded)
            .with_alphabet(bs58::Alphabet::RIPPLE)
            .into_vec()
            .ok()?,
    );
    if data.len() <= 4 {
        return None;
    }
    let (payload, check) = data.split_at(data.len() - 4);
    (checksum(payload).as_slice() == check).then(|| Zeroizing::new(payload.to_vec()))
}

/// Decodes an address into its 20-byte account ID, verifying the checksum.
pub(crate) fn account_id(address: &Address) -> Result<[u8; ACCOUNT_ID_LEN], TransactionError> {
    let payload = decode_check(address.as_str())
        .filter(|p| p.len() == ACCOUNT_ID_LEN + 1 && p[0] == ACCOUNT_ID_PREFIX)
        .ok_or_else(|| TransactionError::InvalidAddress(address.to_string()))?;
    let mut id = [0u8; ACCOUNT_ID_LEN];
    id.copy_from_slice(&payload[1..]);
    Ok(id)
}

fn address_for(public_key: &[u8]) -> Address {
    let id = Ripemd160::digest(Sha256::digest(public_key));
    let mut payload = Vec::with_capacity(ACCOUNT_ID_LEN + 1);
    payload.push(ACCOUNT_ID_PREFIX);
    payload.extend_from_slice(&id);
    Address::from_encoded(encode_check(&payload))
}

/// An Ed25519 signing key with its ledger-encoded public key.
pub(crate) struct Keypair {
    signing_key: SigningKey,
    public_key: [u8; 33],
}

impl Keypair {
    /// Derives the keypair from an `sEd...` family seed.
    pub(crate) fn from_seed(seed: &str) -> Result<Self, TransactionError> {
        let payload =
            decode_check(seed).ok_or(TransactionError::InvalidSeed("not a base58check seed"))?;
        match payload.as_slice() {
            [a, b, c, entropy @ ..]
                if [*a, *b, *c] == ED25519_SEED_PREFIX && entropy.len() == ENTROPY_LEN =>
            {
                Ok(Self::from_entropy(entropy))
            }
            [SECP256K1_SEED_PREFIX, entropy @ ..] if entropy.len() == ENTROPY_LEN => {
                Err(TransactionError::InvalidSeed(
                    "secp256k1 seeds are not supported, use an Ed25519 (sEd) seed",
                ))
            }
            _ => Err(TransactionError::InvalidSeed("unrecognized seed encoding")),
        }
    }

    /// Creates a random keypair and returns it with its encoded seed.
    pub(crate) fn generate() -> (Self, Zeroizing<String>) {
        let mut entropy = Zeroizing::new([0u8; ENTROPY_LEN]);
        OsRng.fill_bytes(&mut entropy[..]);

        let mut payload = Zeroizing::new(ED25519_SEED_PREFIX.to_vec());
        payload.extend_from_slice(&entropy[..]);
        let seed = Zeroizing::new(encode_check(&payload));
        (Self::from_entropy(&entropy[..]), seed)
    }

    fn from_entropy(entropy: &[u8]) -> Self {
        let secret = Zeroizing::new(sha512_half(&[entropy]));
        let signing_key = SigningKey::from_bytes(&secret);
        let mut public_key = [0u8; 33];
        public_key[0] = ED25519_KEY_PREFIX;
        public_key[1..].copy_from_slice(signing_key.verifying_key().as_bytes());
        Self {
            signing_key,
            public_key,
        }
    }

    pub(crate) fn public_key(&self) -> &[u8; 33] {
        &self.public_key
    }

    pub(crate) fn address(&self) -> Address {
        address_for(&self.public_key)
    }

    /// Ed25519 signs the message itself, without pre-hashing.
    pub(crate) fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signature, Verifier};

    #[test]
    fn derives_the_known_ed25519_account() {
        let keypair = Keypair::from_seed("sEdSKaCy2JT7JaM7v95H9SxkhP9wS2r").unwrap();
        assert_eq!(
            hex::encode_upper(keypair.public_key()),
            "ED01FA53FA5A7E77798F882ECE20B1ABC00BB358A9E55A202D0D0676BD0CE37A63"
        );
        assert_eq!(keypair.address().as_str(), "rLUEXYuLiQptky37CqLcm9USQpPiz5rkpD");
    }

    #[test]
    fn generated_seed_reproduces_the_keypair() {
        let (keypair, seed) = Keypair::generate();
        assert!(seed.starts_with("sEd"));
        let restored = Keypair::from_seed(&seed).unwrap();
        assert_eq!(restored.public_key(), keypair.public_key());
        assert_eq!(restored.address(), keypair.address());
    }

    #[test]
    fn signatures_verify_against_the_public_key() {
        let (keypair, _) = Keypair::generate();
        let signature = Signature::from_bytes(&keypair.sign(b"payload"));
        keypair
            .signing_key
            .verifying_key()
            .verify(b"payload", &signature)
            .unwrap();
    }

    #[test]
    fn rejects_unsupported_and_corrupt_seeds() {
        assert!(matches!(
            Keypair::from_seed("snoPBrXtMeMyMHUVTgbuqAfg1SUTb"),
            Err(TransactionError::InvalidSeed(_))
        ));
        assert!(Keypair::from_seed("sEdSKaCy2JT7JaM7v95H9SxkhP9wS2s").is_err());
        assert!(Keypair::from_seed("sHotSeed").is_err());
    }

    #[test]
    fn account_id_checks_the_checksum() {
        let (keypair, _) = Keypair::generate();
        let id = account_id(&keypair.address()).unwrap();
        assert_eq!(id.len(), ACCOUNT_ID_LEN);

        let corrupt = Address::parse("rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDZ").unwrap();
        assert!(account_id(&corrupt).is_err());
        assert!(account_id(&Address::parse("rPEPPER7kfTD9w2To4CQk6UCfuHM9c6GDY").unwrap()).is_ok());
    }
}
