//! Peer identity and the seeds it is derived from.
//!
//! Every daemon owns two long-lived 32-byte seeds kept in a small JSON
//! seed store: one for peer discovery, one for the RPC transport. Missing
//! seeds are generated and written on first run. The transport keypair's
//! public key, hex-encoded, is the node's `PeerId`.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Seed store key for the discovery keypair.
pub const DISCOVERY_SEED: &str = "discovery-seed";
/// Seed store key for the transport keypair.
pub const TRANSPORT_SEED: &str = "transport-seed";

// ── PeerId ────────────────────────────────────────────────────────────────────

/// Opaque, globally unique participant identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeerId(String);

impl PeerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identity for a transport public key.
    pub fn from_public_key(public: &[u8; 32]) -> Self {
        Self(hex::encode(public))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 16 characters, for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..16).unwrap_or(&self.0)
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PeerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PeerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ── Keypair ───────────────────────────────────────────────────────────────────

/// A long-term static X25519 keypair derived from a stored seed.
///
/// The private key never leaves this struct and is wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Keypair {
    private: Zeroizing<[u8; 32]>,
    pub public: [u8; 32],
}

impl Keypair {
    /// Reconstruct a keypair from seed bytes.
    /// The public key is derived deterministically from the seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        let secret = StaticSecret::from(*seed);
        let public = PublicKey::from(&secret);
        Self {
            private: Zeroizing::new(*seed),
            public: *public.as_bytes(),
        }
    }

    pub fn peer_id(&self) -> PeerId {
        PeerId::from_public_key(&self.public)
    }
}

// ── Seed store ────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SeedStoreError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, serde_json::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("seed '{0}' is not 32 hex-encoded bytes")]
    InvalidSeed(String),
}

/// File-backed key-value store of named 32-byte seeds.
///
/// The file is a JSON object of `name -> hex(seed)`, created with mode 0600.
pub struct SeedStore {
    path: PathBuf,
}

impl SeedStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetch the named seed, generating and persisting it if absent.
    pub fn load_or_generate(&self, name: &str) -> Result<Zeroizing<[u8; 32]>, SeedStoreError> {
        let mut seeds = self.read_all()?;

        if let Some(hex_seed) = seeds.get(name) {
            let bytes = Zeroizing::new(
                hex::decode(hex_seed).map_err(|_| SeedStoreError::InvalidSeed(name.to_string()))?,
            );
            if bytes.len() != 32 {
                return Err(SeedStoreError::InvalidSeed(name.to_string()));
            }
            let mut seed = Zeroizing::new([0u8; 32]);
            seed.copy_from_slice(&bytes);
            return Ok(seed);
        }

        let mut seed = Zeroizing::new([0u8; 32]);
        rand::thread_rng().fill_bytes(&mut seed[..]);
        seeds.insert(name.to_string(), hex::encode(*seed));
        self.write_all(&seeds)?;
        tracing::info!(name, path = %self.path.display(), "generated new seed");
        Ok(seed)
    }

    fn read_all(&self) -> Result<HashMap<String, String>, SeedStoreError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(SeedStoreError::ReadFailed(self.path.clone(), e)),
        };
        serde_json::from_str(&text).map_err(|e| SeedStoreError::ParseFailed(self.path.clone(), e))
    }

    fn write_all(&self, seeds: &HashMap<String, String>) -> Result<(), SeedStoreError> {
        use std::io::Write;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| SeedStoreError::WriteFailed(self.path.clone(), e))?;
        }
        let json = Zeroizing::new(
            serde_json::to_string_pretty(seeds)
                .map_err(|e| SeedStoreError::ParseFailed(self.path.clone(), e))?,
        );

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options
            .open(&self.path)
            .map_err(|e| SeedStoreError::WriteFailed(self.path.clone(), e))?;
        file.write_all(json.as_bytes())
            .map_err(|e| SeedStoreError::WriteFailed(self.path.clone(), e))
    }
}

// ── Node identity ─────────────────────────────────────────────────────────────

/// Everything a daemon needs to present itself: peer id plus both keypairs.
pub struct NodeIdentity {
    pub peer_id: PeerId,
    pub transport: Keypair,
    pub discovery: Keypair,
}

impl NodeIdentity {
    /// Load both seeds from the store, creating any that are missing.
    pub fn load_or_create(store: &SeedStore) -> Result<Self, SeedStoreError> {
        let discovery = Keypair::from_seed(&*store.load_or_generate(DISCOVERY_SEED)?);
        let transport = Keypair::from_seed(&*store.load_or_generate(TRANSPORT_SEED)?);
        Ok(Self {
            peer_id: transport.peer_id(),
            transport,
            discovery,
        })
    }

    /// Hex public key used to announce this node on the discovery layer.
    pub fn discovery_key(&self) -> String {
        hex::encode(self.discovery.public)
    }
}
