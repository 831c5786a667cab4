use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::error::BackupError;
use crate::history::MemoryHistory;
use crate::settings::Settings;

const MAGIC: &[u8; 4] = b"CYCB";
const FORMAT_VERSION: u8 = 1;
const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = MAGIC.len() + 1 + SALT_LEN + NONCE_LEN;

/// Everything needed to restore a tracker on another device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub exported_at: DateTime<Utc>,
    pub settings: Settings,
    pub history: MemoryHistory,
}

impl Snapshot {
    pub fn new(settings: Settings, history: MemoryHistory) -> Self {
        Self {
            exported_at: Utc::now(),
            settings,
            history,
        }
    }
}

fn derive_key(passphrase: &str, salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>, BackupError> {
    // argon2's recommended defaults: 19 MiB, 2 passes, 1 lane
    let params = Params::new(19_456, 2, 1, Some(KEY_LEN)).map_err(|_| BackupError::KeyDerivation)?;
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
        .hash_password_into(passphrase.as_bytes(), salt, &mut key[..])
        .map_err(|_| BackupError::KeyDerivation)?;
    Ok(key)
}

/// Seal a snapshot under `passphrase`.
///
/// Layout: `CYCB` | version | salt | nonce | AES-256-GCM ciphertext. The
/// header is authenticated as associated data.
pub fn seal(passphrase: &str, snapshot: &Snapshot) -> Result<Vec<u8>, BackupError> {
    let plaintext = Zeroizing::new(serde_json::to_vec(snapshot)?);

    let mut header = Vec::with_capacity(HEADER_LEN);
    header.extend_from_slice(MAGIC);
    header.push(FORMAT_VERSION);
    let mut salt = [0u8; SALT_LEN];
    let mut nonce = [0u8; NONCE_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut nonce);
    header.extend_from_slice(&salt);
    header.extend_from_slice(&nonce);

    let key = derive_key(passphrase, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| BackupError::Encryption)?;
    let ciphertext = cipher
        .encrypt(
            Nonce::from_slice(&nonce),
            Payload {
                msg: plaintext.as_slice(),
                aad: &header,
            },
        )
        .map_err(|_| BackupError::Encryption)?;

    let mut out = header;
    out.extend_from_slice(&ciphertext);
    info!(bytes = out.len(), cycles = snapshot.history.cycles().len(), "sealed backup");
    Ok(out)
}

/// Open a sealed backup. Settings ranges and history invariants are
/// checked before the snapshot is returned.
pub fn open(passphrase: &str, sealed: &[u8]) -> Result<Snapshot, BackupError> {
    if sealed.len() < HEADER_LEN + TAG_LEN
        || &sealed[..MAGIC.len()] != MAGIC
        || sealed[MAGIC.len()] != FORMAT_VERSION
    {
        return Err(BackupError::Format);
    }
    let (header, ciphertext) = sealed.split_at(HEADER_LEN);
    let salt = &header[MAGIC.len() + 1..MAGIC.len() + 1 + SALT_LEN];
    let nonce = &header[MAGIC.len() + 1 + SALT_LEN..];

    let key = derive_key(passphrase, salt)?;
    let cipher = Aes256Gcm::new_from_slice(&key[..]).map_err(|_| BackupError::Decryption)?;
    let plaintext = cipher
        .decrypt(
            Nonce::from_slice(nonce),
            Payload {
                msg: ciphertext,
                aad: header,
            },
        )
        .map(Zeroizing::new)
        .map_err(|_| {
            warn!("backup authentication failed");
            BackupError::Decryption
        })?;

    let snapshot: Snapshot = serde_json::from_slice(&plaintext)?;
    snapshot.settings.validate()?;
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SettingsError;
    use crate::history::{DayEntry, RecordMode};
    use crate::models::FlowLevel;
    use chrono::NaiveDate;

    fn sample() -> Snapshot {
        let mut history = MemoryHistory::new();
        history
            .save_record(
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                RecordMode::Auto,
                DayEntry {
                    flow_level: Some(FlowLevel::Medium),
                    ..DayEntry::default()
                },
            )
            .unwrap();
        Snapshot::new(Settings::default(), history)
    }

    #[test]
    fn seal_then_open() {
        let snapshot = sample();
        let sealed = seal("correct horse", &snapshot).unwrap();
        assert_eq!(&sealed[..4], b"CYCB");
        let opened = open("correct horse", &sealed).unwrap();
        assert_eq!(opened, snapshot);
    }

    #[test]
    fn wrong_passphrase_fails() {
        let sealed = seal("correct", &sample()).unwrap();
        assert!(matches!(open("wrong", &sealed), Err(BackupError::Decryption)));
    }

    #[test]
    fn tampered_header_fails() {
        let mut sealed = seal("pw", &sample()).unwrap();
        sealed[6] ^= 0xff;
        assert!(open("pw", &sealed).is_err());
    }

    #[test]
    fn out_of_range_settings_are_rejected() {
        let mut snapshot = sample();
        snapshot.settings = Settings {
            cycle_length_default: 90,
            period_length_default: 30,
            auto_calculate_cycle: false,
            ..Settings::default()
        };
        let sealed = seal("pw", &snapshot).unwrap();
        assert!(matches!(
            open("pw", &sealed),
            Err(BackupError::InvalidSettings(SettingsError::CycleLengthOutOfRange(90)))
        ));
    }

    #[test]
    fn garbage_is_rejected_as_format() {
        assert!(matches!(open("pw", &[0u8; 10]), Err(BackupError::Format)));
        let mut fake = b"CYCB".to_vec();
        fake.push(9);
        fake.extend_from_slice(&[0u8; 64]);
        assert!(matches!(open("pw", &fake), Err(BackupError::Format)));
    }
}
