use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose, Engine as _};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::{AppError, AppResult};
use crate::faces::descriptor::Descriptor;
use crate::faces::enrollment::validate_identity;
use crate::store_key::StoreKey;

pub const DEFAULT_STORE_DIR: &str = "/var/lib/facematch/descriptors";
const STORE_DIR_ENV: &str = "FACEMATCH_STORE_DIR";
const STORE_VERSION: u32 = 1;
const STORE_ALGORITHM: &str = "AES-256-GCM";
const STORE_NONCE_LEN: usize = 12;
const STORE_EXTENSION: &str = "json";

/// One persisted enrollment record, kept in its serialized form until a
/// caller decodes it. A corrupt record therefore never prevents the rest of
/// an identity's set from loading.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredSample(Value);

impl StoredSample {
    pub fn from_descriptor(descriptor: &Descriptor) -> AppResult<Self> {
        Ok(Self(serde_json::to_value(descriptor)?))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn decode(&self, identity: &str, index: usize) -> AppResult<Descriptor> {
        Descriptor::deserialize(&self.0).map_err(|err| AppError::CorruptRecord {
            identity: identity.to_string(),
            index,
            message: err.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnrolledIdentity {
    pub identity: String,
    pub has_samples: bool,
}

/// Per-identity ordered descriptor storage.
///
/// Implementations must keep insertion order stable across reads and must
/// serialize mutations of the same identity.
pub trait DescriptorStore {
    fn get_samples(&self, identity: &str) -> AppResult<Vec<StoredSample>>;
    fn append_sample(&self, identity: &str, descriptor: &Descriptor) -> AppResult<()>;
    /// Fails with [`AppError::SampleIndexOutOfRange`] and leaves the set
    /// untouched when `index` is past the end.
    fn remove_sample_at(&self, identity: &str, index: usize) -> AppResult<()>;
    fn clear_samples(&self, identity: &str) -> AppResult<()>;
    /// Identities in a deterministic order (ascending identity id).
    fn list_enrolled_identities(&self) -> AppResult<Vec<EnrolledIdentity>>;
}

impl<T: DescriptorStore + ?Sized> DescriptorStore for &T {
    fn get_samples(&self, identity: &str) -> AppResult<Vec<StoredSample>> {
        (**self).get_samples(identity)
    }

    fn append_sample(&self, identity: &str, descriptor: &Descriptor) -> AppResult<()> {
        (**self).append_sample(identity, descriptor)
    }

    fn remove_sample_at(&self, identity: &str, index: usize) -> AppResult<()> {
        (**self).remove_sample_at(identity, index)
    }

    fn clear_samples(&self, identity: &str) -> AppResult<()> {
        (**self).clear_samples(identity)
    }

    fn list_enrolled_identities(&self) -> AppResult<Vec<EnrolledIdentity>> {
        (**self).list_enrolled_identities()
    }
}

pub trait StoreDirResolver {
    fn resolve(&self, override_dir: Option<&Path>) -> PathBuf;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnvStoreDirResolver;

impl StoreDirResolver for EnvStoreDirResolver {
    fn resolve(&self, override_dir: Option<&Path>) -> PathBuf {
        if let Some(dir) = override_dir {
            dir.to_path_buf()
        } else if let Ok(env_value) = env::var(STORE_DIR_ENV) {
            PathBuf::from(env_value)
        } else {
            PathBuf::from(DEFAULT_STORE_DIR)
        }
    }
}

pub fn identity_store_path(store_dir: &Path, identity: &str) -> PathBuf {
    store_dir.join(format!("{identity}.{STORE_EXTENSION}"))
}

/// One JSON file per identity, optionally sealed with AES-256-GCM.
pub struct FilesystemDescriptorStore {
    dir: PathBuf,
    key: Option<StoreKey>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl FilesystemDescriptorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            key: None,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_key(mut self, key: Option<StoreKey>) -> Self {
        self.key = key;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, identity: &str) -> AppResult<PathBuf> {
        validate_identity(identity)?;
        Ok(identity_store_path(&self.dir, identity))
    }

    fn key_bytes(&self) -> Option<&[u8]> {
        self.key.as_ref().map(StoreKey::as_bytes)
    }

    fn identity_lock(&self, identity: &str) -> Arc<Mutex<()>> {
        let mut locks = lock_ignoring_poison(&self.locks);
        Arc::clone(locks.entry(identity.to_string()).or_default())
    }

    fn mutate<F>(&self, identity: &str, update: F) -> AppResult<()>
    where
        F: FnOnce(&mut Vec<Value>) -> AppResult<()>,
    {
        let path = self.path_for(identity)?;
        let lock = self.identity_lock(identity);
        let _guard = lock_ignoring_poison(lock.as_ref());

        let mut records = read_store_file(&path, self.key_bytes())?;
        update(&mut records)?;
        if records.is_empty() {
            return remove_store_file(&path);
        }
        write_store_file(&path, &records, self.key_bytes())
    }
}

impl DescriptorStore for FilesystemDescriptorStore {
    fn get_samples(&self, identity: &str) -> AppResult<Vec<StoredSample>> {
        let path = self.path_for(identity)?;
        let records = read_store_file(&path, self.key_bytes())?;
        Ok(records.into_iter().map(StoredSample::from_value).collect())
    }

    fn append_sample(&self, identity: &str, descriptor: &Descriptor) -> AppResult<()> {
        let record = serde_json::to_value(descriptor)?;
        self.mutate(identity, |records| {
            records.push(record);
            debug!(identity, count = records.len(), "appended descriptor");
            Ok(())
        })
    }

    fn remove_sample_at(&self, identity: &str, index: usize) -> AppResult<()> {
        self.mutate(identity, |records| {
            if index >= records.len() {
                return Err(AppError::SampleIndexOutOfRange {
                    identity: identity.to_string(),
                    index,
                    len: records.len(),
                });
            }
            records.remove(index);
            Ok(())
        })
    }

    fn clear_samples(&self, identity: &str) -> AppResult<()> {
        let path = self.path_for(identity)?;
        let lock = self.identity_lock(identity);
        let _guard = lock_ignoring_poison(lock.as_ref());

        remove_store_file(&path)
    }

    fn list_enrolled_identities(&self) -> AppResult<Vec<EnrolledIdentity>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(AppError::StoreRead {
                    path: self.dir.clone(),
                    source,
                })
            }
        };

        let mut identities = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| AppError::StoreRead {
                path: self.dir.clone(),
                source,
            })?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(STORE_EXTENSION) {
                continue;
            }
            let Some(identity) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if validate_identity(identity).is_err() {
                continue;
            }

            // Emptied sets are deleted, so any non-empty file counts as enrolled.
            // Unreadable contents surface when the caller loads the set.
            let metadata = entry.metadata().map_err(|source| AppError::StoreRead {
                path: path.clone(),
                source,
            })?;
            if !metadata.is_file() {
                continue;
            }
            let has_samples = metadata.len() > 0;
            identities.push(EnrolledIdentity {
                identity: identity.to_string(),
                has_samples,
            });
        }

        identities.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(identities)
    }
}

/// Volatile store with the same ordering rules as the filesystem store.
#[derive(Debug, Default)]
pub struct MemoryDescriptorStore {
    sets: Mutex<BTreeMap<String, Vec<StoredSample>>>,
}

impl MemoryDescriptorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an arbitrary record without validation (useful for importing
    /// existing sets verbatim).
    pub fn insert_raw(&self, identity: &str, value: Value) {
        let mut sets = lock_ignoring_poison(&self.sets);
        sets.entry(identity.to_string())
            .or_default()
            .push(StoredSample::from_value(value));
    }
}

impl DescriptorStore for MemoryDescriptorStore {
    fn get_samples(&self, identity: &str) -> AppResult<Vec<StoredSample>> {
        let sets = lock_ignoring_poison(&self.sets);
        Ok(sets.get(identity).cloned().unwrap_or_default())
    }

    fn append_sample(&self, identity: &str, descriptor: &Descriptor) -> AppResult<()> {
        let sample = StoredSample::from_descriptor(descriptor)?;
        let mut sets = lock_ignoring_poison(&self.sets);
        sets.entry(identity.to_string()).or_default().push(sample);
        Ok(())
    }

    fn remove_sample_at(&self, identity: &str, index: usize) -> AppResult<()> {
        let mut sets = lock_ignoring_poison(&self.sets);
        let len = sets.get(identity).map_or(0, Vec::len);
        if index >= len {
            return Err(AppError::SampleIndexOutOfRange {
                identity: identity.to_string(),
                index,
                len,
            });
        }
        if let Some(samples) = sets.get_mut(identity) {
            samples.remove(index);
            if samples.is_empty() {
                sets.remove(identity);
            }
        }
        Ok(())
    }

    fn clear_samples(&self, identity: &str) -> AppResult<()> {
        let mut sets = lock_ignoring_poison(&self.sets);
        sets.remove(identity);
        Ok(())
    }

    fn list_enrolled_identities(&self) -> AppResult<Vec<EnrolledIdentity>> {
        let sets = lock_ignoring_poison(&self.sets);
        Ok(sets
            .iter()
            .map(|(identity, samples)| EnrolledIdentity {
                identity: identity.clone(),
                has_samples: !samples.is_empty(),
            })
            .collect())
    }
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub fn read_store_file(path: &Path, key: Option<&[u8]>) -> AppResult<Vec<Value>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(AppError::StoreRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if let Ok(wrapper) = serde_json::from_slice::<EncryptedDescriptorStore>(&data) {
        return decrypt_encrypted_store(path, wrapper, key);
    }

    serde_json::from_slice(&data).map_err(|err| AppError::InvalidStore {
        path: path.to_path_buf(),
        message: format!("expected a JSON array of descriptors: {err}"),
    })
}

fn remove_store_file(path: &Path) -> AppResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(AppError::StoreWrite {
            path: path.to_path_buf(),
            source,
        }),
    }
}

pub fn write_store_file(path: &Path, records: &[Value], key: Option<&[u8]>) -> AppResult<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|source| AppError::StoreWrite {
        path: parent.to_path_buf(),
        source,
    })?;

    let mut tmp = NamedTempFile::new_in(parent).map_err(|source| AppError::StoreWrite {
        path: path.to_path_buf(),
        source,
    })?;

    {
        let file = tmp.as_file_mut();
        {
            let mut writer = BufWriter::new(&mut *file);
            let serialized = if let Some(key_bytes) = key {
                serialize_encrypted_store(records, key_bytes)?
            } else {
                serde_json::to_vec_pretty(records)?
            };
            writer
                .write_all(&serialized)
                .and_then(|_| writer.write_all(b"\n"))
                .and_then(|_| writer.flush())
                .map_err(|source| AppError::StoreWrite {
                    path: path.to_path_buf(),
                    source,
                })?;
        }
        file.sync_all().map_err(|source| AppError::StoreWrite {
            path: path.to_path_buf(),
            source,
        })?;
    }

    let file = tmp.persist(path).map_err(|err| AppError::StoreWrite {
        path: path.to_path_buf(),
        source: err.error,
    })?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file
            .metadata()
            .map_err(|source| AppError::StoreWrite {
                path: path.to_path_buf(),
                source,
            })?
            .permissions();
        perms.set_mode(0o600);
        file.set_permissions(perms)
            .map_err(|source| AppError::StoreWrite {
                path: path.to_path_buf(),
                source,
            })?;
    }
    #[cfg(not(unix))]
    drop(file);

    Ok(())
}

fn serialize_encrypted_store(records: &[Value], key: &[u8]) -> AppResult<Vec<u8>> {
    let plaintext = serde_json::to_vec(records)?;
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| AppError::Encryption("invalid AES-GCM key length".into()))?;
    let mut nonce = [0u8; STORE_NONCE_LEN];
    OsRng.fill_bytes(&mut nonce);
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext.as_ref())
        .map_err(|err| AppError::Encryption(format!("failed to encrypt descriptor store: {err}")))?;
    let wrapper = EncryptedDescriptorStore {
        version: STORE_VERSION,
        algorithm: STORE_ALGORITHM.to_string(),
        nonce: general_purpose::STANDARD.encode(nonce),
        ciphertext: general_purpose::STANDARD.encode(ciphertext),
    };
    serde_json::to_vec_pretty(&wrapper).map_err(AppError::from)
}

fn decrypt_encrypted_store(
    path: &Path,
    wrapper: EncryptedDescriptorStore,
    key: Option<&[u8]>,
) -> AppResult<Vec<Value>> {
    if wrapper.algorithm != STORE_ALGORITHM {
        return Err(AppError::Encryption(format!(
            "unsupported descriptor store algorithm '{}'",
            wrapper.algorithm
        )));
    }
    if wrapper.version != STORE_VERSION {
        return Err(AppError::Encryption(format!(
            "unsupported descriptor store version {}",
            wrapper.version
        )));
    }

    let key_bytes = key.ok_or_else(|| AppError::EncryptedStoreRequiresKey {
        path: path.to_path_buf(),
    })?;

    let nonce_bytes = general_purpose::STANDARD
        .decode(wrapper.nonce.trim())
        .map_err(|err| AppError::Encryption(format!("invalid nonce encoding: {err}")))?;
    if nonce_bytes.len() != STORE_NONCE_LEN {
        return Err(AppError::Encryption(format!(
            "expected nonce of {} bytes but found {}",
            STORE_NONCE_LEN,
            nonce_bytes.len()
        )));
    }

    let ciphertext = general_purpose::STANDARD
        .decode(wrapper.ciphertext.trim())
        .map_err(|err| AppError::Encryption(format!("invalid ciphertext encoding: {err}")))?;

    let cipher = Aes256Gcm::new_from_slice(key_bytes)
        .map_err(|_| AppError::Encryption("invalid AES-GCM key length".into()))?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|err| AppError::Encryption(format!("failed to decrypt descriptor store: {err}")))?;

    serde_json::from_slice(&plaintext).map_err(|err| AppError::InvalidStore {
        path: path.to_path_buf(),
        message: format!("invalid decrypted descriptor store contents: {err}"),
    })
}

#[derive(Serialize, Deserialize)]
struct EncryptedDescriptorStore {
    version: u32,
    algorithm: String,
    nonce: String,
    ciphertext: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    use serde_json::json;
    use tempfile::TempDir;

    use crate::faces::descriptor::{Rectangle, DESCRIPTOR_LEN};

    fn descriptor(marker: f32) -> Descriptor {
        Descriptor::new([marker; DESCRIPTOR_LEN], Rectangle::new(0, 0, 8, 8))
    }

    fn decoded(store: &impl DescriptorStore, identity: &str) -> Vec<Descriptor> {
        store
            .get_samples(identity)
            .unwrap()
            .iter()
            .enumerate()
            .map(|(idx, sample)| sample.decode(identity, idx).unwrap())
            .collect()
    }

    #[test]
    fn filesystem_store_keeps_insertion_order() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemDescriptorStore::new(tmp.path());
        for marker in [0.1, 0.2, 0.3] {
            store.append_sample("t1", &descriptor(marker)).unwrap();
        }

        let samples = decoded(&store, "t1");
        let markers: Vec<f32> = samples.iter().map(|d| d.vector()[0]).collect();
        assert_eq!(markers, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn filesystem_store_round_trip_with_encryption() {
        let tmp = TempDir::new().unwrap();
        let key = StoreKey::from_bytes(vec![0x22u8; 32]).unwrap();
        let store = FilesystemDescriptorStore::new(tmp.path()).with_key(Some(key.clone()));
        store.append_sample("t1", &descriptor(0.5)).unwrap();

        let raw = fs::read_to_string(tmp.path().join("t1.json")).unwrap();
        assert!(raw.contains(STORE_ALGORITHM));
        assert_eq!(decoded(&store, "t1"), vec![descriptor(0.5)]);

        let keyless = FilesystemDescriptorStore::new(tmp.path());
        let err = keyless.get_samples("t1").unwrap_err();
        assert!(matches!(err, AppError::EncryptedStoreRequiresKey { .. }));
    }

    #[test]
    fn remove_out_of_range_leaves_file_untouched() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemDescriptorStore::new(tmp.path());
        store.append_sample("t1", &descriptor(0.1)).unwrap();
        let before = fs::read(tmp.path().join("t1.json")).unwrap();

        let err = store.remove_sample_at("t1", 1).unwrap_err();
        match err {
            AppError::SampleIndexOutOfRange { index, len, .. } => {
                assert_eq!((index, len), (1, 1));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(fs::read(tmp.path().join("t1.json")).unwrap(), before);
    }

    #[test]
    fn clear_removes_identity_from_listing() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemDescriptorStore::new(tmp.path());
        store.append_sample("b", &descriptor(0.1)).unwrap();
        store.append_sample("a", &descriptor(0.2)).unwrap();
        fs::write(tmp.path().join("notes.txt"), "ignored").unwrap();

        let listed = store.list_enrolled_identities().unwrap();
        let names: Vec<&str> = listed.iter().map(|e| e.identity.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);

        store.clear_samples("a").unwrap();
        assert!(store.get_samples("a").unwrap().is_empty());
        let listed = store.list_enrolled_identities().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].identity, "b");
    }

    #[test]
    fn missing_directory_lists_nothing() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemDescriptorStore::new(tmp.path().join("absent"));
        assert!(store.list_enrolled_identities().unwrap().is_empty());
    }

    #[test]
    fn invalid_identity_is_rejected_before_io() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemDescriptorStore::new(tmp.path());
        let err = store.append_sample("../escape", &descriptor(0.1)).unwrap_err();
        assert!(matches!(err, AppError::InvalidIdentity { .. }));
    }

    #[test]
    fn unparseable_file_is_invalid_store() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("t1.json"), "{ not json").unwrap();
        let store = FilesystemDescriptorStore::new(tmp.path());

        let err = store.get_samples("t1").unwrap_err();
        assert!(matches!(err, AppError::InvalidStore { .. }));
        let listed = store.list_enrolled_identities().unwrap();
        assert!(listed[0].has_samples);
    }

    #[test]
    fn removing_last_sample_deletes_identity_file() {
        let tmp = TempDir::new().unwrap();
        let store = FilesystemDescriptorStore::new(tmp.path());
        store.append_sample("t1", &descriptor(0.1)).unwrap();
        store.remove_sample_at("t1", 0).unwrap();

        assert!(!tmp.path().join("t1.json").exists());
        assert!(store.list_enrolled_identities().unwrap().is_empty());
    }

    #[test]
    fn listing_does_not_decrypt_identity_files() {
        let tmp = TempDir::new().unwrap();
        let key = StoreKey::from_bytes(vec![0x22u8; 32]).unwrap();
        let store = FilesystemDescriptorStore::new(tmp.path()).with_key(Some(key));
        fs::write(
            tmp.path().join("t1.json"),
            json!({
                "version": STORE_VERSION,
                "algorithm": STORE_ALGORITHM,
                "nonce": general_purpose::STANDARD.encode([0u8; STORE_NONCE_LEN]),
                "ciphertext": general_purpose::STANDARD.encode([0u8; 32]),
            })
            .to_string(),
        )
        .unwrap();

        let listed = store.list_enrolled_identities().unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].has_samples);
        assert!(matches!(
            store.get_samples("t1").unwrap_err(),
            AppError::Encryption(_)
        ));
    }

    #[test]
    fn concurrent_appends_to_one_identity_are_not_lost() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(FilesystemDescriptorStore::new(tmp.path()));

        let handles: Vec<_> = (0..8)
            .map(|n| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    store.append_sample("t1", &descriptor(n as f32)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.get_samples("t1").unwrap().len(), 8);
    }

    #[test]
    fn memory_store_reports_corrupt_records_on_decode() {
        let store = MemoryDescriptorStore::new();
        store.append_sample("t1", &descriptor(0.1)).unwrap();
        store.insert_raw("t1", json!({"descriptor": [1.0, 2.0], "rectangle": null}));

        let samples = store.get_samples("t1").unwrap();
        assert!(samples[0].decode("t1", 0).is_ok());
        match samples[1].decode("t1", 1).unwrap_err() {
            AppError::CorruptRecord {
                identity, index, ..
            } => {
                assert_eq!(identity, "t1");
                assert_eq!(index, 1);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn memory_store_removal_to_empty_unenrolls() {
        let store = MemoryDescriptorStore::new();
        store.append_sample("t1", &descriptor(0.1)).unwrap();
        store.remove_sample_at("t1", 0).unwrap();
        assert!(store.list_enrolled_identities().unwrap().is_empty());
        assert!(matches!(
            store.remove_sample_at("t1", 0).unwrap_err(),
            AppError::SampleIndexOutOfRange { len: 0, .. }
        ));
    }

    #[test]
    fn store_dir_prefers_override() {
        let tmp = TempDir::new().unwrap();
        let override_dir = tmp.path().join("override");
        let resolved = EnvStoreDirResolver.resolve(Some(&override_dir));
        assert_eq!(resolved, override_dir);
        assert_eq!(
            identity_store_path(&resolved, "t1"),
            override_dir.join("t1.json")
        );
    }
}
