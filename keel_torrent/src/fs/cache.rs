use std::sync::{Arc, Mutex};

use lru_cache::LruCache;

use keel_util::bt::InfoHash;

/// Key naming one file of one torrent within the cache.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct FileKey {
    pub info_hash: InfoHash,
    pub file_index: usize,
}

struct CacheEntry<T> {
    file: Arc<Mutex<T>>,
    writable: bool,
}

/// Caches open file handles so piece I/O does not pay an open/close round
/// trip to the OS on every call.
///
/// Opens can be surprisingly expensive on end-user machines where virus
/// scanners hook file access, so handles are kept until evicted.
pub struct FileHandleCache<T> {
    cache: Mutex<LruCache<FileKey, CacheEntry<T>>>,
}

impl<T> FileHandleCache<T> {
    /// Create a new `FileHandleCache` with the given handle capacity.
    pub fn new(capacity: usize) -> FileHandleCache<T> {
        FileHandleCache {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn run_with_lock<C, R>(&self, call: C) -> R
    where
        C: FnOnce(&mut LruCache<FileKey, CacheEntry<T>>) -> R,
    {
        let mut lock_cache = self
            .cache
            .lock()
            .expect("keel_torrent: Failed To Lock Cache In FileHandleCache::run_with_lock");

        call(&mut lock_cache)
    }

    /// Fetch a cached handle opened in at least the requested mode.
    ///
    /// A handle cached read-only cannot serve a writable request; such an
    /// entry is evicted so the caller reopens the file with write access.
    pub fn get_cached(&self, key: FileKey, writable: bool) -> Option<Arc<Mutex<T>>> {
        self.run_with_lock(|cache| {
            match cache.get_mut(&key) {
                Some(entry) if entry.writable || !writable => return Some(entry.file.clone()),
                Some(_) => (),
                None => return None,
            }

            cache.remove(&key);

            None
        })
    }

    /// Insert a freshly opened handle and return it shared.
    ///
    /// The least recently used handle is closed once the capacity is hit.
    pub fn insert(&self, key: FileKey, file: T, writable: bool) -> Arc<Mutex<T>> {
        let file = Arc::new(Mutex::new(file));
        let entry = CacheEntry {
            file: file.clone(),
            writable,
        };

        self.run_with_lock(|cache| {
            cache.insert(key, entry);
        });

        file
    }

    /// Close every cached handle belonging to the given torrent.
    pub fn flush_torrent(&self, info_hash: InfoHash) {
        self.run_with_lock(|cache| {
            let stale_keys: Vec<FileKey> = cache
                .iter()
                .map(|(key, _)| *key)
                .filter(|key| key.info_hash == info_hash)
                .collect();

            for key in stale_keys {
                cache.remove(&key);
            }
        })
    }

    /// Close every cached handle.
    pub fn clear(&self) {
        self.run_with_lock(|cache| cache.clear())
    }
}

#[cfg(test)]
mod tests {
    use keel_util::bt::InfoHash;

    use super::{FileHandleCache, FileKey};

    fn key(hash_byte: u8, file_index: usize) -> FileKey {
        FileKey {
            info_hash: InfoHash::from([hash_byte; 20]),
            file_index,
        }
    }

    #[test]
    fn positive_hit_after_insert() {
        let cache = FileHandleCache::new(2);
        cache.insert(key(0, 0), "file", false);

        assert!(cache.get_cached(key(0, 0), false).is_some());
        assert!(cache.get_cached(key(0, 1), false).is_none());
    }

    #[test]
    fn positive_writable_entry_serves_reads() {
        let cache = FileHandleCache::new(2);
        cache.insert(key(0, 0), "file", true);

        assert!(cache.get_cached(key(0, 0), false).is_some());
        assert!(cache.get_cached(key(0, 0), true).is_some());
    }

    #[test]
    fn negative_read_only_entry_evicted_for_write() {
        let cache = FileHandleCache::new(2);
        cache.insert(key(0, 0), "file", false);

        assert!(cache.get_cached(key(0, 0), true).is_none());
        // The stale read-only handle must be gone so the reopen can land.
        assert!(cache.get_cached(key(0, 0), false).is_none());
    }

    #[test]
    fn positive_lru_eviction_at_capacity() {
        let cache = FileHandleCache::new(2);
        cache.insert(key(0, 0), "a", false);
        cache.insert(key(0, 1), "b", false);
        cache.insert(key(0, 2), "c", false);

        assert!(cache.get_cached(key(0, 0), false).is_none());
        assert!(cache.get_cached(key(0, 1), false).is_some());
        assert!(cache.get_cached(key(0, 2), false).is_some());
    }

    #[test]
    fn positive_flush_torrent_is_selective() {
        let cache = FileHandleCache::new(4);
        cache.insert(key(0, 0), "a", false);
        cache.insert(key(0, 1), "b", false);
        cache.insert(key(1, 0), "c", false);

        cache.flush_torrent(InfoHash::from([0u8; 20]));

        assert!(cache.get_cached(key(0, 0), false).is_none());
        assert!(cache.get_cached(key(0, 1), false).is_none());
        assert!(cache.get_cached(key(1, 0), false).is_some());
    }
}
