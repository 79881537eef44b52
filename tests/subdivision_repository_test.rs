use postal_addressing::core::group_key::group_key;
use postal_addressing::core::{Storage, SubdivisionLoader};
use postal_addressing::{LocalStorage, PatternType, Result, SubdivisionRepository};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

const DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data");

/// Wraps the data directory and counts reads per path.
#[derive(Clone)]
struct CountingStorage {
    inner: LocalStorage,
    reads: Arc<Mutex<HashMap<String, usize>>>,
}

impl CountingStorage {
    fn new() -> Self {
        Self {
            inner: LocalStorage::new(DATA_DIR),
            reads: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn reads(&self, path: &str) -> usize {
        self.reads.lock().unwrap().get(path).copied().unwrap_or(0)
    }

    fn subdivision_reads(&self) -> usize {
        self.reads
            .lock()
            .unwrap()
            .iter()
            .filter(|(path, _)| path.starts_with("subdivision/"))
            .map(|(_, count)| count)
            .sum()
    }
}

impl Storage for CountingStorage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        *self.reads.lock().unwrap().entry(path.to_string()).or_default() += 1;
        self.inner.read_file(path)
    }
}

/// Delays reads of one storage unit to widen the window of a concurrent load.
#[derive(Clone)]
struct SlowStorage {
    inner: LocalStorage,
    slow_path: &'static str,
}

impl Storage for SlowStorage {
    fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        if path == self.slow_path {
            thread::sleep(Duration::from_millis(300));
        }
        self.inner.read_file(path)
    }
}

fn path(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|p| p.to_string()).collect()
}

#[test]
fn test_get_all_is_idempotent_and_reads_once() {
    let storage = CountingStorage::new();
    let repository = SubdivisionRepository::with_storage(storage.clone());

    let first = repository.get_all(&path(&["US"]));
    let second = repository.get_all(&path(&["US"]));

    assert!(!first.is_empty());
    assert_eq!(first, second);
    assert_eq!(storage.reads("subdivision/US.json"), 1);
}

#[test]
fn test_get_appears_in_get_all() {
    let repository = SubdivisionRepository::with_storage(LocalStorage::new(DATA_DIR));

    for parents in [
        path(&["US"]),
        path(&["CN"]),
        path(&["CN", "Taiwan Sheng"]),
        path(&["CN", "Taiwan Sheng", "Taichung City"]),
    ] {
        let all = repository.get_all(&parents);
        assert!(!all.is_empty(), "no subdivisions under {:?}", parents);
        for subdivision in &all {
            let found = repository.get(subdivision.code(), &parents).unwrap();
            assert!(all.iter().any(|s| s.code() == found.code()));
        }
    }
}

#[test]
fn test_depth_zero_country_does_no_io() {
    let storage = CountingStorage::new();
    let repository = SubdivisionRepository::with_storage(storage.clone());

    assert!(repository.get("ZH", &path(&["CH"])).is_none());
    assert!(repository.get_all(&path(&["DE"])).is_empty());
    assert_eq!(storage.subdivision_reads(), 0);
}

#[test]
fn test_lookups_beyond_depth_do_no_io() {
    let storage = CountingStorage::new();
    let repository = SubdivisionRepository::with_storage(storage.clone());

    assert!(repository.get_all(&path(&["US", "CA"])).is_empty());
    assert_eq!(storage.subdivision_reads(), 0);
}

#[test]
fn test_leaf_parent_skips_child_lookup() {
    let storage = CountingStorage::new();
    let repository = SubdivisionRepository::with_storage(storage.clone());

    let beijing = repository.get("Beijing Shi", &path(&["CN"])).unwrap();
    assert!(!beijing.has_children());
    assert!(repository.get_all(&path(&["CN", "Beijing Shi"])).is_empty());

    assert_eq!(storage.subdivision_reads(), 1);
}

#[test]
fn test_taiwan_hierarchy() {
    let repository = SubdivisionRepository::with_storage(LocalStorage::new(DATA_DIR));

    let taiwan = repository.get("台湾省", &path(&["CN"])).unwrap();
    assert_eq!(taiwan.code(), "Taiwan Sheng");
    assert_eq!(taiwan.postal_code_pattern_type(), Some(PatternType::Full));
    assert_eq!(taiwan.display_code(Some("zh-Hans")), "台湾省");
    assert_eq!(taiwan.display_code(Some("en")), "Taiwan Sheng");

    let cities = taiwan.children(&repository);
    let taichung = cities.iter().find(|c| c.code() == "Taichung City").unwrap();
    assert_eq!(taichung.depth(), 2);
    assert_eq!(
        taichung.parent(&repository).unwrap().code(),
        "Taiwan Sheng"
    );

    let districts = taichung.children(&repository);
    let xitun = districts.iter().find(|d| d.code() == "Xitun District").unwrap();
    assert_eq!(xitun.local_code(), Some("西屯区"));
    assert_eq!(
        xitun.parents(),
        path(&["CN", "Taiwan Sheng", "Taichung City"])
    );
    assert_eq!(
        group_key(&xitun.parents()).as_deref(),
        Some("CN--f0c9ce1c57f8")
    );
}

#[test]
fn test_parent_resolution_is_memoized() {
    let storage = CountingStorage::new();
    let repository = SubdivisionRepository::with_storage(storage.clone());

    let xitun = repository
        .get("Xitun District", &path(&["CN", "Taiwan Sheng", "Taichung City"]))
        .unwrap();
    let parent_ref = xitun.parent_ref().unwrap();

    let first = repository.parent(parent_ref).unwrap();
    let second = repository.parent(parent_ref).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(first.code(), "Taichung City");
    assert_eq!(storage.reads("subdivision/CN-afe9106da0ee.json"), 1);
}

#[test]
fn test_get_list_uses_local_names_for_matching_locale() {
    let repository = SubdivisionRepository::with_storage(LocalStorage::new(DATA_DIR));

    let french = repository.get_list(&path(&["CA"]), Some("fr-CA"));
    assert!(french.contains(&("QC".to_string(), "Québec".to_string())));
    assert!(french.contains(&("ON".to_string(), "Ontario".to_string())));

    let english = repository.get_list(&path(&["CA"]), Some("en"));
    assert!(english.contains(&("QC".to_string(), "Quebec".to_string())));

    let codes: Vec<String> = english.into_iter().map(|(code, _)| code).collect();
    assert_eq!(codes, vec!["AB", "BC", "ON", "QC", "NS"]);
}

#[test]
fn test_unknown_paths_are_absent() {
    let repository = SubdivisionRepository::with_storage(LocalStorage::new(DATA_DIR));

    assert!(repository.get("ZZ", &path(&["US"])).is_none());
    assert!(repository.get_all(&path(&["CN", "Atlantis"])).is_empty());
    assert!(repository.get_all(&[]).is_empty());
    assert!(repository.get_all(&path(&["XX"])).is_empty());
}

#[test]
fn test_children_requested_during_a_load_are_not_empty() {
    let storage = SlowStorage {
        inner: LocalStorage::new(DATA_DIR),
        slow_path: "subdivision/CN-afe9106da0ee.json",
    };
    let repository = SubdivisionRepository::with_storage(storage);
    let taiwan = repository.get("Taiwan Sheng", &path(&["CN"])).unwrap();

    thread::scope(|scope| {
        let loading = scope.spawn(|| taiwan.children(&repository).len());
        thread::sleep(Duration::from_millis(50));
        let waiting = taiwan.children(&repository).len();

        assert_eq!(loading.join().unwrap(), 3);
        assert_eq!(waiting, 3);
    });
    assert_eq!(taiwan.children(&repository).len(), 3);
}
