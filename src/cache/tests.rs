use super::*;

#[test]
fn get_after_insert() {
    let cache = LruCache::new(4);
    cache.insert("a".to_string(), 1);

    assert_eq!(cache.get(&"a".to_string()), Some(1));
    assert_eq!(cache.get(&"missing".to_string()), None);

    let stats = cache.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.entries, 1);
    assert!((stats.hit_ratio() - 0.5).abs() < f64::EPSILON);
}

#[test]
fn evicts_least_recently_used() {
    let cache = LruCache::new(3);
    cache.insert(1, "one");
    cache.insert(2, "two");
    cache.insert(3, "three");

    // touch 1 so 2 becomes the oldest
    assert_eq!(cache.get(&1), Some("one"));

    cache.insert(4, "four");

    assert_eq!(cache.len(), 3);
    assert!(!cache.contains(&2));
    assert!(cache.contains(&1));
    assert!(cache.contains(&3));
    assert!(cache.contains(&4));
    assert_eq!(cache.stats().evictions, 1);
}

#[test]
fn never_exceeds_capacity() {
    let cache = LruCache::new(10);
    for i in 0..100 {
        cache.insert(i, i * 2);
        assert!(cache.len() <= 10);
    }

    assert_eq!(cache.len(), 10);
    // only the last ten survive
    for i in 90..100 {
        assert_eq!(cache.get(&i), Some(i * 2));
    }
    assert_eq!(cache.stats().evictions, 90);
}

#[test]
fn reinsert_refreshes_without_evicting() {
    let cache = LruCache::new(2);
    cache.insert("a", 1);
    cache.insert("b", 2);
    cache.insert("a", 10);

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.stats().evictions, 0);

    cache.insert("c", 3);
    // "b" was the least recently touched
    assert!(!cache.contains(&"b"));
    assert_eq!(cache.get(&"a"), Some(10));
}

#[test]
fn zero_capacity_stores_nothing() {
    let cache = LruCache::new(0);
    cache.insert("a", 1);
    assert!(cache.is_empty());
    assert_eq!(cache.get(&"a"), None);
}

#[test]
fn entries_expire_after_ttl() {
    let cache = LruCache::with_ttl(8, Duration::from_millis(40));
    cache.insert("k", 42);
    assert_eq!(cache.get(&"k"), Some(42));

    std::thread::sleep(Duration::from_millis(80));

    assert!(!cache.contains(&"k"));
    assert_eq!(cache.get(&"k"), None);
    assert_eq!(cache.stats().expirations, 1);
    assert!(cache.is_empty());
}

#[test]
fn purge_expired_removes_stale_entries() {
    let cache = LruCache::with_ttl(8, Duration::from_millis(30));
    cache.insert(1, 1);
    cache.insert(2, 2);
    std::thread::sleep(Duration::from_millis(60));
    cache.insert(3, 3);

    assert_eq!(cache.purge_expired(), 2);
    assert_eq!(cache.len(), 1);
    assert!(cache.contains(&3));
}

#[test]
fn remove_and_clear() {
    let cache = LruCache::new(4);
    cache.insert(1, 'a');
    cache.insert(2, 'b');

    assert_eq!(cache.remove(&1), Some('a'));
    assert_eq!(cache.remove(&1), None);
    cache.clear();
    assert!(cache.is_empty());

    // recency bookkeeping survives a clear
    cache.insert(3, 'c');
    cache.insert(4, 'd');
    assert_eq!(cache.len(), 2);
}

#[test]
fn shared_across_threads() {
    let cache = std::sync::Arc::new(LruCache::new(64));
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let cache = std::sync::Arc::clone(&cache);
            std::thread::spawn(move || {
                for i in 0..100 {
                    cache.insert(t * 1000 + i, i);
                    let _ = cache.get(&(t * 1000 + i));
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("thread should finish");
    }

    assert_eq!(cache.len(), 64);
}
