#![allow(missing_docs)]
use crate::{CuckooConfig, CuckooError, CuckooMap};
use indexmap::IndexMap;
use rand::prelude::*;
use std::{
    borrow::Borrow,
    fmt::Debug,
    hash::{BuildHasherDefault, Hash},
};
use zwohash::ZwoHasher;

type ZwoMap<K, V> = CuckooMap<K, V, BuildHasherDefault<ZwoHasher>>;

struct CheckedMap<K, V> {
    dut: CuckooMap<K, V>,
    ref_map: IndexMap<K, V>,
}

impl<K: Hash + Eq + Clone + Debug + Ord, V: Eq + Clone + Debug + Ord> CheckedMap<K, V> {
    fn new(config: CuckooConfig) -> Self {
        CheckedMap {
            dut: CuckooMap::with_config(config).unwrap(),
            ref_map: IndexMap::new(),
        }
    }
    fn len(&self) -> usize {
        self.ref_map.len()
    }
    fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        Q: Hash + Eq,
        K: Borrow<Q>,
    {
        let ref_result = self.ref_map.get(key);
        let dut_result = self.dut.get(key);
        assert_eq!(ref_result, dut_result);
        assert_eq!(self.ref_map.contains_key(key), self.dut.contains_key(key));
        ref_result
    }
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        let ref_result = self.ref_map.insert(key.clone(), value.clone());
        let dut_result = self.dut.insert(key, value);
        assert_eq!(ref_result, dut_result);
        ref_result
    }
    fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        Q: Hash + Eq,
        K: Borrow<Q>,
    {
        let ref_result = self.ref_map.swap_remove(key);
        let dut_result = self.dut.remove(key);
        assert_eq!(ref_result, dut_result);
        ref_result
    }
    fn modify(&mut self, key: &K, f: impl Fn(&mut V)) -> bool {
        let ref_result = self.ref_map.get_mut(key).map(&f).is_some();
        let dut_result = self.dut.get_mut(key).map(&f).is_some();
        assert_eq!(ref_result, dut_result);
        ref_result
    }
    fn drain(&mut self) {
        let mut ref_entries: Vec<(K, V)> = self.ref_map.drain(..).collect();
        let mut dut_entries: Vec<(K, V)> = self.dut.drain().collect();
        ref_entries.sort();
        dut_entries.sort();
        assert_eq!(ref_entries, dut_entries);
        self.check();
    }
    fn check(&self) {
        self.dut.check();
        assert_eq!(self.dut.len(), self.ref_map.len());
        let mut ref_entries: Vec<_> = self.ref_map.iter().collect();
        let mut dut_entries: Vec<_> = self.dut.iter().collect();
        assert_eq!(dut_entries.len(), self.dut.len());
        ref_entries.sort();
        dut_entries.sort();
        assert_eq!(ref_entries, dut_entries);
    }
    fn iterator_check(&mut self) {
        let mut keys: Vec<_> = self.dut.keys().cloned().collect();
        let mut values: Vec<_> = self.dut.values().cloned().collect();
        keys.sort();
        values.sort();
        let mut ref_keys: Vec<_> = self.ref_map.keys().cloned().collect();
        let mut ref_values: Vec<_> = self.ref_map.values().cloned().collect();
        ref_keys.sort();
        ref_values.sort();
        assert_eq!(keys, ref_keys);
        assert_eq!(values, ref_values);
        assert!(self
            .dut
            .iter()
            .zip(self.dut.keys().zip(self.dut.values()))
            .all(|(a, b)| a == b));
        assert_eq!(self.dut.iter_mut().count(), self.len());
        assert_eq!(self.dut.values_mut().count(), self.len());
    }
    /// NB: `random_likelihood` is **not** a probability. `random_likelihood == 2.0` would be 2:1 odds random:present, i.e. 2/3 probability.
    fn present_or_random_key<R: Rng + SeedableRng>(
        &self,
        random_likelihood: f64,
        rng: &mut R,
        mut rand_k: impl FnMut(&mut R) -> K,
    ) -> K {
        debug_assert!(random_likelihood >= 0.0);
        if self.len() == 0 || rng.gen_range(0.0..1.0 + random_likelihood) >= 1.0 {
            rand_k(rng)
        } else {
            self.ref_map.iter().choose(rng).unwrap().0.clone()
        }
    }
}

macro_rules! weighted_choose {
    ($rng:expr, $($name:ident: $weight:expr => $body:expr),+) => {
        {
            enum Branches { $( $name,  )* }
            let weights = [$((Branches::$name, $weight)),+];
            match weights.choose_weighted($rng, |x| x.1).unwrap().0 {
                $(Branches::$name => $body),*
            }
        }
    }
}

fn test_suite<K, V, R>(
    config: CuckooConfig,
    mut rand_k: impl FnMut(&mut R) -> K,
    mut rand_v: impl FnMut(&mut R) -> V,
    modify_fn: impl Fn(&mut V),
) where
    K: Hash + Eq + Clone + Debug + Ord,
    V: Eq + Clone + Debug + Ord,
    R: Rng + SeedableRng,
{
    let mut map: CheckedMap<K, V> = CheckedMap::new(config);
    let mut rng = R::seed_from_u64(39);
    let mut max_size = 0;
    let verbosity = 1;
    for _ in 0..5000 {
        weighted_choose! {&mut rng,
            Insert: 2.0 => {
                let k = map.present_or_random_key(6.0, &mut rng, &mut rand_k);
                let v = rand_v(&mut rng);
                let result = map.insert(k.clone(), v.clone());
                if verbosity > 0 {
                    println!("inserting {k:?}: {v:?} -> {result:?}");
                }
            },
            Get: 0.5 => {
                let k = map.present_or_random_key(1.0, &mut rng, &mut rand_k);
                let result = map.get(&k);
                if verbosity > 0 {
                    println!("getting {k:?} -> {result:?}");
                }
            },
            Remove: 0.7 => {
                let k = map.present_or_random_key(1.0, &mut rng, &mut rand_k);
                let result = map.remove(&k);
                if verbosity > 0 {
                    println!("removing {k:?} -> {result:?}");
                }
            },
            Modify: 0.3 => {
                let k = map.present_or_random_key(1.0, &mut rng, &mut rand_k);
                let result = map.modify(&k, &modify_fn);
                if verbosity > 0 {
                    println!("modifying {k:?} -> {result:?}");
                }
            },
            Drain: 0.002 => {
                let old_len = map.len();
                map.drain();
                if verbosity > 0 {
                    println!("draining {old_len} entries");
                }
            },
            Check: 0.15 => {
                map.check();
            }
        };
        max_size = std::cmp::max(max_size, map.len());
    }
    map.check();
    map.iterator_check();
    println!("max size {max_size}, {}", map.dut.stats());
}

fn small_config() -> CuckooConfig {
    CuckooConfig::new(16, 2)
}

#[test]
fn test_suite_usize_usize() {
    test_suite::<usize, usize, rand_pcg::Pcg64>(
        small_config(),
        |rng| rng.gen::<usize>() >> rng.gen_range(0..usize::BITS),
        |rng| rng.gen(),
        |v| *v = v.wrapping_add(3),
    );
}

#[test]
fn test_suite_small_budget() {
    test_suite::<u16, u32, rand_pcg::Pcg64>(
        small_config().with_max_displacements(8),
        |rng| rng.gen_range(0..2000),
        |rng| rng.gen(),
        |v| *v = v.wrapping_mul(7),
    );
}

#[test]
fn test_suite_boxed_usize_boxed_usize() {
    test_suite::<Box<usize>, Box<usize>, rand_pcg::Pcg64>(
        small_config(),
        |rng| Box::new(rng.gen::<usize>() >> rng.gen_range(0..usize::BITS)),
        |rng| Box::new(rng.gen()),
        |v| **v = v.wrapping_add(3),
    );
}

#[test]
fn test_suite_string_u64() {
    test_suite::<String, u64, rand_pcg::Pcg64>(
        CuckooConfig::default(),
        |rng| {
            let len = rng.gen_range(4..16);
            String::from_iter((0..len).map(|_| rng.gen_range('!'..'~')))
        },
        |rng| rng.gen(),
        |v| *v = (*v).wrapping_add(3),
    );
}

#[test]
fn test_suite_string_string() {
    test_suite::<String, String, rand_pcg::Pcg64>(
        small_config().with_slots_per_bucket(8),
        |rng| {
            let len = rng.gen_range(4..16);
            String::from_iter((0..len).map(|_| rng.gen_range('!'..'~')))
        },
        |rng| {
            let len = rng.gen_range(8..32);
            String::from_iter((0..len).map(|_| rng.gen_range('!'..'~')))
        },
        |v| {
            let ch = v.remove(0);
            v.push(ch);
        },
    );
}

#[test]
fn test_basic() {
    let mut map: ZwoMap<String, usize> = Default::default();
    assert!(map.is_empty());
    map.insert("adam".into(), 10);
    map.insert("eve".into(), 23);
    map.insert("mallory".into(), 40);
    map.insert("jim".into(), 5);
    assert_eq!(map.get("adam").copied(), Some(10));
    assert_eq!(map.get_key_value("eve"), Some((&"eve".to_string(), &23)));
    assert_eq!(map.insert("jim".into(), 15), Some(5));
    assert_eq!(map.remove("eve"), Some(23));
    assert_eq!(map.try_get("eve"), Err(CuckooError::NotFound));
    assert_eq!(map.try_remove("eve"), Err(CuckooError::NotFound));
    assert_eq!(map.try_get("jim"), Ok(&15));
    let mut keys: Vec<_> = map.keys().cloned().collect();
    keys.sort();
    assert_eq!(keys, ["adam", "jim", "mallory"]);
    assert_eq!(map.len(), 3);
    assert!(!map.is_empty());
    map.check();

    *map.get_mut("adam").unwrap() += 1;
    assert_eq!(map.remove_entry("adam"), Some(("adam".to_string(), 11)));
    assert!(!map.contains_key("adam"));
    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.bucket_count(), 1024);
}

#[test]
fn test_overwrite_keeps_stored_key() {
    #[derive(Debug)]
    struct Tagged(u32, &'static str);
    impl PartialEq for Tagged {
        fn eq(&self, other: &Self) -> bool {
            self.0 == other.0
        }
    }
    impl Eq for Tagged {}
    impl Hash for Tagged {
        fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
            self.0.hash(state)
        }
    }

    let mut map: CuckooMap<Tagged, u32> = CuckooMap::new();
    map.insert(Tagged(1, "first"), 1);
    assert_eq!(map.insert(Tagged(1, "second"), 2), Some(1));
    assert_eq!(map.len(), 1);
    let (key, value) = map.iter().next().unwrap();
    assert_eq!(key.1, "first");
    assert_eq!(*value, 2);
}

#[test]
fn test_equality_and_collect() {
    let mut rng = rand_pcg::Pcg64::seed_from_u64(10);
    let mut in_data: Vec<(u32, u64)> = (0..1000).map(|_| (rng.gen(), rng.gen())).collect();
    in_data.sort();
    in_data.dedup_by_key(|entry| entry.0);

    let map: CuckooMap<u32, u64> = in_data.iter().copied().collect();
    let mut other: ZwoMap<u32, u64> =
        ZwoMap::with_config(CuckooConfig::new(8, 4)).unwrap();
    other.extend(in_data.iter().rev().map(|(k, v)| (k, v)));
    assert!(other.stats().grows > 0);
    assert_eq!(map.len(), in_data.len());
    assert!(map == other);

    let (&key, _) = other.iter().next().unwrap();
    let value = other.get_mut(&key).unwrap();
    *value = value.wrapping_add(1);
    assert!(map != other);
    other.remove(&key);
    assert!(map != other);

    let mut out_data: Vec<(u32, u64)> = map.into_iter().collect();
    out_data.sort();
    assert_eq!(out_data, in_data);
}

#[test]
fn test_reserve_avoids_growth_during_inserts() {
    let mut map: CuckooMap<u64, u64> = CuckooMap::with_config(CuckooConfig::new(2, 4)).unwrap();
    map.reserve(10000).unwrap();
    let grows = map.stats().grows;
    for i in 0..10000 {
        map.insert(i, i * i);
    }
    assert_eq!(map.stats().grows, grows);
    assert!((0..10000).all(|i| map.get(&i) == Some(&(i * i))));
    map.check();
}
