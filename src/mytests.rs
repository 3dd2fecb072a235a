use crate::{
    gb, BlockMap, BlockSet, Bounds, Error, NaturalOrder, Occupied, Reversed, Vacant,
};
use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use std::ops::Bound;

/// Small blocks so that splits, spills and merges happen constantly.
type Small<K, V> = gb::BlockMap<K, V, NaturalOrder, 4>;

fn keys<K: Copy, V, C, const B: usize>(m: &gb::BlockMap<K, V, C, B>) -> Vec<K> {
    m.keys().copied().collect()
}

#[test]
fn random_permutation_test() {
    let n = 10000;
    let mut v: Vec<usize> = (0..n).collect();
    v.shuffle(&mut StdRng::seed_from_u64(1));
    let mut m = BlockMap::<usize, usize>::new();
    for &k in &v {
        assert_eq!(m.insert(k, k * 2), None);
    }
    m.check();
    assert_eq!(m.len(), n);
    assert!(m.iter().map(|(k, v)| (*k, *v)).eq((0..n).map(|k| (k, k * 2))));
    assert!(m.keys().rev().copied().eq((0..n).rev()));
    assert!(m.descending_map().keys().copied().eq((0..n).rev()));
    for k in 0..n {
        assert_eq!(m.get(&k), Some(&(k * 2)));
    }
    assert_eq!(m.get(&n), None);
}

#[test]
fn small_block_random_permutation_test() {
    let n = 2000;
    let mut v: Vec<u32> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(2);
    v.shuffle(&mut rng);
    let mut m = Small::<u32, u32>::new();
    for &k in &v {
        m.insert(k, k);
    }
    m.check();
    assert!(m.keys().copied().eq(0..n));
    v.shuffle(&mut rng);
    for (i, &k) in v.iter().enumerate() {
        assert_eq!(m.remove(&k), Some(k));
        if i % 50 == 0 {
            m.check();
        }
    }
    m.check();
    assert!(m.is_empty());
    assert_eq!(m.first_key(), None);
}

#[test]
fn put_is_idempotent_test() {
    let mut m = Small::<i32, &str>::new();
    assert_eq!(m.insert(1, "a"), None);
    assert_eq!(m.insert(1, "b"), Some("a"));
    assert_eq!(m.insert(1, "b"), Some("b"));
    assert_eq!(m.len(), 1);
    assert_eq!(m[&1], "b");
    m.check();
}

#[test]
fn remove_evens_test() {
    let mut m = Small::<i32, i32>::new();
    for i in 1..=1000 {
        m.insert(i, i);
    }
    for i in (2..=1000).step_by(2) {
        assert_eq!(m.remove(&i), Some(i));
    }
    m.check();
    assert_eq!(m.len(), 500);
    assert!(m.keys().copied().eq((1..=1000).step_by(2)));
    assert_eq!(m.remove(&2), None);
}

#[test]
fn spill_and_split_test() {
    let mut m = Small::<i32, ()>::new();
    for k in [0, 10, 20, 30] {
        m.insert(k, ());
    }
    // First block is full, so 40 goes to a new block.
    m.insert(40, ());
    m.check();
    // Full block spills its last entry into the next block.
    m.insert(5, ());
    m.check();
    for k in [1, 2, 3, 4, 6, 7, 8, 9, 41, 42, 43, 44] {
        m.insert(k, ());
        m.check();
    }
    assert_eq!(
        keys(&m),
        [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 20, 30, 40, 41, 42, 43, 44]
    );
}

#[test]
fn navigation_test() {
    let m: Small<i32, char> = [(10, 'a'), (20, 'b'), (30, 'c')].into_iter().collect();
    assert_eq!(m.floor_key(&5), None);
    assert_eq!(m.floor_key(&10), Some(&10));
    assert_eq!(m.floor_key(&15), Some(&10));
    assert_eq!(m.floor_entry(&35), Some((&30, &'c')));
    assert_eq!(m.ceiling_key(&15), Some(&20));
    assert_eq!(m.ceiling_key(&20), Some(&20));
    assert_eq!(m.ceiling_key(&35), None);
    assert_eq!(m.higher_key(&20), Some(&30));
    assert_eq!(m.higher_key(&30), None);
    assert_eq!(m.lower_key(&20), Some(&10));
    assert_eq!(m.lower_entry(&10), None);
    assert_eq!(m.first_key_value(), Some((&10, &'a')));
    assert_eq!(m.last_key_value(), Some((&30, &'c')));
}

#[test]
fn navigation_across_blocks_test() {
    let mut m = Small::<i32, i32>::new();
    for i in 0..500 {
        m.insert(i * 2, i);
    }
    for i in 0..499 {
        let odd = i * 2 + 1;
        assert_eq!(m.floor_key(&odd), Some(&(i * 2)));
        assert_eq!(m.ceiling_key(&odd), Some(&(i * 2 + 2)));
        assert_eq!(m.higher_key(&(i * 2)), Some(&(i * 2 + 2)));
        assert_eq!(m.lower_key(&(i * 2 + 2)), Some(&(i * 2)));
    }
}

#[test]
fn head_map_test() {
    let mut m = Small::<i32, i32>::new();
    for i in 1..=1000 {
        m.insert(i, i);
    }
    {
        let v = m.head_map(500, false);
        assert!(v.keys().copied().eq(1..500));
        assert_eq!(v.len(), 499);
        assert_eq!(v.get(&500), None);
        assert_eq!(v.get(&499), Some(&499));
    }
    let mut vm = m.head_map_mut(500, false);
    assert_eq!(vm.remove(&10), Some(10));
    assert_eq!(vm.remove(&600), None);
    assert!(!vm.contains_key(&10));
    assert!(vm.iter().map(|(k, _)| *k).eq((1..500).filter(|&k| k != 10)));
    assert!(vm
        .iter()
        .rev()
        .map(|(k, _)| *k)
        .eq((1..500).rev().filter(|&k| k != 10)));
    assert_eq!(m.get(&10), None);
    assert_eq!(m.get(&600), Some(&600));
    assert!(m
        .head_map(500, false)
        .descending()
        .keys()
        .copied()
        .eq((1..500).rev().filter(|&k| k != 10)));
    m.check();
}

#[test]
fn view_insert_out_of_range_test() {
    let mut m = Small::<i32, i32>::new();
    let mut v = m.head_map_mut(10, false);
    assert_eq!(v.insert(10, 0), Err(Error::OutOfRange));
    assert_eq!(v.insert(9, 9), Ok(None));
    assert_eq!(v.insert(9, 10), Ok(Some(9)));
    let mut v = m.sub_map_mut(20, false, 30, true).unwrap();
    assert_eq!(v.insert(20, 0), Err(Error::OutOfRange));
    assert_eq!(v.insert(31, 0), Err(Error::OutOfRange));
    assert_eq!(v.insert(30, 30), Ok(None));
    assert_eq!(keys(&m), [9, 30]);
    m.check();
}

#[test]
fn invalid_ordering_test() {
    let m: Small<i32, i32> = (0..10).map(|i| (i, i)).collect();
    assert_eq!(m.sub_map(5, true, 3, true).err(), Some(Error::InvalidOrdering));
    assert!(m.sub_map(5, false, 5, false).unwrap().is_empty());
    assert!(m.sub_map(5, true, 5, false).unwrap().is_empty());
    assert_eq!(m.sub_map(5, true, 5, true).unwrap().len(), 1);
    #[allow(clippy::reversed_empty_ranges)]
    let r = m.range(5..3);
    assert_eq!(r.err(), Some(Error::InvalidOrdering));
    assert_eq!(m.range((Bound::Excluded(4), Bound::Excluded(4))).unwrap().count(), 0);
    assert_eq!(m.range((Bound::Excluded(4), Bound::Included(4))).unwrap().count(), 0);
    assert_eq!(
        Bounds::new(Bound::Included(2), Bound::Included(1), &NaturalOrder).err(),
        Some(Error::InvalidOrdering)
    );
}

#[test]
fn range_test() {
    let mut m = Small::<i32, i32>::new();
    for i in 0..200 {
        m.insert(i, i);
    }
    let r = m.range(10..20).unwrap();
    assert!(r.map(|(k, _)| *k).eq(10..20));
    assert!(m.range(..=5).unwrap().rev().map(|(k, _)| *k).eq((0..=5).rev()));
    assert_eq!(m.range(500..).unwrap().next(), None);
    assert_eq!(m.range(..).unwrap().count(), 200);

    let mut r = m.range(50..=60).unwrap();
    let mut seen = Vec::new();
    while let Some((k, _)) = r.next() {
        seen.push(*k);
        if let Some((k, _)) = r.next_back() {
            seen.push(*k);
        }
    }
    seen.sort();
    assert!(seen.into_iter().eq(50..=60));

    for (_, v) in m.range_mut(100..110).unwrap() {
        *v = -*v;
    }
    assert_eq!(m[&105], -105);
    assert_eq!(m[&110], 110);
}

#[test]
fn nested_view_test() {
    let m: Small<i32, i32> = (0..100).map(|i| (i, i)).collect();
    let v = m.sub_map(10, true, 50, false).unwrap();
    assert_eq!(v.len(), 40);
    assert_eq!(v.first_key(), Some(&10));
    assert_eq!(v.last_key(), Some(&49));
    assert_eq!(v.floor_entry(&70), Some((&49, &49)));
    assert_eq!(v.ceiling_entry(&0), Some((&10, &10)));
    assert_eq!(v.lower_entry(&10), None);
    assert_eq!(v.higher_entry(&49), None);
    assert_eq!(v.higher_entry(&20), Some((&21, &21)));

    assert!(v.head_map(30, false).unwrap().keys().copied().eq(10..30));
    assert!(v.tail_map(45, true).unwrap().keys().copied().eq(45..50));
    assert!(v.head_map(50, false).is_ok());
    assert!(matches!(v.head_map(50, true), Err(Error::OutOfRange)));
    assert!(matches!(v.tail_map(60, true), Err(Error::OutOfRange)));
    assert!(matches!(v.sub_map(5, true, 20, true), Err(Error::OutOfRange)));

    let d = m.sub_map(10, true, 50, false).unwrap().descending();
    assert!(d.keys().copied().eq((10..50).rev()));
    // In a descending view "before 40" means the keys above 40.
    assert!(d.head_map(40, false).unwrap().keys().copied().eq((41..50).rev()));
    assert!(d.tail_map(40, true).unwrap().keys().copied().eq((10..=40).rev()));
    assert_eq!(d.first_key(), Some(&49));
    assert_eq!(d.last_key(), Some(&10));
}

#[test]
fn empty_nested_view_test() {
    let mut m: Small<i32, i32> = (0..100).map(|i| (i, i)).collect();
    let v = m.sub_map(10, false, 50, false).unwrap();
    let e = v.head_map(10, false).unwrap();
    assert!(e.is_empty());
    assert_eq!(e.first_key(), None);
    assert_eq!(e.floor_entry(&10), None);
    assert_eq!(e.ceiling_entry(&10), None);
    assert_eq!(e.iter().count(), 0);
    assert!(v.tail_map(50, false).unwrap().is_empty());
    assert!(v.sub_map(20, false, 20, false).unwrap().is_empty());

    let mut w = m.sub_map_mut(5, false, 5, false).unwrap();
    assert_eq!(w.insert(5, 0), Err(Error::OutOfRange));
    assert_eq!(w.pop_first(), None);
    assert_eq!(m.len(), 100);
}

#[test]
fn view_bounds_rechecked_test() {
    let mut m: Small<i32, i32> = (0..10).map(|i| (i, i)).collect();
    // Ordered for a reversed comparator, so backwards for this map.
    let reversed =
        Bounds::new(Bound::Included(8), Bound::Included(2), &Reversed(NaturalOrder)).unwrap();
    assert_eq!(m.view(reversed.clone()).err(), Some(Error::InvalidOrdering));
    assert!(matches!(m.view_mut(reversed), Err(Error::InvalidOrdering)));
    let b = Bounds::new(Bound::Included(2), Bound::Excluded(8), &NaturalOrder).unwrap();
    assert!(m.view(b.clone()).unwrap().keys().copied().eq(2..8));
    assert_eq!(m.view_mut(b).unwrap().remove(&3), Some(3));
    assert_eq!(m.len(), 9);
}

#[test]
fn descending_view_navigation_test() {
    let m: Small<i32, i32> = [(10, 1), (20, 2), (30, 3)].into_iter().collect();
    let d = m.descending_map();
    assert!(d.keys().copied().eq([30, 20, 10]));
    assert!(d.values().copied().eq([3, 2, 1]));
    assert_eq!(d.first_key(), Some(&30));
    assert_eq!(d.floor_entry(&15).map(|(k, _)| *k), Some(20));
    assert_eq!(d.ceiling_entry(&25).map(|(k, _)| *k), Some(20));
    assert_eq!(d.higher_entry(&20).map(|(k, _)| *k), Some(10));
    assert_eq!(d.lower_entry(&20).map(|(k, _)| *k), Some(30));
    assert_eq!(d.higher_entry(&10), None);
}

#[test]
fn view_mut_test() {
    let mut m = Small::<i32, i32>::new();
    for i in 1..=1000 {
        m.insert(i, i);
    }
    let mut v = m.head_map_mut(500, false);
    assert_eq!(v.pop_first(), Some((1, 1)));
    assert_eq!(v.pop_last(), Some((499, 499)));
    assert_eq!(v.len(), 497);
    for (_, x) in v.iter_mut() {
        *x += 1;
    }
    assert_eq!(v.get(&2), Some(&3));
    if let Some(x) = v.get_mut(&3) {
        *x = 0;
    }
    let mut d = v.descending();
    assert_eq!(d.pop_first(), Some((498, 499)));
    d.clear();
    assert!(d.is_empty());
    assert_eq!(m.len(), 501);
    assert_eq!(m.first_key(), Some(&500));
    m.check();
}

#[test]
fn cursor_test() {
    let mut m = Small::<i32, i32>::new();
    for i in 0..100 {
        m.insert(i, i);
    }
    let mut c = m.cursor();
    let mut n = 0;
    while c.has_next(&m).unwrap() {
        let k = *c.next(&m).unwrap().0;
        assert_eq!(k, n);
        if k % 2 == 0 {
            assert_eq!(c.remove(&mut m).unwrap(), (k, k));
        }
        n += 1;
    }
    assert_eq!(n, 100);
    m.check();
    assert!(m.keys().copied().eq((1..100).step_by(2)));

    let mut c = m.cursor_back();
    let mut seen = Vec::new();
    while let Ok((k, _)) = c.next(&m) {
        seen.push(*k);
    }
    assert!(seen.into_iter().eq((1..100).step_by(2).rev()));
}

#[test]
fn cursor_remove_everything_test() {
    let mut m: Small<i32, i32> = (0..300).map(|i| (i, i)).collect();
    let mut c = m.cursor_back();
    let mut expect = 300;
    while c.has_next(&m).unwrap() {
        expect -= 1;
        assert_eq!(*c.next(&m).unwrap().0, expect);
        c.remove(&mut m).unwrap();
    }
    assert_eq!(expect, 0);
    assert!(m.is_empty());
    m.check();
}

#[test]
fn cursor_errors_test() {
    let mut m = Small::<i32, i32>::new();
    m.insert(1, 1);
    m.insert(2, 2);
    let mut c = m.cursor();
    assert!(matches!(c.remove(&mut m), Err(Error::IllegalState(_))));
    assert_eq!(c.peek(&m).unwrap(), (&1, &1));
    assert_eq!(c.next(&m).unwrap(), (&1, &1));
    assert_eq!(c.next(&m).unwrap(), (&2, &2));
    assert_eq!(c.next(&m).err(), Some(Error::NoSuchElement));
    assert_eq!(c.has_next(&m), Ok(false));
    assert_eq!(c.remove(&mut m), Ok((2, 2)));
    assert!(matches!(c.remove(&mut m), Err(Error::IllegalState(_))));
    assert_eq!(keys(&m), [1]);
}

#[test]
fn cursor_concurrent_modification_test() {
    let mut m = Small::<i32, i32>::new();
    for i in 0..10 {
        m.insert(i, i);
    }
    let mut c = m.cursor();
    c.next(&m).unwrap();
    *m.get_mut(&5).unwrap() = 50;
    assert_eq!(c.next(&m).err(), Some(Error::ConcurrentModification));

    let mut c = m.cursor();
    assert!(m.get_mut(&500).is_none());
    assert!(c.next(&m).is_ok());
    m.insert(100, 100);
    assert_eq!(c.next(&m).err(), Some(Error::ConcurrentModification));
    assert_eq!(c.has_next(&m), Err(Error::ConcurrentModification));
    assert_eq!(c.remove(&mut m).err(), Some(Error::ConcurrentModification));

    let mut c = m.cursor();
    m.remove(&3);
    assert_eq!(c.next(&m).err(), Some(Error::ConcurrentModification));
}

#[test]
fn cursor_value_mutation_test() {
    let mut m: Small<i32, i32> = (0..10).map(|i| (i, i)).collect();

    let c = m.cursor();
    for v in m.values_mut() {
        *v += 1;
    }
    assert_eq!(c.peek(&m).err(), Some(Error::ConcurrentModification));

    let c = m.cursor();
    if let Occupied(mut e) = m.entry(4) {
        *e.get_mut() = 0;
    }
    assert_eq!(c.peek(&m).err(), Some(Error::ConcurrentModification));

    let c = m.cursor();
    *m.entry(4).or_insert(7) += 1;
    assert_eq!(c.peek(&m).err(), Some(Error::ConcurrentModification));

    let c = m.cursor();
    m.head_map_mut(5, false).iter_mut().for_each(|(_, v)| *v = 0);
    assert_eq!(c.peek(&m).err(), Some(Error::ConcurrentModification));

    let c = m.cursor();
    *m.tail_map_mut(5, true).get_mut(&6).unwrap() = 60;
    assert_eq!(c.peek(&m).err(), Some(Error::ConcurrentModification));

    let c = m.cursor();
    m.range_mut(2..4).unwrap().for_each(|(_, v)| *v = 2);
    assert_eq!(c.peek(&m).err(), Some(Error::ConcurrentModification));

    let c = m.cursor();
    m.retain(|_, v| {
        *v *= 2;
        true
    });
    assert_eq!(c.peek(&m).err(), Some(Error::ConcurrentModification));
    assert_eq!(m[&6], 120);
}

#[test]
fn cursor_other_map_test() {
    let mut a = BlockMap::<i32, i32>::new();
    let mut b = BlockMap::<i32, i32>::new();
    for i in 0..100 {
        a.insert(i, i);
        b.insert(0, i);
    }
    assert_eq!(a.len(), 100);
    assert_eq!(b.len(), 1);
    let c = a.cursor_back();
    assert_eq!(c.peek(&a), Ok((&99, &99)));
    assert!(matches!(c.peek(&b), Err(Error::IllegalState(_))));

    let copy = a.clone();
    assert!(matches!(c.has_next(&copy), Err(Error::IllegalState(_))));
    let mut c = a.cursor();
    assert!(matches!(c.next(&copy), Err(Error::IllegalState(_))));
    assert_eq!(c.next(&a), Ok((&0, &0)));
    assert_eq!(c.remove(&mut a), Ok((0, 0)));
    assert_eq!(a.len(), 99);
}

#[test]
fn view_cursor_test() {
    let mut m: Small<i32, i32> = (0..50).map(|i| (i, i)).collect();
    let mut c = m.sub_map(10, true, 20, false).unwrap().cursor();
    let mut seen = Vec::new();
    while c.has_next(&m).unwrap() {
        let k = *c.next(&m).unwrap().0;
        seen.push(k);
        if k % 3 == 0 {
            c.remove(&mut m).unwrap();
        }
    }
    assert!(seen.into_iter().eq(10..20));
    assert_eq!(m.len(), 47);

    let mut c = m.tail_map(40, false).descending().cursor();
    assert!(c.is_descending());
    assert_eq!(*c.next(&m).unwrap().0, 49);
    let mut last = 49;
    while let Ok((k, _)) = c.next(&m) {
        last = *k;
    }
    assert_eq!(last, 41);
}

#[test]
fn custom_comparator_test() {
    let mut m = gb::BlockMap::<i32, i32, _, 4>::with_comparator(Reversed(NaturalOrder));
    for i in 0..100 {
        m.insert(i, i);
    }
    m.check();
    assert!(m.keys().copied().eq((0..100).rev()));
    assert_eq!(m.first_key(), Some(&99));
    assert_eq!(m.floor_key(&50), Some(&50));
    // Floor means "at or before in map order", which here is the next larger number.
    assert_eq!(m.lower_key(&50), Some(&51));
    assert!(m.range(60..=55).unwrap().map(|(k, _)| *k).eq((55..=60).rev()));

    let by_len = |a: &String, b: &String| a.len().cmp(&b.len()).then_with(|| a.cmp(b));
    let mut s = gb::BlockMap::<String, (), _, 4>::with_comparator(by_len);
    for w in ["pear", "fig", "banana", "kiwi", "apple"] {
        s.insert(w.to_string(), ());
    }
    s.check();
    assert!(s.keys().map(String::as_str).eq(["fig", "kiwi", "pear", "apple", "banana"]));
}

#[test]
fn entry_test() {
    let mut counts = BlockMap::<&str, usize>::new();
    for w in "a b a c b a".split(' ') {
        *counts.entry(w).or_insert(0) += 1;
    }
    assert!(counts.iter().map(|(k, v)| (*k, *v)).eq([("a", 3), ("b", 2), ("c", 1)]));

    let mut m = Small::<i32, i32>::new();
    for i in 0..20 {
        *m.entry(i).or_default() += i;
    }
    m.entry(5).and_modify(|v| *v = 500).or_insert(0);
    assert_eq!(m[&5], 500);
    match m.entry(100) {
        Vacant(e) => assert_eq!(e.into_key(), 100),
        Occupied(_) => panic!("unexpected occupied entry"),
    }
    match m.entry(7) {
        Occupied(e) => assert_eq!(e.remove_entry(), (7, 7)),
        Vacant(_) => panic!("unexpected vacant entry"),
    }
    assert_eq!(*m.entry(7).or_insert_with(|| 70), 70);
    assert_eq!(*m.entry(8).or_insert_with_key(|k| k * 100), 8);
    if let Some(mut e) = m.first_entry() {
        assert_eq!(e.insert(-1), 0);
        assert_eq!(e.key(), &0);
    }
    assert_eq!(m.last_entry().map(|e| e.remove()), Some(19));
    assert_eq!(m.get(&0), Some(&-1));
    assert_eq!(m.len(), 19);
    m.check();
}

#[test]
fn retain_test() {
    let mut m: Small<i32, i32> = (0..1000).map(|i| (i, i)).collect();
    m.retain(|k, v| {
        *v += 1;
        k % 3 == 0
    });
    m.check();
    assert_eq!(m.len(), 334);
    assert!(m.iter().map(|(k, v)| (*k, *v)).eq((0..1000).step_by(3).map(|k| (k, k + 1))));
    m.retain(|_, _| false);
    m.check();
    assert!(m.is_empty());
}

#[test]
fn pop_test() {
    let mut m: Small<i32, i32> = (0..100).map(|i| (i, i)).collect();
    for i in 0..50 {
        assert_eq!(m.pop_first(), Some((i, i)));
        assert_eq!(m.pop_last(), Some((99 - i, 99 - i)));
        if i % 10 == 0 {
            m.check();
        }
    }
    assert_eq!(m.pop_first(), None);
    assert_eq!(m.pop_last(), None);
    m.check();
}

#[test]
fn iter_mut_test() {
    let mut m: Small<i32, i32> = (0..100).map(|i| (i, i)).collect();
    for (k, v) in m.iter_mut() {
        *v = k * 10;
    }
    for v in m.values_mut().rev().take(10) {
        *v = 0;
    }
    for (_, v) in &mut m {
        *v += 1;
    }
    assert_eq!(m[&5], 51);
    assert_eq!(m[&95], 1);
    assert_eq!(m.iter_mut().len(), 100);
    assert!(m.contains_value(&51));
    assert!(!m.contains_value(&52));
}

#[test]
fn into_iter_test() {
    let m: Small<i32, String> = (0..100).map(|i| (i, i.to_string())).collect();
    let mut it = m.clone().into_iter();
    assert_eq!(it.len(), 100);
    assert_eq!(it.next(), Some((0, "0".to_string())));
    assert_eq!(it.next_back(), Some((99, "99".to_string())));
    assert_eq!(it.len(), 98);
    assert!(it.map(|(k, _)| k).eq(1..99));

    assert!(m.clone().into_keys().eq(0..100));
    assert!(m.into_values().rev().take(2).eq(["99".to_string(), "98".to_string()]));
}

#[test]
fn std_traits_test() {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let a = BlockMap::from([(3, 'c'), (1, 'a'), (2, 'b')]);
    assert_eq!(format!("{:?}", a), "{1: 'a', 2: 'b', 3: 'c'}");
    let b = a.clone();
    assert_eq!(a, b);
    let hash = |m: &BlockMap<i32, char>| {
        let mut h = DefaultHasher::new();
        m.hash(&mut h);
        h.finish()
    };
    assert_eq!(hash(&a), hash(&b));
    let c = BlockMap::from([(1, 'a'), (2, 'z')]);
    assert!(a < c);
    assert_ne!(a, c);

    let mut d: BlockMap<i32, char> = BlockMap::default();
    d.extend([(5, 'e'), (4, 'd')]);
    d.extend(a.iter());
    assert!(d.keys().copied().eq(1..=5));
    assert!(d.comparator() == &NaturalOrder);
}

#[test]
fn clone_test() {
    let mut m = Small::<i32, i32>::new();
    let mut rng = StdRng::seed_from_u64(3);
    for _ in 0..2000 {
        let k = rng.gen_range(0..1000);
        m.insert(k, k);
    }
    let c = m.clone();
    c.check();
    assert_eq!(c, m);
}

#[test]
fn append_test() {
    let mut a: Small<i32, i32> = (0..50).map(|i| (i * 2, 0)).collect();
    let mut b: Small<i32, i32> = (25..100).map(|i| (i, 1)).collect();
    a.append(&mut b);
    a.check();
    b.check();
    assert!(b.is_empty());
    assert_eq!(a.len(), 13 + 75);
    assert_eq!(a[&24], 0);
    assert_eq!(a[&26], 1);
    assert_eq!(a[&99], 1);
    b.insert(1, 1);
    assert_eq!(b.len(), 1);
}

#[test]
fn churn_test() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut m = Small::<u32, u32>::new();
    let mut model = std::collections::BTreeMap::new();
    for i in 0..20000 {
        let k = rng.gen_range(0..300);
        if rng.gen_bool(0.55) {
            assert_eq!(m.insert(k, i), model.insert(k, i));
        } else {
            assert_eq!(m.remove(&k), model.remove(&k));
        }
        if i % 100 == 0 {
            m.check();
        }
    }
    m.check();
    assert!(m.iter().eq(model.iter()));
}

/// Random inserts and removes against std, with blocks big enough that merges move many entries.
fn large_block_churn<const B: usize>(seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut m = gb::BlockMap::<u32, u32, NaturalOrder, B>::new();
    let mut model = std::collections::BTreeMap::new();
    // Grow, shrink hard, then grow and shrink again.
    for (phase, p_insert) in [0.8, 0.2, 0.7, 0.1].into_iter().enumerate() {
        for i in 0..8000 {
            let k = rng.gen_range(0..4000);
            if rng.gen_bool(p_insert) {
                assert_eq!(m.insert(k, i), model.insert(k, i));
            } else {
                assert_eq!(m.remove(&k), model.remove(&k));
            }
            if i % 250 == 0 {
                m.check();
            }
        }
        m.check();
        assert_eq!(m.len(), model.len(), "phase {phase}");
        assert!(m.iter().eq(model.iter()));
    }
    while let Some((k, v)) = model.pop_first() {
        assert_eq!(m.pop_first(), Some((k, v)));
        if k % 64 == 0 {
            m.check();
        }
    }
    assert!(m.is_empty());
    m.check();
}

#[test]
fn large_block_churn_test() {
    large_block_churn::<16>(5);
    large_block_churn::<64>(6);
}

#[test]
fn large_block_remove_scattered_test() {
    let mut m: BlockMap<u32, u32> = (0..5000).map(|i| (i, i)).collect();
    let mut ks: Vec<u32> = (0..5000).collect();
    ks.shuffle(&mut StdRng::seed_from_u64(7));
    for (n, k) in ks.iter().enumerate() {
        assert_eq!(m.remove(k), Some(*k));
        if n % 100 == 0 {
            m.check();
            assert_eq!(m.len(), 4999 - n);
        }
    }
    assert!(m.is_empty());
}

#[test]
fn set_test() {
    let mut s = BlockSet::<i32>::new();
    assert!(s.insert(10));
    assert!(s.insert(20));
    assert!(!s.insert(10));
    s.extend([30, 40, 50]);
    assert_eq!(s.len(), 5);
    assert!(s.contains(&30));
    assert!(s.remove(&30));
    assert!(!s.remove(&30));
    assert_eq!(s.floor(&35), Some(&20));
    assert_eq!(s.ceiling(&35), Some(&40));
    assert_eq!(s.higher(&40), Some(&50));
    assert_eq!(s.lower(&10), None);
    assert_eq!(s.first(), Some(&10));
    assert_eq!(s.last(), Some(&50));
    assert!(s.range(15..45).unwrap().copied().eq([20, 40]));
    assert!(s.head_set(40, true).iter().copied().eq([10, 20, 40]));
    assert!(s.tail_set(20, false).iter().copied().eq([40, 50]));
    assert!(s.descending_set().iter().copied().eq([50, 40, 20, 10]));
    let v = s.sub_set(10, false, 50, false).unwrap();
    assert_eq!(v.len(), 2);
    assert_eq!(v.first(), Some(&20));
    assert_eq!(v.floor(&100), Some(&40));
    assert!(s.sub_set(50, true, 10, true).is_err());
    assert_eq!(s.pop_first(), Some(10));
    assert_eq!(s.pop_last(), Some(50));
    assert_eq!(format!("{:?}", s), "{20, 40}");

    let t: BlockSet<i32> = (0..100).rev().collect();
    assert!(t.iter().copied().eq(0..100));
    assert!(t.into_iter().eq(0..100));
}

#[cfg(feature = "serde")]
#[test]
fn serde_test() {
    let mut m = BlockMap::<String, i32>::new();
    for i in 0..500 {
        m.insert(format!("k{:04}", i), i);
    }
    let json = serde_json::to_string(&m).unwrap();
    let back: BlockMap<String, i32> = serde_json::from_str(&json).unwrap();
    back.check();
    assert_eq!(m, back);

    // Unsorted input falls back to ordinary insertion.
    let back: BlockMap<i32, i32> = serde_json::from_str(r#"{"3":3,"1":1,"2":2}"#).unwrap();
    back.check();
    assert!(back.keys().copied().eq(1..=3));

    let s: BlockSet<i32> = (0..10).collect();
    let json = serde_json::to_string(&s).unwrap();
    assert_eq!(json, "[0,1,2,3,4,5,6,7,8,9]");
    let back: BlockSet<i32> = serde_json::from_str(&json).unwrap();
    assert!(back.iter().copied().eq(0..10));
}

mod model {
    use super::Small;
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u16, u32),
        Remove(u16),
        PopFirst,
        PopLast,
        Floor(u16),
        Ceiling(u16),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            4 => (0u16..200, any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
            3 => (0u16..200).prop_map(Op::Remove),
            1 => Just(Op::PopFirst),
            1 => Just(Op::PopLast),
            1 => (0u16..200).prop_map(Op::Floor),
            1 => (0u16..200).prop_map(Op::Ceiling),
        ]
    }

    proptest! {
        #[test]
        fn matches_std_btreemap(ops in proptest::collection::vec(op(), 0..400)) {
            let mut m = Small::<u16, u32>::new();
            let mut model = BTreeMap::new();
            for op in ops {
                match op {
                    Op::Insert(k, v) => prop_assert_eq!(m.insert(k, v), model.insert(k, v)),
                    Op::Remove(k) => prop_assert_eq!(m.remove(&k), model.remove(&k)),
                    Op::PopFirst => prop_assert_eq!(m.pop_first(), model.pop_first()),
                    Op::PopLast => prop_assert_eq!(m.pop_last(), model.pop_last()),
                    Op::Floor(k) => prop_assert_eq!(m.floor_key(&k), model.range(..=k).next_back().map(|(k, _)| k)),
                    Op::Ceiling(k) => prop_assert_eq!(m.ceiling_key(&k), model.range(k..).next().map(|(k, _)| k)),
                }
            }
            m.check();
            prop_assert_eq!(m.len(), model.len());
            prop_assert!(m.iter().eq(model.iter()));
            prop_assert!(m.iter().rev().eq(model.iter().rev()));
        }
    }
}
