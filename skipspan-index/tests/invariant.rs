//! Randomized and property-based checks of marker maintenance
//!
//! These tests drive the list through operation sequences the unit tests
//! cannot enumerate by hand and hold it against a naive model plus the
//! built-in invariant checker after every step.

use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use skipspan_index::IntervalSkipList;

#[test]
fn invariant_survives_random_churn() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut rng = StdRng::seed_from_u64(42);
    let mut list = IntervalSkipList::new(i64::MIN, i64::MAX).seeded(43);
    let mut model: BTreeMap<u32, (i64, i64)> = BTreeMap::new();
    let mut next_marker = 0u32;

    for _ in 0..100 {
        if !model.is_empty() && rng.gen_ratio(1, 5) {
            let nth = rng.gen_range(0..model.len());
            let victim = *model.keys().nth(nth).unwrap();
            list.remove(&victim);
            model.remove(&victim);
        } else {
            let a = rng.gen_range(0..100);
            let b = rng.gen_range(0..100);
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            list.insert(next_marker, start, end).unwrap();
            model.insert(next_marker, (start, end));
            next_marker += 1;
        }
        list.verify_marker_invariant().unwrap();
        assert_eq!(list.len(), model.len());
    }

    for x in 0..100 {
        let got: HashSet<u32> = list.find_containing(&[x]).into_iter().collect();
        let want: HashSet<u32> = model
            .iter()
            .filter(|(_, &(start, end))| start <= x && x <= end)
            .map(|(&marker, _)| marker)
            .collect();
        assert_eq!(got, want, "stab at {x}");
    }
}

#[test]
fn clear_after_random_fill_leaves_nothing_behind() {
    let mut rng = StdRng::seed_from_u64(19);
    let mut list = IntervalSkipList::new(i64::MIN, i64::MAX).seeded(20);

    for marker in 0..100u32 {
        let a = rng.gen_range(0..100);
        let b = rng.gen_range(0..100);
        let (start, end) = if a <= b { (a, b) } else { (b, a) };
        list.insert(marker, start, end).unwrap();
    }
    assert_eq!(list.len(), 100);

    list.clear();
    assert!(list.intervals_by_marker().is_empty());
    assert!(list.find_contained_in(&0, &100).is_empty());
    list.verify_marker_invariant().unwrap();
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn queries_match_a_naive_model(
        ops in proptest::collection::vec((any::<bool>(), 0i64..60, 0i64..60), 1..40),
    ) {
        let mut list = IntervalSkipList::new(i64::MIN, i64::MAX).seeded(7);
        let mut model: Vec<(usize, i64, i64)> = Vec::new();
        let mut inserted = 0usize;

        for &(remove, a, b) in &ops {
            if remove && !model.is_empty() {
                let at = (a as usize) % model.len();
                let (marker, _, _) = model.remove(at);
                list.remove(&marker);
            } else {
                let (start, end) = if a <= b { (a, b) } else { (b, a) };
                list.insert(inserted, start, end).unwrap();
                model.push((inserted, start, end));
                inserted += 1;
            }
            list.verify_marker_invariant().unwrap();
        }

        for x in 0..60 {
            let got: HashSet<usize> = list.find_containing(&[x]).into_iter().collect();
            let want: HashSet<usize> = model
                .iter()
                .filter(|&&(_, start, end)| start <= x && x <= end)
                .map(|&(marker, _, _)| marker)
                .collect();
            prop_assert_eq!(got, want, "stab at {}", x);
        }

        let got: HashSet<usize> = list.find_intersecting(&10, &30).into_iter().collect();
        let want: HashSet<usize> = model
            .iter()
            .filter(|&&(_, start, end)| !(end < 10 || start > 30))
            .map(|&(marker, _, _)| marker)
            .collect();
        prop_assert_eq!(got, want);

        let got: HashSet<usize> = list.find_contained_in(&10, &40).into_iter().collect();
        let want: HashSet<usize> = model
            .iter()
            .filter(|&&(_, start, end)| 10 <= start && end <= 40)
            .map(|&(marker, _, _)| marker)
            .collect();
        prop_assert_eq!(got, want);

        let got: HashSet<usize> = list.find_starting_in(&0, &20).into_iter().collect();
        let want: HashSet<usize> = model
            .iter()
            .filter(|&&(_, start, _)| (0..=20).contains(&start))
            .map(|&(marker, _, _)| marker)
            .collect();
        prop_assert_eq!(got, want);

        let got: HashSet<usize> = list.find_ending_in(&20, &59).into_iter().collect();
        let want: HashSet<usize> = model
            .iter()
            .filter(|&&(_, _, end)| (20..=59).contains(&end))
            .map(|&(marker, _, _)| marker)
            .collect();
        prop_assert_eq!(got, want);
    }

    #[test]
    fn multi_point_stabs_equal_intersected_extremes(
        points in proptest::collection::vec(0i64..60, 2..5),
        intervals in proptest::collection::vec((0i64..60, 0i64..60), 1..20),
    ) {
        let mut list = IntervalSkipList::new(i64::MIN, i64::MAX).seeded(9);
        for (marker, &(a, b)) in intervals.iter().enumerate() {
            let (start, end) = if a <= b { (a, b) } else { (b, a) };
            list.insert(marker, start, end).unwrap();
        }

        let lo = *points.iter().min().unwrap();
        let hi = *points.iter().max().unwrap();
        let got: HashSet<usize> = list.find_containing(&points).into_iter().collect();
        let lo_set: HashSet<usize> = list.find_containing(&[lo]).into_iter().collect();
        let hi_set: HashSet<usize> = list.find_containing(&[hi]).into_iter().collect();
        let want: HashSet<usize> = lo_set.intersection(&hi_set).copied().collect();
        prop_assert_eq!(got, want);
    }
}
