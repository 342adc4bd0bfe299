use nearcount::{Counter, CounterConfig, Outcome, SplitPolicy};
use proptest::prelude::*;
use std::collections::HashMap;

fn expected(pairs: &[(&str, u64)]) -> HashMap<String, u64> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn dissimilar_sentences_stay_apart() {
    let lines = [
        "An aardvark ate my apple.",
        "An apple is a fruit.",
        "My favorite fruit is mango.",
        "A mango is a nutritious snack.",
    ];
    let mut c = Counter::new(&CounterConfig::new(2, 0.70)).unwrap();
    for l in lines {
        assert_eq!(c.assign(l), Outcome::NewGroup);
    }
    let want: HashMap<String, u64> = lines.iter().map(|l| (l.to_string(), 1)).collect();
    assert_eq!(c.counts(), want);
}

#[test]
fn near_duplicates_collapse_into_first_representative() {
    let config = CounterConfig::new(2, 0.70).with_ignore(["[.!]$"]);
    let mut c = Counter::new(&config).unwrap();
    assert_eq!(c.assign("There's a snake in my boot."), Outcome::NewGroup);
    assert_eq!(c.assign("There's a snail in my boot."), Outcome::Merged);
    assert_eq!(c.assign("There's a boot in my boot."), Outcome::Merged);
    assert_eq!(c.counts(), expected(&[("There's a snake in my boot.", 3)]));
}

#[test]
fn mixed_corpus_with_masking_and_rejection() {
    let lines = [
        "An aardvark ate my apple.",
        "An apple is a fruit.",
        "A mango is a fruit.",
        "My favorite fruit is mango.",
        "A mango is a nutritious snack.",
        "There's a snake in my boot.",
        "There's a snail in my boot.",
        "There's a boot in my boot.",
        "My name is Talky Tina, and you'd better be nice to me.",
        "My name is Chalky Tina, and you'd better be nice to me!",
        "To infinity and beyond!",
        "To Nanaimo and beyond!",
        "You've got a friend in me.",
        "2024-09-08T23:30:03.333",
    ];
    let config = CounterConfig::new(2, 0.70)
        .with_ignore(["[.!]$", "[,']"])
        .with_reject([r"\d{4}"]);
    let mut c = Counter::new(&config).unwrap();
    for l in lines {
        c.assign(l);
    }

    assert_eq!(
        c.counts(),
        expected(&[
            ("An aardvark ate my apple.", 1),
            ("An apple is a fruit.", 1),
            ("A mango is a fruit.", 1),
            ("My favorite fruit is mango.", 1),
            ("A mango is a nutritious snack.", 1),
            ("There's a snake in my boot.", 3),
            ("My name is Talky Tina, and you'd better be nice to me.", 2),
            ("To infinity and beyond!", 1),
            ("To Nanaimo and beyond!", 1),
            ("You've got a friend in me.", 1),
        ])
    );
    assert_eq!(c.total(), 13);
    assert_eq!(c.len(), 10);
}

#[test]
fn same_result_under_overflow_split_policy() {
    let config = CounterConfig::new(2, 0.70)
        .with_ignore(["[.!]$"])
        .with_split(SplitPolicy::Overflow { leaf_limit: 2 });
    let mut c = Counter::new(&config).unwrap();
    for l in ["There's a snake in my boot.", "There's a snail in my boot.", "There's a boot in my boot."] {
        c.assign(l);
    }
    assert_eq!(c.counts(), expected(&[("There's a snake in my boot.", 3)]));
}

#[test]
fn score_equal_to_threshold_is_not_accepted() {
    // "abcd" vs "abcx" scores exactly 0.75
    let mut c = Counter::new(&CounterConfig::new(10, 0.75)).unwrap();
    c.assign("abcd");
    assert_eq!(c.assign("abcx"), Outcome::NewGroup);
    assert_eq!(c.counts(), expected(&[("abcd", 1), ("abcx", 1)]));
}

#[test]
fn boundary_holds_for_non_dyadic_thresholds() {
    // (threshold, second line); each pair scores exactly the threshold against "aaaaaaaaaa"
    let cases = [
        (0.3, "aaabbbbbbb"),
        (0.1, "abbbbbbbbb"),
        (0.7, "aaaaaaabbb"),
        (0.9, "aaaaaaaaab"),
        (0.6, "aaaaaabbbb"),
    ];
    for (threshold, line) in cases {
        let mut at = Counter::new(&CounterConfig::new(100, threshold)).unwrap();
        at.assign("aaaaaaaaaa");
        assert_eq!(at.assign(line), Outcome::NewGroup, "threshold {threshold} with {line:?}");

        let mut below = Counter::new(&CounterConfig::new(100, threshold - 1e-9)).unwrap();
        below.assign("aaaaaaaaaa");
        assert_eq!(below.assign(line), Outcome::Merged, "threshold {threshold} - eps with {line:?}");
    }
}

#[test]
fn score_above_threshold_is_accepted() {
    let mut c = Counter::new(&CounterConfig::new(10, 0.74)).unwrap();
    c.assign("abcd");
    assert_eq!(c.assign("abcx"), Outcome::Merged);
    assert_eq!(c.counts(), expected(&[("abcd", 2)]));
}

#[test]
fn rejection_sees_masked_text() {
    let config = CounterConfig::new(2, 0.7).with_ignore(["x"]).with_reject(["^ab$"]);
    let mut c = Counter::new(&config).unwrap();
    assert_eq!(c.assign("axb"), Outcome::Rejected);
    assert_eq!(c.assign("abc"), Outcome::NewGroup);
    assert_eq!(c.counts(), expected(&[("abc", 1)]));
}

#[test]
fn weighted_assign_adds_weights() {
    let mut c = Counter::new(&CounterConfig::new(3, 0.7)).unwrap();
    c.weighted_assign("disk full on /dev/sda1", 5);
    c.weighted_assign("disk full on /dev/sda2", 7);
    assert_eq!(c.counts(), expected(&[("disk full on /dev/sda1", 12)]));
    assert_eq!(c.total(), 12);
}

#[test]
fn exact_repeats_merge_even_at_threshold_one() {
    let mut c = Counter::new(&CounterConfig::new(2, 1.0)).unwrap();
    c.assign("same line");
    assert_eq!(c.assign("same line"), Outcome::Merged);
    assert_eq!(c.assign("same lime"), Outcome::NewGroup);
    assert_eq!(c.counts(), expected(&[("same line", 2), ("same lime", 1)]));
}

#[test]
fn empty_and_short_inputs_are_counted() {
    let mut c = Counter::new(&CounterConfig::new(4, 0.7)).unwrap();
    c.assign("");
    c.assign("");
    c.assign("ab");
    assert_eq!(c.counts(), expected(&[("", 2), ("ab", 1)]));
    assert_eq!(c.tree().node_count(), 1);
}

#[test]
fn groups_sorted_by_count_then_representative() {
    let mut c = Counter::new(&CounterConfig::new(2, 0.9)).unwrap();
    for l in ["zeta", "alpha", "omega", "omega", "alpha"] {
        c.assign(l);
    }
    let reps: Vec<(String, u64)> = c.groups().into_iter().map(|g| (g.representative, g.count)).collect();
    assert_eq!(
        reps,
        vec![("alpha".to_string(), 2), ("omega".to_string(), 2), ("zeta".to_string(), 1)]
    );
}

#[test]
fn merge_folds_another_counter() {
    let config = CounterConfig::new(4, 0.7);
    let mut a = Counter::new(&config).unwrap();
    let mut b = Counter::new(&config).unwrap();
    a.assign("worker 1 started");
    b.assign("worker 2 started");
    b.assign("worker 3 started");
    a.merge(&b);
    assert_eq!(a.counts(), expected(&[("worker 1 started", 3)]));
    assert_ne!(a.id(), b.id());
}

proptest! {
    #[test]
    fn repeated_input_counts_once_per_call(line in "[a-z ]{0,30}", n in 1u64..20, step in 1usize..6) {
        let mut c = Counter::new(&CounterConfig::new(step, 0.7)).unwrap();
        for _ in 0..n {
            c.assign(&line);
        }
        prop_assert_eq!(c.len(), 1);
        prop_assert_eq!(c.counts().get(&line).copied(), Some(n));
    }

    #[test]
    fn total_equals_sum_of_weights(
        lines in proptest::collection::vec(("[a-c]{0,8}", 1u64..5), 0..40),
        step in 1usize..4,
    ) {
        let mut c = Counter::new(&CounterConfig::new(step, 0.5)).unwrap();
        for (l, w) in &lines {
            c.weighted_assign(l, *w);
        }
        let expected: u64 = lines.iter().map(|(_, w)| w).sum();
        prop_assert_eq!(c.total(), expected);
        prop_assert_eq!(c.counts().values().sum::<u64>(), expected);
    }
}
