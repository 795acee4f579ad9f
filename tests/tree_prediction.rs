use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use yolotree::{LabelTree, Prediction};

fn scenario_tree() -> LabelTree {
    LabelTree::parse("node0 -1\nnode1 0\nnode2 0\n").unwrap()
}

/// Three-level tree with two roots:
/// 0 ─┬─ 2 ─┬─ 5
///    │     └─ 6
///    └─ 3
/// 1 ── 4
fn deeper_tree() -> LabelTree {
    LabelTree::parse("a -1\nb -1\nc 0\nd 0\ne 1\nf 2\ng 2\n").unwrap()
}

fn random_probs(rng: &mut StdRng, n: usize) -> Vec<f32> {
    (0..n).map(|_| rng.random::<f32>()).collect()
}

fn assert_close(a: &[f32], b: &[f32]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert!((x - y).abs() < 1e-6, "{a:?} != {b:?}");
    }
}

#[test]
fn propagation_multiplies_root_path() {
    let tree = scenario_tree();
    let mut probs = [0.9f32, 0.6, 0.4];
    tree.propagate_absolute(&mut probs).unwrap();
    assert_close(&probs, &[0.9, 0.54, 0.36]);
}

#[test]
fn predict_descends_to_leaf_when_accepted() {
    let tree = scenario_tree();
    let pred = tree.predict_top_down(&[0.9, 0.54, 0.36], 0.3).unwrap().unwrap();
    assert_eq!(pred.node, 1);
    assert!((pred.prob - 0.54).abs() < 1e-6);
}

#[test]
fn predict_falls_back_to_accepted_parent() {
    let tree = scenario_tree();
    let pred = tree.predict_top_down(&[0.9, 0.54, 0.36], 0.6).unwrap();
    assert_eq!(pred, Some(Prediction { node: 0, prob: 0.9 }));
}

#[test]
fn predict_returns_none_when_root_group_fails() {
    let tree = scenario_tree();
    assert_eq!(tree.predict_top_down(&[0.9, 0.54, 0.36], 0.95).unwrap(), None);
}

#[test]
fn predict_does_not_backtrack_into_other_branches() {
    let tree = deeper_tree();
    // Root group picks node 0, whose children (2, 3) fail; node 4 under the
    // weaker root 1 would pass but is never visited.
    let abs = [0.8, 0.7, 0.2, 0.1, 0.69, 0.1, 0.1];
    let pred = tree.predict_top_down(&abs, 0.3).unwrap();
    assert_eq!(pred, Some(Prediction { node: 0, prob: 0.8 }));
}

#[test]
fn predict_walks_multiple_levels() {
    let tree = deeper_tree();
    let abs = [0.8, 0.1, 0.6, 0.2, 0.1, 0.2, 0.5];
    let pred = tree.predict_top_down(&abs, 0.3).unwrap();
    assert_eq!(pred, Some(Prediction { node: 6, prob: 0.5 }));
}

#[test]
fn propagation_is_non_increasing_along_paths() {
    let tree = deeper_tree();
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..200 {
        let mut probs = random_probs(&mut rng, tree.len());
        tree.propagate_absolute(&mut probs).unwrap();
        for i in 0..tree.len() {
            if let Some(f) = tree.father(i) {
                assert!(probs[i] <= probs[f]);
            }
        }
    }
}

#[test]
fn prediction_is_none_iff_root_best_fails_and_path_is_accepted() {
    let tree = deeper_tree();
    let root = tree.groups()[0];
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..500 {
        let mut probs = random_probs(&mut rng, tree.len());
        tree.propagate_absolute(&mut probs).unwrap();
        let threshold = rng.random_range(0.0f32..0.8);
        let root_best = root.range().map(|i| probs[i]).fold(f32::NEG_INFINITY, f32::max);

        match tree.predict_top_down(&probs, threshold).unwrap() {
            None => assert!(root_best < threshold),
            Some(pred) => {
                assert!(root_best >= threshold);
                assert_eq!(probs[pred.node], pred.prob);
                for node in tree.ancestors(pred.node) {
                    assert!(probs[node] >= threshold);
                    // Each ancestor was the best of its group.
                    let group = tree
                        .groups()
                        .iter()
                        .find(|g| g.range().contains(&node))
                        .unwrap();
                    let best = group.range().map(|i| probs[i]).fold(f32::NEG_INFINITY, f32::max);
                    assert_eq!(probs[node], best);
                }
            }
        }
    }
}

#[test]
fn absolute_prob_matches_propagation_on_random_inputs() {
    let tree = deeper_tree();
    let mut rng = StdRng::seed_from_u64(5);
    let cond = random_probs(&mut rng, tree.len());
    let mut abs = cond.clone();
    tree.propagate_absolute(&mut abs).unwrap();
    for node in 0..tree.len() {
        let single = tree.absolute_prob(&cond, node).unwrap();
        assert!((single - abs[node]).abs() < 1e-6);
    }
}
