#![cfg(feature = "rayon")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use yolotree::lowlevel::filter_boxes_par;
use yolotree::{
    filter_boxes, AnchorTable, BoxDecoder, DetectConfig, Detector, FilterParams, LabelTree,
    TensorView,
};

const TREE: &str = "a -1\nb -1\nc 0\nd 0\ne 0\nf 1\ng 1\nh 2\ni 2\n";

fn random_tensor(rng: &mut StdRng, shape: [usize; 4]) -> Vec<f32> {
    let len = shape.iter().product();
    (0..len).map(|_| rng.random_range(-4.0f32..4.0)).collect()
}

#[test]
fn parallel_decode_and_filter_match_sequential() {
    let tree = LabelTree::parse(TREE).unwrap();
    let anchors = AnchorTable::new(vec![(0.6, 0.8), (1.5, 2.0), (3.0, 2.5)]).unwrap();
    let decoder = BoxDecoder::new(&tree, &anchors);
    let shape = [2, 7, 5, decoder.expected_channels()];
    let mut rng = StdRng::seed_from_u64(2024);
    let data = random_tensor(&mut rng, shape);
    let tensor = TensorView::new(&data, shape).unwrap();
    let params = FilterParams {
        score_threshold: 0.05,
        image_height: 480,
        image_width: 640,
    };

    for b in 0..tensor.batch() {
        let seq = decoder.decode_image(tensor, b).unwrap();
        let par = decoder.decode_image_par(tensor, b).unwrap();
        assert_eq!(seq, par);

        let seq_c = filter_boxes(seq, &tree, params).unwrap();
        let par_c = filter_boxes_par(par, &tree, params).unwrap();
        assert!(!seq_c.is_empty());
        assert_eq!(seq_c, par_c);
    }
}

#[test]
fn parallel_detector_matches_sequential() {
    let tree = LabelTree::parse(TREE).unwrap();
    let anchors = AnchorTable::new(vec![(1.0, 1.0), (2.0, 2.0)]).unwrap();
    let channels = anchors.len() * (5 + tree.len());
    let shape = [1, 13, 13, channels];
    let mut rng = StdRng::seed_from_u64(7);
    let data = random_tensor(&mut rng, shape);
    let tensor = TensorView::new(&data, shape).unwrap();

    let base = DetectConfig {
        score_threshold: 0.1,
        iou_threshold: 0.45,
        max_boxes: 20,
        parallel: false,
    };
    let seq = Detector::new(tree.clone(), anchors.clone()).with_config(base.clone());
    let par = Detector::new(tree, anchors).with_config(DetectConfig {
        parallel: true,
        ..base
    });

    let a = seq.detect_image(tensor, 0, 416, 416).unwrap();
    let b = par.detect_image(tensor, 0, 416, 416).unwrap();
    assert_eq!(a, b);
}
