#![allow(dead_code)]

use dmslabel::ir::{AbsoluteBox, AnnotationRecord, AttributeAnnotation, ImageSize};
use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Pixel tolerance after a trip through six-decimal label text.
pub fn eps_label(size: ImageSize) -> f64 {
    size.width.max(size.height) as f64 * 1e-6 + 1e-9
}

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_image_size() -> impl Strategy<Value = ImageSize> {
    (1u32..=4096, 1u32..=4096).prop_map(|(w, h)| ImageSize::new(w, h))
}

/// An ordered box inside `size`, with integer or fractional corners.
pub fn arb_box_within(size: ImageSize) -> impl Strategy<Value = AbsoluteBox> {
    let (w, h) = (size.width as f64, size.height as f64);
    (0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64).prop_map(move |(a, b, c, d)| {
        let (x1, x2) = if a <= b { (a, b) } else { (b, a) };
        let (y1, y2) = if c <= d { (c, d) } else { (d, c) };
        AbsoluteBox::from_xyxy(x1 * w, y1 * h, x2 * w, y2 * h)
    })
}

pub fn arb_image_and_box() -> impl Strategy<Value = (ImageSize, AbsoluteBox)> {
    arb_image_size().prop_flat_map(|size| (Just(size), arb_box_within(size)))
}

fn arb_attribute(size: ImageSize) -> impl Strategy<Value = AttributeAnnotation> {
    (any::<bool>(), any::<bool>(), arb_box_within(size)).prop_map(|(visible, open, bbox)| {
        if visible {
            AttributeAnnotation::visible(open, bbox)
        } else {
            AttributeAnnotation::hidden(open)
        }
    })
}

/// Records with every combination of visibility and open state.
pub fn arb_record() -> impl Strategy<Value = AnnotationRecord> {
    arb_image_size().prop_flat_map(|size| {
        (
            arb_attribute(size),
            arb_attribute(size),
            arb_attribute(size),
            arb_attribute(size),
            arb_attribute(size),
        )
            .prop_map(move |(left_eye, right_eye, mouth, phone, cigarette)| {
                AnnotationRecord {
                    image_size: size,
                    left_eye,
                    right_eye,
                    mouth,
                    phone: AttributeAnnotation {
                        is_open: false,
                        ..phone
                    },
                    cigarette: AttributeAnnotation {
                        is_open: false,
                        ..cigarette
                    },
                }
            })
    })
}
