use std::path::Path;

use dmslabel::ir::io_yolo::{parse_label_line, LabelLine};
use proptest::prelude::*;

mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn in_bounds_boxes_normalize_into_unit_range(
        (size, bbox) in proptest_helpers::arb_image_and_box()
    ) {
        let n = bbox.normalize(size);
        for v in [n.cx, n.cy, n.w, n.h] {
            prop_assert!((0.0..=1.0).contains(&v), "{v} outside [0, 1]");
        }
    }

    #[test]
    fn label_text_roundtrip_recovers_pixel_box(
        (size, bbox) in proptest_helpers::arb_image_and_box(),
        class_id in 0u32..4,
    ) {
        let line = LabelLine::new(class_id, bbox.normalize(size)).to_string();
        let parsed = parse_label_line(&line, Path::new("prop.txt"), 1)
            .expect("parse label line")
            .expect("non-blank line");
        prop_assert_eq!(parsed.class_id, class_id);

        let restored = parsed.bbox.denormalize(size);
        let eps = proptest_helpers::eps_label(size);
        for (a, b) in [
            (bbox.xmin, restored.xmin),
            (bbox.ymin, restored.ymin),
            (bbox.xmax, restored.xmax),
            (bbox.ymax, restored.ymax),
        ] {
            prop_assert!((a - b).abs() <= eps, "{a} vs {b} (eps {eps}) in {line:?}");
        }
    }

    #[test]
    fn label_text_has_six_decimals_and_no_negative_zero(
        (size, bbox) in proptest_helpers::arb_image_and_box()
    ) {
        let line = LabelLine::new(0, bbox.normalize(size)).to_string();
        let tokens: Vec<&str> = line.split(' ').collect();
        prop_assert_eq!(tokens.len(), 5);
        for token in &tokens[1..] {
            let decimals = token.split('.').nth(1).map(str::len);
            prop_assert_eq!(decimals, Some(6), "token {}", token);
            prop_assert!(!token.starts_with("-0.000000"), "token {}", token);
        }
    }
}
