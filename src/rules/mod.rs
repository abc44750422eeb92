//! Label derivation rules.
//!
//! Each rule looks at a parsed [`AnnotationRecord`] and emits zero or more
//! detections. Rules are independent: several may fire for one image, and
//! none firing is a valid background image.

use crate::ir::{AbsoluteBox, AnnotationRecord, Attribute, ClassLabel};

/// A class assigned to a source box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub class: ClassLabel,
    /// The attribute the box came from.
    pub source: Attribute,
    pub bbox: AbsoluteBox,
}

/// One derivation rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rule {
    /// Both eyes closed. The gate is joint (neither eye may be open) but each
    /// visible eye is emitted on its own, so one closed eye next to an open
    /// one yields nothing.
    EyesClosed,
    /// Mouth open and visible.
    MouthOpen,
    /// Phone visible.
    Phone,
    /// Cigarette visible.
    Cigar,
}

impl Rule {
    /// Evaluation order; it is also the line order within a label file.
    pub const ORDERED: [Rule; 4] = [Rule::EyesClosed, Rule::MouthOpen, Rule::Phone, Rule::Cigar];

    pub fn class(&self) -> ClassLabel {
        match self {
            Rule::EyesClosed => ClassLabel::EyeClosed,
            Rule::MouthOpen => ClassLabel::MouthOpen,
            Rule::Phone => ClassLabel::Phone,
            Rule::Cigar => ClassLabel::Cigar,
        }
    }

    /// Append this rule's detections for `record` to `out`.
    pub fn apply(&self, record: &AnnotationRecord, out: &mut Vec<Detection>) {
        let class = self.class();
        let mut emit = |source: Attribute| {
            if let Some(bbox) = record.get(source).visible_box() {
                out.push(Detection {
                    class,
                    source,
                    bbox,
                });
            }
        };

        match self {
            Rule::EyesClosed => {
                if !record.left_eye.is_open && !record.right_eye.is_open {
                    emit(Attribute::LeftEye);
                    emit(Attribute::RightEye);
                }
            }
            Rule::MouthOpen => {
                if record.mouth.is_open {
                    emit(Attribute::Mouth);
                }
            }
            Rule::Phone => emit(Attribute::Phone),
            Rule::Cigar => emit(Attribute::Cigarette),
        }
    }
}

/// Run every rule over `record` in evaluation order.
pub fn derive_detections(record: &AnnotationRecord) -> Vec<Detection> {
    let mut detections = Vec::new();
    for rule in Rule::ORDERED {
        rule.apply(record, &mut detections);
    }
    detections
}
