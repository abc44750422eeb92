//! Canonical per-image annotation record.
//!
//! The parser maps the provider's JSON onto these types; the derivation
//! rules only ever see this representation.

use std::fmt;

use super::bbox::{AbsoluteBox, ImageSize};

/// An annotated facial or object attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attribute {
    LeftEye,
    RightEye,
    Mouth,
    Phone,
    Cigarette,
}

impl Attribute {
    pub const ALL: [Attribute; 5] = [
        Attribute::LeftEye,
        Attribute::RightEye,
        Attribute::Mouth,
        Attribute::Phone,
        Attribute::Cigarette,
    ];

    /// Canonical key used in logs and reports.
    pub fn key(&self) -> &'static str {
        match self {
            Attribute::LeftEye => "leftEye",
            Attribute::RightEye => "rightEye",
            Attribute::Mouth => "mouth",
            Attribute::Phone => "phone",
            Attribute::Cigarette => "cigarette",
        }
    }

    /// Whether the open/closed state is part of the annotation.
    pub fn has_open_state(&self) -> bool {
        matches!(
            self,
            Attribute::LeftEye | Attribute::RightEye | Attribute::Mouth
        )
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// State and location of one attribute in one image.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct AttributeAnnotation {
    pub is_visible: bool,
    /// Only meaningful for eyes and mouth; `false` otherwise.
    pub is_open: bool,
    /// Present whenever `is_visible` is true.
    pub bbox: Option<AbsoluteBox>,
}

impl AttributeAnnotation {
    /// A visible attribute with a box.
    pub fn visible(is_open: bool, bbox: AbsoluteBox) -> Self {
        Self {
            is_visible: true,
            is_open,
            bbox: Some(bbox),
        }
    }

    /// An attribute that is not visible in the image.
    pub fn hidden(is_open: bool) -> Self {
        Self {
            is_visible: false,
            is_open,
            bbox: None,
        }
    }

    /// The box, if the attribute is visible.
    pub fn visible_box(&self) -> Option<AbsoluteBox> {
        if self.is_visible {
            self.bbox
        } else {
            None
        }
    }
}

/// One source image's annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct AnnotationRecord {
    pub image_size: ImageSize,
    pub left_eye: AttributeAnnotation,
    pub right_eye: AttributeAnnotation,
    pub mouth: AttributeAnnotation,
    pub phone: AttributeAnnotation,
    pub cigarette: AttributeAnnotation,
}

impl AnnotationRecord {
    /// A record where nothing is visible and every eye/mouth is open.
    pub fn empty(image_size: ImageSize) -> Self {
        Self {
            image_size,
            left_eye: AttributeAnnotation::hidden(true),
            right_eye: AttributeAnnotation::hidden(true),
            mouth: AttributeAnnotation::hidden(false),
            phone: AttributeAnnotation::hidden(false),
            cigarette: AttributeAnnotation::hidden(false),
        }
    }

    pub fn get(&self, attribute: Attribute) -> &AttributeAnnotation {
        match attribute {
            Attribute::LeftEye => &self.left_eye,
            Attribute::RightEye => &self.right_eye,
            Attribute::Mouth => &self.mouth,
            Attribute::Phone => &self.phone,
            Attribute::Cigarette => &self.cigarette,
        }
    }

    pub fn get_mut(&mut self, attribute: Attribute) -> &mut AttributeAnnotation {
        match attribute {
            Attribute::LeftEye => &mut self.left_eye,
            Attribute::RightEye => &mut self.right_eye,
            Attribute::Mouth => &mut self.mouth,
            Attribute::Phone => &mut self.phone,
            Attribute::Cigarette => &mut self.cigarette,
        }
    }
}
