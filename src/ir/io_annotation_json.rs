//! Reader for the provider's per-image annotation JSON.
//!
//! Only the fields the derivation rules need are read:
//!
//! ```json
//! {
//!   "FileInfo": { "Width": 640, "Height": 480 },
//!   "ObjectInfo": { "BoundingBox": {
//!     "Leye":  { "Opened": false, "isVisible": true, "Position": [100, 100, 140, 120] },
//!     "Reye":  { "Opened": false, "isVisible": true, "Position": [200, 100, 240, 120] },
//!     "Mouth": { "Opened": false, "isVisible": true, "Position": [300, 300, 340, 340] },
//!     "Phone": { "isVisible": false, "Position": [] },
//!     "Cigar": { "isVisible": false, "Position": [] }
//!   } }
//! }
//! ```
//!
//! `Position` is only checked for visible attributes; hidden ones often carry
//! an empty or zero-filled array.

use std::fs;
use std::path::Path;

use serde::de::{self, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use super::bbox::{AbsoluteBox, ImageSize};
use super::model::{AnnotationRecord, Attribute, AttributeAnnotation};
use crate::error::DmsLabelError;

/// File extension of annotation records.
pub const ANNOTATION_EXTENSION: &str = "json";

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "FileInfo")]
    file_info: RawFileInfo,
    #[serde(rename = "ObjectInfo")]
    object_info: RawObjectInfo,
}

#[derive(Debug, Deserialize)]
struct RawFileInfo {
    #[serde(rename = "Width", deserialize_with = "deserialize_dimension")]
    width: u32,
    #[serde(rename = "Height", deserialize_with = "deserialize_dimension")]
    height: u32,
}

// Some exporters write dimensions as floats (`640.0`); accept any integral value.
fn deserialize_dimension<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserializer)?;
    if value.fract() == 0.0 && (0.0..=u32::MAX as f64).contains(&value) {
        Ok(value as u32)
    } else {
        Err(de::Error::custom(format!(
            "image dimension must be a non-negative integer, got {}",
            value
        )))
    }
}

#[derive(Debug, Deserialize)]
struct RawObjectInfo {
    #[serde(rename = "BoundingBox")]
    bounding_box: RawBoundingBoxes,
}

#[derive(Debug, Deserialize)]
struct RawBoundingBoxes {
    #[serde(rename = "Leye")]
    left_eye: RawAttribute,
    #[serde(rename = "Reye")]
    right_eye: RawAttribute,
    #[serde(rename = "Mouth")]
    mouth: RawAttribute,
    #[serde(rename = "Phone")]
    phone: RawAttribute,
    #[serde(rename = "Cigar")]
    cigarette: RawAttribute,
}

impl RawBoundingBoxes {
    fn get(&self, attribute: Attribute) -> &RawAttribute {
        match attribute {
            Attribute::LeftEye => &self.left_eye,
            Attribute::RightEye => &self.right_eye,
            Attribute::Mouth => &self.mouth,
            Attribute::Phone => &self.phone,
            Attribute::Cigarette => &self.cigarette,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawAttribute {
    #[serde(rename = "Opened", default)]
    opened: Option<bool>,
    #[serde(rename = "isVisible")]
    is_visible: bool,
    #[serde(rename = "Position", default)]
    position: Option<Value>,
}

/// Source key of an attribute under `ObjectInfo.BoundingBox`.
pub fn source_key(attribute: Attribute) -> &'static str {
    match attribute {
        Attribute::LeftEye => "Leye",
        Attribute::RightEye => "Reye",
        Attribute::Mouth => "Mouth",
        Attribute::Phone => "Phone",
        Attribute::Cigarette => "Cigar",
    }
}

/// Read one annotation file into an [`AnnotationRecord`].
pub fn read_annotation_json(path: &Path) -> Result<AnnotationRecord, DmsLabelError> {
    let content = fs::read_to_string(path).map_err(|source| DmsLabelError::AnnotationRead {
        path: path.to_path_buf(),
        source,
    })?;
    from_annotation_str(&content, path)
}

/// Parse annotation JSON text. `path` is only used for error context.
pub fn from_annotation_str(json: &str, path: &Path) -> Result<AnnotationRecord, DmsLabelError> {
    let value: Value =
        serde_json::from_str(json).map_err(|source| DmsLabelError::AnnotationJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    let raw: RawRecord =
        serde_json::from_value(value).map_err(|e| DmsLabelError::MalformedAnnotation {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    to_record(raw, path)
}

fn to_record(raw: RawRecord, path: &Path) -> Result<AnnotationRecord, DmsLabelError> {
    let RawFileInfo { width, height } = raw.file_info;
    if width == 0 || height == 0 {
        return Err(DmsLabelError::MalformedAnnotation {
            path: path.to_path_buf(),
            message: format!("image dimensions must be positive, got {}x{}", width, height),
        });
    }

    let mut record = AnnotationRecord::empty(ImageSize::new(width, height));
    let boxes = &raw.object_info.bounding_box;
    for attribute in Attribute::ALL {
        *record.get_mut(attribute) = to_attribute(attribute, boxes.get(attribute), path)?;
    }

    Ok(record)
}

fn to_attribute(
    attribute: Attribute,
    raw: &RawAttribute,
    path: &Path,
) -> Result<AttributeAnnotation, DmsLabelError> {
    let is_open = match (attribute.has_open_state(), raw.opened) {
        (true, Some(opened)) => opened,
        (true, None) => {
            return Err(DmsLabelError::MalformedAnnotation {
                path: path.to_path_buf(),
                message: format!("missing field `Opened` in {}", source_key(attribute)),
            });
        }
        (false, _) => false,
    };

    if !raw.is_visible {
        return Ok(AttributeAnnotation::hidden(is_open));
    }

    let bbox = raw
        .position
        .as_ref()
        .and_then(parse_position)
        .ok_or_else(|| DmsLabelError::MalformedAnnotation {
            path: path.to_path_buf(),
            message: format!(
                "{}.Position must be an array of 4 numbers when isVisible is true",
                source_key(attribute)
            ),
        })?;

    Ok(AttributeAnnotation::visible(is_open, bbox))
}

fn parse_position(value: &Value) -> Option<AbsoluteBox> {
    let items = value.as_array()?;
    let [xmin, ymin, xmax, ymax] = items.as_slice() else {
        return None;
    };
    Some(AbsoluteBox::from_xyxy(
        xmin.as_f64()?,
        ymin.as_f64()?,
        xmax.as_f64()?,
        ymax.as_f64()?,
    ))
}
