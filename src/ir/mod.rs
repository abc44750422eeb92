//! Core types shared by the conversion and split pipelines.
//!
//! - [`AnnotationRecord`]: canonical form of one provider annotation file,
//!   produced by [`io_annotation_json`].
//! - [`BBoxXYXY`] / [`BBoxCXCYWH`]: boxes tagged with their coordinate space
//!   ([`Pixel`] or [`Normalized`]), so pixel values cannot reach a label file
//!   without normalization.
//! - [`ClassMap`]: class ids written to label files.
//! - [`io_yolo::LabelLine`]: one row of a YOLO label file.
//!
//! # Example
//!
//! ```
//! use dmslabel::ir::{AbsoluteBox, ImageSize};
//! use dmslabel::ir::io_yolo::LabelLine;
//!
//! let bbox = AbsoluteBox::from_xyxy(300.0, 300.0, 340.0, 340.0);
//! let line = LabelLine::new(1, bbox.normalize(ImageSize::new(640, 480)));
//! assert_eq!(line.to_string(), "1 0.500000 0.666667 0.062500 0.083333");
//! ```

mod bbox;
mod class_map;
pub mod io_annotation_json;
pub mod io_yolo;
mod model;
mod space;

pub use bbox::{AbsoluteBox, BBoxCXCYWH, BBoxXYXY, ImageSize, NormalizedBox};
pub use class_map::{ClassLabel, ClassMap};
pub use model::{AnnotationRecord, Attribute, AttributeAnnotation};
pub use space::{Normalized, Pixel};
