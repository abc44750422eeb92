//! Coordinate space markers.
//!
//! Uninhabited types used only as type parameters, so that a pixel box can
//! never be written to a label file without going through normalization.

use std::fmt;

/// Absolute pixel coordinates in the source image, origin at the top-left.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Coordinates scaled to the unit square by the image width and height.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum Normalized {}

impl fmt::Debug for Pixel {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}

impl fmt::Debug for Normalized {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {}
    }
}
