//! Bounding box types and the pixel <-> YOLO normalization.

use std::marker::PhantomData;

use super::space::{Normalized, Pixel};

/// Image dimensions in pixels.
///
/// Both values are positive for any size produced by the annotation parser;
/// normalization divides by them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    #[inline]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// An axis-aligned box as corner coordinates (xmin, ymin, xmax, ymax).
///
/// The constructor does not require `min <= max`. Upstream annotation data is
/// not validated, and an inverted box has to survive the pipeline so it can be
/// reported instead of crashing the run.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
    _space: PhantomData<TSpace>,
}

/// An axis-aligned box as center and size (cx, cy, w, h), the YOLO layout.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxCXCYWH<TSpace> {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
    _space: PhantomData<TSpace>,
}

/// A box in source image pixels.
pub type AbsoluteBox = BBoxXYXY<Pixel>;

/// A YOLO-normalized box.
pub type NormalizedBox = BBoxCXCYWH<Normalized>;

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
            _space: PhantomData,
        }
    }

    /// Width of the box; negative when `xmax < xmin`.
    #[inline]
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    /// Height of the box; negative when `ymax < ymin`.
    #[inline]
    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }

    /// Returns true if min <= max on both axes.
    #[inline]
    pub fn is_ordered(&self) -> bool {
        self.xmin <= self.xmax && self.ymin <= self.ymax
    }

    #[inline]
    pub fn is_finite(&self) -> bool {
        self.xmin.is_finite()
            && self.ymin.is_finite()
            && self.xmax.is_finite()
            && self.ymax.is_finite()
    }
}

impl<TSpace> BBoxCXCYWH<TSpace> {
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, w: f64, h: f64) -> Self {
        Self {
            cx,
            cy,
            w,
            h,
            _space: PhantomData,
        }
    }
}

impl BBoxXYXY<Pixel> {
    /// Returns true if every corner lies inside `[0, width] x [0, height]`.
    pub fn is_within(&self, size: ImageSize) -> bool {
        let (w, h) = (size.width as f64, size.height as f64);
        [self.xmin, self.xmax].iter().all(|x| (0.0..=w).contains(x))
            && [self.ymin, self.ymax].iter().all(|y| (0.0..=h).contains(y))
    }

    /// Converts to YOLO center/size form scaled by the image dimensions.
    ///
    /// The box is neither clamped nor reordered: an out-of-bounds box yields
    /// values outside `[0, 1]`, an inverted one yields a negative size.
    pub fn normalize(&self, size: ImageSize) -> BBoxCXCYWH<Normalized> {
        let (w, h) = (size.width as f64, size.height as f64);
        BBoxCXCYWH::from_cxcywh(
            ((self.xmin + self.xmax) / 2.0) / w,
            ((self.ymin + self.ymax) / 2.0) / h,
            (self.xmax - self.xmin) / w,
            (self.ymax - self.ymin) / h,
        )
    }
}

impl BBoxCXCYWH<Normalized> {
    /// Inverse of [`BBoxXYXY::normalize`].
    pub fn denormalize(&self, size: ImageSize) -> BBoxXYXY<Pixel> {
        let (w, h) = (size.width as f64, size.height as f64);
        let (cx, cy) = (self.cx * w, self.cy * h);
        let (half_w, half_h) = (self.w * w / 2.0, self.h * h / 2.0);
        BBoxXYXY::from_xyxy(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.xmin)
            .field("ymin", &self.ymin)
            .field("xmax", &self.xmax)
            .field("ymax", &self.ymax)
            .finish()
    }
}

impl<TSpace> std::fmt::Debug for BBoxCXCYWH<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxCXCYWH")
            .field("cx", &self.cx)
            .field("cy", &self.cy)
            .field("w", &self.w)
            .field("h", &self.h)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VGA: ImageSize = ImageSize {
        width: 640,
        height: 480,
    };

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn normalize_follows_center_size_formula() {
        let bbox = AbsoluteBox::from_xyxy(100.0, 100.0, 140.0, 120.0);
        let n = bbox.normalize(VGA);
        assert!(close(n.cx, 120.0 / 640.0));
        assert!(close(n.cy, 110.0 / 480.0));
        assert!(close(n.w, 40.0 / 640.0));
        assert!(close(n.h, 20.0 / 480.0));
    }

    #[test]
    fn normalize_passes_inverted_boxes_through() {
        let bbox = AbsoluteBox::from_xyxy(140.0, 120.0, 100.0, 100.0);
        assert!(!bbox.is_ordered());
        let n = bbox.normalize(VGA);
        assert!(n.w < 0.0);
        assert!(n.h < 0.0);
    }

    #[test]
    fn normalize_does_not_clamp_out_of_bounds_boxes() {
        let bbox = AbsoluteBox::from_xyxy(600.0, -10.0, 700.0, 20.0);
        assert!(!bbox.is_within(VGA));
        let n = bbox.normalize(VGA);
        assert!(n.cx + n.w / 2.0 > 1.0);
    }

    #[test]
    fn denormalize_restores_corners() {
        let bbox = AbsoluteBox::from_xyxy(12.5, 40.0, 300.0, 479.0);
        let back = bbox.normalize(VGA).denormalize(VGA);
        assert!(close(back.xmin, bbox.xmin));
        assert!(close(back.ymin, bbox.ymin));
        assert!(close(back.xmax, bbox.xmax));
        assert!(close(back.ymax, bbox.ymax));
    }

    #[test]
    fn is_within_accepts_edges() {
        assert!(AbsoluteBox::from_xyxy(0.0, 0.0, 640.0, 480.0).is_within(VGA));
        assert!(!AbsoluteBox::from_xyxy(0.0, 0.0, 640.5, 480.0).is_within(VGA));
    }
}
