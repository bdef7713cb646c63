//! Page layout calculations for image pages
//!
//! All values are PDF points (1/72 inch) with the origin at the bottom-left
//! of the page.

/// Page dimensions in points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    /// A4 portrait as used for converted images (595 × 842 pt)
    pub const fn a4() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
        }
    }
}

/// Margins around the printable area
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Margins {
    /// Create margins with same value on all sides
    pub const fn uniform(margin: f64) -> Self {
        Self {
            top: margin,
            bottom: margin,
            left: margin,
            right: margin,
        }
    }
}

/// Where an image is drawn on the page
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub scale: f64,
}

/// Page size plus margins
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageLayout {
    pub page: PageSize,
    pub margins: Margins,
}

impl Default for PageLayout {
    /// A4 with 20-point margins, a 555 × 802 pt content box
    fn default() -> Self {
        Self {
            page: PageSize::a4(),
            margins: Margins::uniform(20.0),
        }
    }
}

impl PageLayout {
    /// Width and height available inside the margins
    pub fn content_box(&self) -> (f64, f64) {
        (
            self.page.width - self.margins.left - self.margins.right,
            self.page.height - self.margins.top - self.margins.bottom,
        )
    }

    /// Fit an image of `width` × `height` pixels into the content box
    ///
    /// Images larger than the box in either dimension are scaled down to fit,
    /// preserving aspect ratio; smaller images keep one point per pixel. The
    /// result is centered on the whole page.
    pub fn fit_centered(&self, width: u32, height: u32) -> Placement {
        let (w, h) = (f64::from(width), f64::from(height));
        let (max_w, max_h) = self.content_box();

        let scale = if w > max_w || h > max_h {
            (max_w / w).min(max_h / h)
        } else {
            1.0
        };

        let final_w = w * scale;
        let final_h = h * scale;

        Placement {
            x: (self.page.width - final_w) / 2.0,
            y: (self.page.height - final_h) / 2.0,
            width: final_w,
            height: final_h,
            scale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn test_content_box() {
        let (w, h) = PageLayout::default().content_box();
        assert_eq!(w, 555.0);
        assert_eq!(h, 802.0);
    }

    #[test]
    fn test_oversized_image_scales_down() {
        let p = PageLayout::default().fit_centered(1000, 2000);
        assert!(close(p.scale, 0.401));
        assert!(close(p.width, 401.0));
        assert!(close(p.height, 802.0));
        assert!(close(p.x, 97.0));
        assert!(close(p.y, 20.0));
    }

    #[test]
    fn test_small_image_is_centered_unscaled() {
        let p = PageLayout::default().fit_centered(100, 100);
        assert_eq!(p.scale, 1.0);
        assert_eq!(p.width, 100.0);
        assert_eq!(p.height, 100.0);
        assert_eq!(p.x, 247.5);
        assert_eq!(p.y, 371.0);
    }

    #[test]
    fn test_wide_image_limited_by_width() {
        let p = PageLayout::default().fit_centered(1110, 100);
        assert!(close(p.scale, 0.5));
        assert!(close(p.width, 555.0));
        assert!(close(p.x, 20.0));
        assert!(close(p.y, (842.0 - 50.0) / 2.0));
    }

    #[test]
    fn test_exact_fit_is_not_scaled() {
        let p = PageLayout::default().fit_centered(555, 802);
        assert_eq!(p.scale, 1.0);
        assert_eq!(p.x, 20.0);
        assert_eq!(p.y, 20.0);
    }
}
