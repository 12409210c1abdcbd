use glance_types::{CaptureImage, SelectionRegion};
use xcap::Monitor;

/// Screen pixel source. One shot per session, no retries.
pub trait ScreenCapture: Send + Sync {
    fn capture(&self, region: SelectionRegion) -> Result<CaptureImage, CaptureError>;
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    #[error("Region {0} has no area")]
    EmptyRegion(SelectionRegion),

    #[error("Region {0} is not inside any connected screen")]
    OutsideScreens(SelectionRegion),

    #[error("Screen capture denied: {0}")]
    Denied(String),
}

/// Monitor geometry in logical coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenBounds {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl ScreenBounds {
    fn of(monitor: &Monitor) -> Self {
        Self {
            x: monitor.x(),
            y: monitor.y(),
            width: monitor.width(),
            height: monitor.height(),
        }
    }

    fn contains(&self, region: &SelectionRegion) -> bool {
        region.x >= self.x
            && region.y >= self.y
            && region.right() <= self.x as i64 + self.width as i64
            && region.bottom() <= self.y as i64 + self.height as i64
    }

    /// Pixel rectangle of `region` inside a capture of this screen that is
    /// `image_width` x `image_height` physical pixels.
    fn crop_rect(
        &self,
        region: &SelectionRegion,
        image_width: u32,
        image_height: u32,
    ) -> Option<(u32, u32, u32, u32)> {
        if self.width == 0 || self.height == 0 {
            return None;
        }

        let scale_x = image_width as f64 / self.width as f64;
        let scale_y = image_height as f64 / self.height as f64;

        let left = (((region.x - self.x) as f64) * scale_x).round() as u32;
        let top = (((region.y - self.y) as f64) * scale_y).round() as u32;
        let width = ((region.width as f64) * scale_x).round() as u32;
        let height = ((region.height as f64) * scale_y).round() as u32;

        let width = width.min(image_width.saturating_sub(left));
        let height = height.min(image_height.saturating_sub(top));
        (width > 0 && height > 0).then_some((left, top, width, height))
    }
}

/// Captures through xcap, cropping the monitor that fully contains the region
#[derive(Debug, Default, Clone, Copy)]
pub struct XcapCapture;

impl ScreenCapture for XcapCapture {
    fn capture(&self, region: SelectionRegion) -> Result<CaptureImage, CaptureError> {
        if region.is_empty() {
            return Err(CaptureError::EmptyRegion(region));
        }

        let monitors = Monitor::all().map_err(|e| CaptureError::Denied(e.to_string()))?;

        let (monitor, bounds) = monitors
            .iter()
            .map(|m| (m, ScreenBounds::of(m)))
            .find(|(_, bounds)| bounds.contains(&region))
            .ok_or(CaptureError::OutsideScreens(region))?;

        let image = monitor
            .capture_image()
            .map_err(|e| CaptureError::Denied(e.to_string()))?;

        let (left, top, width, height) = bounds
            .crop_rect(&region, image.width(), image.height())
            .ok_or(CaptureError::OutsideScreens(region))?;

        tracing::debug!(
            "Capturing {} -> {}x{} px at ({}, {})",
            region,
            width,
            height,
            left,
            top
        );

        let cropped = xcap::image::imageops::crop_imm(&image, left, top, width, height).to_image();

        CaptureImage::from_rgba(cropped.into_raw(), width, height)
            .ok_or_else(|| CaptureError::Denied("capture returned a malformed buffer".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRIMARY: ScreenBounds = ScreenBounds {
        x: 0,
        y: 0,
        width: 1920,
        height: 1080,
    };

    #[test]
    fn test_contains() {
        assert!(PRIMARY.contains(&SelectionRegion::new(0, 0, 100, 30)));
        assert!(PRIMARY.contains(&SelectionRegion::new(1820, 1050, 100, 30)));
        assert!(!PRIMARY.contains(&SelectionRegion::new(1821, 1050, 100, 30)));
        assert!(!PRIMARY.contains(&SelectionRegion::new(-1, 0, 100, 30)));
    }

    #[test]
    fn test_secondary_screen_offsets() {
        let left = ScreenBounds {
            x: -1280,
            y: 0,
            width: 1280,
            height: 1024,
        };
        let region = SelectionRegion::new(-1000, 100, 200, 50);
        assert!(left.contains(&region));
        assert_eq!(left.crop_rect(&region, 1280, 1024), Some((280, 100, 200, 50)));
    }

    #[test]
    fn test_crop_scales_to_physical_pixels() {
        // 150% scaling: logical 1920 wide, captured 2880 px
        let region = SelectionRegion::new(100, 100, 200, 40);
        assert_eq!(
            PRIMARY.crop_rect(&region, 2880, 1620),
            Some((150, 150, 300, 60))
        );
    }

    #[test]
    fn test_crop_clamped_to_image() {
        let small = ScreenBounds {
            x: 0,
            y: 0,
            width: 100,
            height: 100,
        };
        // 1.5x: left 49.5 rounds to 50, width 100.5 rounds to 101, past the 150 px edge
        let region = SelectionRegion::new(33, 0, 67, 10);
        assert!(small.contains(&region));
        assert_eq!(small.crop_rect(&region, 150, 150), Some((50, 0, 100, 15)));
    }

    #[test]
    fn test_empty_region_rejected() {
        let result = XcapCapture.capture(SelectionRegion::new(10, 10, 0, 20));
        assert_eq!(
            result.unwrap_err(),
            CaptureError::EmptyRegion(SelectionRegion::new(10, 10, 0, 20))
        );
    }
}
