/// Logical-pixel rectangle, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Position relative to the rectangle, clamped to [0, 1], `ny = 0` at
    /// the bottom edge.
    pub fn normalize(&self, x: f32, y: f32) -> (f32, f32) {
        let nx = ((x - self.x) / self.width).clamp(0.0, 1.0);
        let ny = (1.0 - (y - self.y) / self.height).clamp(0.0, 1.0);
        (nx, ny)
    }

    /// Scales into device pixels and clips to the target size.
    pub fn to_viewport(&self, scale: f32, target: (u32, u32)) -> Option<[f32; 4]> {
        let x = (self.x * scale).max(0.0);
        let y = (self.y * scale).max(0.0);
        let width = (self.width * scale).min(target.0 as f32 - x);
        let height = (self.height * scale).min(target.1 as f32 - y);
        (width >= 1.0 && height >= 1.0).then_some([x, y, width, height])
    }
}

/// Where a pointer landed, in surface-normalized coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    Square { nx: f32, ny: f32 },
    Ring { nx: f32 },
}

/// Square on top, ring strip underneath, both left-aligned inside a margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PickerLayout {
    pub square: Rect,
    pub ring: Rect,
    pub margin: f32,
}

pub const MARGIN: f32 = 16.0;

impl PickerLayout {
    pub fn new(square: (u32, u32), ring: (u32, u32)) -> Self {
        let square = Rect {
            x: MARGIN,
            y: MARGIN,
            width: square.0 as f32,
            height: square.1 as f32,
        };
        let ring = Rect {
            x: MARGIN,
            y: square.y + square.height + MARGIN,
            width: ring.0 as f32,
            height: ring.1 as f32,
        };
        Self {
            square,
            ring,
            margin: MARGIN,
        }
    }

    /// Logical window size that fits both surfaces.
    pub fn window_size(&self) -> (f32, f32) {
        let width = self.square.width.max(self.ring.width) + 2.0 * self.margin;
        let height = self.ring.y + self.ring.height + self.margin;
        (width, height)
    }

    pub fn hit(&self, x: f32, y: f32) -> Option<Hit> {
        if self.square.contains(x, y) {
            let (nx, ny) = self.square.normalize(x, y);
            Some(Hit::Square { nx, ny })
        } else if self.ring.contains(x, y) {
            let (nx, _) = self.ring.normalize(x, y);
            Some(Hit::Ring { nx })
        } else {
            None
        }
    }

    /// Ring position while dragging, even after the pointer leaves the strip.
    pub fn ring_drag(&self, x: f32) -> f32 {
        self.ring.normalize(x, self.ring.y).0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hits_map_to_normalized_coordinates() {
        let layout = PickerLayout::new((200, 100), (360, 20));
        assert_eq!(layout.window_size(), (392.0, 168.0));
        match layout.hit(116.0, 16.0) {
            Some(Hit::Square { nx, ny }) => {
                assert!((nx - 0.5).abs() < 1e-6);
                assert!((ny - 1.0).abs() < 1e-6);
            }
            other => panic!("expected square hit, got {other:?}"),
        }
        match layout.hit(196.0, 140.0) {
            Some(Hit::Ring { nx }) => assert!((nx - 0.5).abs() < 1e-6),
            other => panic!("expected ring hit, got {other:?}"),
        }
        assert_eq!(layout.hit(2.0, 2.0), None);
    }

    #[test]
    fn ring_drag_clamps_outside_the_strip() {
        let layout = PickerLayout::new((100, 100), (360, 20));
        assert_eq!(layout.ring_drag(-50.0), 0.0);
        assert_eq!(layout.ring_drag(1000.0), 1.0);
    }

    #[test]
    fn viewport_is_clipped_to_target() {
        let rect = Rect {
            x: 10.0,
            y: 10.0,
            width: 100.0,
            height: 50.0,
        };
        assert_eq!(rect.to_viewport(2.0, (500, 500)), Some([20.0, 20.0, 200.0, 100.0]));
        assert_eq!(rect.to_viewport(2.0, (120, 500)), Some([20.0, 20.0, 100.0, 100.0]));
        assert_eq!(rect.to_viewport(1.0, (5, 5)), None);
    }
}
