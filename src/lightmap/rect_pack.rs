//! Split-on-insert rectangle bin packing.
//!
//! The packing tree is stored as a flat node arena. Every leaf is either a
//! free region or a placed rectangle; inserting into a free leaf that is too
//! big splits it into two children along the axis with more leftover space,
//! and the left child is split again until it matches the request exactly.
//! [`RectPack::reset`] clears the arena so one allocation serves every retry.

/// A placed rectangle (including its padding).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone)]
struct PackNode {
    rect: Rect,
    /// Child node indices; `None` for leaves.
    children: Option<(usize, usize)>,
    used: bool,
}

#[derive(Debug, Default)]
pub struct RectPack {
    nodes: Vec<PackNode>,
}

impl RectPack {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        let mut pack = Self::default();
        pack.reset(x, y, width, height);
        pack
    }

    /// Drop every placement and start over with a single free region.
    pub fn reset(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.nodes.clear();
        self.nodes.push(PackNode {
            rect: Rect {
                x,
                y,
                width,
                height,
            },
            children: None,
            used: false,
        });
    }

    /// Place a `width × height` rectangle followed by `padding` on both axes.
    ///
    /// The returned slot is `width + padding` by `height + padding`, or `None`
    /// when no free region can hold it or the size is not finite.
    pub fn insert(&mut self, width: f32, height: f32, padding: f32) -> Option<Rect> {
        let padded_width = width + padding;
        let padded_height = height + padding;
        if !padded_width.is_finite() || !padded_height.is_finite() {
            return None;
        }
        self.insert_at(0, padded_width, padded_height)
            .map(|index| self.nodes[index].rect)
    }

    fn insert_at(&mut self, index: usize, width: f32, height: f32) -> Option<usize> {
        if let Some((left, right)) = self.nodes[index].children {
            return self
                .insert_at(left, width, height)
                .or_else(|| self.insert_at(right, width, height));
        }

        let node = &self.nodes[index];
        let rect = node.rect;
        if node.used || width > rect.width || height > rect.height {
            return None;
        }
        if width == rect.width && height == rect.height {
            self.nodes[index].used = true;
            return Some(index);
        }

        let (left, right) = if rect.width - width > rect.height - height {
            (
                Rect { width, ..rect },
                Rect {
                    x: rect.x + width,
                    width: rect.width - width,
                    ..rect
                },
            )
        } else {
            (
                Rect { height, ..rect },
                Rect {
                    y: rect.y + height,
                    height: rect.height - height,
                    ..rect
                },
            )
        };
        let left_index = self.push_leaf(left);
        let right_index = self.push_leaf(right);
        self.nodes[index].children = Some((left_index, right_index));
        self.insert_at(left_index, width, height)
    }

    fn push_leaf(&mut self, rect: Rect) -> usize {
        self.nodes.push(PackNode {
            rect,
            children: None,
            used: false,
        });
        self.nodes.len() - 1
    }
}
