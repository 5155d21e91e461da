// Spatial hash grid for pointer picking.
//
// Instead of testing every node on each pointer event, circles are bucketed
// into square cells; a pick only looks at the cell under the pointer.

use std::collections::HashMap;

use crate::layout::PointF;

#[derive(Debug, Clone)]
pub struct HitGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
    items: Vec<(PointF, f32)>,
}

impl HitGrid {
    /// Cell size should be around the largest pick diameter.
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1.0),
            cells: HashMap::new(),
            items: Vec::new(),
        }
    }

    pub fn from_points(points: &[PointF], radius: f32) -> Self {
        let mut grid = Self::new(radius * 2.0);
        for &p in points {
            grid.insert(p, radius);
        }
        grid
    }

    fn cell_of(&self, x: f32, y: f32) -> (i32, i32) {
        ((x / self.cell_size).floor() as i32, (y / self.cell_size).floor() as i32)
    }

    /// Adds a circle; its index is the insertion order.
    pub fn insert(&mut self, center: PointF, radius: f32) -> usize {
        let index = self.items.len();
        self.items.push((center, radius));
        let (min_x, min_y) = self.cell_of(center.x - radius, center.y - radius);
        let (max_x, max_y) = self.cell_of(center.x + radius, center.y + radius);
        for cx in min_x..=max_x {
            for cy in min_y..=max_y {
                self.cells.entry((cx, cy)).or_default().push(index);
            }
        }
        index
    }

    /// Nearest circle containing `p`. On equal distance the later one wins,
    /// matching paint order.
    pub fn pick(&self, p: PointF) -> Option<usize> {
        let candidates = self.cells.get(&self.cell_of(p.x, p.y))?;
        let mut best: Option<(usize, f32)> = None;
        for &i in candidates {
            let (center, radius) = self.items[i];
            let d = center.distance(&p);
            if d > radius {
                continue;
            }
            if best.is_none_or(|(_, bd)| d <= bd) {
                best = Some((i, d));
            }
        }
        best.map(|(i, _)| i)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
