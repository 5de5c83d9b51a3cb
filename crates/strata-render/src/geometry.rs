//! Outline geometry of layer segments.
//!
//! Every layer boundary is sampled on the same grid of `grid_points + 1` x positions
//! across the stack. Textured boundaries are offset by a jitter drawn once per diagram,
//! so the top of a layer and the bottom of the next one trace the same jagged line.

use crate::config::{Dimensions, Parameters};
use crate::model::Layer;
use rand::{Rng, RngCore};
use serde::Serialize;

/// Column boundaries of structured layers, as fractions of the stack width.
const COLUMN_EDGES: [f64; 4] = [1.0 / 8.0, 3.0 / 8.0, 5.0 / 8.0, 7.0 / 8.0];

/// Grid indices of the left and right column edges of structured layers.
///
/// `[left column start, left column end, right column start, right column end]`.
pub fn edge_indices(grid_points: usize) -> [usize; 4] {
    COLUMN_EDGES.map(|f| (f * grid_points as f64).round_ties_even() as usize)
}

/// The rough.js jitter generator: multiplier 48271 with wrapping 32-bit arithmetic.
///
/// Not Park–Miller MINSTD, which reduces modulo 2³¹−1; here the state wraps modulo
/// 2³² and only its low 31 bits are returned, so `next_u32` shifts them into the high
/// bits. Any non-zero seed gives a full, reproducible sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoughRng {
    state: i32,
}

impl RoughRng {
    /// A zero seed would get the generator stuck at zero; it is replaced by 1.
    pub fn new(seed: u32) -> Self {
        let state = if seed == 0 { 1 } else { seed as i32 };
        Self { state }
    }

    fn step(&mut self) -> u32 {
        self.state = self.state.wrapping_mul(48271);
        (self.state & 0x7fff_ffff) as u32
    }
}

impl RngCore for RoughRng {
    fn next_u32(&mut self) -> u32 {
        self.step() << 1
    }

    fn next_u64(&mut self) -> u64 {
        let lo = u64::from(self.next_u32());
        let hi = u64::from(self.next_u32());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_u32().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// A point of the jitter grid: its x position and the offset of textured edges there.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridPoint {
    pub x: f64,
    pub offset: f64,
}

/// The sampled boundary shared by all layers of one diagram.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JitterGrid {
    pub points: Vec<GridPoint>,
    pub edges: [usize; 4],
}

impl JitterGrid {
    /// Draws the grid from the configured seed.
    pub fn from_parameters(dimensions: &Dimensions, parameters: &Parameters) -> Self {
        let mut rng = RoughRng::new(parameters.jitter_seed);
        Self::generate(dimensions, parameters, &mut rng)
    }

    pub fn generate<R: Rng + ?Sized>(
        dimensions: &Dimensions,
        parameters: &Parameters,
        rng: &mut R,
    ) -> Self {
        let grid = parameters.grid_points.max(1);
        let step = dimensions.stack_width / grid as f64;
        let r = parameters.roughness;
        let points = (0..=grid)
            .map(|i| GridPoint {
                x: step * i as f64,
                offset: if r > 0.0 { rng.gen_range(-r..=r) } else { 0.0 },
            })
            .collect();
        Self {
            points,
            edges: edge_indices(grid),
        }
    }

    /// Index of the last grid point.
    pub fn last_index(&self) -> usize {
        self.points.len().saturating_sub(1)
    }

    /// First and last grid index covered by `segment`.
    pub fn span(&self, segment: Segment) -> (usize, usize) {
        match segment {
            Segment::Whole => (0, self.last_index()),
            Segment::Left => (self.edges[0], self.edges[1]),
            Segment::Right => (self.edges[2], self.edges[3]),
        }
    }
}

/// The horizontal extent a layer outline covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Segment {
    Whole,
    /// Left column of a structured layer.
    Left,
    /// Right column of a structured layer.
    Right,
}

impl Segment {
    pub fn for_layer(layer: &Layer) -> &'static [Segment] {
        if layer.structured {
            &[Segment::Left, Segment::Right]
        } else {
            &[Segment::Whole]
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum PathOp {
    MoveTo(f64, f64),
    LineTo(f64, f64),
}

/// A path of straight segments in canvas coordinates (y grows upwards).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathData {
    pub ops: Vec<PathOp>,
}

impl PathData {
    pub fn move_to(&mut self, (x, y): (f64, f64)) {
        self.ops.push(PathOp::MoveTo(x, y));
    }

    pub fn line_to(&mut self, (x, y): (f64, f64)) {
        self.ops.push(PathOp::LineTo(x, y));
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Everything needed to trace one segment of one layer.
struct Outline<'a> {
    grid: &'a JitterGrid,
    lo: usize,
    hi: usize,
    top: f64,
    textured: bool,
    bottom: f64,
    bottom_textured: bool,
}

impl Outline<'_> {
    fn x(&self, i: usize) -> f64 {
        self.grid.points[i].x
    }

    fn offset(&self, i: usize, textured: bool) -> f64 {
        if textured {
            self.grid.points[i].offset
        } else {
            0.0
        }
    }

    fn bottom_left(&self) -> (f64, f64) {
        (self.x(self.lo), self.bottom + self.offset(self.lo, self.bottom_textured))
    }

    fn bottom_right(&self) -> (f64, f64) {
        (self.x(self.hi), self.bottom + self.offset(self.hi, self.bottom_textured))
    }

    fn top_left(&self) -> (f64, f64) {
        (self.x(self.lo), self.top + self.offset(self.lo, self.textured))
    }

    fn top_right(&self) -> (f64, f64) {
        (self.x(self.hi), self.top + self.offset(self.hi, self.textured))
    }

    /// Left to right along the top edge, starting after the top-left corner.
    fn trace_top(&self, path: &mut PathData) {
        if self.textured {
            for i in self.lo + 1..=self.hi {
                path.line_to((self.x(i), self.top + self.grid.points[i].offset));
            }
        } else {
            path.line_to(self.top_right());
        }
    }

    /// Right to left along the bottom edge, ending at the bottom-left corner.
    fn trace_bottom(&self, path: &mut PathData) {
        if self.bottom_textured {
            for i in (self.lo..self.hi).rev() {
                path.line_to((self.x(i), self.bottom + self.grid.points[i].offset));
            }
        } else {
            path.line_to(self.bottom_left());
        }
    }
}

/// The filled area of a segment, closed back at its bottom-left corner.
///
/// Fills always reach down to the stack floor, later layers paint over the
/// lower part.
pub fn fill_path(grid: &JitterGrid, segment: Segment, layer: &Layer) -> PathData {
    let (lo, hi) = grid.span(segment);
    let outline = Outline {
        grid,
        lo,
        hi,
        top: layer.accumulated_height,
        textured: layer.textured,
        bottom: 0.0,
        bottom_textured: false,
    };
    let mut path = PathData::default();
    path.move_to(outline.bottom_left());
    path.line_to(outline.top_left());
    outline.trace_top(&mut path);
    path.line_to(outline.bottom_right());
    path.line_to(outline.bottom_left());
    path
}

/// The stroked outline of a segment, starting on the layer it rests on.
pub fn outline_path(
    grid: &JitterGrid,
    segment: Segment,
    layer: &Layer,
    bottom_layer: Option<&Layer>,
    parameters: &Parameters,
) -> PathData {
    let (lo, hi) = grid.span(segment);
    let outline = Outline {
        grid,
        lo,
        hi,
        top: layer.accumulated_height,
        textured: layer.textured,
        bottom: bottom_layer.map_or(0.0, |b| b.accumulated_height),
        bottom_textured: bottom_layer.is_some_and(|b| b.textured),
    };
    let collapsed = layer.is_collapsed();
    let mid = layer.accumulated_height - layer.height / 2.0;
    let gap = parameters.collapse_gap / 2.0;
    let p = parameters.collapse_protrusion;

    let mut path = PathData::default();
    path.move_to(outline.bottom_left());

    // Up the left edge.
    let top_left = outline.top_left();
    if collapsed {
        let x = top_left.0;
        path.line_to((x, mid - gap));
        break_tick(&mut path, x, mid - gap, p);
        break_tick(&mut path, x, mid + gap, p);
        path.line_to(top_left);
    } else {
        path.line_to(top_left);
    }

    outline.trace_top(&mut path);

    // Down the right edge.
    let bottom_right = outline.bottom_right();
    if collapsed {
        let x = bottom_right.0;
        path.line_to((x, mid + gap));
        break_tick(&mut path, x, mid + gap, -p);
        break_tick(&mut path, x, mid - gap, -p);
        path.line_to(bottom_right);
    } else {
        path.line_to(bottom_right);
    }

    outline.trace_bottom(&mut path);
    path
}

/// A diagonal tick through `(x, y)`, leaving the pen at `(x, y)`.
fn break_tick(path: &mut PathData, x: f64, y: f64, p: f64) {
    path.move_to((x + p, y + p));
    path.line_to((x - p, y - p));
    path.move_to((x, y));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LayerRecord;

    fn layer(acc: f64, height: f64, textured: bool) -> Layer {
        let mut l = Layer::from_record(0, &LayerRecord::new("x", 100.0, "red")).unwrap();
        l.accumulated_height = acc;
        l.height = height;
        l.textured = textured;
        l
    }

    fn points(path: &PathData) -> Vec<(f64, f64)> {
        path.ops
            .iter()
            .map(|op| match *op {
                PathOp::MoveTo(x, y) | PathOp::LineTo(x, y) => (x, y),
            })
            .collect()
    }

    #[test]
    fn generator_follows_the_wrapping_rough_js_sequence() {
        let mut rng = RoughRng::new(1);
        let got: Vec<u32> = (0..4).map(|_| rng.step()).collect();
        assert_eq!(got, [48_271, 182_605_793, 1_291_342_511, 1_533_981_633]);
    }

    #[test]
    fn edge_indices_round_half_to_even() {
        assert_eq!(edge_indices(24), [3, 9, 15, 21]);
        assert_eq!(edge_indices(4), [0, 2, 2, 4]);
        assert_eq!(edge_indices(12), [2, 4, 8, 10]);
    }

    #[test]
    fn jitter_grid_is_reproducible_and_bounded() {
        let d = Dimensions::default();
        let p = Parameters::default();
        let a = JitterGrid::from_parameters(&d, &p);
        let b = JitterGrid::from_parameters(&d, &p);
        assert_eq!(a, b);
        assert_eq!(a.points.len(), p.grid_points + 1);
        assert!((a.points[p.grid_points].x - d.stack_width).abs() < 1e-9);
        assert!(a.points.iter().all(|pt| pt.offset.abs() <= p.roughness));
        assert!(a.points.iter().any(|pt| pt.offset != 0.0));

        let other = JitterGrid::from_parameters(
            &d,
            &Parameters {
                jitter_seed: 7,
                ..p.clone()
            },
        );
        assert_ne!(a, other);
    }

    #[test]
    fn zero_roughness_gives_flat_grid() {
        let p = Parameters {
            roughness: 0.0,
            ..Parameters::default()
        };
        let g = JitterGrid::from_parameters(&Dimensions::default(), &p);
        assert!(g.points.iter().all(|pt| pt.offset == 0.0));
    }

    #[test]
    fn fill_path_is_closed_and_starts_on_the_floor() {
        let g = JitterGrid::from_parameters(&Dimensions::default(), &Parameters::default());
        let path = fill_path(&g, Segment::Whole, &layer(40.0, 20.0, false));
        let pts = points(&path);
        assert_eq!(pts.len(), 5);
        assert_eq!(pts[0], (0.0, 0.0));
        assert_eq!(pts[1], (0.0, 40.0));
        assert_eq!(pts.first(), pts.last());
    }

    #[test]
    fn textured_top_matches_textured_bottom_of_next_layer() {
        let g = JitterGrid::from_parameters(&Dimensions::default(), &Parameters::default());
        let lower = layer(40.0, 20.0, true);
        let upper = layer(60.0, 20.0, false);
        let p = Parameters::default();

        let lower_outline = points(&outline_path(&g, Segment::Whole, &lower, None, &p));
        let upper_outline = points(&outline_path(&g, Segment::Whole, &upper, Some(&lower), &p));

        // Lower: bottom-left, top-left, then the textured top edge left to right.
        let lower_top: Vec<_> = lower_outline[1..=g.points.len()].to_vec();
        // Upper: after the right edge, the bottom edge traced right to left.
        let n = upper_outline.len();
        let mut upper_bottom: Vec<_> = upper_outline[n - g.points.len()..].to_vec();
        upper_bottom.reverse();
        let upper_start = upper_outline[0];

        assert_eq!(upper_start, lower_top[0]);
        assert_eq!(&upper_bottom[..upper_bottom.len() - 1], &lower_top[..lower_top.len() - 1]);
        assert_eq!(upper_bottom.last(), lower_top.last());
    }

    #[test]
    fn structured_columns_use_edge_indices() {
        let g = JitterGrid::from_parameters(&Dimensions::default(), &Parameters::default());
        let l = layer(30.0, 10.0, false);
        let left = points(&fill_path(&g, Segment::Left, &l));
        let right = points(&fill_path(&g, Segment::Right, &l));
        assert_eq!(left[0].0, g.points[3].x);
        assert_eq!(left[2].0, g.points[9].x);
        assert_eq!(right[0].0, g.points[15].x);
        assert_eq!(right[2].0, g.points[21].x);
    }

    #[test]
    fn collapsed_edges_are_interrupted_around_the_middle() {
        let g = JitterGrid::from_parameters(&Dimensions::default(), &Parameters::default());
        let mut l = layer(50.0, 24.0, false);
        l.collapsed = Some(true);
        let p = Parameters::default();
        let path = outline_path(&g, Segment::Whole, &l, None, &p);

        let moves = path
            .ops
            .iter()
            .filter(|op| matches!(op, PathOp::MoveTo(..)))
            .count();
        // Initial move plus three per tick, two ticks per vertical edge.
        assert_eq!(moves, 1 + 2 * 2 * 2);
        assert!(path.ops.contains(&PathOp::LineTo(0.0, 36.5)));
        assert!(path.ops.contains(&PathOp::MoveTo(0.0, 39.5)));
        assert!(path.ops.contains(&PathOp::LineTo(-3.0, 33.5)));
    }
}
