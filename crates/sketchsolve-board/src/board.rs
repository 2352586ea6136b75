//! The sketch board: a raster surface plus drawing-tool state.
//!
//! Strokes are rendered straight onto an `RgbaImage` through tiny-skia, so
//! the board content is always one `encode_png` away from a snapshot.

use image::RgbaImage;
use tiny_skia::{FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform};

use crate::palette::{Color, DEFAULT_LINE_WIDTH, PALETTE, Theme, Tool, clamp_line_width};

/// A position on the board, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Pointer interaction state. `Drawing` remembers where the last segment
/// ended so the next move event knows where to stroke from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawState {
    Idle,
    Drawing { last: Point },
}

pub struct Board {
    raster: RgbaImage,
    state: DrawState,
    tool: Tool,
    theme: Theme,
    color: Color,
    line_width: u32,
}

impl Board {
    pub fn new(width: u32, height: u32) -> Self {
        let mut board = Self {
            raster: RgbaImage::new(width.max(1), height.max(1)),
            state: DrawState::Idle,
            tool: Tool::default(),
            theme: Theme::default(),
            color: PALETTE[0],
            line_width: DEFAULT_LINE_WIDTH,
        };
        board.fill_background();
        board
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    pub fn tool(&self) -> Tool {
        self.tool
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn line_width(&self) -> u32 {
        self.line_width
    }

    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
    }

    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_line_width(&mut self, width: u32) {
        self.line_width = clamp_line_width(width);
    }

    /// Begin a stroke: stamp a dot so a click without movement still leaves
    /// a mark, then enter `Drawing`.
    pub fn pointer_pressed(&mut self, p: Point) {
        self.stamp_dot(p);
        self.state = DrawState::Drawing { last: p };
    }

    /// Extend the current stroke. A move while `Idle` emits nothing.
    pub fn pointer_moved(&mut self, p: Point) {
        let DrawState::Drawing { last } = self.state else {
            return;
        };
        self.stroke_segment(last, p);
        self.state = DrawState::Drawing { last: p };
    }

    pub fn pointer_released(&mut self) {
        self.state = DrawState::Idle;
    }

    /// Leaving the surface ends the stroke the same way a release does.
    pub fn pointer_left(&mut self) {
        self.state = DrawState::Idle;
    }

    /// Map a touch event onto the pointer model: only the first touch point
    /// counts, extra fingers are ignored.
    pub fn first_touch(touches: &[Point]) -> Option<Point> {
        touches.first().copied()
    }

    /// Clear the drawing: fill with the theme background and return to
    /// `Idle`.
    pub fn reset(&mut self) {
        self.fill_background();
        self.state = DrawState::Idle;
    }

    /// Swap light/dark and clear. Prior strokes were drawn against the old
    /// background and cannot be re-tinted.
    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        self.reset();
    }

    /// Sample one pixel, for tests and pickers. Out of bounds is `None`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x < self.raster.width() && y < self.raster.height() {
            Some(Color(self.raster.get_pixel(x, y).0))
        } else {
            None
        }
    }

    /// Color the active tool paints with.
    fn ink(&self) -> Color {
        match self.tool {
            Tool::Pen => self.color,
            Tool::Eraser => self.theme.background(),
        }
    }

    fn fill_background(&mut self) {
        let bg = self.theme.background().rgba();
        for px in self.raster.pixels_mut() {
            *px = bg;
        }
    }

    fn stamp_dot(&mut self, p: Point) {
        let ink = self.ink();
        let radius = (self.line_width as f32 / 2.0).max(0.5);
        with_pixmap(&mut self.raster, |pixmap| {
            let mut pb = PathBuilder::new();
            pb.push_circle(p.x, p.y, radius);
            let Some(path) = pb.finish() else {
                return;
            };

            let mut paint = Paint::default();
            let [r, g, b, a] = ink.0;
            paint.set_color_rgba8(r, g, b, a);
            paint.anti_alias = true;

            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        });
    }

    fn stroke_segment(&mut self, from: Point, to: Point) {
        let ink = self.ink();
        let width = self.line_width as f32;
        with_pixmap(&mut self.raster, |pixmap| {
            let mut pb = PathBuilder::new();
            pb.move_to(from.x, from.y);
            pb.line_to(to.x, to.y);
            let Some(path) = pb.finish() else {
                return;
            };

            let mut paint = Paint::default();
            let [r, g, b, a] = ink.0;
            paint.set_color_rgba8(r, g, b, a);
            paint.anti_alias = true;

            let stroke = Stroke {
                width,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Default::default()
            };
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
        });
    }
}

/// Convert the raster to a Pixmap, apply a drawing closure, copy back.
/// Lossless here because the board is fully opaque.
fn with_pixmap(img: &mut RgbaImage, f: impl FnOnce(&mut Pixmap)) {
    let (w, h) = (img.width(), img.height());
    let Some(size) = tiny_skia::IntSize::from_wh(w, h) else {
        return;
    };
    let Some(mut pixmap) = Pixmap::from_vec(img.as_raw().clone(), size) else {
        return;
    };

    f(&mut pixmap);

    img.copy_from_slice(pixmap.data());
}
