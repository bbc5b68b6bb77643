use serde::{Deserialize, Serialize};

use crate::{Result, SoundDeckError};

/// A point in surface coordinates, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance_to(&self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// RGBA color with an alpha channel in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Builds a fully opaque color from hue (degrees, wrapping), saturation
    /// and lightness (both in [0, 1]).
    pub fn hsl(h: f32, s: f32, l: f32) -> Self {
        let h = h.rem_euclid(360.0);
        let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
        let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
        let (r1, g1, b1) = match h {
            h if h < 60.0 => (c, x, 0.0),
            h if h < 120.0 => (x, c, 0.0),
            h if h < 180.0 => (0.0, c, x),
            h if h < 240.0 => (0.0, x, c),
            h if h < 300.0 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = l - c / 2.0;
        Self::rgb(
            ((r1 + m) * 255.0).round() as u8,
            ((g1 + m) * 255.0).round() as u8,
            ((b1 + m) * 255.0).round() as u8,
        )
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }
}

/// A single color stop inside a gradient, offset in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub offset: f32,
    pub color: Color,
}

impl GradientStop {
    pub fn new(offset: f32, color: Color) -> Self {
        Self { offset, color }
    }
}

/// Fill style attached to a shape command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Paint {
    Solid(Color),
    /// Gradient interpolated along the segment from `start` to `end`.
    LinearGradient {
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
    },
    /// Gradient interpolated radially outwards from `center` to `radius`.
    RadialGradient {
        center: Point,
        radius: f32,
        stops: Vec<GradientStop>,
    },
}

/// One 2D drawing instruction for the render host.
///
/// Renderers emit these as pure data; the host rasterizes them however it
/// likes. The variants deliberately stay close to what a 2D canvas offers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawCommand {
    Clear {
        color: Color,
    },
    FillRect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        paint: Paint,
    },
    StrokePath {
        points: Vec<Point>,
        closed: bool,
        color: Color,
        line_width: f32,
    },
    FillCircle {
        center: Point,
        radius: f32,
        paint: Paint,
    },
}

/// Fixed-size 2D drawing target.
///
/// The surface accumulates the draw command list for the current animation
/// frame. Only the render scheduler's frame callback mutates it; everything
/// else reads `commands()`.
#[derive(Debug)]
pub struct RenderSurface {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl RenderSurface {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SoundDeckError::InvalidConfig(format!(
                "surface dimensions must be non-zero, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            commands: Vec::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.width as f32 / 2.0, self.height as f32 / 2.0)
    }

    /// Drops the previous frame's commands and clears to `color`.
    pub fn begin_frame(&mut self, color: Color) {
        self.commands.clear();
        self.commands.push(DrawCommand::Clear { color });
    }

    pub fn extend(&mut self, commands: impl IntoIterator<Item = DrawCommand>) {
        self.commands.extend(commands);
    }

    /// Draw commands of the most recently rendered frame.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Serializes the current frame for hosts that consume commands out of
    /// process.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.commands).map_err(|err| SoundDeckError::msg(err.to_string()))
    }
}
