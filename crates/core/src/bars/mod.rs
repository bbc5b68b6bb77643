use crate::{
    analysis::FrequencySnapshot,
    render::{Color, DrawCommand, GradientStop, Paint, Point},
};

const WIDTH_SCALE: f32 = 2.5;
const HEIGHT_SCALE: f32 = 0.8;
const BAR_GAP: f32 = 1.0;
/// Degrees of hue swept across the full bin range.
const HUE_SPAN: f32 = 256.0;
/// Hue offset between the top and the bottom of a bar.
const HUE_SHIFT: f32 = 60.0;

/// Maps a frequency snapshot onto vertical spectrum bars.
///
/// One bar per bin, anchored to the bottom edge. Bar color depends on the bin
/// index alone: the hue sweeps linearly across the bin range and each bar
/// fades top-to-bottom into a darker, hue-shifted tone. With the 2.5x width
/// scale bars may overlap or run past the right edge at small bin counts;
/// that matches the dashboard's look and is left to the host's clipping.
pub fn render(snapshot: &FrequencySnapshot, width: f32, height: f32) -> Vec<DrawCommand> {
    let bins = snapshot.bins();
    if bins.is_empty() {
        return Vec::new();
    }

    let bin_count = bins.len() as f32;
    let bar_width = width / bin_count * WIDTH_SCALE;
    let mut commands = Vec::with_capacity(bins.len());
    let mut x = 0.0;

    for (i, &magnitude) in bins.iter().enumerate() {
        let bar_height = f32::from(magnitude) / 255.0 * height * HEIGHT_SCALE;
        let hue = i as f32 / bin_count * HUE_SPAN;
        let paint = Paint::LinearGradient {
            start: Point::new(x, height - bar_height),
            end: Point::new(x, height),
            stops: vec![
                GradientStop::new(0.0, Color::hsl(hue, 1.0, 0.5)),
                GradientStop::new(1.0, Color::hsl(hue + HUE_SHIFT, 1.0, 0.3)),
            ],
        };
        commands.push(DrawCommand::FillRect {
            x,
            y: height - bar_height,
            width: bar_width,
            height: bar_height,
            paint,
        });
        x += bar_width + BAR_GAP;
    }

    commands
}
