use std::f32::consts::PI;

use crate::{
    analysis::FrequencySnapshot,
    render::{Color, DrawCommand, GradientStop, Paint, Point},
};

const RING_COLOR: Color = Color::rgb(0xff, 0x6b, 0x6b);
const RING_WIDTH: f32 = 3.0;
/// Pixels of outward reach at full-scale magnitude.
const AMPLITUDE_GAIN: f32 = 50.0;
const PULSE_COLOR: Color = Color::rgb(78, 205, 196);
const PULSE_BASE: f32 = 20.0;
const PULSE_SPAN: f32 = 30.0;

/// Maps a frequency snapshot onto the circular visualizer.
///
/// Each bin pushes one point of a closed ring outwards from `base_radius` in
/// proportion to its magnitude; the ring is stroked, not filled, and closes
/// back onto its first point. A pulsing circle sits at the center, its radius
/// driven by the mean magnitude and its fill fading radially to transparent.
pub fn render(snapshot: &FrequencySnapshot, center: Point, base_radius: f32) -> Vec<DrawCommand> {
    let bins = snapshot.bins();
    if bins.is_empty() {
        return Vec::new();
    }

    let bin_count = bins.len() as f32;
    let mut points = Vec::with_capacity(bins.len() + 1);
    for (i, &magnitude) in bins.iter().enumerate() {
        let angle = i as f32 / bin_count * 2.0 * PI;
        let reach = base_radius + f32::from(magnitude) / 255.0 * AMPLITUDE_GAIN;
        points.push(Point::new(
            center.x + angle.cos() * reach,
            center.y + angle.sin() * reach,
        ));
    }
    let first = points[0];
    points.push(first);

    let pulse_radius = PULSE_BASE + snapshot.mean_magnitude() / 255.0 * PULSE_SPAN;

    vec![
        DrawCommand::StrokePath {
            points,
            closed: true,
            color: RING_COLOR,
            line_width: RING_WIDTH,
        },
        DrawCommand::FillCircle {
            center,
            radius: pulse_radius,
            paint: Paint::RadialGradient {
                center,
                radius: pulse_radius,
                stops: vec![
                    GradientStop::new(0.0, PULSE_COLOR.with_alpha(0.8)),
                    GradientStop::new(1.0, PULSE_COLOR.with_alpha(0.0)),
                ],
            },
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTER: Point = Point { x: 50.0, y: 50.0 };

    fn ring_points(commands: &[DrawCommand]) -> &[Point] {
        match &commands[0] {
            DrawCommand::StrokePath { points, .. } => points,
            other => panic!("expected StrokePath, got {other:?}"),
        }
    }

    fn pulse_radius(commands: &[DrawCommand]) -> f32 {
        match &commands[1] {
            DrawCommand::FillCircle { radius, .. } => *radius,
            other => panic!("expected FillCircle, got {other:?}"),
        }
    }

    #[test]
    fn ring_closes_back_onto_its_first_point() {
        for bin_count in [4_usize, 16, 128] {
            let bins: Vec<u8> = (0..bin_count).map(|i| (i * 13 % 256) as u8).collect();
            let commands = render(&FrequencySnapshot::from_bins(bins), CENTER, 80.0);

            let points = ring_points(&commands);
            assert_eq!(points.len(), bin_count + 1);
            assert_eq!(points[0], points[bin_count]);
        }
    }

    #[test]
    fn silence_rests_the_ring_at_base_radius() {
        let commands = render(&FrequencySnapshot::zeroed(4), CENTER, 80.0);

        for point in ring_points(&commands) {
            assert!((point.distance_to(CENTER) - 80.0).abs() < 1e-3);
        }
        assert_eq!(pulse_radius(&commands), 20.0);
    }

    #[test]
    fn full_scale_bins_reach_fifty_pixels_out() {
        let commands = render(&FrequencySnapshot::from_bins(vec![255; 4]), CENTER, 80.0);

        for point in ring_points(&commands) {
            assert!((point.distance_to(CENTER) - 130.0).abs() < 1e-3);
        }
        assert_eq!(pulse_radius(&commands), 50.0);
    }

    #[test]
    fn pulse_radius_grows_with_the_mean() {
        let radii: Vec<f32> = [0_u8, 64, 128, 255]
            .into_iter()
            .map(|level| {
                let commands = render(&FrequencySnapshot::from_bins(vec![level; 8]), CENTER, 80.0);
                pulse_radius(&commands)
            })
            .collect();

        for pair in radii.windows(2) {
            assert!(pair[0] < pair[1]);
        }
        assert!(radii.iter().all(|r| (20.0..=50.0).contains(r)));
    }

    #[test]
    fn pulse_fill_fades_to_transparent_at_the_rim() {
        let commands = render(&FrequencySnapshot::from_bins(vec![40; 8]), CENTER, 80.0);
        match &commands[1] {
            DrawCommand::FillCircle {
                paint: Paint::RadialGradient { stops, .. },
                ..
            } => {
                assert_eq!(stops[0].color.a, 0.8);
                assert_eq!(stops[1].color.a, 0.0);
            }
            other => panic!("expected radial gradient fill, got {other:?}"),
        }
    }

    #[test]
    fn empty_snapshot_draws_nothing() {
        assert!(render(&FrequencySnapshot::default(), CENTER, 80.0).is_empty());
    }
}
