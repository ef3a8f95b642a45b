use std::{f64::consts::PI, ops::Range, path::Path};

use common::{
    config::{ImageSize, Marker, Rgb},
    plot::{ChartData, Corner, LabelPlacement, Scale, Ticks},
};
use eyre::Result;
use plotters::{
    coord::{
        Shift,
        combinators::{IntoLogRange, LogCoord},
        ranged1d::ValueFormatter,
        types::RangedCoordf64,
    },
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};

const FONT: &str = "sans-serif";
const MARKER_RADIUS: i32 = 9;
const ERROR_CAP_WIDTH: u32 = 12;

fn rgb(color: Rgb) -> RGBColor {
    RGBColor(color.0, color.1, color.2)
}

/// Marker outline in pixel offsets around the data point
fn marker_shape(marker: Marker) -> Vec<(i32, i32)> {
    let r = MARKER_RADIUS;
    match marker {
        Marker::Circle => (0..16)
            .map(|i| {
                let angle = f64::from(i) * PI / 8.0;
                (
                    (f64::from(r) * angle.cos()).round() as i32,
                    (f64::from(r) * angle.sin()).round() as i32,
                )
            })
            .collect(),
        Marker::Square => {
            let s = r * 4 / 5;
            vec![(-s, -s), (s, -s), (s, s), (-s, s)]
        }
        Marker::Diamond => vec![(0, -r), (r, 0), (0, r), (-r, 0)],
        // pixel y grows downwards
        Marker::TriangleDown => vec![(-r, -r), (r, -r), (0, r)],
        Marker::TriangleUp => vec![(0, -r), (r, r), (-r, r)],
    }
}

fn shifted(shape: &[(i32, i32)], x: i32, y: i32) -> Vec<(i32, i32)> {
    shape.iter().map(|(dx, dy)| (x + dx, y + dy)).collect()
}

fn label_position(corner: Corner) -> SeriesLabelPosition {
    match corner {
        Corner::UpperLeft => SeriesLabelPosition::UpperLeft,
        Corner::UpperRight => SeriesLabelPosition::UpperRight,
        Corner::LowerLeft => SeriesLabelPosition::LowerLeft,
        Corner::LowerRight => SeriesLabelPosition::LowerRight,
    }
}

fn text_anchor(corner: Corner) -> Pos {
    match corner {
        Corner::UpperLeft => Pos::new(HPos::Left, VPos::Top),
        Corner::UpperRight => Pos::new(HPos::Right, VPos::Top),
        Corner::LowerLeft => Pos::new(HPos::Left, VPos::Bottom),
        Corner::LowerRight => Pos::new(HPos::Right, VPos::Bottom),
    }
}

/// Pixel position of `placement` inside an area of `dim` pixels
fn label_pixel(placement: LabelPlacement, dim: (u32, u32)) -> (i32, i32) {
    (
        (placement.x * f64::from(dim.0)).round() as i32,
        ((1.0 - placement.y) * f64::from(dim.1)).round() as i32,
    )
}

fn log_axis(range: Range<f64>) -> LogCoord<f64> {
    LogCoord::from(range.log_scale())
}

/// Draws one chart into a PNG at `path`
pub fn draw_chart(chart: &ChartData, path: &Path, image: ImageSize) -> Result<()> {
    let size = if chart.spec.square {
        (image.width, image.width)
    } else {
        (image.width, image.height)
    };
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let x = chart.spec.x.range.clone();
    let y = chart.spec.y.range.clone();
    match (chart.spec.x.scale, chart.spec.y.scale) {
        (Scale::Linear, Scale::Linear) => {
            draw_axes(&root, chart, RangedCoordf64::from(x), RangedCoordf64::from(y))?
        }
        (Scale::Linear, Scale::Log) => {
            draw_axes(&root, chart, RangedCoordf64::from(x), log_axis(y))?
        }
        (Scale::Log, Scale::Linear) => {
            draw_axes(&root, chart, log_axis(x), RangedCoordf64::from(y))?
        }
        (Scale::Log, Scale::Log) => draw_axes(&root, chart, log_axis(x), log_axis(y))?,
    }

    root.present()?;
    Ok(())
}

fn draw_axes<X, Y>(
    root: &DrawingArea<BitMapBackend<'_>, Shift>,
    chart: &ChartData,
    x_coord: X,
    y_coord: Y,
) -> Result<()>
where
    X: Ranged<ValueType = f64> + ValueFormatter<f64>,
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    let spec = &chart.spec;
    let font_size = (root.dim_in_pixel().0 / 64).max(12) as i32;
    let scheme_axis = matches!(spec.x.ticks, Ticks::Schemes(_));

    let mut ctx = ChartBuilder::on(root)
        .margin(font_size)
        .x_label_area_size(if scheme_axis { font_size * 9 } else { font_size * 3 })
        .y_label_area_size(font_size * 6)
        .build_cartesian_2d(x_coord, y_coord)?;

    let x_label_style: TextStyle = if scheme_axis {
        (FONT, font_size - 4)
            .into_font()
            .transform(FontTransform::Rotate90)
            .into()
    } else {
        (FONT, font_size - 4).into_font().into()
    };
    ctx.configure_mesh()
        .x_labels(spec.x.tick_count())
        .y_labels(spec.y.tick_count())
        .x_label_formatter(&|v| spec.x.tick_label(*v))
        .y_label_formatter(&|v| spec.y.tick_label(*v))
        .x_label_style(x_label_style)
        .y_label_style((FONT, font_size - 4).into_font())
        .x_desc(spec.x.label.as_str())
        .y_desc(spec.y.label.as_str())
        .axis_desc_style((FONT, font_size).into_font())
        .bold_line_style(RGBColor(200, 200, 200))
        .light_line_style(RGBColor(235, 235, 235))
        .draw()?;

    for series in &chart.series {
        let color = rgb(series.style.color);
        let shape = marker_shape(series.style.marker);

        for point in &series.points {
            if let Some(bar) = spec.y_error_bar(point) {
                ctx.draw_series(std::iter::once(ErrorBar::new_vertical(
                    bar.at,
                    bar.low,
                    bar.mid,
                    bar.high,
                    color.stroke_width(2),
                    ERROR_CAP_WIDTH,
                )))?;
            }
            if let Some(bar) = spec.x_error_bar(point) {
                ctx.draw_series(std::iter::once(ErrorBar::new_horizontal(
                    bar.at,
                    bar.low,
                    bar.mid,
                    bar.high,
                    color.stroke_width(2),
                    ERROR_CAP_WIDTH,
                )))?;
            }
        }

        let anno = ctx.draw_series(
            series
                .points
                .iter()
                .filter(|point| spec.shows(point))
                .map(|point| {
                    EmptyElement::at((point.x, point.y))
                        + Polygon::new(shape.clone(), color.filled())
                }),
        )?;
        if let Some(label) = &series.label {
            anno.label(label.as_str())
                .legend(move |(x, y)| Polygon::new(shifted(&shape, x, y), color.filled()));
        }
    }

    for (label, style) in &spec.legend_entries {
        let color = rgb(style.color);
        let shape = marker_shape(style.marker);
        ctx.draw_series(std::iter::empty::<Circle<(f64, f64), i32>>())?
            .label(label.as_str())
            .legend(move |(x, y)| Polygon::new(shifted(&shape, x, y), color.filled()));
    }

    if let Some(corner) = spec.legend {
        ctx.configure_series_labels()
            .position(label_position(corner))
            .label_font((FONT, font_size - 6).into_font())
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()?;
    }

    let area = ctx.plotting_area().strip_coord_spec();
    area.draw(&Text::new(
        chart.corpus_label(),
        label_pixel(spec.corpus_label, area.dim_in_pixel()),
        TextStyle::from((FONT, font_size + 4).into_font())
            .pos(text_anchor(spec.corpus_label.align)),
    ))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_are_closed_outlines_within_radius() {
        for marker in [
            Marker::Circle,
            Marker::Square,
            Marker::Diamond,
            Marker::TriangleDown,
            Marker::TriangleUp,
        ] {
            let shape = marker_shape(marker);
            assert!(shape.len() >= 3, "{marker:?}");
            assert!(
                shape
                    .iter()
                    .all(|(x, y)| x.abs() <= MARKER_RADIUS && y.abs() <= MARKER_RADIUS)
            );
        }
    }

    #[test]
    fn triangle_direction() {
        // the lone vertex of a down triangle sits below the centre
        assert!(marker_shape(Marker::TriangleDown).contains(&(0, MARKER_RADIUS)));
        assert!(marker_shape(Marker::TriangleUp).contains(&(0, -MARKER_RADIUS)));
    }

    #[test]
    fn corpus_label_pixels() {
        let dim = (1000, 400);
        assert_eq!(
            label_pixel(LabelPlacement::inset(Corner::UpperRight), dim),
            (975, 10)
        );
        assert_eq!(
            label_pixel(LabelPlacement::inset(Corner::LowerLeft), dim),
            (25, 390)
        );
    }

    #[test]
    fn legend_shapes_follow_the_anchor() {
        assert_eq!(
            shifted(&marker_shape(Marker::Diamond), 100, 50),
            vec![(100, 41), (109, 50), (100, 59), (91, 50)]
        );
    }
}
