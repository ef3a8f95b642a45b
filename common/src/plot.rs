//! Chart descriptors and the data each chart draws.
//!
//! Every chart kind is described by a [`ChartSpec`] (axes, legend, corpus
//! label placement) and filled by [`chart_data`] from the loaded rows. The
//! renderer only ever sees a [`ChartData`], so all numeric parsing happens
//! before the first image is written.

use std::ops::Range;

use crate::{
    config::{BLACK, Marker, SchemeStyle, Styling},
    error::ReportError,
    order::DisplayOrder,
    result::ResultRow,
    util::{as_integer, throughput_label},
};

/// Horizontal offset of the compression/decompression markers around a
/// scheme's position on the throughput chart
const THROUGHPUT_OFFSET: f64 = 0.1;

/// Plotted throughput range in MB/s
const MIN_SPEED: f64 = 0.1;
const MAX_SPEED: f64 = 10_000.0;

const SAVINGS_MARGIN: f64 = 0.025;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    CompressionRatio,
    Throughput,
    CompressionSpeedVsRatio,
    DecompressionSpeedVsRatio,
    DecompressionVsCompressionSpeed,
}

pub const CHART_KINDS: [ChartKind; 5] = [
    ChartKind::CompressionRatio,
    ChartKind::Throughput,
    ChartKind::CompressionSpeedVsRatio,
    ChartKind::DecompressionSpeedVsRatio,
    ChartKind::DecompressionVsCompressionSpeed,
];

impl ChartKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ChartKind::CompressionRatio => "compression",
            ChartKind::Throughput => "throughput",
            ChartKind::CompressionSpeedVsRatio => "c-dc",
            ChartKind::DecompressionSpeedVsRatio => "d-dc",
            ChartKind::DecompressionVsCompressionSpeed => "cs-ds",
        }
    }

    pub fn filename(self, corpus: &str) -> String {
        format!("{}-{corpus}.png", self.prefix())
    }

    pub fn spec(self, order: &DisplayOrder) -> ChartSpec {
        let schemes = || Axis {
            label: "scheme".to_owned(),
            scale: Scale::Linear,
            range: 0.5..order.len() as f64 + 0.5,
            ticks: Ticks::Schemes(order.schemes().map(str::to_owned).collect()),
        };
        let savings = |label: &str| Axis {
            label: label.to_owned(),
            scale: Scale::Linear,
            range: -SAVINGS_MARGIN..1.0 + SAVINGS_MARGIN,
            ticks: Ticks::Tenths,
        };
        let speed = |label: &str| Axis {
            label: label.to_owned(),
            scale: Scale::Log,
            range: MIN_SPEED..MAX_SPEED,
            ticks: Ticks::Throughput,
        };

        match self {
            ChartKind::CompressionRatio => ChartSpec {
                x: schemes(),
                y: savings("1 - compressed size / decompressed size (higher is better)"),
                legend: None,
                legend_entries: Vec::new(),
                // leaves room for the last scheme's marker
                corpus_label: LabelPlacement {
                    x: 0.925,
                    ..LabelPlacement::inset(Corner::UpperRight)
                },
                square: false,
            },
            ChartKind::Throughput => ChartSpec {
                x: schemes(),
                y: speed("throughput (higher is better)"),
                legend: Some(Corner::UpperRight),
                legend_entries: vec![
                    (
                        "compression".to_owned(),
                        SchemeStyle {
                            color: BLACK,
                            marker: Marker::TriangleDown,
                        },
                    ),
                    (
                        "decompression".to_owned(),
                        SchemeStyle {
                            color: BLACK,
                            marker: Marker::TriangleUp,
                        },
                    ),
                ],
                corpus_label: LabelPlacement::inset(Corner::LowerLeft),
                square: false,
            },
            ChartKind::CompressionSpeedVsRatio | ChartKind::DecompressionSpeedVsRatio => {
                let which = if self == ChartKind::CompressionSpeedVsRatio {
                    "compression"
                } else {
                    "decompression"
                };
                ChartSpec {
                    x: savings("1 - compressed size / uncompressed size (higher is better)"),
                    y: speed(&format!("{which} speed (higher is better)")),
                    legend: Some(Corner::LowerLeft),
                    legend_entries: Vec::new(),
                    corpus_label: LabelPlacement::inset(Corner::UpperRight),
                    square: false,
                }
            }
            ChartKind::DecompressionVsCompressionSpeed => ChartSpec {
                x: speed("compression speed (higher is better)"),
                y: speed("decompression speed (higher is better)"),
                legend: Some(Corner::LowerRight),
                legend_entries: Vec::new(),
                corpus_label: LabelPlacement::inset(Corner::LowerLeft),
                square: true,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scale {
    Linear,
    /// Base 10 logarithmic coordinate
    Log,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Ticks {
    /// Scheme names at 1..=n
    Schemes(Vec<String>),
    /// 0.0, 0.1, ..., 1.0
    Tenths,
    /// One tick per decade, labelled as a throughput
    Throughput,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Corner {
    UpperLeft,
    UpperRight,
    LowerLeft,
    LowerRight,
}

/// Where the corpus label goes, as fractions of the plotting area measured
/// from its lower left corner. The text corner named by `align` sits there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelPlacement {
    pub x: f64,
    pub y: f64,
    pub align: Corner,
}

impl LabelPlacement {
    const INSET: f64 = 0.025;

    /// Tucked into `corner` with a small inset from both edges
    pub fn inset(corner: Corner) -> Self {
        let (x, y) = match corner {
            Corner::UpperLeft => (Self::INSET, 1.0 - Self::INSET),
            Corner::UpperRight => (1.0 - Self::INSET, 1.0 - Self::INSET),
            Corner::LowerLeft => (Self::INSET, Self::INSET),
            Corner::LowerRight => (1.0 - Self::INSET, Self::INSET),
        };
        Self {
            x,
            y,
            align: corner,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub label: String,
    pub scale: Scale,
    /// Visible range in data units
    pub range: Range<f64>,
    pub ticks: Ticks,
}

impl Axis {
    pub fn contains(&self, value: f64) -> bool {
        self.range.start <= value && value <= self.range.end
    }

    fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.range.start, self.range.end)
    }

    /// Upper bound on tick count; chosen so the mesh lands on the ticks that
    /// [`Axis::tick_label`] names
    pub fn tick_count(&self) -> usize {
        match &self.ticks {
            Ticks::Schemes(schemes) => schemes.len().max(1),
            Ticks::Tenths => 11,
            // one per decade
            Ticks::Throughput => {
                (self.range.end / self.range.start).log10().round() as usize + 1
            }
        }
    }

    /// Label for a tick at `value`, empty when it names nothing
    pub fn tick_label(&self, value: f64) -> String {
        match &self.ticks {
            Ticks::Schemes(schemes) => as_integer(value)
                .and_then(|i| usize::try_from(i - 1).ok())
                .and_then(|i| schemes.get(i))
                .cloned()
                .unwrap_or_default(),
            Ticks::Tenths => format!("{value:.1}"),
            Ticks::Throughput => throughput_label(value),
        }
    }

    /// `value ± err` cut to the visible range, `None` when none of it shows
    pub fn error_span(&self, value: f64, err: f64, at: f64) -> Option<ErrorSpan> {
        let (low, high) = (value - err, value + err);
        if high < self.range.start || low > self.range.end {
            return None;
        }
        Some(ErrorSpan {
            at,
            low: self.clamp(low),
            mid: self.clamp(value),
            high: self.clamp(high),
        })
    }
}

/// A visible error bar in data units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ErrorSpan {
    /// Position on the other axis
    pub at: f64,
    pub low: f64,
    pub mid: f64,
    pub high: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub x: Axis,
    pub y: Axis,
    /// Legend placement, `None` hides the legend
    pub legend: Option<Corner>,
    /// Legend entries that do not belong to a series
    pub legend_entries: Vec<(String, SchemeStyle)>,
    pub corpus_label: LabelPlacement,
    pub square: bool,
}

impl ChartSpec {
    /// Whether the marker of `point` falls inside the visible area
    pub fn shows(&self, point: &Point) -> bool {
        self.x.contains(point.x) && self.y.contains(point.y)
    }

    pub fn y_error_bar(&self, point: &Point) -> Option<ErrorSpan> {
        let err = point.y_err?;
        if !self.x.contains(point.x) {
            return None;
        }
        self.y.error_span(point.y, err, point.x)
    }

    pub fn x_error_bar(&self, point: &Point) -> Option<ErrorSpan> {
        let err = point.x_err?;
        if !self.y.contains(point.y) {
            return None;
        }
        self.x.error_span(point.x, err, point.y)
    }
}

/// One observation in data units; errors are one standard deviation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub x_err: Option<f64>,
    pub y_err: Option<f64>,
}

impl Point {
    fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            x_err: None,
            y_err: None,
        }
    }

    fn with_y_err(mut self, err: f64) -> Self {
        self.y_err = Some(err);
        self
    }

    fn with_x_err(mut self, err: f64) -> Self {
        self.x_err = Some(err);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub scheme: String,
    /// Legend label
    pub label: Option<String>,
    pub style: SchemeStyle,
    pub points: Vec<Point>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    pub kind: ChartKind,
    pub corpus: String,
    pub spec: ChartSpec,
    pub series: Vec<Series>,
}

impl ChartData {
    pub fn filename(&self) -> String {
        self.kind.filename(&self.corpus)
    }

    pub fn corpus_label(&self) -> String {
        format!("corpus: {}", self.corpus)
    }
}

fn collect_points<'a, F>(
    rows: impl Iterator<Item = &'a ResultRow>,
    point: F,
) -> Result<Vec<Point>, ReportError>
where
    F: Fn(&ResultRow) -> Result<Option<Point>, ReportError>,
{
    let mut points = Vec::new();
    for row in rows {
        if let Some(p) = point(row)? {
            points.push(p);
        }
    }
    Ok(points)
}

/// Extracts the series of one chart from the rows of `corpus`
pub fn chart_data(
    kind: ChartKind,
    corpus: &str,
    rows: &[ResultRow],
    order: &DisplayOrder,
    styling: &Styling,
) -> Result<ChartData, ReportError> {
    let mut series = Vec::new();
    for (idx, scheme) in order.schemes().enumerate() {
        let position = (idx + 1) as f64;
        let style = *styling
            .get(scheme)
            .ok_or_else(|| ReportError::InvalidConfig(format!("No style for scheme {scheme:?}")))?;
        let scheme_rows = || {
            rows.iter()
                .filter(move |r| r.corpus == corpus && r.scheme == scheme)
        };
        let labelled = |points: Vec<Point>| Series {
            scheme: scheme.to_owned(),
            label: Some(scheme.to_owned()),
            style,
            points,
        };

        match kind {
            ChartKind::CompressionRatio => {
                let points = collect_points(scheme_rows(), |r| {
                    Ok(Some(Point::new(position, r.space_savings()?)))
                })?;
                series.push(labelled(points));
            }
            ChartKind::Throughput => {
                let compression = collect_points(scheme_rows(), |r| {
                    let speed = r.compression_speed()?;
                    Ok(Some(
                        Point::new(position - THROUGHPUT_OFFSET, speed.mean)
                            .with_y_err(speed.stddev),
                    ))
                })?;
                let decompression = collect_points(scheme_rows(), |r| {
                    Ok(r.decompression_speed()?.map(|speed| {
                        Point::new(position + THROUGHPUT_OFFSET, speed.mean)
                            .with_y_err(speed.stddev)
                    }))
                })?;
                for (marker, points) in [
                    (Marker::TriangleDown, compression),
                    (Marker::TriangleUp, decompression),
                ] {
                    series.push(Series {
                        scheme: scheme.to_owned(),
                        label: None,
                        style: SchemeStyle { marker, ..style },
                        points,
                    });
                }
            }
            ChartKind::CompressionSpeedVsRatio => {
                let points = collect_points(scheme_rows(), |r| {
                    let speed = r.compression_speed()?;
                    Ok(Some(
                        Point::new(r.space_savings()?, speed.mean).with_y_err(speed.stddev),
                    ))
                })?;
                series.push(labelled(points));
            }
            ChartKind::DecompressionSpeedVsRatio => {
                let points = collect_points(scheme_rows(), |r| {
                    let Some(speed) = r.decompression_speed()? else {
                        return Ok(None);
                    };
                    Ok(Some(
                        Point::new(r.space_savings()?, speed.mean).with_y_err(speed.stddev),
                    ))
                })?;
                series.push(labelled(points));
            }
            ChartKind::DecompressionVsCompressionSpeed => {
                let points = collect_points(scheme_rows(), |r| {
                    let Some(decompression) = r.decompression_speed()? else {
                        return Ok(None);
                    };
                    let compression = r.compression_speed()?;
                    Ok(Some(
                        Point::new(compression.mean, decompression.mean)
                            .with_x_err(compression.stddev)
                            .with_y_err(decompression.stddev),
                    ))
                })?;
                series.push(labelled(points));
            }
        }
    }

    Ok(ChartData {
        kind,
        corpus: corpus.to_owned(),
        spec: kind.spec(order),
        series,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::ReportConfig, order::compute_display_order, result::sample_row};

    fn setup(rows: &[ResultRow]) -> (DisplayOrder, Styling) {
        let config = ReportConfig::default();
        let order = compute_display_order(
            rows,
            &config.group_names(),
            &config.reference_corpus,
            &config.baseline_scheme,
        )
        .unwrap();
        (order, config.styling().unwrap())
    }

    fn ys(data: &ChartData) -> Vec<f64> {
        data.series
            .iter()
            .flat_map(|s| s.points.iter().map(|p| p.y))
            .collect()
    }

    #[test]
    fn compression_chart_plots_space_savings_in_display_order() {
        let rows = vec![
            sample_row("silesia", "bzip2", 5.0),
            sample_row("silesia", "uncompressed", 1.0),
            sample_row("silesia", "zstd", 4.0),
        ];
        let (order, styling) = setup(&rows);
        let data = chart_data(ChartKind::CompressionRatio, "silesia", &rows, &order, &styling)
            .unwrap();
        assert_eq!(ys(&data), vec![0.0, 0.75, 0.8]);
        assert_eq!(data.series.len(), order.len());
        assert_eq!(data.series[0].points[0].x, 1.0);
        assert_eq!(data.series.last().unwrap().points[0].x, order.len() as f64);
        assert_eq!(data.filename(), "compression-silesia.png");
    }

    #[test]
    fn charts_only_see_their_corpus() {
        let rows = vec![
            sample_row("silesia", "zstd", 4.0),
            sample_row("canterbury", "zstd", 2.0),
        ];
        let (order, styling) = setup(&rows);
        let data =
            chart_data(ChartKind::CompressionRatio, "canterbury", &rows, &order, &styling)
                .unwrap();
        assert_eq!(ys(&data), vec![0.5]);
    }

    #[test]
    fn throughput_chart_offsets_and_skips_absent_decompression() {
        let mut rows = vec![sample_row("silesia", "zstd", 4.0)];
        let csv = "corpus,scheme,compression ratio,compression speed (MB/s),\
            compression speed standard deviation (MB/s),decompression speed (MB/s),\
            decompression speed standard deviation (MB/s)\n\
            silesia,bzip2,5,12,0.5,,\n";
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), csv).unwrap();
        rows.extend(crate::result::load(file.path()).unwrap());

        let (order, styling) = setup(&rows);
        let data =
            chart_data(ChartKind::Throughput, "silesia", &rows, &order, &styling).unwrap();
        assert_eq!(data.series.len(), 2 * order.len());

        let zstd = data
            .series
            .iter()
            .filter(|s| s.scheme == "zstd")
            .collect::<Vec<_>>();
        assert_eq!(zstd[0].style.marker, Marker::TriangleDown);
        assert_eq!(zstd[1].style.marker, Marker::TriangleUp);
        let zstd_pos = order.schemes().position(|s| s == "zstd").unwrap() as f64 + 1.0;
        assert_eq!(zstd[0].points[0].x, zstd_pos - THROUGHPUT_OFFSET);
        assert_eq!(zstd[1].points[0].x, zstd_pos + THROUGHPUT_OFFSET);
        assert_eq!(zstd[1].points[0].y_err, Some(4.0));

        let bzip2 = data
            .series
            .iter()
            .filter(|s| s.scheme == "bzip2")
            .collect::<Vec<_>>();
        assert_eq!(bzip2[0].points.len(), 1);
        assert!(bzip2[1].points.is_empty());
        assert!(data.series.iter().all(|s| s.label.is_none()));
    }

    #[test]
    fn speed_vs_speed_carries_both_errors() {
        let rows = vec![sample_row("silesia", "zstd", 4.0)];
        let (order, styling) = setup(&rows);
        let data = chart_data(
            ChartKind::DecompressionVsCompressionSpeed,
            "silesia",
            &rows,
            &order,
            &styling,
        )
        .unwrap();
        let point = data
            .series
            .iter()
            .flat_map(|s| &s.points)
            .next()
            .copied()
            .unwrap();
        assert_eq!(
            point,
            Point {
                x: 100.0,
                y: 400.0,
                x_err: Some(1.5),
                y_err: Some(4.0)
            }
        );
        assert!(data.spec.square);
        assert_eq!(data.filename(), "cs-ds-silesia.png");
    }

    #[test]
    fn malformed_field_aborts_chart() {
        let rows = vec![sample_row("silesia", "zstd", 0.0)];
        let styling = ReportConfig::default().styling().unwrap();
        let order = compute_display_order(
            &[],
            &[vec!["zstd".to_owned()]],
            "silesia",
            "uncompressed",
        )
        .unwrap();
        let err = chart_data(ChartKind::CompressionSpeedVsRatio, "silesia", &rows, &order, &styling)
            .unwrap_err();
        assert!(matches!(err, ReportError::DataFormat { .. }));
    }

    fn two_schemes() -> DisplayOrder {
        compute_display_order(
            &[],
            &[vec!["a".to_owned()], vec!["b".to_owned()]],
            "silesia",
            "uncompressed",
        )
        .unwrap()
    }

    #[test]
    fn axis_ticks() {
        let order = two_schemes();
        let spec = ChartKind::DecompressionVsCompressionSpeed.spec(&order);
        assert_eq!(spec.x.scale, Scale::Log);
        assert_eq!(spec.y.tick_count(), 6);
        assert_eq!(spec.y.tick_label(0.1), "100 KB/s");
        assert_eq!(spec.y.tick_label(1000.0), "1 GB/s");

        let spec = ChartKind::Throughput.spec(&order);
        assert_eq!(spec.x.tick_count(), 2);
        assert_eq!(spec.x.tick_label(1.0), "a");
        assert_eq!(spec.x.tick_label(2.0), "b");
        assert_eq!(spec.x.tick_label(3.0), "");
        assert_eq!(spec.x.tick_label(1.5), "");
        assert_eq!(spec.legend_entries.len(), 2);

        let spec = ChartKind::CompressionRatio.spec(&order);
        assert_eq!(spec.y.tick_label(0.3000000001), "0.3");
        assert_eq!(spec.legend, None);
    }

    #[test]
    fn error_bars_are_cut_at_the_axis_bounds() {
        let spec = ChartKind::DecompressionVsCompressionSpeed.spec(&two_schemes());
        let point = Point::new(1.0, 9000.0).with_x_err(5.0).with_y_err(2000.0);
        assert_eq!(
            spec.x_error_bar(&point),
            Some(ErrorSpan {
                at: 9000.0,
                low: 0.1,
                mid: 1.0,
                high: 6.0
            })
        );
        assert_eq!(
            spec.y_error_bar(&point),
            Some(ErrorSpan {
                at: 1.0,
                low: 7000.0,
                mid: 9000.0,
                high: 10_000.0
            })
        );

        // the bar of a hidden point still shows where it reaches into view
        let above = Point::new(1.0, 12_000.0).with_y_err(4000.0);
        assert!(!spec.shows(&above));
        assert_eq!(spec.y_error_bar(&above).map(|e| e.low), Some(8000.0));
        let far_above = Point::new(1.0, 20_000.0).with_y_err(100.0);
        assert_eq!(spec.y_error_bar(&far_above), None);
        // nothing is drawn off to the side of the chart
        let left = Point::new(0.01, 100.0).with_y_err(1.0);
        assert_eq!(spec.y_error_bar(&left), None);
    }

    #[test]
    fn out_of_range_points_draw_no_marker() {
        let csv = "corpus,scheme,compression ratio,compression speed (MB/s),\
            compression speed standard deviation (MB/s),decompression speed (MB/s),\
            decompression speed standard deviation (MB/s)\n\
            silesia,uncompressed,1,9000,100,20000,500\n\
            silesia,zstd,0.9,300,10,1200,30\n";
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), csv).unwrap();
        let rows = crate::result::load(file.path()).unwrap();
        let (order, styling) = setup(&rows);
        let shown = |kind: ChartKind, scheme: &str| {
            let data = chart_data(kind, "silesia", &rows, &order, &styling).unwrap();
            data.series
                .iter()
                .filter(|s| s.scheme == scheme)
                .flat_map(|s| &s.points)
                .filter(|p| data.spec.shows(p))
                .count()
        };

        // negative savings sit below the savings axis
        assert_eq!(shown(ChartKind::CompressionRatio, "zstd"), 0);
        assert_eq!(shown(ChartKind::CompressionRatio, "uncompressed"), 1);
        assert_eq!(shown(ChartKind::CompressionSpeedVsRatio, "zstd"), 0);
        // 20 GB/s decompression is above the top decade
        assert_eq!(shown(ChartKind::Throughput, "uncompressed"), 1);
        assert_eq!(shown(ChartKind::DecompressionSpeedVsRatio, "uncompressed"), 0);
        assert_eq!(shown(ChartKind::DecompressionVsCompressionSpeed, "uncompressed"), 0);
    }

    #[test]
    fn corpus_label_placement() {
        let order = two_schemes();
        let placement = |kind: ChartKind| kind.spec(&order).corpus_label;
        let compression = placement(ChartKind::CompressionRatio);
        assert_eq!(compression.x, 0.925);
        assert_eq!(compression.align, Corner::UpperRight);
        for kind in [
            ChartKind::CompressionSpeedVsRatio,
            ChartKind::DecompressionSpeedVsRatio,
        ] {
            assert_eq!(placement(kind), LabelPlacement::inset(Corner::UpperRight));
            assert!((placement(kind).x - 0.975).abs() < 1e-12);
        }
        assert_eq!(
            placement(ChartKind::Throughput),
            LabelPlacement {
                x: 0.025,
                y: 0.025,
                align: Corner::LowerLeft
            }
        );
    }

    #[test]
    fn filenames_per_kind() {
        let names = CHART_KINDS
            .iter()
            .map(|k| k.filename("canterbury large"))
            .collect::<Vec<_>>();
        assert_eq!(
            names,
            vec![
                "compression-canterbury large.png",
                "throughput-canterbury large.png",
                "c-dc-canterbury large.png",
                "d-dc-canterbury large.png",
                "cs-ds-canterbury large.png",
            ]
        );
    }
}
