use std::{
    fs::create_dir_all,
    path::{Path, PathBuf},
};

use common::{
    config::{ImageSize, ReportConfig, Styling},
    error::ReportError,
    order::{DisplayOrder, compute_display_order, ensure_coverage},
    plot::{CHART_KINDS, ChartData, ChartKind, chart_data},
    result::{ResultRow, load},
};
use eyre::{Context, Result};
use itertools::Itertools;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, info, warn};

mod render;

pub use render::draw_chart;

/// Loaded and validated inputs of one report run
#[derive(Debug, Clone)]
pub struct Report {
    pub rows: Vec<ResultRow>,
    pub order: DisplayOrder,
    pub styling: Styling,
    pub corpora: Vec<String>,
    pub image: ImageSize,
}

impl Report {
    /// Loads the results and checks them against the scheme groups. Every
    /// row is parsed here so that later rendering cannot fail on data.
    pub fn prepare(config: &ReportConfig) -> Result<Self> {
        // each corpus owns its output files
        if let Some(corpus) = config.corpora.iter().duplicates().next() {
            return Err(ReportError::InvalidConfig(format!(
                "Corpus {corpus:?} is listed more than once"
            ))
            .into());
        }
        let styling = config.styling()?;
        let rows = load(&config.data_path)?;
        for row in &rows {
            row.validate()?;
        }

        let order = compute_display_order(
            &rows,
            &config.group_names(),
            &config.reference_corpus,
            &config.baseline_scheme,
        )?;
        ensure_coverage(&rows, &order)?;

        let skipped = rows
            .iter()
            .map(|r| r.corpus.as_str())
            .filter(|c| !config.corpora.iter().any(|p| p.as_str() == *c))
            .unique()
            .collect::<Vec<_>>();
        if !skipped.is_empty() {
            warn!("Not plotting corpora: {}", skipped.join(", "));
        }

        Ok(Self {
            rows,
            order,
            styling,
            corpora: config.corpora.clone(),
            image: config.image,
        })
    }

    /// Chart data for every corpus and chart kind, in render order
    pub fn charts(&self) -> Result<Vec<ChartData>> {
        let mut charts = Vec::with_capacity(self.corpora.len() * CHART_KINDS.len());
        for corpus in &self.corpora {
            for kind in CHART_KINDS {
                charts.push(chart_data(
                    kind,
                    corpus,
                    &self.rows,
                    &self.order,
                    &self.styling,
                )?);
            }
        }
        Ok(charts)
    }

    /// Renders every chart into `plot_path`, returning the written files.
    /// Nothing is written unless all chart data could be built.
    pub fn render(&self, plot_path: &Path) -> Result<Vec<PathBuf>> {
        let charts = self.charts()?;
        create_dir_all(plot_path).wrap_err_with(|| format!("Create plot dir {plot_path:?}"))?;

        let written = charts
            .par_iter()
            .map(|chart| {
                let path = plot_path.join(chart.filename());
                debug!("Rendering {path:?}");
                draw_chart(chart, &path, self.image)
                    .wrap_err_with(|| format!("Render {path:?}"))?;
                Ok(path)
            })
            .collect::<Result<Vec<_>>>()?;
        info!("Wrote {} charts to {plot_path:?}", written.len());
        Ok(written)
    }
}

/// Renders a single chart kind for one corpus into `plot_path`
pub fn render_chart(
    kind: ChartKind,
    corpus: &str,
    rows: &[ResultRow],
    order: &DisplayOrder,
    styling: &Styling,
    plot_path: &Path,
    image: ImageSize,
) -> Result<PathBuf> {
    let chart = chart_data(kind, corpus, rows, order, styling)?;
    create_dir_all(plot_path)?;
    let path = plot_path.join(chart.filename());
    draw_chart(&chart, &path, image)?;
    Ok(path)
}

/// Runs a full report: load, validate, order, render
pub fn generate_report(config: &ReportConfig) -> Result<Vec<PathBuf>> {
    let report = Report::prepare(config)?;
    report.render(&config.plot_path)
}
