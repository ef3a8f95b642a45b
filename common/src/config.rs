use std::{
    collections::BTreeMap,
    fs::read_to_string,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::ReportError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub data_path: PathBuf,
    pub plot_path: PathBuf,
    /// Corpus whose best compression ratio ranks the schemes
    pub reference_corpus: String,
    /// Scheme that stores data as-is, always ranked first
    pub baseline_scheme: String,
    /// Corpora to plot, in render order
    pub corpora: Vec<String>,
    pub groups: Vec<SchemeGroup>,
    pub image: ImageSize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeGroup {
    pub color: String,
    pub schemes: Vec<SchemeEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeEntry {
    pub name: String,
    #[serde(default)]
    pub marker: Marker,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Marker {
    #[default]
    Circle,
    Square,
    Diamond,
    TriangleDown,
    TriangleUp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

pub const BLACK: Rgb = Rgb(0, 0, 0);

impl Rgb {
    /// Parses `#rrggbb`
    pub fn from_hex(hex: &str) -> Result<Self, ReportError> {
        let digits = hex
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.is_ascii())
            .ok_or_else(|| ReportError::InvalidConfig(format!("Malformed color {hex:?}")))?;
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .map_err(|_| ReportError::InvalidConfig(format!("Malformed color {hex:?}")))
        };
        Ok(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemeStyle {
    pub color: Rgb,
    pub marker: Marker,
}

/// Immutable scheme -> style association, built once from the scheme groups
#[derive(Debug, Clone, PartialEq)]
pub struct Styling {
    styles: BTreeMap<String, SchemeStyle>,
}

impl Styling {
    pub fn from_groups(groups: &[SchemeGroup]) -> Result<Self, ReportError> {
        let mut styles = BTreeMap::new();
        for group in groups {
            if group.schemes.is_empty() {
                return Err(ReportError::InvalidConfig(format!(
                    "Scheme group with color {} has no schemes",
                    group.color
                )));
            }
            let color = Rgb::from_hex(&group.color)?;
            for entry in &group.schemes {
                let style = SchemeStyle {
                    color,
                    marker: entry.marker,
                };
                if styles.insert(entry.name.clone(), style).is_some() {
                    return Err(ReportError::InvalidConfig(format!(
                        "Scheme {:?} appears in more than one group",
                        entry.name
                    )));
                }
            }
        }
        Ok(Self { styles })
    }

    pub fn get(&self, scheme: &str) -> Option<&SchemeStyle> {
        self.styles.get(scheme)
    }

    pub fn len(&self) -> usize {
        self.styles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.styles.is_empty()
    }
}

impl ReportConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let text = read_to_string(path).map_err(|e| {
            ReportError::InvalidConfig(format!("Read config {path:?}: {e}"))
        })?;
        serde_yml::from_str(&text)
            .map_err(|e| ReportError::InvalidConfig(format!("Parse config {path:?}: {e}")))
    }

    /// Scheme names per group, in configured order
    pub fn group_names(&self) -> Vec<Vec<String>> {
        self.groups
            .iter()
            .map(|g| g.schemes.iter().map(|s| s.name.clone()).collect())
            .collect()
    }

    pub fn styling(&self) -> Result<Styling, ReportError> {
        Styling::from_groups(&self.groups)
    }
}

fn group(color: &str, schemes: &[(&str, Marker)]) -> SchemeGroup {
    SchemeGroup {
        color: color.to_owned(),
        schemes: schemes
            .iter()
            .map(|(name, marker)| SchemeEntry {
                name: (*name).to_owned(),
                marker: *marker,
            })
            .collect(),
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        use Marker::*;
        // base colors from colorbrewer "Paired"
        let groups = vec![
            group("#000000", &[("uncompressed", Circle)]),
            group(
                "#1f78b4",
                &[
                    ("flate2 (rust)", Square),
                    ("flate2 (zlib-ng)", Diamond),
                    ("yazi", Circle),
                ],
            ),
            group(
                "#33a02c",
                &[("deflate", Circle), ("zopfli", Diamond), ("zopfli-rs", Square)],
            ),
            group("#e31a1c", &[("lzzzz", Diamond), ("lz4_flex", Circle)]),
            group("#a6cee3", &[("rust-lzma", Circle), ("lzma-rs", Square)]),
            group(
                "#b2df8a",
                &[("tetsy_snappy", Circle), ("xsnappy", Square), ("snap", Diamond)],
            ),
            group("#fdbf6f", &[("brotlic", Circle), ("brotli", Square)]),
            group("#fb9a99", &[("zstd", Circle)]),
            group("#cab2d6", &[("lzo1x-1", Circle)]),
            group("#ff7f00", &[("lzss (dyn)", Circle), ("lzss (static)", Square)]),
            group("#6a3d9a", &[("bzip2", Circle)]),
        ];
        Self {
            data_path: PathBuf::from("results.csv"),
            plot_path: PathBuf::from("plots"),
            reference_corpus: "silesia".to_owned(),
            baseline_scheme: "uncompressed".to_owned(),
            corpora: vec![
                "silesia".to_owned(),
                "canterbury large".to_owned(),
                "canterbury".to_owned(),
            ],
            groups,
            image: ImageSize::default(),
        }
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self {
            width: 1800,
            height: 1200,
        }
    }
}
