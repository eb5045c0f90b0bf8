//! Grouping of character boxes into text rows.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::config::{ConfigError, ConfigValidator};
use crate::processors::geometry::{BoundingBox, median_height};

/// Parameters of the row clusterer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RowClusterConfig {
    /// A box joins the current row when its centre is within
    /// `tolerance_factor × median_height` of the row's running average.
    pub tolerance_factor: f32,
}

impl Default for RowClusterConfig {
    fn default() -> Self {
        Self {
            tolerance_factor: 0.6,
        }
    }
}

impl ConfigValidator for RowClusterConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_positive_f32(self.tolerance_factor, "rows.tolerance_factor")
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// Boxes sharing an approximate vertical centre.
#[derive(Debug, Clone, PartialEq)]
pub struct RowCluster {
    /// Member boxes, sorted by centre y.
    pub boxes: Vec<BoundingBox>,
    /// Mean vertical centre of the members.
    pub center_y: f64,
}

impl RowCluster {
    fn new(first: BoundingBox) -> Self {
        let center_y = first.center().y;
        Self {
            boxes: vec![first],
            center_y,
        }
    }

    fn push(&mut self, bbox: BoundingBox) {
        let n = self.boxes.len() as f64;
        self.center_y = (self.center_y * n + bbox.center().y) / (n + 1.0);
        self.boxes.push(bbox);
    }

    fn absorb(&mut self, other: RowCluster) {
        for bbox in other.boxes {
            self.push(bbox);
        }
    }

    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

/// Layout anomalies that do not stop the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum LayoutWarning {
    /// Fewer rows were found than the grid expects.
    RowCountMismatch { expected: usize, found: usize },
}

impl std::fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutWarning::RowCountMismatch { expected, found } => {
                write!(f, "expected {} rows but found {}", expected, found)
            }
        }
    }
}

/// Rows ordered top to bottom plus any warnings raised while building them.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RowClustering {
    pub rows: Vec<RowCluster>,
    pub warnings: Vec<LayoutWarning>,
}

/// Clusters boxes into rows.
#[derive(Debug, Clone, Default)]
pub struct RowClusterer {
    config: RowClusterConfig,
}

impl RowClusterer {
    pub fn new(config: RowClusterConfig) -> Self {
        Self { config }
    }

    /// Groups `boxes` into at most `expected_rows` rows, ordered top to bottom.
    pub fn cluster(&self, mut boxes: Vec<BoundingBox>, expected_rows: usize) -> RowClustering {
        let Some(median_h) = median_height(&boxes) else {
            return RowClustering::default();
        };
        let tolerance = self.config.tolerance_factor as f64 * median_h;

        boxes.sort_by(|a, b| a.center().y.total_cmp(&b.center().y));
        let mut rows: Vec<RowCluster> = Vec::new();
        for bbox in boxes {
            match rows.last_mut() {
                Some(row) if (bbox.center().y - row.center_y).abs() <= tolerance => row.push(bbox),
                _ => rows.push(RowCluster::new(bbox)),
            }
        }
        debug!(clusters = rows.len(), tolerance, "initial row clustering");

        while expected_rows > 0 && rows.len() > expected_rows {
            let (i, gap) = rows
                .windows(2)
                .enumerate()
                .map(|(i, pair)| (i, pair[1].center_y - pair[0].center_y))
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .unwrap_or((0, 0.0));
            let lower = rows.remove(i + 1);
            rows[i].absorb(lower);
            debug!(row = i, gap, "merged adjacent rows");
        }

        for row in &mut rows {
            row.boxes.sort_by(|a, b| a.center().y.total_cmp(&b.center().y));
        }

        let mut warnings = Vec::new();
        if rows.len() < expected_rows {
            let warning = LayoutWarning::RowCountMismatch {
                expected: expected_rows,
                found: rows.len(),
            };
            warn!(%warning, "row count mismatch");
            warnings.push(warning);
        }

        RowClustering { rows, warnings }
    }
}
