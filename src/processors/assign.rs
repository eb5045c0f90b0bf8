//! Assignment of character boxes to alphabet slots.
//!
//! Rows are read in the configured direction and de-duplicated first. The
//! remaining boxes are matched against a grid of expected slot positions: column
//! anchors fitted to the densest run of box-centre columns on a lattice of the
//! median in-row spacing, row anchors taken from the clusters. Marks outside that
//! run never move an anchor. Each grid row is matched independently with an order-preserving
//! assignment that maximizes the number of filled slots and, among those, minimizes
//! the total distance to the anchors.

use std::collections::{BTreeMap, HashMap};
use std::ops::Range;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::config::{ConfigError, ConfigValidator};
use crate::domain::alphabet::{Alphabet, AlphabetSlot, AnchorRule, GridLayout, ReadingDirection};
use crate::processors::dedup::{DedupConfig, DedupDecision, DedupIndex, DuplicateReason};
use crate::processors::geometry::{BoundingBox, Point, median};
use crate::processors::rows::RowClustering;

/// Parameters of slot assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignerConfig {
    /// Default search radius around a slot anchor, in cell pitches.
    pub anchor_radius: f32,
    /// Duplicate detection.
    pub dedup: DedupConfig,
}

impl Default for AssignerConfig {
    fn default() -> Self {
        Self {
            anchor_radius: 0.5,
            dedup: DedupConfig::default(),
        }
    }
}

impl ConfigValidator for AssignerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_positive_f32(self.anchor_radius, "assignment.anchor_radius")?;
        self.dedup.validate()
    }

    fn get_defaults() -> Self {
        Self::default()
    }
}

/// A box matched to a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotAssignment {
    /// Index of the slot in the alphabet.
    pub slot: usize,
    pub bbox: BoundingBox,
    /// Distance between the box centre and the slot anchor, in pixels.
    pub distance: f64,
}

/// A box rejected by duplicate detection.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateBox {
    pub bbox: BoundingBox,
    pub reason: DuplicateReason,
    /// Centre of the earlier box it duplicates.
    pub original: Point,
}

/// Result of one assignment run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Assignment {
    /// Filled slots in alphabet order.
    pub assigned: Vec<SlotAssignment>,
    /// Slot indices left without a box.
    pub unfilled: Vec<usize>,
    /// Boxes rejected as duplicates, in reading order.
    pub duplicates: Vec<DuplicateBox>,
    /// Boxes that matched no slot.
    pub surplus: Vec<BoundingBox>,
}

/// Expected positions of the grid cells on the page.
#[derive(Debug, Clone, PartialEq)]
struct GridGeometry {
    /// Column centres in reading order.
    columns: Vec<f64>,
    pitch_x: f64,
    pitch_y: f64,
    /// +1 when reading moves right, -1 when it moves left.
    direction: f64,
}

/// One grid row with the boxes mapped to it.
#[derive(Debug)]
struct GridRow {
    slots: Range<usize>,
    center_y: f64,
    boxes: Vec<BoundingBox>,
}

/// Matches de-duplicated boxes to alphabet slots.
#[derive(Debug, Clone, Default)]
pub struct AlphabetAssigner {
    config: AssignerConfig,
    layout: GridLayout,
}

impl AlphabetAssigner {
    pub fn new(config: AssignerConfig, layout: GridLayout) -> Self {
        Self { config, layout }
    }

    /// Assigns the boxes of `clustering` to the slots of `alphabet`.
    ///
    /// `median_height` scales the duplicate-position radius.
    pub fn assign(
        &self,
        alphabet: &Alphabet,
        clustering: RowClustering,
        median_height: f64,
    ) -> Result<Assignment, ConfigError> {
        let ranges = self.layout.slot_ranges(alphabet.len())?;
        let mut result = Assignment::default();

        // Reading order and duplicate rejection.
        let mut index = DedupIndex::new(self.config.dedup.clone(), median_height);
        let mut rows: Vec<(f64, Vec<BoundingBox>)> = Vec::with_capacity(clustering.rows.len());
        for cluster in clustering.rows {
            let mut boxes = cluster.boxes;
            self.sort_reading_order(&mut boxes);
            let mut kept = Vec::with_capacity(boxes.len());
            for bbox in boxes {
                match index.offer(&bbox) {
                    DedupDecision::Accepted => kept.push(bbox),
                    DedupDecision::Duplicate { reason, of } => {
                        let original = index.accepted(of).map(|s| s.center).unwrap_or(bbox.center());
                        debug!(x = bbox.x, y = bbox.y, %reason, "duplicate box rejected");
                        result.duplicates.push(DuplicateBox {
                            bbox,
                            reason,
                            original,
                        });
                    }
                }
            }
            rows.push((cluster.center_y, kept));
        }
        rows.retain(|(_, boxes)| !boxes.is_empty());

        if rows.is_empty() {
            result.unfilled = (0..alphabet.len()).collect();
            return Ok(result);
        }

        let geometry = self.grid_geometry(&rows, median_height);
        let grid_rows = self.map_rows(rows, &ranges, &geometry, &mut result.surplus);

        // Relative anchors see neighbours placed in earlier rows on the first pass and
        // every placed neighbour on the second.
        let mut placed: HashMap<usize, Point> = HashMap::new();
        let mut matches: Vec<Vec<(usize, usize, f64)>> = Vec::with_capacity(grid_rows.len());
        for row in &grid_rows {
            let row_matches = self.match_row(alphabet, row, &geometry, &placed);
            for &(slot, b, _) in &row_matches {
                placed.insert(slot, row.boxes[b].center());
            }
            matches.push(row_matches);
        }
        for (i, row) in grid_rows.iter().enumerate() {
            let relative = row
                .slots
                .clone()
                .any(|s| matches!(alphabet.slots()[s].overrides.anchor, AnchorRule::RelativeTo { .. }));
            if !relative {
                continue;
            }
            let row_matches = self.match_row(alphabet, row, &geometry, &placed);
            for &(slot, _, _) in &matches[i] {
                placed.remove(&slot);
            }
            for &(slot, b, _) in &row_matches {
                placed.insert(slot, row.boxes[b].center());
            }
            matches[i] = row_matches;
        }

        for (row, row_matches) in grid_rows.into_iter().zip(matches) {
            let mut boxes: Vec<Option<BoundingBox>> = row.boxes.into_iter().map(Some).collect();
            for (slot, b, distance) in row_matches {
                if let Some(bbox) = boxes[b].take() {
                    result.assigned.push(SlotAssignment { slot, bbox, distance });
                }
            }
            result.surplus.extend(boxes.into_iter().flatten());
        }

        result.assigned.sort_by_key(|a| a.slot);
        let filled: Vec<bool> = {
            let mut filled = vec![false; alphabet.len()];
            for a in &result.assigned {
                filled[a.slot] = true;
            }
            filled
        };
        result.unfilled = (0..alphabet.len()).filter(|&s| !filled[s]).collect();

        for &slot in &result.unfilled {
            warn!(slot = %alphabet.slots()[slot].name, "slot unfilled");
        }
        debug!(
            assigned = result.assigned.len(),
            unfilled = result.unfilled.len(),
            duplicates = result.duplicates.len(),
            surplus = result.surplus.len(),
            "slot assignment complete"
        );
        Ok(result)
    }

    fn sort_reading_order(&self, boxes: &mut [BoundingBox]) {
        match self.layout.direction {
            ReadingDirection::RightToLeft => boxes.sort_by(|a, b| b.center().x.total_cmp(&a.center().x)),
            ReadingDirection::LeftToRight => boxes.sort_by(|a, b| a.center().x.total_cmp(&b.center().x)),
        }
    }

    fn grid_geometry(&self, rows: &[(f64, Vec<BoundingBox>)], median_height: f64) -> GridGeometry {
        let row_gap = rows
            .windows(2)
            .map(|pair| pair[1].0 - pair[0].0)
            .filter(|gap| *gap > 0.0)
            .min_by(f64::total_cmp);

        let mut centers = Vec::new();
        let mut gaps = Vec::new();
        for (_, boxes) in rows {
            let mut xs: Vec<f64> = boxes.iter().map(|b| b.center().x).collect();
            xs.sort_by(f64::total_cmp);
            gaps.extend(xs.windows(2).map(|w| w[1] - w[0]).filter(|gap| *gap > 0.0));
            centers.extend(xs);
        }

        let fallback = (2.0 * median_height).max(1.0);
        let n = self.layout.max_columns.max(1);
        let pitch = if n > 1 {
            median(&mut gaps).or(row_gap).unwrap_or(fallback)
        } else {
            row_gap.unwrap_or(fallback)
        };

        let groups = group_centers(&mut centers, pitch);
        let (mut columns, pitch_x) = fit_columns(&groups, pitch, n);
        let pitch_y = row_gap.unwrap_or(pitch_x);
        debug!(
            pitch_x,
            pitch_y,
            groups = groups.len(),
            columns = ?columns,
            "grid geometry estimated"
        );

        let direction = match self.layout.direction {
            ReadingDirection::RightToLeft => {
                columns.reverse();
                -1.0
            }
            ReadingDirection::LeftToRight => 1.0,
        };

        GridGeometry {
            columns,
            pitch_x,
            pitch_y,
            direction,
        }
    }

    /// Maps clusters onto grid rows; boxes of clusters left without a row become surplus.
    fn map_rows(
        &self,
        rows: Vec<(f64, Vec<BoundingBox>)>,
        ranges: &[Range<usize>],
        geometry: &GridGeometry,
        surplus: &mut Vec<BoundingBox>,
    ) -> Vec<GridRow> {
        let mapping: Vec<(usize, usize)> = if rows.len() == ranges.len() {
            (0..rows.len()).map(|i| (i, i)).collect()
        } else {
            let top = rows[0].0;
            let pitch = geometry.pitch_y;
            match_in_order(rows.len(), ranges.len(), |c, r| {
                Some((rows[c].0 - (top + pitch * r as f64)).abs())
            })
            .into_iter()
            .map(|(c, r, _)| (c, r))
            .collect()
        };
        debug!(clusters = rows.len(), grid_rows = ranges.len(), mapped = mapping.len(), "mapped rows");

        let mut target: Vec<Option<usize>> = vec![None; rows.len()];
        for (c, r) in mapping {
            target[c] = Some(r);
        }
        let mut grid_rows = Vec::with_capacity(rows.len());
        for ((center_y, boxes), r) in rows.into_iter().zip(target) {
            match r {
                Some(r) => grid_rows.push(GridRow {
                    slots: ranges[r].clone(),
                    center_y,
                    boxes,
                }),
                None => surplus.extend(boxes),
            }
        }
        grid_rows
    }

    /// Order-preserving match of one row's boxes to its slots.
    ///
    /// Returns `(slot index, box index, distance)` triples.
    fn match_row(
        &self,
        alphabet: &Alphabet,
        row: &GridRow,
        geometry: &GridGeometry,
        placed: &HashMap<usize, Point>,
    ) -> Vec<(usize, usize, f64)> {
        let slots = &alphabet.slots()[row.slots.clone()];
        let anchors: Vec<(Point, f64)> = slots
            .iter()
            .enumerate()
            .map(|(column, slot)| self.anchor(alphabet, slot, column, row.center_y, geometry, placed))
            .collect();

        match_in_order(row.boxes.len(), slots.len(), |b, s| {
            let (anchor, radius) = anchors[s];
            let distance = row.boxes[b].center().distance(&anchor);
            (distance <= radius).then_some(distance)
        })
        .into_iter()
        .map(|(b, s, distance)| (row.slots.start + s, b, distance))
        .collect()
    }

    /// Expected centre of `slot` and its search radius in pixels.
    fn anchor(
        &self,
        alphabet: &Alphabet,
        slot: &AlphabetSlot,
        column: usize,
        row_y: f64,
        geometry: &GridGeometry,
        placed: &HashMap<usize, Point>,
    ) -> (Point, f64) {
        let radius =
            slot.overrides.anchor_radius.unwrap_or(self.config.anchor_radius) as f64 * geometry.pitch_x;
        let cell = Point::new(
            geometry.columns.get(column).copied().unwrap_or_default(),
            row_y,
        );
        let shift = |origin: Point, dx: f32, dy: f32| {
            Point::new(
                origin.x + geometry.direction * dx as f64 * geometry.pitch_x,
                origin.y + dy as f64 * geometry.pitch_y,
            )
        };

        let anchor = match &slot.overrides.anchor {
            AnchorRule::Grid => cell,
            AnchorRule::Offset { dx, dy } => shift(cell, *dx, *dy),
            AnchorRule::RelativeTo { slot: target, dx, dy } => alphabet
                .by_name(target)
                .and_then(|t| placed.get(&t.index))
                .map(|&origin| shift(origin, *dx, *dy))
                .unwrap_or(cell),
        };
        (anchor, radius)
    }
}

/// Box centres that fall into the same page column.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ColumnGroup {
    /// Median centre x.
    x: f64,
    /// Number of boxes in the group.
    support: usize,
}

/// Splits the sorted centres wherever two neighbours are half a pitch or more apart.
fn group_centers(centers: &mut [f64], pitch: f64) -> Vec<ColumnGroup> {
    centers.sort_by(f64::total_cmp);
    let mut groups = Vec::new();
    let mut start = 0;
    for i in 1..=centers.len() {
        if i < centers.len() && centers[i] - centers[i - 1] < pitch / 2.0 {
            continue;
        }
        let run = &mut centers[start..i];
        if let Some(x) = median(run) {
            groups.push(ColumnGroup { x, support: run.len() });
        }
        start = i;
    }
    groups
}

/// Picks the `n` consecutive cells of a `pitch`-spaced lattice that hold the most
/// boxes and returns their centres, left to right, with the fitted pitch.
///
/// Every group is tried as the lattice origin. Groups outside the winning window
/// never move a column; cells without a group are placed on the line fitted
/// through the others.
fn fit_columns(groups: &[ColumnGroup], pitch: f64, n: usize) -> (Vec<f64>, f64) {
    // (support, weighted deviation, group per cell)
    let mut best: Option<(usize, f64, Vec<Option<usize>>)> = None;
    for origin in groups {
        let mut cells: BTreeMap<i64, (usize, f64)> = BTreeMap::new();
        for (i, group) in groups.iter().enumerate() {
            let offset = (group.x - origin.x) / pitch;
            let k = offset.round() as i64;
            let deviation = (offset - k as f64).abs();
            let keep = match cells.get(&k) {
                Some(&(j, d)) => {
                    group.support > groups[j].support
                        || (group.support == groups[j].support && deviation < d)
                }
                None => true,
            };
            if keep {
                cells.insert(k, (i, deviation));
            }
        }
        let (Some(&lo), Some(&hi)) = (cells.keys().next(), cells.keys().next_back()) else {
            continue;
        };

        for k0 in lo - (n as i64 - 1)..=hi {
            let window: Vec<Option<(usize, f64)>> =
                (k0..k0 + n as i64).map(|k| cells.get(&k).copied()).collect();
            let support: usize = window.iter().flatten().map(|&(i, _)| groups[i].support).sum();
            let deviation: f64 = window
                .iter()
                .flatten()
                .map(|&(i, d)| d * groups[i].support as f64)
                .sum();
            let better = match &best {
                None => support > 0,
                Some((s, d, _)) => support > *s || (support == *s && deviation < *d - 1e-9),
            };
            if better {
                let cells = window.iter().map(|c| c.as_ref().map(|&(i, _)| i)).collect();
                best = Some((support, deviation, cells));
            }
        }
    }

    let Some((_, _, window)) = best else {
        return ((0..n).map(|k| k as f64 * pitch).collect(), pitch);
    };

    // Weighted least squares of x over the cell index.
    let present: Vec<(f64, f64, f64)> = window
        .iter()
        .enumerate()
        .filter_map(|(k, &g)| g.map(|i| (k as f64, groups[i].x, groups[i].support as f64)))
        .collect();
    let weight: f64 = present.iter().map(|p| p.2).sum();
    let mean_k = present.iter().map(|p| p.0 * p.2).sum::<f64>() / weight;
    let mean_x = present.iter().map(|p| p.1 * p.2).sum::<f64>() / weight;
    let var_k: f64 = present.iter().map(|p| p.2 * (p.0 - mean_k).powi(2)).sum();
    let cov: f64 = present.iter().map(|p| p.2 * (p.0 - mean_k) * (p.1 - mean_x)).sum();
    let slope = if var_k > 0.0 && cov / var_k > 0.0 {
        cov / var_k
    } else {
        pitch
    };
    let intercept = mean_x - slope * mean_k;

    let columns = window
        .iter()
        .enumerate()
        .map(|(k, g)| match g {
            Some(i) => groups[*i].x,
            None => intercept + slope * k as f64,
        })
        .collect();
    (columns, slope)
}

/// Order-preserving matching between two sequences.
///
/// `cost(i, j)` returns `None` when `i` and `j` may not be paired. The result
/// maximizes the number of pairs, then minimizes the total cost, and is returned
/// as `(i, j, cost)` triples in increasing order.
fn match_in_order(
    n: usize,
    m: usize,
    cost: impl Fn(usize, usize) -> Option<f64>,
) -> Vec<(usize, usize, f64)> {
    #[derive(Clone, Copy)]
    enum Step {
        SkipLeft,
        SkipRight,
        Pair(f64),
    }

    let better = |a: (usize, f64), b: (usize, f64)| a.0 > b.0 || (a.0 == b.0 && a.1 < b.1);

    let mut best = vec![vec![(0usize, 0.0f64); m + 1]; n + 1];
    let mut step = vec![vec![Step::SkipLeft; m + 1]; n + 1];
    for j in 1..=m {
        step[0][j] = Step::SkipRight;
    }
    for i in 1..=n {
        for j in 1..=m {
            let mut choice = (best[i - 1][j], Step::SkipLeft);
            if better(best[i][j - 1], choice.0) {
                choice = (best[i][j - 1], Step::SkipRight);
            }
            if let Some(c) = cost(i - 1, j - 1) {
                let (count, total) = best[i - 1][j - 1];
                let paired = (count + 1, total + c);
                if better(paired, choice.0) {
                    choice = (paired, Step::Pair(c));
                }
            }
            best[i][j] = choice.0;
            step[i][j] = choice.1;
        }
    }

    let mut pairs = Vec::new();
    let (mut i, mut j) = (n, m);
    while i > 0 && j > 0 {
        match step[i][j] {
            Step::SkipLeft => i -= 1,
            Step::SkipRight => j -= 1,
            Step::Pair(c) => {
                pairs.push((i - 1, j - 1, c));
                i -= 1;
                j -= 1;
            }
        }
    }
    pairs.reverse();
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::alphabet::{SlotOverride, SlotSpec};
    use crate::processors::rows::RowClusterer;

    /// Boxes in a 3×3 grid of 100 px cells with distinct widths per cell.
    fn page(rows: usize, skip: &[(usize, usize)]) -> Vec<BoundingBox> {
        let mut boxes = Vec::new();
        for r in 0..rows {
            for c in 0..3 {
                if skip.contains(&(r, c)) {
                    continue;
                }
                let w = 20 + 12 * c as u32 + 3 * r as u32;
                let h = 40;
                let x = 100 * c as u32 + 50 - w / 2;
                let y = 100 * r as u32 + 30;
                boxes.push(BoundingBox::solid(x, y, w, h));
            }
        }
        boxes
    }

    fn alphabet(n: usize) -> Alphabet {
        let specs: Vec<SlotSpec> = (0..n)
            .map(|i| SlotSpec::new(format!("s{}", i), char::from_u32(0x41 + i as u32).unwrap()))
            .collect();
        Alphabet::from_specs(&specs).unwrap()
    }

    fn layout(rows: usize, direction: ReadingDirection) -> GridLayout {
        GridLayout {
            rows,
            max_columns: 3,
            row_lengths: None,
            direction,
        }
    }

    fn run(boxes: Vec<BoundingBox>, alphabet: &Alphabet, layout: GridLayout) -> Assignment {
        let clustering = RowClusterer::default().cluster(boxes, layout.rows);
        AlphabetAssigner::new(AssignerConfig::default(), layout)
            .assign(alphabet, clustering, 40.0)
            .unwrap()
    }

    fn column_of(a: &SlotAssignment) -> u32 {
        a.bbox.center().x as u32 / 100
    }

    #[test]
    fn test_right_to_left_order() {
        let result = run(page(2, &[]), &alphabet(6), layout(2, ReadingDirection::RightToLeft));
        assert_eq!(result.assigned.len(), 6);
        let columns: Vec<u32> = result.assigned.iter().map(column_of).collect();
        assert_eq!(columns, vec![2, 1, 0, 2, 1, 0]);
        assert!(result.unfilled.is_empty());
        assert!(result.surplus.is_empty());
    }

    #[test]
    fn test_left_to_right_order() {
        let result = run(page(2, &[]), &alphabet(6), layout(2, ReadingDirection::LeftToRight));
        let columns: Vec<u32> = result.assigned.iter().map(column_of).collect();
        assert_eq!(columns, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_missing_letter_leaves_gap() {
        // Row 0, middle column missing: slot 1 stays empty, slot 2 keeps its box.
        let result = run(page(2, &[(0, 1)]), &alphabet(6), layout(2, ReadingDirection::RightToLeft));
        assert_eq!(result.unfilled, vec![1]);
        assert_eq!(result.assigned.len(), 5);
        let slot2 = result.assigned.iter().find(|a| a.slot == 2).unwrap();
        assert_eq!(column_of(slot2), 0);
    }

    #[test]
    fn test_duplicate_is_rejected_before_matching() {
        let mut boxes = page(1, &[]);
        let copy = boxes[2].clone();
        boxes.push(BoundingBox::solid(copy.x + 1, copy.y + 1, copy.width, copy.height));
        let result = run(boxes, &alphabet(3), layout(1, ReadingDirection::RightToLeft));
        assert_eq!(result.duplicates.len(), 1);
        assert_eq!(result.assigned.len(), 3);
    }

    #[test]
    fn test_missing_row_maps_remaining_rows() {
        // Four grid rows, the second one absent from the page.
        let boxes = page(4, &[(1, 0), (1, 1), (1, 2)]);
        let result = run(boxes, &alphabet(12), layout(4, ReadingDirection::RightToLeft));
        assert_eq!(result.unfilled, vec![3, 4, 5]);
        assert_eq!(result.assigned.len(), 9);
        let last = result.assigned.last().unwrap();
        assert_eq!(last.slot, 11);
        assert_eq!(last.bbox.center().y as u32 / 100, 3);
    }

    #[test]
    fn test_stray_box_is_surplus() {
        let mut boxes = page(1, &[]);
        boxes.push(BoundingBox::solid(400, 32, 35, 40));
        let result = run(boxes, &alphabet(3), layout(1, ReadingDirection::LeftToRight));
        assert_eq!(result.assigned.len(), 3);
        let columns: Vec<u32> = result.assigned.iter().map(column_of).collect();
        assert_eq!(columns, vec![0, 1, 2]);
        assert_eq!(result.surplus.len(), 1);
        assert_eq!(result.surplus[0].x, 400);
    }

    #[test]
    fn test_margin_mark_does_not_move_columns() {
        // A small mark right of the grid, level with the middle row, on a
        // right-to-left sheet: it sits where the first slot of that row is read.
        let mut boxes = page(3, &[]);
        boxes.push(BoundingBox::solid(372, 142, 14, 14));
        let result = run(boxes, &alphabet(9), layout(3, ReadingDirection::RightToLeft));

        assert_eq!(result.assigned.len(), 9);
        assert!(result.unfilled.is_empty());
        let columns: Vec<u32> = result.assigned.iter().map(column_of).collect();
        assert_eq!(columns, vec![2, 1, 0, 2, 1, 0, 2, 1, 0]);
        assert_eq!(result.surplus.len(), 1);
        assert_eq!(result.surplus[0].x, 372);
        for a in &result.assigned {
            assert!(a.distance < 5.0, "slot {} distance {}", a.slot, a.distance);
        }
    }

    #[test]
    fn test_column_groups_and_fit() {
        let mut centers = vec![250.0, 52.0, 148.0, 50.0, 150.0, 252.0, 420.0];
        let groups = group_centers(&mut centers, 100.0);
        assert_eq!(groups.len(), 4);
        assert_eq!(groups[0], ColumnGroup { x: 51.0, support: 2 });
        assert_eq!(groups[3].support, 1);

        let (columns, pitch) = fit_columns(&groups, 100.0, 3);
        assert_eq!(columns, vec![51.0, 149.0, 251.0]);
        assert!((pitch - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_relative_anchor_uses_neighbour() {
        let mut specs: Vec<SlotSpec> = (0..3)
            .map(|i| SlotSpec::new(format!("s{}", i), char::from_u32(0x41 + i).unwrap()))
            .collect();
        specs[1] = specs[1].clone().with_overrides(SlotOverride {
            anchor: AnchorRule::RelativeTo {
                slot: "s0".to_string(),
                dx: 1.0,
                dy: 0.0,
            },
            ..SlotOverride::default()
        });
        let alphabet = Alphabet::from_specs(&specs).unwrap();
        let result = run(page(1, &[]), &alphabet, layout(1, ReadingDirection::LeftToRight));
        assert_eq!(result.assigned.len(), 3);
        let s1 = result.assigned.iter().find(|a| a.slot == 1).unwrap();
        assert!(s1.distance < 5.0);
    }

    #[test]
    fn test_match_in_order_prefers_count_then_cost() {
        let left = [0.0, 10.0, 20.0];
        let right = [9.0, 21.0];
        let pairs = match_in_order(3, 2, |i, j| {
            let d = (left[i] - right[j]) as f64;
            (d.abs() <= 5.0).then_some(d.abs())
        });
        let indices: Vec<(usize, usize)> = pairs.iter().map(|&(i, j, _)| (i, j)).collect();
        assert_eq!(indices, vec![(1, 0), (2, 1)]);
    }
}
