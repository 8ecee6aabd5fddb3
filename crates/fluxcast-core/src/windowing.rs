use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::features::FeatureMask;
use crate::forecast::{SequenceInput, Targets};
use crate::types::{FeatureColumn, FeatureTable};

/// Dimensions shared by every example of a [`WindowedDataset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WindowShape {
    pub input_size: usize,
    pub output_size: usize,
    pub num_columns: usize,
}

impl WindowShape {
    /// Length of one flattened input window.
    pub fn input_width(&self) -> usize {
        self.input_size * self.num_columns
    }
}

/// Supervised examples over a feature table.
///
/// Input windows borrow directly from a row-major copy of the table. Masked cells are
/// stored per example and overlaid when the window is read, so masking one example never
/// leaks into the overlapping windows of its neighbours.
#[derive(Debug, Clone)]
pub struct WindowedDataset {
    shape: WindowShape,
    rows: Vec<f64>,
    targets: Vec<f64>,
    count: usize,
    table_rows: usize,
    masks: BTreeMap<usize, Vec<usize>>,
}

/// Number of examples a table of `rows` rows yields.
pub fn example_count(rows: usize, input_size: usize, output_size: usize) -> Result<usize> {
    if input_size == 0 || output_size == 0 {
        return Err(PipelineError::InvalidConfig(format!(
            "input_size and output_size must be at least 1 (got {input_size} and {output_size})"
        )));
    }
    let required = input_size + output_size;
    if rows < required {
        return Err(PipelineError::insufficient("windowing", required, rows));
    }
    Ok(rows - required + 1)
}

pub fn build_windows(
    table: &FeatureTable,
    input_size: usize,
    output_size: usize,
) -> Result<WindowedDataset> {
    let count = example_count(table.len(), input_size, output_size)?;
    let shape = WindowShape {
        input_size,
        output_size,
        num_columns: FeatureColumn::COUNT,
    };

    let rows: Vec<f64> = table.rows().iter().flat_map(|row| row.values()).collect();
    let flux = table.column(FeatureColumn::Flux);
    let mut targets = Vec::with_capacity(count * output_size);
    for i in 0..count {
        let start = i + input_size;
        targets.extend_from_slice(&flux[start..start + output_size]);
    }

    info!(
        table_rows = table.len(),
        examples = count,
        input_size,
        output_size,
        "Built supervised windows"
    );

    Ok(WindowedDataset {
        shape,
        rows,
        targets,
        count,
        table_rows: table.len(),
        masks: BTreeMap::new(),
    })
}

impl WindowedDataset {
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn shape(&self) -> WindowShape {
        self.shape
    }

    /// Row count of the feature table the windows were cut from.
    pub fn table_rows(&self) -> usize {
        self.table_rows
    }

    /// Input window `i` flattened row-major, with any masks for `i` applied.
    ///
    /// # Panics
    /// If `i >= self.len()`.
    pub fn features(&self, i: usize) -> Cow<'_, [f64]> {
        assert!(i < self.count, "example {i} out of range ({})", self.count);
        let width = self.shape.input_width();
        let start = i * self.shape.num_columns;
        let window = &self.rows[start..start + width];

        match self.masks.get(&i) {
            None => Cow::Borrowed(window),
            Some(cells) => {
                let mut owned = window.to_vec();
                for cell in cells {
                    owned[*cell] = 0.0;
                }
                Cow::Owned(owned)
            }
        }
    }

    /// Future flux values for example `i`.
    pub fn targets(&self, i: usize) -> &[f64] {
        let width = self.shape.output_size;
        &self.targets[i * width..(i + 1) * width]
    }

    pub(crate) fn mask(&mut self, mask: FeatureMask) -> Result<()> {
        if mask.example >= self.count || mask.row >= self.shape.input_size {
            return Err(PipelineError::InvalidConfig(format!(
                "mask ({}, {}, {}) is outside {} examples of {} rows",
                mask.example,
                mask.row,
                mask.column.canonical_name(),
                self.count,
                self.shape.input_size
            )));
        }
        let cell = mask.row * self.shape.num_columns + mask.column.index();
        let cells = self.masks.entry(mask.example).or_default();
        if !cells.contains(&cell) {
            cells.push(cell);
        }
        Ok(())
    }

    pub fn inputs<I>(&self, indices: I) -> SequenceInput<'_>
    where
        I: IntoIterator<Item = usize>,
    {
        SequenceInput::new(
            self.shape,
            indices.into_iter().map(|i| self.features(i)).collect(),
        )
    }

    pub fn target_rows<I>(&self, indices: I) -> Targets
    where
        I: IntoIterator<Item = usize>,
    {
        let mut values = Vec::new();
        for i in indices {
            values.extend_from_slice(self.targets(i));
        }
        Targets::new(self.shape.output_size, values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::apply_feature_masks;
    use crate::types::FeatureRow;

    fn table(n: usize) -> FeatureTable {
        FeatureTable::new(
            (0..n)
                .map(|i| {
                    let i = i as f64;
                    FeatureRow {
                        time: i,
                        flux: 100.0 + i,
                        rolling_mean: 200.0 + i,
                        rolling_std: 300.0 + i,
                    }
                })
                .collect(),
        )
    }

    #[test]
    fn windows_are_contiguous_with_targets() {
        let dataset = build_windows(&table(10), 3, 2).expect("windows");
        assert_eq!(dataset.len(), 10 - 3 - 2 + 1);

        for i in 0..dataset.len() {
            let x = dataset.features(i);
            assert_eq!(x.len(), 3 * FeatureColumn::COUNT);
            // Last input row is row i + 2; targets are the flux of rows i + 3 and i + 4.
            assert_eq!(x[2 * 4], (i + 2) as f64);
            assert_eq!(dataset.targets(i), &[103.0 + i as f64, 104.0 + i as f64]);
        }
    }

    #[test]
    fn exact_fit_yields_single_example() {
        let dataset = build_windows(&table(4), 3, 1).expect("windows");
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.targets(0), &[103.0]);
    }

    #[test]
    fn too_few_rows_is_insufficient() {
        let err = build_windows(&table(3), 3, 1).expect_err("short");
        assert!(matches!(
            err,
            PipelineError::DataInsufficient {
                stage: "windowing",
                required: 4,
                available: 3
            }
        ));
    }

    #[test]
    fn zero_sizes_are_rejected() {
        assert!(matches!(
            build_windows(&table(5), 0, 1),
            Err(PipelineError::InvalidConfig(_))
        ));
        assert!(matches!(
            build_windows(&table(5), 2, 0),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn masks_touch_only_their_example() {
        let mut dataset = build_windows(&table(6), 3, 1).expect("windows");
        let mask = FeatureMask {
            example: 0,
            row: 1,
            column: FeatureColumn::RollingMean,
        };
        apply_feature_masks(&mut dataset, &[mask]).expect("mask");

        assert_eq!(dataset.features(0)[4 + 2], 0.0);
        // Example 1 shares table row 1 at its row offset 0.
        assert_eq!(dataset.features(1)[2], 201.0);
        assert!(matches!(dataset.features(1), Cow::Borrowed(_)));
    }

    #[test]
    fn out_of_range_mask_is_rejected() {
        let mut dataset = build_windows(&table(6), 3, 1).expect("windows");
        let mask = FeatureMask {
            example: 0,
            row: 3,
            column: FeatureColumn::Flux,
        };
        assert!(matches!(
            apply_feature_masks(&mut dataset, &[mask]),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn gathers_inputs_and_targets_by_index() {
        let dataset = build_windows(&table(8), 2, 1).expect("windows");
        let x = dataset.inputs([1, 4]);
        let y = dataset.target_rows([1, 4]);

        assert_eq!(x.len(), 2);
        assert_eq!(x.window(1)[0], 4.0);
        assert_eq!(y.row(0), &[103.0]);
        assert_eq!(y.row(1), &[106.0]);
    }
}
