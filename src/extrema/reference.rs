use super::{accumulate_row, check_mask, ConditionCounts, ExtremaDetector, Neighborhood};
use crate::image::Mask;
use crate::pyramid::DogStack;

/// Sequential extrema search, one row at a time.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReferenceExtrema;

impl ExtremaDetector for ReferenceExtrema {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn condition_counts(
        &self,
        dogs: &DogStack,
        mask: Option<&Mask>,
        neighborhood: Neighborhood,
    ) -> ConditionCounts {
        check_mask(dogs, mask);
        let (w, h) = (dogs.width(), dogs.height());
        let mut counts = ConditionCounts::zeros(dogs.len(), w, h);
        if dogs.len() < 3 || w == 0 {
            return counts;
        }
        for (row_idx, row) in counts.data.chunks_mut(w).enumerate() {
            let (layer, y) = (row_idx / h, row_idx % h);
            if layer == 0 || layer + 1 == dogs.len() {
                continue;
            }
            accumulate_row(row, dogs, layer, y, mask, neighborhood);
        }
        counts
    }
}
