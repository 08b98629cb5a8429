use super::{accumulate_row, check_mask, ConditionCounts, ExtremaDetector, Neighborhood};
use crate::image::Mask;
use crate::pyramid::DogStack;
use rayon::prelude::*;

/// Row-parallel extrema search. Output is identical to
/// [`ReferenceExtrema`](super::ReferenceExtrema).
#[derive(Clone, Copy, Debug, Default)]
pub struct ParallelExtrema;

impl ExtremaDetector for ParallelExtrema {
    fn name(&self) -> &'static str {
        "parallel"
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
        let layers = dogs.len();
        counts
            .data
            .par_chunks_mut(w)
            .enumerate()
            .filter(|(row_idx, _)| {
                let layer = row_idx / h;
                layer != 0 && layer + 1 != layers
            })
            .for_each(|(row_idx, row)| {
                accumulate_row(row, dogs, row_idx / h, row_idx % h, mask, neighborhood);
            });
        counts
    }
}
