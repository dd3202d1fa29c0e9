//! Splitting the page space into batches.

/// Inclusive interval of page indices handled by one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    /// First page of the batch.
    pub start: u32,
    /// Last page of the batch, inclusive.
    pub stop: u32,
}

impl PageRange {
    /// Pages in increasing order.
    pub fn pages(&self) -> std::ops::RangeInclusive<u32> {
        self.start..=self.stop
    }

    /// Number of pages in the batch.
    pub fn page_count(&self) -> u32 {
        self.stop - self.start + 1
    }
}

/// Partitions `[0, total_pages]` into contiguous batches of `batch_size` pages.
///
/// Batch starts are `0, batch_size, 2 * batch_size, ...` while `start <= total_pages`;
/// the last batch is clamped to `total_pages`. A zero batch size is treated as one.
pub fn partition_pages(total_pages: u32, batch_size: u32) -> Vec<PageRange> {
    let batch_size = batch_size.max(1);
    (0..=total_pages)
        .step_by(batch_size as usize)
        .map(|start| PageRange {
            start,
            stop: start.saturating_add(batch_size - 1).min(total_pages),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn forty_seven_pages_in_batches_of_twenty() {
        let ranges = partition_pages(47, 20);
        let starts: Vec<u32> = ranges.iter().map(|r| r.start).collect();
        assert_eq!(starts, vec![0, 20, 40]);
        assert_eq!(
            ranges,
            vec![
                PageRange { start: 0, stop: 19 },
                PageRange { start: 20, stop: 39 },
                PageRange { start: 40, stop: 47 },
            ]
        );
    }

    #[test]
    fn zero_pages_still_visits_page_zero() {
        assert_eq!(partition_pages(0, 20), vec![PageRange { start: 0, stop: 0 }]);
    }

    #[test]
    fn exact_multiple_gets_a_single_page_tail() {
        let ranges = partition_pages(40, 20);
        assert_eq!(ranges.last(), Some(&PageRange { start: 40, stop: 40 }));
        assert_eq!(ranges.len(), 3);
    }

    proptest! {
        #[test]
        fn every_page_is_covered_exactly_once(total in 0u32..5_000, batch in 1u32..200) {
            let ranges = partition_pages(total, batch);
            let mut expected = 0u32;
            for r in &ranges {
                prop_assert_eq!(r.start, expected);
                prop_assert!(r.stop >= r.start);
                prop_assert!(r.page_count() <= batch);
                expected = r.stop + 1;
            }
            prop_assert_eq!(expected, total + 1);
        }
    }
}
