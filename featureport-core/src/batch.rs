//! Partitioning of object identifiers into server-safe batches.
//!
//! Feature services cap the number of records a single query returns
//! (`maxRecordCount`). Identifier-based queries against enterprise
//! geodatabases also degrade sharply beyond a hundred identifiers, so batch
//! sizes are additionally capped at [`MAX_BATCH_SIZE`].

use std::num::NonZeroUsize;
use std::slice::Chunks;

/// Object identifier of a feature.
pub type ObjectId = i64;

/// Upper bound on identifiers requested per query.
pub const MAX_BATCH_SIZE: usize = 100;

/// Number of identifiers requested per feature query; always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchSize(NonZeroUsize);

impl BatchSize {
    /// `min(max_record_count, MAX_BATCH_SIZE)`, raised to one when the
    /// server advertises zero.
    ///
    /// # Examples
    ///
    /// ```
    /// use featureport_core::BatchSize;
    ///
    /// assert_eq!(BatchSize::for_max_record_count(1000).get(), 100);
    /// assert_eq!(BatchSize::for_max_record_count(25).get(), 25);
    /// assert_eq!(BatchSize::for_max_record_count(0).get(), 1);
    /// ```
    #[must_use]
    pub fn for_max_record_count(max_record_count: u32) -> Self {
        let capped = usize::try_from(max_record_count)
            .map_or(MAX_BATCH_SIZE, |count| count.min(MAX_BATCH_SIZE));
        Self(NonZeroUsize::new(capped).unwrap_or(NonZeroUsize::MIN))
    }

    /// The size as a plain integer.
    #[must_use]
    pub const fn get(self) -> usize {
        self.0.get()
    }

    /// Number of batches needed for `len` identifiers.
    #[must_use]
    pub const fn batch_count(self, len: usize) -> usize {
        len.div_ceil(self.get())
    }
}

/// Split `ids` into consecutive batches of at most `size` identifiers.
///
/// Every identifier appears in exactly one batch and concatenating the
/// batches reproduces `ids`. Only the last batch may be shorter; a single
/// identifier yields a single batch and an empty slice yields none.
///
/// # Examples
///
/// ```
/// use featureport_core::{BatchSize, partition_ids};
///
/// let ids: Vec<i64> = (1..=5).collect();
/// let batches: Vec<&[i64]> = partition_ids(&ids, BatchSize::for_max_record_count(2)).collect();
/// assert_eq!(batches, [&[1, 2][..], &[3, 4][..], &[5][..]]);
/// ```
#[must_use]
pub fn partition_ids(ids: &[ObjectId], size: BatchSize) -> Chunks<'_, ObjectId> {
    ids.chunks(size.get())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1000, 100)]
    #[case(2000, 100)]
    #[case(100, 100)]
    #[case(99, 99)]
    #[case(1, 1)]
    #[case(0, 1)]
    fn caps_batch_size(#[case] max_record_count: u32, #[case] expected: usize) {
        assert_eq!(
            BatchSize::for_max_record_count(max_record_count).get(),
            expected
        );
    }

    #[rstest]
    fn large_layer_splits_into_ceiling_batches() {
        let ids: Vec<ObjectId> = (1..=16_923).collect();
        let size = BatchSize::for_max_record_count(1000);

        let batches: Vec<&[ObjectId]> = partition_ids(&ids, size).collect();

        assert_eq!(batches.len(), 170);
        assert_eq!(size.batch_count(ids.len()), 170);
        assert!(batches.iter().take(169).all(|batch| batch.len() == 100));
        assert_eq!(batches.last().map(|batch| batch.len()), Some(23));
        assert_eq!(batches.concat(), ids);
    }

    #[rstest]
    fn final_identifier_is_included() {
        let ids: Vec<ObjectId> = (1..=101).collect();

        let batches: Vec<&[ObjectId]> =
            partition_ids(&ids, BatchSize::for_max_record_count(1000)).collect();

        assert_eq!(batches.len(), 2);
        assert_eq!(batches[1], &[101]);
    }

    #[rstest]
    fn single_identifier_yields_one_batch() {
        let batches: Vec<&[ObjectId]> =
            partition_ids(&[42], BatchSize::for_max_record_count(1000)).collect();

        assert_eq!(batches, [&[42][..]]);
    }

    #[rstest]
    fn empty_list_yields_no_batches() {
        let size = BatchSize::for_max_record_count(1000);

        assert_eq!(partition_ids(&[], size).count(), 0);
        assert_eq!(size.batch_count(0), 0);
    }
}
