//! Property tests for identifier batching.

use featureport_core::{BatchSize, MAX_BATCH_SIZE, ObjectId, partition_ids};
use proptest::prelude::*;

proptest! {
    #[test]
    fn batches_concatenate_to_the_input(
        ids in proptest::collection::vec(any::<ObjectId>(), 0..2_000),
        max_record_count in 0_u32..5_000,
    ) {
        let size = BatchSize::for_max_record_count(max_record_count);
        let batches: Vec<&[ObjectId]> = partition_ids(&ids, size).collect();

        prop_assert_eq!(batches.concat(), ids.clone());
        prop_assert_eq!(batches.len(), size.batch_count(ids.len()));
    }

    #[test]
    fn batches_respect_the_size_bound(
        len in 0_usize..2_000,
        max_record_count in 0_u32..5_000,
    ) {
        let ids: Vec<ObjectId> = (0..).take(len).collect();
        let size = BatchSize::for_max_record_count(max_record_count);

        prop_assert!(size.get() >= 1);
        prop_assert!(size.get() <= MAX_BATCH_SIZE);
        for (index, batch) in partition_ids(&ids, size).enumerate() {
            prop_assert!(!batch.is_empty());
            prop_assert!(batch.len() <= size.get());
            if index + 1 < size.batch_count(len) {
                prop_assert_eq!(batch.len(), size.get());
            }
        }
    }
}
