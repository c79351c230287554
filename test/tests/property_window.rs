/// PROPERTY-BASED TESTS: window and sequencing invariants
///
/// Uses proptest to verify list invariants hold across random inputs.
///
/// Key invariants:
/// 1. Applied mutation batches track a plain `Vec` model exactly
/// 2. InsertRange followed by the matching DeleteRange is an identity
/// 3. Version arrival order never changes the converged state

use proptest::prelude::*;
use serde_json::json;

use dynlist_provider::{ErrorReason, IndexRange, SourceConfig, UpdateError, Value};
use dynlist_test::{int_items, mutation, snapshot, TestHarness};

// Raw operation tuples; indices and counts are mapped onto whatever is
// legal for the window length at the moment the operation applies.
fn raw_operations() -> impl Strategy<Value = Vec<(u8, u16, u16, u8)>> {
    prop::collection::vec((0u8..5, any::<u16>(), any::<u16>(), any::<u8>()), 0..12)
}

fn shuffled_versions() -> impl Strategy<Value = Vec<u64>> {
    (1usize..8).prop_flat_map(|highest| {
        Just((1..=highest as u64).collect::<Vec<u64>>()).prop_shuffle()
    })
}

proptest! {
    /// Every applied batch must leave the window exactly where the same
    /// operations leave a plain vector.
    #[test]
    fn prop_applied_batches_match_a_plain_vec_model(raw in raw_operations()) {
        let mut harness = TestHarness::new();
        harness.attach(
            &snapshot("listA")
                .bounds(0, 10)
                .items(int_items(0, 10))
                .build(),
        );
        let mut model: Vec<Value> = int_items(0, 10);
        let mut version = 0u64;

        for (kind, a, b, marker) in raw {
            let len = model.len();
            let item = json!(format!("m{marker}"));
            let batch = match kind {
                0 => {
                    let index = a as usize % (len + 1);
                    model.insert(index, item.clone());
                    mutation("listA", version + 1).insert(index as i64, item)
                }
                1 if len > 0 => {
                    let index = a as usize % len;
                    model[index] = item.clone();
                    mutation("listA", version + 1).replace(index as i64, item)
                }
                2 if len > 0 => {
                    let index = a as usize % len;
                    model.remove(index);
                    mutation("listA", version + 1).delete(index as i64)
                }
                3 => {
                    let index = a as usize % (len + 1);
                    let items: Vec<Value> = (0..1 + b as usize % 3)
                        .map(|offset| json!(format!("m{marker}p{offset}")))
                        .collect();
                    model.splice(index..index, items.iter().cloned());
                    mutation("listA", version + 1).insert_range(index as i64, items)
                }
                4 if len > 0 => {
                    let index = a as usize % len;
                    let count = 1 + b as usize % (len - index);
                    model.drain(index..index + count);
                    mutation("listA", version + 1).delete_range(index as i64, count)
                }
                _ => continue,
            };
            version += 1;
            harness.apply(&batch.build());
        }

        prop_assert_eq!(harness.span("listA"), IndexRange::new(0, model.len() as i64));
        prop_assert_eq!(harness.bounds("listA"), (0, model.len() as i64));
        prop_assert_eq!(harness.version("listA"), (version > 0).then_some(version));
        for (index, value) in model.iter().enumerate() {
            prop_assert_eq!(harness.item("listA", index as i64), Some(value));
        }
    }

    /// InsertRange shifts the tail and the maximum bound up by its length;
    /// the matching DeleteRange must restore both exactly.
    #[test]
    fn prop_insert_range_then_delete_range_restores_the_window(
        start in -20i64..20,
        len in 1usize..12,
        offset in 0usize..12,
        count in 1usize..5,
    ) {
        let end = start + len as i64;
        let index = start + (offset % (len + 1)) as i64;
        let mut harness = TestHarness::new();
        harness.attach(
            &snapshot("listA")
                .start_index(start)
                .bounds(start, end)
                .items(int_items(start, end))
                .build(),
        );

        let wedge: Vec<Value> = (0..count)
            .map(|position| json!(format!("wedge{position}")))
            .collect();
        harness.apply(&mutation("listA", 1).insert_range(index, wedge).build());
        prop_assert_eq!(harness.bounds("listA"), (start, end + count as i64));
        prop_assert_eq!(harness.item("listA", index), Some(&json!("wedge0")));

        harness.apply(&mutation("listA", 2).delete_range(index, count).build());
        prop_assert_eq!(harness.bounds("listA"), (start, end));
        prop_assert_eq!(harness.span("listA"), IndexRange::new(start, end));
        for at in start..end {
            prop_assert_eq!(harness.item("listA", at), Some(&json!(at)));
        }
    }

    /// However the versions 1..=n are permuted on arrival, the list must
    /// end at version n with every batch applied in version order.
    #[test]
    fn prop_every_arrival_order_converges_to_the_same_state(
        versions in shuffled_versions(),
    ) {
        let mut harness = TestHarness::with_config(
            SourceConfig::new("testList")
                .with_chunk_size(5)
                .with_update_buffer_size(8),
        );
        harness.attach(
            &snapshot("listA")
                .bounds(0, 10)
                .items(int_items(0, 10))
                .build(),
        );

        let total = versions.len() as u64;
        for version in versions {
            let result = harness.process(
                &mutation("listA", version).replace(0, json!(version)).build(),
            );
            if let Err(err) = result {
                prop_assert!(
                    matches!(err, UpdateError::Deferred { .. }),
                    "arrival was refused instead of deferred: {}",
                    err
                );
            }
        }

        prop_assert_eq!(harness.version("listA"), Some(total));
        prop_assert_eq!(harness.item("listA", 0), Some(&json!(total)));
        prop_assert_eq!(harness.reasons(), Vec::<ErrorReason>::new());
        prop_assert_eq!(harness.provider.is_failed("listA"), Some(false));
        prop_assert_eq!(harness.clock.armed_count(), 0, "expiry timers disarmed on drain");
    }
}
