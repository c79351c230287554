/// Integration tests for lazy loading.
/// These tests drive ensure/fetch/fulfill round trips through the full
/// provider, verifying chunk demand, gap reporting, and that arrival order
/// never changes the materialized window.

use serde_json::json;

use dynlist_provider::{IndexRange, ListEvent};
use dynlist_test::{assert_materialized, assert_reasons};
use dynlist_test::{int_items, load_response, snapshot, TestHarness};

fn five_item_window() -> TestHarness {
    let mut harness = TestHarness::new();
    harness.attach(
        &snapshot("listA")
            .start_index(10)
            .bounds(0, 20)
            .items(int_items(10, 15))
            .build(),
    );
    harness
}

#[test]
fn ensure_reports_gaps_and_requests_margin_chunks() {
    let mut harness = five_item_window();

    let missing = harness.ensure("listA", 5, 15);
    assert_eq!(
        missing,
        vec![IndexRange::new(5, 10)],
        "only the low half of the ensured range is unmaterialized"
    );

    let requests = harness.fetch_requests();
    assert_eq!(requests.len(), 2);
    // The upper margin chunk is emitted first, then the lower one; each
    // carries its own fresh token.
    assert_eq!(requests[0].start_index, 15);
    assert_eq!(requests[0].count, 5);
    assert_eq!(requests[0].correlation_token, "101");
    assert_eq!(requests[1].start_index, 5);
    assert_eq!(requests[1].count, 5);
    assert_eq!(requests[1].correlation_token, "102");
}

#[test]
fn chunk_arrival_order_does_not_change_the_window() {
    for reversed in [false, true] {
        let mut harness = five_item_window();
        harness.ensure("listA", 5, 15);

        let mut requests = harness.fetch_requests();
        if reversed {
            requests.reverse();
        }
        for request in &requests {
            harness.fulfill(request);
        }

        assert_materialized!(harness, "listA", 5, int_items(5, 20));
        assert_reasons!(harness, []);

        let loads = harness
            .events()
            .into_iter()
            .filter(|event| matches!(event, ListEvent::Loaded { .. }))
            .count();
        assert_eq!(loads, 2, "one load event per fulfilled chunk");
    }
}

#[test]
fn in_flight_ranges_are_not_requested_twice() {
    let mut harness = five_item_window();

    harness.ensure("listA", 5, 15);
    assert_eq!(harness.fetch_requests().len(), 2);

    // Same demand again while both chunks are still outstanding.
    let missing = harness.ensure("listA", 5, 15);
    assert_eq!(missing, vec![IndexRange::new(5, 10)], "still unmaterialized");
    assert!(
        harness.fetch_requests().is_empty(),
        "outstanding ranges suppress new requests"
    );
}

#[test]
fn repeated_ensures_march_the_window_toward_a_far_range() {
    let mut harness = TestHarness::new();
    harness.attach(
        &snapshot("listA")
            .bounds(0, 30)
            .items(int_items(0, 5))
            .build(),
    );

    // Each ensure may only request chunks adjacent to the current window,
    // so reaching [20, 25) takes one fulfilled round trip per chunk.
    let mut starts = Vec::new();
    loop {
        harness.ensure("listA", 20, 25);
        let requests = harness.fetch_requests();
        let Some(request) = requests.first() else {
            break;
        };
        assert_eq!(requests.len(), 1, "one adjacent chunk per round");
        starts.push(request.start_index);
        harness.fulfill(request);
    }

    assert_eq!(starts, vec![5, 10, 15, 20, 25]);
    assert_materialized!(harness, "listA", 0, int_items(0, 30));
}

#[test]
fn margin_chunks_clip_to_the_declared_bounds() {
    let mut harness = TestHarness::new();
    harness.attach(&snapshot("listA").bounds(0, 8).build());

    // Empty window: the first chunk anchors at the ensured start and is
    // cut short by the upper bound.
    let missing = harness.ensure("listA", 5, 8);
    assert_eq!(missing, vec![IndexRange::new(5, 8)]);
    let request = harness.single_fetch_request();
    assert_eq!((request.start_index, request.count), (5, 3));
    harness.fulfill(&request);

    // The upper margin now falls entirely outside the bounds, so only the
    // lower chunk goes out.
    harness.ensure("listA", 0, 5);
    let request = harness.single_fetch_request();
    assert_eq!((request.start_index, request.count), (0, 5));
    harness.fulfill(&request);

    assert_materialized!(harness, "listA", 0, int_items(0, 8));
    harness.ensure("listA", 0, 8);
    assert!(harness.fetch_requests().is_empty(), "nothing left to request");
}

#[test]
fn gaps_are_reported_clipped_to_bounds() {
    let mut harness = five_item_window();
    let missing = harness.ensure("listA", -10, 50);
    assert_eq!(
        missing,
        vec![IndexRange::new(0, 10), IndexRange::new(15, 20)],
        "indices outside the declared bounds are never missing"
    );
}

#[test]
fn directive_loads_materialize_without_a_fetch_round_trip() {
    let mut harness = five_item_window();

    harness.apply(
        &load_response("listA")
            .start_index(15)
            .items(int_items(15, 20))
            .build(),
    );

    assert_materialized!(harness, "listA", 10, int_items(10, 20));
    assert!(harness.fetch_requests().is_empty());
    assert_reasons!(harness, []);
    assert_eq!(
        harness.events(),
        vec![ListEvent::Loaded {
            list_id: "listA".to_string(),
            range: IndexRange::new(15, 20),
        }]
    );
}

#[test]
fn numeric_and_short_form_tokens_fulfill_outstanding_fetches() {
    let mut harness = five_item_window();

    harness.ensure("listA", 15, 20);
    let request = harness.single_fetch_request();
    let numeric: u64 = request.correlation_token.parse().expect("tokens are decimal");
    harness.apply(
        &load_response("listA")
            .numeric_token(numeric)
            .start_index(15)
            .items(int_items(15, 20))
            .build(),
    );
    assert_eq!(harness.span("listA"), IndexRange::new(10, 20));

    harness.ensure("listA", 5, 10);
    let request = harness.single_fetch_request();
    // Short-form `token` field instead of `correlationToken`.
    harness.apply(&json!({
        "listId": "listA",
        "token": request.correlation_token,
        "startIndex": 5,
        "items": int_items(5, 10),
    }));

    assert_materialized!(harness, "listA", 5, int_items(5, 20));
    assert_reasons!(harness, []);
}
