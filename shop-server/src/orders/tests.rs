use std::sync::Arc;

use rust_decimal::Decimal;
use shared::Page;
use shared::models::{CartLine, CustomerId, OrderLine, OrderStatus, Voucher, VoucherKind};

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use super::*;
use crate::db::memory::{InMemoryCartStore, InMemoryOrderLedger, InMemoryVoucherLedger};
use crate::db::{Decrement, OrderLedger, RepoError, RepoResult, VoucherLedger};

const NOW: i64 = 1_700_000_000_000;
const ALICE: CustomerId = CustomerId(1);
const BOB: CustomerId = CustomerId(2);

struct Harness {
    carts: Arc<InMemoryCartStore>,
    vouchers: Arc<InMemoryVoucherLedger>,
    orders: Arc<InMemoryOrderLedger>,
    service: OrderService,
}

fn harness() -> Harness {
    let carts = Arc::new(InMemoryCartStore::new());
    let vouchers = Arc::new(InMemoryVoucherLedger::new());
    let orders = Arc::new(InMemoryOrderLedger::new());
    let service = OrderService::new(carts.clone(), vouchers.clone(), orders.clone())
        .with_clock(Arc::new(|| NOW));
    Harness {
        carts,
        vouchers,
        orders,
        service,
    }
}

fn line(variant: i64, quantity: i32, price: i64) -> CartLine {
    CartLine {
        product_variant_id: variant,
        quantity,
        unit_price: Decimal::from(price),
    }
}

fn voucher(code: &str, kind: VoucherKind, discount: i64, remaining_usage: i32) -> Voucher {
    Voucher {
        id: 10,
        code: code.into(),
        name: code.into(),
        kind,
        discount: Decimal::from(discount),
        remaining_usage,
        start_at: NOW - 1_000,
        end_at: NOW + 1_000,
        published: true,
    }
}

fn checkout(voucher_code: Option<&str>) -> CheckoutInput {
    CheckoutInput {
        address_id: 99,
        payment_method: "card".into(),
        note: None,
        voucher_code: voucher_code.map(str::to_string),
    }
}

// ========== CreateOrder ==========

#[tokio::test]
async fn test_empty_cart_rejected() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![]);

    let err = h.service.create_order(ALICE, checkout(None)).await.unwrap_err();
    assert!(matches!(err, OrderError::EmptyCart));
    assert!(h.orders.is_empty());
}

#[tokio::test]
async fn test_empty_cart_rejected_before_voucher_is_touched() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![]);
    h.vouchers.insert(voucher("SAVE10", VoucherKind::Percentage, 10, 3));

    let err = h
        .service
        .create_order(ALICE, checkout(Some("SAVE10")))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::EmptyCart));
    assert_eq!(h.vouchers.remaining_usage(10), Some(3));
}

#[tokio::test]
async fn test_missing_cart_is_empty_cart() {
    let h = harness();
    let err = h.service.create_order(ALICE, checkout(None)).await.unwrap_err();
    assert!(matches!(err, OrderError::EmptyCart));
}

#[tokio::test]
async fn test_unreachable_cart_store() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 10)]);
    h.carts.fail_reads(true);

    let err = h.service.create_order(ALICE, checkout(None)).await.unwrap_err();
    assert!(matches!(err, OrderError::CartUnavailable));
}

#[tokio::test]
async fn test_checkout_without_voucher() {
    let h = harness();
    h.carts
        .put_lines(ALICE.0, vec![line(1, 2, 50), line(2, 1, 30)]);

    let mut input = checkout(None);
    input.note = Some("leave at the door".into());
    let receipt = h.service.create_order(ALICE, input).await.unwrap();

    assert_eq!(receipt.total, Decimal::from(130));
    assert_eq!(receipt.status, OrderStatus::Created);
    assert_eq!(receipt.items.len(), 2);
    assert_eq!(
        receipt.items[0],
        OrderLine {
            product_variant_id: 1,
            quantity: 2,
            unit_price: Decimal::from(50)
        }
    );

    let stored = h.orders.get_order_by_id(receipt.id).await.unwrap();
    assert_eq!(stored.customer_id, ALICE.0);
    assert_eq!(stored.address_id, 99);
    assert_eq!(stored.payment_method, "card");
    assert_eq!(stored.note.as_deref(), Some("leave at the door"));
    assert_eq!(stored.discount, Decimal::ZERO);
    assert_eq!(stored.voucher_code, None);
    assert_eq!(stored.voucher_id, None);

    assert!(h.carts.lines(ALICE.0).is_empty());
}

#[tokio::test]
async fn test_empty_voucher_code_means_no_voucher() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 40)]);

    let receipt = h
        .service
        .create_order(ALICE, checkout(Some("")))
        .await
        .unwrap();
    assert_eq!(receipt.total, Decimal::from(40));
}

#[tokio::test]
async fn test_whitespace_voucher_code_is_not_blank() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 40)]);

    let err = h
        .service
        .create_order(ALICE, checkout(Some("   ")))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidVoucher));
    assert!(h.orders.is_empty());
}

#[tokio::test]
async fn test_padded_voucher_code_is_not_trimmed() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 40)]);
    h.vouchers.insert(voucher("SAVE10", VoucherKind::Fixed, 5, 2));

    let err = h
        .service
        .create_order(ALICE, checkout(Some(" SAVE10 ")))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidVoucher));
    assert_eq!(h.vouchers.remaining_usage(10), Some(2));
    assert_eq!(h.carts.lines(ALICE.0).len(), 1);
}

#[tokio::test]
async fn test_percentage_voucher() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 100)]);
    h.vouchers
        .insert(voucher("SAVE10", VoucherKind::Percentage, 10, 5));

    let receipt = h
        .service
        .create_order(ALICE, checkout(Some("SAVE10")))
        .await
        .unwrap();

    assert_eq!(receipt.total, Decimal::from(90));
    assert_eq!(h.vouchers.remaining_usage(10), Some(4));

    let stored = h.orders.get_order_by_id(receipt.id).await.unwrap();
    assert_eq!(stored.discount, Decimal::from(10));
    assert_eq!(stored.voucher_code.as_deref(), Some("SAVE10"));
    assert_eq!(stored.voucher_id, Some(10));
}

#[tokio::test]
async fn test_fixed_voucher_exceeding_subtotal_clamps_total() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 20)]);
    h.vouchers.insert(voucher("FLAT50", VoucherKind::Fixed, 50, 1));

    let receipt = h
        .service
        .create_order(ALICE, checkout(Some("FLAT50")))
        .await
        .unwrap();

    assert_eq!(receipt.total, Decimal::ZERO);
    let stored = h.orders.get_order_by_id(receipt.id).await.unwrap();
    assert_eq!(stored.discount, Decimal::from(50));
}

#[tokio::test]
async fn test_unknown_voucher_code() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 20)]);

    let err = h
        .service
        .create_order(ALICE, checkout(Some("NOPE")))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidVoucher));
    assert_eq!(h.carts.lines(ALICE.0).len(), 1);
}

#[tokio::test]
async fn test_voucher_code_match_is_exact() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 20)]);
    h.vouchers.insert(voucher("SAVE10", VoucherKind::Fixed, 5, 1));

    let err = h
        .service
        .create_order(ALICE, checkout(Some("save10")))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::InvalidVoucher));
}

#[tokio::test]
async fn test_expired_voucher_not_decremented() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 20)]);
    let mut v = voucher("OLD", VoucherKind::Fixed, 5, 3);
    v.start_at = NOW - 10_000;
    v.end_at = NOW - 1;
    h.vouchers.insert(v);

    let err = h
        .service
        .create_order(ALICE, checkout(Some("OLD")))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::VoucherNotActive));
    assert_eq!(h.vouchers.remaining_usage(10), Some(3));
    assert!(h.orders.is_empty());
}

#[tokio::test]
async fn test_voucher_window_is_half_open() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 20)]);

    // end == now: already over
    let mut v = voucher("EDGE", VoucherKind::Fixed, 5, 3);
    v.end_at = NOW;
    h.vouchers.insert(v);
    let err = h
        .service
        .create_order(ALICE, checkout(Some("EDGE")))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::VoucherNotActive));

    // start == now: already running
    let mut v = voucher("EDGE", VoucherKind::Fixed, 5, 3);
    v.start_at = NOW;
    h.vouchers.insert(v);
    let receipt = h
        .service
        .create_order(ALICE, checkout(Some("EDGE")))
        .await
        .unwrap();
    assert_eq!(receipt.total, Decimal::from(15));
}

#[tokio::test]
async fn test_unpublished_voucher_not_active() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 20)]);
    let mut v = voucher("DRAFT", VoucherKind::Fixed, 5, 3);
    v.published = false;
    h.vouchers.insert(v);

    let err = h
        .service
        .create_order(ALICE, checkout(Some("DRAFT")))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::VoucherNotActive));
}

#[tokio::test]
async fn test_zero_usage_voucher_rejected() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 20)]);
    h.vouchers.insert(voucher("GONE", VoucherKind::Fixed, 5, 0));

    let err = h
        .service
        .create_order(ALICE, checkout(Some("GONE")))
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::VoucherUsageExceeded));
    assert_eq!(h.vouchers.remaining_usage(10), Some(0));
    assert!(h.orders.is_empty());
}

/// Reports usage left on lookup, then loses every conditional decrement,
/// as when another checkout takes the last unit in between.
struct RaceLostLedger {
    voucher: Voucher,
    decrements: AtomicUsize,
}

#[async_trait]
impl VoucherLedger for RaceLostLedger {
    async fn get_by_code(&self, code: &str) -> RepoResult<Voucher> {
        if code == self.voucher.code {
            Ok(self.voucher.clone())
        } else {
            Err(RepoError::NotFound(format!("voucher {code}")))
        }
    }

    async fn conditional_decrement_usage(&self, _voucher_id: i64) -> RepoResult<Decrement> {
        self.decrements.fetch_add(1, Ordering::SeqCst);
        Ok(Decrement::NoRowsAffected)
    }
}

#[tokio::test]
async fn test_decrement_lost_after_eligibility_check() {
    let carts = Arc::new(InMemoryCartStore::new());
    let orders = Arc::new(InMemoryOrderLedger::new());
    let ledger = Arc::new(RaceLostLedger {
        voucher: voucher("LAST", VoucherKind::Fixed, 5, 1),
        decrements: AtomicUsize::new(0),
    });
    let service = OrderService::new(carts.clone(), ledger.clone(), orders.clone())
        .with_clock(Arc::new(|| NOW));
    carts.put_lines(ALICE.0, vec![line(1, 2, 20)]);

    let err = service
        .create_order(ALICE, checkout(Some("LAST")))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::VoucherUsageExceeded));
    assert_eq!(ledger.decrements.load(Ordering::SeqCst), 1);
    assert!(orders.is_empty());
    assert_eq!(carts.lines(ALICE.0), vec![line(1, 2, 20)]);
}

#[tokio::test]
async fn test_last_voucher_unit_goes_to_one_customer() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 20)]);
    h.carts.put_lines(BOB.0, vec![line(1, 1, 20)]);
    h.vouchers.insert(voucher("LAST", VoucherKind::Fixed, 5, 1));

    let (a, b) = tokio::join!(
        h.service.create_order(ALICE, checkout(Some("LAST"))),
        h.service.create_order(BOB, checkout(Some("LAST"))),
    );

    let results = [a, b];
    let ok = results.iter().filter(|r| r.is_ok()).count();
    let exceeded = results
        .iter()
        .filter(|r| matches!(r, Err(OrderError::VoucherUsageExceeded)))
        .count();
    assert_eq!(ok, 1);
    assert_eq!(exceeded, 1);
    assert_eq!(h.vouchers.remaining_usage(10), Some(0));
    assert_eq!(h.orders.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_concurrent_checkouts_respect_usage_limit() {
    const CUSTOMERS: i64 = 40;
    const PERMITS: i32 = 7;

    let h = harness();
    for customer in 1..=CUSTOMERS {
        h.carts.put_lines(customer, vec![line(1, 1, 20)]);
    }
    h.vouchers
        .insert(voucher("HOT", VoucherKind::Percentage, 50, PERMITS));

    let handles: Vec<_> = (1..=CUSTOMERS)
        .map(|customer| {
            let service = h.service.clone();
            tokio::spawn(async move {
                service
                    .create_order(CustomerId(customer), checkout(Some("HOT")))
                    .await
            })
        })
        .collect();

    let mut ok = 0;
    let mut exceeded = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(receipt) => {
                assert_eq!(receipt.total, Decimal::from(10));
                ok += 1;
            }
            Err(OrderError::VoucherUsageExceeded) => exceeded += 1,
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(ok, PERMITS as usize);
    assert_eq!(exceeded, CUSTOMERS as usize - PERMITS as usize);
    assert_eq!(h.vouchers.remaining_usage(10), Some(0));
    assert_eq!(h.orders.len(), PERMITS as usize);
}

#[tokio::test]
async fn test_persist_failure_keeps_consumed_voucher_unit() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 20)]);
    h.vouchers.insert(voucher("SAVE", VoucherKind::Fixed, 5, 2));
    h.orders.fail_creates(true);

    let err = h
        .service
        .create_order(ALICE, checkout(Some("SAVE")))
        .await
        .unwrap_err();

    assert!(matches!(err, OrderError::OrderPersistFailure));
    assert_eq!(h.vouchers.remaining_usage(10), Some(1));
    // cart untouched so the customer can retry
    assert_eq!(h.carts.lines(ALICE.0).len(), 1);
}

#[tokio::test]
async fn test_cart_clear_failure_does_not_fail_checkout() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 3, 10)]);
    h.carts.fail_clears(true);

    let receipt = h.service.create_order(ALICE, checkout(None)).await.unwrap();

    assert_eq!(receipt.total, Decimal::from(30));
    assert_eq!(h.orders.len(), 1);
    assert_eq!(h.carts.lines(ALICE.0).len(), 1);
}

// ========== Reads ==========

#[tokio::test]
async fn test_order_detail_total_ignores_discount() {
    let h = harness();
    h.carts.put_lines(ALICE.0, vec![line(1, 1, 100)]);
    h.vouchers
        .insert(voucher("SAVE10", VoucherKind::Percentage, 10, 5));

    let created = h
        .service
        .create_order(ALICE, checkout(Some("SAVE10")))
        .await
        .unwrap();
    assert_eq!(created.total, Decimal::from(90));

    let detail = h.service.get_order_detail(created.id, ALICE).await.unwrap();
    assert_eq!(detail.id, created.id);
    assert_eq!(detail.total, Decimal::from(100));
    assert_eq!(detail.items, created.items);
}

#[tokio::test]
async fn test_order_detail_ownership() {
    let h = harness();
    h.carts.put_lines(BOB.0, vec![line(1, 1, 10)]);
    let receipt = h.service.create_order(BOB, checkout(None)).await.unwrap();

    let err = h
        .service
        .get_order_detail(receipt.id, ALICE)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderError::Forbidden));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_owner_reads_their_order_after_burst() {
    const CUSTOMERS: i64 = 500;
    let h = harness();
    for c in 1..=CUSTOMERS {
        h.carts.put_lines(c, vec![line(1, 1, 10)]);
    }

    let handles: Vec<_> = (1..=CUSTOMERS)
        .map(|c| {
            let service = h.service.clone();
            tokio::spawn(async move {
                let receipt = service
                    .create_order(CustomerId(c), checkout(None))
                    .await
                    .unwrap();
                (c, receipt.id)
            })
        })
        .collect();

    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        let (c, id) = handle.await.unwrap();
        assert!(ids.insert(id), "order id {id} issued twice");
        let detail = h.service.get_order_detail(id, CustomerId(c)).await.unwrap();
        assert_eq!(detail.id, id);
    }
    assert_eq!(h.orders.len(), CUSTOMERS as usize);
}

#[tokio::test]
async fn test_order_detail_not_found() {
    let h = harness();
    let err = h.service.get_order_detail(12345, ALICE).await.unwrap_err();
    assert!(matches!(err, OrderError::NotFound));
}

#[tokio::test]
async fn test_order_history_pages_newest_first() {
    let h = harness();
    let mut ids = Vec::new();
    for price in [10, 20, 30] {
        h.carts.put_lines(ALICE.0, vec![line(1, 1, price)]);
        let receipt = h.service.create_order(ALICE, checkout(None)).await.unwrap();
        ids.push(receipt.id);
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    h.carts.put_lines(BOB.0, vec![line(1, 1, 99)]);
    h.service.create_order(BOB, checkout(None)).await.unwrap();

    let (first, total) = h
        .service
        .list_order_history(ALICE, Page::new(1, 2))
        .await
        .unwrap();
    assert_eq!(total, 3);
    assert_eq!(
        first.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![ids[2], ids[1]]
    );
    assert_eq!(first[0].total, Decimal::from(30));

    let (second, _) = h
        .service
        .list_order_history(ALICE, Page::new(2, 2))
        .await
        .unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].id, ids[0]);
}

#[tokio::test]
async fn test_get_cart_summary_is_idempotent() {
    let h = harness();
    h.carts
        .put_lines(ALICE.0, vec![line(1, 2, 50), line(2, 1, 30)]);

    let first = h.service.get_cart(ALICE).await.unwrap();
    let second = h.service.get_cart(ALICE).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.total, Decimal::from(130));
    assert_eq!(h.carts.lines(ALICE.0).len(), 2);
}

#[tokio::test]
async fn test_get_cart_without_cart_is_empty() {
    let h = harness();
    let summary = h.service.get_cart(ALICE).await.unwrap();
    assert!(summary.items.is_empty());
    assert_eq!(summary.total, Decimal::ZERO);
    assert_eq!(summary.customer_id, ALICE.0);
}
