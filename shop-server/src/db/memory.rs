//! In-memory storage
//!
//! Backs unit and HTTP tests and local runs without PostgreSQL. Every store
//! keeps its state behind one `parking_lot::Mutex`; the voucher ledger's
//! conditional decrement is a check-and-write under that single lock, which
//! makes it as atomic as the SQL `UPDATE ... WHERE remaining_usage > 0`.
//!
//! The cart store and order ledger can be told to fail, so callers can
//! exercise their error paths. Order and address ids come from a per-store
//! counter, like a `BIGSERIAL` column.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use shared::models::{Address, AddressInput, Cart, CartLine, NewOrder, Order, Voucher};
use shared::util::now_millis;

use super::{
    AddressBook, CartStore, Decrement, OrderLedger, RepoError, RepoResult, VoucherLedger,
};

// ========== Cart ==========

#[derive(Default)]
pub struct InMemoryCartStore {
    carts: Mutex<HashMap<i64, Cart>>,
    fail_reads: AtomicBool,
    fail_clears: AtomicBool,
}

impl InMemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the customer's cart lines, creating the cart if needed
    pub fn put_lines(&self, customer_id: i64, lines: Vec<CartLine>) {
        let mut carts = self.carts.lock();
        let next_id = carts.len() as i64 + 1;
        carts
            .entry(customer_id)
            .or_insert_with(|| Cart {
                id: next_id,
                customer_id,
                items: Vec::new(),
            })
            .items = lines;
    }

    pub fn lines(&self, customer_id: i64) -> Vec<CartLine> {
        self.carts
            .lock()
            .get(&customer_id)
            .map(|c| c.items.clone())
            .unwrap_or_default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_clears(&self, fail: bool) {
        self.fail_clears.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn get_cart_by_customer(&self, customer_id: i64) -> RepoResult<Cart> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(RepoError::Database("cart store unreachable".into()));
        }
        self.carts
            .lock()
            .get(&customer_id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("cart for customer {customer_id}")))
    }

    async fn clear_cart(&self, customer_id: i64) -> RepoResult<()> {
        if self.fail_clears.load(Ordering::SeqCst) {
            return Err(RepoError::Database("cart store unreachable".into()));
        }
        if let Some(cart) = self.carts.lock().get_mut(&customer_id) {
            cart.items.clear();
        }
        Ok(())
    }
}

// ========== Voucher ==========

#[derive(Default)]
pub struct InMemoryVoucherLedger {
    vouchers: Mutex<HashMap<i64, Voucher>>,
}

impl InMemoryVoucherLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, voucher: Voucher) {
        self.vouchers.lock().insert(voucher.id, voucher);
    }

    pub fn remaining_usage(&self, voucher_id: i64) -> Option<i32> {
        self.vouchers
            .lock()
            .get(&voucher_id)
            .map(|v| v.remaining_usage)
    }
}

#[async_trait]
impl VoucherLedger for InMemoryVoucherLedger {
    async fn get_by_code(&self, code: &str) -> RepoResult<Voucher> {
        self.vouchers
            .lock()
            .values()
            .find(|v| v.code == code)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("voucher {code}")))
    }

    async fn conditional_decrement_usage(&self, voucher_id: i64) -> RepoResult<Decrement> {
        let mut vouchers = self.vouchers.lock();
        match vouchers.get_mut(&voucher_id) {
            Some(v) if v.remaining_usage > 0 => {
                v.remaining_usage -= 1;
                Ok(Decrement::Applied {
                    remaining: v.remaining_usage,
                })
            }
            _ => Ok(Decrement::NoRowsAffected),
        }
    }
}

// ========== Order ==========

#[derive(Default)]
pub struct InMemoryOrderLedger {
    orders: Mutex<Vec<Order>>,
    last_id: AtomicI64,
    fail_creates: AtomicBool,
}

impl InMemoryOrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an already-built order (test fixtures)
    pub fn insert(&self, order: Order) {
        self.last_id.fetch_max(order.id, Ordering::SeqCst);
        self.orders.lock().push(order);
    }

    pub fn len(&self) -> usize {
        self.orders.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.lock().is_empty()
    }

    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl OrderLedger for InMemoryOrderLedger {
    async fn create_order(&self, new: NewOrder) -> RepoResult<Order> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(RepoError::Database("order ledger unreachable".into()));
        }
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let order = Order::from_new(id, now_millis(), new);
        self.orders.lock().push(order.clone());
        Ok(order)
    }

    async fn get_order_by_id(&self, id: i64) -> RepoResult<Order> {
        self.orders
            .lock()
            .iter()
            .find(|o| o.id == id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("order {id}")))
    }

    async fn list_orders_by_customer(
        &self,
        customer_id: i64,
        limit: i64,
        offset: i64,
    ) -> RepoResult<(Vec<Order>, u64)> {
        let mut mine: Vec<Order> = self
            .orders
            .lock()
            .iter()
            .filter(|o| o.customer_id == customer_id)
            .cloned()
            .collect();
        mine.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        let total = mine.len() as u64;
        let page = mine
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect();
        Ok((page, total))
    }
}

// ========== Address ==========

#[derive(Default)]
pub struct InMemoryAddressBook {
    addresses: Mutex<HashMap<i64, Address>>,
    last_id: AtomicI64,
}

impl InMemoryAddressBook {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AddressBook for InMemoryAddressBook {
    async fn create(&self, customer_id: i64, input: AddressInput) -> RepoResult<Address> {
        let now = now_millis();
        let id = self.last_id.fetch_add(1, Ordering::SeqCst) + 1;
        let address = Address {
            id,
            customer_id,
            fullname: input.fullname,
            email: input.email,
            address: input.address,
            is_default: false,
            created_at: now,
            updated_at: now,
        };
        self.addresses.lock().insert(id, address.clone());
        Ok(address)
    }

    async fn get(&self, id: i64) -> RepoResult<Address> {
        self.addresses
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("address {id}")))
    }

    async fn update(&self, id: i64, input: AddressInput) -> RepoResult<Address> {
        let mut addresses = self.addresses.lock();
        let address = addresses
            .get_mut(&id)
            .ok_or_else(|| RepoError::NotFound(format!("address {id}")))?;
        address.fullname = input.fullname;
        address.email = input.email;
        address.address = input.address;
        address.updated_at = now_millis();
        Ok(address.clone())
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        self.addresses
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| RepoError::NotFound(format!("address {id}")))
    }

    async fn list_by_customer(&self, customer_id: i64) -> RepoResult<Vec<Address>> {
        let mut list: Vec<Address> = self
            .addresses
            .lock()
            .values()
            .filter(|a| a.customer_id == customer_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then(b.created_at.cmp(&a.created_at))
        });
        Ok(list)
    }

    async fn set_default(&self, customer_id: i64, id: i64) -> RepoResult<Address> {
        let mut addresses = self.addresses.lock();
        match addresses.get(&id) {
            Some(a) if a.customer_id == customer_id => {}
            _ => return Err(RepoError::NotFound(format!("address {id}"))),
        }
        let now = now_millis();
        for a in addresses.values_mut().filter(|a| a.customer_id == customer_id) {
            let make_default = a.id == id;
            if a.is_default != make_default {
                a.is_default = make_default;
                a.updated_at = now;
            }
        }
        addresses
            .get(&id)
            .cloned()
            .ok_or_else(|| RepoError::NotFound(format!("address {id}")))
    }
}
