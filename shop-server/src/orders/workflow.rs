use std::sync::Arc;

use rust_decimal::Decimal;
use shared::Page;
use shared::models::{
    Cart, CartSummary, CustomerId, NewOrder, Order, OrderLine, OrderStatus, Receipt, Voucher,
};
use shared::util::now_millis;
use tracing::{debug, error, info, warn};

use super::error::{OrderError, OrderResult};
use super::money;
use crate::db::{CartStore, Decrement, OrderLedger, RepoError, VoucherLedger};

/// Millisecond wall clock, swappable in tests
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Checkout request as seen by the workflow
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutInput {
    pub address_id: i64,
    pub payment_method: String,
    pub note: Option<String>,
    pub voucher_code: Option<String>,
}

/// Voucher that passed eligibility, with the discount it grants
#[derive(Debug, Clone)]
struct AppliedVoucher {
    id: i64,
    code: String,
    discount: Decimal,
}

/// Order workflow engine
///
/// Borrows the cart, voucher and order stores for the duration of each call
/// and holds no entity state of its own. Cross-request ordering is left to the
/// voucher ledger's conditional decrement.
#[derive(Clone)]
pub struct OrderService {
    carts: Arc<dyn CartStore>,
    vouchers: Arc<dyn VoucherLedger>,
    orders: Arc<dyn OrderLedger>,
    clock: Clock,
}

impl OrderService {
    pub fn new(
        carts: Arc<dyn CartStore>,
        vouchers: Arc<dyn VoucherLedger>,
        orders: Arc<dyn OrderLedger>,
    ) -> Self {
        Self {
            carts,
            vouchers,
            orders,
            clock: Arc::new(now_millis),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Turn the customer's cart into an order.
    ///
    /// A consumed voucher unit is not returned if a later step fails.
    pub async fn create_order(
        &self,
        customer: CustomerId,
        input: CheckoutInput,
    ) -> OrderResult<Receipt> {
        let customer_id = customer.get();

        let cart = self.load_cart(customer_id).await?;
        if cart.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let items: Vec<OrderLine> = cart.items.iter().map(OrderLine::from).collect();
        let subtotal = money::subtotal(&items);

        // Only an absent or empty code means "no voucher"; lookup is exact
        let voucher_code = input.voucher_code.filter(|c| !c.is_empty());
        let applied = match voucher_code {
            Some(code) => Some(self.resolve_voucher(&code, subtotal).await?),
            None => None,
        };

        let discount = applied.as_ref().map_or(Decimal::ZERO, |v| v.discount);
        let total = money::apply_discount(subtotal, discount);

        if let Some(voucher) = &applied {
            self.consume_voucher(voucher).await?;
        }

        let new_order = NewOrder {
            customer_id,
            address_id: input.address_id,
            note: input.note.filter(|n| !n.is_empty()),
            payment_method: input.payment_method,
            voucher_code: applied.as_ref().map(|v| v.code.clone()),
            voucher_id: applied.as_ref().map(|v| v.id),
            discount,
            status: OrderStatus::Created,
            items,
        };

        let order = self.orders.create_order(new_order).await.map_err(|e| {
            match &applied {
                Some(voucher) => error!(
                    customer_id,
                    voucher_id = voucher.id,
                    voucher_code = %voucher.code,
                    error = %e,
                    "Order persist failed after voucher usage was consumed"
                ),
                None => error!(customer_id, error = %e, "Order persist failed"),
            }
            OrderError::OrderPersistFailure
        })?;

        if let Err(e) = self.carts.clear_cart(customer_id).await {
            warn!(
                customer_id,
                order_id = order.id,
                error = %e,
                "Failed to clear cart after order was created"
            );
        }

        info!(
            order_id = order.id,
            customer_id,
            total = %total,
            voucher_code = ?order.voucher_code,
            "Order created"
        );

        Ok(Receipt {
            id: order.id,
            items: order.items,
            total,
            status: order.status,
        })
    }

    /// Load one order owned by `customer`.
    ///
    /// The total is the plain sum of the line items; the stored discount is
    /// not applied.
    pub async fn get_order_detail(
        &self,
        order_id: i64,
        customer: CustomerId,
    ) -> OrderResult<Receipt> {
        let order = match self.orders.get_order_by_id(order_id).await {
            Ok(order) => order,
            Err(RepoError::NotFound(_)) => return Err(OrderError::NotFound),
            Err(e) => return Err(e.into()),
        };

        if order.customer_id != customer.get() {
            warn!(
                order_id,
                customer_id = customer.get(),
                "Order detail requested by non-owner"
            );
            return Err(OrderError::Forbidden);
        }

        Ok(receipt_from_order(order))
    }

    /// A page of the customer's orders, newest first, each with its line-item
    /// sum as total.
    pub async fn list_order_history(
        &self,
        customer: CustomerId,
        page: Page,
    ) -> OrderResult<(Vec<Receipt>, u64)> {
        let (orders, total) = self
            .orders
            .list_orders_by_customer(customer.get(), page.limit(), page.offset())
            .await?;
        Ok((orders.into_iter().map(receipt_from_order).collect(), total))
    }

    /// Read-only projection of the live cart
    pub async fn get_cart(&self, customer: CustomerId) -> OrderResult<CartSummary> {
        let cart = self.load_cart(customer.get()).await?;
        let total = money::subtotal(&cart.items);
        Ok(CartSummary {
            customer_id: cart.customer_id,
            items: cart.items,
            total,
        })
    }

    /// A customer without a cart row has an empty cart
    async fn load_cart(&self, customer_id: i64) -> OrderResult<Cart> {
        match self.carts.get_cart_by_customer(customer_id).await {
            Ok(cart) => Ok(cart),
            Err(RepoError::NotFound(_)) => Ok(Cart::empty(customer_id)),
            Err(e) => {
                warn!(customer_id, error = %e, "Cart store unavailable");
                Err(OrderError::CartUnavailable)
            }
        }
    }

    async fn resolve_voucher(&self, code: &str, subtotal: Decimal) -> OrderResult<AppliedVoucher> {
        let voucher: Voucher = match self.vouchers.get_by_code(code).await {
            Ok(v) => v,
            Err(RepoError::NotFound(_)) => {
                debug!(voucher_code = %code, "Voucher rejected: unknown code");
                return Err(OrderError::InvalidVoucher);
            }
            Err(e) => return Err(e.into()),
        };

        if !voucher.is_active_at((self.clock)()) {
            debug!(voucher_id = voucher.id, "Voucher rejected: not active");
            return Err(OrderError::VoucherNotActive);
        }

        if !voucher.has_remaining_usage() {
            debug!(voucher_id = voucher.id, "Voucher rejected: no remaining usage");
            return Err(OrderError::VoucherUsageExceeded);
        }

        Ok(AppliedVoucher {
            id: voucher.id,
            discount: money::voucher_discount(&voucher, subtotal),
            code: voucher.code,
        })
    }

    async fn consume_voucher(&self, voucher: &AppliedVoucher) -> OrderResult<()> {
        match self.vouchers.conditional_decrement_usage(voucher.id).await? {
            Decrement::Applied { remaining } => {
                debug!(voucher_id = voucher.id, remaining, "Voucher usage consumed");
                Ok(())
            }
            Decrement::NoRowsAffected => {
                debug!(voucher_id = voucher.id, "Voucher rejected: exhausted concurrently");
                Err(OrderError::VoucherUsageExceeded)
            }
        }
    }
}

fn receipt_from_order(order: Order) -> Receipt {
    Receipt {
        id: order.id,
        total: money::subtotal(&order.items),
        items: order.items,
        status: order.status,
    }
}
