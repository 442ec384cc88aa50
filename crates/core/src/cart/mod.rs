//! Cart
//!
//! In-memory cart: line items keyed by [`LineItemKey`], an optional applied coupon and the
//! cart currency. The cart holds no totals; they are derived from the lines on every call.

use rusty_money::{Money, iso::Currency};
use slotmap::SlotMap;
use smallvec::SmallVec;
use thiserror::Error;

use crate::{
    coupons::{CartContents, Coupon},
    items::{CartLineItem, LineItemKey},
    pricing::{CartTotals, PricingError, ShippingPolicy, calculate_totals},
};

/// Errors from cart mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CartError {
    /// The line key does not belong to this cart.
    #[error("line item not found")]
    ItemNotFound,

    /// The line is priced in another currency.
    #[error("line priced in {line}, cart currency is {cart}")]
    CurrencyMismatch {
        /// ISO code of the line.
        line: &'static str,

        /// ISO code of the cart.
        cart: &'static str,
    },

    /// Coupons need at least one line to apply to.
    #[error("cannot apply a coupon to an empty cart")]
    EmptyCart,

    /// The cart has been checked out and can no longer change.
    #[error("cart has already been checked out")]
    CheckedOut,

    /// Merging quantities overflowed.
    #[error("quantity overflow")]
    QuantityOverflow,

    /// New lines need at least one unit.
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    /// Base price plus adjustment came out below zero.
    #[error("unit price cannot be negative")]
    NegativePrice,
}

/// Lifecycle state of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartState {
    /// No lines.
    Empty,

    /// Lines without a coupon.
    HasItems,

    /// Lines with an applied coupon.
    HasItemsWithCoupon,

    /// Checkout was submitted and the cart emptied.
    Cleared,
}

/// Cart
#[derive(Debug, Clone)]
pub struct Cart<'a> {
    items: SlotMap<LineItemKey, CartLineItem<'a>>,
    coupon: Option<Coupon<'a>>,
    currency: &'a Currency,
    checked_out: bool,
}

impl<'a> Cart<'a> {
    /// Create an empty cart in `currency`.
    pub fn new(currency: &'a Currency) -> Self {
        Self {
            items: SlotMap::with_key(),
            coupon: None,
            currency,
            checked_out: false,
        }
    }

    /// Cart currency.
    pub fn currency(&self) -> &'a Currency {
        self.currency
    }

    /// Current lifecycle state.
    pub fn state(&self) -> CartState {
        if self.checked_out {
            CartState::Cleared
        } else if self.items.is_empty() {
            CartState::Empty
        } else if self.coupon.is_some() {
            CartState::HasItemsWithCoupon
        } else {
            CartState::HasItems
        }
    }

    /// Add a line. A line with the same configuration is merged into the existing one.
    ///
    /// # Errors
    ///
    /// - [`CartError::CheckedOut`]: the cart was already checked out.
    /// - [`CartError::InvalidQuantity`]: the line has a quantity of zero.
    /// - [`CartError::NegativePrice`]: the unit price is below zero.
    /// - [`CartError::CurrencyMismatch`]: the line is priced in another currency.
    /// - [`CartError::QuantityOverflow`]: merging overflowed the quantity.
    pub fn add_item(&mut self, item: CartLineItem<'a>) -> Result<LineItemKey, CartError> {
        self.ensure_open()?;

        if item.quantity() == 0 {
            return Err(CartError::InvalidQuantity);
        }

        if item.unit_price().to_minor_units() < 0 {
            return Err(CartError::NegativePrice);
        }

        let line_currency = item.unit_price().currency();

        if line_currency != self.currency {
            return Err(CartError::CurrencyMismatch {
                line: line_currency.iso_alpha_code,
                cart: self.currency.iso_alpha_code,
            });
        }

        let existing = self
            .items
            .iter_mut()
            .find(|(_key, line)| line.same_configuration(&item));

        if let Some((key, line)) = existing {
            let quantity = line
                .quantity()
                .checked_add(item.quantity())
                .ok_or(CartError::QuantityOverflow)?;

            line.set_quantity(quantity);

            return Ok(key);
        }

        Ok(self.items.insert(item))
    }

    /// Set a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// - [`CartError::CheckedOut`]: the cart was already checked out.
    /// - [`CartError::ItemNotFound`]: unknown line key.
    pub fn set_quantity(&mut self, key: LineItemKey, quantity: u32) -> Result<(), CartError> {
        self.ensure_open()?;

        if quantity == 0 {
            return self.remove_item(key).map(|_removed| ());
        }

        let line = self.items.get_mut(key).ok_or(CartError::ItemNotFound)?;

        line.set_quantity(quantity);

        Ok(())
    }

    /// Remove a line. Removing the last line also drops the coupon.
    ///
    /// # Errors
    ///
    /// - [`CartError::CheckedOut`]: the cart was already checked out.
    /// - [`CartError::ItemNotFound`]: unknown line key.
    pub fn remove_item(&mut self, key: LineItemKey) -> Result<CartLineItem<'a>, CartError> {
        self.ensure_open()?;

        let removed = self.items.remove(key).ok_or(CartError::ItemNotFound)?;

        if self.items.is_empty() {
            self.coupon = None;
        }

        Ok(removed)
    }

    /// Get a line.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::ItemNotFound`] for an unknown line key.
    pub fn get_item(&self, key: LineItemKey) -> Result<&CartLineItem<'a>, CartError> {
        self.items.get(key).ok_or(CartError::ItemNotFound)
    }

    /// Iterate over lines.
    pub fn iter(&self) -> impl Iterator<Item = (LineItemKey, &CartLineItem<'a>)> {
        self.items.iter()
    }

    /// Number of lines.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Store a coupon that has already been validated against this cart.
    ///
    /// Replaces any previously applied coupon.
    ///
    /// # Errors
    ///
    /// - [`CartError::CheckedOut`]: the cart was already checked out.
    /// - [`CartError::EmptyCart`]: there are no lines.
    pub fn apply_coupon(&mut self, coupon: Coupon<'a>) -> Result<(), CartError> {
        self.ensure_open()?;

        if self.items.is_empty() {
            return Err(CartError::EmptyCart);
        }

        self.coupon = Some(coupon);

        Ok(())
    }

    /// Drop the applied coupon, returning it.
    pub fn remove_coupon(&mut self) -> Option<Coupon<'a>> {
        self.coupon.take()
    }

    /// Applied coupon, if any.
    pub fn coupon(&self) -> Option<&Coupon<'a>> {
        self.coupon.as_ref()
    }

    /// Products and categories in the cart, for coupon scoping.
    pub fn contents(&self) -> CartContents {
        let mut products: SmallVec<[_; 8]> = SmallVec::new();
        let mut categories: SmallVec<[_; 8]> = SmallVec::new();

        for line in self.items.values() {
            if !products.contains(&line.product()) {
                products.push(line.product());
            }

            if let Some(category) = line.category()
                && !categories.contains(&category)
            {
                categories.push(category);
            }
        }

        CartContents {
            products,
            categories,
        }
    }

    /// Sum of line totals.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] when the sum overflows.
    pub fn subtotal(&self) -> Result<Money<'a, Currency>, PricingError> {
        crate::pricing::subtotal(self.items.values(), self.currency)
    }

    /// Totals for the current lines and coupon.
    ///
    /// # Errors
    ///
    /// Returns a [`PricingError`] when any amount cannot be computed.
    pub fn totals(&self, policy: &ShippingPolicy<'a>) -> Result<CartTotals<'a>, PricingError> {
        calculate_totals(
            self.items.values(),
            self.coupon.as_ref(),
            policy,
            self.currency,
        )
    }

    /// Empty the cart and drop the coupon.
    pub fn clear(&mut self) {
        self.items.clear();
        self.coupon = None;
    }

    /// Clear the cart after a submitted checkout; further mutations are refused.
    pub fn mark_checked_out(&mut self) {
        self.clear();
        self.checked_out = true;
    }

    fn ensure_open(&self) -> Result<(), CartError> {
        if self.checked_out {
            Err(CartError::CheckedOut)
        } else {
            Ok(())
        }
    }
}
