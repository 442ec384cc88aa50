//! Cart line items

use rusty_money::{Money, MoneyError, iso::Currency};
use slotmap::new_key_type;
use uuid::Uuid;

new_key_type! {
    /// Line item key
    pub struct LineItemKey;
}

/// Print customization attached to a line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Customization {
    /// Free text printed on the item.
    pub text: Option<String>,

    /// Reference to an uploaded image.
    pub image: Option<String>,
}

impl Customization {
    /// Whether nothing has been customized.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.image.is_none()
    }
}

/// A product line in a cart.
///
/// The unit price is snapshotted when the line is created: base price plus variant
/// adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLineItem<'a> {
    product: Uuid,
    variant: Option<Uuid>,
    category: Option<Uuid>,
    quantity: u32,
    unit_price: Money<'a, Currency>,
    customization: Option<Customization>,
}

impl<'a> CartLineItem<'a> {
    /// Create a new line of one unit.
    pub fn new(product: Uuid, unit_price: Money<'a, Currency>) -> Self {
        Self {
            product,
            variant: None,
            category: None,
            quantity: 1,
            unit_price,
            customization: None,
        }
    }

    /// Create a line priced from a base price and a variant adjustment.
    ///
    /// The sum is not checked for sign here; carts refuse negative unit prices.
    ///
    /// # Errors
    ///
    /// Returns a [`MoneyError`] when the two amounts are in different currencies.
    pub fn priced(
        product: Uuid,
        base_price: Money<'a, Currency>,
        adjustment: Money<'a, Currency>,
    ) -> Result<Self, MoneyError> {
        Ok(Self::new(product, base_price.add(adjustment)?))
    }

    /// Sets the variant.
    #[must_use]
    pub fn with_variant(mut self, variant: Uuid) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: Uuid) -> Self {
        self.category = Some(category);
        self
    }

    /// Sets the quantity. Carts refuse lines with a quantity of zero.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Sets the customization. Empty customizations are dropped.
    #[must_use]
    pub fn with_customization(mut self, customization: Customization) -> Self {
        self.customization = (!customization.is_empty()).then_some(customization);
        self
    }

    /// Returns the product id.
    pub fn product(&self) -> Uuid {
        self.product
    }

    /// Returns the variant id, if any.
    pub fn variant(&self) -> Option<Uuid> {
        self.variant
    }

    /// Returns the category id, if any.
    pub fn category(&self) -> Option<Uuid> {
        self.category
    }

    /// Returns the quantity.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Returns the snapshotted unit price.
    pub fn unit_price(&self) -> &Money<'a, Currency> {
        &self.unit_price
    }

    /// Returns the customization, if any.
    pub fn customization(&self) -> Option<&Customization> {
        self.customization.as_ref()
    }

    /// Whether `other` describes the same purchasable thing, so the lines can be merged.
    pub fn same_configuration(&self, other: &Self) -> bool {
        self.product == other.product
            && self.variant == other.variant
            && self.customization == other.customization
            && self.unit_price == other.unit_price
    }

    /// Unit price times quantity, in minor units.
    ///
    /// Returns `None` on overflow.
    pub fn line_total_minor(&self) -> Option<i64> {
        self.unit_price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}
