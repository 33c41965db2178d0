//! Shopping cart types.
//!
//! The cart is an ordered list of lines on the wire and in storage, and a
//! map keyed by product internally so each product appears at most once.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use tripmate_core::ProductId;

use super::Product;

/// One (product, quantity) pairing in a user's cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product: ProductId,
    pub quantity: u32,
}

/// What [`Cart::set_quantity`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new line was appended.
    Added,
    /// An existing line had its quantity replaced.
    Updated { previous: u32 },
}

/// A user's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<CartLine>", into = "Vec<CartLine>")]
pub struct Cart {
    lines: Vec<CartLine>,
    index: HashMap<ProductId, usize>,
}

impl Cart {
    /// Empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Quantity of `product`, if it has a line.
    #[must_use]
    pub fn quantity_of(&self, product: ProductId) -> Option<u32> {
        self.index
            .get(&product)
            .and_then(|&i| self.lines.get(i))
            .map(|line| line.quantity)
    }

    /// Set the quantity for `product`, replacing any existing quantity.
    ///
    /// A new product is appended; an existing one keeps its position.
    pub fn set_quantity(&mut self, product: ProductId, quantity: u32) -> CartChange {
        if let Some(line) = self
            .index
            .get(&product)
            .and_then(|&i| self.lines.get_mut(i))
        {
            let previous = line.quantity;
            line.quantity = quantity;
            return CartChange::Updated { previous };
        }

        self.index.insert(product, self.lines.len());
        self.lines.push(CartLine { product, quantity });
        CartChange::Added
    }

    /// Remove the line for `product`. Other lines keep their relative order.
    pub fn remove(&mut self, product: ProductId) -> Option<CartLine> {
        let position = self.index.remove(&product)?;
        let line = self.lines.remove(position);
        for slot in self.index.values_mut() {
            if *slot > position {
                *slot -= 1;
            }
        }
        Some(line)
    }
}

impl From<Vec<CartLine>> for Cart {
    /// Build from stored lines. A repeated product keeps its first position
    /// and its last quantity.
    fn from(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            cart.set_quantity(line.product, line.quantity);
        }
        cart
    }
}

impl From<Cart> for Vec<CartLine> {
    fn from(cart: Cart) -> Self {
        cart.lines
    }
}

/// A cart line with its product populated, returned by `GET /cart`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartEntry {
    pub product: Product,
    pub quantity: u32,
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_set_quantity_appends_then_replaces() {
        let p = ProductId::generate();
        let mut cart = Cart::new();

        assert_eq!(cart.set_quantity(p, 2), CartChange::Added);
        assert_eq!(
            cart.set_quantity(p, 3),
            CartChange::Updated { previous: 2 }
        );
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(p), Some(3));
    }

    #[test]
    fn test_replace_keeps_position() {
        let (a, b, c) = (
            ProductId::generate(),
            ProductId::generate(),
            ProductId::generate(),
        );
        let mut cart = Cart::new();
        cart.set_quantity(a, 1);
        cart.set_quantity(b, 1);
        cart.set_quantity(c, 1);
        cart.set_quantity(a, 9);

        let order: Vec<_> = cart.lines().iter().map(|l| l.product).collect();
        assert_eq!(order, vec![a, b, c]);
        assert_eq!(cart.lines()[0].quantity, 9);
    }

    #[test]
    fn test_remove_leaves_other_lines_untouched() {
        let (a, b, c) = (
            ProductId::generate(),
            ProductId::generate(),
            ProductId::generate(),
        );
        let mut cart = Cart::new();
        cart.set_quantity(a, 1);
        cart.set_quantity(b, 2);
        cart.set_quantity(c, 3);

        let removed = cart.remove(b).unwrap();
        assert_eq!(removed.quantity, 2);
        assert_eq!(
            cart.lines(),
            &[
                CartLine {
                    product: a,
                    quantity: 1
                },
                CartLine {
                    product: c,
                    quantity: 3
                },
            ]
        );
        // Index still points at the right lines after the shift.
        assert_eq!(cart.quantity_of(c), Some(3));
        assert!(cart.remove(b).is_none());
    }

    #[test]
    fn test_wire_form_is_ordered_array() {
        let (a, b) = (ProductId::generate(), ProductId::generate());
        let mut cart = Cart::new();
        cart.set_quantity(a, 1);
        cart.set_quantity(b, 4);

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json[1]["product"], b.to_string());
        assert_eq!(json[1]["quantity"], 4);

        let back: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(back, cart);
    }

    #[test]
    fn test_duplicate_stored_lines_collapse() {
        let p = ProductId::generate();
        let cart = Cart::from(vec![
            CartLine {
                product: p,
                quantity: 1,
            },
            CartLine {
                product: p,
                quantity: 5,
            },
        ]);
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.quantity_of(p), Some(5));
    }
}
