//! Cart reconciliation.
//!
//! Keeps at most one line per product per user and rejects quantities the
//! product's stock cannot cover. Stock is read, never reserved: two
//! concurrent adds for the last unit can both succeed.

use thiserror::Error;
use tracing::instrument;

use tripmate_core::{CurrencyCode, ProductId, UserId};

use super::currency::{ConversionError, CurrencyConverter};
use super::pricing::Localizer;
use crate::db::{CartStore, ProductStore, RepositoryError};
use crate::models::{Cart, CartChange, CartEntry, CartLine};

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// The product to add does not exist.
    #[error("product not found")]
    ProductNotFound,

    /// The cart owner does not exist.
    #[error("user not found")]
    UserNotFound,

    /// The product has no line in the cart.
    #[error("product not found in cart")]
    LineNotFound,

    /// Quantity is not positive or exceeds stock.
    #[error("product not available in the requested quantity ({requested} requested, {available} in stock)")]
    InvalidQuantity { requested: i64, available: u32 },

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Price conversion failed.
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),
}

/// Outcome of [`CartService::add_product`].
#[derive(Debug)]
pub struct AddOutcome {
    pub change: CartChange,
    pub cart: Cart,
}

/// Cart service over the cart and product stores.
pub struct CartService<'a> {
    carts: &'a dyn CartStore,
    products: &'a dyn ProductStore,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(carts: &'a dyn CartStore, products: &'a dyn ProductStore) -> Self {
        Self { carts, products }
    }

    /// Add `product` to the user's cart, or replace its quantity if present.
    ///
    /// `quantity` is taken signed so that zero and negative requests are
    /// rejected as `InvalidQuantity` rather than failing to parse.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` if the product does not exist.
    /// Returns `CartError::InvalidQuantity` if `quantity <= 0` or exceeds stock;
    /// the cart is left unchanged.
    /// Returns `CartError::UserNotFound` if the user does not exist.
    #[instrument(skip(self), fields(user_id = %user, product_id = %product))]
    pub async fn add_product(
        &self,
        user: UserId,
        product: ProductId,
        quantity: i64,
    ) -> Result<AddOutcome, CartError> {
        let found = self
            .products
            .get(product)
            .await?
            .ok_or(CartError::ProductNotFound)?;

        let mut cart = self
            .carts
            .get_cart(user)
            .await?
            .ok_or(CartError::UserNotFound)?;

        let available = found.stock();
        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|&q| q > 0 && q <= available)
            .ok_or(CartError::InvalidQuantity {
                requested: quantity,
                available,
            })?;

        let change = cart.set_quantity(product, quantity);
        self.carts
            .put_line(user, CartLine { product, quantity })
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CartError::ProductNotFound,
                other => CartError::Repository(other),
            })?;

        tracing::info!(?change, quantity, "Cart line saved");
        Ok(AddOutcome { change, cart })
    }

    /// Remove the line for `product` from the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::LineNotFound` if the cart has no such line.
    /// Returns `CartError::UserNotFound` if the user does not exist.
    #[instrument(skip(self), fields(user_id = %user, product_id = %product))]
    pub async fn remove_product(&self, user: UserId, product: ProductId) -> Result<Cart, CartError> {
        let mut cart = self
            .carts
            .get_cart(user)
            .await?
            .ok_or(CartError::UserNotFound)?;

        if cart.remove(product).is_none() || !self.carts.remove_line(user, product).await? {
            return Err(CartError::LineNotFound);
        }

        Ok(cart)
    }

    /// The user's cart with products populated and priced in `currency`.
    ///
    /// Lines whose product no longer exists are skipped.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UserNotFound` if the user does not exist.
    /// Returns `CartError::Conversion` if any price fails to convert.
    #[instrument(skip(self, converter), fields(user_id = %user, currency = %currency))]
    pub async fn get_cart(
        &self,
        user: UserId,
        converter: &dyn CurrencyConverter,
        currency: CurrencyCode,
    ) -> Result<Vec<CartEntry>, CartError> {
        let cart = self
            .carts
            .get_cart(user)
            .await?
            .ok_or(CartError::UserNotFound)?;

        let ids: Vec<ProductId> = cart.lines().iter().map(|l| l.product).collect();
        let mut products = self.products.get_many(&ids).await?;

        let entries: Vec<CartEntry> = cart
            .lines()
            .iter()
            .filter_map(|line| {
                let position = products.iter().position(|p| p.id == line.product)?;
                Some(CartEntry {
                    product: products.swap_remove(position),
                    quantity: line.quantity,
                })
            })
            .collect();

        Ok(Localizer::new(converter, currency)
            .cart_entries(entries)
            .await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashMap;

    use rust_decimal::Decimal;
    use tripmate_core::AccountType;

    use super::*;
    use crate::db::{MemoryStore, UserStore};
    use crate::models::{NewUser, Profile, ProductInput};
    use crate::services::currency::FixedRates;

    struct Fixture {
        store: MemoryStore,
        user: UserId,
    }

    impl Fixture {
        async fn new() -> Self {
            let store = MemoryStore::new();
            let user = UserStore::create(
                &store,
                NewUser {
                    account_type: AccountType::Tourist,
                    username: "yara".to_owned(),
                    email: None,
                    password_hash: "hash".to_owned(),
                    accepted: true,
                    profile: Profile::default(),
                },
            )
            .await
            .unwrap();
            Self {
                store,
                user: user.id,
            }
        }

        async fn product(&self, price: Option<i64>, stock: Option<u32>) -> ProductId {
            ProductStore::create(
                &self.store,
                self.user,
                ProductInput {
                    name: "Papyrus".to_owned(),
                    description: None,
                    picture: None,
                    price: price.map(Decimal::from),
                    available_quantity: stock,
                },
            )
            .await
            .unwrap()
            .id
        }

        fn service(&self) -> CartService<'_> {
            CartService::new(&self.store, &self.store)
        }

        async fn stored_cart(&self) -> Cart {
            self.store.get_cart(self.user).await.unwrap().unwrap()
        }
    }

    #[tokio::test]
    async fn test_stock_three_scenario() {
        let f = Fixture::new().await;
        let p = f.product(Some(100), Some(3)).await;
        let service = f.service();

        let added = service.add_product(f.user, p, 2).await.unwrap();
        assert_eq!(added.change, CartChange::Added);
        assert_eq!(added.cart.lines(), &[CartLine { product: p, quantity: 2 }]);

        let err = service.add_product(f.user, p, 5).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::InvalidQuantity {
                requested: 5,
                available: 3
            }
        ));
        assert_eq!(
            f.stored_cart().await.lines(),
            &[CartLine { product: p, quantity: 2 }]
        );

        let replaced = service.add_product(f.user, p, 3).await.unwrap();
        assert_eq!(replaced.change, CartChange::Updated { previous: 2 });
        assert_eq!(
            f.stored_cart().await.lines(),
            &[CartLine { product: p, quantity: 3 }]
        );
    }

    #[tokio::test]
    async fn test_non_positive_quantity_rejected() {
        let f = Fixture::new().await;
        let p = f.product(Some(10), Some(10)).await;
        let service = f.service();

        for quantity in [0, -1, i64::MIN] {
            let err = service.add_product(f.user, p, quantity).await.unwrap_err();
            assert!(matches!(err, CartError::InvalidQuantity { .. }));
        }
        assert!(f.stored_cart().await.is_empty());
    }

    #[tokio::test]
    async fn test_unset_stock_counts_as_zero() {
        let f = Fixture::new().await;
        let p = f.product(Some(10), None).await;

        let err = f.service().add_product(f.user, p, 1).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::InvalidQuantity { available: 0, .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_product() {
        let f = Fixture::new().await;
        let err = f
            .service()
            .add_product(f.user, ProductId::generate(), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::ProductNotFound));
    }

    #[tokio::test]
    async fn test_remove_only_touches_one_line() {
        let f = Fixture::new().await;
        let (a, b, c) = (
            f.product(Some(1), Some(5)).await,
            f.product(Some(2), Some(5)).await,
            f.product(Some(3), Some(5)).await,
        );
        let service = f.service();
        for (p, q) in [(a, 1), (b, 2), (c, 3)] {
            service.add_product(f.user, p, q).await.unwrap();
        }

        let cart = service.remove_product(f.user, b).await.unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(
            f.stored_cart().await.lines(),
            &[
                CartLine { product: a, quantity: 1 },
                CartLine { product: c, quantity: 3 },
            ]
        );

        let err = service.remove_product(f.user, b).await.unwrap_err();
        assert!(matches!(err, CartError::LineNotFound));
        assert_eq!(f.stored_cart().await.len(), 2);
    }

    #[tokio::test]
    async fn test_get_cart_localizes_without_mutating() {
        let f = Fixture::new().await;
        let priced = f.product(Some(100), Some(5)).await;
        let free = f.product(None, Some(5)).await;
        let service = f.service();
        service.add_product(f.user, priced, 1).await.unwrap();
        service.add_product(f.user, free, 2).await.unwrap();

        let converter = FixedRates::new(
            CurrencyCode::EGP,
            HashMap::from([(CurrencyCode::EUR, "0.9".parse().unwrap())]),
        );
        let entries = service
            .get_cart(f.user, &converter, CurrencyCode::EUR)
            .await
            .unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].product.price, Some(Decimal::from(90)));
        assert_eq!(entries[1].product.price, Some(Decimal::ZERO));
        assert_eq!(entries[1].quantity, 2);

        let stored = ProductStore::get(&f.store, priced).await.unwrap().unwrap();
        assert_eq!(stored.price, Some(Decimal::from(100)));
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let f = Fixture::new().await;
        let err = f
            .service()
            .remove_product(UserId::generate(), ProductId::generate())
            .await
            .unwrap_err();
        assert!(matches!(err, CartError::UserNotFound));
    }
}
