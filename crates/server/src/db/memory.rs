//! In-process store implementing every store trait.
//!
//! Backs `STORE_BACKEND=memory` and the test suites. Behaves like the
//! `PostgreSQL` stores: unique usernames, emails and tag names, cascading
//! deletes into carts, populated reads.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use tripmate_core::{
    AccountType, ActivityId, ItineraryId, MuseumId, ProductId, TagId, UserId,
};

use super::activities::ActivityRecord;
use super::itineraries::ItineraryRecord;
use super::{
    ActivityStore, CartStore, ItineraryStore, MuseumStore, ProductStore, RepositoryError,
    TagStore, UserStore, name_matches, populate_tags,
};
use crate::models::{
    Activity, ActivityFilter, ActivityInput, ActivityUpdate, Cart, CartLine, Itinerary,
    ItineraryFilter, ItineraryInput, ItineraryUpdate, Museum, MuseumInput, MuseumUpdate, NewUser,
    Product, ProductFilter, ProductInput, ProductUpdate, Review, Tag, TagInput, User, UserUpdate,
};

#[derive(Default)]
struct Data {
    users: Vec<User>,
    products: Vec<Product>,
    carts: HashMap<UserId, Cart>,
    museums: Vec<Museum>,
    activities: Vec<ActivityRecord>,
    itineraries: Vec<ItineraryRecord>,
    tags: Vec<Tag>,
}

impl Data {
    fn tag_lookup(&self) -> HashMap<TagId, Tag> {
        self.tags.iter().map(|t| (t.id, t.clone())).collect()
    }

    fn activity(&self, record: &ActivityRecord) -> Activity {
        record.clone().populate(&self.tag_lookup())
    }

    fn itinerary(&self, record: &ItineraryRecord) -> Itinerary {
        let tags = self.tag_lookup();
        let activities: HashMap<ActivityId, Activity> = self
            .activities
            .iter()
            .map(|a| (a.id, a.clone().populate(&tags)))
            .collect();
        record.clone().populate(&tags, &activities)
    }

    fn user_mut(&mut self, id: UserId) -> Result<&mut User, RepositoryError> {
        self.users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(RepositoryError::NotFound)
    }

    fn product_mut(&mut self, id: ProductId) -> Result<&mut Product, RepositoryError> {
        self.products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)
    }

    fn museum_mut(&mut self, id: MuseumId) -> Result<&mut Museum, RepositoryError> {
        self.museums
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(RepositoryError::NotFound)
    }

    fn activity_mut(&mut self, id: ActivityId) -> Result<&mut ActivityRecord, RepositoryError> {
        self.activities
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)
    }

    fn itinerary_mut(&mut self, id: ItineraryId) -> Result<&mut ItineraryRecord, RepositoryError> {
        self.itineraries
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(RepositoryError::NotFound)
    }
}

/// Remove the first element matching `pred`, or `NotFound`.
fn remove_where<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> Result<T, RepositoryError> {
    let position = items
        .iter()
        .position(pred)
        .ok_or(RepositoryError::NotFound)?;
    Ok(items.remove(position))
}

/// In-memory implementation of all store traits.
#[derive(Default)]
pub struct MemoryStore {
    data: RwLock<Data>,
    calls: AtomicUsize,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store operations served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn count(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User, RepositoryError> {
        self.count();
        let mut data = self.data.write().await;

        let taken = data.users.iter().any(|u| {
            u.username == user.username || (user.email.is_some() && u.email == user.email)
        });
        if taken {
            return Err(RepositoryError::Conflict(
                "username or email already exists".to_owned(),
            ));
        }

        let now = Utc::now();
        let created = User {
            id: UserId::generate(),
            account_type: user.account_type,
            accepted: user.accepted,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            profile: user.profile,
            wallet: rust_decimal::Decimal::ZERO,
            loyalty_points: 0,
            created_at: now,
            updated_at: now,
        };
        data.users.push(created.clone());
        Ok(created)
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        Ok(data.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_by_login(&self, login: &str) -> Result<Option<User>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        let found = if login.contains('@') {
            data.users.iter().find(|u| {
                u.email
                    .as_ref()
                    .is_some_and(|e| e.as_str().eq_ignore_ascii_case(login.trim()))
            })
        } else {
            data.users.iter().find(|u| u.username == login)
        };
        Ok(found.cloned())
    }

    async fn list(&self, account_type: Option<AccountType>) -> Result<Vec<User>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        Ok(data
            .users
            .iter()
            .filter(|u| account_type.is_none_or(|t| u.account_type == t))
            .cloned()
            .collect())
    }

    async fn update(&self, id: UserId, update: UserUpdate) -> Result<User, RepositoryError> {
        self.count();
        let mut data = self.data.write().await;

        if let Some(email) = &update.email
            && data
                .users
                .iter()
                .any(|u| u.id != id && u.email.as_ref() == Some(email))
        {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let user = data.user_mut(id)?;
        if let Some(email) = update.email {
            user.email = Some(email);
        }
        if let Some(hash) = update.password_hash {
            user.password_hash = hash;
        }
        update.profile.apply(&mut user.profile);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_accepted(&self, id: UserId, accepted: bool) -> Result<User, RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        let user = data.user_mut(id)?;
        user.accepted = accepted;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete(&self, id: UserId) -> Result<(), RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        remove_where(&mut data.users, |u| u.id == id)?;
        data.carts.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        Ok(data
            .products
            .iter()
            .filter(|p| name_matches(&p.name, filter.name.as_deref()))
            .filter(|p| filter.seller.is_none_or(|s| p.seller_id == s))
            .cloned()
            .collect())
    }

    async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        Ok(data.products.iter().find(|p| p.id == id).cloned())
    }

    async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        Ok(data
            .products
            .iter()
            .filter(|p| ids.contains(&p.id))
            .cloned()
            .collect())
    }

    async fn create(
        &self,
        seller: UserId,
        input: ProductInput,
    ) -> Result<Product, RepositoryError> {
        self.count();
        let now = Utc::now();
        let product = Product {
            id: ProductId::generate(),
            name: input.name,
            description: input.description,
            picture: input.picture,
            price: input.price,
            available_quantity: input.available_quantity,
            seller_id: seller,
            reviews: Vec::new(),
            average_rating: None,
            archived: false,
            created_at: now,
            updated_at: now,
        };
        self.data.write().await.products.push(product.clone());
        Ok(product)
    }

    async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        let product = data.product_mut(id)?;
        update.apply(product);
        product.updated_at = Utc::now();
        Ok(product.clone())
    }

    async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        remove_where(&mut data.products, |p| p.id == id)?;
        for cart in data.carts.values_mut() {
            cart.remove(id);
        }
        Ok(())
    }

    async fn add_review(&self, id: ProductId, review: Review) -> Result<Product, RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        let product = data.product_mut(id)?;
        product.reviews.push(review);
        product.average_rating = Product::rating_average(&product.reviews);
        product.updated_at = Utc::now();
        Ok(product.clone())
    }
}

#[async_trait]
impl CartStore for MemoryStore {
    async fn get_cart(&self, user: UserId) -> Result<Option<Cart>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        if !data.users.iter().any(|u| u.id == user) {
            return Ok(None);
        }
        Ok(Some(data.carts.get(&user).cloned().unwrap_or_default()))
    }

    async fn put_line(&self, user: UserId, line: CartLine) -> Result<(), RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        let known = data.users.iter().any(|u| u.id == user)
            && data.products.iter().any(|p| p.id == line.product);
        if !known {
            return Err(RepositoryError::NotFound);
        }
        data.carts
            .entry(user)
            .or_default()
            .set_quantity(line.product, line.quantity);
        Ok(())
    }

    async fn remove_line(&self, user: UserId, product: ProductId) -> Result<bool, RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        Ok(data
            .carts
            .get_mut(&user)
            .and_then(|cart| cart.remove(product))
            .is_some())
    }
}

#[async_trait]
impl MuseumStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Museum>, RepositoryError> {
        self.count();
        Ok(self.data.read().await.museums.clone())
    }

    async fn list_by_creator(&self, creator: UserId) -> Result<Vec<Museum>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        Ok(data
            .museums
            .iter()
            .filter(|m| m.created_by == creator)
            .cloned()
            .collect())
    }

    async fn list_by_tags(&self, tags: &[TagId]) -> Result<Vec<Museum>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        Ok(data
            .museums
            .iter()
            .filter(|m| m.tags.iter().any(|t| tags.contains(t)))
            .cloned()
            .collect())
    }

    async fn get(&self, id: MuseumId) -> Result<Option<Museum>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        Ok(data.museums.iter().find(|m| m.id == id).cloned())
    }

    async fn create(
        &self,
        creator: UserId,
        input: MuseumInput,
    ) -> Result<Museum, RepositoryError> {
        self.count();
        let now = Utc::now();
        let museum = Museum {
            id: MuseumId::generate(),
            name: input.name,
            description: input.description,
            location: input.location,
            opening_hours: input.opening_hours,
            pictures: input.pictures,
            ticket_prices: input.ticket_prices,
            tags: input.tags,
            created_by: creator,
            created_at: now,
            updated_at: now,
        };
        self.data.write().await.museums.push(museum.clone());
        Ok(museum)
    }

    async fn update(&self, id: MuseumId, update: MuseumUpdate) -> Result<Museum, RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        let museum = data.museum_mut(id)?;
        update.apply(museum);
        museum.updated_at = Utc::now();
        Ok(museum.clone())
    }

    async fn delete(&self, id: MuseumId) -> Result<(), RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        remove_where(&mut data.museums, |m| m.id == id)?;
        Ok(())
    }
}

#[async_trait]
impl ActivityStore for MemoryStore {
    async fn list(&self, filter: &ActivityFilter) -> Result<Vec<Activity>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        let tags = data.tag_lookup();
        Ok(data
            .activities
            .iter()
            .filter(|a| a.matches(filter))
            .map(|a| a.clone().populate(&tags))
            .collect())
    }

    async fn list_by_creator(&self, creator: UserId) -> Result<Vec<Activity>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        let tags = data.tag_lookup();
        Ok(data
            .activities
            .iter()
            .filter(|a| a.created_by == creator)
            .map(|a| a.clone().populate(&tags))
            .collect())
    }

    async fn get(&self, id: ActivityId) -> Result<Option<Activity>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        Ok(data
            .activities
            .iter()
            .find(|a| a.id == id)
            .map(|a| data.activity(a)))
    }

    async fn create(
        &self,
        creator: UserId,
        input: ActivityInput,
    ) -> Result<Activity, RepositoryError> {
        self.count();
        let record = ActivityRecord::new(creator, input);
        let mut data = self.data.write().await;
        let activity = data.activity(&record);
        data.activities.push(record);
        Ok(activity)
    }

    async fn update(
        &self,
        id: ActivityId,
        update: ActivityUpdate,
    ) -> Result<Activity, RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        let record = data.activity_mut(id)?;
        record.apply(update);
        let record = record.clone();
        Ok(data.activity(&record))
    }

    async fn delete(&self, id: ActivityId) -> Result<(), RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        remove_where(&mut data.activities, |a| a.id == id)?;
        Ok(())
    }

    async fn set_flagged(
        &self,
        id: ActivityId,
        flagged: bool,
    ) -> Result<Activity, RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        let record = data.activity_mut(id)?;
        record.flagged = flagged;
        record.updated_at = Utc::now();
        let record = record.clone();
        Ok(data.activity(&record))
    }
}

#[async_trait]
impl ItineraryStore for MemoryStore {
    async fn list(&self, filter: &ItineraryFilter) -> Result<Vec<Itinerary>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        Ok(data
            .itineraries
            .iter()
            .filter(|i| i.matches(filter))
            .map(|i| data.itinerary(i))
            .collect())
    }

    async fn list_by_creator(&self, creator: UserId) -> Result<Vec<Itinerary>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        Ok(data
            .itineraries
            .iter()
            .filter(|i| i.created_by == creator)
            .map(|i| data.itinerary(i))
            .collect())
    }

    async fn get(&self, id: ItineraryId) -> Result<Option<Itinerary>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        Ok(data
            .itineraries
            .iter()
            .find(|i| i.id == id)
            .map(|i| data.itinerary(i)))
    }

    async fn create(
        &self,
        creator: UserId,
        input: ItineraryInput,
    ) -> Result<Itinerary, RepositoryError> {
        self.count();
        let record = ItineraryRecord::new(creator, input);
        let mut data = self.data.write().await;
        let itinerary = data.itinerary(&record);
        data.itineraries.push(record);
        Ok(itinerary)
    }

    async fn update(
        &self,
        id: ItineraryId,
        update: ItineraryUpdate,
    ) -> Result<Itinerary, RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        let record = data.itinerary_mut(id)?;
        record.apply(update);
        let record = record.clone();
        Ok(data.itinerary(&record))
    }

    async fn delete(&self, id: ItineraryId) -> Result<(), RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        remove_where(&mut data.itineraries, |i| i.id == id)?;
        Ok(())
    }

    async fn set_flagged(
        &self,
        id: ItineraryId,
        flagged: bool,
    ) -> Result<Itinerary, RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        let record = data.itinerary_mut(id)?;
        record.flagged = flagged;
        record.updated_at = Utc::now();
        let record = record.clone();
        Ok(data.itinerary(&record))
    }

    async fn set_active(
        &self,
        id: ItineraryId,
        active: bool,
    ) -> Result<Itinerary, RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        let record = data.itinerary_mut(id)?;
        record.active = active;
        record.updated_at = Utc::now();
        let record = record.clone();
        Ok(data.itinerary(&record))
    }
}

#[async_trait]
impl TagStore for MemoryStore {
    async fn list(&self) -> Result<Vec<Tag>, RepositoryError> {
        self.count();
        let mut tags = self.data.read().await.tags.clone();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn get_many(&self, ids: &[TagId]) -> Result<Vec<Tag>, RepositoryError> {
        self.count();
        let data = self.data.read().await;
        Ok(populate_tags(ids, &data.tag_lookup()))
    }

    async fn create(&self, input: TagInput) -> Result<Tag, RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        let name = input.name.trim().to_owned();
        if data.tags.iter().any(|t| t.name == name) {
            return Err(RepositoryError::Conflict("tag already exists".to_owned()));
        }
        let tag = Tag {
            id: TagId::generate(),
            name,
            kind: input.kind,
        };
        data.tags.push(tag.clone());
        Ok(tag)
    }

    async fn delete(&self, id: TagId) -> Result<(), RepositoryError> {
        self.count();
        let mut data = self.data.write().await;
        remove_where(&mut data.tags, |t| t.id == id)?;
        Ok(())
    }
}
