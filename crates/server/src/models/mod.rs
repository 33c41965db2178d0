//! Domain models.
//!
//! These are validated domain types, separate from database row types. They
//! double as the JSON bodies the API returns; request bodies that differ from
//! the stored shape (`*Input`, `*Update`) live next to the type they create.

pub mod activity;
pub mod cart;
pub mod itinerary;
pub mod museum;
pub mod product;
pub mod session;
pub mod tag;
pub mod user;

pub use activity::{Activity, ActivityFilter, ActivityInput, ActivityUpdate};
pub use cart::{Cart, CartChange, CartEntry, CartLine};
pub use itinerary::{
    Itinerary, ItineraryFilter, ItineraryInput, ItineraryStop, ItineraryUpdate, StopRef,
};
pub use museum::{Museum, MuseumInput, MuseumUpdate, TicketPrices};
pub use product::{Product, ProductFilter, ProductInput, ProductUpdate, Review};
pub use session::{CurrentUser, keys as session_keys};
pub use tag::{Tag, TagInput};
pub use user::{NewUser, Profile, ProfileUpdate, User, UserUpdate};
