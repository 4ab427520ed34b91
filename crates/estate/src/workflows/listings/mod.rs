//! Property listings, buyer offers, and the sale workflow that ties them together.
//!
//! Cascades between records (an offer moving its property forward, a deleted offer resetting
//! it, a sale producing an invoice) are explicit steps inside [`ListingService`] methods.

pub mod billing;
pub mod domain;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;
pub mod validation;
pub mod views;

#[cfg(test)]
mod tests;

pub use billing::{
    BillingError, InvoiceDraft, InvoiceGateway, InvoiceLine, InvoiceRecord, MoveType,
};
pub use domain::{
    GardenOrientation, InvoiceId, Offer, OfferId, OfferStatus, PartnerId, Property,
    PropertyDraft, PropertyId, PropertyPatch, PropertyState, PropertyTag, PropertyTagId,
    PropertyType, PropertyTypeId, SalespersonId,
};
pub use lifecycle::{ListingError, OfferDeletionPolicy};
pub use repository::{ListingRepository, RepositoryError};
pub use router::listing_router;
pub use service::{ListingService, ListingServiceError, OfferDraft, SaleOutcome};
pub use views::{OfferView, PropertyTagView, PropertyTypeView, PropertyView};
