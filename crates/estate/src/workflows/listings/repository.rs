use super::domain::{
    Offer, OfferId, Property, PropertyId, PropertyTag, PropertyTagId, PropertyType,
    PropertyTypeId,
};

/// Storage abstraction so the listing service can be exercised in isolation.
///
/// Implementations enforce record identity only. Business rules, including the
/// "one accepted offer" rule, are checked by the service before writing.
pub trait ListingRepository: Send + Sync {
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError>;
    fn update_property(&self, property: Property) -> Result<(), RepositoryError>;
    fn fetch_property(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError>;
    fn delete_property(&self, id: &PropertyId) -> Result<(), RepositoryError>;
    fn properties(&self) -> Result<Vec<Property>, RepositoryError>;

    fn insert_offer(&self, offer: Offer) -> Result<Offer, RepositoryError>;
    fn update_offer(&self, offer: Offer) -> Result<(), RepositoryError>;
    fn fetch_offer(&self, id: &OfferId) -> Result<Option<Offer>, RepositoryError>;
    fn delete_offer(&self, id: &OfferId) -> Result<(), RepositoryError>;
    fn offers_for_property(&self, id: &PropertyId) -> Result<Vec<Offer>, RepositoryError>;
    fn offers(&self) -> Result<Vec<Offer>, RepositoryError>;

    fn insert_property_type(&self, record: PropertyType) -> Result<PropertyType, RepositoryError>;
    fn fetch_property_type(
        &self,
        id: &PropertyTypeId,
    ) -> Result<Option<PropertyType>, RepositoryError>;
    fn property_types(&self) -> Result<Vec<PropertyType>, RepositoryError>;

    fn insert_property_tag(&self, record: PropertyTag) -> Result<PropertyTag, RepositoryError>;
    fn fetch_property_tag(
        &self,
        id: &PropertyTagId,
    ) -> Result<Option<PropertyTag>, RepositoryError>;
    fn property_tags(&self) -> Result<Vec<PropertyTag>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
