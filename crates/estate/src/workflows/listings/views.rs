use chrono::NaiveDate;
use serde::Serialize;

use super::domain::{Offer, Property, PropertyTag, PropertyType};
use super::validation::best_price;

/// Offer as exposed to clients, with its derived deadline.
#[derive(Debug, Clone, Serialize)]
pub struct OfferView {
    #[serde(flatten)]
    pub offer: Offer,
    pub deadline: NaiveDate,
    pub status_label: &'static str,
}

impl From<Offer> for OfferView {
    fn from(offer: Offer) -> Self {
        Self {
            deadline: offer.deadline(),
            status_label: super::domain::OfferStatus::label(offer.status),
            offer,
        }
    }
}

/// Listing with its computed figures and offers, best bid first.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyView {
    #[serde(flatten)]
    pub property: Property,
    pub state_label: &'static str,
    pub total_area: u32,
    pub best_price: f64,
    pub offers: Vec<OfferView>,
}

impl PropertyView {
    pub fn new(property: Property, mut offers: Vec<Offer>) -> Self {
        offers.sort_by(|left, right| right.price.total_cmp(&left.price));
        Self {
            state_label: property.state.display_name(),
            total_area: property.total_area(),
            best_price: best_price(&offers),
            offers: offers.into_iter().map(OfferView::from).collect(),
            property,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyTypeView {
    #[serde(flatten)]
    pub property_type: PropertyType,
    pub offer_count: usize,
    pub property_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PropertyTagView {
    #[serde(flatten)]
    pub tag: PropertyTag,
}

impl From<PropertyTag> for PropertyTagView {
    fn from(tag: PropertyTag) -> Self {
        Self { tag }
    }
}
