use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

/// Identifier wrapper for property listings.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OfferId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyTypeId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PropertyTagId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InvoiceId(pub String);

/// Prospective buyer or offer partner, owned by the surrounding contact book.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PartnerId(pub String);

/// Agency user responsible for the listing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SalespersonId(pub String);

/// Lifecycle of a listing from publication to sale or cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyState {
    New,
    OfferReceived,
    OfferAccepted,
    Sold,
    Canceled,
}

impl PropertyState {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::New,
            Self::OfferReceived,
            Self::OfferAccepted,
            Self::Sold,
            Self::Canceled,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::OfferReceived => "offer_received",
            Self::OfferAccepted => "offer_accepted",
            Self::Sold => "sold",
            Self::Canceled => "canceled",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::OfferReceived => "Offer Received",
            Self::OfferAccepted => "Offer Accepted",
            Self::Sold => "Sold",
            Self::Canceled => "Canceled",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Sold | Self::Canceled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GardenOrientation {
    North,
    South,
    East,
    West,
}

/// Stored listing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub id: PropertyId,
    pub name: String,
    pub description: Option<String>,
    pub postcode: Option<String>,
    pub date_availability: NaiveDate,
    pub expected_price: f64,
    pub selling_price: f64,
    pub bedrooms: u32,
    pub living_area: u32,
    pub facades: u32,
    pub garage: bool,
    pub garden: bool,
    pub garden_area: u32,
    pub garden_orientation: Option<GardenOrientation>,
    pub active: bool,
    pub state: PropertyState,
    pub property_type_id: Option<PropertyTypeId>,
    pub buyer_id: Option<PartnerId>,
    pub seller_id: Option<SalespersonId>,
    pub tag_ids: BTreeSet<PropertyTagId>,
}

impl Property {
    pub fn total_area(&self) -> u32 {
        self.living_area.saturating_add(self.garden_area)
    }

    /// Apply the garden toggle, seeding or clearing the garden details.
    pub fn set_garden(&mut self, garden: bool) {
        self.garden = garden;
        if garden {
            self.garden_area = 10;
            self.garden_orientation = Some(GardenOrientation::North);
        } else {
            self.garden_area = 0;
            self.garden_orientation = None;
        }
    }

    /// Drop everything an accepted offer wrote onto the listing.
    pub fn clear_sale(&mut self) {
        self.selling_price = 0.0;
        self.buyer_id = None;
    }
}

fn default_bedrooms() -> u32 {
    2
}

fn default_active() -> bool {
    true
}

/// Client supplied fields for a new listing. Sale fields are never accepted from clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub postcode: Option<String>,
    #[serde(default)]
    pub date_availability: Option<NaiveDate>,
    pub expected_price: f64,
    #[serde(default = "default_bedrooms")]
    pub bedrooms: u32,
    #[serde(default)]
    pub living_area: u32,
    #[serde(default)]
    pub facades: u32,
    #[serde(default)]
    pub garage: bool,
    #[serde(default)]
    pub garden: bool,
    #[serde(default)]
    pub garden_area: u32,
    #[serde(default)]
    pub garden_orientation: Option<GardenOrientation>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub property_type_id: Option<PropertyTypeId>,
    #[serde(default)]
    pub seller_id: Option<SalespersonId>,
    #[serde(default)]
    pub tag_ids: BTreeSet<PropertyTagId>,
}

impl PropertyDraft {
    pub fn new(name: impl Into<String>, expected_price: f64) -> Self {
        Self {
            name: name.into(),
            description: None,
            postcode: None,
            date_availability: None,
            expected_price,
            bedrooms: default_bedrooms(),
            living_area: 0,
            facades: 0,
            garage: false,
            garden: false,
            garden_area: 0,
            garden_orientation: None,
            active: true,
            property_type_id: None,
            seller_id: None,
            tag_ids: BTreeSet::new(),
        }
    }
}

/// Partial update of the editable listing fields.
///
/// Clearable fields are doubly optional: an absent key leaves the value alone while an
/// explicit `null` clears it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyPatch {
    pub name: Option<String>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub postcode: Option<Option<String>>,
    pub date_availability: Option<NaiveDate>,
    pub expected_price: Option<f64>,
    pub bedrooms: Option<u32>,
    pub living_area: Option<u32>,
    pub facades: Option<u32>,
    pub garage: Option<bool>,
    pub garden_area: Option<u32>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub garden_orientation: Option<Option<GardenOrientation>>,
    pub active: Option<bool>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub property_type_id: Option<Option<PropertyTypeId>>,
    #[serde(deserialize_with = "clearable", skip_serializing_if = "Option::is_none")]
    pub seller_id: Option<Option<SalespersonId>>,
    pub tag_ids: Option<BTreeSet<PropertyTagId>>,
}

/// Only called when the key is present, so `null` becomes `Some(None)`.
fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl PropertyPatch {
    pub(crate) fn apply(self, property: &mut Property) {
        if let Some(name) = self.name {
            property.name = name;
        }
        if let Some(description) = self.description {
            property.description = description;
        }
        if let Some(postcode) = self.postcode {
            property.postcode = postcode;
        }
        if let Some(date) = self.date_availability {
            property.date_availability = date;
        }
        if let Some(price) = self.expected_price {
            property.expected_price = price;
        }
        if let Some(bedrooms) = self.bedrooms {
            property.bedrooms = bedrooms;
        }
        if let Some(area) = self.living_area {
            property.living_area = area;
        }
        if let Some(facades) = self.facades {
            property.facades = facades;
        }
        if let Some(garage) = self.garage {
            property.garage = garage;
        }
        if let Some(area) = self.garden_area {
            property.garden_area = area;
        }
        if let Some(orientation) = self.garden_orientation {
            property.garden_orientation = orientation;
        }
        if let Some(active) = self.active {
            property.active = active;
        }
        if let Some(type_id) = self.property_type_id {
            property.property_type_id = type_id;
        }
        if let Some(seller) = self.seller_id {
            property.seller_id = seller;
        }
        if let Some(tags) = self.tag_ids {
            property.tag_ids = tags;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferStatus {
    Accepted,
    Refused,
}

impl OfferStatus {
    pub const fn label(status: Option<Self>) -> &'static str {
        match status {
            Some(Self::Accepted) => "accepted",
            Some(Self::Refused) => "refused",
            None => "pending",
        }
    }
}

/// Bid submitted by a prospective buyer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offer {
    pub id: OfferId,
    pub price: f64,
    pub status: Option<OfferStatus>,
    pub validity_days: i64,
    pub created_on: NaiveDate,
    pub partner_id: PartnerId,
    pub property_id: PropertyId,
    /// Copy of the listing's type so offers can be counted per type.
    pub property_type_id: Option<PropertyTypeId>,
}

impl Offer {
    /// Longest validity window a bid may carry.
    pub const MAX_VALIDITY_DAYS: i64 = 3650;

    /// `None` when the window runs past the calendar.
    pub fn checked_deadline(&self) -> Option<NaiveDate> {
        Duration::try_days(self.validity_days)
            .and_then(|window| self.created_on.checked_add_signed(window))
    }

    pub fn deadline(&self) -> NaiveDate {
        self.checked_deadline().unwrap_or(if self.validity_days < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
    }

    /// Move the deadline, keeping the creation date and recomputing the validity window.
    pub fn set_deadline(&mut self, deadline: NaiveDate) {
        self.validity_days = (deadline - self.created_on).num_days();
    }

    pub fn is_accepted(&self) -> bool {
        self.status == Some(OfferStatus::Accepted)
    }
}

/// Lookup record classifying listings (house, apartment, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyType {
    pub id: PropertyTypeId,
    pub name: String,
    pub sequence: i32,
}

/// Free-form label attached to listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyTag {
    pub id: PropertyTagId,
    pub name: String,
    pub color: u32,
}
