use serde::{Deserialize, Serialize};

use super::domain::{Offer, PropertyState};

/// Business rule violations. Each message is meant to be shown to the end user as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ListingError {
    #[error("Sold properties cannot be cancelled.")]
    CancelSold,
    #[error("Cancelled properties cannot be sold.")]
    SellCanceled,
    #[error("Only new and cancelled properties can be deleted (current state: {0}).")]
    DeleteInProgress(&'static str),
    #[error("Sold or cancelled properties cannot change their offers.")]
    PropertyClosed,
    #[error("Only one offer can be accepted for a property.")]
    OfferAlreadyAccepted,
    #[error("The offer price ({offered:.2}) must be higher than the existing offers ({best:.2}).")]
    OfferBelowBest { offered: f64, best: f64 },
    #[error("The offer price must be strictly positive.")]
    NonPositiveOfferPrice,
    #[error(
        "The offer validity must be between 0 and {} days (got {days}).",
        Offer::MAX_VALIDITY_DAYS
    )]
    InvalidValidity { days: i64 },
    #[error("The expected price must be strictly positive.")]
    NonPositiveExpectedPrice,
    #[error("The selling price must be positive.")]
    NegativeSellingPrice,
    #[error(
        "The selling price ({selling:.2}) must be at least {percent}% of the expected price ({expected:.2}). Reduce the expected price to accept this offer."
    )]
    SellingPriceTooLow {
        selling: f64,
        expected: f64,
        percent: u32,
    },
    #[error("The {0} is required.")]
    MissingField(&'static str),
    #[error("The property type name must be unique.")]
    DuplicateTypeName,
    #[error("The property tag name must be unique.")]
    DuplicateTagName,
    #[error("Unknown {kind}: {id}")]
    UnknownReference { kind: &'static str, id: String },
}

/// What happens to the parent listing when one of its offers is deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferDeletionPolicy {
    /// Reset the listing to `new` whatever the deleted offer's status was.
    ResetAlways,
    /// Reset only when the deleted offer was the accepted one.
    ResetIfAccepted,
}

impl OfferDeletionPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "reset_always" | "always" => Some(Self::ResetAlways),
            "reset_if_accepted" | "accepted" => Some(Self::ResetIfAccepted),
            _ => None,
        }
    }

    pub fn resets_property(self, offer: &Offer) -> bool {
        match self {
            Self::ResetAlways => true,
            Self::ResetIfAccepted => offer.is_accepted(),
        }
    }
}

pub fn cancel(state: PropertyState) -> Result<PropertyState, ListingError> {
    match state {
        PropertyState::Sold => Err(ListingError::CancelSold),
        _ => Ok(PropertyState::Canceled),
    }
}

pub fn sell(state: PropertyState) -> Result<PropertyState, ListingError> {
    match state {
        PropertyState::Canceled => Err(ListingError::SellCanceled),
        _ => Ok(PropertyState::Sold),
    }
}

pub fn ensure_deletable(state: PropertyState) -> Result<(), ListingError> {
    match state {
        PropertyState::New | PropertyState::Canceled => Ok(()),
        other => Err(ListingError::DeleteInProgress(other.label())),
    }
}

/// Offers may still be recorded against a closed listing, but they no longer move it.
pub fn ensure_open(state: PropertyState) -> Result<(), ListingError> {
    if state.is_terminal() {
        Err(ListingError::PropertyClosed)
    } else {
        Ok(())
    }
}

pub fn receive_offer(state: PropertyState) -> PropertyState {
    match state {
        PropertyState::New => PropertyState::OfferReceived,
        other => other,
    }
}

pub fn accept_offer(state: PropertyState) -> Result<PropertyState, ListingError> {
    ensure_open(state)?;
    Ok(PropertyState::OfferAccepted)
}

pub fn revert_acceptance(state: PropertyState) -> Result<PropertyState, ListingError> {
    ensure_open(state)?;
    Ok(PropertyState::OfferReceived)
}

pub fn reset(state: PropertyState) -> Result<PropertyState, ListingError> {
    ensure_open(state)?;
    Ok(PropertyState::New)
}
