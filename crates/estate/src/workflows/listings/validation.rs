use std::cmp::Ordering;

use chrono::NaiveDate;

use super::domain::{Offer, Property};
use super::lifecycle::ListingError;

/// Monetary amounts are compared at cent precision.
const PRICE_DIGITS: i32 = 2;

pub fn compare_prices(left: f64, right: f64) -> Ordering {
    let scale = 10f64.powi(PRICE_DIGITS);
    let left = (left * scale).round();
    let right = (right * scale).round();
    left.partial_cmp(&right).unwrap_or(Ordering::Equal)
}

pub fn is_zero_price(value: f64) -> bool {
    compare_prices(value, 0.0) == Ordering::Equal
}

pub fn required_text(field: &'static str, value: &str) -> Result<(), ListingError> {
    if value.trim().is_empty() {
        Err(ListingError::MissingField(field))
    } else {
        Ok(())
    }
}

pub fn expected_price(value: f64) -> Result<(), ListingError> {
    if value.is_finite() && compare_prices(value, 0.0) == Ordering::Greater {
        Ok(())
    } else {
        Err(ListingError::NonPositiveExpectedPrice)
    }
}

pub fn offer_price(value: f64) -> Result<(), ListingError> {
    if value.is_finite() && compare_prices(value, 0.0) == Ordering::Greater {
        Ok(())
    } else {
        Err(ListingError::NonPositiveOfferPrice)
    }
}

/// Deadline of a bid created on `created_on` and valid for `days`.
pub fn offer_validity(created_on: NaiveDate, days: i64) -> Result<NaiveDate, ListingError> {
    if !(0..=Offer::MAX_VALIDITY_DAYS).contains(&days) {
        return Err(ListingError::InvalidValidity { days });
    }
    chrono::Duration::try_days(days)
        .and_then(|window| created_on.checked_add_signed(window))
        .ok_or(ListingError::InvalidValidity { days })
}

/// A zero selling price means "not sold yet" and is exempt from the floor.
pub fn selling_price(
    selling: f64,
    expected: f64,
    minimum_ratio: f64,
) -> Result<(), ListingError> {
    if compare_prices(selling, 0.0) == Ordering::Less {
        return Err(ListingError::NegativeSellingPrice);
    }
    if is_zero_price(selling) {
        return Ok(());
    }

    let floor = expected * minimum_ratio;
    if compare_prices(selling, floor) == Ordering::Less {
        return Err(ListingError::SellingPriceTooLow {
            selling,
            expected,
            percent: (minimum_ratio * 100.0).round() as u32,
        });
    }
    Ok(())
}

pub fn property(property: &Property, minimum_ratio: f64) -> Result<(), ListingError> {
    required_text("title", &property.name)?;
    expected_price(property.expected_price)?;
    selling_price(
        property.selling_price,
        property.expected_price,
        minimum_ratio,
    )
}

/// Highest price among the offers, zero when there are none.
pub fn best_price<'a>(offers: impl IntoIterator<Item = &'a Offer>) -> f64 {
    offers
        .into_iter()
        .map(|offer| offer.price)
        .fold(0.0, f64::max)
}

/// New bids must beat every bid already on the listing.
pub fn outbids<'a>(
    price: f64,
    existing: impl IntoIterator<Item = &'a Offer>,
) -> Result<(), ListingError> {
    let mut existing = existing.into_iter().peekable();
    if existing.peek().is_none() {
        return Ok(());
    }

    let best = best_price(existing);
    if compare_prices(price, best) == Ordering::Greater {
        Ok(())
    } else {
        Err(ListingError::OfferBelowBest {
            offered: price,
            best,
        })
    }
}

pub fn unique_name<'a>(
    candidate: &str,
    existing: impl IntoIterator<Item = &'a str>,
    error: ListingError,
) -> Result<(), ListingError> {
    let candidate = candidate.trim();
    if existing
        .into_iter()
        .any(|name| name.trim() == candidate)
    {
        Err(error)
    } else {
        Ok(())
    }
}
