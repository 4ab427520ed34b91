use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::SalesConfig;

use super::billing::{BillingError, InvoiceDraft, InvoiceGateway, InvoiceRecord};
use super::domain::{
    Offer, OfferId, OfferStatus, PartnerId, Property, PropertyDraft, PropertyId, PropertyPatch,
    PropertyState, PropertyTag, PropertyTagId, PropertyType, PropertyTypeId,
};
use super::lifecycle::{self, ListingError};
use super::repository::{ListingRepository, RepositoryError};
use super::validation;
use super::views::{OfferView, PropertyTagView, PropertyTypeView, PropertyView};

static PROPERTY_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static OFFER_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static TYPE_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static TAG_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_id(sequence: &AtomicU64, prefix: &str) -> String {
    let id = sequence.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}-{id:06}")
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

const DEFAULT_TYPE_SEQUENCE: i32 = 10;
const AVAILABILITY_LEAD_MONTHS: u32 = 3;

/// Bid submitted against a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferDraft {
    pub partner_id: PartnerId,
    pub price: f64,
    #[serde(default)]
    pub validity_days: Option<i64>,
}

/// Result of closing a sale: the sold listing and the invoice raised for it, if any.
#[derive(Debug, Clone, Serialize)]
pub struct SaleOutcome {
    pub property: PropertyView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<InvoiceRecord>,
}

/// Service applying the listing rules on top of a repository and the accounting hook.
pub struct ListingService<R, B> {
    repository: Arc<R>,
    billing: Arc<B>,
    config: SalesConfig,
    clock: Arc<dyn Fn() -> NaiveDate + Send + Sync>,
}

impl<R, B> ListingService<R, B>
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    pub fn new(repository: Arc<R>, billing: Arc<B>, config: SalesConfig) -> Self {
        Self {
            repository,
            billing,
            config,
            clock: Arc::new(today),
        }
    }

    /// Replace the calendar used for offer dates, availability defaults, and invoices.
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &SalesConfig {
        &self.config
    }

    pub fn create_property(
        &self,
        draft: PropertyDraft,
    ) -> Result<PropertyView, ListingServiceError> {
        rule("create_property", validation::required_text("title", &draft.name))?;
        rule(
            "create_property",
            validation::expected_price(draft.expected_price),
        )?;
        self.ensure_references(draft.property_type_id.as_ref(), &draft.tag_ids)?;

        let today = (self.clock)();
        let date_availability = draft.date_availability.unwrap_or_else(|| {
            today
                .checked_add_months(Months::new(AVAILABILITY_LEAD_MONTHS))
                .unwrap_or(today)
        });

        let mut property = Property {
            id: PropertyId(next_id(&PROPERTY_SEQUENCE, "prop")),
            name: draft.name.trim().to_string(),
            description: draft.description,
            postcode: draft.postcode,
            date_availability,
            expected_price: draft.expected_price,
            selling_price: 0.0,
            bedrooms: draft.bedrooms,
            living_area: draft.living_area,
            facades: draft.facades,
            garage: draft.garage,
            garden: draft.garden,
            garden_area: draft.garden_area,
            garden_orientation: draft.garden_orientation,
            active: draft.active,
            state: PropertyState::New,
            property_type_id: draft.property_type_id,
            buyer_id: None,
            seller_id: draft.seller_id,
            tag_ids: draft.tag_ids,
        };
        if property.garden && property.garden_area == 0 && property.garden_orientation.is_none() {
            property.set_garden(true);
        }

        let stored = self.repository.insert_property(property)?;
        info!(property_id = %stored.id.0, name = %stored.name, "listing created");
        Ok(PropertyView::new(stored, Vec::new()))
    }

    pub fn update_property(
        &self,
        property_id: &PropertyId,
        patch: PropertyPatch,
    ) -> Result<PropertyView, ListingServiceError> {
        let mut property = self.load_property(property_id)?;
        let previous_type = property.property_type_id.clone();

        patch.apply(&mut property);
        property.name = property.name.trim().to_string();
        rule(
            "update_property",
            validation::property(&property, self.config.minimum_selling_ratio),
        )?;
        self.ensure_references(property.property_type_id.as_ref(), &property.tag_ids)?;

        let mut offers = self.repository.offers_for_property(property_id)?;
        if property.property_type_id != previous_type {
            for offer in &mut offers {
                offer.property_type_id = property.property_type_id.clone();
                self.repository.update_offer(offer.clone())?;
            }
        }

        self.repository.update_property(property.clone())?;
        Ok(PropertyView::new(property, offers))
    }

    pub fn get_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<PropertyView, ListingServiceError> {
        let property = self.load_property(property_id)?;
        let offers = self.repository.offers_for_property(property_id)?;
        Ok(PropertyView::new(property, offers))
    }

    pub fn list_properties(
        &self,
        include_inactive: bool,
    ) -> Result<Vec<PropertyView>, ListingServiceError> {
        let mut properties: Vec<Property> = self
            .repository
            .properties()?
            .into_iter()
            .filter(|property| include_inactive || property.active)
            .collect();
        properties.sort_by(|left, right| left.id.cmp(&right.id));

        properties
            .into_iter()
            .map(|property| -> Result<PropertyView, ListingServiceError> {
                let offers = self.repository.offers_for_property(&property.id)?;
                Ok(PropertyView::new(property, offers))
            })
            .collect()
    }

    pub fn set_garden(
        &self,
        property_id: &PropertyId,
        garden: bool,
    ) -> Result<PropertyView, ListingServiceError> {
        let mut property = self.load_property(property_id)?;
        property.set_garden(garden);
        self.repository.update_property(property.clone())?;
        let offers = self.repository.offers_for_property(property_id)?;
        Ok(PropertyView::new(property, offers))
    }

    pub fn cancel_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<PropertyView, ListingServiceError> {
        let mut property = self.load_property(property_id)?;
        property.state = rule("cancel_property", lifecycle::cancel(property.state))?;
        self.repository.update_property(property.clone())?;
        info!(property_id = %property_id.0, "listing cancelled");

        let offers = self.repository.offers_for_property(property_id)?;
        Ok(PropertyView::new(property, offers))
    }

    /// Mark the listing sold and, when invoicing is enabled, bill the buyer.
    ///
    /// The invoice is raised before the sold state is stored so a failing accounting
    /// backend leaves the listing untouched. Selling an already sold listing bills again.
    pub fn sell_property(
        &self,
        property_id: &PropertyId,
    ) -> Result<SaleOutcome, ListingServiceError> {
        let mut property = self.load_property(property_id)?;
        property.state = rule("sell_property", lifecycle::sell(property.state))?;

        let invoice = if self.config.invoicing_enabled {
            let draft = InvoiceDraft::for_sale(
                &property,
                self.config.commission_rate,
                self.config.administrative_fee,
                (self.clock)(),
            );
            Some(self.billing.create_invoice(draft)?)
        } else {
            None
        };

        self.repository.update_property(property.clone())?;
        info!(
            property_id = %property_id.0,
            selling_price = property.selling_price,
            invoiced = invoice.is_some(),
            "listing sold"
        );

        let offers = self.repository.offers_for_property(property_id)?;
        Ok(SaleOutcome {
            property: PropertyView::new(property, offers),
            invoice,
        })
    }

    /// Delete a listing together with its offers. Only new or cancelled listings qualify.
    pub fn delete_property(&self, property_id: &PropertyId) -> Result<(), ListingServiceError> {
        let property = self.load_property(property_id)?;
        rule("delete_property", lifecycle::ensure_deletable(property.state))?;

        for offer in self.repository.offers_for_property(property_id)? {
            self.repository.delete_offer(&offer.id)?;
        }
        self.repository.delete_property(property_id)?;
        info!(property_id = %property_id.0, "listing deleted");
        Ok(())
    }

    pub fn create_offer(
        &self,
        property_id: &PropertyId,
        draft: OfferDraft,
    ) -> Result<OfferView, ListingServiceError> {
        rule("create_offer", validation::offer_price(draft.price))?;
        rule(
            "create_offer",
            validation::required_text("partner", &draft.partner_id.0),
        )?;
        let mut property = self.load_property(property_id)?;
        let existing = self.repository.offers_for_property(property_id)?;
        rule("create_offer", validation::outbids(draft.price, &existing))?;

        let created_on = (self.clock)();
        let validity_days = draft
            .validity_days
            .unwrap_or(self.config.offer_validity_days);
        rule(
            "create_offer",
            validation::offer_validity(created_on, validity_days),
        )?;

        let offer = Offer {
            id: OfferId(next_id(&OFFER_SEQUENCE, "offer")),
            price: draft.price,
            status: None,
            validity_days,
            created_on,
            partner_id: draft.partner_id,
            property_id: property_id.clone(),
            property_type_id: property.property_type_id.clone(),
        };
        let stored = self.repository.insert_offer(offer)?;

        let next_state = lifecycle::receive_offer(property.state);
        if next_state != property.state {
            property.state = next_state;
            self.repository.update_property(property)?;
        }

        info!(
            offer_id = %stored.id.0,
            property_id = %property_id.0,
            price = stored.price,
            "offer received"
        );
        Ok(OfferView::from(stored))
    }

    pub fn accept_offer(&self, offer_id: &OfferId) -> Result<PropertyView, ListingServiceError> {
        let mut offer = self.load_offer(offer_id)?;
        let mut property = self.load_property(&offer.property_id)?;
        let mut offers = self.repository.offers_for_property(&property.id)?;

        if offers
            .iter()
            .any(|other| other.is_accepted() && other.id != offer.id)
        {
            return Err(rule_error("accept_offer", ListingError::OfferAlreadyAccepted));
        }
        property.state = rule("accept_offer", lifecycle::accept_offer(property.state))?;
        rule(
            "accept_offer",
            validation::selling_price(
                offer.price,
                property.expected_price,
                self.config.minimum_selling_ratio,
            ),
        )?;

        offer.status = Some(OfferStatus::Accepted);
        property.buyer_id = Some(offer.partner_id.clone());
        property.selling_price = offer.price;

        self.repository.update_offer(offer.clone())?;
        self.repository.update_property(property.clone())?;
        replace_offer(&mut offers, offer);

        info!(
            offer_id = %offer_id.0,
            property_id = %property.id.0,
            selling_price = property.selling_price,
            "offer accepted"
        );
        Ok(PropertyView::new(property, offers))
    }

    pub fn refuse_offer(&self, offer_id: &OfferId) -> Result<PropertyView, ListingServiceError> {
        let mut offer = self.load_offer(offer_id)?;
        let mut property = self.load_property(&offer.property_id)?;
        let was_accepted = offer.is_accepted();

        if was_accepted {
            property.state = rule("refuse_offer", lifecycle::revert_acceptance(property.state))?;
            property.clear_sale();
        }
        offer.status = Some(OfferStatus::Refused);

        self.repository.update_offer(offer.clone())?;
        if was_accepted {
            self.repository.update_property(property.clone())?;
        }

        let mut offers = self.repository.offers_for_property(&property.id)?;
        replace_offer(&mut offers, offer);
        info!(offer_id = %offer_id.0, was_accepted, "offer refused");
        Ok(PropertyView::new(property, offers))
    }

    pub fn set_offer_deadline(
        &self,
        offer_id: &OfferId,
        deadline: NaiveDate,
    ) -> Result<OfferView, ListingServiceError> {
        let mut offer = self.load_offer(offer_id)?;
        let validity_days = (deadline - offer.created_on).num_days();
        rule(
            "set_offer_deadline",
            validation::offer_validity(offer.created_on, validity_days),
        )?;
        offer.set_deadline(deadline);
        self.repository.update_offer(offer.clone())?;
        Ok(OfferView::from(offer))
    }

    /// Remove an offer and, following the configured policy, put its listing back to `new`.
    ///
    /// Returns the parent listing as it stands after the deletion, when it still exists.
    pub fn delete_offer(
        &self,
        offer_id: &OfferId,
    ) -> Result<Option<PropertyView>, ListingServiceError> {
        let offer = self.load_offer(offer_id)?;
        let property = self.repository.fetch_property(&offer.property_id)?;

        let property = match property {
            Some(mut property) if self.config.offer_deletion.resets_property(&offer) => {
                property.state = rule("delete_offer", lifecycle::reset(property.state))?;
                property.clear_sale();
                self.repository.delete_offer(offer_id)?;
                self.repository.update_property(property.clone())?;
                info!(
                    offer_id = %offer_id.0,
                    property_id = %property.id.0,
                    "offer deleted, listing reset"
                );
                Some(property)
            }
            other => {
                self.repository.delete_offer(offer_id)?;
                info!(offer_id = %offer_id.0, "offer deleted");
                other
            }
        };

        property
            .map(|property| -> Result<PropertyView, ListingServiceError> {
                let offers = self.repository.offers_for_property(&property.id)?;
                Ok(PropertyView::new(property, offers))
            })
            .transpose()
    }

    pub fn create_property_type(
        &self,
        name: &str,
        sequence: Option<i32>,
    ) -> Result<PropertyType, ListingServiceError> {
        rule("create_property_type", validation::required_text("type name", name))?;
        let existing = self.repository.property_types()?;
        rule(
            "create_property_type",
            validation::unique_name(
                name,
                existing.iter().map(|record| record.name.as_str()),
                ListingError::DuplicateTypeName,
            ),
        )?;

        let record = PropertyType {
            id: PropertyTypeId(next_id(&TYPE_SEQUENCE, "type")),
            name: name.trim().to_string(),
            sequence: sequence.unwrap_or(DEFAULT_TYPE_SEQUENCE),
        };
        Ok(self.repository.insert_property_type(record)?)
    }

    /// Property types ordered by sequence then name, with usage counts.
    pub fn list_property_types(&self) -> Result<Vec<PropertyTypeView>, ListingServiceError> {
        let mut types = self.repository.property_types()?;
        types.sort_by(|left, right| {
            left.sequence
                .cmp(&right.sequence)
                .then_with(|| left.name.cmp(&right.name))
        });

        let offers = self.repository.offers()?;
        let properties = self.repository.properties()?;

        Ok(types
            .into_iter()
            .map(|property_type| {
                let id = Some(&property_type.id);
                PropertyTypeView {
                    offer_count: offers
                        .iter()
                        .filter(|offer| offer.property_type_id.as_ref() == id)
                        .count(),
                    property_count: properties
                        .iter()
                        .filter(|property| property.property_type_id.as_ref() == id)
                        .count(),
                    property_type,
                }
            })
            .collect())
    }

    pub fn create_property_tag(
        &self,
        name: &str,
        color: Option<u32>,
    ) -> Result<PropertyTag, ListingServiceError> {
        rule("create_property_tag", validation::required_text("tag name", name))?;
        let existing = self.repository.property_tags()?;
        rule(
            "create_property_tag",
            validation::unique_name(
                name,
                existing.iter().map(|record| record.name.as_str()),
                ListingError::DuplicateTagName,
            ),
        )?;

        let record = PropertyTag {
            id: PropertyTagId(next_id(&TAG_SEQUENCE, "tag")),
            name: name.trim().to_string(),
            color: color.unwrap_or_default(),
        };
        Ok(self.repository.insert_property_tag(record)?)
    }

    pub fn list_property_tags(&self) -> Result<Vec<PropertyTagView>, ListingServiceError> {
        let mut tags = self.repository.property_tags()?;
        tags.sort_by(|left, right| left.name.cmp(&right.name));
        Ok(tags.into_iter().map(PropertyTagView::from).collect())
    }

    fn load_property(&self, id: &PropertyId) -> Result<Property, ListingServiceError> {
        Ok(self
            .repository
            .fetch_property(id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    fn load_offer(&self, id: &OfferId) -> Result<Offer, ListingServiceError> {
        Ok(self
            .repository
            .fetch_offer(id)?
            .ok_or(RepositoryError::NotFound)?)
    }

    fn ensure_references(
        &self,
        property_type_id: Option<&PropertyTypeId>,
        tag_ids: &BTreeSet<PropertyTagId>,
    ) -> Result<(), ListingServiceError> {
        if let Some(type_id) = property_type_id {
            if self.repository.fetch_property_type(type_id)?.is_none() {
                return Err(ListingError::UnknownReference {
                    kind: "property type",
                    id: type_id.0.clone(),
                }
                .into());
            }
        }

        for tag_id in tag_ids {
            if self.repository.fetch_property_tag(tag_id)?.is_none() {
                return Err(ListingError::UnknownReference {
                    kind: "property tag",
                    id: tag_id.0.clone(),
                }
                .into());
            }
        }
        Ok(())
    }
}

fn replace_offer(offers: &mut [Offer], updated: Offer) {
    if let Some(slot) = offers.iter_mut().find(|offer| offer.id == updated.id) {
        *slot = updated;
    }
}

fn rule_error(operation: &'static str, error: ListingError) -> ListingServiceError {
    warn!(operation, error = %error, "listing rule rejected operation");
    ListingServiceError::Rule(error)
}

fn rule<T>(
    operation: &'static str,
    result: Result<T, ListingError>,
) -> Result<T, ListingServiceError> {
    result.map_err(|error| rule_error(operation, error))
}

/// Error raised by the listing service.
#[derive(Debug, thiserror::Error)]
pub enum ListingServiceError {
    #[error(transparent)]
    Rule(#[from] ListingError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Billing(#[from] BillingError),
}
