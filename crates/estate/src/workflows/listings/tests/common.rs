use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::SalesConfig;
use crate::workflows::listings::billing::{
    BillingError, InvoiceDraft, InvoiceGateway, InvoiceRecord,
};
use crate::workflows::listings::domain::{
    InvoiceId, Offer, OfferId, PartnerId, Property, PropertyDraft, PropertyId, PropertyTag,
    PropertyTagId, PropertyType, PropertyTypeId,
};
use crate::workflows::listings::repository::{ListingRepository, RepositoryError};
use crate::workflows::listings::service::{ListingService, OfferDraft};

pub(super) fn fixed_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 10).expect("valid date")
}

pub(super) fn house(name: &str, expected_price: f64) -> PropertyDraft {
    let mut draft = PropertyDraft::new(name, expected_price);
    draft.postcode = Some("1000".to_string());
    draft.living_area = 140;
    draft.facades = 4;
    draft.garage = true;
    draft
}

pub(super) fn bid(partner: &str, price: f64) -> OfferDraft {
    OfferDraft {
        partner_id: PartnerId(partner.to_string()),
        price,
        validity_days: None,
    }
}

pub(super) type TestService = ListingService<MemoryRepository, MemoryBilling>;

pub(super) fn build_service_with(
    config: SalesConfig,
) -> (TestService, Arc<MemoryRepository>, Arc<MemoryBilling>) {
    let repository = Arc::new(MemoryRepository::default());
    let billing = Arc::new(MemoryBilling::default());
    let service =
        ListingService::new(repository.clone(), billing.clone(), config).with_clock(fixed_today);
    (service, repository, billing)
}

pub(super) fn build_service() -> (TestService, Arc<MemoryRepository>, Arc<MemoryBilling>) {
    build_service_with(SalesConfig::default())
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    properties: Arc<Mutex<HashMap<PropertyId, Property>>>,
    offers: Arc<Mutex<HashMap<OfferId, Offer>>>,
    types: Arc<Mutex<HashMap<PropertyTypeId, PropertyType>>>,
    tags: Arc<Mutex<HashMap<PropertyTagId, PropertyTag>>>,
}

impl MemoryRepository {
    pub(super) fn stored_property(&self, id: &PropertyId) -> Property {
        self.properties
            .lock()
            .expect("repository mutex poisoned")
            .get(id)
            .cloned()
            .expect("property stored")
    }

    pub(super) fn offer_count(&self) -> usize {
        self.offers.lock().expect("repository mutex poisoned").len()
    }
}

impl ListingRepository for MemoryRepository {
    fn insert_property(&self, property: Property) -> Result<Property, RepositoryError> {
        let mut guard = self.properties.lock().expect("repository mutex poisoned");
        if guard.contains_key(&property.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(property.id.clone(), property.clone());
        Ok(property)
    }

    fn update_property(&self, property: Property) -> Result<(), RepositoryError> {
        let mut guard = self.properties.lock().expect("repository mutex poisoned");
        guard.insert(property.id.clone(), property);
        Ok(())
    }

    fn fetch_property(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        let guard = self.properties.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete_property(&self, id: &PropertyId) -> Result<(), RepositoryError> {
        let mut guard = self.properties.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn properties(&self) -> Result<Vec<Property>, RepositoryError> {
        let guard = self.properties.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn insert_offer(&self, offer: Offer) -> Result<Offer, RepositoryError> {
        let mut guard = self.offers.lock().expect("repository mutex poisoned");
        if guard.contains_key(&offer.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(offer.id.clone(), offer.clone());
        Ok(offer)
    }

    fn update_offer(&self, offer: Offer) -> Result<(), RepositoryError> {
        let mut guard = self.offers.lock().expect("repository mutex poisoned");
        guard.insert(offer.id.clone(), offer);
        Ok(())
    }

    fn fetch_offer(&self, id: &OfferId) -> Result<Option<Offer>, RepositoryError> {
        let guard = self.offers.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete_offer(&self, id: &OfferId) -> Result<(), RepositoryError> {
        let mut guard = self.offers.lock().expect("repository mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn offers_for_property(&self, id: &PropertyId) -> Result<Vec<Offer>, RepositoryError> {
        let guard = self.offers.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|offer| &offer.property_id == id)
            .cloned()
            .collect())
    }

    fn offers(&self) -> Result<Vec<Offer>, RepositoryError> {
        let guard = self.offers.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn insert_property_type(&self, record: PropertyType) -> Result<PropertyType, RepositoryError> {
        let mut guard = self.types.lock().expect("repository mutex poisoned");
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch_property_type(
        &self,
        id: &PropertyTypeId,
    ) -> Result<Option<PropertyType>, RepositoryError> {
        let guard = self.types.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn property_types(&self) -> Result<Vec<PropertyType>, RepositoryError> {
        let guard = self.types.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn insert_property_tag(&self, record: PropertyTag) -> Result<PropertyTag, RepositoryError> {
        let mut guard = self.tags.lock().expect("repository mutex poisoned");
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn fetch_property_tag(
        &self,
        id: &PropertyTagId,
    ) -> Result<Option<PropertyTag>, RepositoryError> {
        let guard = self.tags.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn property_tags(&self) -> Result<Vec<PropertyTag>, RepositoryError> {
        let guard = self.tags.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryBilling {
    invoices: Mutex<Vec<InvoiceRecord>>,
    sequence: AtomicU64,
}

impl MemoryBilling {
    pub(super) fn invoices(&self) -> Vec<InvoiceRecord> {
        self.invoices.lock().expect("billing mutex poisoned").clone()
    }
}

impl InvoiceGateway for MemoryBilling {
    fn create_invoice(&self, draft: InvoiceDraft) -> Result<InvoiceRecord, BillingError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let record = InvoiceRecord {
            id: InvoiceId(format!("inv-{id:04}")),
            total: draft.total(),
            draft,
        };
        self.invoices
            .lock()
            .expect("billing mutex poisoned")
            .push(record.clone());
        Ok(record)
    }
}

pub(super) struct OfflineBilling;

impl InvoiceGateway for OfflineBilling {
    fn create_invoice(&self, _draft: InvoiceDraft) -> Result<InvoiceRecord, BillingError> {
        Err(BillingError::Transport("ledger offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
