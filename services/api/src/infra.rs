use chrono::NaiveDate;
use estate::workflows::listings::{
    BillingError, InvoiceDraft, InvoiceGateway, InvoiceId, InvoiceRecord, ListingRepository,
    Offer, OfferId, Property, PropertyId, PropertyTag, PropertyTagId, PropertyType,
    PropertyTypeId, RepositoryError,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryListingRepository {
    properties: Arc<Mutex<HashMap<PropertyId, Property>>>,
    offers: Arc<Mutex<HashMap<OfferId, Offer>>>,
    types: Arc<Mutex<HashMap<PropertyTypeId, PropertyType>>>,
    tags: Arc<Mutex<HashMap<PropertyTagId, PropertyTag>>>,
}

impl ListingRepository for InMemoryListingRepository {
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
        if guard.contains_key(&property.id) {
            guard.insert(property.id.clone(), property);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_property(&self, id: &PropertyId) -> Result<Option<Property>, RepositoryError> {
        let guard = self.properties.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete_property(&self, id: &PropertyId) -> Result<(), RepositoryError> {
        let mut guard = self.properties.lock().expect("repository mutex poisoned");
        guard
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
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
        if guard.contains_key(&offer.id) {
            guard.insert(offer.id.clone(), offer);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch_offer(&self, id: &OfferId) -> Result<Option<Offer>, RepositoryError> {
        let guard = self.offers.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn delete_offer(&self, id: &OfferId) -> Result<(), RepositoryError> {
        let mut guard = self.offers.lock().expect("repository mutex poisoned");
        guard
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
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
        if guard.values().any(|existing| existing.name == record.name) {
            return Err(RepositoryError::Conflict);
        }
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
        if guard.values().any(|existing| existing.name == record.name) {
            return Err(RepositoryError::Conflict);
        }
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

/// Keeps raised invoices in memory until an accounting backend is wired in.
#[derive(Default)]
pub(crate) struct InMemoryLedger {
    invoices: Mutex<Vec<InvoiceRecord>>,
    sequence: AtomicU64,
}

impl InvoiceGateway for InMemoryLedger {
    fn create_invoice(&self, draft: InvoiceDraft) -> Result<InvoiceRecord, BillingError> {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let record = InvoiceRecord {
            id: InvoiceId(format!("inv-{id:06}")),
            total: draft.total(),
            draft,
        };
        let mut guard = self.invoices.lock().expect("ledger mutex poisoned");
        guard.push(record.clone());
        Ok(record)
    }
}

impl InMemoryLedger {
    pub(crate) fn invoices(&self) -> Vec<InvoiceRecord> {
        self.invoices.lock().expect("ledger mutex poisoned").clone()
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
