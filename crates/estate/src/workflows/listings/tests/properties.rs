use std::sync::Arc;

use chrono::NaiveDate;

use super::common::*;
use crate::config::SalesConfig;
use crate::error::AppError;
use crate::workflows::listings::domain::{
    GardenOrientation, PropertyId, PropertyPatch, PropertyState, SalespersonId,
};
use crate::workflows::listings::lifecycle::ListingError;
use crate::workflows::listings::repository::RepositoryError;
use crate::workflows::listings::{ListingService, ListingServiceError};

#[test]
fn create_property_applies_defaults() {
    let (service, _, _) = build_service();

    let view = service
        .create_property(house("Canal House", 250_000.0))
        .expect("listing created");

    assert_eq!(view.property.state, PropertyState::New);
    assert_eq!(view.property.bedrooms, 2);
    assert_eq!(view.property.selling_price, 0.0);
    assert!(view.property.active);
    assert_eq!(
        view.property.date_availability,
        NaiveDate::from_ymd_opt(2025, 6, 10).expect("valid")
    );
    assert_eq!(view.best_price, 0.0);
    assert_eq!(view.total_area, 140);
    assert!(view.property.id.0.starts_with("prop-"));
}

#[test]
fn create_property_rejects_non_positive_expected_price() {
    let (service, _, _) = build_service();

    match service.create_property(house("Shed", 0.0)) {
        Err(ListingServiceError::Rule(ListingError::NonPositiveExpectedPrice)) => {}
        other => panic!("expected price violation, got {other:?}"),
    }
}

#[test]
fn create_property_requires_title_and_known_references() {
    let (service, _, _) = build_service();

    match service.create_property(house("   ", 10_000.0)) {
        Err(ListingServiceError::Rule(ListingError::MissingField("title"))) => {}
        other => panic!("expected missing title, got {other:?}"),
    }

    let mut draft = house("Loft", 10_000.0);
    draft.property_type_id = Some(crate::workflows::listings::PropertyTypeId(
        "type-missing".to_string(),
    ));
    match service.create_property(draft) {
        Err(ListingServiceError::Rule(ListingError::UnknownReference { kind, .. })) => {
            assert_eq!(kind, "property type")
        }
        other => panic!("expected unknown reference, got {other:?}"),
    }
}

#[test]
fn garden_toggle_seeds_and_clears_details() {
    let (service, _, _) = build_service();
    let id = service
        .create_property(house("Garden Cottage", 180_000.0))
        .expect("created")
        .property
        .id;

    let with_garden = service.set_garden(&id, true).expect("garden enabled");
    assert_eq!(with_garden.property.garden_area, 10);
    assert_eq!(
        with_garden.property.garden_orientation,
        Some(GardenOrientation::North)
    );
    assert_eq!(with_garden.total_area, 150);

    let without = service.set_garden(&id, false).expect("garden disabled");
    assert_eq!(without.property.garden_area, 0);
    assert_eq!(without.property.garden_orientation, None);
}

#[test]
fn sold_property_cannot_be_cancelled() {
    let (service, _, _) = build_service();
    let id = service
        .create_property(house("Harbour Flat", 120_000.0))
        .expect("created")
        .property
        .id;

    service.sell_property(&id).expect("sold");

    match service.cancel_property(&id) {
        Err(ListingServiceError::Rule(error)) => {
            assert_eq!(error.to_string(), "Sold properties cannot be cancelled.")
        }
        other => panic!("expected cancel rejection, got {other:?}"),
    }
}

#[test]
fn cancelled_property_cannot_be_sold_or_invoiced() {
    let (service, repository, billing) = build_service();
    let id = service
        .create_property(house("Mill", 90_000.0))
        .expect("created")
        .property
        .id;

    service.cancel_property(&id).expect("cancelled");

    match service.sell_property(&id) {
        Err(ListingServiceError::Rule(ListingError::SellCanceled)) => {}
        other => panic!("expected sell rejection, got {other:?}"),
    }
    assert_eq!(
        repository.stored_property(&id).state,
        PropertyState::Canceled
    );
    assert!(billing.invoices().is_empty());
}

#[test]
fn sale_raises_commission_invoice_for_buyer() {
    let (service, _, billing) = build_service();
    let id = service
        .create_property(house("Villa Rosa", 200_000.0))
        .expect("created")
        .property
        .id;
    let offer = service
        .create_offer(&id, bid("partner-ana", 190_000.0))
        .expect("offer placed");
    service.accept_offer(&offer.offer.id).expect("accepted");

    let outcome = service.sell_property(&id).expect("sold");

    assert_eq!(outcome.property.property.state, PropertyState::Sold);
    let invoice = outcome.invoice.expect("invoice raised");
    assert_eq!(
        invoice.draft.partner_id,
        Some(crate::workflows::listings::PartnerId("partner-ana".to_string()))
    );
    assert_eq!(invoice.draft.lines.len(), 2);
    assert!((invoice.draft.lines[0].price_unit - 11_400.0).abs() < 1e-6);
    assert_eq!(invoice.draft.lines[1].price_unit, 100.0);
    assert!((invoice.total - 11_500.0).abs() < 1e-6);
    assert_eq!(invoice.draft.invoice_date, fixed_today());
    assert_eq!(billing.invoices().len(), 1);
}

#[test]
fn selling_twice_invoices_twice() {
    let (service, _, billing) = build_service();
    let id = service
        .create_property(house("Twin Peaks", 100_000.0))
        .expect("created")
        .property
        .id;

    service.sell_property(&id).expect("first sale");
    service.sell_property(&id).expect("second sale");

    assert_eq!(billing.invoices().len(), 2);
}

#[test]
fn invoicing_can_be_disabled() {
    let config = SalesConfig {
        invoicing_enabled: false,
        ..SalesConfig::default()
    };
    let (service, _, billing) = build_service_with(config);
    let id = service
        .create_property(house("Quiet Lane", 100_000.0))
        .expect("created")
        .property
        .id;

    let outcome = service.sell_property(&id).expect("sold");

    assert!(outcome.invoice.is_none());
    assert!(billing.invoices().is_empty());
}

#[test]
fn billing_failure_leaves_listing_unsold() {
    let repository = Arc::new(MemoryRepository::default());
    let service = ListingService::new(
        repository.clone(),
        Arc::new(OfflineBilling),
        SalesConfig::default(),
    )
    .with_clock(fixed_today);
    let id = service
        .create_property(house("Dock House", 100_000.0))
        .expect("created")
        .property
        .id;

    match service.sell_property(&id) {
        Err(error @ ListingServiceError::Billing(_)) => {
            assert_eq!(
                AppError::from(error).status_code(),
                axum::http::StatusCode::INTERNAL_SERVER_ERROR
            )
        }
        other => panic!("expected billing failure, got {other:?}"),
    }
    assert_eq!(repository.stored_property(&id).state, PropertyState::New);
}

#[test]
fn only_new_or_cancelled_properties_can_be_deleted() {
    let (service, repository, _) = build_service();
    let id = service
        .create_property(house("Old Barn", 60_000.0))
        .expect("created")
        .property
        .id;
    service
        .create_offer(&id, bid("partner-bo", 58_000.0))
        .expect("offer placed");

    match service.delete_property(&id) {
        Err(ListingServiceError::Rule(ListingError::DeleteInProgress(state))) => {
            assert_eq!(state, "offer_received")
        }
        other => panic!("expected delete rejection, got {other:?}"),
    }

    service.cancel_property(&id).expect("cancelled");
    service.delete_property(&id).expect("deleted");

    assert_eq!(repository.offer_count(), 0);
    match service.get_property(&id) {
        Err(error @ ListingServiceError::Repository(RepositoryError::NotFound)) => {
            assert_eq!(
                AppError::from(error).status_code(),
                axum::http::StatusCode::NOT_FOUND
            )
        }
        other => panic!("expected not found, got {other:?}"),
    }
}

#[test]
fn raising_expected_price_respects_accepted_offer_floor() {
    let (service, _, _) = build_service();
    let id = service
        .create_property(house("Lake View", 100_000.0))
        .expect("created")
        .property
        .id;
    let offer = service
        .create_offer(&id, bid("partner-cy", 95_000.0))
        .expect("offer placed");
    service.accept_offer(&offer.offer.id).expect("accepted");

    let patch = PropertyPatch {
        expected_price: Some(120_000.0),
        ..PropertyPatch::default()
    };
    match service.update_property(&id, patch) {
        Err(ListingServiceError::Rule(ListingError::SellingPriceTooLow { percent, .. })) => {
            assert_eq!(percent, 90)
        }
        other => panic!("expected floor violation, got {other:?}"),
    }

    let patch = PropertyPatch {
        expected_price: Some(105_000.0),
        bedrooms: Some(4),
        ..PropertyPatch::default()
    };
    let view = service.update_property(&id, patch).expect("within floor");
    assert_eq!(view.property.bedrooms, 4);
    assert_eq!(view.offers.len(), 1);
}

#[test]
fn changing_type_follows_into_offers_and_counts() {
    let (service, _, _) = build_service();
    let house_type = service
        .create_property_type("House", Some(5))
        .expect("type created");
    let flat_type = service
        .create_property_type("Apartment", None)
        .expect("type created");

    let mut draft = house("Corner House", 100_000.0);
    draft.property_type_id = Some(house_type.id.clone());
    let id = service.create_property(draft).expect("created").property.id;
    service
        .create_offer(&id, bid("partner-dee", 91_000.0))
        .expect("offer placed");

    let types = service.list_property_types().expect("types listed");
    assert_eq!(types[0].property_type.name, "House");
    assert_eq!(types[0].offer_count, 1);
    assert_eq!(types[0].property_count, 1);
    assert_eq!(types[1].property_type.sequence, 10);
    assert_eq!(types[1].offer_count, 0);

    let patch = PropertyPatch {
        property_type_id: Some(Some(flat_type.id.clone())),
        ..PropertyPatch::default()
    };
    let view = service.update_property(&id, patch).expect("updated");
    assert_eq!(
        view.offers[0].offer.property_type_id,
        Some(flat_type.id.clone())
    );

    let types = service.list_property_types().expect("types listed");
    let apartment = types
        .iter()
        .find(|entry| entry.property_type.id == flat_type.id)
        .expect("apartment listed");
    assert_eq!(apartment.offer_count, 1);

    let patch = PropertyPatch {
        property_type_id: Some(None),
        ..PropertyPatch::default()
    };
    let view = service.update_property(&id, patch).expect("type cleared");
    assert_eq!(view.property.property_type_id, None);
    assert_eq!(view.offers[0].offer.property_type_id, None);

    let types = service.list_property_types().expect("types listed");
    assert!(types
        .iter()
        .all(|entry| entry.offer_count == 0 && entry.property_count == 0));
}

#[test]
fn patch_leaves_absent_fields_and_clears_null_ones() {
    let (service, _, _) = build_service();
    let mut draft = house("Seaside Villa", 100_000.0);
    draft.description = Some("Sea view".to_string());
    draft.seller_id = Some(SalespersonId("agent-1".to_string()));
    let id = service.create_property(draft).expect("created").property.id;

    let patch: PropertyPatch =
        serde_json::from_str(r#"{ "bedrooms": 5 }"#).expect("patch parses");
    assert_eq!(patch.description, None);
    let view = service.update_property(&id, patch).expect("updated");
    assert_eq!(view.property.description.as_deref(), Some("Sea view"));
    assert_eq!(view.property.bedrooms, 5);

    let patch: PropertyPatch = serde_json::from_str(
        r#"{ "description": null, "postcode": null, "seller_id": null, "garden_orientation": null }"#,
    )
    .expect("patch parses");
    assert_eq!(patch.description, Some(None));
    let view = service.update_property(&id, patch).expect("cleared");
    assert_eq!(view.property.description, None);
    assert_eq!(view.property.postcode, None);
    assert_eq!(view.property.seller_id, None);
    assert_eq!(view.property.garden_orientation, None);
}

#[test]
fn catalog_names_are_unique() {
    let (service, _, _) = build_service();
    service
        .create_property_type("House", None)
        .expect("type created");
    service
        .create_property_tag("cozy", Some(3))
        .expect("tag created");

    match service.create_property_type(" House", None) {
        Err(ListingServiceError::Rule(ListingError::DuplicateTypeName)) => {}
        other => panic!("expected duplicate type, got {other:?}"),
    }
    match service.create_property_tag("cozy", None) {
        Err(ListingServiceError::Rule(ListingError::DuplicateTagName)) => {}
        other => panic!("expected duplicate tag, got {other:?}"),
    }
}

#[test]
fn tags_list_alphabetically() {
    let (service, _, _) = build_service();
    for name in ["renovated", "cozy", "luxury"] {
        service.create_property_tag(name, None).expect("tag created");
    }

    let names: Vec<String> = service
        .list_property_tags()
        .expect("tags listed")
        .into_iter()
        .map(|view| view.tag.name)
        .collect();
    assert_eq!(names, vec!["cozy", "luxury", "renovated"]);
}

#[test]
fn inactive_listings_are_hidden_by_default() {
    let (service, _, _) = build_service();
    service
        .create_property(house("Visible", 100_000.0))
        .expect("created");
    let mut hidden = house("Archived", 100_000.0);
    hidden.active = false;
    service.create_property(hidden).expect("created");

    assert_eq!(service.list_properties(false).expect("listed").len(), 1);
    assert_eq!(service.list_properties(true).expect("listed").len(), 2);
}

#[test]
fn missing_property_is_not_found() {
    let (service, _, _) = build_service();

    match service.cancel_property(&PropertyId("prop-missing".to_string())) {
        Err(ListingServiceError::Repository(RepositoryError::NotFound)) => {}
        other => panic!("expected not found, got {other:?}"),
    }
}
