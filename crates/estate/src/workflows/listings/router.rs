use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::AppError;

use super::billing::InvoiceGateway;
use super::domain::{OfferId, PropertyDraft, PropertyId, PropertyPatch};
use super::repository::ListingRepository;
use super::service::{ListingService, ListingServiceError, OfferDraft};

type SharedService<R, B> = Arc<ListingService<R, B>>;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    pub(crate) include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GardenRequest {
    pub(crate) garden: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeadlineRequest {
    pub(crate) deadline: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PropertyTypeRequest {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) sequence: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PropertyTagRequest {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) color: Option<u32>,
}

/// Router builder exposing the listing, offer, and catalog endpoints.
pub fn listing_router<R, B>(service: SharedService<R, B>) -> Router
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    Router::new()
        .route(
            "/api/v1/properties",
            post(create_property_handler::<R, B>).get(list_properties_handler::<R, B>),
        )
        .route(
            "/api/v1/properties/:property_id",
            get(get_property_handler::<R, B>)
                .patch(update_property_handler::<R, B>)
                .delete(delete_property_handler::<R, B>),
        )
        .route(
            "/api/v1/properties/:property_id/cancel",
            post(cancel_property_handler::<R, B>),
        )
        .route(
            "/api/v1/properties/:property_id/sell",
            post(sell_property_handler::<R, B>),
        )
        .route(
            "/api/v1/properties/:property_id/garden",
            post(garden_handler::<R, B>),
        )
        .route(
            "/api/v1/properties/:property_id/offers",
            post(create_offer_handler::<R, B>),
        )
        .route(
            "/api/v1/offers/:offer_id",
            axum::routing::delete(delete_offer_handler::<R, B>),
        )
        .route(
            "/api/v1/offers/:offer_id/accept",
            post(accept_offer_handler::<R, B>),
        )
        .route(
            "/api/v1/offers/:offer_id/refuse",
            post(refuse_offer_handler::<R, B>),
        )
        .route(
            "/api/v1/offers/:offer_id/deadline",
            put(offer_deadline_handler::<R, B>),
        )
        .route(
            "/api/v1/property-types",
            post(create_type_handler::<R, B>).get(list_types_handler::<R, B>),
        )
        .route(
            "/api/v1/property-tags",
            post(create_tag_handler::<R, B>).get(list_tags_handler::<R, B>),
        )
        .with_state(service)
}

pub(crate) fn error_response(error: ListingServiceError) -> Response {
    AppError::from(error).into_response()
}

fn respond<T: serde::Serialize>(
    status: StatusCode,
    result: Result<T, ListingServiceError>,
) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_property_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Json(draft): Json<PropertyDraft>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(StatusCode::CREATED, service.create_property(draft))
}

pub(crate) async fn list_properties_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Query(query): Query<ListQuery>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(
        StatusCode::OK,
        service.list_properties(query.include_inactive),
    )
}

pub(crate) async fn get_property_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(property_id): Path<String>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(
        StatusCode::OK,
        service.get_property(&PropertyId(property_id)),
    )
}

pub(crate) async fn update_property_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(property_id): Path<String>,
    Json(patch): Json<PropertyPatch>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(
        StatusCode::OK,
        service.update_property(&PropertyId(property_id), patch),
    )
}

pub(crate) async fn delete_property_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(property_id): Path<String>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    match service.delete_property(&PropertyId(property_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn cancel_property_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(property_id): Path<String>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(
        StatusCode::OK,
        service.cancel_property(&PropertyId(property_id)),
    )
}

pub(crate) async fn sell_property_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(property_id): Path<String>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(
        StatusCode::OK,
        service.sell_property(&PropertyId(property_id)),
    )
}

pub(crate) async fn garden_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(property_id): Path<String>,
    Json(request): Json<GardenRequest>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(
        StatusCode::OK,
        service.set_garden(&PropertyId(property_id), request.garden),
    )
}

pub(crate) async fn create_offer_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(property_id): Path<String>,
    Json(draft): Json<OfferDraft>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(
        StatusCode::CREATED,
        service.create_offer(&PropertyId(property_id), draft),
    )
}

pub(crate) async fn accept_offer_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(offer_id): Path<String>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(StatusCode::OK, service.accept_offer(&OfferId(offer_id)))
}

pub(crate) async fn refuse_offer_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(offer_id): Path<String>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(StatusCode::OK, service.refuse_offer(&OfferId(offer_id)))
}

pub(crate) async fn offer_deadline_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(offer_id): Path<String>,
    Json(request): Json<DeadlineRequest>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(
        StatusCode::OK,
        service.set_offer_deadline(&OfferId(offer_id), request.deadline),
    )
}

pub(crate) async fn delete_offer_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Path(offer_id): Path<String>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    match service.delete_offer(&OfferId(offer_id)) {
        Ok(Some(property)) => (StatusCode::OK, Json(property)).into_response(),
        Ok(None) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_type_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Json(request): Json<PropertyTypeRequest>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(
        StatusCode::CREATED,
        service.create_property_type(&request.name, request.sequence),
    )
}

pub(crate) async fn list_types_handler<R, B>(
    State(service): State<SharedService<R, B>>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(StatusCode::OK, service.list_property_types())
}

pub(crate) async fn create_tag_handler<R, B>(
    State(service): State<SharedService<R, B>>,
    Json(request): Json<PropertyTagRequest>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(
        StatusCode::CREATED,
        service.create_property_tag(&request.name, request.color),
    )
}

pub(crate) async fn list_tags_handler<R, B>(
    State(service): State<SharedService<R, B>>,
) -> Response
where
    R: ListingRepository + 'static,
    B: InvoiceGateway + 'static,
{
    respond(StatusCode::OK, service.list_property_tags())
}
