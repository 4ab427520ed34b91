use crate::infra::{InMemoryLedger, InMemoryListingRepository};
use chrono::NaiveDate;
use clap::Args;
use estate::config::AppConfig;
use estate::error::AppError;
use estate::workflows::listings::{
    ListingService, OfferDraft, PartnerId, PropertyDraft, PropertyView, SalespersonId,
};
use std::collections::BTreeSet;
use std::sync::Arc;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Listing title used for the walkthrough.
    #[arg(long, default_value = "Canal House")]
    pub(crate) name: String,
    /// Asking price of the listing.
    #[arg(long, default_value_t = 100_000.0)]
    pub(crate) expected_price: f64,
    /// Override the calendar date (YYYY-MM-DD). Offer deadlines start from it.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Stop after the offer has been accepted instead of closing the sale.
    #[arg(long)]
    pub(crate) skip_sale: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        name,
        expected_price,
        today,
        skip_sale,
    } = args;

    let config = AppConfig::load()?;
    let repository = Arc::new(InMemoryListingRepository::default());
    let ledger = Arc::new(InMemoryLedger::default());
    let service = ListingService::new(repository, ledger.clone(), config.sales.clone());
    let service = match today {
        Some(date) => service.with_clock(move || date),
        None => service,
    };

    println!("Listing walkthrough");
    let house = service.create_property_type("House", Some(1))?;
    let cozy = service.create_property_tag("cozy", Some(2))?;

    let mut draft = PropertyDraft::new(name, expected_price);
    draft.property_type_id = Some(house.id.clone());
    draft.tag_ids = BTreeSet::from([cozy.id.clone()]);
    draft.seller_id = Some(SalespersonId("agent-demo".to_string()));
    draft.living_area = 120;
    let listing = service.create_property(draft)?;
    let property_id = listing.property.id.clone();
    print_listing("created", &listing);

    let opening = expected_price * 0.85;
    let first = service.create_offer(
        &property_id,
        OfferDraft {
            partner_id: PartnerId("buyer-ana".to_string()),
            price: opening,
            validity_days: None,
        },
    )?;
    println!(
        "- offer {} from {} at {:.2} (deadline {})",
        first.offer.id.0, first.offer.partner_id.0, first.offer.price, first.deadline
    );

    match service.create_offer(
        &property_id,
        OfferDraft {
            partner_id: PartnerId("buyer-ben".to_string()),
            price: opening,
            validity_days: None,
        },
    ) {
        Ok(_) => println!("- matching bid unexpectedly accepted"),
        Err(err) => println!("- matching bid rejected: {err}"),
    }

    let winning = service.create_offer(
        &property_id,
        OfferDraft {
            partner_id: PartnerId("buyer-ben".to_string()),
            price: expected_price * 0.95,
            validity_days: Some(14),
        },
    )?;
    println!(
        "- offer {} from {} at {:.2} (deadline {})",
        winning.offer.id.0, winning.offer.partner_id.0, winning.offer.price, winning.deadline
    );

    match service.accept_offer(&first.offer.id) {
        Ok(_) => println!("- low offer accepted"),
        Err(err) => println!("- low offer not accepted: {err}"),
    }

    let accepted = service.accept_offer(&winning.offer.id)?;
    print_listing("offer accepted", &accepted);

    if skip_sale {
        return Ok(());
    }

    let sale = service.sell_property(&property_id)?;
    print_listing("sold", &sale.property);
    match sale.invoice {
        Some(invoice) => {
            println!("Invoice {} ({} lines)", invoice.id.0, invoice.draft.lines.len());
            for line in &invoice.draft.lines {
                println!("  - {}: {:.2}", line.name, line.subtotal());
            }
            println!("  total {:.2}", invoice.total);
        }
        None => println!("Invoicing disabled; no invoice raised"),
    }

    if let Err(err) = service.cancel_property(&property_id) {
        println!("- cancel after sale rejected: {err}");
    }

    println!(
        "{} invoice(s) recorded in the in-memory ledger",
        ledger.invoices().len()
    );
    Ok(())
}

fn print_listing(step: &str, view: &PropertyView) {
    println!(
        "[{step}] {} ({}) | state: {} | expected {:.2} | best offer {:.2} | selling {:.2} | buyer {}",
        view.property.name,
        view.property.id.0,
        view.state_label,
        view.property.expected_price,
        view.best_price,
        view.property.selling_price,
        view.property
            .buyer_id
            .as_ref()
            .map(|buyer| buyer.0.as_str())
            .unwrap_or("-"),
    );
}
