use crate::infra::{seed_sample_catalog, Marketplace, SampleCatalog};
use chrono::{DateTime, Utc};
use clap::Args;
use classifieds::access::{Principal, Role, UserId};
use classifieds::accounts::SettingsInput;
use classifieds::clock::{Clock, FixedClock};
use classifieds::config::{
    AccessConfig, AppConfig, AppEnvironment, AssistConfig, ServerConfig, StorageConfig,
    TelemetryConfig,
};
use classifieds::error::AppError;
use classifieds::listings::{Listing, NewListingInput};
use std::sync::Arc;

const DEMO_CREDENTIAL: &str = "demo-service-credential";

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Title of the demo listing
    #[arg(long)]
    pub(crate) title: Option<String>,
    /// Asking price as typed by the seller, e.g. "2 499,99"
    #[arg(long)]
    pub(crate) price: Option<String>,
    /// Publication start (RFC 3339). Defaults to now.
    #[arg(long)]
    pub(crate) now: Option<DateTime<Utc>>,
    /// Renew the archived listing as a moderator instead of the owner.
    #[arg(long)]
    pub(crate) moderator_renewal: bool,
}

fn demo_config() -> AppConfig {
    AppConfig {
        environment: AppEnvironment::Development,
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        telemetry: TelemetryConfig {
            log_level: "warn".to_string(),
        },
        access: AccessConfig {
            admin_emails: vec!["moderator@example.com".to_string()],
            service_credential: Some(DEMO_CREDENTIAL.to_string()),
        },
        storage: StorageConfig {
            public_base_url: "http://localhost:3000/storage/v1/object/public".to_string(),
            bucket: "listing-images".to_string(),
        },
        assist: AssistConfig {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
        },
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let now = args.now.unwrap_or_else(Utc::now);
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(now));
    let marketplace = Marketplace::from_config(&demo_config(), clock);
    let sample = seed_sample_catalog(&marketplace.store, &marketplace.catalog)?;

    println!("Classifieds listing lifecycle demo");
    println!("Catalog");
    for node in marketplace.catalog.category_tree()? {
        let children: Vec<&str> = node.children.iter().map(|child| child.name.as_str()).collect();
        println!(
            "- {}{} {}",
            node.name,
            if node.is_free { " (free)" } else { "" },
            if children.is_empty() {
                String::new()
            } else {
                format!("> {}", children.join(", "))
            }
        );
    }

    let seller = Principal::member(UserId::new()).with_email("sprzedawca@example.com");
    marketplace.settings.update_settings(
        Some(&seller),
        SettingsInput {
            contact_email: "sprzedawca@example.com".to_string(),
            city: "Kraków".to_string(),
            ..SettingsInput::default()
        },
    )?;

    let listing = marketplace
        .listings
        .create(Some(&seller), demo_listing(&args, &sample))?;
    print_listing("\nCreated", &listing);

    let quote = marketplace.listings.payment_quote(Some(&seller), listing.id)?;
    println!(
        "  Payment due: {} (fee {} + period {})",
        format_cents(quote.total_cents),
        format_cents(quote.publication_fee_cents),
        format_cents(quote.period_price_cents)
    );

    let listing = marketplace.listings.activate(Some(&seller), listing.id)?;
    print_listing("Activated", &listing);

    let listing = marketplace.listings.archive(Some(&seller), listing.id)?;
    print_listing("Archived", &listing);

    println!("  Renewal options:");
    for option in marketplace
        .listings
        .renewal_options(Some(&seller), listing.id)?
    {
        println!(
            "    - {} ({} days) {}{}",
            option.label,
            option.days_count,
            format_cents(option.price_cents),
            if option.is_default { " [default]" } else { "" }
        );
    }

    let renewer = if args.moderator_renewal {
        Principal::member(UserId::new())
            .with_email("moderator@example.com")
            .with_role(Role::Admin)
    } else {
        seller.clone()
    };
    let listing = marketplace.listings.renew(
        Some(&renewer),
        listing.id,
        Some(sample.periods.fortnight.id),
    )?;
    print_listing("Renewed", &listing);

    let contact = marketplace.listings.reveal_contact(listing.id)?;
    println!(
        "  Contact: phone {} | e-mail {}",
        contact.phone.as_deref().unwrap_or("-"),
        contact.email.as_deref().unwrap_or("-")
    );

    Ok(())
}

fn demo_listing(args: &DemoArgs, sample: &SampleCatalog) -> NewListingInput {
    NewListingInput {
        title: args
            .title
            .clone()
            .unwrap_or_else(|| "Laptop Dell Latitude 7420".to_string()),
        description: "Stan bardzo dobry, bateria trzyma 6 godzin.".to_string(),
        price: Some(args.price.clone().unwrap_or_else(|| "2 499,99".to_string())),
        location: "Kraków".to_string(),
        contact_phone: "600 100 200".to_string(),
        category_id: Some(sample.laptops.id),
        publication_period_id: Some(sample.periods.month.id),
        tags: vec!["laptop".to_string(), "dell".to_string()],
        ..NewListingInput::default()
    }
}

fn print_listing(heading: &str, listing: &Listing) {
    println!("{heading} listing {}", listing.id);
    println!(
        "  {} | status {} | price {}",
        listing.title,
        listing.status.label(),
        listing
            .price
            .map(|price| format!("{price} zł"))
            .unwrap_or_else(|| "-".to_string())
    );
    if let Some(expires_at) = listing.expires_at {
        println!("  Published until {}", expires_at.format("%Y-%m-%d %H:%M"));
    }
    if let Some(archived_until) = listing.archived_until {
        println!("  Kept in archive until {}", archived_until.format("%Y-%m-%d"));
    }
}

fn format_cents(cents: u32) -> String {
    format!("{}.{:02} zł", cents / 100, cents % 100)
}
