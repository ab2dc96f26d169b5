use crate::infra::{build_catalog, build_upstreams, ConfiguredSentiment};
use clap::Args;
use dealer_reviews::catalog::{CatalogRepository, InMemoryCatalog};
use dealer_reviews::config::AppConfig;
use dealer_reviews::dealers::{Dealer, HttpDealerClient, Review};
use dealer_reviews::error::AppError;
use dealer_reviews::reviews::ReviewService;
use dealer_reviews::sentiment::SentimentAnalyzer;
use dealer_reviews::telemetry;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Args, Debug, Default)]
pub(crate) struct DealerListArgs {
    /// Only list dealerships in this state (e.g. TX)
    #[arg(long)]
    pub(crate) state: Option<String>,
}

#[derive(Args, Debug)]
pub(crate) struct DealerReviewsArgs {
    /// Dealer id as stored in the dealer API
    #[arg(long)]
    pub(crate) dealer_id: i64,
}

#[derive(Args, Debug)]
pub(crate) struct SentimentClassifyArgs {
    /// Review text to classify
    #[arg(long)]
    pub(crate) text: String,
}

#[derive(Args, Debug, Default)]
pub(crate) struct CatalogShowArgs {
    /// Catalog fixture to load instead of CATALOG_FIXTURE
    #[arg(long)]
    pub(crate) fixture: Option<PathBuf>,
}

fn load_cli_config() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init_cli(&config.telemetry)?;
    Ok(config)
}

pub(crate) async fn run_dealer_list(args: DealerListArgs) -> Result<(), AppError> {
    let config = load_cli_config()?;
    let service = review_service(&config)?;

    let dealers = service.dealerships(args.state.as_deref()).await?;
    render_dealers(&dealers, args.state.as_deref());
    Ok(())
}

pub(crate) async fn run_dealer_reviews(args: DealerReviewsArgs) -> Result<(), AppError> {
    let config = load_cli_config()?;
    let service = review_service(&config)?;

    let details = service.dealer_details(args.dealer_id).await?;
    render_reviews(details.dealer_id, &details.reviews);
    Ok(())
}

pub(crate) async fn run_sentiment_classify(args: SentimentClassifyArgs) -> Result<(), AppError> {
    let config = load_cli_config()?;
    let upstreams = build_upstreams(&config)?;

    let label = upstreams.sentiment.classify(&args.text).await?;
    println!("{label}");
    Ok(())
}

pub(crate) fn run_catalog_show(args: CatalogShowArgs) -> Result<(), AppError> {
    let config = load_cli_config()?;
    let catalog = match args.fixture {
        Some(path) => InMemoryCatalog::from_fixture_path(path)?,
        None => build_catalog(&config)?,
    };

    let makes = catalog.makes()?;
    if makes.is_empty() {
        println!("Catalog is empty");
        return Ok(());
    }

    let details = catalog.model_details()?;
    for make in &makes {
        println!("{make}");
        for model in details.iter().filter(|model| model.make == make.name) {
            let year = model
                .year
                .map(|year| year.to_string())
                .unwrap_or_else(|| "n/a".to_string());
            println!("  - #{} {} ({}, {})", model.id.0, model.name, model.car_type, year);
        }
    }
    Ok(())
}

type CliReviewService = ReviewService<HttpDealerClient, ConfiguredSentiment>;

fn review_service(config: &AppConfig) -> Result<CliReviewService, AppError> {
    let upstreams = build_upstreams(config)?;
    let catalog = Arc::new(build_catalog(config)?);
    Ok(ReviewService::new(
        Arc::new(upstreams.dealers),
        Arc::new(upstreams.sentiment),
        catalog,
    ))
}

fn render_dealers(dealers: &[Dealer], state: Option<&str>) {
    match state {
        Some(state) => println!("Dealerships in {state}"),
        None => println!("Dealerships"),
    }

    if dealers.is_empty() {
        println!("- none");
        return;
    }

    for dealer in dealers {
        println!(
            "- #{} {} | {}, {} {} {}",
            dealer.id, dealer.full_name, dealer.address, dealer.city, dealer.st, dealer.zip
        );
    }
}

fn render_reviews(dealer_id: i64, reviews: &[Review]) {
    println!("Reviews for dealer #{dealer_id}");
    if reviews.is_empty() {
        println!("- none yet");
        return;
    }

    for review in reviews {
        let car = match (&review.car_make, &review.car_model, review.car_year) {
            (Some(make), Some(model), Some(year)) => format!(" [{year} {make} {model}]"),
            (Some(make), Some(model), None) => format!(" [{make} {model}]"),
            _ => String::new(),
        };
        println!("- ({}) {}: {}{}", review.sentiment, review.name, review.review, car);
    }
}
