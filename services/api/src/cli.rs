use crate::commands::{
    run_catalog_show, run_dealer_list, run_dealer_reviews, run_sentiment_classify,
    CatalogShowArgs, DealerListArgs, DealerReviewsArgs, SentimentClassifyArgs,
};
use crate::server;
use clap::{Args, Parser, Subcommand};
use dealer_reviews::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Dealership Reviews",
    about = "Serve and query the dealership review site from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Query dealerships and their reviews from the dealer API
    Dealers {
        #[command(subcommand)]
        command: DealerCommand,
    },
    /// Run text through the configured sentiment analyzer
    Sentiment {
        #[command(subcommand)]
        command: SentimentCommand,
    },
    /// Inspect the local car catalog
    Catalog {
        #[command(subcommand)]
        command: CatalogCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DealerCommand {
    /// List dealerships, optionally for one state
    List(DealerListArgs),
    /// Show a dealer's reviews with sentiment
    Reviews(DealerReviewsArgs),
}

#[derive(Subcommand, Debug)]
enum SentimentCommand {
    /// Classify a piece of review text
    Classify(SentimentClassifyArgs),
}

#[derive(Subcommand, Debug)]
enum CatalogCommand {
    /// Print makes and models, loading a fixture when given
    Show(CatalogShowArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Dealers {
            command: DealerCommand::List(args),
        } => run_dealer_list(args).await,
        Command::Dealers {
            command: DealerCommand::Reviews(args),
        } => run_dealer_reviews(args).await,
        Command::Sentiment {
            command: SentimentCommand::Classify(args),
        } => run_sentiment_classify(args).await,
        Command::Catalog {
            command: CatalogCommand::Show(args),
        } => run_catalog_show(args),
    }
}
