use chrono::Datelike;
use clap::{Parser, Subcommand};
use lenta::fetch::{Fetcher, HttpFetcher, SiteFetcher};
use lenta::site::{FeedRequest, ShopRequest, TimelineRequest};
use lenta::timeline::Mode;
use lenta::{config, output, site};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "lenta")]
#[command(about = "Renders the feed, private timeline and shop pages of a Lenta site")]
#[command(long_about = "\
Renders the feed, private timeline and shop pages of a Lenta site

Each page is rendered into its mount points (regions) and the regions are
written out as HTML fragments, one file per region.

Site structure:

  site/
  ├── lenta.toml                   # Optional overrides of the stock config
  ├── posts/
  │   ├── index.json               # Feed records
  │   └── <slug>.html              # Post pages (meta description backfills excerpts)
  ├── shop-data.json               # Catalog: products and categories
  └── private-posts.json           # Private timeline

Output structure:

  dist/
  ├── feed/<region>.html
  ├── shop/<region>.html
  ├── product/<region>.html
  └── timeline/<region>.html

Run 'lenta gen-config' to print a documented lenta.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Site directory
    #[arg(long, default_value = "site", global = true)]
    site: PathBuf,

    /// Output directory for rendered fragments
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Fetch the feed and post pages from a live site instead of the site directory
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Clone)]
struct FeedArgs {
    /// URL fragment the page is opened with (`#lenta` opens the overlay)
    #[arg(long)]
    fragment: Option<String>,
    /// Category chip to select
    #[arg(long)]
    category: Option<String>,
    /// Overlay search query
    #[arg(long)]
    search: Option<String>,
}

#[derive(clap::Args, Clone)]
struct ShopArgs {
    /// Category filter (`all` or a category id)
    #[arg(long)]
    category: Option<String>,
    /// Search query over title and short description
    #[arg(long)]
    search: Option<String>,
    /// Sort order: popular, new, price-asc or price-desc
    #[arg(long)]
    sort: Option<String>,
    /// Show only preorder products
    #[arg(long)]
    preorder: bool,
    /// Step the promo strip this many items before writing the page
    #[arg(long, default_value_t = 0)]
    promo_steps: usize,
    /// Run the promo timer for this many milliseconds before writing the page
    #[arg(long)]
    rotate_ms: Option<u64>,
}

#[derive(clap::Args, Clone)]
struct TimelineArgs {
    /// Render as if the timeline had been unlocked
    #[arg(long)]
    unlocked: bool,
    /// Tab to show: all, media or about
    #[arg(long, default_value = "all", value_parser = parse_mode)]
    mode: Mode,
    /// Pages to load in the `all` tab
    #[arg(long, default_value_t = 1)]
    pages: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Render the feed page and its overlay
    Feed(FeedArgs),
    /// Render the shop page
    Shop(ShopArgs),
    /// Render the product page
    Product {
        /// Product id (falls back to the first product)
        #[arg(long)]
        id: Option<String>,
    },
    /// Render the private timeline
    Timeline(TimelineArgs),
    /// Render every page with default interactions
    Build,
    /// Validate the site data without rendering
    Check,
    /// Print a stock lenta.toml with all options documented
    GenConfig,
}

fn parse_mode(value: &str) -> Result<Mode, String> {
    Mode::from_key(value).ok_or_else(|| format!("unknown mode '{value}' (all, media, about)"))
}

fn product_query(id: Option<&str>) -> String {
    match id {
        Some(id) => url::form_urlencoded::Serializer::new(String::from("?"))
            .append_pair("id", id)
            .finish(),
        None => String::new(),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(&cli.site)?;
    let fetcher: Box<dyn Fetcher> = match &cli.base_url {
        Some(base) => Box::new(HttpFetcher::new(base)?),
        None => Box::new(SiteFetcher::new(&cli.site)),
    };
    let year = chrono::Local::now().year();
    let out = Some(cli.output.as_path());

    match &cli.command {
        Command::Feed(args) => {
            let request = FeedRequest {
                fragment: args.fragment.clone(),
                category: args.category.clone(),
                search: args.search.clone(),
            };
            let report = site::build_feed(&config, fetcher.as_ref(), &request, out)?;
            output::print_feed_report(&report);
        }
        Command::Shop(args) => {
            let request = ShopRequest {
                category: args.category.clone(),
                search: args.search.clone(),
                sort: args.sort.clone(),
                only_preorder: args.preorder,
                promo_steps: args.promo_steps,
                rotate_for: args.rotate_ms.map(Duration::from_millis),
            };
            let report = site::build_shop(&config, &cli.site, &request, year, out)?;
            output::print_shop_report(&report);
        }
        Command::Product { id } => {
            let query = product_query(id.as_deref());
            let report = site::build_product(&config, &cli.site, &query, year, out)?;
            output::print_product_report(&report);
        }
        Command::Timeline(args) => {
            let mut storage = HashMap::new();
            if args.unlocked {
                storage.insert(config.timeline.unlock_key.clone(), "1".to_string());
            }
            let request = TimelineRequest {
                storage,
                mode: args.mode,
                pages: args.pages,
            };
            let report = site::build_timeline(&config, &cli.site, &request, out)?;
            output::print_timeline_report(&report);
        }
        Command::Build => {
            println!("==> Feed");
            let report = site::build_feed(&config, fetcher.as_ref(), &FeedRequest::default(), out)?;
            output::print_feed_report(&report);

            println!("==> Shop");
            let report = site::build_shop(&config, &cli.site, &ShopRequest::default(), year, out)?;
            output::print_shop_report(&report);

            println!("==> Product");
            let report = site::build_product(&config, &cli.site, "", year, out)?;
            output::print_product_report(&report);

            println!("==> Timeline");
            let report = site::build_timeline(&config, &cli.site, &TimelineRequest::default(), out)?;
            output::print_timeline_report(&report);

            println!("==> Build complete: {}", cli.output.display());
        }
        Command::Check => {
            println!("==> Checking {}", cli.site.display());
            let report = site::check_site(&config, &cli.site, fetcher.as_ref());
            output::print_check_report(&report);
            if !report.is_ok() {
                return Err(format!("{} problem(s) in site data", report.errors.len()).into());
            }
        }
        Command::GenConfig => {}
    }

    Ok(())
}
