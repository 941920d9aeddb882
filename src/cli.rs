use std::path::PathBuf;

use clap::Parser;

/// Search used by `--test` when neither `--url` nor `--product` is given
pub const DEFAULT_TEST_PRODUCT: &str = "televisione";

/// Relevance term used by `--test` when no product is given
pub const FALLBACK_TEST_TERM: &str = "test";

#[derive(Parser, Debug)]
#[command(name = "subwatch")]
#[command(author, version, about = "Price watcher for classifieds search results", long_about = None)]
#[command(after_help = r#"Examples:
  subwatch --product "televisione" --min 100 --max 500 --pages 5
  subwatch --product "iphone" --min 200 --max 600 --region lombardia --limit 100
  subwatch --test --product "macbook"                 Check the parser on one page
  subwatch --test --url "https://www.subito.it/..."   Parse a specific results page
  subwatch --run                                      Monitor the saved searches
"#)]
pub struct Cli {
    /// Fetch and parse a single page, print up to 20 results, then exit
    #[arg(long)]
    pub test: bool,

    /// Results page to parse in test mode
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Product to search for
    #[arg(long, value_name = "NAME")]
    pub product: Option<String>,

    /// Minimum price
    #[arg(long, allow_negative_numbers = true)]
    pub min: Option<f64>,

    /// Maximum price
    #[arg(long, allow_negative_numbers = true)]
    pub max: Option<f64>,

    /// Category path segment (e.g. elettronica, arredamento)
    #[arg(long)]
    pub category: Option<String>,

    /// Region path segment (e.g. lombardia, lazio)
    #[arg(long)]
    pub region: Option<String>,

    /// Check interval in minutes
    #[arg(long, default_value_t = 30)]
    pub interval: u64,

    /// Maximum number of results to report
    #[arg(long, default_value_t = 50)]
    pub limit: usize,

    /// Number of result pages to check
    #[arg(long, default_value_t = 3)]
    pub pages: u32,

    /// Monitor the searches saved in the config file
    #[arg(long, conflicts_with_all = ["test", "product"])]
    pub run: bool,

    /// Print test-mode results as JSON
    #[arg(long)]
    pub json: bool,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// What the invocation asks for
#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    /// One-shot fetch + extract
    Test {
        url: Option<String>,
        product: Option<String>,
    },
    /// Replace saved searches with this one and monitor it
    Monitor { product: String, min: f64, max: f64 },
    /// Monitor the saved searches
    RunSaved,
    /// Nothing usable was given
    Usage,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.test {
            return Mode::Test {
                url: self.url.clone(),
                product: self.product.clone(),
            };
        }
        if self.run {
            return Mode::RunSaved;
        }
        match (&self.product, self.max) {
            (Some(product), Some(max)) => Mode::Monitor {
                product: product.clone(),
                min: self.min.unwrap_or(0.0),
                max,
            },
            _ => Mode::Usage,
        }
    }
}

/// Short usage text printed when no mode matches
pub fn usage() -> &'static str {
    "Usage: subwatch --product NAME --min MIN --max MAX [--category CATEGORY] [--region REGION] [--interval MINUTES] [--limit N] [--pages N]\n   or: subwatch --test [--url URL] [--product NAME]\n   or: subwatch --run"
}
