use clap::{Args, Parser, Subcommand};
use statemap_core::SelectionSource;
use std::path::PathBuf;

/// CLI arguments for statemap
#[derive(Debug, Parser)]
#[command(
    name = "statemap",
    version,
    about = "Render per-state choropleth maps from a US boundary file and CSV datasets"
)]
pub struct CliArgs {
    /// JSON config file (render options, column names, sources)
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Boundary file or URL (TopoJSON or GeoJSON, optionally .gz)
    #[arg(short = 'b', long = "boundary", global = true)]
    pub boundary: Option<String>,

    /// Case counts CSV (dated columns)
    #[arg(long = "cases", global = true)]
    pub cases: Option<String>,

    /// Death counts CSV (dated columns)
    #[arg(long = "deaths", global = true)]
    pub deaths: Option<String>,

    /// Population CSV
    #[arg(long = "population", global = true)]
    pub population: Option<String>,

    /// Vaccination CSV
    #[arg(long = "vaccination", global = true)]
    pub vaccination: Option<String>,

    /// Include the five inhabited territories
    #[arg(long = "territories", global = true)]
    pub territories: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// The (data type, time period) selectors.
#[derive(Debug, Clone, Args)]
pub struct SelectionArgs {
    /// cases, deaths, population or vaccination
    #[arg(short = 'm', long = "metric", default_value = "cases")]
    pub metric: String,

    /// total, YYYY or M-YYYY
    #[arg(short = 'p', long = "period", default_value = "total")]
    pub period: String,
}

impl SelectionSource for SelectionArgs {
    fn data_type(&self) -> String {
        self.metric.clone()
    }

    fn time_period(&self) -> String {
        self.period.clone()
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Write the map as an SVG document
    Render {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Output file; `-` writes to stdout
        #[arg(short = 'o', long = "output", default_value = "map.svg")]
        output: String,

        #[arg(long = "width")]
        width: Option<f64>,

        #[arg(long = "height")]
        height: Option<f64>,

        /// reds, blues, greens, oranges or purples
        #[arg(long = "scheme")]
        scheme: Option<String>,

        /// quantize, threshold or sequential
        #[arg(long = "scale")]
        scale: Option<String>,
    },

    /// Print per-state values for a selection
    Summary {
        #[command(flatten)]
        selection: SelectionArgs,

        /// Emit JSON instead of a table
        #[arg(long = "json")]
        json: bool,
    },

    /// List the periods available for a data type
    Periods {
        /// cases, deaths, population or vaccination
        #[arg(short = 'm', long = "metric", default_value = "cases")]
        metric: String,
    },
}
