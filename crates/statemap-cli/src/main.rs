//! statemap — command-line front end for statemap-core
//!
//! Loads a boundary file plus the configured CSV datasets and either writes
//! a choropleth SVG, prints the per-state values behind it, or lists the
//! periods a data type can be sliced by.
//!
//! Usage examples
//! --------------
//!
//! - Render total cases
//!   $ statemap -b us-10m.v1.json --cases covid_confirmed_usafacts.csv render
//!
//! - Render January 2021 in blues
//!   $ statemap -c map.json render -p 1-2021 --scheme blues -o jan.svg
//!
//! - Print vaccination rates as JSON
//!   $ statemap -c map.json summary -m vaccination --json
//!
//! Logging goes to stderr and follows `RUST_LOG` (default `warn`).
mod args;

use crate::args::{CliArgs, Commands};
use anyhow::Context;
use clap::Parser;
use statemap_core::format::format_reading;
use statemap_core::{
    Controller, MapConfig, Metric, Reading, Resource, SelectionSource, StateResolver,
};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    let mut config = MapConfig::load(args.config.as_deref()).context("loading config")?;
    apply_source_flags(&mut config, &args);
    tracing::debug!(sources = ?config.sources, command = ?args.command, "dispatching");

    match args.command {
        Commands::Render {
            selection,
            output,
            width,
            height,
            scheme,
            scale,
        } => {
            if let Some(w) = width {
                config.render.width = w;
            }
            if let Some(h) = height {
                config.render.height = h;
            }
            if let Some(s) = scheme {
                config.render.scheme = s.parse()?;
            }
            if let Some(s) = scale {
                config.render.scale = s.parse()?;
            }
            let mut controller = Controller::new(config);
            controller.load()?;
            let svg = controller.on_selection_change(&selection)?.to_svg();
            if output == "-" {
                print!("{svg}");
            } else {
                std::fs::write(&output, &svg).with_context(|| format!("writing {output}"))?;
                tracing::info!(path = %output, bytes = svg.len(), "wrote svg");
                eprintln!("Wrote {output} ({})", selection.selection()?);
            }
        }

        Commands::Summary { selection, json } => {
            let resolver = config.resolver();
            let decimals = config.render.percent_decimals;
            let mut controller = Controller::new(config);
            controller.load()?;
            let data = controller.data().context("no data loaded")?;
            let slice = data.slice(selection.selection()?)?;

            let rows: Vec<_> = all_states(&resolver)
                .map(|(code, name)| {
                    let reading = slice.reading(name);
                    (code, name, reading, format_reading(reading, slice.kind, decimals))
                })
                .collect();

            if json {
                let out: Vec<_> = rows
                    .iter()
                    .map(|(code, name, reading, text)| {
                        serde_json::json!({
                            "code": code,
                            "name": name,
                            "value": reading.value(),
                            "text": text,
                        })
                    })
                    .collect();
                let doc = serde_json::json!({
                    "selection": slice.selection,
                    "states": out,
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("{}:", slice.selection);
                for (code, name, reading, text) in &rows {
                    let marker = if *reading == Reading::NoData { " " } else { "*" };
                    println!("{marker} {code}  {name:<24} {text}");
                }
                let unresolved: Vec<_> = data.unresolved().collect();
                if !unresolved.is_empty() {
                    tracing::warn!(count = unresolved.len(), "unresolved state identifiers");
                    eprintln!("Unresolved identifiers: {}", unresolved.join(", "));
                }
            }
        }

        Commands::Periods { metric } => {
            let metric: Metric = metric.parse()?;
            let mut controller = Controller::new(config);
            controller.load()?;
            let data = controller.data().context("no data loaded")?;
            let periods = data.periods(metric);
            if periods.is_empty() {
                println!("No {metric} data loaded");
            } else {
                for p in periods {
                    println!("{:<6} {p}", p.granularity());
                }
            }
        }
    }

    Ok(())
}

fn apply_source_flags(config: &mut MapConfig, args: &CliArgs) {
    if let Some(b) = &args.boundary {
        config.sources.boundary = Some(Resource::from(b.as_str()));
    }
    let datasets = [
        (Metric::Cases, &args.cases),
        (Metric::Deaths, &args.deaths),
        (Metric::Population, &args.population),
        (Metric::Vaccination, &args.vaccination),
    ];
    for (metric, src) in datasets {
        if let Some(src) = src {
            config.sources.set_dataset(metric, Resource::from(src.as_str()));
        }
    }
    if args.territories {
        config.include_territories = true;
    }
}

fn all_states(resolver: &StateResolver) -> impl Iterator<Item = (&'static str, &'static str)> {
    resolver.map().iter().map(|s| (s.code, s.name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_flags_override_config() {
        let args = CliArgs::try_parse_from([
            "statemap",
            "summary",
            "-b",
            "us.json",
            "--cases",
            "cases.csv",
            "--territories",
        ])
        .unwrap();
        let mut config = MapConfig::default();
        config.sources.set_dataset(Metric::Cases, Resource::from("old.csv"));
        apply_source_flags(&mut config, &args);

        assert_eq!(config.sources.boundary, Some(Resource::from("us.json")));
        assert_eq!(
            config.sources.dataset(Metric::Cases),
            Some(&Resource::from("cases.csv"))
        );
        assert!(config.sources.dataset(Metric::Deaths).is_none());
        assert!(config.include_territories);
    }
}
