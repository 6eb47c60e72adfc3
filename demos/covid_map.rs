//! COVID choropleth demo for statemap-rs
//!
//! This demo shows how to:
//! - Point the loader at a boundary file and the four datasets
//! - Render the default selection and switch metrics and periods
//! - Drive the tooltip with pointer events
//!
//! Run from a directory holding the input files:
//!
//! ```text
//! cargo run --example covid_map -- us-10m.v1.json
//! ```

use statemap_rs::prelude::*;

fn main() -> Result<()> {
    println!("=== statemap-rs COVID map demo ===\n");

    let boundary = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "us-10m.v1.json".to_owned());

    let mut config = MapConfig::default();
    config.sources = Sources {
        boundary: Some(Resource::from(boundary)),
        cases: Some("covid_confirmed_usafacts.csv".into()),
        deaths: Some("covid_deaths_usafacts.csv".into()),
        population: Some("covid_county_population_usafacts.csv".into()),
        vaccination: Some("covid19_vaccinations_in_the_united_states.csv".into()),
    };

    let mut controller = Controller::new(config);
    let scene = controller.load()?;
    println!("Loaded {} shapes", scene.shapes.len());
    std::fs::write("cases_total.svg", scene.to_svg())?;
    println!("✓ cases_total.svg\n");

    // Periods available for the case counts
    let periods = controller
        .data()
        .map(|d| d.periods(Metric::Cases))
        .unwrap_or_default();
    println!("Case periods: {}", periods.len());

    if let Some(last) = periods.last().copied() {
        let scene = controller.set_period(last)?;
        std::fs::write("cases_latest_month.svg", scene.to_svg())?;
        println!("✓ cases_latest_month.svg ({last})");
    }

    for metric in [Metric::Deaths, Metric::Population, Metric::Vaccination] {
        match controller.set_metric(metric) {
            Ok(scene) => {
                let file = format!("{metric}.svg");
                std::fs::write(&file, scene.to_svg())?;
                println!("✓ {file}");
            }
            Err(e) => println!("✗ {metric}: {e}"),
        }
    }

    // Hover the middle of the map
    let tooltip = controller.handle_pointer(PointerEvent::Move { x: 480.0, y: 300.0 });
    if tooltip.visible {
        println!("\nTooltip at ({}, {}): {}", tooltip.x, tooltip.y, tooltip.text);
    }

    Ok(())
}
