// crates/statemap-core/src/controller.rs

//! # Controller
//!
//! Owns the loaded data and the single [`Renderer`], and re-renders on every
//! selection change. Any selector change re-reads *both* selectors so the
//! rendered pair is always consistent.

use crate::boundary::Boundary;
use crate::config::MapConfig;
use crate::error::{MapError, Result};
use crate::loader::{self, Loaded};
use crate::model::{DataMap, Metric, Selection};
use crate::period::Period;
use crate::render::{PointerEvent, Renderer, Scene, Tooltip};

/// Lifecycle of a [`Controller`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Rendered(Selection),
}

/// Anything exposing the two selector values (form controls, CLI flags).
pub trait SelectionSource {
    fn data_type(&self) -> String;
    fn time_period(&self) -> String;

    /// Parses both selectors into one pair.
    fn selection(&self) -> Result<Selection> {
        let metric: Metric = self.data_type().parse()?;
        let period: Period = self.time_period().parse()?;
        Ok(Selection::new(metric, period))
    }
}

impl SelectionSource for Selection {
    fn data_type(&self) -> String {
        self.metric.to_string()
    }

    fn time_period(&self) -> String {
        self.period.to_string()
    }

    fn selection(&self) -> Result<Selection> {
        Ok(*self)
    }
}

#[derive(Debug)]
pub struct Controller {
    config: MapConfig,
    phase: Phase,
    renderer: Renderer,
    boundary: Option<Boundary>,
    data: Option<DataMap>,
    /// Selector values as given, before normalization.
    requested: Option<Selection>,
}

impl Controller {
    pub fn new(config: MapConfig) -> Self {
        let renderer = Renderer::new(config.render.clone(), config.resolver());
        Self {
            config,
            phase: Phase::Idle,
            renderer,
            boundary: None,
            data: None,
            requested: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn data(&self) -> Option<&DataMap> {
        self.data.as_ref()
    }

    pub fn boundary(&self) -> Option<&Boundary> {
        self.boundary.as_ref()
    }

    /// The current scene, present only after a successful render.
    pub fn scene(&self) -> Option<&Scene> {
        match self.phase {
            Phase::Rendered(_) => Some(self.renderer.scene()),
            _ => None,
        }
    }

    pub fn selection(&self) -> Option<Selection> {
        match self.phase {
            Phase::Rendered(s) => Some(s),
            _ => None,
        }
    }

    /// The selector pair behind the current render, as the user left it.
    /// Differs from [`Controller::selection`] when an untimed metric dropped
    /// the period.
    pub fn requested(&self) -> Option<Selection> {
        self.requested
    }

    /// Loads every configured source, then renders the default selection.
    /// A failure leaves the controller idle with no scene.
    pub fn load(&mut self) -> Result<&Scene> {
        self.phase = Phase::Loading;
        let result = loader::load(&self.config.sources, &self.config.object)
            .and_then(|loaded| self.install_data(loaded));
        match result {
            Ok(()) => Ok(self.renderer.scene()),
            Err(e) => Err(self.fail(e)),
        }
    }

    /// Builds the data map from already loaded inputs and renders the
    /// default selection. A failure leaves the controller idle.
    pub fn install(&mut self, loaded: Loaded) -> Result<&Scene> {
        self.phase = Phase::Loading;
        match self.install_data(loaded) {
            Ok(()) => Ok(self.renderer.scene()),
            Err(e) => Err(self.fail(e)),
        }
    }

    fn install_data(&mut self, loaded: Loaded) -> Result<()> {
        let data = DataMap::from_tables(
            self.config.resolver(),
            &self.config.columns,
            &loaded.tables,
        );
        self.boundary = Some(loaded.boundary);
        self.data = Some(data);
        let initial = self.initial_selection();
        self.apply(initial)
    }

    fn fail(&mut self, e: MapError) -> MapError {
        tracing::error!(error = %e, "failed to load map data");
        self.phase = Phase::Idle;
        self.boundary = None;
        self.data = None;
        self.requested = None;
        e
    }

    /// `cases`/`Total` when cases were loaded, else the first loaded metric.
    fn initial_selection(&self) -> Selection {
        let metric = self
            .data
            .as_ref()
            .and_then(|d| {
                if d.is_loaded(Metric::Cases) {
                    Some(Metric::Cases)
                } else {
                    d.loaded().next()
                }
            })
            .unwrap_or_default();
        Selection::new(metric, Period::Total)
    }

    /// Re-reads both selectors and re-renders.
    pub fn on_selection_change(&mut self, source: &impl SelectionSource) -> Result<&Scene> {
        let selection = source.selection()?;
        self.render(selection)
    }

    /// Changes the data type, keeping the requested period.
    pub fn set_metric(&mut self, metric: Metric) -> Result<&Scene> {
        let period = self.requested.map(|s| s.period).unwrap_or_default();
        self.render(Selection::new(metric, period))
    }

    /// Changes the period, keeping the requested data type.
    pub fn set_period(&mut self, period: Period) -> Result<&Scene> {
        let metric = self.requested.map(|s| s.metric).unwrap_or_default();
        self.render(Selection::new(metric, period))
    }

    /// Renders `selection`. On error the previous scene is kept.
    pub fn render(&mut self, selection: Selection) -> Result<&Scene> {
        self.apply(selection)?;
        Ok(self.renderer.scene())
    }

    fn apply(&mut self, requested: Selection) -> Result<()> {
        let (Some(boundary), Some(data)) = (self.boundary.as_ref(), self.data.as_ref()) else {
            return Err(MapError::InvalidSelection(
                "no data loaded; call load() first".into(),
            ));
        };
        let slice = data.slice(requested)?;
        self.renderer.render(boundary, &slice)?;
        self.phase = Phase::Rendered(slice.selection);
        self.requested = Some(requested);
        Ok(())
    }

    pub fn handle_pointer(&mut self, event: PointerEvent) -> &Tooltip {
        self.renderer.handle_pointer(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::boundary::fixtures::TWO_SQUARES;
    use crate::model::Reading;
    use crate::table::Table;
    use std::collections::BTreeMap;

    struct Form {
        data_type: &'static str,
        time_period: &'static str,
    }

    impl SelectionSource for Form {
        fn data_type(&self) -> String {
            self.data_type.to_owned()
        }
        fn time_period(&self) -> String {
            self.time_period.to_owned()
        }
    }

    fn loaded() -> Loaded {
        let cases = Table::from_records([
            [("State", "AL"), ("1/5/20", "10"), ("2/1/21", "30")],
            [("State", "AK"), ("1/5/20", "0"), ("2/1/21", "4")],
        ]);
        let vax = Table::from_records([[
            ("Jurisdiction", "Alabama"),
            ("Percent of total pop with at least one dose", "55.5"),
        ]]);
        let mut tables = BTreeMap::new();
        tables.insert(Metric::Cases, cases);
        tables.insert(Metric::Vaccination, vax);
        Loaded {
            boundary: Boundary::from_slice(TWO_SQUARES.as_bytes(), "states").unwrap(),
            tables,
        }
    }

    fn controller() -> Controller {
        let mut c = Controller::new(MapConfig::default());
        c.install(loaded()).unwrap();
        c
    }

    #[test]
    fn starts_idle_without_scene() {
        let c = Controller::new(MapConfig::default());
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.scene().is_none());
    }

    #[test]
    fn install_renders_cases_total() {
        let c = controller();
        assert_eq!(
            c.phase(),
            Phase::Rendered(Selection::new(Metric::Cases, Period::Total))
        );
        let scene = c.scene().unwrap();
        assert_eq!(scene.shape("Alabama").unwrap().label, "Alabama: 40");
    }

    #[test]
    fn selection_change_reads_both_selectors() {
        let mut c = controller();
        let form = Form {
            data_type: "cases",
            time_period: "2020",
        };
        let scene = c.on_selection_change(&form).unwrap();
        assert_eq!(scene.shape("Alabama").unwrap().reading, Reading::Value(10.0));
        assert_eq!(scene.shape("Alaska").unwrap().reading, Reading::Zero);

        c.set_period(Period::month(2, 2021)).unwrap();
        assert_eq!(
            c.selection(),
            Some(Selection::new(Metric::Cases, Period::month(2, 2021)))
        );
    }

    #[test]
    fn untimed_metric_drops_period() {
        let mut c = controller();
        c.set_period(Period::year(2021)).unwrap();
        let scene = c.set_metric(Metric::Vaccination).unwrap();
        assert_eq!(scene.shape("Alabama").unwrap().label, "Alabama: 55.50%");
        assert_eq!(scene.shape("Alaska").unwrap().label, "Alaska: No data");
        assert_eq!(
            c.selection(),
            Some(Selection::new(Metric::Vaccination, Period::Total))
        );
    }

    #[test]
    fn unavailable_metric_keeps_previous_render() {
        let mut c = controller();
        let before = c.selection();
        let err = c.set_metric(Metric::Deaths).unwrap_err();
        assert!(matches!(err, MapError::MetricUnavailable(_)));
        assert_eq!(c.selection(), before);
        assert_eq!(c.scene().unwrap().shapes.len(), 3);
    }

    #[test]
    fn bad_selector_value_is_rejected() {
        let mut c = controller();
        let form = Form {
            data_type: "weather",
            time_period: "total",
        };
        assert!(matches!(
            c.on_selection_change(&form),
            Err(MapError::InvalidSelection(_))
        ));
    }

    #[test]
    fn failed_load_leaves_no_scene() {
        let mut config = MapConfig::default();
        config.sources.boundary = Some("/no/such/us.json".into());
        let mut c = Controller::new(config);
        assert!(c.load().is_err());
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.scene().is_none());
    }

    #[test]
    fn period_survives_an_untimed_metric() {
        let mut c = controller();
        c.set_period(Period::year(2021)).unwrap();
        c.set_metric(Metric::Vaccination).unwrap();
        assert_eq!(
            c.selection(),
            Some(Selection::new(Metric::Vaccination, Period::Total))
        );
        assert_eq!(
            c.requested(),
            Some(Selection::new(Metric::Vaccination, Period::year(2021)))
        );

        let scene = c.set_metric(Metric::Cases).unwrap();
        assert_eq!(scene.shape("Alabama").unwrap().reading, Reading::Value(30.0));
        assert_eq!(
            c.selection(),
            Some(Selection::new(Metric::Cases, Period::year(2021)))
        );
    }

    #[test]
    fn failed_initial_render_returns_to_idle() {
        let mut c = Controller::new(MapConfig::default());
        let boundary_only = Loaded {
            boundary: Boundary::from_slice(TWO_SQUARES.as_bytes(), "states").unwrap(),
            tables: BTreeMap::new(),
        };
        let err = c.install(boundary_only).unwrap_err();
        assert!(matches!(err, MapError::MetricUnavailable(m) if m == "cases"));
        assert_eq!(c.phase(), Phase::Idle);
        assert!(c.scene().is_none());
        assert!(c.data().is_none());
        assert!(c.boundary().is_none());
        assert!(c.requested().is_none());
    }

    #[test]
    fn many_switches_keep_one_shape_per_feature() {
        let mut c = controller();
        for i in 0..20 {
            let metric = if i % 2 == 0 {
                Metric::Vaccination
            } else {
                Metric::Cases
            };
            c.set_metric(metric).unwrap();
        }
        assert_eq!(c.scene().unwrap().shapes.len(), 3);
    }
}
