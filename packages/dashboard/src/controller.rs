//! The dashboard state machine.
//!
//! [`ViewController`] owns the filter state and decides, per trigger, which
//! outputs to recompute. Date and crime-type edits are staged until the
//! apply button promotes them; region clicks and resets take effect
//! immediately. Every cycle resolves the filters exactly once and derives
//! all of its outputs from that one resolution.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use arrest_tracker_analytics::{
    FilterCache, FilteredRecords, aggregate, aggregate_regions, crime_type_view, join,
    resolve_cached,
};
use arrest_tracker_analytics_models::{
    AggregateField, ChartKind, DateRange, FilterState, RegionOutcome, Trigger,
};
use arrest_tracker_dataset::Dataset;
use arrest_tracker_geography_models::{RegionKey, RegionSignal, ViewMode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::DashboardSettings;
use crate::render::{ChartRenderer, ChartSpec};
use crate::titles::{age_chart_title, crime_chart_title, gender_chart_title};

/// Errors raised when a batch of events cannot be processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    /// The batch was empty.
    #[error("No trigger fired")]
    NoTrigger,

    /// More than one control fired in the same cycle.
    #[error("{} triggers fired in one cycle: {}", .0.len(), format_triggers(.0))]
    ConcurrentTriggers(Vec<Trigger>),
}

fn format_triggers(triggers: &[Trigger]) -> String {
    triggers
        .iter()
        .map(Trigger::as_ref)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The committable part of the filter state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSelection {
    /// Date range; `None` means every date.
    pub date_range: Option<DateRange>,
    /// Offense descriptions; empty means every type.
    pub crime_types: BTreeSet<String>,
}

/// One user interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "trigger",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum UiEvent {
    /// Switch the map layer. Without a `mode`, flips the current one.
    ToggleView {
        /// Layer to show.
        #[serde(default)]
        mode: Option<ViewMode>,
    },
    /// The crime-type multi-select changed.
    ChangeCrimeSelection {
        /// Selected offense descriptions.
        #[serde(default)]
        crime_types: Vec<String>,
    },
    /// The date picker changed.
    ChangeDateRange {
        /// First day.
        #[serde(default)]
        start: Option<NaiveDate>,
        /// Last day.
        #[serde(default)]
        end: Option<NaiveDate>,
    },
    /// A map region was clicked.
    ClickRegion {
        /// Raw map selection payload.
        #[serde(default)]
        signal: serde_json::Value,
    },
    /// The apply button was clicked.
    ClickApply,
    /// The reset button was clicked.
    ClickReset,
}

impl UiEvent {
    /// The trigger this event represents.
    #[must_use]
    pub const fn trigger(&self) -> Trigger {
        match self {
            Self::ToggleView { .. } => Trigger::ToggleView,
            Self::ChangeCrimeSelection { .. } => Trigger::ChangeCrimeSelection,
            Self::ChangeDateRange { .. } => Trigger::ChangeDateRange,
            Self::ClickRegion { .. } => Trigger::ClickRegion,
            Self::ClickApply => Trigger::ClickApply,
            Self::ClickReset => Trigger::ClickReset,
        }
    }
}

/// A rendered auxiliary chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "spec", rename_all = "camelCase")]
pub enum ChartOutput {
    /// Chart built from at least one record.
    Ready(ChartSpec),
    /// Placeholder shown when no record passed the filters.
    NoData(ChartSpec),
}

impl ChartOutput {
    /// The chart spec, whichever variant this is.
    #[must_use]
    pub const fn spec(&self) -> &ChartSpec {
        match self {
            Self::Ready(spec) | Self::NoData(spec) => spec,
        }
    }

    /// Returns `true` for the placeholder variant.
    #[must_use]
    pub const fn is_no_data(&self) -> bool {
        matches!(self, Self::NoData(_))
    }
}

/// Outputs of one update cycle. `None` means "leave unchanged".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardUpdate {
    /// Control that fired.
    pub trigger: Trigger,
    /// Choropleth map.
    pub map: Option<ChartSpec>,
    /// Crime-type chart.
    pub crime_chart: Option<ChartOutput>,
    /// Gender chart.
    pub gender_chart: Option<ChartOutput>,
    /// Age-group chart.
    pub age_chart: Option<ChartOutput>,
    /// Records behind the auxiliary charts, when they were recomputed.
    pub matched_records: Option<usize>,
    /// What happened to the region predicate, when it was evaluated.
    pub region: Option<RegionOutcome>,
}

impl DashboardUpdate {
    const fn unchanged(trigger: Trigger) -> Self {
        Self {
            trigger,
            map: None,
            crime_chart: None,
            gender_chart: None,
            age_chart: None,
            matched_records: None,
            region: None,
        }
    }

    /// Returns `true` if the cycle produced no output.
    #[must_use]
    pub const fn is_unchanged(&self) -> bool {
        self.map.is_none()
            && self.crime_chart.is_none()
            && self.gender_chart.is_none()
            && self.age_chart.is_none()
    }
}

/// Snapshot of the controller's filter state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ControllerState {
    /// Values shown in the controls.
    pub staged: FilterSelection,
    /// Values currently affecting output.
    pub active: FilterSelection,
    /// Region selected on the map.
    pub selected_region: Option<RegionKey>,
    /// Map layer.
    pub view_mode: ViewMode,
}

struct AuxCharts {
    crime: ChartOutput,
    gender: ChartOutput,
    age: ChartOutput,
}

/// Drives dashboard updates for one session.
pub struct ViewController<R> {
    dataset: Arc<Dataset>,
    renderer: R,
    settings: DashboardSettings,
    staged: FilterSelection,
    active: FilterSelection,
    selected_region: Option<RegionKey>,
    view_mode: ViewMode,
    cache: FilterCache,
}

impl<R: ChartRenderer> ViewController<R> {
    /// Creates a controller in its default state.
    #[must_use]
    pub fn new(dataset: Arc<Dataset>, renderer: R, settings: DashboardSettings) -> Self {
        Self {
            dataset,
            renderer,
            settings,
            staged: FilterSelection::default(),
            active: FilterSelection::default(),
            selected_region: None,
            view_mode: ViewMode::default(),
            cache: FilterCache::new(settings.cache_ttl(), settings.cache_capacity),
        }
    }

    /// The dataset this controller reads.
    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Current filter state.
    #[must_use]
    pub fn state(&self) -> ControllerState {
        ControllerState {
            staged: self.staged.clone(),
            active: self.active.clone(),
            selected_region: self.selected_region,
            view_mode: self.view_mode,
        }
    }

    /// Renders every output from the current state.
    pub fn initial(&mut self) -> DashboardUpdate {
        self.full_update(Trigger::Initial)
    }

    /// Processes a batch of events that fired in the same cycle.
    ///
    /// # Errors
    ///
    /// * [`ControllerError::NoTrigger`] if `events` is empty
    /// * [`ControllerError::ConcurrentTriggers`] if it holds more than one
    ///   event
    pub fn dispatch(&mut self, events: Vec<UiEvent>) -> Result<DashboardUpdate, ControllerError> {
        let mut events = events.into_iter();
        match (events.next(), events.next()) {
            (None, _) => Err(ControllerError::NoTrigger),
            (Some(event), None) => Ok(self.handle(event)),
            (Some(first), Some(second)) => {
                let triggers = [first, second]
                    .iter()
                    .chain(events.as_slice())
                    .map(UiEvent::trigger)
                    .collect();
                Err(ControllerError::ConcurrentTriggers(triggers))
            }
        }
    }

    /// Processes one event and returns the outputs it changed.
    pub fn handle(&mut self, event: UiEvent) -> DashboardUpdate {
        let trigger = event.trigger();
        log::debug!("Handling {trigger}");

        match event {
            UiEvent::ToggleView { mode } => {
                self.view_mode = mode.unwrap_or_else(|| self.view_mode.toggled());
                self.map_update(trigger)
            }
            UiEvent::ChangeCrimeSelection { crime_types } => {
                self.staged.crime_types = crime_types
                    .into_iter()
                    .map(|c| c.trim().to_string())
                    .filter(|c| !c.is_empty())
                    .collect();
                DashboardUpdate::unchanged(trigger)
            }
            UiEvent::ChangeDateRange { start, end } => {
                self.staged.date_range = self.clamp_range(start, end);
                DashboardUpdate::unchanged(trigger)
            }
            UiEvent::ClickApply => {
                self.active = self.staged.clone();
                self.full_update(trigger)
            }
            UiEvent::ClickRegion { signal } => {
                self.select_region(&RegionSignal::parse(&signal));
                self.full_update(trigger)
            }
            UiEvent::ClickReset => {
                self.staged = FilterSelection::default();
                self.active = FilterSelection::default();
                self.selected_region = None;
                self.full_update(trigger)
            }
        }
    }

    fn select_region(&mut self, signal: &RegionSignal) {
        match signal {
            RegionSignal::Cleared => self.selected_region = None,
            RegionSignal::Selected(key) if self.is_known(*key) => {
                self.selected_region = Some(*key);
            }
            RegionSignal::Selected(key) => {
                log::debug!("Ignoring selection of unknown region {key}");
            }
            RegionSignal::Unrecognized(raw) => {
                log::debug!("Ignoring unrecognized region '{raw}'");
            }
        }
    }

    fn is_known(&self, key: RegionKey) -> bool {
        match key {
            RegionKey::Borough { .. } => true,
            RegionKey::Precinct { id } => self.dataset.knows_precinct(id),
        }
    }

    /// Intersects the picked range with the dataset's bounds. A range that
    /// misses the data entirely, or runs backwards, is kept as picked so it
    /// matches nothing.
    fn clamp_range(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<DateRange> {
        if start.is_none() && end.is_none() {
            return None;
        }
        let picked = DateRange { start, end };
        let Some(bounds) = self.dataset.date_bounds() else {
            return Some(picked);
        };
        let overlaps = start.is_none_or(|s| s <= bounds.max)
            && end.is_none_or(|e| e >= bounds.min)
            && picked.bounds().is_none_or(|(s, e)| s <= e);
        if !overlaps {
            return Some(picked);
        }
        Some(DateRange {
            start: start.map(|s| bounds.clamp(s)),
            end: end.map(|e| bounds.clamp(e)),
        })
    }

    fn filter_state(&self) -> FilterState {
        FilterState {
            date_range: self.active.date_range,
            crime_types: self.active.crime_types.clone(),
            selected_region: self.selected_region,
            view_mode: self.view_mode,
        }
    }

    fn full_update(&mut self, trigger: Trigger) -> DashboardUpdate {
        let dataset = Arc::clone(&self.dataset);
        let filtered = self.resolve(&dataset, trigger);
        let map = self.render_map(&dataset, &filtered);
        let charts = self.render_aux(&filtered);
        DashboardUpdate {
            trigger,
            map: Some(map),
            crime_chart: Some(charts.crime),
            gender_chart: Some(charts.gender),
            age_chart: Some(charts.age),
            matched_records: Some(filtered.len()),
            region: Some(filtered.region_outcome()),
        }
    }

    fn map_update(&mut self, trigger: Trigger) -> DashboardUpdate {
        let dataset = Arc::clone(&self.dataset);
        let filtered = self.resolve(&dataset, trigger);
        DashboardUpdate {
            map: Some(self.render_map(&dataset, &filtered)),
            ..DashboardUpdate::unchanged(trigger)
        }
    }

    fn resolve<'d>(&mut self, dataset: &'d Dataset, trigger: Trigger) -> FilteredRecords<'d> {
        let filters = self.filter_state();
        let filtered = resolve_cached(
            dataset.records(),
            &filters,
            trigger,
            &mut self.cache,
            Instant::now(),
        );
        log::debug!(
            "{trigger}: {} of {} records ({} before region filter)",
            filtered.len(),
            dataset.records().len(),
            filtered.unregioned_len()
        );
        filtered
    }

    fn render_map(&self, dataset: &Dataset, filtered: &FilteredRecords<'_>) -> ChartSpec {
        let counts = aggregate_regions(filtered.unregioned(), self.view_mode);
        let table = join(&counts, dataset.region_layer(self.view_mode), self.view_mode);
        let highlighted = self
            .selected_region
            .filter(|key| key.view_mode() == self.view_mode);
        self.renderer.choropleth(&table, highlighted)
    }

    fn render_aux(&self, filtered: &FilteredRecords<'_>) -> AuxCharts {
        if filtered.is_empty() {
            let crime = match self.settings.crime_chart {
                ChartKind::Bar => self.renderer.empty_bar(),
                ChartKind::Pie => self.renderer.empty_pie(),
            };
            return AuxCharts {
                crime: ChartOutput::NoData(crime),
                gender: ChartOutput::NoData(self.renderer.empty_pie()),
                age: ChartOutput::NoData(self.renderer.empty_pie()),
            };
        }

        let region = filtered.region_outcome().applied();
        let crime_types = &self.active.crime_types;

        let view = crime_type_view(
            filtered.records(),
            crime_types,
            self.settings.crime_chart,
            self.settings.restrict_selection_max,
        );
        let crime_title = crime_chart_title(view.mode, region, crime_types);
        let crime = match self.settings.crime_chart {
            ChartKind::Bar => {
                self.renderer
                    .bar(&view.table, AggregateField::CrimeType, &crime_title)
            }
            ChartKind::Pie => {
                self.renderer
                    .pie(&view.table, AggregateField::CrimeType, &crime_title)
            }
        };

        let gender = self.renderer.pie(
            &aggregate(filtered.records(), AggregateField::Sex),
            AggregateField::Sex,
            &gender_chart_title(region, crime_types),
        );
        let age = self.renderer.pie(
            &aggregate(filtered.records(), AggregateField::AgeGroup),
            AggregateField::AgeGroup,
            &age_chart_title(region, crime_types),
        );

        AuxCharts {
            crime: ChartOutput::Ready(crime),
            gender: ChartOutput::Ready(gender),
            age: ChartOutput::Ready(age),
        }
    }
}
