//! Reactive controller.
//!
//! Widget changes propagate in one direction: product, then layer, then
//! time, then render. A change re-runs every stage downstream of it, so a
//! product change never renders with a stale layer or time.

use std::sync::Arc;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use wms_common::{LayerId, TimeValue, WmsError, WmsResult};
use wms_protocol::{Capabilities, WmsService};

use crate::catalog::CatalogIndex;
use crate::config::ExplorerConfig;
use crate::resolver::TimeDimensionResolver;
use crate::surface::{RenderSurface, RenderUpdate, TileOverlay};
use crate::template::TileUrlTemplater;

/// Where a session is in its propagation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerState {
    #[default]
    Idle,
    /// Product changed; layer options not yet recomputed
    AwaitingProductChange,
    /// Layer changed; time options not yet recomputed
    AwaitingLayerChange,
    /// Time is being dragged or has settled but not yet rendered
    AwaitingTimeSettle,
    /// GetMap request in flight
    Rendering,
}

/// A widget change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "widget", content = "value", rename_all = "snake_case")]
pub enum UiEvent {
    Product(String),
    Layer(String),
    /// Time slider moving; updates the selection without rendering
    TimeDrag(TimeValue),
    /// Time slider released
    Time(TimeValue),
    /// Re-render the current selection
    Refresh,
}

/// Propagation stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Recompute layer options for the selected product
    Product,
    /// Recompute time options for the selected layer
    Layer,
    /// Build the template, legend and overlay for the selected time
    Time,
}

/// What one event caused.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Stage the event entered at; `None` when nothing propagated
    pub entry: Option<Stage>,
    /// Stages executed, in order
    pub stages: Vec<Stage>,
    /// Whether a new overlay was produced
    pub rendered: bool,
}

impl PassReport {
    pub fn recomputed_layers(&self) -> bool {
        self.stages.contains(&Stage::Product)
    }

    pub fn recomputed_times(&self) -> bool {
        self.stages.contains(&Stage::Layer)
    }
}

/// Per-session selection and widget options.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionContext {
    pub label: String,
    pub product: String,
    pub layer: String,
    pub time: Option<TimeValue>,
    pub layer_options: Vec<String>,
    pub time_options: Vec<TimeValue>,
    pub overlay: Option<TileOverlay>,
    pub state: ControllerState,
    pub passes: u64,
}

impl SessionContext {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }
}

/// Drives catalog, resolver and templater from widget events.
///
/// Shared between sessions; all per-session state lives in
/// [`SessionContext`].
pub struct ReactiveController {
    catalog: Arc<CatalogIndex>,
    capabilities: Arc<Capabilities>,
    resolver: TimeDimensionResolver,
    templater: TileUrlTemplater,
}

impl ReactiveController {
    pub fn new(
        capabilities: Arc<Capabilities>,
        service: Arc<dyn WmsService>,
        config: Arc<ExplorerConfig>,
    ) -> Self {
        let catalog = Arc::new(CatalogIndex::build(capabilities.layer_ids()));
        let resolver = TimeDimensionResolver::new(capabilities.clone(), config.max_time_steps);
        let templater = TileUrlTemplater::new(service, config);

        Self {
            catalog,
            capabilities,
            resolver,
            templater,
        }
    }

    pub fn catalog(&self) -> &CatalogIndex {
        &self.catalog
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Select the first product and run a full pass.
    #[instrument(skip_all, fields(session = %ctx.label))]
    pub async fn initialize(
        &self,
        ctx: &mut SessionContext,
        surface: &mut dyn RenderSurface,
    ) -> WmsResult<PassReport> {
        let products = self.catalog.products();
        let Some(first) = products.first() else {
            let err = WmsError::InternalError("Catalog has no named layers".to_string());
            surface.apply(RenderUpdate::Status(Some(status_message(&err))));
            return Err(err);
        };

        ctx.product = first.to_string();
        surface.apply(RenderUpdate::ProductOptions {
            options: products.iter().map(|p| p.to_string()).collect(),
            selected: ctx.product.clone(),
        });

        self.run_pass(ctx, Stage::Product, surface).await
    }

    /// Apply one widget event and propagate it downstream.
    #[instrument(skip_all, fields(session = %ctx.label, event = ?event))]
    pub async fn handle(
        &self,
        ctx: &mut SessionContext,
        event: UiEvent,
        surface: &mut dyn RenderSurface,
    ) -> WmsResult<PassReport> {
        let entry = match self.apply_event(ctx, event, surface) {
            Ok(entry) => entry,
            Err(err) => {
                warn!(error = %err, "Rejected widget event");
                counter!("explorer_pass_errors_total").increment(1);
                surface.apply(RenderUpdate::Status(Some(status_message(&err))));
                return Err(err);
            }
        };

        match entry {
            Some(stage) => self.run_pass(ctx, stage, surface).await,
            None => Ok(PassReport::default()),
        }
    }

    /// Record the event in the selection; returns the stage to start from.
    fn apply_event(
        &self,
        ctx: &mut SessionContext,
        event: UiEvent,
        surface: &mut dyn RenderSurface,
    ) -> WmsResult<Option<Stage>> {
        match event {
            UiEvent::Product(product) => {
                if !self.catalog.contains_product(&product) {
                    return Err(WmsError::UnknownProduct(product));
                }
                ctx.product = product;
                Ok(Some(Stage::Product))
            }
            UiEvent::Layer(layer) => {
                if self.catalog.layer_id(&ctx.product, &layer).is_none() {
                    return Err(WmsError::LayerNotFound(format!("{}/{}", ctx.product, layer)));
                }
                ctx.layer = layer;
                Ok(Some(Stage::Layer))
            }
            UiEvent::TimeDrag(time) => {
                ensure_time_option(ctx, &time)?;
                ctx.time = Some(time.clone());
                ctx.state = ControllerState::AwaitingTimeSettle;
                surface.apply(RenderUpdate::TimeSelected(time));
                Ok(None)
            }
            UiEvent::Time(time) => {
                ensure_time_option(ctx, &time)?;
                ctx.time = Some(time);
                Ok(Some(Stage::Time))
            }
            UiEvent::Refresh => Ok(Some(Stage::Time)),
        }
    }

    async fn run_pass(
        &self,
        ctx: &mut SessionContext,
        entry: Stage,
        surface: &mut dyn RenderSurface,
    ) -> WmsResult<PassReport> {
        counter!("explorer_reactive_passes_total").increment(1);
        ctx.passes += 1;

        let mut report = PassReport {
            entry: Some(entry),
            ..Default::default()
        };
        let result = self.propagate(ctx, entry, surface, &mut report).await;
        ctx.state = ControllerState::Idle;

        match result {
            Ok(()) => {
                surface.apply(RenderUpdate::Status(None));
                debug!(stages = ?report.stages, "Pass complete");
                Ok(report)
            }
            Err(err) => {
                warn!(error = %err, stages = ?report.stages, "Pass aborted");
                counter!("explorer_pass_errors_total").increment(1);
                surface.apply(RenderUpdate::Status(Some(status_message(&err))));
                Err(err)
            }
        }
    }

    async fn propagate(
        &self,
        ctx: &mut SessionContext,
        entry: Stage,
        surface: &mut dyn RenderSurface,
        report: &mut PassReport,
    ) -> WmsResult<()> {
        if entry <= Stage::Product {
            ctx.state = ControllerState::AwaitingProductChange;
            self.refresh_layers(ctx, surface)?;
            report.stages.push(Stage::Product);
        }
        if entry <= Stage::Layer {
            ctx.state = ControllerState::AwaitingLayerChange;
            self.refresh_times(ctx, surface)?;
            report.stages.push(Stage::Layer);
        }

        ctx.state = ControllerState::AwaitingTimeSettle;
        report.stages.push(Stage::Time);
        self.render(ctx, surface).await?;
        report.rendered = true;
        Ok(())
    }

    /// Layer options for the selected product; selects the first.
    fn refresh_layers(
        &self,
        ctx: &mut SessionContext,
        surface: &mut dyn RenderSurface,
    ) -> WmsResult<()> {
        let options: Vec<String> = self
            .catalog
            .sublayers(&ctx.product)
            .into_iter()
            .map(str::to_string)
            .collect();
        let first = options
            .first()
            .cloned()
            .ok_or_else(|| WmsError::UnknownProduct(ctx.product.clone()))?;

        ctx.layer = first;
        ctx.layer_options = options;
        surface.apply(RenderUpdate::LayerOptions {
            options: ctx.layer_options.clone(),
            selected: ctx.layer.clone(),
        });
        Ok(())
    }

    /// Time options for the selected layer; selects the first.
    fn refresh_times(
        &self,
        ctx: &mut SessionContext,
        surface: &mut dyn RenderSurface,
    ) -> WmsResult<()> {
        let layer_id = self.selected_layer(ctx)?;
        let extent = self.resolver.resolve(&layer_id)?;
        let options = TimeValue::options_for(&extent);
        let selected = options
            .first()
            .cloned()
            .unwrap_or(TimeValue::NotApplicable);

        ctx.time = Some(selected.clone());
        ctx.time_options = options;
        surface.apply(RenderUpdate::TimeOptions {
            options: ctx.time_options.clone(),
            selected,
        });
        Ok(())
    }

    async fn render(
        &self,
        ctx: &mut SessionContext,
        surface: &mut dyn RenderSurface,
    ) -> WmsResult<()> {
        let layer_id = self.selected_layer(ctx)?;
        let time = ctx.time.clone().unwrap_or(TimeValue::NotApplicable);

        ctx.state = ControllerState::Rendering;
        surface.apply(RenderUpdate::Loading(true));
        let result = self.templater.template(&layer_id, time.as_param()).await;
        surface.apply(RenderUpdate::Loading(false));
        let url_template = result?;

        let info = self.capabilities.layer(&layer_id);
        let legend = info.and_then(|l| l.default_legend()).map(str::to_string);
        let title = info
            .map(|l| l.title.clone())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| layer_id.to_string());

        surface.apply(RenderUpdate::Legend(legend));

        let overlay = TileOverlay {
            title,
            layer: layer_id,
            time,
            url_template,
        };
        info!(layer = %overlay.layer, time = %overlay.time, "Rendered overlay");
        ctx.overlay = Some(overlay.clone());
        surface.apply(RenderUpdate::Overlay(overlay));
        Ok(())
    }

    fn selected_layer(&self, ctx: &SessionContext) -> WmsResult<LayerId> {
        self.catalog
            .layer_id(&ctx.product, &ctx.layer)
            .cloned()
            .ok_or_else(|| WmsError::LayerNotFound(format!("{}/{}", ctx.product, ctx.layer)))
    }
}

fn ensure_time_option(ctx: &SessionContext, time: &TimeValue) -> WmsResult<()> {
    if ctx.time_options.contains(time) {
        Ok(())
    } else {
        Err(WmsError::InvalidTime(time.to_string()))
    }
}

/// Generic message shown to the user when a pass fails.
pub fn status_message(err: &WmsError) -> String {
    format!("Failed to update map: {}", err)
}
