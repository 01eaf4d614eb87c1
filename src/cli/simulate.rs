//! `simulate` command: drive every component against an in-memory backend.
//!
//! Views are chains of nodes; consecutive views share their boundary node so
//! that closing them in order shows poll ownership moving between views.

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::memory::InMemoryBackend;
use crate::config::SyncConfig;
use crate::core::SyncError;
use crate::geometry::{LabelLocation, LabelPlacement, Point, place_label};
use crate::metrics::{LabelDescriptor, MetricCache};
use crate::models::{
    LinkId, MapContent, MapId, MapLink, MapNode, MetricId, MetricRequest, MetricValue, ObjectId,
    Severity,
};
use crate::render::{MapElement, RenderRequest, render_channel};
use crate::sync::SubscriptionCoordinator;
use crate::telemetry::NodeTelemetryCache;
use crate::worker::PollTiming;

/// Horizontal distance between two simulated nodes.
const NODE_SPACING: f64 = 1100.0;

/// Run the synchronization components against simulated views.
#[derive(Args, Debug)]
pub struct SimulateCommand {
    /// Number of map views to open
    #[arg(long, default_value_t = 2)]
    views: u64,

    /// Nodes per view
    #[arg(long, default_value_t = 4)]
    nodes: u64,

    /// Polling rounds to observe before closing the views
    #[arg(long, default_value_t = 3)]
    rounds: u32,

    /// Polling period of every worker, in milliseconds
    #[arg(long, default_value_t = 50)]
    period_ms: u64,

    /// Fetch node telemetry summaries (also enabled by `telemetry_overlay`)
    #[arg(long)]
    telemetry: bool,
}

struct SimulatedView {
    map: MapId,
    content: MapContent,
    telemetry: NodeTelemetryCache,
}

impl SimulatedView {
    fn object_ids(&self) -> Vec<ObjectId> {
        self.content.nodes.iter().map(|n| n.object_id).collect()
    }
}

#[derive(Debug, Default)]
struct RoundSummary {
    nodes: usize,
    links: usize,
    decorations: usize,
    metrics: usize,
}

impl RoundSummary {
    fn record(&mut self, request: &RenderRequest) {
        match request {
            RenderRequest::Refresh(MapElement::Node(_)) => self.nodes += 1,
            RenderRequest::Refresh(MapElement::Link(_)) => self.links += 1,
            RenderRequest::UpdateDecorationFigure(_) => self.decorations += 1,
            RenderRequest::MetricValuesChanged(metrics) => self.metrics += metrics.len(),
        }
    }
}

impl SimulateCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        if self.views == 0 || self.nodes < 2 {
            let name = if self.views == 0 { "views" } else { "nodes" };
            return Err(SyncError::InvalidArgument {
                name: name.to_string(),
                reason: "need at least one view with two nodes".to_string(),
            }
            .into());
        }
        if self.node_id_end().is_none() {
            return Err(SyncError::InvalidArgument {
                name: "views".to_string(),
                reason: format!(
                    "{} views of {} nodes exceed the object id range",
                    self.views, self.nodes
                ),
            }
            .into());
        }

        let config = SyncConfig::load_with_optional(config_path).await?;
        let telemetry_enabled = self.telemetry || config.telemetry_overlay;
        let period = Duration::from_millis(self.period_ms.max(1));
        let timing = PollTiming::new(Duration::ZERO, period);

        let backend = Arc::new(InMemoryBackend::new());
        let (renderer, mut queue) = render_channel();
        let coordinator = SubscriptionCoordinator::new(backend.clone(), timing);
        let metrics = MetricCache::new(backend.clone(), timing, Some(renderer.clone()));

        println!(
            "{} {} views x {} nodes, period {:?}",
            "Simulating".bold(),
            self.views,
            self.nodes,
            period
        );

        let mut views = Vec::new();
        for index in 0..self.views {
            let map = MapId(index + 1);
            let content = self.view_content(index);
            for node in &content.nodes {
                backend.add_object(node.object_id);
            }

            let telemetry = NodeTelemetryCache::new(
                map,
                backend.clone(),
                timing,
                renderer.clone(),
                telemetry_enabled,
            );
            let view = SimulatedView {
                map,
                content,
                telemetry,
            };

            coordinator.add_objects(map, &view.object_ids());
            let requests = view.content.links.iter().map(|link| {
                MetricRequest::item(link.object_a, MetricId(link.id.0))
            });
            metrics.replace_metrics(map, requests)?;
            view.telemetry.content_changed(view.content.clone())?;

            println!(
                "  opened {map}: {} objects, {} now tracked",
                view.content.nodes.len(),
                coordinator.tracked_object_count()
            );
            views.push(view);
        }

        for round in 1..=self.rounds {
            publish_round(&backend, &views, round);
            tokio::time::sleep(period * 3).await;

            let mut summary = RoundSummary::default();
            for request in queue.drain() {
                summary.record(&request);
            }
            println!(
                "{} {round}: {} node, {} link, {} decoration repaints, {} metric changes",
                "round".cyan(),
                summary.nodes,
                summary.links,
                summary.decorations,
                summary.metrics
            );
        }

        if let Some(first) = views.first() {
            print_labels(first, &metrics, config.label_percent);
        }

        for view in views {
            coordinator.remove_objects(view.map, &view.object_ids());
            metrics.remove_metrics(view.map);
            view.telemetry.stop().await;
            println!(
                "  closed {}: {} objects, {} metrics still tracked",
                view.map,
                coordinator.tracked_object_count(),
                metrics.tracked_count()
            );
        }

        coordinator.stop().await;
        metrics.stop().await;
        println!("{} {} sync calls", "Done:".green(), backend.sync_calls().len());
        Ok(())
    }

    /// One past the object id of the last simulated node, `None` on overflow.
    fn node_id_end(&self) -> Option<u64> {
        let last_view = self.views.checked_sub(1)?;
        let first = last_view.checked_mul(self.nodes.checked_sub(1)?)?.checked_add(1)?;
        first.checked_add(self.nodes)
    }

    /// Chain of nodes of view `index`; its first node is the last node of
    /// the previous view.
    fn view_content(&self, index: u64) -> MapContent {
        let first = index * (self.nodes - 1) + 1;
        let ids: Vec<u64> = (first..first + self.nodes).collect();
        let nodes = ids.iter().map(|id| MapNode::data(ObjectId(*id))).collect();
        let links = ids
            .windows(2)
            .map(|pair| MapLink::new(LinkId(pair[0]), ObjectId(pair[0]), ObjectId(pair[1])))
            .collect();
        MapContent {
            nodes,
            links,
            decorations: Vec::new(),
        }
    }
}

/// New metric and summary values for `round`.
fn publish_round(backend: &InMemoryBackend, views: &[SimulatedView], round: u32) {
    for view in views {
        for link in &view.content.links {
            let load = u64::from(round) * 10 + link.id.0;
            let severity = if load > 50 { Severity::Warning } else { Severity::Normal };
            let value = MetricValue::new(
                link.object_a,
                MetricId(link.id.0),
                "Interface load",
                load.to_string(),
            );
            backend.set_value(value.with_severity(severity));
        }
        // Only every other node changes, so repaints stay incremental
        let parity = u64::from(round % 2);
        let changing = view.content.nodes.iter().filter(|n| n.object_id.0 % 2 == parity);
        for node in changing {
            let value = MetricValue::new(node.object_id, MetricId(0), "Round", round.to_string());
            backend.set_summary(node.object_id, vec![value]);
        }
    }
}

fn print_labels(view: &SimulatedView, metrics: &MetricCache, percent: u8) {
    println!("{} of {}", "Link labels".bold(), view.map);
    for (index, link) in view.content.links.iter().enumerate() {
        let from = Point::new(index as f64 * NODE_SPACING, 0.0);
        let to = Point::new((index + 1) as f64 * NODE_SPACING, 0.0);
        let placement =
            LabelPlacement::from_link(link, LabelLocation::Center).with_percent(percent);
        let anchor = place_label(from, to, &placement);

        let descriptors = [LabelDescriptor::new(MetricId(link.id.0), LabelLocation::Center)
            .with_format("%s %%")];
        let text = metrics.format_values(&descriptors, LabelLocation::Center);
        let severity = metrics.threshold_severity(&[MetricId(link.id.0)]);
        println!("  {} at ({}, {}): {text} [{severity:?}]", link.id, anchor.x, anchor.y);
    }
}
