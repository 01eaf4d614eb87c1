//! `place` command: compute a link label anchor.

use anyhow::Result;
use clap::{Args, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;

use crate::config::SyncConfig;
use crate::core::SyncError;
use crate::geometry::{Endpoint, LabelLocation, LabelPlacement, Point, endpoint_anchor, place_label};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LocationArg {
    NearA,
    Center,
    NearB,
}

impl From<LocationArg> for LabelLocation {
    fn from(arg: LocationArg) -> Self {
        match arg {
            LocationArg::NearA => Self::NearA,
            LocationArg::Center => Self::Center,
            LocationArg::NearB => Self::NearB,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum EndpointArg {
    A,
    B,
}

impl From<EndpointArg> for Endpoint {
    fn from(arg: EndpointArg) -> Self {
        match arg {
            EndpointArg::A => Self::A,
            EndpointArg::B => Self::B,
        }
    }
}

/// Compute where a label is drawn on the straight link between two points.
#[derive(Args, Debug)]
pub struct PlaceCommand {
    /// Position of endpoint A as `X,Y`
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    from: Point,

    /// Position of endpoint B as `X,Y`
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    to: Point,

    /// Label zone along the link
    #[arg(long, value_enum, default_value_t = LocationArg::Center)]
    location: LocationArg,

    /// Index of this link among parallel links
    #[arg(long)]
    duplicate_index: Option<u32>,

    /// Number of parallel links between the two nodes
    #[arg(long, default_value_t = 0)]
    duplicate_count: u32,

    /// Link direction is reversed relative to the endpoint order
    #[arg(long)]
    inverted: bool,

    /// Position inside the zone in percent (defaults to the configured value)
    #[arg(long)]
    percent: Option<u8>,

    /// Place the interface name of this endpoint instead of a metric label
    #[arg(long, value_enum)]
    endpoint: Option<EndpointArg>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct PlaceOutput {
    x: f64,
    y: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    location: Option<LabelLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    endpoint: Option<Endpoint>,
}

impl PlaceCommand {
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let percent = match self.percent {
            Some(percent) => percent,
            None => SyncConfig::load_with_optional(config_path).await?.label_percent,
        };
        let output = self.compute(percent)?;

        if self.json {
            println!("{}", serde_json::to_string(&output)?);
        } else {
            println!("{},{}", output.x, output.y);
        }
        Ok(())
    }

    fn compute(&self, percent: u8) -> Result<PlaceOutput, SyncError> {
        if percent > 100 {
            return Err(SyncError::InvalidArgument {
                name: "percent".to_string(),
                reason: format!("must be between 0 and 100, got {percent}"),
            });
        }
        if self.duplicate_index.is_some() && self.duplicate_count == 0 {
            return Err(SyncError::InvalidArgument {
                name: "duplicate-index".to_string(),
                reason: "requires --duplicate-count greater than zero".to_string(),
            });
        }

        if let Some(endpoint) = self.endpoint {
            let endpoint = Endpoint::from(endpoint);
            let point = endpoint_anchor(self.from, self.to, endpoint);
            return Ok(PlaceOutput {
                x: point.x,
                y: point.y,
                location: None,
                endpoint: Some(endpoint),
            });
        }

        let location = LabelLocation::from(self.location);
        let placement = LabelPlacement {
            location,
            duplicate_index: self.duplicate_index,
            duplicate_count: self.duplicate_count,
            direction_inverted: self.inverted,
            label_percent: percent,
        };
        let point = place_label(self.from, self.to, &placement);
        tracing::debug!(
            target: "render",
            "label at {location:?} placed on ({}, {})",
            point.x,
            point.y
        );

        Ok(PlaceOutput {
            x: point.x,
            y: point.y,
            location: Some(location),
            endpoint: None,
        })
    }
}

fn parse_point(value: &str) -> Result<Point, String> {
    let (x, y) = value
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y but got '{value}'"))?;
    let x = x.trim().parse::<f64>().map_err(|e| format!("invalid X in '{value}': {e}"))?;
    let y = y.trim().parse::<f64>().map_err(|e| format!("invalid Y in '{value}': {e}"))?;
    if !x.is_finite() || !y.is_finite() {
        return Err(format!("coordinates must be finite, got '{value}'"));
    }
    Ok(Point::new(x, y))
}
