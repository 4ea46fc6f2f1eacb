//! Time property discovery across a set of time-aware layers.
//!
//! Each layer is loaded and asked for its full time extent and native step
//! interval. Layers that fail are skipped; the rest are merged into one
//! full extent (union) and the coarsest interval.
//!
//! [`DiscoveryTask`] runs the same thing on a background thread and hands
//! the result back over a channel, so the host can apply it on its own
//! thread.

use crossbeam_channel::{Receiver, TryRecvError, bounded};
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::fmt;
use std::thread;

use crate::entities::{TimeExtent, TimeStepInterval};

/// Host data source that may carry time information
pub trait TimeAwareLayer: Send {
    fn name(&self) -> &str;

    /// Make the layer ready for queries. `Err` carries the reason.
    fn load(&mut self) -> Result<(), String>;

    fn supports_time_filtering(&self) -> bool;

    fn full_time_extent(&self) -> Option<TimeExtent>;

    /// Native step interval, if the layer declares one
    fn time_interval(&self) -> Option<TimeStepInterval>;
}

/// Why a layer contributed nothing
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryError {
    NotLoadable { layer: String, reason: String },
    TimeFilteringUnsupported(String),
    NoTimeInformation(String),
    /// No layer contributed (empty input or every layer failed)
    NothingDiscovered,
    /// Background task ended without a result
    Disconnected,
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::NotLoadable { layer, reason } => {
                write!(f, "Layer '{}' could not be loaded: {}", layer, reason)
            }
            DiscoveryError::TimeFilteringUnsupported(layer) => {
                write!(f, "Layer '{}' does not support time filtering", layer)
            }
            DiscoveryError::NoTimeInformation(layer) => {
                write!(f, "Layer '{}' has no time information", layer)
            }
            DiscoveryError::NothingDiscovered => write!(f, "No layer provided time information"),
            DiscoveryError::Disconnected => write!(f, "Discovery task ended without a result"),
        }
    }
}

impl std::error::Error for DiscoveryError {}

/// Full extent and step interval for the slider
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeProperties {
    pub full_extent: TimeExtent,
    pub step_interval: Option<TimeStepInterval>,
}

/// Load one layer and read its time properties.
pub fn discover_layer(layer: &mut dyn TimeAwareLayer) -> Result<TimeProperties, DiscoveryError> {
    let name = layer.name().to_string();
    layer.load().map_err(|reason| DiscoveryError::NotLoadable {
        layer: name.clone(),
        reason,
    })?;
    if !layer.supports_time_filtering() {
        return Err(DiscoveryError::TimeFilteringUnsupported(name));
    }
    let full_extent = layer
        .full_time_extent()
        .filter(|e| !e.is_empty())
        .ok_or_else(|| DiscoveryError::NoTimeInformation(name.clone()))?;
    let step_interval = layer.time_interval().filter(|i| i.is_valid());
    debug!(
        "Layer '{}': extent {}, interval {}",
        name,
        full_extent,
        step_interval.map_or_else(|| "none".to_string(), |i| i.to_string())
    );
    Ok(TimeProperties {
        full_extent,
        step_interval,
    })
}

/// Merge the time properties of every usable layer.
///
/// The full extent is the union of layer extents; the interval is the
/// largest one declared. Failing layers are logged and skipped.
pub fn discover_time_properties(layers: &mut [Box<dyn TimeAwareLayer>]) -> Result<TimeProperties, DiscoveryError> {
    let mut merged: Option<TimeProperties> = None;

    for layer in layers.iter_mut() {
        let props = match discover_layer(layer.as_mut()) {
            Ok(p) => p,
            Err(e) => {
                warn!("Skipping layer: {}", e);
                continue;
            }
        };
        merged = Some(match merged {
            None => props,
            Some(acc) => TimeProperties {
                full_extent: acc.full_extent.union(&props.full_extent),
                step_interval: coarsest(acc.step_interval, props.step_interval),
            },
        });
    }

    let merged = merged.ok_or(DiscoveryError::NothingDiscovered)?;
    info!(
        "Discovered time properties: {} ({} layers)",
        merged.full_extent,
        layers.len()
    );
    Ok(merged)
}

fn coarsest(a: Option<TimeStepInterval>, b: Option<TimeStepInterval>) -> Option<TimeStepInterval> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.compare(&a) == Ordering::Greater { b } else { a }),
        (a, b) => a.or(b),
    }
}

/// Discovery running on a background thread
pub struct DiscoveryTask {
    rx: Receiver<Result<TimeProperties, DiscoveryError>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl DiscoveryTask {
    pub fn spawn(mut layers: Vec<Box<dyn TimeAwareLayer>>) -> std::io::Result<Self> {
        let (tx, rx) = bounded(1);
        let handle = thread::Builder::new()
            .name("timeslider-discovery".into())
            .spawn(move || {
                let result = discover_time_properties(&mut layers);
                // Receiver gone means the host lost interest
                let _ = tx.send(result);
            })?;
        Ok(Self {
            rx,
            handle: Some(handle),
        })
    }

    /// Non-blocking check, for polling from the host loop.
    pub fn try_result(&mut self) -> Option<Result<TimeProperties, DiscoveryError>> {
        match self.rx.try_recv() {
            Ok(result) => {
                self.join();
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.join();
                Some(Err(DiscoveryError::Disconnected))
            }
        }
    }

    /// Block until discovery finishes.
    pub fn wait(mut self) -> Result<TimeProperties, DiscoveryError> {
        let result = self.rx.recv().unwrap_or(Err(DiscoveryError::Disconnected));
        self.join();
        result
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("Discovery thread panicked");
        }
    }
}
