//! Hand-off from background workers to the single-threaded renderer.
//!
//! Workers never touch render state. They post [`RenderRequest`]s through a
//! [`RenderSender`]; the rendering loop owns the matching [`RenderQueue`] and
//! calls [`RenderQueue::drain`] once per frame to apply them.
//!
//! ```rust
//! use netmap_sync::models::ObjectId;
//! use netmap_sync::render::{render_channel, MapElement, RenderRequest};
//!
//! let (sender, mut queue) = render_channel();
//! sender.post(RenderRequest::Refresh(MapElement::Node(ObjectId(1))));
//!
//! let pending = queue.drain();
//! assert_eq!(pending.len(), 1);
//! ```

use tokio::sync::mpsc;

use crate::models::{ElementId, LinkId, MetricId, ObjectId};

/// A map element the renderer can repaint individually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapElement {
    Node(ObjectId),
    Link(LinkId),
}

/// An incremental repaint request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderRequest {
    /// Repaint one node or link
    Refresh(MapElement),
    /// Repaint one decoration overlay
    UpdateDecorationFigure(ElementId),
    /// Cached values of these metrics changed; labels showing them are stale
    MetricValuesChanged(Vec<MetricId>),
}

/// Cloneable posting side of the render channel.
#[derive(Debug, Clone)]
pub struct RenderSender {
    tx: mpsc::UnboundedSender<RenderRequest>,
}

impl RenderSender {
    /// Post a request. A closed queue (renderer gone) silently drops it.
    pub fn post(&self, request: RenderRequest) {
        if self.tx.send(request).is_err() {
            tracing::trace!(target: "render", "render queue closed, dropping request");
        }
    }

    pub fn post_all(&self, requests: impl IntoIterator<Item = RenderRequest>) {
        for request in requests {
            self.post(request);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving side owned by the rendering loop.
#[derive(Debug)]
pub struct RenderQueue {
    rx: mpsc::UnboundedReceiver<RenderRequest>,
}

impl RenderQueue {
    /// Take every pending request without blocking.
    pub fn drain(&mut self) -> Vec<RenderRequest> {
        let mut pending = Vec::new();
        while let Ok(request) = self.rx.try_recv() {
            pending.push(request);
        }
        pending
    }

    /// Wait for the next request; `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<RenderRequest> {
        self.rx.recv().await
    }
}

/// Create a connected sender/queue pair.
pub fn render_channel() -> (RenderSender, RenderQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RenderSender { tx }, RenderQueue { rx })
}
