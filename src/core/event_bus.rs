//! Typed pub/sub bus for slider change notifications.
//!
//! - `subscribe::<E>()` registers a callback for one event type
//! - `emit()` runs the callbacks synchronously, then queues the event
//! - `poll()` drains the queue for hosts that prefer batch processing
//!
//! Callbacks for one event type run in subscription order. There is no
//! ordering guarantee across event types.

use log::warn;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

/// Queue length at which the oldest half of pending events is dropped
const MAX_PENDING_EVENTS: usize = 1000;

/// Anything `'static + Send + Sync` can travel on the bus.
pub trait Event: Any + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
    fn type_name(&self) -> &'static str;
}

impl<T: Any + Send + Sync + 'static> Event for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

type Handler = Arc<dyn Fn(&dyn Any) + Send + Sync>;
type HandlerMap = Arc<RwLock<HashMap<TypeId, Vec<Handler>>>>;
type PendingQueue = Arc<Mutex<Vec<BoxedEvent>>>;

pub type BoxedEvent = Box<dyn Event>;

/// Shared state behind both [`EventBus`] and [`EventEmitter`]
#[derive(Clone, Default)]
struct Channels {
    handlers: HandlerMap,
    pending: PendingQueue,
}

impl Channels {
    fn dispatch<E: Event + Clone>(&self, event: E) {
        let handlers = self
            .handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<E>())
            .cloned()
            .unwrap_or_default();
        // Lock released before callbacks so they may subscribe or emit
        for handler in &handlers {
            handler(&event);
        }

        let mut pending = self.pending.lock().unwrap_or_else(|e| e.into_inner());
        if pending.len() >= MAX_PENDING_EVENTS {
            let dropped = pending.len() / 2;
            warn!("Event queue full ({} events), dropping oldest {}", pending.len(), dropped);
            pending.drain(0..dropped);
        }
        pending.push(Box::new(event));
    }
}

/// Owner side of the bus: subscribe, emit, poll.
#[derive(Clone, Default)]
pub struct EventBus {
    channels: Channels,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for events of type `E`.
    pub fn subscribe<E, F>(&self, callback: F)
    where
        E: Event,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let handler: Handler = Arc::new(move |any: &dyn Any| {
            if let Some(event) = any.downcast_ref::<E>() {
                callback(event);
            }
        });
        self.channels
            .handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .entry(TypeId::of::<E>())
            .or_default()
            .push(handler);
    }

    pub fn emit<E: Event + Clone>(&self, event: E) {
        self.channels.dispatch(event);
    }

    /// Drain every event emitted since the previous poll.
    pub fn poll(&self) -> Vec<BoxedEvent> {
        std::mem::take(&mut *self.channels.pending.lock().unwrap_or_else(|e| e.into_inner()))
    }

    /// Cheap handle for components that only need to emit.
    pub fn emitter(&self) -> EventEmitter {
        EventEmitter {
            channels: Some(self.channels.clone()),
        }
    }

    pub fn unsubscribe_all<E: Event>(&self) {
        self.channels
            .handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&TypeId::of::<E>());
    }

    pub fn has_subscribers<E: Event>(&self) -> bool {
        self.channels
            .handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&TypeId::of::<E>())
            .is_some_and(|v| !v.is_empty())
    }

    pub fn pending_len(&self) -> usize {
        self.channels.pending.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.pending_len())
            .finish()
    }
}

/// Emit-only handle held by the extent controller and the player.
///
/// A detached emitter (the default) silently drops events, so components
/// work before any bus is wired up.
#[derive(Clone, Default)]
pub struct EventEmitter {
    channels: Option<Channels>,
}

impl EventEmitter {
    pub fn detached() -> Self {
        Self { channels: None }
    }

    pub fn is_attached(&self) -> bool {
        self.channels.is_some()
    }

    pub fn emit<E: Event + Clone>(&self, event: E) {
        if let Some(channels) = &self.channels {
            channels.dispatch(event);
        }
    }
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("attached", &self.is_attached())
            .finish()
    }
}

/// Downcast a polled event to its concrete type.
///
/// Derefs to `dyn Event` first: calling `as_any()` on the `Box` itself would
/// hit the blanket impl for `Box<dyn Event>` and never match.
#[inline]
pub fn downcast_event<E: Event>(event: &BoxedEvent) -> Option<&E> {
    (**event).as_any().downcast_ref::<E>()
}
