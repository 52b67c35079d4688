// src/proctoring/events.rs

//! Subscribe/unsubscribe capability for page-level events.
//!
//! Monitors never touch a global listener registry. They receive an
//! [`EventTarget`], attach through [`Subscription::listen`] and own the returned
//! handle; dropping the handle detaches the listener.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    FullscreenChange,
    VisibilityChange,
    Blur,
    Focus,
    ContextMenu,
    Copy,
    SelectStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    FullscreenChange { fullscreen: bool },
    VisibilityChange { visible: bool },
    Blur,
    Focus,
    ContextMenu,
    Copy,
    SelectStart,
}

impl PageEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            PageEvent::FullscreenChange { .. } => EventKind::FullscreenChange,
            PageEvent::VisibilityChange { .. } => EventKind::VisibilityChange,
            PageEvent::Blur => EventKind::Blur,
            PageEvent::Focus => EventKind::Focus,
            PageEvent::ContextMenu => EventKind::ContextMenu,
            PageEvent::Copy => EventKind::Copy,
            PageEvent::SelectStart => EventKind::SelectStart,
        }
    }
}

/// What a listener asks the host to do with the event's default action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposition {
    #[default]
    Continue,
    PreventDefault,
}

pub type Listener = Arc<dyn Fn(&PageEvent) -> Disposition + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub trait EventTarget: Send + Sync {
    fn add_listener(&self, kind: EventKind, listener: Listener) -> ListenerId;

    /// Returns false if the id was not registered.
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// Owned listener registration. Detaches on drop.
pub struct Subscription {
    target: Arc<dyn EventTarget>,
    id: ListenerId,
    kind: EventKind,
}

impl Subscription {
    pub fn listen<F>(target: &Arc<dyn EventTarget>, kind: EventKind, listener: F) -> Self
    where
        F: Fn(&PageEvent) -> Disposition + Send + Sync + 'static,
    {
        let id = target.add_listener(kind, Arc::new(listener));
        Self {
            target: Arc::clone(target),
            id,
            kind,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if !self.target.remove_listener(self.id) {
            tracing::debug!(kind = ?self.kind, "listener was already detached");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .finish()
    }
}

/// In-process event target for headless hosts and tests.
#[derive(Default)]
pub struct EventBus {
    inner: Mutex<BusInner>,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    listeners: Vec<(ListenerId, EventKind, Listener)>,
}

impl EventBus {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn lock(&self) -> MutexGuard<'_, BusInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Delivers `event` to every listener of its kind.
    ///
    /// Listeners run outside the registry lock, so a listener may attach or
    /// detach others. The default is prevented if any listener asks for it.
    pub fn dispatch(&self, event: PageEvent) -> Disposition {
        let kind = event.kind();
        let matching: Vec<Listener> = self
            .lock()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .map(|(_, _, listener)| Arc::clone(listener))
            .collect();

        let mut disposition = Disposition::Continue;
        for listener in matching {
            if listener(&event) == Disposition::PreventDefault {
                disposition = Disposition::PreventDefault;
            }
        }
        disposition
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.lock()
            .listeners
            .iter()
            .filter(|(_, k, _)| *k == kind)
            .count()
    }

    pub fn total_listeners(&self) -> usize {
        self.lock().listeners.len()
    }
}

impl EventTarget for EventBus {
    fn add_listener(&self, kind: EventKind, listener: Listener) -> ListenerId {
        let mut inner = self.lock();
        inner.next_id += 1;
        let id = ListenerId(inner.next_id);
        inner.listeners.push((id, kind, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        let mut inner = self.lock();
        let before = inner.listeners.len();
        inner.listeners.retain(|(existing, _, _)| *existing != id);
        inner.listeners.len() != before
    }
}
