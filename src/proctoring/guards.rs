// src/proctoring/guards.rs

use std::sync::Arc;

use super::events::{Disposition, EventKind, EventTarget, Subscription};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardKind {
    ContextMenu,
    Copy,
    SelectStart,
}

impl GuardKind {
    pub fn event_kind(&self) -> EventKind {
        match self {
            GuardKind::ContextMenu => EventKind::ContextMenu,
            GuardKind::Copy => EventKind::Copy,
            GuardKind::SelectStart => EventKind::SelectStart,
        }
    }
}

/// Suppresses the default action of one input event while enabled.
pub struct InputGuard {
    target: Arc<dyn EventTarget>,
    kind: GuardKind,
    subscription: Option<Subscription>,
}

impl InputGuard {
    pub fn new(target: Arc<dyn EventTarget>, kind: GuardKind) -> Self {
        Self {
            target,
            kind,
            subscription: None,
        }
    }

    pub fn kind(&self) -> GuardKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.subscription.is_some()
    }

    /// Idempotent.
    pub fn enable(&mut self) {
        if self.subscription.is_some() {
            return;
        }
        let kind = self.kind;
        self.subscription = Some(Subscription::listen(
            &self.target,
            kind.event_kind(),
            move |_| {
                tracing::debug!(?kind, "input suppressed");
                Disposition::PreventDefault
            },
        ));
    }

    /// Idempotent.
    pub fn disable(&mut self) {
        self.subscription.take();
    }
}
