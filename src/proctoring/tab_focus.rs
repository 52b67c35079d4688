// src/proctoring/tab_focus.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use super::{
    Signals, Violation,
    events::{Disposition, EventKind, EventTarget, PageEvent, Subscription},
};

#[derive(Debug)]
struct FocusState {
    focused: AtomicBool,
    switches: AtomicU32,
}

/// Tracks whether the exam page has focus and counts focus losses.
///
/// A blur followed by a visibility change to hidden is one loss, not two:
/// only the focused -> unfocused transition increments the counter.
pub struct TabFocusMonitor {
    state: Arc<FocusState>,
    subscriptions: Vec<Subscription>,
}

impl TabFocusMonitor {
    pub(crate) fn start(events: &Arc<dyn EventTarget>, signals: Signals) -> Self {
        let state = Arc::new(FocusState {
            focused: AtomicBool::new(true),
            switches: AtomicU32::new(0),
        });

        let subscriptions = [EventKind::VisibilityChange, EventKind::Blur, EventKind::Focus]
            .into_iter()
            .map(|kind| {
                let state = Arc::clone(&state);
                let signals = signals.clone();
                Subscription::listen(events, kind, move |event| {
                    match event {
                        PageEvent::VisibilityChange { visible: false } | PageEvent::Blur => {
                            lose_focus(&state, &signals)
                        }
                        PageEvent::VisibilityChange { visible: true } | PageEvent::Focus => {
                            regain_focus(&state, &signals)
                        }
                        _ => {}
                    }
                    Disposition::Continue
                })
            })
            .collect();

        Self {
            state,
            subscriptions,
        }
    }

    pub fn focused(&self) -> bool {
        self.state.focused.load(Ordering::SeqCst)
    }

    pub fn violations(&self) -> u32 {
        self.state.switches.load(Ordering::SeqCst)
    }

    pub fn stop(&mut self) {
        self.subscriptions.clear();
    }
}

fn lose_focus(state: &FocusState, signals: &Signals) {
    if !state.focused.swap(false, Ordering::SeqCst) {
        return;
    }
    let count = state.switches.fetch_add(1, Ordering::SeqCst) + 1;
    signals.update(|s| {
        s.tab_focused = false;
        s.tab_switches = count;
    });
    signals.report(Violation::TabSwitch { count });
}

fn regain_focus(state: &FocusState, signals: &Signals) {
    if state.focused.swap(true, Ordering::SeqCst) {
        return;
    }
    signals.update(|s| s.tab_focused = true);
}
