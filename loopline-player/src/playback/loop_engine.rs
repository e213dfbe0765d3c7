//! Loop-region engine
//!
//! Owns the loop-element set and the active loop window. Loop elements are
//! weak `(timeline_id, region_id)` references into the externally-owned
//! timeline model; the engine re-resolves them on every recompute, so
//! editing operations (split, merge, delete, resize) and undo/redo can
//! invalidate a loop at any time between scheduler ticks.

use std::collections::HashSet;
use std::sync::Arc;

use loopline_common::events::{ErrorKind, EventBus, LooplineEvent, RegionRef};
use loopline_common::time::now;
use tracing::{debug, info, warn};

use crate::engine::EngineAdapter;
use crate::playback::continuity::merge_contiguous;
use crate::resolver::RegionResolver;

/// Active loop window. Owned by the loop engine, read by the controller.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoopState {
    pub is_looping: bool,
    /// Meaningful only while `is_looping`.
    pub loop_start: f64,
    pub loop_end: f64,
}

/// Loop-region engine.
pub struct LoopEngine {
    state: LoopState,
    /// Empty set while looping means "loop the whole media" via the
    /// engine's native loop flag.
    elements: HashSet<RegionRef>,
    resolver: Arc<dyn RegionResolver>,
    bus: EventBus,
    /// Seek tolerance at loop edges and end-of-media snap window.
    epsilon: f64,
}

impl LoopEngine {
    pub fn new(resolver: Arc<dyn RegionResolver>, bus: EventBus, epsilon: f64) -> Self {
        Self {
            state: LoopState::default(),
            elements: HashSet::new(),
            resolver,
            bus,
            epsilon,
        }
    }

    pub fn state(&self) -> &LoopState {
        &self.state
    }

    pub fn is_looping(&self) -> bool {
        self.state.is_looping
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// True when a seek to `time` would leave the loop window, with one
    /// epsilon of tolerance on either edge.
    pub fn outside_window(&self, time: f64) -> bool {
        self.state.is_looping
            && (time > self.state.loop_end + self.epsilon
                || time < self.state.loop_start - self.epsilon)
    }

    /// True when playback reaching `time` must wrap back to the loop start.
    pub fn wraps_at(&self, time: f64) -> bool {
        self.state.is_looping && time >= self.state.loop_end
    }

    /// Enable looping over `selection`, replacing any previous selection.
    pub fn enable(
        &mut self,
        engine: &mut dyn EngineAdapter,
        selection: HashSet<RegionRef>,
        duration: f64,
    ) {
        self.clear_flags();
        self.elements = selection;
        self.recompute(engine, duration);
    }

    /// Disable looping, unflagging every selected region.
    pub fn disable(&mut self, engine: &mut dyn EngineAdapter) {
        self.teardown(engine, true);
    }

    /// Silent teardown for undo/redo: the surrounding state restoration
    /// republishes a consistent snapshot itself, so no notifications here.
    pub fn cancel_silent(&mut self, engine: &mut dyn EngineAdapter) {
        if !self.state.is_looping {
            return;
        }
        debug!("loop silently cancelled");
        self.teardown(engine, false);
    }

    /// Rebuild the loop window from the current element set.
    ///
    /// No loop-state field is mutated until resolution and the continuity
    /// check have succeeded; a failed recompute leaves the loop disabled,
    /// never half-updated.
    pub fn recompute(&mut self, engine: &mut dyn EngineAdapter, duration: f64) {
        if self.elements.is_empty() {
            // Whole-media mode: the backend wraps on its own.
            self.clear_flags();
            engine.set_native_loop(true);
            self.state = LoopState {
                is_looping: true,
                loop_start: 0.0,
                loop_end: duration,
            };
            info!(duration, "looping whole media");
            self.emit_loop_on();
            return;
        }

        let mut intervals = Vec::with_capacity(self.elements.len());
        let mut stale = Vec::new();
        for &region in &self.elements {
            match self.resolver.resolve(region) {
                Some(span) => intervals.push((span.start, span.end)),
                None => stale.push(region),
            }
        }
        if !stale.is_empty() {
            // A structural notice can race the recompute that observes it;
            // treat unresolvable members like deletions seen late.
            warn!(count = stale.len(), "purging unresolvable loop elements");
            for region in stale {
                self.elements.remove(&region);
            }
            if self.elements.is_empty() {
                self.teardown(engine, true);
                return;
            }
        }

        let Some((start, mut end)) = merge_contiguous(&intervals) else {
            warn!("loop selection is not contiguous");
            self.emit_error(
                ErrorKind::LoopDiscontinuous,
                "Looping Error",
                "selected regions are not contiguous",
            );
            self.teardown(engine, true);
            return;
        };

        if duration - end < self.epsilon {
            // Keep the wrap point clear of the scheduler's end-of-media
            // stop detection.
            end = duration - self.epsilon;
        }

        for &region in &self.elements {
            self.resolver.set_looped_flag(region, true);
        }

        self.state = LoopState {
            is_looping: true,
            loop_start: start,
            loop_end: end,
        };
        info!(loop_start = start, loop_end = end, "loop window recomputed");
        self.emit_loop_on();
    }

    /// Regions were merged or split. When every removed region was part of
    /// the loop, the replacements take their place and the window is
    /// recomputed; otherwise the edit does not involve the loop.
    pub fn on_regions_merged_or_split(
        &mut self,
        engine: &mut dyn EngineAdapter,
        new: &[RegionRef],
        old: &[RegionRef],
        duration: f64,
    ) {
        if !self.state.is_looping || !old.iter().all(|r| self.elements.contains(r)) {
            return;
        }
        for region in old {
            self.elements.remove(region);
        }
        for &region in new {
            self.elements.insert(region);
        }
        debug!(new = new.len(), old = old.len(), "loop elements replaced by edit");
        self.recompute(engine, duration);
    }

    /// A loop element was deleted from its timeline.
    pub fn on_region_deleted(
        &mut self,
        engine: &mut dyn EngineAdapter,
        region: RegionRef,
        duration: f64,
    ) {
        if !self.state.is_looping || !self.elements.remove(&region) {
            return;
        }
        if self.elements.is_empty() {
            // Was non-empty a moment ago: this is a real disable, not a
            // switch into whole-media mode.
            info!("last loop element deleted, disabling loop");
            self.teardown(engine, true);
            return;
        }
        self.recompute(engine, duration);
    }

    /// A loop element's start/end data was edited.
    pub fn on_region_data_changed(
        &mut self,
        engine: &mut dyn EngineAdapter,
        region: RegionRef,
        duration: f64,
    ) {
        if self.state.is_looping && self.elements.contains(&region) {
            self.recompute(engine, duration);
        }
    }

    fn teardown(&mut self, engine: &mut dyn EngineAdapter, notify: bool) {
        engine.set_native_loop(false);
        self.clear_flags();
        self.state = LoopState::default();
        if notify {
            self.bus.emit_lossy(LooplineEvent::LoopToggled {
                looping: false,
                timestamp: now(),
            });
            self.bus.emit_lossy(LooplineEvent::LoopChanged {
                start: 0.0,
                end: 0.0,
                timestamp: now(),
            });
        }
    }

    fn clear_flags(&mut self) {
        for &region in &self.elements {
            self.resolver.set_looped_flag(region, false);
        }
        self.elements.clear();
    }

    fn emit_loop_on(&self) {
        self.bus.emit_lossy(LooplineEvent::LoopToggled {
            looping: true,
            timestamp: now(),
        });
        self.bus.emit_lossy(LooplineEvent::LoopChanged {
            start: self.state.loop_start,
            end: self.state.loop_end,
            timestamp: now(),
        });
    }

    fn emit_error(&self, kind: ErrorKind, title: &str, message: &str) {
        self.bus.emit_lossy(LooplineEvent::ErrorReported {
            kind,
            title: title.to_string(),
            message: message.to_string(),
            timestamp: now(),
        });
    }
}
