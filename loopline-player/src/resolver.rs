//! Region lookup over externally-owned timeline regions
//!
//! The timeline data model owns every region and its start/end attributes;
//! the player reaches them through this trait, resolving a
//! `(timeline_id, region_id)` pair on demand. The only region attribute the
//! player ever writes is the "currently looped" display flag.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use loopline_common::events::RegionRef;

/// A region's current time span on its timeline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionSpan {
    pub start: f64,
    pub end: f64,
}

impl RegionSpan {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }
}

/// Lookup and flagging service over timeline regions.
pub trait RegionResolver: Send + Sync {
    /// Current start/end of the region, or None if it no longer exists.
    fn resolve(&self, region: RegionRef) -> Option<RegionSpan>;

    /// Mark or unmark the region as part of the active loop (display only).
    /// Flagging a region that no longer exists is a no-op.
    fn set_looped_flag(&self, region: RegionRef, looped: bool);
}

#[derive(Debug, Clone, Copy)]
struct RegionEntry {
    span: RegionSpan,
    looped: bool,
}

/// In-memory resolver backed by a hash map.
///
/// Stands in for the timeline data model in tests and in the demo binary;
/// editing operations mutate it directly.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    regions: RwLock<HashMap<RegionRef, RegionEntry>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<RegionRef, RegionEntry>> {
        self.regions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RegionRef, RegionEntry>> {
        self.regions.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Insert or replace a region.
    pub fn insert(&self, region: RegionRef, start: f64, end: f64) {
        self.write().insert(
            region,
            RegionEntry {
                span: RegionSpan::new(start, end),
                looped: false,
            },
        );
    }

    /// Change a region's span, keeping its loop flag.
    pub fn set_span(&self, region: RegionRef, start: f64, end: f64) {
        if let Some(entry) = self.write().get_mut(&region) {
            entry.span = RegionSpan::new(start, end);
        }
    }

    /// Delete a region.
    pub fn remove(&self, region: RegionRef) {
        self.write().remove(&region);
    }

    pub fn is_looped(&self, region: RegionRef) -> bool {
        self.read().get(&region).map(|e| e.looped).unwrap_or(false)
    }

    /// Number of regions currently flagged as looped.
    pub fn looped_count(&self) -> usize {
        self.read().values().filter(|e| e.looped).count()
    }
}

impl RegionResolver for MemoryResolver {
    fn resolve(&self, region: RegionRef) -> Option<RegionSpan> {
        self.read().get(&region).map(|e| e.span)
    }

    fn set_looped_flag(&self, region: RegionRef, looped: bool) {
        if let Some(entry) = self.write().get_mut(&region) {
            entry.looped = looped;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn region() -> RegionRef {
        RegionRef::new(Uuid::new_v4(), Uuid::new_v4())
    }

    #[test]
    fn test_resolve_existing_region() {
        let resolver = MemoryResolver::new();
        let r = region();
        resolver.insert(r, 1.0, 4.0);

        assert_eq!(resolver.resolve(r), Some(RegionSpan::new(1.0, 4.0)));
    }

    #[test]
    fn test_resolve_missing_region() {
        let resolver = MemoryResolver::new();
        assert_eq!(resolver.resolve(region()), None);
    }

    #[test]
    fn test_looped_flag_roundtrip() {
        let resolver = MemoryResolver::new();
        let r = region();
        resolver.insert(r, 0.0, 2.0);

        resolver.set_looped_flag(r, true);
        assert!(resolver.is_looped(r));
        assert_eq!(resolver.looped_count(), 1);

        resolver.set_looped_flag(r, false);
        assert!(!resolver.is_looped(r));
    }

    #[test]
    fn test_flagging_deleted_region_is_noop() {
        let resolver = MemoryResolver::new();
        let r = region();
        resolver.insert(r, 0.0, 2.0);
        resolver.remove(r);

        resolver.set_looped_flag(r, true);
        assert_eq!(resolver.looped_count(), 0);
    }

    #[test]
    fn test_set_span_updates_resolution() {
        let resolver = MemoryResolver::new();
        let r = region();
        resolver.insert(r, 0.0, 2.0);
        resolver.set_span(r, 0.5, 3.0);

        assert_eq!(resolver.resolve(r), Some(RegionSpan::new(0.5, 3.0)));
    }
}
