//! Hover handling
//!
//! Each rendered point is either `Idle` or `Hovered`. The renderer reports
//! which marker is under the pointer; changes are turned into discrete
//! `Leave`/`Enter` events that drive the single active hover in `AppState`.

use crate::ingest::format_local;
use crate::normalize::NormalizedPoint;

/// Per-point hover state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointHover {
    Idle,
    Hovered,
}

impl PointHover {
    /// Advance this point's state for an event addressed to `index`
    pub fn on_event(self, index: usize, event: HoverEvent) -> Self {
        match event {
            HoverEvent::Enter(i) if i == index => PointHover::Hovered,
            HoverEvent::Leave(i) if i == index => PointHover::Idle,
            _ => self,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverEvent {
    Enter(usize),
    Leave(usize),
}

/// Original values of the hovered point, formatted for the overlay
#[derive(Debug, Clone, PartialEq)]
pub struct HoveredPoint {
    pub index: usize,
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: String,
}

impl HoveredPoint {
    /// Capture a point's originals; the timestamp is formatted now
    pub fn capture(index: usize, point: &NormalizedPoint) -> Self {
        Self {
            index,
            id: point.id.clone(),
            latitude: point.latitude,
            longitude: point.longitude,
            timestamp: format_local(point.timestamp_millis),
        }
    }
}

/// Events needed to move the pointer focus from `prev` to `next`
pub fn transitions(prev: Option<usize>, next: Option<usize>) -> Vec<HoverEvent> {
    if prev == next {
        return Vec::new();
    }
    prev.map(HoverEvent::Leave)
        .into_iter()
        .chain(next.map(HoverEvent::Enter))
        .collect()
}

/// A marker as drawn on screen
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenMarker {
    pub index: usize,
    pub pos: [f32; 2],
    /// Distance from the camera
    pub depth: f64,
}

/// Nearest marker to `cursor` within `radius` pixels; closer-to-camera wins ties
pub fn pick(markers: &[ScreenMarker], cursor: [f32; 2], radius: f32) -> Option<usize> {
    let r2 = radius * radius;
    let mut best: Option<(f32, f64, usize)> = None;

    for m in markers {
        let dx = m.pos[0] - cursor[0];
        let dy = m.pos[1] - cursor[1];
        let d2 = dx * dx + dy * dy;
        if d2 > r2 {
            continue;
        }
        let better = match best {
            None => true,
            Some((bd2, bdepth, _)) => d2 < bd2 || (d2 == bd2 && m.depth < bdepth),
        };
        if better {
            best = Some((d2, m.depth, m.index));
        }
    }

    best.map(|(_, _, index)| index)
}
