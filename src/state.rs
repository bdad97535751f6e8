//! Application State - Single Source of Truth (SSOT)
//!
//! One immutable value holding the current point set and the active hover.
//! Every change goes through `AppState::apply`, which returns a new state;
//! the point set itself is shared and only ever replaced wholesale.

use std::path::PathBuf;
use std::sync::Arc;

use crate::dataset::Dataset;
use crate::hover::{HoverEvent, HoveredPoint, PointHover};
use crate::ingest::RowIssue;
use crate::normalize::{Bounds, NormalizedPoint};

/// Everything that can change the application state
#[derive(Debug)]
pub enum Action {
    Loaded { source: PathBuf, dataset: Dataset },
    LoadFailed { source: PathBuf, message: String },
    Hover(HoverEvent),
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub points: Arc<[NormalizedPoint]>,
    pub issues: Arc<[RowIssue]>,
    pub bounds: Option<Bounds>,
    pub source: Option<PathBuf>,
    pub hovered: Option<HoveredPoint>,
    pub last_error: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            points: Arc::from(Vec::new()),
            issues: Arc::from(Vec::new()),
            bounds: None,
            source: None,
            hovered: None,
            last_error: None,
        }
    }
}

impl AppState {
    pub fn apply(&self, action: Action) -> AppState {
        match action {
            Action::Loaded { source, dataset } => {
                tracing::info!(
                    "Displaying {} points from {:?}",
                    dataset.points.len(),
                    source
                );
                AppState {
                    points: Arc::from(dataset.points),
                    issues: Arc::from(dataset.issues),
                    bounds: dataset.bounds,
                    source: Some(source),
                    hovered: None,
                    last_error: None,
                }
            }
            Action::LoadFailed { source, message } => {
                tracing::warn!("Load of {:?} failed, keeping previous data: {}", source, message);
                AppState {
                    last_error: Some(message),
                    ..self.clone()
                }
            }
            Action::Hover(event) => {
                let index = match event {
                    HoverEvent::Enter(i) | HoverEvent::Leave(i) => i,
                };
                match self.hover_state(index).on_event(index, event) {
                    PointHover::Hovered => match self.points.get(index) {
                        Some(point) => AppState {
                            hovered: Some(HoveredPoint::capture(index, point)),
                            ..self.clone()
                        },
                        None => {
                            tracing::debug!("Ignoring hover on unknown point {}", index);
                            self.clone()
                        }
                    },
                    // Any leave clears the active hover
                    PointHover::Idle => AppState {
                        hovered: None,
                        ..self.clone()
                    },
                }
            }
        }
    }

    pub fn hover_state(&self, index: usize) -> PointHover {
        match &self.hovered {
            Some(h) if h.index == index => PointHover::Hovered,
            _ => PointHover::Idle,
        }
    }

    pub fn hovered_index(&self) -> Option<usize> {
        self.hovered.as_ref().map(|h| h.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::MalformedRows;

    const TWO_ROWS: &str = "ID,LATITUDE,LONGITUDE,TIMESTAMP\n\
        A,10,20,2020-01-01T00:00:00Z\n\
        B,30,40,2020-01-02T00:00:00Z";

    fn loaded() -> AppState {
        let dataset = Dataset::from_text(TWO_ROWS, MalformedRows::Skip).unwrap();
        AppState::default().apply(Action::Loaded {
            source: PathBuf::from("two.csv"),
            dataset,
        })
    }

    #[test]
    fn test_load_replaces_points() {
        let first = loaded();
        assert_eq!(first.points.len(), 2);
        assert_eq!(first.source, Some(PathBuf::from("two.csv")));

        let second = first.apply(Action::Loaded {
            source: PathBuf::from("two.csv"),
            dataset: Dataset::from_text(TWO_ROWS, MalformedRows::Skip).unwrap(),
        });
        assert!(!Arc::ptr_eq(&first.points, &second.points));
    }

    #[test]
    fn test_enter_sets_original_values() {
        let state = loaded().apply(Action::Hover(HoverEvent::Enter(1)));
        let hovered = state.hovered.as_ref().unwrap();
        assert_eq!(hovered.id, "B");
        assert_eq!(hovered.latitude, 30.0);
        assert_eq!(hovered.longitude, 40.0);
        assert_eq!(
            hovered.timestamp,
            crate::ingest::format_local(1_577_923_200_000)
        );
        assert_eq!(state.hover_state(1), PointHover::Hovered);
        assert_eq!(state.hover_state(0), PointHover::Idle);
    }

    #[test]
    fn test_leave_clears() {
        let state = loaded()
            .apply(Action::Hover(HoverEvent::Enter(0)))
            .apply(Action::Hover(HoverEvent::Leave(0)));
        assert!(state.hovered.is_none());
        assert_eq!(state.hover_state(0), PointHover::Idle);
    }

    #[test]
    fn test_last_event_wins() {
        let state = loaded()
            .apply(Action::Hover(HoverEvent::Enter(0)))
            .apply(Action::Hover(HoverEvent::Enter(1)));
        assert_eq!(state.hovered_index(), Some(1));
    }

    #[test]
    fn test_hover_out_of_range_is_ignored() {
        let state = loaded().apply(Action::Hover(HoverEvent::Enter(99)));
        assert!(state.hovered.is_none());
    }

    #[test]
    fn test_failed_load_keeps_previous_points() {
        let before = loaded();
        let after = before.apply(Action::LoadFailed {
            source: PathBuf::from("bad.csv"),
            message: "Header is missing required column(s): ID".to_string(),
        });
        assert!(Arc::ptr_eq(&before.points, &after.points));
        assert_eq!(after.source, Some(PathBuf::from("two.csv")));
        assert!(after.last_error.is_some());
        assert_eq!(after.bounds, before.bounds);
    }

    #[test]
    fn test_load_records_raw_ranges() {
        let state = loaded();
        let bounds = state.bounds.as_ref().unwrap();
        assert_eq!((bounds.latitude.min, bounds.latitude.max), (10.0, 30.0));
        assert_eq!((bounds.longitude.min, bounds.longitude.max), (20.0, 40.0));

        let emptied = state.apply(Action::Loaded {
            source: PathBuf::from("empty.csv"),
            dataset: Dataset::default(),
        });
        assert!(emptied.bounds.is_none());
    }

    #[test]
    fn test_new_load_clears_hover() {
        let state = loaded().apply(Action::Hover(HoverEvent::Enter(0)));
        let reloaded = state.apply(Action::Loaded {
            source: PathBuf::from("two.csv"),
            dataset: Dataset::default(),
        });
        assert!(reloaded.hovered.is_none());
        assert!(reloaded.points.is_empty());
    }
}
