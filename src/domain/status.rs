use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a ride is in its lifecycle.
///
/// `Accepted`, `Arrived` and `Started` are written by the matching process;
/// the rider only ever moves a ride to `Cancelled` or `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RideStatus {
    Searching,
    Accepted,
    Arrived,
    Started,
    Completed,
    Cancelled,
}

/// A transition the rider can trigger from the tracking view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RideAction {
    Cancel,
    Complete,
}

impl RideStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RideStatus::Searching => "searching",
            RideStatus::Accepted => "accepted",
            RideStatus::Arrived => "arrived",
            RideStatus::Started => "started",
            RideStatus::Completed => "completed",
            RideStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RideStatus::Completed | RideStatus::Cancelled)
    }

    /// Whether the rider may perform `action` while the ride is in this status.
    pub fn permits(&self, action: RideAction) -> bool {
        match action {
            RideAction::Cancel => matches!(self, RideStatus::Searching | RideStatus::Accepted),
            RideAction::Complete => matches!(self, RideStatus::Started),
        }
    }

    /// Whether a record in this status may be written as `next`.
    ///
    /// Finished rides never change. A ride only becomes `cancelled` or
    /// `completed` from a status the rider could have done that from;
    /// the matching process is free to move between the other statuses.
    pub fn can_become(&self, next: RideStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            RideStatus::Cancelled => self.permits(RideAction::Cancel),
            RideStatus::Completed => self.permits(RideAction::Complete),
            _ => true,
        }
    }

    /// The button the tracking view offers, if any. Cancel is only offered
    /// while searching, even though an accepted ride may still be cancelled.
    pub fn available_action(&self) -> Option<RideAction> {
        match self {
            RideStatus::Searching => Some(RideAction::Cancel),
            RideStatus::Started => Some(RideAction::Complete),
            _ => None,
        }
    }

    /// Banner text on the tracking view.
    pub fn tracking_text(&self) -> &'static str {
        match self {
            RideStatus::Searching => "Searching for driver...",
            RideStatus::Accepted => "Driver is on the way",
            RideStatus::Arrived => "Driver has arrived",
            RideStatus::Started => "Ride in progress",
            RideStatus::Completed | RideStatus::Cancelled => "Processing...",
        }
    }

    pub fn tracking_color(&self) -> &'static str {
        match self {
            RideStatus::Searching => "#FFC107",
            RideStatus::Accepted | RideStatus::Arrived => "#2196F3",
            RideStatus::Started => "#4CAF50",
            RideStatus::Completed | RideStatus::Cancelled => "#999",
        }
    }

    /// Dot colour in the history list. `Arrived` has no entry of its own.
    pub fn history_color(&self) -> &'static str {
        match self {
            RideStatus::Completed => "#4CAF50",
            RideStatus::Cancelled => "#f44336",
            RideStatus::Searching | RideStatus::Accepted | RideStatus::Started => "#FFC107",
            RideStatus::Arrived => "#999",
        }
    }
}

impl fmt::Display for RideStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
