use crate::data_access::DataAccessError;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Admission failures raised by chain handlers and builders.
///
/// Every business rejection carries a stable numeric code and a symbolic code
/// the surrounding API layer can hand to the end user.
#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("Parking space {space_id} does not exist")]
    ParkingSpaceNotFound { space_id: i64 },

    #[error("Vehicle {license_plate} is already inside the facility")]
    VehicleAlreadyInside { license_plate: String },

    #[error("{detail}")]
    ParkingSpaceOccupied { space_id: i64, detail: String },

    #[error("Vehicle {license_plate} is not inside the facility")]
    VehicleNotInside { license_plate: String },

    #[error("Invalid time range: end {end} must be after start {start}")]
    InvalidTimeRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Event area {area_id} does not exist")]
    EventAreaNotFound { area_id: i64 },

    #[error("Event area {area_id} is already reserved between {start} and {end}")]
    AreaAlreadyOccupied {
        area_id: i64,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Collaboration {collaboration_id} does not exist")]
    CollaborationNotFound { collaboration_id: i64 },

    #[error("Expected headcount {requested} exceeds area capacity {capacity}")]
    InsufficientCapacity { requested: i32, capacity: i32 },

    #[error("Cannot build an admission chain without handlers")]
    EmptyChain,

    #[error("Admission chain '{chain}' finished without producing its result")]
    IncompleteChain { chain: String },

    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
}

impl AdmissionError {
    /// Stable numeric code for business rejections
    pub fn code(&self) -> Option<u32> {
        match self {
            Self::ParkingSpaceNotFound { .. } => Some(1001),
            Self::VehicleAlreadyInside { .. } => Some(1002),
            Self::ParkingSpaceOccupied { .. } => Some(1003),
            Self::VehicleNotInside { .. } => Some(1004),
            Self::InvalidTimeRange { .. } => Some(2001),
            Self::EventAreaNotFound { .. } => Some(2002),
            Self::AreaAlreadyOccupied { .. } => Some(2003),
            Self::CollaborationNotFound { .. } => Some(2004),
            Self::InsufficientCapacity { .. } => Some(2005),
            Self::EmptyChain | Self::IncompleteChain { .. } | Self::DataAccess(_) => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::ParkingSpaceNotFound { .. } => "PARKING_SPACE_NOT_FOUND",
            Self::VehicleAlreadyInside { .. } => "VEHICLE_ALREADY_INSIDE",
            Self::ParkingSpaceOccupied { .. } => "PARKING_SPACE_OCCUPIED",
            Self::VehicleNotInside { .. } => "VEHICLE_NOT_INSIDE",
            Self::InvalidTimeRange { .. } => "INVALID_TIME_RANGE",
            Self::EventAreaNotFound { .. } => "EVENT_AREA_NOT_FOUND",
            Self::AreaAlreadyOccupied { .. } => "AREA_ALREADY_OCCUPIED",
            Self::CollaborationNotFound { .. } => "COLLABORATION_NOT_FOUND",
            Self::InsufficientCapacity { .. } => "INSUFFICIENT_CAPACITY",
            Self::EmptyChain => "EMPTY_CHAIN",
            Self::IncompleteChain { .. } => "INCOMPLETE_CHAIN",
            Self::DataAccess(_) => "DATA_ACCESS",
        }
    }

    /// Whether the caller should surface this to the user and allow a retry
    /// with corrected input.
    pub fn is_business_rejection(&self) -> bool {
        self.code().is_some()
    }
}

pub type AdmissionResult<T> = Result<T, AdmissionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(
            AdmissionError::ParkingSpaceNotFound { space_id: 1 }.code(),
            Some(1001)
        );
        assert_eq!(
            AdmissionError::InsufficientCapacity {
                requested: 11,
                capacity: 10
            }
            .code(),
            Some(2005)
        );
        assert_eq!(AdmissionError::EmptyChain.code(), None);
    }

    #[test]
    fn test_business_classification() {
        assert!(AdmissionError::CollaborationNotFound { collaboration_id: 3 }
            .is_business_rejection());
        assert!(!AdmissionError::EmptyChain.is_business_rejection());
        assert!(
            !AdmissionError::from(DataAccessError::Backend("timeout".to_string()))
                .is_business_rejection()
        );
    }

    #[test]
    fn test_occupied_message_is_the_detail() {
        let err = AdmissionError::ParkingSpaceOccupied {
            space_id: 4,
            detail: "Parking space B-04 is occupied by XY987".to_string(),
        };
        assert_eq!(err.to_string(), "Parking space B-04 is occupied by XY987");
        assert_eq!(err.symbol(), "PARKING_SPACE_OCCUPIED");
    }
}
