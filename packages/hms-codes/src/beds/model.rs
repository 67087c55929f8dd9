use crate::error::Error;
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

/// An emergency-room bed. `bed_no` is assigned once at creation and never changes.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct EmergencyBed {
    pub id: i64,
    pub bed_no: String,
    pub ward: Option<String>,
    pub status: BedStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the caller when creating a bed
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct NewEmergencyBed {
    pub ward: Option<String>,
    #[serde(default)]
    pub status: BedStatus,
    pub notes: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum BedStatus {
    #[default]
    Available,
    Occupied,
    Cleaning,
    OutOfService,
    /// Taken out of use. The row, and its code, are kept.
    Retired,
}

impl BedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BedStatus::Available => "available",
            BedStatus::Occupied => "occupied",
            BedStatus::Cleaning => "cleaning",
            BedStatus::OutOfService => "out_of_service",
            BedStatus::Retired => "retired",
        }
    }
}

impl Display for BedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BedStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(BedStatus::Available),
            "occupied" => Ok(BedStatus::Occupied),
            "cleaning" => Ok(BedStatus::Cleaning),
            "out_of_service" => Ok(BedStatus::OutOfService),
            "retired" => Ok(BedStatus::Retired),
            _ => Err(Error::UnknownBedStatus {
                status: s.to_owned(),
            }),
        }
    }
}

impl NewEmergencyBed {
    pub fn in_ward(ward: &str) -> Self {
        Self {
            ward: Some(ward.to_owned()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_str() {
        for status in [
            BedStatus::Available,
            BedStatus::Occupied,
            BedStatus::Cleaning,
            BedStatus::OutOfService,
            BedStatus::Retired,
        ] {
            assert_eq!(status.as_str().parse::<BedStatus>().unwrap(), status);
        }
    }

    #[test]
    fn unknown_status() {
        let err = "closed".parse::<BedStatus>().unwrap_err();
        assert!(matches!(err, Error::UnknownBedStatus { ref status } if status == "closed"));
    }

    #[test]
    fn serializes_with_snake_case_status() {
        let bed = EmergencyBed {
            id: 7,
            bed_no: "ER-07".to_string(),
            ward: Some("Resus".to_string()),
            status: BedStatus::OutOfService,
            notes: None,
            created_at: DateTime::parse_from_rfc3339("2024-03-01T08:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
        };

        let json = serde_json::to_value(&bed).unwrap();
        assert_eq!(json["bed_no"], "ER-07");
        assert_eq!(json["status"], "out_of_service");
        assert_eq!(json["created_at"], "2024-03-01T08:30:00Z");
    }

    #[test]
    fn new_bed_defaults_to_available() {
        let new: NewEmergencyBed = serde_json::from_str(r#"{"ward": "Resus"}"#).unwrap();
        assert_eq!(new.status, BedStatus::Available);
        assert_eq!(new, NewEmergencyBed::in_ward("Resus"));
    }
}
