use std::str::FromStr;

use thiserror::Error;

/// Error for an option identifier outside the report table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown report kind: {0:?} (expected 0/area, 1/volume or 2/luminosity)")]
pub struct UnknownReportKind(pub String);

/// A calculation report the server can produce for an uploaded building file.
///
/// Each kind carries the fixed mapping the upload form used: the checkbox
/// value, the endpoint path, and the localized heading shown above the
/// rendered response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportKind {
    Area,
    Volume,
    Luminosity,
}

impl ReportKind {
    pub const ALL: [ReportKind; 3] = [ReportKind::Area, ReportKind::Volume, ReportKind::Luminosity];

    /// Map a form checkbox value to a kind. Identifiers outside the table
    /// are rejected rather than dispatched to an empty endpoint.
    pub fn from_form_id(id: &str) -> Option<Self> {
        match id {
            "0" => Some(Self::Area),
            "1" => Some(Self::Volume),
            "2" => Some(Self::Luminosity),
            _ => None,
        }
    }

    /// The checkbox value this kind was selected with.
    pub fn form_id(&self) -> &'static str {
        match self {
            Self::Area => "0",
            Self::Volume => "1",
            Self::Luminosity => "2",
        }
    }

    /// Endpoint path on the calculation server.
    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Area => "/calculateArea",
            Self::Volume => "/calculateVolume",
            Self::Luminosity => "/calculateLuminosity",
        }
    }

    /// Localized heading rendered above the server response.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Area => "Powierzchnia:",
            Self::Volume => "Objętość:",
            Self::Luminosity => "Oświetlenie:",
        }
    }
}

impl FromStr for ReportKind {
    type Err = UnknownReportKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "area" | "powierzchnia" => Ok(Self::Area),
            "1" | "volume" | "objętość" | "objetosc" => Ok(Self::Volume),
            "2" | "luminosity" | "oświetlenie" | "oswietlenie" => Ok(Self::Luminosity),
            _ => Err(UnknownReportKind(s.to_string())),
        }
    }
}
