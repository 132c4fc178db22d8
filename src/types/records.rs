//! Plain operational records: vessels, yard blocks, berths, weather, moves

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// Vessels
// ============================================================================

/// Lifecycle status of a vessel calling at the port
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VesselStatus {
    Waiting,
    Berthing,
    Loading,
    Departed,
}

impl VesselStatus {
    /// Vessels in these states occupy (or are queued for) quay capacity
    pub const fn is_waiting(self) -> bool {
        matches!(self, Self::Waiting | Self::Berthing)
    }

    /// Exact variant name, `None` for anything else
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Waiting" => Some(Self::Waiting),
            "Berthing" => Some(Self::Berthing),
            "Loading" => Some(Self::Loading),
            "Departed" => Some(Self::Departed),
            _ => None,
        }
    }
}

impl fmt::Display for VesselStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Waiting => "Waiting",
            Self::Berthing => "Berthing",
            Self::Loading => "Loading",
            Self::Departed => "Departed",
        };
        f.write_str(s)
    }
}

/// A vessel calling at the port
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vessel {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub imo: Option<String>,
    /// Expected TEU to discharge/load; missing counts as zero
    #[serde(default)]
    pub expected_teu: Option<u32>,
    /// Vessels without an ETA never fall inside any arrival window
    #[serde(default)]
    pub eta: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<VesselStatus>,
}

impl Vessel {
    pub fn new(name: impl Into<String>, eta: DateTime<Utc>, expected_teu: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            imo: None,
            expected_teu: Some(expected_teu),
            eta: Some(eta),
            status: Some(VesselStatus::Waiting),
        }
    }

    pub fn teu(&self) -> u64 {
        u64::from(self.expected_teu.unwrap_or(0))
    }

    pub fn is_waiting(&self) -> bool {
        self.status.is_some_and(VesselStatus::is_waiting)
    }

    /// True when the ETA lies in the half-open window `[start, end)`
    pub fn eta_in(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.eta.is_some_and(|eta| eta >= start && eta < end)
    }
}

/// Operator-supplied vessel details, matched against existing vessels by
/// id, then IMO, then name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselUpsert {
    #[serde(default)]
    pub vessel_id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub imo: Option<String>,
    pub expected_teu: u32,
    /// RFC 3339; anything unparseable is stored as no ETA
    pub eta: String,
    /// Variant name; anything unrecognised is stored as no status
    pub status: String,
}

impl VesselUpsert {
    pub fn parsed_eta(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(self.eta.trim())
            .ok()
            .map(|eta| eta.with_timezone(&Utc))
    }

    pub fn parsed_status(&self) -> Option<VesselStatus> {
        VesselStatus::from_name(self.status.trim())
    }

    /// IMO if present and non-blank
    pub fn imo(&self) -> Option<&str> {
        self.imo.as_deref().map(str::trim).filter(|imo| !imo.is_empty())
    }

    /// Overwrite `vessel` with these details, keeping its id
    pub fn apply_to(&self, vessel: &mut Vessel) {
        vessel.name.clone_from(&self.name);
        vessel.imo = self.imo().map(str::to_string);
        vessel.expected_teu = Some(self.expected_teu);
        vessel.eta = self.parsed_eta();
        vessel.status = self.parsed_status();
    }
}

// ============================================================================
// Yard Blocks
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YardBlockCategory {
    Standard,
    Reefer,
    Hazard,
}

impl fmt::Display for YardBlockCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Standard => "Standard",
            Self::Reefer => "Reefer",
            Self::Hazard => "Hazard",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum YardBlockStatus {
    Normal,
    Warning,
    Critical,
}

impl YardBlockStatus {
    /// Critical at or above 95% utilisation
    pub const CRITICAL_UTIL: f64 = 95.0;
    /// Warning at or above 80% utilisation
    pub const WARNING_UTIL: f64 = 80.0;

    pub fn from_utilization(util: f64) -> Self {
        if util >= Self::CRITICAL_UTIL {
            Self::Critical
        } else if util >= Self::WARNING_UTIL {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

impl fmt::Display for YardBlockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A container stacking area in the yard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YardBlock {
    pub id: Uuid,
    /// Natural key, unique across the yard (e.g. "A1")
    pub code: String,
    pub category: YardBlockCategory,
    /// Capacity in TEU
    pub capacity: u32,
    /// Current stacked TEU
    pub current_count: u32,
    pub status: YardBlockStatus,
}

impl YardBlock {
    pub fn new(code: impl Into<String>, capacity: u32, current_count: u32) -> Self {
        let mut block = Self {
            id: Uuid::new_v4(),
            code: code.into(),
            category: YardBlockCategory::Standard,
            capacity,
            current_count,
            status: YardBlockStatus::Normal,
        };
        block.refresh_status();
        block
    }

    /// Utilisation percentage; a zero-capacity block reports 0
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(self.current_count) * 100.0 / f64::from(self.capacity)
    }

    pub fn refresh_status(&mut self) {
        self.status = YardBlockStatus::from_utilization(self.utilization());
    }
}

// ============================================================================
// Berths
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BerthStatus {
    Available,
    Occupied,
    Maintenance,
}

impl fmt::Display for BerthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
            Self::Maintenance => "maintenance",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Berth {
    pub id: Uuid,
    pub code: String,
    pub status: BerthStatus,
}

impl Berth {
    pub fn new(code: impl Into<String>, status: BerthStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            code: code.into(),
            status,
        }
    }
}

// ============================================================================
// Weather
// ============================================================================

/// Estimated effect of the weather on quay and yard operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationalImpact {
    Low,
    Medium,
    High,
}

impl fmt::Display for OperationalImpact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        };
        f.write_str(s)
    }
}

/// A cached weather observation (fetched by an external collaborator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub id: Uuid,
    pub location: String,
    /// Degrees Celsius
    pub temperature: f64,
    /// Metres per second
    pub wind_speed: f64,
    /// Percent
    pub humidity: f64,
    pub condition: String,
    pub operational_impact: OperationalImpact,
    pub observed_at: DateTime<Utc>,
}

// ============================================================================
// Container Moves
// ============================================================================

/// Audit record of TEU relocated between two yard blocks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerMove {
    pub id: Uuid,
    pub from_block: String,
    pub to_block: String,
    pub teu: u32,
    pub ts: DateTime<Utc>,
}

/// Overall yard utilisation recorded after each container move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSample {
    pub id: Uuid,
    pub time: DateTime<Utc>,
    /// Mean block utilisation at `time`, percent
    pub utilization: f64,
    /// Critical threshold in force when the sample was taken
    pub threshold: f64,
}
