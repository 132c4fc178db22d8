//! Fact extraction - one short statement per tracked entity
//!
//! Every statement carries a stable `(kind, source_key)` pair so repeated
//! rebuilds over unchanged records produce the same key set.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::storage::{RecordStore, StorageError};
use crate::types::{
    Alert, Berth, ChunkKind, ContainerMove, KpiSnapshot, Vessel, WeatherObservation, YardBlock,
};

/// Source key of the KPI statement
pub const KPI_SOURCE_KEY: &str = "dashboard";

/// Point-in-time view of the records facts are extracted from
#[derive(Debug, Clone, Default)]
pub struct PortRecords {
    pub vessels: Vec<Vessel>,
    pub yard_blocks: Vec<YardBlock>,
    pub berths: Vec<Berth>,
    pub alerts: Vec<Alert>,
    /// Most recent observation only
    pub weather: Option<WeatherObservation>,
    pub moves: Vec<ContainerMove>,
}

impl PortRecords {
    pub fn load(store: &dyn RecordStore) -> Result<Self, StorageError> {
        Ok(Self {
            vessels: store.list_vessels()?,
            yard_blocks: store.list_yard_blocks()?,
            berths: store.list_berths()?,
            alerts: store.list_alerts()?,
            weather: store.latest_weather()?,
            moves: store.list_container_moves()?,
        })
    }

    pub fn kpis(&self, now: DateTime<Utc>) -> KpiSnapshot {
        KpiSnapshot::compute(now, &self.yard_blocks, &self.vessels, &self.alerts, &self.moves)
    }
}

/// Statement about one entity, before embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FactStatement {
    pub kind: ChunkKind,
    pub source_key: String,
    pub title: String,
    pub content: String,
}

pub(crate) fn format_instant(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || "unknown".to_string(),
        |t| t.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

pub fn vessel_fact(v: &Vessel) -> FactStatement {
    let status = v.status.map_or_else(|| "unknown".to_string(), |s| s.to_string());
    FactStatement {
        kind: ChunkKind::Vessel,
        source_key: v.id.to_string(),
        title: v.name.clone(),
        content: format!(
            "Vessel {} (IMO {}) arrives at {} carrying {} TEU. Status: {}.",
            v.name,
            v.imo.as_deref().unwrap_or("unknown"),
            format_instant(v.eta),
            v.teu(),
            status
        ),
    }
}

pub fn yard_block_fact(b: &YardBlock) -> FactStatement {
    FactStatement {
        kind: ChunkKind::YardBlock,
        source_key: b.code.clone(),
        title: format!("Yard block {}", b.code),
        content: format!(
            "Yard block {} (category {}) has capacity {} and current count {} ({:.1}% utilisation). Status: {}.",
            b.code,
            b.category,
            b.capacity,
            b.current_count,
            b.utilization(),
            b.status
        ),
    }
}

pub fn berth_fact(b: &Berth) -> FactStatement {
    FactStatement {
        kind: ChunkKind::Berth,
        source_key: b.code.clone(),
        title: format!("Berth {}", b.code),
        content: format!("Berth {} is currently {}.", b.code, b.status),
    }
}

pub fn alert_fact(a: &Alert) -> FactStatement {
    let mut content = format!("Alert: {} - {}.", a.severity, a.message);
    if let Some(s) = &a.suggestion {
        content.push_str(&format!(
            " Suggestion: {} from {} to {}, TEU {}.",
            s.action, s.from_location, s.to_location, s.quantity
        ));
    }
    FactStatement {
        kind: ChunkKind::Alert,
        source_key: a.id.to_string(),
        title: format!("Alert {}", a.id),
        content,
    }
}

pub fn weather_fact(w: &WeatherObservation) -> FactStatement {
    FactStatement {
        kind: ChunkKind::Weather,
        source_key: w.location.clone(),
        title: format!("Weather at {}", w.location),
        content: format!(
            "Weather at {}: {}, {:.1}°C, wind {:.1}m/s, humidity {:.1}%, impact {}.",
            w.location, w.condition, w.temperature, w.wind_speed, w.humidity, w.operational_impact
        ),
    }
}

pub fn kpi_fact(k: &KpiSnapshot) -> FactStatement {
    FactStatement {
        kind: ChunkKind::Kpi,
        source_key: KPI_SOURCE_KEY.to_string(),
        title: "Dashboard KPIs".to_string(),
        content: format!(
            "Average yard utilisation {:.1}%, waiting vessels {}, active alerts {}, TEU processed 24h {}.",
            k.avg_yard_utilization, k.waiting_vessels, k.active_alerts, k.teu_processed_24h
        ),
    }
}

/// All statements for a record view: vessels, yard blocks, berths, alerts,
/// latest weather, then the KPI summary (always present).
pub fn extract_facts(now: DateTime<Utc>, records: &PortRecords) -> Vec<FactStatement> {
    let mut facts = Vec::with_capacity(
        records.vessels.len() + records.yard_blocks.len() + records.berths.len() + records.alerts.len() + 2,
    );
    facts.extend(records.vessels.iter().map(vessel_fact));
    facts.extend(records.yard_blocks.iter().map(yard_block_fact));
    facts.extend(records.berths.iter().map(berth_fact));
    facts.extend(records.alerts.iter().map(alert_fact));
    facts.extend(records.weather.iter().map(weather_fact));
    facts.push(kpi_fact(&records.kpis(now)));
    facts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        AlertSeverity, BerthStatus, MoveSuggestion, OperationalImpact, VesselStatus,
    };
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn test_vessel_statement() {
        let eta = Utc.with_ymd_and_hms(2026, 3, 1, 6, 30, 0).unwrap();
        let mut v = Vessel::new("Maersk Elba", eta, 1200);
        v.imo = Some("9456771".to_string());
        v.status = Some(VesselStatus::Berthing);

        let fact = vessel_fact(&v);
        assert_eq!(
            fact.content,
            "Vessel Maersk Elba (IMO 9456771) arrives at 2026-03-01T06:30:00Z carrying 1200 TEU. Status: Berthing."
        );
        assert_eq!(fact.title, "Maersk Elba");
        assert_eq!(fact.source_key, v.id.to_string());
    }

    #[test]
    fn test_vessel_statement_unknowns() {
        let v = Vessel {
            id: Uuid::new_v4(),
            name: "Ghost".to_string(),
            imo: None,
            expected_teu: None,
            eta: None,
            status: None,
        };
        assert_eq!(
            vessel_fact(&v).content,
            "Vessel Ghost (IMO unknown) arrives at unknown carrying 0 TEU. Status: unknown."
        );
    }

    #[test]
    fn test_yard_block_and_berth_statements() {
        let fact = yard_block_fact(&YardBlock::new("A1", 200, 171));
        assert_eq!(
            fact.content,
            "Yard block A1 (category Standard) has capacity 200 and current count 171 (85.5% utilisation). Status: warning."
        );
        assert_eq!(fact.title, "Yard block A1");

        let fact = berth_fact(&Berth::new("B3", BerthStatus::Occupied));
        assert_eq!(fact.content, "Berth B3 is currently occupied.");
    }

    #[test]
    fn test_alert_statement_with_and_without_suggestion() {
        let mut alert = Alert {
            id: Uuid::new_v4(),
            surge_id: None,
            created_at: Utc::now(),
            severity: AlertSeverity::High,
            message: "Surge detected: High arrivals in next 6 hours".to_string(),
            acknowledged: false,
            suggestion: None,
        };
        assert_eq!(
            alert_fact(&alert).content,
            "Alert: HIGH - Surge detected: High arrivals in next 6 hours."
        );

        alert.suggestion = Some(MoveSuggestion {
            action: "Move containers".to_string(),
            from_location: "A1".to_string(),
            to_location: "C2".to_string(),
            quantity: 15,
        });
        assert!(alert_fact(&alert)
            .content
            .ends_with("Suggestion: Move containers from A1 to C2, TEU 15."));
    }

    #[test]
    fn test_weather_statement() {
        let w = WeatherObservation {
            id: Uuid::new_v4(),
            location: "Rotterdam".to_string(),
            temperature: 11.3,
            wind_speed: 14.0,
            humidity: 81.0,
            condition: "Rain".to_string(),
            operational_impact: OperationalImpact::High,
            observed_at: Utc::now(),
        };
        assert_eq!(
            weather_fact(&w).content,
            "Weather at Rotterdam: Rain, 11.3°C, wind 14.0m/s, humidity 81.0%, impact High."
        );
    }

    #[test]
    fn test_extract_always_has_kpi() {
        let facts = extract_facts(Utc::now(), &PortRecords::default());
        assert_eq!(facts.len(), 1);
        assert_eq!(facts[0].kind, ChunkKind::Kpi);
        assert_eq!(facts[0].source_key, "dashboard");
        assert_eq!(
            facts[0].content,
            "Average yard utilisation 0.0%, waiting vessels 0, active alerts 0, TEU processed 24h 0."
        );
    }
}
