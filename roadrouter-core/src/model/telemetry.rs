//! Per-request calculation telemetry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::geodesy::Coordinate;
use super::route::RouteOptions;
use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculationStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Cached,
}

impl CalculationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CalculationStatus::Pending => "pending",
            CalculationStatus::InProgress => "in_progress",
            CalculationStatus::Completed => "completed",
            CalculationStatus::Failed => "failed",
            CalculationStatus::Cached => "cached",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            CalculationStatus::Completed | CalculationStatus::Failed | CalculationStatus::Cached
        )
    }

    /// Allowed moves of the request lifecycle.
    ///
    /// A cache hit or a rejected request finishes straight from `Pending`.
    pub fn can_transition_to(self, next: CalculationStatus) -> bool {
        use CalculationStatus::{Cached, Completed, Failed, InProgress, Pending};
        matches!(
            (self, next),
            (Pending, InProgress | Cached | Failed) | (InProgress, Completed | Failed)
        )
    }
}

/// One record per `calculate_route` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationRecord {
    pub id: Uuid,
    pub source: Coordinate,
    pub destination: Coordinate,
    pub status: CalculationStatus,
    pub request_parameters: RouteOptions,
    /// Milliseconds, set once the request finishes
    pub calculation_time: Option<f64>,
    pub nodes_evaluated: usize,
    pub route_id: Option<Uuid>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CalculationRecord {
    pub fn pending(
        source: Coordinate,
        destination: Coordinate,
        options: &RouteOptions,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            destination,
            status: CalculationStatus::Pending,
            request_parameters: options.clone(),
            calculation_time: None,
            nodes_evaluated: 0,
            route_id: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn transition(&mut self, next: CalculationStatus, now: DateTime<Utc>) -> Result<(), Error> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: next.as_str().to_string(),
            });
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn mark_in_progress(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        self.transition(CalculationStatus::InProgress, now)
    }

    pub fn mark_cached(&mut self, calculation_time: f64, now: DateTime<Utc>) -> Result<(), Error> {
        self.transition(CalculationStatus::Cached, now)?;
        self.calculation_time = Some(calculation_time);
        Ok(())
    }

    pub fn mark_completed(
        &mut self,
        calculation_time: f64,
        nodes_evaluated: usize,
        route_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.transition(CalculationStatus::Completed, now)?;
        self.calculation_time = Some(calculation_time);
        self.nodes_evaluated = nodes_evaluated;
        self.route_id = Some(route_id);
        Ok(())
    }

    pub fn mark_failed(
        &mut self,
        calculation_time: f64,
        message: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<(), Error> {
        self.transition(CalculationStatus::Failed, now)?;
        self.calculation_time = Some(calculation_time);
        self.error_message = Some(message.into());
        Ok(())
    }
}
