//! Drainage prediction session.
//!
//! The session owns the request context, the latest result and the progress
//! countdown. It never performs I/O: the client asks it for a ticket, runs the
//! call, and hands the outcome back together with the ticket's sequence
//! number. Anything that arrives for an older sequence number, or after the
//! session was closed, is dropped without touching state.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{DrainagePrediction, PredictLocationRequest};
use crate::error::{ApiError, RequestError};
use crate::geo::LatLng;
use crate::progress::ProgressTimer;

pub const DEFAULT_LOCATION_NAME: &str = "Selected location";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdempotencyKey(pub String);

impl IdempotencyKey {
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What the user asked a prediction for.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionContext {
    pub location: LatLng,
    pub location_name: String,
    pub water_depth_cm: f64,
    pub flood_report_id: Option<String>,
}

impl PredictionContext {
    pub fn new(location: LatLng, location_name: impl Into<String>, water_depth_cm: f64) -> Self {
        Self {
            location,
            location_name: location_name.into(),
            water_depth_cm,
            flood_report_id: None,
        }
    }

    /// Map features carry ids like `report_17`; the prediction endpoint wants `17`.
    pub fn with_report(mut self, flood_report_id: &str) -> Self {
        let id = flood_report_id.trim();
        let id = id.strip_prefix("report_").unwrap_or(id);
        if !id.is_empty() {
            self.flood_report_id = Some(id.to_owned());
        }
        self
    }

    fn validate(&self) -> Result<(), RequestError> {
        if !self.location.is_finite() {
            return Err(RequestError::NonFiniteCoordinate);
        }
        if !self.water_depth_cm.is_finite() || self.water_depth_cm < 0.0 {
            return Err(RequestError::InvalidDepth(self.water_depth_cm));
        }
        Ok(())
    }

    pub fn display_name(&self) -> &str {
        let name = self.location_name.trim();
        if name.is_empty() {
            DEFAULT_LOCATION_NAME
        } else {
            name
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PredictionCall {
    /// `GET` by report id. Safe to repeat.
    Lookup { flood_report_id: String },
    /// `POST` that stores a report and predicts for it in one go.
    CreateAndPredict {
        request: PredictLocationRequest,
        idempotency_key: IdempotencyKey,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionTicket {
    pub seq: u64,
    pub call: PredictionCall,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Requesting,
    Displaying,
    Retrying,
    Closed,
}

/// Identifies one progress countdown; a fresh token is minted per result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerToken(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Applied { timer: TimerToken },
    Failed(ApiError),
    /// Superseded or closed; nothing changed.
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    Running { percent: f64, remaining_hours: f64 },
    Finished,
    /// Token no longer current. The driver should drop its interval.
    Cancelled,
}

#[derive(Debug, Default)]
pub struct PredictionSession {
    phase: Phase,
    context: Option<PredictionContext>,
    idempotency_key: Option<IdempotencyKey>,
    seq: u64,
    result: Option<DrainagePrediction>,
    last_error: Option<ApiError>,
    timer: Option<(TimerToken, ProgressTimer)>,
    timer_generation: u64,
}

impl PredictionSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn context(&self) -> Option<&PredictionContext> {
        self.context.as_ref()
    }

    pub fn result(&self) -> Option<&DrainagePrediction> {
        self.result.as_ref()
    }

    pub fn last_error(&self) -> Option<&ApiError> {
        self.last_error.as_ref()
    }

    pub fn timer(&self) -> Option<&ProgressTimer> {
        self.timer.as_ref().map(|(_, t)| t)
    }

    pub fn timer_token(&self) -> Option<TimerToken> {
        self.timer.as_ref().map(|(token, _)| *token)
    }

    pub fn latest_seq(&self) -> u64 {
        self.seq
    }

    /// Start a new prediction. Supersedes whatever was in flight.
    pub fn request(&mut self, context: PredictionContext) -> Result<PredictionTicket, RequestError> {
        context.validate()?;
        Ok(self.issue(context, IdempotencyKey::generate()))
    }

    /// Re-run the last context. Create calls keep their idempotency key.
    pub fn retry(&mut self) -> Option<PredictionTicket> {
        if !matches!(self.phase, Phase::Retrying | Phase::Displaying) {
            return None;
        }
        let context = self.context.clone()?;
        let key = self
            .idempotency_key
            .clone()
            .unwrap_or_else(IdempotencyKey::generate);
        Some(self.issue(context, key))
    }

    fn issue(&mut self, context: PredictionContext, key: IdempotencyKey) -> PredictionTicket {
        self.seq += 1;
        self.phase = Phase::Requesting;
        self.result = None;
        self.last_error = None;
        self.timer = None;

        let call = match &context.flood_report_id {
            Some(id) => PredictionCall::Lookup {
                flood_report_id: id.clone(),
            },
            None => PredictionCall::CreateAndPredict {
                request: PredictLocationRequest {
                    lat: context.location.lat,
                    lng: context.location.lng,
                    location_name: context.display_name().to_owned(),
                    water_depth_cm: context.water_depth_cm,
                },
                idempotency_key: key.clone(),
            },
        };
        self.context = Some(context);
        self.idempotency_key = Some(key);
        PredictionTicket {
            seq: self.seq,
            call,
        }
    }

    pub fn resolve(
        &mut self,
        seq: u64,
        outcome: Result<DrainagePrediction, ApiError>,
    ) -> Resolution {
        if seq != self.seq || self.phase() != Phase::Requesting {
            return Resolution::Stale;
        }
        match outcome {
            Ok(prediction) => {
                if let (Some(ctx), Some(id)) =
                    (self.context.as_mut(), prediction.flood_report_id.as_ref())
                {
                    if ctx.flood_report_id.is_none() {
                        ctx.flood_report_id = Some(id.clone());
                    }
                }
                self.timer_generation += 1;
                let token = TimerToken(self.timer_generation);
                self.timer = Some((token, ProgressTimer::new(prediction.estimated_hours)));
                self.result = Some(prediction);
                self.phase = Phase::Displaying;
                Resolution::Applied { timer: token }
            }
            Err(err) => {
                self.last_error = Some(err.clone());
                self.phase = Phase::Retrying;
                Resolution::Failed(err)
            }
        }
    }

    pub fn tick(&mut self, token: TimerToken) -> TickOutcome {
        if self.phase() == Phase::Closed {
            return TickOutcome::Cancelled;
        }
        let Some((current, timer)) = self.timer.as_mut() else {
            return TickOutcome::Cancelled;
        };
        if *current != token {
            return TickOutcome::Cancelled;
        }
        if timer.tick() {
            TickOutcome::Running {
                percent: timer.percent(),
                remaining_hours: timer.remaining_hours(),
            }
        } else {
            TickOutcome::Finished
        }
    }

    /// Close the modal. Late responses and ticks become no-ops.
    pub fn close(&mut self) {
        self.phase = Phase::Closed;
        self.timer = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> PredictionContext {
        PredictionContext::new(LatLng::new(21.0285, 105.8542), "Hồ Gươm", 40.0)
    }

    fn prediction(hours: f64, report_id: Option<&str>) -> DrainagePrediction {
        DrainagePrediction {
            estimated_hours: hours,
            level_category: Some("medium".into()),
            level_text: None,
            message: None,
            water_depth_cm: Some(40.0),
            completion_timestamp: None,
            factors: Vec::new(),
            recommendations: Vec::new(),
            flood_report_id: report_id.map(str::to_owned),
            prediction_id: None,
        }
    }

    fn key_of(ticket: &PredictionTicket) -> IdempotencyKey {
        match &ticket.call {
            PredictionCall::CreateAndPredict { idempotency_key, .. } => idempotency_key.clone(),
            other => panic!("expected create call, got {other:?}"),
        }
    }

    #[test]
    fn invalid_context_is_rejected_without_state_change() {
        let mut session = PredictionSession::new();
        let bad = PredictionContext::new(LatLng::new(f64::NAN, 105.8), "x", 10.0);
        assert_eq!(session.request(bad), Err(RequestError::NonFiniteCoordinate));
        let negative = PredictionContext::new(LatLng::new(21.0, 105.8), "x", -1.0);
        assert_eq!(session.request(negative), Err(RequestError::InvalidDepth(-1.0)));
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.latest_seq(), 0);
    }

    #[test]
    fn known_report_uses_lookup() {
        let mut session = PredictionSession::new();
        let ticket = session.request(ctx().with_report("17")).expect("ticket");
        assert_eq!(
            ticket.call,
            PredictionCall::Lookup {
                flood_report_id: "17".into()
            }
        );
        let ticket = session
            .request(ctx().with_report("report_42"))
            .expect("ticket");
        assert_eq!(
            ticket.call,
            PredictionCall::Lookup {
                flood_report_id: "42".into()
            }
        );
    }

    #[test]
    fn success_displays_and_starts_timer() {
        let mut session = PredictionSession::new();
        let ticket = session.request(ctx()).expect("ticket");
        assert_eq!(session.phase(), Phase::Requesting);

        let resolution = session.resolve(ticket.seq, Ok(prediction(3.0, None)));
        let Resolution::Applied { timer } = resolution else {
            panic!("expected applied, got {resolution:?}");
        };
        assert_eq!(session.phase(), Phase::Displaying);
        assert_eq!(session.timer_token(), Some(timer));
        assert_eq!(session.timer().map(|t| t.total_hours()), Some(3.0));
    }

    #[test]
    fn late_response_for_superseded_request_is_stale() {
        let mut session = PredictionSession::new();
        let first = session.request(ctx()).expect("first");
        let second = session
            .request(PredictionContext::new(LatLng::new(21.01, 105.80), "Cầu Giấy", 20.0))
            .expect("second");

        assert_eq!(
            session.resolve(first.seq, Ok(prediction(9.0, None))),
            Resolution::Stale
        );
        assert_eq!(session.phase(), Phase::Requesting);
        assert!(session.result().is_none());

        assert!(matches!(
            session.resolve(second.seq, Ok(prediction(2.0, None))),
            Resolution::Applied { .. }
        ));
        assert_eq!(session.result().map(|r| r.estimated_hours), Some(2.0));
        assert_eq!(session.context().map(|c| c.display_name()), Some("Cầu Giấy"));
    }

    #[test]
    fn failure_then_retry_reuses_idempotency_key() {
        let mut session = PredictionSession::new();
        let first = session.request(ctx()).expect("ticket");
        let key = key_of(&first);

        let resolution = session.resolve(first.seq, Err(ApiError::Transport("offline".into())));
        assert!(matches!(resolution, Resolution::Failed(ApiError::Transport(_))));
        assert_eq!(session.phase(), Phase::Retrying);
        assert!(session.last_error().is_some());

        let retry = session.retry().expect("retry ticket");
        assert!(retry.seq > first.seq);
        assert_eq!(key_of(&retry), key);
    }

    #[test]
    fn each_user_request_gets_a_fresh_key() {
        let mut session = PredictionSession::new();
        let a = session.request(ctx()).expect("a");
        let b = session.request(ctx()).expect("b");
        assert_ne!(key_of(&a), key_of(&b));
    }

    #[test]
    fn created_report_id_turns_retries_into_lookups() {
        let mut session = PredictionSession::new();
        let ticket = session.request(ctx()).expect("ticket");
        session.resolve(ticket.seq, Ok(prediction(1.0, Some("88"))));
        let update = session.retry().expect("update");
        assert_eq!(
            update.call,
            PredictionCall::Lookup {
                flood_report_id: "88".into()
            }
        );
    }

    #[test]
    fn retry_without_context_or_from_idle_yields_nothing() {
        let mut session = PredictionSession::new();
        assert!(session.retry().is_none());
        let ticket = session.request(ctx()).expect("ticket");
        // still requesting; nothing to retry yet
        assert!(session.retry().is_none());
        assert_eq!(session.latest_seq(), ticket.seq);
    }

    #[test]
    fn new_result_replaces_timer_and_old_token_is_cancelled() {
        let mut session = PredictionSession::new();
        let t1 = session.request(ctx()).expect("t1");
        let Resolution::Applied { timer: old } = session.resolve(t1.seq, Ok(prediction(3.0, None)))
        else {
            panic!("expected applied");
        };
        let t2 = session.retry().expect("t2");
        assert_eq!(session.tick(old), TickOutcome::Cancelled);
        let Resolution::Applied { timer: new } = session.resolve(t2.seq, Ok(prediction(3.0, None)))
        else {
            panic!("expected applied");
        };
        assert_ne!(old, new);
        assert_eq!(session.tick(old), TickOutcome::Cancelled);
        assert!(matches!(session.tick(new), TickOutcome::Running { .. }));
    }

    #[test]
    fn ticks_run_to_completion() {
        let mut session = PredictionSession::new();
        let ticket = session.request(ctx()).expect("ticket");
        let Resolution::Applied { timer } = session.resolve(ticket.seq, Ok(prediction(3.0, None)))
        else {
            panic!("expected applied");
        };
        let mut last_remaining = f64::INFINITY;
        for _ in 0..179 {
            match session.tick(timer) {
                TickOutcome::Running {
                    remaining_hours, ..
                } => {
                    assert!(remaining_hours <= last_remaining);
                    last_remaining = remaining_hours;
                }
                other => panic!("unexpected {other:?}"),
            }
        }
        assert_eq!(session.tick(timer), TickOutcome::Finished);
        assert_eq!(session.timer().map(|t| t.percent()), Some(100.0));
    }

    #[test]
    fn close_stops_timer_and_drops_late_responses() {
        let mut session = PredictionSession::new();
        let ticket = session.request(ctx()).expect("ticket");
        let Resolution::Applied { timer } = session.resolve(ticket.seq, Ok(prediction(3.0, None)))
        else {
            panic!("expected applied");
        };
        let pending = session.retry().expect("pending");
        session.close();

        assert_eq!(session.phase(), Phase::Closed);
        assert_eq!(session.tick(timer), TickOutcome::Cancelled);
        assert_eq!(
            session.resolve(pending.seq, Ok(prediction(1.0, None))),
            Resolution::Stale
        );
        assert!(session.result().is_none());
        assert!(session.timer().is_none());
        assert!(session.retry().is_none());
    }

    #[test]
    fn reopening_after_close_works() {
        let mut session = PredictionSession::new();
        let first = session.request(ctx()).expect("first");
        session.close();
        let second = session.request(ctx()).expect("second");
        assert!(second.seq > first.seq);
        assert_eq!(session.phase(), Phase::Requesting);
    }
}
