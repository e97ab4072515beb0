//! UUID, datetime, time and duration values and arithmetic between them.

use axum::{response::Json, routing::put, Router};
use chrono::{DateTime, NaiveTime, TimeDelta, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{ApiResult, Loc, ValidationErrors};
use crate::extract::{JsonPayload, PathParam};
use crate::validation::{
    both, coerce_datetime, coerce_duration, coerce_time, coerce_uuid, parse_param, Fields, Schema,
};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/items/:item_id", put(read_items))
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schedule {
    pub start_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub repeat_at: Option<NaiveTime>,
    pub process_after: Option<TimeDelta>,
}

impl Schema for Schedule {
    fn from_json_at(value: &Value, loc: &Loc) -> Result<Self, ValidationErrors> {
        let mut f = Fields::new(value, loc);
        let start_datetime = f.optional("start_datetime", coerce_datetime);
        let end_datetime = f.optional("end_datetime", coerce_datetime);
        let repeat_at = f.optional("repeat_at", coerce_time);
        let process_after = f.optional("process_after", coerce_duration);
        f.finish(|| {
            Some(Schedule {
                start_datetime,
                end_datetime,
                repeat_at,
                process_after,
            })
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ScheduleReport {
    pub item_id: Uuid,
    pub start_datetime: Option<DateTime<Utc>>,
    pub end_datetime: Option<DateTime<Utc>>,
    pub repeat_at: Option<NaiveTime>,
    /// Seconds.
    pub process_after: Option<f64>,
    pub start_process: Option<DateTime<Utc>>,
    /// Seconds.
    pub duration: Option<f64>,
}

fn seconds(delta: TimeDelta) -> f64 {
    delta.num_milliseconds() as f64 / 1000.0
}

impl ScheduleReport {
    pub fn new(item_id: Uuid, schedule: Schedule) -> Self {
        let start_process = schedule
            .start_datetime
            .zip(schedule.process_after)
            .and_then(|(start, after)| start.checked_add_signed(after));
        let duration = schedule
            .end_datetime
            .zip(start_process)
            .map(|(end, start)| seconds(end - start));

        Self {
            item_id,
            start_datetime: schedule.start_datetime,
            end_datetime: schedule.end_datetime,
            repeat_at: schedule.repeat_at,
            process_after: schedule.process_after.map(seconds),
            start_process,
            duration,
        }
    }
}

pub async fn read_items(
    PathParam(item_id): PathParam<String>,
    payload: JsonPayload,
) -> ApiResult<Json<ScheduleReport>> {
    let (item_id, schedule) = both(
        parse_param(&item_id, &Loc::root("path").key("item_id"), coerce_uuid),
        payload.optional::<Schedule>(),
    )?;
    Ok(Json(ScheduleReport::new(item_id, schedule.unwrap_or_default())))
}
