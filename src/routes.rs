use actix_web::{Responder, HttpResponse, post, get, web::{self}};
use log::{info, debug};
use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::models::{api_datetime, hour_label, DailyStepsResult, DateRange, SyncState, DAILY_STEP_GOAL};
use crate::types::SharedViewModel;

#[derive(Serialize, Debug)]
struct ErrorView {
    kind: &'static str,
    message: &'static str,
}

#[derive(Serialize, Debug)]
struct StateView {
    steps_today: u64,
    steps_by_hour: Vec<u32>,
    steps_by_day: Vec<DayView>,
    is_authorized: bool,
    fatal_error: Option<ErrorView>,
    error: Option<ErrorView>,
}

#[derive(Serialize, Debug)]
struct HourView {
    label: String,
    steps: u32,
}

#[derive(Serialize, Debug)]
struct TodayView {
    steps: u64,
    goal: u32,
    progress: f64,
    hours: Vec<HourView>,
}

#[derive(Serialize, Debug)]
struct DayView {
    id: i64,
    label: String,
    datetime: String,
    total_steps: u32,
}

#[derive(Serialize, Debug)]
struct HistoryView {
    range: &'static str,
    days: Vec<DayView>,
    error: Option<ErrorView>,
}

#[derive(Deserialize, Debug)]
struct HistoryQuery {
    #[serde(default)]
    range: DateRange,
}

fn error_view(error: &SyncError) -> ErrorView {
    let kind = match error {
        SyncError::HealthDataUnavailable => "health_data_unavailable",
        SyncError::StepSource(_) => "fetch_steps",
        SyncError::Auth(_) => "auth",
        SyncError::Fetch(_) => "fetch",
        SyncError::Upload(_) => "upload",
        SyncError::Unknown(_) => "unknown",
    };
    ErrorView { kind, message: error.user_message() }
}

fn day_view(day: &DailyStepsResult) -> DayView {
    DayView {
        id: day.id,
        label: day.month_and_day(),
        datetime: api_datetime::format(&day.datetime),
        total_steps: day.total_steps,
    }
}

fn state_view(state: &SyncState) -> StateView {
    StateView {
        steps_today: state.steps_today(),
        steps_by_hour: state.steps_by_hour.clone(),
        steps_by_day: state.steps_by_day.iter().map(day_view).collect(),
        is_authorized: state.is_authorized,
        fatal_error: state.fatal_error.as_ref().map(error_view),
        error: state.error.as_ref().map(error_view),
    }
}

/// A fatal error replaces the today and history displays.
fn fatal_response(state: &SyncState) -> Option<HttpResponse> {
    state.fatal_error.as_ref().map(|fatal| HttpResponse::ServiceUnavailable().json(error_view(fatal)))
}

#[get("/health")]
pub async fn health() -> impl Responder {
    info!("Health check");
    HttpResponse::Ok()
}

#[get("/state")]
async fn get_state(view_model: web::Data<SharedViewModel>) -> impl Responder {
    HttpResponse::Ok().json(state_view(&view_model.state().await))
}

#[get("/today")]
async fn get_today(view_model: web::Data<SharedViewModel>) -> impl Responder {
    let state = view_model.state().await;
    if let Some(response) = fatal_response(&state) {
        return response;
    }

    let hours = state.steps_by_hour.iter()
        .enumerate()
        .map(|(i, &steps)| HourView { label: hour_label(i), steps })
        .collect();
    HttpResponse::Ok().json(TodayView {
        steps: state.steps_today(),
        goal: DAILY_STEP_GOAL,
        progress: state.progress(),
        hours,
    })
}

#[get("/history")]
async fn get_history(query: web::Query<HistoryQuery>,
    view_model: web::Data<SharedViewModel>) -> impl Responder {

    // Each showing of the history reloads it; a failed load keeps the last series.
    view_model.refresh_history().await;
    let state = view_model.state().await;
    if let Some(response) = fatal_response(&state) {
        return response;
    }

    let days = query.range.select(&state.steps_by_day).iter().map(day_view).collect();
    HttpResponse::Ok().json(HistoryView {
        range: query.range.title(),
        days,
        error: state.error.as_ref().map(error_view),
    })
}

#[post("/refresh")]
async fn post_refresh(view_model: web::Data<SharedViewModel>) -> impl Responder {
    debug!("refresh:: hourly fetch requested");
    view_model.refresh_hourly().await;
    HttpResponse::Ok().json(state_view(&view_model.state().await))
}

#[post("/history/refresh")]
async fn post_refresh_history(view_model: web::Data<SharedViewModel>) -> impl Responder {
    debug!("refresh:: day fetch requested");
    view_model.refresh_history().await;
    HttpResponse::Ok().json(state_view(&view_model.state().await))
}

#[post("/error/dismiss")]
async fn post_dismiss_error(view_model: web::Data<SharedViewModel>) -> impl Responder {
    view_model.dismiss_error().await;
    HttpResponse::Ok()
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(get_state)
        .service(get_today)
        .service(get_history)
        .service(post_refresh)
        .service(post_refresh_history)
        .service(post_dismiss_error);
}
