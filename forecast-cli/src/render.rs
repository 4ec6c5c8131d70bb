//! Plain-text rendering of the store snapshot.

use std::fmt::Write;

use forecast_core::{AppState, CurrentSnapshot, DailyPoint, HourlyPoint};

const HOURLY_ROWS: usize = 24;

pub fn render_state(state: &AppState) -> String {
    let mut out = String::new();

    if let Some(current) = state.current_weather.as_ref().and_then(|r| r.current.as_ref()) {
        out.push_str(&current_line(current));
        out.push('\n');
    }

    if let Some(hourly) = state.hourly_points.as_deref() {
        out.push_str("\nHourly\n");
        for point in hourly.iter().take(HOURLY_ROWS) {
            out.push_str(&hourly_row(point));
            out.push('\n');
        }
        if hourly.len() > HOURLY_ROWS {
            let _ = writeln!(out, "  ... {} more", hourly.len() - HOURLY_ROWS);
        }
    }

    if let Some(daily) = state.daily_points.as_deref() {
        out.push_str("\nDaily\n");
        for point in daily {
            out.push_str(&daily_row(point));
            out.push('\n');
        }
    }

    if state.is_loading {
        out.push_str("\nRefreshing...\n");
    }

    if let Some(err) = &state.error {
        let _ = writeln!(out, "\n{} ({err})", err.user_message());
    }

    if out.is_empty() {
        out.push_str("No forecast data yet.\n");
    }

    out
}

fn current_line(current: &CurrentSnapshot) -> String {
    let mut line = String::from("Now");
    if let Some(t) = current.temperature {
        let _ = write!(line, "  {t:.1} °C");
    }
    match current.is_daytime() {
        Some(true) => line.push_str("  day"),
        Some(false) => line.push_str("  night"),
        None => {}
    }
    if let Some(speed) = current.wind_speed {
        let _ = write!(line, "  wind {speed:.1} km/h");
        if let Some(dir) = current.wind_direction {
            let _ = write!(line, " from {dir}°");
        }
    }
    if let Some(clouds) = current.cloud_cover {
        let _ = write!(line, "  clouds {clouds}%");
    }
    line
}

fn hourly_row(point: &HourlyPoint) -> String {
    let time = point
        .time()
        .map(|t| t.format("%b %-d, %H:%M").to_string())
        .unwrap_or_else(|| point.time_iso.clone());
    format!("  {time:<16} {:>6.1} °C", point.temperature)
}

fn daily_row(point: &DailyPoint) -> String {
    let day = point
        .date()
        .map(|d| d.format("%a %b %-d, %Y").to_string())
        .unwrap_or_else(|| point.date_iso.clone());

    let mut row = format!("  {day:<18}");
    if let Some(max) = point.t_max {
        let _ = write!(row, " H: {max:.0}°");
    }
    if let Some(min) = point.t_min {
        let _ = write!(row, " L: {min:.0}°");
    }
    if let (Some(rise), Some(set)) = (point.sunrise(), point.sunset()) {
        let _ = write!(row, "  sun {}-{}", rise.format("%H:%M"), set.format("%H:%M"));
    }
    if let Some(gust) = point.wind_gust_max {
        let _ = write!(row, "  gusts {gust:.0} km/h");
    }
    if let Some(hours) = point.precip_hours {
        let _ = write!(row, "  rain {hours:.0} h");
    }
    if let Some(radiation) = point.radiation {
        let _ = write!(row, "  {radiation:.1} MJ/m²");
    }
    row
}
