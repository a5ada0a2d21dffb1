use crate::api::AppState;
use crate::api::extract::AuthUser;
use crate::api::response::{ApiResponse, Pagination};
use crate::core::validation::{clean_string, parse_status};
use crate::core::{Ticket, TicketIntake};
use crate::error::{ClinicError, Result};
use crate::storage::TicketQuery;
use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use chrono::NaiveDate;
use serde::Deserialize;

/// Query string of `GET /api/tickets`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ListParams {
    pub status: Option<String>,
    /// `YYYY-MM-DD`, matched against the UTC creation day
    pub date: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListParams {
    fn into_query(self) -> Result<TicketQuery> {
        let status = clean_string(self.status.as_deref())
            .map(|s| parse_status(Some(&s)))
            .transpose()?;
        let date = clean_string(self.date.as_deref())
            .map(|d| {
                NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                    .map_err(|_| ClinicError::validation("Date must be in YYYY-MM-DD format"))
            })
            .transpose()?;
        Ok(TicketQuery {
            status,
            date,
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(0),
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatusRequest {
    pub status: Option<String>,
}

pub async fn create_ticket(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Json(intake): Json<TicketIntake>,
) -> Result<(StatusCode, ApiResponse<Ticket>)> {
    let ticket = state.context.tickets.create_ticket(&intake, &actor).await?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::data(ticket).with_message("Ticket created successfully"),
    ))
}

pub async fn list_tickets(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Query(params): Query<ListParams>,
) -> Result<ApiResponse<Vec<Ticket>>> {
    let page = state.context.tickets.list(params.into_query()?).await?;
    let pagination = Pagination::from(&page);
    Ok(ApiResponse::data(page.items).with_pagination(pagination))
}

pub async fn get_ticket(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Path(reference): Path<String>,
) -> Result<ApiResponse<Ticket>> {
    let ticket = state.context.tickets.find(&reference).await?;
    Ok(ApiResponse::data(ticket))
}

pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(actor): AuthUser,
    Path(reference): Path<String>,
    Json(request): Json<StatusRequest>,
) -> Result<ApiResponse<Ticket>> {
    let status = parse_status(request.status.as_deref())?;
    let ticket = state
        .context
        .tickets
        .update_status(&reference, status, &actor)
        .await?;
    Ok(ApiResponse::data(ticket).with_message("Ticket status updated"))
}

/// Plain-text receipt for printing
pub async fn receipt(
    State(state): State<AppState>,
    AuthUser(_actor): AuthUser,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse> {
    let ticket = state.context.tickets.find(&reference).await?;
    let body = state.context.receipts.render(&ticket)?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Status;

    #[test]
    fn test_list_params_defaults() {
        let query = ListParams::default().into_query().unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 0);
        assert!(query.status.is_none());
    }

    #[test]
    fn test_list_params_parsing() {
        let params = ListParams {
            status: Some("in-progress".to_string()),
            date: Some("2026-01-20".to_string()),
            page: Some(2),
            limit: Some(10),
        };
        let query = params.into_query().unwrap();
        assert_eq!(query.status, Some(Status::InProgress));
        assert_eq!(query.date, NaiveDate::from_ymd_opt(2026, 1, 20));

        let bad_date = ListParams {
            date: Some("20/01/2026".to_string()),
            ..ListParams::default()
        };
        assert!(bad_date.into_query().is_err());
    }
}
