use actix_web::{web, HttpResponse};
use std::sync::Arc;

use crate::AppState;
use tyche::error::{validate_term, AppError};
use tyche::models::TermsResponse;

/// List all published terms, oldest first
pub async fn list_terms(state: web::Data<Arc<AppState>>) -> Result<HttpResponse, AppError> {
    let terms = state.scraper.list_terms().await?;

    Ok(HttpResponse::Ok().json(TermsResponse {
        count: terms.len(),
        terms,
    }))
}

/// Result of the most recent term
pub async fn latest_award(state: web::Data<Arc<AppState>>) -> Result<HttpResponse, AppError> {
    let award = state.scraper.fetch_latest_award().await?;
    Ok(HttpResponse::Ok().json(award))
}

/// Result of a single term
pub async fn get_award(
    state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let raw = path.into_inner();
    let term = raw
        .trim()
        .parse::<u32>()
        .map_err(|_| AppError::ValidationError(format!("Term must be numeric, got {:?}", raw)))?;
    validate_term(term)?;

    let award = state.scraper.fetch_award(term).await?;
    Ok(HttpResponse::Ok().json(award))
}
