use crate::state::AppState;
use actix_web::{error::ErrorBadRequest, web, HttpResponse};
use serde_json::json;

pub async fn get_config(state: web::Data<AppState>) -> Result<HttpResponse, actix_web::Error> {
    let config = state.get_config();

    Ok(HttpResponse::Ok().json(json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "config": config,
    })))
}

pub async fn update_config(
    state: web::Data<AppState>,
    body: web::Json<serde_json::Value>,
) -> Result<HttpResponse, actix_web::Error> {
    let json_str = serde_json::to_string(&body.into_inner()).map_err(ErrorBadRequest)?;

    let mut current_config = state.get_config();
    current_config.update_from_json(&json_str).map_err(ErrorBadRequest)?;

    state
        .update_config(current_config.clone())
        .map_err(ErrorBadRequest)?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "message": "Configuration updated successfully",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "updated_config": current_config,
    })))
}
