//! HTTP handlers for the fleet API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::AppState;

use super::requests::CreateBlockRequest;
use super::responses::{BlockResponse, CarResponse};
use super::{queries, services};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cars", get(list_cars))
        .route("/cars/:id", get(get_car))
        .route("/cars/:id/blocks", get(list_blocks).post(create_block))
        .route("/blocks/:id", delete(remove_block))
}

async fn list_cars(State(state): State<AppState>) -> Result<Json<Vec<CarResponse>>> {
    let cars = queries::list_active_cars(&state.db).await?;
    Ok(Json(cars.into_iter().map(Into::into).collect()))
}

async fn get_car(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CarResponse>> {
    let car = queries::get_car(&state.db, id)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(car.into()))
}

async fn list_blocks(
    State(state): State<AppState>,
    user: AuthUser,
    Path(car_id): Path<Uuid>,
) -> Result<Json<Vec<BlockResponse>>> {
    user.require_staff()?;
    let blocks = queries::list_blocks_for_car(&state.db, car_id).await?;
    Ok(Json(blocks.into_iter().map(Into::into).collect()))
}

async fn create_block(
    State(state): State<AppState>,
    user: AuthUser,
    Path(car_id): Path<Uuid>,
    Json(req): Json<CreateBlockRequest>,
) -> Result<(StatusCode, Json<BlockResponse>)> {
    user.require_staff()?;
    let block = services::create_block(
        &state.db,
        car_id,
        req.start_date,
        req.end_date,
        &req.reason,
        user.id,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(block.into())))
}

async fn remove_block(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    user.require_staff()?;
    services::remove_block(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
