use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use tower_sessions::Session;
use uuid::Uuid;

use crate::app::AppState;
use crate::auth::get_current_user;
use crate::constants::MAX_CATEGORY_NAME_LENGTH;
use crate::database::Db;
use crate::models::{Category, CategoryPayload};
use crate::utils::{
    ApiResult, conflict, db_error, db_error_with_context, get_user_database, not_found,
    validate_string_length,
};

pub fn validate_category_name(name: &str) -> ApiResult<()> {
    validate_string_length(name, "Category name", MAX_CATEGORY_NAME_LENGTH)
}

pub fn extract_category_from_row(row: libsql::Row) -> ApiResult<Category> {
    let id: String = row
        .get(0)
        .map_err(|_| db_error_with_context("invalid category data"))?;
    let name: String = row
        .get(1)
        .map_err(|_| db_error_with_context("invalid category data"))?;

    Ok(Category { id, name })
}

pub async fn list_categories(db: &Db) -> ApiResult<Vec<Category>> {
    let conn = db.read().await;
    let mut rows = conn
        .query("SELECT id, name FROM categories ORDER BY name", ())
        .await
        .map_err(|_| db_error_with_context("failed to query categories"))?;

    let mut categories = Vec::new();
    while let Some(row) = rows.next().await.map_err(|_| db_error())? {
        categories.push(extract_category_from_row(row)?);
    }
    Ok(categories)
}

pub async fn category_exists(db: &Db, category_id: &str) -> ApiResult<bool> {
    let conn = db.read().await;
    let mut rows = conn
        .query("SELECT id FROM categories WHERE id = ?", [category_id])
        .await
        .map_err(|_| db_error_with_context("failed to check category existence"))?;

    Ok(rows.next().await.map_err(|_| db_error())?.is_some())
}

async fn ensure_unique_name(
    conn: &libsql::Connection,
    name: &str,
    except_id: Option<&str>,
) -> ApiResult<()> {
    let mut existing_rows = conn
        .query(
            "SELECT id FROM categories WHERE LOWER(name) = LOWER(?) AND id != ?",
            (name, except_id.unwrap_or("")),
        )
        .await
        .map_err(|_| db_error_with_context("failed to check existing category"))?;

    if existing_rows
        .next()
        .await
        .map_err(|_| db_error())?
        .is_some()
    {
        return Err(conflict("Category name already exists (case-insensitive)"));
    }
    Ok(())
}

pub async fn insert_category(db: &Db, payload: &CategoryPayload) -> ApiResult<Category> {
    validate_category_name(&payload.name)?;
    let category_name = payload.name.trim().to_string();

    // Single write connection across the check and the insert
    let conn = db.write().await;
    ensure_unique_name(&conn, &category_name, None).await?;

    let category_id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO categories (id, name) VALUES (?, ?)",
        (category_id.as_str(), category_name.as_str()),
    )
    .await
    .map_err(|_| db_error_with_context("category creation failed"))?;

    Ok(Category {
        id: category_id,
        name: category_name,
    })
}

pub async fn update_category(
    db: &Db,
    category_id: &str,
    payload: &CategoryPayload,
) -> ApiResult<Category> {
    validate_category_name(&payload.name)?;
    let category_name = payload.name.trim().to_string();

    let conn = db.write().await;
    ensure_unique_name(&conn, &category_name, Some(category_id)).await?;

    let affected = conn
        .execute(
            "UPDATE categories SET name = ? WHERE id = ?",
            (category_name.as_str(), category_id),
        )
        .await
        .map_err(|_| db_error_with_context("category update failed"))?;

    if affected == 0 {
        return Err(not_found("Category"));
    }

    Ok(Category {
        id: category_id.to_string(),
        name: category_name,
    })
}

/// Deletes the category. Transactions that used it survive with no
/// category. Returns how many transactions were detached.
pub async fn delete_category(db: &Db, category_id: &str) -> ApiResult<u64> {
    let conn = db.write().await;
    let tx = conn
        .transaction()
        .await
        .map_err(|_| db_error_with_context("failed to begin category deletion"))?;

    let detached = tx
        .execute(
            "UPDATE transactions SET category_id = NULL WHERE category_id = ?",
            [category_id],
        )
        .await
        .map_err(|_| db_error_with_context("failed to detach category from transactions"))?;
    let removed = tx
        .execute("DELETE FROM categories WHERE id = ?", [category_id])
        .await
        .map_err(|_| db_error_with_context("category deletion failed"))?;

    if removed == 0 {
        tx.rollback().await.map_err(|_| db_error())?;
        return Err(not_found("Category"));
    }
    tx.commit().await.map_err(|_| db_error())?;

    Ok(detached)
}

pub async fn get_categories(
    State(state): State<AppState>,
    session: Session,
) -> ApiResult<(StatusCode, Json<Vec<Category>>)> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    Ok((StatusCode::OK, Json(list_categories(&user_db).await?)))
}

pub async fn create_category(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<CategoryPayload>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    let category = insert_category(&user_db, &payload).await?;
    tracing::info!(user_id = %user.id, category_id = %category.id, "category created");

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn edit_category(
    State(state): State<AppState>,
    session: Session,
    Path(category_id): Path<String>,
    Json(payload): Json<CategoryPayload>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    let category = update_category(&user_db, &category_id, &payload).await?;
    tracing::info!(user_id = %user.id, category_id = %category.id, "category renamed");

    Ok((StatusCode::OK, Json(category)))
}

pub async fn remove_category(
    State(state): State<AppState>,
    session: Session,
    Path(category_id): Path<String>,
) -> ApiResult<StatusCode> {
    let user = get_current_user(&session).await?;
    let user_db = get_user_database(&state.data_path, &user.id).await?;

    let detached = delete_category(&user_db, &category_id).await?;
    tracing::info!(user_id = %user.id, category_id = %category_id, detached, "category deleted");

    Ok(StatusCode::NO_CONTENT)
}
