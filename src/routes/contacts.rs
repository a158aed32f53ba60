/// Contact Routes
///
/// CRUD over the `contacts` table. All routes sit behind `JwtMiddleware`.

use actix_web::{web, HttpResponse};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::error::{AppError, DatabaseError, ValidationError};
use crate::validators::{is_valid_email, is_valid_name, is_valid_notes, is_valid_phone};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MIN_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct Contact {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birth_date: NaiveDate,
    pub additional_data: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Create/replace request body
#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birth_date: NaiveDate,
    pub additional_data: Option<String>,
}

/// Validated, normalized contact fields
#[derive(Debug, PartialEq)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub birth_date: NaiveDate,
    pub additional_data: Option<String>,
}

impl TryFrom<ContactRequest> for NewContact {
    type Error = ValidationError;

    fn try_from(req: ContactRequest) -> Result<Self, Self::Error> {
        if req.birth_date > Utc::now().date_naive() {
            return Err(ValidationError::OutOfRange("birth_date"));
        }

        Ok(Self {
            first_name: is_valid_name("first_name", &req.first_name)?,
            last_name: is_valid_name("last_name", &req.last_name)?,
            email: is_valid_email(&req.email)?,
            phone_number: is_valid_phone(&req.phone_number)?,
            birth_date: req.birth_date,
            additional_data: req
                .additional_data
                .as_deref()
                .map(is_valid_notes)
                .transpose()?
                .filter(|notes| !notes.is_empty()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    pub skip: Option<i64>,
    pub limit: Option<i64>,
}

impl Pagination {
    /// (offset, limit) after bounds checks
    pub fn bounds(&self) -> Result<(i64, i64), ValidationError> {
        let skip = self.skip.unwrap_or(0);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);

        if skip < 0 {
            return Err(ValidationError::OutOfRange("skip"));
        }
        if !(MIN_PAGE_SIZE..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(ValidationError::OutOfRange("limit"));
        }
        Ok((skip, limit))
    }
}

fn contact_id(id: i32) -> Result<i32, ValidationError> {
    if id <= 0 {
        return Err(ValidationError::OutOfRange("contact id"));
    }
    Ok(id)
}

fn contact_not_found() -> AppError {
    AppError::Database(DatabaseError::NotFound("Contact not found".to_string()))
}

/// GET /contacts/all
pub async fn list_all_contacts(pool: web::Data<PgPool>) -> Result<HttpResponse, AppError> {
    let contacts = sqlx::query_as::<_, Contact>("SELECT * FROM contacts ORDER BY id")
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(contacts))
}

/// GET /contacts?skip=0&limit=10
pub async fn list_contacts(
    query: web::Query<Pagination>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let (skip, limit) = query.bounds()?;

    let contacts = sqlx::query_as::<_, Contact>(
        "SELECT * FROM contacts ORDER BY id LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(skip)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(contacts))
}

/// GET /contacts/{id}
pub async fn get_contact(
    path: web::Path<i32>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let id = contact_id(path.into_inner())?;

    let contact = sqlx::query_as::<_, Contact>("SELECT * FROM contacts WHERE id = $1")
        .bind(id)
        .fetch_optional(pool.get_ref())
        .await?
        .ok_or_else(contact_not_found)?;

    Ok(HttpResponse::Ok().json(contact))
}

/// POST /contacts
pub async fn create_contact(
    form: web::Json<ContactRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let new_contact = NewContact::try_from(form.into_inner())?;

    let contact = sqlx::query_as::<_, Contact>(
        r#"
        INSERT INTO contacts (first_name, last_name, email, phone_number, birth_date, additional_data)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(&new_contact.first_name)
    .bind(&new_contact.last_name)
    .bind(&new_contact.email)
    .bind(&new_contact.phone_number)
    .bind(new_contact.birth_date)
    .bind(&new_contact.additional_data)
    .fetch_one(pool.get_ref())
    .await?;

    tracing::info!(contact_id = contact.id, "Contact created");
    Ok(HttpResponse::Created().json(contact))
}

/// PUT /contacts/{id}
pub async fn update_contact(
    path: web::Path<i32>,
    form: web::Json<ContactRequest>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let id = contact_id(path.into_inner())?;
    let contact = NewContact::try_from(form.into_inner())?;

    let result = sqlx::query(
        r#"
        UPDATE contacts
        SET first_name = $1, last_name = $2, email = $3, phone_number = $4,
            birth_date = $5, additional_data = $6
        WHERE id = $7
        "#,
    )
    .bind(&contact.first_name)
    .bind(&contact.last_name)
    .bind(&contact.email)
    .bind(&contact.phone_number)
    .bind(contact.birth_date)
    .bind(&contact.additional_data)
    .bind(id)
    .execute(pool.get_ref())
    .await?;

    if result.rows_affected() == 0 {
        return Err(contact_not_found());
    }

    tracing::info!(contact_id = id, "Contact updated");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Contact updated successfully"
    })))
}

/// DELETE /contacts/{id}
pub async fn delete_contact(
    path: web::Path<i32>,
    pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let id = contact_id(path.into_inner())?;

    let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
        .bind(id)
        .execute(pool.get_ref())
        .await?;

    if result.rows_affected() == 0 {
        return Err(contact_not_found());
    }

    tracing::info!(contact_id = id, "Contact deleted");
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Contact deleted successfully"
    })))
}
