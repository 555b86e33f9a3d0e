use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiError;

// --- Fixed vocabularies ---

pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLES: [&str; 2] = [ROLE_USER, ROLE_ADMIN];

pub const PLAN_FREE: &str = "free";

pub const STATUS_DRAFT: &str = "draft";
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_SUSPENDED: &str = "suspended";
pub const MEMORIAL_STATUSES: [&str; 3] = [STATUS_DRAFT, STATUS_PUBLISHED, STATUS_SUSPENDED];

pub const THEMES: [&str; 4] = ["classic", "serene", "garden", "starlight"];
pub const DEFAULT_THEME: &str = "classic";

pub const MEDIA_IMAGE: &str = "image";
pub const MEDIA_VIDEO: &str = "video";

pub const PAYMENT_PENDING: &str = "pending";
pub const PAYMENT_SUCCESS: &str = "success";
pub const PAYMENT_FAILED: &str = "failed";

/// Highest position an order-of-service item may take.
pub const MAX_SERVICE_POSITION: i32 = 1000;

// --- Validation helpers ---

/// Trims `value` and rejects it when empty or longer than `max` characters.
fn required_text(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    optional_text(field, Some(trimmed), max)
}

fn optional_text(field: &str, value: Option<&str>, max: usize) -> Result<(), ApiError> {
    match value {
        Some(v) if v.chars().count() > max => Err(ApiError::validation(format!(
            "{field} must be at most {max} characters"
        ))),
        _ => Ok(()),
    }
}

fn check_dates(birth: Option<NaiveDate>, death: Option<NaiveDate>) -> Result<(), ApiError> {
    if let (Some(b), Some(d)) = (birth, death) {
        if d < b {
            return Err(ApiError::validation(
                "date_of_death cannot be before date_of_birth",
            ));
        }
    }
    Ok(())
}

fn check_theme(theme: Option<&str>) -> Result<(), ApiError> {
    match theme {
        Some(t) if !THEMES.contains(&t) => Err(ApiError::validation(format!(
            "theme must be one of: {}",
            THEMES.join(", ")
        ))),
        _ => Ok(()),
    }
}

// --- Pagination ---

/// Pagination
///
/// Shared `limit`/`offset` query parameters. Limits are clamped to 1..=100 (default 50) and
/// negative offsets are treated as 0.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct Pagination {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Pagination {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 100;

    pub fn new(limit: i64, offset: i64) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
        }
    }

    pub fn limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

// --- Profiles ---

/// Profile
///
/// A row of `public.profiles`. The id is the identity provider's user id.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Profile {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    // 'user' or 'admin'.
    pub role: String,
    // Code of the active plan, maintained by the `activate_plan` database function.
    pub plan: String,
    #[ts(type = "string | null")]
    pub plan_expires_at: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// RegisterUserRequest
///
/// Input for `POST /register`. The password only travels to the identity provider and is
/// never stored or logged here.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

impl RegisterUserRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let email = self.email.trim();
        let valid_email = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !valid_email {
            return Err(ApiError::validation("a valid email is required"));
        }
        if self.password.chars().count() < 8 {
            return Err(ApiError::validation(
                "password must be at least 8 characters",
            ));
        }
        optional_text("full_name", self.full_name.as_deref(), 200)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        optional_text("full_name", self.full_name.as_deref(), 200)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateRoleRequest {
    pub role: String,
}

// --- Plans ---

/// Plan
///
/// A subscription tier from `public.plans`. `None` limits are unlimited.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Plan {
    pub code: String,
    pub name: String,
    // Price in the gateway's minor unit (kobo).
    pub price_kobo: i64,
    pub currency: String,
    pub interval_months: i32,
    pub max_memorials: Option<i32>,
    pub max_photos_per_memorial: Option<i32>,
    pub allow_video: bool,
    pub allow_order_of_service: bool,
    pub is_active: bool,
}

/// PlanLimits
///
/// Result of the `get_plan_limits` database function: the caller's entitlements alongside
/// their current usage.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PlanLimits {
    pub plan: String,
    pub max_memorials: Option<i32>,
    pub current_memorials: i64,
    pub max_photos_per_memorial: Option<i32>,
    pub allow_video: bool,
    pub allow_order_of_service: bool,
}

// --- Memorials ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Memorial {
    pub id: Uuid,
    // FK to public.profiles.id.
    pub owner_id: Uuid,
    pub slug: String,
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub place_of_rest: Option<String>,
    pub obituary: String,
    // Storage key of the cover photo.
    pub cover_image: Option<String>,
    pub theme: String,
    // 'draft' | 'published' | 'suspended'. Only published memorials are publicly visible.
    pub status: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Memorial {
    pub fn is_published(&self) -> bool {
        self.status == STATUS_PUBLISHED
    }
}

/// CreateMemorialRequest
///
/// Input for `POST /memorials`. The slug is derived server-side from `full_name`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateMemorialRequest {
    pub full_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub place_of_rest: Option<String>,
    #[serde(default)]
    pub obituary: String,
    pub cover_image_key: Option<String>,
    pub theme: Option<String>,
    // Publish immediately instead of saving as a draft.
    #[serde(default)]
    pub publish: bool,
}

impl CreateMemorialRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        required_text("full_name", &self.full_name, 200)?;
        optional_text("place_of_rest", self.place_of_rest.as_deref(), 200)?;
        optional_text("obituary", Some(&self.obituary), 20_000)?;
        check_dates(self.date_of_birth, self.date_of_death)?;
        check_theme(self.theme.as_deref())
    }
}

/// UpdateMemorialRequest
///
/// Partial update for `PUT /memorials/{id}`; absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateMemorialRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_death: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_of_rest: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub obituary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_image_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl UpdateMemorialRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(name) = &self.full_name {
            required_text("full_name", name, 200)?;
        }
        optional_text("place_of_rest", self.place_of_rest.as_deref(), 200)?;
        optional_text("obituary", self.obituary.as_deref(), 20_000)?;
        check_dates(self.date_of_birth, self.date_of_death)?;
        check_theme(self.theme.as_deref())?;
        match self.status.as_deref() {
            Some(s) if s != STATUS_DRAFT && s != STATUS_PUBLISHED => Err(ApiError::validation(
                "status must be either 'draft' or 'published'",
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MemorialStatusUpdate {
    pub status: String,
}

/// MemorialFilter
///
/// Query parameters of the public listing (`GET /memorials`).
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MemorialFilter {
    /// Case-insensitive match against name, obituary and place of rest.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl MemorialFilter {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            limit: self.limit,
            offset: self.offset,
        }
    }
}

// --- Tributes ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Tribute {
    pub id: Uuid,
    pub memorial_id: Uuid,
    // Set when the visitor was signed in.
    pub author_id: Option<Uuid>,
    pub author_name: String,
    pub relationship: Option<String>,
    pub message: String,
    // Tributes stay hidden until the memorial owner approves them.
    pub is_approved: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateTributeRequest {
    pub author_name: String,
    pub relationship: Option<String>,
    pub message: String,
}

impl CreateTributeRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        required_text("author_name", &self.author_name, 100)?;
        optional_text("relationship", self.relationship.as_deref(), 100)?;
        required_text("message", &self.message, 2000)
    }
}

// --- Candles ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Candle {
    pub id: Uuid,
    pub memorial_id: Uuid,
    pub lit_by: String,
    pub message: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LightCandleRequest {
    pub lit_by: String,
    pub message: Option<String>,
}

impl LightCandleRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        required_text("lit_by", &self.lit_by, 100)?;
        optional_text("message", self.message.as_deref(), 280)
    }
}

// --- Guestbook ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct GuestbookEntry {
    pub id: Uuid,
    pub memorial_id: Uuid,
    pub name: String,
    pub location: Option<String>,
    pub message: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateGuestbookEntryRequest {
    pub name: String,
    pub location: Option<String>,
    pub message: String,
}

impl CreateGuestbookEntryRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        required_text("name", &self.name, 100)?;
        optional_text("location", self.location.as_deref(), 100)?;
        required_text("message", &self.message, 1000)
    }
}

// --- Gallery ---

/// Media
///
/// A gallery item. `url` is not stored; handlers fill it from the storage key.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Media {
    pub id: Uuid,
    pub memorial_id: Uuid,
    pub uploader_id: Uuid,
    pub storage_key: String,
    // 'image' | 'video'.
    pub media_type: String,
    pub caption: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub url: Option<String>,
}

/// UploadUrlRequest
///
/// Input for `POST /memorials/{id}/gallery/upload-url`.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct UploadUrlRequest {
    /// The original filename, used to derive the file extension.
    #[schema(example = "grandma_garden.jpg")]
    pub filename: String,
    /// The MIME type; the presigned URL only accepts uploads of this type.
    #[schema(example = "image/jpeg")]
    pub content_type: String,
}

/// UploadUrlResponse
///
/// A time-limited PUT URL and the object key to register once the upload finishes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub storage_key: String,
    pub media_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateMediaRequest {
    pub storage_key: String,
    pub media_type: String,
    pub caption: Option<String>,
}

impl CreateMediaRequest {
    pub fn validate(&self, memorial_id: Uuid) -> Result<(), ApiError> {
        let prefix = format!("memorials/{memorial_id}/");
        if !self.storage_key.starts_with(&prefix) || self.storage_key.contains("..") {
            return Err(ApiError::validation(
                "storage_key does not belong to this memorial",
            ));
        }
        if self.media_type != MEDIA_IMAGE && self.media_type != MEDIA_VIDEO {
            return Err(ApiError::validation(
                "media_type must be either 'image' or 'video'",
            ));
        }
        optional_text("caption", self.caption.as_deref(), 300)
    }
}

// --- Analytics ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct MemorialAnalytics {
    pub memorial_id: Uuid,
    pub view_count: i64,
    #[ts(type = "string | null")]
    pub last_viewed_at: Option<DateTime<Utc>>,
    pub tribute_count: i64,
    pub candle_count: i64,
    pub guestbook_count: i64,
    pub media_count: i64,
}

// --- Order of service ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct OrderOfServiceItem {
    pub id: Uuid,
    pub memorial_id: Uuid,
    pub position: i32,
    pub title: String,
    pub description: Option<String>,
    pub performer: Option<String>,
    // Free-form time label, e.g. "10:30 AM".
    pub scheduled_time: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

fn validate_position(position: Option<i32>) -> Result<(), ApiError> {
    match position {
        Some(p) if !(1..=MAX_SERVICE_POSITION).contains(&p) => Err(ApiError::validation(format!(
            "position must be between 1 and {MAX_SERVICE_POSITION}"
        ))),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateServiceItemRequest {
    pub title: String,
    pub description: Option<String>,
    pub performer: Option<String>,
    pub scheduled_time: Option<String>,
    pub position: Option<i32>,
}

impl CreateServiceItemRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        required_text("title", &self.title, 200)?;
        optional_text("description", self.description.as_deref(), 2000)?;
        optional_text("performer", self.performer.as_deref(), 200)?;
        optional_text("scheduled_time", self.scheduled_time.as_deref(), 50)?;
        validate_position(self.position)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateServiceItemRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<i32>,
}

impl UpdateServiceItemRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(title) = &self.title {
            required_text("title", title, 200)?;
        }
        optional_text("description", self.description.as_deref(), 2000)?;
        optional_text("performer", self.performer.as_deref(), 200)?;
        optional_text("scheduled_time", self.scheduled_time.as_deref(), 50)?;
        validate_position(self.position)
    }
}

// --- Memorial page ---

/// MemorialPage
///
/// Everything the public memorial page renders, fetched by slug.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MemorialPage {
    pub memorial: Memorial,
    pub tributes: Vec<Tribute>,
    pub candle_count: i64,
    pub recent_candles: Vec<Candle>,
    pub guestbook: Vec<GuestbookEntry>,
    pub gallery: Vec<Media>,
    pub order_of_service: Vec<OrderOfServiceItem>,
    pub view_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct QrCodeResponse {
    pub share_url: String,
    pub qr_image_url: String,
}

// --- Payments ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct PaymentTransaction {
    pub id: Uuid,
    pub profile_id: Uuid,
    // Unique reference shared with the gateway.
    pub reference: String,
    pub plan_code: String,
    pub amount_kobo: i64,
    pub currency: String,
    // 'pending' | 'success' | 'failed'.
    pub status: String,
    pub gateway_response: Option<String>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string | null")]
    pub paid_at: Option<DateTime<Utc>>,
}

/// NewTransaction
///
/// Internal insert shape for a pending transaction.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub profile_id: Uuid,
    pub reference: String,
    pub plan_code: String,
    pub amount_kobo: i64,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct InitializePaymentRequest {
    pub plan_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct InitializePaymentResponse {
    pub authorization_url: String,
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PaymentVerification {
    pub reference: String,
    pub status: String,
    pub plan_code: String,
}

// --- Admin ---

/// AdminDashboardStats
///
/// Output of `GET /admin/stats`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_users: i64,
    pub total_memorials: i64,
    pub published_memorials: i64,
    pub total_tributes: i64,
    pub total_candles: i64,
    pub successful_payments: i64,
    pub total_revenue_kobo: i64,
}
