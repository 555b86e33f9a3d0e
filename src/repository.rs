use crate::models::{
    AdminDashboardStats, Candle, CreateGuestbookEntryRequest, CreateMediaRequest,
    CreateMemorialRequest, CreateServiceItemRequest, CreateTributeRequest, GuestbookEntry,
    LightCandleRequest, Media, Memorial, MemorialAnalytics, NewTransaction, OrderOfServiceItem,
    Pagination, PaymentTransaction, Plan, PlanLimits, Profile, Tribute, UpdateMemorialRequest,
    UpdateProfileRequest, UpdateServiceItemRequest, PAYMENT_FAILED, PAYMENT_SUCCESS,
    STATUS_DRAFT, STATUS_PUBLISHED, DEFAULT_THEME,
};
use async_trait::async_trait;
use sqlx::{PgPool, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

pub type RepoResult<T> = Result<T, sqlx::Error>;

/// Repository Trait
///
/// The persistence contract used by every handler. The hosted database owns integrity
/// (foreign keys, triggers) and entitlement logic (RPC functions); implementations here only
/// shape reads and writes.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across Axum tasks.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Profiles ---
    async fn get_profile(&self, id: Uuid) -> RepoResult<Option<Profile>>;
    async fn create_profile(&self, id: Uuid, email: &str, full_name: Option<&str>)
    -> RepoResult<Profile>;
    async fn update_profile(&self, id: Uuid, req: UpdateProfileRequest)
    -> RepoResult<Option<Profile>>;
    async fn list_profiles(&self, page: Pagination) -> RepoResult<Vec<Profile>>;
    async fn set_profile_role(&self, id: Uuid, role: &str) -> RepoResult<Option<Profile>>;

    // --- Plans (RPC-backed) ---
    async fn list_plans(&self) -> RepoResult<Vec<Plan>>;
    async fn get_plan(&self, code: &str) -> RepoResult<Option<Plan>>;
    /// Calls the `get_plan_limits` database function.
    async fn get_plan_limits(&self, profile_id: Uuid) -> RepoResult<PlanLimits>;

    // --- Memorials ---
    async fn slug_exists(&self, slug: &str) -> RepoResult<bool>;
    async fn create_memorial(
        &self,
        owner_id: Uuid,
        slug: &str,
        req: CreateMemorialRequest,
    ) -> RepoResult<Memorial>;
    async fn get_memorial(&self, id: Uuid) -> RepoResult<Option<Memorial>>;
    async fn get_memorial_by_slug(&self, slug: &str) -> RepoResult<Option<Memorial>>;
    /// Public listing. Must only return published memorials.
    async fn list_published_memorials(
        &self,
        search: Option<String>,
        page: Pagination,
    ) -> RepoResult<Vec<Memorial>>;
    async fn list_memorials_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<Memorial>>;
    async fn list_all_memorials(&self, page: Pagination) -> RepoResult<Vec<Memorial>>;
    async fn update_memorial(&self, id: Uuid, req: UpdateMemorialRequest)
    -> RepoResult<Option<Memorial>>;
    async fn set_memorial_status(&self, id: Uuid, status: &str) -> RepoResult<Option<Memorial>>;
    async fn delete_memorial(&self, id: Uuid) -> RepoResult<bool>;

    // --- Tributes ---
    async fn create_tribute(
        &self,
        memorial_id: Uuid,
        author_id: Option<Uuid>,
        req: CreateTributeRequest,
    ) -> RepoResult<Tribute>;
    async fn list_tributes(
        &self,
        memorial_id: Uuid,
        approved_only: bool,
        page: Pagination,
    ) -> RepoResult<Vec<Tribute>>;
    async fn get_tribute(&self, id: Uuid) -> RepoResult<Option<Tribute>>;
    async fn set_tribute_approval(&self, id: Uuid, approved: bool) -> RepoResult<Option<Tribute>>;
    async fn delete_tribute(&self, id: Uuid) -> RepoResult<bool>;

    // --- Candles ---
    async fn light_candle(&self, memorial_id: Uuid, req: LightCandleRequest) -> RepoResult<Candle>;
    async fn list_candles(&self, memorial_id: Uuid, page: Pagination) -> RepoResult<Vec<Candle>>;
    async fn count_candles(&self, memorial_id: Uuid) -> RepoResult<i64>;

    // --- Guestbook ---
    async fn create_guestbook_entry(
        &self,
        memorial_id: Uuid,
        req: CreateGuestbookEntryRequest,
    ) -> RepoResult<GuestbookEntry>;
    async fn list_guestbook_entries(
        &self,
        memorial_id: Uuid,
        page: Pagination,
    ) -> RepoResult<Vec<GuestbookEntry>>;
    async fn get_guestbook_entry(&self, id: Uuid) -> RepoResult<Option<GuestbookEntry>>;
    async fn delete_guestbook_entry(&self, id: Uuid) -> RepoResult<bool>;

    // --- Gallery ---
    async fn create_media(
        &self,
        memorial_id: Uuid,
        uploader_id: Uuid,
        req: CreateMediaRequest,
    ) -> RepoResult<Media>;
    async fn list_media(&self, memorial_id: Uuid) -> RepoResult<Vec<Media>>;
    async fn count_media(&self, memorial_id: Uuid) -> RepoResult<i64>;
    async fn get_media(&self, id: Uuid) -> RepoResult<Option<Media>>;
    async fn delete_media(&self, id: Uuid) -> RepoResult<bool>;

    // --- Analytics ---
    /// Calls the `increment_memorial_view` database function and returns the new count.
    async fn record_view(&self, memorial_id: Uuid) -> RepoResult<i64>;
    async fn get_analytics(&self, memorial_id: Uuid) -> RepoResult<MemorialAnalytics>;

    // --- Order of service ---
    async fn list_service_items(&self, memorial_id: Uuid) -> RepoResult<Vec<OrderOfServiceItem>>;
    async fn create_service_item(
        &self,
        memorial_id: Uuid,
        position: i32,
        req: CreateServiceItemRequest,
    ) -> RepoResult<OrderOfServiceItem>;
    async fn get_service_item(&self, id: Uuid) -> RepoResult<Option<OrderOfServiceItem>>;
    async fn update_service_item(
        &self,
        id: Uuid,
        req: UpdateServiceItemRequest,
    ) -> RepoResult<Option<OrderOfServiceItem>>;
    async fn delete_service_item(&self, id: Uuid) -> RepoResult<bool>;

    // --- Payments ---
    async fn create_transaction(&self, txn: NewTransaction) -> RepoResult<PaymentTransaction>;
    async fn get_transaction_by_reference(
        &self,
        reference: &str,
    ) -> RepoResult<Option<PaymentTransaction>>;
    /// Moves a transaction to `success` and activates its plan through the `activate_plan`
    /// database function, atomically. Returns the row when this call performed the
    /// transition, `None` when the transaction was already settled or does not exist. If
    /// activation fails nothing is committed, so a retry settles again.
    async fn settle_transaction(&self, reference: &str) -> RepoResult<Option<PaymentTransaction>>;
    /// Marks a non-successful transaction as failed. Returns true if a row changed.
    async fn mark_transaction_failed(&self, reference: &str, reason: &str) -> RepoResult<bool>;
    async fn list_transactions_for_profile(
        &self,
        profile_id: Uuid,
    ) -> RepoResult<Vec<PaymentTransaction>>;
    async fn list_all_transactions(&self, page: Pagination) -> RepoResult<Vec<PaymentTransaction>>;

    // --- Admin ---
    async fn get_stats(&self) -> RepoResult<AdminDashboardStats>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;

const PROFILE_COLUMNS: &str = "id, email, full_name, role, plan, plan_expires_at, created_at";
const MEMORIAL_COLUMNS: &str = "id, owner_id, slug, full_name, date_of_birth, date_of_death, \
     place_of_rest, obituary, cover_image, theme, status, created_at, updated_at";
const TRIBUTE_COLUMNS: &str =
    "id, memorial_id, author_id, author_name, relationship, message, is_approved, created_at";
const CANDLE_COLUMNS: &str = "id, memorial_id, lit_by, message, created_at";
const GUESTBOOK_COLUMNS: &str = "id, memorial_id, name, location, message, created_at";
const MEDIA_COLUMNS: &str =
    "id, memorial_id, uploader_id, storage_key, media_type, caption, created_at";
const SERVICE_ITEM_COLUMNS: &str = "id, memorial_id, position, title, description, performer, \
     scheduled_time, created_at";
const TRANSACTION_COLUMNS: &str = "id, profile_id, reference, plan_code, amount_kobo, currency, \
     status, gateway_response, created_at, paid_at";
const PLAN_COLUMNS: &str = "code, name, price_kobo, currency, interval_months, max_memorials, \
     max_photos_per_memorial, allow_video, allow_order_of_service, is_active";

/// PostgresRepository
///
/// The `Repository` implementation backed by the hosted Postgres instance.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count(&self, sql: &str, id: Option<Uuid>) -> RepoResult<i64> {
        let query = sqlx::query_scalar::<_, i64>(sql);
        let query = match id {
            Some(id) => query.bind(id),
            None => query,
        };
        query.fetch_one(&self.pool).await
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- PROFILES ---

    async fn get_profile(&self, id: Uuid) -> RepoResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    /// create_profile
    ///
    /// Creates the mirroring profile after the identity provider accepted the signup.
    /// Role and plan fall back to the table defaults ('user', 'free').
    async fn create_profile(
        &self,
        id: Uuid,
        email: &str,
        full_name: Option<&str>,
    ) -> RepoResult<Profile> {
        sqlx::query_as::<_, Profile>(&format!(
            "INSERT INTO profiles (id, email, full_name) VALUES ($1, $2, $3) \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(id)
        .bind(email)
        .bind(full_name)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_profile(
        &self,
        id: Uuid,
        req: UpdateProfileRequest,
    ) -> RepoResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "UPDATE profiles SET full_name = COALESCE($2, full_name) WHERE id = $1 \
             RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(id)
        .bind(req.full_name)
        .fetch_optional(&self.pool)
        .await
    }

    async fn list_profiles(&self, page: Pagination) -> RepoResult<Vec<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
    }

    async fn set_profile_role(&self, id: Uuid, role: &str) -> RepoResult<Option<Profile>> {
        sqlx::query_as::<_, Profile>(&format!(
            "UPDATE profiles SET role = $2 WHERE id = $1 RETURNING {PROFILE_COLUMNS}"
        ))
        .bind(id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await
    }

    // --- PLANS ---

    async fn list_plans(&self) -> RepoResult<Vec<Plan>> {
        sqlx::query_as::<_, Plan>(&format!(
            "SELECT {PLAN_COLUMNS} FROM plans WHERE is_active = true ORDER BY price_kobo ASC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    async fn get_plan(&self, code: &str) -> RepoResult<Option<Plan>> {
        sqlx::query_as::<_, Plan>(&format!("SELECT {PLAN_COLUMNS} FROM plans WHERE code = $1"))
            .bind(code)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_plan_limits(&self, profile_id: Uuid) -> RepoResult<PlanLimits> {
        sqlx::query_as::<_, PlanLimits>(
            "SELECT plan, max_memorials, current_memorials, max_photos_per_memorial, \
             allow_video, allow_order_of_service FROM get_plan_limits($1)",
        )
        .bind(profile_id)
        .fetch_one(&self.pool)
        .await
    }

    // --- MEMORIALS ---

    async fn slug_exists(&self, slug: &str) -> RepoResult<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM memorials WHERE slug = $1)")
            .bind(slug)
            .fetch_one(&self.pool)
            .await
    }

    async fn create_memorial(
        &self,
        owner_id: Uuid,
        slug: &str,
        req: CreateMemorialRequest,
    ) -> RepoResult<Memorial> {
        let status = if req.publish {
            STATUS_PUBLISHED
        } else {
            STATUS_DRAFT
        };
        sqlx::query_as::<_, Memorial>(&format!(
            "INSERT INTO memorials (id, owner_id, slug, full_name, date_of_birth, date_of_death, \
             place_of_rest, obituary, cover_image, theme, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, NOW(), NOW()) \
             RETURNING {MEMORIAL_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(slug)
        .bind(req.full_name.trim())
        .bind(req.date_of_birth)
        .bind(req.date_of_death)
        .bind(req.place_of_rest)
        .bind(req.obituary)
        .bind(req.cover_image_key)
        .bind(req.theme.as_deref().unwrap_or(DEFAULT_THEME))
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_memorial(&self, id: Uuid) -> RepoResult<Option<Memorial>> {
        sqlx::query_as::<_, Memorial>(&format!(
            "SELECT {MEMORIAL_COLUMNS} FROM memorials WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_memorial_by_slug(&self, slug: &str) -> RepoResult<Option<Memorial>> {
        sqlx::query_as::<_, Memorial>(&format!(
            "SELECT {MEMORIAL_COLUMNS} FROM memorials WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await
    }

    /// list_published_memorials
    ///
    /// Builds the search with QueryBuilder so every user-supplied value is bound, never
    /// interpolated. The `status = 'published'` filter is unconditional.
    async fn list_published_memorials(
        &self,
        search: Option<String>,
        page: Pagination,
    ) -> RepoResult<Vec<Memorial>> {
        let mut builder: QueryBuilder<sqlx::Postgres> = QueryBuilder::new(format!(
            "SELECT {MEMORIAL_COLUMNS} FROM memorials WHERE status = "
        ));
        builder.push_bind(STATUS_PUBLISHED);

        if let Some(s) = search.filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", s.trim());
            builder.push(" AND (full_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR obituary ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR place_of_rest ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }

        builder.push(" ORDER BY created_at DESC LIMIT ");
        builder.push_bind(page.limit());
        builder.push(" OFFSET ");
        builder.push_bind(page.offset());

        builder
            .build_query_as::<Memorial>()
            .fetch_all(&self.pool)
            .await
    }

    async fn list_memorials_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<Memorial>> {
        sqlx::query_as::<_, Memorial>(&format!(
            "SELECT {MEMORIAL_COLUMNS} FROM memorials WHERE owner_id = $1 ORDER BY created_at DESC"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_all_memorials(&self, page: Pagination) -> RepoResult<Vec<Memorial>> {
        sqlx::query_as::<_, Memorial>(&format!(
            "SELECT {MEMORIAL_COLUMNS} FROM memorials ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
    }

    /// update_memorial
    ///
    /// COALESCE keeps every column whose field is `None` in the request.
    async fn update_memorial(
        &self,
        id: Uuid,
        req: UpdateMemorialRequest,
    ) -> RepoResult<Option<Memorial>> {
        sqlx::query_as::<_, Memorial>(&format!(
            "UPDATE memorials \
             SET full_name = COALESCE($2, full_name), \
                 date_of_birth = COALESCE($3, date_of_birth), \
                 date_of_death = COALESCE($4, date_of_death), \
                 place_of_rest = COALESCE($5, place_of_rest), \
                 obituary = COALESCE($6, obituary), \
                 cover_image = COALESCE($7, cover_image), \
                 theme = COALESCE($8, theme), \
                 status = COALESCE($9, status), \
                 updated_at = NOW() \
             WHERE id = $1 RETURNING {MEMORIAL_COLUMNS}"
        ))
        .bind(id)
        .bind(req.full_name.map(|n| n.trim().to_string()))
        .bind(req.date_of_birth)
        .bind(req.date_of_death)
        .bind(req.place_of_rest)
        .bind(req.obituary)
        .bind(req.cover_image_key)
        .bind(req.theme)
        .bind(req.status)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_memorial_status(&self, id: Uuid, status: &str) -> RepoResult<Option<Memorial>> {
        sqlx::query_as::<_, Memorial>(&format!(
            "UPDATE memorials SET status = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {MEMORIAL_COLUMNS}"
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_memorial(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM memorials WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- TRIBUTES ---

    async fn create_tribute(
        &self,
        memorial_id: Uuid,
        author_id: Option<Uuid>,
        req: CreateTributeRequest,
    ) -> RepoResult<Tribute> {
        sqlx::query_as::<_, Tribute>(&format!(
            "INSERT INTO tributes (id, memorial_id, author_id, author_name, relationship, \
             message, is_approved, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, false, NOW()) RETURNING {TRIBUTE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(memorial_id)
        .bind(author_id)
        .bind(req.author_name.trim())
        .bind(req.relationship)
        .bind(req.message.trim())
        .fetch_one(&self.pool)
        .await
    }

    async fn list_tributes(
        &self,
        memorial_id: Uuid,
        approved_only: bool,
        page: Pagination,
    ) -> RepoResult<Vec<Tribute>> {
        // `$2 = false` disables the approval filter for owner views.
        sqlx::query_as::<_, Tribute>(&format!(
            "SELECT {TRIBUTE_COLUMNS} FROM tributes \
             WHERE memorial_id = $1 AND ($2 = false OR is_approved = true) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4"
        ))
        .bind(memorial_id)
        .bind(approved_only)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
    }

    async fn get_tribute(&self, id: Uuid) -> RepoResult<Option<Tribute>> {
        sqlx::query_as::<_, Tribute>(&format!(
            "SELECT {TRIBUTE_COLUMNS} FROM tributes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn set_tribute_approval(&self, id: Uuid, approved: bool) -> RepoResult<Option<Tribute>> {
        sqlx::query_as::<_, Tribute>(&format!(
            "UPDATE tributes SET is_approved = $2 WHERE id = $1 RETURNING {TRIBUTE_COLUMNS}"
        ))
        .bind(id)
        .bind(approved)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_tribute(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM tributes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- CANDLES ---

    async fn light_candle(&self, memorial_id: Uuid, req: LightCandleRequest) -> RepoResult<Candle> {
        sqlx::query_as::<_, Candle>(&format!(
            "INSERT INTO candles (id, memorial_id, lit_by, message, created_at) \
             VALUES ($1, $2, $3, $4, NOW()) RETURNING {CANDLE_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(memorial_id)
        .bind(req.lit_by.trim())
        .bind(req.message)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_candles(&self, memorial_id: Uuid, page: Pagination) -> RepoResult<Vec<Candle>> {
        sqlx::query_as::<_, Candle>(&format!(
            "SELECT {CANDLE_COLUMNS} FROM candles WHERE memorial_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(memorial_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
    }

    async fn count_candles(&self, memorial_id: Uuid) -> RepoResult<i64> {
        self.count(
            "SELECT COUNT(*) FROM candles WHERE memorial_id = $1",
            Some(memorial_id),
        )
        .await
    }

    // --- GUESTBOOK ---

    async fn create_guestbook_entry(
        &self,
        memorial_id: Uuid,
        req: CreateGuestbookEntryRequest,
    ) -> RepoResult<GuestbookEntry> {
        sqlx::query_as::<_, GuestbookEntry>(&format!(
            "INSERT INTO guestbook_entries (id, memorial_id, name, location, message, created_at) \
             VALUES ($1, $2, $3, $4, $5, NOW()) RETURNING {GUESTBOOK_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(memorial_id)
        .bind(req.name.trim())
        .bind(req.location)
        .bind(req.message.trim())
        .fetch_one(&self.pool)
        .await
    }

    async fn list_guestbook_entries(
        &self,
        memorial_id: Uuid,
        page: Pagination,
    ) -> RepoResult<Vec<GuestbookEntry>> {
        sqlx::query_as::<_, GuestbookEntry>(&format!(
            "SELECT {GUESTBOOK_COLUMNS} FROM guestbook_entries WHERE memorial_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        ))
        .bind(memorial_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
    }

    async fn get_guestbook_entry(&self, id: Uuid) -> RepoResult<Option<GuestbookEntry>> {
        sqlx::query_as::<_, GuestbookEntry>(&format!(
            "SELECT {GUESTBOOK_COLUMNS} FROM guestbook_entries WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_guestbook_entry(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM guestbook_entries WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- GALLERY ---

    async fn create_media(
        &self,
        memorial_id: Uuid,
        uploader_id: Uuid,
        req: CreateMediaRequest,
    ) -> RepoResult<Media> {
        sqlx::query_as::<_, Media>(&format!(
            "INSERT INTO media (id, memorial_id, uploader_id, storage_key, media_type, caption, \
             created_at) VALUES ($1, $2, $3, $4, $5, $6, NOW()) RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(memorial_id)
        .bind(uploader_id)
        .bind(req.storage_key)
        .bind(req.media_type)
        .bind(req.caption)
        .fetch_one(&self.pool)
        .await
    }

    async fn list_media(&self, memorial_id: Uuid) -> RepoResult<Vec<Media>> {
        sqlx::query_as::<_, Media>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media WHERE memorial_id = $1 ORDER BY created_at ASC"
        ))
        .bind(memorial_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn count_media(&self, memorial_id: Uuid) -> RepoResult<i64> {
        self.count(
            "SELECT COUNT(*) FROM media WHERE memorial_id = $1",
            Some(memorial_id),
        )
        .await
    }

    async fn get_media(&self, id: Uuid) -> RepoResult<Option<Media>> {
        sqlx::query_as::<_, Media>(&format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn delete_media(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM media WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- ANALYTICS ---

    async fn record_view(&self, memorial_id: Uuid) -> RepoResult<i64> {
        sqlx::query_scalar::<_, i64>("SELECT increment_memorial_view($1)")
            .bind(memorial_id)
            .fetch_one(&self.pool)
            .await
    }

    /// get_analytics
    ///
    /// One round trip: the counters row is optional (no views yet), the activity counts are
    /// correlated subqueries.
    async fn get_analytics(&self, memorial_id: Uuid) -> RepoResult<MemorialAnalytics> {
        sqlx::query_as::<_, MemorialAnalytics>(
            r#"
            SELECT
                m.id AS memorial_id,
                COALESCE(a.view_count, 0)::BIGINT AS view_count,
                a.last_viewed_at,
                (SELECT COUNT(*) FROM tributes t WHERE t.memorial_id = m.id) AS tribute_count,
                (SELECT COUNT(*) FROM candles c WHERE c.memorial_id = m.id) AS candle_count,
                (SELECT COUNT(*) FROM guestbook_entries g WHERE g.memorial_id = m.id) AS guestbook_count,
                (SELECT COUNT(*) FROM media md WHERE md.memorial_id = m.id) AS media_count
            FROM memorials m
            LEFT JOIN memorial_analytics a ON a.memorial_id = m.id
            WHERE m.id = $1
            "#,
        )
        .bind(memorial_id)
        .fetch_one(&self.pool)
        .await
    }

    // --- ORDER OF SERVICE ---

    async fn list_service_items(&self, memorial_id: Uuid) -> RepoResult<Vec<OrderOfServiceItem>> {
        sqlx::query_as::<_, OrderOfServiceItem>(&format!(
            "SELECT {SERVICE_ITEM_COLUMNS} FROM order_of_service_items WHERE memorial_id = $1 \
             ORDER BY position ASC, created_at ASC"
        ))
        .bind(memorial_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_service_item(
        &self,
        memorial_id: Uuid,
        position: i32,
        req: CreateServiceItemRequest,
    ) -> RepoResult<OrderOfServiceItem> {
        sqlx::query_as::<_, OrderOfServiceItem>(&format!(
            "INSERT INTO order_of_service_items (id, memorial_id, position, title, description, \
             performer, scheduled_time, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) RETURNING {SERVICE_ITEM_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(memorial_id)
        .bind(position)
        .bind(req.title.trim())
        .bind(req.description)
        .bind(req.performer)
        .bind(req.scheduled_time)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_service_item(&self, id: Uuid) -> RepoResult<Option<OrderOfServiceItem>> {
        sqlx::query_as::<_, OrderOfServiceItem>(&format!(
            "SELECT {SERVICE_ITEM_COLUMNS} FROM order_of_service_items WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn update_service_item(
        &self,
        id: Uuid,
        req: UpdateServiceItemRequest,
    ) -> RepoResult<Option<OrderOfServiceItem>> {
        sqlx::query_as::<_, OrderOfServiceItem>(&format!(
            "UPDATE order_of_service_items \
             SET title = COALESCE($2, title), \
                 description = COALESCE($3, description), \
                 performer = COALESCE($4, performer), \
                 scheduled_time = COALESCE($5, scheduled_time), \
                 position = COALESCE($6, position) \
             WHERE id = $1 RETURNING {SERVICE_ITEM_COLUMNS}"
        ))
        .bind(id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.performer)
        .bind(req.scheduled_time)
        .bind(req.position)
        .fetch_optional(&self.pool)
        .await
    }

    async fn delete_service_item(&self, id: Uuid) -> RepoResult<bool> {
        let res = sqlx::query("DELETE FROM order_of_service_items WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- PAYMENTS ---

    async fn create_transaction(&self, txn: NewTransaction) -> RepoResult<PaymentTransaction> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            "INSERT INTO payment_transactions (id, profile_id, reference, plan_code, amount_kobo, \
             currency, status, created_at) VALUES ($1, $2, $3, $4, $5, $6, 'pending', NOW()) \
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(txn.profile_id)
        .bind(txn.reference)
        .bind(txn.plan_code)
        .bind(txn.amount_kobo)
        .bind(txn.currency)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_transaction_by_reference(
        &self,
        reference: &str,
    ) -> RepoResult<Option<PaymentTransaction>> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions WHERE reference = $1"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
    }

    /// settle_transaction
    ///
    /// The `status <> 'success'` guard makes concurrent or repeated notifications race for a
    /// single row transition; only the winner gets the row back. `activate_plan` runs in the
    /// same database transaction, so a row is never `success` without its plan.
    async fn settle_transaction(&self, reference: &str) -> RepoResult<Option<PaymentTransaction>> {
        let mut tx = self.pool.begin().await?;

        let settled = sqlx::query_as::<_, PaymentTransaction>(&format!(
            "UPDATE payment_transactions SET status = $2, paid_at = NOW() \
             WHERE reference = $1 AND status <> $2 RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(reference)
        .bind(PAYMENT_SUCCESS)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(txn) = settled else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query("SELECT activate_plan($1, $2, $3)")
            .bind(txn.profile_id)
            .bind(&txn.plan_code)
            .bind(&txn.reference)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(txn))
    }

    async fn mark_transaction_failed(&self, reference: &str, reason: &str) -> RepoResult<bool> {
        let res = sqlx::query(
            "UPDATE payment_transactions SET status = $2, gateway_response = $3 \
             WHERE reference = $1 AND status <> $4",
        )
        .bind(reference)
        .bind(PAYMENT_FAILED)
        .bind(reason)
        .bind(PAYMENT_SUCCESS)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn list_transactions_for_profile(
        &self,
        profile_id: Uuid,
    ) -> RepoResult<Vec<PaymentTransaction>> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions WHERE profile_id = $1 \
             ORDER BY created_at DESC"
        ))
        .bind(profile_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn list_all_transactions(&self, page: Pagination) -> RepoResult<Vec<PaymentTransaction>> {
        sqlx::query_as::<_, PaymentTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM payment_transactions \
             ORDER BY created_at DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
    }

    // --- ADMIN ---

    async fn get_stats(&self) -> RepoResult<AdminDashboardStats> {
        Ok(AdminDashboardStats {
            total_users: self.count("SELECT COUNT(*) FROM profiles", None).await?,
            total_memorials: self.count("SELECT COUNT(*) FROM memorials", None).await?,
            published_memorials: self
                .count(
                    "SELECT COUNT(*) FROM memorials WHERE status = 'published'",
                    None,
                )
                .await?,
            total_tributes: self.count("SELECT COUNT(*) FROM tributes", None).await?,
            total_candles: self.count("SELECT COUNT(*) FROM candles", None).await?,
            successful_payments: self
                .count(
                    "SELECT COUNT(*) FROM payment_transactions WHERE status = 'success'",
                    None,
                )
                .await?,
            total_revenue_kobo: self
                .count(
                    "SELECT COALESCE(SUM(amount_kobo), 0)::BIGINT FROM payment_transactions \
                     WHERE status = 'success'",
                    None,
                )
                .await?,
        })
    }
}
