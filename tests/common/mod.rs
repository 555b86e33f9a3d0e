//! Shared fixtures for the integration tests: an in-memory `Repository` and an `AppState`
//! builder wired to the mock services.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use soulbridge::{
    AppState,
    auth::AuthUser,
    config::AppConfig,
    email::{EmailState, MockEmailService},
    identity::{IdentityState, MockIdentityProvider},
    models::{
        AdminDashboardStats, Candle, CreateGuestbookEntryRequest, CreateMediaRequest,
        CreateMemorialRequest, CreateServiceItemRequest, CreateTributeRequest, GuestbookEntry,
        LightCandleRequest, Media, Memorial, MemorialAnalytics, NewTransaction,
        OrderOfServiceItem, PAYMENT_FAILED, PAYMENT_PENDING, PAYMENT_SUCCESS, Pagination,
        PaymentTransaction, Plan, PlanLimits, Profile, ROLE_ADMIN, ROLE_USER, STATUS_DRAFT,
        STATUS_PUBLISHED, Tribute, UpdateMemorialRequest, UpdateProfileRequest,
        UpdateServiceItemRequest,
    },
    payments::{MockPaymentGateway, PaymentState},
    repository::{RepoResult, Repository, RepositoryState},
    storage::{MockStorageService, StorageState},
};
use sqlx::error::{DatabaseError, ErrorKind};
use std::{
    borrow::Cow,
    error::Error as StdError,
    fmt,
    sync::{Arc, Mutex},
};
use uuid::Uuid;

pub const PREMIUM_PRICE: i64 = 500_000;

#[derive(Default)]
struct Store {
    profiles: Vec<Profile>,
    plans: Vec<Plan>,
    memorials: Vec<Memorial>,
    tributes: Vec<Tribute>,
    candles: Vec<Candle>,
    guestbook: Vec<GuestbookEntry>,
    media: Vec<Media>,
    views: Vec<(Uuid, i64)>,
    service_items: Vec<OrderOfServiceItem>,
    transactions: Vec<PaymentTransaction>,
    activations: Vec<(Uuid, String, String)>,
    fail_next_activation: bool,
    /// A slug another writer takes right after `slug_exists` reports it free.
    contested_slug: Option<String>,
}

/// What Postgres reports when an insert hits `memorials_slug_key`.
#[derive(Debug)]
struct SlugTaken;

impl fmt::Display for SlugTaken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl StdError for SlugTaken {}

impl DatabaseError for SlugTaken {
    fn message(&self) -> &str {
        "duplicate key value violates unique constraint \"memorials_slug_key\""
    }

    fn code(&self) -> Option<Cow<'_, str>> {
        Some(Cow::Borrowed("23505"))
    }

    fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self
    }

    fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
        self
    }

    fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
        self
    }

    fn constraint(&self) -> Option<&str> {
        Some("memorials_slug_key")
    }

    fn kind(&self) -> ErrorKind {
        ErrorKind::UniqueViolation
    }
}

/// InMemoryRepository
///
/// Vec-backed `Repository` with the same visible semantics as the Postgres implementation
/// (ordering, approval filter, conditional payment transitions). Seeded with the plan
/// catalogue from the migration.
pub struct InMemoryRepository {
    store: Mutex<Store>,
}

fn plan(code: &str, price: i64, max_memorials: Option<i32>, max_photos: Option<i32>, premium: bool) -> Plan {
    Plan {
        code: code.to_string(),
        name: code.to_string(),
        price_kobo: price,
        currency: "NGN".to_string(),
        interval_months: 12,
        max_memorials,
        max_photos_per_memorial: max_photos,
        allow_video: premium,
        allow_order_of_service: premium,
        is_active: true,
    }
}

fn page<T: Clone>(items: Vec<T>, page: Pagination) -> Vec<T> {
    items
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .collect()
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        let store = Store {
            plans: vec![
                plan("free", 0, Some(1), Some(10), false),
                plan("premium", PREMIUM_PRICE, Some(5), Some(100), true),
                plan("family", 1_500_000, None, None, true),
            ],
            ..Store::default()
        };
        Self {
            store: Mutex::new(store),
        }
    }
}

impl InMemoryRepository {
    fn lock(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().expect("store mutex poisoned")
    }

    pub fn add_profile(&self, role: &str) -> Profile {
        let id = Uuid::new_v4();
        let profile = Profile {
            id,
            email: format!("{}@example.com", id.simple()),
            full_name: Some("Test User".to_string()),
            role: role.to_string(),
            plan: "free".to_string(),
            plan_expires_at: None,
            created_at: Utc::now(),
        };
        self.lock().profiles.push(profile.clone());
        profile
    }

    pub fn set_plan(&self, profile_id: Uuid, plan_code: &str) {
        let mut store = self.lock();
        if let Some(p) = store.profiles.iter_mut().find(|p| p.id == profile_id) {
            p.plan = plan_code.to_string();
        }
    }

    pub fn add_memorial(&self, owner_id: Uuid, status: &str) -> Memorial {
        let id = Uuid::new_v4();
        let memorial = Memorial {
            id,
            owner_id,
            slug: format!("memorial-{}", &id.simple().to_string()[..8]),
            full_name: "Ada Obi".to_string(),
            obituary: "Loved by all.".to_string(),
            theme: "classic".to_string(),
            status: status.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Memorial::default()
        };
        self.lock().memorials.push(memorial.clone());
        memorial
    }

    pub fn add_transaction(&self, profile_id: Uuid, reference: &str, amount_kobo: i64) -> PaymentTransaction {
        let txn = PaymentTransaction {
            id: Uuid::new_v4(),
            profile_id,
            reference: reference.to_string(),
            plan_code: "premium".to_string(),
            amount_kobo,
            currency: "NGN".to_string(),
            status: PAYMENT_PENDING.to_string(),
            gateway_response: None,
            created_at: Utc::now(),
            paid_at: None,
        };
        self.lock().transactions.push(txn.clone());
        txn
    }

    pub fn transaction(&self, reference: &str) -> Option<PaymentTransaction> {
        self.lock()
            .transactions
            .iter()
            .find(|t| t.reference == reference)
            .cloned()
    }

    /// Every plan activation as (profile id, plan code, reference).
    pub fn activations(&self) -> Vec<(Uuid, String, String)> {
        self.lock().activations.clone()
    }

    /// Makes the next settlement fail during plan activation, as a dropped connection would.
    pub fn fail_next_activation(&self) {
        self.lock().fail_next_activation = true;
    }

    /// Lets another writer take `slug` between the availability check and the insert.
    pub fn contest_slug(&self, slug: &str) {
        self.lock().contested_slug = Some(slug.to_string());
    }

    pub fn memorials_with_slug_prefix(&self, prefix: &str) -> Vec<Memorial> {
        self.lock()
            .memorials
            .iter()
            .filter(|m| m.slug.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn memorial(&self, id: Uuid) -> Option<Memorial> {
        self.lock().memorials.iter().find(|m| m.id == id).cloned()
    }

    pub fn tribute_count(&self) -> usize {
        self.lock().tributes.len()
    }

    pub fn media_count(&self) -> usize {
        self.lock().media.len()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_profile(&self, id: Uuid) -> RepoResult<Option<Profile>> {
        Ok(self.lock().profiles.iter().find(|p| p.id == id).cloned())
    }

    async fn create_profile(&self, id: Uuid, email: &str, full_name: Option<&str>) -> RepoResult<Profile> {
        let profile = Profile {
            id,
            email: email.to_string(),
            full_name: full_name.map(str::to_string),
            role: ROLE_USER.to_string(),
            plan: "free".to_string(),
            plan_expires_at: None,
            created_at: Utc::now(),
        };
        self.lock().profiles.push(profile.clone());
        Ok(profile)
    }

    async fn update_profile(&self, id: Uuid, req: UpdateProfileRequest) -> RepoResult<Option<Profile>> {
        let mut store = self.lock();
        Ok(store.profiles.iter_mut().find(|p| p.id == id).map(|p| {
            if let Some(name) = req.full_name {
                p.full_name = Some(name);
            }
            p.clone()
        }))
    }

    async fn list_profiles(&self, p: Pagination) -> RepoResult<Vec<Profile>> {
        Ok(page(self.lock().profiles.clone(), p))
    }

    async fn set_profile_role(&self, id: Uuid, role: &str) -> RepoResult<Option<Profile>> {
        let mut store = self.lock();
        Ok(store.profiles.iter_mut().find(|p| p.id == id).map(|p| {
            p.role = role.to_string();
            p.clone()
        }))
    }

    async fn list_plans(&self) -> RepoResult<Vec<Plan>> {
        Ok(self.lock().plans.iter().filter(|p| p.is_active).cloned().collect())
    }

    async fn get_plan(&self, code: &str) -> RepoResult<Option<Plan>> {
        Ok(self.lock().plans.iter().find(|p| p.code == code).cloned())
    }

    async fn get_plan_limits(&self, profile_id: Uuid) -> RepoResult<PlanLimits> {
        let store = self.lock();
        let profile = store
            .profiles
            .iter()
            .find(|p| p.id == profile_id)
            .ok_or(sqlx::Error::RowNotFound)?;
        let plan = store
            .plans
            .iter()
            .find(|p| p.code == profile.plan)
            .ok_or(sqlx::Error::RowNotFound)?;
        let current = store.memorials.iter().filter(|m| m.owner_id == profile_id).count();
        Ok(PlanLimits {
            plan: plan.code.clone(),
            max_memorials: plan.max_memorials,
            current_memorials: current as i64,
            max_photos_per_memorial: plan.max_photos_per_memorial,
            allow_video: plan.allow_video,
            allow_order_of_service: plan.allow_order_of_service,
        })
    }

    async fn slug_exists(&self, slug: &str) -> RepoResult<bool> {
        let mut store = self.lock();
        let exists = store.memorials.iter().any(|m| m.slug == slug);
        if !exists && store.contested_slug.as_deref() == Some(slug) {
            store.contested_slug = None;
            store.memorials.push(Memorial {
                id: Uuid::new_v4(),
                owner_id: Uuid::new_v4(),
                slug: slug.to_string(),
                full_name: "Concurrent Writer".to_string(),
                date_of_birth: None,
                date_of_death: None,
                place_of_rest: None,
                obituary: String::new(),
                cover_image: None,
                theme: "classic".to_string(),
                status: STATUS_DRAFT.to_string(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            });
        }
        Ok(exists)
    }

    async fn create_memorial(&self, owner_id: Uuid, slug: &str, req: CreateMemorialRequest) -> RepoResult<Memorial> {
        let memorial = Memorial {
            id: Uuid::new_v4(),
            owner_id,
            slug: slug.to_string(),
            full_name: req.full_name.trim().to_string(),
            date_of_birth: req.date_of_birth,
            date_of_death: req.date_of_death,
            place_of_rest: req.place_of_rest,
            obituary: req.obituary,
            cover_image: req.cover_image_key,
            theme: req.theme.unwrap_or_else(|| "classic".to_string()),
            status: (if req.publish { STATUS_PUBLISHED } else { STATUS_DRAFT }).to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let mut store = self.lock();
        if store.memorials.iter().any(|m| m.slug == memorial.slug) {
            return Err(sqlx::Error::Database(Box::new(SlugTaken)));
        }
        store.memorials.push(memorial.clone());
        Ok(memorial)
    }

    async fn get_memorial(&self, id: Uuid) -> RepoResult<Option<Memorial>> {
        Ok(self.memorial(id))
    }

    async fn get_memorial_by_slug(&self, slug: &str) -> RepoResult<Option<Memorial>> {
        Ok(self.lock().memorials.iter().find(|m| m.slug == slug).cloned())
    }

    async fn list_published_memorials(&self, search: Option<String>, p: Pagination) -> RepoResult<Vec<Memorial>> {
        let needle = search.map(|s| s.trim().to_lowercase()).filter(|s| !s.is_empty());
        let mut items: Vec<Memorial> = self
            .lock()
            .memorials
            .iter()
            .filter(|m| m.status == STATUS_PUBLISHED)
            .filter(|m| match &needle {
                Some(n) => {
                    m.full_name.to_lowercase().contains(n)
                        || m.obituary.to_lowercase().contains(n)
                        || m.place_of_rest.as_deref().unwrap_or("").to_lowercase().contains(n)
                }
                None => true,
            })
            .cloned()
            .collect();
        items.reverse();
        Ok(page(items, p))
    }

    async fn list_memorials_by_owner(&self, owner_id: Uuid) -> RepoResult<Vec<Memorial>> {
        Ok(self.lock().memorials.iter().filter(|m| m.owner_id == owner_id).cloned().collect())
    }

    async fn list_all_memorials(&self, p: Pagination) -> RepoResult<Vec<Memorial>> {
        Ok(page(self.lock().memorials.clone(), p))
    }

    async fn update_memorial(&self, id: Uuid, req: UpdateMemorialRequest) -> RepoResult<Option<Memorial>> {
        let mut store = self.lock();
        Ok(store.memorials.iter_mut().find(|m| m.id == id).map(|m| {
            if let Some(v) = req.full_name {
                m.full_name = v;
            }
            if let Some(v) = req.obituary {
                m.obituary = v;
            }
            if let Some(v) = req.theme {
                m.theme = v;
            }
            if let Some(v) = req.status {
                m.status = v;
            }
            if req.place_of_rest.is_some() {
                m.place_of_rest = req.place_of_rest;
            }
            m.updated_at = Utc::now();
            m.clone()
        }))
    }

    async fn set_memorial_status(&self, id: Uuid, status: &str) -> RepoResult<Option<Memorial>> {
        let mut store = self.lock();
        Ok(store.memorials.iter_mut().find(|m| m.id == id).map(|m| {
            m.status = status.to_string();
            m.clone()
        }))
    }

    async fn delete_memorial(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.lock();
        let before = store.memorials.len();
        store.memorials.retain(|m| m.id != id);
        Ok(store.memorials.len() < before)
    }

    async fn create_tribute(&self, memorial_id: Uuid, author_id: Option<Uuid>, req: CreateTributeRequest) -> RepoResult<Tribute> {
        let tribute = Tribute {
            id: Uuid::new_v4(),
            memorial_id,
            author_id,
            author_name: req.author_name.trim().to_string(),
            relationship: req.relationship,
            message: req.message.trim().to_string(),
            is_approved: false,
            created_at: Utc::now(),
        };
        self.lock().tributes.push(tribute.clone());
        Ok(tribute)
    }

    async fn list_tributes(&self, memorial_id: Uuid, approved_only: bool, p: Pagination) -> RepoResult<Vec<Tribute>> {
        let items = self
            .lock()
            .tributes
            .iter()
            .filter(|t| t.memorial_id == memorial_id && (!approved_only || t.is_approved))
            .cloned()
            .collect();
        Ok(page(items, p))
    }

    async fn get_tribute(&self, id: Uuid) -> RepoResult<Option<Tribute>> {
        Ok(self.lock().tributes.iter().find(|t| t.id == id).cloned())
    }

    async fn set_tribute_approval(&self, id: Uuid, approved: bool) -> RepoResult<Option<Tribute>> {
        let mut store = self.lock();
        Ok(store.tributes.iter_mut().find(|t| t.id == id).map(|t| {
            t.is_approved = approved;
            t.clone()
        }))
    }

    async fn delete_tribute(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.lock();
        let before = store.tributes.len();
        store.tributes.retain(|t| t.id != id);
        Ok(store.tributes.len() < before)
    }

    async fn light_candle(&self, memorial_id: Uuid, req: LightCandleRequest) -> RepoResult<Candle> {
        let candle = Candle {
            id: Uuid::new_v4(),
            memorial_id,
            lit_by: req.lit_by.trim().to_string(),
            message: req.message,
            created_at: Utc::now(),
        };
        self.lock().candles.push(candle.clone());
        Ok(candle)
    }

    async fn list_candles(&self, memorial_id: Uuid, p: Pagination) -> RepoResult<Vec<Candle>> {
        let items = self.lock().candles.iter().filter(|c| c.memorial_id == memorial_id).cloned().collect();
        Ok(page(items, p))
    }

    async fn count_candles(&self, memorial_id: Uuid) -> RepoResult<i64> {
        Ok(self.lock().candles.iter().filter(|c| c.memorial_id == memorial_id).count() as i64)
    }

    async fn create_guestbook_entry(&self, memorial_id: Uuid, req: CreateGuestbookEntryRequest) -> RepoResult<GuestbookEntry> {
        let entry = GuestbookEntry {
            id: Uuid::new_v4(),
            memorial_id,
            name: req.name.trim().to_string(),
            location: req.location,
            message: req.message.trim().to_string(),
            created_at: Utc::now(),
        };
        self.lock().guestbook.push(entry.clone());
        Ok(entry)
    }

    async fn list_guestbook_entries(&self, memorial_id: Uuid, p: Pagination) -> RepoResult<Vec<GuestbookEntry>> {
        let items = self.lock().guestbook.iter().filter(|g| g.memorial_id == memorial_id).cloned().collect();
        Ok(page(items, p))
    }

    async fn get_guestbook_entry(&self, id: Uuid) -> RepoResult<Option<GuestbookEntry>> {
        Ok(self.lock().guestbook.iter().find(|g| g.id == id).cloned())
    }

    async fn delete_guestbook_entry(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.lock();
        let before = store.guestbook.len();
        store.guestbook.retain(|g| g.id != id);
        Ok(store.guestbook.len() < before)
    }

    async fn create_media(&self, memorial_id: Uuid, uploader_id: Uuid, req: CreateMediaRequest) -> RepoResult<Media> {
        let media = Media {
            id: Uuid::new_v4(),
            memorial_id,
            uploader_id,
            storage_key: req.storage_key,
            media_type: req.media_type,
            caption: req.caption,
            created_at: Utc::now(),
            url: None,
        };
        self.lock().media.push(media.clone());
        Ok(media)
    }

    async fn list_media(&self, memorial_id: Uuid) -> RepoResult<Vec<Media>> {
        Ok(self.lock().media.iter().filter(|m| m.memorial_id == memorial_id).cloned().collect())
    }

    async fn count_media(&self, memorial_id: Uuid) -> RepoResult<i64> {
        Ok(self.lock().media.iter().filter(|m| m.memorial_id == memorial_id).count() as i64)
    }

    async fn get_media(&self, id: Uuid) -> RepoResult<Option<Media>> {
        Ok(self.lock().media.iter().find(|m| m.id == id).cloned())
    }

    async fn delete_media(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.lock();
        let before = store.media.len();
        store.media.retain(|m| m.id != id);
        Ok(store.media.len() < before)
    }

    async fn record_view(&self, memorial_id: Uuid) -> RepoResult<i64> {
        let mut store = self.lock();
        if let Some(entry) = store.views.iter_mut().find(|(id, _)| *id == memorial_id) {
            entry.1 += 1;
            return Ok(entry.1);
        }
        store.views.push((memorial_id, 1));
        Ok(1)
    }

    async fn get_analytics(&self, memorial_id: Uuid) -> RepoResult<MemorialAnalytics> {
        let store = self.lock();
        let view_count = store
            .views
            .iter()
            .find(|(id, _)| *id == memorial_id)
            .map(|(_, count)| *count)
            .unwrap_or(0);
        Ok(MemorialAnalytics {
            memorial_id,
            view_count,
            last_viewed_at: None,
            tribute_count: store.tributes.iter().filter(|t| t.memorial_id == memorial_id).count() as i64,
            candle_count: store.candles.iter().filter(|c| c.memorial_id == memorial_id).count() as i64,
            guestbook_count: store.guestbook.iter().filter(|g| g.memorial_id == memorial_id).count() as i64,
            media_count: store.media.iter().filter(|m| m.memorial_id == memorial_id).count() as i64,
        })
    }

    async fn list_service_items(&self, memorial_id: Uuid) -> RepoResult<Vec<OrderOfServiceItem>> {
        let mut items: Vec<OrderOfServiceItem> = self
            .lock()
            .service_items
            .iter()
            .filter(|i| i.memorial_id == memorial_id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.position);
        Ok(items)
    }

    async fn create_service_item(&self, memorial_id: Uuid, position: i32, req: CreateServiceItemRequest) -> RepoResult<OrderOfServiceItem> {
        let item = OrderOfServiceItem {
            id: Uuid::new_v4(),
            memorial_id,
            position,
            title: req.title.trim().to_string(),
            description: req.description,
            performer: req.performer,
            scheduled_time: req.scheduled_time,
            created_at: Utc::now(),
        };
        self.lock().service_items.push(item.clone());
        Ok(item)
    }

    async fn get_service_item(&self, id: Uuid) -> RepoResult<Option<OrderOfServiceItem>> {
        Ok(self.lock().service_items.iter().find(|i| i.id == id).cloned())
    }

    async fn update_service_item(&self, id: Uuid, req: UpdateServiceItemRequest) -> RepoResult<Option<OrderOfServiceItem>> {
        let mut store = self.lock();
        Ok(store.service_items.iter_mut().find(|i| i.id == id).map(|i| {
            if let Some(v) = req.title {
                i.title = v;
            }
            if let Some(v) = req.position {
                i.position = v;
            }
            if req.description.is_some() {
                i.description = req.description;
            }
            i.clone()
        }))
    }

    async fn delete_service_item(&self, id: Uuid) -> RepoResult<bool> {
        let mut store = self.lock();
        let before = store.service_items.len();
        store.service_items.retain(|i| i.id != id);
        Ok(store.service_items.len() < before)
    }

    async fn create_transaction(&self, txn: NewTransaction) -> RepoResult<PaymentTransaction> {
        let row = PaymentTransaction {
            id: Uuid::new_v4(),
            profile_id: txn.profile_id,
            reference: txn.reference,
            plan_code: txn.plan_code,
            amount_kobo: txn.amount_kobo,
            currency: txn.currency,
            status: PAYMENT_PENDING.to_string(),
            gateway_response: None,
            created_at: Utc::now(),
            paid_at: None,
        };
        self.lock().transactions.push(row.clone());
        Ok(row)
    }

    async fn get_transaction_by_reference(&self, reference: &str) -> RepoResult<Option<PaymentTransaction>> {
        Ok(self.transaction(reference))
    }

    async fn settle_transaction(&self, reference: &str) -> RepoResult<Option<PaymentTransaction>> {
        let mut store = self.lock();
        let Some(index) = store
            .transactions
            .iter()
            .position(|t| t.reference == reference && t.status != PAYMENT_SUCCESS)
        else {
            return Ok(None);
        };
        // A failed activation rolls back the status change with it.
        if store.fail_next_activation {
            store.fail_next_activation = false;
            return Err(sqlx::Error::PoolTimedOut);
        }

        let txn = &mut store.transactions[index];
        txn.status = PAYMENT_SUCCESS.to_string();
        txn.paid_at = Some(Utc::now());
        let txn = txn.clone();

        store
            .activations
            .push((txn.profile_id, txn.plan_code.clone(), txn.reference.clone()));
        if let Some(p) = store.profiles.iter_mut().find(|p| p.id == txn.profile_id) {
            p.plan = txn.plan_code.clone();
        }
        Ok(Some(txn))
    }

    async fn mark_transaction_failed(&self, reference: &str, reason: &str) -> RepoResult<bool> {
        let mut store = self.lock();
        Ok(store
            .transactions
            .iter_mut()
            .find(|t| t.reference == reference && t.status != PAYMENT_SUCCESS)
            .map(|t| {
                t.status = PAYMENT_FAILED.to_string();
                t.gateway_response = Some(reason.to_string());
            })
            .is_some())
    }

    async fn list_transactions_for_profile(&self, profile_id: Uuid) -> RepoResult<Vec<PaymentTransaction>> {
        Ok(self.lock().transactions.iter().filter(|t| t.profile_id == profile_id).cloned().collect())
    }

    async fn list_all_transactions(&self, p: Pagination) -> RepoResult<Vec<PaymentTransaction>> {
        Ok(page(self.lock().transactions.clone(), p))
    }

    async fn get_stats(&self) -> RepoResult<AdminDashboardStats> {
        let store = self.lock();
        let paid: Vec<&PaymentTransaction> = store
            .transactions
            .iter()
            .filter(|t| t.status == PAYMENT_SUCCESS)
            .collect();
        Ok(AdminDashboardStats {
            total_users: store.profiles.len() as i64,
            total_memorials: store.memorials.len() as i64,
            published_memorials: store.memorials.iter().filter(|m| m.status == STATUS_PUBLISHED).count() as i64,
            total_tributes: store.tributes.len() as i64,
            total_candles: store.candles.len() as i64,
            successful_payments: paid.len() as i64,
            total_revenue_kobo: paid.iter().map(|t| t.amount_kobo).sum(),
        })
    }
}

/// TestContext
///
/// An `AppState` plus typed handles on the mocks behind it, so tests can both drive handlers
/// and inspect side effects.
pub struct TestContext {
    pub state: AppState,
    pub repo: Arc<InMemoryRepository>,
    pub email: Arc<MockEmailService>,
    pub payments: Arc<MockPaymentGateway>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::build(MockPaymentGateway::new(), MockStorageService::new(), MockIdentityProvider::new(Uuid::new_v4()))
    }

    pub fn with_payments(gateway: MockPaymentGateway) -> Self {
        Self::build(gateway, MockStorageService::new(), MockIdentityProvider::new(Uuid::new_v4()))
    }

    pub fn with_storage(storage: MockStorageService) -> Self {
        Self::build(MockPaymentGateway::new(), storage, MockIdentityProvider::new(Uuid::new_v4()))
    }

    pub fn with_identity(identity: MockIdentityProvider) -> Self {
        Self::build(MockPaymentGateway::new(), MockStorageService::new(), identity)
    }

    fn build(gateway: MockPaymentGateway, storage: MockStorageService, identity: MockIdentityProvider) -> Self {
        let repo = Arc::new(InMemoryRepository::default());
        let email = Arc::new(MockEmailService::new());
        let payments = Arc::new(gateway);

        let state = AppState {
            repo: repo.clone() as RepositoryState,
            storage: Arc::new(storage) as StorageState,
            payments: payments.clone() as PaymentState,
            email: email.clone() as EmailState,
            identity: Arc::new(identity) as IdentityState,
            config: AppConfig::default(),
        };
        Self {
            state,
            repo,
            email,
            payments,
        }
    }

    /// A new profile with the given role, returned as the extractor would resolve it.
    pub fn user(&self, role: &str) -> AuthUser {
        let profile = self.repo.add_profile(role);
        AuthUser {
            id: profile.id,
            email: profile.email,
            role: profile.role,
        }
    }

    pub fn admin(&self) -> AuthUser {
        self.user(ROLE_ADMIN)
    }

    pub fn member(&self) -> AuthUser {
        self.user(ROLE_USER)
    }
}
