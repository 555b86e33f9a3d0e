use uuid::Uuid;

use crate::repository::{RepoResult, Repository};

const MAX_SLUG_LEN: usize = 60;
const FALLBACK_SLUG: &str = "memorial";
/// Highest numeric suffix tried before falling back to a random one.
const MAX_NUMBERED_SUFFIX: u32 = 20;
/// Postgres names the `UNIQUE` column constraint `<table>_<column>_key`.
const SLUG_CONSTRAINT: &str = "memorials_slug_key";

/// slugify
///
/// Lowercase ASCII alphanumerics joined by single dashes. Everything else acts as a
/// separator, so accents and punctuation collapse. Empty results become `memorial`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars() {
        if !c.is_ascii_alphanumeric() {
            pending_dash = true;
            continue;
        }
        let dash = pending_dash && !slug.is_empty();
        if slug.len() + 1 + usize::from(dash) > MAX_SLUG_LEN {
            break;
        }
        if dash {
            slug.push('-');
        }
        pending_dash = false;
        slug.push(c.to_ascii_lowercase());
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// unique_slug
///
/// Tries `base`, then `base-2` through `base-20`; when all are taken, appends eight hex
/// characters of a fresh UUID. The database's unique index still has the final word.
pub async fn unique_slug(repo: &dyn Repository, name: &str) -> RepoResult<String> {
    let base = slugify(name);
    if !repo.slug_exists(&base).await? {
        return Ok(base);
    }
    for n in 2..=MAX_NUMBERED_SUFFIX {
        let candidate = format!("{base}-{n}");
        if !repo.slug_exists(&candidate).await? {
            return Ok(candidate);
        }
    }
    Ok(random_slug(&base))
}

/// `base` followed by eight hex characters of a fresh UUID.
pub fn random_slug(base: &str) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{}-{}", base, &random[..8])
}

/// True when an insert lost the race for a slug that `unique_slug` reported free.
pub fn is_slug_conflict(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() && db_err.constraint() == Some(SLUG_CONSTRAINT)
        }
        _ => false,
    }
}
