/// Public browse page for approved donations.
///
/// Free-text search, category / photo / date-range filters, and a fixed
/// page size. Malformed filter input is ignored rather than rejected, and
/// an out-of-range page renders an empty result, not an error.
use crate::constants::BROWSE_PAGE_SIZE;
use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{
    categories,
    donations::{self, DonationStatus},
};
use actix_web::{error, get, web, Error, Responder};
use askama::Template;
use askama_actix::TemplateToResponse;
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, Condition};
use serde::Deserialize;
use std::collections::HashMap;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(view_browse);
}

/// Card-sized projection of an approved donation, shared by the browse
/// grid, the landing page, and related-item lists.
#[derive(Debug)]
pub struct DonationCard {
    pub id: i32,
    pub title: String,
    pub snippet: String,
    pub category_name: String,
    pub photo_filename: Option<String>,
    pub approved_on: String,
}

impl DonationCard {
    pub fn new(donation: donations::Model, category_name: String) -> Self {
        Self {
            id: donation.id,
            title: donation.title,
            snippet: snippet(&donation.description, 120),
            category_name,
            photo_filename: donation.photo_filename,
            approved_on: donation
                .approved_at
                .map(|ts| ts.format("%B %d, %Y").to_string())
                .unwrap_or_default(),
        }
    }
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_owned()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut.trim_end())
    }
}

/// Raw query string parameters. Everything is optional and lenient; bad
/// values fall back to defaults instead of failing the request.
#[derive(Debug, Default, Deserialize)]
pub struct BrowseParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub has_photo: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Newest,
    Oldest,
    TitleAsc,
    TitleDesc,
}

impl SortKey {
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("oldest") => Self::Oldest,
            Some("title_asc") => Self::TitleAsc,
            Some("title_desc") => Self::TitleDesc,
            _ => Self::Newest,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::TitleAsc => "title_asc",
            Self::TitleDesc => "title_desc",
        }
    }
}

/// Parsed, validated filter set.
#[derive(Debug, PartialEq)]
pub struct BrowseFilter {
    pub search: Option<String>,
    pub category_id: Option<i32>,
    pub has_photo: bool,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort: SortKey,
    pub page: u64,
}

impl BrowseFilter {
    pub fn from_params(params: &BrowseParams) -> Self {
        Self {
            search: params
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            category_id: params
                .category
                .as_deref()
                .and_then(|s| s.parse::<i32>().ok()),
            has_photo: matches!(params.has_photo.as_deref(), Some(v) if !v.is_empty()),
            date_from: parse_date(params.date_from.as_deref()),
            date_to: parse_date(params.date_to.as_deref()),
            sort: SortKey::parse(params.sort.as_deref()),
            page: params
                .page
                .as_deref()
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(0),
        }
    }

    /// Build the donation query this filter describes.
    pub fn to_query(&self) -> Select<donations::Entity> {
        let mut query =
            donations::Entity::find().filter(donations::Column::Status.eq(DonationStatus::Approved));

        if let Some(term) = &self.search {
            let pattern = format!("%{}%", term.to_lowercase());
            query = query.filter(
                Condition::any()
                    .add(Expr::cust_with_values(
                        "LOWER(title) LIKE ?",
                        vec![pattern.clone()],
                    ))
                    .add(Expr::cust_with_values(
                        "LOWER(description) LIKE ?",
                        vec![pattern],
                    )),
            );
        }

        if let Some(category_id) = self.category_id {
            query = query.filter(donations::Column::CategoryId.eq(category_id));
        }

        if self.has_photo {
            query = query.filter(donations::Column::PhotoFilename.is_not_null());
        }

        if let Some(from) = self.date_from {
            query = query.filter(donations::Column::ApprovedAt.gte(day_start(from)));
        }
        if let Some(to) = self.date_to {
            // Inclusive upper bound: anything before the next day's start.
            query = query.filter(donations::Column::ApprovedAt.lt(day_start(to) + Duration::days(1)));
        }

        match self.sort {
            SortKey::Newest => query.order_by_desc(donations::Column::ApprovedAt),
            SortKey::Oldest => query.order_by_asc(donations::Column::ApprovedAt),
            SortKey::TitleAsc => query.order_by_asc(donations::Column::Title),
            SortKey::TitleDesc => query.order_by_desc(donations::Column::Title),
        }
    }
}

/// Malformed dates are silently dropped rather than rejected.
fn parse_date(s: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s?.trim(), "%Y-%m-%d").ok()
}

fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Rebuild the query string for a pagination link, keeping active filters.
fn page_url(params: &BrowseParams, page: u64) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(v) = params.search.as_deref().filter(|v| !v.is_empty()) {
        parts.push(format!("search={}", urlencoding::encode(v)));
    }
    if let Some(v) = params.category.as_deref().filter(|v| !v.is_empty()) {
        parts.push(format!("category={}", urlencoding::encode(v)));
    }
    if let Some(v) = params.has_photo.as_deref().filter(|v| !v.is_empty()) {
        parts.push(format!("has_photo={}", urlencoding::encode(v)));
    }
    if let Some(v) = params.date_from.as_deref().filter(|v| !v.is_empty()) {
        parts.push(format!("date_from={}", urlencoding::encode(v)));
    }
    if let Some(v) = params.date_to.as_deref().filter(|v| !v.is_empty()) {
        parts.push(format!("date_to={}", urlencoding::encode(v)));
    }
    if let Some(v) = params.sort.as_deref().filter(|v| !v.is_empty()) {
        parts.push(format!("sort={}", urlencoding::encode(v)));
    }
    parts.push(format!("page={}", page));

    format!("/browse?{}", parts.join("&"))
}

/// Template for the browse page
#[derive(Template)]
#[template(path = "browse.html")]
struct BrowseTemplate {
    client: ClientCtx,
    donations: Vec<DonationCard>,
    categories: Vec<categories::Model>,
    total_count: u64,
    page: u64,
    num_pages: u64,
    prev_url: Option<String>,
    next_url: Option<String>,
    search: String,
    selected_category: i32,
    has_photo: bool,
    date_from: String,
    date_to: String,
    sort: &'static str,
}

/// GET /browse - filtered listing of approved donations
#[get("/browse")]
pub async fn view_browse(
    client: ClientCtx,
    params: web::Query<BrowseParams>,
) -> Result<impl Responder, Error> {
    let db = get_db_pool();
    let filter = BrowseFilter::from_params(&params);

    let paginator = filter
        .to_query()
        .paginate(db, BROWSE_PAGE_SIZE as usize);

    let total_count = paginator
        .num_items()
        .await
        .map_err(error::ErrorInternalServerError)? as u64;
    let num_pages = paginator
        .num_pages()
        .await
        .map_err(error::ErrorInternalServerError)? as u64;

    // Out-of-range pages come back empty, which renders as "no results".
    let page_rows = paginator
        .fetch_page(filter.page as usize)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let categories = categories::Entity::find()
        .order_by_asc(categories::Column::Name)
        .all(db)
        .await
        .map_err(error::ErrorInternalServerError)?;

    let category_names: HashMap<i32, String> = categories
        .iter()
        .map(|c| (c.id, c.name.clone()))
        .collect();

    let donations = page_rows
        .into_iter()
        .map(|d| {
            let category_name = category_names
                .get(&d.category_id)
                .cloned()
                .unwrap_or_default();
            DonationCard::new(d, category_name)
        })
        .collect();

    let prev_url = (filter.page > 0).then(|| page_url(&params, filter.page - 1));
    let next_url =
        (filter.page + 1 < num_pages).then(|| page_url(&params, filter.page + 1));

    Ok(BrowseTemplate {
        client,
        donations,
        categories,
        total_count,
        page: filter.page,
        num_pages,
        prev_url,
        next_url,
        search: filter.search.clone().unwrap_or_default(),
        selected_category: filter.category_id.unwrap_or(0),
        has_photo: filter.has_photo,
        date_from: params.date_from.clone().unwrap_or_default(),
        date_to: params.date_to.clone().unwrap_or_default(),
        sort: filter.sort.as_str(),
    }
    .to_response())
}
