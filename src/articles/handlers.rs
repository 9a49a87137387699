use axum::{extract::Query, routing::get, Json, Router};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{instrument, warn};

use crate::{
    articles::feed::{self, FeedItem},
    error::ApiError,
    state::AppState,
};

const MAX_ARTICLES: usize = 15;

pub fn article_routes() -> Router<AppState> {
    Router::new().route("/medium/articles", get(get_articles))
}

#[derive(Debug, Deserialize)]
struct ArticlesQuery {
    interests: Option<String>,
}

/// Aggregate the tag feeds for every requested interest and return the
/// newest articles across all of them. A topic whose feed fails is skipped,
/// not fatal.
#[instrument(skip(query))]
async fn get_articles(Query(query): Query<ArticlesQuery>) -> Result<Json<Value>, ApiError> {
    let Some(raw) = query.interests.filter(|s| !s.trim().is_empty()) else {
        return Err(ApiError::Validation("No interests provided".into()));
    };

    let client = reqwest::Client::new();
    let mut articles: Vec<FeedItem> = Vec::new();
    for topic in raw.split(',') {
        let topic = topic.trim();
        if topic.is_empty() {
            continue;
        }
        let slug = tag_slug(topic);
        let url = format!("https://medium.com/feed/tag/{slug}");
        match fetch_feed(&client, &url).await {
            Ok(items) => articles.extend(items),
            Err(e) => warn!(topic = %slug, error = %e, "feed fetch failed"),
        }
    }

    feed::sort_newest_first(&mut articles);
    articles.truncate(MAX_ARTICLES);
    Ok(Json(json!({ "items": articles })))
}

/// "AI & Machine Learning" -> "AI-&-Machine-Learning": spaces become
/// dashes, everything else is left to the feed host.
fn tag_slug(topic: &str) -> String {
    lazy_static! {
        static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
    }
    WHITESPACE_RE.replace_all(topic, "-").into_owned()
}

async fn fetch_feed(client: &reqwest::Client, url: &str) -> anyhow::Result<Vec<FeedItem>> {
    let body = client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    feed::parse_rss(&body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_replace_whitespace_runs_with_single_dashes() {
        assert_eq!(tag_slug("machine learning"), "machine-learning");
        assert_eq!(tag_slug("deep   learning"), "deep-learning");
        assert_eq!(tag_slug("rust"), "rust");
    }
}
