// File: src/demo.rs
// Purpose: Server routes and preloads for the bundled demo site

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::sync::Arc;
use tokio::sync::RwLock;
use trellis::{
    Fetcher, HandlerOutcome, PreloadError, PreloadInput, PreloadResult, Registry, RequestContext,
    ServerHandlerSet,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    pub slug: String,
    pub title: String,
    pub body: String,
}

/// In-memory posts shared by the API handlers
#[derive(Clone, Default)]
pub struct PostStore {
    posts: Arc<RwLock<Vec<Post>>>,
}

impl PostStore {
    pub fn seeded() -> Self {
        let posts = vec![
            Post {
                slug: "hello-trellis".into(),
                title: "Hello, Trellis".into(),
                body: "Pages live in files; server routes live in code.".into(),
            },
            Post {
                slug: "routing-rules".into(),
                title: "Routing rules".into(),
                body: "Static beats constrained beats dynamic.".into(),
            },
        ];
        Self {
            posts: Arc::new(RwLock::new(posts)),
        }
    }

    pub async fn list(&self) -> Vec<Post> {
        self.posts.read().await.clone()
    }

    pub async fn get(&self, slug: &str) -> Option<Post> {
        self.posts.read().await.iter().find(|p| p.slug == slug).cloned()
    }

    /// Adds a post; false when the slug is taken
    pub async fn insert(&self, post: Post) -> bool {
        let mut posts = self.posts.write().await;
        if posts.iter().any(|p| p.slug == post.slug) {
            return false;
        }
        posts.push(post);
        true
    }

    pub async fn remove(&self, slug: &str) -> bool {
        let mut posts = self.posts.write().await;
        let before = posts.len();
        posts.retain(|p| p.slug != slug);
        posts.len() != before
    }
}

/// Registry backing the demo site under `site/routes`
pub fn registry() -> Registry {
    registry_with(PostStore::seeded())
}

pub fn registry_with(store: PostStore) -> Registry {
    let list = store.clone();
    let create = store.clone();
    let show = store.clone();
    let delete = store;

    Registry::new()
        .server_route(
            "api/posts.rs",
            ServerHandlerSet::new()
                .get(move |_ctx: RequestContext| {
                    let store = list.clone();
                    async move { Ok::<_, anyhow::Error>(HandlerOutcome::respond(Json(store.list().await))) }
                })
                .post(move |ctx: RequestContext| {
                    let store = create.clone();
                    async move {
                        let post: Post = ctx.json()?;
                        let outcome = if store.insert(post.clone()).await {
                            HandlerOutcome::respond((StatusCode::CREATED, Json(post)))
                        } else {
                            HandlerOutcome::respond((
                                StatusCode::CONFLICT,
                                Json(json!({ "error": format!("{} already exists", post.slug) })),
                            ))
                        };
                        Ok::<_, anyhow::Error>(outcome)
                    }
                }),
        )
        .server_route(
            "api/posts/[slug].rs",
            ServerHandlerSet::new()
                .get(move |ctx: RequestContext| {
                    let store = show.clone();
                    async move {
                        // Unknown slugs fall through to the 404 page
                        let outcome = match store.get(ctx.param("slug").unwrap_or_default()).await {
                            Some(post) => HandlerOutcome::respond(Json(post)),
                            None => HandlerOutcome::Next,
                        };
                        Ok::<_, anyhow::Error>(outcome)
                    }
                })
                .del(move |ctx: RequestContext| {
                    let store = delete.clone();
                    async move {
                        let status = if store.remove(ctx.param("slug").unwrap_or_default()).await {
                            StatusCode::NO_CONTENT
                        } else {
                            StatusCode::NOT_FOUND
                        };
                        Ok::<_, anyhow::Error>(HandlerOutcome::respond(status))
                    }
                }),
        )
        .preload("blog/index.html", blog_index)
        .preload("blog/[slug].html", blog_post)
}

async fn blog_index(_input: PreloadInput, fetch: Fetcher) -> PreloadResult {
    let posts: Vec<Post> = fetch.fetch("/api/posts").await?.error_for_status()?.json()?;
    let latest = posts.last().map(|p| p.title.clone()).unwrap_or_default();
    Ok(json!({ "count": posts.len(), "latest": latest }))
}

async fn blog_post(input: PreloadInput, fetch: Fetcher) -> PreloadResult {
    let slug = input
        .params
        .get("slug")
        .ok_or_else(|| PreloadError::not_found("missing post slug"))?;

    let url = format!("/api/posts/{}", urlencoding::encode(slug));
    let post: JsonValue = fetch.fetch(&url).await?.error_for_status()?.json()?;
    Ok(json!({ "post": post }))
}
