use serde::Deserialize;
use serde_json::{json, Value};

use board_core::{Page, PageRequest};
use board_posts::Post;

// -------------------------
// Request DTOs
// -------------------------

/// Login form (`/login`, `/members/login`) and JSON body (`/auth/token`).
///
/// Missing fields deserialize as empty so they fail like any wrong credential.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub login_id: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl PageQuery {
    pub fn to_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(PageRequest::DEFAULT_SIZE),
        )
    }
}

// -------------------------
// Response mapping
// -------------------------

pub fn post_to_json(post: &Post) -> Value {
    json!({
        "id": post.id,
        "title": post.title,
        "content": post.content,
        "author": post.author_nickname(),
        "created_at": post.created_at,
        "modified_at": post.modified_at,
    })
}

pub fn post_page_to_json(page: Page<Post>) -> Value {
    let total_pages = page.total_pages();
    let page = page.map(|post| post_to_json(&post));
    json!({
        "items": page.items,
        "page": page.page,
        "size": page.size,
        "total_items": page.total_items,
        "total_pages": total_pages,
    })
}
