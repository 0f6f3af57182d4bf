//! Postgres-backed member and post store.
//!
//! ## Error Mapping
//!
//! | SQLx error | Code | RepoError |
//! |---|---|---|
//! | Database (unique violation) | `23505` | `Duplicate` |
//! | anything else | | `Backend` |

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;

use board_auth::{CredentialStore, CredentialStoreError, StoredCredential};
use board_core::{MemberId, Page, PageRequest, PostId};
use board_members::{Member, NewMember};
use board_posts::{Author, NewPost, Post, PostEdit};

use super::r#trait::{MemberRepository, PostRepository, RepoError};

const POST_COLUMNS: &str = r#"
    SELECT
        p.id,
        p.title,
        p.content,
        p.created_at,
        p.modified_at,
        m.login_id,
        m.nickname
    FROM posts p
    LEFT JOIN members m ON m.id = p.member_id
"#;

/// Persistent store. Cheap to clone; shares one connection pool.
#[derive(Debug, Clone)]
pub struct PostgresBoardStore {
    pool: PgPool,
}

impl PostgresBoardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, RepoError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create the `members` and `posts` tables if missing.
    pub async fn migrate(&self) -> Result<(), RepoError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS members (
                id            BIGSERIAL PRIMARY KEY,
                login_id      VARCHAR(50) NOT NULL UNIQUE,
                password_hash TEXT NOT NULL,
                nickname      VARCHAR(50) NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("migrate_members", e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id          BIGSERIAL PRIMARY KEY,
                title       VARCHAR(200) NOT NULL,
                content     TEXT NOT NULL,
                member_id   BIGINT REFERENCES members(id) ON DELETE SET NULL,
                created_at  TIMESTAMPTZ NOT NULL,
                modified_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("migrate_posts", e))?;

        tracing::info!("board schema ready");
        Ok(())
    }
}

fn member_from_row(row: &PgRow) -> Result<Member, RepoError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_member", e);
    Ok(Member {
        id: MemberId::new(row.try_get("id").map_err(decode)?),
        login_id: row.try_get("login_id").map_err(decode)?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        nickname: row.try_get("nickname").map_err(decode)?,
    })
}

fn post_from_row(row: &PgRow) -> Result<Post, RepoError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_post", e);
    let login_id: Option<String> = row.try_get("login_id").map_err(decode)?;
    let nickname: Option<String> = row.try_get("nickname").map_err(decode)?;
    let author = match (login_id, nickname) {
        (Some(login_id), Some(nickname)) => Some(Author { login_id, nickname }),
        _ => None,
    };

    Ok(Post {
        id: PostId::new(row.try_get("id").map_err(decode)?),
        title: row.try_get("title").map_err(decode)?,
        content: row.try_get("content").map_err(decode)?,
        author,
        created_at: row.try_get("created_at").map_err(decode)?,
        modified_at: row.try_get("modified_at").map_err(decode)?,
    })
}

#[async_trait]
impl MemberRepository for PostgresBoardStore {
    #[instrument(skip(self, member), fields(login_id = member.login_id()), err)]
    async fn insert(&self, member: NewMember) -> Result<Member, RepoError> {
        let row = sqlx::query(
            r#"
            INSERT INTO members (login_id, password_hash, nickname)
            VALUES ($1, $2, $3)
            RETURNING id
            "#,
        )
        .bind(member.login_id())
        .bind(member.password_hash())
        .bind(member.nickname())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match map_sqlx_error("insert_member", e) {
            RepoError::Duplicate(_) => RepoError::Duplicate(member.login_id().to_string()),
            other => other,
        })?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| map_sqlx_error("insert_member", e))?;
        Ok(member.into_member(MemberId::new(id)))
    }

    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepoError> {
        let row = sqlx::query(
            "SELECT id, login_id, password_hash, nickname FROM members WHERE id = $1",
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_member", e))?;

        row.as_ref().map(member_from_row).transpose()
    }

    async fn find_by_login_id(&self, login_id: &str) -> Result<Option<Member>, RepoError> {
        let row = sqlx::query(
            "SELECT id, login_id, password_hash, nickname FROM members WHERE login_id = $1",
        )
        .bind(login_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_member_by_login_id", e))?;

        row.as_ref().map(member_from_row).transpose()
    }
}

#[async_trait]
impl PostRepository for PostgresBoardStore {
    #[instrument(skip(self, post), fields(author = post.author_login_id()), err)]
    async fn insert(&self, post: NewPost, now: DateTime<Utc>) -> Result<Post, RepoError> {
        let row = sqlx::query(
            r#"
            INSERT INTO posts (title, content, member_id, created_at, modified_at)
            SELECT $1, $2, m.id, $4, $4
            FROM members m
            WHERE m.login_id = $3
            RETURNING id
            "#,
        )
        .bind(post.title())
        .bind(post.content())
        .bind(post.author_login_id())
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_post", e))?
        .ok_or_else(|| RepoError::UnknownMember(post.author_login_id().to_string()))?;

        let id: i64 = row
            .try_get("id")
            .map_err(|e| map_sqlx_error("insert_post", e))?;
        PostRepository::find_by_id(self, PostId::new(id))
            .await?
            .ok_or(RepoError::NotFound)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let sql = format!("{POST_COLUMNS} WHERE p.id = $1");
        let row = sqlx::query(&sql)
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_post", e))?;

        row.as_ref().map(post_from_row).transpose()
    }

    async fn find_page(&self, request: PageRequest) -> Result<Page<Post>, RepoError> {
        let offset = i64::try_from(request.offset()).unwrap_or(i64::MAX);
        let sql = format!("{POST_COLUMNS} ORDER BY p.id DESC LIMIT $1 OFFSET $2");
        let rows = sqlx::query(&sql)
            .bind(i64::from(request.size()))
            .bind(offset)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_post_page", e))?;

        let total: i64 = sqlx::query("SELECT COUNT(*) AS total FROM posts")
            .fetch_one(&self.pool)
            .await
            .and_then(|row| row.try_get("total"))
            .map_err(|e| map_sqlx_error("count_posts", e))?;

        let items = rows.iter().map(post_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, request, u64::try_from(total).unwrap_or(0)))
    }

    #[instrument(skip(self, edit), fields(post_id = %id), err)]
    async fn update_post(
        &self,
        id: PostId,
        edit: &PostEdit,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let result = sqlx::query(
            "UPDATE posts SET title = $1, content = $2, modified_at = $3 WHERE id = $4",
        )
        .bind(edit.title())
        .bind(edit.content())
        .bind(now)
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_post", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        PostRepository::find_by_id(self, id)
            .await?
            .ok_or(RepoError::NotFound)
    }

    #[instrument(skip(self), fields(post_id = %id), err)]
    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        let result = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id.get())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_post", e))?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for PostgresBoardStore {
    async fn find_credential(
        &self,
        login_id: &str,
    ) -> Result<Option<StoredCredential>, CredentialStoreError> {
        let member = MemberRepository::find_by_login_id(self, login_id)
            .await
            .map_err(|e| CredentialStoreError(e.to_string()))?;
        Ok(member.map(|m| StoredCredential {
            login_id: m.login_id,
            password_hash: m.password_hash,
        }))
    }
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepoError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => RepoError::Duplicate(msg),
                _ => RepoError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            RepoError::Backend(format!("connection pool closed in {}", operation))
        }
        _ => RepoError::Backend(format!("sqlx error in {}: {}", operation, err)),
    }
}
