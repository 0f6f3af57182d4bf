use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use board_auth::{CredentialStore, CredentialStoreError, StoredCredential};
use board_core::{MemberId, Page, PageRequest, PostId};
use board_members::{Member, NewMember};
use board_posts::{Author, NewPost, Post, PostEdit};

use super::r#trait::{MemberRepository, PostRepository, RepoError};

/// Post row as stored: the author is a foreign key, joined on read.
#[derive(Debug, Clone)]
struct PostRow {
    title: String,
    content: String,
    author: Option<MemberId>,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    members: HashMap<MemberId, Member>,
    login_index: HashMap<String, MemberId>,
    posts: BTreeMap<PostId, PostRow>,
    next_member: i64,
    next_post: i64,
}

impl State {
    fn join(&self, id: PostId, row: &PostRow) -> Post {
        let author = row
            .author
            .and_then(|m| self.members.get(&m))
            .map(|m| Author {
                login_id: m.login_id.clone(),
                nickname: m.nickname.clone(),
            });
        Post {
            id,
            title: row.title.clone(),
            content: row.content.clone(),
            author,
            created_at: row.created_at,
            modified_at: row.modified_at,
        }
    }
}

/// In-memory member and post store.
///
/// Intended for tests/dev. Ids are assigned sequentially from 1.
#[derive(Debug, Default)]
pub struct InMemoryBoardStore {
    state: RwLock<State>,
}

fn poisoned() -> RepoError {
    RepoError::Backend("store lock poisoned".to_string())
}

impl InMemoryBoardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a member row. Their posts are kept and become orphans.
    pub fn remove_member(&self, login_id: &str) -> bool {
        let Ok(mut state) = self.state.write() else {
            return false;
        };
        match state.login_index.remove(login_id) {
            Some(id) => state.members.remove(&id).is_some(),
            None => false,
        }
    }
}

#[async_trait]
impl MemberRepository for InMemoryBoardStore {
    async fn insert(&self, member: NewMember) -> Result<Member, RepoError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state.login_index.contains_key(member.login_id()) {
            return Err(RepoError::Duplicate(member.login_id().to_string()));
        }

        state.next_member += 1;
        let id = MemberId::new(state.next_member);
        let member = member.into_member(id);
        state.login_index.insert(member.login_id.clone(), id);
        state.members.insert(id, member.clone());
        Ok(member)
    }

    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, RepoError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.members.get(&id).cloned())
    }

    async fn find_by_login_id(&self, login_id: &str) -> Result<Option<Member>, RepoError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state
            .login_index
            .get(login_id)
            .and_then(|id| state.members.get(id))
            .cloned())
    }
}

#[async_trait]
impl PostRepository for InMemoryBoardStore {
    async fn insert(&self, post: NewPost, now: DateTime<Utc>) -> Result<Post, RepoError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let author = *state
            .login_index
            .get(post.author_login_id())
            .ok_or_else(|| RepoError::UnknownMember(post.author_login_id().to_string()))?;

        state.next_post += 1;
        let id = PostId::new(state.next_post);
        let row = PostRow {
            title: post.title().to_string(),
            content: post.content().to_string(),
            author: Some(author),
            created_at: now,
            modified_at: now,
        };
        let joined = state.join(id, &row);
        state.posts.insert(id, row);
        Ok(joined)
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, RepoError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        Ok(state.posts.get(&id).map(|row| state.join(id, row)))
    }

    async fn find_page(&self, request: PageRequest) -> Result<Page<Post>, RepoError> {
        let state = self.state.read().map_err(|_| poisoned())?;
        let offset = usize::try_from(request.offset()).unwrap_or(usize::MAX);
        let items = state
            .posts
            .iter()
            .rev()
            .skip(offset)
            .take(request.size() as usize)
            .map(|(id, row)| state.join(*id, row))
            .collect();
        Ok(Page::new(items, request, state.posts.len() as u64))
    }

    async fn update_post(
        &self,
        id: PostId,
        edit: &PostEdit,
        now: DateTime<Utc>,
    ) -> Result<Post, RepoError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        let row = state.posts.get_mut(&id).ok_or(RepoError::NotFound)?;
        row.title = edit.title().to_string();
        row.content = edit.content().to_string();
        row.modified_at = now;
        let row = row.clone();
        Ok(state.join(id, &row))
    }

    async fn delete(&self, id: PostId) -> Result<(), RepoError> {
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.posts.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }
}

#[async_trait]
impl CredentialStore for InMemoryBoardStore {
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

#[cfg(test)]
mod tests {
    use super::*;
    use board_auth::Owned;
    use board_posts::PostForm;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn new_member(login_id: &str, nickname: &str) -> NewMember {
        NewMember::new(login_id.into(), "$argon2id$stub".into(), nickname.into()).unwrap()
    }

    fn new_post(title: &str, author: &str) -> NewPost {
        NewPost::new(
            PostForm {
                title: title.into(),
                content: "body".into(),
            },
            author,
        )
        .unwrap()
    }

    async fn seeded() -> InMemoryBoardStore {
        let store = InMemoryBoardStore::new();
        let members: &dyn MemberRepository = &store;
        members.insert(new_member("alice", "Ally")).await.unwrap();
        members.insert(new_member("bob", "Bobby")).await.unwrap();
        store
    }

    #[tokio::test]
    async fn duplicate_login_id_is_rejected() {
        let store = seeded().await;
        let members: &dyn MemberRepository = &store;
        let err = members.insert(new_member("alice", "Other")).await.unwrap_err();
        assert_eq!(err, RepoError::Duplicate("alice".into()));

        let alice = members.find_by_login_id("alice").await.unwrap().unwrap();
        assert_eq!(alice.nickname, "Ally");
        assert_eq!(members.find_by_id(alice.id).await.unwrap(), Some(alice));
    }

    #[tokio::test]
    async fn posts_are_joined_with_author() {
        let store = seeded().await;
        let posts: &dyn PostRepository = &store;
        let created = posts.insert(new_post("hi", "bob"), t0()).await.unwrap();

        let loaded = posts.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(loaded.owner_login_id(), Some("bob"));
        assert_eq!(loaded.author_nickname(), "Bobby");
    }

    #[tokio::test]
    async fn post_for_unknown_member_is_rejected() {
        let store = seeded().await;
        let posts: &dyn PostRepository = &store;
        let err = posts.insert(new_post("hi", "carol"), t0()).await.unwrap_err();
        assert_eq!(err, RepoError::UnknownMember("carol".into()));
    }

    #[tokio::test]
    async fn page_is_newest_first() {
        let store = seeded().await;
        let posts: &dyn PostRepository = &store;
        for i in 0..5 {
            posts.insert(new_post(&format!("p{i}"), "alice"), t0()).await.unwrap();
        }

        let first = posts.find_page(PageRequest::new(0, 2)).await.unwrap();
        let titles: Vec<_> = first.items.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["p4", "p3"]);
        assert_eq!(first.total_items, 5);
        assert_eq!(first.total_pages(), 3);

        let last = posts.find_page(PageRequest::new(2, 2)).await.unwrap();
        assert_eq!(last.items.len(), 1);
        assert_eq!(last.items[0].title, "p0");

        let beyond = posts.find_page(PageRequest::new(9, 2)).await.unwrap();
        assert!(beyond.items.is_empty());
    }

    #[tokio::test]
    async fn update_changes_content_not_author() {
        let store = seeded().await;
        let posts: &dyn PostRepository = &store;
        let created = posts.insert(new_post("old", "bob"), t0()).await.unwrap();

        let edit = PostEdit::new(PostForm {
            title: "new".into(),
            content: "changed".into(),
        })
        .unwrap();
        let later = t0() + chrono::Duration::minutes(1);
        let updated = posts.update_post(created.id, &edit, later).await.unwrap();

        assert_eq!(updated.title, "new");
        assert_eq!(updated.modified_at, later);
        assert_eq!(updated.created_at, t0());
        assert_eq!(updated.owner_login_id(), Some("bob"));
        assert_eq!(updated.content, "changed");
        assert_eq!(posts.find_by_id(created.id).await.unwrap(), Some(updated));

        let missing = posts.update_post(PostId::new(99), &edit, later).await;
        assert_eq!(missing.unwrap_err(), RepoError::NotFound);
    }

    #[tokio::test]
    async fn delete_removes_once() {
        let store = seeded().await;
        let posts: &dyn PostRepository = &store;
        let created = posts.insert(new_post("bye", "bob"), t0()).await.unwrap();

        posts.delete(created.id).await.unwrap();
        assert_eq!(posts.find_by_id(created.id).await.unwrap(), None);
        assert_eq!(posts.delete(created.id).await.unwrap_err(), RepoError::NotFound);
    }

    #[tokio::test]
    async fn removed_member_leaves_orphan_posts() {
        let store = seeded().await;
        let posts: &dyn PostRepository = &store;
        let created = posts.insert(new_post("left", "bob"), t0()).await.unwrap();

        assert!(store.remove_member("bob"));
        let orphan = posts.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(orphan.owner_login_id(), None);
        assert_eq!(orphan.author_nickname(), "unknown user");
    }

    #[tokio::test]
    async fn credential_lookup_uses_login_id() {
        let store = seeded().await;
        let cred = store.find_credential("alice").await.unwrap().unwrap();
        assert_eq!(cred.login_id, "alice");
        assert_eq!(cred.password_hash, "$argon2id$stub");
        assert_eq!(store.find_credential("nobody").await.unwrap(), None);
    }
}
