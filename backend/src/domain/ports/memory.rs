//! In-memory adapters for the driven ports.
//!
//! [`InMemorySocialStore`] keeps accounts, edges, posts and comments behind a
//! single mutex so every port call is atomic, mirroring the transactional
//! guarantees of the Diesel adapters. Tests can inject an outage or latency to
//! exercise error mapping and store deadlines.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::PageRequest;
use uuid::Uuid;

use crate::domain::credentials::PasswordHash;
use crate::domain::{
    Comment, CommentId, CommentRecord, EdgeKey, ImageUpload, Post, PostContent, PostId,
    PostRecord, Relation, ToggleOutcome, User, UserId, UserSummary, Username,
};

use super::{
    AccountChanges, CommentRepository, ContentStoreError, EdgeRepository, EdgeStoreError,
    FollowCounts, ImageStore, ImageStoreError, PostRepository, StoredAccount, StoredImage,
    UserPersistenceError, UserRepository,
};

const OUTAGE_MESSAGE: &str = "in-memory store is offline";

#[derive(Default)]
struct SocialState {
    accounts: Vec<StoredAccount>,
    follows: HashSet<(Uuid, Uuid)>,
    votes: HashSet<(Uuid, Uuid)>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
}

impl SocialState {
    fn user(&self, id: &Uuid) -> Option<&User> {
        self.accounts
            .iter()
            .map(|account| &account.user)
            .find(|user| user.id.as_uuid() == id)
    }

    fn summary(&self, id: &UserId) -> Option<UserSummary> {
        self.user(id.as_uuid()).map(UserSummary::from)
    }

    fn has_post(&self, id: &Uuid) -> bool {
        self.posts.iter().any(|post| post.id.as_uuid() == id)
    }

    fn usernames<'a>(&self, ids: impl Iterator<Item = &'a Uuid>) -> Vec<Username> {
        let mut names: Vec<Username> = ids
            .filter_map(|id| self.user(id))
            .map(|user| user.username.clone())
            .collect();
        names.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
        names
    }

    fn post_record(&self, post: &Post, viewer: Option<&UserId>) -> Option<PostRecord> {
        let author = self.summary(&post.author)?;
        let post_id = *post.id.as_uuid();
        let votes = self
            .votes
            .iter()
            .filter(|(_, voted)| *voted == post_id)
            .count();
        let voted = viewer.is_some_and(|id| self.votes.contains(&(*id.as_uuid(), post_id)));
        Some(PostRecord {
            post: post.clone(),
            author,
            votes: u64::try_from(votes).unwrap_or(u64::MAX),
            voted,
        })
    }

    /// Posts matching `keep`, newest first; later inserts win timestamp ties.
    fn newest_first(
        &self,
        keep: impl Fn(&Post) -> bool,
        viewer: Option<&UserId>,
        page: &PageRequest,
    ) -> Vec<PostRecord> {
        let mut matching: Vec<&Post> = self.posts.iter().rev().filter(|p| keep(p)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        window(matching.into_iter(), page)
            .into_iter()
            .filter_map(|post| self.post_record(post, viewer))
            .collect()
    }
}

fn window<T>(items: impl Iterator<Item = T>, page: &PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
    items.skip(offset).take(limit).collect()
}

/// Shared in-memory implementation of the user, edge, post and comment
/// repositories.
#[derive(Default)]
pub struct InMemorySocialStore {
    state: Mutex<SocialState>,
    offline: AtomicBool,
    latency: Mutex<Option<Duration>>,
}

impl InMemorySocialStore {
    fn lock(&self) -> MutexGuard<'_, SocialState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn reachable(&self) -> bool {
        let delay = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        !self.offline.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with a connection error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every subsequent call by `delay`.
    pub fn set_latency(&self, delay: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = delay;
    }

    /// Insert an account with an unusable credential and return its id.
    ///
    /// # Panics
    /// Panics when `username` is not a valid username.
    #[expect(clippy::expect_used, reason = "seeding helper for tests")]
    pub fn seed_user(&self, username: &str) -> UserId {
        let user = User {
            id: UserId::random(),
            username: Username::new(username).expect("seeded username is valid"),
            email: None,
            avatar: None,
            verified: false,
            created_at: Utc::now(),
        };
        let id = user.id.clone();
        self.lock().accounts.push(StoredAccount {
            user,
            password_hash: PasswordHash::from_stored("seeded"),
        });
        id
    }

    /// Insert a post by `author` and return its id.
    ///
    /// # Panics
    /// Panics when `content` is not valid post content.
    #[expect(clippy::expect_used, reason = "seeding helper for tests")]
    pub fn seed_post(&self, author: &UserId, content: &str) -> PostId {
        self.seed_post_at(author, content, Utc::now())
            .expect("seeded content is valid")
    }

    /// Insert a post with an explicit timestamp.
    pub fn seed_post_at(
        &self,
        author: &UserId,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Option<PostId> {
        let post = Post {
            id: PostId::random(),
            author: author.clone(),
            content: PostContent::new(content).ok()?,
            image_url: None,
            created_at,
        };
        let id = post.id;
        self.lock().posts.push(post);
        Some(id)
    }

    /// Number of follow and vote edges currently stored.
    pub fn edge_count(&self) -> usize {
        let state = self.lock();
        state.follows.len() + state.votes.len()
    }

    /// Number of comments currently stored.
    pub fn comment_count(&self) -> usize {
        self.lock().comments.len()
    }
}

#[async_trait]
impl UserRepository for InMemorySocialStore {
    async fn insert(&self, account: &StoredAccount) -> Result<(), UserPersistenceError> {
        if !self.reachable().await {
            return Err(UserPersistenceError::connection(OUTAGE_MESSAGE));
        }
        let mut state = self.lock();
        let taken = |field: &str| UserPersistenceError::duplicate(field);
        for existing in &state.accounts {
            if existing.user.username == account.user.username {
                return Err(taken("username"));
            }
            if account.user.email.is_some() && existing.user.email == account.user.email {
                return Err(taken("email"));
            }
        }
        state.accounts.push(account.clone());
        Ok(())
    }

    async fn update(
        &self,
        id: &UserId,
        changes: &AccountChanges,
    ) -> Result<Option<User>, UserPersistenceError> {
        if !self.reachable().await {
            return Err(UserPersistenceError::connection(OUTAGE_MESSAGE));
        }
        let mut state = self.lock();
        if let Some(email) = changes.email.as_ref() {
            let clash = state
                .accounts
                .iter()
                .any(|other| other.user.id != *id && other.user.email.as_ref() == Some(email));
            if clash {
                return Err(UserPersistenceError::duplicate("email"));
            }
        }
        let Some(account) = state
            .accounts
            .iter_mut()
            .find(|account| account.user.id == *id)
        else {
            return Ok(None);
        };
        if let Some(avatar) = changes.avatar.as_ref() {
            account.user.avatar = Some(avatar.clone());
        }
        if let Some(email) = changes.email.as_ref() {
            account.user.email = Some(email.clone());
        }
        if let Some(hash) = changes.password_hash.as_ref() {
            account.password_hash = hash.clone();
        }
        Ok(Some(account.user.clone()))
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        if !self.reachable().await {
            return Err(UserPersistenceError::connection(OUTAGE_MESSAGE));
        }
        let mut state = self.lock();
        let before = state.accounts.len();
        state.accounts.retain(|account| account.user.id != *id);
        if state.accounts.len() == before {
            return Ok(false);
        }
        let gone = *id.as_uuid();
        let authored: HashSet<Uuid> = state
            .posts
            .iter()
            .filter(|post| post.author == *id)
            .map(|post| *post.id.as_uuid())
            .collect();
        state.posts.retain(|post| post.author != *id);
        state
            .comments
            .retain(|c| c.author != *id && !authored.contains(c.post_id.as_uuid()));
        state
            .follows
            .retain(|(follower, followed)| *follower != gone && *followed != gone);
        state
            .votes
            .retain(|(voter, post)| *voter != gone && !authored.contains(post));
        Ok(true)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        if !self.reachable().await {
            return Err(UserPersistenceError::connection(OUTAGE_MESSAGE));
        }
        Ok(self.lock().user(id.as_uuid()).cloned())
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        Ok(self
            .find_account(username)
            .await?
            .map(|account| account.user))
    }

    async fn find_account(
        &self,
        username: &str,
    ) -> Result<Option<StoredAccount>, UserPersistenceError> {
        if !self.reachable().await {
            return Err(UserPersistenceError::connection(OUTAGE_MESSAGE));
        }
        Ok(self
            .lock()
            .accounts
            .iter()
            .find(|account| account.user.username.as_ref() == username)
            .cloned())
    }

    async fn search(
        &self,
        filter: &str,
        page: &PageRequest,
    ) -> Result<Vec<UserSummary>, UserPersistenceError> {
        if !self.reachable().await {
            return Err(UserPersistenceError::connection(OUTAGE_MESSAGE));
        }
        let needle = filter.to_lowercase();
        let state = self.lock();
        let mut matching: Vec<&User> = state
            .accounts
            .iter()
            .map(|account| &account.user)
            .filter(|user| user.username.as_ref().to_lowercase().contains(&needle))
            .collect();
        matching.sort_by(|a, b| a.username.as_ref().cmp(b.username.as_ref()));
        Ok(window(matching.into_iter().map(UserSummary::from), page))
    }

    async fn followers(&self, user: &UserId) -> Result<Vec<Username>, UserPersistenceError> {
        if !self.reachable().await {
            return Err(UserPersistenceError::connection(OUTAGE_MESSAGE));
        }
        let state = self.lock();
        let target = *user.as_uuid();
        Ok(state.usernames(
            state
                .follows
                .iter()
                .filter(|(_, followed)| *followed == target)
                .map(|(follower, _)| follower),
        ))
    }

    async fn following(&self, user: &UserId) -> Result<Vec<Username>, UserPersistenceError> {
        if !self.reachable().await {
            return Err(UserPersistenceError::connection(OUTAGE_MESSAGE));
        }
        let state = self.lock();
        let source = *user.as_uuid();
        Ok(state.usernames(
            state
                .follows
                .iter()
                .filter(|(follower, _)| *follower == source)
                .map(|(_, followed)| followed),
        ))
    }

    async fn follow_counts(&self, user: &UserId) -> Result<FollowCounts, UserPersistenceError> {
        if !self.reachable().await {
            return Err(UserPersistenceError::connection(OUTAGE_MESSAGE));
        }
        let state = self.lock();
        let id = *user.as_uuid();
        let followers = state.follows.iter().filter(|(_, to)| *to == id).count();
        let following = state.follows.iter().filter(|(from, _)| *from == id).count();
        Ok(FollowCounts {
            followers: u64::try_from(followers).unwrap_or(u64::MAX),
            following: u64::try_from(following).unwrap_or(u64::MAX),
        })
    }
}

#[async_trait]
impl EdgeRepository for InMemorySocialStore {
    async fn exists(&self, key: &EdgeKey) -> Result<bool, EdgeStoreError> {
        if !self.reachable().await {
            return Err(EdgeStoreError::connection(OUTAGE_MESSAGE));
        }
        let state = self.lock();
        let pair = (*key.actor().as_uuid(), *key.target());
        Ok(match key.relation() {
            Relation::Follow => state.follows.contains(&pair),
            Relation::Vote => state.votes.contains(&pair),
        })
    }

    async fn toggle(&self, key: &EdgeKey) -> Result<ToggleOutcome, EdgeStoreError> {
        if !self.reachable().await {
            return Err(EdgeStoreError::connection(OUTAGE_MESSAGE));
        }
        let mut state = self.lock();
        let pair = (*key.actor().as_uuid(), *key.target());
        let target_exists = match key.relation() {
            Relation::Follow => state.user(key.target()).is_some(),
            Relation::Vote => state.has_post(key.target()),
        };
        if state.user(&pair.0).is_none() || !target_exists {
            return Err(EdgeStoreError::missing_target());
        }
        let edges = match key.relation() {
            Relation::Follow => &mut state.follows,
            Relation::Vote => &mut state.votes,
        };
        if edges.remove(&pair) {
            Ok(ToggleOutcome::Removed)
        } else {
            edges.insert(pair);
            Ok(ToggleOutcome::Added)
        }
    }
}

#[async_trait]
impl PostRepository for InMemorySocialStore {
    async fn insert(&self, post: &Post) -> Result<(), ContentStoreError> {
        if !self.reachable().await {
            return Err(ContentStoreError::connection(OUTAGE_MESSAGE));
        }
        let mut state = self.lock();
        if state.user(post.author.as_uuid()).is_none() {
            return Err(ContentStoreError::missing_parent());
        }
        state.posts.push(post.clone());
        Ok(())
    }

    async fn find(&self, id: &PostId) -> Result<Option<Post>, ContentStoreError> {
        if !self.reachable().await {
            return Err(ContentStoreError::connection(OUTAGE_MESSAGE));
        }
        Ok(self.lock().posts.iter().find(|p| p.id == *id).cloned())
    }

    async fn find_record(
        &self,
        id: &PostId,
        viewer: Option<&UserId>,
    ) -> Result<Option<PostRecord>, ContentStoreError> {
        if !self.reachable().await {
            return Err(ContentStoreError::connection(OUTAGE_MESSAGE));
        }
        let state = self.lock();
        Ok(state
            .posts
            .iter()
            .find(|p| p.id == *id)
            .and_then(|post| state.post_record(post, viewer)))
    }

    async fn delete(&self, id: &PostId) -> Result<bool, ContentStoreError> {
        if !self.reachable().await {
            return Err(ContentStoreError::connection(OUTAGE_MESSAGE));
        }
        let mut state = self.lock();
        let before = state.posts.len();
        state.posts.retain(|p| p.id != *id);
        if state.posts.len() == before {
            return Ok(false);
        }
        let post = *id.as_uuid();
        state.votes.retain(|(_, voted)| *voted != post);
        state.comments.retain(|c| c.post_id != *id);
        Ok(true)
    }

    async fn by_author(
        &self,
        author: &UserId,
        viewer: Option<&UserId>,
        page: &PageRequest,
    ) -> Result<Vec<PostRecord>, ContentStoreError> {
        if !self.reachable().await {
            return Err(ContentStoreError::connection(OUTAGE_MESSAGE));
        }
        Ok(self
            .lock()
            .newest_first(|p| p.author == *author, viewer, page))
    }

    async fn feed(
        &self,
        viewer: &UserId,
        page: &PageRequest,
    ) -> Result<Vec<PostRecord>, ContentStoreError> {
        if !self.reachable().await {
            return Err(ContentStoreError::connection(OUTAGE_MESSAGE));
        }
        let state = self.lock();
        let me = *viewer.as_uuid();
        let followed: HashSet<Uuid> = state
            .follows
            .iter()
            .filter(|(follower, _)| *follower == me)
            .map(|(_, followed)| *followed)
            .collect();
        Ok(state.newest_first(
            |p| p.author == *viewer || followed.contains(p.author.as_uuid()),
            Some(viewer),
            page,
        ))
    }

    async fn voters(&self, id: &PostId) -> Result<Vec<Username>, ContentStoreError> {
        if !self.reachable().await {
            return Err(ContentStoreError::connection(OUTAGE_MESSAGE));
        }
        let state = self.lock();
        let post = *id.as_uuid();
        Ok(state.usernames(
            state
                .votes
                .iter()
                .filter(|(_, voted)| *voted == post)
                .map(|(voter, _)| voter),
        ))
    }
}

#[async_trait]
impl CommentRepository for InMemorySocialStore {
    async fn insert(&self, comment: &Comment) -> Result<(), ContentStoreError> {
        if !self.reachable().await {
            return Err(ContentStoreError::connection(OUTAGE_MESSAGE));
        }
        let mut state = self.lock();
        if !state.has_post(comment.post_id.as_uuid())
            || state.user(comment.author.as_uuid()).is_none()
        {
            return Err(ContentStoreError::missing_parent());
        }
        state.comments.push(comment.clone());
        Ok(())
    }

    async fn find_record(
        &self,
        id: &CommentId,
    ) -> Result<Option<CommentRecord>, ContentStoreError> {
        if !self.reachable().await {
            return Err(ContentStoreError::connection(OUTAGE_MESSAGE));
        }
        let state = self.lock();
        Ok(state
            .comments
            .iter()
            .find(|c| c.id == *id)
            .and_then(|comment| {
                Some(CommentRecord {
                    author: state.summary(&comment.author)?,
                    comment: comment.clone(),
                })
            }))
    }

    async fn delete(&self, id: &CommentId) -> Result<bool, ContentStoreError> {
        if !self.reachable().await {
            return Err(ContentStoreError::connection(OUTAGE_MESSAGE));
        }
        let mut state = self.lock();
        let before = state.comments.len();
        state.comments.retain(|c| c.id != *id);
        Ok(state.comments.len() != before)
    }

    async fn for_post(
        &self,
        post: &PostId,
        page: &PageRequest,
    ) -> Result<Vec<CommentRecord>, ContentStoreError> {
        if !self.reachable().await {
            return Err(ContentStoreError::connection(OUTAGE_MESSAGE));
        }
        let state = self.lock();
        let mut matching: Vec<&Comment> =
            state.comments.iter().filter(|c| c.post_id == *post).collect();
        matching.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(window(matching.into_iter(), page)
            .into_iter()
            .filter_map(|comment| {
                Some(CommentRecord {
                    author: state.summary(&comment.author)?,
                    comment: comment.clone(),
                })
            })
            .collect())
    }
}

/// Image store that keeps uploads in memory.
#[derive(Default)]
pub struct InMemoryImageStore {
    files: Mutex<Vec<(String, usize)>>,
    failing: AtomicBool,
}

impl InMemoryImageStore {
    /// Make subsequent saves fail.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Names of the files currently held.
    pub fn file_names(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl ImageStore for InMemoryImageStore {
    async fn save(&self, upload: &ImageUpload) -> Result<StoredImage, ImageStoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ImageStoreError::io("disk full"));
        }
        let file_name = format!("{}.{}", Uuid::new_v4().simple(), upload.kind().extension());
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((file_name.clone(), upload.bytes().len()));
        Ok(StoredImage {
            url: format!("memory://uploads/{file_name}"),
            file_name,
        })
    }

    async fn remove(&self, file_name: &str) -> Result<(), ImageStoreError> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .retain(|(name, _)| name != file_name);
        Ok(())
    }
}
