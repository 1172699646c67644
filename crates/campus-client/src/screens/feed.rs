//! Social feed: paginated posts with lazily loaded, per-post comments.
//!
//! A post's `comment_count` moves in the same critical section as the
//! comment list it counts, and rolls back with it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, info};

use campus_shared::models::{Comment, CommentDraft, Post, PostDraft, PostEdit};
use campus_shared::sentiment;
use campus_shared::types::{EntityId, SentimentLabel};
use campus_shared::validation;

use crate::api::{ApiClient, ApiError, FilePart, PostMedia, PostQuery};
use crate::engine::{Mutation, MutationState, OptimisticList, Patch, Settled};
use crate::error::{ClientError, Result};
use crate::query::{QueryTracker, Ticket};
use crate::session::SessionHandle;
use crate::state::AppState;

use super::lock;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilters {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sentiment: Option<SentimentLabel>,
}

#[derive(Debug, Clone, Default)]
pub struct FeedState {
    pub posts: OptimisticList<Post>,
    /// Loaded on demand, keyed by post.
    pub comments: HashMap<EntityId, OptimisticList<Comment>>,
    pub filters: FeedFilters,
    pub has_more: bool,
    pub loading: bool,
    pub loading_more: bool,
    pub error: Option<String>,
    pub last_mutation: MutationState,
}

impl FeedState {
    pub fn comments_for(&self, post_id: &EntityId) -> &[Comment] {
        self.comments
            .get(post_id)
            .map(OptimisticList::items)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct FeedScreen {
    api: ApiClient,
    session: SessionHandle,
    state: Arc<Mutex<FeedState>>,
    query: QueryTracker,
    comment_queries: Arc<Mutex<HashMap<EntityId, QueryTracker>>>,
    page_size: u32,
    search_debounce: Duration,
}

impl FeedScreen {
    pub fn new(app: &AppState) -> Self {
        Self {
            api: app.api.clone(),
            session: app.session.clone(),
            state: Arc::new(Mutex::new(FeedState::default())),
            query: QueryTracker::new(),
            comment_queries: Arc::new(Mutex::new(HashMap::new())),
            page_size: app.config.page_size,
            search_debounce: app.config.search_debounce,
        }
    }

    pub fn state(&self) -> Result<FeedState> {
        Ok(self.lock()?.clone())
    }

    pub fn comments(&self, post_id: &EntityId) -> Result<Vec<Comment>> {
        Ok(self.lock()?.comments_for(post_id).to_vec())
    }

    fn lock(&self) -> Result<MutexGuard<'_, FeedState>> {
        lock(&self.state)
    }

    fn fail(&self, error: ClientError) -> ClientError {
        if let Ok(mut st) = self.state.lock() {
            st.error = Some(error.to_string());
            st.loading = false;
            st.loading_more = false;
        }
        error
    }

    fn token(&self) -> Result<String> {
        self.session.require_token().map_err(|e| self.fail(e))
    }

    // -- fetching -----------------------------------------------------------

    /// Fetch the first page under the current filters.
    pub async fn refresh(&self) -> Result<bool> {
        let ticket = self.query.issue();
        self.fetch_first_page(ticket).await
    }

    async fn fetch_first_page(&self, ticket: Ticket) -> Result<bool> {
        let token = self.token()?;
        let query = {
            let mut st = self.lock()?;
            st.loading = true;
            self.page_query(&st.filters, 0)
        };

        let result = self.api.list_posts(&token, &query).await;
        if !self.query.is_current(ticket) {
            debug!("discarding superseded feed page");
            return Ok(false);
        }

        let mut st = self.lock()?;
        st.loading = false;
        match result {
            Ok(env) => {
                let posts: Vec<Post> = env.data.posts.into_iter().map(with_sentiment).collect();
                debug!(count = posts.len(), has_more = env.data.has_more, "feed page loaded");
                st.posts.replace_all(posts);
                st.has_more = env.data.has_more;
                st.error = None;
                Ok(true)
            }
            Err(e) => {
                st.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Append the next page. Superseded by any refresh issued meanwhile.
    pub async fn load_more(&self) -> Result<bool> {
        let token = self.token()?;
        let ticket = self.query.current();
        let query = {
            let mut st = self.lock()?;
            if !st.has_more || st.loading_more || st.loading {
                return Ok(false);
            }
            st.loading_more = true;
            let confirmed = st.posts.len() - st.posts.provisional_count();
            self.page_query(&st.filters, confirmed as u32)
        };

        let result = self.api.list_posts(&token, &query).await;
        let mut st = self.lock()?;
        st.loading_more = false;
        if !self.query.is_current(ticket) {
            return Ok(false);
        }
        match result {
            Ok(env) => {
                let added = st
                    .posts
                    .extend_page(env.data.posts.into_iter().map(with_sentiment).collect());
                st.has_more = env.data.has_more && added > 0;
                Ok(true)
            }
            Err(e) => {
                st.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    fn page_query(&self, filters: &FeedFilters, skip: u32) -> PostQuery {
        PostQuery {
            skip,
            limit: self.page_size,
            category: filters.category.clone(),
            search: filters.search.clone(),
            sentiment: filters.sentiment,
        }
    }

    pub async fn set_category(&self, category: Option<String>) -> Result<bool> {
        self.lock()?.filters.category = category.filter(|c| !c.trim().is_empty());
        self.refresh().await
    }

    pub async fn set_sentiment(&self, sentiment: Option<SentimentLabel>) -> Result<bool> {
        self.lock()?.filters.sentiment = sentiment;
        self.refresh().await
    }

    /// Debounced: only the last of a burst of calls reaches the server.
    pub async fn set_search(&self, search: &str) -> Result<bool> {
        let search = search.trim();
        self.lock()?.filters.search = (!search.is_empty()).then(|| search.to_string());
        match self.query.debounced(self.search_debounce).await {
            Some(ticket) => self.fetch_first_page(ticket).await,
            None => Ok(false),
        }
    }

    /// Re-read one post and swap it into the list if it is shown.
    pub async fn reload_post(&self, id: &EntityId) -> Result<Option<Post>> {
        let token = self.token()?;
        let env = self
            .api
            .get_post(&token, id)
            .await
            .map_err(|e| self.fail(e.into()))?;
        let Some(post) = env.data.post.map(with_sentiment) else {
            return Ok(None);
        };
        self.lock()?.posts.modify(id, |p| *p = post.clone());
        Ok(Some(post))
    }

    // -- posts --------------------------------------------------------------

    async fn mutate_post<B, Fut>(&self, begin: B, request: Fut) -> Result<Settled>
    where
        B: FnOnce(&mut OptimisticList<Post>) -> Option<Mutation<Post>>,
        Fut: Future<Output = std::result::Result<Option<Post>, ApiError>>,
    {
        let mutation = self.begin_post(begin)?;
        let result = request.await;
        self.settle_post(mutation, result, |_| {})
    }

    fn begin_post<B>(&self, begin: B) -> Result<Mutation<Post>>
    where
        B: FnOnce(&mut OptimisticList<Post>) -> Option<Mutation<Post>>,
    {
        let mut st = self.lock()?;
        let begun = begin(&mut st.posts);
        let Some(mutation) = begun else {
            drop(st);
            return Err(self.fail(ClientError::NotFound("Post".into())));
        };
        st.error = None;
        st.last_mutation = mutation.state();
        Ok(mutation)
    }

    /// Confirm or roll back. `reconcile` runs after a confirm, inside the
    /// same critical section.
    fn settle_post<R>(
        &self,
        mut mutation: Mutation<Post>,
        result: std::result::Result<Option<Post>, ApiError>,
        reconcile: R,
    ) -> Result<Settled>
    where
        R: FnOnce(&mut OptimisticList<Post>),
    {
        let mut st = self.lock()?;
        match result {
            Ok(server) => {
                let settled = st.posts.confirm(&mut mutation, server.map(with_sentiment));
                reconcile(&mut st.posts);
                st.last_mutation = mutation.state();
                Ok(settled)
            }
            Err(e) => {
                st.posts.rollback(&mut mutation);
                st.last_mutation = mutation.state();
                st.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub async fn create_post(&self, mut draft: PostDraft, media: PostMedia) -> Result<Settled> {
        validation::require("Content", &draft.content).map_err(|e| self.fail(e.into()))?;
        if draft.title.trim().is_empty() {
            draft.title = default_title(&draft.content);
        }
        let token = self.token()?;
        let author = self
            .session
            .current()
            .map(|s| s.author())
            .unwrap_or_default();

        let provisional = with_sentiment(draft.to_provisional(author));
        let api = self.api.clone();
        let settled = self
            .mutate_post(move |posts| Some(posts.begin_create(provisional)), async move {
                let env = api.create_post(&token, &draft, media).await?;
                Ok::<_, ApiError>(env.data.post)
            })
            .await?;

        info!(settled = ?settled, "Post created");
        if settled == Settled::NeedsRefetch {
            self.refresh().await?;
        }
        Ok(settled)
    }

    /// Joint edit of text fields and, optionally, media.
    pub async fn edit_post(&self, id: &EntityId, edit: PostEdit, media: PostMedia) -> Result<Settled> {
        if let Some(ref content) = edit.content {
            validation::require("Content", content).map_err(|e| self.fail(e.into()))?;
        }
        let token = self.token()?;
        let api = self.api.clone();
        let target = id.clone();
        let local = edit.clone();
        self.mutate_post(
            |posts| posts.begin_update(id, |p| local.apply_to(p)),
            async move {
                let env = api.update_post(&token, &target, &edit, media).await?;
                Ok::<_, ApiError>(env.data.post)
            },
        )
        .await
    }

    pub async fn edit_post_text(&self, id: &EntityId, content: &str) -> Result<Settled> {
        validation::require("Content", content).map_err(|e| self.fail(e.into()))?;
        let token = self.token()?;
        let api = self.api.clone();
        let target = id.clone();
        let text = content.to_string();
        let edit = PostEdit {
            content: Some(text.clone()),
            ..Default::default()
        };
        self.mutate_post(
            |posts| posts.begin_update(id, |p| edit.apply_to(p)),
            async move {
                let env = api.update_post_text(&token, &target, &text).await?;
                Ok::<_, ApiError>(env.data.post)
            },
        )
        .await
    }

    /// New media cannot be shown before it is uploaded; the post changes
    /// when the server answers.
    pub async fn replace_post_media(&self, id: &EntityId, media: PostMedia) -> Result<Settled> {
        let token = self.token()?;
        let api = self.api.clone();
        let target = id.clone();
        self.mutate_post(|posts| posts.begin_update(id, |_| {}), async move {
            let env = api.update_post_media(&token, &target, media).await?;
            Ok::<_, ApiError>(env.data.post)
        })
        .await
    }

    pub async fn remove_post_media(&self, id: &EntityId) -> Result<Settled> {
        let token = self.token()?;
        let api = self.api.clone();
        let target = id.clone();
        self.mutate_post(
            |posts| {
                posts.begin_update(id, |p| {
                    p.media_urls.clear();
                    p.attachment_urls.clear();
                })
            },
            async move {
                let env = api.remove_post_media(&token, &target).await?;
                Ok::<_, ApiError>(env.data.post)
            },
        )
        .await
    }

    pub async fn delete_post(&self, id: &EntityId) -> Result<Settled> {
        let token = self.token()?;
        let api = self.api.clone();
        let target = id.clone();
        let settled = self
            .mutate_post(|posts| posts.begin_remove(id), async move {
                api.delete_post(&token, &target).await?;
                Ok::<_, ApiError>(None)
            })
            .await?;
        self.lock()?.comments.remove(id);
        info!(post_id = %id, "Post deleted");
        Ok(settled)
    }

    /// Flip the viewer's like. The backend answers with its own `liked`
    /// flag; when that disagrees with the flip, the post follows the server.
    pub async fn toggle_like(&self, id: &EntityId) -> Result<Settled> {
        let token = self.token()?;
        let mutation = self.begin_post(|posts| posts.begin_patch(id, Patch::toggle(Post::toggle_like)))?;

        let result = self.api.like_post(&token, id).await;
        let liked = result.as_ref().ok().and_then(|env| env.data.liked);

        self.settle_post(mutation, result.map(|_| None), |posts| {
            let Some(liked) = liked else { return };
            posts.modify(id, |post| {
                if post.is_liked != liked {
                    debug!(post_id = %id, liked, "like state corrected from server");
                    post.toggle_like();
                }
            });
        })
    }

    // -- comments -----------------------------------------------------------

    fn comment_tracker(&self, post_id: &EntityId) -> Result<QueryTracker> {
        let mut trackers = lock(&self.comment_queries)?;
        Ok(trackers.entry(post_id.clone()).or_default().clone())
    }

    pub async fn load_comments(&self, post_id: &EntityId) -> Result<bool> {
        let token = self.token()?;
        let tracker = self.comment_tracker(post_id)?;
        let ticket = tracker.issue();

        let result = self.api.list_comments(&token, post_id).await;
        if !tracker.is_current(ticket) {
            return Ok(false);
        }

        let mut st = self.lock()?;
        match result {
            Ok(env) => {
                debug!(post_id = %post_id, count = env.data.comments.len(), "comments loaded");
                st.comments
                    .insert(post_id.clone(), OptimisticList::from_vec(env.data.comments));
                Ok(true)
            }
            Err(e) => {
                st.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Run a comment mutation together with an optional patch of the parent
    /// post's counter. Both settle in one critical section.
    async fn mutate_comment<B, Fut>(
        &self,
        post_id: &EntityId,
        counter: Option<Patch<Post>>,
        begin: B,
        request: Fut,
    ) -> Result<Settled>
    where
        B: FnOnce(&mut OptimisticList<Comment>) -> Option<Mutation<Comment>>,
        Fut: Future<Output = std::result::Result<Option<Comment>, ApiError>>,
    {
        let (mut mutation, mut parent) = {
            let mut st = self.lock()?;
            let begun = begin(st.comments.entry(post_id.clone()).or_default());
            let Some(mutation) = begun else {
                drop(st);
                return Err(self.fail(ClientError::NotFound("Comment".into())));
            };
            let parent = counter.and_then(|patch| st.posts.begin_patch(post_id, patch));
            st.error = None;
            st.last_mutation = mutation.state();
            (mutation, parent)
        };

        let result = request.await;

        let mut st = self.lock()?;
        let st = &mut *st;
        let comments = st.comments.entry(post_id.clone()).or_default();
        match result {
            Ok(server) => {
                let settled = comments.confirm(&mut mutation, server);
                if let Some(ref mut p) = parent {
                    st.posts.confirm(p, None);
                }
                st.last_mutation = mutation.state();
                Ok(settled)
            }
            Err(e) => {
                comments.rollback(&mut mutation);
                if let Some(ref mut p) = parent {
                    st.posts.rollback(p);
                }
                st.last_mutation = mutation.state();
                st.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub async fn add_comment(
        &self,
        post_id: &EntityId,
        draft: CommentDraft,
        image: Option<FilePart>,
    ) -> Result<Settled> {
        validation::require("Comment", &draft.content)
            .and_then(|_| validation::optional_url("Link", draft.link.as_deref()))
            .map_err(|e| self.fail(e.into()))?;
        let token = self.token()?;
        let author = self
            .session
            .current()
            .map(|s| s.author())
            .unwrap_or_default();

        let provisional = draft.to_provisional(post_id, author);
        let api = self.api.clone();
        let target = post_id.clone();
        let settled = self
            .mutate_comment(
                post_id,
                Some(Patch::new(Post::increment_comments, Post::decrement_comments)),
                move |comments| Some(comments.begin_create(provisional)),
                async move {
                    let env = api.create_comment(&token, &target, &draft, image).await?;
                    Ok::<_, ApiError>(env.data.comment)
                },
            )
            .await?;

        info!(post_id = %post_id, "Comment added");
        if settled == Settled::NeedsRefetch {
            self.load_comments(post_id).await?;
        }
        Ok(settled)
    }

    /// Joint edit of text, link and optionally the image.
    pub async fn edit_comment(
        &self,
        post_id: &EntityId,
        comment_id: &EntityId,
        content: &str,
        link: Option<&str>,
        image: Option<FilePart>,
    ) -> Result<Settled> {
        validation::require("Comment", content)
            .and_then(|_| validation::optional_url("Link", link))
            .map_err(|e| self.fail(e.into()))?;
        let token = self.token()?;
        let api = self.api.clone();
        let target = comment_id.clone();
        let text = content.to_string();
        let link = link.map(str::to_string);
        let (local_text, local_link) = (text.clone(), link.clone());
        self.mutate_comment(
            post_id,
            None,
            |comments| {
                comments.begin_update(comment_id, |c| {
                    c.content = local_text;
                    c.link = local_link;
                })
            },
            async move {
                let env = api
                    .update_comment(&token, &target, &text, link.as_deref(), image)
                    .await?;
                Ok::<_, ApiError>(env.data.comment)
            },
        )
        .await
    }

    pub async fn edit_comment_text(&self, post_id: &EntityId, comment_id: &EntityId, content: &str) -> Result<Settled> {
        validation::require("Comment", content).map_err(|e| self.fail(e.into()))?;
        let token = self.token()?;
        let api = self.api.clone();
        let target = comment_id.clone();
        let text = content.to_string();
        let local = text.clone();
        self.mutate_comment(
            post_id,
            None,
            |comments| comments.begin_update(comment_id, |c| c.content = local),
            async move {
                let env = api.update_comment_text(&token, &target, &text).await?;
                Ok::<_, ApiError>(env.data.comment)
            },
        )
        .await
    }

    pub async fn edit_comment_link(&self, post_id: &EntityId, comment_id: &EntityId, link: &str) -> Result<Settled> {
        validation::url("Link", link).map_err(|e| self.fail(e.into()))?;
        let token = self.token()?;
        let api = self.api.clone();
        let target = comment_id.clone();
        let link = link.trim().to_string();
        let local = link.clone();
        self.mutate_comment(
            post_id,
            None,
            |comments| comments.begin_update(comment_id, |c| c.link = Some(local)),
            async move {
                let env = api.update_comment_link(&token, &target, &link).await?;
                Ok::<_, ApiError>(env.data.comment)
            },
        )
        .await
    }

    pub async fn replace_comment_media(
        &self,
        post_id: &EntityId,
        comment_id: &EntityId,
        image: FilePart,
    ) -> Result<Settled> {
        let token = self.token()?;
        let api = self.api.clone();
        let target = comment_id.clone();
        self.mutate_comment(
            post_id,
            None,
            |comments| comments.begin_update(comment_id, |_| {}),
            async move {
                let env = api.update_comment_media(&token, &target, image).await?;
                Ok::<_, ApiError>(env.data.comment)
            },
        )
        .await
    }

    pub async fn remove_comment_media(&self, post_id: &EntityId, comment_id: &EntityId) -> Result<Settled> {
        let token = self.token()?;
        let api = self.api.clone();
        let target = comment_id.clone();
        self.mutate_comment(
            post_id,
            None,
            |comments| comments.begin_update(comment_id, |c| c.media_url = None),
            async move {
                let env = api.remove_comment_media(&token, &target).await?;
                Ok::<_, ApiError>(env.data.comment)
            },
        )
        .await
    }

    pub async fn delete_comment(&self, post_id: &EntityId, comment_id: &EntityId) -> Result<Settled> {
        let token = self.token()?;
        let api = self.api.clone();
        let target = comment_id.clone();
        let settled = self
            .mutate_comment(
                post_id,
                Some(Patch::new(Post::decrement_comments, Post::increment_comments)),
                |comments| comments.begin_remove(comment_id),
                async move {
                    api.delete_comment(&token, &target).await?;
                    Ok::<_, ApiError>(None)
                },
            )
            .await?;
        info!(post_id = %post_id, comment_id = %comment_id, "Comment deleted");
        Ok(settled)
    }

    pub async fn toggle_comment_like(&self, post_id: &EntityId, comment_id: &EntityId) -> Result<Settled> {
        let token = self.token()?;
        let api = self.api.clone();
        let target = comment_id.clone();
        self.mutate_comment(
            post_id,
            None,
            |comments| comments.begin_update(comment_id, Comment::toggle_like),
            async move {
                let env = api.like_comment(&token, &target).await?;
                Ok::<_, ApiError>(env.data.comment)
            },
        )
        .await
    }
}

fn default_title(content: &str) -> String {
    content
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("New Post")
        .to_string()
}

/// Fill in a local estimate when the backend sent no sentiment.
fn with_sentiment(mut post: Post) -> Post {
    if !post.has_sentiment() {
        let estimate = sentiment::estimate(&format!("{} {}", post.title, post.content));
        post.sentiment = Some(estimate.sentiment.as_query().to_string());
        post.sentiment_score = Some(f64::from(estimate.score) / 100.0);
        post.emotional_intensity = Some(f64::from(estimate.emotional_intensity));
        post.detected_emotions = estimate.detected_emotions;
    }
    post
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_title_uses_first_non_empty_line() {
        assert_eq!(default_title("\n  Exam tips \nmore"), "Exam tips");
        assert_eq!(default_title("   "), "New Post");
    }

    #[test]
    fn backend_sentiment_is_kept() {
        let mut post = PostDraft {
            title: "t".into(),
            content: "terrible".into(),
            ..Default::default()
        }
        .to_provisional(Default::default());
        post.sentiment = Some("positive".into());
        let post = with_sentiment(post);
        assert_eq!(post.sentiment.as_deref(), Some("positive"));
        assert_eq!(post.sentiment_score, None);
    }

    #[test]
    fn missing_sentiment_is_estimated() {
        let post = PostDraft {
            title: "Great".into(),
            content: "amazing fest".into(),
            ..Default::default()
        }
        .to_provisional(Default::default());
        let post = with_sentiment(post);
        assert_eq!(post.sentiment.as_deref(), Some("positive"));
        assert_eq!(post.sentiment_score, Some(0.7));
    }
}
