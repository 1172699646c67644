use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use campus_shared::models::{Comment, CommentDraft, Post, PostDraft, PostEdit};
use campus_shared::types::{EntityId, SentimentLabel};

use super::{ApiClient, ApiError, Envelope, FilePart, MultipartBody};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostPage {
    #[serde(default)]
    pub posts: Vec<Post>,
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub has_more: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostData {
    #[serde(default)]
    pub post: Option<Post>,
}

/// Answer to a like toggle: whether the viewer now likes the post.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LikeData {
    #[serde(default)]
    pub liked: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentList {
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentData {
    #[serde(default)]
    pub comment: Option<Comment>,
}

/// Feed query. Empty strings and `None` are left off the URL.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostQuery {
    pub skip: u32,
    pub limit: u32,
    pub category: Option<String>,
    pub search: Option<String>,
    pub sentiment: Option<SentimentLabel>,
}

impl PostQuery {
    fn params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("skip", self.skip.to_string()),
            ("limit", self.limit.to_string()),
            ("category", self.category.clone().unwrap_or_default()),
            ("search", self.search.clone().unwrap_or_default()),
            (
                "sentiment",
                self.sentiment.map(|s| s.as_query().to_string()).unwrap_or_default(),
            ),
        ]
    }
}

/// Files attached to a post. Both empty means a plain JSON request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostMedia {
    pub image: Option<FilePart>,
    pub attachment: Option<FilePart>,
}

impl PostMedia {
    pub fn is_empty(&self) -> bool {
        self.image.is_none() && self.attachment.is_none()
    }
}

impl ApiClient {
    pub async fn list_posts(&self, token: &str, query: &PostQuery) -> Result<Envelope<PostPage>, ApiError> {
        self.get(Some(token), "social-feed/posts", &query.params()).await
    }

    pub async fn get_post(&self, token: &str, id: &EntityId) -> Result<Envelope<PostData>, ApiError> {
        self.get(Some(token), &format!("social-feed/posts/{id}"), &[]).await
    }

    pub async fn create_post(
        &self,
        token: &str,
        draft: &PostDraft,
        media: PostMedia,
    ) -> Result<Envelope<PostData>, ApiError> {
        if media.is_empty() {
            return self
                .send_json(Method::POST, Some(token), "social-feed/posts", draft)
                .await;
        }
        let body = MultipartBody::default()
            .text("title", draft.title.as_str())
            .text("content", draft.content.as_str())
            .text("category", draft.category.as_deref().unwrap_or("general"))
            .text("is_anonymous", draft.is_anonymous.to_string())
            .opt_file("image", media.image)
            .opt_file("attachment", media.attachment);
        self.send_multipart(Method::POST, Some(token), "social-feed/posts", body)
            .await
    }

    /// Joint edit of text and, optionally, media.
    pub async fn update_post(
        &self,
        token: &str,
        id: &EntityId,
        edit: &PostEdit,
        media: PostMedia,
    ) -> Result<Envelope<PostData>, ApiError> {
        let path = format!("social-feed/posts/{id}");
        if media.is_empty() {
            return self.send_json(Method::PUT, Some(token), &path, edit).await;
        }
        let body = MultipartBody::default()
            .opt_text("title", edit.title.as_deref())
            .opt_text("content", edit.content.as_deref())
            .opt_text("category", edit.category.as_deref())
            .opt_file("image", media.image)
            .opt_file("attachment", media.attachment);
        self.send_multipart(Method::PUT, Some(token), &path, body).await
    }

    pub async fn update_post_text(
        &self,
        token: &str,
        id: &EntityId,
        content: &str,
    ) -> Result<Envelope<PostData>, ApiError> {
        let body = json!({ "content": content });
        self.send_json(Method::PUT, Some(token), &format!("social-feed/posts/{id}/text"), &body)
            .await
    }

    pub async fn update_post_media(
        &self,
        token: &str,
        id: &EntityId,
        media: PostMedia,
    ) -> Result<Envelope<PostData>, ApiError> {
        if media.is_empty() {
            return Err(ApiError::InvalidRequest("no media to upload".into()));
        }
        let body = MultipartBody::default()
            .opt_file("image", media.image)
            .opt_file("attachment", media.attachment);
        self.send_multipart(Method::PUT, Some(token), &format!("social-feed/posts/{id}/media"), body)
            .await
    }

    pub async fn remove_post_media(&self, token: &str, id: &EntityId) -> Result<Envelope<PostData>, ApiError> {
        self.delete(Some(token), &format!("social-feed/posts/{id}/remove-media"))
            .await
    }

    pub async fn delete_post(&self, token: &str, id: &EntityId) -> Result<Envelope<serde_json::Value>, ApiError> {
        self.delete(Some(token), &format!("social-feed/posts/{id}")).await
    }

    pub async fn like_post(&self, token: &str, id: &EntityId) -> Result<Envelope<LikeData>, ApiError> {
        self.send_json(Method::POST, Some(token), &format!("social-feed/posts/{id}/like"), &json!({}))
            .await
    }

    pub async fn list_comments(&self, token: &str, post_id: &EntityId) -> Result<Envelope<CommentList>, ApiError> {
        self.get(Some(token), &format!("social-feed/posts/{post_id}/comments"), &[])
            .await
    }

    pub async fn create_comment(
        &self,
        token: &str,
        post_id: &EntityId,
        draft: &CommentDraft,
        image: Option<FilePart>,
    ) -> Result<Envelope<CommentData>, ApiError> {
        let path = format!("social-feed/posts/{post_id}/comments");
        let Some(image) = image else {
            return self.send_json(Method::POST, Some(token), &path, draft).await;
        };
        let body = MultipartBody::default()
            .text("content", draft.content.as_str())
            .text("is_anonymous", draft.is_anonymous.to_string())
            .opt_text("link", draft.link.as_deref())
            .file("image", image);
        self.send_multipart(Method::POST, Some(token), &path, body).await
    }

    pub async fn update_comment(
        &self,
        token: &str,
        id: &EntityId,
        content: &str,
        link: Option<&str>,
        image: Option<FilePart>,
    ) -> Result<Envelope<CommentData>, ApiError> {
        let path = format!("social-feed/comments/{id}");
        let Some(image) = image else {
            let body = json!({ "content": content, "link": link });
            return self.send_json(Method::PUT, Some(token), &path, &body).await;
        };
        let body = MultipartBody::default()
            .text("content", content)
            .opt_text("link", link)
            .file("image", image);
        self.send_multipart(Method::PUT, Some(token), &path, body).await
    }

    pub async fn update_comment_text(
        &self,
        token: &str,
        id: &EntityId,
        content: &str,
    ) -> Result<Envelope<CommentData>, ApiError> {
        let body = json!({ "content": content });
        self.send_json(Method::PUT, Some(token), &format!("social-feed/comments/{id}/text"), &body)
            .await
    }

    pub async fn update_comment_link(
        &self,
        token: &str,
        id: &EntityId,
        link: &str,
    ) -> Result<Envelope<CommentData>, ApiError> {
        let body = json!({ "link": link });
        self.send_json(Method::PUT, Some(token), &format!("social-feed/comments/{id}/link"), &body)
            .await
    }

    pub async fn update_comment_media(
        &self,
        token: &str,
        id: &EntityId,
        image: FilePart,
    ) -> Result<Envelope<CommentData>, ApiError> {
        let body = MultipartBody::default().file("image", image);
        self.send_multipart(Method::PUT, Some(token), &format!("social-feed/comments/{id}/media"), body)
            .await
    }

    pub async fn remove_comment_media(&self, token: &str, id: &EntityId) -> Result<Envelope<CommentData>, ApiError> {
        self.delete(Some(token), &format!("social-feed/comments/{id}/remove-media"))
            .await
    }

    pub async fn delete_comment(&self, token: &str, id: &EntityId) -> Result<Envelope<serde_json::Value>, ApiError> {
        self.delete(Some(token), &format!("social-feed/comments/{id}")).await
    }

    pub async fn like_comment(&self, token: &str, id: &EntityId) -> Result<Envelope<CommentData>, ApiError> {
        self.send_json(Method::POST, Some(token), &format!("social-feed/comments/{id}/like"), &json!({}))
            .await
    }
}
