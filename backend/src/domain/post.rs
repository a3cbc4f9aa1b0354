//! Posts, their inline image uploads and the views served to readers.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{UserId, UserSummary, Username};

/// Maximum post body length in characters.
pub const POST_CONTENT_MAX: usize = 5000;
/// Largest accepted image upload in bytes.
pub const IMAGE_MAX_BYTES: usize = 10 * 1024 * 1024;

/// Validation failures for post payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PostValidationError {
    /// The body is blank.
    #[error("post content must not be empty")]
    EmptyContent,
    /// The body exceeds [`POST_CONTENT_MAX`].
    #[error("post content must be at most {max} characters")]
    ContentTooLong {
        /// Maximum length.
        max: usize,
    },
    /// The upload carries no bytes.
    #[error("image must not be empty")]
    EmptyImage,
    /// The upload exceeds [`IMAGE_MAX_BYTES`].
    #[error("image must be at most {max} bytes")]
    ImageTooLarge {
        /// Maximum size.
        max: usize,
    },
    /// The file extension is not an accepted image type.
    #[error("image type '{extension}' is not supported; expected png, jpg, jpeg, gif or webp")]
    UnsupportedImageType {
        /// Extension supplied by the client.
        extension: String,
    },
}

/// Post identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PostId(Uuid);

impl PostId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Fresh identifier for a new post.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Validated post body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PostContent(String);

impl PostContent {
    /// Validate a body; surrounding whitespace is trimmed.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, PostValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(PostValidationError::EmptyContent);
        }
        if trimmed.chars().count() > POST_CONTENT_MAX {
            return Err(PostValidationError::ContentTooLong {
                max: POST_CONTENT_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for PostContent {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<PostContent> for String {
    fn from(value: PostContent) -> Self {
        value.0
    }
}

impl TryFrom<String> for PostContent {
    type Error = PostValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Accepted image file types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    /// `.png`
    Png,
    /// `.jpg` or `.jpeg`
    Jpeg,
    /// `.gif`
    Gif,
    /// `.webp`
    Webp,
}

impl ImageKind {
    /// Resolve a kind from a file name or bare extension, case-insensitively.
    pub fn from_file_name(name: &str) -> Result<Self, PostValidationError> {
        let extension = name.rsplit_once('.').map_or(name, |(_, ext)| ext);
        match extension.to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            "gif" => Ok(Self::Gif),
            "webp" => Ok(Self::Webp),
            _ => Err(PostValidationError::UnsupportedImageType {
                extension: extension.to_owned(),
            }),
        }
    }

    /// Extension used for stored files.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

/// Image bytes attached to a new post.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    kind: ImageKind,
    bytes: Vec<u8>,
}

impl ImageUpload {
    /// Validate an upload's type and size.
    pub fn new(kind: ImageKind, bytes: Vec<u8>) -> Result<Self, PostValidationError> {
        if bytes.is_empty() {
            return Err(PostValidationError::EmptyImage);
        }
        if bytes.len() > IMAGE_MAX_BYTES {
            return Err(PostValidationError::ImageTooLarge {
                max: IMAGE_MAX_BYTES,
            });
        }
        Ok(Self { kind, bytes })
    }

    /// File type.
    #[must_use]
    pub const fn kind(&self) -> ImageKind {
        self.kind
    }

    /// Raw file bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Request to publish a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    /// Publishing user.
    pub author: UserId,
    /// Body text.
    pub content: PostContent,
    /// Optional image stored before the post row is written.
    pub image: Option<ImageUpload>,
}

/// Stored post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    /// Identifier.
    pub id: PostId,
    /// Publishing user.
    pub author: UserId,
    /// Body text.
    pub content: PostContent,
    /// Public URL of the attached image.
    pub image_url: Option<String>,
    /// Publication time.
    pub created_at: DateTime<Utc>,
}

/// Post joined with its author and vote tally, as read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRecord {
    /// The post row.
    pub post: Post,
    /// Author listing data.
    pub author: UserSummary,
    /// Number of votes.
    pub votes: u64,
    /// Whether the requesting viewer has voted.
    pub voted: bool,
}

/// Post as presented to a reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    /// Identifier.
    pub id: PostId,
    /// Author listing data.
    pub author: UserSummary,
    /// Body text.
    #[schema(value_type = String)]
    pub content: PostContent,
    /// Public URL of the attached image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Publication time.
    pub created_at: DateTime<Utc>,
    /// Number of votes.
    pub votes: u64,
    /// Whether the viewer has voted.
    pub voted: bool,
    /// Whether the viewer wrote the post.
    pub own: bool,
}

impl PostView {
    /// Present a stored record to `viewer`.
    #[must_use]
    pub fn from_record(record: PostRecord, viewer: Option<&UserId>) -> Self {
        let PostRecord {
            post,
            author,
            votes,
            voted,
        } = record;
        Self {
            own: viewer.is_some_and(|id| *id == post.author),
            id: post.id,
            author,
            content: post.content,
            image_url: post.image_url,
            created_at: post.created_at,
            votes,
            voted,
        }
    }
}

/// Single post page: the post plus the names of everyone who voted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    /// The post.
    #[serde(flatten)]
    pub post: PostView,
    /// Usernames of voters.
    #[schema(value_type = Vec<String>)]
    pub voters: Vec<Username>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", PostValidationError::EmptyContent)]
    #[case("   ", PostValidationError::EmptyContent)]
    fn rejects_blank_content(#[case] raw: &str, #[case] expected: PostValidationError) {
        assert_eq!(PostContent::new(raw), Err(expected));
    }

    #[rstest]
    fn caps_content_length() {
        assert!(PostContent::new("x".repeat(POST_CONTENT_MAX)).is_ok());
        assert_eq!(
            PostContent::new("x".repeat(POST_CONTENT_MAX + 1)),
            Err(PostValidationError::ContentTooLong {
                max: POST_CONTENT_MAX
            })
        );
    }

    #[rstest]
    #[case("cat.PNG", ImageKind::Png)]
    #[case("photo.jpeg", ImageKind::Jpeg)]
    #[case("photo.jpg", ImageKind::Jpeg)]
    #[case("loop.gif", ImageKind::Gif)]
    #[case("webp", ImageKind::Webp)]
    fn resolves_image_kinds(#[case] name: &str, #[case] expected: ImageKind) {
        assert_eq!(ImageKind::from_file_name(name), Ok(expected));
    }

    #[rstest]
    #[case("payload.exe")]
    #[case("archive.tar.gz")]
    #[case("noextension")]
    fn rejects_other_file_types(#[case] name: &str) {
        assert!(matches!(
            ImageKind::from_file_name(name),
            Err(PostValidationError::UnsupportedImageType { .. })
        ));
    }

    #[rstest]
    fn upload_size_is_bounded() {
        assert_eq!(
            ImageUpload::new(ImageKind::Png, Vec::new()),
            Err(PostValidationError::EmptyImage)
        );
        assert_eq!(
            ImageUpload::new(ImageKind::Png, vec![0; IMAGE_MAX_BYTES + 1]),
            Err(PostValidationError::ImageTooLarge {
                max: IMAGE_MAX_BYTES
            })
        );
        assert!(ImageUpload::new(ImageKind::Gif, vec![0; 16]).is_ok());
    }
}
