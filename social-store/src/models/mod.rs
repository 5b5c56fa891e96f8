//! Domain models shared by every backend
//!
//! Rows are plain structs; credentials and invitation tokens are only
//! ever held in hashed form.

pub mod comment;
pub mod feed;
pub mod post;
pub mod role;
pub mod user;
pub mod validation;

pub use comment::{Comment, CommentAuthor};
pub use feed::{FeedQuery, FeedQueryParams, SortDirection};
pub use post::{Post, PostWithMetadata};
pub use role::Role;
pub use user::{hash_token, Password, User};
pub(crate) use user::invitation_expiry;
pub use validation::ValidationError;
