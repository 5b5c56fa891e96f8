//! Table state for the in-memory backend
//!
//! Mirrors the Postgres schema's constraints: unique username/email,
//! unique follower edges, foreign keys with cascading deletes.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::error::{Result, StoreError};
use crate::models::{
    Comment, CommentAuthor, FeedQuery, Post, PostWithMetadata, Role, SortDirection, User,
};

#[derive(Debug, Clone)]
struct Invitation {
    user_id: i64,
    expiry: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct MemoryState {
    users: BTreeMap<i64, User>,
    /// Keyed by the hashed token
    invitations: HashMap<String, Invitation>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    /// (follower_id, followed_id) -> created_at
    followers: BTreeMap<(i64, i64), DateTime<Utc>>,
    roles: Vec<Role>,
    next_user_id: i64,
    next_post_id: i64,
    next_comment_id: i64,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            users: BTreeMap::new(),
            invitations: HashMap::new(),
            posts: BTreeMap::new(),
            comments: BTreeMap::new(),
            followers: BTreeMap::new(),
            roles: Role::reference_roles(),
            next_user_id: 1,
            next_post_id: 1,
            next_comment_id: 1,
        }
    }
}

impl MemoryState {
    // ---- users ---------------------------------------------------------

    pub(crate) fn insert_user(&mut self, user: &mut User) -> Result<()> {
        if self.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::conflict("user", "username"));
        }
        if self.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::conflict("user", "email"));
        }
        let role = self
            .role_by_name(user.role_name())
            .cloned()
            .ok_or_else(|| StoreError::not_found("role", user.role_name()))?;

        user.id = self.next_user_id;
        self.next_user_id += 1;
        user.created_at = Utc::now();
        user.role_id = role.id;
        user.role = role;
        self.users.insert(user.id, user.clone());
        Ok(())
    }

    pub(crate) fn active_user(&self, id: i64) -> Result<User> {
        self.users
            .get(&id)
            .filter(|u| u.is_active)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", id))
    }

    pub(crate) fn active_user_by_email(&self, email: &str) -> Result<User> {
        self.users
            .values()
            .find(|u| u.is_active && u.email == email)
            .cloned()
            .ok_or_else(|| StoreError::not_found("user", email))
    }

    /// Raw lookup regardless of activation state.
    pub(crate) fn user(&self, id: i64) -> Option<&User> {
        self.users.get(&id)
    }

    pub(crate) fn insert_invitation(
        &mut self,
        token_hash: String,
        user_id: i64,
        expiry: DateTime<Utc>,
    ) -> Result<()> {
        if !self.users.contains_key(&user_id) {
            return Err(StoreError::MissingReference {
                resource: "invitation",
                reference: "user",
                id: user_id,
            });
        }
        if self.invitations.contains_key(&token_hash) {
            return Err(StoreError::conflict("invitation", "token"));
        }
        self.invitations.insert(token_hash, Invitation { user_id, expiry });
        Ok(())
    }

    pub(crate) fn activate(&mut self, token_hash: &str, now: DateTime<Utc>) -> Result<i64> {
        let user_id = self
            .invitations
            .get(token_hash)
            .filter(|inv| inv.expiry > now)
            .map(|inv| inv.user_id)
            .ok_or_else(|| StoreError::not_found("invitation", "token"))?;

        let user = self
            .users
            .get_mut(&user_id)
            .ok_or_else(|| StoreError::not_found("invitation", "token"))?;
        user.is_active = true;
        self.invitations.retain(|_, inv| inv.user_id != user_id);
        Ok(user_id)
    }

    pub(crate) fn delete_user(&mut self, id: i64) -> Result<()> {
        if self.users.remove(&id).is_none() {
            return Err(StoreError::not_found("user", id));
        }
        self.invitations.retain(|_, inv| inv.user_id != id);
        self.followers
            .retain(|(follower, followed), _| *follower != id && *followed != id);

        let owned_posts: HashSet<i64> = self
            .posts
            .values()
            .filter(|p| p.user_id == id)
            .map(|p| p.id)
            .collect();
        self.posts.retain(|post_id, _| !owned_posts.contains(post_id));
        self.comments
            .retain(|_, c| c.user_id != id && !owned_posts.contains(&c.post_id));
        Ok(())
    }

    // ---- posts ---------------------------------------------------------

    pub(crate) fn insert_post(&mut self, post: &mut Post) -> Result<()> {
        if !self.users.contains_key(&post.user_id) {
            return Err(StoreError::MissingReference {
                resource: "post",
                reference: "user",
                id: post.user_id,
            });
        }
        post.id = self.next_post_id;
        self.next_post_id += 1;
        let now = Utc::now();
        post.created_at = now;
        post.updated_at = now;

        let mut stored = post.clone();
        stored.comments.clear();
        self.posts.insert(stored.id, stored);
        Ok(())
    }

    pub(crate) fn post(&self, id: i64) -> Result<Post> {
        self.posts
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("post", id))
    }

    pub(crate) fn update_post(&mut self, post: &mut Post) -> Result<()> {
        let stored = self
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| StoreError::not_found("post", post.id))?;
        stored.title = post.title.clone();
        stored.content = post.content.clone();
        stored.tags = post.tags.clone();
        stored.updated_at = Utc::now();
        post.updated_at = stored.updated_at;
        Ok(())
    }

    pub(crate) fn delete_post(&mut self, id: i64) -> Result<()> {
        if self.posts.remove(&id).is_none() {
            return Err(StoreError::not_found("post", id));
        }
        self.comments.retain(|_, c| c.post_id != id);
        Ok(())
    }

    pub(crate) fn feed(&self, user_id: i64, query: &FeedQuery) -> Vec<PostWithMetadata> {
        let mut authors: HashSet<i64> = self
            .followers
            .keys()
            .filter(|(follower, _)| *follower == user_id)
            .map(|(_, followed)| *followed)
            .collect();
        authors.insert(user_id);

        let search = query.search_term().map(str::to_lowercase);

        let mut rows: Vec<PostWithMetadata> = self
            .posts
            .values()
            .filter(|p| authors.contains(&p.user_id))
            .filter(|p| match &search {
                Some(term) => {
                    p.title.to_lowercase().contains(term) || p.content.to_lowercase().contains(term)
                }
                None => true,
            })
            .filter(|p| query.tags.is_empty() || p.tags.iter().any(|t| query.tags.contains(t)))
            .filter(|p| query.since.map_or(true, |since| p.created_at >= since))
            .filter(|p| query.until.map_or(true, |until| p.created_at <= until))
            .filter_map(|p| {
                let author = self.users.get(&p.user_id)?;
                Some(PostWithMetadata {
                    post: p.clone(),
                    username: author.username.clone(),
                    comments_count: self.comments.values().filter(|c| c.post_id == p.id).count()
                        as i64,
                })
            })
            .collect();

        rows.sort_by(|a, b| {
            (a.post.created_at, a.post.id).cmp(&(b.post.created_at, b.post.id))
        });
        if query.sort == SortDirection::Desc {
            rows.reverse();
        }

        rows.into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect()
    }

    // ---- comments ------------------------------------------------------

    pub(crate) fn insert_comment(&mut self, comment: &mut Comment) -> Result<()> {
        if !self.posts.contains_key(&comment.post_id) {
            return Err(StoreError::MissingReference {
                resource: "comment",
                reference: "post",
                id: comment.post_id,
            });
        }
        let author = self
            .users
            .get(&comment.user_id)
            .ok_or(StoreError::MissingReference {
                resource: "comment",
                reference: "user",
                id: comment.user_id,
            })?;

        comment.id = self.next_comment_id;
        self.next_comment_id += 1;
        comment.created_at = Utc::now();
        comment.user = CommentAuthor {
            id: author.id,
            username: author.username.clone(),
        };
        self.comments.insert(comment.id, comment.clone());
        Ok(())
    }

    pub(crate) fn comments_for_post(&self, post_id: i64) -> Vec<Comment> {
        let mut comments: Vec<Comment> = self
            .comments
            .values()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));
        comments
    }

    // ---- followers -----------------------------------------------------

    pub(crate) fn follow(&mut self, follower_id: i64, followed_id: i64) -> Result<()> {
        for id in [follower_id, followed_id] {
            if !self.users.contains_key(&id) {
                return Err(StoreError::MissingReference {
                    resource: "follower",
                    reference: "user",
                    id,
                });
            }
        }
        if self.followers.contains_key(&(follower_id, followed_id)) {
            return Err(StoreError::conflict("follower", "edge"));
        }
        self.followers.insert((follower_id, followed_id), Utc::now());
        Ok(())
    }

    pub(crate) fn unfollow(&mut self, follower_id: i64, followed_id: i64) {
        self.followers.remove(&(follower_id, followed_id));
    }

    // ---- roles ---------------------------------------------------------

    pub(crate) fn role_by_name(&self, name: &str) -> Option<&Role> {
        self.roles.iter().find(|r| r.name == name)
    }

    // ---- counts (tests, seeding reports) -------------------------------

    pub(crate) fn invitation_count(&self) -> usize {
        self.invitations.len()
    }

    pub(crate) fn user_count(&self) -> usize {
        self.users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(state: &mut MemoryState, name: &str) -> User {
        let mut user = User::new(name, format!("{name}@example.com"));
        user.is_active = true;
        state.insert_user(&mut user).expect("insert user");
        user
    }

    #[test]
    fn unique_username_and_email() {
        let mut state = MemoryState::default();
        active(&mut state, "ann");

        let mut dup_name = User::new("ann", "other@example.com");
        assert!(matches!(
            state.insert_user(&mut dup_name).unwrap_err(),
            StoreError::Conflict { field: "username", .. }
        ));

        let mut dup_email = User::new("other", "ann@example.com");
        assert!(matches!(
            state.insert_user(&mut dup_email).unwrap_err(),
            StoreError::Conflict { field: "email", .. }
        ));
    }

    #[test]
    fn unknown_role_is_not_found() {
        let mut state = MemoryState::default();
        let mut user = User::new("x", "x@example.com");
        user.role.name = "superuser".into();
        assert!(state.insert_user(&mut user).unwrap_err().is_not_found());
    }

    #[test]
    fn deleting_post_cascades_to_comments() {
        let mut state = MemoryState::default();
        let author = active(&mut state, "ann");
        let mut post = Post::new(author.id, "t", "c", vec![]);
        state.insert_post(&mut post).expect("insert post");
        let mut comment = Comment::new(post.id, author.id, "hi");
        state.insert_comment(&mut comment).expect("insert comment");

        state.delete_post(post.id).expect("delete post");
        assert!(state.comments_for_post(post.id).is_empty());
    }

    #[test]
    fn deleting_user_cascades() {
        let mut state = MemoryState::default();
        let ann = active(&mut state, "ann");
        let bob = active(&mut state, "bob");
        state.follow(bob.id, ann.id).expect("follow");
        let mut post = Post::new(ann.id, "t", "c", vec![]);
        state.insert_post(&mut post).expect("insert post");

        state.delete_user(ann.id).expect("delete user");
        assert!(state.followers.is_empty());
        assert!(state.post(post.id).unwrap_err().is_not_found());
    }

    #[test]
    fn comment_requires_existing_post() {
        let mut state = MemoryState::default();
        let ann = active(&mut state, "ann");
        let mut comment = Comment::new(99, ann.id, "orphan");
        assert!(matches!(
            state.insert_comment(&mut comment).unwrap_err(),
            StoreError::MissingReference { reference: "post", .. }
        ));
    }
}
