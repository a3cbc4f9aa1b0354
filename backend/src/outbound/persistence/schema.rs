//! Diesel table definitions.
//!
//! These must match `backend/migrations` exactly; regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Uuid,
        /// Unique, case-sensitive handle.
        username -> Varchar,
        /// Optional unique contact address.
        email -> Nullable<Varchar>,
        /// Argon2id PHC string.
        password_hash -> Text,
        avatar -> Nullable<Text>,
        verified -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// `follower_id` follows `followed_id`.
    follows (follower_id, followed_id) {
        follower_id -> Uuid,
        followed_id -> Uuid,
    }
}

diesel::table! {
    /// `user_id` voted on `post_id`.
    votes (user_id, post_id) {
        user_id -> Uuid,
        post_id -> Uuid,
    }
}

diesel::table! {
    posts (id) {
        id -> Uuid,
        author_id -> Uuid,
        content -> Text,
        /// Public URL of the uploaded image.
        image_url -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    comments (id) {
        id -> Uuid,
        post_id -> Uuid,
        author_id -> Uuid,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(posts -> users (author_id));
diesel::joinable!(comments -> users (author_id));
diesel::joinable!(comments -> posts (post_id));
diesel::joinable!(votes -> posts (post_id));
diesel::joinable!(votes -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, follows, votes, posts, comments);
