table! {
    posts (id) {
        id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        body -> Text,
        images -> Array<Text>,
        user_id -> Uuid,
    }
}

table! {
    users (id) {
        id -> Uuid,
        created_at -> Timestamptz,
        username -> Text,
        email -> Text,
        password_hash -> Text,
    }
}

table! {
    relationships (follower_id, followed_id) {
        follower_id -> Uuid,
        followed_id -> Uuid,
        created_at -> Timestamptz,
    }
}

table! {
    likes (user_id, post_id) {
        user_id -> Uuid,
        post_id -> Uuid,
        created_at -> Timestamptz,
    }
}

joinable!(posts -> users (user_id));
joinable!(likes -> posts (post_id));
allow_tables_to_appear_in_same_query!(posts, users, likes, relationships);
