// Kept in sync by hand with the cetane migrations in src/migrations.

diesel::table! {
    sc_profile (id) {
        id -> Integer,
        user_id -> BigInt,
        name -> Nullable<Text>,
        avatar -> Nullable<Text>,
        xq_user_id -> Nullable<BigInt>,
        xq_group_number -> Nullable<BigInt>,
        introduction -> Nullable<Text>,
        province -> Nullable<Text>,
        city -> Nullable<Text>,
        district -> Nullable<Text>,
        gender -> Nullable<Text>,
        follow_count -> BigInt,
        follower_count -> BigInt,
        mutual_follow_count -> BigInt,
        total_like_and_coin_count -> BigInt,
        is_navigator -> Bool,
        navigator_expire_time -> Nullable<Text>,
        date_expire -> Nullable<Text>,
        privacy_settings -> Nullable<Text>,
        follow_status -> BigInt,
        profile_json -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    sc_fans (id) {
        id -> Integer,
        union_user_id -> BigInt,
        xq_group_number -> Nullable<BigInt>,
        user_name -> Nullable<Text>,
        avatar -> Nullable<Text>,
        introduction -> Nullable<Text>,
        follow_status -> BigInt,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    sc_topic (id) {
        id -> Integer,
        topic_id -> Text,
        user_id -> Nullable<BigInt>,
        topic_json -> Text,
        topic_created_at -> Nullable<BigInt>,
        topic_created_dt -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    sc_activity (id) {
        id -> Integer,
        activity_id -> Text,
        name -> Nullable<Text>,
        activity_json -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    raw_pages (id) {
        id -> Integer,
        crawl -> Text,
        unique_key -> Text,
        url -> Text,
        status -> Integer,
        content -> Text,
        item_count -> Nullable<Integer>,
        fetched_at -> Text,
    }
}

diesel::table! {
    crawl_queue (unique_key) {
        unique_key -> Text,
        crawl -> Text,
        request -> Text,
        status -> Text,
        error -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(
    sc_profile,
    sc_fans,
    sc_topic,
    sc_activity,
    raw_pages,
    crawl_queue,
);
