// Diesel schema for the booking tables (same layout on SQLite and Postgres).

diesel::table! {
    artists (id) {
        id -> Integer,
        name -> Text,
        city -> Text,
        state -> Text,
        phone -> Text,
        genres -> Text,
        facebook_link -> Nullable<Text>,
        image_link -> Nullable<Text>,
        website -> Nullable<Text>,
        seeking_venue -> Bool,
        description -> Nullable<Text>,
    }
}

diesel::table! {
    shows (id) {
        id -> Integer,
        artist_id -> Integer,
        venue_id -> Integer,
        start_time -> Timestamp,
    }
}

diesel::table! {
    venues (id) {
        id -> Integer,
        name -> Text,
        city -> Text,
        state -> Text,
        address -> Nullable<Text>,
        phone -> Text,
        genres -> Text,
        facebook_link -> Nullable<Text>,
        image_link -> Nullable<Text>,
        website -> Nullable<Text>,
        seeking_talent -> Bool,
        description -> Nullable<Text>,
    }
}

diesel::joinable!(shows -> artists (artist_id));
diesel::joinable!(shows -> venues (venue_id));

diesel::allow_tables_to_appear_in_same_query!(artists, shows, venues,);
