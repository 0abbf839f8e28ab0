use diesel::{allow_tables_to_appear_in_same_query, joinable, table};

table! {
    users (id) {
        id -> BigInt,
        email -> Text,
        display_name -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

table! {
    inventory_items (id) {
        id -> BigInt,
        user_id -> BigInt,
        name -> Text,
        quantity -> Integer,
        category -> Nullable<Text>,
        purchase_date -> Date,
        expiry_date -> Date,
        storage_location -> Nullable<Text>,
        status -> Text,
        consumed_at -> Nullable<Timestamptz>,
        estimated_value -> Nullable<Double>,
        created_at -> Timestamptz,
    }
}

table! {
    expiration_settings (user_id) {
        user_id -> BigInt,
        first_alert_days -> Integer,
        second_alert_days -> Integer,
        email_enabled -> Bool,
        push_enabled -> Bool,
        alert_on_expiry_day -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    expiration_records (id) {
        id -> BigInt,
        inventory_item_id -> BigInt,
        reminder_days_before -> Integer,
        reminder_date -> Date,
        status -> Text,
        notified -> Bool,
        created_at -> Timestamptz,
    }
}

table! {
    donation_centers (id) {
        id -> BigInt,
        name -> Text,
        center_type -> Text,
        address -> Nullable<Text>,
        city -> Nullable<Text>,
        state -> Nullable<Text>,
        latitude -> Double,
        longitude -> Double,
        phone_number -> Nullable<Text>,
        email -> Nullable<Text>,
        opening_hours -> Nullable<Text>,
        accepted_items -> Nullable<Text>,
        website -> Nullable<Text>,
        is_active -> Bool,
        created_at -> Timestamptz,
    }
}

joinable!(inventory_items -> users (user_id));
joinable!(expiration_settings -> users (user_id));
joinable!(expiration_records -> inventory_items (inventory_item_id));

allow_tables_to_appear_in_same_query!(
    users,
    inventory_items,
    expiration_settings,
    expiration_records,
    donation_centers,
);
