//! Esquema Diesel (generado manualmente). Reemplazable con `diesel print-schema`.

diesel::table! {
    artifacts (id) {
        id -> Uuid,
        owner_id -> Uuid,
        title -> Nullable<Text>,
        prompt -> Nullable<Text>,
        doc -> Jsonb,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}
