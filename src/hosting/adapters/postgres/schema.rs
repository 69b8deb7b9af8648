//! Diesel schema for hosting persistence.

diesel::table! {
    /// Hosting machines.
    hosts (name) {
        /// Unique network name.
        #[max_length = 255]
        name -> Varchar,
        /// Whether the host accepts new servers.
        enabled -> Bool,
        /// Inclusive lower port bound.
        min_port -> Int4,
        /// Exclusive upper port bound.
        max_port -> Int4,
        /// Maximum number of servers on the host.
        server_limit -> Int4,
    }
}

diesel::table! {
    /// Versioned container image configurations.
    server_types (id) {
        /// Internal identifier.
        id -> Uuid,
        /// Display name, unique together with `version`.
        #[max_length = 255]
        name -> Varchar,
        /// Version label.
        #[max_length = 255]
        version -> Varchar,
        /// Container image reference.
        #[max_length = 255]
        docker_image -> Varchar,
        /// Ordered environment entries as JSONB.
        environment -> Jsonb,
        /// Whether the type may be chosen for new servers.
        enabled -> Bool,
    }
}

diesel::table! {
    /// Provisioned servers.
    servers (id) {
        /// Internal identifier.
        id -> Uuid,
        /// Unique server and container name.
        #[max_length = 32]
        name -> Varchar,
        /// Owning account username.
        #[max_length = 150]
        owner -> Varchar,
        /// Host the server lives on.
        #[max_length = 255]
        host_name -> Varchar,
        /// Assigned port, unique together with `host_name`.
        port -> Int4,
        /// Server type identifier.
        server_type_id -> Uuid,
        /// Game mode code.
        game_type -> Int4,
        /// Operator allow-list as a JSONB array.
        operators -> Jsonb,
        /// Lifecycle state (`created`, `running`, `restarting`).
        #[max_length = 50]
        lifecycle_state -> Varchar,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(servers -> hosts (host_name));
diesel::joinable!(servers -> server_types (server_type_id));

diesel::allow_tables_to_appear_in_same_query!(hosts, server_types, servers);
