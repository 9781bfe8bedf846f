pub mod core {
    pub mod config;
    pub mod error;
    pub mod routes;
    pub mod startup;
    pub mod state;
    pub mod tracing_init;
}

pub mod models {
    pub mod event;
    pub mod log;
    pub mod registration;
    pub mod requests;
    pub mod user;
}

pub mod stores {
    pub mod event_store;
    pub mod log_store;
    pub mod registration_store;
    pub mod user_store;
}

pub mod ledger {
    pub mod ledger;
    pub mod votes;
}

pub mod badges {
    pub mod rules;
}

pub mod wal {
    pub mod wal;
}

pub mod metrics {
    pub mod collector;
}

pub mod validation {
    pub mod params;
}

pub mod utils {
    pub mod auth;
    pub mod time;
}

pub mod handlers {
    pub mod events;
    pub mod fallback;
    pub mod health;
    pub mod logs;
    pub mod metrics;
    pub mod payment;
    pub mod users;
    pub mod votes;
}

pub mod api {
    pub mod client;
    pub mod render;
    pub mod view_cache;
}
