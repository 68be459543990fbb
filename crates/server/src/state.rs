use sqlx::PgPool;

pub struct AppState {
    pub pool: PgPool,
    pub config: roster_core::Config,
}
