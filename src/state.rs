use std::sync::Arc;

use crate::{
    db::{DbPool, OrmConn, orm_from_pool},
    notify::{LogSink, NotificationSink},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub orm: OrmConn,
    pub notifier: Arc<dyn NotificationSink>,
    pub jwt_secret: Arc<str>,
}

impl AppState {
    /// State backed by one pool, publishing order events to the log.
    pub fn new(pool: DbPool, jwt_secret: &str) -> Self {
        Self::with_notifier(pool, jwt_secret, Arc::new(LogSink))
    }

    pub fn with_notifier(
        pool: DbPool,
        jwt_secret: &str,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            orm: orm_from_pool(pool.clone()),
            pool,
            notifier,
            jwt_secret: Arc::from(jwt_secret),
        }
    }
}
