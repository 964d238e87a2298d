// Fileserver hit counter, owned by the application state.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

#[derive(Debug, Default)]
pub struct FileserverHits {
    hits: AtomicU64,
}

impl FileserverHits {
    pub fn increment(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
    }
}

pub async fn count_fileserver_hits(
    State(hits): State<Arc<FileserverHits>>,
    request: Request,
    next: Next,
) -> Response {
    hits.increment();
    next.run(request).await
}
