use axum::{extract::State, http::StatusCode, response::Html};

use super::AppState;

pub(crate) async fn metrics(State(state): State<AppState>) -> Html<String> {
    Html(format!(
        "<html>\n  <body>\n    <h1>Welcome, Chirpy Admin</h1>\n    <p>Chirpy has been visited {} times!</p>\n  </body>\n</html>\n",
        state.hits.get()
    ))
}

pub(crate) async fn reset(State(state): State<AppState>) -> StatusCode {
    state.hits.reset();
    tracing::info!("fileserver hit counter reset");
    StatusCode::OK
}
