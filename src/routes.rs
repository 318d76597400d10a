use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::QueryRejection},
    http::StatusCode,
    routing::get,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    AppState,
    entities::{actor, country, genre, language},
    error::{AppError, AppResult},
    models::{
        CountryOut, ListParams, MovieCreate, MovieDetail, MoviePage, MovieUpdate, ReferenceOut,
    },
    pagination::PageRequest,
    resolver,
};

const MOVIES_PATH: &str = "/movies/";

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(MOVIES_PATH, get(list_movies).post(create_movie))
        .route("/movies/{id}/", get(get_movie).patch(update_movie).delete(delete_movie))
        .route("/countries/", get(list_countries))
        .route("/genres/", get(list_genres))
        .route("/actors/", get(list_actors))
        .route("/languages/", get(list_languages))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}

fn today() -> jiff::civil::Date {
    jiff::Zoned::now().date()
}

pub async fn list_movies(
    State(state): State<Arc<AppState>>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> AppResult<Json<MoviePage>> {
    let Query(params) = params.map_err(|e| AppError::validation(e.body_text()))?;
    let req = PageRequest::new(params.page, params.per_page)?;
    Ok(Json(state.catalog.list(req, MOVIES_PATH).await?))
}

pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<Json<MovieDetail>> {
    Ok(Json(state.catalog.get(id).await?))
}

pub async fn create_movie(
    State(state): State<Arc<AppState>>,
    Json(input): Json<MovieCreate>,
) -> AppResult<(StatusCode, Json<MovieDetail>)> {
    let movie = state.catalog.create(input, today()).await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn update_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(changes): Json<MovieUpdate>,
) -> AppResult<Json<MovieDetail>> {
    Ok(Json(state.catalog.update(id, changes, today()).await?))
}

pub async fn delete_movie(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> AppResult<StatusCode> {
    state.catalog.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_countries(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<CountryOut>>> {
    let rows = resolver::list_all::<country::Entity, _>(state.catalog.db()).await?;
    Ok(Json(rows.into_iter().map(|c| CountryOut { code: c.code, name: c.name }).collect()))
}

pub async fn list_genres(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<ReferenceOut>>> {
    let rows = resolver::list_all::<genre::Entity, _>(state.catalog.db()).await?;
    Ok(Json(rows.into_iter().map(|r| ReferenceOut { id: r.id, name: r.name }).collect()))
}

pub async fn list_actors(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<ReferenceOut>>> {
    let rows = resolver::list_all::<actor::Entity, _>(state.catalog.db()).await?;
    Ok(Json(rows.into_iter().map(|r| ReferenceOut { id: r.id, name: r.name }).collect()))
}

pub async fn list_languages(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<ReferenceOut>>> {
    let rows = resolver::list_all::<language::Entity, _>(state.catalog.db()).await?;
    Ok(Json(rows.into_iter().map(|r| ReferenceOut { id: r.id, name: r.name }).collect()))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, to_bytes},
        http::{Request, Response},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::{catalog::Catalog, db};

    async fn app() -> Router {
        router(Arc::new(AppState { catalog: Catalog::new(db::memory().await) }))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> Response<Body> {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(v.to_string())
            },
            None => Body::empty(),
        };
        app.clone().oneshot(req.body(body).unwrap()).await.unwrap()
    }

    async fn json_body(resp: Response<Body>) -> Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn heat() -> Value {
        json!({
            "name": "Heat",
            "release_date": "1995-12-15",
            "score": 82,
            "overview": "A group of professional bank robbers.",
            "status": "Released",
            "budget": 60000000,
            "revenue": 187436818,
            "country": "usa",
            "genres": ["Crime", "Drama"],
            "actors": ["Al Pacino"],
            "languages": ["English"]
        })
    }

    #[tokio::test]
    async fn movie_lifecycle() {
        let app = app().await;

        let resp = send(&app, "POST", "/movies/", Some(heat())).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created = json_body(resp).await;
        let id = created["id"].as_i64().unwrap();
        assert_eq!(created["country"]["code"], "USA");
        assert_eq!(created["genres"], json!(["Crime", "Drama"]));

        let resp = send(&app, "POST", "/movies/", Some(heat())).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert!(json_body(resp).await["detail"].is_string());

        let resp = send(&app, "GET", &format!("/movies/{id}/"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json_body(resp).await, created);

        let resp =
            send(&app, "PATCH", &format!("/movies/{id}/"), Some(json!({ "score": 88.5 }))).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let updated = json_body(resp).await;
        assert_eq!(updated["score"], 88.5);
        assert_eq!(updated["name"], "Heat");

        let resp = send(&app, "DELETE", &format!("/movies/{id}/"), None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = send(&app, "GET", &format!("/movies/{id}/"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&app, "DELETE", &format!("/movies/{id}/"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&app, "GET", "/genres/", None).await;
        let genres = json_body(resp).await;
        assert_eq!(genres.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn validation_errors_are_unprocessable() {
        let app = app().await;

        let mut bad = heat();
        bad["score"] = json!(101);
        let resp = send(&app, "POST", "/movies/", Some(bad)).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = send(&app, "GET", "/movies/?per_page=21", None).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = send(&app, "GET", "/movies/?page=0", None).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let resp = send(&app, "GET", "/movies/?page=abc", None).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn list_with_links() {
        let app = app().await;

        let resp = send(&app, "GET", "/movies/", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        for name in ["Heat", "Thief", "Collateral"] {
            let mut movie = heat();
            movie["name"] = json!(name);
            let resp = send(&app, "POST", "/movies/", Some(movie)).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let resp = send(&app, "GET", "/movies/?page=1&per_page=2", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let page = json_body(resp).await;
        assert_eq!(page["total_items"], 3);
        assert_eq!(page["total_pages"], 2);
        assert_eq!(page["previous"], Value::Null);
        assert_eq!(page["next"], "/movies/?page=2&per_page=2");
        assert_eq!(page["items"][0]["name"], "Collateral");
        assert_eq!(page["items"][1]["name"], "Thief");

        let resp = send(&app, "GET", "/movies/?page=2&per_page=2", None).await;
        let page = json_body(resp).await;
        assert_eq!(page["items"].as_array().unwrap().len(), 1);
        assert_eq!(page["previous"], "/movies/?page=1&per_page=2");
        assert_eq!(page["next"], Value::Null);

        let resp = send(&app, "GET", "/movies/?page=3&per_page=2", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(&app, "GET", "/countries/", None).await;
        assert_eq!(
            json_body(resp).await,
            json!([{ "code": "USA", "name": "United States of America" }])
        );
    }
}
