use jiff::civil::Date;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    LoaderTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use tracing::{debug, info};

use crate::{
    entities::{actor, country, genre, language, movie, movie_actor, movie_genre, movie_language},
    error::{AppError, AppResult},
    models::{CountryOut, MovieCreate, MovieDetail, MoviePage, MovieSummary, MovieUpdate},
    pagination::{self, PageRequest},
    resolver,
};

/// Owns every read and write of movie rows and their associations.
#[derive(Clone)]
pub struct Catalog {
    db: DatabaseConnection,
}

impl Catalog {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn create(&self, input: MovieCreate, today: Date) -> AppResult<MovieDetail> {
        let input = input.validate(today)?;
        let release_date = input.release_date.to_string();

        let txn = self.db.begin().await?;

        ensure_unique(&txn, &input.name, &release_date, None).await?;

        let country = resolver::lookup_or_create::<country::Entity, _>(&txn, &input.country).await?;
        let genres = resolver::lookup_or_create_all::<genre::Entity, _>(&txn, &input.genres).await?;
        let actors = resolver::lookup_or_create_all::<actor::Entity, _>(&txn, &input.actors).await?;
        let languages =
            resolver::lookup_or_create_all::<language::Entity, _>(&txn, &input.languages).await?;

        let movie = movie::ActiveModel {
            id: Default::default(),
            name: Set(input.name),
            release_date: Set(release_date),
            score: Set(input.score),
            overview: Set(input.overview),
            status: Set(input.status),
            budget: Set(input.budget),
            revenue: Set(input.revenue),
            country_id: Set(country.id),
        }
        .insert(&txn)
        .await
        .map_err(duplicate_as_conflict)?;

        if !genres.is_empty() {
            movie_genre::Entity::insert_many(genres.iter().map(|g| movie_genre::ActiveModel {
                movie_id: Set(movie.id),
                genre_id: Set(g.id),
            }))
            .exec_without_returning(&txn)
            .await?;
        }

        if !actors.is_empty() {
            movie_actor::Entity::insert_many(actors.iter().map(|a| movie_actor::ActiveModel {
                movie_id: Set(movie.id),
                actor_id: Set(a.id),
            }))
            .exec_without_returning(&txn)
            .await?;
        }

        if !languages.is_empty() {
            movie_language::Entity::insert_many(languages.iter().map(|l| {
                movie_language::ActiveModel { movie_id: Set(movie.id), language_id: Set(l.id) }
            }))
            .exec_without_returning(&txn)
            .await?;
        }

        txn.commit().await?;

        info!(movie_id = movie.id, name = %movie.name, "created movie");

        to_detail(movie, Some(country), genres, actors, languages)
    }

    pub async fn get(&self, id: i32) -> AppResult<MovieDetail> {
        let txn = self.db.begin().await?;

        let movie = find_movie(&txn, id).await?;
        let detail = load_details(&txn, vec![movie]).await?.pop();

        txn.commit().await?;

        detail.ok_or_else(|| not_found(id))
    }

    /// Movies newest-first, one page at a time. An empty or out-of-range
    /// page is reported as not found.
    pub async fn list(&self, req: PageRequest, collection_path: &str) -> AppResult<MoviePage> {
        let txn = self.db.begin().await?;

        let total_items = movie::Entity::find().count(&txn).await?;
        let links = pagination::links(collection_path, req, total_items);

        if req.page > links.total_pages {
            debug!(page = req.page, total_pages = links.total_pages, "page out of range");
            return Err(AppError::NotFound("no movies found".to_string()));
        }

        let movies = movie::Entity::find()
            .order_by_desc(movie::Column::Id)
            .offset(req.offset())
            .limit(req.per_page)
            .all(&txn)
            .await?;
        if movies.is_empty() {
            return Err(AppError::NotFound("no movies found".to_string()));
        }

        let items = load_details(&txn, movies).await?.into_iter().map(MovieSummary::from).collect();

        txn.commit().await?;

        Ok(MoviePage { items, page: req.page, per_page: req.per_page, total_items, links })
    }

    pub async fn update(
        &self,
        id: i32,
        changes: MovieUpdate,
        today: Date,
    ) -> AppResult<MovieDetail> {
        let changes = changes.validate(today)?;

        let txn = self.db.begin().await?;

        let current = find_movie(&txn, id).await?;

        if changes.name.is_some() || changes.release_date.is_some() {
            let name = changes.name.as_deref().unwrap_or(&current.name);
            let release_date = changes
                .release_date
                .map(|d| d.to_string())
                .unwrap_or_else(|| current.release_date.clone());
            ensure_unique(&txn, name, &release_date, Some(id)).await?;
        }

        let movie = if changes.is_empty() {
            current
        } else {
            let mut active: movie::ActiveModel = current.into();
            if let Some(name) = changes.name {
                active.name = Set(name);
            }
            if let Some(release_date) = changes.release_date {
                active.release_date = Set(release_date.to_string());
            }
            if let Some(score) = changes.score {
                active.score = Set(score);
            }
            if let Some(overview) = changes.overview {
                active.overview = Set(overview);
            }
            if let Some(status) = changes.status {
                active.status = Set(status);
            }
            if let Some(budget) = changes.budget {
                active.budget = Set(budget);
            }
            if let Some(revenue) = changes.revenue {
                active.revenue = Set(revenue);
            }
            active.update(&txn).await.map_err(duplicate_as_conflict)?
        };

        let detail = load_details(&txn, vec![movie]).await?.pop();

        txn.commit().await?;

        info!(movie_id = id, "updated movie");

        detail.ok_or_else(|| not_found(id))
    }

    /// Removes the movie and its association rows. Shared reference rows stay.
    pub async fn delete(&self, id: i32) -> AppResult<()> {
        let txn = self.db.begin().await?;

        find_movie(&txn, id).await?;

        movie_genre::Entity::delete_many()
            .filter(movie_genre::Column::MovieId.eq(id))
            .exec(&txn)
            .await?;
        movie_actor::Entity::delete_many()
            .filter(movie_actor::Column::MovieId.eq(id))
            .exec(&txn)
            .await?;
        movie_language::Entity::delete_many()
            .filter(movie_language::Column::MovieId.eq(id))
            .exec(&txn)
            .await?;
        movie::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;

        info!(movie_id = id, "deleted movie");
        Ok(())
    }
}

async fn find_movie<C: ConnectionTrait>(conn: &C, id: i32) -> AppResult<movie::Model> {
    movie::Entity::find_by_id(id).one(conn).await?.ok_or_else(|| not_found(id))
}

async fn ensure_unique<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    release_date: &str,
    except: Option<i32>,
) -> AppResult<()> {
    let mut query = movie::Entity::find()
        .filter(movie::Column::Name.eq(name))
        .filter(movie::Column::ReleaseDate.eq(release_date));
    if let Some(id) = except {
        query = query.filter(movie::Column::Id.ne(id));
    }

    if let Some(existing) = query.one(conn).await? {
        debug!(
            existing_id = existing.id,
            name = %name,
            release_date = %release_date,
            "duplicate movie"
        );
        return Err(duplicate(name, release_date));
    }
    Ok(())
}

async fn load_details<C: ConnectionTrait>(
    conn: &C,
    movies: Vec<movie::Model>,
) -> AppResult<Vec<MovieDetail>> {
    let countries = movies.load_one(country::Entity, conn).await?;
    let genres = movies.load_many_to_many(genre::Entity, movie_genre::Entity, conn).await?;
    let actors = movies.load_many_to_many(actor::Entity, movie_actor::Entity, conn).await?;
    let languages =
        movies.load_many_to_many(language::Entity, movie_language::Entity, conn).await?;

    movies
        .into_iter()
        .zip(countries)
        .zip(genres.into_iter().zip(actors).zip(languages))
        .map(|((movie, country), ((genres, actors), languages))| {
            to_detail(movie, country, genres, actors, languages)
        })
        .collect()
}

fn to_detail(
    movie: movie::Model,
    country: Option<country::Model>,
    genres: Vec<genre::Model>,
    actors: Vec<actor::Model>,
    languages: Vec<language::Model>,
) -> AppResult<MovieDetail> {
    let country = country.ok_or_else(|| {
        AppError::Storage(anyhow::anyhow!("movie {} has no country {}", movie.id, movie.country_id))
    })?;

    Ok(MovieDetail {
        id: movie.id,
        release_date: movie.release_date.parse()?,
        name: movie.name,
        score: movie.score,
        overview: movie.overview,
        status: movie.status,
        budget: movie.budget,
        revenue: movie.revenue,
        country: CountryOut { code: country.code, name: country.name },
        genres: sorted(genres.into_iter().map(|g| g.name)),
        actors: sorted(actors.into_iter().map(|a| a.name)),
        languages: sorted(languages.into_iter().map(|l| l.name)),
    })
}

fn sorted(names: impl Iterator<Item = String>) -> Vec<String> {
    let mut names: Vec<_> = names.collect();
    names.sort();
    names
}

fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("movie {id} not found"))
}

fn duplicate(name: &str, release_date: &str) -> AppError {
    AppError::Conflict(format!("movie '{name}' released {release_date} already exists"))
}

/// A concurrent writer can slip the same (name, release date) past
/// `ensure_unique`; the unique index turns that into a conflict.
fn duplicate_as_conflict(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => {
            debug!(error = %msg, "movie insert rejected by unique index");
            AppError::Conflict("movie with this name and release date already exists".to_string())
        },
        _ => err.into(),
    }
}
