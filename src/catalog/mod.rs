//! Album and photo records.
//!
//! Albums list newest first. Photos within an album keep insertion order.

use std::collections::HashMap;

use rusqlite::ErrorCode;

use crate::database::{execute_query, fetch_all, fetch_one, insert_returning_id, queries, DbConn};
use crate::error::{AppError, AppResult};
use crate::models::{AlbumWithPhotos, PhotoRecord};

/// Insert an album and return its id. Missing fields are stored as empty text.
pub fn create_album(conn: &DbConn, titulo: Option<&str>, categoria: Option<&str>) -> AppResult<i64> {
    let titulo = titulo.unwrap_or_default();
    let categoria = categoria.unwrap_or_default();

    insert_returning_id(conn, queries::albums::INSERT, &[&titulo, &categoria])
}

pub fn album_exists(conn: &DbConn, album_id: i64) -> AppResult<bool> {
    let found = fetch_one(conn, queries::albums::CHECK_EXISTS, &[&album_id], |row| {
        row.get::<_, i64>(0)
    })?;
    Ok(found.is_some())
}

/// Record a stored photo against `album_id`.
///
/// Fails with `UnknownAlbum` and writes nothing if the album does not exist.
pub fn add_photo(
    conn: &DbConn,
    album_id: i64,
    url: &str,
    original_key: Option<&str>,
) -> AppResult<i64> {
    if !album_exists(conn, album_id)? {
        return Err(AppError::UnknownAlbum(album_id));
    }

    insert_returning_id(
        conn,
        queries::photos::INSERT,
        &[&album_id, &url, &original_key],
    )
    .map_err(|e| match e {
        AppError::Database(rusqlite::Error::SqliteFailure(err, _))
            if err.code == ErrorCode::ConstraintViolation =>
        {
            AppError::UnknownAlbum(album_id)
        }
        other => other,
    })
}

pub fn get_photo(conn: &DbConn, photo_id: i64) -> AppResult<Option<PhotoRecord>> {
    fetch_one(conn, queries::photos::SELECT_BY_ID, &[&photo_id], |row| {
        Ok(PhotoRecord {
            id: row.get(0)?,
            album_id: row.get(1)?,
            url: row.get(2)?,
            original_key: row.get(3)?,
        })
    })
}

/// Every album, newest id first, each with its photo URLs in insertion order.
pub fn list_albums(conn: &DbConn) -> AppResult<Vec<AlbumWithPhotos>> {
    let mut albums = fetch_all(conn, queries::albums::SELECT_ALL, &[], |row| {
        Ok(AlbumWithPhotos {
            id: row.get(0)?,
            titulo: row.get(1)?,
            categoria: row.get(2)?,
            fotos: Vec::new(),
        })
    })?;

    let photos = fetch_all(conn, queries::photos::SELECT_ALL_URLS, &[], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut by_album: HashMap<i64, Vec<String>> = HashMap::new();
    for (album_id, url) in photos {
        by_album.entry(album_id).or_default().push(url);
    }

    for album in &mut albums {
        if let Some(urls) = by_album.remove(&album.id) {
            album.fotos = urls;
        }
    }

    Ok(albums)
}

/// Delete an album and, through the cascade, its photos. Not exposed over HTTP.
pub fn delete_album(conn: &DbConn, album_id: i64) -> AppResult<bool> {
    let removed = execute_query(conn, queries::albums::DELETE, &[&album_id])?;
    Ok(removed > 0)
}
