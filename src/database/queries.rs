pub mod albums {
    pub const INSERT: &str = r#"
    INSERT INTO albums (titulo, categoria)
    VALUES (?, ?)
    "#;

    pub const CHECK_EXISTS: &str = r#"
    SELECT id
      FROM albums
     WHERE id = ?
    "#;

    pub const SELECT_ALL: &str = r#"
    SELECT id
         , titulo
         , categoria
      FROM albums
     ORDER BY id DESC
    "#;

    pub const DELETE: &str = r#"
    DELETE FROM albums
     WHERE id = ?
    "#;
}

pub mod photos {
    pub const INSERT: &str = r#"
    INSERT INTO photos (album_id, url, original_key)
    VALUES (?, ?, ?)
    "#;

    pub const SELECT_ALL_URLS: &str = r#"
    SELECT album_id
         , url
      FROM photos
     ORDER BY album_id, id ASC
    "#;

    pub const SELECT_BY_ID: &str = r#"
    SELECT id
         , album_id
         , url
         , original_key
      FROM photos
     WHERE id = ?
    "#;
}

pub mod sessions {
    pub const INSERT: &str = r#"
    INSERT INTO sessions (token_hash, is_admin, expires_at)
    VALUES (?, ?, ?)
    "#;

    pub const SELECT_ACTIVE: &str = r#"
    SELECT is_admin
      FROM sessions
     WHERE token_hash = ?
       AND expires_at > ?
    "#;

    pub const DELETE: &str = r#"
    DELETE FROM sessions
     WHERE token_hash = ?
    "#;

    pub const DELETE_EXPIRED: &str = r#"
    DELETE FROM sessions
     WHERE expires_at <= ?
    "#;
}
