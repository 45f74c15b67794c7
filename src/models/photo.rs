use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    pub id: i64,
    pub album_id: i64,
    pub url: String,
    pub original_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PhotoUploadResponse {
    pub mensaje: String,
    pub url: String,
}
