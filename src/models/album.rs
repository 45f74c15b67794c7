use serde::{Deserialize, Serialize};

/// Fields are optional; whatever the client sends is stored as-is.
#[derive(Debug, Default, Deserialize)]
pub struct AlbumCreateRequest {
    pub titulo: Option<String>,
    pub categoria: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AlbumCreateResponse {
    pub id: i64,
    pub mensaje: String,
}

/// One entry of `/obtener-datos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumWithPhotos {
    pub id: i64,
    pub titulo: String,
    pub categoria: String,
    pub fotos: Vec<String>,
}
