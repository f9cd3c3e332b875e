//! Image Upload Handler
//!
//! Product image uploads. Accepts PNG/JPEG/WebP, recompresses to JPEG and
//! names the file by content hash, which deduplicates re-uploads for free.

use axum::Json;
use axum::extract::{Multipart, State};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::io::Cursor;

use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// Maximum file size (5MB)
const MAX_FILE_SIZE: usize = 5 * 1024 * 1024;

/// Supported input formats
const SUPPORTED_FORMATS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// JPEG quality for product images
const JPEG_QUALITY: u8 = 85;

/// Upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub original_name: String,
    pub size: usize,
    pub url: String,
}

/// POST /api/admin/uploads/products - upload a product image
pub async fn upload_product_image(
    State(state): State<ServerState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut file_data: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != "image" && name != "file" {
            continue;
        }

        let original_name = field.file_name().unwrap_or("upload").to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::validation(format!("Failed to read upload: {}", e)))?;
        file_data = Some((original_name, data.to_vec()));
        break;
    }

    let Some((original_name, data)) = file_data else {
        return Err(AppError::validation("No image field in request"));
    };

    validate_image(&data, &original_name)?;

    let compressed = recompress_to_jpeg(&data)?;

    // Content-hash filename: identical uploads collapse to one file
    let hash = {
        let mut hasher = Sha256::new();
        hasher.update(&compressed);
        hex::encode(hasher.finalize())
    };
    let filename = format!("{}.jpg", &hash[..16]);

    let dir = state.config.uploads_dir().join("products");
    std::fs::create_dir_all(&dir)
        .map_err(|e| AppError::internal(format!("Failed to create upload dir: {}", e)))?;
    let path = dir.join(&filename);
    let size = compressed.len();
    if !path.exists() {
        std::fs::write(&path, &compressed)
            .map_err(|e| AppError::internal(format!("Failed to store upload: {}", e)))?;
    }

    tracing::info!(file = %filename, size, "product image uploaded");

    Ok(Json(UploadResponse {
        url: format!("/uploads/products/{}", filename),
        filename,
        original_name,
        size,
    }))
}

/// Validate size and format before decoding
fn validate_image(data: &[u8], original_name: &str) -> AppResult<()> {
    if data.is_empty() {
        return Err(AppError::validation("Empty upload"));
    }
    if data.len() > MAX_FILE_SIZE {
        return Err(AppError::validation(format!(
            "File too large. Maximum size is {}MB",
            MAX_FILE_SIZE / 1024 / 1024
        )));
    }

    let ext = std::path::Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();
    if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
        // Fall back to content sniffing when the name gives nothing away
        let guessed = mime_guess::from_path(original_name).first_or_octet_stream();
        if guessed.type_() != mime_guess::mime::IMAGE {
            return Err(AppError::validation(format!(
                "Unsupported format '{}'. Allowed: {}",
                ext,
                SUPPORTED_FORMATS.join(", ")
            )));
        }
    }

    Ok(())
}

/// Decode and re-encode as JPEG with fixed quality
fn recompress_to_jpeg(data: &[u8]) -> AppResult<Vec<u8>> {
    let img = image::load_from_memory(data)
        .map_err(|e| AppError::validation(format!("Invalid image: {}", e)))?;

    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let rgb_img = img.to_rgb8();
        let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
        rgb_img
            .write_with_encoder(encoder)
            .map_err(|e| AppError::internal(format!("Failed to compress image: {}", e)))?;
    }

    Ok(buffer)
}
