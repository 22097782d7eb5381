use crate::config::AppConfig;
use crate::services::media::uploader::MediaUploader;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse, Responder};
use futures_util::StreamExt;

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    mut payload: Multipart,
) -> impl Responder {
    let mut image: Option<(Vec<u8>, String)> = None;

    while let Some(item) = payload.next().await {
        let mut field = match item {
            Ok(field) => field,
            Err(e) => return HttpResponse::BadRequest().body(format!("Error: {}", e)),
        };
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()));
        if name.as_deref() != Some("image") {
            continue;
        }
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
            .unwrap_or_else(|| "image".to_string());

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            match chunk {
                Ok(chunk) => bytes.extend_from_slice(&chunk),
                Err(e) => return HttpResponse::BadRequest().body(format!("Error: {}", e)),
            }
        }
        image = Some((bytes, filename));
    }

    let Some((bytes, filename)) = image else {
        return HttpResponse::BadRequest().body("Missing image");
    };

    let uploader = match MediaUploader::from_config(&config) {
        Ok(uploader) => uploader,
        Err(e) => return HttpResponse::ServiceUnavailable().body(e.to_string()),
    };
    match uploader.upload(bytes, &filename).await {
        Ok(url) => HttpResponse::Ok().json(serde_json::json!({ "url": url })),
        Err(e) => HttpResponse::BadGateway().body(format!("Failed to upload image: {}", e)),
    }
}
