use lambda_http::{
    http::{header::HeaderValue, Method, StatusCode},
    Body, Error, Request, RequestExt, Response,
};
use std::sync::Arc;

use vst_atoms::web::{method_not_allowed, not_found};
use vst_atoms::{cards, gallery};
use vst_shared::{contact, upload_signature, AppState};

fn with_cors_headers(mut resp: Response<Body>, allowed_origin: &str) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert(
        "Access-Control-Allow-Origin",
        HeaderValue::from_str(allowed_origin).unwrap_or_else(|_| HeaderValue::from_static("*")),
    );
    headers.insert(
        "Access-Control-Allow-Methods",
        HeaderValue::from_static("GET,POST,DELETE,OPTIONS"),
    );
    headers.insert(
        "Access-Control-Allow-Headers",
        HeaderValue::from_static("Content-Type,Authorization"),
    );
    resp
}

/// Main Lambda handler - routes requests to the gallery, card, upload and contact endpoints
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path().trim_end_matches('/');
    tracing::info!("🚀 API Lambda invoked - Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if *method == Method::OPTIONS {
        let resp = Response::builder()
            .status(StatusCode::OK)
            .body(Body::Empty)
            .map_err(Box::new)?;
        return Ok(with_cors_headers(resp, &state.config.allowed_origin));
    }

    let resp = route(&event, &state).await?;
    Ok(with_cors_headers(resp, &state.config.allowed_origin))
}

async fn route(event: &Request, state: &AppState) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path().trim_end_matches('/');
    let body: &[u8] = event.body().as_ref();
    let store = state.store.as_ref();
    let config = &state.config;
    let query = event.query_string_parameters();

    match path {
        "/api/event-photos" => {
            let doc_key = config.gallery_document_key.as_str();
            match *method {
                Method::GET => gallery::get_gallery_handler(store, doc_key, query.first("view")).await,
                Method::POST => {
                    gallery::post_gallery_handler(store, doc_key, event.headers(), body).await
                }
                Method::DELETE => gallery::delete_gallery_handler(store, doc_key, body).await,
                _ => method_not_allowed(),
            }
        }
        "/api/home-cards" => {
            let doc_key = config.cards_document_key.as_str();
            match *method {
                Method::GET => cards::get_cards_handler(store, doc_key).await,
                Method::POST => cards::post_card_handler(store, doc_key, event.headers(), body).await,
                Method::DELETE => cards::delete_card_handler(store, doc_key, body).await,
                _ => method_not_allowed(),
            }
        }
        "/api/upload-signature" => match *method {
            Method::GET => {
                upload_signature::handle_upload_signature(
                    store,
                    config.upload_url_ttl,
                    query.first("folder"),
                    query.first("fileName"),
                    query.first("contentType"),
                )
                .await
            }
            _ => method_not_allowed(),
        },
        "/api/contact" => match *method {
            Method::POST => {
                contact::handle_contact(
                    state.mailer.as_ref(),
                    config.contact_to_address.as_deref(),
                    config.contact_from_address.as_deref(),
                    body,
                )
                .await
            }
            _ => method_not_allowed(),
        },
        _ => {
            tracing::info!("No route for {} {}", method, path);
            not_found()
        }
    }
}
