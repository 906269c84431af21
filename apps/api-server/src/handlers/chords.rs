//! Chord handlers: browsing, authoring and diagrams.

use actix_web::{HttpResponse, http::header, web};
use uuid::Uuid;

use notepad_core::PageRequest;
use notepad_core::domain::{ChordChanges, NewChord};
use notepad_core::ports::ChordFilter;
use notepad_core::services::ChordService;
use notepad_shared::dto::{
    ChordDiagramResponse, ChordListQuery, CreateChordRequest, PreviewQuery, UpdateChordRequest,
};

use super::convert::{chord_response, diagram_response, paged};
use crate::middleware::auth::CurrentUser;
use crate::middleware::error::AppResult;
use crate::state::AppState;

const SVG_CONTENT_TYPE: &str = "image/svg+xml";

/// GET /api/chords?page=&page_size=&search=&author_id=
pub async fn list(
    state: web::Data<AppState>,
    query: web::Query<ChordListQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let filter = ChordFilter {
        search: query.search,
        author_id: query.author_id,
    };

    let page = state
        .chords
        .list(&filter, PageRequest::new(query.page, query.page_size))
        .await?;

    Ok(HttpResponse::Ok().json(paged(page, |chord| chord_response(&chord))))
}

/// POST /api/chords
pub async fn create(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    body: web::Json<CreateChordRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let chord = state
        .chords
        .create(
            &user,
            NewChord {
                name: req.name,
                fingering: req.fingering,
                description: req.description,
            },
        )
        .await?;

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, format!("/api/chords/{}", chord.id)))
        .json(chord_response(&chord)))
}

/// GET /api/chords/preview?fingering=
pub async fn preview(query: web::Query<PreviewQuery>) -> AppResult<HttpResponse> {
    let diagram = ChordService::preview(&query.fingering)?;
    Ok(HttpResponse::Ok().json(diagram_response(&diagram)))
}

/// GET /api/chords/{id}
pub async fn get(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let chord = state.chords.get(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(chord_response(&chord)))
}

/// PUT /api/chords/{id}
pub async fn update(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<Uuid>,
    body: web::Json<UpdateChordRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let chord = state
        .chords
        .update(
            &user,
            path.into_inner(),
            ChordChanges {
                name: req.name,
                fingering: req.fingering,
                description: req.description,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(chord_response(&chord)))
}

/// DELETE /api/chords/{id}
pub async fn delete(
    state: web::Data<AppState>,
    CurrentUser(user): CurrentUser,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.chords.delete(&user, path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/chords/{id}/diagram
pub async fn diagram(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let (chord, diagram) = state.chords.diagram(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ChordDiagramResponse {
        chord: chord_response(&chord),
        diagram: diagram_response(&diagram),
    }))
}

/// GET /api/chords/{id}/diagram.svg
pub async fn diagram_svg(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let (chord, diagram) = state.chords.diagram(path.into_inner()).await?;

    Ok(HttpResponse::Ok()
        .content_type(SVG_CONTENT_TYPE)
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .body(diagram.to_svg(Some(chord.name.as_str()))))
}
