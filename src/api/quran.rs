//! Surah and ayah lookup.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::routes::AppState;
use super::types::{RangeQuery, SearchQuery, SimilarQuery, SurahResponse};
use super::{quran_err, ApiError};
use crate::quran::{
    surah, AyahRef, AyahText, QuranError, SimilarAyah, DEFAULT_SIMILARITY_THRESHOLD, SURAHS,
};

const DEFAULT_LIMIT: usize = 20;
const MAX_LIMIT: usize = 100;

fn clamp_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT)
}

pub async fn list_surahs(State(state): State<Arc<AppState>>) -> Json<Vec<SurahResponse>> {
    Json(
        SURAHS
            .iter()
            .map(|info| SurahResponse {
                info: *info,
                text_available: state.corpus.is_loaded(info.number),
            })
            .collect(),
    )
}

pub async fn get_surah(
    State(state): State<Arc<AppState>>,
    Path(number): Path<u16>,
) -> Result<Json<SurahResponse>, ApiError> {
    let info = surah(number).ok_or_else(|| quran_err(QuranError::InvalidSurah(number)))?;
    Ok(Json(SurahResponse {
        info: *info,
        text_available: state.corpus.is_loaded(number),
    }))
}

pub async fn get_ayah(
    State(state): State<Arc<AppState>>,
    Path((surah_number, ayah)): Path<(u16, u16)>,
) -> Result<Json<AyahText>, ApiError> {
    state
        .corpus
        .ayah(AyahRef::new(surah_number, ayah))
        .map(Json)
        .map_err(quran_err)
}

pub async fn get_ayah_range(
    State(state): State<Arc<AppState>>,
    Path(surah_number): Path<u16>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<AyahText>>, ApiError> {
    state
        .corpus
        .range(surah_number, range.from, range.to)
        .map(Json)
        .map_err(quran_err)
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<AyahText>>, ApiError> {
    if query.q.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Query must not be empty".to_string()));
    }
    Ok(Json(state.corpus.search(&query.q, clamp_limit(query.limit))))
}

pub async fn similar(
    State(state): State<Arc<AppState>>,
    Path((surah_number, ayah)): Path<(u16, u16)>,
    Query(query): Query<SimilarQuery>,
) -> Result<Json<Vec<SimilarAyah>>, ApiError> {
    let threshold = query.threshold.unwrap_or(DEFAULT_SIMILARITY_THRESHOLD);
    if !(0.0..=1.0).contains(&threshold) {
        return Err((
            StatusCode::BAD_REQUEST,
            "threshold must be between 0 and 1".to_string(),
        ));
    }
    state
        .corpus
        .similar_ayahs(
            AyahRef::new(surah_number, ayah),
            threshold,
            clamp_limit(query.limit),
        )
        .map(Json)
        .map_err(quran_err)
}
