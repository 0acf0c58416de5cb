use std::sync::Arc;

use crate::{
    config::PipelineSettings,
    db::MusicRepository,
    player::{PlayerController, SessionCache},
    services::{
        providers::{CatalogProvider, ScoringProvider},
        ProfileService, RecommendationService,
    },
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub repository: Arc<dyn MusicRepository>,
    pub recommendations: Arc<RecommendationService>,
    pub profiles: Arc<ProfileService>,
    pub player: Arc<PlayerController>,
    pub settings: PipelineSettings,
}

impl AppState {
    /// Wires the pipeline from its collaborators
    pub fn new(
        repository: Arc<dyn MusicRepository>,
        catalog: Arc<dyn CatalogProvider>,
        scoring: Arc<dyn ScoringProvider>,
        sessions: Arc<dyn SessionCache>,
        settings: PipelineSettings,
    ) -> Self {
        let recommendations = Arc::new(RecommendationService::new(
            repository.clone(),
            catalog,
            scoring.clone(),
            &settings,
        ));
        let profiles = Arc::new(ProfileService::new(
            repository.clone(),
            scoring,
            settings.collaborator_timeout,
        ));
        let player = Arc::new(PlayerController::new(
            repository.clone(),
            recommendations.clone(),
            profiles.clone(),
            sessions,
            &settings,
        ));

        Self {
            repository,
            recommendations,
            profiles,
            player,
            settings,
        }
    }
}
