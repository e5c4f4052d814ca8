use std::sync::Arc;

use tracing::{debug, error, info};

use super::{
    Action, Candidate, DispatchError, DispatchOutcome, DownloadRequest, Downloader,
    NewSubscription, SubscriptionService, ACTOR,
};
use crate::classify::MediaType;
use crate::library::Existence;

/// Carries out the configured [`Action`] for a candidate.
pub struct ActionDispatcher {
    action: Action,
    save_path: Option<String>,
    downloader: Option<Arc<dyn Downloader>>,
    subscriptions: Arc<dyn SubscriptionService>,
}

impl ActionDispatcher {
    pub fn new(
        action: Action,
        save_path: Option<String>,
        downloader: Option<Arc<dyn Downloader>>,
        subscriptions: Arc<dyn SubscriptionService>,
    ) -> Self {
        Self {
            action,
            save_path: save_path.filter(|p| !p.is_empty()),
            downloader,
            subscriptions,
        }
    }

    pub fn action(&self) -> Action {
        self.action
    }

    /// Dispatch a candidate that is not already in the library.
    pub async fn dispatch(
        &self,
        candidate: &Candidate,
        existence: &Existence,
    ) -> Result<DispatchOutcome, DispatchError> {
        match self.action {
            Action::Download => self.download(candidate, existence).await,
            Action::Subscribe => self.subscribe(candidate).await,
        }
    }

    async fn download(
        &self,
        candidate: &Candidate,
        existence: &Existence,
    ) -> Result<DispatchOutcome, DispatchError> {
        let Candidate {
            meta, media, torrent, ..
        } = candidate;

        if media.media_type == MediaType::Tv && !existence.missing.is_empty() {
            let season = meta.begin_season.unwrap_or(1);
            let Some(gap) = existence.season_gap(media.tmdb_id, season) else {
                info!(
                    "{} season {} is not missing, skipping {}",
                    media.title_year(),
                    season,
                    torrent.title
                );
                return Ok(DispatchOutcome::AlreadyInLibrary);
            };
            if !gap.covers(&meta.episodes) {
                info!(
                    "{} {} already present, skipping {}",
                    media.title_year(),
                    meta.season_episode(),
                    torrent.title
                );
                return Ok(DispatchOutcome::AlreadyInLibrary);
            }
        }

        let downloader = self.downloader.as_ref().ok_or(DispatchError::NotConfigured)?;

        let request = DownloadRequest {
            meta: meta.clone(),
            media: media.clone(),
            torrent: torrent.clone(),
            save_path: self.save_path.clone(),
            actor: ACTOR.to_string(),
        };

        if downloader.download(request).await? {
            info!("Started download of {} for {}", torrent.title, media.title_year());
            Ok(DispatchOutcome::Dispatched)
        } else {
            Err(DispatchError::DownloadFailed(torrent.title.clone()))
        }
    }

    async fn subscribe(&self, candidate: &Candidate) -> Result<DispatchOutcome, DispatchError> {
        let Candidate { meta, media, .. } = candidate;

        if self.subscriptions.exists(media, meta.begin_season).await? {
            info!("{} {} is already subscribed", media.title_year(), meta.season_label());
            return Ok(DispatchOutcome::AlreadySubscribed);
        }

        let subscription = NewSubscription {
            title: media.title.clone(),
            year: media.year,
            media_type: media.media_type,
            tmdb_id: media.tmdb_id,
            season: meta.begin_season,
            exist_ok: true,
            actor: ACTOR.to_string(),
        };

        // Best effort: a failed add is still reported as dispatched.
        match self.subscriptions.add(subscription).await {
            Ok(()) => info!("Subscribed to {} {}", media.title_year(), meta.season_label()),
            Err(e) => error!(
                "Failed to subscribe to {} {}: {}",
                media.title_year(),
                meta.season_label(),
                e
            ),
        }
        debug!("Subscribe dispatch done for {}", candidate.torrent.title);

        Ok(DispatchOutcome::Dispatched)
    }
}
