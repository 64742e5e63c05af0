//! Headless Bevy wiring: authority updates are applied, the explorer walks
//! its spiral, and cache notifications are republished as events.

use std::sync::Arc;

use bevy::prelude::*;
use crossbeam_channel::{unbounded, Receiver, SendError, Sender};

use crate::cache::{AuthorityUpdate, SectorCache, SectorEvent, UpdateOutcome};
use crate::config::{ConfigError, WorldParameters, WorldParametersHandle};
use crate::explorer::Explorer;
use crate::hash::LocationHash;
use crate::sector::Sector;

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorExplored(pub Sector);

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorChanged(pub Sector);

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanetUpdateRejected {
    pub planet: LocationHash,
    pub tick: u64,
    pub outcome: UpdateOutcome,
}

/// Sectors the explorer may map per frame.
#[derive(Resource, Debug, Clone, Copy)]
pub struct ExploreBudget {
    pub sectors_per_frame: usize,
    pub paused: bool,
}

impl Default for ExploreBudget {
    fn default() -> Self {
        Self {
            sectors_per_frame: 4,
            paused: false,
        }
    }
}

/// Sending half of the authority channel, handed to the network layer.
#[derive(Resource, Debug, Clone)]
pub struct AuthorityFeed(Sender<AuthorityUpdate>);

impl AuthorityFeed {
    pub fn send(&self, update: AuthorityUpdate) -> Result<(), SendError<AuthorityUpdate>> {
        self.0.send(update)
    }
}

#[derive(Resource, Debug)]
pub struct AuthorityInbox(Receiver<AuthorityUpdate>);

pub fn authority_channel() -> (AuthorityFeed, AuthorityInbox) {
    let (sender, receiver) = unbounded();
    (AuthorityFeed(sender), AuthorityInbox(receiver))
}

pub fn apply_authority_updates(
    inbox: Res<AuthorityInbox>,
    mut cache: ResMut<SectorCache>,
    mut rejected: EventWriter<PlanetUpdateRejected>,
) {
    for update in inbox.0.try_iter() {
        let outcome = cache.apply_update(&update);
        if outcome != UpdateOutcome::Applied {
            rejected.send(PlanetUpdateRejected {
                planet: update.planet,
                tick: update.tick,
                outcome,
            });
        }
    }
}

pub fn advance_explorer(
    budget: Res<ExploreBudget>,
    mut explorer: ResMut<Explorer>,
    mut cache: ResMut<SectorCache>,
) {
    if budget.paused || budget.sectors_per_frame == 0 {
        return;
    }
    let explored = explorer.step(&mut cache, budget.sectors_per_frame);
    if explored.is_empty() {
        tracing::debug!(
            target: "frontier::app",
            x = explorer.position().x,
            y = explorer.position().y,
            "explorer.step=idle"
        );
    }
}

pub fn publish_sector_events(
    mut cache: ResMut<SectorCache>,
    mut explored: EventWriter<SectorExplored>,
    mut changed: EventWriter<SectorChanged>,
) {
    for event in cache.drain_events() {
        match event {
            SectorEvent::Explored(sector) => {
                explored.send(SectorExplored(sector));
            }
            SectorEvent::Changed(sector) => {
                changed.send(SectorChanged(sector));
            }
        }
    }
}

/// Construct a Bevy [`App`] that explores the universe described by `params`.
pub fn build_explorer_app(params: Arc<WorldParameters>) -> Result<App, ConfigError> {
    let cache = SectorCache::new(Arc::clone(&params))?;
    let (feed, inbox) = authority_channel();

    let mut app = App::new();
    app.insert_resource(WorldParametersHandle::new(params))
        .insert_resource(cache)
        .insert_resource(Explorer::default())
        .insert_resource(ExploreBudget::default())
        .insert_resource(feed)
        .insert_resource(inbox)
        .add_event::<SectorExplored>()
        .add_event::<SectorChanged>()
        .add_event::<PlanetUpdateRejected>()
        .add_plugins(MinimalPlugins)
        .add_systems(
            Update,
            (
                apply_authority_updates,
                advance_explorer,
                publish_sector_events,
            )
                .chain(),
        );

    tracing::info!(target: "frontier::app", "explorer_app.ready");
    Ok(app)
}

/// Run one frame: authority updates, then exploration, then notifications.
pub fn run_frame(app: &mut App) {
    app.update();
}
