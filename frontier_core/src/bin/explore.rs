use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;

use frontier_core::{
    build_explorer_app, load_world_parameters_from_env, record_for, replay_history, run_frame,
    SectorCache,
};
use frontier_proto::{HistoryReader, HistoryWriter};
use tracing::{info, warn};

/// Explores the universe for a number of frames and appends every newly
/// explored sector to a history file, replaying that file first if present.
///
/// Usage: `explore [frames] [history-path]`
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut args = std::env::args().skip(1);
    let frames: u32 = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(64);
    let history_path = args.next().map(PathBuf::from);

    let (params, source) = load_world_parameters_from_env();
    let mut app = match build_explorer_app(params) {
        Ok(app) => app,
        Err(err) => {
            warn!(target: "frontier::app", error = %err, "explorer_app.build_failed");
            std::process::exit(1);
        }
    };
    info!(
        target: "frontier::app",
        source = ?source,
        frames,
        "explorer.starting"
    );

    if let Some(path) = &history_path {
        replay_existing(&mut app.world.resource_mut::<SectorCache>(), path);
    }
    let replayed = app.world.resource::<SectorCache>().len();
    app.world.resource_mut::<SectorCache>().drain_events();

    for _ in 0..frames {
        run_frame(&mut app);
    }

    let cache = app.world.resource::<SectorCache>();
    info!(
        target: "frontier::app",
        explored = cache.explored_count(),
        planets = cache.planets().count(),
        quadtree_nodes = cache.quadtree().node_count(),
        "explorer.finished"
    );

    if let Some(path) = &history_path {
        if let Err(err) = write_history(cache, path, replayed) {
            warn!(target: "frontier::history", error = %err, "history.write_failed");
        }
    }
}

fn replay_existing(cache: &mut SectorCache, path: &Path) {
    let Ok(file) = File::open(path) else {
        return;
    };
    match HistoryReader::new(file) {
        Ok(reader) => {
            let records = reader.map_while(|record| match record {
                Ok(record) => Some(record),
                Err(err) => {
                    warn!(target: "frontier::history", error = %err, "history.read_failed");
                    None
                }
            });
            replay_history(cache, records, &AtomicBool::new(false));
        }
        Err(err) => {
            warn!(target: "frontier::history", error = %err, "history.open_failed");
        }
    }
}

/// Rewrites the history with every explored sector.
fn write_history(
    cache: &SectorCache,
    path: &Path,
    previously_known: usize,
) -> Result<(), frontier_proto::HistoryError> {
    let mut writer = HistoryWriter::new(BufWriter::new(File::create(path)?))?;
    for sector in cache.sectors().filter(|sector| sector.explored) {
        writer.append(&record_for(cache, sector))?;
    }
    info!(
        target: "frontier::history",
        path = %path.display(),
        written = writer.written(),
        previously_known,
        "history.written"
    );
    Ok(())
}
