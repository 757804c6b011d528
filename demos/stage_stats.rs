/// Quick test exercising the dispatcher end to end: build a world, fire a
/// batch of immediate path queries, and print the resulting stats.
use navcore::nav::{
    Dispatcher, GridTileSource, InlineWorkerPool, LocalEventBus, NavConfig, TileKind,
};
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    let file_appender = tracing_appender::rolling::never("./demos", "stage_stats.log");
    let (file_writer, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(fmt::layer().with_writer(file_writer).with_ansi(false))
        .init();

    let map_size: u32 = 64;
    let tile_size = 64.0;
    let mut tiles = GridTileSource::new_open(map_size, map_size, tile_size);
    // A wall across the middle with a single gap, so some queries detour
    // and some go straight through.
    tiles.set_rect(0, map_size / 2, map_size - 8, map_size / 2, TileKind::Blocked);

    let dispatcher = Dispatcher::new(
        NavConfig::default(),
        Arc::new(InlineWorkerPool),
        Arc::new(tiles),
        Arc::new(LocalEventBus::new()),
    )
    .expect("valid navigation config");

    println!("Running 30 immediate queries...\n");
    let mut rng = fastrand::Rng::with_seed(42);
    let world_extent = map_size as f32 * tile_size;
    for i in 0..30 {
        let start = navcore::nav::Vec2::new(rng.f32() * world_extent, rng.f32() * world_extent);
        let goal = navcore::nav::Vec2::new(rng.f32() * world_extent, rng.f32() * world_extent);
        let (result, path) = dispatcher.find_path_immediate(start, goal, false);
        println!("query {i}: {result:?} ({} waypoints)", path.len());
    }

    let stats = dispatcher.get_stats();
    println!("\n=== stats ===");
    println!("{stats:#?}");
}
