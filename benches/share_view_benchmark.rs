use criterion::{criterion_group, criterion_main, Criterion};
use metro_favorites::db::{DocumentStore, MemoryStore};
use metro_favorites::models::{FullMapShare, SharedStore, SharedStoreView};
use metro_favorites::services::{SharedViewResolver, StationCatalog};
use std::collections::BTreeMap;
use std::hint::black_box;
use std::sync::Arc;

fn shared_store(station_id: &str, i: usize) -> SharedStore {
    SharedStore {
        name: format!("{} 小吃 {}", station_id, i),
        address: format!("高雄市 {} 號", i),
        google_place_id: format!("{}-place-{}", station_id, i),
        lat: 22.63,
        lng: 120.30,
        rating: Some(4.2),
        main_photo_url: None,
    }
}

fn benchmark_resolve_full_map(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to start runtime");
    let catalog = Arc::new(StationCatalog::bundled().expect("Failed to load stations"));
    let store = MemoryStore::new();

    // Every catalog station full, plus one the catalog does not know
    let mut by_station = BTreeMap::new();
    for station in catalog.stations() {
        let stores = (0..15).map(|i| shared_store(&station.id, i)).collect();
        by_station.insert(station.id.clone(), stores);
    }
    by_station.insert("GONE".to_string(), vec![shared_store("GONE", 0)]);

    let share = FullMapShare {
        id: String::new(),
        original_user_id: "bench-user".to_string(),
        original_user_name: "Bench".to_string(),
        all_stations_favorites: by_station,
        created_at: String::new(),
    };
    let stored = runtime
        .block_on(store.insert_map_share(&share))
        .expect("Failed to seed share");

    let resolver = SharedViewResolver::new(Arc::new(store), catalog);

    let mut group = c.benchmark_group("shared_views");

    group.bench_function("resolve_full_map", |b| {
        b.iter(|| {
            runtime
                .block_on(resolver.resolve_full_map(black_box(&stored.id)))
                .expect("Failed to resolve")
        })
    });

    let stores: Vec<SharedStore> = (0..15).map(|i| shared_store("R11", i)).collect();
    group.bench_function("store_views", |b| {
        b.iter(|| {
            black_box(&stores)
                .iter()
                .cloned()
                .map(SharedStoreView::from)
                .collect::<Vec<_>>()
        })
    });

    group.finish();
}

criterion_group!(benches, benchmark_resolve_full_map);
criterion_main!(benches);
