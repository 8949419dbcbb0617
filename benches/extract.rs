// benches/extract.rs
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pulse_scrape::engine::Overrides;
use pulse_scrape::join;
use pulse_scrape::specs::{ArtistPageSpec, PageContext, SongsPageSpec};

fn fixture(name: &str) -> String {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("read {path}: {e}"))
}

fn bench_artist(c: &mut Criterion) {
    let spec = ArtistPageSpec::new().unwrap();
    let none = Overrides::new();
    let ctx = PageContext { target_id: "", url: "https://open.spotify.com/artist/3g7vYcdDXnqnDKYFwqXBJP" };

    for name in ["artist_meta.html", "artist_labeled.html", "web_player.html"] {
        let doc = fixture(name);
        c.bench_function(&format!("artist/{name}"), |b| {
            b.iter(|| {
                let x = spec.extract_with(black_box(&doc), ctx, &none);
                black_box(x.monthly_listeners.value)
            })
        });
    }
}

fn bench_songs(c: &mut Criterion) {
    let spec = SongsPageSpec::new().unwrap();
    let one = fixture("kworb_songs.html");
    // Real pages run to a few hundred rows.
    let body = one
        .split_once("<tbody>")
        .and_then(|(_, rest)| rest.split_once("</tbody>"))
        .map(|(rows, _)| rows)
        .unwrap_or_default();
    let wide = one.replace("</tbody>", &join!(&body.repeat(50), "</tbody>"));

    c.bench_function("songs/fixture", |b| {
        b.iter(|| black_box(spec.extract(black_box(&one), None).rows.len()))
    });
    c.bench_function("songs/wide", |b| {
        b.iter(|| black_box(spec.extract(black_box(&wide), None).rows.len()))
    });
}

criterion_group!(benches, bench_artist, bench_songs);
criterion_main!(benches);
