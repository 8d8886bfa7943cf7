//! Data pipeline: synthetic generation -> CSV store -> resample -> align.

use chrono::NaiveDate;
use spreadlab_core::data::{
    align_pair, resample, AlignMode, CsvStore, DataError, PriceProvider, SymbolMap,
    SyntheticProvider,
};

fn date(m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2018, m, d).unwrap()
}

#[test]
fn store_round_trip_feeds_alignment() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvStore::new(dir.path(), SymbolMap::default_crypto());
    let synthetic = SyntheticProvider::new();

    for symbol in ["BTC", "XMR"] {
        let bars = synthetic.fetch(symbol, date(7, 1), date(7, 3)).unwrap();
        let path = store.write(symbol, &bars).unwrap();
        assert!(path.exists());
    }
    assert!(dir.path().join("binance/candles_USDT_BTC.csv").exists());
    assert!(dir.path().join("kraken/candles_USD_XMR.csv").exists());

    // Narrower range than what was written
    let a = store.fetch("BTC", date(7, 1), date(7, 2)).unwrap();
    let b = store.fetch("XMR", date(7, 1), date(7, 2)).unwrap();
    assert_eq!(a.len(), 1441);

    let a60 = resample(&a, 60).unwrap();
    let b60 = resample(&b, 60).unwrap();
    // 24 full hours plus the single midnight bar of the end date
    assert_eq!(a60.len(), 25);

    let bars_a: Vec<_> = a60.iter().map(|r| r.to_bar("BTC")).collect();
    let bars_b: Vec<_> = b60.iter().map(|r| r.to_bar("XMR")).collect();
    let pair = align_pair(&bars_a, &bars_b, AlignMode::Current).unwrap();
    assert_eq!(pair.len(), 25);
    assert!(pair.a().iter().chain(pair.b()).all(|bar| bar.is_consistent()));
}

#[test]
fn gaps_shrink_the_inner_join() {
    let synthetic = SyntheticProvider::new();
    let a = synthetic.fetch("ETH", date(7, 1), date(7, 2)).unwrap();
    let mut b = synthetic.fetch("LTC", date(7, 1), date(7, 2)).unwrap();
    // drop hour 5 entirely from B
    b.retain(|bar| bar.timestamp.format("%H").to_string() != "05");

    let a60: Vec<_> = resample(&a, 60).unwrap().iter().map(|r| r.to_bar("ETH")).collect();
    let b60: Vec<_> = resample(&b, 60).unwrap().iter().map(|r| r.to_bar("LTC")).collect();
    assert_eq!(a60.len(), 25);
    assert_eq!(b60.len(), 24);

    let current = align_pair(&a60, &b60, AlignMode::Current).unwrap();
    assert_eq!(current.len(), 24);

    let legacy = align_pair(&a60, &b60, AlignMode::Legacy).unwrap();
    assert_eq!(legacy.len(), 25);
    assert_eq!(legacy.b()[5].timestamp, legacy.b()[4].timestamp);
}

#[test]
fn unknown_symbol_surfaces_from_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = CsvStore::new(dir.path(), SymbolMap::default_crypto());
    assert!(matches!(
        store.fetch("DOGE", date(7, 1), date(7, 2)),
        Err(DataError::UnknownSymbol { .. })
    ));
}

#[test]
fn symbol_map_override_redirects_paths() {
    let dir = tempfile::tempdir().unwrap();
    let mut symbols = SymbolMap::default_crypto();
    symbols.merge(
        SymbolMap::from_toml("[symbols.DOGE]\nexchange = \"kraken\"\nquote = \"USD\"\n").unwrap(),
    );
    let store = CsvStore::new(dir.path(), symbols);
    let bars = SyntheticProvider::new().fetch("DOGE", date(7, 1), date(7, 1)).unwrap();
    store.write("DOGE", &bars).unwrap();
    assert!(dir.path().join("kraken/candles_USD_DOGE.csv").exists());
    assert_eq!(store.fetch("DOGE", date(7, 1), date(7, 1)).unwrap().len(), 1);
}
