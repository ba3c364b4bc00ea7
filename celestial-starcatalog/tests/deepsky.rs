mod common;

use celestial_starcatalog::config::CatalogConfig;
use celestial_starcatalog::deepsky::{Classification, DeepSkyCatalogCache, DeepSkyCatalogKind};
use celestial_starcatalog::{Angle, CatalogError, RaDec, SkyWindow};

#[test]
fn ngcic_through_the_cache() {
    let dir = common::basedir();
    let config = CatalogConfig {
        basedir: dir.path().to_path_buf(),
        ..CatalogConfig::default()
    };
    let mut cache = DeepSkyCatalogCache::new(config.deepsky_dir());
    let ngc = cache.get(DeepSkyCatalogKind::NgcIc).unwrap();
    assert_eq!(ngc.len(), 4);

    let nebula = ngc.find("NGC7000").unwrap();
    assert_eq!(nebula.constellation, "Cyg");
    assert_eq!(nebula.classification, Classification::BrightNebula);
    assert!(nebula.names.contains("North America Nebula"));

    assert_eq!(ngc.find("M31").unwrap().name, "NGC224");
    assert_eq!(ngc.find("Andromeda Galaxy").unwrap().name, "NGC224");
    assert_eq!(ngc.find("Horsehead Nebula").unwrap().name, "IC434");
    assert!(matches!(ngc.find("NGC9999"), Err(CatalogError::NotFound(_))));

    let like: Vec<String> = ngc.find_like("M3", 10).into_iter().collect();
    assert_eq!(like, vec!["M31", "M32"]);

    let window = SkyWindow::new(
        RaDec::from_hours_degrees(0.7, 41.0),
        Angle::from_hours(0.5),
        Angle::from_degrees(2.0),
    );
    let names: Vec<String> = ngc.find_window(&window).into_iter().map(|o| o.name).collect();
    assert_eq!(names, vec!["NGC221", "NGC224"]);
    assert!(cache.is_loaded(DeepSkyCatalogKind::NgcIc));
}

#[test]
fn absent_catalogs_fail_without_poisoning_the_cache() {
    let dir = common::basedir();
    let mut cache = DeepSkyCatalogCache::new(dir.path());
    for kind in [DeepSkyCatalogKind::Pgc, DeepSkyCatalogKind::Stellarium] {
        assert!(matches!(cache.get(kind), Err(CatalogError::File { .. })), "{:?}", kind);
        assert!(!cache.is_loaded(kind));
    }
    assert!(cache.get(DeepSkyCatalogKind::NgcIc).is_ok());
}
