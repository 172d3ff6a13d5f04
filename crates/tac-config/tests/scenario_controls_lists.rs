//! Typed control lists read from layered config.
//!
//! GREEN when:
//! - missing lists read as empty (or `None` for the active universe)
//! - malformed lists fail the lookup rather than reading as empty
//! - files on disk load in merge order
//! - keys the controls never read show up in the unused-key report

use std::io::Write;

use tac_config::{report_unused_keys, ControlsConfig, InstrumentCategory, UnusedKeyPolicy};

const CONTROLS_YAML: &str = r#"
instruments:
  bad: ["CORN"]
  duplicate: ["SP500_mini"]
  ignored: ["BTC"]
  untradeable: ["VIX", "CORN"]
  stale: ["OLD_BUND"]
strategies:
  stale: ["retired"]
  active: ["carry", "momentum"]
"#;

#[test]
fn categories_and_stale_lists_are_read() {
    let cfg = ControlsConfig::from_yaml_strings(&[CONTROLS_YAML]).unwrap();
    cfg.validate().unwrap();

    assert_eq!(cfg.instruments_in(InstrumentCategory::Bad).unwrap(), vec!["CORN"]);
    assert_eq!(
        cfg.instruments_in(InstrumentCategory::Untradeable).unwrap(),
        vec!["VIX", "CORN"]
    );
    assert_eq!(cfg.stale_instruments().unwrap(), vec!["OLD_BUND"]);
    assert_eq!(cfg.stale_strategies().unwrap(), vec!["retired"]);
    assert_eq!(cfg.active_instruments().unwrap(), None);
    assert_eq!(
        cfg.active_strategies().unwrap(),
        Some(vec!["carry".to_string(), "momentum".to_string()])
    );
}

#[test]
fn empty_config_has_no_restrictions() {
    let cfg = ControlsConfig::empty().unwrap();
    for category in InstrumentCategory::ALL {
        assert!(cfg.instruments_in(category).unwrap().is_empty());
    }
    assert!(cfg.stale_instruments().unwrap().is_empty());
}

#[test]
fn malformed_list_fails_lookup() {
    let cfg = ControlsConfig::from_yaml_strings(&["instruments:\n  bad: CORN\n"]).unwrap();
    let err = cfg.instruments_in(InstrumentCategory::Bad).unwrap_err();
    assert!(format!("{err:#}").contains("CONFIG_BAD_LIST"));
    assert!(cfg.validate().is_err());

    let cfg = ControlsConfig::from_yaml_strings(&["strategies:\n  stale: [1, 2]\n"]).unwrap();
    assert!(cfg.stale_strategies().is_err());
}

#[test]
fn layered_files_load_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("base.yaml");
    let overlay = dir.path().join("overlay.yaml");
    std::fs::File::create(&base)
        .unwrap()
        .write_all(CONTROLS_YAML.as_bytes())
        .unwrap();
    std::fs::File::create(&overlay)
        .unwrap()
        .write_all(b"instruments:\n  bad: []\n")
        .unwrap();

    let base_s = base.to_string_lossy().to_string();
    let overlay_s = overlay.to_string_lossy().to_string();
    let cfg = ControlsConfig::load(&[base_s.as_str(), overlay_s.as_str()]).unwrap();

    assert!(cfg.instruments_in(InstrumentCategory::Bad).unwrap().is_empty());
    assert_eq!(cfg.stale_instruments().unwrap(), vec!["OLD_BUND"]);
    assert_eq!(cfg.config_hash().len(), 64);
}

#[test]
fn unknown_keys_are_reported() {
    let cfg = ControlsConfig::from_yaml_strings(&[
        CONTROLS_YAML,
        "instruments:\n  bads: [\"TYPO\"]\n",
    ])
    .unwrap();

    let report = report_unused_keys(cfg.config_json(), UnusedKeyPolicy::Warn).unwrap();
    assert_eq!(report.unused_leaf_pointers, vec!["/instruments/bads/0"]);
    assert!(report_unused_keys(cfg.config_json(), UnusedKeyPolicy::Fail).is_err());

    let clean = ControlsConfig::from_yaml_strings(&[CONTROLS_YAML]).unwrap();
    assert!(report_unused_keys(clean.config_json(), UnusedKeyPolicy::Fail)
        .unwrap()
        .is_clean());
}
