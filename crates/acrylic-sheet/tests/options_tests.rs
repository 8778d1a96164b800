use acrylic_sheet::*;

#[test]
fn test_default_options_validate() {
    let options = SheetOptions::default();
    assert!(options.validate().is_ok());
}

#[test]
fn test_default_params_at_print_dpi() {
    let params = SheetParams::from_options(&SheetOptions::default()).unwrap();

    assert_eq!(params.dpi, 350);
    assert_eq!(params.geometry.width_px, 3858);
    assert_eq!(params.geometry.height_px, 7992);
    assert_eq!(params.geometry.border_px, 28);
    assert_eq!(params.geometry.margin_px, 138);
    // 50mm label gutter on top of the margin
    assert_eq!(params.geometry.left_margin_px, 138 + 689);
    assert_eq!(params.knockout.erosion_radius, 1);
    assert_eq!(params.label.margin_px, 69);
}

#[test]
fn test_scenario_grid_without_gutter() {
    let options = SheetOptions {
        label_gutter_mm: 0.0,
        ..Default::default()
    };
    let params = SheetParams::from_options(&options).unwrap();
    let grid = create_grid_layout(&params.geometry);

    assert_eq!((grid.rows, grid.cols), (6, 3));
}

#[test]
fn test_gutter_keeps_three_columns() {
    let params = SheetParams::from_options(&SheetOptions::default()).unwrap();
    let grid = create_grid_layout(&params.geometry);

    assert_eq!((grid.rows, grid.cols), (6, 3));
    assert_eq!(grid.positions[0].x, 827 + 28);
}

#[test]
fn test_shrink_zero_disables_erosion() {
    let mut options = SheetOptions::default();
    options.knockout.shrink_mm = 0.0;
    let params = SheetParams::from_options(&options).unwrap();
    assert_eq!(params.knockout.erosion_radius, 0);

    // Anything positive erodes by at least one pixel
    options.knockout.shrink_mm = 0.01;
    let params = SheetParams::from_options(&options).unwrap();
    assert_eq!(params.knockout.erosion_radius, 1);

    options.knockout.shrink_mm = 0.5;
    let params = SheetParams::from_options(&options).unwrap();
    assert_eq!(params.knockout.erosion_radius, 7);
}

#[test]
fn test_validation_rejects_negative_lengths() {
    let options = SheetOptions {
        margin_mm: -1.0,
        ..Default::default()
    };
    match options.validate() {
        Err(SheetError::Config(msg)) => assert!(msg.contains("margin")),
        other => panic!("Expected Config error, got {:?}", other),
    }
}

#[test]
fn test_validation_rejects_zero_workers() {
    let options = SheetOptions {
        render_workers: Some(0),
        ..Default::default()
    };
    assert!(matches!(options.validate(), Err(SheetError::Config(_))));
}

#[test]
fn test_degenerate_sheet_is_geometry_error() {
    let options = SheetOptions {
        sheet_size: SheetSize::new(0.0, 0.0),
        ..Default::default()
    };
    match SheetParams::from_options(&options) {
        Err(SheetError::Geometry(_)) => {}
        other => panic!("Expected Geometry error, got {:?}", other),
    }

    // Margins wider than the sheet
    let options = SheetOptions {
        sheet_size: SheetSize::new(15.0, 15.0),
        ..Default::default()
    };
    assert!(matches!(
        SheetParams::from_options(&options),
        Err(SheetError::Geometry(_))
    ));
}

#[test]
fn test_lengths_beyond_pixel_range_are_geometry_errors() {
    // 1e9mm is about 1.4e10px at 350dpi, past u32::MAX
    let options = SheetOptions {
        sheet_size: SheetSize::new(1.0e9, 580.0),
        ..Default::default()
    };
    assert!(matches!(
        SheetParams::from_options(&options),
        Err(SheetError::Geometry(_))
    ));

    let mut options = SheetOptions::default();
    options.knockout.shrink_mm = 1.0e9;
    assert!(matches!(
        SheetParams::from_options(&options),
        Err(SheetError::Geometry(_))
    ));
}

#[test]
fn test_sheet_size_parse() {
    let size = SheetSize::parse("280x580").unwrap();
    assert_eq!(size, SheetSize::new(280.0, 580.0));

    assert!(SheetSize::parse("280").is_err());
    assert!(SheetSize::parse("axb").is_err());
}

#[test]
fn test_strength_presets() {
    let knockout = KnockoutOptions::default().with_strength(KnockoutStrength::Aggressive);
    assert_eq!(knockout.threshold, 10);
    let knockout = knockout.with_strength(KnockoutStrength::Minimal);
    assert_eq!(knockout.threshold, 50);
    assert_eq!(KnockoutStrength::Normal.threshold(), 20);
}

#[test]
fn test_worker_defaults() {
    let options = SheetOptions::default();
    assert_eq!(options.resolved_load_workers(), 4);
    let render = options.resolved_render_workers();
    assert!((1..=4).contains(&render));

    let options = SheetOptions {
        load_workers: Some(9),
        render_workers: Some(2),
        ..Default::default()
    };
    assert_eq!(options.resolved_load_workers(), 9);
    assert_eq!(options.resolved_render_workers(), 2);
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_save_and_load_options() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheet.json");

    let mut options = SheetOptions::default();
    options.sheet_size = SheetSize::new(300.0, 450.0);
    options.knockout.pattern = KnockoutPattern::Gradient;
    options.single_page = true;
    options.output_prefix = "order42".to_string();

    options.save(&path).await.unwrap();
    let loaded = SheetOptions::load(&path).await.unwrap();

    assert_eq!(loaded, options);
}

#[cfg(feature = "serde")]
#[tokio::test]
async fn test_partial_config_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partial.json");
    tokio::fs::write(&path, r#"{"knockout": {"pattern": "steep"}, "parallel": false}"#)
        .await
        .unwrap();

    let loaded = SheetOptions::load(&path).await.unwrap();

    assert_eq!(loaded.knockout.pattern, KnockoutPattern::SteepGradient);
    assert_eq!(loaded.knockout.threshold, 20);
    assert!(!loaded.parallel);
    assert_eq!(loaded.sheet_size, SheetSize::default());
}
