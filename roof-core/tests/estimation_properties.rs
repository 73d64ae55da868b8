use proptest::prelude::*;

use roof_core::estimation::{
    BoundingBox, GeoPoint, Polygon, RoofEstimate, SQ_FT_PER_SQ_M, SourceKind, waste_factor,
};

// Roof-scale boxes somewhere between the tropics.
fn roof_box() -> impl Strategy<Value = BoundingBox> {
    (-60.0f64..60.0, -179.0f64..179.0, 0.0f64..0.002, 0.0f64..0.002).prop_map(
        |(south, west, d_lat, d_lng)| {
            BoundingBox::new(
                GeoPoint::new(south + d_lat, west + d_lng),
                GeoPoint::new(south, west),
            )
        },
    )
}

fn source_kind() -> impl Strategy<Value = SourceKind> {
    prop_oneof![
        Just(SourceKind::RemoteProvider),
        Just(SourceKind::LocalProvider),
        Just(SourceKind::ManualDraw),
    ]
}

proptest! {
    #[test]
    fn box_area_is_height_times_width(bounds in roof_box()) {
        let area = bounds.area_sq_ft();
        let expected = bounds.height_m() * bounds.width_m() * SQ_FT_PER_SQ_M;

        prop_assert!(area >= 0.0);
        prop_assert!((area - expected).abs() <= expected.abs() * 1e-12);
        prop_assert_eq!(area == 0.0, bounds.is_degenerate());
    }

    #[test]
    fn waste_factor_is_never_below_one(source in source_kind(), complexity in 0u32..100) {
        prop_assert!(waste_factor(source, complexity) >= 1.0);
    }

    #[test]
    fn manual_factor_is_fixed(complexity in 0u32..1000) {
        prop_assert_eq!(waste_factor(SourceKind::ManualDraw, complexity), 1.20);
    }

    #[test]
    fn material_is_at_least_geometric_area(
        area in 0.0f64..1_000_000.0,
        source in source_kind(),
        complexity in 0u32..100,
    ) {
        let estimate = RoofEstimate::from_area(area, source, complexity);

        prop_assert!(estimate.material_needed_sq_ft >= estimate.geometric_area_sq_ft);
        prop_assert!(estimate.complexity_score >= 1);
    }

    #[test]
    fn polygon_area_is_repeatable(bounds in roof_box()) {
        let ne = bounds.north_east;
        let sw = bounds.south_west;
        let polygon = Polygon::new(vec![
            sw,
            GeoPoint::new(sw.lat, ne.lng),
            ne,
            GeoPoint::new(ne.lat, sw.lng),
        ]);
        prop_assume!(polygon.is_ok());
        let polygon = polygon.unwrap();

        let first = polygon.area_sq_ft();
        let second = polygon.area_sq_ft();

        prop_assert_eq!(first, second);
        prop_assert!(first >= 0.0);
    }
}
