use hana::hana_config::HanaConfig;
use hana_int_test::test_util::{cleanup, create_test_context, create_test_context_with, run_test};
use hana_spatial::{Envelope, GeometryType, DEFAULT_SRID};

#[test]
fn test_srid_folding_and_default() {
    run_test(
        create_test_context,
        |ctx| {
            let dialect = ctx.dialect();
            assert_eq!(dialect.geometry_srid(Some("GIS"), "ROADS", "SHAPE"), 4326);

            ctx.catalog()
                .register_geometry("GIS", "RIVERS", "SHAPE", "ST_LINESTRING", 2_000_003_857);
            assert_eq!(dialect.geometry_srid(Some("GIS"), "RIVERS", "SHAPE"), 3857);

            assert_eq!(
                dialect.geometry_srid(Some("GIS"), "CITIES", "LOCATION"),
                DEFAULT_SRID
            );
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_subtype_lookup() {
    run_test(
        create_test_context,
        |ctx| {
            let dialect = ctx.dialect();
            assert_eq!(
                dialect.geometry_subtype(None, "ROADS", "SHAPE"),
                Some(GeometryType::LineString)
            );
            assert_eq!(dialect.geometry_subtype(None, "CITIES", "LOCATION"), None);

            let queries = ctx.catalog().queries();
            assert_eq!(
                queries[0],
                "SELECT DATA_TYPE_NAME FROM ST_GEOMETRY_COLUMNS WHERE SCHEMA_NAME='GIS' AND TABLE_NAME='ROADS' AND COLUMN_NAME='SHAPE'"
            );
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_geometry_columns_are_cached() {
    run_test(
        create_test_context,
        |ctx| {
            let dialect = ctx.dialect();
            let columns = dialect.geometry_columns(None, "ROADS");
            assert_eq!(columns.len(), 1);
            assert_eq!(columns[0].name, "SHAPE");
            assert_eq!(columns[0].geometry_type, GeometryType::LineString);
            assert_eq!(columns[0].srid, 4326);
            assert_eq!(columns[0].native_type_name, "ST_GEOMETRY");

            let probed = ctx.catalog().query_count();
            assert_eq!(dialect.geometry_columns(None, "ROADS"), columns);
            assert_eq!(ctx.catalog().query_count(), probed);

            let cities = dialect.geometry_columns(None, "CITIES");
            assert_eq!(cities.len(), 1);
            assert_eq!(cities[0].geometry_type, GeometryType::Point);
            assert_eq!(cities[0].srid, DEFAULT_SRID);
            // A declared point column only needs its SRID.
            assert_eq!(ctx.catalog().query_count(), probed + 1);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_schema_change_drops_cache() {
    run_test(
        create_test_context,
        |ctx| {
            let dialect = ctx.dialect();
            let resolver = dialect.resolver();

            dialect.initialize_connection("GIS");
            dialect.geometry_columns(None, "ROADS");
            assert_eq!(resolver.cache_len(), 1);

            assert!(!resolver.set_schema_context("gis"));
            assert_eq!(resolver.cache_len(), 1);

            dialect.initialize_connection("OTHER");
            assert_eq!(resolver.cache_len(), 0);
            assert_eq!(resolver.schema_context().as_deref(), Some("OTHER"));
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_catalog_failures_degrade() {
    run_test(
        create_test_context,
        |ctx| {
            let dialect = ctx.dialect();
            ctx.catalog().set_failing(true);

            assert_eq!(dialect.geometry_srid(None, "ROADS", "SHAPE"), DEFAULT_SRID);
            assert_eq!(dialect.geometry_subtype(None, "ROADS", "SHAPE"), None);
            assert!(dialect.geometry_columns(None, "ROADS").is_empty());
            assert_eq!(dialect.estimated_bounds(None, "ROADS", &["SHAPE"]), None);

            ctx.catalog().set_failing(false);
            assert_eq!(
                dialect.geometry_subtype(None, "ROADS", "SHAPE"),
                Some(GeometryType::LineString)
            );
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_estimated_extent() {
    run_test(
        create_test_context,
        |ctx| {
            let dialect = ctx.dialect();
            assert_eq!(
                dialect.estimated_bounds(None, "ROADS", &["SHAPE"]),
                Some(Envelope::new(0.0, 0.0, 10.0, 5.0))
            );
            // No estimate for the column means the caller aggregates.
            assert_eq!(dialect.estimated_bounds(None, "CITIES", &["LOCATION"]), None);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_estimated_extent_disabled() {
    run_test(
        || {
            create_test_context_with(
                HanaConfig::builder()
                    .schema("GIS")
                    .estimated_extents(false)
                    .build(),
            )
        },
        |ctx| {
            let dialect = ctx.dialect();
            assert_eq!(dialect.estimated_bounds(None, "ROADS", &["SHAPE"]), None);
            assert_eq!(ctx.catalog().query_count(), 0);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_unparsable_estimate() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.catalog()
                .set_estimated_extent("GIS", "ROADS", "SHAPE", "POLYGON ((0 0");
            assert_eq!(ctx.dialect().estimated_bounds(None, "ROADS", &["SHAPE"]), None);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_concurrent_readers_see_whole_caches() {
    run_test(
        create_test_context,
        |ctx| {
            ctx.catalog().add_table(
                "GIS",
                "LAYERS",
                &[("A", "ST_POINT"), ("B", "ST_POINT"), ("C", "ST_GEOMETRY")],
            );
            ctx.catalog()
                .register_geometry("GIS", "LAYERS", "A", "ST_POINT", 4326);
            ctx.catalog()
                .register_geometry("GIS", "LAYERS", "B", "ST_POINT", 3857);
            ctx.catalog()
                .register_geometry("GIS", "LAYERS", "C", "ST_POLYGON", 4326);

            let dialect = ctx.dialect();
            let resolver = dialect.resolver().clone();
            let expected = resolver.geometry_columns(Some("GIS"), "LAYERS");
            assert_eq!(expected.len(), 3);
            let point_a = expected[0].clone();
            assert_eq!(point_a.name, "A");

            let writer = {
                let resolver = resolver.clone();
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        resolver.set_schema_context("OTHER");
                        resolver.set_schema_context("GIS");
                        assert_eq!(resolver.geometry_columns(Some("GIS"), "LAYERS").len(), 3);
                    }
                })
            };

            let readers: Vec<_> = (0..4)
                .map(|_| {
                    let resolver = resolver.clone();
                    let point_a = point_a.clone();
                    std::thread::spawn(move || {
                        for _ in 0..500 {
                            let snapshot = resolver.snapshot();
                            assert!(snapshot.is_empty() || snapshot.len() == 3);
                            if let Some(found) = resolver.cached(Some("GIS"), "LAYERS", "A") {
                                assert_eq!(found, point_a);
                            }
                        }
                    })
                })
                .collect();

            writer.join().unwrap();
            for reader in readers {
                reader.join().unwrap();
            }
            assert_eq!(resolver.cache_len(), 3);
            Ok(())
        },
        cleanup,
    );
}
