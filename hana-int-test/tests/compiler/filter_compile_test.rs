use hana::hana_config::HanaConfig;
use hana_int_test::test_util::{cleanup, create_test_context_with, run_test};
use hana_spatial::{
    spatial_field, DistanceOperator, Expression, Geometry, Predicate, SpatialError,
    SpatialOperator,
};

fn strict() -> HanaConfig {
    HanaConfig::builder().schema("GIS").loose_bbox(false).build()
}

#[test]
fn test_intersects_statement() {
    run_test(
        || create_test_context_with(strict()),
        |ctx| {
            let dialect = ctx.dialect();
            let predicate = spatial_field("geom").intersects(Geometry::point(1.0, 2.0));

            let sql = dialect.filter_to_sql().compile(&predicate)?;
            assert_eq!(
                sql,
                "\"geom\" && ST_Geometry('POINT (1 2)') AND \"geom\".ST_Intersects(ST_Geometry('POINT (1 2)'))"
            );
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_full_select_statement() {
    run_test(
        || create_test_context_with(strict()),
        |ctx| {
            let dialect = ctx.dialect();
            let predicate = spatial_field("SHAPE")
                .bbox(0.0, 0.0, 2.0, 1.0)
                .and(Predicate::eq("NAME", "Main St"));

            let mut sql = String::from("SELECT \"NAME\", ");
            dialect.encode_geometry_column("SHAPE", Some("r"), false, &mut sql);
            sql.push_str(" FROM \"GIS\".\"ROADS\" \"r\" WHERE ");
            dialect.filter_to_sql().compile_into(&predicate, &mut sql)?;
            dialect.apply_limit_offset(&mut sql, Some(10), 20);

            let rect = "ST_Geometry('POLYGON ((0 0, 0 1, 2 1, 2 0, 0 0))')";
            assert_eq!(
                sql,
                format!(
                    "SELECT \"NAME\", \"r\".\"SHAPE\".ST_AsEWKB() FROM \"GIS\".\"ROADS\" \"r\" WHERE \
                     (\"SHAPE\" && {rect} AND \"SHAPE\".ST_Intersects({rect}) AND \"NAME\" = 'Main St') \
                     LIMIT 10 OFFSET 20"
                )
            );
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_loose_bbox_follows_config() {
    run_test(
        || create_test_context_with(strict()),
        |ctx| {
            let dialect = ctx.dialect();
            let predicate = spatial_field("SHAPE").bbox(0.0, 0.0, 2.0, 1.0);

            let exact = dialect.filter_to_sql().compile(&predicate)?;
            assert!(exact.contains("ST_Intersects"));

            dialect.config().set_loose_bbox_enabled(true);
            let loose = dialect.filter_to_sql().compile(&predicate)?;
            assert!(!loose.contains("ST_Intersects"));
            assert!(loose.starts_with("\"SHAPE\" && ST_Geometry("));
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_swapped_operands() {
    run_test(
        || create_test_context_with(strict()),
        |ctx| {
            let compiler = ctx.dialect().filter_to_sql();
            let g = Geometry::point(1.0, 2.0);

            let within_swapped = Predicate::binary_spatial(
                SpatialOperator::Within,
                g.clone().into(),
                Expression::property("geom"),
            );
            assert_eq!(
                compiler.compile(&within_swapped)?,
                compiler.compile(&spatial_field("geom").contains(g.clone()))?
            );

            let beyond_swapped = Predicate::distance_spatial(
                DistanceOperator::Beyond,
                g.clone().into(),
                Expression::property("geom"),
                10.0,
            )?;
            assert_eq!(
                compiler.compile(&beyond_swapped)?,
                "\"geom\".ST_WithinDistance(ST_Geometry('POINT (1 2)'),10.0)"
            );
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_unsupported_predicate_aborts() {
    run_test(
        || create_test_context_with(strict()),
        |ctx| {
            let compiler = ctx.dialect().filter_to_sql();
            let predicate = spatial_field("geom")
                .intersects(Geometry::point(0.0, 0.0))
                .or(Predicate::binary_spatial(
                    SpatialOperator::Relate,
                    Expression::property("geom"),
                    Geometry::point(0.0, 0.0).into(),
                ));
            assert!(!compiler.supports(&predicate));

            let mut sql = String::from("SELECT * FROM T WHERE ");
            let result = compiler.compile_into(&predicate, &mut sql);
            assert!(matches!(result, Err(SpatialError::UnsupportedPredicate(_))));
            assert_eq!(sql, "SELECT * FROM T WHERE ");
            Ok(())
        },
        cleanup,
    );
}
