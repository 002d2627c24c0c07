use hana::catalog::{CatalogProbe, ColumnMetadata};
use hana::hana_config::HanaConfig;
use hana::value::Value;
use hana_int_test::test_util::{cleanup, create_test_context, create_test_context_with, run_test};
use hana_spatial::{Binding, Geometry, GeometryType, Hint};

#[test]
fn test_column_bindings_from_listing() {
    run_test(
        create_test_context,
        |ctx| {
            let dialect = ctx.dialect();
            let columns = ctx.catalog().list_columns(None, "GIS", "ROADS", "%")?;
            let bindings: Vec<_> = columns.iter().map(|c| dialect.column_binding(c)).collect();
            assert_eq!(
                bindings,
                vec![
                    Some(Binding::Long),
                    None,
                    Some(Binding::Geometry(GeometryType::LineString)),
                ]
            );

            let uuid = ColumnMetadata::new(Some("GIS"), "ROADS", "KEY", "UUID");
            assert_eq!(dialect.column_binding(&uuid), Some(Binding::Uuid));
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_table_filter() {
    run_test(
        create_test_context,
        |ctx| {
            let dialect = ctx.dialect();
            let tables: Vec<_> = ctx
                .catalog()
                .list_tables(Some("GIS"), "%", &ctx.catalog().list_table_types()?)?
                .into_iter()
                .filter(|t| dialect.include_table(&t.name))
                .map(|t| t.name)
                .collect();
            assert_eq!(tables, vec!["ROADS".to_string(), "CITIES".to_string()]);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_insert_statement() {
    run_test(
        create_test_context,
        |ctx| {
            let dialect = ctx.dialect();
            let srid = dialect.geometry_srid(None, "ROADS", "SHAPE");
            let line = Geometry::line_string(vec![
                hana_spatial::Coordinate::new(0.0, 0.0),
                hana_spatial::Coordinate::new(2.5, 1.0),
            ]);

            let mut sql = String::from("INSERT INTO \"GIS\".\"ROADS\" (\"ID\", \"NAME\", \"DATA\", \"SHAPE\") VALUES (");
            dialect.encode_value(&Value::I64(7), &mut sql);
            sql.push_str(", ");
            dialect.encode_value(&Value::from("Elm's Way"), &mut sql);
            sql.push_str(", ");
            dialect.encode_value(&Value::Bytes(vec![0xde, 0xad]), &mut sql);
            sql.push_str(", ");
            dialect.encode_geometry_value(Some(&line), srid, &mut sql);
            sql.push(')');

            assert_eq!(
                sql,
                "INSERT INTO \"GIS\".\"ROADS\" (\"ID\", \"NAME\", \"DATA\", \"SHAPE\") VALUES \
                 (7, 'Elm''s Way', '\\xdead', NEW ST_LineString('LINESTRING (0 0, 2.5 1)', 4326))"
            );
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_envelope_selection_and_decode() {
    run_test(
        create_test_context,
        |ctx| {
            let dialect = ctx.dialect();
            let mut sql = String::from("SELECT ");
            dialect.encode_geometry_envelope("SHAPE", &mut sql);
            assert_eq!(sql, "SELECT \"SHAPE\".ST_Envelope().ST_AsText()");

            let env = dialect.decode_geometry_envelope(Some("POLYGON ((1 2, 3 2, 3 4, 1 4, 1 2))"))?;
            assert_eq!((env.min_x, env.min_y, env.max_x, env.max_y), (1.0, 2.0, 3.0, 4.0));
            assert!(dialect.decode_geometry_envelope(None)?.is_null());
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_limit_offset() {
    run_test(
        create_test_context,
        |ctx| {
            let dialect = ctx.dialect();
            let mut sql = String::from("SELECT * FROM \"ROADS\"");
            dialect.apply_limit_offset(&mut sql, None, 40);
            assert_eq!(sql, "SELECT * FROM \"ROADS\" OFFSET 40");
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_hints_follow_config() {
    run_test(
        || create_test_context_with(HanaConfig::builder().simplify(true).build()),
        |ctx| {
            let dialect = ctx.dialect();
            assert_eq!(dialect.supported_hints(), vec![Hint::GeometrySimplification]);
            dialect.config().set_simplify_enabled(false);
            assert!(dialect.supported_hints().is_empty());
            Ok(())
        },
        cleanup,
    );
}
