use hana::catalog::{ColumnRef, Row};
use hana::value::Value;
use hana_int_test::test_util::{cleanup, create_test_context, run_test};
use hana_spatial::{
    Coordinate, Geometry, LineString, LinearRing, Point, Polygon, SpatialError, WkbByteOrder,
    WkbCodec,
};

fn square(offset: f64) -> Polygon {
    let shell = LinearRing::new(vec![
        Coordinate::new(offset, offset),
        Coordinate::new(offset, offset + 1.0),
        Coordinate::new(offset + 1.0, offset + 1.0),
        Coordinate::new(offset + 1.0, offset),
        Coordinate::new(offset, offset),
    ])
    .unwrap();
    Polygon::new(shell, Vec::new())
}

fn samples() -> Vec<Geometry> {
    vec![
        Geometry::point(1.5, -2.25),
        Geometry::point_3d(1.0, 2.0, 3.0),
        Geometry::empty_point(),
        Geometry::line_string(vec![Coordinate::new(0.0, 0.0), Coordinate::new(3.0, 4.0)]),
        Geometry::LineString(LineString::empty()),
        Geometry::Polygon(square(0.0)),
        Geometry::MultiPoint(vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]),
        Geometry::MultiLineString(vec![LineString::new(vec![
            Coordinate::new_3d(0.0, 0.0, 1.0),
            Coordinate::new_3d(1.0, 0.0, 2.0),
        ])]),
        Geometry::MultiPolygon(vec![square(0.0), square(5.0)]),
        Geometry::GeometryCollection(vec![
            Geometry::point(9.0, 9.0),
            Geometry::Polygon(square(2.0)),
        ]),
    ]
}

#[test]
fn test_round_trip_through_rows() {
    run_test(
        create_test_context,
        |ctx| {
            let dialect = ctx.dialect();
            let mut codec = dialect.new_codec();
            for geometry in samples() {
                let row = Row::new()
                    .with("ID", 1i64)
                    .with("SHAPE", codec.encode_to_vec(&geometry));
                let decoded = dialect.decode_geometry_value(&mut codec, &row, "shape")?;
                assert_eq!(decoded.as_ref(), Some(&geometry), "{}", geometry);
            }
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_hex_text_and_null_cells() {
    run_test(
        create_test_context,
        |ctx| {
            let dialect = ctx.dialect();
            let mut codec = WkbCodec::with_byte_order(WkbByteOrder::BigEndian);
            let geometry = Geometry::Polygon(square(1.0));
            let hex = hex_upper(&codec.encode_to_vec(&geometry));

            let row = Row::new()
                .with("SHAPE", hex)
                .with("NOTHING", Value::Null);
            assert_eq!(
                dialect.decode_geometry_value(&mut codec, &row, ColumnRef::Index(0))?,
                Some(geometry)
            );
            assert_eq!(dialect.decode_geometry_value(&mut codec, &row, "NOTHING")?, None);
            Ok(())
        },
        cleanup,
    );
}

#[test]
fn test_extended_wkb_srid() {
    let mut codec = WkbCodec::new();
    let geometry = Geometry::point(8.0, 47.0);
    let bytes = codec.encode_with_srid(&geometry, 4326).to_vec();

    let (decoded, srid) = codec.decode_with_srid(&bytes).unwrap();
    assert_eq!(decoded, geometry);
    assert_eq!(srid, Some(4326));
    assert_eq!(codec.decode(&bytes).unwrap(), geometry);
}

#[test]
fn test_malformed_cell_names_column() {
    let mut codec = WkbCodec::new();
    let mut bytes = codec.encode_to_vec(&Geometry::line_string(vec![
        Coordinate::new(0.0, 0.0),
        Coordinate::new(1.0, 1.0),
    ]));
    bytes.truncate(bytes.len() - 4);

    let row = Row::new().with("SHAPE", bytes);
    match codec.read(&row, "SHAPE") {
        Err(SpatialError::MalformedWireFormat(msg)) => assert!(msg.starts_with("column SHAPE"), "{}", msg),
        other => panic!("unexpected {:?}", other),
    }

    let row = Row::new().with("SHAPE", 42i64);
    assert!(matches!(
        codec.read(&row, "SHAPE"),
        Err(SpatialError::MalformedWireFormat(_))
    ));
}

#[test]
fn test_codec_per_thread() {
    let handles: Vec<_> = (0..4)
        .map(|i| {
            std::thread::spawn(move || {
                let mut codec = WkbCodec::new();
                let geometry = Geometry::point(i as f64, -(i as f64));
                for _ in 0..100 {
                    let bytes = codec.encode_to_vec(&geometry);
                    assert_eq!(codec.decode(&bytes).unwrap(), geometry);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02X}", b)).collect()
}
