use serde_json::json;
use strata_core::{
    calcsize, nbytes, pack, pack_and_dump, unpack, unpack_and_dump, ArrayType, Codec, DumpValue,
    Layout, LayoutError, SizedArrayType, SizedObjectType, StructureType,
};

fn matrix() -> Layout {
    Layout::from(ArrayType::fixed(Layout::uint16(), &[2, 2]).unwrap())
}

const MATRIX_BYTES: [u8; 8] = [0x00, 0x00, 0x01, 0x00, 0x00, 0x01, 0x01, 0x01];

#[test]
fn matrix_packs_row_major() {
    let m = matrix();
    let value = m.build(&json!([[0, 1], [256, 257]])).unwrap();
    assert_eq!(pack(&m, &value).unwrap(), MATRIX_BYTES);
    assert_eq!(calcsize(&m).unwrap(), 8);
    assert_eq!(nbytes(&m, &value).unwrap(), 8);
}

#[test]
fn matrix_unpacks_with_views() {
    let value = unpack(&matrix(), &MATRIX_BYTES).unwrap();
    assert_eq!(value, json!([[0, 1], [256, 257]]));
    let array = value.as_array().unwrap();
    let row = array.get(1).unwrap().as_array().unwrap();
    assert_eq!(row, json!([256, 257]));
    assert_eq!(row.get(0).unwrap().as_item().unwrap().as_u64(), Some(256));
}

#[test]
fn seven_bytes_fail_on_last_element() {
    let err = unpack(&matrix(), &MATRIX_BYTES[..7]).unwrap_err();
    let LayoutError::InsufficientMemory { shortfall, .. } = &err else {
        panic!("expected InsufficientMemory, got {err:?}");
    };
    assert_eq!(*shortfall, 1);

    let dump = err.dump().unwrap();
    let failure = dump.failure().unwrap();
    assert_eq!(failure.path.to_string(), "x[1][1]");
    assert_eq!(failure.offset, 6);
    assert_eq!(failure.bytes, vec![0x01]);
    assert_eq!(failure.value, DumpValue::Insufficient { shortfall: 1 });
    assert_eq!(dump.records().last(), Some(failure));

    let decoded: Vec<String> = dump
        .iter()
        .filter(|r| matches!(r.value, DumpValue::Decoded(_)))
        .map(|r| r.path.to_string())
        .collect();
    assert_eq!(decoded, ["x[0][0]", "x[0][1]", "x[1][0]"]);
}

#[test]
fn nine_bytes_report_one_excess_byte() {
    let mut data = MATRIX_BYTES.to_vec();
    data.push(0x99);
    let err = unpack(&matrix(), &data).unwrap_err();
    match &err {
        LayoutError::ExcessMemory {
            unconsumed,
            consumed,
            available,
            ..
        } => {
            assert_eq!(*unconsumed, 1);
            assert_eq!(*consumed, 8);
            assert_eq!(*available, 9);
        }
        other => panic!("expected ExcessMemory, got {other:?}"),
    }
    let last = err.dump().unwrap().records().last().unwrap();
    assert_eq!(last.value, DumpValue::Excess);
    assert_eq!(last.bytes, vec![0x99]);
    assert_eq!(last.offset, 8);
}

fn record() -> Layout {
    let samples = SizedArrayType::builder("Samples")
        .dims("count", Layout::uint8())
        .array("array", Layout::uint16())
        .build()
        .unwrap();
    let blob = SizedObjectType::builder("Blob")
        .size("size", Layout::uint8())
        .factor(2)
        .item(
            "item",
            Layout::from(ArrayType::greedy(Layout::uint8(), &[]).unwrap()),
        )
        .build()
        .unwrap();
    Layout::from(
        StructureType::builder("Record")
            .member("tag", Layout::uint32())
            .member("samples", Layout::from(samples))
            .member("blob", Layout::from(blob))
            .build()
            .unwrap(),
    )
}

#[test]
fn nested_round_trip() {
    let r = record();
    let value = r
        .build(&json!({
            "tag": 7,
            "samples": [1, 2, 3],
            "blob": [9, 8, 7, 6],
        }))
        .unwrap();
    let bytes = pack(&r, &value).unwrap();
    assert_eq!(bytes.len(), nbytes(&r, &value).unwrap());
    assert_eq!(bytes.len(), 4 + 1 + 6 + 1 + 4);
    let decoded = unpack(&r, &bytes).unwrap();
    assert_eq!(decoded, value);
    assert_eq!(pack(&r, &decoded).unwrap(), bytes);
    assert!(matches!(calcsize(&r), Err(LayoutError::Size { .. })));
}

#[test]
fn nested_shortage_points_at_field() {
    let r = record();
    let value = r
        .build(&json!({"tag": 1, "samples": [5, 6], "blob": [1, 2]}))
        .unwrap();
    let bytes = pack(&r, &value).unwrap();
    let err = unpack(&r, &bytes[..7]).unwrap_err();
    let failure = err.dump().unwrap().failure().unwrap();
    assert_eq!(failure.path.to_string(), "x.samples.array[1]");
    assert_eq!(failure.type_name, "UInt16");
}

#[test]
fn sized_object_bounds_greedy_item() {
    let blob = SizedObjectType::builder("Blob")
        .size("size", Layout::uint8())
        .factor(2)
        .item(
            "item",
            Layout::from(ArrayType::greedy(Layout::uint8(), &[]).unwrap()),
        )
        .build()
        .unwrap();
    let outer = Layout::from(
        StructureType::builder("Framed")
            .member("blob", Layout::from(blob.clone()))
            .member("trailer", Layout::uint8())
            .build()
            .unwrap(),
    );
    let data = [2, 0xA, 0xB, 0xC, 0xD, 0xEE];
    let value = unpack(&outer, &data).unwrap();
    assert_eq!(
        value,
        json!({"blob": {"size": 2, "item": [10, 11, 12, 13]}, "trailer": 0xEE})
    );

    // On its own the same bytes leave the trailer unconsumed.
    let err = unpack(&Layout::from(blob), &data).unwrap_err();
    assert!(matches!(err, LayoutError::ExcessMemory { unconsumed: 1, .. }));
}

#[test]
fn dims_inference_is_idempotent() {
    let grid = SizedArrayType::builder("Grid")
        .dims(
            "shape",
            Layout::from(ArrayType::fixed(Layout::uint16(), &[2]).unwrap()),
        )
        .array("cells", Layout::uint8())
        .build()
        .unwrap();
    let layout = Layout::from(grid);
    let data = json!([[1, 2, 3], [4, 5, 6]]);
    let value = layout.build(&data).unwrap();
    let (bytes, dump) = pack_and_dump(&layout, &value).unwrap();
    assert_eq!(dump.find("x.shape[0]").unwrap().bytes, vec![2, 0]);

    let decoded = unpack(&layout, &bytes).unwrap();
    let s = decoded.as_structure().unwrap();
    assert_eq!(*s.get("shape").unwrap(), json!([2, 3]));
    assert_eq!(*s.primary().unwrap(), data);
    assert_eq!(decoded, value);
}

#[test]
fn dump_covers_every_field() {
    let r = record();
    let value = r
        .build(&json!({"tag": 1, "samples": [5], "blob": [1, 2]}))
        .unwrap();
    let bytes = pack(&r, &value).unwrap();
    let (_, dump) = unpack_and_dump(&r, &bytes).unwrap();
    let paths: Vec<String> = dump.iter().map(|r| r.path.to_string()).collect();
    assert_eq!(
        paths,
        [
            "x",
            "x.tag",
            "x.samples",
            "x.samples.count",
            "x.samples.array",
            "x.samples.array[0]",
            "x.blob",
            "x.blob.size",
            "x.blob.item",
            "x.blob.item[0]",
            "x.blob.item[1]",
        ]
    );
    assert!(dump.failure().is_none());
}

#[test]
fn sized_object_owns_its_whole_budget() {
    let blob = SizedObjectType::builder("Blob")
        .size("size", Layout::uint8())
        .item("item", Layout::uint8())
        .build()
        .unwrap();
    let framed = Layout::from(
        StructureType::builder("Framed")
            .member("blob", Layout::from(blob))
            .member("trailer", Layout::uint8())
            .member("t2", Layout::uint8())
            .build()
            .unwrap(),
    );
    let err = unpack(&framed, &[2, 0xAA, 0xBB, 0xCC]).unwrap_err();
    assert!(matches!(err, LayoutError::ExcessMemory { unconsumed: 1, .. }));
    let failure = err.dump().unwrap().failure().unwrap();
    assert_eq!(failure.path.to_string(), "x.blob.item");
    assert_eq!(failure.offset, 2);

    let value = unpack(&framed, &[1, 0xAA, 0xBB, 0xCC]).unwrap();
    assert_eq!(pack(&framed, &value).unwrap(), [1, 0xAA, 0xBB, 0xCC]);
}

#[test]
fn corrupt_count_reports_shortfall() {
    let samples = Layout::from(
        SizedArrayType::builder("Samples")
            .dims("count", Layout::uint32())
            .array("array", Layout::uint16())
            .build()
            .unwrap(),
    );
    let err = unpack(&samples, &[0xFF, 0xFF, 0xFF, 0xFF, 0x01, 0x02]).unwrap_err();
    assert!(matches!(err, LayoutError::InsufficientMemory { .. }));
    let dump = err.dump().unwrap();
    assert_eq!(dump.find("x.array[0]").unwrap().bytes, vec![0x01, 0x02]);
    let failure = dump.failure().unwrap();
    assert_eq!(failure.path.to_string(), "x.array[1]");
    assert_eq!(failure.value, DumpValue::Insufficient { shortfall: 2 });
}
