use criterion::{black_box, criterion_group, criterion_main, Criterion};
use shadowed::assets::{AssetsOptions, AssetsReader};
use shadowed::codec::{self, Shaped};
use shadowed::header::{align, Endian, Header};
use shadowed::meta::{MetaData, ObjectRecord, TypesHeader};
use shadowed::rebuild::{rebuild, CustomObject, Replacement};
use std::io::Cursor;

const OBJECTS: u32 = 2000;

fn sample_meta() -> MetaData {
    let objects = (0..OBJECTS)
        .map(|i| ObjectRecord { id: i + 1, shift: i * 256, size: 250, type_id: 83, class_id: 83, destroyed: 0 })
        .collect();
    MetaData {
        types: TypesHeader { signature: 0, flags: 0, classes: Vec::new(), unknown: 0 },
        objects,
        externals: Vec::new(),
    }
}

fn sample_container() -> Vec<u8> {
    let meta = sample_meta();
    let meta_bytes = meta.to_bytes(Endian::Little).unwrap();
    let data_offset = align(20 + meta_bytes.len() as u64, 8);
    let header = Header {
        meta_size:   meta_bytes.len() as u32,
        file_size:   (data_offset + u64::from(OBJECTS) * 256) as u32,
        version:     9,
        data_offset: data_offset as u32,
        byte_order:  0,
        reserved:    [0; 3],
    };
    let mut out = Vec::new();
    header.write(&mut out).unwrap();
    out.extend_from_slice(&meta_bytes);
    out.resize(header.file_size as usize, 0x5A);
    out
}

fn bench_metadata(c: &mut Criterion) {
    let bytes = sample_meta().to_bytes(Endian::Little).unwrap();

    c.bench_function("decode_metadata_2k_objects", |b| {
        b.iter(|| {
            let meta: MetaData = codec::read(&mut Cursor::new(black_box(&bytes)), Endian::Little).unwrap();
            meta
        })
    });
}

fn bench_rebuild(c: &mut Criterion) {
    let bytes = sample_container();
    let add = [CustomObject { type_id: 83, class_id: 83, data: vec![1u8; 4096] }];
    let replace = [Replacement { target_id: 10, object: CustomObject { type_id: 83, class_id: 83, data: vec![2u8; 1000] } }];

    c.bench_function("rebuild_2k_objects", |b| {
        b.iter(|| {
            let mut src = AssetsReader::new(Cursor::new(black_box(bytes.clone())), &AssetsOptions::default()).unwrap();
            let mut out = Cursor::new(Vec::with_capacity(bytes.len() + 8192));
            rebuild(&mut src, &mut out, &add, &replace, &[]).unwrap()
        })
    });
}

criterion_group!(benches, bench_metadata, bench_rebuild);
criterion_main!(benches);
