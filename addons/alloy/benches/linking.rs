use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use evm_harness_addon_alloy::codec::{
    link_bytecode, needed_libraries, resolve_links, LibraryBinding,
};
use evm_harness_kit::artifacts::{ContractArtifact, LinkReferences, Offsets};
use evm_harness_kit::indexmap::IndexMap;

const CODE_CHUNK: &str = "60806040526000526020";

fn placeholder(index: usize) -> String {
    format!("__${:034x}$__", index)
}

fn library_address(index: usize) -> String {
    format!("0x{:040x}", index + 1)
}

fn linked_artifact(libraries: usize, slots_per_library: usize) -> ContractArtifact {
    let mut bytecode = String::from("0x");
    let mut link_references: LinkReferences = IndexMap::new();
    let mut cursor = 0u32;

    for library in 0..libraries {
        let mut slots = Vec::with_capacity(slots_per_library);
        for _ in 0..slots_per_library {
            bytecode.push_str(CODE_CHUNK);
            cursor += (CODE_CHUNK.len() / 2) as u32;
            bytecode.push_str(&placeholder(library));
            slots.push(Offsets { start: cursor, length: 20 });
            cursor += 20;
        }
        link_references
            .entry(format!("contracts/libraries/Lib{}.sol", library))
            .or_insert_with(IndexMap::new)
            .insert(format!("Lib{}", library), slots);
    }
    bytecode.push_str(CODE_CHUNK);

    ContractArtifact {
        contract_name: "Router".to_string(),
        source_name: "contracts/Router.sol".to_string(),
        abi: vec![],
        bytecode,
        deployed_bytecode: None,
        link_references,
        deployed_link_references: IndexMap::new(),
    }
}

fn bindings(libraries: usize) -> Vec<LibraryBinding> {
    (0..libraries)
        .map(|library| LibraryBinding::new(&format!("Lib{}", library), library_address(library)))
        .collect()
}

fn benchmark_link_by_library_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("link_bytecode_libraries");

    for num_libraries in [1usize, 4, 16].iter() {
        let artifact = linked_artifact(*num_libraries, 2);
        let bindings = bindings(*num_libraries);
        group.bench_with_input(
            BenchmarkId::from_parameter(num_libraries),
            num_libraries,
            |b, _| {
                b.iter(|| {
                    let linked = link_bytecode(black_box(&artifact), black_box(&bindings)).unwrap();
                    black_box(linked);
                });
            },
        );
    }
    group.finish();
}

fn benchmark_link_by_slot_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("link_bytecode_slots");

    for slots in [1usize, 8, 64].iter() {
        let artifact = linked_artifact(1, *slots);
        let bindings = bindings(1);
        group.bench_with_input(BenchmarkId::from_parameter(slots), slots, |b, _| {
            b.iter(|| {
                let linked = link_bytecode(black_box(&artifact), black_box(&bindings)).unwrap();
                black_box(linked);
            });
        });
    }
    group.finish();
}

fn benchmark_resolution(c: &mut Criterion) {
    let artifact = linked_artifact(16, 2);
    let bindings = bindings(16);

    c.bench_function("needed_libraries", |b| {
        b.iter(|| black_box(needed_libraries(black_box(&artifact))));
    });

    c.bench_function("resolve_links", |b| {
        b.iter(|| {
            let resolved = resolve_links(black_box(&artifact), black_box(&bindings)).unwrap();
            black_box(resolved);
        });
    });
}

criterion_group!(
    benches,
    benchmark_link_by_library_count,
    benchmark_link_by_slot_fanout,
    benchmark_resolution
);
criterion_main!(benches);
