use collabpad_engine::{
    ChangeAction, ChangeEvent, EditorAdapter, EditorHost, Operation, Position, PositionRange,
    RopeEditor, Snapshot, StyleSheet, TextOperation, offset_from_position,
    operations_from_change, position_from_offset,
};
use criterion::{Criterion, black_box, criterion_group, criterion_main};

fn generate_document(lines: usize) -> String {
    (0..lines)
        .map(|i| format!("line {i} with some content to edit, ünïcödé included"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bench_coordinate_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("coordinate_mapping");
    group.sample_size(20);

    let snapshot = Snapshot::from_text(&generate_document(1_000));
    let middle = snapshot.len() / 2;

    group.bench_function("position_from_offset", |b| {
        b.iter(|| black_box(position_from_offset(black_box(middle), snapshot.lines())));
    });

    let position = snapshot.position_from_offset(middle);
    group.bench_function("offset_from_position", |b| {
        b.iter(|| black_box(offset_from_position(black_box(position), snapshot.lines())));
    });

    group.finish();
}

fn bench_change_translation(c: &mut Criterion) {
    let mut group = c.benchmark_group("change_translation");
    group.sample_size(20);

    let snapshot = Snapshot::from_text(&generate_document(1_000));
    let start = Position::new(500, 10);
    let change = ChangeEvent::Text {
        action: ChangeAction::Insert,
        range: PositionRange::ordered(start, start.advanced_by("typed")),
        text: "typed".to_string(),
    };

    group.bench_function("operations_from_change", |b| {
        b.iter(|| {
            let pair: (TextOperation, TextOperation) =
                operations_from_change(black_box(&change), &snapshot, "\n").unwrap();
            black_box(pair);
        });
    });

    group.finish();
}

fn bench_apply_operation(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_operation");
    group.sample_size(20);

    let text = generate_document(1_000);
    let len = Snapshot::from_text(&text).len();
    let operation = TextOperation::new()
        .retain(len / 2)
        .insert("remote edit\n")
        .retain(len - len / 2);
    let undo = TextOperation::new()
        .retain(len / 2)
        .delete("remote edit\n")
        .retain(len - len / 2);

    let mut adapter = EditorAdapter::new(RopeEditor::new(&text), StyleSheet::new());
    group.bench_function("insert_then_undo", |b| {
        b.iter(|| {
            adapter.apply_operation(black_box(&operation)).unwrap();
            adapter.apply_operation(black_box(&undo)).unwrap();
        });
    });
    black_box(adapter.host().lines().len());

    group.finish();
}

criterion_group!(
    benches,
    bench_coordinate_mapping,
    bench_change_translation,
    bench_apply_operation
);
criterion_main!(benches);
