use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgrepo::{FieldDef, IdentityPolicy, QueryBuilder, RecordSchema, SemanticType};

/// Leak a schema with an identity plus `n` text columns named `col0..colN`.
fn wide_schema(n: usize) -> &'static RecordSchema {
    let mut fields = vec![FieldDef::new("id", SemanticType::Integer).identity()];
    for i in 0..n {
        let name: &'static str = Box::leak(format!("col{i}").into_boxed_str());
        fields.push(FieldDef::new(name, SemanticType::Text));
    }
    let fields: &'static [FieldDef] = Box::leak(fields.into_boxed_slice());
    Box::leak(Box::new(RecordSchema::new(
        fields,
        IdentityPolicy::ServerGenerated,
    )))
}

fn bench_statements(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/statement");

    for n in [1, 5, 10, 50, 100] {
        let qb = QueryBuilder::new("public.wide", wide_schema(n)).expect("valid schema");
        group.bench_with_input(BenchmarkId::new("insert", n), &qb, |b, qb| {
            b.iter(|| black_box(qb.insert()));
        });
        group.bench_with_input(BenchmarkId::new("upsert", n), &qb, |b, qb| {
            b.iter(|| black_box(qb.upsert()));
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("query_builder/to_sql");

    for n in [1, 10, 100] {
        let stmt = QueryBuilder::new("wide", wide_schema(n))
            .and_then(|qb| qb.upsert())
            .expect("valid schema");
        group.bench_with_input(BenchmarkId::from_parameter(n), &stmt, |b, stmt| {
            b.iter(|| black_box(stmt.to_sql()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_statements, bench_render);
criterion_main!(benches);
