use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use dynstmt::{WhereBuilder, WhereRule};

/// Build a flat WHERE with `n` scalar rules:
/// (`col0` = :t_…) AND (`col1` = :t_…) ...
fn build_flat(n: usize) -> WhereBuilder {
    let mut w = WhereBuilder::new();
    for i in 0..n {
        let verb = if i == 0 { "" } else { "AND" };
        w.add_rule(verb, &format!("col{i}"), "=", i as i64, "INT")
            .unwrap();
    }
    w
}

fn bench_get_where(c: &mut Criterion) {
    let mut group = c.benchmark_group("where_builder/get_where");

    for n in [1, 5, 10, 50, 100] {
        let w = build_flat(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &w, |b, w| {
            b.iter(|| black_box(w.get_where()));
        });
    }

    group.finish();
}

fn bench_build_flat(c: &mut Criterion) {
    let mut group = c.benchmark_group("where_builder/build_flat");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_flat(n).get_where()));
        });
    }

    group.finish();
}

fn bench_in_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("where_builder/in_list");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| {
                let mut w = WhereBuilder::new();
                w.add_rule("", "id", "IN", values.clone(), "INT").unwrap();
                black_box(w.get_where());
            });
        });
    }

    group.finish();
}

fn bench_compound(c: &mut Criterion) {
    let mut group = c.benchmark_group("where_builder/compound");

    for n in [2, 5, 10] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut w = WhereBuilder::new();
                let groups = (0..n)
                    .map(|i| {
                        w.group_rules(vec![
                            WhereRule::new("OR", format!("a{i}"), "=", i as i64, "INT").unwrap(),
                            WhereRule::new("AND", format!("b{i}"), "<", i as i64, "INT").unwrap(),
                        ])
                        .unwrap()
                    })
                    .collect();
                w.add_compound(groups, "AND").unwrap();
                black_box(w.get_where());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_get_where,
    bench_build_flat,
    bench_in_list,
    bench_compound
);
criterion_main!(benches);
