use capgrid_common::Entity;
use capgrid_eval::{
    BudgetClass, CellValueResolver, DraftMap, GridConfig, LatestMap, MatrixModel, Rollups,
    ViewMode,
};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

const PERIODS: [i32; 12] = [
    202601, 202602, 202603, 202604, 202605, 202606, 202607, 202608, 202609, 202610, 202611, 202612,
];

fn grid(entities: usize, mode: ViewMode) -> (MatrixModel, LatestMap) {
    let codes: Vec<Entity> = (0..entities)
        .map(|i| Entity::new(format!("WBS-{i:05}"), "line"))
        .collect();
    let model =
        MatrixModel::from_period_ids(PERIODS, codes, mode, &GridConfig::default()).unwrap();
    let latest = model
        .cell_keys()
        .enumerate()
        .map(|(i, key)| (key, (i % 7 != 0).then(|| format!("{}", i % 100))))
        .collect();
    (model, latest)
}

fn bench_rollups(c: &mut Criterion) {
    let mut group = c.benchmark_group("Rollups");
    let config = GridConfig::default();
    let drafts = DraftMap::default();

    for n in [100usize, 1000, 5000] {
        // Project total over every cell of a one-year budget grid.
        let (budget, budget_values) = grid(
            n,
            ViewMode::Budget {
                class: BudgetClass::Orig,
            },
        );
        let budget_rollups = Rollups::new(
            &budget,
            CellValueResolver::new(&budget_values, &drafts),
            &config,
        );
        group.bench_with_input(BenchmarkId::new("ColumnTotal/Sum", n), &n, |b, _| {
            b.iter(|| budget_rollups.column_total(black_box("ORIG")))
        });

        // Two-tier earned value against the budget grid above.
        let (progress, progress_values) = grid(
            n,
            ViewMode::Progress {
                with_actual_cost: false,
            },
        );
        let progress_rollups = Rollups::new(
            &progress,
            CellValueResolver::new(&progress_values, &drafts),
            &config,
        );
        group.bench_with_input(BenchmarkId::new("EarnedValue", n), &n, |b, _| {
            b.iter(|| progress_rollups.earned_value_progress(black_box(&budget_rollups)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rollups);
criterion_main!(benches);
