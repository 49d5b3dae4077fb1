//! Criterion benchmarks for guardian-core.
//!
//! ## Benchmark groups
//!
//! 1. **structural**: Tree-sitter mapping at several unit sizes.
//! 2. **semantic**: Concept extraction, complexity and similarity.
//! 3. **checks**: Metrics and dangerous-construct scanning.
//! 4. **patch**: Diff generation and heuristic application.
//! 5. **heal**: Syntax and structure repair passes.
//! 6. **guardian**: End-to-end analyze / compare through the orchestrator.
//!
//! ## Running
//!
//! ```sh
//! cargo bench --manifest-path crates/guardian-core/Cargo.toml
//! # Run only the orchestrator group:
//! cargo bench --manifest-path crates/guardian-core/Cargo.toml -- guardian
//! ```

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use guardian_core::analyzer::semantic::{jaccard, summarize};
use guardian_core::analyzer::structural::StructuralAnalyzer;
use guardian_core::analyzer::tester::{dangerous_constructs, metrics};
use guardian_core::config::{GuardianConfig, SourceLanguage};
use guardian_core::{
    apply_patch, front_end_for, generate_patch, heal_structure, heal_syntax, Guardian,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Synthetic Python unit with `classes` classes of four methods each plus a
/// block of module-level functions.
fn python_unit(classes: usize) -> String {
    let mut src = String::from("import os\nimport json\nfrom collections import defaultdict\n\n");
    for c in 0..classes {
        src.push_str(&format!("class CombatEngine{c}:\n"));
        src.push_str("    \"\"\"Tracks player energy and inventory state.\"\"\"\n\n");
        for m in 0..4 {
            src.push_str(&format!(
                "    def handle_event_{m}(self, event, world=None):\n        if event.energy > {m}:\n            for item in self.inventory:\n                item.tick(world)\n        return self.state\n\n"
            ));
        }
    }
    for f in 0..classes {
        src.push_str(&format!(
            "def resource_system_{f}(config, network):\n    while network.pending():\n        network.poll(config)\n    return {f}\n\n"
        ));
    }
    src
}

fn go_unit(types: usize) -> String {
    let mut src = String::from("package engine\n\nimport (\n\t\"fmt\"\n\t\"time\"\n)\n\n");
    for t in 0..types {
        src.push_str(&format!(
            "type Entity{t} struct {{\n\tName string\n\tEnergy int\n}}\n\nfunc (e *Entity{t}) Tick(now time.Time, delta int) {{\n\tif e.Energy > delta {{\n\t\tfmt.Println(now)\n\t}}\n}}\n\n"
        ));
    }
    src
}

// ---------------------------------------------------------------------------
// Benchmark: Structural mapping
// ---------------------------------------------------------------------------

fn bench_structural(c: &mut Criterion) {
    let mut group = c.benchmark_group("structural");
    let python = StructuralAnalyzer::new(front_end_for(SourceLanguage::Python));
    let go = StructuralAnalyzer::new(front_end_for(SourceLanguage::Go));

    for size in [1usize, 10, 100] {
        let src = python_unit(size);
        group.bench_with_input(BenchmarkId::new("python_map", size), &src, |b, src| {
            b.iter(|| black_box(python.map(black_box(src), "bench")));
        });
    }

    let go_src = go_unit(20);
    group.bench_function("go_map_20_types", |b| {
        b.iter(|| black_box(go.map(black_box(&go_src), "bench")));
    });

    let broken = format!("{}def broken(:\n", python_unit(10));
    group.bench_function("python_map_syntax_error", |b| {
        b.iter(|| black_box(python.map(black_box(&broken), "bench")));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: Semantic summary
// ---------------------------------------------------------------------------

fn bench_semantic(c: &mut Criterion) {
    let mut group = c.benchmark_group("semantic");

    for size in [1usize, 10, 100] {
        let src = python_unit(size);
        group.bench_with_input(BenchmarkId::new("summarize", size), &src, |b, src| {
            b.iter(|| black_box(summarize(black_box(src))));
        });
    }

    let a = summarize(&python_unit(5)).concepts;
    let b_set = summarize(&go_unit(5)).concepts;
    group.bench_function("jaccard", |b| {
        b.iter(|| jaccard(black_box(&a), black_box(&b_set)));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: Basic checks
// ---------------------------------------------------------------------------

fn bench_checks(c: &mut Criterion) {
    let mut group = c.benchmark_group("checks");
    let src = python_unit(50);

    group.bench_function("metrics_50_classes", |b| {
        b.iter(|| black_box(metrics(black_box(&src))));
    });

    let risky = format!("{src}value = eval(payload)\nexec(code)\n");
    group.bench_function("dangerous_constructs", |b| {
        b.iter(|| black_box(dangerous_constructs(black_box(&risky))));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: Patch generation and application
// ---------------------------------------------------------------------------

fn bench_patch(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch");

    for size in [10usize, 100] {
        let original = python_unit(size);
        let modified = original.replacen("return self.state", "return self.state.copy()", size);
        group.bench_with_input(
            BenchmarkId::new("generate_scattered_edits", size),
            &(original, modified),
            |b, (original, modified)| {
                b.iter(|| black_box(generate_patch(black_box(original), black_box(modified))));
            },
        );
    }

    let original = python_unit(20);
    let appended = format!("{original}def extra():\n    return None\n");
    let patch = generate_patch(&original, &appended);
    group.bench_function("apply_append", |b| {
        b.iter(|| black_box(apply_patch(black_box(&original), black_box(&patch)).unwrap()));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: Repair passes
// ---------------------------------------------------------------------------

fn bench_heal(c: &mut Criterion) {
    let mut group = c.benchmark_group("heal");
    let base = python_unit(20);
    let damaged = format!("{base}\tvalues = [1, 2, (3\n{base}");

    group.bench_function("heal_syntax", |b| {
        b.iter(|| black_box(heal_syntax(black_box(&damaged))));
    });

    group.bench_function("heal_structure_duplicates", |b| {
        b.iter(|| black_box(heal_structure(black_box(&damaged))));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Benchmark: Orchestrator
// ---------------------------------------------------------------------------

fn bench_guardian(c: &mut Criterion) {
    let mut group = c.benchmark_group("guardian");
    let src = python_unit(10);

    group.bench_function("analyze_python_10_classes", |b| {
        let guardian = Guardian::default();
        b.iter(|| black_box(guardian.analyze(black_box(&src), "unit").unwrap()));
    });

    group.bench_function("analyze_with_auto_heal", |b| {
        let guardian = Guardian::new(GuardianConfig {
            auto_heal: true,
            ..GuardianConfig::default()
        });
        b.iter(|| black_box(guardian.analyze(black_box(&src), "unit").unwrap()));
    });

    group.bench_function("compare", |b| {
        let guardian = Guardian::default();
        guardian.analyze(&src, "a").unwrap();
        guardian.analyze(&go_unit(10), "b").unwrap();
        b.iter(|| black_box(guardian.compare("a", "b").unwrap()));
    });

    group.bench_function("analyze_bounded_memory_churn", |b| {
        let guardian = Guardian::new(GuardianConfig {
            max_records: Some(64),
            ..GuardianConfig::default()
        });
        let mut n = 0usize;
        b.iter(|| {
            n += 1;
            black_box(guardian.analyze(&src, &format!("unit-{}", n % 256)).unwrap())
        });
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Register all benchmark groups
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_structural,
    bench_semantic,
    bench_checks,
    bench_patch,
    bench_heal,
    bench_guardian,
);
criterion_main!(benches);
