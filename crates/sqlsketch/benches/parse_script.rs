use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use sqlsketch::generate::{SelectOptions, SelectedField, generate_select};
use sqlsketch::{TableRef, parse_script};

/// A chain of `n` tables, each referencing the previous one:
/// t0 <- t1 <- t2 ... with a unique column and an index per table.
fn build_script(n: usize) -> String {
    let mut sql = String::new();
    for i in 0..n {
        sql.push_str(&format!(
            "CREATE TABLE IF NOT EXISTS `bench`.`t{i}` (\n\
             \x20 `id` INT NOT NULL AUTO_INCREMENT,\n\
             \x20 `code` VARCHAR(32) NOT NULL,\n\
             \x20 `price` DECIMAL(10,2) DEFAULT 0,\n"
        ));
        if i > 0 {
            sql.push_str(&format!(
                "  `t{p}_id` INT NOT NULL,\n\
                 \x20 INDEX `fk_t{i}_t{p}_idx` (`t{p}_id` ASC) VISIBLE,\n\
                 \x20 CONSTRAINT `fk_t{i}_t{p}` FOREIGN KEY (`t{p}_id`)\n\
                 \x20   REFERENCES `bench`.`t{p}` (`id`) ON DELETE NO ACTION,\n",
                p = i - 1
            ));
        }
        sql.push_str("  UNIQUE INDEX `code_UNIQUE` (`code` ASC) VISIBLE,\n  PRIMARY KEY (`id`));\n\n");
    }
    sql
}

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("parser/parse_script");

    for n in [1, 10, 50, 200] {
        let script = build_script(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &script, |b, script| {
            b.iter(|| black_box(parse_script(script)));
        });
    }

    group.finish();
}

fn bench_select_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("generate/select_join_chain");

    for n in [2, 10, 50] {
        let tables = parse_script(&build_script(n));
        let opts = SelectOptions::new(vec![
            SelectedField::new(TableRef::new("bench", "t0"), "code"),
            SelectedField::new(TableRef::new("bench", format!("t{}", n - 1)), "code"),
        ]);
        group.bench_with_input(BenchmarkId::from_parameter(n), &tables, |b, tables| {
            b.iter(|| black_box(generate_select(tables, &opts)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_select_join);
criterion_main!(benches);
