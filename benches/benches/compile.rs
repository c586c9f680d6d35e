use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tsharp::{CompilerOptions, compile};

const MODEL: &str = r#"
export interface Point { x: number; y: number; }

export class Shape {
  constructor(public name: string) {}
  area(): number { return 0; }
  describe(): string { return this.name + " " + this.area(); }
}

export class Circle extends Shape {
  constructor(public radius: number) { super("circle"); }
  area(): number { return Math.PI * this.radius * this.radius; }
}

export enum Kind { Small, Large = 10 }

export function* corners(p: Point): Generator<Point, void, number> {
  const scale: number = yield p;
  yield { x: p.x * scale, y: p.y };
}
"#;

fn program(modules: usize) -> Vec<(String, String)> {
    let mut sources: Vec<(String, String)> = (0..modules)
        .map(|i| (format!("shapes/m{}.ts", i), MODEL.to_string()))
        .collect();
    let mut main = String::new();
    for i in 0..modules {
        main.push_str(&format!("import {{ Circle as C{i} }} from \"./shapes/m{i}\";\n"));
    }
    for i in 0..modules {
        main.push_str(&format!("console.log(new C{i}({i}).describe());\n"));
    }
    sources.push(("main.ts".to_string(), main));
    sources
}

fn bench_compile(c: &mut Criterion) {
    let options = CompilerOptions::default();
    let mut group = c.benchmark_group("compile");
    for modules in [1usize, 8, 32] {
        let sources = program(modules);
        group.bench_with_input(BenchmarkId::from_parameter(modules), &sources, |b, sources| {
            b.iter(|| compile(black_box(sources), &options).expect("compile"));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
