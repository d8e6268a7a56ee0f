use criterion::{black_box, criterion_group, criterion_main, Criterion};
use livemark_evaluator::{compile_module, instantiate, ComponentRegistry, UnknownTagFallback};
use livemark_parser::parse;

const SMALL: &str = r#"# Welcome

Some *text* with a [link](https://example.com).
"#;

const MEDIUM: &str = r#"export const product = "Livemark"

# {product} guide

<Callout type="info" title="Note">
Components and **markdown** mix freely.
</Callout>

<Tabs>
<Tab label="npm">
npm install livemark
</Tab>
<Tab label="cargo">
cargo install livemark
</Tab>
</Tabs>

- one
- two
- three

| a | b |
| - | - |
| {1 + 1} | {product.toUpperCase()} |
"#;

fn compile_small_document(c: &mut Criterion) {
    let doc = parse(SMALL).unwrap();

    c.bench_function("compile_small_document", |b| {
        b.iter(|| compile_module(black_box(&doc), black_box(SMALL)))
    });
}

fn instantiate_medium_document(c: &mut Criterion) {
    let doc = parse(MEDIUM).unwrap();
    let module = compile_module(&doc, MEDIUM).unwrap();
    let snapshot = ComponentRegistry::with_builtins().snapshot();

    c.bench_function("instantiate_medium_document", |b| {
        b.iter(|| instantiate(black_box(&module), &snapshot, UnknownTagFallback::Label))
    });
}

fn full_pipeline_medium_document(c: &mut Criterion) {
    let snapshot = ComponentRegistry::with_builtins().snapshot();

    c.bench_function("full_pipeline_medium_document", |b| {
        b.iter(|| {
            let doc = parse(black_box(MEDIUM)).unwrap();
            let module = compile_module(&doc, MEDIUM).unwrap();
            instantiate(&module, &snapshot, UnknownTagFallback::Label)
        })
    });
}

criterion_group!(
    benches,
    compile_small_document,
    instantiate_medium_document,
    full_pipeline_medium_document
);
criterion_main!(benches);
