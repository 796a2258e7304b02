use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use dai::{parse, tokenize};

fn mega_script() -> String {
    let mut script = String::new();
    for i in 0..200 {
        script += &format!(
            "fn f{i}(a, b=1) {{\n    var x = a + b * {i};\n    if (x < 10) {{ return x; }} else {{ return 0; }}\n}}\n"
        );
    }
    script
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let source = mega_script();
    let (tokens, _) = tokenize(&source);
    let (program, _) = parse(tokens.clone());

    let mut group = c.benchmark_group("fmt-throughput");
    group.throughput(Throughput::Bytes(source.len() as u64));
    group.bench_function("tokenize+parse+format", |b| {
        b.iter(|| {
            let (tokens, _) = tokenize(black_box(&source));
            let (program, _) = parse(tokens.clone());
            dai_fmt::format(&program, &tokens, source.len())
        })
    });
    group.bench_function("format only", |b| {
        b.iter(|| dai_fmt::format(black_box(&program), black_box(&tokens), source.len()))
    });
    group.finish();
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
