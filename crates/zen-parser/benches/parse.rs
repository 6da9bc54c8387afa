use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;
use zen_parser::{Lexer, Parser, Scopes};

const DOCUMENT: &str = r#"
import map, filter from "std/seq"

set config
    retries 3, timeout 30, verbose true

function clamp value low high
    if value < low
        return low
    if value > high
        return high
    return value

class Counter
    method bump amount
        count += amount
        return count

set totals 1, 2, 3, 4, 5
for n in totals
    print clamp 5 0 3

set range 1..100
put "state.json".totals totals
export clamp
"#;

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_document", |b| {
        b.iter(|| {
            let mut scopes = Scopes::new();
            let mut parser = Parser::new(Lexer::new(black_box(DOCUMENT)));
            black_box(parser.parse(&mut scopes))
        })
    });

    c.bench_function("lex_document", |b| {
        b.iter(|| {
            let lexer = Lexer::new(black_box(DOCUMENT));
            black_box(lexer.count())
        })
    });
}

criterion_group!(benches, bench_parse);
criterion_main!(benches);
