use criterion::{criterion_group, criterion_main};

mod shell;

criterion_group!(
    benches,
    shell::tokenizer::bench_single_command,
    shell::tokenizer::bench_multi_command,
    shell::editor::bench_typing,
    shell::editor::bench_history_recall
);
criterion_main!(benches);
