use criterion::{Criterion, Throughput};
use std::hint::black_box;
use xshell::shell::{Argv, Delimiter, Tokenizer};

fn drain(line: &str, multi_command: bool) -> usize {
    let mut tokens = Tokenizer::new(line, multi_command);
    let mut argv = Argv::new();
    let mut commands = 0;
    loop {
        match tokens.next_command(&mut argv) {
            Ok(delimiter) => {
                commands += usize::from(!argv.is_empty());
                if delimiter != Delimiter::Separator {
                    return commands;
                }
            }
            Err(_) => return commands,
        }
    }
}

pub fn bench_single_command(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenizer");
    let line = "config set \"device name\" node-7";
    group.throughput(Throughput::Bytes(line.len() as u64));
    group.bench_function("single_command", |b| {
        b.iter(|| drain(black_box(line), false))
    });
    group.finish();
}

pub fn bench_multi_command(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenizer");
    let line = "led on; echo \"a;b\" ; systime;mem";
    group.throughput(Throughput::Bytes(line.len() as u64));
    group.bench_function("multi_command", |b| b.iter(|| drain(black_box(line), true)));
    group.finish();
}
