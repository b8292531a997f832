use criterion::{Criterion, Throughput};
use std::hint::black_box;
use xshell::Error;
use xshell::shell::{HistoryRing, LineEditor, NoHistory, ShellOptions};
use xshell::stream::Stream;

/// Terminal that swallows everything.
struct NullTerminal;

impl Stream for NullTerminal {
    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, Error> {
        Ok(0)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        Ok(buf.len())
    }
}

pub fn bench_typing(c: &mut Criterion) {
    let mut group = c.benchmark_group("editor");
    // Plain text, a cursor move, a mid-line insert and a backspace.
    let input = b"echo hello world\x1b[D\x1b[D!\x08\r";
    group.throughput(Throughput::Bytes(input.len() as u64));
    group.bench_function("typing", |b| {
        let mut editor = LineEditor::new(&ShellOptions::default());
        let mut terminal = NullTerminal;
        b.iter(|| {
            editor.begin(&mut NoHistory);
            for &byte in input.iter() {
                black_box(editor.feed(byte, &mut terminal, "> ", &mut NoHistory));
            }
        })
    });
    group.finish();
}

pub fn bench_history_recall(c: &mut Criterion) {
    let mut group = c.benchmark_group("editor");
    group.bench_function("history_recall", |b| {
        let mut editor = LineEditor::new(&ShellOptions::default());
        let mut terminal = NullTerminal;
        let mut history = HistoryRing::<4>::new();
        for line in ["led on", "led off", "systime", "mem"] {
            history.push(line);
        }
        b.iter(|| {
            editor.begin(&mut history);
            for &byte in b"\x1b[A\x1b[A\x1b[A\x1b[B".iter() {
                black_box(editor.feed(byte, &mut terminal, "> ", &mut history));
            }
        })
    });
    group.finish();
}
