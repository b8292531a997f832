mod common;

use std::sync::Arc;

use common::ScriptStream;
use rand::Rng;
use rand::seq::SliceRandom;
use xshell::rt::{ExitReason, Pool, ShellManager};
use xshell::shell::{
    Argv, Command, Delimiter, LineEditor, MAX_ARGUMENTS, ManagerConfig, NoHistory, ShellOptions,
    StackSource, Tokenizer,
};

/// Bytes that exercise every editor state, with printable text in between.
const ALPHABET: &[u8] = b"ab \t\";\x1b[ABCD3~\x08\x7f\x15\x01\r\n";

#[test]
fn test_random_lines_never_break_the_tokenizer() {
    let mut rng = rand::thread_rng();
    for _ in 0..2000 {
        let len = rng.gen_range(0..80);
        let line: String = (0..len)
            .map(|_| *b"ab \t\";".choose(&mut rng).unwrap() as char)
            .collect();
        let multi = rng.r#gen::<bool>();

        let mut tokens = Tokenizer::new(&line, multi);
        let mut argv = Argv::new();
        for _ in 0..=line.len() {
            match tokens.next_command(&mut argv) {
                Ok(Delimiter::Separator) => assert!(multi),
                Ok(_) => break,
                Err(_) => {
                    assert_eq!(argv.len(), MAX_ARGUMENTS);
                    break;
                }
            }
        }
    }
}

#[test]
fn test_random_input_never_breaks_the_editor() {
    let mut rng = rand::thread_rng();
    for _ in 0..200 {
        let mut editor = LineEditor::new(&ShellOptions::default());
        let mut sink = ScriptStream::new("");
        for _ in 0..500 {
            let byte = if rng.gen_bool(0.1) {
                rng.r#gen::<u8>()
            } else {
                *ALPHABET.choose(&mut rng).unwrap()
            };
            editor.feed(byte, &mut sink, "> ", &mut NoHistory);
            assert!(editor.cursor() <= editor.line().len());
            assert!(editor.line().len() <= LineEditor::CAPACITY);
        }
    }
}

static NO_COMMANDS: &[Command] = &[Command::SENTINEL];

#[test]
fn test_random_sessions_end_cleanly() {
    let mut rng = rand::thread_rng();
    let multi = ShellOptions {
        multi_command: true,
        ..ShellOptions::default()
    };
    let config = ManagerConfig::new("fuzz", NO_COMMANDS, StackSource::Heap { size: 4096 })
        .with_options(multi);
    let manager = ShellManager::new(config, Arc::new(Pool::with_capacity(1)));

    for _ in 0..50 {
        // No Ctrl-D, so the session only ends when the script runs out.
        let input: Vec<u8> = (0..400)
            .map(|_| *ALPHABET.choose(&mut rng).unwrap())
            .collect();
        assert_eq!(manager.run(ScriptStream::new(input), &[]), ExitReason::Logout);
    }
    assert_eq!(manager.collect(|_| {}), 50);
}
