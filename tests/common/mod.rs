//! Mock streams for driving sessions.
#![allow(dead_code)]

use std::sync::mpsc::{Receiver, Sender, channel};
use std::sync::{Arc, Mutex};

use xshell::Error;
use xshell::stream::Stream;

/// Captured output, readable while the session still runs.
#[derive(Clone, Default)]
pub struct Output(Arc<Mutex<Vec<u8>>>);

impl Output {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.text().contains(needle)
    }

    fn append(&self, buf: &[u8]) {
        self.0.lock().unwrap().extend_from_slice(buf);
    }
}

/// Stream replaying a fixed script, then reporting a disconnect.
pub struct ScriptStream {
    data: Vec<u8>,
    read_pos: usize,
    output: Output,
}

impl ScriptStream {
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            read_pos: 0,
            output: Output::default(),
        }
    }

    pub fn output(&self) -> Output {
        self.output.clone()
    }
}

impl Stream for ScriptStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if self.read_pos >= self.data.len() {
            return Ok(0);
        }

        let remaining = self.data.len() - self.read_pos;
        let to_read = core::cmp::min(buf.len(), remaining);

        buf[..to_read].copy_from_slice(&self.data[self.read_pos..self.read_pos + to_read]);
        self.read_pos += to_read;

        Ok(to_read)
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.output.append(buf);
        Ok(buf.len())
    }
}

/// Stream fed byte by byte from the test. Reads block until input arrives;
/// dropping the sender disconnects the stream.
pub struct ChannelStream {
    input: Receiver<u8>,
    output: Output,
}

impl ChannelStream {
    pub fn new() -> (Self, Sender<u8>, Output) {
        let (sender, input) = channel();
        let output = Output::default();
        let stream = Self {
            input,
            output: output.clone(),
        };
        (stream, sender, output)
    }
}

impl Stream for ChannelStream {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        match self.input.recv() {
            Ok(byte) => {
                buf[0] = byte;
                Ok(1)
            }
            Err(_) => Ok(0),
        }
    }

    fn write(&mut self, buf: &[u8]) -> Result<usize, Error> {
        self.output.append(buf);
        Ok(buf.len())
    }
}

/// Send a whole string to a [`ChannelStream`].
pub fn type_in(sender: &Sender<u8>, text: &str) {
    for byte in text.bytes() {
        sender.send(byte).unwrap();
    }
}
