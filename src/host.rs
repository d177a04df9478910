// Host interface: the boundary between the interpreter and the embedder

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Marker returned by `yield_now` when the embedder wants the run to stop.
/// The interpreter surfaces it as a `TemplateAborted` error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aborted;

/// Operations the interpreter needs from the embedding application.
///
/// All offsets are relative to the start of the executed range; an adapter
/// like [`SelectionHost`] rebases them onto the embedder's document.
pub trait HostInterface {
    /// Mark `[offset, offset + length)` as holding data with the given
    /// encoding. `code` is one of the endian codes (`"u32le"`, `"s8"`, ...).
    fn set_data_type(&mut self, offset: u64, length: u64, code: &str);

    /// Attach a display comment to `[offset, offset + length)`.
    fn set_comment(&mut self, offset: u64, length: u64, text: &str);

    /// Read bytes. A short (or empty) result at end-of-range is not an
    /// error; file-backed reads that come up short yield no value.
    fn read_data(&mut self, offset: u64, length: u64) -> Vec<u8>;

    /// Total addressable length of the target range.
    fn file_length(&self) -> u64;

    /// Diagnostic sink for `Printf`.
    fn print(&mut self, text: &str);

    /// Called periodically during execution so the embedder can pump its
    /// event loop. Returning `Err(Aborted)` cancels the run.
    fn yield_now(&mut self) -> Result<(), Aborted> {
        Ok(())
    }
}

/// Host backed by a byte slice that records every annotation and print
/// call. The primary host for tests and for headless template runs.
pub struct SliceHost<'a> {
    data: &'a [u8],
    /// Recorded `set_data_type` calls, in order
    pub data_types: Vec<(u64, u64, String)>,
    /// Recorded `set_comment` calls, in order
    pub comments: Vec<(u64, u64, String)>,
    /// Recorded `print` output, in order
    pub printed: Vec<String>,
    /// Number of `yield_now` calls observed
    pub yields: u64,
    cancel: Option<Arc<AtomicBool>>,
    abort_after: Option<u64>,
}

impl<'a> SliceHost<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            data_types: Vec::new(),
            comments: Vec::new(),
            printed: Vec::new(),
            yields: 0,
            cancel: None,
            abort_after: None,
        }
    }

    /// Attach a cancellation token; `yield_now` aborts once it is set.
    pub fn with_cancel_token(mut self, token: Arc<AtomicBool>) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Abort unconditionally after `n` yields. Test knob for cancellation
    /// paths that have no second thread to flip a token.
    pub fn abort_after_yields(mut self, n: u64) -> Self {
        self.abort_after = Some(n);
        self
    }
}

impl<'a> HostInterface for SliceHost<'a> {
    fn set_data_type(&mut self, offset: u64, length: u64, code: &str) {
        self.data_types.push((offset, length, code.to_string()));
    }

    fn set_comment(&mut self, offset: u64, length: u64, text: &str) {
        self.comments.push((offset, length, text.to_string()));
    }

    fn read_data(&mut self, offset: u64, length: u64) -> Vec<u8> {
        let start = (offset as usize).min(self.data.len());
        let end = start
            .saturating_add(length as usize)
            .min(self.data.len());
        self.data[start..end].to_vec()
    }

    fn file_length(&self) -> u64 {
        self.data.len() as u64
    }

    fn print(&mut self, text: &str) {
        self.printed.push(text.to_string());
    }

    fn yield_now(&mut self) -> Result<(), Aborted> {
        self.yields += 1;
        if let Some(n) = self.abort_after {
            if self.yields > n {
                return Err(Aborted);
            }
        }
        if let Some(ref token) = self.cancel {
            if token.load(Ordering::Relaxed) {
                return Err(Aborted);
            }
        }
        Ok(())
    }
}

/// Adapter that executes a template against a sub-range of a larger
/// document: all offsets are rebased by `selection_off` and the reported
/// length is clamped to `selection_len`.
pub struct SelectionHost<H> {
    inner: H,
    selection_off: u64,
    selection_len: u64,
}

impl<H: HostInterface> SelectionHost<H> {
    pub fn new(inner: H, selection_off: u64, selection_len: u64) -> Self {
        Self {
            inner,
            selection_off,
            selection_len,
        }
    }

    pub fn into_inner(self) -> H {
        self.inner
    }
}

impl<H: HostInterface> HostInterface for SelectionHost<H> {
    fn set_data_type(&mut self, offset: u64, length: u64, code: &str) {
        self.inner
            .set_data_type(self.selection_off + offset, length, code);
    }

    fn set_comment(&mut self, offset: u64, length: u64, text: &str) {
        self.inner
            .set_comment(self.selection_off + offset, length, text);
    }

    fn read_data(&mut self, offset: u64, length: u64) -> Vec<u8> {
        if offset >= self.selection_len {
            return Vec::new();
        }
        let length = length.min(self.selection_len - offset);
        self.inner.read_data(self.selection_off + offset, length)
    }

    fn file_length(&self) -> u64 {
        self.selection_len
    }

    fn print(&mut self, text: &str) {
        self.inner.print(text);
    }

    fn yield_now(&mut self) -> Result<(), Aborted> {
        self.inner.yield_now()
    }
}
