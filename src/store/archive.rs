//! Zip archives of directory trees.
//!
//! The zip writer patches each local header once an entry is complete, so it
//! needs a seekable sink. Streamed archives are therefore spooled to an
//! anonymous temporary file and then copied out in chunks.

use std::fs::{self, File};
use std::io::{self, Seek, Write};
use std::path::Path;

use futures::Stream;
use tokio::sync::mpsc;
use zip::write::{SimpleFileOptions, ZipWriter};
use zip::CompressionMethod;

use super::{FileStore, RelPath};
use crate::Result;

/// Bytes buffered before a chunk is handed to the response stream.
const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks in flight between the archiving worker and the response.
const CHANNEL_DEPTH: usize = 8;

/// Write a zip of everything below `dir` into `writer` and hand it back.
///
/// Entry names are relative to `dir` and use `/` separators. Directories get
/// their own entries so empty folders survive extraction. Symlinks are
/// skipped.
pub fn write_zip<W: Write + Seek>(dir: &Path, writer: W) -> Result<W> {
    let mut zip = ZipWriter::new(writer);
    add_directory(&mut zip, dir, "")?;
    let mut writer = zip.finish()?;
    writer.flush()?;
    Ok(writer)
}

fn entry_options(large_file: bool) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .large_file(large_file)
}

fn add_directory<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    dir: &Path,
    prefix: &str,
) -> Result<()> {
    let mut children: Vec<_> = fs::read_dir(dir)?.collect::<io::Result<_>>()?;
    children.sort_by_key(|entry| entry.file_name());

    for child in children {
        let file_type = child.file_type()?;
        let name = format!("{prefix}{}", child.file_name().to_string_lossy());

        if file_type.is_dir() {
            let dir_name = format!("{name}/");
            zip.add_directory(dir_name.as_str(), entry_options(false))?;
            add_directory(zip, &child.path(), &dir_name)?;
        } else if file_type.is_file() {
            let len = child.metadata()?.len();
            zip.start_file(name.as_str(), entry_options(len >= u64::from(u32::MAX)))?;
            let mut file = File::open(child.path())?;
            io::copy(&mut file, &mut *zip)?;
        }
    }

    Ok(())
}

/// Forwards written bytes to an async receiver in `CHUNK_SIZE` pieces.
struct ChannelWriter {
    tx: mpsc::Sender<io::Result<Vec<u8>>>,
    buf: Vec<u8>,
}

impl ChannelWriter {
    fn new(tx: mpsc::Sender<io::Result<Vec<u8>>>) -> Self {
        Self {
            tx,
            buf: Vec::with_capacity(CHUNK_SIZE),
        }
    }

    fn send_buffered(&mut self) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }
        let chunk = std::mem::replace(&mut self.buf, Vec::with_capacity(CHUNK_SIZE));
        self.tx
            .blocking_send(Ok(chunk))
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "archive receiver dropped"))
    }
}

impl Write for ChannelWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        if self.buf.len() >= CHUNK_SIZE {
            self.send_buffered()?;
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.send_buffered()
    }
}

/// Stream a zip of the directory at `rel`.
///
/// The archive is built on a blocking worker into a temporary file, then
/// handed over through a bounded channel, so at most a few chunks are held in
/// memory. Dropping the stream stops the worker at its next write. A failure
/// is yielded as the final item.
pub fn zip_stream(
    store: FileStore,
    rel: RelPath,
) -> impl Stream<Item = io::Result<Vec<u8>>> + Send + 'static {
    let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);

    tokio::task::spawn_blocking(move || {
        let mut writer = ChannelWriter::new(tx.clone());
        match spool_and_send(&store, &rel, &mut writer) {
            Ok(bytes) => tracing::debug!(path = %rel, bytes, "Archive stream finished"),
            Err(e) => {
                tracing::warn!(path = %rel, error = %e, "Archive stream aborted");
                let _ = tx.blocking_send(Err(io::Error::other(e.to_string())));
            }
        }
    });

    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
}

fn spool_and_send(store: &FileStore, rel: &RelPath, writer: &mut ChannelWriter) -> Result<u64> {
    let spool = tempfile::tempfile()?;
    let mut spool: File = store.archive(rel, spool)?;
    spool.rewind()?;

    let bytes = io::copy(&mut spool, writer)?;
    writer.flush()?;
    Ok(bytes)
}
