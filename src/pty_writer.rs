use std::io::Write;
use std::thread;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

/// Spawns a background thread that owns the pty's write side.
///
/// Writes go through the returned sender and never block the caller, so a
/// child that stops reading its input cannot stall a round's timeout. The
/// thread exits once every sender is dropped or a write fails; later sends
/// then report the channel as closed.
pub fn spawn_writer<W: Write + Send + 'static>(mut writer: W) -> UnboundedSender<Vec<u8>> {
    let (tx, mut rx) = unbounded_channel::<Vec<u8>>();

    thread::spawn(move || {
        while let Some(data) = rx.blocking_recv() {
            if let Err(e) = writer.write_all(&data).and_then(|_| writer.flush()) {
                tracing::debug!("pty write failed: {}", e);
                break;
            }
        }
    });

    tx
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};
    use std::time::{Duration, Instant};

    #[derive(Clone, Default)]
    struct Sink(Arc<Mutex<Vec<u8>>>);

    impl Write for Sink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_writes_arrive_in_order() {
        let sink = Sink::default();
        let tx = spawn_writer(sink.clone());
        tx.send(b"yes\n".to_vec()).unwrap();
        tx.send(b"hunter2\n".to_vec()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while sink.0.lock().unwrap().len() < 12 && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(*sink.0.lock().unwrap(), b"yes\nhunter2\n");
    }

    #[test]
    fn test_failed_write_closes_channel() {
        let tx = spawn_writer(Broken);
        tx.send(b"first".to_vec()).unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while !tx.is_closed() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(tx.send(b"second".to_vec()).is_err());
    }
}
